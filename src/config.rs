//! Client configuration

use std::{fmt::Display, str::FromStr, time::Duration};

use snafu::prelude::*;
use url::Url;

/// default interval between two heartbeat pings
pub const DEFAULT_PING_INTERVAL: Duration = Duration::from_millis(10_000);
/// default time to wait for the `authenticated` reply after socket open
pub const DEFAULT_JOIN_TIMEOUT: Duration = Duration::from_millis(60_000);
/// default delay before reconnecting after an unintentional close
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(1_000);
/// default timeout of a single call
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_millis(15_000);

/// Parse string as server url error
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)), module(error), context(suffix(false)))]
pub enum ParseConfigError {
    #[snafu(display("{s} is an invalid url: {source}"))]
    /// the str is not a valid url
    InvalidURL {
        /// string be parsed
        s: String,
        /// source error
        source: url::ParseError,
    },

    /// the parsed url schema is not websocket
    #[snafu(display("the url {s} has invalid schema {schema}, only ws or wss is ok"))]
    InvalidSchema {
        /// the url
        s: String,
        /// invalid schema
        schema: String,
    },

    /// the parsed url has no host
    #[snafu(display("the url {s} has no host"))]
    NoHost {
        /// the url
        s: String,
    },
}

/// Client configuration, immutable once a client is connected.
#[derive(Debug, Clone)]
pub struct Config {
    url: Url,
    ping_interval: Duration,
    join_timeout: Duration,
    reconnect_delay: Duration,
    call_timeout: Duration,
    token: Option<String>,
    client_id: Option<String>,
}

impl Config {
    /// Create config for the given websocket url with default timings and no credentials.
    pub fn new<S: AsRef<str> + ?Sized>(url: &S) -> Result<Self, ParseConfigError> {
        url.as_ref().parse()
    }

    /// Set heartbeat ping interval
    pub fn ping_interval(mut self, interval: Duration) -> Self {
        self.ping_interval = interval;
        self
    }

    /// Set the time allowed between socket open and the `authenticated` reply
    pub fn join_timeout(mut self, timeout: Duration) -> Self {
        self.join_timeout = timeout;
        self
    }

    /// Set the delay before a reconnect attempt
    pub fn reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Set the timeout used by calls without an explicit one
    pub fn call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Set authentication token
    pub fn token<S: Into<String>>(mut self, token: S) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set client id, used for anonymous sessions
    pub fn client_id<S: Into<String>>(mut self, client_id: S) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// server url
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub(crate) fn get_ping_interval(&self) -> Duration {
        self.ping_interval
    }

    pub(crate) fn get_join_timeout(&self) -> Duration {
        self.join_timeout
    }

    pub(crate) fn get_reconnect_delay(&self) -> Duration {
        self.reconnect_delay
    }

    pub(crate) fn get_call_timeout(&self) -> Duration {
        self.call_timeout
    }

    pub(crate) fn get_token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub(crate) fn get_client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }
}

impl FromStr for Config {
    type Err = ParseConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let url = Url::parse(s).with_context(|_| error::InvalidURL { s })?;

        ensure!(
            url.scheme() == "wss" || url.scheme() == "ws",
            error::InvalidSchema {
                s,
                schema: url.scheme(),
            }
        );

        ensure!(url.host().is_some(), error::NoHost { s });

        Ok(Self {
            url,
            ping_interval: DEFAULT_PING_INTERVAL,
            join_timeout: DEFAULT_JOIN_TIMEOUT,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            call_timeout: DEFAULT_CALL_TIMEOUT,
            token: None,
            client_id: None,
        })
    }
}

impl Display for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.url.fmt(f)
    }
}
