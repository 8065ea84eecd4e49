use std::fmt::Debug;

use futures_util::{Sink, Stream};
use snafu::prelude::*;
use tokio_tungstenite as websocket;
use url::Url;

/// Websocket message type of the transport
pub type WsMessage = websocket::tungstenite::Message;

/// Websocket error type of the transport
pub type WsError = websocket::tungstenite::Error;

/// A connected websocket, the client owns one per connection.
pub trait Transport:
    Stream<Item = Result<WsMessage, WsError>> + Sink<WsMessage, Error = WsError> + Debug + Send + Unpin
{
}

impl<T> Transport for T where
    T: Stream<Item = Result<WsMessage, WsError>>
        + Sink<WsMessage, Error = WsError>
        + Debug
        + Send
        + Unpin
{
}

/// Error when connect to websocket server
#[derive(Debug, Snafu)]
#[snafu(display("connect ws server {url} failed: {source}"))]
pub struct ConnectError {
    /// connected url
    pub url: String,
    /// source error
    pub source: WsError,
}

/// Creates a fresh [Transport] for every (re)connect.
#[async_trait::async_trait]
pub trait Connector: Debug + Send + Sync {
    /// open a websocket to url
    async fn connect(&self, url: &Url) -> Result<Box<dyn Transport>, ConnectError>;
}

/// [Connector] backed by tokio-tungstenite
#[derive(Debug, Default, Copy, Clone)]
pub struct TungsteniteConnector;

#[async_trait::async_trait]
impl Connector for TungsteniteConnector {
    async fn connect(&self, url: &Url) -> Result<Box<dyn Transport>, ConnectError> {
        log::debug!("Connecting server: {}", url);

        let (ws, _) = websocket::connect_async(url)
            .await
            .map_err(|source| ConnectError {
                url: url.to_string(),
                source,
            })?;

        Ok(Box::new(ws))
    }
}
