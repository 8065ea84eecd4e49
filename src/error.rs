//! crate error types

use snafu::prelude::*;

use crate::config::ParseConfigError;

/// crate result type
pub type Result<T> = std::result::Result<T, Error>;

/// crate error type
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)), context(suffix(false)))]
pub enum Error {
    /// Invalid client config
    #[snafu(display("invalid client config: {source}"))]
    InvalidConfig {
        /// source error
        source: ParseConfigError,
    },

    /// Server sent `connection.reload`, the client stopped and won't reconnect
    #[snafu(display("server requested a full reload"))]
    ServerReload,
}
