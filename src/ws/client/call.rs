use std::{
    fmt::{self, Display},
    future::Future,
    pin::Pin,
    task::{Context, Poll},
    time::Duration,
};

use serde_json::Value;
use snafu::prelude::*;
use tokio::sync::oneshot;

/// Structured error reported by the server for a call
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    payload: Value,
}

impl ApiError {
    pub(crate) fn new(payload: Value) -> Self {
        Self { payload }
    }

    /// raw error payload sent by server
    pub fn api_error(&self) -> &Value {
        &self.payload
    }

    /// error code, like `auth.denied`
    pub fn code(&self) -> Option<&str> {
        self.payload.get("code").and_then(Value::as_str)
    }

    /// human readable message, if server sent one
    pub fn message(&self) -> Option<&str> {
        self.payload.get("message").and_then(Value::as_str)
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self
            .message()
            .or_else(|| self.payload.get("error").and_then(Value::as_str))
            .or_else(|| self.code());

        match text {
            Some(text) => f.write_str(text),
            None => write!(f, "{}", self.payload),
        }
    }
}

impl std::error::Error for ApiError {}

/// Error of a single call
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)), module(error), context(suffix(false)))]
pub enum CallError {
    /// no response in time
    #[snafu(display("call {id} timed out"))]
    Timeout {
        /// call id
        id: u64,
    },

    /// server responded with an error frame
    #[snafu(display("call {id} failed: {source}"))]
    Api {
        /// call id
        id: u64,
        /// server error
        source: ApiError,
    },

    /// call issued while no socket was open
    #[snafu(display("call {id} not sent, websocket is not open"))]
    NotConnected {
        /// call id
        id: u64,
    },

    /// connection closed before the response arrived
    #[snafu(display("connection lost before call {id} got a response"))]
    ConnectionLost {
        /// call id
        id: u64,
    },

    /// client background task is gone
    #[snafu(display("client stopped"))]
    ClientClosed,

    /// call data can't be encoded
    #[snafu(display("serialize call data failed: {source}"))]
    Serialize {
        /// source error
        source: serde_json::Error,
    },

    /// rejected by a call callback
    #[snafu(display("call {id} rejected: {message}"))]
    Rejected {
        /// call id
        id: u64,
        /// reason
        message: String,
    },
}

impl CallError {
    /// server error payload, if this is an [Api](Self::Api) error
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub(crate) type CallResult = Result<Value, CallError>;

/// Options of a single call
#[derive(Debug, Default, Clone, Copy)]
pub struct CallOptions {
    /// override the configured call timeout
    pub timeout: Option<Duration>,
}

impl CallOptions {
    /// options with a custom timeout
    pub fn timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }
}

/// Settles a call from a custom callback
#[derive(Debug)]
pub struct Deferred {
    id: u64,
    tx: oneshot::Sender<CallResult>,
}

impl Deferred {
    pub(crate) fn new(id: u64, tx: oneshot::Sender<CallResult>) -> Self {
        Self { id, tx }
    }

    /// call id
    pub fn id(&self) -> u64 {
        self.id
    }

    /// resolve the call with value
    pub fn resolve(self, value: Value) {
        self.settle(Ok(value));
    }

    /// reject the call with a message
    pub fn reject<S: Into<String>>(self, message: S) {
        let err = error::Rejected {
            id: self.id,
            message: message.into(),
        }
        .build();
        self.settle(Err(err));
    }

    pub(crate) fn settle(self, result: CallResult) {
        if self.tx.send(result).is_err() {
            log::trace!("Call {} caller gone, result dropped", self.id);
        }
    }
}

/// Callback invoked with the success result instead of resolving directly
pub type Callback = Box<dyn FnOnce(Value, Deferred) + Send>;

/// Future of a call result, returned immediately by [Client::call](super::Client::call)
#[derive(Debug)]
pub struct PendingCall {
    rx: oneshot::Receiver<CallResult>,
}

impl PendingCall {
    pub(crate) fn new(rx: oneshot::Receiver<CallResult>) -> Self {
        Self { rx }
    }
}

impl Future for PendingCall {
    type Output = CallResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|result| result.unwrap_or_else(|_| error::ClientClosed.fail()))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_api_error_display_prefers_message() {
        let err = ApiError::new(json!({"code": "chat.denied", "message": "Not allowed"}));
        assert_eq!(err.to_string(), "Not allowed");
        assert_eq!(err.code(), Some("chat.denied"));
    }

    #[test]
    fn test_api_error_display_fallbacks() {
        assert_eq!(
            ApiError::new(json!({"error": "boom"})).to_string(),
            "boom"
        );
        assert_eq!(
            ApiError::new(json!({"code": "auth.denied"})).to_string(),
            "auth.denied"
        );
        assert_eq!(ApiError::new(json!({"x": 1})).to_string(), r#"{"x":1}"#);
    }

    #[tokio::test]
    async fn test_deferred_reject() {
        let (tx, rx) = oneshot::channel();
        Deferred::new(3, tx).reject("bad data");

        let err = PendingCall::new(rx).await.unwrap_err();
        assert!(matches!(err, CallError::Rejected { id: 3, .. }));
    }

    #[tokio::test]
    async fn test_pending_call_sender_dropped() {
        let (tx, rx) = oneshot::channel::<CallResult>();
        drop(tx);

        let err = PendingCall::new(rx).await.unwrap_err();
        assert!(matches!(err, CallError::ClientClosed));
    }
}
