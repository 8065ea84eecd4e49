use serde::Serialize;
use serde_json::Value;

/// Authenticate frame payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuthPayload {
    /// signed token of a known user
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// client generated id, used for anonymous sessions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
}

/// Outgoing call frame data
#[derive(Debug, Clone, PartialEq)]
pub struct CallFrame {
    /// command name, like `chat.join`
    pub name: String,
    /// correlation id
    pub id: u64,
    /// command arguments
    pub data: Value,
}

/// Successful call response
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    /// correlation id of the call
    pub id: u64,
    /// result data
    pub result: Value,
}

/// Error response, with or without a correlation id
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorReply {
    /// correlation id, `None` for connection level errors
    pub id: Option<u64>,
    /// error payload, usually `{"code": ..., "message": ...}`
    pub payload: Value,
}
