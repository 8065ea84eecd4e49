//! Venueless websocket frame types.
//!
//! Every frame is a JSON array whose first element is a string tag.

mod stream;
mod types;

pub use stream::{FrameStreamSink, FrameStreamSinkError, Incoming};
pub use types::{AuthPayload, CallFrame, ErrorReply, Reply};

use enum_as_inner::EnumAsInner;
use serde_json::Value;
use snafu::prelude::*;

/// Error when parse text data as frame
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(super)), module(error), context(suffix(false)))]
pub enum ParseFrameError {
    /// data is invalid json
    #[snafu(display("parse json failed: {source}"))]
    ParseJSONFailed {
        /// data for decode
        data: String,
        /// source error
        source: serde_json::Error,
    },

    /// data json is not an array
    #[snafu(display("parsed frame is not array: {json}"))]
    FrameNotArray {
        /// json string
        json: String,
    },

    /// data json is an empty array
    #[snafu(display("frame has no type tag: {json}"))]
    NoFrameType {
        /// json string
        json: String,
    },

    /// first element is not a string
    #[snafu(display("frame has non-string type tag: {json}"))]
    FrameTypeNotString {
        /// json string
        json: String,
    },

    /// success frame without a valid call id
    #[snafu(display("{tag} frame has no valid call id: {json}"))]
    InvalidCallId {
        /// frame tag
        tag: String,
        /// json string
        json: String,
    },
}

pub(crate) const TAG_AUTHENTICATE: &str = "authenticate";
pub(crate) const TAG_AUTHENTICATED: &str = "authenticated";
pub(crate) const TAG_SUCCESS: &str = "success";
pub(crate) const TAG_ERROR: &str = "error";
pub(crate) const TAG_PING: &str = "ping";
pub(crate) const TAG_PONG: &str = "pong";
pub(crate) const TAG_RELOAD: &str = "connection.reload";

/// Frame received from server
#[derive(Debug, Clone, PartialEq, EnumAsInner)]
pub enum Inbound {
    /// `["success", id, result]`
    Success(Reply),
    /// `["error", id, payload]` or `["error", payload]`
    Error(ErrorReply),
    /// `["pong", timestamp]`, echo of our ping
    Pong(Value),
    /// `["authenticated", initial_state]`, handshake reply
    Authenticated(Value),
    /// `["connection.reload", ...]`, server asks for a full reload
    Reload,
    /// any other tag, the whole decoded frame
    Event(Vec<Value>),
}

impl Inbound {
    /// Decode a text frame
    pub fn decode(text: &str) -> Result<Self, ParseFrameError> {
        let value: Value =
            serde_json::from_str(text).context(error::ParseJSONFailed { data: text })?;

        let items = match value {
            Value::Array(items) => items,
            _ => return error::FrameNotArray { json: text }.fail(),
        };

        let tag = items
            .first()
            .with_context(|| error::NoFrameType { json: text })?
            .as_str()
            .with_context(|| error::FrameTypeNotString { json: text })?
            .to_owned();

        let frame = match tag.as_str() {
            TAG_SUCCESS => {
                let id = items
                    .get(1)
                    .and_then(Value::as_u64)
                    .with_context(|| error::InvalidCallId {
                        tag: tag.as_str(),
                        json: text,
                    })?;
                Self::Success(Reply {
                    id,
                    result: items.get(2).cloned().unwrap_or(Value::Null),
                })
            }
            TAG_ERROR => {
                // the server only echoes an id for errors caused by a call
                if items.len() >= 3 {
                    Self::Error(ErrorReply {
                        id: items[1].as_u64(),
                        payload: items[2].clone(),
                    })
                } else {
                    Self::Error(ErrorReply {
                        id: None,
                        payload: items.get(1).cloned().unwrap_or(Value::Null),
                    })
                }
            }
            TAG_PONG => Self::Pong(items.get(1).cloned().unwrap_or(Value::Null)),
            TAG_AUTHENTICATED => {
                Self::Authenticated(items.get(1).cloned().unwrap_or(Value::Null))
            }
            TAG_RELOAD => Self::Reload,
            _ => Self::Event(items),
        };

        Ok(frame)
    }

    /// get type name
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Success(_) => TAG_SUCCESS,
            Self::Error(_) => TAG_ERROR,
            Self::Pong(_) => TAG_PONG,
            Self::Authenticated(_) => TAG_AUTHENTICATED,
            Self::Reload => TAG_RELOAD,
            Self::Event(_) => "event",
        }
    }
}

/// Frame sent to server
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    /// `["authenticate", {token?, client_id?}]`
    Authenticate(AuthPayload),
    /// `[name, id, data]`
    Call(CallFrame),
    /// `["ping", timestamp]`
    Ping(u64),
}

impl Outbound {
    /// Encode to text frame
    pub fn encode(&self) -> String {
        let value = match self {
            Self::Authenticate(auth) => serde_json::json!([TAG_AUTHENTICATE, auth]),
            Self::Call(call) => Value::Array(vec![
                Value::String(call.name.clone()),
                call.id.into(),
                call.data.clone(),
            ]),
            Self::Ping(timestamp) => Value::Array(vec![TAG_PING.into(), (*timestamp).into()]),
        };

        value.to_string()
    }

    /// get type name
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Authenticate(_) => TAG_AUTHENTICATE,
            Self::Call(_) => "call",
            Self::Ping(_) => TAG_PING,
        }
    }
}
