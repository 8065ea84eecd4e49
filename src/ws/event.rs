//! Events emitted by the client, consumed through [EventStream](super::EventStream).

use std::time::Duration;

use enum_as_inner::EnumAsInner;
use serde_json::Value;

/// Frame direction of a [LogRecord]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Direction {
    /// client -> server
    Send,
    /// server -> client
    Receive,
}

/// Raw frame mirrored for debugging consumers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// frame direction
    pub direction: Direction,
    /// raw frame text
    pub data: String,
}

impl LogRecord {
    /// true if the frame is a heartbeat ping or pong, which frame loggers usually hide
    pub fn is_heartbeat(&self) -> bool {
        self.data.starts_with("[\"ping\"") || self.data.starts_with("[\"pong\"")
    }
}

/// Pong event data
#[derive(Debug, Clone, PartialEq)]
pub struct Pong {
    /// timestamp echoed by the server
    pub timestamp: Value,
    /// round trip time, known when the pong answers the latest ping
    pub latency: Option<Duration>,
}

/// Client event
#[derive(Debug, Clone, PartialEq, EnumAsInner)]
pub enum ClientEvent {
    /// socket opened, authentication is being sent
    Open,
    /// socket closed, with close code if the peer sent one
    Closed(Option<u16>),
    /// reconnect delay elapsed, a new socket is about to be created
    Reconnecting,
    /// handshake done, with initial state sent by server
    Joined(Value),
    /// heartbeat ping sent, with its timestamp
    Ping(u64),
    /// heartbeat pong received
    Pong(Pong),
    /// server error not belonging to any pending call
    Error(Value),
    /// non fatal protocol oddity, like a response for an unknown call
    Warning(String),
    /// application event frame, e.g. `["chat.event", {...}]`
    Message(Vec<Value>),
    /// raw frame sent or received
    Log(LogRecord),
    /// server asked for a full reload, the client has stopped
    Reload,
}

impl ClientEvent {
    /// get event name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed(_) => "closed",
            Self::Reconnecting => "reconnecting",
            Self::Joined(_) => "joined",
            Self::Ping(_) => "ping",
            Self::Pong(_) => "pong",
            Self::Error(_) => "error",
            Self::Warning(_) => "warning",
            Self::Message(_) => "message",
            Self::Log(_) => "log",
            Self::Reload => "reload",
        }
    }

    /// application event name of a [Message](Self::Message) event
    pub fn message_name(&self) -> Option<&str> {
        match self {
            Self::Message(frame) => frame.first().and_then(Value::as_str),
            _ => None,
        }
    }
}
