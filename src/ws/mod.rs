//! Venueless websocket protocol client implement

mod client;
mod event;
pub mod message;

#[cfg(test)]
pub(crate) use client::mock;

pub use client::{
    ApiError, CallError, CallOptions, Callback, Client, ConnectError, Connector, Deferred,
    EventStream, PendingCall, SocketState, Transport, TungsteniteConnector, WsError, WsMessage,
};
pub use event::{ClientEvent, Direction, LogRecord, Pong};
