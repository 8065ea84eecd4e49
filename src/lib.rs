//! # venueless-ws
//!
//! Client for the venueless live protocol: JSON array frames over a single
//! websocket, with request/response calls, server pushed events, heartbeat
//! liveness checks and automatic reconnect.
//!
//! Use [ws::Client] directly and consume its [ws::EventStream], or register
//! [subscriber::Subscriber]s on a [Dispatcher].

#![deny(clippy::all)]
#![deny(missing_debug_implementations, missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod filter;
pub mod subscriber;
pub mod ws;

mod dispatcher;
mod error;

pub use config::Config;
pub use dispatcher::Dispatcher;
pub use error::{Error, Result};
