mod call;
mod connector;
mod inner;

#[cfg(test)]
pub(crate) mod mock;

pub use call::{ApiError, CallError, CallOptions, Callback, Deferred, PendingCall};
pub use connector::{ConnectError, Connector, Transport, TungsteniteConnector, WsError, WsMessage};

use std::{fmt, sync::Arc, task::Poll, time::Duration};

use futures_util::Stream;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot, watch};

use crate::{config::Config, ws::ClientEvent};
use call::CallResult;
use inner::{ClientInner, ClientStateConnecting, Core};

/// capacity of the event queue between the background task and [EventStream]
pub(crate) const EVENT_QUEUE_SIZE: usize = 64;

/// Socket state of a client
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SocketState {
    /// websocket handshake in progress
    Connecting,
    /// socket is open, maybe not authenticated yet
    Open,
    /// no socket, waiting for reconnect or stopped
    Closed,
}

pub(crate) struct CallRequest {
    pub name: String,
    pub data: serde_json::Value,
    pub timeout: Option<Duration>,
    pub callback: Option<Callback>,
    pub tx: oneshot::Sender<CallResult>,
}

impl fmt::Debug for CallRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallRequest")
            .field("name", &self.name)
            .field("data", &self.data)
            .field("timeout", &self.timeout)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

#[derive(Debug)]
pub(crate) enum Command {
    Call(CallRequest),
    Close,
}

/// Venueless websocket client handle.
///
/// A background task owns the socket, reconnects after unintentional closes,
/// authenticates every new socket and keeps it alive with pings. Handles are
/// cheap to clone, the task stops after [close](Client::close), a server
/// reload request, or when every handle is dropped.
#[derive(Debug, Clone)]
pub struct Client {
    commands: mpsc::UnboundedSender<Command>,
    socket_state: watch::Receiver<SocketState>,
}

impl Client {
    /// Start connecting with the default websocket connector.
    ///
    /// Must be called inside a tokio runtime.
    pub fn connect(config: Config) -> (Self, EventStream) {
        Self::connect_with(config, Arc::new(TungsteniteConnector))
    }

    /// Start connecting, using `connector` to open every socket.
    pub fn connect_with(config: Config, connector: Arc<dyn Connector>) -> (Self, EventStream) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::channel(EVENT_QUEUE_SIZE);
        let (state_tx, state_rx) = watch::channel(SocketState::Connecting);

        log::debug!("Start client for {}", config);

        let inner = ClientInner {
            core: Core::new(config, connector, command_rx, event_tx, state_tx),
            state: ClientStateConnecting,
        };

        tokio::spawn(inner::run(inner));

        (
            Self {
                commands: command_tx,
                socket_state: state_rx,
            },
            EventStream { rx: event_rx },
        )
    }

    /// Call a server command with the configured timeout
    pub fn call<N, D>(&self, name: N, data: &D) -> PendingCall
    where
        N: Into<String>,
        D: Serialize + ?Sized,
    {
        self.submit(name.into(), data, CallOptions::default(), None)
    }

    /// Call a server command with options
    pub fn call_with<N, D>(&self, name: N, data: &D, options: CallOptions) -> PendingCall
    where
        N: Into<String>,
        D: Serialize + ?Sized,
    {
        self.submit(name.into(), data, options, None)
    }

    /// Call a server command, `callback` decides how the successful result settles the call
    pub fn call_with_callback<N, D, F>(
        &self,
        name: N,
        data: &D,
        options: CallOptions,
        callback: F,
    ) -> PendingCall
    where
        N: Into<String>,
        D: Serialize + ?Sized,
        F: FnOnce(serde_json::Value, Deferred) + Send + 'static,
    {
        self.submit(name.into(), data, options, Some(Box::new(callback)))
    }

    fn submit<D: Serialize + ?Sized>(
        &self,
        name: String,
        data: &D,
        options: CallOptions,
        callback: Option<Callback>,
    ) -> PendingCall {
        let (tx, rx) = oneshot::channel();

        let data = match serde_json::to_value(data) {
            Ok(data) => data,
            Err(source) => {
                log::debug!("Serialize data of call {} failed: {}", name, source);
                let _ = tx.send(Err(CallError::Serialize { source }));
                return PendingCall::new(rx);
            }
        };

        let request = CallRequest {
            name,
            data,
            timeout: options.timeout,
            callback,
            tx,
        };

        // a dropped request closes its channel, the caller sees ClientClosed
        if self.commands.send(Command::Call(request)).is_err() {
            log::debug!("Client stopped, call dropped");
        }

        PendingCall::new(rx)
    }

    /// Close the connection permanently, no reconnect will happen after this.
    pub fn close(&self) {
        if self.commands.send(Command::Close).is_err() {
            log::debug!("Client already stopped");
        }
    }

    /// current socket state
    pub fn socket_state(&self) -> SocketState {
        *self.socket_state.borrow()
    }
}

/// Client event stream
///
/// Events queue up until read. When the queue is full, frame logs, pings and
/// pongs are dropped and other events hold the background task until read,
/// so keep polling the stream or drop it.
#[derive(Debug)]
pub struct EventStream {
    pub(crate) rx: mpsc::Receiver<ClientEvent>,
}

impl Stream for EventStream {
    type Item = ClientEvent;

    fn poll_next(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}
