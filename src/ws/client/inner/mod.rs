mod closed;
mod connecting;
mod heartbeat;
mod open;
mod pending;
mod router;
mod sender;

pub(crate) use closed::ClientStateClosed;
pub(crate) use connecting::{ClientStateConnecting, Connected};
pub(crate) use open::ClientStateOpen;

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{mpsc, watch},
    time::Instant,
};

use super::{Command, Connector, SocketState};
use crate::{config::Config, ws::ClientEvent};
use pending::PendingTable;
use sender::EventSender;

/// close code sent and reported for intentional closes
pub(crate) const NORMAL_CLOSURE: u16 = 1000;

/// upper bound for the websocket close handshake
pub(crate) const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// stands in for deadlines too far away to represent, about 30 years
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// `now + after`, clamped to a far future instant instead of overflowing
pub(crate) fn deadline_after(now: Instant, after: Duration) -> Instant {
    now.checked_add(after).unwrap_or_else(|| now + FAR_FUTURE)
}

/// Everything that outlives a single connection.
#[derive(Debug)]
pub(crate) struct Core {
    pub config: Config,
    pub connector: Arc<dyn Connector>,
    pub commands: mpsc::UnboundedReceiver<Command>,
    pub events: EventSender,
    pub pending: PendingTable,
    pub socket_state: SocketState,
    socket_state_tx: watch::Sender<SocketState>,
    /// bumped for every new socket
    pub epoch: u64,
}

impl Core {
    pub fn new(
        config: Config,
        connector: Arc<dyn Connector>,
        commands: mpsc::UnboundedReceiver<Command>,
        event_tx: mpsc::Sender<ClientEvent>,
        socket_state_tx: watch::Sender<SocketState>,
    ) -> Self {
        Self {
            config,
            connector,
            commands,
            events: EventSender::new(event_tx),
            pending: PendingTable::default(),
            socket_state: SocketState::Connecting,
            socket_state_tx,
            epoch: 0,
        }
    }

    pub fn set_socket_state(&mut self, state: SocketState) {
        log::trace!("Socket state {:?} -> {:?}", self.socket_state, state);

        self.socket_state = state;
        // no receiver means every handle dropped, the task is about to stop anyway
        let _ = self.socket_state_tx.send(state);
    }

    /// Socket of the current epoch is gone.
    pub async fn closed(&mut self, code: Option<u16>) {
        log::debug!(
            "Socket of epoch {} closed with code {:?}, {} calls pending",
            self.epoch,
            code,
            self.pending.len()
        );

        self.set_socket_state(SocketState::Closed);
        self.pending.reject_all();
        self.events.send(ClientEvent::Closed(code)).await;
    }

    /// No reconnect will follow.
    pub fn stop(&mut self) {
        log::debug!("Client stop");

        self.set_socket_state(SocketState::Closed);
        self.pending.reject_all();
    }
}

#[derive(Debug)]
pub(crate) struct ClientInner<S> {
    pub core: Core,
    pub state: S,
}

pub(crate) async fn run(mut client: ClientInner<ClientStateConnecting>) {
    log::debug!("Client background task start");

    loop {
        let closed = match client.connect().await {
            Connected::Open(open) => match open.run().await {
                Some(closed) => closed,
                None => break,
            },
            Connected::Failed(closed) => closed,
            Connected::Stopped => break,
        };

        client = match closed.wait_reconnect().await {
            Some(connecting) => connecting,
            None => break,
        };
    }

    log::debug!("Client background task stop");
}
