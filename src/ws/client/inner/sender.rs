use tokio::sync::mpsc::{self, error::TrySendError};

use crate::ws::{ClientEvent, Direction, LogRecord};

#[derive(Debug, Clone)]
pub(crate) struct EventSender {
    event_tx: mpsc::Sender<ClientEvent>,
}

impl EventSender {
    pub fn new(event_tx: mpsc::Sender<ClientEvent>) -> Self {
        Self { event_tx }
    }

    /// Frame logs and heartbeat events are dropped when the queue is full,
    /// everything else waits for room.
    ///
    /// false means event stream receive side dropped
    pub async fn send(&self, event: ClientEvent) -> bool {
        log::trace!("Emit {} event", event.name());

        let delivered = match event {
            ClientEvent::Log(_) | ClientEvent::Ping(_) | ClientEvent::Pong(_) => {
                match self.event_tx.try_send(event) {
                    Ok(()) => true,
                    Err(TrySendError::Full(event)) => {
                        log::trace!("Event queue full, {} event dropped", event.name());
                        true
                    }
                    Err(TrySendError::Closed(_)) => false,
                }
            }
            event => self.event_tx.send(event).await.is_ok(),
        };

        if !delivered {
            log::trace!("Event stream dropped, event discarded");
            return false;
        }

        true
    }

    pub async fn log(&self, direction: Direction, data: &str) -> bool {
        self.send(ClientEvent::Log(LogRecord {
            direction,
            data: data.to_string(),
        }))
        .await
    }
}
