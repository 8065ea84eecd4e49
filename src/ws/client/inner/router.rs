use std::ops::ControlFlow;

use tokio::time::Instant;

use super::{
    heartbeat::Heartbeat,
    open::{ClientStateOpen, Exit},
    ClientInner,
};
use crate::ws::{
    client::{ApiError, CallError},
    message::{ErrorReply, Inbound, Reply},
    ClientEvent, Pong,
};

impl ClientInner<ClientStateOpen> {
    pub(super) async fn route(&mut self, frame: Inbound) -> ControlFlow<Exit> {
        match frame {
            Inbound::Success(Reply { id, result }) => match self.core.pending.take(id) {
                Some(request) => {
                    log::trace!("Call {} succeeded", request.id());
                    request.resolve(result);
                }
                None => {
                    log::debug!("Success frame for unknown call {}", id);
                    self.core
                        .events
                        .send(ClientEvent::Warning(format!(
                            "received response for unknown call {}",
                            id
                        )))
                        .await;
                }
            },

            Inbound::Error(ErrorReply { id, payload }) => {
                match id.and_then(|id| self.core.pending.take(id)) {
                    Some(request) => {
                        let id = request.id();
                        log::debug!("Call {} failed: {}", id, payload);
                        request.reject(CallError::Api {
                            id,
                            source: ApiError::new(payload),
                        });
                    }
                    None => {
                        log::warn!("Server error: {}", payload);
                        self.core.events.send(ClientEvent::Error(payload)).await;
                    }
                }
            }

            Inbound::Pong(timestamp) => {
                let latency = self
                    .state
                    .heartbeat
                    .as_mut()
                    .and_then(|heartbeat| heartbeat.pong(&timestamp, Instant::now()));

                log::trace!("Pong, latency {:?}", latency);

                self.core
                    .events
                    .send(ClientEvent::Pong(Pong { timestamp, latency }))
                    .await;
            }

            Inbound::Reload => {
                log::info!("Server requested reload, stop");
                self.close_socket().await;
                return ControlFlow::Break(Exit::Reload);
            }

            Inbound::Authenticated(state) => {
                if self.state.join_deadline.take().is_none() {
                    log::debug!("Authenticated again on epoch {}", self.state.epoch);
                }

                log::info!("Joined, epoch {}", self.state.epoch);

                self.core.events.send(ClientEvent::Joined(state)).await;
                self.state.heartbeat = Some(Heartbeat::start(
                    self.state.epoch,
                    self.core.config.get_ping_interval(),
                    Instant::now(),
                ));
            }

            Inbound::Event(items) => {
                self.core.events.send(ClientEvent::Message(items)).await;
            }
        }

        ControlFlow::Continue(())
    }
}
