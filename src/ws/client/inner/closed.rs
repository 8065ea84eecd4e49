use tokio::time::Instant;

use super::{deadline_after, ClientInner, ClientStateConnecting};
use crate::ws::{client::Command, ClientEvent};

#[derive(Debug)]
pub(crate) struct ClientStateClosed;

impl ClientInner<ClientStateClosed> {
    /// Wait reconnect delay, returns `None` if the client is closed meanwhile.
    pub async fn wait_reconnect(mut self) -> Option<ClientInner<ClientStateConnecting>> {
        let delay = self.core.config.get_reconnect_delay();
        let deadline = deadline_after(Instant::now(), delay);

        log::debug!("Reconnect in {:?}", delay);

        let reconnect = tokio::time::sleep_until(deadline);
        tokio::pin!(reconnect);

        loop {
            tokio::select! {
                biased;

                command = self.core.commands.recv() => match command {
                    Some(Command::Call(request)) => self.core.pending.refuse(request),
                    Some(Command::Close) | None => {
                        log::debug!("Client closed while waiting reconnect");
                        self.core.stop();
                        return None;
                    }
                },

                _ = &mut reconnect => break,
            }
        }

        log::info!("Reconnecting {}", self.core.config.url());

        self.core.events.send(ClientEvent::Reconnecting).await;

        log::debug!("Move to connecting state");

        Some(ClientInner {
            core: self.core,
            state: ClientStateConnecting,
        })
    }
}
