use super::{ClientInner, ClientStateClosed, ClientStateOpen};
use crate::ws::{
    client::{Command, SocketState},
    message::FrameStreamSink,
};

#[derive(Debug)]
pub(crate) struct ClientStateConnecting;

pub(crate) enum Connected {
    Open(ClientInner<ClientStateOpen>),
    Failed(ClientInner<ClientStateClosed>),
    Stopped,
}

impl ClientInner<ClientStateConnecting> {
    pub async fn connect(mut self) -> Connected {
        self.core.epoch += 1;
        self.core.set_socket_state(SocketState::Connecting);

        log::debug!(
            "Connecting {}, epoch {}",
            self.core.config.url(),
            self.core.epoch
        );

        let result = {
            let connecting = self.core.connector.connect(self.core.config.url());
            tokio::pin!(connecting);

            loop {
                tokio::select! {
                    biased;

                    command = self.core.commands.recv() => match command {
                        Some(Command::Call(request)) => self.core.pending.refuse(request),
                        Some(Command::Close) | None => break None,
                    },

                    result = &mut connecting => break Some(result),
                }
            }
        };

        let result = match result {
            Some(result) => result,
            None => {
                log::debug!("Client closed while connecting, stop");
                self.core.stop();
                return Connected::Stopped;
            }
        };

        match result {
            Ok(transport) => {
                self.core.set_socket_state(SocketState::Open);

                log::debug!("Move to open state");

                let epoch = self.core.epoch;
                Connected::Open(ClientInner {
                    core: self.core,
                    state: ClientStateOpen::new(epoch, FrameStreamSink::new(transport)),
                })
            }
            Err(err) => {
                log::warn!("Connect failed: {}", err);

                self.core.closed(None).await;

                log::debug!("Move to closed state");

                Connected::Failed(ClientInner {
                    core: self.core,
                    state: ClientStateClosed,
                })
            }
        }
    }
}
