use std::ops::ControlFlow;

use futures_util::{
    future::{self, BoxFuture},
    FutureExt, SinkExt, StreamExt,
};
use tokio::time::Instant;

use super::{
    deadline_after,
    heartbeat::{Beat, Heartbeat},
    ClientInner, ClientStateClosed, CLOSE_TIMEOUT, NORMAL_CLOSURE,
};
use crate::ws::{
    client::{Command, Transport},
    message::{AuthPayload, FrameStreamSink, FrameStreamSinkError, Inbound, Incoming, Outbound},
    ClientEvent, Direction,
};

/// Why the open state ends
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(super) enum Exit {
    /// unintentional close, reconnect follows
    Lost(Option<u16>),
    /// close requested by the user
    Shutdown(Option<u16>),
    /// server asked for a full reload
    Reload,
}

#[derive(Debug)]
pub(crate) struct ClientStateOpen {
    pub epoch: u64,
    pub socket: FrameStreamSink<Box<dyn Transport>>,
    pub join_deadline: Option<Instant>,
    pub heartbeat: Option<Heartbeat>,
}

impl ClientStateOpen {
    pub fn new(epoch: u64, socket: FrameStreamSink<Box<dyn Transport>>) -> Self {
        Self {
            epoch,
            socket,
            join_deadline: None,
            heartbeat: None,
        }
    }
}

fn sleep_until(deadline: Option<Instant>) -> BoxFuture<'static, ()> {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).boxed(),
        None => future::pending().boxed(),
    }
}

impl ClientInner<ClientStateOpen> {
    /// Serve the socket until it's gone, returns `None` if the client should stop.
    pub async fn run(mut self) -> Option<ClientInner<ClientStateClosed>> {
        log::debug!("Socket of epoch {} open", self.state.epoch);

        self.core.events.send(ClientEvent::Open).await;

        let exit = match self.authenticate().await {
            ControlFlow::Continue(()) => self.serve().await,
            ControlFlow::Break(exit) => exit,
        };

        log::debug!("Leave open state: {:?}", exit);

        match exit {
            Exit::Lost(code) => {
                self.core.closed(code).await;

                log::debug!("Move to closed state");

                Some(ClientInner {
                    core: self.core,
                    state: ClientStateClosed,
                })
            }
            Exit::Shutdown(code) => {
                self.core.closed(code).await;
                self.core.stop();
                None
            }
            Exit::Reload => {
                self.core.closed(Some(NORMAL_CLOSURE)).await;
                self.core.events.send(ClientEvent::Reload).await;
                self.core.stop();
                None
            }
        }
    }

    async fn authenticate(&mut self) -> ControlFlow<Exit> {
        let auth = AuthPayload {
            token: self.core.config.get_token().map(ToOwned::to_owned),
            client_id: self.core.config.get_client_id().map(ToOwned::to_owned),
        };

        if auth.token.is_none() && auth.client_id.is_none() {
            log::warn!("Neither token nor client id configured, server will likely refuse");
        }

        self.state.join_deadline = Some(deadline_after(
            Instant::now(),
            self.core.config.get_join_timeout(),
        ));

        self.send(Outbound::Authenticate(auth)).await
    }

    async fn serve(&mut self) -> Exit {
        loop {
            let join_timeout = sleep_until(self.state.join_deadline);
            let heartbeat = sleep_until(self.state.heartbeat.as_ref().map(Heartbeat::deadline));
            let call_timeout = sleep_until(self.core.pending.next_deadline());

            let flow = tokio::select! {
                biased;

                command = self.core.commands.recv() => self.handle_command(command).await,

                _ = join_timeout => {
                    log::warn!(
                        "No authenticated frame in {:?}, reconnect",
                        self.core.config.get_join_timeout()
                    );
                    self.close_socket().await;
                    ControlFlow::Break(Exit::Lost(None))
                }

                _ = heartbeat => self.beat().await,

                _ = call_timeout => {
                    let count = self.core.pending.expire(Instant::now());
                    log::trace!("{} calls expired", count);
                    ControlFlow::Continue(())
                }

                item = self.state.socket.next() => self.receive(item).await,
            };

            if let ControlFlow::Break(exit) = flow {
                return exit;
            }
        }
    }

    pub(super) async fn send(&mut self, frame: Outbound) -> ControlFlow<Exit> {
        let text = frame.encode();

        log::trace!("Send {} frame", frame.type_name());
        self.core.events.log(Direction::Send, &text).await;

        match self.state.socket.send(text).await {
            Ok(()) => ControlFlow::Continue(()),
            Err(err) => {
                log::warn!("Send {} frame failed: {}", frame.type_name(), err);
                ControlFlow::Break(Exit::Lost(None))
            }
        }
    }

    async fn handle_command(&mut self, command: Option<Command>) -> ControlFlow<Exit> {
        match command {
            Some(Command::Call(request)) => {
                let frame = self
                    .core
                    .pending
                    .register(request, self.core.config.get_call_timeout());
                self.send(Outbound::Call(frame)).await
            }
            Some(Command::Close) => {
                log::debug!("Close requested");
                self.close_socket().await;
                ControlFlow::Break(Exit::Shutdown(Some(NORMAL_CLOSURE)))
            }
            None => {
                log::debug!("All client handles dropped");
                self.close_socket().await;
                ControlFlow::Break(Exit::Shutdown(Some(NORMAL_CLOSURE)))
            }
        }
    }

    /// Close handshake, bounded by [CLOSE_TIMEOUT]. Timers of this socket stop.
    pub(super) async fn close_socket(&mut self) {
        self.state.join_deadline = None;
        self.state.heartbeat = None;

        match tokio::time::timeout(CLOSE_TIMEOUT, self.state.socket.close()).await {
            Ok(Ok(())) => log::trace!("Socket closed"),
            Ok(Err(err)) => log::debug!("Close socket failed: {}", err),
            Err(_) => log::debug!("Close socket timeout, drop it"),
        }
    }

    async fn beat(&mut self) -> ControlFlow<Exit> {
        let heartbeat = match self.state.heartbeat.as_mut() {
            Some(heartbeat) => heartbeat,
            None => return ControlFlow::Continue(()),
        };

        match heartbeat.tick(self.core.epoch, self.core.socket_state, Instant::now()) {
            Beat::Stale => {
                self.state.heartbeat = None;
                ControlFlow::Continue(())
            }
            Beat::LivenessTimeout => {
                log::warn!("No pong since latest ping, reconnect");
                self.close_socket().await;
                ControlFlow::Break(Exit::Lost(None))
            }
            Beat::Ping(timestamp) => {
                self.core.events.send(ClientEvent::Ping(timestamp)).await;
                self.send(Outbound::Ping(timestamp)).await
            }
        }
    }

    async fn receive(
        &mut self,
        item: Option<Result<Incoming, FrameStreamSinkError>>,
    ) -> ControlFlow<Exit> {
        let incoming = match item {
            Some(Ok(incoming)) => incoming,
            Some(Err(err)) if !err.is_fatal() => {
                log::warn!("Frame stream error happened but ignored: {}", err);
                self.core
                    .events
                    .send(ClientEvent::Warning(err.to_string()))
                    .await;
                return ControlFlow::Continue(());
            }
            Some(Err(err)) => {
                log::warn!("Frame stream broken: {}", err);
                return ControlFlow::Break(Exit::Lost(None));
            }
            None => {
                log::debug!("Frame stream ended");
                return ControlFlow::Break(Exit::Lost(None));
            }
        };

        match incoming {
            Incoming::Close(code) => {
                log::debug!("Server closed socket, code {:?}", code);
                ControlFlow::Break(Exit::Lost(code))
            }
            Incoming::Text(text) => {
                self.core.events.log(Direction::Receive, &text).await;

                match Inbound::decode(&text) {
                    Ok(frame) => {
                        log::trace!("Received {} frame", frame.type_name());
                        self.route(frame).await
                    }
                    Err(err) => {
                        log::warn!("Drop invalid frame: {}", err);
                        self.core
                            .events
                            .send(ClientEvent::Warning(format!("invalid frame: {}", err)))
                            .await;
                        ControlFlow::Continue(())
                    }
                }
            }
        }
    }
}
