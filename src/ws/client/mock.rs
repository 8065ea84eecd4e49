//! In-memory transport for driving a client from tests.

use std::{
    pin::Pin,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
    task::{Context, Poll},
};

use futures_util::{Sink, Stream};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::protocol::{frame::coding::CloseCode, CloseFrame};
use url::Url;

use super::{ConnectError, Connector, Transport, WsError, WsMessage};

#[derive(Debug)]
pub(crate) struct MockTransport {
    incoming: mpsc::UnboundedReceiver<Result<WsMessage, WsError>>,
    outgoing: mpsc::UnboundedSender<WsMessage>,
}

impl Stream for MockTransport {
    type Item = Result<WsMessage, WsError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.incoming.poll_recv(cx)
    }
}

impl Sink<WsMessage> for MockTransport {
    type Error = WsError;

    fn poll_ready(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn start_send(self: Pin<&mut Self>, item: WsMessage) -> Result<(), Self::Error> {
        self.outgoing
            .send(item)
            .map_err(|_| WsError::ConnectionClosed)
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        let _ = self.outgoing.send(WsMessage::Close(None));
        Poll::Ready(Ok(()))
    }
}

/// Server side of one mock connection
#[derive(Debug)]
pub(crate) struct ServerEnd {
    tx: mpsc::UnboundedSender<Result<WsMessage, WsError>>,
    rx: mpsc::UnboundedReceiver<WsMessage>,
}

impl ServerEnd {
    pub fn send(&self, frame: Value) {
        self.send_raw(WsMessage::Text(frame.to_string()));
    }

    pub fn send_raw(&self, message: WsMessage) {
        let _ = self.tx.send(Ok(message));
    }

    pub fn close(&self, code: u16) {
        self.send_raw(WsMessage::Close(Some(CloseFrame {
            code: CloseCode::from(code),
            reason: "".into(),
        })));
    }

    /// Next text frame from client, `None` once the client closed the socket.
    pub async fn recv(&mut self) -> Option<Value> {
        loop {
            match self.rx.recv().await? {
                WsMessage::Text(text) => return serde_json::from_str(&text).ok(),
                WsMessage::Close(_) => return None,
                _ => continue,
            }
        }
    }

    pub async fn recv_skip_ping(&mut self) -> Option<Value> {
        loop {
            let frame = self.recv().await?;
            if frame[0] != "ping" {
                return Some(frame);
            }
        }
    }

    pub async fn recv_answer_ping(&mut self) -> Option<Value> {
        loop {
            let frame = self.recv().await?;
            if frame[0] == "ping" {
                self.send(Value::Array(vec!["pong".into(), frame[1].clone()]));
                continue;
            }
            return Some(frame);
        }
    }

    /// Text frames already sent by client
    pub fn drain_text(&mut self) -> Vec<String> {
        let mut frames = vec![];
        while let Ok(message) = self.rx.try_recv() {
            if let WsMessage::Text(text) = message {
                frames.push(text);
            }
        }
        frames
    }
}

#[derive(Debug)]
pub(crate) struct MockConnector {
    servers: mpsc::UnboundedSender<ServerEnd>,
    fail: AtomicUsize,
    stall: AtomicBool,
    connects: AtomicUsize,
}

impl MockConnector {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<ServerEnd>) {
        let (servers, rx) = mpsc::unbounded_channel();
        (
            Arc::new(Self {
                servers,
                fail: AtomicUsize::new(0),
                stall: AtomicBool::new(false),
                connects: AtomicUsize::new(0),
            }),
            rx,
        )
    }

    /// make next `n` connect attempts fail
    pub fn fail_next(&self, n: usize) {
        self.fail.store(n, Ordering::SeqCst);
    }

    /// connect attempts hang forever while set
    pub fn stall(&self, stall: bool) {
        self.stall.store(stall, Ordering::SeqCst);
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Connector for MockConnector {
    async fn connect(&self, url: &Url) -> Result<Box<dyn Transport>, ConnectError> {
        self.connects.fetch_add(1, Ordering::SeqCst);

        if self.stall.load(Ordering::SeqCst) {
            futures_util::future::pending::<()>().await;
        }

        let failing = self
            .fail
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(ConnectError {
                url: url.to_string(),
                source: WsError::ConnectionClosed,
            });
        }

        let (client_tx, server_rx) = mpsc::unbounded_channel();
        let (server_tx, client_rx) = mpsc::unbounded_channel();

        let _ = self.servers.send(ServerEnd {
            tx: server_tx,
            rx: server_rx,
        });

        Ok(Box::new(MockTransport {
            incoming: client_rx,
            outgoing: client_tx,
        }))
    }
}
