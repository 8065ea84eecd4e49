use std::{pin::Pin, task::Poll};

use futures_util::{ready, Sink, SinkExt, Stream, StreamExt};
use snafu::prelude::*;
use tokio_tungstenite::tungstenite::{self as websocket, protocol::CloseFrame};

/// Error when read/write frame stream/sink
#[derive(Debug, Snafu)]
#[snafu(module(error), context(suffix(false)))]
pub enum FrameStreamSinkError {
    /// underlying websocket stream broken
    #[snafu(display("underlying websocket stream broken: {source}"))]
    Websocket {
        /// source error
        source: websocket::Error,
    },

    /// received a binary frame which is not utf-8 text
    #[snafu(display("received a binary frame which is not valid utf-8"))]
    NotTextFrame,
}

impl FrameStreamSinkError {
    /// Check if this error will make the stream/sink stop
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Websocket { .. } => true,
            Self::NotTextFrame => false,
        }
    }
}

/// Item yielded by [`FrameStreamSink`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    /// a text frame
    Text(String),
    /// peer sent a close frame, with close code if any
    Close(Option<u16>),
}

/// Text frame stream/sink over a websocket transport.
///
/// Control frames are answered by the websocket layer and never yielded.
#[derive(Debug)]
pub struct FrameStreamSink<T> {
    ws: T,
}

impl<T> FrameStreamSink<T> {
    /// Construct a new stream with underlying websocket connection.
    pub fn new(ws: T) -> Self {
        Self { ws }
    }
}

impl<T> Stream for FrameStreamSink<T>
where
    T: Stream<Item = Result<websocket::Message, websocket::Error>> + Unpin,
{
    type Item = Result<Incoming, FrameStreamSinkError>;

    fn poll_next(
        mut self: Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> Poll<Option<Self::Item>> {
        loop {
            let frame = match ready!(self.ws.poll_next_unpin(cx)) {
                Some(frame) => frame.context(error::Websocket)?,
                None => return Poll::Ready(None),
            };

            let result = match frame {
                websocket::Message::Text(text) => Ok(Incoming::Text(text)),
                websocket::Message::Binary(data) => match String::from_utf8(data) {
                    Ok(text) => Ok(Incoming::Text(text)),
                    Err(_) => error::NotTextFrame.fail(),
                },
                websocket::Message::Close(frame) => Ok(Incoming::Close(
                    frame.map(|CloseFrame { code, .. }| u16::from(code)),
                )),
                _ => {
                    log::trace!("Skip websocket control frame");
                    continue;
                }
            };

            return Poll::Ready(Some(result));
        }
    }
}

impl<T> Sink<String> for FrameStreamSink<T>
where
    T: Sink<websocket::Message, Error = websocket::Error> + Unpin,
{
    type Error = FrameStreamSinkError;

    fn poll_ready(
        mut self: Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> Poll<Result<(), Self::Error>> {
        self.ws
            .poll_ready_unpin(cx)
            .map_err(|e| Self::Error::Websocket { source: e })
    }

    fn start_send(mut self: Pin<&mut Self>, item: String) -> Result<(), Self::Error> {
        self.ws
            .start_send_unpin(websocket::Message::Text(item))
            .map_err(|e| Self::Error::Websocket { source: e })
    }

    fn poll_flush(
        mut self: Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> Poll<Result<(), Self::Error>> {
        self.ws
            .poll_flush_unpin(cx)
            .map_err(|e| Self::Error::Websocket { source: e })
    }

    fn poll_close(
        mut self: Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> Poll<Result<(), Self::Error>> {
        self.ws
            .poll_close_unpin(cx)
            .map_err(|e| Self::Error::Websocket { source: e })
    }
}
