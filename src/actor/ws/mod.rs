//! WebSocket Endpoint - LiveReload sessions
//!
//! One [`LiveReloadSession`] per browser connection:
//!
//! ```text
//! Browser --hello--> session --hello reply--> Browser
//! Browser --info---> session --register(url)--> ConnectionRegistry
//!                       ...
//! socket closes ----> session --remove--> ConnectionRegistry
//! ```
//!
//! The session only sees decoded [`Frame`]s and writes through its
//! [`SessionHandle`], so it runs the same over a real socket or a test stream.

mod client_io;

use std::ops::ControlFlow;

use futures_util::{Stream, StreamExt};

use crate::logger::Logger;
use crate::reload::message::{ClientMessage, ProtocolError, ServerMessage, page_path};
use crate::reload::registry::{ConnectionRegistry, SessionHandle};

pub use client_io::serve_socket;

/// Incoming websocket frame, decoupled from the socket library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
    /// Ping/pong, answered by the socket layer
    Control,
    Close,
    Error(String),
}

/// State of one browser connection.
pub struct LiveReloadSession {
    session: SessionHandle,
    registry: ConnectionRegistry,
    /// Page path once the client sent `info`
    page: Option<String>,
    logger: Logger,
}

impl LiveReloadSession {
    pub fn new(session: SessionHandle, registry: ConnectionRegistry, logger: Logger) -> Self {
        Self {
            session,
            registry,
            page: None,
            logger,
        }
    }

    /// Process frames until the stream ends or the session decides to close.
    pub async fn run<S>(mut self, mut frames: S)
    where
        S: Stream<Item = Frame> + Unpin,
    {
        while let Some(frame) = frames.next().await {
            if self.handle_frame(frame).is_break() {
                break;
            }
        }
        self.finish();
    }

    /// Handle one frame. `Break` means the connection is done.
    pub fn handle_frame(&mut self, frame: Frame) -> ControlFlow<()> {
        match frame {
            Frame::Text(text) => self.handle_text(&text),
            Frame::Binary(data) => {
                crate::error!(self.logger; "unknown websocket message type binary ({} bytes)", data.len());
                self.close()
            }
            Frame::Control => ControlFlow::Continue(()),
            Frame::Close => ControlFlow::Break(()),
            Frame::Error(e) => {
                crate::error!(self.logger; "ws connection closed with exception {}", e);
                ControlFlow::Break(())
            }
        }
    }

    fn handle_text(&mut self, text: &str) -> ControlFlow<()> {
        let message = match ClientMessage::parse(text) {
            Ok(message) => message,
            Err(ProtocolError::Json(e)) => {
                crate::error!(self.logger; "JSON decode error: {}", e);
                return self.close();
            }
            Err(e @ ProtocolError::MissingCommand) => {
                crate::error!(self.logger; "{}: {}", e, text);
                return self.close();
            }
        };

        match message {
            ClientMessage::Hello { protocols } => {
                if !ClientMessage::speaks_official_7(&protocols) {
                    crate::error!(self.logger; "live reload protocol 7 not supported by client {}", text);
                    return self.close();
                }
                if let Err(e) = self.session.send_text(ServerMessage::hello().to_json()) {
                    crate::debug!(self.logger; "could not answer hello: {}", e);
                    return ControlFlow::Break(());
                }
                ControlFlow::Continue(())
            }
            ClientMessage::Info { url } => {
                crate::debug!(self.logger; "browser connected: {}", text);
                let page = page_path(&url);
                self.registry.register(&self.session, page.clone());
                self.page = Some(page);
                ControlFlow::Continue(())
            }
            ClientMessage::Unknown { .. } => {
                crate::error!(self.logger; "unknown ws message {}", text);
                self.close()
            }
        }
    }

    fn close(&self) -> ControlFlow<()> {
        self.session.close();
        ControlFlow::Break(())
    }

    /// Disconnect bookkeeping.
    fn finish(self) {
        if self.page.is_some() {
            self.registry.remove(self.session.id());
            crate::debug!(self.logger; "browser disconnected");
        } else {
            crate::warn!(self.logger; "browser disconnected, appears no websocket connection was made");
        }
        self.session.close();
    }
}
