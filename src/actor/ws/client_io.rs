use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};

use super::{Frame, LiveReloadSession};
use crate::logger::Logger;
use crate::reload::registry::{ConnectionRegistry, Outbound, SessionHandle};

/// Drive one upgraded `/livereload` socket until it closes.
///
/// The write half lives in its own task fed by the session's channel, so a
/// broadcast never waits on a slow browser.
pub async fn serve_socket(socket: WebSocket, registry: ConnectionRegistry, logger: Logger) {
    let (mut sink, stream) = socket.split();
    let (session, mut outbound) = SessionHandle::channel();
    let id = session.id();

    let writer_logger = logger.clone();
    let writer = tokio::spawn(async move {
        while let Some(out) = outbound.recv().await {
            match out {
                Outbound::Text(text) => {
                    if let Err(e) = sink.send(Message::Text(text.into())).await {
                        crate::debug!(writer_logger; "session {} write failed: {}", id, e);
                        break;
                    }
                }
                Outbound::Close => {
                    let _ = sink.close().await;
                    break;
                }
            }
        }
    });

    LiveReloadSession::new(session, registry, logger)
        .run(stream.map(into_frame))
        .await;
    let _ = writer.await;
}

fn into_frame(message: Result<Message, axum::Error>) -> Frame {
    match message {
        Ok(Message::Text(text)) => Frame::Text(text.to_string()),
        Ok(Message::Binary(data)) => Frame::Binary(data.to_vec()),
        Ok(Message::Ping(_) | Message::Pong(_)) => Frame::Control,
        Ok(Message::Close(_)) => Frame::Close,
        Err(e) => Frame::Error(e.to_string()),
    }
}
