//! LiveReload routes of the aux server.
//!
//! - `/livereload` - websocket endpoint, one session per browser tab
//! - `/livereload.js` - the browser client, cacheable forever

use axum::Router;
use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;

use super::registry::ConnectionRegistry;
use crate::actor::ws::serve_socket;
use crate::embed::serve::{
    LIVERELOAD_JS, LIVERELOAD_JS_URL, LIVERELOAD_LAST_MODIFIED, LIVERELOAD_WS_URL,
};
use crate::logger::Logger;
use crate::utils::mime::types::LIVERELOAD_SCRIPT;

#[derive(Clone)]
struct LiveReloadState {
    registry: ConnectionRegistry,
    logger: Logger,
}

/// Router serving the websocket endpoint and the client script.
pub fn livereload_routes(registry: ConnectionRegistry, logger: Logger) -> Router {
    Router::new()
        .route(LIVERELOAD_WS_URL, get(livereload_socket))
        .route(LIVERELOAD_JS_URL, get(livereload_js))
        .with_state(LiveReloadState { registry, logger })
}

async fn livereload_socket(
    ws: WebSocketUpgrade,
    State(state): State<LiveReloadState>,
) -> Response {
    ws.on_upgrade(move |socket| serve_socket(socket, state.registry, state.logger))
}

async fn livereload_js(headers: HeaderMap) -> Response {
    if headers.contains_key(header::IF_MODIFIED_SINCE) {
        return StatusCode::NOT_MODIFIED.into_response();
    }
    let mut response_headers = HeaderMap::new();
    response_headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(LIVERELOAD_SCRIPT));
    response_headers.insert(
        header::LAST_MODIFIED,
        HeaderValue::from_static(LIVERELOAD_LAST_MODIFIED),
    );
    response_headers.insert(header::CONTENT_LENGTH, HeaderValue::from(LIVERELOAD_JS.len()));
    (response_headers, LIVERELOAD_JS).into_response()
}
