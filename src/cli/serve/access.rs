//! Access log for the aux server.

use std::time::{Duration, Instant};

use axum::body::HttpBody;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;

use crate::actor::app::probe::ALIVE_CHECK_PARAM;
use crate::embed::serve::{LIVERELOAD_JS_URL, LIVERELOAD_WS_URL};
use crate::logger::Logger;
use crate::utils::format::fmt_size;

/// Log one line per request, skipping livereload plumbing.
pub async fn access_log(State(logger): State<Logger>, request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let path_qs = request
        .uri()
        .path_and_query()
        .map_or_else(|| path.clone(), |pq| pq.as_str().to_string());

    let started = Instant::now();
    let response = next.run(request).await;

    if path == LIVERELOAD_WS_URL || path == LIVERELOAD_JS_URL {
        return response;
    }

    let size = response.body().size_hint().exact().unwrap_or_default();
    let line = format_line(method.as_str(), &path_qs, response.status(), size, started.elapsed());

    let status = response.status();
    if status == StatusCode::NOT_MODIFIED || path_qs.contains(ALIVE_CHECK_PARAM) {
        crate::debug!(logger; "{}", line);
    } else if status.is_client_error() || status.is_server_error() {
        crate::warn!(logger; "{}", line);
    } else {
        crate::log!(logger; "{}", line);
    }
    response
}

fn format_line(method: &str, path_qs: &str, status: StatusCode, size: u64, elapsed: Duration) -> String {
    let size = fmt_size(size);
    let ms = elapsed.as_secs_f64() * 1000.0;
    if size.is_empty() {
        format!("◆ {method} {path_qs} {} {ms:.0}ms", status.as_u16())
    } else {
        format!("◆ {method} {path_qs} {} {size} {ms:.0}ms", status.as_u16())
    }
}
