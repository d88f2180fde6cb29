//! HTTP response handlers for static files.

use std::path::Path;

use axum::body::Body;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};

use super::content::{maybe_inject_livereload, not_found_listing};
use crate::utils::mime::{self, types::PLAIN};

/// How static files are served.
#[derive(Debug, Clone, Copy)]
pub struct ServeOptions {
    /// Inject the livereload tag into HTML
    pub livereload: bool,
    /// Let browsers cache files (no `Cache-Control: no-cache`)
    pub browser_cache: bool,
}

/// Respond with a file from disk.
pub async fn respond_file(path: &Path, options: ServeOptions) -> Response {
    let body = match tokio::fs::read(path).await {
        Ok(body) => body,
        Err(e) => {
            let message = format!("500: failed to read {}: {e}\n", path.display());
            return send_body(StatusCode::INTERNAL_SERVER_ERROR, PLAIN, message.into_bytes());
        }
    };

    let content_type = mime::from_path(path);
    let body = if options.livereload {
        maybe_inject_livereload(body, content_type)
    } else {
        body
    };

    let mut response = send_body(StatusCode::OK, content_type, body);
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    if !options.browser_cache {
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    }
    response
}

/// 404 with a listing of the nearest existing directory.
pub fn respond_not_found(url: &str, serve_root: &Path) -> Response {
    send_body(
        StatusCode::NOT_FOUND,
        PLAIN,
        not_found_listing(url, serve_root).into_bytes(),
    )
}

/// Plain 404 for paths outside any mount.
pub fn respond_plain_not_found() -> Response {
    send_body(StatusCode::NOT_FOUND, PLAIN, b"404: Not Found\n".to_vec())
}

pub fn respond_method_not_allowed() -> Response {
    let mut response = send_body(
        StatusCode::METHOD_NOT_ALLOWED,
        PLAIN,
        b"405: Method Not Allowed\n".to_vec(),
    );
    response
        .headers_mut()
        .insert(header::ALLOW, HeaderValue::from_static("GET, HEAD"));
    response
}

fn send_body(status: StatusCode, content_type: &'static str, body: Vec<u8>) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(body.len()));
    (status, headers, Body::from(body)).into_response()
}
