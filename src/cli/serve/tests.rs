use super::*;
use std::fs;
use std::net::SocketAddr;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tempfile::TempDir;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use crate::logger::Level;

struct Aux {
    addr: SocketAddr,
    registry: ConnectionRegistry,
    shutdown: CancellationToken,
    _site: TempDir,
}

impl Aux {
    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for Aux {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

fn site() -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("css")).unwrap();
    fs::write(temp.path().join("index.html"), "<html><body>home</body></html>").unwrap();
    fs::write(temp.path().join("css/app.css"), "body{}").unwrap();
    temp
}

async fn start_aux(logger: Logger) -> Aux {
    start_aux_with(logger, true).await
}

async fn start_aux_with(logger: Logger, livereload: bool) -> Aux {
    let site = site();
    let registry = ConnectionRegistry::new();
    let files = StaticFiles {
        dir: site.path().canonicalize().unwrap(),
        url: "/static/".to_string(),
        options: ServeOptions {
            livereload,
            browser_cache: false,
        },
    };
    let router = aux_router(registry.clone(), Some(files), livereload, logger);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = CancellationToken::new();
    let token = shutdown.clone();
    tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(token.cancelled_owned())
            .await
    });

    Aux {
        addr,
        registry,
        shutdown,
        _site: site,
    }
}

#[tokio::test]
async fn test_static_html_gets_livereload() {
    let (logger, capture) = Logger::capture("aux");
    let aux = start_aux(logger).await;

    let response = reqwest::get(aux.url("/static/")).await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["cache-control"], "no-cache");
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
    let body = response.text().await.unwrap();
    assert!(body.contains("<script src=\"/livereload.js\"></script>\n</body>"));

    assert!(capture.contains(Level::Info, "◆ GET /static/ 200"));
}

#[tokio::test]
async fn test_static_misses() {
    let (logger, capture) = Logger::capture("aux");
    let aux = start_aux(logger).await;

    let response = reqwest::get(aux.url("/static/css/missing.css")).await.unwrap();
    assert_eq!(response.status(), 404);
    let body = response.text().await.unwrap();
    assert!(body.contains("Available files under 'css/'"));
    assert!(body.contains("  app.css"));
    assert!(capture.contains(Level::Warn, "/static/css/missing.css 404"));

    let response = reqwest::get(aux.url("/elsewhere")).await.unwrap();
    assert_eq!(response.status(), 404);

    let response = reqwest::Client::new()
        .post(aux.url("/static/index.html"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 405);
}

#[tokio::test]
async fn test_livereload_js_not_logged() {
    let (logger, capture) = Logger::capture("aux");
    let aux = start_aux(logger).await;

    let response = reqwest::get(aux.url("/livereload.js")).await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["content-type"], "application/javascript");
    assert!(capture.records().iter().all(|r| !r.message.contains("livereload.js")));
}

#[tokio::test]
async fn test_livereload_off_has_no_reload_routes() {
    let (logger, _capture) = Logger::capture("aux");
    let aux = start_aux_with(logger, false).await;

    let response = reqwest::get(aux.url("/livereload.js")).await.unwrap();
    assert_eq!(response.status(), 404);

    let ws_url = format!("ws://{}/livereload", aux.addr);
    assert!(tokio_tungstenite::connect_async(ws_url).await.is_err());

    let response = reqwest::get(aux.url("/static/")).await.unwrap();
    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert!(!body.contains("livereload.js"));
    assert!(aux.registry.is_empty());
}

#[tokio::test]
async fn test_websocket_handshake_and_reload() {
    let (logger, capture) = Logger::capture("aux");
    let aux = start_aux(logger.clone()).await;

    let ws_url = format!("ws://{}/livereload", aux.addr);
    let (mut ws, _) = tokio_tungstenite::connect_async(ws_url).await.unwrap();

    ws.send(Message::text(
        r#"{"command":"hello","protocols":["http://livereload.com/protocols/official-7"]}"#,
    ))
    .await
    .unwrap();
    let hello = ws.next().await.unwrap().unwrap();
    let hello: Value = serde_json::from_str(hello.to_text().unwrap()).unwrap();
    assert_eq!(hello["command"], "hello");
    assert_eq!(hello["serverName"], "livereload-aiohttp");

    ws.send(Message::text(
        r#"{"command":"info","url":"http://localhost:8000/static/index.html"}"#,
    ))
    .await
    .unwrap();
    for _ in 0..100 {
        if aux.registry.len() == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(aux.registry.len(), 1);

    let mount = StaticMount {
        dir: aux._site.path().canonicalize().unwrap(),
        url: "/static/".to_string(),
    };
    let broadcaster = ReloadBroadcaster::new(aux.registry.clone(), Some(mount.clone()), logger);
    let sent = broadcaster.broadcast(Some(&mount.dir.join("css/app.css")));
    assert_eq!(sent, 1);

    let reload = ws.next().await.unwrap().unwrap();
    let reload: Value = serde_json::from_str(reload.to_text().unwrap()).unwrap();
    assert_eq!(reload["command"], "reload");
    assert_eq!(reload["path"], "/static/css/app.css");
    assert_eq!(reload["liveCSS"], true);

    ws.close(None).await.unwrap();
    for _ in 0..100 {
        if aux.registry.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(aux.registry.is_empty());
    assert!(capture.contains(Level::Info, "prompted reload of /static/css/app.css on 1 client"));
}

#[tokio::test]
async fn test_websocket_rejects_old_protocol() {
    let (logger, capture) = Logger::capture("aux");
    let aux = start_aux(logger).await;

    let ws_url = format!("ws://{}/livereload", aux.addr);
    let (mut ws, _) = tokio_tungstenite::connect_async(ws_url).await.unwrap();
    ws.send(Message::text(
        r#"{"command":"hello","protocols":["http://livereload.com/protocols/official-6"]}"#,
    ))
    .await
    .unwrap();

    // server closes without answering
    let next = ws.next().await;
    assert!(matches!(next, None | Some(Ok(Message::Close(_))) | Some(Err(_))));
    assert!(capture.contains(Level::Error, "live reload protocol 7 not supported"));
    assert!(aux.registry.is_empty());
}
