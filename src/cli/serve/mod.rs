//! Development server with live reload support.
//!
//! Two hosts share the same pieces:
//!
//! - `runserver` - app subprocess on the main port, aux server next to it
//! - `serve_static` - a directory served by the aux server alone
//!
//! The aux server answers `/livereload` and `/livereload.js` when livereload
//! is on, plus the static mount when one is configured.

mod access;
mod content;
mod lifecycle;
mod path;
mod response;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use axum::Router;
use axum::extract::State;
use axum::http::{Method, Uri};
use axum::middleware;
use axum::response::Response;
use tokio::net::TcpListener;

use crate::actor::app::{AppSupervisor, ReadinessProbe, SubprocessRunner};
use crate::actor::fs::ChangeWatcher;
use crate::actor::live::LiveReloadTask;
use crate::actor::{Coordinator, Exit};
use crate::config::DevConfig;
use crate::logger::Logger;
use crate::reload::broadcast::{ReloadBroadcaster, StaticMount};
use crate::reload::registry::ConnectionRegistry;
use crate::reload::server::livereload_routes;
use path::{normalize_url, resolve_path, strip_mount};
use response::{
    ServeOptions, respond_file, respond_method_not_allowed, respond_not_found,
    respond_plain_not_found,
};

/// Delay between attempts while waiting for the app port to free up.
const PORT_CHECK_DELAY: Duration = Duration::from_secs(1);

/// Static directory mounted on the aux server.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    pub dir: PathBuf,
    pub url: String,
    pub options: ServeOptions,
}

/// Build the aux server application.
///
/// Without `livereload` the websocket and script routes are not mounted.
pub fn aux_router(
    registry: ConnectionRegistry,
    static_files: Option<StaticFiles>,
    livereload: bool,
    logger: Logger,
) -> Router {
    let fallback = match static_files {
        Some(files) => Router::new()
            .fallback(serve_mounted)
            .with_state(Arc::new(files)),
        None => Router::new().fallback(|| async { respond_plain_not_found() }),
    };
    let routes = if livereload {
        livereload_routes(registry, logger.clone()).merge(fallback)
    } else {
        fallback
    };
    routes.layer(middleware::from_fn_with_state(logger, access::access_log))
}

async fn serve_mounted(
    State(files): State<Arc<StaticFiles>>,
    method: Method,
    uri: Uri,
) -> Response {
    if method != Method::GET && method != Method::HEAD {
        return respond_method_not_allowed();
    }
    let Some(rest) = strip_mount(uri.path(), &files.url) else {
        return respond_plain_not_found();
    };
    match resolve_path(rest, &files.dir) {
        Some(file) => respond_file(&file, files.options).await,
        None => respond_not_found(&normalize_url(rest), &files.dir),
    }
}

/// `adev runserver`: supervise the app and serve livereload next to it.
pub async fn runserver(config: DevConfig, logger: Logger) -> Result<()> {
    let Some(app) = config.app.clone() else {
        bail!("no app configured");
    };
    let serve_log = logger.child("serve");

    lifecycle::check_port_open(config.main_port, PORT_CHECK_DELAY, &serve_log).await?;

    let registry = ConnectionRegistry::new();
    let mount = static_mount(&config);
    let broadcaster = ReloadBroadcaster::new(registry.clone(), mount.clone(), logger.child("reload"));
    let mut coordinator = Coordinator::new(registry.clone(), serve_log.clone());

    let listener = lifecycle::bind_aux(config.aux_port).await?;
    let router = aux_router(
        registry,
        static_files(&config),
        config.livereload,
        logger.child("aux"),
    );
    spawn_server(&mut coordinator, listener, router);

    let app_log = logger.child("app");
    let changes = ChangeWatcher::new(&app.code_dir, config.reload.debounce, logger.child("watch"))
        .with_context(|| format!("cannot watch {}", app.code_dir.display()))?;
    let runner = SubprocessRunner::new(app.command.clone(), app_log.clone())
        .with_grace(config.reload.stop_grace, config.reload.kill_grace);
    let probe = ReadinessProbe::new(
        ReadinessProbe::app_url(&config.host, config.main_port)?,
        config.reload.probe_attempts,
        config.reload.probe_delay,
        app_log.clone(),
    )?;
    let supervisor = AppSupervisor::new(
        runner,
        changes,
        config.classifier(),
        broadcaster.clone(),
        probe,
        config.app_url(),
        app_log,
    );
    coordinator.set_app(supervisor.spawn(coordinator.failure_token()));

    if config.livereload
        && let Some(mount) = &mount
    {
        spawn_static_watch(&mut coordinator, mount, &config, broadcaster, &logger)?;
    }

    crate::log!(serve_log; "Starting aux server at {} ◆", config.aux_url());
    log_static_mapping(&config, &serve_log);

    finish(coordinator, serve_log).await
}

/// `adev serve DIR`: static files and livereload on one port.
pub async fn serve_static(config: DevConfig, logger: Logger) -> Result<()> {
    let serve_log = logger.child("serve");
    let registry = ConnectionRegistry::new();
    let mount = static_mount(&config);
    let broadcaster = ReloadBroadcaster::new(registry.clone(), mount.clone(), logger.child("reload"));
    let mut coordinator = Coordinator::new(registry.clone(), serve_log.clone());

    let listener = lifecycle::bind_aux(config.aux_port).await?;
    let router = aux_router(
        registry,
        static_files(&config),
        config.livereload,
        logger.child("aux"),
    );
    spawn_server(&mut coordinator, listener, router);

    if config.livereload
        && let Some(mount) = &mount
    {
        spawn_static_watch(&mut coordinator, mount, &config, broadcaster, &logger)?;
    }

    if let Some(dir) = &config.static_path {
        crate::log!(serve_log; "serving {} at {} ◆", dir.display(), config.aux_url());
    }
    crate::debug!(serve_log; "livereload {}", if config.livereload { "enabled" } else { "disabled" });

    finish(coordinator, serve_log).await
}

fn static_mount(config: &DevConfig) -> Option<StaticMount> {
    config.static_path.clone().map(|dir| StaticMount {
        dir,
        url: config.static_url.clone(),
    })
}

fn static_files(config: &DevConfig) -> Option<StaticFiles> {
    config.static_path.clone().map(|dir| StaticFiles {
        dir,
        url: config.static_url.clone(),
        options: ServeOptions {
            livereload: config.livereload,
            browser_cache: config.browser_cache,
        },
    })
}

fn spawn_server(coordinator: &mut Coordinator, listener: TcpListener, router: Router) {
    let shutdown = coordinator.shutdown_token();
    let server = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown.cancelled_owned())
            .await
    });
    coordinator.set_server(server);
}

fn spawn_static_watch(
    coordinator: &mut Coordinator,
    mount: &StaticMount,
    config: &DevConfig,
    broadcaster: ReloadBroadcaster,
    logger: &Logger,
) -> Result<()> {
    let changes = ChangeWatcher::new(&mount.dir, config.reload.debounce, logger.child("watch"))
        .with_context(|| format!("cannot watch {}", mount.dir.display()))?;
    let task = LiveReloadTask::spawn(
        changes,
        broadcaster,
        logger.child("reload"),
        coordinator.failure_token(),
    );
    coordinator.set_static_watch(task);
    Ok(())
}

fn log_static_mapping(config: &DevConfig, logger: &Logger) {
    if let (Some(dir), Some(url)) = (&config.static_path, config.static_public_url()) {
        let shown = dir
            .strip_prefix(&config.root)
            .map_or_else(|_| dir.display().to_string(), |rel| format!("./{}", rel.display()));
        crate::log!(logger; "serving static files from {} at {}", shown, url);
    }
}

/// Wait for Ctrl+C or a failure, then shut everything down.
async fn finish(coordinator: Coordinator, logger: Logger) -> Result<()> {
    let exit = coordinator.wait().await;
    if exit == Exit::Interrupted {
        crate::log!(logger; "shutting down server...");
    }

    let started = Instant::now();
    let closed = coordinator.close().await;
    crate::debug!(logger; "shutdown took {:.2}s", started.elapsed().as_secs_f64());

    // a failed task hands its error back from close()
    closed.map_err(Into::into)
}

#[cfg(test)]
mod tests;
