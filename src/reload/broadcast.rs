//! Reload Broadcaster
//!
//! Sends `reload` frames to registered browser sessions.
//!
//! Without a path every session reloads the page it is showing. With a path
//! inside the static directory the path is rewritten to its public URL; for
//! an HTML file only sessions showing that page are told, anything else
//! (css, images, scripts) goes to every session.

use std::path::{Path, PathBuf};

use super::message::ServerMessage;
use super::registry::ConnectionRegistry;
use crate::logger::Logger;
use crate::utils::format::plural_s;
use crate::utils::{mime, path::public_url};

/// Where the static directory is mounted.
#[derive(Debug, Clone)]
pub struct StaticMount {
    pub dir: PathBuf,
    pub url: String,
}

#[derive(Clone)]
pub struct ReloadBroadcaster {
    registry: ConnectionRegistry,
    mount: Option<StaticMount>,
    logger: Logger,
}

impl ReloadBroadcaster {
    pub fn new(registry: ConnectionRegistry, mount: Option<StaticMount>, logger: Logger) -> Self {
        Self {
            registry,
            mount,
            logger,
        }
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Prompt reloads. Returns the number of sessions that were sent a frame.
    pub fn broadcast(&self, changed: Option<&Path>) -> usize {
        let sessions = self.registry.snapshot();
        if sessions.is_empty() {
            return 0;
        }
        crate::debug!(self.logger; "prompting source reload for {} client{}",
            sessions.len(), plural_s(sessions.len()));

        let target = changed.and_then(|path| self.public_path(path));
        let html = target.as_deref().is_some_and(|t| mime::is_html(Path::new(t)));

        let mut sent = 0;
        for (session, url) in sessions {
            if html && let Some(target) = &target && !page_matches(target, &url) {
                crate::debug!(self.logger; "skipping client at {}", url);
                continue;
            }
            let path = target.clone().unwrap_or_else(|| url.clone());
            crate::debug!(self.logger; "reload client at {}", url);
            match session.send_text(ServerMessage::reload(path).to_json()) {
                Ok(()) => sent += 1,
                Err(e) => crate::error!(self.logger; "error broadcasting change to {}: {}", url, e),
            }
        }

        if sent > 0 {
            let what = target.as_deref().unwrap_or("page");
            crate::log!(self.logger; "prompted reload of {} on {} client{}", what, sent, plural_s(sent));
        }
        sent
    }

    /// Public URL of a changed file; `None` falls back to reloading each page.
    fn public_path(&self, path: &Path) -> Option<String> {
        let Some(mount) = &self.mount else {
            crate::debug!(self.logger; "no static directory, reloading pages for {}", path.display());
            return None;
        };
        let url = public_url(path, &mount.dir, &mount.url);
        if url.is_none() {
            crate::debug!(self.logger; "{} is outside {}, reloading pages", path.display(), mount.dir.display());
        }
        url
    }
}

/// Whether a session showing `page` is displaying the HTML file at `target`.
fn page_matches(target: &str, page: &str) -> bool {
    target == page
        || target == format!("{page}.html")
        || target == format!("{}/index.html", page.trim_end_matches('/'))
}
