//! URL to filesystem path resolution.

use std::path::{Path, PathBuf};

/// Part of a request path below the mount point, or `None` if outside it.
///
/// `/static/` mounted: `/static/css/a.css` → `css/a.css`, `/static` → ``.
pub fn strip_mount<'a>(request_path: &'a str, mount_url: &str) -> Option<&'a str> {
    let prefix = mount_url.trim_end_matches('/');
    let rest = request_path.strip_prefix(prefix)?;
    if rest.is_empty() {
        return Some("");
    }
    rest.strip_prefix('/')
}

/// Resolve a mounted URL path to a file.
///
/// Directories serve their `index.html`; a missing `foo` falls back to
/// `foo.html`. Anything resolving outside `serve_root` is rejected.
pub fn resolve_path(url: &str, serve_root: &Path) -> Option<PathBuf> {
    let clean = normalize_url(url);

    if clean.split('/').any(|part| part == "..") {
        return None;
    }

    let root_canonical = serve_root.canonicalize().ok()?;
    let local = serve_root.join(&clean);

    if let Some(found) = existing_file(&local, &root_canonical) {
        return Some(found);
    }
    if clean.is_empty() {
        return None;
    }
    existing_file(&serve_root.join(format!("{clean}.html")), &root_canonical)
}

fn existing_file(local: &Path, root_canonical: &Path) -> Option<PathBuf> {
    // Canonicalize to resolve symlinks and verify path is under serve_root
    let canonical = local.canonicalize().ok()?;
    if !canonical.starts_with(root_canonical) {
        return None;
    }

    if canonical.is_file() {
        return Some(canonical);
    }
    let index = canonical.join("index.html");
    index.is_file().then_some(index)
}

/// Normalize URL: decode, strip query string, trim slashes
pub fn normalize_url(url: &str) -> String {
    use percent_encoding::percent_decode_str;
    let path = url.split('?').next().unwrap_or(url);
    let decoded = percent_decode_str(path)
        .decode_utf8()
        .map(std::borrow::Cow::into_owned)
        .unwrap_or_default();
    decoded.trim_matches('/').to_string()
}
