//! Path normalization utilities.
//!
//! - `normalize_path` - file system paths (canonicalize + fallback)
//! - `resolve_under` - `~` expansion and resolution of user supplied paths
//! - `public_url` - map a file under a served directory to its URL

use std::path::{Component, Path, PathBuf};

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first (resolves symlinks, `.`, `..`).
/// Falls back to joining with the current directory for paths that do not
/// exist (a deleted file still needs a stable key).
#[inline]
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        }
    })
}

/// Expand a leading `~`, then resolve relative paths against `base`.
pub fn resolve_under(base: &Path, path: &Path) -> PathBuf {
    let expanded = shellexpand::tilde(&path.to_string_lossy()).into_owned();
    let path = Path::new(&expanded);
    if path.is_absolute() {
        normalize_path(path)
    } else {
        normalize_path(&base.join(path))
    }
}

/// URL for `path` when `root` is mounted at `url_prefix`.
///
/// Returns `None` if `path` is not inside `root`.
///
/// ```ignore
/// public_url(Path::new("/p/static/css/a.css"), Path::new("/p/static"), "/static/")
///     == Some("/static/css/a.css")
/// ```
pub fn public_url(path: &Path, root: &Path, url_prefix: &str) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let mut url = url_prefix.trim_end_matches('/').to_string();
    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                url.push('/');
                url.push_str(&part.to_string_lossy());
            }
            Component::CurDir => {}
            _ => return None,
        }
    }
    if url.is_empty() {
        url.push('/');
    }
    Some(url)
}
