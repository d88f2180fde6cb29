//! Content processing for served files.

use std::fs;
use std::path::Path;

use crate::embed::serve::LIVERELOAD_SNIPPET;

/// Inject the livereload tag if the content is HTML.
pub fn maybe_inject_livereload(body: Vec<u8>, content_type: &str) -> Vec<u8> {
    if content_type.starts_with("text/html") {
        inject_livereload_script(&body)
    } else {
        body
    }
}

/// Insert the livereload tag before `</body>`, or append it.
fn inject_livereload_script(content: &[u8]) -> Vec<u8> {
    let script = LIVERELOAD_SNIPPET.as_bytes();
    const PATTERN: &[u8] = b"</body>";

    let mut result = Vec::with_capacity(content.len() + script.len());
    match content
        .windows(PATTERN.len())
        .rposition(|w| w.eq_ignore_ascii_case(PATTERN))
    {
        Some(pos) => {
            result.extend_from_slice(&content[..pos]);
            result.extend_from_slice(script);
            result.extend_from_slice(&content[pos..]);
        }
        None => {
            result.extend_from_slice(content);
            result.extend_from_slice(script);
        }
    }
    result
}

/// Plain text 404 body listing what does exist near the requested path.
pub fn not_found_listing(url: &str, serve_root: &Path) -> String {
    let mut dir = serve_root.join(url);
    while !dir.is_dir() && dir != serve_root && dir.starts_with(serve_root) {
        if !dir.pop() {
            break;
        }
    }
    if !dir.starts_with(serve_root) {
        dir = serve_root.to_path_buf();
    }

    let shown = match dir.strip_prefix(serve_root) {
        Ok(rel) if !rel.as_os_str().is_empty() => rel.display().to_string(),
        _ => ".".to_string(),
    };

    let mut entries: Vec<String> = fs::read_dir(&dir)
        .map(|iter| {
            iter.filter_map(Result::ok)
                .map(|e| {
                    let name = e.file_name().to_string_lossy().into_owned();
                    if e.path().is_dir() { format!("{name}/") } else { name }
                })
                .collect()
        })
        .unwrap_or_default();
    entries.sort();

    let listing: Vec<String> = entries.iter().map(|e| format!("  {e}")).collect();
    format!(
        "404: Not Found\n\nAvailable files under '{shown}/':\n{}\n",
        listing.join("\n")
    )
}
