//! Small formatting helpers for log lines.

/// Return "s" suffix for plural counts
///
/// - `plural_s(0)` -> `"s"` (0 clients)
/// - `plural_s(1)` -> `""` (1 client)
#[inline]
pub fn plural_s(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}

/// Human readable body size for access logs.
///
/// Empty for zero, whole bytes under 1KB, one decimal KB above.
pub fn fmt_size(bytes: u64) -> String {
    if bytes == 0 {
        String::new()
    } else if bytes < 1024 {
        format!("{bytes}B")
    } else {
        format!("{:.1}KB", bytes as f64 / 1024.0)
    }
}
