//! Embedded static resources.
//!
//! # Module Structure
//!
//! - `serve` - aux server resources (livereload.js and the tag that loads it)

pub mod serve {
    /// URL the livereload client is served from.
    pub const LIVERELOAD_JS_URL: &str = "/livereload.js";

    /// Websocket endpoint the client connects to.
    pub const LIVERELOAD_WS_URL: &str = "/livereload";

    /// LiveReload browser client.
    pub const LIVERELOAD_JS: &str = include_str!("serve/livereload.js");

    /// Fixed modification date; the script never changes while running.
    pub const LIVERELOAD_LAST_MODIFIED: &str = "Fri, 01 Jan 2016 00:00:00 GMT";

    /// Tag injected into served HTML pages.
    pub const LIVERELOAD_SNIPPET: &str = "\n<script src=\"/livereload.js\"></script>\n";

    /// Tag for pages served by the app, pointing at the aux server.
    pub fn script_tag(aux_url: &str) -> String {
        format!(
            "<script src=\"{}{}\"></script>",
            aux_url.trim_end_matches('/'),
            LIVERELOAD_JS_URL
        )
    }

}
