//! Reload Module
//!
//! Browser side of the dev server: who is connected, what they are looking
//! at, and how a file change turns into `reload` frames.
//!
//! # Modules
//!
//! - `message` - LiveReload protocol frames (hello, info, reload)
//! - `registry` - connected sessions and the page each one shows
//! - `classify` - file change → restart / full reload / asset reload
//! - `broadcast` - sends `reload` frames to the matching sessions
//! - `server` - `/livereload` websocket and `/livereload.js` routes

pub mod broadcast;
pub mod classify;
pub mod message;
pub mod registry;
pub mod server;
