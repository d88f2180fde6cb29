//! Shared helpers.

pub mod format;
pub mod mime;
pub mod path;
