//! Background tasks of the dev server
//!
//! ```text
//! ChangeWatcher(app dir) ----> AppSupervisor ---restart/probe---> app process
//!                                    |
//!                                    v
//! ChangeWatcher(static) --> LiveReloadTask --> ReloadBroadcaster --> browsers
//!                                                      ^
//!                      LiveReloadSession (per socket) -+ (registry)
//! ```
//!
//! # Module Structure
//!
//! - `fs` - file watcher with debouncing
//! - `app` - app subprocess supervisor
//! - `live` - static directory watcher
//! - `ws` - websocket sessions speaking the LiveReload protocol
//! - `task` - spawn/close plumbing shared by the watch loops
//! - `coordinator` - owns everything and shuts it down in order

pub mod app;
pub mod coordinator;
pub mod error;
pub mod fs;
pub mod live;
pub mod task;
pub mod ws;

pub use coordinator::{Coordinator, Exit};
pub use error::DevServerError;
