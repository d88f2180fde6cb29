//! Command-line interface module.

mod args;
pub mod serve;

pub use args::{Cli, Commands, RunserverArgs, ServeArgs};
