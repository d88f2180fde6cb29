//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Development server for Python web apps with browser live reload
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run an app, restarting it on code changes and reloading browsers
    #[command(visible_alias = "rs")]
    Runserver {
        #[command(flatten)]
        args: RunserverArgs,
    },

    /// Serve a directory of static files with live reload
    Serve {
        #[command(flatten)]
        args: ServeArgs,
    },
}

/// Runserver command arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct RunserverArgs {
    /// App file, or a directory containing app.py or main.py
    #[arg(env = "AIO_APP_PATH", value_hint = clap::ValueHint::AnyPath)]
    pub app_path: Option<PathBuf>,

    /// Static files directory to serve and watch
    #[arg(short = 's', long = "static", env = "AIO_STATIC_PATH", value_hint = clap::ValueHint::DirPath)]
    pub static_path: Option<PathBuf>,

    /// Project root, relative paths are resolved against it (default: current directory)
    #[arg(long, env = "AIO_ROOT", value_hint = clap::ValueHint::DirPath)]
    pub root: Option<PathBuf>,

    /// URL path static files are served under
    #[arg(long, env = "AIO_STATIC_URL")]
    pub static_url: Option<String>,

    /// Reload browsers on changes
    #[arg(long, env = "AIO_LIVERELOAD", action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub livereload: Option<bool>,

    /// Host shown in links and used for the readiness probe (default: localhost)
    #[arg(long, env = "AIO_HOST")]
    pub host: Option<String>,

    /// Port the app listens on
    #[arg(short = 'p', long = "port", env = "AIO_PORT")]
    pub main_port: Option<u16>,

    /// Port of the aux server (default: app port + 1)
    #[arg(long, env = "AIO_AUX_PORT")]
    pub aux_port: Option<u16>,

    /// Command that runs the app, split on whitespace; `{app}` and `{port}` are substituted
    #[arg(long, env = "AIO_APP_COMMAND")]
    pub app_command: Option<String>,

    /// Let browsers cache static files
    #[arg(long, env = "AIO_BROWSER_CACHE", action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub browser_cache: Option<bool>,

    /// Enable verbose output for debugging
    #[arg(short, long, env = "AIO_VERBOSE")]
    pub verbose: bool,
}

/// Serve command arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct ServeArgs {
    /// Directory to serve
    #[arg(value_hint = clap::ValueHint::DirPath)]
    pub path: PathBuf,

    /// Reload browsers on changes
    #[arg(long, env = "AIO_LIVERELOAD", action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub livereload: Option<bool>,

    /// Port number to listen on
    #[arg(short, long, env = "AIO_PORT", default_value_t = 8000)]
    pub port: u16,

    /// Enable verbose output for debugging
    #[arg(short, long, env = "AIO_VERBOSE")]
    pub verbose: bool,
}

impl Cli {
    pub fn verbose(&self) -> bool {
        match &self.command {
            Commands::Runserver { args } => args.verbose,
            Commands::Serve { args } => args.verbose,
        }
    }
}
