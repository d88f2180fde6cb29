//! Dev server configuration.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── error      # ConfigError
//! ├── section    # [app], [serve], [reload] sections of adev.toml
//! └── mod.rs     # DevConfig (this file)
//! ```
//!
//! Priority, lowest first: defaults, `adev.toml` in the root directory,
//! `AIO_*` environment variables, command line flags. The two env/flag
//! layers are merged by clap before they get here.

pub mod error;
pub mod section;

pub use error::ConfigError;
pub use section::FileConfig;

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::actor::app::AppCommand;
use crate::cli::{RunserverArgs, ServeArgs};
use crate::embed::serve::script_tag;
use crate::logger::Logger;
use crate::reload::classify::{
    Classifier, DEFAULT_CODE_EXTENSIONS, DEFAULT_TEMPLATE_EXTENSIONS,
};
use crate::utils::path::resolve_under as resolve;
use section::ReloadSection;

/// Files looked for when the app path is a directory, in order.
const DEFAULT_APP_FILES: &[&str] = &["app.py", "main.py"];
const DEFAULT_PYTHON: &str = "python3";
const DEFAULT_HOST: &str = "localhost";
const DEFAULT_MAIN_PORT: u16 = 8000;
const DEFAULT_STATIC_URL: &str = "/static/";

/// Validated settings for one dev server session.
#[derive(Debug, Clone)]
pub struct DevConfig {
    pub root: PathBuf,
    /// `None` when only serving static files
    pub app: Option<AppConfig>,
    pub host: String,
    pub main_port: u16,
    pub aux_port: u16,
    pub static_path: Option<PathBuf>,
    pub static_url: String,
    pub livereload: bool,
    pub browser_cache: bool,
    pub reload: ReloadSettings,
}

/// How to run and watch the served app.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub command: AppCommand,
    pub code_dir: PathBuf,
    pub code_extensions: Vec<String>,
    pub template_extensions: Vec<String>,
}

/// Timing of restarts and reloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReloadSettings {
    pub probe_attempts: u32,
    pub probe_delay: Duration,
    pub stop_grace: Duration,
    pub kill_grace: Duration,
    pub debounce: Duration,
}

impl From<&ReloadSection> for ReloadSettings {
    fn from(section: &ReloadSection) -> Self {
        Self {
            probe_attempts: section.probe_attempts,
            probe_delay: Duration::from_millis(section.probe_delay_ms),
            stop_grace: Duration::from_millis(section.stop_grace_ms),
            kill_grace: Duration::from_millis(section.kill_grace_ms),
            debounce: Duration::from_millis(section.debounce_ms),
        }
    }
}

impl Default for ReloadSettings {
    fn default() -> Self {
        Self::from(&ReloadSection::default())
    }
}

impl DevConfig {
    /// Settings for `adev runserver`.
    pub fn for_runserver(args: &RunserverArgs, logger: &Logger) -> Result<Self, ConfigError> {
        let root = match &args.root {
            Some(root) => resolve(&std::env::current_dir().map_err(cwd_error)?, root),
            None => std::env::current_dir().map_err(cwd_error)?,
        };
        if !root.is_dir() {
            return Err(ConfigError::invalid(format!(
                "root \"{}\" is not a directory",
                root.display()
            )));
        }
        let file = FileConfig::load(&root, logger)?;

        let host = args
            .host
            .clone()
            .or_else(|| file.serve.host.clone())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let main_port = args
            .main_port
            .or(file.serve.main_port)
            .unwrap_or(DEFAULT_MAIN_PORT);
        let aux_port = match args.aux_port.or(file.serve.aux_port) {
            Some(port) => port,
            None => main_port.checked_add(1).ok_or_else(|| {
                ConfigError::invalid(format!("no aux port available after {main_port}"))
            })?,
        };
        if aux_port == main_port {
            return Err(ConfigError::invalid(format!(
                "app and aux server cannot share port {main_port}"
            )));
        }

        let static_path = args
            .static_path
            .as_deref()
            .or(file.serve.static_path.as_deref())
            .map(|p| resolve_dir(&root, p, "static path"))
            .transpose()?;
        let static_url = args
            .static_url
            .clone()
            .or_else(|| file.serve.static_url.clone())
            .unwrap_or_else(|| DEFAULT_STATIC_URL.to_string());

        let mut config = Self {
            root: root.clone(),
            app: None,
            host,
            main_port,
            aux_port,
            static_path,
            static_url: normalize_static_url(&static_url),
            livereload: args.livereload.or(file.serve.livereload).unwrap_or(true),
            browser_cache: args
                .browser_cache
                .or(file.serve.browser_cache)
                .unwrap_or(false),
            reload: ReloadSettings::from(&file.reload),
        };

        let app_path = args
            .app_path
            .as_deref()
            .or(file.app.path.as_deref())
            .unwrap_or(Path::new("."));
        let app_file = find_app_file(&resolve(&root, app_path))?;

        let raw_command = match &args.app_command {
            Some(command) => Some(command.split_whitespace().map(str::to_string).collect()),
            None => file.app.command.clone(),
        };
        let code_dir = match &file.app.code_dir {
            Some(dir) => resolve_dir(&root, dir, "code directory")?,
            None => app_file
                .parent()
                .map_or_else(|| root.clone(), Path::to_path_buf),
        };
        let command = config.app_command(&app_file, raw_command, &code_dir)?;

        config.app = Some(AppConfig {
            command,
            code_dir,
            code_extensions: file.app.code_extensions.clone().unwrap_or_else(|| {
                DEFAULT_CODE_EXTENSIONS.iter().map(|s| s.to_string()).collect()
            }),
            template_extensions: file.app.template_extensions.clone().unwrap_or_else(|| {
                DEFAULT_TEMPLATE_EXTENSIONS.iter().map(|s| s.to_string()).collect()
            }),
        });
        Ok(config)
    }

    /// Settings for `adev serve DIR`: the directory is mounted at `/`.
    pub fn for_static(args: &ServeArgs) -> Result<Self, ConfigError> {
        let cwd = std::env::current_dir().map_err(cwd_error)?;
        let dir = resolve_dir(&cwd, &args.path, "serve path")?;
        Ok(Self {
            root: dir.clone(),
            app: None,
            host: DEFAULT_HOST.to_string(),
            main_port: args.port,
            aux_port: args.port,
            static_path: Some(dir),
            static_url: "/".to_string(),
            livereload: args.livereload.unwrap_or(true),
            browser_cache: false,
            reload: ReloadSettings::default(),
        })
    }

    /// `http://{host}:{aux_port}`
    pub fn aux_url(&self) -> String {
        format!("http://{}:{}", self.host, self.aux_port)
    }

    /// `http://{host}:{main_port}`
    pub fn app_url(&self) -> String {
        format!("http://{}:{}", self.host, self.main_port)
    }

    /// Public URL of the static mount, when static files are configured.
    pub fn static_public_url(&self) -> Option<String> {
        self.static_path
            .as_ref()
            .map(|_| format!("{}{}", self.aux_url(), self.static_url))
    }

    /// Classifier for changes under the app's code directory.
    pub fn classifier(&self) -> Classifier {
        match &self.app {
            Some(app) => Classifier::new(
                app.code_extensions.clone(),
                app.template_extensions.clone(),
            ),
            None => Classifier::new(Vec::new(), Vec::new()),
        }
    }

    /// Environment handed to the app subprocess.
    fn app_env(&self) -> Vec<(String, String)> {
        let mut env = vec![
            ("PORT".to_string(), self.main_port.to_string()),
            ("HOST".to_string(), self.host.clone()),
            ("ADEV_AUX_URL".to_string(), self.aux_url()),
        ];
        if let Some(url) = self.static_public_url() {
            env.push(("ADEV_STATIC_URL".to_string(), url));
        }
        if self.livereload {
            env.push(("ADEV_LIVERELOAD_SCRIPT".to_string(), script_tag(&self.aux_url())));
        }
        env
    }

    fn app_command(
        &self,
        app_file: &Path,
        raw: Option<Vec<String>>,
        code_dir: &Path,
    ) -> Result<AppCommand, ConfigError> {
        let parts = match raw {
            Some(parts) if !parts.is_empty() => parts,
            Some(_) => return Err(ConfigError::invalid("app command is empty")),
            None => {
                if app_file.extension().and_then(|e| e.to_str()) != Some("py") {
                    return Err(ConfigError::invalid(format!(
                        "app file \"{}\" is not a python file, set an app command to run it",
                        app_file.display()
                    )));
                }
                vec![DEFAULT_PYTHON.to_string(), "{app}".to_string()]
            }
        };

        let app = app_file.display().to_string();
        let port = self.main_port.to_string();
        let mut parts = parts
            .into_iter()
            .map(|part| part.replace("{app}", &app).replace("{port}", &port));

        let program = parts
            .next()
            .ok_or_else(|| ConfigError::invalid("app command is empty"))?;
        let program = which::which(&program).map_err(|e| {
            ConfigError::invalid(format!("cannot run app command `{program}`: {e}"))
        })?;

        Ok(AppCommand {
            program,
            args: parts.collect(),
            env: self.app_env(),
            cwd: code_dir.to_path_buf(),
        })
    }
}

/// A file is used as is; a directory is searched for the default app files.
fn find_app_file(path: &Path) -> Result<PathBuf, ConfigError> {
    if path.is_file() {
        return Ok(path.to_path_buf());
    }
    if !path.exists() {
        return Err(ConfigError::invalid(format!(
            "app path \"{}\" does not exist",
            path.display()
        )));
    }
    DEFAULT_APP_FILES
        .iter()
        .map(|name| path.join(name))
        .find(|candidate| candidate.is_file())
        .ok_or_else(|| {
            ConfigError::invalid(format!(
                "unable to find a recognised default file (\"app.py\" or \"main.py\") in the directory \"{}\"",
                path.display()
            ))
        })
}

fn resolve_dir(base: &Path, path: &Path, what: &str) -> Result<PathBuf, ConfigError> {
    let dir = resolve(base, path);
    if dir.is_dir() {
        Ok(dir)
    } else {
        Err(ConfigError::invalid(format!(
            "{what} \"{}\" is not a directory",
            dir.display()
        )))
    }
}

/// `static` → `/static/`
fn normalize_static_url(url: &str) -> String {
    let trimmed = url.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{trimmed}/")
    }
}

fn cwd_error(e: std::io::Error) -> ConfigError {
    ConfigError::Io(PathBuf::from("."), e)
}
