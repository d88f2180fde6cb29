//! Sections of the optional `adev.toml` file.
//!
//! ```toml
//! [app]
//! path = "."                      # file, or directory holding app.py / main.py
//! command = ["python3", "{app}"]  # {app} and {port} are substituted
//! code_dir = "."                  # default: directory of the app file
//! code_extensions = ["py"]
//! template_extensions = ["html", "jinja", "jinja2"]
//!
//! [serve]
//! host = "localhost"
//! main_port = 8000
//! aux_port = 8001                 # default: main_port + 1
//! static_path = "static"
//! static_url = "/static/"
//! livereload = true
//! browser_cache = false
//!
//! [reload]
//! probe_attempts = 20
//! probe_delay_ms = 100
//! stop_grace_ms = 5000
//! kill_grace_ms = 1000
//! debounce_ms = 300
//! ```
//!
//! Every key is optional. Command line flags win over the file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::error::ConfigError;
use crate::actor::app::probe::{DEFAULT_PROBE_ATTEMPTS, DEFAULT_PROBE_DELAY_MS};
use crate::actor::app::{DEFAULT_KILL_GRACE, DEFAULT_STOP_GRACE};
use crate::actor::fs::DEFAULT_DEBOUNCE_MS;
use crate::logger::Logger;

pub const CONFIG_FILE_NAME: &str = "adev.toml";

/// Root of `adev.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub app: AppSection,
    pub serve: ServeSection,
    pub reload: ReloadSection,
}

/// `[app]`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppSection {
    pub path: Option<PathBuf>,
    pub command: Option<Vec<String>>,
    pub code_dir: Option<PathBuf>,
    pub code_extensions: Option<Vec<String>>,
    pub template_extensions: Option<Vec<String>>,
}

/// `[serve]`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServeSection {
    pub host: Option<String>,
    pub main_port: Option<u16>,
    pub aux_port: Option<u16>,
    pub static_path: Option<PathBuf>,
    pub static_url: Option<String>,
    pub livereload: Option<bool>,
    pub browser_cache: Option<bool>,
}

/// `[reload]`
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReloadSection {
    pub probe_attempts: u32,
    pub probe_delay_ms: u64,
    pub stop_grace_ms: u64,
    pub kill_grace_ms: u64,
    pub debounce_ms: u64,
}

impl Default for ReloadSection {
    fn default() -> Self {
        Self {
            probe_attempts: DEFAULT_PROBE_ATTEMPTS,
            probe_delay_ms: DEFAULT_PROBE_DELAY_MS,
            stop_grace_ms: DEFAULT_STOP_GRACE.as_millis() as u64,
            kill_grace_ms: DEFAULT_KILL_GRACE.as_millis() as u64,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

impl FileConfig {
    /// Load `adev.toml` from `root`; a missing file means all defaults.
    pub fn load(root: &Path, logger: &Logger) -> Result<Self, ConfigError> {
        let path = root.join(CONFIG_FILE_NAME);
        if !path.is_file() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).map_err(|e| ConfigError::Io(path.clone(), e))?;
        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            crate::warn!(logger; "unknown fields in {}, ignoring: {}",
                CONFIG_FILE_NAME, ignored.join(", "));
        }
        crate::debug!(logger; "loaded {}", path.display());
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::Level;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_default() {
        let temp = TempDir::new().unwrap();
        let (logger, _) = Logger::capture("config");
        let config = FileConfig::load(temp.path(), &logger).unwrap();
        assert!(config.app.path.is_none());
        assert_eq!(config.reload.probe_attempts, 20);
        assert_eq!(config.reload.probe_delay_ms, 100);
        assert_eq!(config.reload.stop_grace_ms, 5000);
        assert_eq!(config.reload.kill_grace_ms, 1000);
    }

    #[test]
    fn test_sections_parse() {
        let (config, ignored) = FileConfig::parse_with_ignored(
            r#"
[app]
path = "src/app.py"
command = ["python3", "-X", "dev", "{app}"]

[serve]
main_port = 9000
static_path = "static"
livereload = false

[reload]
probe_attempts = 3
"#,
        )
        .unwrap();
        assert!(ignored.is_empty());
        assert_eq!(config.app.path.as_deref(), Some(Path::new("src/app.py")));
        assert_eq!(config.app.command.unwrap().len(), 4);
        assert_eq!(config.serve.main_port, Some(9000));
        assert_eq!(config.serve.livereload, Some(false));
        assert_eq!(config.reload.probe_attempts, 3);
        assert_eq!(config.reload.debounce_ms, 300);
    }

    #[test]
    fn test_unknown_fields_warn() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(CONFIG_FILE_NAME),
            "[serve]\nmain_port = 8080\nwatch = true\n",
        )
        .unwrap();

        let (logger, capture) = Logger::capture("config");
        let config = FileConfig::load(temp.path(), &logger).unwrap();
        assert_eq!(config.serve.main_port, Some(8080));
        assert!(capture.contains(Level::Warn, "serve.watch"));
    }

    #[test]
    fn test_bad_toml_is_error() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(CONFIG_FILE_NAME), "[serve\n").unwrap();
        let (logger, _) = Logger::capture("config");
        assert!(matches!(
            FileConfig::load(temp.path(), &logger),
            Err(ConfigError::Toml(_))
        ));
    }
}
