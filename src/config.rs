use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::ProbeArgs;

pub const DEFAULT_BIND: &str = "0.0.0.0:8080";
pub const DEFAULT_PAGE_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_LINK_TIMEOUT_SECS: u64 = 10;

/// Configuration file structure that mirrors CLI arguments
/// All fields are optional to allow partial configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Address the HTTP service listens on
    pub bind: Option<String>,

    /// Seconds allowed for fetching the analyzed page
    pub page_timeout_secs: Option<u64>,

    /// Seconds allowed for each link liveness probe
    pub link_timeout_secs: Option<u64>,

    /// Maximum number of simultaneous link probes
    pub max_concurrent_probes: Option<usize>,

    /// Count HTTP 4xx/5xx answers as inaccessible links
    pub count_http_errors: Option<bool>,

    /// Run the login form detector
    pub detect_login_form: Option<bool>,

    /// Verbose output
    pub verbose: Option<bool>,
}

/// Fully resolved analysis settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzerSettings {
    pub page_timeout: Duration,
    pub link_timeout: Duration,
    pub max_concurrent_probes: Option<usize>,
    pub count_http_errors: bool,
    pub detect_login_form: bool,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            page_timeout: Duration::from_secs(DEFAULT_PAGE_TIMEOUT_SECS),
            link_timeout: Duration::from_secs(DEFAULT_LINK_TIMEOUT_SECS),
            max_concurrent_probes: None,
            count_http_errors: false,
            detect_login_form: true,
        }
    }
}

/// Configuration file format based on file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
    Yaml,
}

impl ConfigFormat {
    /// Detect format from file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| match ext.to_lowercase().as_str() {
                "json" => Some(ConfigFormat::Json),
                "toml" => Some(ConfigFormat::Toml),
                "yaml" | "yml" => Some(ConfigFormat::Yaml),
                _ => None,
            })
    }

    /// Get file extensions for this format
    pub fn extensions(&self) -> &[&str] {
        match self {
            ConfigFormat::Json => &["json"],
            ConfigFormat::Toml => &["toml"],
            ConfigFormat::Yaml => &["yaml", "yml"],
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let format = ConfigFormat::from_path(path)
            .with_context(|| format!("Unsupported config file format: {}", path.display()))?;

        let config = match format {
            ConfigFormat::Json => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))?,
            ConfigFormat::Toml => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display()))?,
            ConfigFormat::Yaml => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?,
        };

        Ok(config)
    }

    /// Default configuration file paths, highest priority first: current
    /// directory, then the user config directory
    pub fn default_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        for format in &[ConfigFormat::Json, ConfigFormat::Toml, ConfigFormat::Yaml] {
            for ext in format.extensions() {
                paths.push(PathBuf::from(format!("pageprobe.{}", ext)));
            }
        }

        // XDG_CONFIG_HOME if set and non-empty, otherwise ~/.config
        let config_home = std::env::var("XDG_CONFIG_HOME")
            .ok()
            .and_then(|p| {
                if p.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(p))
                }
            })
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")));

        if let Some(config_home) = config_home {
            let app_config_dir = config_home.join("pageprobe");
            for format in &[ConfigFormat::Json, ConfigFormat::Toml, ConfigFormat::Yaml] {
                for ext in format.extensions() {
                    paths.push(app_config_dir.join(format!("config.{}", ext)));
                }
            }
        }

        paths
    }

    /// Try to load configuration from default paths
    /// Returns the first configuration file found, or None if no config exists
    pub fn from_default_paths() -> Result<Option<Self>> {
        for path in Self::default_paths() {
            if path.exists() {
                return Ok(Some(Self::from_file(&path)?));
            }
        }
        Ok(None)
    }

    /// Explicit path wins; otherwise the default paths; otherwise empty.
    pub fn load(explicit: Option<&str>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(Path::new(path)),
            None => Ok(Self::from_default_paths()?.unwrap_or_default()),
        }
    }

    /// Merge analysis flags into this configuration.
    /// CLI arguments take precedence over config file values
    pub fn merge_with_cli(&self, args: &ProbeArgs, verbose: bool) -> Config {
        Config {
            bind: self.bind.clone(),
            page_timeout_secs: args.page_timeout.or(self.page_timeout_secs),
            link_timeout_secs: args.link_timeout.or(self.link_timeout_secs),
            max_concurrent_probes: args.concurrency.or(self.max_concurrent_probes),
            count_http_errors: if args.count_http_errors {
                Some(true)
            } else {
                self.count_http_errors
            },
            detect_login_form: if args.no_login_form {
                Some(false)
            } else {
                self.detect_login_form
            },
            verbose: if verbose { Some(true) } else { self.verbose },
        }
    }

    /// Debug logging is on when either the flag or the config file asks for it.
    pub fn verbose_logging(&self, cli_verbose: bool) -> bool {
        cli_verbose || self.verbose.unwrap_or(false)
    }

    pub fn bind_addr(&self, cli_bind: Option<&str>) -> String {
        cli_bind
            .map(|s| s.to_string())
            .or_else(|| self.bind.clone())
            .unwrap_or_else(|| DEFAULT_BIND.to_string())
    }

    pub fn settings(&self) -> AnalyzerSettings {
        let defaults = AnalyzerSettings::default();
        AnalyzerSettings {
            page_timeout: self
                .page_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.page_timeout),
            link_timeout: self
                .link_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.link_timeout),
            max_concurrent_probes: self
                .max_concurrent_probes
                .filter(|n| *n > 0)
                .or(defaults.max_concurrent_probes),
            count_http_errors: self
                .count_http_errors
                .unwrap_or(defaults.count_http_errors),
            detect_login_form: self
                .detect_login_form
                .unwrap_or(defaults.detect_login_form),
        }
    }
}
