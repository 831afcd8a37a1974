use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::RequestLimits;
use crate::paths;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Repository root URL; request paths are appended to it.
    pub svn_root: String,
    /// Root of the local working copies.
    pub svn_root_dir: PathBuf,
    /// Agent state root: lock file and backups live here.
    pub root_dir: PathBuf,
    /// Name of the global agent lock.
    pub lock_name: String,
    /// The `svn` program to run.
    pub svn_bin: PathBuf,
    /// Hand Windows-style local paths to path-sensitive operations.
    pub windows_paths: bool,
    pub default_timeout_secs: u64,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = paths::data_dir();
        Self {
            svn_root: String::new(),
            svn_root_dir: data_dir.join("svn"),
            root_dir: data_dir,
            lock_name: "svn-agent".to_string(),
            svn_bin: PathBuf::from("svn"),
            windows_paths: cfg!(windows),
            default_timeout_secs: 60,
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    pub fn request_limits(&self) -> RequestLimits {
        RequestLimits {
            default_timeout: std::time::Duration::from_secs(
                self.default_timeout_secs
                    .clamp(1, RequestLimits::MAX_TIMEOUT.as_secs()),
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Tree,
    Pretty,
    Compact,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogRotation {
    Daily,
    Hourly,
    Never,
}

/// Log sinks. stdout is never one of them: it carries the response frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub stderr: bool,
    pub stderr_format: LogFormat,
    pub filter: Option<String>,
    pub file: FileLoggingConfig,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            stderr: false,
            stderr_format: LogFormat::Compact,
            filter: None,
            file: FileLoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    pub enabled: bool,
    pub dir: Option<PathBuf>,
    pub format: LogFormat,
    pub rotation: LogRotation,
    pub retention_max_age_days: Option<u64>,
    pub retention_max_files: Option<usize>,
}

impl Default for FileLoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
            format: LogFormat::Json,
            rotation: LogRotation::Daily,
            retention_max_age_days: Some(14),
            retention_max_files: Some(30),
        }
    }
}

/// One config file: every field optional, applied over what came before.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ConfigLayer {
    pub svn_root: Option<String>,
    pub svn_root_dir: Option<PathBuf>,
    pub root_dir: Option<PathBuf>,
    pub lock_name: Option<String>,
    pub svn_bin: Option<PathBuf>,
    pub windows_paths: Option<bool>,
    pub default_timeout_secs: Option<u64>,
    pub logging: Option<LoggingConfigOverride>,
}

impl ConfigLayer {
    pub fn apply_to(&self, target: &mut Config) {
        if let Some(root) = &self.svn_root {
            target.svn_root = root.clone();
        }
        if let Some(dir) = &self.svn_root_dir {
            target.svn_root_dir = dir.clone();
        }
        if let Some(dir) = &self.root_dir {
            target.root_dir = dir.clone();
        }
        if let Some(name) = &self.lock_name {
            target.lock_name = name.clone();
        }
        if let Some(bin) = &self.svn_bin {
            target.svn_bin = bin.clone();
        }
        if let Some(windows) = self.windows_paths {
            target.windows_paths = windows;
        }
        if let Some(secs) = self.default_timeout_secs {
            target.default_timeout_secs = secs;
        }
        if let Some(logging) = &self.logging {
            logging.apply_to(&mut target.logging);
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoggingConfigOverride {
    pub stderr: Option<bool>,
    pub stderr_format: Option<LogFormat>,
    pub filter: Option<String>,
    pub file: Option<FileLoggingConfigOverride>,
}

impl LoggingConfigOverride {
    pub fn apply_to(&self, target: &mut LoggingConfig) {
        if let Some(stderr) = self.stderr {
            target.stderr = stderr;
        }
        if let Some(format) = self.stderr_format {
            target.stderr_format = format;
        }
        if let Some(filter) = self.filter.as_ref() {
            target.filter = Some(filter.clone());
        }
        if let Some(file) = self.file.as_ref() {
            file.apply_to(&mut target.file);
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FileLoggingConfigOverride {
    pub enabled: Option<bool>,
    pub dir: Option<PathBuf>,
    pub format: Option<LogFormat>,
    pub rotation: Option<LogRotation>,
    pub retention_max_age_days: Option<u64>,
    pub retention_max_files: Option<usize>,
}

impl FileLoggingConfigOverride {
    pub fn apply_to(&self, target: &mut FileLoggingConfig) {
        if let Some(enabled) = self.enabled {
            target.enabled = enabled;
        }
        if let Some(dir) = self.dir.as_ref() {
            target.dir = Some(dir.clone());
        }
        if let Some(format) = self.format {
            target.format = format;
        }
        if let Some(rotation) = self.rotation {
            target.rotation = rotation;
        }
        if let Some(days) = self.retention_max_age_days {
            target.retention_max_age_days = Some(days);
        }
        if let Some(files) = self.retention_max_files {
            target.retention_max_files = Some(files);
        }
    }
}
