//! Tracing subscriber setup. stdout carries the response frame, so every
//! sink here is stderr or a file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

use crate::config::{FileLoggingConfig, LogFormat, LogRotation, LoggingConfig};
use crate::paths;

const LOG_FILE_PREFIX: &str = "svn-agent.log";
const FILTER_ENV: &str = "SVN_AGENT_LOG";

#[derive(Clone, Debug)]
pub struct TelemetryConfig {
    pub verbosity: u8,
    pub logging: LoggingConfig,
}

impl TelemetryConfig {
    pub fn new(verbosity: u8, logging: LoggingConfig) -> Self {
        Self { verbosity, logging }
    }
}

pub fn is_test_env() -> bool {
    std::env::var_os("SVN_AGENT_TESTING").is_some()
        || std::env::var_os("RUST_TEST_THREADS").is_some()
}

/// Test runs never write into the user's log dir.
pub fn apply_agent_logging_defaults(logging: &mut LoggingConfig) {
    apply_agent_logging_defaults_inner(logging, is_test_env());
}

fn apply_agent_logging_defaults_inner(logging: &mut LoggingConfig, is_test_env: bool) {
    if is_test_env && logging.file.dir.is_none() {
        logging.file.enabled = false;
    }
}

pub struct TelemetryGuard {
    _guards: Vec<tracing_appender::non_blocking::WorkerGuard>,
}

pub fn init(config: TelemetryConfig) -> TelemetryGuard {
    let builder = EnvFilter::builder()
        .with_default_directive(level_from_verbosity(config.verbosity).into())
        .with_env_var(FILTER_ENV);
    let filter = match (&config.logging.filter, std::env::var_os(FILTER_ENV)) {
        (Some(directives), None) => builder.parse_lossy(directives),
        _ => builder.from_env_lossy(),
    };

    let mut guards = Vec::new();
    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

    if config.logging.stderr {
        layers.push(build_stderr_layer(config.logging.stderr_format));
    }

    let mut file_prune_report = None;
    let mut file_setup_error = None;
    if config.logging.file.enabled {
        let dir = resolve_log_dir(&config.logging.file);
        match fs::create_dir_all(&dir) {
            Ok(()) => {
                let retention = RetentionLimits::from_file_config(&config.logging.file);
                if retention.is_enabled() {
                    match prune_logs(&dir, LOG_FILE_PREFIX, retention, SystemTime::now()) {
                        Ok(report) => file_prune_report = Some(report),
                        Err(err) => {
                            file_setup_error = Some(format!("log retention failed: {err}"));
                        }
                    }
                }

                let (layer, guard) = build_file_layer(&config.logging.file, &dir);
                layers.push(layer);
                guards.push(guard);
            }
            Err(err) => {
                file_setup_error =
                    Some(format!("log dir init failed for {}: {err}", dir.display()));
            }
        }
    }

    layers.push(Box::new(filter));

    // A second init (tests, embedding) keeps the first subscriber.
    if Registry::default().with(layers).try_init().is_err() {
        return TelemetryGuard { _guards: guards };
    }

    if let Some(report) = file_prune_report
        && report.removed + report.failed > 0
    {
        tracing::debug!(
            pruned = report.removed,
            failed = report.failed,
            candidates = report.candidates,
            "log retention applied"
        );
    }
    if let Some(error) = file_setup_error {
        tracing::warn!("{error}");
    }

    TelemetryGuard { _guards: guards }
}

fn build_stderr_layer(format: LogFormat) -> Box<dyn Layer<Registry> + Send + Sync> {
    match format {
        LogFormat::Tree => Box::new(
            tracing_tree::HierarchicalLayer::new(2).with_writer(std::io::stderr),
        ),
        LogFormat::Pretty => Box::new(
            tracing_subscriber::fmt::layer()
                .pretty()
                .with_writer(std::io::stderr)
                .with_target(true),
        ),
        LogFormat::Compact => Box::new(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(std::io::stderr)
                .with_target(false),
        ),
        LogFormat::Json => Box::new(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_current_span(true),
        ),
    }
}

fn build_file_layer(
    config: &FileLoggingConfig,
    dir: &Path,
) -> (
    Box<dyn Layer<Registry> + Send + Sync>,
    tracing_appender::non_blocking::WorkerGuard,
) {
    let rotation = match config.rotation {
        LogRotation::Daily => tracing_appender::rolling::Rotation::DAILY,
        LogRotation::Hourly => tracing_appender::rolling::Rotation::HOURLY,
        LogRotation::Never => tracing_appender::rolling::Rotation::NEVER,
    };
    let appender =
        tracing_appender::rolling::RollingFileAppender::new(rotation, dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let layer: Box<dyn Layer<Registry> + Send + Sync> = match config.format {
        LogFormat::Tree => Box::new(
            tracing_tree::HierarchicalLayer::new(2)
                .with_ansi(false)
                .with_writer(writer),
        ),
        LogFormat::Pretty => Box::new(
            tracing_subscriber::fmt::layer()
                .pretty()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true),
        ),
        LogFormat::Compact => Box::new(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true),
        ),
        LogFormat::Json => Box::new(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(writer)
                .with_target(true)
                .with_current_span(true),
        ),
    };
    (layer, guard)
}

fn level_from_verbosity(verbosity: u8) -> tracing::metadata::LevelFilter {
    match verbosity {
        0 => tracing::metadata::LevelFilter::INFO,
        1 => tracing::metadata::LevelFilter::DEBUG,
        _ => tracing::metadata::LevelFilter::TRACE,
    }
}

fn resolve_log_dir(config: &FileLoggingConfig) -> PathBuf {
    config.dir.clone().unwrap_or_else(paths::log_dir)
}

#[derive(Clone, Copy, Debug, Default)]
struct RetentionLimits {
    max_age: Option<Duration>,
    max_files: Option<usize>,
}

impl RetentionLimits {
    fn from_file_config(config: &FileLoggingConfig) -> Self {
        let max_age = config
            .retention_max_age_days
            .map(|days| Duration::from_secs(days.saturating_mul(24 * 60 * 60)));
        Self {
            max_age,
            max_files: config.retention_max_files,
        }
    }

    fn is_enabled(&self) -> bool {
        self.max_age.is_some() || self.max_files.is_some()
    }
}

#[derive(Clone, Debug)]
struct LogEntry {
    path: PathBuf,
    modified: SystemTime,
}

#[derive(Clone, Debug, Default)]
struct PruneReport {
    candidates: usize,
    removed: usize,
    failed: usize,
}

fn prune_logs(
    dir: &Path,
    prefix: &str,
    retention: RetentionLimits,
    now: SystemTime,
) -> std::io::Result<PruneReport> {
    let mut entries = collect_log_entries(dir, prefix, now)?;
    let candidates = entries.len();
    let mut report = PruneReport {
        candidates,
        ..PruneReport::default()
    };
    for path in prune_log_entries(&mut entries, retention, now) {
        match fs::remove_file(&path) {
            Ok(()) => report.removed += 1,
            Err(_) => report.failed += 1,
        }
    }
    Ok(report)
}

fn collect_log_entries(
    dir: &Path,
    prefix: &str,
    now: SystemTime,
) -> std::io::Result<Vec<LogEntry>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        if !name.starts_with(prefix) {
            continue;
        }
        let meta = entry.metadata()?;
        if !meta.is_file() {
            continue;
        }
        let modified = meta.modified().unwrap_or(now);
        entries.push(LogEntry { path, modified });
    }
    Ok(entries)
}

/// Oldest files go first: anything past `max_age`, then whatever exceeds
/// `max_files`.
fn prune_log_entries(
    entries: &mut Vec<LogEntry>,
    retention: RetentionLimits,
    now: SystemTime,
) -> Vec<PathBuf> {
    let mut removed = Vec::new();

    if let Some(max_age) = retention.max_age {
        let (expired, keep): (Vec<_>, Vec<_>) = entries.drain(..).partition(|entry| {
            now.duration_since(entry.modified).unwrap_or(Duration::ZERO) > max_age
        });
        removed.extend(expired.into_iter().map(|entry| entry.path));
        *entries = keep;
    }

    if let Some(max_files) = retention.max_files {
        entries.sort_by_key(|entry| entry.modified);
        let excess = entries.len().saturating_sub(max_files);
        removed.extend(entries.drain(..excess).map(|entry| entry.path));
    }

    removed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, now: SystemTime, age_secs: u64) -> LogEntry {
        LogEntry {
            path: PathBuf::from(name),
            modified: now - Duration::from_secs(age_secs),
        }
    }

    #[test]
    fn prune_log_entries_respects_age_and_count() {
        let now = SystemTime::UNIX_EPOCH + Duration::from_secs(10_000);
        let mut entries = vec![
            entry("old.log", now, 9_000),
            entry("mid.log", now, 500),
            entry("new.log", now, 40),
            entry("newest.log", now, 5),
        ];
        let retention = RetentionLimits {
            max_age: Some(Duration::from_secs(1_000)),
            max_files: Some(2),
        };

        let removed = prune_log_entries(&mut entries, retention, now);

        assert_eq!(
            removed,
            vec![PathBuf::from("old.log"), PathBuf::from("mid.log")]
        );
        let kept: Vec<_> = entries.iter().map(|e| e.path.clone()).collect();
        assert_eq!(
            kept,
            vec![PathBuf::from("new.log"), PathBuf::from("newest.log")]
        );
    }

    #[test]
    fn prune_logs_only_touches_agent_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("svn-agent.log.2026-01-01"), "x").unwrap();
        fs::write(dir.path().join("other.log"), "x").unwrap();

        let retention = RetentionLimits {
            max_age: None,
            max_files: Some(0),
        };
        let report = prune_logs(dir.path(), LOG_FILE_PREFIX, retention, SystemTime::now()).unwrap();
        assert_eq!(report.candidates, 1);
        assert_eq!(report.removed, 1);
        assert!(dir.path().join("other.log").exists());
    }

    #[test]
    fn file_logging_skipped_in_tests_unless_dir_given() {
        let mut logging = LoggingConfig::default();
        apply_agent_logging_defaults_inner(&mut logging, true);
        assert!(!logging.file.enabled);

        let mut logging = LoggingConfig::default();
        logging.file.dir = Some(PathBuf::from("/tmp/agent-logs"));
        apply_agent_logging_defaults_inner(&mut logging, true);
        assert!(logging.file.enabled);

        let mut logging = LoggingConfig::default();
        apply_agent_logging_defaults_inner(&mut logging, false);
        assert!(logging.file.enabled);
    }
}
