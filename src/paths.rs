//! XDG directory helpers for config/data locations.

use std::path::PathBuf;

/// Base directory for agent state (lock file, working copies, logs).
///
/// Uses `SVN_AGENT_DATA_DIR` if set, otherwise `$XDG_DATA_HOME/svn-agent` or
/// `~/.local/share/svn-agent`.
pub(crate) fn data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("SVN_AGENT_DATA_DIR")
        && !dir.trim().is_empty()
    {
        return PathBuf::from(dir);
    }

    std::env::var("XDG_DATA_HOME")
        .ok()
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("/tmp"))
                .join(".local")
                .join("share")
        })
        .join("svn-agent")
}

/// Base directory for configuration files.
///
/// Uses `SVN_AGENT_CONFIG_DIR` if set, otherwise `$XDG_CONFIG_HOME/svn-agent`
/// or `~/.config/svn-agent`.
pub(crate) fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("SVN_AGENT_CONFIG_DIR")
        && !dir.trim().is_empty()
    {
        return PathBuf::from(dir);
    }

    std::env::var("XDG_CONFIG_HOME")
        .ok()
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("/tmp"))
                .join(".config")
        })
        .join("svn-agent")
}

/// Default directory for rolling log files.
pub(crate) fn log_dir() -> PathBuf {
    data_dir().join("logs")
}
