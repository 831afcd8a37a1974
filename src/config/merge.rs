use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::{Config, ConfigLayer};

pub fn merge_layers(layers: impl IntoIterator<Item = ConfigLayer>) -> Config {
    let mut config = Config::default();
    for layer in layers {
        layer.apply_to(&mut config);
    }
    config
}

/// An env override that was set but could not be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvWarning {
    pub var: &'static str,
    pub value: String,
}

impl fmt::Display for EnvWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}, ignoring: {}", self.var, self.value)
    }
}

/// Config is loaded before logging exists, so rejected values are handed
/// back for the caller to report.
pub fn apply_env_overrides(config: &mut Config) -> Vec<EnvWarning> {
    apply_overrides_from(config, |key| std::env::var(key).ok())
}

/// Env overrides read through `lookup`, so tests never touch the process env.
pub(crate) fn apply_overrides_from(
    config: &mut Config,
    lookup: impl Fn(&str) -> Option<String>,
) -> Vec<EnvWarning> {
    let mut warnings = Vec::new();
    let var = |key: &str| {
        lookup(key)
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty())
    };

    if let Some(root) = var("SVN_AGENT_SVN_ROOT") {
        config.svn_root = root;
    }
    if let Some(dir) = var("SVN_AGENT_SVN_ROOT_DIR") {
        config.svn_root_dir = PathBuf::from(dir);
    }
    if let Some(dir) = var("SVN_AGENT_ROOT_DIR") {
        config.root_dir = PathBuf::from(dir);
    }
    if let Some(name) = var("SVN_AGENT_MUTEX_NAME") {
        config.lock_name = name;
    }
    if let Some(bin) = var("SVN_AGENT_SVN_BIN") {
        config.svn_bin = PathBuf::from(bin);
    }
    if let Some(raw) = var("SVN_AGENT_WINDOWS_PATHS") {
        match parse_flag(&raw) {
            Some(flag) => config.windows_paths = flag,
            None => warnings.push(EnvWarning {
                var: "SVN_AGENT_WINDOWS_PATHS",
                value: raw,
            }),
        }
    }
    if let Some(raw) = var("SVN_AGENT_TIMEOUT") {
        match parse_positive::<u64>(&raw) {
            Some(secs) => config.default_timeout_secs = secs,
            None => warnings.push(EnvWarning {
                var: "SVN_AGENT_TIMEOUT",
                value: raw,
            }),
        }
    }
    warnings
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_positive<T: FromStr + PartialOrd + Default>(raw: &str) -> Option<T> {
    raw.parse::<T>().ok().filter(|value| *value > T::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn merge_layers_respects_precedence() {
        let user = ConfigLayer {
            lock_name: Some("user".into()),
            default_timeout_secs: Some(30),
            ..ConfigLayer::default()
        };
        let explicit = ConfigLayer {
            lock_name: Some("explicit".into()),
            ..ConfigLayer::default()
        };

        let config = merge_layers([user, explicit]);
        assert_eq!(config.lock_name, "explicit");
        assert_eq!(config.default_timeout_secs, 30);
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = Config::default();
        let warnings = apply_overrides_from(
            &mut config,
            env(&[
                ("SVN_AGENT_SVN_ROOT", "https://svn.example.com/repo"),
                ("SVN_AGENT_SVN_ROOT_DIR", "/srv/wc"),
                ("SVN_AGENT_ROOT_DIR", "/var/lib/svn-agent"),
                ("SVN_AGENT_MUTEX_NAME", "ci-agent"),
                ("SVN_AGENT_SVN_BIN", "/opt/svn/bin/svn"),
                ("SVN_AGENT_WINDOWS_PATHS", "yes"),
                ("SVN_AGENT_TIMEOUT", " 120 "),
            ]),
        );

        assert_eq!(config.svn_root, "https://svn.example.com/repo");
        assert_eq!(config.svn_root_dir, PathBuf::from("/srv/wc"));
        assert_eq!(config.root_dir, PathBuf::from("/var/lib/svn-agent"));
        assert_eq!(config.lock_name, "ci-agent");
        assert_eq!(config.svn_bin, PathBuf::from("/opt/svn/bin/svn"));
        assert!(config.windows_paths);
        assert_eq!(config.default_timeout_secs, 120);
        assert!(warnings.is_empty());
    }

    #[test]
    fn invalid_env_values_are_ignored() {
        let mut config = Config::default();
        let before = config.windows_paths;
        let warnings = apply_overrides_from(
            &mut config,
            env(&[
                ("SVN_AGENT_TIMEOUT", "0"),
                ("SVN_AGENT_WINDOWS_PATHS", "maybe"),
                ("SVN_AGENT_MUTEX_NAME", "   "),
            ]),
        );
        assert_eq!(config.default_timeout_secs, 60);
        assert_eq!(config.windows_paths, before);
        assert_eq!(config.lock_name, "svn-agent");

        let shown: Vec<String> = warnings.iter().map(ToString::to_string).collect();
        assert_eq!(
            shown,
            [
                "invalid SVN_AGENT_WINDOWS_PATHS, ignoring: maybe",
                "invalid SVN_AGENT_TIMEOUT, ignoring: 0",
            ]
        );
    }
}
