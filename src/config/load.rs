use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::merge::{EnvWarning, apply_env_overrides, merge_layers};
use super::{Config, ConfigLayer};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to render config: {0}")]
    Render(#[from] toml::ser::Error),
}

pub fn config_path() -> PathBuf {
    crate::paths::config_dir().join("config.toml")
}

/// Read one layer. A missing file is an error here; callers decide
/// whether the file is optional.
pub fn load_layer(path: &Path) -> Result<ConfigLayer, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_user_config() -> Result<Option<ConfigLayer>, ConfigError> {
    let path = config_path();
    if !path.exists() {
        return Ok(None);
    }
    load_layer(&path).map(Some)
}

/// Effective config plus whatever went wrong building it.
#[derive(Debug)]
pub struct Loaded {
    pub config: Config,
    pub error: Option<ConfigError>,
    pub warnings: Vec<EnvWarning>,
}

/// Defaults, then the user file, then `explicit` (e.g. `--config`), then env.
pub fn load(explicit: Option<&Path>) -> Result<(Config, Vec<EnvWarning>), ConfigError> {
    let user = load_user_config()?;
    let explicit = explicit.map(load_layer).transpose()?;
    let mut config = merge_layers([user, explicit].into_iter().flatten());
    let warnings = apply_env_overrides(&mut config);
    Ok((config, warnings))
}

/// Like [`load`], but never fails: a broken file falls back to defaults
/// plus env, and the reason is returned for the caller to report.
pub fn load_or_default(explicit: Option<&Path>) -> Loaded {
    match load(explicit) {
        Ok((config, warnings)) => Loaded {
            config,
            error: None,
            warnings,
        },
        Err(err) => {
            let mut config = Config::default();
            let warnings = apply_env_overrides(&mut config);
            Loaded {
                config,
                error: Some(err),
                warnings,
            }
        }
    }
}

pub fn render(cfg: &Config) -> Result<String, ConfigError> {
    Ok(toml::to_string_pretty(cfg)?)
}
