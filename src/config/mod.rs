//! Agent configuration: defaults, TOML layers, env overrides.

mod load;
mod merge;
mod schema;

pub use load::{
    ConfigError, Loaded, config_path, load, load_layer, load_or_default, load_user_config, render,
};
pub use merge::{EnvWarning, apply_env_overrides, merge_layers};
pub use schema::{
    Config, ConfigLayer, FileLoggingConfig, FileLoggingConfigOverride, LogFormat, LogRotation,
    LoggingConfig, LoggingConfigOverride,
};

impl ConfigError {
    pub fn transience(&self) -> crate::Transience {
        crate::Transience::Permanent
    }

    pub fn effect(&self) -> crate::Effect {
        crate::Effect::None
    }
}
