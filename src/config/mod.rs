mod settings;

use config::{Config, ConfigError, Environment, File};

use crate::dispatcher::{DispatcherOptions, FailurePolicy};

pub use settings::{
    DispatcherSettings, LoggingSettings, PartialDispatcherSettings, PartialLoggingSettings,
    PartialSettings, Settings,
};

/// Default file stem, resolved against the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/default";

/// Prefix of environment overrides, e.g. `PUBSUB_DISPATCHER__STRICT=true`.
pub const ENV_PREFIX: &str = "PUBSUB";

/// Loads the configuration from the default file and environment variables.
pub fn load_config() -> Result<Settings, ConfigError> {
    load_config_from(DEFAULT_CONFIG_PATH)
}

/// Loads `path` (any format `config` understands, optional) and environment
/// variables, then merges them over the default values.
///
/// A `.env` file in the working directory is read first if present.
pub fn load_config_from(path: &str) -> Result<Settings, ConfigError> {
    let _ = dotenvy::dotenv();

    let builder = Config::builder()
        .add_source(File::with_name(path).required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

    let config = builder.build()?;

    // Try to deserialize what is available
    let partial: PartialSettings = config.try_deserialize()?;

    let settings = partial.merge(Settings::default());
    settings.validate()?;
    Ok(settings)
}

impl Settings {
    /// Checks values that deserialize fine but cannot be used.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.separator()?;
        self.failure_policy()?;
        Ok(())
    }

    pub fn separator(&self) -> Result<char, ConfigError> {
        let mut chars = self.dispatcher.separator.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(ConfigError::Message(format!(
                "dispatcher.separator must be a single character, got '{}'",
                self.dispatcher.separator
            ))),
        }
    }

    pub fn failure_policy(&self) -> Result<FailurePolicy, ConfigError> {
        self.dispatcher
            .failure_policy
            .parse()
            .map_err(ConfigError::Message)
    }

    /// Dispatcher options described by these settings. Sinks are left unset.
    pub fn dispatcher_options(&self) -> Result<DispatcherOptions, ConfigError> {
        Ok(DispatcherOptions::default()
            .strict(self.dispatcher.strict)
            .separator(self.separator()?)
            .failure_policy(self.failure_policy()?))
    }
}
