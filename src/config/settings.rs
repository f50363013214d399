use serde::Deserialize;

/// Top-level configuration settings for the application.
///
/// Includes settings for both the dispatcher and logging.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Settings {
    pub dispatcher: DispatcherSettings,
    pub logging: LoggingSettings,
}

/// Configuration settings for a dispatcher.
///
/// `separator` must be a single character; `failure_policy` is `abort` or
/// `isolate`.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct DispatcherSettings {
    pub strict: bool,
    pub separator: String,
    pub failure_policy: String,
}

/// Configuration settings for logging.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LoggingSettings {
    pub level: String,
}

/// Partial configuration settings loaded from files or environment.
///
/// Allows partial specification of settings. Missing values can be filled using defaults.
#[derive(Debug, Deserialize, Default)]
pub struct PartialSettings {
    pub dispatcher: Option<PartialDispatcherSettings>,
    pub logging: Option<PartialLoggingSettings>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialDispatcherSettings {
    pub strict: Option<bool>,
    pub separator: Option<String>,
    pub failure_policy: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialLoggingSettings {
    pub level: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dispatcher: DispatcherSettings {
                strict: false,
                separator: ":".to_string(),
                failure_policy: "abort".to_string(),
            },
            logging: LoggingSettings {
                level: "info".to_string(),
            },
        }
    }
}

impl PartialSettings {
    /// Fills every missing value from `defaults`.
    pub fn merge(self, defaults: Settings) -> Settings {
        let dispatcher = self.dispatcher.unwrap_or_default();
        let logging = self.logging.unwrap_or_default();

        Settings {
            dispatcher: DispatcherSettings {
                strict: dispatcher.strict.unwrap_or(defaults.dispatcher.strict),
                separator: dispatcher
                    .separator
                    .unwrap_or(defaults.dispatcher.separator),
                failure_policy: dispatcher
                    .failure_policy
                    .unwrap_or(defaults.dispatcher.failure_policy),
            },
            logging: LoggingSettings {
                level: logging.level.unwrap_or(defaults.logging.level),
            },
        }
    }
}
