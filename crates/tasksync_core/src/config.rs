//! Tracker configuration.
//!
//! # Responsibility
//! - Name the synchronized list, the key prefix, and the notification channel.
//! - Load overrides from JSON with per-field defaults.
//!
//! # Invariants
//! - A validated config has a non-blank list name and key prefix.
//! - `notification_channel = None` disables add notifications.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const DEFAULT_LIST_NAME: &str = "todos";
pub const DEFAULT_KEY_PREFIX: &str = "todo/";
pub const DEFAULT_NOTIFICATION_CHANNEL: &str = "todos/added";

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    /// Input is not valid config JSON.
    Parse(serde_json::Error),
    /// A field holds a value the tracker cannot use.
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "invalid config json: {err}"),
            Self::Invalid { field, reason } => write!(f, "invalid config `{field}`: {reason}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::Invalid { .. } => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// Settings for one `TodoList`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Name of the synchronized list holding task keys.
    pub list_name: String,
    /// Prefix prepended to store-issued uids to form record keys.
    pub key_prefix: String,
    /// Channel receiving the trimmed title of every added task.
    pub notification_channel: Option<String>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            list_name: DEFAULT_LIST_NAME.to_string(),
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            notification_channel: Some(DEFAULT_NOTIFICATION_CHANNEL.to_string()),
        }
    }
}

impl TrackerConfig {
    /// Parses and validates a JSON config; missing fields take defaults.
    pub fn from_json_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.list_name.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "list_name",
                reason: "must not be blank",
            });
        }
        if self.key_prefix.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "key_prefix",
                reason: "must not be blank",
            });
        }
        if let Some(channel) = &self.notification_channel {
            if channel.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    field: "notification_channel",
                    reason: "must not be blank; use null to disable",
                });
            }
        }
        Ok(())
    }
}
