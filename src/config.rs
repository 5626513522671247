//! Application settings.
//!
//! Every field has a default, so a settings file only needs the values it
//! changes:
//!
//! ```
//! use crud_kit::config::Settings;
//!
//! let settings = Settings::from_json_str(r#"{ "default_ttl_ms": 60000 }"#).unwrap();
//! assert_eq!(settings.default_ttl().as_secs(), 60);
//! assert_eq!(settings.cache_prefix, "app_cache_");
//! ```

use crate::error::{Error, Result};
use crate::key::DEFAULT_CACHE_PREFIX;
use crate::notification::DEFAULT_DISPLAY_DURATION;
use crate::observability::DEFAULT_TTL;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Base URL of the JSON API backing the resource services.
pub const DEFAULT_API_BASE_URL: &str = "https://jsonplaceholder.typicode.com";

/// Top-level settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api_base_url: String,
    pub cache_prefix: String,
    pub default_ttl_ms: u64,
    pub notification_duration_ms: u64,
    pub messages: Messages,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            cache_prefix: DEFAULT_CACHE_PREFIX.to_string(),
            default_ttl_ms: DEFAULT_TTL.as_millis() as u64,
            notification_duration_ms: DEFAULT_DISPLAY_DURATION.as_millis() as u64,
            messages: Messages::default(),
        }
    }
}

impl Settings {
    /// Parse settings from JSON and validate them.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(json)
            .map_err(|e| Error::ConfigError(format!("Invalid settings: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings the cache layer cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.api_base_url.trim().is_empty() {
            return Err(Error::ConfigError("api_base_url must not be empty".into()));
        }
        if self.default_ttl_ms == 0 {
            return Err(Error::ConfigError("default_ttl_ms must be positive".into()));
        }
        Ok(())
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub fn with_cache_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.cache_prefix = prefix.into();
        self
    }

    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl_ms = ttl.as_millis() as u64;
        self
    }

    pub fn with_notification_duration(mut self, duration: Duration) -> Self {
        self.notification_duration_ms = duration.as_millis() as u64;
        self
    }

    pub fn with_messages(mut self, messages: Messages) -> Self {
        self.messages = messages;
        self
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.default_ttl_ms)
    }

    pub fn notification_duration(&self) -> Duration {
        Duration::from_millis(self.notification_duration_ms)
    }
}

/// Texts shown by a resource controller.
///
/// The `*_failed` texts are fallbacks, used only when the error itself has
/// nothing better to say.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Messages {
    pub fetch_failed: String,
    pub create_succeeded: String,
    pub create_failed: String,
    pub update_succeeded: String,
    pub update_failed: String,
    pub delete_succeeded: String,
    pub delete_failed: String,
}

impl Default for Messages {
    fn default() -> Self {
        Messages {
            fetch_failed: "Failed to fetch data".to_string(),
            create_succeeded: "Congratulations! The user has been added".to_string(),
            create_failed: "Failed to add the user".to_string(),
            update_succeeded: "Congratulations! The user has been updated".to_string(),
            update_failed: "Failed to update the user".to_string(),
            delete_succeeded: "Congratulations! The user has been deleted".to_string(),
            delete_failed: "Failed to delete the user".to_string(),
        }
    }
}

impl Messages {
    /// Generic texts for a resource named `name`, e.g. "post".
    pub fn for_resource(name: &str) -> Self {
        Messages {
            fetch_failed: "Failed to fetch data".to_string(),
            create_succeeded: format!("Congratulations! The {} has been added", name),
            create_failed: format!("Failed to add the {}", name),
            update_succeeded: format!("Congratulations! The {} has been updated", name),
            update_failed: format!("Failed to update the {}", name),
            delete_succeeded: format!("Congratulations! The {} has been deleted", name),
            delete_failed: format!("Failed to delete the {}", name),
        }
    }
}
