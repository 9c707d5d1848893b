//! Runtime configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::engine::DuplicatePolicy;
use crate::error::ConfigError;

/// Configuration for `AdmissionRuntime`.
///
/// Every field has a default, so a partial JSON document is valid:
///
/// ```rust,ignore
/// let config = RuntimeConfig::from_json(r#"{ "shards": 8 }"#)?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Number of single-writer shards. A namespace always maps to one shard.
    pub shards: usize,
    /// Maximum queued writes per shard.
    pub queue_capacity: usize,
    /// How long `AdmissionRuntime::write` waits for a result.
    pub join_timeout_ms: u64,
    /// How duplicates are handled before commit. `Drop` runs the mutate
    /// policy ahead of validation, `Reject` validates the write as submitted.
    pub write_policy: DuplicatePolicy,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            shards: 4,
            queue_capacity: 1024,
            join_timeout_ms: 5_000,
            write_policy: DuplicatePolicy::Reject,
        }
    }
}

impl RuntimeConfig {
    /// Parse and validate a JSON document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every bound is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.shards == 0 {
            return Err(ConfigError::InvalidValue {
                field: "shards".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "queue_capacity".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.join_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "join_timeout_ms".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// `join_timeout_ms` as a `Duration`.
    #[must_use]
    pub const fn join_timeout(&self) -> Duration {
        Duration::from_millis(self.join_timeout_ms)
    }
}
