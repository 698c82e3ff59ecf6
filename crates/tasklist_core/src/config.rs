//! Core configuration.
//!
//! # Responsibility
//! - Hold the tunable limits shared by validation and persistence.
//! - Reject configurations that would break core invariants.
//!
//! # Invariants
//! - `max_text_len` is at least 1.
//! - `storage_key` is non-empty after trimming.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Default maximum task text length, in characters.
pub const DEFAULT_MAX_TEXT_LEN: usize = 100;
/// Default key under which the task collection blob is stored.
pub const DEFAULT_STORAGE_KEY: &str = "tasks";

/// Tunables for validation and persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    /// Upper bound on trimmed task text length (Unicode scalar values).
    pub max_text_len: usize,
    /// Fixed key for the serialized collection.
    pub storage_key: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            max_text_len: DEFAULT_MAX_TEXT_LEN,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

impl CoreConfig {
    pub fn with_max_text_len(mut self, max_text_len: usize) -> Self {
        self.max_text_len = max_text_len;
        self
    }

    pub fn with_storage_key(mut self, storage_key: impl Into<String>) -> Self {
        self.storage_key = storage_key.into();
        self
    }

    /// Checks the configuration before it is handed to the store.
    ///
    /// # Errors
    /// - `ZeroMaxTextLen` when no text could ever be valid.
    /// - `EmptyStorageKey` when the key is blank.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_text_len == 0 {
            return Err(ConfigError::ZeroMaxTextLen);
        }
        if self.storage_key.trim().is_empty() {
            return Err(ConfigError::EmptyStorageKey);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    ZeroMaxTextLen,
    EmptyStorageKey,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroMaxTextLen => write!(f, "max_text_len must be at least 1"),
            Self::EmptyStorageKey => write!(f, "storage_key cannot be empty"),
        }
    }
}

impl Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig, DEFAULT_MAX_TEXT_LEN};

    #[test]
    fn default_config_is_valid() {
        let config = CoreConfig::default();
        assert_eq!(config.max_text_len, DEFAULT_MAX_TEXT_LEN);
        assert_eq!(config.storage_key, "tasks");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_limit_and_blank_key() {
        let zero = CoreConfig::default().with_max_text_len(0);
        assert_eq!(zero.validate().unwrap_err(), ConfigError::ZeroMaxTextLen);

        let blank = CoreConfig::default().with_storage_key("   ");
        assert_eq!(blank.validate().unwrap_err(), ConfigError::EmptyStorageKey);
    }
}
