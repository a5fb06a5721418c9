#![forbid(unsafe_code)]

//! Editing configuration.
//!
//! [`EditingConfig`] groups the tunables of an editing session: history
//! limits and the typing coalescing window. Every field has a default, so
//! `EditingConfig::default()` gives unlimited coalescing and a 100-step,
//! 10 MB history.
//!
//! # Loading
//!
//! With the `config` feature the configuration can be read from TOML or
//! JSON; missing fields keep their defaults.
//!
//! ```toml
//! [history]
//! max_depth = 200
//!
//! [typing]
//! close_on_word_boundary = true
//! idle_timeout_ms = 1500
//! ```
//!
//! ```rust,ignore
//! let config = EditingConfig::from_toml_file("domedit.toml")?;
//! ```

#[cfg(feature = "config")]
use std::path::Path;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "config")]
use crate::error::ConfigError;

/// Configuration for the undo history.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct HistoryConfig {
    /// Maximum number of commands kept for undo.
    pub max_depth: usize,
    /// Maximum total bytes for all recorded commands (0 = unlimited).
    pub max_bytes: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_depth: 100,
            max_bytes: 10 * 1024 * 1024, // 10 MB
        }
    }
}

impl HistoryConfig {
    /// Create a configuration with custom limits.
    #[must_use]
    pub fn new(max_depth: usize, max_bytes: usize) -> Self {
        Self {
            max_depth,
            max_bytes,
        }
    }

    /// No depth or memory limit.
    #[must_use]
    pub fn unlimited() -> Self {
        Self {
            max_depth: usize::MAX,
            max_bytes: 0,
        }
    }
}

/// Limits on how long a typing command keeps absorbing keystrokes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct TypingConfig {
    /// Keystrokes coalesced into one typing command before a new one starts
    /// (0 = unlimited). Typed text counts one per character.
    pub max_coalesced_chars: usize,
    /// Start a new typing command when a word follows typed whitespace.
    pub close_on_word_boundary: bool,
    /// Idle time after which the next keystroke starts a new typing command
    /// (0 = never).
    pub idle_timeout_ms: u64,
}

impl TypingConfig {
    /// Coalesce every keystroke until typing is closed explicitly.
    #[must_use]
    pub fn unlimited() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_max_coalesced_chars(mut self, max: usize) -> Self {
        self.max_coalesced_chars = max;
        self
    }

    #[must_use]
    pub fn with_word_boundaries(mut self, enabled: bool) -> Self {
        self.close_on_word_boundary = enabled;
        self
    }

    #[must_use]
    pub fn with_idle_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.idle_timeout_ms = timeout_ms;
        self
    }
}

/// Top-level configuration of an [`EditingSession`](crate::EditingSession).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct EditingConfig {
    pub history: HistoryConfig,
    pub typing: TypingConfig,
}

impl EditingConfig {
    #[must_use]
    pub fn with_history(mut self, history: HistoryConfig) -> Self {
        self.history = history;
        self
    }

    #[must_use]
    pub fn with_typing(mut self, typing: TypingConfig) -> Self {
        self.typing = typing;
        self
    }

    /// Validate all parameters are within acceptable ranges.
    ///
    /// Returns a list of validation errors. An empty list means the config
    /// is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.history.max_depth == 0 {
            errors.push("history.max_depth must be at least 1".to_string());
        }
        if self.history.max_bytes > 0 && self.history.max_bytes < 64 {
            errors.push(format!(
                "history.max_bytes must be 0 (unlimited) or at least 64, got {}",
                self.history.max_bytes
            ));
        }
        errors
    }

    /// Load from a TOML string.
    #[cfg(feature = "config")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Self::checked(toml::from_str(s)?)
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "config")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Self::checked(serde_json::from_str(s)?)
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "config")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    #[cfg(feature = "config")]
    fn checked(config: Self) -> Result<Self, ConfigError> {
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}
