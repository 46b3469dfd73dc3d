//! Custom error types for auto-typer.
//!
//! This module provides structured error types using `thiserror` for better
//! error handling and more informative error messages.

use std::io;
use thiserror::Error;

/// Main error type for auto-typer operations.
#[derive(Error, Debug)]
pub enum AutoTyperError {
    /// The job's message is empty or whitespace-only.
    #[error("message is empty")]
    EmptyMessage,

    /// The live injector has no usable input backend.
    #[error("input backend unavailable: {0}")]
    InjectorUnavailable(String),

    /// A run is already active on this scheduler.
    #[error("a typing run is already active")]
    AlreadyRunning,

    /// Keystroke emission failed at runtime.
    #[error("typing failed: {reason}")]
    Emission { reason: String },

    /// The specified key is invalid or unsupported.
    #[error("invalid key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    /// Error parsing duration string.
    #[error("invalid duration '{value}': {reason}")]
    InvalidDuration { value: String, reason: String },

    /// Job validation error.
    #[error("configuration error: {0}")]
    ConfigValidation(String),

    /// Error reading or parsing a job file.
    #[error("failed to load job from '{path}': {reason}")]
    ConfigLoad { path: String, reason: String },

    /// Error writing a job file.
    #[error("failed to save job to '{path}': {reason}")]
    ConfigSave { path: String, reason: String },

    /// Platform-specific operation is not supported.
    #[error("operation not supported on this platform: {0}")]
    UnsupportedPlatform(String),

    /// Error registering or handling the stop hotkey.
    #[error("hotkey error: {0}")]
    Hotkey(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for auto-typer operations.
pub type Result<T> = std::result::Result<T, AutoTyperError>;

impl AutoTyperError {
    /// Create a new InjectorUnavailable error.
    pub fn injector_unavailable(reason: impl Into<String>) -> Self {
        Self::InjectorUnavailable(reason.into())
    }

    /// Create a new Emission error.
    pub fn emission(reason: impl Into<String>) -> Self {
        Self::Emission {
            reason: reason.into(),
        }
    }

    /// Create a new InvalidKey error.
    pub fn invalid_key(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Create a new InvalidDuration error.
    pub fn invalid_duration(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDuration {
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a new ConfigValidation error.
    pub fn config_validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation(message.into())
    }

    /// Create a new ConfigLoad error.
    pub fn config_load(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a new ConfigSave error.
    pub fn config_save(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigSave {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a new UnsupportedPlatform error.
    pub fn unsupported_platform(message: impl Into<String>) -> Self {
        Self::UnsupportedPlatform(message.into())
    }

    /// Create a new Hotkey error.
    pub fn hotkey(message: impl Into<String>) -> Self {
        Self::Hotkey(message.into())
    }
}
