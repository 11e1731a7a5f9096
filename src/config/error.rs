//! Error types for configuration and credential resolution.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while building the run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("config file not found: {path}")]
    NotFound {
        /// Path that was requested.
        path: PathBuf,
    },

    /// The config file exists but could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// Path of the config file.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid JSON for the expected shape.
    #[error("invalid JSON in config file {path}: {source}")]
    Parse {
        /// Path of the config file.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// An environment override could not be parsed.
    #[error("invalid value for environment variable {name}: '{value}'")]
    InvalidEnv {
        /// Variable name.
        name: &'static str,
        /// Raw value found in the environment.
        value: String,
    },

    /// A merged value is outside its accepted range.
    #[error("invalid config value for `{key}`: {message}")]
    Invalid {
        /// Config key that failed validation.
        key: &'static str,
        /// Human-readable constraint description.
        message: String,
    },
}

impl ConfigError {
    /// Creates a validation error for `key`.
    pub fn invalid(key: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            message: message.into(),
        }
    }
}

/// Errors raised while resolving login credentials.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// No source produced both a username and a password.
    #[error("username and password are required (config, CDVL_USERNAME/CDVL_PASSWORD, or prompt)")]
    Missing,

    /// Reading from the interactive prompt failed.
    #[error("failed to read credentials from terminal: {0}")]
    Prompt(#[source] std::io::Error),
}
