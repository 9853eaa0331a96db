//! Configuration errors
//!
//! Every failure during configuration resolution is reported as a single
//! `ConfigError` kind. Messages always name the offending option path so
//! users can trace a complaint back to the line in their config files.

use std::path::PathBuf;

/// Configuration resolution errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Keys present in a value tree that the schema does not declare
    #[error("Unknown options in {path}: {}", .names.join(", "))]
    UnknownOptions { path: String, names: Vec<String> },

    /// A value whose type does not match its option declaration
    #[error("Type of {path} should be {expected}, not {actual}")]
    WrongType {
        path: String,
        expected: &'static str,
        actual: String,
    },

    /// A required option with no value after defaulting
    #[error("{path} requires a value")]
    MissingRequired { path: String },

    /// An invalid value or invalid combination of values
    #[error("{path}: {message}")]
    InvalidValue { path: String, message: String },

    /// A path lookup that descended into a missing or leaf node
    #[error("No value at {path}")]
    NoSuchPath { path: String },

    /// A relative path join that ascended above the configuration root
    #[error("Joining {base} with {suffix} ascends above the root")]
    AboveRoot { base: String, suffix: String },

    /// A config file that does not exist
    #[error("Config file {} not found", .path.display())]
    FileNotFound { path: PathBuf },

    /// A config file that exists but could not be read
    #[error("Config file {} could not be loaded", .path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A config file with invalid TOML syntax
    #[error("Config file {} is invalid: {source}", .path.display())]
    FileParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl ConfigError {
    /// Unknown-key error with the key set sorted for stable diagnostics.
    pub fn unknown_options(path: impl Into<String>, mut names: Vec<String>) -> Self {
        names.sort();
        ConfigError::UnknownOptions {
            path: path.into(),
            names,
        }
    }

    pub fn wrong_type(
        path: impl Into<String>,
        expected: &'static str,
        actual: impl Into<String>,
    ) -> Self {
        ConfigError::WrongType {
            path: path.into(),
            expected,
            actual: actual.into(),
        }
    }

    pub fn invalid_value(path: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            path: path.into(),
            message: message.into(),
        }
    }
}
