// src/error.rs
//
// Error taxonomy. Every variant is fatal: configuration mistakes are
// surfaced at setup, and the simulation core has no recoverable runtime
// errors (all probabilities are clamped before use).

use thiserror::Error;

/// Errors raised while building or validating a `Config`.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {reason}")]
    IoError { path: String, reason: String },

    #[error("Failed to parse config YAML: {reason}")]
    ParseError { reason: String },

    #[error("Unknown parameter '{name}'")]
    UnknownParameter { name: String },

    #[error("Invalid value for '{name}': {value:?}")]
    InvalidValue { name: String, value: String },

    #[error("Unknown defender_policy: {name:?}")]
    UnknownPolicy { name: String },

    #[error("Config validation error in '{field}': {message}")]
    ValidationError { field: String, message: String },
}

/// Errors raised by the simulation core.
#[derive(Debug, Clone, Error)]
pub enum SimError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Policy '{policy}' requires an agent instance")]
    MissingAgent { policy: &'static str },

    #[error("Invalid action index: {index}")]
    InvalidAction { index: usize },

    #[error("Failed to build worker pool: {reason}")]
    ThreadPool { reason: String },
}

pub type SimResult<T> = Result<T, SimError>;
