//! Error types for REQUISITE schema and evaluation operations

use thiserror::Error;

/// Schema builder errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Duplicate type: {qualified_name}")]
    DuplicateType { qualified_name: String },

    #[error("Duplicate field {field} on {owner}")]
    DuplicateField { owner: String, field: String },

    #[error("Unknown type id {index}")]
    UnknownType { index: usize },

    #[error("Invalid identifier '{name}': {reason}")]
    InvalidIdentifier { name: String, reason: String },
}

/// Errors raised while evaluating an installed requirement.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EvalError {
    #[error("Handler {handler} failed: {reason}")]
    HandlerFailed { handler: String, reason: String },

    #[error("Unexpected value for {target}: expected {expected}, found {found}")]
    UnexpectedValue {
        target: String,
        expected: String,
        found: String,
    },

    #[error("Entry for {target} was released before evaluation")]
    EntryReleased { target: String },
}

/// Failure reported by a handler body. The requirement wraps it into
/// [`EvalError::HandlerFailed`] with the handler's identity.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct HandlerFailure {
    pub message: String,
}

impl HandlerFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid configuration: {reason}")]
    Parse { reason: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for core operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RequisiteError {
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Evaluation error: {0}")]
    Eval(#[from] EvalError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for core operations.
pub type RequisiteResult<T> = Result<T, RequisiteError>;

/// Result type for requirement evaluation.
pub type EvalResult<T> = Result<T, EvalError>;
