//! Resolution errors
//!
//! Every error aborts the whole build. Each variant names the field whose
//! declaration failed, or the handler that could not be built.

use crate::condition::ConditionError;
use crate::lookup::{HandlerError, LookupError};
use crate::reference::ReferenceError;
use thiserror::Error;

/// Errors raised while registering entries or resolving requirements.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("Invalid requirement on {owner}: {error}")]
    Reference { owner: String, error: ReferenceError },

    #[error("Reference \"{reference}\" does not match any Config Entry or Requirement Handler (declared on {owner})")]
    DanglingReference { owner: String, reference: String },

    #[error("Invalid condition on {owner} for \"{target}\": {error}")]
    Condition {
        owner: String,
        target: String,
        error: ConditionError,
    },

    #[error("Invalid requirement on {owner}: {error}")]
    Lookup { owner: String, error: LookupError },

    #[error(transparent)]
    Handler(#[from] HandlerError),

    #[error("Invalid handler call on {owner}: {error}")]
    HandlerSite { owner: String, error: HandlerError },

    #[error("Conditions declared on {owner} for handler {handler} are not supported")]
    IgnoredConditions { owner: String, handler: String },

    #[error("Requirement on {owner} has no targets")]
    EmptyRequirement { owner: String },

    #[error("Requirements have already been built")]
    AlreadyBuilt,

    #[error("Cannot register {field}: requirements have already been built")]
    RegistrationClosed { field: String },
}

/// Result type for registration and resolution.
pub type BuildResult<T> = Result<T, BuildError>;
