//! REQUISITE DSL - Requirement Resolution Engine
//!
//! This crate resolves the requirements declared in a schema into evaluable
//! predicates and installs them on the entries produced for each field.
//!
//! Architecture:
//! ```text
//! Declared requirements (RequirementDecl per field)
//!     ↓
//! Reference Parser (symbolic strings → field/method targets)
//!     ↓
//! Lookup Tables (registered entries, validated handlers)
//!     ↓
//! Condition Model (literal/regex conditions per value type)
//!     ↓
//! Requirement Manager (combine per action, install)
//! ```

pub mod builtins;
pub mod condition;
pub mod definition;
pub mod error;
pub mod lookup;
pub mod manager;
pub mod reference;

// Re-export key types for convenience
pub use condition::{CompareOp, Condition, ConditionError, ConditionSet};
pub use definition::{ClauseDefinition, RequirementDefinition, ResolveContext};
pub use error::{BuildError, BuildResult};
pub use lookup::{
    BoundEntry, EntryTable, EntryTableSnapshot, Handler, HandlerError, HandlerTable, LookupError,
};
pub use manager::{
    BuildReport, InstallRecord, ManagerState, RegistrationSummary, RequirementManager,
};
pub use reference::{FieldRef, MethodRef, Reference, ReferenceError, ReferenceParser};
