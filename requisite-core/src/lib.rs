//! REQUISITE Core - Schema and Requirement Types
//!
//! Pure data structures shared by the resolution engine and its callers:
//! the schema symbol table, the value model, declared requirement metadata,
//! the resolved requirement tree and the entry surface trait.
//! This crate contains no resolution logic.

pub mod config;
pub mod decl;
pub mod entry;
pub mod enums;
pub mod error;
pub mod requirement;
pub mod schema;
pub mod value;

pub use config::ResolverConfig;
pub use decl::{DependencyDecl, RequirementDecl};
pub use entry::{Entry, EntryHandle, WeakEntry};
pub use enums::{Action, EnumParseError, Quantifier};
pub use error::{
    ConfigError, EvalError, EvalResult, HandlerFailure, RequisiteError, RequisiteResult,
    SchemaError,
};
pub use requirement::Requirement;
pub use schema::{
    is_identifier_part, is_identifier_start, FieldDef, FieldId, HandlerFn, HandlerSpec,
    MethodDef, MethodId, Receiver, Schema, SchemaBuilder, Signature, TypeDef, TypeId,
};
pub use value::{EnumType, ParamType, TypeBound, Value, ValueType};
