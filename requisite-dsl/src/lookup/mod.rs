//! Lookup tables filled during registration and read during resolution

pub mod entries;
pub mod handlers;

pub use entries::{EntryTable, EntryTableSnapshot, LookupError};
pub use handlers::{check_arguments, validate_signature, BoundEntry, Handler, HandlerError, HandlerTable};
