//! Symbolic references to schema members
//!
//! A reference string names a field or a method relative to a base type.
//! Type paths are tried against the base type and each enclosing type, then
//! the base type's package, then as a fully qualified name.

pub mod scanner;

pub use scanner::{scan, RawReference, ReferenceDefect, ReferenceScanner};

use requisite_core::{FieldId, MethodDef, MethodId, ResolverConfig, Schema, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use thiserror::Error;

// ============================================================================
// REFERENCE ERRORS
// ============================================================================

/// A reference string that does not name exactly one member.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("malformed reference \"{reference}\" (from {base}): {defect}")]
pub struct ReferenceError {
    pub reference: String,
    pub base: String,
    pub defect: ReferenceDefect,
}

impl ReferenceError {
    pub fn is_unresolved(&self) -> bool {
        self.defect.is_unresolved()
    }
}

// ============================================================================
// RESOLVED REFERENCES
// ============================================================================

/// Default index: the last entry produced for the field.
pub const LAST_INDEX: i32 = -1;

/// A reference to a field, with an entry index.
///
/// Equality and hashing consider the target only, not the original text.
#[derive(Debug, Clone)]
pub struct FieldRef {
    pub field: FieldId,
    /// Entry index; negative counts from the end.
    pub index: i32,
    pub original: String,
}

impl FieldRef {
    pub fn new(field: FieldId) -> Self {
        Self {
            field,
            index: LAST_INDEX,
            original: String::new(),
        }
    }

    pub fn with_index(mut self, index: i32) -> Self {
        self.index = index;
        self
    }

    pub fn with_original(mut self, original: impl Into<String>) -> Self {
        self.original = original.into();
        self
    }

    /// Declaring type.
    pub fn owner(&self) -> TypeId {
        self.field.owner
    }
}

impl PartialEq for FieldRef {
    fn eq(&self, other: &Self) -> bool {
        self.field == other.field && self.index == other.index
    }
}

impl Eq for FieldRef {}

impl Hash for FieldRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.field.hash(state);
        self.index.hash(state);
    }
}

/// A reference to a method.
#[derive(Debug, Clone)]
pub struct MethodRef {
    pub method: MethodId,
    pub original: String,
}

impl MethodRef {
    pub fn owner(&self) -> TypeId {
        self.method.owner
    }
}

impl PartialEq for MethodRef {
    fn eq(&self, other: &Self) -> bool {
        self.method == other.method
    }
}

impl Eq for MethodRef {}

impl Hash for MethodRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.method.hash(state);
    }
}

/// A parsed reference: immutable, carrying its original text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Reference {
    Field(FieldRef),
    Method(MethodRef),
}

impl Reference {
    pub fn original(&self) -> &str {
        match self {
            Reference::Field(f) => &f.original,
            Reference::Method(m) => &m.original,
        }
    }

    pub fn as_field(&self) -> Option<&FieldRef> {
        match self {
            Reference::Field(f) => Some(f),
            Reference::Method(_) => None,
        }
    }

    pub fn as_method(&self) -> Option<&MethodRef> {
        match self {
            Reference::Field(_) => None,
            Reference::Method(m) => Some(m),
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.original())
    }
}

// ============================================================================
// PARSER
// ============================================================================

/// Parses reference strings against a schema.
#[derive(Debug, Clone, Copy)]
pub struct ReferenceParser<'s> {
    schema: &'s Schema,
    trim: bool,
}

impl<'s> ReferenceParser<'s> {
    pub fn new(schema: &'s Schema) -> Self {
        Self { schema, trim: true }
    }

    pub fn with_config(schema: &'s Schema, config: &ResolverConfig) -> Self {
        Self {
            schema,
            trim: config.trim_references,
        }
    }

    pub fn schema(&self) -> &'s Schema {
        self.schema
    }

    /// Parse `text` relative to `base`.
    pub fn parse(&self, base: TypeId, text: &str) -> Result<Reference, ReferenceError> {
        let fail = |defect| ReferenceError {
            reference: text.to_string(),
            base: self.schema.type_name(base),
            defect,
        };

        let raw = scan(text, self.trim).map_err(fail)?;
        let owner = self.resolve_type(base, &raw).ok_or_else(|| {
            fail(ReferenceDefect::UnknownType {
                path: raw.joined_path(),
            })
        })?;
        self.resolve_member(owner, &raw, text).map_err(fail)
    }

    /// Parse `text`, requiring it to name a field.
    pub fn parse_field(&self, base: TypeId, text: &str) -> Result<FieldRef, ReferenceError> {
        match self.parse(base, text)? {
            Reference::Field(f) => Ok(f),
            Reference::Method(m) => Err(ReferenceError {
                reference: text.to_string(),
                base: self.schema.type_name(base),
                defect: ReferenceDefect::ExpectedField {
                    method: self.schema.method_key(m.method),
                },
            }),
        }
    }

    /// Candidate type for the path part of `raw`.
    fn resolve_type(&self, base: TypeId, raw: &RawReference) -> Option<TypeId> {
        if raw.path.is_empty() {
            return self.schema.type_def(base).map(|t| t.id);
        }
        let path = raw.joined_path();

        for scope in self.schema.enclosing_chain(base) {
            let candidate = format!("{}.{}", self.schema.type_name(scope), path);
            if let Some(id) = self.schema.lookup_type(&candidate) {
                return Some(id);
            }
        }

        if let Some(package) = self.schema.type_def(base).map(|t| t.package.as_str()) {
            if !package.is_empty() {
                if let Some(id) = self.schema.lookup_type(&format!("{}.{}", package, path)) {
                    return Some(id);
                }
            }
        }

        self.schema.lookup_type(&path)
    }

    fn resolve_member(
        &self,
        owner: TypeId,
        raw: &RawReference,
        text: &str,
    ) -> Result<Reference, ReferenceDefect> {
        let ty = self
            .schema
            .type_def(owner)
            .ok_or_else(|| ReferenceDefect::UnknownType {
                path: raw.joined_path(),
            })?;
        let owner_name = ty.qualified_name.clone();

        if raw.descriptor.is_none() {
            if let Some(field) = ty.field_named(&raw.member) {
                return Ok(Reference::Field(FieldRef {
                    field: field.id,
                    index: raw.index.unwrap_or(LAST_INDEX),
                    original: text.to_string(),
                }));
            }
        }

        let candidates: Vec<&MethodDef> = ty
            .methods_named(&raw.member)
            .filter(|m| match &raw.descriptor {
                None => true,
                Some(params) => descriptor_matches(m, params),
            })
            .collect();

        match candidates.as_slice() {
            [] => Err(ReferenceDefect::NoSuchMember {
                owner: owner_name,
                member: raw.member.clone(),
                fields: ty.fields.iter().map(|f| f.name.clone()).collect(),
                methods: ty
                    .methods
                    .iter()
                    .map(|m| format!("{}{}", m.name, m.signature))
                    .collect(),
            }),
            [method] => {
                if raw.index.is_some() {
                    return Err(ReferenceDefect::IndexOnMethod);
                }
                Ok(Reference::Method(MethodRef {
                    method: method.id,
                    original: text.to_string(),
                }))
            }
            many => Err(ReferenceDefect::AmbiguousMember {
                owner: owner_name,
                member: raw.member.clone(),
                candidates: many
                    .iter()
                    .map(|m| format!("{}{}", m.name, m.signature))
                    .collect(),
            }),
        }
    }

    /// Fully qualified form that parses back to the same target from any
    /// base type.
    pub fn canonical(&self, reference: &Reference) -> String {
        match reference {
            Reference::Field(f) => {
                let key = self.schema.field_key(f.field);
                if f.index >= 0 {
                    format!("{}[{}]", key, f.index)
                } else {
                    key
                }
            }
            Reference::Method(m) => {
                let params = self
                    .schema
                    .method(m.method)
                    .map(|def| def.signature.descriptors().join(", "))
                    .unwrap_or_default();
                format!("{}({})", self.schema.method_key(m.method), params)
            }
        }
    }
}

fn descriptor_matches(method: &MethodDef, params: &[String]) -> bool {
    let declared: Vec<String> = method
        .signature
        .descriptors()
        .into_iter()
        .map(|d| d.chars().filter(|c| !c.is_whitespace()).collect())
        .collect();
    declared == params
}
