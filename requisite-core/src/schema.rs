//! Schema symbol table
//!
//! A static description of the configuration types: their fields, their
//! methods, and which methods are custom requirement handlers. Built once by
//! [`SchemaBuilder`] and read-only afterwards. Member identities
//! ([`TypeId`], [`FieldId`], [`MethodId`]) are interned indices and are the
//! keys every lookup table uses.

use crate::decl::RequirementDecl;
use crate::error::{HandlerFailure, SchemaError};
use crate::value::{ParamType, Value, ValueType};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

// ============================================================================
// IDENTITIES
// ============================================================================

/// Interned identity of a schema type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeId(usize);

impl TypeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Interned identity of a field: its declaring type and declaration slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FieldId {
    pub owner: TypeId,
    pub slot: usize,
}

/// Interned identity of a method: its declaring type and declaration slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MethodId {
    pub owner: TypeId,
    pub slot: usize,
}

/// Identifier start: a letter, `_` or `$`.
pub fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

/// Identifier continuation: a letter, digit, `_` or `$`.
pub fn is_identifier_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

fn validate_identifier(name: &str) -> Result<(), SchemaError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => is_identifier_start(first) && chars.all(is_identifier_part),
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(SchemaError::InvalidIdentifier {
            name: name.to_string(),
            reason: "not a valid identifier".to_string(),
        })
    }
}

// ============================================================================
// SIGNATURES & HANDLERS
// ============================================================================

/// How a method is called.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Receiver {
    /// No implicit receiver.
    #[default]
    Static,
    /// Needs an instance of the declaring type.
    Instance,
}

/// Declared signature of a schema method.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature {
    pub params: Vec<ParamType>,
    /// Element type of a trailing variadic parameter.
    pub variadic: Option<ParamType>,
    pub returns: ValueType,
    pub receiver: Receiver,
    /// Declared failure modes.
    pub failures: Vec<String>,
}

impl Signature {
    /// A static boolean method over `params`.
    pub fn predicate(params: impl IntoIterator<Item = ParamType>) -> Self {
        Self {
            params: params.into_iter().collect(),
            variadic: None,
            returns: ValueType::Bool,
            receiver: Receiver::Static,
            failures: Vec::new(),
        }
    }

    pub fn with_variadic(mut self, element: ParamType) -> Self {
        self.variadic = Some(element);
        self
    }

    pub fn returning(mut self, returns: ValueType) -> Self {
        self.returns = returns;
        self
    }

    pub fn on_instance(mut self) -> Self {
        self.receiver = Receiver::Instance;
        self
    }

    pub fn declaring_failure(mut self, failure: impl Into<String>) -> Self {
        self.failures.push(failure.into());
        self
    }

    pub fn is_variadic(&self) -> bool {
        self.variadic.is_some()
    }

    /// Parameter descriptors, e.g. `["i32", "T..."]`.
    pub fn descriptors(&self) -> Vec<String> {
        let mut out: Vec<String> = self.params.iter().map(ParamType::descriptor).collect();
        if let Some(element) = &self.variadic {
            out.push(format!("{}...", element.descriptor()));
        }
        out
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.descriptors().join(", "))
    }
}

/// Callable handler body. Variadic arguments arrive packed into a trailing
/// [`Value::List`].
pub type HandlerFn = Rc<dyn Fn(&[Value]) -> Result<bool, HandlerFailure>>;

/// Marks a method as a custom requirement handler.
#[derive(Clone)]
pub struct HandlerSpec {
    /// Field references bound to the leading parameters at every call site.
    pub const_params: Vec<String>,
    pub invoke: HandlerFn,
}

impl HandlerSpec {
    pub fn new<F>(invoke: F) -> Self
    where
        F: Fn(&[Value]) -> Result<bool, HandlerFailure> + 'static,
    {
        Self {
            const_params: Vec::new(),
            invoke: Rc::new(invoke),
        }
    }

    pub fn with_const_params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.const_params = params.into_iter().map(Into::into).collect();
        self
    }
}

impl fmt::Debug for HandlerSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerSpec")
            .field("const_params", &self.const_params)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// DEFINITIONS
// ============================================================================

/// A declared field.
#[derive(Debug, Clone)]
pub struct FieldDef {
    pub id: FieldId,
    pub name: String,
    pub value_type: ValueType,
    pub requirements: Vec<RequirementDecl>,
}

/// A declared method.
#[derive(Debug, Clone)]
pub struct MethodDef {
    pub id: MethodId,
    pub name: String,
    pub signature: Signature,
    pub handler: Option<HandlerSpec>,
}

/// A declared type.
#[derive(Debug, Clone)]
pub struct TypeDef {
    pub id: TypeId,
    pub package: String,
    pub simple_name: String,
    pub enclosing: Option<TypeId>,
    pub qualified_name: String,
    pub nested: Vec<TypeId>,
    pub fields: Vec<FieldDef>,
    pub methods: Vec<MethodDef>,
}

impl TypeDef {
    pub fn field_named(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn methods_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a MethodDef> {
        self.methods.iter().filter(move |m| m.name == name)
    }
}

// ============================================================================
// SCHEMA
// ============================================================================

/// Immutable schema symbol table.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    types: Vec<TypeDef>,
    by_name: HashMap<String, TypeId>,
    handler_types: Vec<TypeId>,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    pub fn types(&self) -> &[TypeDef] {
        &self.types
    }

    pub fn type_def(&self, id: TypeId) -> Option<&TypeDef> {
        self.types.get(id.0)
    }

    /// Look up a type by fully qualified name.
    pub fn lookup_type(&self, qualified_name: &str) -> Option<TypeId> {
        self.by_name.get(qualified_name).copied()
    }

    pub fn field(&self, id: FieldId) -> Option<&FieldDef> {
        self.type_def(id.owner).and_then(|t| t.fields.get(id.slot))
    }

    pub fn method(&self, id: MethodId) -> Option<&MethodDef> {
        self.type_def(id.owner).and_then(|t| t.methods.get(id.slot))
    }

    /// `id` followed by its enclosing types, innermost first.
    pub fn enclosing_chain(&self, id: TypeId) -> Vec<TypeId> {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(ty) = current {
            chain.push(ty);
            current = self.type_def(ty).and_then(|t| t.enclosing);
        }
        chain
    }

    pub fn type_name(&self, id: TypeId) -> String {
        self.type_def(id)
            .map(|t| t.qualified_name.clone())
            .unwrap_or_else(|| format!("<type {}>", id.0))
    }

    /// Canonical key `package.Type#field`.
    pub fn field_key(&self, id: FieldId) -> String {
        let name = self.field(id).map(|f| f.name.as_str()).unwrap_or("?");
        format!("{}#{}", self.type_name(id.owner), name)
    }

    /// Canonical key `package.Type#method`, shared by all overloads.
    pub fn method_key(&self, id: MethodId) -> String {
        let name = self.method(id).map(|m| m.name.as_str()).unwrap_or("?");
        format!("{}#{}", self.type_name(id.owner), name)
    }

    /// Types registered as handler containers, in registration order.
    pub fn handler_types(&self) -> &[TypeId] {
        &self.handler_types
    }

    /// Every method carrying a [`HandlerSpec`] on a handler type.
    pub fn handler_methods(&self) -> impl Iterator<Item = &MethodDef> {
        self.handler_types
            .iter()
            .filter_map(|id| self.type_def(*id))
            .flat_map(|t| t.methods.iter())
            .filter(|m| m.handler.is_some())
    }

    /// Every field with at least one declared requirement.
    pub fn governed_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.types
            .iter()
            .flat_map(|t| t.fields.iter())
            .filter(|f| !f.requirements.is_empty())
    }
}

// ============================================================================
// BUILDER
// ============================================================================

/// Incremental builder for [`Schema`].
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    types: Vec<TypeDef>,
    by_name: HashMap<String, TypeId>,
    handler_types: Vec<TypeId>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a top-level type in `package` (dot-separated, may be empty).
    pub fn add_root_type(&mut self, package: &str, simple_name: &str) -> Result<TypeId, SchemaError> {
        if !package.is_empty() {
            for segment in package.split('.') {
                validate_identifier(segment)?;
            }
        }
        let qualified = if package.is_empty() {
            simple_name.to_string()
        } else {
            format!("{}.{}", package, simple_name)
        };
        self.insert_type(package.to_string(), simple_name, None, qualified)
    }

    /// Declare a type nested inside `parent`.
    pub fn add_nested_type(&mut self, parent: TypeId, simple_name: &str) -> Result<TypeId, SchemaError> {
        let parent_def = self
            .types
            .get(parent.0)
            .ok_or(SchemaError::UnknownType { index: parent.0 })?;
        let package = parent_def.package.clone();
        let qualified = format!("{}.{}", parent_def.qualified_name, simple_name);
        let id = self.insert_type(package, simple_name, Some(parent), qualified)?;
        self.types[parent.0].nested.push(id);
        Ok(id)
    }

    fn insert_type(
        &mut self,
        package: String,
        simple_name: &str,
        enclosing: Option<TypeId>,
        qualified_name: String,
    ) -> Result<TypeId, SchemaError> {
        validate_identifier(simple_name)?;
        if self.by_name.contains_key(&qualified_name) {
            return Err(SchemaError::DuplicateType { qualified_name });
        }
        let id = TypeId(self.types.len());
        self.by_name.insert(qualified_name.clone(), id);
        self.types.push(TypeDef {
            id,
            package,
            simple_name: simple_name.to_string(),
            enclosing,
            qualified_name,
            nested: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
        });
        Ok(id)
    }

    fn type_mut(&mut self, id: TypeId) -> Result<&mut TypeDef, SchemaError> {
        self.types
            .get_mut(id.0)
            .ok_or(SchemaError::UnknownType { index: id.0 })
    }

    pub fn add_field(&mut self, owner: TypeId, name: &str, value_type: ValueType) -> Result<FieldId, SchemaError> {
        validate_identifier(name)?;
        let ty = self.type_mut(owner)?;
        if ty.field_named(name).is_some() {
            return Err(SchemaError::DuplicateField {
                owner: ty.qualified_name.clone(),
                field: name.to_string(),
            });
        }
        let id = FieldId {
            owner,
            slot: ty.fields.len(),
        };
        ty.fields.push(FieldDef {
            id,
            name: name.to_string(),
            value_type,
            requirements: Vec::new(),
        });
        Ok(id)
    }

    /// Attach a declared requirement to an existing field.
    pub fn require(&mut self, field: FieldId, decl: RequirementDecl) -> Result<(), SchemaError> {
        let ty = self.type_mut(field.owner)?;
        let def = ty
            .fields
            .get_mut(field.slot)
            .ok_or(SchemaError::UnknownType { index: field.owner.0 })?;
        def.requirements.push(decl);
        Ok(())
    }

    /// Declare a plain (non-handler) method. Overloads are allowed.
    pub fn add_method(&mut self, owner: TypeId, name: &str, signature: Signature) -> Result<MethodId, SchemaError> {
        self.push_method(owner, name, signature, None)
    }

    /// Declare a handler method and register `owner` as a handler type.
    pub fn add_handler(
        &mut self,
        owner: TypeId,
        name: &str,
        signature: Signature,
        spec: HandlerSpec,
    ) -> Result<MethodId, SchemaError> {
        let id = self.push_method(owner, name, signature, Some(spec))?;
        self.mark_handler_type(owner)?;
        Ok(id)
    }

    pub fn mark_handler_type(&mut self, owner: TypeId) -> Result<(), SchemaError> {
        self.type_mut(owner)?;
        if !self.handler_types.contains(&owner) {
            self.handler_types.push(owner);
        }
        Ok(())
    }

    fn push_method(
        &mut self,
        owner: TypeId,
        name: &str,
        signature: Signature,
        handler: Option<HandlerSpec>,
    ) -> Result<MethodId, SchemaError> {
        validate_identifier(name)?;
        let ty = self.type_mut(owner)?;
        let id = MethodId {
            owner,
            slot: ty.methods.len(),
        };
        ty.methods.push(MethodDef {
            id,
            name: name.to_string(),
            signature,
            handler,
        });
        Ok(id)
    }

    pub fn build(self) -> Schema {
        Schema {
            types: self.types,
            by_name: self.by_name,
            handler_types: self.handler_types,
        }
    }
}
