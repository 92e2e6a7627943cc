//! Value model: the closed set of value kinds an entry can hold

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// VALUE TYPES
// ============================================================================

/// An enumeration declared by the schema: its name and constant names in
/// declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnumType {
    pub name: String,
    pub constants: Vec<String>,
}

impl EnumType {
    pub fn new<I, S>(name: impl Into<String>, constants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            constants: constants.into_iter().map(Into::into).collect(),
        }
    }

    /// Exact (case-sensitive) constant lookup.
    pub fn constant(&self, name: &str) -> Option<&str> {
        self.constants
            .iter()
            .find(|c| c.as_str() == name)
            .map(String::as_str)
    }
}

/// Declared type of a field or of an entry's live value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    Bool,
    Char,
    I16,
    I32,
    I64,
    F32,
    F64,
    Str,
    Enum(EnumType),
    List(Box<ValueType>),
    /// Any other schema object, compared through its string form.
    Object(String),
}

impl ValueType {
    pub fn list_of(element: ValueType) -> Self {
        ValueType::List(Box::new(element))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ValueType::I16 | ValueType::I32 | ValueType::I64 | ValueType::F32 | ValueType::F64
        )
    }

    /// Name used in signature descriptors and error messages.
    pub fn name(&self) -> String {
        match self {
            ValueType::Bool => "bool".to_string(),
            ValueType::Char => "char".to_string(),
            ValueType::I16 => "i16".to_string(),
            ValueType::I32 => "i32".to_string(),
            ValueType::I64 => "i64".to_string(),
            ValueType::F32 => "f32".to_string(),
            ValueType::F64 => "f64".to_string(),
            ValueType::Str => "String".to_string(),
            ValueType::Enum(e) => e.name.clone(),
            ValueType::List(inner) => format!("List<{}>", inner.name()),
            ValueType::Object(name) => name.clone(),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ============================================================================
// HANDLER PARAMETER TYPES
// ============================================================================

/// Upper bound of a generic handler parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TypeBound {
    #[default]
    Any,
    Number,
}

impl TypeBound {
    pub fn accepts(&self, ty: &ValueType) -> bool {
        match self {
            TypeBound::Any => true,
            TypeBound::Number => ty.is_numeric(),
        }
    }

    pub fn as_param(&self) -> ParamType {
        match self {
            TypeBound::Any => ParamType::Any,
            TypeBound::Number => ParamType::Number,
        }
    }
}

/// Declared type of a handler parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamType {
    /// Exactly this value type.
    Exact(ValueType),
    /// Any numeric value type.
    Number,
    /// Any value at all.
    Any,
    /// A type variable, resolved from the arguments bound to it.
    Generic { name: String, bound: TypeBound },
}

impl ParamType {
    pub fn generic(name: impl Into<String>) -> Self {
        ParamType::Generic {
            name: name.into(),
            bound: TypeBound::Any,
        }
    }

    /// Whether an argument of type `ty` may be passed for this parameter.
    pub fn accepts(&self, ty: &ValueType) -> bool {
        match self {
            ParamType::Exact(expected) => expected == ty,
            ParamType::Number => ty.is_numeric(),
            ParamType::Any => true,
            ParamType::Generic { bound, .. } => bound.accepts(ty),
        }
    }

    /// Smallest parameter type accepting both `self` and `ty`, or `None`
    /// when the two are unrelated.
    pub fn common_supertype(&self, ty: &ValueType) -> Option<ParamType> {
        match self {
            ParamType::Exact(current) if current == ty => Some(self.clone()),
            ParamType::Exact(current) if current.is_numeric() && ty.is_numeric() => {
                Some(ParamType::Number)
            }
            ParamType::Number if ty.is_numeric() => Some(ParamType::Number),
            ParamType::Any => Some(ParamType::Any),
            ParamType::Generic { bound, .. } if bound.accepts(ty) => {
                Some(ParamType::Exact(ty.clone()))
            }
            _ => None,
        }
    }

    /// Name used in signature descriptors, e.g. `i32`, `Number`, `T`.
    pub fn descriptor(&self) -> String {
        match self {
            ParamType::Exact(ty) => ty.name(),
            ParamType::Number => "Number".to_string(),
            ParamType::Any => "Any".to_string(),
            ParamType::Generic { name, .. } => name.clone(),
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.descriptor())
    }
}

// ============================================================================
// LIVE VALUES
// ============================================================================

/// A live value read from an entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Bool(bool),
    Char(char),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Str(String),
    /// Name of the selected enum constant.
    Enum(String),
    List(Vec<Value>),
    Object { type_name: String, repr: String },
}

impl Value {
    pub fn enum_constant(name: impl Into<String>) -> Self {
        Value::Enum(name.into())
    }

    /// Short name of the value's kind, for error messages.
    pub fn kind_name(&self) -> &str {
        match self {
            Value::Bool(_) => "bool",
            Value::Char(_) => "char",
            Value::I16(_) => "i16",
            Value::I32(_) => "i32",
            Value::I64(_) => "i64",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::Str(_) => "String",
            Value::Enum(_) => "enum",
            Value::List(_) => "List",
            Value::Object { type_name, .. } => type_name,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Any integer kind, widened.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I16(v) => Some(i64::from(*v)),
            Value::I32(v) => Some(i64::from(*v)),
            Value::I64(v) => Some(*v),
            _ => None,
        }
    }

    /// Any numeric kind, widened.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::F32(v) => Some(f64::from(*v)),
            Value::F64(v) => Some(*v),
            other => other.as_i64().map(|v| v as f64),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            Value::Enum(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::I32(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::I64(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::F64(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

fn write_float(f: &mut fmt::Formatter<'_>, v: f64) -> fmt::Result {
    if v.is_finite() && v.fract() == 0.0 {
        write!(f, "{:.1}", v)
    } else {
        write!(f, "{}", v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Char(c) => write!(f, "{}", c),
            Value::I16(v) => write!(f, "{}", v),
            Value::I32(v) => write!(f, "{}", v),
            Value::I64(v) => write!(f, "{}", v),
            Value::F32(v) => write_float(f, f64::from(*v)),
            Value::F64(v) => write_float(f, *v),
            Value::Str(s) => write!(f, "{}", s),
            Value::Enum(c) => write!(f, "{}", c),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Object { repr, .. } => write!(f, "{}", repr),
        }
    }
}
