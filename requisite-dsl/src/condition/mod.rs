//! Condition model
//!
//! A dependency on a field compares the field's live value against the
//! declared literal conditions and regex conditions. Literals are parsed
//! once, by the parser for the field's value type; regexes are compiled
//! once. The set is satisfied when any literal or any regex matches.

pub mod parser;

pub use parser::{parse_bool, parse_char, parse_enum, parse_literal, NumberKind, ValueParser};

use regex::Regex;
use requisite_core::{EvalError, EvalResult, Value, ValueType};
use std::cmp::Ordering;
use std::fmt;
use std::mem::discriminant;
use thiserror::Error;

// ============================================================================
// CONDITION ERRORS
// ============================================================================

/// A condition literal or pattern that cannot be used for its target.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConditionError {
    #[error("Invalid boolean condition \"{literal}\"")]
    InvalidBoolean { literal: String },

    #[error("Invalid enum constant \"{literal}\" (not found in {enum_name})")]
    InvalidEnumConstant { literal: String, enum_name: String },

    #[error("Invalid {type_name} condition \"{literal}\": {reason}")]
    InvalidNumber {
        literal: String,
        type_name: &'static str,
        reason: String,
    },

    #[error("Invalid char condition \"{literal}\" (expected exactly one character)")]
    InvalidChar { literal: String },

    #[error("Invalid regex condition \"{pattern}\": {reason}")]
    InvalidRegex { pattern: String, reason: String },

    #[error("No conditions declared for non-boolean target of type {type_name}")]
    MissingConditions { type_name: String },

    #[error("No literal parser for type {type_name}")]
    UnsupportedType { type_name: String },
}

// ============================================================================
// COMPARISON OPERATORS
// ============================================================================

/// Comparison operator of a number condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl CompareOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
        }
    }

    /// Split a leading operator off `condition`. Two-character operators are
    /// tried first; no operator means [`CompareOp::Eq`].
    pub fn split(condition: &str) -> (CompareOp, &str) {
        const OPERATORS: [CompareOp; 6] = [
            CompareOp::Eq,
            CompareOp::Ne,
            CompareOp::Ge,
            CompareOp::Le,
            CompareOp::Gt,
            CompareOp::Lt,
        ];
        OPERATORS
            .iter()
            .find_map(|op| condition.strip_prefix(op.symbol()).map(|rest| (*op, rest)))
            .unwrap_or((CompareOp::Eq, condition))
    }

    /// Whether `live <op> literal` holds given their ordering. Unordered
    /// values only satisfy `!=`.
    pub fn holds(&self, ordering: Option<Ordering>) -> bool {
        match ordering {
            None => *self == CompareOp::Ne,
            Some(ord) => match self {
                CompareOp::Eq => ord == Ordering::Equal,
                CompareOp::Ne => ord != Ordering::Equal,
                CompareOp::Gt => ord == Ordering::Greater,
                CompareOp::Ge => ord != Ordering::Less,
                CompareOp::Lt => ord == Ordering::Less,
                CompareOp::Le => ord != Ordering::Greater,
            },
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

// ============================================================================
// CONDITIONS
// ============================================================================

/// One parsed literal condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Live value equals the literal (booleans, chars, enum constants).
    Equals(Value),
    /// `live <op> literal` in the number family's natural ordering.
    Number { op: CompareOp, literal: Value },
    /// Stringified live value equals the literal.
    Text(String),
}

impl Condition {
    /// Parse `literal` for a target of type `ty`.
    pub fn parse(ty: &ValueType, literal: &str) -> Result<Condition, ConditionError> {
        match ValueParser::for_type(ty) {
            Some(ValueParser::Number(kind)) => {
                let stripped: String = literal.chars().filter(|c| !c.is_whitespace()).collect();
                let (op, number) = CompareOp::split(&stripped);
                let parsed = kind.parse(number).map_err(|e| match e {
                    ConditionError::InvalidNumber { type_name, reason, .. } => ConditionError::InvalidNumber {
                        literal: literal.to_string(),
                        type_name,
                        reason,
                    },
                    other => other,
                })?;
                Ok(Condition::Number { op, literal: parsed })
            }
            Some(parser) => parser.parse(literal).map(Condition::Equals),
            None => Ok(Condition::Text(literal.to_string())),
        }
    }

    /// Evaluate against `value`, the live value of `target`.
    pub fn matches(&self, target: &str, value: &Value) -> EvalResult<bool> {
        match self {
            Condition::Equals(expected) => {
                if discriminant(expected) != discriminant(value) {
                    return Err(unexpected(target, expected.kind_name(), value));
                }
                Ok(expected == value)
            }
            Condition::Number { op, literal } => {
                let ordering = compare_numbers(value, literal)
                    .ok_or_else(|| unexpected(target, literal.kind_name(), value))?;
                Ok(op.holds(ordering))
            }
            Condition::Text(expected) => Ok(value.to_string() == *expected),
        }
    }
}

/// Ordering of a live number against a literal. The outer `None` means the
/// live value is not a number; the inner `None` means the two are unordered.
fn compare_numbers(live: &Value, literal: &Value) -> Option<Option<Ordering>> {
    if let (Some(a), Some(b)) = (live.as_i64(), literal.as_i64()) {
        return Some(Some(a.cmp(&b)));
    }
    let a = live.as_f64()?;
    let b = literal.as_f64()?;
    Some(a.partial_cmp(&b))
}

fn unexpected(target: &str, expected: &str, found: &Value) -> EvalError {
    EvalError::UnexpectedValue {
        target: target.to_string(),
        expected: expected.to_string(),
        found: found.kind_name().to_string(),
    }
}

/// Compile each pattern for full-string matching. The pattern must be valid
/// on its own before it is anchored.
pub fn compile_patterns(patterns: &[String]) -> Result<Vec<Regex>, ConditionError> {
    patterns
        .iter()
        .map(|pattern| {
            let invalid = |e: regex::Error| ConditionError::InvalidRegex {
                pattern: pattern.clone(),
                reason: e.to_string(),
            };
            Regex::new(pattern).map_err(invalid)?;
            Regex::new(&format!("^(?:{})$", pattern)).map_err(invalid)
        })
        .collect()
}

// ============================================================================
// CONDITION SETS
// ============================================================================

/// The literal and regex conditions declared against one field target.
#[derive(Debug, Clone)]
pub struct ConditionSet {
    value_type: ValueType,
    conditions: Vec<Condition>,
    patterns: Vec<Regex>,
}

impl ConditionSet {
    /// Parse `literals` for `value_type` and pair them with the compiled
    /// `patterns`.
    ///
    /// A boolean target with no conditions at all means "is true". Any other
    /// target needs at least one literal or pattern.
    pub fn build(
        value_type: &ValueType,
        literals: &[String],
        patterns: Vec<Regex>,
    ) -> Result<ConditionSet, ConditionError> {
        let conditions = if literals.is_empty() && patterns.is_empty() {
            if *value_type != ValueType::Bool {
                return Err(ConditionError::MissingConditions {
                    type_name: value_type.name(),
                });
            }
            vec![Condition::Equals(Value::Bool(true))]
        } else {
            literals
                .iter()
                .map(|literal| Condition::parse(value_type, literal))
                .collect::<Result<Vec<_>, _>>()?
        };

        Ok(ConditionSet {
            value_type: value_type.clone(),
            conditions,
            patterns,
        })
    }

    pub fn value_type(&self) -> &ValueType {
        &self.value_type
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    /// Whether any literal condition or any pattern matches `value`.
    pub fn matches(&self, target: &str, value: &Value) -> EvalResult<bool> {
        for condition in &self.conditions {
            if condition.matches(target, value)? {
                return Ok(true);
            }
        }
        if self.patterns.is_empty() {
            return Ok(false);
        }
        let text = value.to_string();
        Ok(self.patterns.iter().any(|p| p.is_match(&text)))
    }
}
