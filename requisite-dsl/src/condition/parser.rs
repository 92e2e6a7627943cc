//! Literal value parsers, one per value kind

use super::ConditionError;
use once_cell::sync::Lazy;
use regex::Regex;
use requisite_core::{EnumType, Value, ValueType};

static TRUTHY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:1|t(?:rue)?|y(?:es)?|on|enabled?)$").expect("Invalid truthy regex")
});

static FALSY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:0|f(?:alse)?|no?|off|disabled?)$").expect("Invalid falsy regex")
});

/// Numeric families with a literal parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberKind {
    I16,
    I32,
    I64,
    F32,
    F64,
}

impl NumberKind {
    pub fn of(ty: &ValueType) -> Option<NumberKind> {
        match ty {
            ValueType::I16 => Some(NumberKind::I16),
            ValueType::I32 => Some(NumberKind::I32),
            ValueType::I64 => Some(NumberKind::I64),
            ValueType::F32 => Some(NumberKind::F32),
            ValueType::F64 => Some(NumberKind::F64),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            NumberKind::I16 => "i16",
            NumberKind::I32 => "i32",
            NumberKind::I64 => "i64",
            NumberKind::F32 => "f32",
            NumberKind::F64 => "f64",
        }
    }

    /// Parse with the family's own string-to-number conversion.
    pub fn parse(&self, literal: &str) -> Result<Value, ConditionError> {
        let invalid = |reason: String| ConditionError::InvalidNumber {
            literal: literal.to_string(),
            type_name: self.name(),
            reason,
        };
        match self {
            NumberKind::I16 => literal.parse().map(Value::I16).map_err(|e| invalid(e.to_string())),
            NumberKind::I32 => literal.parse().map(Value::I32).map_err(|e| invalid(e.to_string())),
            NumberKind::I64 => literal.parse().map(Value::I64).map_err(|e| invalid(e.to_string())),
            NumberKind::F32 => literal.parse().map(Value::F32).map_err(|e| invalid(e.to_string())),
            NumberKind::F64 => literal.parse().map(Value::F64).map_err(|e| invalid(e.to_string())),
        }
    }
}

/// Converts a literal string into a typed [`Value`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueParser {
    Bool,
    Char,
    Enum(EnumType),
    Number(NumberKind),
}

impl ValueParser {
    /// Parser for `ty`, or `None` when values of `ty` are compared through
    /// their string form.
    pub fn for_type(ty: &ValueType) -> Option<ValueParser> {
        match ty {
            ValueType::Bool => Some(ValueParser::Bool),
            ValueType::Char => Some(ValueParser::Char),
            ValueType::Enum(e) => Some(ValueParser::Enum(e.clone())),
            other => NumberKind::of(other).map(ValueParser::Number),
        }
    }

    pub fn parse(&self, literal: &str) -> Result<Value, ConditionError> {
        match self {
            ValueParser::Bool => parse_bool(literal).map(Value::Bool),
            ValueParser::Char => parse_char(literal).map(Value::Char),
            ValueParser::Enum(e) => parse_enum(e, literal),
            ValueParser::Number(kind) => kind.parse(literal),
        }
    }
}

/// Parse `literal` as a value of `ty`. Strings are taken verbatim; list and
/// object types have no literal form.
pub fn parse_literal(ty: &ValueType, literal: &str) -> Result<Value, ConditionError> {
    match ValueParser::for_type(ty) {
        Some(parser) => parser.parse(literal),
        None if *ty == ValueType::Str => Ok(Value::Str(literal.to_string())),
        None => Err(ConditionError::UnsupportedType {
            type_name: ty.name(),
        }),
    }
}

pub fn parse_bool(literal: &str) -> Result<bool, ConditionError> {
    if TRUTHY.is_match(literal) {
        Ok(true)
    } else if FALSY.is_match(literal) {
        Ok(false)
    } else {
        Err(ConditionError::InvalidBoolean {
            literal: literal.to_string(),
        })
    }
}

pub fn parse_char(literal: &str) -> Result<char, ConditionError> {
    let mut chars = literal.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(ConditionError::InvalidChar {
            literal: literal.to_string(),
        }),
    }
}

pub fn parse_enum(ty: &EnumType, literal: &str) -> Result<Value, ConditionError> {
    ty.constant(literal)
        .map(Value::enum_constant)
        .ok_or_else(|| ConditionError::InvalidEnumConstant {
            literal: literal.to_string(),
            enum_name: ty.name.clone(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bool_truthy_and_falsy_forms() {
        for s in ["1", "t", "TRUE", "y", "Yes", "on", "enable", "Enabled"] {
            assert!(parse_bool(s).unwrap(), "{s}");
        }
        for s in ["0", "f", "False", "n", "NO", "off", "disable", "disabled"] {
            assert!(!parse_bool(s).unwrap(), "{s}");
        }
    }

    #[test]
    fn test_bool_rejects_other_literals() {
        let err = parse_bool("maybe").unwrap_err();
        assert_eq!(format!("{}", err), "Invalid boolean condition \"maybe\"");
        assert!(parse_bool("truee").is_err());
        assert!(parse_bool("").is_err());
    }

    #[test]
    fn test_char_requires_exactly_one() {
        assert_eq!(parse_char("x").unwrap(), 'x');
        assert_eq!(parse_char("é").unwrap(), 'é');
        assert!(parse_char("").is_err());
        assert!(parse_char("xy").is_err());
    }

    #[test]
    fn test_enum_exact_match() {
        let e = EnumType::new("DemoEnum", ["GOOD", "BAD"]);
        assert_eq!(parse_enum(&e, "GOOD").unwrap(), Value::enum_constant("GOOD"));
        let err = parse_enum(&e, "good").unwrap_err();
        let msg = format!("{}", err);
        assert!(msg.contains("Invalid enum constant \"good\""));
        assert!(msg.contains("DemoEnum"));
    }

    #[test]
    fn test_numbers_use_family_conversion() {
        let p = ValueParser::for_type(&ValueType::I16).unwrap();
        assert_eq!(p.parse("-7").unwrap(), Value::I16(-7));
        assert!(p.parse("40000").is_err());
        let p = ValueParser::for_type(&ValueType::F64).unwrap();
        assert_eq!(p.parse("2.5").unwrap(), Value::F64(2.5));
        assert!(ValueParser::for_type(&ValueType::I32).unwrap().parse("2.5").is_err());
    }

    #[test]
    fn test_no_parser_for_strings_and_objects() {
        assert!(ValueParser::for_type(&ValueType::Str).is_none());
        assert!(ValueParser::for_type(&ValueType::Object("demo.Thing".into())).is_none());
        assert!(ValueParser::for_type(&ValueType::list_of(ValueType::I32)).is_none());
    }

    #[test]
    fn test_literal_by_type() {
        assert_eq!(parse_literal(&ValueType::Str, " a b ").unwrap(), Value::from(" a b "));
        assert_eq!(parse_literal(&ValueType::I64, "12").unwrap(), Value::I64(12));
        let err = parse_literal(&ValueType::Object("demo.Thing".into()), "x").unwrap_err();
        assert!(format!("{}", err).contains("demo.Thing"));
    }
}
