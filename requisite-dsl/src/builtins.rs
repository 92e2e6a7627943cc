//! Built-in requirement handlers
//!
//! Generic predicates any schema can reference once installed on one of its
//! handler types, e.g. `Handlers#is` with a field argument and a literal.

use requisite_core::{
    HandlerFailure, HandlerSpec, MethodId, ParamType, SchemaBuilder, SchemaError, Signature,
    TypeId, Value, ValueType,
};

/// Holds when its argument is `true`.
pub const IS_TRUE: &str = "isTrue";
/// Holds when its argument is `false`.
pub const IS_FALSE: &str = "isFalse";
/// Holds when its two arguments are equal.
pub const IS: &str = "is";
/// Holds when at least two of its arguments are equal.
pub const ANY_MATCH: &str = "anyMatch";

/// Declare the built-in handlers on `owner`.
pub fn install(builder: &mut SchemaBuilder, owner: TypeId) -> Result<Vec<MethodId>, SchemaError> {
    let bool_param = || ParamType::Exact(ValueType::Bool);

    Ok(vec![
        builder.add_handler(
            owner,
            IS_TRUE,
            Signature::predicate([bool_param()]),
            HandlerSpec::new(expect_bool),
        )?,
        builder.add_handler(
            owner,
            IS_FALSE,
            Signature::predicate([bool_param()]),
            HandlerSpec::new(|args| expect_bool(args).map(|v| !v)),
        )?,
        builder.add_handler(
            owner,
            IS,
            Signature::predicate([ParamType::generic("T"), ParamType::generic("T")]),
            HandlerSpec::new(|args| match args {
                [a, b] => Ok(values_equal(a, b)),
                _ => Err(HandlerFailure::new("expected two arguments")),
            }),
        )?,
        builder.add_handler(
            owner,
            ANY_MATCH,
            Signature::predicate([]).with_variadic(ParamType::Any),
            HandlerSpec::new(|args| match args {
                [Value::List(items)] => Ok(any_match(items)),
                _ => Err(HandlerFailure::new("expected packed variadic arguments")),
            }),
        )?,
    ])
}

fn expect_bool(args: &[Value]) -> Result<bool, HandlerFailure> {
    match args {
        [value] => value
            .as_bool()
            .ok_or_else(|| HandlerFailure::new(format!("expected bool, found {}", value.kind_name()))),
        _ => Err(HandlerFailure::new("expected one argument")),
    }
}

/// Equality with numbers compared by value across widths.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return x == y;
    }
    if let (Some(x), Some(y)) = (a.as_f64(), b.as_f64()) {
        return x == y;
    }
    a == b
}

/// Whether any two items are equal.
pub fn any_match(items: &[Value]) -> bool {
    items
        .iter()
        .enumerate()
        .any(|(i, a)| items[i + 1..].iter().any(|b| values_equal(a, b)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_equal_across_widths() {
        assert!(values_equal(&Value::I32(5), &Value::I64(5)));
        assert!(values_equal(&Value::I16(2), &Value::F64(2.0)));
        assert!(!values_equal(&Value::I32(5), &Value::from("5")));
        assert!(values_equal(&Value::enum_constant("GOOD"), &Value::enum_constant("GOOD")));
    }

    #[test]
    fn test_any_match() {
        assert!(!any_match(&[]));
        assert!(!any_match(&[Value::I32(1)]));
        assert!(!any_match(&[Value::I32(1), Value::I32(2), Value::I32(3)]));
        assert!(any_match(&[Value::I32(1), Value::I32(2), Value::I32(1)]));
        assert!(any_match(&[Value::Bool(true), Value::I32(1), Value::Bool(true)]));
    }

    #[test]
    fn test_install_declares_handlers() {
        let mut b = SchemaBuilder::new();
        let ty = b.add_root_type("demo", "Builtins").unwrap();
        let ids = install(&mut b, ty).unwrap();
        let schema = b.build();
        assert_eq!(ids.len(), 4);
        let names: Vec<&str> = schema.handler_methods().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec![IS_TRUE, IS_FALSE, IS, ANY_MATCH]);
        let any = schema.method(ids[3]).unwrap();
        assert!(any.signature.is_variadic());
    }

    #[test]
    fn test_is_true_rejects_other_kinds() {
        assert!(expect_bool(&[Value::Bool(true)]).unwrap());
        assert!(expect_bool(&[Value::I32(1)]).is_err());
        assert!(expect_bool(&[]).is_err());
    }
}
