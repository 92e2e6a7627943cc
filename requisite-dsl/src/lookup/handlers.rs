//! Handler lookup table
//!
//! Every handler method is validated and wrapped once, when the table is
//! built. A handler's arguments are bound in order: its constant field
//! parameters, then the field arguments given at the call site, then the
//! call site's literal arguments. A trailing variadic parameter takes all
//! remaining arguments.

use super::entries::{EntryTable, LookupError};
use crate::condition::{parse_literal, ConditionError};
use crate::reference::{ReferenceError, ReferenceParser};
use requisite_core::{
    EntryHandle, EvalError, EvalResult, HandlerFn, MethodDef, MethodId, ParamType, Receiver,
    Requirement, ResolverConfig, Schema, Signature, Value, ValueType, WeakEntry,
};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;
use thiserror::Error;
use tracing::{debug, warn};

// ============================================================================
// HANDLER ERRORS
// ============================================================================

fn indented(defects: &[String]) -> String {
    defects.iter().map(|d| format!("\n    {}", d)).collect()
}

/// Errors building or binding a handler.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HandlerError {
    #[error("Invalid handler signature on {handler}: ({} errors){}", .defects.len(), indented(.defects))]
    InvalidSignature {
        handler: String,
        defects: Vec<String>,
    },

    #[error("Invalid parameter types on {handler}: ({} errors){}", .defects.len(), indented(.defects))]
    ArgumentMismatch {
        handler: String,
        defects: Vec<String>,
    },

    #[error("Multiple methods have the same reference (\"{key}\")")]
    DuplicateKey { key: String },

    #[error("Invalid constant parameter on {handler}: {error}")]
    ConstReference {
        handler: String,
        error: ReferenceError,
    },

    #[error("Constant parameter on {handler} has no entry: {error}")]
    ConstLookup { handler: String, error: LookupError },
}

// ============================================================================
// ARGUMENTS
// ============================================================================

/// An entry passed as a handler argument, with the reference text that
/// named it.
#[derive(Debug, Clone)]
pub struct BoundEntry {
    pub entry: EntryHandle,
    pub label: String,
}

impl BoundEntry {
    pub fn new(entry: EntryHandle, label: impl Into<String>) -> Self {
        Self {
            entry,
            label: label.into(),
        }
    }
}

/// Where an argument's value comes from when the handler runs.
#[derive(Debug, Clone)]
enum ArgSource {
    Entry { entry: WeakEntry, label: String },
    Literal(Value),
}

impl ArgSource {
    fn read(&self) -> EvalResult<Value> {
        match self {
            ArgSource::Entry { entry, label } => entry
                .upgrade()
                .map(|e| e.value())
                .ok_or_else(|| EvalError::EntryReleased {
                    target: label.clone(),
                }),
            ArgSource::Literal(value) => Ok(value.clone()),
        }
    }
}

/// Type-check entry arguments of types `arg_types` followed by `literals`
/// against `signature`. Returns the parsed literals, or every defect found.
pub fn check_arguments(
    signature: &Signature,
    arg_types: &[ValueType],
    literals: &[String],
) -> Result<Vec<Value>, Vec<String>> {
    let fixed = signature.params.len();
    let total = arg_types.len() + literals.len();

    match &signature.variadic {
        Some(_) if total < fixed => {
            return Err(vec![format!(
                "Insufficient argument count: expected at least {}, found {}",
                fixed, total
            )])
        }
        None if total != fixed => {
            return Err(vec![format!(
                "Incorrect argument count: expected {}, found {}",
                fixed, total
            )])
        }
        _ => {}
    }

    let mut defects = Vec::new();

    // Bind type variables from the entry arguments in fixed positions.
    let mut generics: HashMap<String, ParamType> = HashMap::new();
    for (param, ty) in signature.params.iter().zip(arg_types) {
        let ParamType::Generic { name, bound } = param else {
            continue;
        };
        if !bound.accepts(ty) {
            continue;
        }
        let merged = match generics.get(name) {
            None => ParamType::Exact(ty.clone()),
            Some(prev) => match prev.common_supertype(ty) {
                Some(merged) => merged,
                None => {
                    defects.push(format!("Incompatible types used for {} ({} & {})", name, prev, ty));
                    continue;
                }
            },
        };
        generics.insert(name.clone(), merged);
    }

    let vararg_type = signature.variadic.as_ref().map(|element| {
        let bound_generic = match element {
            ParamType::Generic { name, .. } => generics.get(name).cloned(),
            _ => None,
        };
        let resolved = bound_generic.or_else(|| {
            let inferred = infer_vararg(element, arg_types.get(fixed..).unwrap_or(&[]), &mut defects);
            if let (ParamType::Generic { name, .. }, Some(ty)) = (element, &inferred) {
                generics.insert(name.clone(), ty.clone());
            }
            inferred
        });
        resolved.unwrap_or_else(|| erase(element))
    });

    let mut param_types: Vec<ParamType> = signature
        .params
        .iter()
        .map(|param| match param {
            ParamType::Generic { name, bound } => generics.get(name).cloned().unwrap_or_else(|| {
                warn!(generic = %name, "unable to resolve generic handler parameter");
                bound.as_param()
            }),
            other => other.clone(),
        })
        .collect();
    if let Some(element) = vararg_type {
        param_types.extend(std::iter::repeat(element).take(total - fixed));
    }

    for (i, (param, ty)) in param_types.iter().zip(arg_types).enumerate() {
        if !param.accepts(ty) {
            defects.push(format!("[{}]: Expected `{}` found `{}`", i, param, ty));
        }
    }

    let mut parsed = Vec::with_capacity(literals.len());
    for (offset, literal) in literals.iter().enumerate() {
        let i = arg_types.len() + offset;
        match parse_param_literal(&param_types[i], literal) {
            Ok(value) => parsed.push(value),
            Err(e) => defects.push(format!("[{}]: {}", i, e)),
        }
    }

    if defects.is_empty() {
        Ok(parsed)
    } else {
        Err(defects)
    }
}

/// Common type of the entry arguments in variadic position.
fn infer_vararg(element: &ParamType, types: &[ValueType], defects: &mut Vec<String>) -> Option<ParamType> {
    let mut common: Option<ParamType> = None;
    for ty in types {
        if !element.accepts(ty) {
            defects.push(format!(
                "Incorrect type used in varargs: {} is not assignable to {}",
                ty, element
            ));
            continue;
        }
        common = match common {
            None => Some(ParamType::Exact(ty.clone())),
            Some(prev) => match prev.common_supertype(ty) {
                Some(merged) => Some(merged),
                // A type variable binds to one type; a declared element
                // type already covers both.
                None if matches!(element, ParamType::Generic { .. }) => {
                    defects.push(format!("Incompatible types used in varargs ({} & {})", prev, ty));
                    Some(prev)
                }
                None => Some(erase(element)),
            },
        };
    }
    common
}

fn erase(param: &ParamType) -> ParamType {
    match param {
        ParamType::Generic { bound, .. } => bound.as_param(),
        other => other.clone(),
    }
}

fn parse_param_literal(param: &ParamType, literal: &str) -> Result<Value, ConditionError> {
    match param {
        ParamType::Exact(ty) => parse_literal(ty, literal),
        ParamType::Any => Ok(Value::Str(literal.to_string())),
        ParamType::Number => {
            let trimmed = literal.trim();
            trimmed
                .parse::<i64>()
                .map(Value::I64)
                .or_else(|_| trimmed.parse::<f64>().map(Value::F64))
                .map_err(|e| ConditionError::InvalidNumber {
                    literal: literal.to_string(),
                    type_name: "number",
                    reason: e.to_string(),
                })
        }
        ParamType::Generic { bound, .. } => parse_param_literal(&bound.as_param(), literal),
    }
}

// ============================================================================
// HANDLERS
// ============================================================================

/// A validated handler method.
#[derive(Clone)]
pub struct Handler {
    method: MethodId,
    key: String,
    signature: Signature,
    invoke: HandlerFn,
    const_args: Vec<BoundEntry>,
    default: Option<Requirement>,
}

impl Handler {
    pub fn method(&self) -> MethodId {
        self.method
    }

    /// Canonical key, `package.Type#method`.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn const_args(&self) -> &[BoundEntry] {
        &self.const_args
    }

    /// Requirement for call sites that add no arguments, when the constant
    /// parameters alone satisfy the signature.
    pub fn requirement(&self) -> Option<&Requirement> {
        self.default.as_ref()
    }

    /// Bind the call-site arguments after the constant parameters.
    pub fn bind(&self, site: &[BoundEntry], literals: &[String]) -> Result<Requirement, HandlerError> {
        if site.is_empty() && literals.is_empty() {
            if let Some(default) = &self.default {
                return Ok(default.clone());
            }
        }

        let entries: Vec<&BoundEntry> = self.const_args.iter().chain(site).collect();
        let types: Vec<ValueType> = entries.iter().map(|b| b.entry.value_type()).collect();
        let parsed = check_arguments(&self.signature, &types, literals).map_err(|defects| {
            HandlerError::ArgumentMismatch {
                handler: self.key.clone(),
                defects,
            }
        })?;

        let sources = entries
            .iter()
            .map(|b| ArgSource::Entry {
                entry: b.entry.downgrade(),
                label: b.label.clone(),
            })
            .chain(parsed.into_iter().map(ArgSource::Literal))
            .collect();
        Ok(self.wrap(sources))
    }

    fn wrap(&self, sources: Vec<ArgSource>) -> Requirement {
        let invoke = Rc::clone(&self.invoke);
        let key = self.key.clone();
        let fixed = self.signature.params.len();
        let variadic = self.signature.is_variadic();

        Requirement::from_fn(move || {
            let mut values = sources
                .iter()
                .map(ArgSource::read)
                .collect::<EvalResult<Vec<_>>>()?;
            if variadic {
                let rest = values.split_off(fixed);
                values.push(Value::List(rest));
            }
            invoke(&values).map_err(|e| EvalError::HandlerFailed {
                handler: key.clone(),
                reason: e.message,
            })
        })
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("key", &self.key)
            .field("signature", &self.signature)
            .field("const_args", &self.const_args.len())
            .finish_non_exhaustive()
    }
}

/// Reject signatures that cannot be called as a handler.
pub fn validate_signature(key: &str, signature: &Signature, config: &ResolverConfig) -> Result<(), HandlerError> {
    let mut defects = Vec::new();

    if signature.returns != ValueType::Bool {
        defects.push(format!(
            "Unexpected return type: expected `bool` but found `{}`",
            signature.returns
        ));
    }
    if signature.receiver == Receiver::Instance {
        defects.push("Unexpected instance method: only static handlers are supported".to_string());
    }
    if !signature.failures.is_empty() {
        defects.push(format!(
            "Unexpected failures declared: {}",
            signature.failures.join(", ")
        ));
    }
    if signature.is_variadic() && !config.allow_variadic_handlers {
        defects.push("Unexpected variadic parameter: variadic handlers are disabled".to_string());
    }

    if defects.is_empty() {
        Ok(())
    } else {
        Err(HandlerError::InvalidSignature {
            handler: key.to_string(),
            defects,
        })
    }
}

// ============================================================================
// TABLE
// ============================================================================

/// Handlers by method identity, with their canonical keys.
#[derive(Debug, Clone, Default)]
pub struct HandlerTable {
    handlers: HashMap<MethodId, Handler>,
    keys: BTreeMap<String, MethodId>,
}

impl HandlerTable {
    /// Validate and wrap every handler method of `schema`. Constant
    /// parameters are resolved against `entries`.
    pub fn build(schema: &Schema, entries: &EntryTable, config: &ResolverConfig) -> Result<Self, HandlerError> {
        let parser = ReferenceParser::with_config(schema, config);
        let mut table = HandlerTable::default();

        for method in schema.handler_methods() {
            let handler = Self::build_one(schema, &parser, entries, config, method)?;
            if table.keys.contains_key(&handler.key) {
                return Err(HandlerError::DuplicateKey { key: handler.key });
            }
            debug!(
                handler = %handler.key,
                signature = %handler.signature,
                const_args = handler.const_args.len(),
                "registered requirement handler"
            );
            table.keys.insert(handler.key.clone(), handler.method);
            table.handlers.insert(handler.method, handler);
        }

        Ok(table)
    }

    fn build_one(
        schema: &Schema,
        parser: &ReferenceParser<'_>,
        entries: &EntryTable,
        config: &ResolverConfig,
        method: &MethodDef,
    ) -> Result<Handler, HandlerError> {
        let key = schema.method_key(method.id);
        validate_signature(&key, &method.signature, config)?;

        let Some(spec) = &method.handler else {
            return Err(HandlerError::InvalidSignature {
                handler: key,
                defects: vec!["Method is not declared as a handler".to_string()],
            });
        };

        let mut const_args = Vec::with_capacity(spec.const_params.len());
        for text in &spec.const_params {
            let field = parser
                .parse_field(method.id.owner, text)
                .map_err(|error| HandlerError::ConstReference {
                    handler: key.clone(),
                    error,
                })?;
            let entry = entries.entry(&field).map_err(|error| HandlerError::ConstLookup {
                handler: key.clone(),
                error,
            })?;
            const_args.push(BoundEntry::new(entry, text.clone()));
        }

        let mut handler = Handler {
            method: method.id,
            key,
            signature: method.signature.clone(),
            invoke: Rc::clone(&spec.invoke),
            const_args,
            default: None,
        };

        let fixed = handler.signature.params.len();
        let satisfied = if handler.signature.is_variadic() {
            handler.const_args.len() >= fixed
        } else {
            handler.const_args.len() == fixed
        };
        if satisfied {
            handler.default = Some(handler.bind(&[], &[])?);
        }

        Ok(handler)
    }

    pub fn get(&self, method: MethodId) -> Option<&Handler> {
        self.handlers.get(&method)
    }

    pub fn by_key(&self, key: &str) -> Option<&Handler> {
        self.keys.get(key).and_then(|id| self.handlers.get(id))
    }

    /// Canonical keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use requisite_core::{EnumType, HandlerFailure, HandlerSpec, SchemaBuilder, TypeBound};
    use requisite_test_utils::MockEntry;

    fn bool_param() -> ParamType {
        ParamType::Exact(ValueType::Bool)
    }

    fn int_param() -> ParamType {
        ParamType::Exact(ValueType::I32)
    }

    #[test]
    fn test_argument_count_checked() {
        let sig = Signature::predicate([bool_param(), bool_param()]);
        let defects = check_arguments(&sig, &[ValueType::Bool], &[]).unwrap_err();
        assert_eq!(defects, vec!["Incorrect argument count: expected 2, found 1"]);

        let sig = Signature::predicate([bool_param()]).with_variadic(ParamType::Any);
        let defects = check_arguments(&sig, &[], &[]).unwrap_err();
        assert!(defects[0].contains("at least 1"));
        assert!(check_arguments(&sig, &[ValueType::Bool], &[]).is_ok());
    }

    #[test]
    fn test_all_type_mismatches_reported() {
        let sig = Signature::predicate([bool_param(), int_param()]);
        let defects = check_arguments(&sig, &[ValueType::I32, ValueType::Str], &[]).unwrap_err();
        assert_eq!(defects.len(), 2);
        assert_eq!(defects[0], "[0]: Expected `bool` found `i32`");
        assert_eq!(defects[1], "[1]: Expected `i32` found `String`");
    }

    #[test]
    fn test_generic_binding_widens_numbers() {
        let sig = Signature::predicate([ParamType::generic("T"), ParamType::generic("T")]);
        assert!(check_arguments(&sig, &[ValueType::I32, ValueType::I32], &[]).is_ok());
        assert!(check_arguments(&sig, &[ValueType::I32, ValueType::F64], &[]).is_ok());
        let defects = check_arguments(&sig, &[ValueType::Bool, ValueType::Str], &[]).unwrap_err();
        assert!(defects[0].contains("Incompatible types used for T (bool & String)"));
    }

    #[test]
    fn test_generic_bound_enforced() {
        let t = ParamType::Generic {
            name: "N".into(),
            bound: TypeBound::Number,
        };
        let sig = Signature::predicate([t]);
        let defects = check_arguments(&sig, &[ValueType::Bool], &[]).unwrap_err();
        assert!(defects[0].contains("Expected `Number` found `bool`"));
    }

    #[test]
    fn test_vararg_element_inferred_from_entries() {
        let sig = Signature::predicate([]).with_variadic(ParamType::generic("T"));
        assert!(check_arguments(&sig, &[ValueType::Bool, ValueType::Bool], &[]).is_ok());
        let defects = check_arguments(&sig, &[ValueType::Bool, ValueType::I32], &[]).unwrap_err();
        assert!(defects[0].contains("Incompatible types used in varargs"));
    }

    #[test]
    fn test_vararg_element_from_generic_binding() {
        let sig = Signature::predicate([ParamType::generic("T")]).with_variadic(ParamType::generic("T"));
        let parsed = check_arguments(&sig, &[ValueType::I32], &["7".to_string()]).unwrap();
        assert_eq!(parsed, vec![Value::I32(7)]);
    }

    #[test]
    fn test_static_literals_parsed_by_param_type() {
        let e = EnumType::new("Demo", ["GOOD", "BAD"]);
        let sig = Signature::predicate([int_param(), ParamType::Exact(ValueType::Enum(e)), ParamType::Any]);
        let literals = vec!["12".to_string(), "GOOD".to_string(), "x".to_string()];
        let parsed = check_arguments(&sig, &[], &literals).unwrap();
        assert_eq!(
            parsed,
            vec![Value::I32(12), Value::enum_constant("GOOD"), Value::from("x")]
        );

        let bad = vec!["twelve".to_string(), "WORSE".to_string(), "x".to_string()];
        let defects = check_arguments(&sig, &[], &bad).unwrap_err();
        assert_eq!(defects.len(), 2);
        assert!(defects[0].starts_with("[0]:"));
        assert!(defects[1].contains("Invalid enum constant \"WORSE\""));
    }

    #[test]
    fn test_signature_defects_collected() {
        let sig = Signature::predicate([])
            .returning(ValueType::I32)
            .on_instance()
            .declaring_failure("IoError")
            .with_variadic(ParamType::Any);
        let err = validate_signature("demo.H#bad", &sig, &ResolverConfig::strict()).unwrap_err();
        let msg = format!("{}", err);
        assert!(msg.starts_with("Invalid handler signature on demo.H#bad: (4 errors)"));
        assert!(msg.contains("\n    Unexpected return type"));
        assert!(msg.contains("IoError"));
        assert!(validate_signature("demo.H#ok", &Signature::predicate([]), &ResolverConfig::strict()).is_ok());
    }

    struct Fixture {
        schema: Schema,
        entries: EntryTable,
        toggle: Rc<MockEntry>,
        slider: Rc<MockEntry>,
    }

    fn fixture(extra: impl FnOnce(&mut SchemaBuilder, requisite_core::TypeId)) -> Fixture {
        let mut b = SchemaBuilder::new();
        let config = b.add_root_type("demo", "Config").unwrap();
        let handlers = b.add_nested_type(config, "Handlers").unwrap();
        let toggle_id = b.add_field(config, "toggle", ValueType::Bool).unwrap();
        let slider_id = b.add_field(config, "slider", ValueType::I32).unwrap();
        b.add_handler(
            handlers,
            "toggleOn",
            Signature::predicate([bool_param()]),
            HandlerSpec::new(|args| Ok(args[0] == Value::Bool(true))).with_const_params(["Config#toggle"]),
        )
        .unwrap();
        b.add_handler(
            handlers,
            "sliderAbove",
            Signature::predicate([int_param(), int_param()]),
            HandlerSpec::new(|args| {
                let (a, b) = (args[0].as_i64(), args[1].as_i64());
                match (a, b) {
                    (Some(a), Some(b)) => Ok(a > b),
                    _ => Err(HandlerFailure::new("expected integers")),
                }
            })
            .with_const_params(["Config#slider"]),
        )
        .unwrap();
        extra(&mut b, handlers);
        let schema = b.build();

        let toggle = MockEntry::boolean("toggle", false);
        let slider = MockEntry::integer("slider", 10);
        let mut entries = EntryTable::new();
        entries.register(toggle_id, Some(vec![toggle.handle()]));
        entries.register(slider_id, Some(vec![slider.handle()]));
        Fixture {
            schema,
            entries,
            toggle,
            slider,
        }
    }

    #[test]
    fn test_table_wraps_handlers_with_live_values() {
        let fx = fixture(|_, _| {});
        let table = HandlerTable::build(&fx.schema, &fx.entries, &ResolverConfig::default()).unwrap();
        assert_eq!(table.len(), 2);
        let keys: Vec<&str> = table.keys().collect();
        assert_eq!(keys, vec!["demo.Config.Handlers#sliderAbove", "demo.Config.Handlers#toggleOn"]);

        let toggle_on = table.by_key("demo.Config.Handlers#toggleOn").unwrap();
        let req = toggle_on.requirement().unwrap().clone();
        assert!(!req.check().unwrap());
        fx.toggle.set(true);
        assert!(req.check().unwrap());
    }

    #[test]
    fn test_site_literals_complete_the_binding() {
        let fx = fixture(|_, _| {});
        let table = HandlerTable::build(&fx.schema, &fx.entries, &ResolverConfig::default()).unwrap();
        let above = table.by_key("demo.Config.Handlers#sliderAbove").unwrap();
        assert!(above.requirement().is_none());
        let req = above.bind(&[], &["20".to_string()]).unwrap();
        assert!(!req.check().unwrap());
        fx.slider.set(30);
        assert!(req.check().unwrap());
    }

    #[test]
    fn test_site_entries_complete_the_binding() {
        let fx = fixture(|_, _| {});
        let table = HandlerTable::build(&fx.schema, &fx.entries, &ResolverConfig::default()).unwrap();
        let above = table.by_key("demo.Config.Handlers#sliderAbove").unwrap();
        let other = MockEntry::integer("other", 5);
        let req = above.bind(&[BoundEntry::new(other.handle(), "other")], &[]).unwrap();
        assert!(req.check().unwrap());

        let wrong = MockEntry::boolean("wrong", true);
        let err = above
            .bind(&[BoundEntry::new(wrong.handle(), "wrong")], &[])
            .unwrap_err();
        let msg = format!("{}", err);
        assert!(msg.contains("Invalid parameter types on demo.Config.Handlers#sliderAbove: (1 errors)"));
        assert!(msg.contains("\n    [1]: Expected `i32` found `bool`"));
    }

    #[test]
    fn test_handler_failure_names_handler() {
        let fx = fixture(|_, _| {});
        let table = HandlerTable::build(&fx.schema, &fx.entries, &ResolverConfig::default()).unwrap();
        let above = table.by_key("demo.Config.Handlers#sliderAbove").unwrap();
        let req = above.bind(&[], &["20".to_string()]).unwrap();
        fx.slider.set("not a number");
        let err = req.check().unwrap_err();
        assert_eq!(
            err,
            EvalError::HandlerFailed {
                handler: "demo.Config.Handlers#sliderAbove".to_string(),
                reason: "expected integers".to_string(),
            }
        );
    }

    #[test]
    fn test_released_entry_reported() {
        let fx = fixture(|_, _| {});
        let table = HandlerTable::build(&fx.schema, &fx.entries, &ResolverConfig::default()).unwrap();
        let above = table.by_key("demo.Config.Handlers#sliderAbove").unwrap();
        let other = MockEntry::integer("other", 5);
        let req = above.bind(&[BoundEntry::new(other.handle(), "Config#other")], &[]).unwrap();
        drop(other);
        assert_eq!(
            req.check().unwrap_err(),
            EvalError::EntryReleased {
                target: "Config#other".to_string()
            }
        );
    }

    #[test]
    fn test_overloaded_handlers_collide() {
        let fx = fixture(|b, handlers| {
            b.add_handler(
                handlers,
                "toggleOn",
                Signature::predicate([]),
                HandlerSpec::new(|_| Ok(true)),
            )
            .unwrap();
        });
        let err = HandlerTable::build(&fx.schema, &fx.entries, &ResolverConfig::default()).unwrap_err();
        assert_eq!(
            format!("{}", err),
            "Multiple methods have the same reference (\"demo.Config.Handlers#toggleOn\")"
        );
    }

    #[test]
    fn test_unregistered_const_param() {
        let fx = fixture(|b, handlers| {
            b.add_handler(
                handlers,
                "missing",
                Signature::predicate([bool_param()]),
                HandlerSpec::new(|_| Ok(true)).with_const_params(["Config#nothing"]),
            )
            .unwrap();
        });
        let err = HandlerTable::build(&fx.schema, &fx.entries, &ResolverConfig::default()).unwrap_err();
        assert!(matches!(err, HandlerError::ConstReference { .. }));
    }

    #[test]
    fn test_variadic_rejected_when_disabled() {
        let fx = fixture(|b, handlers| {
            b.add_handler(
                handlers,
                "many",
                Signature::predicate([]).with_variadic(ParamType::Any),
                HandlerSpec::new(|_| Ok(true)),
            )
            .unwrap();
        });
        let config = ResolverConfig {
            allow_variadic_handlers: false,
            ..ResolverConfig::default()
        };
        let err = HandlerTable::build(&fx.schema, &fx.entries, &config).unwrap_err();
        assert!(format!("{}", err).contains("variadic"));
        assert!(HandlerTable::build(&fx.schema, &fx.entries, &ResolverConfig::default()).is_ok());
    }
}
