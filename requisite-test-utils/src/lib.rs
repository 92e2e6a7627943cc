//! REQUISITE Test Utilities
//!
//! Centralized test infrastructure for the REQUISITE workspace:
//! - A mock entry surface recording installed requirements
//! - Proptest generators for declarations, literals and identifiers
//! - The demonstration schema used by the end-to-end scenarios
//! - Custom assertions for installed requirements

pub use requisite_core::{
    Action, DependencyDecl, Entry, EntryHandle, EnumType, EvalResult, FieldId, HandlerFailure,
    HandlerSpec, ParamType, Quantifier, Requirement, RequirementDecl, Schema, SchemaBuilder,
    SchemaError, Signature, TypeId, Value, ValueType,
};

use std::cell::{Cell, RefCell};
use std::rc::Rc;

// ============================================================================
// MOCK ENTRY SURFACE
// ============================================================================

/// In-memory entry: holds a live value and whatever requirements were
/// installed on it.
pub struct MockEntry {
    name: String,
    value_type: ValueType,
    value: RefCell<Value>,
    enable: RefCell<Option<Requirement>>,
    display: RefCell<Option<Requirement>>,
    installs: Cell<usize>,
}

impl MockEntry {
    pub fn new(name: impl Into<String>, value_type: ValueType, value: Value) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            value_type,
            value: RefCell::new(value),
            enable: RefCell::new(None),
            display: RefCell::new(None),
            installs: Cell::new(0),
        })
    }

    pub fn boolean(name: impl Into<String>, value: bool) -> Rc<Self> {
        Self::new(name, ValueType::Bool, Value::Bool(value))
    }

    pub fn integer(name: impl Into<String>, value: i32) -> Rc<Self> {
        Self::new(name, ValueType::I32, Value::I32(value))
    }

    pub fn text(name: impl Into<String>, value: &str) -> Rc<Self> {
        Self::new(name, ValueType::Str, Value::Str(value.to_string()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Replace the live value, as a user edit would.
    pub fn set(&self, value: impl Into<Value>) {
        *self.value.borrow_mut() = value.into();
    }

    pub fn handle(self: &Rc<Self>) -> EntryHandle {
        EntryHandle::new(Rc::clone(self))
    }

    /// Enabled unless an installed enable requirement says otherwise.
    pub fn is_enabled(&self) -> EvalResult<bool> {
        match self.enable.borrow().as_ref() {
            Some(requirement) => requirement.check(),
            None => Ok(true),
        }
    }

    /// Displayed unless an installed display requirement says otherwise.
    pub fn is_displayed(&self) -> EvalResult<bool> {
        match self.display.borrow().as_ref() {
            Some(requirement) => requirement.check(),
            None => Ok(true),
        }
    }

    pub fn enable_requirement(&self) -> Option<Requirement> {
        self.enable.borrow().clone()
    }

    pub fn display_requirement(&self) -> Option<Requirement> {
        self.display.borrow().clone()
    }

    /// Number of setter calls received so far.
    pub fn install_count(&self) -> usize {
        self.installs.get()
    }
}

impl Entry for MockEntry {
    fn value(&self) -> Value {
        self.value.borrow().clone()
    }

    fn value_type(&self) -> ValueType {
        self.value_type.clone()
    }

    fn set_enable_requirement(&self, requirement: Option<Requirement>) {
        self.installs.set(self.installs.get() + 1);
        *self.enable.borrow_mut() = requirement;
    }

    fn set_display_requirement(&self, requirement: Option<Requirement>) {
        self.installs.set(self.installs.get() + 1);
        *self.display.borrow_mut() = requirement;
    }
}

impl std::fmt::Debug for MockEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockEntry")
            .field("name", &self.name)
            .field("value", &*self.value.borrow())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for generating test data.

    use super::*;
    use proptest::prelude::*;

    pub fn arb_quantifier() -> impl Strategy<Value = Quantifier> {
        prop_oneof![
            Just(Quantifier::All),
            Just(Quantifier::Any),
            Just(Quantifier::None),
            Just(Quantifier::One),
        ]
    }

    pub fn arb_action() -> impl Strategy<Value = Action> {
        prop_oneof![Just(Action::Enable), Just(Action::Display)]
    }

    /// A valid schema identifier.
    pub fn arb_identifier() -> impl Strategy<Value = String> {
        "[a-zA-Z_$][a-zA-Z0-9_$]{0,11}"
    }

    /// A dot-separated package of one to three lowercase segments.
    pub fn arb_package() -> impl Strategy<Value = String> {
        prop::collection::vec("[a-z][a-z0-9]{0,6}", 1..=3).prop_map(|segments| segments.join("."))
    }

    /// Every spelling accepted as `true`, in random case.
    pub fn arb_truthy_literal() -> impl Strategy<Value = String> {
        arb_cased(&["1", "t", "true", "y", "yes", "on", "enable", "enabled"])
    }

    /// Every spelling accepted as `false`, in random case.
    pub fn arb_falsy_literal() -> impl Strategy<Value = String> {
        arb_cased(&["0", "f", "false", "n", "no", "off", "disable", "disabled"])
    }

    fn arb_cased(words: &'static [&'static str]) -> impl Strategy<Value = String> {
        (prop::sample::select(words), any::<u64>()).prop_map(|(word, mask)| {
            word.chars()
                .enumerate()
                .map(|(i, c)| {
                    if mask >> (i % 64) & 1 == 1 {
                        c.to_ascii_uppercase()
                    } else {
                        c
                    }
                })
                .collect()
        })
    }

    /// Numeric comparison operator tokens, including the empty default.
    pub fn arb_number_operator() -> impl Strategy<Value = &'static str> {
        prop::sample::select(vec!["", "==", "!=", ">", ">=", "<", "<="])
    }

    /// Outcomes for a group of constant requirement children.
    pub fn arb_constant_children(max: usize) -> impl Strategy<Value = Vec<bool>> {
        prop::collection::vec(any::<bool>(), 0..=max)
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! The demonstration schema: a module of toggles, an enum, a slider and
    //! the fields that depend on them, plus a handler type.

    use super::*;

    pub const PACKAGE: &str = "demo.autoconfig";

    /// Constants of the demonstration enum, in declaration order.
    pub const DEMO_ENUM: [&str; 5] = ["EXCELLENT", "GOOD", "OKAY", "BAD", "HORRIBLE"];

    pub fn demo_enum() -> EnumType {
        EnumType::new("DependencyDemoEnum", DEMO_ENUM)
    }

    /// Type identities of the demonstration schema.
    #[derive(Debug, Clone, Copy)]
    pub struct ExampleTypes {
        /// `demo.autoconfig.ExampleConfig`
        pub root: TypeId,
        /// `ExampleConfig.ModuleC`
        pub module_c: TypeId,
        /// `ExampleConfig.ModuleC.Handlers`
        pub handlers: TypeId,
        /// `ExampleConfig.ModuleC.DependencySubCategory`
        pub dependencies: TypeId,
        /// `DependencySubCategory.DependantObject`
        pub dependant_object: TypeId,
        /// `DependencySubCategory.DependantCollapsible`
        pub dependant_collapsible: TypeId,
    }

    /// The demonstration schema and its type identities.
    #[derive(Debug, Clone)]
    pub struct ExampleSchema {
        pub schema: Schema,
        pub types: ExampleTypes,
    }

    impl ExampleSchema {
        pub fn new() -> Self {
            Self::build_with(|_, _| Ok(()))
        }

        /// Build the demonstration schema, letting `extra` add declarations
        /// before it is frozen.
        pub fn build_with<F>(extra: F) -> Self
        where
            F: FnOnce(&mut SchemaBuilder, &ExampleTypes) -> Result<(), SchemaError>,
        {
            let mut b = SchemaBuilder::new();
            let types = declare(&mut b).expect("demonstration schema is valid");
            extra(&mut b, &types).expect("extra declarations are valid");
            Self {
                schema: b.build(),
                types,
            }
        }

        /// Field `name` declared on `owner`. Panics when absent.
        pub fn field(&self, owner: TypeId, name: &str) -> FieldId {
            self.schema
                .type_def(owner)
                .and_then(|t| t.field_named(name))
                .map(|f| f.id)
                .unwrap_or_else(|| panic!("no field {} on {}", name, self.schema.type_name(owner)))
        }

        /// Field `name` of `DependencySubCategory`.
        pub fn dep(&self, name: &str) -> FieldId {
            self.field(self.types.dependencies, name)
        }

        /// Mock entries for every non-object field, with the demonstration
        /// defaults.
        pub fn entries(&self) -> ExampleEntries {
            let mut entries = Vec::new();
            for ty in self.schema.types() {
                for field in &ty.fields {
                    if matches!(field.value_type, ValueType::Object(_)) {
                        continue;
                    }
                    let value = default_value(&field.name, &field.value_type);
                    let entry = MockEntry::new(field.name.clone(), field.value_type.clone(), value);
                    entries.push((field.id, entry));
                }
            }
            ExampleEntries { entries }
        }
    }

    impl Default for ExampleSchema {
        fn default() -> Self {
            Self::new()
        }
    }

    /// Mock entries produced for the demonstration schema.
    #[derive(Debug, Clone)]
    pub struct ExampleEntries {
        entries: Vec<(FieldId, Rc<MockEntry>)>,
    }

    impl ExampleEntries {
        /// The entry produced for `field`. Panics when absent.
        pub fn get(&self, field: FieldId) -> Rc<MockEntry> {
            self.entries
                .iter()
                .find(|(id, _)| *id == field)
                .map(|(_, e)| Rc::clone(e))
                .unwrap_or_else(|| panic!("no entry for {:?}", field))
        }

        pub fn handles(&self, field: FieldId) -> Vec<EntryHandle> {
            vec![self.get(field).handle()]
        }

        /// Entries in declaration order.
        pub fn iter(&self) -> impl Iterator<Item = (FieldId, &Rc<MockEntry>)> {
            self.entries.iter().map(|(id, e)| (*id, e))
        }

        /// Entries produced for the fields of `owner`, in declaration order.
        pub fn of_type(&self, owner: TypeId) -> Vec<EntryHandle> {
            self.entries
                .iter()
                .filter(|(id, _)| id.owner == owner)
                .map(|(_, e)| e.handle())
                .collect()
        }
    }

    fn default_value(name: &str, value_type: &ValueType) -> Value {
        match name {
            "lameToggle" | "dependsOnIntSlider" | "toggle2" => Value::Bool(true),
            "coolEnum" => Value::enum_constant("OKAY"),
            "intSlider" => Value::I32(50),
            "list" => Value::List(vec![Value::I32(1), Value::I32(2), Value::I32(3)]),
            _ => match value_type {
                ValueType::Bool => Value::Bool(false),
                ValueType::I32 => Value::I32(0),
                ValueType::Str => Value::Str(String::new()),
                other => Value::Object {
                    type_name: other.name(),
                    repr: String::new(),
                },
            },
        }
    }

    fn declare(b: &mut SchemaBuilder) -> Result<ExampleTypes, SchemaError> {
        let root = b.add_root_type(PACKAGE, "ExampleConfig")?;
        let module_c = b.add_nested_type(root, "ModuleC")?;
        let handlers = b.add_nested_type(module_c, "Handlers")?;
        let dependencies = b.add_nested_type(module_c, "DependencySubCategory")?;
        let dependant_object = b.add_nested_type(dependencies, "DependantObject")?;
        let dependant_collapsible = b.add_nested_type(dependencies, "DependantCollapsible")?;

        let bool_param = || ParamType::Exact(ValueType::Bool);

        b.add_handler(
            handlers,
            "coolToggleIsEnabled",
            Signature::predicate([bool_param()]),
            HandlerSpec::new(|args| Ok(args[0].as_bool().unwrap_or(false)))
                .with_const_params(["demo.autoconfig.ExampleConfig.ModuleC.DependencySubCategory#coolToggle"]),
        )?;
        b.add_handler(
            handlers,
            "coolToggleMatchesLameToggle",
            Signature::predicate([bool_param(), bool_param()]),
            HandlerSpec::new(|args| Ok(args[0] == args[1])).with_const_params([
                "ExampleConfig.ModuleC.DependencySubCategory#coolToggle",
                "ExampleConfig.ModuleC.DependencySubCategory#lameToggle",
            ]),
        )?;
        b.add_handler(
            handlers,
            "intSliderIsBigOrSmall",
            Signature::predicate([ParamType::Exact(ValueType::I32)]),
            HandlerSpec::new(|args| {
                let slider = args[0]
                    .as_i64()
                    .ok_or_else(|| HandlerFailure::new("intSlider is not an integer"))?;
                Ok(slider > 70 || slider < -70)
            })
            .with_const_params(["ExampleConfig.ModuleC.DependencySubCategory#intSlider"]),
        )?;
        b.add_handler(
            handlers,
            "coolEnumIsGoodOrBetter",
            Signature::predicate([ParamType::Exact(ValueType::Enum(demo_enum()))]),
            HandlerSpec::new(|args| Ok(matches!(args[0].as_str(), Some("GOOD") | Some("EXCELLENT"))))
                .with_const_params(["ExampleConfig.ModuleC.DependencySubCategory#coolEnum"]),
        )?;

        b.add_field(dependencies, "coolToggle", ValueType::Bool)?;
        b.add_field(dependencies, "lameToggle", ValueType::Bool)?;
        b.add_field(dependencies, "coolEnum", ValueType::Enum(demo_enum()))?;
        b.add_field(dependencies, "intSlider", ValueType::I32)?;

        let f = b.add_field(dependencies, "dependsOnCoolToggle1", ValueType::Bool)?;
        b.require(f, RequirementDecl::enable_if("coolToggle"))?;

        let f = b.add_field(dependencies, "dependsOnCoolToggle2", ValueType::Bool)?;
        b.require(
            f,
            RequirementDecl::display_if("ExampleConfig.ModuleC.Handlers#coolToggleIsEnabled"),
        )?;

        let f = b.add_field(dependencies, "dependsOnToggleMatch", ValueType::Bool)?;
        b.require(
            f,
            RequirementDecl::enable_if("ExampleConfig.ModuleC.Handlers#coolToggleMatchesLameToggle"),
        )?;

        let f = b.add_field(dependencies, "dependsOnIntSlider", ValueType::Bool)?;
        b.require(
            f,
            RequirementDecl::enable_if("ExampleConfig.ModuleC.Handlers#intSliderIsBigOrSmall"),
        )?;

        let object_type = ValueType::Object(
            "demo.autoconfig.ExampleConfig.ModuleC.DependencySubCategory.DependantObject".to_string(),
        );
        let f = b.add_field(dependencies, "dependantObject", object_type)?;
        b.require(f, RequirementDecl::enable_if("coolToggle"))?;
        b.require(
            f,
            RequirementDecl::enable_if(
                DependencyDecl::on("ExampleConfig.ModuleC.DependencySubCategory#coolEnum")
                    .when("GOOD")
                    .when("EXCELLENT"),
            ),
        )?;

        let collapsible_type = ValueType::Object(
            "demo.autoconfig.ExampleConfig.ModuleC.DependencySubCategory.DependantCollapsible"
                .to_string(),
        );
        let f = b.add_field(dependencies, "dependantCollapsible", collapsible_type)?;
        b.require(f, RequirementDecl::enable_if("coolToggle"))?;

        let f = b.add_field(dependencies, "list", ValueType::list_of(ValueType::I32))?;
        b.require(
            f,
            RequirementDecl::enable_if("ExampleConfig.ModuleC.Handlers#coolToggleIsEnabled"),
        )?;

        b.add_field(dependant_object, "toggle1", ValueType::Bool)?;
        let f = b.add_field(dependant_object, "toggle2", ValueType::Bool)?;
        b.require(
            f,
            RequirementDecl::enable_if(
                DependencyDecl::on("ExampleConfig.ModuleC.DependencySubCategory#intSlider")
                    .when("50")
                    .when("100"),
            ),
        )?;

        b.add_field(dependant_collapsible, "toggle1", ValueType::Bool)?;
        b.add_field(dependant_collapsible, "toggle2", ValueType::Bool)?;

        let f = b.add_field(module_c, "dependsOnCoolToggleOutside", ValueType::Bool)?;
        b.require(
            f,
            RequirementDecl::enable_if("ExampleConfig.ModuleC.DependencySubCategory#coolToggle"),
        )?;

        Ok(ExampleTypes {
            root,
            module_c,
            handlers,
            dependencies,
            dependant_object,
            dependant_collapsible,
        })
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions over installed requirements.

    use super::*;

    /// Assert the entry's enable state evaluates to `expected`.
    pub fn assert_enabled(entry: &MockEntry, expected: bool) {
        match entry.is_enabled() {
            Ok(actual) => assert_eq!(
                actual, expected,
                "expected {} to be {}",
                entry.name(),
                if expected { "enabled" } else { "disabled" }
            ),
            Err(e) => panic!("enable requirement of {} failed: {}", entry.name(), e),
        }
    }

    /// Assert the entry's display state evaluates to `expected`.
    pub fn assert_displayed(entry: &MockEntry, expected: bool) {
        match entry.is_displayed() {
            Ok(actual) => assert_eq!(
                actual, expected,
                "expected {} to be {}",
                entry.name(),
                if expected { "displayed" } else { "hidden" }
            ),
            Err(e) => panic!("display requirement of {} failed: {}", entry.name(), e),
        }
    }

    /// Assert that no requirement was ever installed on the entry.
    pub fn assert_unrestricted(entry: &MockEntry) {
        assert_eq!(
            entry.install_count(),
            0,
            "expected no requirement installed on {}",
            entry.name()
        );
        assert!(entry.enable_requirement().is_none());
        assert!(entry.display_requirement().is_none());
    }
}

#[cfg(test)]
mod tests {
    use super::assertions::*;
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_mock_entry_reads_live_value() {
        let entry = MockEntry::boolean("toggle", false);
        assert_eq!(entry.value(), Value::Bool(false));
        entry.set(true);
        assert_eq!(entry.value(), Value::Bool(true));
    }

    #[test]
    fn test_mock_entry_without_requirements_is_unrestricted() {
        let entry = MockEntry::integer("slider", 5);
        assert_enabled(&entry, true);
        assert_displayed(&entry, true);
        assert_unrestricted(&entry);
    }

    #[test]
    fn test_mock_entry_records_installs() {
        let entry = MockEntry::boolean("toggle", false);
        entry.set_enable_requirement(Some(Requirement::constant(false)));
        assert_eq!(entry.install_count(), 1);
        assert_enabled(&entry, false);
    }

    #[test]
    fn test_example_schema_shape() {
        let example = ExampleSchema::new();
        let schema = &example.schema;
        assert_eq!(
            schema.type_name(example.types.dependencies),
            "demo.autoconfig.ExampleConfig.ModuleC.DependencySubCategory"
        );
        assert_eq!(schema.handler_methods().count(), 4);
        let governed: Vec<&str> = schema.governed_fields().map(|f| f.name.as_str()).collect();
        assert!(governed.contains(&"dependsOnCoolToggle1"));
        assert!(governed.contains(&"dependantObject"));
    }

    #[test]
    fn test_example_entries_use_defaults() {
        let example = ExampleSchema::new();
        let entries = example.entries();
        assert_eq!(entries.get(example.dep("intSlider")).value(), Value::I32(50));
        assert_eq!(
            entries.get(example.dep("coolEnum")).value(),
            Value::enum_constant("OKAY")
        );
        assert_eq!(entries.get(example.dep("lameToggle")).value(), Value::Bool(true));
        assert_eq!(entries.of_type(example.types.dependant_object).len(), 2);
    }
}
