//! Requirement manager
//!
//! Two-phase protocol: entries are registered field by field while the
//! entry surface builds its controls, then [`RequirementManager::build`]
//! resolves every declared requirement in one pass and installs the results.
//! Building is all-or-nothing and happens at most once.

use crate::definition::{RequirementDefinition, ResolveContext};
use crate::error::{BuildError, BuildResult};
use crate::lookup::{EntryTable, EntryTableSnapshot, HandlerTable};
use crate::reference::ReferenceParser;
use requisite_core::{Action, EntryHandle, FieldId, Requirement, ResolverConfig, Schema};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, debug_span};

// ============================================================================
// STATE
// ============================================================================

/// Lifecycle of a [`RequirementManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ManagerState {
    /// Accepting registrations.
    Registering,
    /// Requirements have been resolved. Terminal.
    Resolved,
}

/// An entry governed by the requirements declared on one or more fields.
#[derive(Debug, Clone)]
struct Governed {
    entry: EntryHandle,
    sources: Vec<FieldId>,
}

// ============================================================================
// INTROSPECTION
// ============================================================================

/// Serializable view of what has been registered so far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationSummary {
    pub state: ManagerState,
    /// Registered fields and their entry counts.
    pub entries: EntryTableSnapshot,
    /// Entries with at least one declared requirement.
    pub governed_entries: usize,
    /// Fields whose declarations govern at least one entry.
    pub source_fields: Vec<String>,
}

impl RegistrationSummary {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// What one build installed on one entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallRecord {
    /// Fields whose declarations were combined for this entry.
    pub sources: Vec<String>,
    pub enable: bool,
    pub display: bool,
}

/// Serializable outcome of a successful build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    /// Canonical keys of every requirement handler, sorted.
    pub handlers: Vec<String>,
    pub entries: EntryTableSnapshot,
    pub installs: Vec<InstallRecord>,
}

impl BuildReport {
    /// Number of setter calls made.
    pub fn installed(&self) -> usize {
        self.installs
            .iter()
            .map(|i| usize::from(i.enable) + usize::from(i.display))
            .sum()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

// ============================================================================
// MANAGER
// ============================================================================

/// Collects entries and resolves the requirements declared in a schema.
#[derive(Debug)]
pub struct RequirementManager<'s> {
    schema: &'s Schema,
    config: ResolverConfig,
    entries: EntryTable,
    governed: Vec<Governed>,
    index: HashMap<EntryHandle, usize>,
    state: ManagerState,
}

impl<'s> RequirementManager<'s> {
    pub fn new(schema: &'s Schema) -> Self {
        Self::with_config(schema, ResolverConfig::default())
    }

    pub fn with_config(schema: &'s Schema, config: ResolverConfig) -> Self {
        Self {
            schema,
            config,
            entries: EntryTable::new(),
            governed: Vec::new(),
            index: HashMap::new(),
            state: ManagerState::Registering,
        }
    }

    pub fn state(&self) -> ManagerState {
        self.state
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Read-only view of the registered entries.
    pub fn entries(&self) -> &EntryTable {
        &self.entries
    }

    /// Register the entries produced for `field`, replacing any earlier
    /// registration. Requirements declared on `field` will govern each of
    /// them.
    pub fn register(&mut self, field: FieldId, entries: Vec<EntryHandle>) -> BuildResult<()> {
        self.ensure_registering(field)?;
        self.release(field);
        self.declare(field, &entries);
        self.entries.register(field, Some(entries));
        Ok(())
    }

    /// Let the requirements declared on `parent` govern `entries` as well,
    /// without making them reachable through `parent`. Used for the entries
    /// an object field expands into.
    pub fn register_declared(&mut self, parent: FieldId, entries: &[EntryHandle]) -> BuildResult<()> {
        self.ensure_registering(parent)?;
        self.declare(parent, entries);
        Ok(())
    }

    /// Drop the registration of `field` and stop it governing its entries.
    pub fn deregister(&mut self, field: FieldId) -> BuildResult<()> {
        self.ensure_registering(field)?;
        self.release(field);
        self.entries.register(field, None);
        Ok(())
    }

    pub fn summary(&self) -> RegistrationSummary {
        let mut source_fields: Vec<String> = self
            .governed
            .iter()
            .flat_map(|g| g.sources.iter())
            .map(|f| self.schema.field_key(*f))
            .collect();
        source_fields.sort();
        source_fields.dedup();

        RegistrationSummary {
            state: self.state,
            entries: self.entries.snapshot(self.schema),
            governed_entries: self.governed.iter().filter(|g| !g.sources.is_empty()).count(),
            source_fields,
        }
    }

    /// Resolve every registered declaration and install the results.
    ///
    /// Nothing is installed unless every declaration resolves.
    pub fn build(&mut self) -> BuildResult<BuildReport> {
        let span = debug_span!("requirements.build", governed = self.governed.len());
        let _guard = span.enter();

        if self.state == ManagerState::Resolved {
            return Err(BuildError::AlreadyBuilt);
        }
        self.state = ManagerState::Resolved;

        let handlers = HandlerTable::build(self.schema, &self.entries, &self.config)?;
        let parser = ReferenceParser::with_config(self.schema, &self.config);
        let ctx = ResolveContext {
            schema: self.schema,
            entries: &self.entries,
            handlers: &handlers,
            config: &self.config,
        };

        let mut resolved: HashMap<FieldId, Vec<(Action, Requirement)>> = HashMap::new();
        let mut pending = Vec::with_capacity(self.governed.len());

        for governed in &self.governed {
            if governed.sources.is_empty() {
                continue;
            }
            let mut enable = Vec::new();
            let mut display = Vec::new();

            for &source in &governed.sources {
                if !resolved.contains_key(&source) {
                    let built = resolve_field(&parser, &ctx, source)?;
                    resolved.insert(source, built);
                }
                for (action, requirement) in resolved.get(&source).into_iter().flatten() {
                    match action {
                        Action::Enable => enable.push(requirement.clone()),
                        Action::Display => display.push(requirement.clone()),
                    }
                }
            }

            pending.push((governed, combine(enable), combine(display)));
        }

        let mut installs = Vec::with_capacity(pending.len());
        for (governed, enable, display) in pending {
            let record = InstallRecord {
                sources: governed
                    .sources
                    .iter()
                    .map(|f| self.schema.field_key(*f))
                    .collect(),
                enable: enable.is_some(),
                display: display.is_some(),
            };
            if enable.is_some() {
                governed.entry.install(Action::Enable, enable);
            }
            if display.is_some() {
                governed.entry.install(Action::Display, display);
            }
            debug!(
                sources = ?record.sources,
                enable = record.enable,
                display = record.display,
                "installed requirements"
            );
            installs.push(record);
        }

        let report = BuildReport {
            handlers: handlers.keys().map(str::to_string).collect(),
            entries: self.entries.snapshot(self.schema),
            installs,
        };
        debug!(
            handlers = report.handlers.len(),
            entries = report.installs.len(),
            installed = report.installed(),
            "requirements built"
        );
        Ok(report)
    }

    fn ensure_registering(&self, field: FieldId) -> BuildResult<()> {
        match self.state {
            ManagerState::Registering => Ok(()),
            ManagerState::Resolved => Err(BuildError::RegistrationClosed {
                field: self.schema.field_key(field),
            }),
        }
    }

    /// Stop `field` governing the entries currently registered for it.
    fn release(&mut self, field: FieldId) {
        for entry in self.entries.entries(field) {
            if let Some(&i) = self.index.get(entry) {
                self.governed[i].sources.retain(|f| *f != field);
            }
        }
    }

    fn declare(&mut self, field: FieldId, entries: &[EntryHandle]) {
        let declares = self
            .schema
            .field(field)
            .is_some_and(|f| !f.requirements.is_empty());
        if !declares {
            return;
        }

        for entry in entries {
            let i = match self.index.get(entry) {
                Some(&i) => i,
                None => {
                    self.governed.push(Governed {
                        entry: entry.clone(),
                        sources: Vec::new(),
                    });
                    self.index.insert(entry.clone(), self.governed.len() - 1);
                    self.governed.len() - 1
                }
            };
            let sources = &mut self.governed[i].sources;
            if !sources.contains(&field) {
                sources.push(field);
            }
        }
    }
}

fn resolve_field(
    parser: &ReferenceParser<'_>,
    ctx: &ResolveContext<'_>,
    field: FieldId,
) -> BuildResult<Vec<(Action, Requirement)>> {
    let Some(def) = ctx.schema.field(field) else {
        return Ok(Vec::new());
    };
    RequirementDefinition::parse_all(parser, def)?
        .iter()
        .map(|d| d.build(ctx).map(|r| (d.action, r)))
        .collect()
}

/// Conjoin every definition of one action.
fn combine(requirements: Vec<Requirement>) -> Option<Requirement> {
    if requirements.is_empty() {
        None
    } else {
        Some(Requirement::all(requirements))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use requisite_core::{DependencyDecl, RequirementDecl, SchemaBuilder, ValueType};
    use requisite_test_utils::assertions::*;
    use requisite_test_utils::MockEntry;
    use std::rc::Rc;

    struct Fixture {
        schema: Schema,
        toggle: FieldId,
        slider: FieldId,
        dependent: FieldId,
        plain: FieldId,
    }

    fn fixture() -> Fixture {
        let mut b = SchemaBuilder::new();
        let ty = b.add_root_type("demo", "Config").unwrap();
        let toggle = b.add_field(ty, "toggle", ValueType::Bool).unwrap();
        let slider = b.add_field(ty, "slider", ValueType::I32).unwrap();
        let dependent = b.add_field(ty, "dependent", ValueType::Bool).unwrap();
        b.require(dependent, RequirementDecl::enable_if("toggle")).unwrap();
        b.require(
            dependent,
            RequirementDecl::display_if(DependencyDecl::on("slider").when(">=10")),
        )
        .unwrap();
        let plain = b.add_field(ty, "plain", ValueType::Bool).unwrap();
        Fixture {
            schema: b.build(),
            toggle,
            slider,
            dependent,
            plain,
        }
    }

    struct Entries {
        toggle: Rc<MockEntry>,
        slider: Rc<MockEntry>,
        dependent: Rc<MockEntry>,
        plain: Rc<MockEntry>,
    }

    fn register_all(manager: &mut RequirementManager<'_>, fx: &Fixture) -> Entries {
        let e = Entries {
            toggle: MockEntry::boolean("toggle", false),
            slider: MockEntry::integer("slider", 0),
            dependent: MockEntry::boolean("dependent", false),
            plain: MockEntry::boolean("plain", false),
        };
        manager.register(fx.toggle, vec![e.toggle.handle()]).unwrap();
        manager.register(fx.slider, vec![e.slider.handle()]).unwrap();
        manager.register(fx.dependent, vec![e.dependent.handle()]).unwrap();
        manager.register(fx.plain, vec![e.plain.handle()]).unwrap();
        e
    }

    #[test]
    fn test_build_installs_both_actions() {
        let fx = fixture();
        let mut manager = RequirementManager::new(&fx.schema);
        let e = register_all(&mut manager, &fx);
        assert_enabled(&e.dependent, true);

        let report = manager.build().unwrap();
        assert_eq!(manager.state(), ManagerState::Resolved);
        assert_eq!(report.installed(), 2);
        assert_enabled(&e.dependent, false);
        assert_displayed(&e.dependent, false);

        e.toggle.set(true);
        e.slider.set(10);
        assert_enabled(&e.dependent, true);
        assert_displayed(&e.dependent, true);
    }

    #[test]
    fn test_entries_without_requirements_are_untouched() {
        let fx = fixture();
        let mut manager = RequirementManager::new(&fx.schema);
        let e = register_all(&mut manager, &fx);
        manager.build().unwrap();
        assert_unrestricted(&e.plain);
        assert_unrestricted(&e.toggle);
    }

    #[test]
    fn test_build_twice_fails() {
        let fx = fixture();
        let mut manager = RequirementManager::new(&fx.schema);
        register_all(&mut manager, &fx);
        manager.build().unwrap();
        assert_eq!(manager.build().unwrap_err(), BuildError::AlreadyBuilt);
    }

    #[test]
    fn test_register_after_build_fails() {
        let fx = fixture();
        let mut manager = RequirementManager::new(&fx.schema);
        register_all(&mut manager, &fx);
        manager.build().unwrap();
        let err = manager
            .register(fx.plain, vec![MockEntry::boolean("late", true).handle()])
            .unwrap_err();
        let msg = format!("{}", err);
        assert!(msg.contains("demo.Config#plain"));
        assert!(msg.contains("already been built"));
    }

    #[test]
    fn test_failed_build_installs_nothing() {
        let fx = fixture();
        let mut manager = RequirementManager::new(&fx.schema);
        let dependent = MockEntry::boolean("dependent", false);
        manager.register(fx.dependent, vec![dependent.handle()]).unwrap();
        manager
            .register(fx.toggle, vec![MockEntry::boolean("toggle", true).handle()])
            .unwrap();

        // slider was never registered
        let err = manager.build().unwrap_err();
        assert!(matches!(err, BuildError::DanglingReference { ref reference, .. } if reference == "slider"));
        assert_unrestricted(&dependent);
        assert_eq!(manager.state(), ManagerState::Resolved);
    }

    #[test]
    fn test_reregistration_replaces_entries() {
        let fx = fixture();
        let mut manager = RequirementManager::new(&fx.schema);
        let e = register_all(&mut manager, &fx);
        let replacement = MockEntry::boolean("toggle", true);
        manager.register(fx.toggle, vec![replacement.handle()]).unwrap();
        assert_eq!(manager.entries().entries(fx.toggle).len(), 1);

        manager.build().unwrap();
        e.slider.set(20);
        assert_enabled(&e.dependent, true);
        e.toggle.set(false);
        assert_enabled(&e.dependent, true);
        replacement.set(false);
        assert_enabled(&e.dependent, false);
    }

    #[test]
    fn test_reregistration_releases_replaced_entries() {
        let fx = fixture();
        let mut manager = RequirementManager::new(&fx.schema);
        let e = register_all(&mut manager, &fx);
        let rebuilt = MockEntry::boolean("dependent", false);
        manager.register(fx.dependent, vec![rebuilt.handle()]).unwrap();
        assert_eq!(manager.summary().governed_entries, 1);

        let report = manager.build().unwrap();
        assert_eq!(report.installs.len(), 1);
        assert_eq!(report.entries.fields["demo.Config#dependent"], 1);
        assert_unrestricted(&e.dependent);
        assert_enabled(&rebuilt, false);
        e.toggle.set(true);
        assert_enabled(&rebuilt, true);
    }

    #[test]
    fn test_deregister_stops_governing() {
        let fx = fixture();
        let mut manager = RequirementManager::new(&fx.schema);
        let e = register_all(&mut manager, &fx);
        manager.deregister(fx.dependent).unwrap();
        assert!(!manager.entries().contains(fx.dependent));
        manager.build().unwrap();
        assert_unrestricted(&e.dependent);
    }

    #[test]
    fn test_register_declared_accumulates_sources() {
        let fx = fixture();
        let mut manager = RequirementManager::new(&fx.schema);
        let e = register_all(&mut manager, &fx);
        let child = MockEntry::boolean("child", false);
        manager.register_declared(fx.dependent, &[child.handle()]).unwrap();
        manager.register_declared(fx.dependent, &[child.handle()]).unwrap();

        let summary = manager.summary();
        assert_eq!(summary.governed_entries, 2);
        assert_eq!(summary.source_fields, vec!["demo.Config#dependent".to_string()]);

        let report = manager.build().unwrap();
        assert_eq!(report.installs.len(), 2);
        assert_eq!(report.installs[1].sources.len(), 1);
        assert_enabled(&child, false);
        e.toggle.set(true);
        assert_enabled(&child, true);
    }

    #[test]
    fn test_report_serializes() {
        let fx = fixture();
        let mut manager = RequirementManager::new(&fx.schema);
        register_all(&mut manager, &fx);
        let summary = manager.summary().to_json().unwrap();
        assert!(summary.contains("\"registering\""));
        let report = manager.build().unwrap().to_json().unwrap();
        assert!(report.contains("demo.Config#dependent"));
        assert!(report.contains("\"enable\": true"));
    }
}
