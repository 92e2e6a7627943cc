//! Requirement definitions
//!
//! A [`RequirementDefinition`] is a field's declared requirement with every
//! reference parsed and every regex compiled. Building it against the
//! lookup tables yields the evaluable [`Requirement`].

use crate::condition::{compile_patterns, ConditionSet};
use crate::error::{BuildError, BuildResult};
use crate::lookup::{BoundEntry, EntryTable, HandlerTable, LookupError};
use crate::reference::{FieldRef, MethodRef, Reference, ReferenceError, ReferenceParser};
use regex::Regex;
use requisite_core::{
    Action, DependencyDecl, EntryHandle, EvalError, FieldDef, FieldId, Quantifier, Requirement,
    RequirementDecl, ResolverConfig, Schema,
};
use tracing::warn;

/// Read-only state a definition is resolved against.
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext<'a> {
    pub schema: &'a Schema,
    pub entries: &'a EntryTable,
    pub handlers: &'a HandlerTable,
    pub config: &'a ResolverConfig,
}

/// One parsed dependency clause.
#[derive(Debug, Clone)]
pub struct ClauseDefinition {
    pub targets: Vec<Reference>,
    pub conditions: Vec<String>,
    pub patterns: Vec<Regex>,
    pub arguments: Vec<FieldRef>,
    pub static_arguments: Vec<String>,
}

impl ClauseDefinition {
    fn has_conditions(&self) -> bool {
        !self.conditions.is_empty() || !self.patterns.is_empty()
    }

    fn has_arguments(&self) -> bool {
        !self.arguments.is_empty() || !self.static_arguments.is_empty()
    }
}

/// A parsed requirement declared on one field.
#[derive(Debug, Clone)]
pub struct RequirementDefinition {
    pub owner: FieldId,
    pub action: Action,
    pub quantifier: Quantifier,
    pub clauses: Vec<ClauseDefinition>,
}

impl RequirementDefinition {
    /// Parse every requirement declared on `field`.
    pub fn parse_all(parser: &ReferenceParser<'_>, field: &FieldDef) -> BuildResult<Vec<Self>> {
        field
            .requirements
            .iter()
            .map(|decl| Self::parse(parser, field, decl))
            .collect()
    }

    /// Parse `decl`, declared on `field`. References are relative to the
    /// field's declaring type.
    pub fn parse(parser: &ReferenceParser<'_>, field: &FieldDef, decl: &RequirementDecl) -> BuildResult<Self> {
        let owner = parser.schema().field_key(field.id);
        let clauses = decl
            .members
            .iter()
            .map(|member| parse_clause(parser, field, &owner, member))
            .collect::<BuildResult<Vec<_>>>()?;

        Ok(RequirementDefinition {
            owner: field.id,
            action: decl.action,
            quantifier: decl.quantifier,
            clauses,
        })
    }

    /// Resolve against the lookup tables.
    ///
    /// Targets within a clause combine with ANY; clauses combine with the
    /// definition's quantifier.
    pub fn build(&self, ctx: &ResolveContext<'_>) -> BuildResult<Requirement> {
        let owner = ctx.schema.field_key(self.owner);
        if self.clauses.is_empty() {
            return Err(BuildError::EmptyRequirement { owner });
        }

        let mut built = Vec::with_capacity(self.clauses.len());
        for clause in &self.clauses {
            if clause.targets.is_empty() {
                return Err(BuildError::EmptyRequirement { owner });
            }
            let targets = clause
                .targets
                .iter()
                .map(|target| build_target(ctx, &owner, clause, target))
                .collect::<BuildResult<Vec<_>>>()?;
            built.push(Requirement::any(targets));
        }

        Ok(Requirement::group(self.quantifier, built))
    }
}

fn parse_clause(
    parser: &ReferenceParser<'_>,
    field: &FieldDef,
    owner: &str,
    member: &DependencyDecl,
) -> BuildResult<ClauseDefinition> {
    let base = field.id.owner;
    let parse_error = |error: ReferenceError| {
        if error.is_unresolved() {
            BuildError::DanglingReference {
                owner: owner.to_string(),
                reference: error.reference,
            }
        } else {
            BuildError::Reference {
                owner: owner.to_string(),
                error,
            }
        }
    };

    let targets = member
        .targets
        .iter()
        .map(|text| parser.parse(base, text).map_err(parse_error))
        .collect::<BuildResult<Vec<_>>>()?;
    let arguments = member
        .arguments
        .iter()
        .map(|text| parser.parse_field(base, text).map_err(parse_error))
        .collect::<BuildResult<Vec<_>>>()?;
    let patterns = compile_patterns(&member.regex_conditions).map_err(|error| BuildError::Condition {
        owner: owner.to_string(),
        target: member.targets.join(", "),
        error,
    })?;

    Ok(ClauseDefinition {
        targets,
        conditions: member.conditions.clone(),
        patterns,
        arguments,
        static_arguments: member.static_arguments.clone(),
    })
}

fn build_target(
    ctx: &ResolveContext<'_>,
    owner: &str,
    clause: &ClauseDefinition,
    target: &Reference,
) -> BuildResult<Requirement> {
    match target {
        Reference::Method(method) => build_handler_target(ctx, owner, clause, method),
        Reference::Field(field) => build_field_target(ctx, owner, clause, field),
    }
}

fn build_handler_target(
    ctx: &ResolveContext<'_>,
    owner: &str,
    clause: &ClauseDefinition,
    method: &MethodRef,
) -> BuildResult<Requirement> {
    let handler = ctx
        .handlers
        .get(method.method)
        .ok_or_else(|| BuildError::DanglingReference {
            owner: owner.to_string(),
            reference: method.original.clone(),
        })?;

    if clause.has_conditions() {
        if ctx.config.strict_handler_conditions {
            return Err(BuildError::IgnoredConditions {
                owner: owner.to_string(),
                handler: handler.key().to_string(),
            });
        }
        warn!(
            owner = %owner,
            handler = %handler.key(),
            "conditions declared on a handler reference are ignored"
        );
    }

    let site = clause
        .arguments
        .iter()
        .map(|arg| lookup_entry(ctx.entries, owner, arg).map(|entry| BoundEntry::new(entry, arg.original.clone())))
        .collect::<BuildResult<Vec<_>>>()?;

    handler
        .bind(&site, &clause.static_arguments)
        .map_err(|error| BuildError::HandlerSite {
            owner: owner.to_string(),
            error,
        })
}

fn build_field_target(
    ctx: &ResolveContext<'_>,
    owner: &str,
    clause: &ClauseDefinition,
    field: &FieldRef,
) -> BuildResult<Requirement> {
    if clause.has_arguments() {
        warn!(
            owner = %owner,
            target = %field.original,
            "handler arguments declared on a field reference are ignored"
        );
    }

    let entry = lookup_entry(ctx.entries, owner, field)?;
    let conditions = ConditionSet::build(&entry.value_type(), &clause.conditions, clause.patterns.clone())
        .map_err(|error| BuildError::Condition {
            owner: owner.to_string(),
            target: field.original.clone(),
            error,
        })?;

    let weak = entry.downgrade();
    let label = field.original.clone();
    Ok(Requirement::from_fn(move || {
        let entry = weak.upgrade().ok_or_else(|| EvalError::EntryReleased {
            target: label.clone(),
        })?;
        conditions.matches(&label, &entry.value())
    }))
}

fn lookup_entry(entries: &EntryTable, owner: &str, field: &FieldRef) -> BuildResult<EntryHandle> {
    entries.entry(field).map_err(|error| match error {
        LookupError::Unregistered { reference } => BuildError::DanglingReference {
            owner: owner.to_string(),
            reference,
        },
        other => BuildError::Lookup {
            owner: owner.to_string(),
            error: other,
        },
    })
}
