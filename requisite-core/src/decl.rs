//! Declarative requirement metadata, as attached to schema fields

use crate::enums::{Action, Quantifier};
use serde::{Deserialize, Serialize};

/// One dependency clause: satisfied when any of its targets is satisfied.
///
/// For field targets, `conditions` and `regex_conditions` hold the raw
/// literals the target's live value is compared against. For handler
/// targets, `arguments` are field references and `static_arguments` are
/// literals appended after them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DependencyDecl {
    pub targets: Vec<String>,
    pub conditions: Vec<String>,
    pub regex_conditions: Vec<String>,
    pub arguments: Vec<String>,
    pub static_arguments: Vec<String>,
}

impl DependencyDecl {
    pub fn on(target: impl Into<String>) -> Self {
        Self {
            targets: vec![target.into()],
            ..Self::default()
        }
    }

    pub fn on_any<I, S>(targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            targets: targets.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn when(mut self, condition: impl Into<String>) -> Self {
        self.conditions.push(condition.into());
        self
    }

    pub fn matching(mut self, regex: impl Into<String>) -> Self {
        self.regex_conditions.push(regex.into());
        self
    }

    pub fn with_arg(mut self, reference: impl Into<String>) -> Self {
        self.arguments.push(reference.into());
        self
    }

    pub fn with_static_arg(mut self, literal: impl Into<String>) -> Self {
        self.static_arguments.push(literal.into());
        self
    }

    /// Whether any literal or regex condition was declared.
    pub fn has_conditions(&self) -> bool {
        !self.conditions.is_empty() || !self.regex_conditions.is_empty()
    }

    /// Whether any handler argument was declared.
    pub fn has_arguments(&self) -> bool {
        !self.arguments.is_empty() || !self.static_arguments.is_empty()
    }
}

impl From<&str> for DependencyDecl {
    fn from(target: &str) -> Self {
        DependencyDecl::on(target)
    }
}

impl From<String> for DependencyDecl {
    fn from(target: String) -> Self {
        DependencyDecl::on(target)
    }
}

/// A declared requirement: one clause, or a quantified group of clauses.
///
/// A single clause is a group of one under [`Quantifier::All`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementDecl {
    pub action: Action,
    #[serde(default)]
    pub quantifier: Quantifier,
    pub members: Vec<DependencyDecl>,
}

impl RequirementDecl {
    pub fn single(action: Action, dependency: impl Into<DependencyDecl>) -> Self {
        Self {
            action,
            quantifier: Quantifier::All,
            members: vec![dependency.into()],
        }
    }

    pub fn group<I, D>(action: Action, quantifier: Quantifier, members: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: Into<DependencyDecl>,
    {
        Self {
            action,
            quantifier,
            members: members.into_iter().map(Into::into).collect(),
        }
    }

    pub fn enable_if(dependency: impl Into<DependencyDecl>) -> Self {
        Self::single(Action::Enable, dependency)
    }

    pub fn display_if(dependency: impl Into<DependencyDecl>) -> Self {
        Self::single(Action::Display, dependency)
    }

    pub fn enable_if_group<I, D>(quantifier: Quantifier, members: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: Into<DependencyDecl>,
    {
        Self::group(Action::Enable, quantifier, members)
    }

    pub fn display_if_group<I, D>(quantifier: Quantifier, members: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: Into<DependencyDecl>,
    {
        Self::group(Action::Display, quantifier, members)
    }
}
