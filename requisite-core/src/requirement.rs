//! Resolved requirements: a tagged predicate tree
//!
//! A [`Requirement`] is a zero-argument boolean function over live entry
//! values. Leaves wrap a closure; groups combine children under a
//! [`Quantifier`]. Nothing is cached: every [`Requirement::check`] re-reads
//! the current values.

use crate::enums::Quantifier;
use crate::error::EvalResult;
use std::fmt;
use std::rc::Rc;

type LeafFn = Rc<dyn Fn() -> EvalResult<bool>>;

/// A resolved, evaluable requirement.
#[derive(Clone)]
pub enum Requirement {
    Leaf(LeafFn),
    Group {
        quantifier: Quantifier,
        children: Rc<[Requirement]>,
    },
}

impl Requirement {
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn() -> EvalResult<bool> + 'static,
    {
        Requirement::Leaf(Rc::new(f))
    }

    /// A requirement that always evaluates to `value`.
    pub fn constant(value: bool) -> Self {
        Requirement::from_fn(move || Ok(value))
    }

    /// Combine `children` under `quantifier`.
    ///
    /// A single child is returned as-is unless the quantifier changes its
    /// meaning ([`Quantifier::None`]).
    pub fn group(quantifier: Quantifier, mut children: Vec<Requirement>) -> Self {
        if children.len() == 1 && quantifier.is_identity_for_single() {
            if let Some(only) = children.pop() {
                return only;
            }
        }
        Requirement::Group {
            quantifier,
            children: Rc::from(children),
        }
    }

    pub fn all(children: Vec<Requirement>) -> Self {
        Self::group(Quantifier::All, children)
    }

    pub fn any(children: Vec<Requirement>) -> Self {
        Self::group(Quantifier::Any, children)
    }

    pub fn none(children: Vec<Requirement>) -> Self {
        Self::group(Quantifier::None, children)
    }

    pub fn one(children: Vec<Requirement>) -> Self {
        Self::group(Quantifier::One, children)
    }

    pub fn not(requirement: Requirement) -> Self {
        Requirement::Group {
            quantifier: Quantifier::None,
            children: Rc::from(vec![requirement]),
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Requirement::Leaf(_))
    }

    /// Quantifier of a group node, `None` for a leaf.
    pub fn quantifier(&self) -> Option<Quantifier> {
        match self {
            Requirement::Leaf(_) => None,
            Requirement::Group { quantifier, .. } => Some(*quantifier),
        }
    }

    pub fn children(&self) -> &[Requirement] {
        match self {
            Requirement::Leaf(_) => &[],
            Requirement::Group { children, .. } => children,
        }
    }

    /// Evaluate against the current live values.
    ///
    /// `All`, `Any` and `None` stop at the first deciding child. `One` stops
    /// at the second satisfied child. An empty `All` or `None` holds; an
    /// empty `Any` or `One` does not.
    pub fn check(&self) -> EvalResult<bool> {
        match self {
            Requirement::Leaf(f) => f(),
            Requirement::Group {
                quantifier,
                children,
            } => match quantifier {
                Quantifier::All => {
                    for child in children.iter() {
                        if !child.check()? {
                            return Ok(false);
                        }
                    }
                    Ok(true)
                }
                Quantifier::Any => {
                    for child in children.iter() {
                        if child.check()? {
                            return Ok(true);
                        }
                    }
                    Ok(false)
                }
                Quantifier::None => {
                    for child in children.iter() {
                        if child.check()? {
                            return Ok(false);
                        }
                    }
                    Ok(true)
                }
                Quantifier::One => {
                    let mut found = false;
                    for child in children.iter() {
                        if child.check()? {
                            if found {
                                return Ok(false);
                            }
                            found = true;
                        }
                    }
                    Ok(found)
                }
            },
        }
    }
}

impl fmt::Debug for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Requirement::Leaf(_) => write!(f, "Leaf"),
            Requirement::Group {
                quantifier,
                children,
            } => f
                .debug_struct("Group")
                .field("quantifier", quantifier)
                .field("children", &children.as_ref())
                .finish(),
        }
    }
}
