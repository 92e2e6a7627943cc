//! Enum types shared by declarations and resolved requirements

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// ACTION
// ============================================================================

/// What a satisfied requirement controls on its entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// The entry is editable only while the requirement holds.
    Enable,
    /// The entry is shown only while the requirement holds.
    Display,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Enable => "enable",
            Action::Display => "display",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Action {
    type Err = EnumParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "enable" | "enableif" => Ok(Action::Enable),
            "display" | "displayif" => Ok(Action::Display),
            _ => Err(EnumParseError {
                kind: "action",
                value: s.to_string(),
            }),
        }
    }
}

// ============================================================================
// QUANTIFIER
// ============================================================================

/// Combination rule applied to a group of requirement children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Quantifier {
    /// Every child holds.
    #[default]
    All,
    /// At least one child holds.
    Any,
    /// No child holds.
    None,
    /// Exactly one child holds.
    One,
}

impl Quantifier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Quantifier::All => "all",
            Quantifier::Any => "any",
            Quantifier::None => "none",
            Quantifier::One => "one",
        }
    }

    /// Whether a group holding a single child behaves exactly like that child.
    pub fn is_identity_for_single(&self) -> bool {
        !matches!(self, Quantifier::None)
    }
}

impl fmt::Display for Quantifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Quantifier {
    type Err = EnumParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "all" => Ok(Quantifier::All),
            "any" => Ok(Quantifier::Any),
            "none" => Ok(Quantifier::None),
            "one" => Ok(Quantifier::One),
            _ => Err(EnumParseError {
                kind: "quantifier",
                value: s.to_string(),
            }),
        }
    }
}

// ============================================================================
// PARSE ERROR
// ============================================================================

/// Error when parsing an invalid enum token.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid {kind}: {value}")]
pub struct EnumParseError {
    pub kind: &'static str,
    pub value: String,
}

fn normalize_token(s: &str) -> String {
    s.trim()
        .chars()
        .filter(|c| *c != '_' && *c != '-')
        .collect::<String>()
        .to_ascii_lowercase()
}
