//! Resolver configuration

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Options controlling how strictly declarations are resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Conditions declared on a handler reference fail the build instead of
    /// only logging a warning.
    pub strict_handler_conditions: bool,
    /// Handlers with a trailing variadic parameter are accepted.
    pub allow_variadic_handlers: bool,
    /// Surrounding whitespace in reference strings is ignored.
    pub trim_references: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            strict_handler_conditions: false,
            allow_variadic_handlers: true,
            trim_references: true,
        }
    }
}

impl ResolverConfig {
    /// Parse from a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        toml::from_str(source).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })
    }

    pub fn strict() -> Self {
        Self {
            strict_handler_conditions: true,
            allow_variadic_handlers: false,
            trim_references: false,
        }
    }
}
