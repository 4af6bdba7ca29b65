//! Validation outcomes for flags and registries.
//!
//! Validation never fails: it returns the full list of [`Violation`]s found
//! in the current state, and the state is valid exactly when that list is
//! empty.
//!
//! # Examples
//!
//! ```
//! use argflags_core::*;
//!
//! let mut registry = FlagRegistry::new();
//! registry.require(["port"]).unwrap();
//! registry.parse("--host example.org");
//!
//! let validation = registry.validate();
//! assert!(!validation.is_valid());
//! assert_eq!(validation.messages(), vec!["\"port\" is required.".to_string()]);
//! ```

use serde::Serialize;
use thiserror::Error;

use crate::FlagType;

/// One human-readable validation failure.
///
/// Each variant describes a specific problem with the parsed input. The
/// `Display` impl provides the message reported to users.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    /// A required flag has no value (and no default).
    #[error("\"{flag}\" is required.")]
    Required { flag: String },
    /// A value is outside the flag's enumerated options.
    #[error("\"{value}\" is invalid. Expected one of: {}", .options.join(", "))]
    NotAnOption { value: String, options: Vec<String> },
    /// A single value has the wrong type under strict type checking.
    #[error("\"{flag}\" should be a {expected}, not {found}.")]
    TypeMismatch {
        flag: String,
        expected: FlagType,
        found: String,
    },
    /// One item of a multi-value flag has the wrong type.
    #[error("\"{flag}\" ({item}) should be a {expected}, not {found}.")]
    ItemTypeMismatch {
        flag: String,
        item: String,
        expected: FlagType,
        found: String,
    },
    /// The custom validator rejected the value.
    #[error("\"{value}\" is invalid (failed custom validation).")]
    FailedValidation { value: String },
    /// The flag was not declared while unrecognized flags are disallowed.
    #[error("\"{flag}\" is unrecognized.")]
    Unrecognized { flag: String },
}

/// Result of validating a flag or a whole registry.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Validation {
    pub violations: Vec<Violation>,
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Flattens the violations into their display messages.
    pub fn messages(&self) -> Vec<String> {
        self.violations.iter().map(ToString::to_string).collect()
    }

    /// Records a violation unless an identical one is already present.
    pub(crate) fn push(&mut self, violation: Violation) {
        if !self.violations.contains(&violation) {
            self.violations.push(violation);
        }
    }

    pub(crate) fn extend(&mut self, violations: impl IntoIterator<Item = Violation>) {
        for violation in violations {
            self.push(violation);
        }
    }
}

impl IntoIterator for Validation {
    type Item = Violation;
    type IntoIter = std::vec::IntoIter<Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.violations.into_iter()
    }
}
