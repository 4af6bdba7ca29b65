//! Error types for flag configuration and rule enforcement.
//!
//! Configuration errors reflect programming mistakes in a schema and are
//! raised immediately. Problems with user input are never errors; they are
//! collected as [`Violation`]s and only turn into [`InvalidFlags`] when the
//! caller asks for the rules to be enforced.

use std::fmt;

use thiserror::Error;

use crate::Violation;

/// Errors raised while declaring flags.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A flag was declared without a name.
    #[error("Flag name is required.")]
    MissingName,

    /// The canonical name is already taken by another flag.
    #[error("\"{0}\" flag already exists.")]
    DuplicateFlag(String),

    /// The alias belongs to a different flag.
    #[error("The \"{alias}\" alias is already associated to the \"{owner}\" flag.")]
    AliasConflict { alias: String, owner: String },

    /// An alias element was not a string (or a list/set of strings).
    #[error("Cannot create an alias for a {0} element. Please specify a string instead.")]
    InvalidAlias(String),

    /// The custom validator is neither a predicate nor a usable pattern.
    #[error("The \"validate\" configuration attribute for {flag} is invalid: {reason}")]
    InvalidValidator { flag: String, reason: String },

    /// `set_options` was called without any option.
    #[error("setting options for \"{0}\" requires at least one value")]
    EmptyOptions(String),

    /// JSON schema parsing failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML schema parsing failure.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Convenience alias for results with [`ConfigError`].
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Returned by [`FlagRegistry::enforce_rules`](crate::FlagRegistry::enforce_rules)
/// when the parsed input violates the configured rules.
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidFlags {
    pub violations: Vec<Violation>,
}

impl fmt::Display for InvalidFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("InvalidFlags: Process exited with error.")?;
        for violation in &self.violations {
            write!(f, "\n * {violation}")?;
        }
        Ok(())
    }
}

impl std::error::Error for InvalidFlags {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_flags_lists_each_violation() {
        let failure = InvalidFlags {
            violations: vec![
                Violation::Required {
                    flag: "port".into(),
                },
                Violation::Unrecognized {
                    flag: "x".into(),
                },
            ],
        };

        assert_eq!(
            failure.to_string(),
            "InvalidFlags: Process exited with error.\n * \"port\" is required.\n * \"x\" is unrecognized."
        );
    }

    #[test]
    fn test_alias_conflict_message_names_owner() {
        let err = ConfigError::AliasConflict {
            alias: "p".into(),
            owner: "port".into(),
        };
        assert_eq!(
            err.to_string(),
            "The \"p\" alias is already associated to the \"port\" flag."
        );
    }
}
