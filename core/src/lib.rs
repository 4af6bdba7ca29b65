//! Command-line flag parsing and validation.
//!
//! This crate turns raw command-line input into typed, validated flag data:
//!
//! - [`Tokenizer`] splits a command-line string or an argument vector into
//!   flag/value pairs and bare arguments.
//! - [`Flag`] holds one flag's declaration (type, default, aliases, options,
//!   validator) and its current value.
//! - [`Schema`] and [`FlagConfig`] declare flags up front, in code or from a
//!   JSON/YAML document.
//! - [`FlagRegistry`] owns the flags, resolves aliases, binds parsed tokens
//!   and reports [`Violation`]s.
//! - [`Environment`] abstracts the process arguments and what happens when a
//!   registry's rules are enforced and fail.
//!
//! Parsing never fails on user input; problems surface through
//! [`FlagRegistry::validate`] or [`FlagRegistry::enforce_rules`].
//! Configuration mistakes (duplicate names, alias conflicts) are reported
//! as [`ConfigError`]s when the flag is declared.
//!
//! # Example
//!
//! ```
//! use argflags_core::*;
//!
//! let schema = Schema::new()
//!     .flag("port", FlagConfig::new().with_alias("p").with_default(8787).required())
//!     .flag("cache", FlagConfig::new().with_type("boolean").with_default(true))
//!     .flag("file", FlagConfig::new().with_alias("f").allow_multiple());
//!
//! let registry = registry(schema, "serve -p 3000 -f a.js -f b.js").unwrap();
//! let data = registry.data();
//!
//! assert_eq!(data.get("port"), Some(&Value::Number(3000.0)));
//! assert_eq!(data.get("cache"), Some(&Value::Bool(true)));
//! assert_eq!(data.get("file"), Some(&Value::from(vec!["a.js", "b.js"])));
//! assert_eq!(data.get("serve"), Some(&Value::Bool(true)));
//! assert!(registry.validate().is_valid());
//! ```

mod data;
mod env;
mod error;
mod flag;
mod registry;
mod schema;
mod tokenizer;
mod types;
mod validate;

pub use data::{Data, DataEntry};
pub use env::{Environment, FixedEnvironment};
pub use error::{ConfigError, InvalidFlags, Result};
pub use flag::{Flag, FlagSummary};
pub use registry::{FlagRegistry, from_environment, registry};
pub use schema::{AliasSpec, FlagConfig, Schema, Validator};
pub use tokenizer::{Input, Pair, Tokenizer, Tokens, tokenize};
pub use types::{FlagType, Origin, Value};
pub use validate::{Validation, Violation};
