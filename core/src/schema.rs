//! Declarative flag configuration.
//!
//! A [`Schema`] maps flag names to [`FlagConfig`]s. Schemas are built in code
//! with the builder methods or read from JSON/YAML documents shaped like:
//!
//! ```yaml
//! port:
//!   alias: p
//!   type: number
//!   required: true
//!   default: 8787
//! runtime:
//!   aliases: [rt, r]
//!   options: node, browser, deno
//! files:
//!   allowMultipleValues: true
//!   validate: "/\\.js$/i"
//! ```
//!
//! Document order is preserved so the parsed data lists flags the way the
//! schema declares them.

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::sync::Arc;

use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use serde::de::{Deserializer, MapAccess, Visitor};

use crate::error::{ConfigError, Result};
use crate::{FlagType, Value};

/// Custom acceptance check for a flag value.
#[derive(Clone)]
pub enum Validator {
    /// Accepts a value when the predicate returns `true`.
    Predicate(Arc<dyn Fn(&Value) -> bool + Send + Sync>),
    /// Accepts string values matching the pattern; other values fail.
    Pattern(Regex),
}

impl Validator {
    pub fn predicate(check: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        Self::Predicate(Arc::new(check))
    }

    /// Compiles a pattern. Both bare patterns (`^a.*c$`) and slash-delimited
    /// literals with trailing flags (`/^a.*c$/gi`) are accepted; `i`, `m`,
    /// `s` and `x` are honored and any other flag is ignored.
    ///
    /// # Examples
    ///
    /// ```
    /// use argflags_core::{Validator, Value};
    ///
    /// let validator = Validator::pattern("/^a.*c$/gi").unwrap();
    /// assert!(validator.check(&Value::from("ABBBBC")));
    /// assert!(!validator.check(&Value::Bool(true)));
    /// ```
    pub fn pattern(text: &str) -> std::result::Result<Self, regex::Error> {
        let (pattern, flags) = split_literal(text);
        let mut builder = RegexBuilder::new(pattern);
        for flag in flags.chars() {
            match flag {
                'i' => builder.case_insensitive(true),
                'm' => builder.multi_line(true),
                's' => builder.dot_matches_new_line(true),
                'x' => builder.ignore_whitespace(true),
                _ => &mut builder,
            };
        }
        builder.build().map(Self::Pattern)
    }

    pub fn check(&self, value: &Value) -> bool {
        match self {
            Self::Predicate(check) => check(value),
            Self::Pattern(re) => value.as_str().is_some_and(|text| re.is_match(text)),
        }
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Predicate(_) => f.write_str("Predicate(..)"),
            Self::Pattern(re) => f.debug_tuple("Pattern").field(&re.as_str()).finish(),
        }
    }
}

fn split_literal(text: &str) -> (&str, &str) {
    if let Some(body) = text.strip_prefix('/')
        && let Some(end) = body.rfind('/')
    {
        let flags = &body[end + 1..];
        if flags.chars().all(|c| c.is_ascii_alphabetic()) {
            return (&body[..end], flags);
        }
    }
    (text, "")
}

/// One or more alias names, possibly nested.
///
/// Lists and sets are flattened recursively when the alias is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AliasSpec {
    One(String),
    Many(Vec<AliasSpec>),
}

impl AliasSpec {
    /// All alias names, flattened, with leading dashes stripped and
    /// lowercased. Empty names are dropped.
    pub fn names(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect(&mut out);
        out
    }

    fn collect(&self, out: &mut Vec<String>) {
        match self {
            Self::One(name) => {
                let clean = crate::flag::clean_name(name);
                if !clean.is_empty() {
                    out.push(clean);
                }
            }
            Self::Many(specs) => specs.iter().for_each(|spec| spec.collect(out)),
        }
    }

    /// Reads an alias from untyped input. Only strings and (nested) arrays of
    /// strings are accepted.
    pub fn from_json(json: &serde_json::Value) -> Result<Self> {
        match json {
            serde_json::Value::String(name) => Ok(Self::One(name.clone())),
            serde_json::Value::Array(items) => items
                .iter()
                .map(Self::from_json)
                .collect::<Result<Vec<_>>>()
                .map(Self::Many),
            other => Err(ConfigError::InvalidAlias(json_type_name(other).to_string())),
        }
    }
}

impl From<&str> for AliasSpec {
    fn from(name: &str) -> Self {
        Self::One(name.to_string())
    }
}

impl From<String> for AliasSpec {
    fn from(name: String) -> Self {
        Self::One(name)
    }
}

impl<T: Into<AliasSpec>> From<Vec<T>> for AliasSpec {
    fn from(items: Vec<T>) -> Self {
        Self::Many(items.into_iter().map(Into::into).collect())
    }
}

impl<const N: usize> From<[&str; N]> for AliasSpec {
    fn from(items: [&str; N]) -> Self {
        Self::Many(items.into_iter().map(Self::from).collect())
    }
}

impl From<HashSet<String>> for AliasSpec {
    fn from(items: HashSet<String>) -> Self {
        // Sort so alias order does not depend on hashing.
        let sorted: BTreeSet<String> = items.into_iter().collect();
        Self::from(sorted)
    }
}

impl From<BTreeSet<String>> for AliasSpec {
    fn from(items: BTreeSet<String>) -> Self {
        Self::Many(items.into_iter().map(Self::One).collect())
    }
}

/// Configuration for a single flag.
///
/// # Examples
///
/// ```
/// use argflags_core::{FlagConfig, FlagType};
///
/// let port = FlagConfig::new()
///     .with_alias("p")
///     .with_type("integer")
///     .with_default(8787)
///     .required()
///     .with_description("Port");
///
/// assert_eq!(port.flag_type, Some(FlagType::Number));
/// assert!(port.required);
/// ```
#[derive(Debug, Clone, Default)]
pub struct FlagConfig {
    pub description: Option<String>,
    pub aliases: Vec<AliasSpec>,
    /// Explicit type; inferred from `default` when unset.
    pub flag_type: Option<FlagType>,
    pub default: Option<Value>,
    pub required: bool,
    pub allow_multiple_values: bool,
    /// Enumerated values the flag accepts; empty means unrestricted.
    pub options: Vec<Value>,
    pub validator: Option<Validator>,
    /// Overrides the registry's type enforcement for this flag.
    pub strict_types: Option<bool>,
}

impl FlagConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn with_alias(mut self, alias: impl Into<AliasSpec>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn with_type(mut self, flag_type: impl Into<FlagType>) -> Self {
        self.flag_type = Some(flag_type.into());
        self
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Marks the flag as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Collects every occurrence instead of keeping the last one.
    pub fn allow_multiple(mut self) -> Self {
        self.allow_multiple_values = true;
        self
    }

    pub fn with_options<V: Into<Value>>(mut self, options: impl IntoIterator<Item = V>) -> Self {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn strict_types(mut self, strict: bool) -> Self {
        self.strict_types = Some(strict);
        self
    }
}

/// Ordered mapping of flag names to their configuration.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    flags: Vec<(String, FlagConfig)>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a flag declaration (builder form of [`insert`](Self::insert)).
    pub fn flag(mut self, name: &str, config: FlagConfig) -> Self {
        self.insert(name, config);
        self
    }

    pub fn insert(&mut self, name: &str, config: FlagConfig) {
        self.flags.push((name.to_string(), config));
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FlagConfig)> {
        self.flags.iter().map(|(name, config)| (name.as_str(), config))
    }

    /// Reads a schema from a JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`Json`](ConfigError::Json) for malformed documents and the
    /// matching configuration error for invalid aliases or validators.
    ///
    /// # Examples
    ///
    /// ```
    /// use argflags_core::{FlagType, Schema};
    ///
    /// let schema = Schema::from_json(r#"{
    ///     "port": { "alias": "p", "default": 8787 },
    ///     "verbose": { "type": "boolean" }
    /// }"#).unwrap();
    ///
    /// let names: Vec<&str> = schema.iter().map(|(name, _)| name).collect();
    /// assert_eq!(names, vec!["port", "verbose"]);
    /// ```
    pub fn from_json(text: &str) -> Result<Self> {
        let raw: RawSchema = serde_json::from_str(text)?;
        raw.into_schema()
    }

    /// Reads a schema from a YAML mapping.
    ///
    /// # Errors
    ///
    /// Returns [`Yaml`](ConfigError::Yaml) for malformed documents and the
    /// matching configuration error for invalid aliases or validators.
    pub fn from_yaml(text: &str) -> Result<Self> {
        let raw: RawSchema = serde_yaml::from_str(text)?;
        raw.into_schema()
    }
}

impl IntoIterator for Schema {
    type Item = (String, FlagConfig);
    type IntoIter = std::vec::IntoIter<(String, FlagConfig)>;

    fn into_iter(self) -> Self::IntoIter {
        self.flags.into_iter()
    }
}

/// Document form of a schema: keys in document order, untyped attributes.
struct RawSchema(Vec<(String, RawFlagConfig)>);

impl RawSchema {
    fn into_schema(self) -> Result<Schema> {
        let mut schema = Schema::new();
        for (name, raw) in self.0 {
            let config = raw.into_config(&name)?;
            schema.insert(&name, config);
        }
        Ok(schema)
    }
}

impl<'de> Deserialize<'de> for RawSchema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct OrderedVisitor;

        impl<'de> Visitor<'de> for OrderedVisitor {
            type Value = RawSchema;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of flag names to flag configurations")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<RawSchema, A::Error> {
                let mut flags = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((name, config)) = map.next_entry::<String, Option<RawFlagConfig>>()? {
                    flags.push((name, config.unwrap_or_default()));
                }
                Ok(RawSchema(flags))
            }
        }

        deserializer.deserialize_map(OrderedVisitor)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFlagConfig {
    alias: Option<serde_json::Value>,
    aliases: Option<serde_json::Value>,
    #[serde(rename = "type")]
    flag_type: Option<String>,
    default: Option<serde_json::Value>,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    allow_multiple_values: bool,
    options: Option<serde_json::Value>,
    description: Option<String>,
    validate: Option<serde_json::Value>,
    strict_types: Option<bool>,
}

impl RawFlagConfig {
    fn into_config(self, name: &str) -> Result<FlagConfig> {
        let mut config = FlagConfig {
            description: self.description,
            flag_type: self.flag_type.map(FlagType::from),
            default: self.default.as_ref().and_then(Value::from_json),
            required: self.required,
            allow_multiple_values: self.allow_multiple_values,
            strict_types: self.strict_types,
            ..FlagConfig::default()
        };

        for alias in [self.alias, self.aliases].into_iter().flatten() {
            config.aliases.push(AliasSpec::from_json(&alias)?);
        }

        if let Some(options) = self.options {
            config.options = match options {
                serde_json::Value::String(list) => list
                    .split(',')
                    .map(|option| Value::from(option.trim()))
                    .collect(),
                serde_json::Value::Array(items) => {
                    items.iter().filter_map(Value::from_json).collect()
                }
                other => Value::from_json(&other).into_iter().collect(),
            };
        }

        if let Some(validate) = self.validate {
            let serde_json::Value::String(pattern) = &validate else {
                return Err(ConfigError::InvalidValidator {
                    flag: name.to_string(),
                    reason: format!(
                        "only patterns and predicates are supported (received {})",
                        json_type_name(&validate)
                    ),
                });
            };
            let validator = Validator::pattern(pattern).map_err(|err| {
                ConfigError::InvalidValidator {
                    flag: name.to_string(),
                    reason: err.to_string(),
                }
            })?;
            config.validator = Some(validator);
        }

        Ok(config)
    }
}

fn json_type_name(json: &serde_json::Value) -> &'static str {
    match json {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_spec_flattens_nested_lists() {
        let spec = AliasSpec::from(vec![
            AliasSpec::from("-P"),
            AliasSpec::from(vec!["--prt", "x"]),
        ]);
        assert_eq!(spec.names(), vec!["p", "prt", "x"]);

        let set: HashSet<String> = ["b".to_string(), "a".to_string()].into_iter().collect();
        assert_eq!(AliasSpec::from(set).names(), vec!["a", "b"]);
    }

    #[test]
    fn test_alias_from_json_rejects_numbers() {
        let err = AliasSpec::from_json(&serde_json::json!(["a", 5])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidAlias(kind) if kind == "number"));
    }

    #[test]
    fn test_pattern_literal_flags() {
        let validator = Validator::pattern("/^a.*c$/gi").unwrap();
        assert!(validator.check(&Value::from("abbbbc")));
        assert!(validator.check(&Value::from("Abc")));
        assert!(!validator.check(&Value::from("abd")));

        let plain = Validator::pattern("^x/y$").unwrap();
        assert!(plain.check(&Value::from("x/y")));
    }

    #[test]
    fn test_from_json_preserves_order_and_reads_attributes() {
        let schema = Schema::from_json(
            r#"{
                "zeta": { "type": "integer", "required": true },
                "alpha": { "aliases": ["a", ["al"]], "options": "x, y" },
                "files": { "allowMultipleValues": true, "default": ["a.js"] },
                "bare": null
            }"#,
        )
        .unwrap();

        let names: Vec<&str> = schema.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["zeta", "alpha", "files", "bare"]);

        let configs: Vec<&FlagConfig> = schema.iter().map(|(_, config)| config).collect();
        assert_eq!(configs[0].flag_type, Some(FlagType::Number));
        assert!(configs[0].required);
        assert_eq!(configs[1].options, vec![Value::from("x"), Value::from("y")]);
        assert_eq!(configs[1].aliases.len(), 1);
        assert!(configs[2].allow_multiple_values);
        assert_eq!(configs[2].default, Some(Value::from(vec!["a.js"])));
    }

    #[test]
    fn test_from_json_rejects_non_string_validator() {
        let err = Schema::from_json(r#"{ "pass": { "validate": 42 } }"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValidator { ref flag, .. } if flag == "pass"
        ));
    }

    #[test]
    fn test_from_json_rejects_bad_pattern() {
        let err = Schema::from_json(r#"{ "pass": { "validate": "(" } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValidator { .. }));
    }

    #[test]
    fn test_from_yaml() {
        let schema = Schema::from_yaml(
            "port:\n  alias: p\n  type: number\nverbose:\n  type: boolean\n  default: false\n",
        )
        .unwrap();

        assert_eq!(schema.len(), 2);
        let (name, config) = schema.iter().next().unwrap();
        assert_eq!(name, "port");
        assert_eq!(config.aliases, vec![AliasSpec::from("p")]);
    }
}
