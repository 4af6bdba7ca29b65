//! A single flag: its declaration, current value and validity check.

use serde::Serialize;

use crate::error::{ConfigError, Result};
use crate::schema::{AliasSpec, FlagConfig, Validator};
use crate::validate::{Validation, Violation};
use crate::{FlagType, Origin, Value};

/// Canonical form of a flag or alias name: leading dashes removed, trimmed
/// and lowercased.
pub(crate) fn clean_name(name: &str) -> String {
    name.trim().trim_start_matches('-').trim().to_lowercase()
}

/// A declared or discovered command-line flag.
///
/// # Examples
///
/// ```
/// use argflags_core::{Flag, Value};
///
/// let mut flag = Flag::new("--File").unwrap();
/// assert_eq!(flag.name(), "file");
/// assert_eq!(flag.input_name(), "--File");
///
/// flag.allow_multiple_values();
/// assert_eq!(flag.value(), Some(Value::List(vec![])));
///
/// flag.set_value("a.js");
/// flag.set_value("b.js");
/// assert_eq!(flag.value(), Some(Value::from(vec!["a.js", "b.js"])));
/// ```
#[derive(Debug, Clone)]
pub struct Flag {
    name: String,
    input_name: String,
    description: Option<String>,
    flag_type: FlagType,
    default: Option<Value>,
    value: Option<Value>,
    required: bool,
    aliases: Vec<String>,
    allow_multiple: bool,
    options: Vec<Value>,
    validator: Option<Validator>,
    strict_types: bool,
    origin: Origin,
}

impl Flag {
    /// Creates a discovered flag with no metadata.
    ///
    /// # Errors
    ///
    /// Returns [`MissingName`](ConfigError::MissingName) when the name is
    /// empty once dashes and whitespace are removed.
    pub fn new(name: &str) -> Result<Self> {
        let clean = clean_name(name);
        if clean.is_empty() {
            return Err(ConfigError::MissingName);
        }

        Ok(Self {
            name: clean,
            input_name: name.to_string(),
            description: None,
            flag_type: FlagType::default(),
            default: None,
            value: None,
            required: false,
            aliases: Vec::new(),
            allow_multiple: false,
            options: Vec::new(),
            validator: None,
            strict_types: true,
            origin: Origin::Discovered,
        })
    }

    /// Creates a declared flag from its configuration.
    pub fn from_config(name: &str, config: FlagConfig) -> Result<Self> {
        let mut flag = Self::new(name)?;
        flag.origin = Origin::Declared;

        let FlagConfig {
            description,
            aliases,
            flag_type,
            default,
            required,
            allow_multiple_values,
            options,
            validator,
            strict_types,
        } = config;

        flag.description = description;
        flag.flag_type = flag_type
            .or_else(|| default.as_ref().and_then(Value::inferred_type))
            .unwrap_or_default();
        flag.default = default.map(|value| value.coerce(flag.flag_type));
        flag.required = required;
        flag.allow_multiple = allow_multiple_values;
        flag.validator = validator;
        if let Some(strict) = strict_types {
            flag.strict_types = strict;
        }
        flag.set_options(options);
        for alias in aliases {
            flag.create_alias(alias);
        }

        Ok(flag)
    }

    /// Canonical (lowercase, dash-stripped) name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name exactly as it was supplied.
    pub fn input_name(&self) -> &str {
        &self.input_name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_description(&mut self, description: &str) {
        self.description = Some(description.trim().to_string());
    }

    pub fn flag_type(&self) -> FlagType {
        self.flag_type
    }

    /// Changes the type, converting the default and options to it.
    pub fn set_type(&mut self, flag_type: impl Into<FlagType>) {
        let flag_type = flag_type.into();
        self.flag_type = flag_type;
        self.default = self.default.take().map(|value| value.coerce(flag_type));
        let options = std::mem::take(&mut self.options);
        self.set_options(options);
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Replaces the default, wrapping scalars in a list for multi-value flags.
    ///
    /// A declared flag converts the default to its type; a discovered flag
    /// takes its type from the default instead.
    pub fn set_default(&mut self, default: impl Into<Value>) {
        let default = default.into();
        let default = if self.is_recognized() {
            default.coerce(self.flag_type)
        } else {
            if let Some(inferred) = default.inferred_type() {
                self.flag_type = inferred;
            }
            default
        };
        self.default = Some(if self.allow_multiple {
            into_list(default)
        } else {
            default
        });
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn set_required(&mut self, required: bool) {
        self.required = required;
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn is_recognized(&self) -> bool {
        self.origin == Origin::Declared
    }

    /// Marks the flag as declared.
    pub fn recognize(&mut self) {
        self.origin = Origin::Declared;
    }

    pub fn strict_types(&self) -> bool {
        self.strict_types
    }

    pub fn set_strict_types(&mut self, strict: bool) {
        self.strict_types = strict;
    }

    pub fn set_validator(&mut self, validator: Validator) {
        self.validator = Some(validator);
    }

    pub fn multiple_values_allowed(&self) -> bool {
        self.allow_multiple
    }

    /// Whether the flag has received a value from input.
    pub fn is_bound(&self) -> bool {
        self.value.is_some()
    }

    /// Current value, falling back to the default.
    ///
    /// Multi-value flags always yield `Some(Value::List(..))`, empty when
    /// nothing has been set.
    pub fn value(&self) -> Option<Value> {
        let current = self.value.as_ref().or(self.default.as_ref()).cloned();
        if self.allow_multiple {
            return Some(current.map(into_list).unwrap_or(Value::List(Vec::new())));
        }
        current
    }

    /// Assigns a value. Multi-value flags append scalars and replace their
    /// contents when given a list; single-value flags always replace.
    pub fn set_value(&mut self, value: impl Into<Value>) {
        let value = value.into();
        if !self.allow_multiple {
            self.value = Some(value);
            return;
        }

        match (value, self.value.take()) {
            (Value::List(items), _) => self.value = Some(Value::List(items)),
            (item, current) => {
                let mut items = match current.map(into_list) {
                    Some(Value::List(items)) => items,
                    _ => Vec::new(),
                };
                items.push(item);
                self.value = Some(Value::List(items));
            }
        }
    }

    pub fn options(&self) -> &[Value] {
        &self.options
    }

    /// Replaces the enumerated options, converted to the flag's type and
    /// without duplicates.
    pub fn set_options<V: Into<Value>>(&mut self, options: impl IntoIterator<Item = V>) {
        self.options.clear();
        for option in options {
            let option = option.into().coerce(self.flag_type);
            if !self.options.contains(&option) {
                self.options.push(option);
            }
        }
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn has_alias(&self, alias: &str) -> bool {
        let clean = clean_name(alias);
        self.aliases.iter().any(|existing| *existing == clean)
    }

    /// Attaches one or more aliases. Nested lists and sets are flattened and
    /// leading dashes are removed.
    pub fn create_alias(&mut self, alias: impl Into<AliasSpec>) {
        for name in alias.into().names() {
            if name != self.name && !self.aliases.contains(&name) {
                self.aliases.push(name);
            }
        }
    }

    /// Switches to multi-value mode, wrapping the current value and default
    /// in one-element lists.
    pub fn allow_multiple_values(&mut self) {
        if self.allow_multiple {
            return;
        }
        self.value = self.value.take().map(into_list);
        self.default = self.default.take().map(into_list);
        self.allow_multiple = true;
    }

    /// Switches to single-value mode, keeping the last element of the current
    /// value and default.
    pub fn prevent_multiple_values(&mut self) {
        if !self.allow_multiple {
            return;
        }
        self.value = self.value.take().and_then(last_item);
        self.default = self.default.take().and_then(last_item);
        self.allow_multiple = false;
    }

    /// Checks the current state, stopping at the first failing rule:
    /// required, options, strict type, then the custom validator.
    pub fn validate(&self) -> Validation {
        let mut validation = Validation::default();
        let value = self.value();
        let items: Vec<&Value> = match &value {
            Some(Value::List(items)) if self.allow_multiple => items.iter().collect(),
            other => other.iter().collect(),
        };

        if self.required && items.is_empty() {
            validation.push(Violation::Required {
                flag: self.name.clone(),
            });
            return validation;
        }

        if !self.options.is_empty() {
            let options: Vec<String> = self.options.iter().map(ToString::to_string).collect();
            validation.extend(
                items
                    .iter()
                    .filter(|item| !self.options.contains(item))
                    .map(|item| Violation::NotAnOption {
                        value: item.to_string(),
                        options: options.clone(),
                    }),
            );
            if !validation.is_valid() {
                return validation;
            }
        }

        if self.strict_types && self.flag_type != FlagType::Any && self.is_recognized() {
            let mismatched = items.iter().filter(|item| !self.flag_type.accepts(item));
            if self.allow_multiple {
                validation.extend(mismatched.map(|item| Violation::ItemTypeMismatch {
                    flag: self.name.clone(),
                    item: item.to_string(),
                    expected: self.flag_type,
                    found: item.type_name().to_string(),
                }));
            } else {
                validation.extend(mismatched.map(|item| Violation::TypeMismatch {
                    flag: self.name.clone(),
                    expected: self.flag_type,
                    found: item.type_name().to_string(),
                }));
            }
            if !validation.is_valid() {
                return validation;
            }
        }

        if let Some(validator) = &self.validator {
            validation.extend(
                items
                    .iter()
                    .filter(|item| !validator.check(item))
                    .map(|item| Violation::FailedValidation {
                        value: item.to_string(),
                    }),
            );
        }

        validation
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_valid()
    }

    pub fn violations(&self) -> Vec<Violation> {
        self.validate().violations
    }

    /// Introspection snapshot used for reporting.
    pub fn summary(&self) -> FlagSummary {
        FlagSummary {
            name: self.name.clone(),
            flag_type: self.flag_type,
            aliases: self.aliases.clone(),
            description: self.description.clone(),
            default: self.default.clone(),
            required: self.required,
            multiple: self.allow_multiple,
            options: self.options.clone(),
            origin: self.origin,
        }
    }
}

/// Serializable view of a flag's declaration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlagSummary {
    pub name: String,
    #[serde(rename = "type")]
    pub flag_type: FlagType,
    pub aliases: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    pub required: bool,
    pub multiple: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<Value>,
    pub origin: Origin,
}

fn into_list(value: Value) -> Value {
    match value {
        Value::List(items) => Value::List(items),
        other => Value::List(vec![other]),
    }
}

fn last_item(value: Value) -> Option<Value> {
    match value {
        Value::List(mut items) => items.pop(),
        other => Some(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn declared(name: &str, config: FlagConfig) -> Flag {
        Flag::from_config(name, config).unwrap()
    }

    #[test]
    fn test_new_requires_name() {
        assert!(matches!(Flag::new(""), Err(ConfigError::MissingName)));
        assert!(matches!(Flag::new("--"), Err(ConfigError::MissingName)));
    }

    #[test]
    fn test_type_inferred_from_default() {
        let flag = declared("port", FlagConfig::new().with_default(8787));
        assert_eq!(flag.flag_type(), FlagType::Number);

        let flag = declared("cache", FlagConfig::new().with_default(false));
        assert_eq!(flag.flag_type(), FlagType::Boolean);

        let flag = declared("name", FlagConfig::new());
        assert_eq!(flag.flag_type(), FlagType::String);
    }

    #[test]
    fn test_multi_value_is_always_a_list() {
        let mut flag = declared("file", FlagConfig::new().allow_multiple());
        assert_eq!(flag.value(), Some(Value::List(vec![])));

        flag.set_value("a.js");
        assert_eq!(flag.value(), Some(Value::from(vec!["a.js"])));

        flag.set_value("b.js");
        flag.set_value("c.js");
        assert_eq!(flag.value(), Some(Value::from(vec!["a.js", "b.js", "c.js"])));

        flag.set_value(vec!["z.js"]);
        assert_eq!(flag.value(), Some(Value::from(vec!["z.js"])));
    }

    #[test]
    fn test_multi_value_wraps_scalar_default() {
        let flag = declared(
            "file",
            FlagConfig::new().with_default("index.js").allow_multiple(),
        );
        assert_eq!(flag.value(), Some(Value::from(vec!["index.js"])));
    }

    #[test]
    fn test_single_value_replaces_and_falls_back_to_default() {
        let mut flag = declared("env", FlagConfig::new().with_default("dev"));
        assert_eq!(flag.value(), Some(Value::from("dev")));
        flag.set_value("prod");
        flag.set_value("stage");
        assert_eq!(flag.value(), Some(Value::from("stage")));
    }

    #[test]
    fn test_toggle_multiplicity_is_lossless() {
        let mut flag = declared("env", FlagConfig::new().with_default("dev"));
        flag.set_value("prod");

        flag.allow_multiple_values();
        assert_eq!(flag.value(), Some(Value::from(vec!["prod"])));
        assert_eq!(flag.default_value(), Some(&Value::from(vec!["dev"])));

        flag.set_value("stage");
        flag.prevent_multiple_values();
        assert_eq!(flag.value(), Some(Value::from("stage")));
        assert_eq!(flag.default_value(), Some(&Value::from("dev")));
    }

    #[test]
    fn test_required_without_value() {
        let flag = declared("port", FlagConfig::new().required());
        assert_eq!(
            flag.violations(),
            vec![Violation::Required {
                flag: "port".into()
            }]
        );

        let flag = declared("files", FlagConfig::new().required().allow_multiple());
        assert!(!flag.is_valid());
    }

    #[test]
    fn test_options_membership() {
        let mut flag = declared(
            "runtime",
            FlagConfig::new().with_options(["node", "browser", "deno"]),
        );
        assert!(flag.is_valid(), "unset optional flag is not checked");

        flag.set_value("go");
        assert_eq!(
            flag.violations(),
            vec![Violation::NotAnOption {
                value: "go".into(),
                options: vec!["node".into(), "browser".into(), "deno".into()],
            }]
        );

        flag.set_value("deno");
        assert!(flag.is_valid());
    }

    #[test]
    fn test_options_checked_per_item() {
        let mut flag = declared(
            "target",
            FlagConfig::new().with_options(["a", "b"]).allow_multiple(),
        );
        flag.set_value("a");
        flag.set_value("x");
        flag.set_value("y");
        assert_eq!(flag.violations().len(), 2);
    }

    #[test]
    fn test_strict_types_only_for_declared_flags() {
        let mut flag = declared("port", FlagConfig::new().with_type("number"));
        flag.set_value("abc");
        assert_eq!(
            flag.violations(),
            vec![Violation::TypeMismatch {
                flag: "port".into(),
                expected: FlagType::Number,
                found: "string".into(),
            }]
        );

        flag.set_strict_types(false);
        assert!(flag.is_valid());

        let mut discovered = Flag::new("port").unwrap();
        discovered.set_type("number");
        discovered.set_value("abc");
        assert!(discovered.is_valid());

        let mut any = declared("any", FlagConfig::new().with_type("*"));
        any.set_value(true);
        assert!(any.is_valid());
    }

    #[test]
    fn test_item_type_mismatch_reports_each_item() {
        let mut flag = declared(
            "size",
            FlagConfig::new().with_type("number").allow_multiple(),
        );
        flag.set_value(1);
        flag.set_value("big");
        assert_eq!(
            flag.violations(),
            vec![Violation::ItemTypeMismatch {
                flag: "size".into(),
                item: "big".into(),
                expected: FlagType::Number,
                found: "string".into(),
            }]
        );
    }

    #[test]
    fn test_required_short_circuits_later_rules() {
        let flag = declared(
            "mode",
            FlagConfig::new()
                .required()
                .with_options(["a"])
                .with_validator(Validator::predicate(|_| false)),
        );
        assert_eq!(flag.violations().len(), 1);
    }

    #[test]
    fn test_predicate_and_pattern_validators() {
        let mut flag = declared(
            "value",
            FlagConfig::new().with_validator(Validator::predicate(|v| v.as_str() == Some("ok"))),
        );
        flag.set_value("ok");
        assert!(flag.is_valid());
        flag.set_value("notok");
        assert_eq!(
            flag.violations(),
            vec![Violation::FailedValidation {
                value: "notok".into()
            }]
        );

        let mut flag = declared(
            "pass",
            FlagConfig::new()
                .with_type("any")
                .with_validator(Validator::pattern("^a.*c$").unwrap()),
        );
        flag.set_value(true);
        assert!(!flag.is_valid(), "non-string values fail a pattern");
        flag.set_value("abbbbc");
        assert!(flag.is_valid());
    }

    #[test]
    fn test_create_alias_flattens_and_strips() {
        let mut flag = Flag::new("port").unwrap();
        flag.create_alias(vec![AliasSpec::from("-P"), AliasSpec::from(vec!["--prt"])]);
        flag.create_alias("p");
        flag.create_alias("port");

        assert_eq!(flag.aliases(), &["p".to_string(), "prt".to_string()]);
        assert!(flag.has_alias("--PRT"));
    }

    #[test]
    fn test_options_follow_the_flag_type() {
        let mut level = declared(
            "level",
            FlagConfig::new().with_type("number").with_options(["1", "2", "3"]),
        );
        assert_eq!(level.options()[1], Value::Number(2.0));
        level.set_value(Value::from("2").coerce(FlagType::Number));
        assert!(level.is_valid());

        let mut id = declared("id", FlagConfig::new().with_options(["10", "20"]));
        id.set_type("bigint");
        assert_eq!(id.options(), &[Value::BigInt(10), Value::BigInt(20)]);
        id.set_value(Value::BigInt(20));
        assert!(id.is_valid());

        let mut toggle = declared(
            "toggle",
            FlagConfig::new().with_type("boolean").with_options(["true", "FALSE"]),
        );
        assert_eq!(toggle.options(), &[Value::Bool(true), Value::Bool(false)]);
        toggle.set_value(false);
        assert!(toggle.is_valid());
    }

    #[test]
    fn test_default_is_converted_to_declared_type() {
        let id = declared("id", FlagConfig::new().with_type("bigint").with_default(5));
        assert_eq!(id.value(), Some(Value::BigInt(5)));
        assert!(id.is_valid());

        let name = declared("name", FlagConfig::new().with_type("string").with_default(false));
        assert_eq!(name.value(), Some(Value::from("false")));
        assert!(name.is_valid());

        let mut port = declared("port", FlagConfig::new().with_type("number"));
        port.set_default("8080");
        assert_eq!(port.default_value(), Some(&Value::Number(8080.0)));
    }

    #[test]
    fn test_discovered_flag_takes_type_from_default() {
        let mut port = Flag::new("port").unwrap();
        port.set_default(8080);
        assert_eq!(port.flag_type(), FlagType::Number);

        port.recognize();
        assert!(port.is_valid());
    }

    #[test]
    fn test_description_is_kept() {
        let mut flag = Flag::new("port").unwrap();
        assert_eq!(flag.description(), None);
        flag.set_description("  Port to listen on ");
        assert_eq!(flag.description(), Some("Port to listen on"));
    }
}
