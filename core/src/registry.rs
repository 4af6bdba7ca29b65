//! The flag registry: declarations, alias table, parsing and validation.
//!
//! A [`FlagRegistry`] owns every [`Flag`] it knows about. Flags are declared
//! up front (through a [`Schema`] or the individual registry methods) or
//! discovered while parsing. Aliases are kept in an explicit alias →
//! canonical-name table and resolved before any flag is touched.
//!
//! Parsing never fails on user input. Problems are reported by
//! [`validate`](FlagRegistry::validate) and, when the caller asks for it,
//! turned into an error by [`enforce_rules`](FlagRegistry::enforce_rules).

use std::collections::{HashMap, HashSet};

use tracing::{debug, trace, warn};

use crate::data::Data;
use crate::env::Environment;
use crate::error::{ConfigError, InvalidFlags, Result};
use crate::flag::clean_name;
use crate::schema::{AliasSpec, FlagConfig, Schema};
use crate::tokenizer::{Input, Pair, Tokenizer};
use crate::validate::{Validation, Violation};
use crate::{Flag, FlagType, Value};

/// Builds a registry from a schema and parses `input` into it.
///
/// # Examples
///
/// ```
/// use argflags_core::{FlagConfig, Schema, Value, registry};
///
/// let schema = Schema::new().flag("connection", FlagConfig::new().with_alias("c"));
/// let registry = registry(schema, r#"test -c "my connection""#).unwrap();
///
/// assert_eq!(registry.data().get("connection"), Some(&Value::from("my connection")));
/// ```
pub fn registry(schema: Schema, input: impl Into<Input>) -> Result<FlagRegistry> {
    let mut registry = FlagRegistry::with_schema(schema)?;
    registry.parse(input);
    Ok(registry)
}

/// Builds a registry from a schema and parses the environment's arguments.
pub fn from_environment(schema: Schema, env: &impl Environment) -> Result<FlagRegistry> {
    registry(schema, env.args())
}

/// Owns all flags, the alias table and the unknown bucket.
///
/// # Examples
///
/// ```
/// use argflags_core::{FlagConfig, FlagRegistry, Schema, Value};
///
/// let schema = Schema::new()
///     .flag("test", FlagConfig::new().with_alias("t").allow_multiple())
///     .flag("more", FlagConfig::new().with_alias("m").with_type("boolean"));
///
/// let mut registry = FlagRegistry::with_schema(schema).unwrap();
/// registry.parse("--more t");
///
/// let data = registry.data();
/// assert_eq!(data.get("more"), Some(&Value::Bool(true)));
/// assert_eq!(data.get("t"), Some(&Value::Bool(true)));
/// assert_eq!(data.get("test"), Some(&Value::List(vec![])));
/// ```
#[derive(Debug, Clone)]
pub struct FlagRegistry {
    tokens: Vec<String>,
    flags: Vec<Flag>,
    index: HashMap<String, usize>,
    aliases: HashMap<String, String>,
    unknown: Vec<(String, Flag)>,
    allow_unrecognized: bool,
    enforce_types: bool,
    consumed: usize,
}

impl Default for FlagRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FlagRegistry {
    pub fn new() -> Self {
        Self {
            tokens: Vec::new(),
            flags: Vec::new(),
            index: HashMap::new(),
            aliases: HashMap::new(),
            unknown: Vec::new(),
            allow_unrecognized: true,
            enforce_types: true,
            consumed: 0,
        }
    }

    pub fn with_schema(schema: Schema) -> Result<Self> {
        let mut registry = Self::new();
        registry.configure(schema)?;
        Ok(registry)
    }

    /// Declares every flag of the schema.
    ///
    /// # Errors
    ///
    /// Fails on the first duplicate name, alias conflict or invalid
    /// declaration; flags declared before the failure are kept.
    pub fn configure(&mut self, schema: Schema) -> Result<()> {
        for (name, config) in schema {
            self.add_flag(&name, config)?;
        }
        Ok(())
    }

    /// Declares a single flag.
    ///
    /// # Errors
    ///
    /// Returns [`DuplicateFlag`](ConfigError::DuplicateFlag) when the
    /// canonical name is taken and [`AliasConflict`](ConfigError::AliasConflict)
    /// when one of its aliases belongs to another flag.
    pub fn add_flag(&mut self, name: &str, config: FlagConfig) -> Result<&mut Flag> {
        let inherit_strictness = config.strict_types.is_none();
        let mut flag = Flag::from_config(name, config)?;
        if inherit_strictness {
            flag.set_strict_types(self.enforce_types);
        }
        let idx = self.insert(flag)?;
        Ok(&mut self.flags[idx])
    }

    fn insert(&mut self, flag: Flag) -> Result<usize> {
        let name = flag.name().to_string();
        if self.index.contains_key(&name) || self.aliases.contains_key(&name) {
            return Err(ConfigError::DuplicateFlag(flag.input_name().to_string()));
        }
        for alias in flag.aliases() {
            self.check_alias(alias, &name)?;
        }

        let idx = self.flags.len();
        for alias in flag.aliases() {
            debug!(flag = %name, alias = %alias, "Registered alias");
            self.aliases.insert(alias.clone(), name.clone());
        }
        self.index.insert(name, idx);
        self.flags.push(flag);
        Ok(idx)
    }

    fn check_alias(&self, alias: &str, owner: &str) -> Result<()> {
        if let Some(existing) = self.aliases.get(alias)
            && existing != owner
        {
            return Err(ConfigError::AliasConflict {
                alias: alias.to_string(),
                owner: existing.clone(),
            });
        }
        if alias != owner && self.index.contains_key(alias) {
            return Err(ConfigError::AliasConflict {
                alias: alias.to_string(),
                owner: alias.to_string(),
            });
        }
        Ok(())
    }

    fn resolve(&self, name: &str) -> Option<usize> {
        let clean = clean_name(name);
        let canonical = self.aliases.get(&clean).unwrap_or(&clean);
        self.index.get(canonical).copied()
    }

    /// Index of the flag `name` refers to, creating a discovered flag when
    /// nothing matches.
    fn resolve_or_create(&mut self, name: &str) -> Result<usize> {
        if let Some(idx) = self.resolve(name) {
            return Ok(idx);
        }
        let mut flag = Flag::new(name)?;
        flag.set_strict_types(self.enforce_types);
        debug!(flag = %flag.name(), "Discovered flag");
        self.insert(flag)
    }

    fn is_boolean(&self, name: &str) -> bool {
        self.resolve(name).is_some_and(|idx| {
            let flag = &self.flags[idx];
            flag.is_recognized() && flag.flag_type() == FlagType::Boolean
        })
    }

    /// Tokenizes `input` and binds every pair and bare argument.
    ///
    /// Calling `parse` again accumulates into the existing state.
    pub fn parse(&mut self, input: impl Into<Input>) {
        let input = input.into();
        if input.is_empty() {
            return;
        }

        let tokens = Tokenizer::new(|name: &str| self.is_boolean(name)).tokenize(&input);
        debug!(
            pairs = tokens.pairs.len(),
            args = tokens.args.len(),
            "Parsed input"
        );

        self.consumed += tokens.consumed();
        self.tokens.extend(tokens.raw);
        for pair in tokens.pairs {
            self.bind(pair);
        }
        for arg in tokens.args {
            self.bind_arg(&arg);
        }
    }

    fn bind(&mut self, pair: Pair) {
        let idx = match self.resolve_or_create(&pair.flag) {
            Ok(idx) => idx,
            Err(err) => {
                warn!(flag = %pair.flag, error = %err, "Skipping flag");
                return;
            }
        };

        let flag = &mut self.flags[idx];
        let value = match (flag.is_recognized(), flag.flag_type(), pair.text) {
            (true, FlagType::String, Some(text)) => Value::String(text),
            (true, flag_type, _) => pair.value.coerce(flag_type),
            (false, _, _) => pair.value,
        };
        trace!(flag = %flag.name(), value = %value, "Bound value");
        flag.set_value(value);
    }

    fn bind_arg(&mut self, arg: &str) {
        let name = clean_name(arg);
        if name.is_empty() {
            return;
        }

        let Ok(mut flag) = Flag::new(arg) else {
            return;
        };
        flag.set_type(FlagType::Boolean);
        flag.set_value(true);

        if self.exists(&name) {
            let key = self.unknown_key(&name);
            flag.set_strict_types(false);
            debug!(arg = %arg, key = %key, "Argument collides with an existing name");
            self.unknown.push((key, flag));
        } else {
            flag.set_strict_types(self.enforce_types);
            trace!(arg = %arg, "Argument bound as boolean flag");
            if let Err(err) = self.insert(flag) {
                warn!(arg = %arg, error = %err, "Skipping argument");
            }
        }
    }

    fn unknown_key(&self, base: &str) -> String {
        let taken = |key: &str| {
            self.index.contains_key(key) || self.unknown.iter().any(|(existing, _)| existing == key)
        };
        disambiguate(base, taken)
    }

    /// Marks flags as required (and declared), creating them if needed.
    pub fn require<I, S>(&mut self, names: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            let idx = self.resolve_or_create(name.as_ref())?;
            let flag = &mut self.flags[idx];
            flag.set_required(true);
            flag.recognize();
        }
        Ok(())
    }

    /// Marks flags as declared, creating them if needed.
    pub fn recognize<I, S>(&mut self, names: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            let idx = self.resolve_or_create(name.as_ref())?;
            self.flags[idx].recognize();
        }
        Ok(())
    }

    /// Attaches aliases to flags, creating the flags if needed.
    ///
    /// # Errors
    ///
    /// Returns [`AliasConflict`](ConfigError::AliasConflict) when an alias is
    /// already bound to a different flag or is another flag's name. No alias
    /// of the failing pair is registered.
    ///
    /// # Examples
    ///
    /// ```
    /// use argflags_core::{ConfigError, FlagRegistry};
    ///
    /// let mut registry = FlagRegistry::new();
    /// registry.alias([("port", "p")]).unwrap();
    ///
    /// let err = registry.alias([("path", "p")]).unwrap_err();
    /// assert!(matches!(err, ConfigError::AliasConflict { .. }));
    /// ```
    pub fn alias<I, K, A>(&mut self, pairs: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, A)>,
        K: AsRef<str>,
        A: Into<AliasSpec>,
    {
        for (name, spec) in pairs {
            let aliases = spec.into().names();
            let owner = match self.resolve(name.as_ref()) {
                Some(idx) => self.flags[idx].name().to_string(),
                None => clean_name(name.as_ref()),
            };
            for alias in &aliases {
                self.check_alias(alias, &owner)?;
            }

            let idx = self.resolve_or_create(name.as_ref())?;
            let flag = &mut self.flags[idx];
            flag.create_alias(AliasSpec::Many(
                aliases.iter().cloned().map(AliasSpec::One).collect(),
            ));
            flag.recognize();
            let owner = flag.name().to_string();
            for alias in aliases.into_iter().filter(|alias| *alias != owner) {
                debug!(flag = %owner, alias = %alias, "Registered alias");
                self.aliases.insert(alias, owner.clone());
            }
        }
        Ok(())
    }

    /// Sets default values (and declares the flags).
    pub fn defaults<I, K, V>(&mut self, pairs: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        for (name, value) in pairs {
            let idx = self.resolve_or_create(name.as_ref())?;
            let flag = &mut self.flags[idx];
            flag.set_default(value);
            flag.recognize();
        }
        Ok(())
    }

    /// Restricts a flag to an enumerated set of values.
    ///
    /// # Errors
    ///
    /// Returns [`EmptyOptions`](ConfigError::EmptyOptions) when `values` is
    /// empty.
    pub fn set_options<V: Into<Value>>(
        &mut self,
        name: &str,
        values: impl IntoIterator<Item = V>,
    ) -> Result<()> {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            return Err(ConfigError::EmptyOptions(name.to_string()));
        }
        let idx = self.resolve_or_create(name)?;
        let flag = &mut self.flags[idx];
        flag.set_options(values);
        flag.recognize();
        Ok(())
    }

    pub fn describe(&mut self, name: &str, description: &str) -> Result<()> {
        let idx = self.resolve_or_create(name)?;
        self.flags[idx].set_description(description);
        Ok(())
    }

    /// Lets the named flags collect every occurrence.
    pub fn allow_multiple_values<I, S>(&mut self, names: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            let idx = self.resolve_or_create(name.as_ref())?;
            self.flags[idx].allow_multiple_values();
        }
        Ok(())
    }

    /// Makes the named flags keep only their last occurrence.
    pub fn prevent_multiple_values<I, S>(&mut self, names: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            let idx = self.resolve_or_create(name.as_ref())?;
            self.flags[idx].prevent_multiple_values();
        }
        Ok(())
    }

    pub fn disallow_unrecognized(&mut self) {
        self.allow_unrecognized = false;
    }

    pub fn allow_unrecognized(&mut self) {
        self.allow_unrecognized = true;
    }

    pub fn enforce_data_types(&mut self) {
        self.set_type_enforcement(true);
    }

    pub fn ignore_data_types(&mut self) {
        self.set_type_enforcement(false);
    }

    fn set_type_enforcement(&mut self, strict: bool) {
        self.enforce_types = strict;
        for flag in &mut self.flags {
            flag.set_strict_types(strict);
        }
    }

    /// Validates every flag against the current state.
    pub fn validate(&self) -> Validation {
        let mut validation = Validation::default();

        for flag in &self.flags {
            validation.extend(flag.validate());
            if !self.allow_unrecognized && !flag.is_recognized() {
                validation.push(Violation::Unrecognized {
                    flag: flag.name().to_string(),
                });
            }
        }

        if !self.allow_unrecognized {
            for (key, _) in &self.unknown {
                validation.push(Violation::Unrecognized { flag: key.clone() });
            }
        }

        validation
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_valid()
    }

    pub fn violations(&self) -> Vec<Violation> {
        self.validate().violations
    }

    /// Fails with every violation when the current state is invalid.
    pub fn enforce_rules(&self) -> std::result::Result<(), InvalidFlags> {
        let validation = self.validate();
        if validation.is_valid() {
            return Ok(());
        }
        Err(InvalidFlags {
            violations: validation.violations,
        })
    }

    /// Like [`enforce_rules`](Self::enforce_rules), handing any failure to
    /// the environment first.
    pub fn enforce_rules_in(&self, env: &impl Environment) -> std::result::Result<(), InvalidFlags> {
        self.enforce_rules().inspect_err(|failure| {
            debug!(violations = failure.violations.len(), "Rejecting input");
            env.reject(failure);
        })
    }

    /// Canonical names mapped to resolved values.
    pub fn data(&self) -> Data<'_> {
        let mut data = Data::default();
        let mut seen: HashSet<&str> = HashSet::new();

        for flag in &self.flags {
            seen.insert(flag.name());
            data.push(flag.name().to_string(), flag.value(), flag);
        }

        let mut unknown_keys: Vec<String> = Vec::new();
        for (key, flag) in &self.unknown {
            let key = disambiguate(key, |candidate| {
                seen.contains(candidate) || unknown_keys.iter().any(|k| k == candidate)
            });
            unknown_keys.push(key.clone());
            data.push(key, Some(Value::Bool(true)), flag);
        }

        data
    }

    /// Every known name: canonical names, aliases, then unknown-bucket keys.
    pub fn flags(&self) -> Vec<String> {
        let canonical = self.flags.iter().map(|flag| flag.name().to_string());
        let aliases = self.flags.iter().flat_map(|flag| flag.aliases().iter().cloned());
        let unknown = self.unknown.iter().map(|(key, _)| key.clone());
        canonical.chain(aliases).chain(unknown).collect()
    }

    pub fn recognized_flags(&self) -> Vec<String> {
        self.flags
            .iter()
            .filter(|flag| flag.is_recognized())
            .map(|flag| flag.name().to_string())
            .collect()
    }

    /// Discovered flags followed by unknown-bucket keys.
    pub fn unrecognized_flags(&self) -> Vec<String> {
        self.flags
            .iter()
            .filter(|flag| !flag.is_recognized())
            .map(|flag| flag.name().to_string())
            .chain(self.unknown.iter().map(|(key, _)| key.clone()))
            .collect()
    }

    /// Whether `name` is a flag, an alias or an unknown-bucket key.
    pub fn exists(&self, name: &str) -> bool {
        self.resolve(name).is_some() || self.unknown_entry(name).is_some()
    }

    /// Looks a flag up by name or alias, falling back to the unknown bucket.
    pub fn get_flag(&self, name: &str) -> Option<&Flag> {
        self.resolve(name)
            .map(|idx| &self.flags[idx])
            .or_else(|| self.unknown_entry(name))
    }

    pub fn get_flag_mut(&mut self, name: &str) -> Option<&mut Flag> {
        self.resolve(name).map(|idx| &mut self.flags[idx])
    }

    fn unknown_entry(&self, name: &str) -> Option<&Flag> {
        let clean = clean_name(name);
        self.unknown
            .iter()
            .find(|(key, _)| *key == clean)
            .map(|(_, flag)| flag)
    }

    pub fn type_of(&self, name: &str) -> Option<FlagType> {
        self.get_flag(name).map(Flag::flag_type)
    }

    pub fn value(&self, name: &str) -> Option<Value> {
        if let Some(idx) = self.resolve(name) {
            return self.flags[idx].value();
        }
        self.unknown_entry(name).map(|_| Value::Bool(true))
    }

    pub fn aliases_of(&self, name: &str) -> Vec<String> {
        self.get_flag(name)
            .map(|flag| flag.aliases().to_vec())
            .unwrap_or_default()
    }

    pub fn description(&self, name: &str) -> Option<&str> {
        self.get_flag(name).and_then(Flag::description)
    }

    /// Declared and discovered flags, in order.
    pub fn iter(&self) -> impl Iterator<Item = &Flag> {
        self.flags.iter()
    }

    /// Number of logical tokens consumed by all parses so far.
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// Raw tokens seen by all parses so far.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }
}

/// `base` if free, otherwise `base1`, `base2`, ...
fn disambiguate(base: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(base) {
        return base.to_string();
    }
    (1..)
        .map(|n| format!("{base}{n}"))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| base.to_string())
}
