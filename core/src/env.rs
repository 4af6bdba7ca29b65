//! The execution environment a registry runs in.
//!
//! The core never reads the process arguments or terminates anything itself.
//! A host supplies the argument vector and decides what a rejection means:
//! a process prints the violations and exits, an embedded host keeps going
//! and propagates the returned [`InvalidFlags`].

use std::cell::RefCell;

use crate::InvalidFlags;

pub trait Environment {
    /// Arguments to parse, without the program name.
    fn args(&self) -> Vec<String>;

    /// Called by [`FlagRegistry::enforce_rules_in`](crate::FlagRegistry::enforce_rules_in)
    /// before the failure is returned to the caller.
    fn reject(&self, failure: &InvalidFlags);
}

/// An environment with a fixed argument list that records rejections
/// instead of acting on them.
///
/// # Examples
///
/// ```
/// use argflags_core::{FixedEnvironment, FlagConfig, Schema, from_environment};
///
/// let env = FixedEnvironment::new(["--port", "80"]);
/// let schema = Schema::new().flag("host", FlagConfig::new().required());
/// let registry = from_environment(schema, &env).unwrap();
///
/// assert!(registry.enforce_rules_in(&env).is_err());
/// assert_eq!(env.rejections().len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct FixedEnvironment {
    args: Vec<String>,
    rejections: RefCell<Vec<InvalidFlags>>,
}

impl FixedEnvironment {
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            rejections: RefCell::default(),
        }
    }

    pub fn rejections(&self) -> Vec<InvalidFlags> {
        self.rejections.borrow().clone()
    }
}

impl Environment for FixedEnvironment {
    fn args(&self) -> Vec<String> {
        self.args.clone()
    }

    fn reject(&self, failure: &InvalidFlags) {
        self.rejections.borrow_mut().push(failure.clone());
    }
}
