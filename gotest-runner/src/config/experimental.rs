// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Experimental features.
//!
//! These features are configured in the `[experimental]` table of the config file
//! or via environment variables.

use serde::Deserialize;
use std::{collections::BTreeSet, env, fmt};

/// Deserialized `[experimental]` table.
///
/// ```toml
/// [experimental]
/// table-tests = true
/// ```
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ExperimentalConfig {
    /// Discover table-driven test cases.
    #[serde(default)]
    pub table_tests: bool,
}

impl ExperimentalConfig {
    /// Converts to a set of enabled experimental features.
    pub fn to_set(self) -> BTreeSet<ConfigExperimental> {
        let Self { table_tests } = self;
        let mut set = BTreeSet::new();
        if table_tests {
            set.insert(ConfigExperimental::TableTests);
        }
        set
    }
}

/// Experimental features.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[non_exhaustive]
pub enum ConfigExperimental {
    /// Discover the cases of table-driven tests as separate positions.
    TableTests,
}

impl ConfigExperimental {
    /// Returns the environment variable name that enables this feature.
    pub fn env_var(&self) -> &'static str {
        match self {
            Self::TableTests => "GOTEST_EXPERIMENTAL_TABLE_TESTS",
        }
    }

    /// Returns the feature name as used in configuration.
    pub fn name(&self) -> &'static str {
        match self {
            Self::TableTests => "table-tests",
        }
    }

    /// Returns all known experimental features.
    pub fn all() -> &'static [Self] {
        &[Self::TableTests]
    }

    /// Returns the set of experimental features enabled via environment variables.
    ///
    /// A feature is enabled if its corresponding environment variable is set to "1".
    pub fn from_env() -> BTreeSet<Self> {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Like [`Self::from_env`], but reading variables through `lookup`.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> BTreeSet<Self> {
        Self::all()
            .iter()
            .filter(|feature| lookup(feature.env_var()).is_some_and(|v| v == "1"))
            .copied()
            .collect()
    }
}

impl fmt::Display for ConfigExperimental {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
