// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for gotest-runner.
//!
//! Configuration is resolved once, when the host starts, and then passed by
//! value to the components that need it. Settings are layered in the following
//! order (highest priority first):
//!
//! 1. Explicit overrides from the host (e.g. `--table-tests`)
//! 2. Environment variables (e.g. `GOTEST_EXPERIMENTAL_TABLE_TESTS=1`)
//! 3. The project config file, `.config/gotest.toml` or `--config-file`
//! 4. The embedded [default config](AdapterConfig::DEFAULT_CONFIG)

mod experimental;

pub use experimental::*;

use crate::{
    discovery::DiscoveryOptions,
    errors::{ConfigParseError, ConfigParseErrorKind},
};
use camino::Utf8Path;
use config::{Config, File, FileFormat};
use serde::Deserialize;
use std::collections::BTreeSet;
use tracing::warn;

/// Resolved configuration.
#[derive(Clone, Debug)]
pub struct AdapterConfig {
    go: GoConfig,
    experimental: BTreeSet<ConfigExperimental>,
}

/// The `[go]` table: how to invoke the toolchain.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct GoConfig {
    /// The go binary to invoke.
    pub binary: String,

    /// Arguments passed to every `go test` invocation.
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct DeserializedConfig {
    go: GoConfig,
    #[serde(default)]
    experimental: ExperimentalConfig,
}

impl AdapterConfig {
    /// The location of the project config, relative to the project root.
    pub const CONFIG_PATH: &'static str = ".config/gotest.toml";

    /// Contains the default config as a TOML file.
    ///
    /// Project-specific configuration is layered on top of the default config.
    pub const DEFAULT_CONFIG: &'static str = include_str!("../../default-config.toml");

    /// Reads the config from the given file, or if not specified from
    /// `.config/gotest.toml` in the given project root.
    ///
    /// If the file isn't specified and the project doesn't have `.config/gotest.toml`, uses the
    /// default config options. Experimental features enabled through environment variables are
    /// added to the ones enabled in the file.
    pub fn from_sources(
        project_root: &Utf8Path,
        config_file: Option<&Utf8Path>,
    ) -> Result<Self, ConfigParseError> {
        let mut config = Self::read_from_sources(project_root, config_file)?;
        config.experimental.extend(ConfigExperimental::from_env());
        Ok(config)
    }

    /// Returns the embedded default config, ignoring the environment.
    pub fn default_config() -> Self {
        let deserialized: DeserializedConfig =
            config_builder().build().and_then(Config::try_deserialize).unwrap_or_else(|err| {
                panic!("embedded default config should be valid: {err}")
            });
        Self::from_deserialized(deserialized)
    }

    /// Enables the given experimental features in addition to the configured ones.
    pub fn with_experimental(
        mut self,
        features: impl IntoIterator<Item = ConfigExperimental>,
    ) -> Self {
        self.experimental.extend(features);
        self
    }

    /// Returns the go binary to invoke.
    pub fn go_binary(&self) -> &str {
        &self.go.binary
    }

    /// Returns the arguments passed to every `go test` invocation.
    pub fn go_args(&self) -> &[String] {
        &self.go.args
    }

    /// Returns true if the specified experimental feature is enabled.
    pub fn is_experimental_enabled(&self, feature: ConfigExperimental) -> bool {
        self.experimental.contains(&feature)
    }

    /// Returns the options that control position discovery.
    pub fn discovery_options(&self) -> DiscoveryOptions {
        DiscoveryOptions {
            table_tests: self.is_experimental_enabled(ConfigExperimental::TableTests),
        }
    }

    // ---
    // Helper methods
    // ---

    fn read_from_sources(
        project_root: &Utf8Path,
        config_file: Option<&Utf8Path>,
    ) -> Result<Self, ConfigParseError> {
        let (config_file, source) = match config_file {
            Some(file) => (file.to_owned(), File::new(file.as_str(), FileFormat::Toml)),
            None => {
                let file = project_root.join(Self::CONFIG_PATH);
                let source = File::new(file.as_str(), FileFormat::Toml).required(false);
                (file, source)
            }
        };

        let config = config_builder()
            .add_source(source)
            .build()
            .map_err(|error| {
                ConfigParseError::new(
                    &config_file,
                    ConfigParseErrorKind::BuildError(Box::new(error)),
                )
            })?;

        let mut ignored = BTreeSet::new();
        let deserialized: DeserializedConfig =
            serde_ignored::deserialize(config, |path: serde_ignored::Path| {
                ignored.insert(path.to_string());
            })
            .map_err(|error| {
                ConfigParseError::new(
                    &config_file,
                    ConfigParseErrorKind::DeserializeError(Box::new(error)),
                )
            })?;

        if !ignored.is_empty() {
            warn_unknown_keys(&config_file, &ignored);
        }

        Ok(Self::from_deserialized(deserialized))
    }

    fn from_deserialized(deserialized: DeserializedConfig) -> Self {
        let DeserializedConfig { go, experimental } = deserialized;
        Self {
            go,
            experimental: experimental.to_set(),
        }
    }
}

fn config_builder() -> config::ConfigBuilder<config::builder::DefaultState> {
    Config::builder().add_source(File::from_str(
        AdapterConfig::DEFAULT_CONFIG,
        FileFormat::Toml,
    ))
}

fn warn_unknown_keys(config_file: &Utf8Path, unknown: &BTreeSet<String>) {
    let mut unknown_str = String::new();
    if unknown.len() == 1 {
        // Print this on the same line.
        unknown_str.push_str("key: ");
        unknown_str.extend(unknown.iter().map(String::as_str));
    } else {
        unknown_str.push_str("keys:\n");
        for ignored_key in unknown {
            unknown_str.push('\n');
            unknown_str.push_str("  - ");
            unknown_str.push_str(ignored_key);
        }
    }

    warn!("in config file {config_file}, ignoring unknown configuration {unknown_str}");
}
