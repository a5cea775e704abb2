// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by gotest-runner.

use crate::list::PositionId;
use camino::{Utf8Path, Utf8PathBuf};
use config::ConfigError;
use std::{io, path::PathBuf};
use thiserror::Error;

/// An error that occurred while parsing the config.
#[derive(Debug, Error)]
#[error("failed to parse gotest config at `{config_file}`")]
#[non_exhaustive]
pub struct ConfigParseError {
    config_file: Utf8PathBuf,
    #[source]
    kind: ConfigParseErrorKind,
}

impl ConfigParseError {
    pub(crate) fn new(config_file: &Utf8Path, kind: ConfigParseErrorKind) -> Self {
        Self {
            config_file: config_file.to_owned(),
            kind,
        }
    }

    /// Returns the config file for this error.
    pub fn config_file(&self) -> &Utf8Path {
        &self.config_file
    }

    /// Returns the kind of error this is.
    pub fn kind(&self) -> &ConfigParseErrorKind {
        &self.kind
    }
}

/// The kind of error that occurred while parsing a config.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigParseErrorKind {
    /// An error occurred while building the config.
    #[error(transparent)]
    BuildError(Box<ConfigError>),

    /// An error occurred while deserializing the config.
    #[error(transparent)]
    DeserializeError(Box<ConfigError>),
}

/// An error that occurred while discovering test positions.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DiscoveryError {
    /// A source file could not be read.
    #[error("error reading source file `{path}`")]
    ReadSource {
        /// The file being read.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// The Go grammar could not be loaded into the parser.
    #[error("error loading the Go grammar")]
    Language(#[source] tree_sitter::LanguageError),

    /// The test query failed to compile against the Go grammar.
    #[error("error compiling the test query")]
    Query(#[source] tree_sitter::QueryError),

    /// The parser produced no syntax tree.
    #[error("failed to parse `{path}`")]
    Parse {
        /// The file being parsed.
        path: Utf8PathBuf,
    },

    /// An error occurred while walking a directory.
    #[error("error walking directory `{root}`")]
    WalkDir {
        /// The directory being walked.
        root: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: walkdir::Error,
    },

    /// A path found while walking a directory was not valid UTF-8.
    #[error("path `{}` is not valid UTF-8", .path.display())]
    NonUtf8Path {
        /// The path.
        path: PathBuf,
    },
}

/// An error that occurred while building a [`RunSpec`](crate::run_spec::RunSpec).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RunSpecError {
    /// The selected position is not part of the tree.
    #[error("position `{id}` not found in tree rooted at `{root}`")]
    PositionNotFound {
        /// The requested position.
        id: PositionId,

        /// The root of the tree that was searched.
        root: PositionId,
    },

    /// The head of the selected source file could not be read.
    #[error("error reading the head of `{path}`")]
    ReadSource {
        /// The file being read.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// A results path could not be allocated.
    #[error("error allocating a results path in `{dir}`")]
    AllocateResultsPath {
        /// The directory the path was allocated in.
        dir: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: io::Error,
    },
}

/// An error that occurred while marshaling `go test` output into results.
///
/// Malformed output is not an error: it is reported through the defined fallback
/// modes. This error is only produced if reading or writing files fails, in which
/// case no results are returned at all.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MarshalError {
    /// The captured output could not be read.
    #[error("error reading captured output at `{path}`")]
    ReadOutput {
        /// The file being read.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// An output file could not be written.
    #[error(transparent)]
    WriteOutput(#[from] WriteOutputError),
}

/// An error that occurred while writing an output file for a position.
#[derive(Debug, Error)]
#[error("error writing output file in `{dir}`")]
pub struct WriteOutputError {
    dir: Utf8PathBuf,
    #[source]
    error: io::Error,
}

impl WriteOutputError {
    pub(crate) fn new(dir: &Utf8Path, error: io::Error) -> Self {
        Self {
            dir: dir.to_owned(),
            error,
        }
    }

    /// Returns the directory the output file was being written to.
    pub fn dir(&self) -> &Utf8Path {
        &self.dir
    }
}
