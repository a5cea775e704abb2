// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::normalize::normalize_test_name;
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The separator between segments of a [`PositionId`].
pub const POSITION_ID_SEPARATOR: &str = "::";

/// The kind of a [`Position`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PositionKind {
    /// A directory, treated as a collection of files.
    Dir,

    /// A single `_test.go` file.
    File,

    /// A package-level grouping of tests.
    Namespace,

    /// A test function, example, or subtest.
    Test,
}

impl PositionKind {
    /// Returns the string representation of this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dir => "dir",
            Self::File => "file",
            Self::Namespace => "namespace",
            Self::Test => "test",
        }
    }

    /// Returns true if positions of this kind are identified by their path alone.
    pub fn is_path_root(self) -> bool {
        matches!(self, Self::Dir | Self::File)
    }
}

impl fmt::Display for PositionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A zero-based row and column in a source file.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct SourcePoint {
    /// The row, starting at 0.
    pub row: usize,
    /// The column in bytes, starting at 0.
    pub column: usize,
}

/// The location of a definition in its source file.
///
/// Only the byte offsets are used to decide nesting; the points are passed
/// through to the host for display.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SourceRange {
    /// Start byte, inclusive.
    pub start_byte: usize,
    /// End byte, exclusive.
    pub end_byte: usize,
    /// Start point.
    pub start: SourcePoint,
    /// End point.
    pub end: SourcePoint,
}

impl SourceRange {
    /// Returns true if `other` lies entirely within `self`.
    pub fn contains(&self, other: &SourceRange) -> bool {
        self.start_byte <= other.start_byte && other.end_byte <= self.end_byte
    }
}

/// A stable identifier for a [`Position`] within a tree.
///
/// The id of a file or directory is its path. The id of a test is its parent's
/// id followed by `::` and the normalized test name, so a subtest `"bar baz"` of
/// `TestFoo` in `/src/foo_test.go` is `/src/foo_test.go::TestFoo::bar_baz`.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PositionId(String);

impl PositionId {
    /// Creates the id for a file or directory.
    pub fn for_path(path: &Utf8Path) -> Self {
        Self(path.as_str().to_owned())
    }

    /// Creates an id from a string previously obtained from [`Self::as_str`].
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id of a child of this position with the given source name.
    ///
    /// The name is normalized with [`normalize_test_name`].
    pub fn child(&self, raw_name: &str) -> Self {
        Self(format!(
            "{}{POSITION_ID_SEPARATOR}{}",
            self.0,
            normalize_test_name(raw_name)
        ))
    }

    /// Returns the id as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the name `go test` uses for this position.
    ///
    /// The file path segment is dropped and the remaining segments are joined
    /// with `/`. Returns `None` for the file or directory position itself, or
    /// if this id does not belong to `path`.
    pub fn qualified_name(&self, path: &Utf8Path) -> Option<String> {
        let rest = self.0.strip_prefix(path.as_str())?;
        let rest = rest.strip_prefix(POSITION_ID_SEPARATOR)?;
        if rest.is_empty() {
            return None;
        }
        Some(rest.split(POSITION_ID_SEPARATOR).collect::<Vec<_>>().join("/"))
    }
}

impl fmt::Display for PositionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PositionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Something addressable that can be run: a directory, a file, a namespace or a test.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Position {
    /// The identifier of this position.
    pub id: PositionId,

    /// The kind of this position.
    #[serde(rename = "type")]
    pub kind: PositionKind,

    /// The absolute path of the file or directory this position lives in.
    pub path: Utf8PathBuf,

    /// The display name, exactly as found in source (quotes and whitespace included).
    pub name: String,

    /// The source range of the definition, if this position came from source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<SourceRange>,
}

impl Position {
    /// Creates a file position.
    pub fn file(path: impl Into<Utf8PathBuf>) -> Self {
        Self::path_root(PositionKind::File, path.into())
    }

    /// Creates a directory position.
    pub fn dir(path: impl Into<Utf8PathBuf>) -> Self {
        Self::path_root(PositionKind::Dir, path.into())
    }

    /// Creates a test or namespace position nested under `parent`.
    pub fn nested(
        parent: &Position,
        kind: PositionKind,
        name: impl Into<String>,
        range: Option<SourceRange>,
    ) -> Self {
        let name = name.into();
        Self {
            id: parent.id.child(&name),
            kind,
            path: parent.path.clone(),
            name,
            range,
        }
    }

    /// Returns the name `go test` uses for this position, if it is a test or namespace.
    pub fn qualified_name(&self) -> Option<String> {
        self.id.qualified_name(&self.path)
    }

    fn path_root(kind: PositionKind, path: Utf8PathBuf) -> Self {
        let name = path.file_name().unwrap_or(path.as_str()).to_owned();
        Self {
            id: PositionId::for_path(&path),
            kind,
            path,
            name,
            range: None,
        }
    }
}
