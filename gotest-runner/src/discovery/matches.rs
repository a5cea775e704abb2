// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::list::SourceRange;

/// Capture name for the whole definition: a declaration, a `Run` call or a table case.
pub const CAPTURE_DEFINITION: &str = "test.definition";

/// Capture name for the test name: an identifier or a string literal.
pub const CAPTURE_NAME: &str = "test.name";

/// Capture name for the method invoked by a subtest call.
pub const CAPTURE_METHOD: &str = "test.method";

/// Capture name marking a table-driven test case.
pub const CAPTURE_CASE: &str = "test.case";

/// A single capture within a [`QueryMatch`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct QueryCapture {
    /// The capture name, e.g. `test.name`.
    pub name: String,

    /// The source text of the captured node.
    pub text: String,

    /// The location of the captured node.
    pub range: SourceRange,
}

impl QueryCapture {
    /// Creates a new capture.
    pub fn new(name: impl Into<String>, text: impl Into<String>, range: SourceRange) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            range,
        }
    }
}

/// One match of the test query: a set of named captures.
///
/// This is the contract between the syntax frontend and the tree builder. Any
/// frontend that produces these can drive [`build_position_tree`](super::build_position_tree).
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct QueryMatch {
    /// The captures in this match.
    pub captures: Vec<QueryCapture>,
}

impl QueryMatch {
    /// Creates a match from its captures.
    pub fn new(captures: impl IntoIterator<Item = QueryCapture>) -> Self {
        Self {
            captures: captures.into_iter().collect(),
        }
    }

    /// Returns the first capture with the given name.
    pub fn capture(&self, name: &str) -> Option<&QueryCapture> {
        self.captures.iter().find(|capture| capture.name == name)
    }

    /// Returns the range of the definition capture.
    pub fn definition_range(&self) -> Option<SourceRange> {
        self.capture(CAPTURE_DEFINITION).map(|capture| capture.range)
    }

    pub(super) fn classify(&self) -> Option<MatchKind<'_>> {
        let definition = self.capture(CAPTURE_DEFINITION)?;
        let name = self.capture(CAPTURE_NAME)?;
        if self.capture(CAPTURE_CASE).is_some() {
            Some(MatchKind::TableCase { definition, name })
        } else if let Some(method) = self.capture(CAPTURE_METHOD) {
            Some(MatchKind::SubtestCall {
                definition,
                name,
                method,
            })
        } else {
            Some(MatchKind::Function { definition, name })
        }
    }
}

/// What a match describes, decided by which captures it carries.
#[derive(Clone, Copy, Debug)]
pub(super) enum MatchKind<'a> {
    /// A function or method declaration.
    Function {
        definition: &'a QueryCapture,
        name: &'a QueryCapture,
    },

    /// A method call such as `t.Run("name", ...)`.
    SubtestCall {
        definition: &'a QueryCapture,
        name: &'a QueryCapture,
        method: &'a QueryCapture,
    },

    /// One element of a table-driven test's case list.
    TableCase {
        definition: &'a QueryCapture,
        name: &'a QueryCapture,
    },
}

impl<'a> MatchKind<'a> {
    pub(super) fn definition(&self) -> &'a QueryCapture {
        match self {
            Self::Function { definition, .. }
            | Self::SubtestCall { definition, .. }
            | Self::TableCase { definition, .. } => definition,
        }
    }

    pub(super) fn name(&self) -> &'a QueryCapture {
        match self {
            Self::Function { name, .. }
            | Self::SubtestCall { name, .. }
            | Self::TableCase { name, .. } => name,
        }
    }
}
