// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::matches::{MatchKind, QueryMatch};
use crate::list::{Position, PositionKind, PositionTree, SourceRange};
use camino::Utf8Path;
use tracing::debug;

/// The method a subtest call must invoke.
const SUBTEST_METHOD: &str = "Run";

/// Prefixes of function names that `go test` runs.
const TEST_PREFIXES: &[&str] = &["Test", "Example"];

/// Builds the position tree of a single file from its query matches.
///
/// Matches are processed in source order, outer definitions before the
/// definitions they contain. A stack of open scopes tracks the innermost test
/// enclosing each match, so subtests nest to any depth. Matches that don't
/// describe a runnable test are dropped.
///
/// With no usable matches the tree contains only the file.
pub fn build_position_tree(path: &Utf8Path, mut matches: Vec<QueryMatch>) -> PositionTree {
    let file = Position::file(path);
    let mut tree = PositionTree::new(file);

    matches.retain(|m| m.definition_range().is_some());
    matches.sort_by_key(|m| {
        let range = m.definition_range().unwrap_or_default();
        (range.start_byte, std::cmp::Reverse(range.end_byte))
    });
    matches.dedup_by_key(|m| {
        m.definition_range()
            .map(|range| (range.start_byte, range.end_byte))
    });

    // (definition range, arena index) of every open test scope, outermost first.
    let mut scopes: Vec<(SourceRange, usize)> = Vec::new();

    for query_match in &matches {
        let Some(kind) = query_match.classify() else {
            debug!(?query_match, "skipping match without a definition and name");
            continue;
        };
        let range = kind.definition().range;
        while scopes
            .last()
            .is_some_and(|(scope, _)| !scope.contains(&range))
        {
            scopes.pop();
        }

        let parent = match kind {
            MatchKind::Function { name, .. } => {
                if !is_test_function(&name.text) {
                    debug!(name = %name.text, "skipping non-test function");
                    continue;
                }
                // Declarations are top-level: they never nest in another test.
                scopes.clear();
                0
            }
            MatchKind::SubtestCall { name, method, .. } => {
                if method.text != SUBTEST_METHOD {
                    debug!(method = %method.text, "skipping call to a method other than Run");
                    continue;
                }
                if !is_string_literal(&name.text) {
                    debug!(name = %name.text, "skipping subtest with a non-literal name");
                    continue;
                }
                let Some(&(_, parent)) = scopes.last() else {
                    debug!(name = %name.text, "skipping subtest outside any test");
                    continue;
                };
                parent
            }
            MatchKind::TableCase { name, .. } => {
                let Some(&(_, parent)) = scopes.last() else {
                    debug!(name = %name.text, "skipping table case outside any test");
                    continue;
                };
                parent
            }
        };

        let position = Position::nested(
            tree.position_at(parent),
            PositionKind::Test,
            kind.name().text.as_str(),
            Some(range),
        );
        if let Some(index) = tree.push(parent, position) {
            scopes.push((range, index));
        }
    }

    tree
}

fn is_test_function(name: &str) -> bool {
    TEST_PREFIXES.iter().any(|prefix| name.starts_with(prefix))
}

fn is_string_literal(text: &str) -> bool {
    text.starts_with('"') || text.starts_with('`')
}
