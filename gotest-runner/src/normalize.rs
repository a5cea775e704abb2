// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! String transforms applied to test names and captured output lines.
//!
//! `go test` rewrites subtest names before reporting them: runs of whitespace
//! become underscores. Names in source are string literals, so the quotes have
//! to go as well before a source name can be compared with a reported one.

use owo_colors::{OwoColorize, Style};

/// Converts a test name as written in source into the form `go test` reports.
///
/// Every run of whitespace is replaced with a single `_`, and if the result is
/// wholly wrapped in a matching pair of double quotes (or backquotes, for raw
/// string literals), they are stripped.
pub fn normalize_test_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_whitespace = false;
    for c in raw.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                out.push('_');
            }
            in_whitespace = true;
        } else {
            out.push(c);
            in_whitespace = false;
        }
    }

    for quote in ['"', '`'] {
        if out.len() >= 2 && out.starts_with(quote) && out.ends_with(quote) {
            return out[1..out.len() - 1].to_owned();
        }
    }
    out
}

/// Removes newline, carriage return and tab characters from a captured line.
pub fn sanitize(line: &str) -> String {
    line.chars()
        .filter(|c| !matches!(c, '\n' | '\r' | '\t'))
        .collect()
}

/// Wraps a line in a color based on the first status keyword it contains.
///
/// `FAIL` is checked first, then `PASS`, then `SKIP`. Lines without any of
/// these are returned unchanged.
pub fn highlight(line: &str) -> String {
    let styles = HighlightStyles::colorized();
    match styles.style_for(line) {
        Some(style) => line.style(style).to_string(),
        None => line.to_owned(),
    }
}

/// The fixed keyword-to-color table used by [`highlight`].
#[derive(Clone, Debug)]
struct HighlightStyles {
    fail: Style,
    pass: Style,
    skip: Style,
}

impl HighlightStyles {
    fn colorized() -> Self {
        Self {
            fail: Style::new().red(),
            pass: Style::new().green(),
            skip: Style::new().yellow(),
        }
    }

    fn style_for(&self, line: &str) -> Option<Style> {
        if line.contains("FAIL") {
            Some(self.fail)
        } else if line.contains("PASS") {
            Some(self.pass)
        } else if line.contains("SKIP") {
            Some(self.skip)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use test_case::test_case;
    use test_strategy::proptest;

    #[test_case("my test name", "my_test_name"; "spaces")]
    #[test_case("\"quoted\"", "quoted"; "quoted")]
    #[test_case("\"with space\"", "with_space"; "quoted with space")]
    #[test_case("`raw literal`", "raw_literal"; "raw string")]
    #[test_case("tabs\tand  runs", "tabs_and_runs"; "whitespace runs")]
    #[test_case("\"", "\""; "lone quote")]
    #[test_case("\"unbalanced", "\"unbalanced"; "unbalanced quote")]
    #[test_case("", ""; "empty")]
    #[test_case("TestFoo", "TestFoo"; "plain")]
    fn normalize(input: &str, expected: &str) {
        assert_eq!(normalize_test_name(input), expected);
    }

    #[test]
    fn sanitize_strips_control_whitespace() {
        assert_eq!(sanitize("=== RUN   TestFoo\n"), "=== RUN   TestFoo");
        assert_eq!(sanitize("\tfoo_test.go:12: oops\r\n"), "foo_test.go:12: oops");
        assert_eq!(sanitize(""), "");
    }

    #[test]
    fn highlight_order() {
        let red = |s: &str| s.style(Style::new().red()).to_string();
        assert_eq!(highlight("--- FAIL: TestFoo"), red("--- FAIL: TestFoo"));
        assert_eq!(
            highlight("--- PASS: TestFoo"),
            "--- PASS: TestFoo".style(Style::new().green()).to_string()
        );
        assert_eq!(
            highlight("--- SKIP: TestFoo"),
            "--- SKIP: TestFoo".style(Style::new().yellow()).to_string()
        );
        // FAIL wins over PASS, and only one wrapping is applied.
        assert_eq!(highlight("PASS then FAIL"), red("PASS then FAIL"));
        assert_eq!(highlight("=== RUN   TestFoo"), "=== RUN   TestFoo");
        assert_eq!(highlight("failed lowercase"), "failed lowercase");
    }

    #[proptest]
    fn normalize_is_noop_on_plain_names(#[strategy("[A-Za-z0-9_/]{0,24}")] name: String) {
        prop_assert_eq!(normalize_test_name(&name), name);
    }

    #[proptest]
    fn normalized_names_have_no_whitespace(#[strategy("[A-Za-z \t\"]{0,24}")] name: String) {
        let normalized = normalize_test_name(&name);
        prop_assert!(!normalized.chars().any(char::is_whitespace));
    }
}
