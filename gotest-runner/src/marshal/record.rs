// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::events::{TestAction, TestEvent, TestStatus};
use crate::normalize::{highlight, sanitize};
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::debug;

/// Matches the location prefix `testing.T` puts on `t.Error` and `t.Fatal` output.
static ERROR_LOCATION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s+(\S+_test\.go):(\d+): (.*)$").expect("error location regex is valid")
});

/// A source location reported in a failing test's output.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TestErrorLocation {
    /// The one-based line number.
    pub line: u32,

    /// The message printed at that line.
    pub message: String,
}

impl TestErrorLocation {
    /// Parses a raw output line such as `    foo_test.go:12: want 1, got 2`.
    pub fn parse(output: &str) -> Option<Self> {
        let output = output.trim_end_matches(['\n', '\r']);
        let captures = ERROR_LOCATION_REGEX.captures(output)?;
        Some(Self {
            line: captures[2].parse().ok()?,
            message: captures[3].to_owned(),
        })
    }
}

/// Everything the stream reported about one test.
///
/// Records carry no source file: a stream covers one run, and the file that
/// run was built for is [`RunContext::file`](crate::run_spec::RunContext::file).
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TestRecord {
    /// Every action reported for the test, in order.
    pub progress: Vec<TestAction>,

    /// The last terminal status reported, if any.
    pub status: Option<TestStatus>,

    /// Output lines of the test and its subtests, sanitized and highlighted.
    pub output: Vec<String>,

    /// Error locations found in the test's own output.
    pub errors: Vec<TestErrorLocation>,
}

/// The result of parsing a captured stream.
#[derive(Clone, Debug, Default)]
pub struct ParsedStream {
    /// Every output line in the stream, sanitized and highlighted.
    pub log: Vec<String>,

    /// Records keyed by the slash-separated test name, in order of first appearance.
    pub records: IndexMap<String, TestRecord>,

    /// True if a line failed to decode and the stream was read as a plain log.
    pub malformed: bool,
}

/// Parses the captured output of `go test -json`.
///
/// If any non-empty line isn't a valid event, the whole input is treated as a
/// plain log: every line is highlighted and no records are produced.
pub fn parse_stream(raw: &str) -> ParsedStream {
    let mut events = Vec::new();
    for (line_number, line) in raw.lines().enumerate() {
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<TestEvent>(line) {
            Ok(event) => events.push(event),
            Err(error) => {
                debug!(line_number, %error, "output is not a JSON event stream, reading as plain log");
                return ParsedStream {
                    log: raw.lines().map(highlight).collect(),
                    records: IndexMap::new(),
                    malformed: true,
                };
            }
        }
    }

    let mut stream = ParsedStream::default();
    for event in events {
        stream.apply(event);
    }
    stream
}

impl ParsedStream {
    fn apply(&mut self, event: TestEvent) {
        let raw_output = event.output.as_deref().filter(|output| !output.is_empty());
        let line = raw_output.map(|output| highlight(&sanitize(output)));
        if let Some(line) = &line {
            self.log.push(line.clone());
        }

        let Some(test) = event.test.as_deref().filter(|test| !test.is_empty()) else {
            return;
        };

        let record = self.records.entry(test.to_owned()).or_default();
        if let Some(status) = event.action.status() {
            record.status = Some(status);
        }
        record.progress.push(event.action);

        let (Some(raw_output), Some(line)) = (raw_output, line) else {
            return;
        };
        record.errors.extend(TestErrorLocation::parse(raw_output));
        record.output.push(line.clone());

        let mut fanned_out = false;
        for (index, _) in test.match_indices('/') {
            if let Some(ancestor) = self.records.get_mut(&test[..index]) {
                ancestor.output.push(line.clone());
                fanned_out = true;
            }
        }
        if !fanned_out && test.contains('/') {
            debug!(test, "no ancestor record yet, not propagating output");
        }
    }
}
