// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use serde::{Deserialize, Serialize};
use std::fmt;

/// One line of `go test -json` output.
///
/// See `go doc test2json` for the format. Fields other than these are ignored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TestEvent {
    /// What happened.
    pub action: TestAction,

    /// The slash-separated test name, e.g. `TestFoo/bar_baz`. Absent for
    /// package-level events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test: Option<String>,

    /// Output printed by the test or the toolchain, including the trailing newline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// The package import path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,

    /// Seconds elapsed, for pass and fail events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed: Option<f64>,

    /// RFC 3339 timestamp of the event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
}

/// The `Action` of a [`TestEvent`].
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TestAction {
    /// The test binary is about to start.
    Start,
    /// The test has started running.
    Run,
    /// The test has been paused.
    Pause,
    /// The test has continued running.
    Cont,
    /// The test passed.
    Pass,
    /// The test failed.
    Fail,
    /// The test was skipped or the package contained no tests.
    Skip,
    /// The benchmark printed log output but did not fail.
    Bench,
    /// The test printed output.
    Output,
    /// An action not known to this version.
    Other(String),
}

impl TestAction {
    /// Returns the action as it appears in the stream.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Start => "start",
            Self::Run => "run",
            Self::Pause => "pause",
            Self::Cont => "cont",
            Self::Pass => "pass",
            Self::Fail => "fail",
            Self::Skip => "skip",
            Self::Bench => "bench",
            Self::Output => "output",
            Self::Other(other) => other,
        }
    }

    /// Returns the status this action resolves a test to, if it is terminal.
    pub fn status(&self) -> Option<TestStatus> {
        match self {
            Self::Pass => Some(TestStatus::Passed),
            Self::Fail => Some(TestStatus::Failed),
            Self::Skip => Some(TestStatus::Skipped),
            Self::Start
            | Self::Run
            | Self::Pause
            | Self::Cont
            | Self::Bench
            | Self::Output
            | Self::Other(_) => None,
        }
    }
}

impl From<String> for TestAction {
    fn from(action: String) -> Self {
        match action.as_str() {
            "start" => Self::Start,
            "run" => Self::Run,
            "pause" => Self::Pause,
            "cont" => Self::Cont,
            "pass" => Self::Pass,
            "fail" => Self::Fail,
            "skip" => Self::Skip,
            "bench" => Self::Bench,
            "output" => Self::Output,
            _ => Self::Other(action),
        }
    }
}

impl From<TestAction> for String {
    fn from(action: TestAction) -> Self {
        match action {
            TestAction::Other(other) => other,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for TestAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The final status of a test.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TestStatus {
    /// The test passed.
    Passed,
    /// The test failed.
    Failed,
    /// The test was skipped.
    Skipped,
}

impl TestStatus {
    /// Returns the status as a string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test]
    fn decode_event() {
        let event: TestEvent = serde_json::from_str(
            r#"{"Time":"2024-01-02T03:04:05.1Z","Action":"output","Package":"example.com/foo","Test":"TestFoo/bar","Output":"=== RUN   TestFoo/bar\n","Elapsed":0.01}"#,
        )
        .expect("valid event");
        assert_eq!(event.action, TestAction::Output);
        assert_eq!(event.test.as_deref(), Some("TestFoo/bar"));
        assert_eq!(event.output.as_deref(), Some("=== RUN   TestFoo/bar\n"));
        assert_eq!(event.package.as_deref(), Some("example.com/foo"));
        assert_eq!(event.elapsed, Some(0.01));
        assert_eq!(event.time.as_deref(), Some("2024-01-02T03:04:05.1Z"));
    }

    #[test]
    fn decode_requires_action() {
        serde_json::from_str::<TestEvent>(r#"{"Test":"TestFoo"}"#)
            .expect_err("Action is required");
    }

    #[test]
    fn unknown_action_is_preserved() {
        let event: TestEvent =
            serde_json::from_str(r#"{"Action":"build-output"}"#).expect("valid event");
        assert_eq!(event.action, TestAction::Other("build-output".to_owned()));
        assert_eq!(event.action.status(), None);
        assert_eq!(
            serde_json::to_string(&event).expect("serialized"),
            r#"{"Action":"build-output"}"#
        );
    }

    #[test_case("pass", Some(TestStatus::Passed))]
    #[test_case("fail", Some(TestStatus::Failed))]
    #[test_case("skip", Some(TestStatus::Skipped))]
    #[test_case("run", None)]
    #[test_case("pause", None)]
    #[test_case("cont", None)]
    #[test_case("output", None)]
    #[test_case("bench", None)]
    #[test_case("start", None)]
    fn action_status(action: &str, expected: Option<TestStatus>) {
        let action = TestAction::from(action.to_owned());
        assert_eq!(action.as_str(), action.to_string());
        assert_eq!(action.status(), expected);
    }
}
