// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Converting `go test -json` output into per-position results.
//!
//! Marshaling happens in two steps. [`parse_stream`] folds the event stream
//! into one [`TestRecord`] per reported test name. [`ResultMarshaler`] then
//! joins those records onto the [`PositionTree`] the command was built from,
//! by comparing each position's qualified name with the reported names.
//!
//! Two degraded modes are part of the contract rather than errors:
//!
//! * If the output isn't an event stream at all (for example, the package
//!   failed to build), no record is produced.
//! * If no record is produced, every position is reported as failed, and all
//!   of them point at one file containing the whole log.

mod events;
mod record;

pub use events::*;
pub use record::*;

use crate::{
    errors::MarshalError,
    list::{PositionId, PositionTree},
    run_spec::RunSpec,
    test_output::OutputDir,
};
use camino::Utf8PathBuf;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Results keyed by position, in tree order.
pub type ResultMap = IndexMap<PositionId, TestResult>;

/// The result reported for a single position.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TestResult {
    /// The final status.
    pub status: TestStatus,

    /// The test's output lines joined with newlines. Absent if the stream had
    /// no test events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short: Option<String>,

    /// A file containing the output.
    pub output: Utf8PathBuf,

    /// Error locations reported by a failed test.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<TestErrorLocation>,
}

/// Marshals captured `go test -json` output into a [`ResultMap`].
#[derive(Clone, Debug, Default)]
pub struct ResultMarshaler {
    output_dir: OutputDir,
}

impl ResultMarshaler {
    /// Creates a new marshaler that writes output files to `output_dir`.
    pub fn new(output_dir: OutputDir) -> Self {
        Self { output_dir }
    }

    /// Reads the output captured for `spec` and marshals it against `tree`.
    ///
    /// `tree` must be the tree `spec` was built from.
    pub fn marshal_spec(
        &self,
        spec: &RunSpec,
        tree: &PositionTree,
    ) -> Result<ResultMap, MarshalError> {
        let path = &spec.context.results_path;
        let bytes = std::fs::read(path).map_err(|error| MarshalError::ReadOutput {
            path: path.clone(),
            error,
        })?;
        self.marshal(&String::from_utf8_lossy(&bytes), tree)
    }

    /// Marshals `raw`, the captured output of a run, against `tree`.
    ///
    /// Output files are written for every reported position. If writing any
    /// of them fails, no results are returned.
    pub fn marshal(&self, raw: &str, tree: &PositionTree) -> Result<ResultMap, MarshalError> {
        let stream = parse_stream(raw);
        debug!(
            records = stream.records.len(),
            log_lines = stream.log.len(),
            malformed = stream.malformed,
            "parsed test output"
        );

        if stream.records.is_empty() {
            let output = self.output_dir.write_lines(&stream.log)?;
            return Ok(tree
                .iter()
                .map(|position| {
                    let result = TestResult {
                        status: TestStatus::Failed,
                        short: None,
                        output: output.clone(),
                        errors: Vec::new(),
                    };
                    (position.id.clone(), result)
                })
                .collect());
        }

        let mut results = ResultMap::new();
        if let Err(error) = self.marshal_records(&stream, tree, &mut results) {
            // Don't leave output files behind for results that are never returned.
            for result in results.values() {
                if let Err(error) = std::fs::remove_file(&result.output) {
                    debug!(output = %result.output, %error, "failed to remove output file");
                }
            }
            return Err(error);
        }
        Ok(results)
    }

    fn marshal_records(
        &self,
        stream: &ParsedStream,
        tree: &PositionTree,
        results: &mut ResultMap,
    ) -> Result<(), MarshalError> {
        for position in tree.iter() {
            let Some(name) = position.qualified_name() else {
                continue;
            };
            let Some(record) = stream.records.get(&name) else {
                continue;
            };

            // A test that never reported a status was cut short, most
            // likely by a panic in another test.
            let status = record.status.unwrap_or(TestStatus::Failed);
            let output = self.output_dir.write_lines(&record.output)?;
            let errors = match status {
                TestStatus::Failed => record.errors.clone(),
                TestStatus::Passed | TestStatus::Skipped => Vec::new(),
            };
            results.insert(
                position.id.clone(),
                TestResult {
                    status,
                    short: Some(record.output.join("\n")),
                    output,
                    errors,
                },
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        list::{Position, PositionKind},
        normalize::highlight,
    };
    use camino_tempfile::Utf8TempDir;
    use indoc::indoc;
    use maplit::btreemap;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    const FILE: &str = "/src/foo_test.go";

    fn sample_tree() -> PositionTree {
        let file = Position::file(FILE);
        let mut tree = PositionTree::new(file.clone());
        let x = Position::nested(&file, PositionKind::Test, "TestX", None);
        let sub = Position::nested(&x, PositionKind::Test, "\"sub case\"", None);
        let y = Position::nested(&file, PositionKind::Test, "TestY", None);
        let x_index = tree.push(0, x).expect("unique id");
        tree.push(x_index, sub).expect("unique id");
        tree.push(0, y).expect("unique id");
        tree
    }

    fn marshal(raw: &str) -> (ResultMap, Utf8TempDir) {
        let dir = Utf8TempDir::new().expect("created temp dir");
        let marshaler = ResultMarshaler::new(OutputDir::new(dir.path()));
        let results = marshaler
            .marshal(raw, &sample_tree())
            .expect("marshal succeeded");
        (results, dir)
    }

    fn statuses(results: &ResultMap) -> BTreeMap<&str, TestStatus> {
        results
            .iter()
            .map(|(id, result)| (id.as_str(), result.status))
            .collect()
    }

    #[test]
    fn records_are_joined_to_positions() {
        let raw = indoc! {r#"
            {"Action":"start","Package":"example.com/foo"}
            {"Action":"run","Test":"TestX"}
            {"Action":"output","Test":"TestX","Output":"=== RUN   TestX\n"}
            {"Action":"run","Test":"TestX/sub_case"}
            {"Action":"output","Test":"TestX/sub_case","Output":"    foo_test.go:9: bad\n"}
            {"Action":"output","Test":"TestX/sub_case","Output":"--- FAIL: TestX/sub_case (0.00s)\n"}
            {"Action":"fail","Test":"TestX/sub_case"}
            {"Action":"fail","Test":"TestX"}
            {"Action":"run","Test":"TestY"}
            {"Action":"skip","Test":"TestY"}
            {"Action":"run","Test":"TestUnknown"}
            {"Action":"pass","Test":"TestUnknown"}
            {"Action":"fail","Package":"example.com/foo"}
        "#};
        let (results, _dir) = marshal(raw);

        assert_eq!(
            statuses(&results),
            btreemap! {
                "/src/foo_test.go::TestX" => TestStatus::Failed,
                "/src/foo_test.go::TestX::sub_case" => TestStatus::Failed,
                "/src/foo_test.go::TestY" => TestStatus::Skipped,
            },
            "file position and unreported tests are omitted"
        );

        let ids: Vec<_> = results.keys().map(PositionId::as_str).collect();
        assert_eq!(
            ids,
            vec![
                "/src/foo_test.go::TestX",
                "/src/foo_test.go::TestX::sub_case",
                "/src/foo_test.go::TestY",
            ],
            "results are in tree order"
        );

        let sub = &results[&PositionId::new("/src/foo_test.go::TestX::sub_case")];
        let fail_line = highlight("--- FAIL: TestX/sub_case (0.00s)");
        assert_eq!(
            sub.short.as_deref(),
            Some(format!("    foo_test.go:9: bad\n{fail_line}").as_str())
        );
        assert_eq!(
            sub.errors,
            vec![TestErrorLocation {
                line: 9,
                message: "bad".to_owned(),
            }]
        );
        assert_eq!(
            std::fs::read_to_string(&sub.output).expect("output file exists"),
            format!("    foo_test.go:9: bad\n{fail_line}\n")
        );

        let parent = &results[&PositionId::new("/src/foo_test.go::TestX")];
        assert_eq!(
            parent.short.as_deref(),
            Some(format!("=== RUN   TestX\n    foo_test.go:9: bad\n{fail_line}").as_str()),
            "subtest output is attributed to the parent"
        );
        assert!(parent.errors.is_empty(), "errors are not propagated");
        assert_ne!(parent.output, sub.output);
    }

    #[test]
    fn last_pass_wins() {
        let raw = indoc! {r#"
            {"Action":"run","Test":"TestX"}
            {"Action":"fail","Test":"TestX"}
            {"Action":"pass","Test":"TestX"}
        "#};
        let (results, _dir) = marshal(raw);
        assert_eq!(
            results[&PositionId::new("/src/foo_test.go::TestX")].status,
            TestStatus::Passed
        );
    }

    #[test]
    fn missing_terminal_status_is_failed() {
        let raw = indoc! {r#"
            {"Action":"run","Test":"TestX"}
            {"Action":"output","Test":"TestX","Output":"panic: boom\n"}
        "#};
        let (results, _dir) = marshal(raw);
        assert_eq!(
            results[&PositionId::new("/src/foo_test.go::TestX")].status,
            TestStatus::Failed
        );
    }

    #[test]
    fn malformed_stream_fails_everything() {
        let raw = indoc! {"
            # example.com/foo
            ./foo_test.go:3:2: undefined: nope
            FAIL\texample.com/foo [build failed]
        "};
        let (results, _dir) = marshal(raw);
        assert_eq!(results.len(), 4, "every position, including the file");
        let outputs: Vec<_> = results.values().map(|r| &r.output).collect();
        assert!(outputs.iter().all(|output| *output == outputs[0]));
        assert!(results.values().all(|r| r.status == TestStatus::Failed && r.short.is_none()));

        let log = std::fs::read_to_string(outputs[0]).expect("log file exists");
        assert_eq!(
            log.lines().collect::<Vec<_>>(),
            vec![
                "# example.com/foo".to_owned(),
                "./foo_test.go:3:2: undefined: nope".to_owned(),
                highlight("FAIL\texample.com/foo [build failed]"),
            ]
        );
    }

    #[test]
    fn package_only_stream_fails_everything() {
        let raw = indoc! {r#"
            {"Action":"start","Package":"example.com/foo"}
            {"Action":"output","Package":"example.com/foo","Output":"testing: warning: no tests to run\n"}
            {"Action":"output","Package":"example.com/foo","Output":"PASS\n"}
            {"Action":"pass","Package":"example.com/foo"}
        "#};
        let (results, _dir) = marshal(raw);
        assert_eq!(results.len(), 4);
        let first = results.values().next().expect("non-empty");
        assert!(results.values().all(|r| r.output == first.output));
        assert_eq!(
            std::fs::read_to_string(&first.output).expect("log file exists"),
            format!("testing: warning: no tests to run\n{}\n", highlight("PASS"))
        );
    }

    #[test]
    fn marshal_spec_reads_results_path() {
        let dir = Utf8TempDir::new().expect("created temp dir");
        let results_path = dir.path().join("results.json");
        std::fs::write(
            &results_path,
            "{\"Action\":\"run\",\"Test\":\"TestY\"}\n{\"Action\":\"pass\",\"Test\":\"TestY\"}\n",
        )
        .expect("wrote results");
        let spec = RunSpec {
            command: vec!["go".to_owned()],
            cwd: dir.path().to_owned(),
            context: crate::run_spec::RunContext {
                results_path,
                file: FILE.into(),
                package: "foo".to_owned(),
                position: PositionId::new(FILE),
            },
        };

        let marshaler = ResultMarshaler::new(OutputDir::new(dir.path()));
        let results = marshaler
            .marshal_spec(&spec, &sample_tree())
            .expect("marshal succeeded");
        assert_eq!(
            statuses(&results),
            btreemap! { "/src/foo_test.go::TestY" => TestStatus::Passed }
        );
    }

    #[test]
    fn unwritable_output_dir_is_an_error() {
        let dir = Utf8TempDir::new().expect("created temp dir");
        let marshaler = ResultMarshaler::new(OutputDir::new(dir.path().join("missing")));
        let error = marshaler
            .marshal("{\"Action\":\"pass\",\"Test\":\"TestY\"}\n", &sample_tree())
            .expect_err("output dir does not exist");
        assert!(matches!(error, MarshalError::WriteOutput(_)));
    }

    #[test]
    fn missing_results_path_is_an_error() {
        let dir = Utf8TempDir::new().expect("created temp dir");
        let spec = RunSpec {
            command: Vec::new(),
            cwd: dir.path().to_owned(),
            context: crate::run_spec::RunContext {
                results_path: dir.path().join("missing.json"),
                file: FILE.into(),
                package: String::new(),
                position: PositionId::new(FILE),
            },
        };
        let error = ResultMarshaler::default()
            .marshal_spec(&spec, &sample_tree())
            .expect_err("results path does not exist");
        assert!(matches!(error, MarshalError::ReadOutput { .. }));
    }
}
