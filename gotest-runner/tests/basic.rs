// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end checks against the Go fixture module in `fixtures/go-tests`.

use camino::{Utf8Path, Utf8PathBuf};
use camino_tempfile::Utf8TempDir;
use gotest_runner::{
    config::{AdapterConfig, ConfigExperimental},
    discovery::{DiscoveryOptions, TestDiscovery},
    list::{PositionId, PositionKind, PositionTree},
    marshal::{ResultMarshaler, TestStatus},
    run_spec::RunSpecBuilder,
    source::FsSourceReader,
    test_output::OutputDir,
};
use maplit::btreemap;
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;

fn fixtures_dir() -> Utf8PathBuf {
    Utf8Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .expect("crate is in a workspace")
        .join("fixtures")
}

fn go_tests_dir() -> Utf8PathBuf {
    fixtures_dir().join("go-tests")
}

fn calc_test_file() -> Utf8PathBuf {
    go_tests_dir().join("calc/calc_test.go")
}

fn discover(path: &Utf8Path, table_tests: bool) -> PositionTree {
    TestDiscovery::new(DiscoveryOptions { table_tests })
        .expect("query compiles")
        .discover(path)
        .expect("discovery succeeded")
}

/// Ids relative to `root`, so expectations don't depend on the checkout location.
fn relative_ids(tree: &PositionTree, root: &Utf8Path) -> Vec<String> {
    tree.iter()
        .map(|p| {
            p.id.as_str()
                .strip_prefix(root.as_str())
                .expect("ids start with the root path")
                .to_owned()
        })
        .collect()
}

#[test]
fn discover_fixture_module() {
    let root = go_tests_dir();
    let tree = discover(&root, true);

    assert_eq!(
        relative_ids(&tree, &root),
        vec![
            "",
            "/calc/calc_test.go",
            "/calc/calc_test.go::TestAdd",
            "/calc/calc_test.go::TestAdd::small_numbers",
            "/calc/calc_test.go::TestAdd::negative",
            "/calc/calc_test.go::TestAdd::negative::both_sides",
            "/calc/calc_test.go::TestDiv",
            "/calc/calc_test.go::TestDiv::exact",
            "/calc/calc_test.go::TestDiv::truncates",
            "/calc/calc_test.go::TestSkipped",
            "/calc/calc_test.go::ExampleAdd",
            "/calc/integration_test.go",
            "/calc/integration_test.go::TestIntegration",
        ],
        "testdata and vendor are skipped"
    );
}

#[test]
fn table_tests_follow_config() {
    let file = calc_test_file();
    let config = AdapterConfig::default_config();
    let without = TestDiscovery::new(config.discovery_options())
        .expect("query compiles")
        .discover(&file)
        .expect("discovery succeeded");
    assert!(
        without
            .get(&PositionId::new(format!("{file}::TestDiv::exact")))
            .is_none()
    );

    let config = config.with_experimental([ConfigExperimental::TableTests]);
    let with = TestDiscovery::new(config.discovery_options())
        .expect("query compiles")
        .discover(&file)
        .expect("discovery succeeded");
    assert!(
        with.get(&PositionId::new(format!("{file}::TestDiv::exact")))
            .is_some()
    );
}

#[test]
fn build_run_specs() {
    let temp = Utf8TempDir::new().expect("created temp dir");
    let mut builder = RunSpecBuilder::new(&AdapterConfig::default_config());
    builder.set_output_dir(OutputDir::new(temp.path()));

    let root = go_tests_dir();
    let tree = discover(&root, false);
    let calc_dir = root.join("calc");

    let subtest = PositionId::new(format!("{}::TestAdd::negative::both_sides", calc_test_file()));
    let spec = builder
        .build(&tree, &subtest, &FsSourceReader)
        .expect("run spec built");
    assert_eq!(
        spec.command,
        vec!["go", "test", "-v", "-json", "-run", "TestAdd/negative/both_sides\\$", "./"]
    );
    assert_eq!(spec.cwd, calc_dir);
    assert_eq!(spec.context.package, "calc");

    let tagged = PositionId::new(format!("{calc_dir}/integration_test.go::TestIntegration"));
    let spec = builder
        .build(&tree, &tagged, &FsSourceReader)
        .expect("run spec built");
    assert_eq!(
        spec.command,
        vec![
            "go",
            "test",
            "-v",
            "-json",
            "-tags=integration,linux",
            "-run",
            "TestIntegration\\$",
            "./",
        ]
    );
    assert_eq!(spec.context.package, "calc_test");

    let spec = builder
        .build(&tree, &PositionId::for_path(&root), &FsSourceReader)
        .expect("run spec built");
    assert_eq!(spec.command, vec!["go", "test", "-v", "-json", "./..."]);
    assert_eq!(spec.cwd, root);
    assert_eq!(tree.root().kind, PositionKind::Dir);
}

#[test]
fn marshal_captured_output() {
    let temp = Utf8TempDir::new().expect("created temp dir");
    let file = calc_test_file();
    let tree = discover(&file, true);
    let raw = std::fs::read_to_string(fixtures_dir().join("outputs/calc.json"))
        .expect("read captured output");

    let results = ResultMarshaler::new(OutputDir::new(temp.path()))
        .marshal(&raw, &tree)
        .expect("marshal succeeded");

    let statuses: BTreeMap<_, _> = results
        .iter()
        .map(|(id, result)| {
            let name = id
                .as_str()
                .strip_prefix(file.as_str())
                .expect("ids start with the file path")
                .to_owned();
            (name, result.status)
        })
        .collect();
    assert_eq!(
        statuses,
        btreemap! {
            "::TestAdd".to_owned() => TestStatus::Failed,
            "::TestAdd::small_numbers".to_owned() => TestStatus::Passed,
            "::TestAdd::negative".to_owned() => TestStatus::Failed,
            "::TestAdd::negative::both_sides".to_owned() => TestStatus::Failed,
            "::TestDiv".to_owned() => TestStatus::Passed,
            "::TestDiv::exact".to_owned() => TestStatus::Passed,
            "::TestDiv::truncates".to_owned() => TestStatus::Passed,
            "::TestSkipped".to_owned() => TestStatus::Skipped,
            "::ExampleAdd".to_owned() => TestStatus::Passed,
        }
    );

    let leaf = &results[&PositionId::new(format!("{file}::TestAdd::negative::both_sides"))];
    assert_eq!(leaf.errors.len(), 1);
    assert_eq!(leaf.errors[0].line, 17);

    // Skip messages match the location pattern but only failures carry errors.
    let skipped = &results[&PositionId::new(format!("{file}::TestSkipped"))];
    assert!(skipped.errors.is_empty());

    let add = &results[&PositionId::new(format!("{file}::TestAdd"))];
    let short = add.short.as_deref().expect("records have a short summary");
    assert!(short.contains("calc_test.go:17: Add(-1, -2) = -3, want -4"));
    assert!(short.contains("=== RUN   TestAdd/negative/both_sides"));
}
