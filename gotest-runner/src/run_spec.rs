// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Building `go test` invocations for a selected position.

use crate::{
    config::AdapterConfig,
    errors::RunSpecError,
    list::{PositionId, PositionKind, PositionTree},
    normalize::normalize_test_name,
    source::SourceReader,
    test_output::OutputDir,
};
use camino::Utf8PathBuf;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How many lines at the head of a file are searched for the package clause.
const PACKAGE_SCAN_LINES: usize = 64;

const BUILD_CONSTRAINT_PREFIXES: &[&str] = &["//go:build", "// +build"];

/// Recursive package pattern, used for directory and file selections.
const ALL_PACKAGES: &str = "./...";

/// The package in the working directory.
const CURRENT_PACKAGE: &str = "./";

const ESCAPED_END_ANCHOR: &str = "\\$";

/// An executable `go test` command and the context needed to interpret its output.
///
/// A run spec never runs anything itself. The host executes `command` in `cwd`,
/// captures its standard output at `context.results_path`, and hands the spec
/// back to [`ResultMarshaler::marshal_spec`](crate::marshal::ResultMarshaler::marshal_spec).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RunSpec {
    /// The program followed by its arguments.
    pub command: Vec<String>,

    /// The directory to run the command in.
    pub cwd: Utf8PathBuf,

    /// Correlation data for the marshaler.
    pub context: RunContext,
}

impl RunSpec {
    /// Returns the command as arguments for direct execution, without a shell.
    ///
    /// The escaped end anchor of a `-run` pattern is unescaped, so `go test`
    /// receives `TestFoo/bar$`.
    pub fn args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(self.command.len());
        let mut after_run = false;
        for token in &self.command {
            let arg = match token.strip_suffix(ESCAPED_END_ANCHOR) {
                Some(pattern) if after_run => format!("{pattern}$"),
                _ => token.clone(),
            };
            after_run = token == "-run";
            args.push(arg);
        }
        args
    }

    /// Renders [`args`](Self::args) as a single shell line, quoting each argument.
    pub fn shell_command(&self) -> String {
        shell_words::join(self.args())
    }
}

/// Data carried alongside a [`RunSpec`] from build to marshal.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RunContext {
    /// A freshly allocated file that the command's output is captured to.
    pub results_path: Utf8PathBuf,

    /// The file or directory of the selected position.
    pub file: Utf8PathBuf,

    /// The package declared by the selected file, or empty if unknown.
    pub package: String,

    /// The selected position.
    pub position: PositionId,
}

/// Builds [`RunSpec`]s.
#[derive(Clone, Debug)]
pub struct RunSpecBuilder {
    go_binary: String,
    default_args: Vec<String>,
    extra_args: Vec<String>,
    output_dir: OutputDir,
}

impl RunSpecBuilder {
    /// Creates a new builder with the go binary and default arguments from `config`.
    pub fn new(config: &AdapterConfig) -> Self {
        Self {
            go_binary: config.go_binary().to_owned(),
            default_args: config.go_args().to_vec(),
            extra_args: Vec::new(),
            output_dir: OutputDir::system_temp(),
        }
    }

    /// Sets extra arguments, passed after the configured default arguments.
    pub fn set_extra_args(
        &mut self,
        args: impl IntoIterator<Item = impl Into<String>>,
    ) -> &mut Self {
        self.extra_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Sets where results paths are allocated.
    pub fn set_output_dir(&mut self, output_dir: OutputDir) -> &mut Self {
        self.output_dir = output_dir;
        self
    }

    /// Builds a run spec for the position `id` in `tree`.
    pub fn build(
        &self,
        tree: &PositionTree,
        id: &PositionId,
        reader: &dyn SourceReader,
    ) -> Result<RunSpec, RunSpecError> {
        let position = tree.get(id).ok_or_else(|| RunSpecError::PositionNotFound {
            id: id.clone(),
            root: tree.root().id.clone(),
        })?;

        let cwd = match position.kind {
            PositionKind::Dir => position.path.clone(),
            _ => position
                .path
                .parent()
                .unwrap_or(&position.path)
                .to_owned(),
        };

        let (tags, package) = match position.kind {
            PositionKind::Dir => (None, String::new()),
            _ => {
                let head = reader
                    .read_head(&position.path, PACKAGE_SCAN_LINES)
                    .map_err(|error| RunSpecError::ReadSource {
                        path: position.path.clone(),
                        error,
                    })?;
                let tags = head.first().and_then(|line| build_tags(line));
                (tags, package_name(&head))
            }
        };

        let mut command = vec![
            self.go_binary.clone(),
            "test".to_owned(),
            "-v".to_owned(),
            "-json".to_owned(),
        ];
        command.extend(tags);
        command.extend(self.default_args.iter().cloned());
        command.extend(self.extra_args.iter().cloned());
        match position.kind {
            PositionKind::Dir | PositionKind::File => command.push(ALL_PACKAGES.to_owned()),
            PositionKind::Namespace => command.push(CURRENT_PACKAGE.to_owned()),
            PositionKind::Test => {
                command.push("-run".to_owned());
                command.push(run_pattern(tree, id));
                command.push(CURRENT_PACKAGE.to_owned());
            }
        }

        let results_path = self
            .output_dir
            .allocate("gotest-results-", ".json")
            .map_err(|error| RunSpecError::AllocateResultsPath {
                dir: self.output_dir.display_dir().to_owned(),
                error,
            })?;

        debug!(%id, %results_path, "built run spec");
        Ok(RunSpec {
            command,
            cwd,
            context: RunContext {
                results_path,
                file: position.path.clone(),
                package,
                position: id.clone(),
            },
        })
    }
}

/// Returns the `-tags=` flag for a file whose first line is `first_line`.
///
/// Both `//go:build` and legacy `// +build` lines are recognized. The boolean
/// operators `&&` and `||` and grouping parentheses are dropped, and the
/// remaining terms are joined with commas.
pub fn build_tags(first_line: &str) -> Option<String> {
    let constraint = BUILD_CONSTRAINT_PREFIXES
        .iter()
        .find_map(|prefix| first_line.strip_prefix(prefix))?;
    let tags = constraint
        .split_whitespace()
        .map(|token| token.trim_matches(|c| c == '(' || c == ')'))
        .filter(|token| !matches!(*token, "" | "&&" | "||"))
        .join(",");
    if tags.is_empty() {
        return None;
    }
    Some(format!("-tags={tags}"))
}

/// Returns the package declared in `lines`, or an empty string.
///
/// The first line that is neither blank nor a `//` comment must be the
/// package clause.
pub fn package_name(lines: &[impl AsRef<str>]) -> String {
    let Some(line) = lines
        .iter()
        .map(|line| line.as_ref().trim())
        .find(|line| !line.is_empty() && !line.starts_with("//"))
    else {
        return String::new();
    };
    let mut tokens = line.split_whitespace();
    match (tokens.next(), tokens.next()) {
        (Some("package"), Some(name)) => name.to_owned(),
        _ => String::new(),
    }
}

/// The `-run` pattern selecting `id`: its test chain from the tree, anchored at the end.
fn run_pattern(tree: &PositionTree, id: &PositionId) -> String {
    let names = tree
        .get(id)
        .into_iter()
        .chain(tree.ancestors(id))
        .take_while(|position| position.kind == PositionKind::Test)
        .map(|position| normalize_test_name(&position.name))
        .collect_vec();
    format!("{}{ESCAPED_END_ANCHOR}", names.iter().rev().join("/"))
}
