// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Discovery of Go tests in source files.
//!
//! Discovery happens in two stages. A syntax frontend ([`GoTestQuery`]) turns
//! Go source into a flat list of [`QueryMatch`]es, and
//! [`build_position_tree`] turns those matches into a [`PositionTree`]. The
//! second stage never looks at source text, so it can be driven by any
//! frontend producing the same captures.

mod builder;
mod go_query;
mod matches;

pub use builder::*;
pub use go_query::*;
pub use matches::*;

use crate::{
    errors::DiscoveryError,
    list::{Position, PositionTree},
};
use camino::{Utf8Path, Utf8PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Suffix of the files `go test` compiles as tests.
pub const TEST_FILE_SUFFIX: &str = "_test.go";

/// Directories `go test ./...` never descends into.
const IGNORED_DIRS: &[&str] = &["vendor", "testdata"];

/// Options that control discovery.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct DiscoveryOptions {
    /// Discover the cases of table-driven tests.
    pub table_tests: bool,
}

/// Returns true if `path` names a Go test file.
pub fn is_test_file(path: &Utf8Path) -> bool {
    path.file_name()
        .is_some_and(|name| name.ends_with(TEST_FILE_SUFFIX))
}

/// Returns true if a directory named `name` should be searched for tests.
pub fn filter_dir(name: &str) -> bool {
    !name.starts_with('.') && !name.starts_with('_') && !IGNORED_DIRS.contains(&name)
}

/// Discovers tests in files and directories.
pub struct TestDiscovery {
    query: GoTestQuery,
    options: DiscoveryOptions,
}

impl TestDiscovery {
    /// Creates a new discovery instance with the given options.
    pub fn new(options: DiscoveryOptions) -> Result<Self, DiscoveryError> {
        Ok(Self {
            query: GoTestQuery::new()?,
            options,
        })
    }

    /// Discovers tests at `path`, which may be a file or a directory.
    pub fn discover(&self, path: &Utf8Path) -> Result<PositionTree, DiscoveryError> {
        if path.is_dir() {
            self.discover_dir(path)
        } else {
            self.discover_file(path)
        }
    }

    /// Reads and discovers the tests in a single file.
    pub fn discover_file(&self, path: &Utf8Path) -> Result<PositionTree, DiscoveryError> {
        let source = std::fs::read_to_string(path).map_err(|error| DiscoveryError::ReadSource {
            path: path.to_owned(),
            error,
        })?;
        self.discover_source(path, &source)
    }

    /// Discovers the tests in `source`, the contents of the file at `path`.
    pub fn discover_source(
        &self,
        path: &Utf8Path,
        source: &str,
    ) -> Result<PositionTree, DiscoveryError> {
        let matches = self.query.matches(path, source, &self.options)?;
        debug!(%path, matches = matches.len(), "ran test query");
        Ok(build_position_tree(path, matches))
    }

    /// Discovers every test file under `root`.
    ///
    /// Files are visited in lexicographic order. Directories rejected by
    /// [`filter_dir`] are skipped along with their contents.
    pub fn discover_dir(&self, root: &Utf8Path) -> Result<PositionTree, DiscoveryError> {
        let mut files = Vec::new();
        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0
                    || !entry.file_type().is_dir()
                    || entry.file_name().to_str().is_some_and(filter_dir)
            });

        for entry in walker {
            let entry = entry.map_err(|error| DiscoveryError::WalkDir {
                root: root.to_owned(),
                error,
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = Utf8PathBuf::from_path_buf(entry.into_path())
                .map_err(|path| DiscoveryError::NonUtf8Path { path })?;
            if is_test_file(&path) {
                files.push(self.discover_file(&path)?);
            }
        }

        debug!(%root, files = files.len(), "discovered test files");
        Ok(PositionTree::from_dir(Position::dir(root), files))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::list::{PositionId, PositionKind};
    use camino_tempfile::Utf8TempDir;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test_case("foo_test.go", true; "test file")]
    #[test_case("/abs/path/foo_test.go", true; "absolute test file")]
    #[test_case("foo.go", false; "source file")]
    #[test_case("foo_test.go.orig", false; "backup file")]
    #[test_case("_test.go/foo.go", false; "test-like directory")]
    fn test_is_test_file(path: &str, expected: bool) {
        assert_eq!(is_test_file(Utf8Path::new(path)), expected);
    }

    #[test_case("pkg", true; "package")]
    #[test_case("vendor", false; "vendor")]
    #[test_case("testdata", false; "testdata")]
    #[test_case(".git", false; "hidden")]
    #[test_case("_build", false; "underscore")]
    fn test_filter_dir(name: &str, expected: bool) {
        assert_eq!(filter_dir(name), expected);
    }

    #[test]
    fn discover_dir_skips_ignored_dirs() {
        let dir = Utf8TempDir::new().expect("created temp dir");
        let root = dir.path();
        for sub in ["pkg", "vendor/dep", "testdata"] {
            std::fs::create_dir_all(root.join(sub)).expect("created dir");
        }
        let test_source = "package foo\n\nfunc TestA(t *testing.T) {}\n";
        for file in [
            "b_test.go",
            "a_test.go",
            "pkg/c_test.go",
            "vendor/dep/d_test.go",
            "testdata/e_test.go",
        ] {
            std::fs::write(root.join(file), test_source).expect("wrote file");
        }
        std::fs::write(root.join("main.go"), "package foo\n").expect("wrote file");

        let discovery = TestDiscovery::new(DiscoveryOptions::default()).expect("query compiles");
        let tree = discovery.discover(root).expect("discovery succeeded");

        assert_eq!(tree.root().kind, PositionKind::Dir);
        let files: Vec<_> = tree
            .children(&PositionId::for_path(root))
            .map(|p| p.path.strip_prefix(root).expect("under root").as_str().to_owned())
            .collect();
        assert_eq!(files, vec!["a_test.go", "b_test.go", "pkg/c_test.go"]);
        assert_eq!(tree.len(), 7, "dir, three files, one test each");
    }

    #[test]
    fn discover_missing_file_is_an_error() {
        let dir = Utf8TempDir::new().expect("created temp dir");
        let discovery = TestDiscovery::new(DiscoveryOptions::default()).expect("query compiles");
        let error = discovery
            .discover(&dir.path().join("missing_test.go"))
            .expect_err("file does not exist");
        assert!(matches!(error, DiscoveryError::ReadSource { .. }));
    }
}
