// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read access to the head of a source file.
//!
//! Building a run spec needs the first lines of the selected file, for build
//! constraints and the package clause. An editor host may hold unsaved buffer
//! contents, so this goes through [`SourceReader`] rather than the file system.

use camino::{Utf8Path, Utf8PathBuf};
use std::{
    collections::HashMap,
    fs::File,
    io::{self, BufRead, BufReader},
};

/// Reads the first lines of a source file.
pub trait SourceReader {
    /// Returns up to `count` lines from the start of the file at `path`, without line terminators.
    fn read_head(&self, path: &Utf8Path, count: usize) -> io::Result<Vec<String>>;
}

/// A [`SourceReader`] backed by the file system.
#[derive(Clone, Copy, Debug, Default)]
pub struct FsSourceReader;

impl SourceReader for FsSourceReader {
    fn read_head(&self, path: &Utf8Path, count: usize) -> io::Result<Vec<String>> {
        let reader = BufReader::new(File::open(path)?);
        reader.lines().take(count).collect()
    }
}

/// A [`SourceReader`] over in-memory contents, keyed by path.
#[derive(Clone, Debug, Default)]
pub struct InMemorySourceReader {
    sources: HashMap<Utf8PathBuf, String>,
}

impl InMemorySourceReader {
    /// Creates an empty reader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the contents of `path`, replacing any previous contents.
    pub fn insert(&mut self, path: impl Into<Utf8PathBuf>, contents: impl Into<String>) {
        self.sources.insert(path.into(), contents.into());
    }
}

impl SourceReader for InMemorySourceReader {
    fn read_head(&self, path: &Utf8Path, count: usize) -> io::Result<Vec<String>> {
        let contents = self.sources.get(path).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no source for `{path}`"))
        })?;
        Ok(contents
            .lines()
            .take(count)
            .map(str::to_owned)
            .collect())
    }
}
