// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Files holding captured test output.
//!
//! Every file is freshly allocated with a unique name and kept on disk after
//! the process that created it goes away: the host opens them after marshaling
//! returns.

use crate::errors::WriteOutputError;
use camino::{Utf8Path, Utf8PathBuf};
use camino_tempfile::{Builder, NamedUtf8TempFile};
use std::io::{self, Write};

/// Where output files are allocated.
#[derive(Clone, Debug, Default)]
pub struct OutputDir {
    dir: Option<Utf8PathBuf>,
}

impl OutputDir {
    /// Allocates files in the given directory.
    pub fn new(dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }

    /// Allocates files in the system temp directory.
    pub fn system_temp() -> Self {
        Self::default()
    }

    /// Returns the configured directory, if any.
    pub fn dir(&self) -> Option<&Utf8Path> {
        self.dir.as_deref()
    }

    /// Creates an empty file that is kept on disk, and returns its path.
    pub fn allocate(&self, prefix: &str, suffix: &str) -> io::Result<Utf8PathBuf> {
        self.tempfile(prefix, suffix)?
            .into_temp_path()
            .keep()
            .map_err(|err| err.error)
    }

    fn tempfile(&self, prefix: &str, suffix: &str) -> io::Result<NamedUtf8TempFile> {
        let mut builder = Builder::new();
        builder.prefix(prefix).suffix(suffix);
        match &self.dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
    }

    /// Writes `lines` to a new file, one per line, and returns its path.
    pub fn write_lines<S: AsRef<str>>(
        &self,
        lines: &[S],
    ) -> Result<Utf8PathBuf, WriteOutputError> {
        self.write_lines_imp(lines)
            .map_err(|error| WriteOutputError::new(self.display_dir(), error))
    }

    fn write_lines_imp<S: AsRef<str>>(&self, lines: &[S]) -> io::Result<Utf8PathBuf> {
        self.write_with("gotest-output-", ".log", |writer| {
            for line in lines {
                writeln!(writer, "{}", line.as_ref())?;
            }
            Ok(())
        })
    }

    /// Writes a new file with `write`. The file is only kept on disk if `write`
    /// and the final flush succeed.
    fn write_with(
        &self,
        prefix: &str,
        suffix: &str,
        write: impl FnOnce(&mut dyn Write) -> io::Result<()>,
    ) -> io::Result<Utf8PathBuf> {
        let mut file = self.tempfile(prefix, suffix)?;
        let mut writer = io::BufWriter::new(&mut file);
        write(&mut writer)?;
        writer.flush()?;
        drop(writer);

        let (_, path) = file.keep().map_err(|err| err.error)?;
        Ok(path)
    }

    pub(crate) fn display_dir(&self) -> &Utf8Path {
        self.dir().unwrap_or(Utf8Path::new("<temp>"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino_tempfile::Utf8TempDir;
    use pretty_assertions::assert_eq;

    #[test]
    fn write_lines_creates_distinct_files() {
        let dir = Utf8TempDir::new().expect("created temp dir");
        let output_dir = OutputDir::new(dir.path());

        let first = output_dir.write_lines(&["a", "b"]).expect("wrote file");
        let second = output_dir.write_lines(&["a", "b"]).expect("wrote file");

        assert_ne!(first, second);
        assert!(first.starts_with(dir.path()));
        assert_eq!(
            std::fs::read_to_string(&first).expect("read file"),
            "a\nb\n"
        );
    }

    #[test]
    fn failed_write_leaves_no_file() {
        let dir = Utf8TempDir::new().expect("created temp dir");
        let output_dir = OutputDir::new(dir.path());

        let error = output_dir
            .write_with("gotest-output-", ".log", |writer| {
                writeln!(writer, "partial")?;
                Err(io::Error::other("disk full"))
            })
            .expect_err("write failed");
        assert_eq!(error.to_string(), "disk full");
        assert_eq!(
            std::fs::read_dir(dir.path()).expect("read dir").count(),
            0,
            "partially written file was removed"
        );
    }

    #[test]
    fn missing_dir_is_an_error() {
        let dir = Utf8TempDir::new().expect("created temp dir");
        let missing = dir.path().join("missing");
        let error = OutputDir::new(&missing)
            .write_lines(&["x"])
            .expect_err("directory does not exist");
        assert_eq!(error.dir(), missing.as_path());
    }
}
