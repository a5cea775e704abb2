// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{exit_codes::GotestExitCode, output::StderrStyles};
use camino::Utf8PathBuf;
use gotest_runner::{
    errors::{ConfigParseError, DiscoveryError, MarshalError, RunSpecError},
    list::PositionId,
};
use owo_colors::OwoColorize;
use std::error::Error;
use thiserror::Error;
use tracing::error;

pub(crate) type Result<T, E = ExpectedError> = std::result::Result<T, E>;

// The #[error()] strings are placeholder messages. Errors are printed with
// display_to_stderr, which colorizes them.

/// An error that is expected to occur and is reported without a backtrace.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("could not read the current directory")]
    CurrentDirInvalid {
        #[source]
        err: std::io::Error,
    },
    #[error("could not resolve path `{path}`")]
    PathResolveFailed {
        path: Utf8PathBuf,
        #[source]
        err: std::io::Error,
    },
    #[error("config parse error")]
    ConfigParseError {
        #[from]
        err: ConfigParseError,
    },
    #[error("discovery error")]
    DiscoveryError {
        #[from]
        err: DiscoveryError,
    },
    #[error("position not found")]
    PositionNotFound { id: PositionId, root: PositionId },
    #[error("run spec build error")]
    RunSpecBuildError {
        #[from]
        err: RunSpecError,
    },
    #[error("go test exec failed")]
    GoTestExecFailed {
        command: String,
        #[source]
        err: std::io::Error,
    },
    #[error("error reading captured output")]
    ReadCapturedOutput {
        path: Utf8PathBuf,
        #[source]
        err: std::io::Error,
    },
    #[error("marshal error")]
    MarshalError {
        #[from]
        err: MarshalError,
    },
    #[error("error writing to output")]
    WriteOutput {
        #[source]
        err: std::io::Error,
    },
    #[error("error serializing output")]
    SerializeOutput {
        #[source]
        err: serde_json::Error,
    },
    #[error("test run failed")]
    TestRunFailed { failed: usize, total: usize },
}

impl ExpectedError {
    pub(crate) fn go_test_exec_failed(command: String, err: std::io::Error) -> Self {
        Self::GoTestExecFailed { command, err }
    }

    pub(crate) fn write_output(err: std::io::Error) -> Self {
        Self::WriteOutput { err }
    }

    pub(crate) fn serialize_output(err: serde_json::Error) -> Self {
        // serde_json wraps I/O errors from the writer; report those as write failures.
        if err.is_io() {
            Self::WriteOutput { err: err.into() }
        } else {
            Self::SerializeOutput { err }
        }
    }

    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::CurrentDirInvalid { .. }
            | Self::PathResolveFailed { .. }
            | Self::ConfigParseError { .. }
            | Self::PositionNotFound { .. }
            | Self::RunSpecBuildError { .. } => GotestExitCode::SETUP_ERROR,
            Self::DiscoveryError { .. } => GotestExitCode::DISCOVERY_FAILED,
            Self::GoTestExecFailed { .. } => GotestExitCode::GO_TEST_EXEC_FAILED,
            Self::MarshalError {
                err: MarshalError::WriteOutput(_),
            }
            | Self::WriteOutput { .. }
            | Self::SerializeOutput { .. } => GotestExitCode::WRITE_OUTPUT_ERROR,
            Self::ReadCapturedOutput { .. } | Self::MarshalError { .. } => {
                GotestExitCode::MARSHAL_FAILED
            }
            Self::TestRunFailed { .. } => GotestExitCode::TEST_RUN_FAILED,
        }
    }

    /// Displays this error to stderr.
    pub fn display_to_stderr(&self, styles: &StderrStyles) {
        let mut next_error = match &self {
            Self::CurrentDirInvalid { err } => {
                error!("could not read the current directory");
                Some(err as &dyn Error)
            }
            Self::PathResolveFailed { path, err } => {
                error!("could not resolve path `{}`", path.style(styles.bold));
                Some(err as &dyn Error)
            }
            Self::ConfigParseError { err } => {
                error!(
                    "failed to parse gotest config at `{}`",
                    err.config_file().style(styles.bold)
                );
                err.source()
            }
            Self::DiscoveryError { err } => {
                error!("{err}");
                err.source()
            }
            Self::PositionNotFound { id, root } => {
                error!(
                    "position `{}` not found under `{}`",
                    id.style(styles.bold),
                    root.style(styles.bold)
                );
                None
            }
            Self::RunSpecBuildError { err } => {
                error!("failed to build go test command");
                Some(err as &dyn Error)
            }
            Self::GoTestExecFailed { command, err } => {
                error!("failed to execute `{}`", command.style(styles.bold));
                Some(err as &dyn Error)
            }
            Self::ReadCapturedOutput { path, err } => {
                error!("failed to read captured output at `{}`", path.style(styles.bold));
                Some(err as &dyn Error)
            }
            Self::MarshalError { err } => {
                error!("failed to marshal test results");
                Some(err as &dyn Error)
            }
            Self::WriteOutput { err } => {
                error!("failed to write output");
                Some(err as &dyn Error)
            }
            Self::SerializeOutput { err } => {
                error!("failed to serialize output");
                Some(err as &dyn Error)
            }
            Self::TestRunFailed { failed, total } => {
                error!(
                    "test run failed: {} of {} {} failed",
                    failed.style(styles.failed),
                    total.style(styles.bold),
                    if *total == 1 { "test" } else { "tests" },
                );
                None
            }
        };

        while let Some(err) = next_error {
            error!(target: crate::output::NO_HEADING_TARGET, "\nCaused by:\n  {}", err);
            next_error = err.source();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io;

    #[test]
    fn exit_codes() {
        let write = ExpectedError::write_output(io::Error::other("disk full"));
        assert_eq!(write.process_exit_code(), GotestExitCode::WRITE_OUTPUT_ERROR);

        let exec = ExpectedError::go_test_exec_failed(
            "go test -v -json ./...".to_owned(),
            io::Error::from(io::ErrorKind::NotFound),
        );
        assert_eq!(exec.process_exit_code(), GotestExitCode::GO_TEST_EXEC_FAILED);

        let read = ExpectedError::MarshalError {
            err: MarshalError::ReadOutput {
                path: "/tmp/gotest-results.json".into(),
                error: io::Error::from(io::ErrorKind::NotFound),
            },
        };
        assert_eq!(read.process_exit_code(), GotestExitCode::MARSHAL_FAILED);

        let failed = ExpectedError::TestRunFailed {
            failed: 1,
            total: 3,
        };
        assert_eq!(failed.process_exit_code(), GotestExitCode::TEST_RUN_FAILED);
    }

    #[test]
    fn serialize_io_errors_are_write_errors() {
        struct Broken;
        impl io::Write for Broken {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::from(io::ErrorKind::BrokenPipe))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let err = serde_json::to_writer(Broken, &["a"]).expect_err("writer is broken");
        assert_eq!(
            ExpectedError::serialize_output(err).process_exit_code(),
            GotestExitCode::WRITE_OUTPUT_ERROR
        );
    }
}
