// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Documented exit codes for `gotest-adapter` failures.
///
/// Unknown/unexpected failures will always result in exit code 1.
pub enum GotestExitCode {}

impl GotestExitCode {
    /// No errors occurred and the adapter exited normally.
    pub const OK: i32 = 0;

    /// One or more tests failed.
    pub const TEST_RUN_FAILED: i32 = 100;

    /// The `go test` process could not be started.
    pub const GO_TEST_EXEC_FAILED: i32 = 101;

    /// Discovering tests in source files produced an error.
    pub const DISCOVERY_FAILED: i32 = 104;

    /// Captured output could not be read or marshaled.
    pub const MARSHAL_FAILED: i32 = 106;

    /// Writing data to stdout, stderr or an output file produced an error.
    pub const WRITE_OUTPUT_ERROR: i32 = 110;

    /// A user issue happened while setting up a gotest-adapter invocation.
    pub const SETUP_ERROR: i32 = 96;
}
