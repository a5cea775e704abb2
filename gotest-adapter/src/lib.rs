// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A command-line host for Go tests.
//!
//! `gotest-adapter` discovers tests in Go source with tree-sitter, builds
//! `go test -json` invocations for a selected test, file or directory, runs
//! them, and marshals the captured event stream into per-test results.

#![warn(missing_docs)]

mod dispatch;
mod errors;
mod exit_codes;
mod output;

#[doc(hidden)]
pub use dispatch::*;
#[doc(hidden)]
pub use errors::*;
pub use exit_codes::GotestExitCode;
#[doc(hidden)]
pub use output::{OutputContext, StderrStyles};
