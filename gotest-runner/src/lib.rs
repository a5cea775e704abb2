// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core functionality for running Go tests on behalf of an editor or test UI.
//!
//! The crate is split along the path a test run takes:
//!
//! 1. [`discovery`] turns the tree-sitter matches for a `_test.go` file into a
//!    [`PositionTree`](list::PositionTree) of addressable tests.
//! 2. [`run_spec`] turns a selected position into a `go test -json` command line.
//! 3. [`marshal`] turns the captured output of that command back into per-position
//!    results.
//!
//! [`normalize`] holds the string transforms shared by all three.

#![warn(missing_docs)]

pub mod config;
pub mod discovery;
pub mod errors;
pub mod list;
pub mod marshal;
pub mod normalize;
pub mod run_spec;
pub mod source;
pub mod test_output;
