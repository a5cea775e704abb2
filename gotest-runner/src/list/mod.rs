// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Support for building and querying trees of test positions.
//!
//! The main data structures in this module are:
//! * [`Position`] and [`PositionId`] for a single addressable test, file or directory
//! * [`PositionTree`] for the hierarchy of positions discovered in a file or directory

mod output_format;
mod position;
mod tree;

pub use output_format::*;
pub use position::*;
pub use tree::*;
