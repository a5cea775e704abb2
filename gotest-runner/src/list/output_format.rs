// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use serde::Serialize;
use std::io;

/// How position trees, run specs and results are rendered.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum OutputFormat {
    /// Indented, optionally colorized text.
    Human {
        /// Include position ids and other details.
        verbose: bool,
    },

    /// A machine-readable document.
    Serializable(SerializableFormat),
}

impl OutputFormat {
    /// Returns the serialized format, or `None` for human output.
    pub fn serializable(self) -> Option<SerializableFormat> {
        match self {
            Self::Human { .. } => None,
            Self::Serializable(format) => Some(format),
        }
    }
}

/// A machine-readable format.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum SerializableFormat {
    /// One JSON document per line.
    Json,
    /// Indented JSON.
    JsonPretty,
}

impl SerializableFormat {
    /// Serializes `value` to `writer` without a trailing newline.
    pub fn to_writer(
        self,
        value: &impl Serialize,
        writer: impl io::Write,
    ) -> serde_json::Result<()> {
        match self {
            Self::Json => serde_json::to_writer(writer, value),
            Self::JsonPretty => serde_json::to_writer_pretty(writer, value),
        }
    }

    /// Serializes `value` to `writer` followed by a newline.
    ///
    /// With [`Json`](Self::Json), consecutive documents form a JSON Lines stream.
    pub fn write_document(
        self,
        value: &impl Serialize,
        mut writer: impl io::Write,
    ) -> serde_json::Result<()> {
        self.to_writer(value, &mut writer)?;
        writer.write_all(b"\n").map_err(serde_json::Error::io)
    }
}
