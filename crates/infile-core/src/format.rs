// Dweve Infile - Bulk Delimited Text Loading
//
// Copyright (c) 2025 Dweve IP B.V. and individual contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Statement-level format options: the `FIELDS` and `LINES` clauses.
//!
//! Defaults follow MySQL:
//!
//! ```text
//! FIELDS TERMINATED BY '\t' ENCLOSED BY '' ESCAPED BY '\\'
//! LINES  STARTING BY ''     TERMINATED BY '\n'
//! ```

use crate::error::{FormatError, FormatResult};

/// The `FIELDS ...` clause.
///
/// # Examples
///
/// ```rust
/// use infile_core::FieldsFormat;
///
/// let fields = FieldsFormat::default();
/// assert_eq!(fields.terminated, b"\t");
/// assert_eq!(fields.enclosed, None);
/// assert_eq!(fields.escaped, Some(b'\\'));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldsFormat {
    /// Byte sequence separating fields within a line. Must be non-empty.
    pub terminated: Vec<u8>,

    /// Optional quote-like byte wrapping a field.
    pub enclosed: Option<u8>,

    /// Optional byte forcing the following byte to be taken as data.
    pub escaped: Option<u8>,
}

impl Default for FieldsFormat {
    fn default() -> Self {
        Self {
            terminated: b"\t".to_vec(),
            enclosed: None,
            escaped: Some(b'\\'),
        }
    }
}

impl FieldsFormat {
    /// Set `ENCLOSED BY` from raw clause bytes. An empty value or a NUL byte
    /// disables enclosing.
    pub fn set_enclosed(&mut self, value: &[u8]) -> FormatResult<()> {
        self.enclosed = single_byte("ENCLOSED BY", value)?.filter(|&b| b != 0);
        Ok(())
    }

    /// Set `ESCAPED BY` from raw clause bytes. An empty value disables escaping.
    pub fn set_escaped(&mut self, value: &[u8]) -> FormatResult<()> {
        self.escaped = single_byte("ESCAPED BY", value)?;
        Ok(())
    }
}

/// The `LINES ...` clause.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LinesFormat {
    /// Prefix that must precede every line. Text before it is discarded.
    pub starting: Vec<u8>,

    /// Byte sequence separating records. Must be non-empty.
    pub terminated: Vec<u8>,
}

impl Default for LinesFormat {
    fn default() -> Self {
        Self {
            starting: Vec::new(),
            terminated: b"\n".to_vec(),
        }
    }
}

/// Complete lexical configuration of one `LOAD DATA` statement.
///
/// # Examples
///
/// ```rust
/// use infile_core::LoadFormat;
///
/// let format = LoadFormat::default()
///     .with_field_terminator(",")
///     .with_enclosed(b'"')
///     .with_line_terminator("\r\n");
///
/// assert!(format.validate().is_ok());
/// assert_eq!(format.fields.terminated, b",");
/// assert_eq!(format.lines.terminated, b"\r\n");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LoadFormat {
    /// Field-level options.
    pub fields: FieldsFormat,
    /// Line-level options.
    pub lines: LinesFormat,
}

impl LoadFormat {
    /// Comma separated, double-quote enclosed, LF terminated.
    pub fn csv() -> Self {
        Self::default()
            .with_field_terminator(",")
            .with_enclosed(b'"')
    }

    /// Replace the field terminator.
    pub fn with_field_terminator(mut self, term: impl AsRef<[u8]>) -> Self {
        self.fields.terminated = term.as_ref().to_vec();
        self
    }

    /// Replace the line terminator.
    pub fn with_line_terminator(mut self, term: impl AsRef<[u8]>) -> Self {
        self.lines.terminated = term.as_ref().to_vec();
        self
    }

    /// Replace the line starting marker.
    pub fn with_line_starting(mut self, starting: impl AsRef<[u8]>) -> Self {
        self.lines.starting = starting.as_ref().to_vec();
        self
    }

    /// Enclose fields with `quote`; `0` means no enclosing.
    pub fn with_enclosed(mut self, quote: u8) -> Self {
        self.fields.enclosed = (quote != 0).then_some(quote);
        self
    }

    /// Replace (or disable with `None`) the escape byte.
    pub fn with_escaped(mut self, escape: Option<u8>) -> Self {
        self.fields.escaped = escape;
        self
    }

    /// Check the options that must hold before any byte is processed.
    pub fn validate(&self) -> FormatResult<()> {
        if self.lines.terminated.is_empty() {
            return Err(FormatError::EmptyLineTerminator);
        }
        if self.fields.terminated.is_empty() {
            return Err(FormatError::EmptyFieldTerminator);
        }
        Ok(())
    }
}

fn single_byte(option: &'static str, value: &[u8]) -> FormatResult<Option<u8>> {
    match value {
        [] => Ok(None),
        [b] => Ok(Some(*b)),
        _ => Err(FormatError::not_single_byte(option, value.len())),
    }
}
