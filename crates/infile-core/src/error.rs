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

//! Error types for load format configuration.
//!
//! Lexing itself never fails: malformed quoting is recovered by treating the
//! offending byte as data. The only errors this crate reports are
//! configuration errors, detected before any input byte is processed.

use thiserror::Error;

/// Errors raised while validating a [`LoadFormat`](crate::LoadFormat).
///
/// # Examples
///
/// ```rust
/// use infile_core::{FormatError, LoadFormat};
///
/// let mut format = LoadFormat::default();
/// format.lines.terminated = Vec::new();
///
/// let err = format.validate().unwrap_err();
/// assert!(matches!(err, FormatError::EmptyLineTerminator));
/// assert!(err.to_string().contains("terminated is nil"));
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// `LINES TERMINATED BY ''` is not supported.
    #[error("Load Data: don't support load data terminated is nil")]
    EmptyLineTerminator,

    /// `FIELDS TERMINATED BY ''` is not supported.
    #[error("Load Data: don't support load data fields terminated is nil")]
    EmptyFieldTerminator,

    /// A single-byte option was given a value longer than one byte.
    #[error("Load Data: {option} must be a single byte, got {len} bytes")]
    NotSingleByte {
        /// Clause name, e.g. `ENCLOSED BY`.
        option: &'static str,
        /// Length of the rejected value.
        len: usize,
    },
}

impl FormatError {
    /// Create a single-byte violation for the given clause.
    #[inline]
    pub fn not_single_byte(option: &'static str, len: usize) -> Self {
        Self::NotSingleByte { option, len }
    }
}

/// Result type for format validation.
pub type FormatResult<T> = Result<T, FormatError>;
