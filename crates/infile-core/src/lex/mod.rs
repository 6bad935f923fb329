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

//! Lexical analysis of `LOAD DATA` input.
//!
//! Components, leaf first:
//!
//! - [`terminator`]: terminator classification with longest-prefix ordering
//!   and escape pair decoding
//! - [`field`]: the per-line [`FieldScanner`] and the [`Field`] model
//! - [`line`]: the [`LineSplitter`] that carves complete lines out of a
//!   possibly partial buffer
//!
//! # Example
//!
//! ```rust
//! use infile_core::lex::{scan_fields, LineSplitter};
//! use infile_core::LoadFormat;
//!
//! let format = LoadFormat::csv();
//! let splitter = LineSplitter::new(&format);
//!
//! let mut data: &[u8] = b"1,foo\n2,\\N\n";
//! let mut rows = Vec::new();
//! loop {
//!     let split = splitter.split(data, false);
//!     let Some(line) = split.line else { break };
//!     rows.push(scan_fields(line, &format.fields));
//!     data = split.rest;
//! }
//!
//! assert_eq!(rows.len(), 2);
//! assert_eq!(rows[0][1].bytes, b"foo");
//! assert!(rows[1][1].is_null());
//! ```

pub mod field;
pub mod line;
pub mod terminator;

pub use field::{scan_fields, Field, FieldScanner};
pub use line::{LineSplit, LineSplitter};
pub use terminator::{decode_escape, Escaped, TermKind, Terminators};
