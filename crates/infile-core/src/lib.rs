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

//! Lexer for MySQL-compatible `LOAD DATA` input.
//!
//! This crate turns raw bytes into lines and lines into fields under the
//! `FIELDS TERMINATED BY / ENCLOSED BY / ESCAPED BY` and
//! `LINES STARTING BY / TERMINATED BY` rules. It has no knowledge of tables
//! or transactions; see the `infile` crate for the ingestion pipeline.
//!
//! # Quick Start
//!
//! ```rust
//! use infile_core::{lex::{scan_fields, LineSplitter}, LoadFormat};
//!
//! let format = LoadFormat::csv();
//! format.validate().unwrap();
//!
//! let splitter = LineSplitter::new(&format);
//! let split = splitter.split(b"\"a,b\",c\nleft", false);
//!
//! let fields = scan_fields(split.line.unwrap(), &format.fields);
//! assert_eq!(fields[0].bytes, b"a,b");
//! assert_eq!(fields[1].bytes, b"c");
//! assert_eq!(split.rest, b"left");
//! ```
//!
//! # Features
//!
//! - `serde`: derive `Serialize`/`Deserialize` for the format types.

mod error;
mod format;
pub mod lex;

pub use error::{FormatError, FormatResult};
pub use format::{FieldsFormat, LinesFormat, LoadFormat};
pub use lex::{Field, FieldScanner, LineSplit, LineSplitter};
