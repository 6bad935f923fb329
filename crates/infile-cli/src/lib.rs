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


//! infile CLI library.
//!
//! # Commands
//!
//! - **load**: load a delimited file into an in-memory table described by a
//!   JSON schema and print the `LOAD DATA` summary
//! - **scan**: print the lines and fields the lexer produces for a file
//!
//! # Examples
//!
//! ```no_run
//! use infile_cli::commands::{scan, ScanOptions};
//! use infile_core::LoadFormat;
//!
//! # fn main() -> Result<(), infile_cli::error::CliError> {
//! scan(&ScanOptions {
//!     file: "data.csv".into(),
//!     format: LoadFormat::csv(),
//!     limit: Some(10),
//! })?;
//! # Ok(())
//! # }
//! ```
//!
//! # Schema files
//!
//! ```json
//! {
//!   "name": "users",
//!   "columns": [
//!     { "name": "id", "type": "int", "not_null": true },
//!     { "name": "email", "type": "varchar" },
//!     { "name": "created", "type": "datetime", "default": "CURRENT_TIMESTAMP" }
//!   ],
//!   "primary_key": ["id"],
//!   "unique_keys": [{ "name": "uk_email", "columns": ["email"] }]
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod error;
