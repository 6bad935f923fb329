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


//! In-memory collaborators for the `infile` loader.
//!
//! - [`MemStorage`]: a keyed table with statement rollback and fault
//!   injection
//! - [`SchemaRowEncoder`]: type coercion, defaults, auto-increment and
//!   `NOT NULL` checks driven by a [`TableSchema`](infile::TableSchema)
//! - [`SimpleEvaluator`]: `SET` expressions over user variables and columns
//!
//! # Example
//!
//! ```rust
//! use infile::{Column, ColumnType, LoadDataExec, LoadDataStmt, LoadFormat, Session, TableSchema};
//! use infile_memory::{MemStorage, SchemaRowEncoder, SimpleEvaluator};
//! use std::io::Cursor;
//! use std::sync::Arc;
//!
//! let schema = Arc::new(
//!     TableSchema::new(
//!         "t",
//!         vec![
//!             Column::new("id", ColumnType::Int),
//!             Column::new("name", ColumnType::Varchar),
//!         ],
//!     )
//!     .with_primary_key(["id"]),
//! );
//! let storage = Arc::new(MemStorage::new(schema.clone()));
//!
//! let exec = LoadDataExec::new(
//!     LoadDataStmt::new("data.csv", "t").with_format(LoadFormat::csv()),
//!     schema.clone(),
//!     Arc::new(Session::new()),
//!     storage.clone(),
//!     Arc::new(SchemaRowEncoder::new(schema)),
//!     Arc::new(SimpleEvaluator::new()),
//! );
//! let summary = exec.execute(Cursor::new(b"1,foo\n2,\\N\n")).unwrap();
//!
//! assert_eq!(summary.message, "Records: 2  Deleted: 0  Skipped: 0  Warnings: 0");
//! assert_eq!(storage.len(), 2);
//! ```

mod encoder;
mod expr;
mod storage;

pub use encoder::{coerce, SchemaRowEncoder};
pub use expr::{parse_expr, Expr, ExprError, SimpleEvaluator};
pub use storage::MemStorage;
