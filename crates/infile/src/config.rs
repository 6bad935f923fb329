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


//! Statement configuration.
//!
//! [`LoadDataStmt`] is what a SQL front end hands to the loader once
//! `LOAD DATA LOCAL INFILE ... INTO TABLE ...` has been parsed and bound.

use infile_core::LoadFormat;

/// Default rows per commit task.
pub const DEFAULT_MAX_ROWS_IN_BATCH: u64 = 20_000;

/// Default capacity of the commit task queue.
pub const DEFAULT_TASK_QUEUE_SIZE: usize = 16;

/// Default size of one read from the input.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 64 * 1024;

/// Handling of rows that conflict on a unique key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DuplicateMode {
    /// Abort the statement.
    #[default]
    Error,
    /// Skip the new row with a warning.
    Ignore,
    /// Delete the conflicting rows, then insert.
    Replace,
}

/// Loader tuning and statement options.
///
/// # Examples
///
/// ```rust
/// use infile::{DuplicateMode, LoadConfig};
///
/// let config = LoadConfig {
///     max_rows_in_batch: 500,
///     on_duplicate: DuplicateMode::Replace,
///     ..Default::default()
/// };
/// assert_eq!(config.task_queue_size, 16);
/// assert!(config.local);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LoadConfig {
    /// Rows per commit task. Zero disables batching: one task at the end.
    pub max_rows_in_batch: u64,

    /// Commit tasks buffered between producer and worker.
    pub task_queue_size: usize,

    /// Bytes requested per read.
    pub read_buffer_size: usize,

    /// Unique key conflict policy.
    pub on_duplicate: DuplicateMode,

    /// Leading lines to discard (`IGNORE n LINES`).
    pub ignore_lines: u64,

    /// Permit writing the hidden row-id column.
    pub allow_write_row_id: bool,

    /// `LOAD DATA LOCAL`; only local loads are supported.
    pub local: bool,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            max_rows_in_batch: DEFAULT_MAX_ROWS_IN_BATCH,
            task_queue_size: DEFAULT_TASK_QUEUE_SIZE,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            on_duplicate: DuplicateMode::Error,
            ignore_lines: 0,
            allow_write_row_id: false,
            local: true,
        }
    }
}

/// An entry of the `(col_or_var, ...)` list.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ColumnOrVar {
    /// A table column.
    Column(String),
    /// A user variable, without the leading `@`.
    UserVar(String),
}

impl ColumnOrVar {
    /// Parse `@name` as a user variable and anything else as a column.
    ///
    /// ```rust
    /// use infile::ColumnOrVar;
    ///
    /// assert_eq!(ColumnOrVar::parse("@skip"), ColumnOrVar::UserVar("skip".into()));
    /// assert_eq!(ColumnOrVar::parse("id"), ColumnOrVar::Column("id".into()));
    /// ```
    pub fn parse(text: &str) -> Self {
        match text.strip_prefix('@') {
            Some(var) => ColumnOrVar::UserVar(var.to_string()),
            None => ColumnOrVar::Column(text.to_string()),
        }
    }
}

/// A `SET column = expr` assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Assignment {
    pub column: String,
    /// Expression source, interpreted by an [`ExprEvaluator`](crate::ExprEvaluator).
    pub expr: String,
}

impl Assignment {
    /// Create an assignment.
    pub fn new(column: impl Into<String>, expr: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            expr: expr.into(),
        }
    }
}

/// A bound `LOAD DATA` statement.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LoadDataStmt {
    /// Input file path.
    pub path: String,
    /// Target table name.
    pub table: String,
    /// Explicit column/variable list; empty means every column in order.
    pub columns: Vec<ColumnOrVar>,
    /// `SET` assignments.
    pub assignments: Vec<Assignment>,
    /// `FIELDS` and `LINES` clauses.
    pub format: LoadFormat,
    /// Loader options.
    pub config: LoadConfig,
}

impl LoadDataStmt {
    /// A statement with default format and options.
    pub fn new(path: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            table: table.into(),
            ..Default::default()
        }
    }

    /// Replace the format.
    pub fn with_format(mut self, format: LoadFormat) -> Self {
        self.format = format;
        self
    }

    /// Replace the options.
    pub fn with_config(mut self, config: LoadConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the column/variable list.
    pub fn with_columns<I>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = ColumnOrVar>,
    {
        self.columns = columns.into_iter().collect();
        self
    }

    /// Add a `SET` assignment.
    pub fn with_assignment(mut self, column: impl Into<String>, expr: impl Into<String>) -> Self {
        self.assignments.push(Assignment::new(column, expr));
        self
    }
}
