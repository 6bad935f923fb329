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


//! Error types for loading.
//!
//! # Error Categories
//!
//! - **Configuration**: rejected before any byte is processed
//!   ([`LoadError::Config`], [`LoadError::Format`], column resolution errors)
//! - **Row**: [`RowError`], recoverable unless [`RowError::Fatal`]; the row is
//!   dropped and a warning recorded
//! - **Commit**: [`LoadError::DuplicateKey`], [`LoadError::Storage`]; fatal,
//!   the statement is rolled back
//! - **Cancellation**: [`LoadError::Cancelled`], [`LoadError::Interrupted`];
//!   distinguishable through [`LoadError::is_cancelled`]
//!
//! ```rust
//! use infile::{CancelSide, LoadError};
//!
//! let err = LoadError::cancelled(CancelSide::Producer);
//! assert!(err.is_cancelled());
//! assert_eq!(err.to_string(), "enqueue forced to quit");
//!
//! let err = LoadError::duplicate_key("1", "PRIMARY");
//! assert!(!err.is_cancelled());
//! ```

use infile_core::FormatError;
use std::fmt;
use thiserror::Error;

/// Pipeline side that observed a forced quit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelSide {
    /// The producer, blocked on or about to enqueue a commit task.
    Producer,
    /// The commit worker, waiting for the next task.
    Worker,
}

impl fmt::Display for CancelSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelSide::Producer => f.write_str("enqueue"),
            CancelSide::Worker => f.write_str("commit"),
        }
    }
}

/// Errors that abort a `LOAD DATA` statement.
#[derive(Error, Debug)]
pub enum LoadError {
    /// Reading the input failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid `FIELDS`/`LINES` clause.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// Statement-level configuration problem.
    #[error("Load Data: {0}")]
    Config(String),

    /// A column in the load list does not exist.
    #[error("LOAD DATA INTO {table}: unknown column {column}")]
    UnknownColumn { table: String, column: String },

    /// A column is named more than once.
    #[error("Column '{0}' specified twice")]
    DuplicateColumn(String),

    /// A generated column was named as a load target.
    #[error("The value specified for generated column '{column}' in table '{table}' is not allowed")]
    GeneratedColumn { table: String, column: String },

    /// The hidden row-id column was named without permission.
    #[error("load data statement for {0} are not supported")]
    RowIdNotAllowed(String),

    /// A unique key conflict in error mode.
    #[error("Duplicate entry '{key}' for key '{index}'")]
    DuplicateKey { key: String, index: String },

    /// The storage engine failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// A row-level error that cannot be downgraded to a warning.
    #[error("row error: {0}")]
    Row(#[from] RowError),

    /// The pipeline was force-quit while this side was waiting.
    #[error("{side} forced to quit")]
    Cancelled { side: CancelSide },

    /// The session kill flag was observed between commit tasks.
    #[error("Query execution was interrupted")]
    Interrupted,

    /// The commit worker panicked.
    #[error("commit worker panicked: {0}")]
    WorkerPanicked(String),

    /// The producer panicked while parsing or assembling rows.
    #[error("load data producer panicked: {0}")]
    ProducerPanicked(String),

    /// A task was enqueued after the queue was closed.
    #[error("commit task queue is closed")]
    QueueClosed,
}

impl LoadError {
    /// Create a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an unknown column error.
    pub fn unknown_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::UnknownColumn {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Create a generated column error.
    pub fn generated_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::GeneratedColumn {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Create a duplicate key error.
    pub fn duplicate_key(key: impl Into<String>, index: impl Into<String>) -> Self {
        Self::DuplicateKey {
            key: key.into(),
            index: index.into(),
        }
    }

    /// Create a cancellation error for one side of the pipeline.
    #[inline]
    pub fn cancelled(side: CancelSide) -> Self {
        Self::Cancelled { side }
    }

    /// True for interruption and forced-quit errors.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. } | Self::Interrupted)
    }

    /// True only for a forced quit observed by a waiting side.
    ///
    /// Such an error is a consequence of a failure elsewhere in the pipeline,
    /// never its cause.
    pub fn is_forced_quit(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// Errors raised while building one row.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RowError {
    /// A `SET` expression failed to evaluate.
    #[error("{0}")]
    Eval(String),

    /// A value could not be stored in its column.
    #[error("Incorrect value for column '{column}': {message}")]
    Value { column: String, message: String },

    /// Unrecoverable; aborts the statement.
    #[error("{0}")]
    Fatal(String),
}

impl RowError {
    /// Create an evaluation error.
    #[inline]
    pub fn eval(message: impl Into<String>) -> Self {
        Self::Eval(message.into())
    }

    /// Create a value error.
    pub fn value(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Value {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Whether the statement must abort.
    #[inline]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }
}

/// Errors reported by a [`Storage`](crate::Storage) engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// A row write failed.
    #[error("write failed: {0}")]
    Write(String),

    /// Statement commit failed.
    #[error("commit failed: {0}")]
    Commit(String),

    /// Transaction context refresh failed.
    #[error("refresh failed: {0}")]
    Refresh(String),

    /// Any other engine failure.
    #[error("{0}")]
    Backend(String),
}

/// Result type for load operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// Result type for row construction.
pub type RowResult<T> = Result<T, RowError>;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
