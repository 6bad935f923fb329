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


//! Bulk ingestion of delimited text (`LOAD DATA LOCAL INFILE`).
//!
//! Bytes are split into lines and fields by [`infile_core`], assembled into
//! rows against a table schema, batched, and committed by a single worker
//! thread through a bounded queue.
//!
//! # Architecture
//!
//! ```text
//! reader --chunks--> LoadData --------------------> CommitWorker --> Storage
//!                    | LineSplitter                  | duplicate check
//!                    | scan_fields                   | insert
//!                    | RecordAssembler               | commit + refresh
//!                    +--CommitTask--> [bounded queue] ---+
//! ```
//!
//! - [`LoadDataExec`] drives one statement end to end
//! - [`LoadData`] is the producer: [`insert_data`](LoadData::insert_data)
//!   and [`enqueue_task`](LoadData::enqueue_task)
//! - [`CommitWorker`] is the consumer
//! - [`QuitSignal`] cancels both sides; either side may fire it
//!
//! The host database supplies a [`Storage`] engine, a [`RowEncoder`] and an
//! [`ExprEvaluator`].
//!
//! # Guarantees
//!
//! - Commit tasks reach storage in the order they were produced.
//! - At most `task_queue_size` batches wait for commit; the producer blocks
//!   beyond that.
//! - Any error fires the quit signal, which unblocks a waiting producer or
//!   worker, and rolls back the uncommitted statement. Earlier batches stay
//!   committed.
//! - A worker panic is caught and reported as [`LoadError::WorkerPanicked`];
//!   a panic while parsing is reported as [`LoadError::ProducerPanicked`].

mod assembler;
mod config;
mod datum;
mod engine;
mod error;
mod exec;
mod loader;
mod mapping;
mod pipeline;
mod schema;
mod session;
mod worker;

pub use assembler::RecordAssembler;
pub use config::{
    Assignment, ColumnOrVar, DuplicateMode, LoadConfig, LoadDataStmt, DEFAULT_MAX_ROWS_IN_BATCH,
    DEFAULT_READ_BUFFER_SIZE, DEFAULT_TASK_QUEUE_SIZE,
};
pub use datum::{Datum, Row};
pub use engine::{Conflict, EvalContext, ExprEvaluator, RowEncoder, Storage};
pub use error::{
    CancelSide, LoadError, LoadResult, RowError, RowResult, StorageError, StorageResult,
};
pub use exec::{LoadDataExec, LoadSummary, PreparedLoad};
pub use loader::LoadData;
pub use mapping::{FieldMapping, LoadColumn, LoadColumns, MappingTarget};
pub use pipeline::{task_queue, CommitTask, QuitSignal, TaskReceiver, TaskSender};
pub use schema::{Column, ColumnType, TableSchema, UniqueKey, PRIMARY_KEY_NAME, ROW_ID_COLUMN};
pub use session::{LoadGuard, Session, StatementContext, Warning, MAX_STORED_WARNINGS};
pub use worker::CommitWorker;

pub use infile_core::{LoadFormat, FieldsFormat, LinesFormat};
