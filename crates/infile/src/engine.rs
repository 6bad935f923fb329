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


//! Collaborator interfaces.
//!
//! The loader owns no storage, type system or expression language. These
//! traits are the seams where a host database plugs them in; `infile-memory`
//! provides in-memory implementations.

use crate::datum::{Datum, Row};
use crate::error::{RowResult, StorageResult};
use crate::mapping::LoadColumns;
use crate::schema::TableSchema;
use crate::session::Session;

/// A unique key conflict found for a candidate row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    /// Key value as text, e.g. `1` or `a-b` for composite keys.
    pub key: String,
    /// Index name, `PRIMARY` for the primary key.
    pub index: String,
    /// Handle of the existing row.
    pub handle: i64,
}

/// The storage/transaction engine written to by the commit worker.
///
/// All writes between two [`commit_statement`](Self::commit_statement) calls
/// form one statement and are undone by
/// [`rollback_statement`](Self::rollback_statement).
pub trait Storage: Send + Sync {
    /// First existing row conflicting with `row` on any unique key.
    fn find_conflict(&self, row: &Row) -> StorageResult<Option<Conflict>>;

    /// Delete the row with `handle`.
    fn remove_row(&self, handle: i64) -> StorageResult<()>;

    /// Insert a row, returning its handle.
    fn add_row(&self, row: Row) -> StorageResult<i64>;

    /// Make the current statement's writes durable.
    fn commit_statement(&self) -> StorageResult<()>;

    /// Undo the current statement's writes.
    fn rollback_statement(&self);

    /// Start a fresh transaction context after a commit. Must not retry.
    fn refresh_txn(&self) -> StorageResult<()>;
}

/// Turns assembled values into a full table row.
///
/// Responsible for type coercion, defaults, generated and auto-increment
/// columns. `values` lines up with `columns`.
pub trait RowEncoder: Send + Sync {
    fn encode(&self, columns: &LoadColumns, values: Vec<Datum>) -> RowResult<Row>;
}

/// Evaluates `SET` clause expressions.
pub trait ExprEvaluator: Send + Sync {
    fn eval(&self, expr: &str, ctx: &EvalContext<'_>) -> RowResult<Datum>;
}

/// What an expression can see: user variables and the partially built row.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    pub session: &'a Session,
    pub schema: &'a TableSchema,
    pub columns: &'a LoadColumns,
    /// Values assembled so far, a prefix of `columns`.
    pub values: &'a [Datum],
}

impl<'a> EvalContext<'a> {
    /// Value of `@name`; unset variables are NULL.
    pub fn user_var(&self, name: &str) -> Datum {
        self.session.user_var(name).unwrap_or(Datum::Null)
    }

    /// Value already assembled for column `name`.
    pub fn column(&self, name: &str) -> Option<&'a Datum> {
        let pos = self.columns.position(self.schema, name)?;
        self.values.get(pos)
    }
}
