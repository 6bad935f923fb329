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


//! Keyed in-memory table with a statement undo log.
//!
//! Rows are kept by handle in a `BTreeMap`; every unique key (primary key
//! first) has a hash index from key text to handle. Writes made since the
//! last [`commit_statement`](Storage::commit_statement) are recorded in an
//! undo log so [`rollback_statement`](Storage::rollback_statement) can
//! restore the table exactly.
//!
//! # Handles
//!
//! - When the primary key is a single integer column, its value is the
//!   handle.
//! - Otherwise a row one value longer than the schema carries an explicit
//!   handle as its trailing [`Datum::Int`] (written through `_rowid`).
//! - Otherwise the next value of an internal counter is used.
//!
//! # Fault injection
//!
//! Call counters are 1-based and count across the storage's lifetime:
//!
//! ```rust
//! use infile::{Column, ColumnType, Storage, TableSchema};
//! use infile_memory::MemStorage;
//! use std::sync::Arc;
//!
//! let schema = Arc::new(TableSchema::new("t", vec![Column::new("a", ColumnType::Int)]));
//! let storage = MemStorage::new(schema).fail_commit_at(2);
//!
//! assert!(storage.commit_statement().is_ok());
//! assert!(storage.commit_statement().is_err());
//! ```

use crossbeam_channel::Receiver;
use infile::{Conflict, Datum, Row, Storage, StorageError, StorageResult, TableSchema};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// How long a gated commit waits before failing.
const GATE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug)]
enum Undo {
    Inserted(i64),
    Removed(i64, Row),
}

#[derive(Debug, Default)]
struct TableState {
    rows: BTreeMap<i64, Row>,
    /// One index per key, parallel to `MemStorage::keys`.
    indexes: Vec<HashMap<String, i64>>,
    undo: Vec<Undo>,
    /// Rows inserted by the open statement, in insert order.
    pending: Vec<Row>,
    commit_log: Vec<Vec<Row>>,
    next_handle: i64,
}

#[derive(Debug, Default)]
struct Faults {
    fail_insert_at: Option<u64>,
    panic_at_insert: Option<u64>,
    fail_commit_at: Option<u64>,
    fail_refresh_at: Option<u64>,
    commit_gate: Option<Receiver<()>>,
}

/// An in-memory [`Storage`] for one table.
#[derive(Debug)]
pub struct MemStorage {
    schema: Arc<TableSchema>,
    keys: Vec<(String, Vec<usize>)>,
    state: Mutex<TableState>,
    faults: Faults,
    inserts: AtomicU64,
    commits: AtomicU64,
    refreshes: AtomicU64,
    rollbacks: AtomicU64,
}

impl MemStorage {
    /// An empty table.
    pub fn new(schema: Arc<TableSchema>) -> Self {
        let keys = schema.keys();
        let state = TableState {
            indexes: vec![HashMap::new(); keys.len()],
            next_handle: 1,
            ..TableState::default()
        };
        Self {
            schema,
            keys,
            state: Mutex::new(state),
            faults: Faults::default(),
            inserts: AtomicU64::new(0),
            commits: AtomicU64::new(0),
            refreshes: AtomicU64::new(0),
            rollbacks: AtomicU64::new(0),
        }
    }

    /// Fail the n-th `add_row` with a write error.
    pub fn fail_insert_at(mut self, n: u64) -> Self {
        self.faults.fail_insert_at = Some(n);
        self
    }

    /// Panic in the n-th `add_row`.
    pub fn panic_at_insert(mut self, n: u64) -> Self {
        self.faults.panic_at_insert = Some(n);
        self
    }

    /// Fail the n-th `commit_statement`.
    pub fn fail_commit_at(mut self, n: u64) -> Self {
        self.faults.fail_commit_at = Some(n);
        self
    }

    /// Fail the n-th `refresh_txn`.
    pub fn fail_refresh_at(mut self, n: u64) -> Self {
        self.faults.fail_refresh_at = Some(n);
        self
    }

    /// Block every commit until a message arrives on `gate`.
    pub fn with_commit_gate(mut self, gate: Receiver<()>) -> Self {
        self.faults.commit_gate = Some(gate);
        self
    }

    /// The table definition.
    pub fn schema(&self) -> &Arc<TableSchema> {
        &self.schema
    }

    /// Current rows in handle order.
    pub fn rows(&self) -> Vec<Row> {
        self.state.lock().rows.values().cloned().collect()
    }

    /// Current rows with their handles.
    pub fn rows_with_handles(&self) -> Vec<(i64, Row)> {
        self.state
            .lock()
            .rows
            .iter()
            .map(|(handle, row)| (*handle, row.clone()))
            .collect()
    }

    /// Rows inserted by each committed statement, oldest first.
    pub fn commit_log(&self) -> Vec<Vec<Row>> {
        self.state.lock().commit_log.clone()
    }

    /// Number of rows in the table.
    pub fn len(&self) -> usize {
        self.state.lock().rows.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.state.lock().rows.is_empty()
    }

    /// Successful statement commits.
    pub fn commits(&self) -> usize {
        self.state.lock().commit_log.len()
    }

    /// Statement rollbacks performed.
    pub fn rollbacks(&self) -> u64 {
        self.rollbacks.load(Ordering::SeqCst)
    }

    fn key_text(&self, row: &[Datum], cols: &[usize]) -> Option<String> {
        let mut parts = Vec::with_capacity(cols.len());
        for &idx in cols {
            match row.get(idx) {
                Some(Datum::Null) | None => return None,
                Some(value) => parts.push(value.to_text()),
            }
        }
        Some(parts.join("-"))
    }

    /// Explicit handle of a row, if it carries one.
    fn explicit_handle(&self, row: &[Datum]) -> StorageResult<Option<i64>> {
        if self.schema.pk_is_handle {
            let idx = self.keys.first().and_then(|(_, cols)| cols.first().copied());
            return match idx.and_then(|idx| row.get(idx)) {
                Some(Datum::Int(v)) => Ok(Some(*v)),
                Some(Datum::Null) | None => Ok(None),
                Some(other) => Err(StorageError::Write(format!(
                    "primary key value {other} is not an integer"
                ))),
            };
        }
        if row.len() == self.schema.columns.len() + 1 {
            return match row.last() {
                Some(Datum::Int(v)) => Ok(Some(*v)),
                _ => Err(StorageError::Write("row id is not an integer".into())),
            };
        }
        Ok(None)
    }

    fn check_width(&self, row: &[Datum]) -> StorageResult<()> {
        let width = self.schema.columns.len();
        if row.len() == width || (row.len() == width + 1 && !self.schema.pk_is_handle) {
            Ok(())
        } else {
            Err(StorageError::Write(format!(
                "row has {} values, table {} has {} columns",
                row.len(),
                self.schema.name,
                width
            )))
        }
    }

    fn unindex(&self, state: &mut TableState, row: &[Datum]) {
        for (pos, (_, cols)) in self.keys.iter().enumerate() {
            if let Some(key) = self.key_text(row, cols) {
                state.indexes[pos].remove(&key);
            }
        }
    }

    fn index(&self, state: &mut TableState, row: &[Datum], handle: i64) {
        for (pos, (_, cols)) in self.keys.iter().enumerate() {
            if let Some(key) = self.key_text(row, cols) {
                state.indexes[pos].insert(key, handle);
            }
        }
    }
}

fn hit(counter: &AtomicU64, at: Option<u64>) -> (u64, bool) {
    let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
    (n, at == Some(n))
}

impl Storage for MemStorage {
    fn find_conflict(&self, row: &Row) -> StorageResult<Option<Conflict>> {
        let state = self.state.lock();
        for (pos, (name, cols)) in self.keys.iter().enumerate() {
            let Some(key) = self.key_text(row, cols) else {
                continue;
            };
            if let Some(&handle) = state.indexes[pos].get(&key) {
                return Ok(Some(Conflict {
                    key,
                    index: name.clone(),
                    handle,
                }));
            }
        }
        if !self.schema.pk_is_handle {
            if let Some(handle) = self.explicit_handle(row)? {
                if state.rows.contains_key(&handle) {
                    return Ok(Some(Conflict {
                        key: handle.to_string(),
                        index: infile::PRIMARY_KEY_NAME.to_string(),
                        handle,
                    }));
                }
            }
        }
        Ok(None)
    }

    fn remove_row(&self, handle: i64) -> StorageResult<()> {
        let mut state = self.state.lock();
        let row = state
            .rows
            .remove(&handle)
            .ok_or_else(|| StorageError::Write(format!("no row with handle {handle}")))?;
        self.unindex(&mut state, &row);
        state.undo.push(Undo::Removed(handle, row));
        debug!(handle, "row removed");
        Ok(())
    }

    fn add_row(&self, mut row: Row) -> StorageResult<i64> {
        let (n, fail) = hit(&self.inserts, self.faults.fail_insert_at);
        if self.faults.panic_at_insert == Some(n) {
            panic!("injected panic at insert {n}");
        }
        if fail {
            return Err(StorageError::Write(format!("injected failure at insert {n}")));
        }
        self.check_width(&row)?;

        let explicit = self.explicit_handle(&row)?;
        if row.len() > self.schema.columns.len() {
            row.truncate(self.schema.columns.len());
        }

        let mut state = self.state.lock();
        let handle = match explicit {
            Some(handle) => handle,
            None => state.next_handle,
        };
        if state.rows.contains_key(&handle) {
            return Err(StorageError::Write(format!("handle {handle} already exists")));
        }
        state.next_handle = state.next_handle.max(handle.saturating_add(1));

        self.index(&mut state, &row, handle);
        state.pending.push(row.clone());
        state.rows.insert(handle, row);
        state.undo.push(Undo::Inserted(handle));
        Ok(handle)
    }

    fn commit_statement(&self) -> StorageResult<()> {
        if let Some(gate) = &self.faults.commit_gate {
            gate.recv_timeout(GATE_TIMEOUT)
                .map_err(|_| StorageError::Commit("commit gate closed".into()))?;
        }
        let (n, fail) = hit(&self.commits, self.faults.fail_commit_at);
        if fail {
            return Err(StorageError::Commit(format!("injected failure at commit {n}")));
        }
        let mut state = self.state.lock();
        state.undo.clear();
        let committed = std::mem::take(&mut state.pending);
        debug!(rows = committed.len(), commit = n, "statement committed");
        state.commit_log.push(committed);
        Ok(())
    }

    fn rollback_statement(&self) {
        let mut state = self.state.lock();
        let undo = std::mem::take(&mut state.undo);
        let undone = undo.len();
        for entry in undo.into_iter().rev() {
            match entry {
                Undo::Inserted(handle) => {
                    if let Some(row) = state.rows.remove(&handle) {
                        self.unindex(&mut state, &row);
                    }
                }
                Undo::Removed(handle, row) => {
                    self.index(&mut state, &row, handle);
                    state.rows.insert(handle, row);
                }
            }
        }
        state.pending.clear();
        self.rollbacks.fetch_add(1, Ordering::SeqCst);
        debug!(undone, "statement rolled back");
    }

    fn refresh_txn(&self) -> StorageResult<()> {
        let (n, fail) = hit(&self.refreshes, self.faults.fail_refresh_at);
        if fail {
            return Err(StorageError::Refresh(format!("injected failure at refresh {n}")));
        }
        Ok(())
    }
}
