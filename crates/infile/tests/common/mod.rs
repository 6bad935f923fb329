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


//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use crossbeam_channel::Receiver;
use infile::{
    Conflict, Datum, EvalContext, ExprEvaluator, LoadColumns, Row, RowEncoder, RowError,
    RowResult, Storage, StorageError, StorageResult,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Bound for every wait in these tests; a deadlock fails instead of hanging.
pub const WAIT: Duration = Duration::from_secs(5);

/// Storage that records committed statements in order.
///
/// Optionally blocks each commit on a gate channel, and fails the n-th
/// commit (1-based).
#[derive(Default)]
pub struct RecordingStorage {
    pending: Mutex<Vec<Row>>,
    committed: Mutex<Vec<Vec<Row>>>,
    rollbacks: AtomicU64,
    commits: AtomicU64,
    gate: Option<Receiver<()>>,
    fail_commit_at: Option<u64>,
}

impl RecordingStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gated(gate: Receiver<()>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    pub fn failing_commit(n: u64) -> Self {
        Self {
            fail_commit_at: Some(n),
            ..Self::default()
        }
    }

    /// Committed statements, oldest first.
    pub fn committed(&self) -> Vec<Vec<Row>> {
        self.committed.lock().clone()
    }

    /// All committed rows, flattened.
    pub fn rows(&self) -> Vec<Row> {
        self.committed.lock().iter().flatten().cloned().collect()
    }

    pub fn rollbacks(&self) -> u64 {
        self.rollbacks.load(Ordering::SeqCst)
    }
}

impl Storage for RecordingStorage {
    fn find_conflict(&self, _row: &Row) -> StorageResult<Option<Conflict>> {
        Ok(None)
    }

    fn remove_row(&self, _handle: i64) -> StorageResult<()> {
        Ok(())
    }

    fn add_row(&self, row: Row) -> StorageResult<i64> {
        let mut pending = self.pending.lock();
        pending.push(row);
        Ok(pending.len() as i64)
    }

    fn commit_statement(&self) -> StorageResult<()> {
        if let Some(gate) = &self.gate {
            gate.recv_timeout(WAIT)
                .map_err(|_| StorageError::Commit("gate timed out".into()))?;
        }
        let n = self.commits.fetch_add(1, Ordering::SeqCst) + 1;
        if Some(n) == self.fail_commit_at {
            return Err(StorageError::Commit(format!("commit {n} rejected")));
        }
        let batch = std::mem::take(&mut *self.pending.lock());
        self.committed.lock().push(batch);
        Ok(())
    }

    fn rollback_statement(&self) {
        self.pending.lock().clear();
        self.rollbacks.fetch_add(1, Ordering::SeqCst);
    }

    fn refresh_txn(&self) -> StorageResult<()> {
        Ok(())
    }
}

/// Keeps assembled values as they are.
pub struct PassThroughEncoder;

impl RowEncoder for PassThroughEncoder {
    fn encode(&self, _columns: &LoadColumns, values: Vec<Datum>) -> RowResult<Row> {
        Ok(values)
    }
}

/// Fails on the row whose first value is `trigger`, either by panicking or
/// with a fatal row error. Other rows pass through.
pub struct TripwireEncoder {
    trigger: String,
    panic: bool,
}

impl TripwireEncoder {
    pub fn panicking(trigger: &str) -> Self {
        Self {
            trigger: trigger.to_string(),
            panic: true,
        }
    }

    pub fn fatal(trigger: &str) -> Self {
        Self {
            trigger: trigger.to_string(),
            panic: false,
        }
    }
}

impl RowEncoder for TripwireEncoder {
    fn encode(&self, _columns: &LoadColumns, values: Vec<Datum>) -> RowResult<Row> {
        let hit = values
            .first()
            .is_some_and(|v| v.to_string() == self.trigger);
        if hit {
            if self.panic {
                panic!("cannot encode {}", self.trigger);
            }
            return Err(RowError::Fatal(format!("cannot encode {}", self.trigger)));
        }
        Ok(values)
    }
}

/// `@var` reads a user variable; anything else is an error.
pub struct VarEvaluator;

impl ExprEvaluator for VarEvaluator {
    fn eval(&self, expr: &str, ctx: &EvalContext<'_>) -> RowResult<Datum> {
        expr.strip_prefix('@')
            .map(|var| ctx.user_var(var))
            .ok_or_else(|| RowError::eval(format!("unsupported expression: {expr}")))
    }
}

/// Text of the first value of each row.
pub fn first_column(rows: &[Row]) -> Vec<String> {
    rows.iter().map(|row| row[0].to_string()).collect()
}
