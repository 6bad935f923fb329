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


//! The commit worker: applies commit tasks one at a time.

use crate::config::DuplicateMode;
use crate::datum::Row;
use crate::engine::Storage;
use crate::error::{LoadError, LoadResult};
use crate::pipeline::{CommitTask, TaskReceiver};
use crate::session::{Session, StatementContext};
use parking_lot::Mutex;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// Consumes the task queue and writes each task through [`Storage`].
///
/// Per task: duplicate check and insert, statement commit, transaction
/// refresh. Commit and refresh run under the shared transaction lock so the
/// producer never observes a half-refreshed context.
pub struct CommitWorker {
    queue: TaskReceiver,
    storage: Arc<dyn Storage>,
    session: Arc<Session>,
    stmt: Arc<StatementContext>,
    txn_in_use: Arc<Mutex<()>>,
    on_duplicate: DuplicateMode,
}

impl CommitWorker {
    /// Create a worker.
    pub fn new(
        queue: TaskReceiver,
        storage: Arc<dyn Storage>,
        session: Arc<Session>,
        stmt: Arc<StatementContext>,
        txn_in_use: Arc<Mutex<()>>,
        on_duplicate: DuplicateMode,
    ) -> Self {
        Self {
            queue,
            storage,
            session,
            stmt,
            txn_in_use,
            on_duplicate,
        }
    }

    /// Run until the queue is closed and drained.
    ///
    /// On any error, including a panic inside the worker, the quit signal is
    /// fired and the current statement rolled back before returning.
    pub fn run(self) -> LoadResult<()> {
        let result = match panic::catch_unwind(AssertUnwindSafe(|| self.commit_work())) {
            Ok(result) => result,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(panic = %message, "commit worker panicked");
                Err(LoadError::WorkerPanicked(message))
            }
        };
        if result.is_err() {
            self.queue.quit_signal().force_quit();
            self.storage.rollback_statement();
        }
        result
    }

    fn commit_work(&self) -> LoadResult<()> {
        let mut tasks = 0u64;
        while let Some(task) = self.queue.recv()? {
            let start = Instant::now();
            let rows = task.row_count;
            if let Err(err) = self.commit_one_task(task) {
                error!(error = %err, "load data commit work error");
                return Err(err);
            }
            tasks += 1;
            info!(
                elapsed = ?start.elapsed(),
                rows,
                tasks,
                queued = self.queue.len(),
                "commit one task success"
            );
            self.check_killed()?;
        }
        // a kill raised after the last task still ends the statement
        self.check_killed()
    }

    fn check_killed(&self) -> LoadResult<()> {
        if self.session.take_kill() {
            info!("load data query interrupted, quit data processing");
            return Err(LoadError::Interrupted);
        }
        Ok(())
    }

    /// Insert, commit and refresh one task. Rolls the statement back on
    /// failure.
    pub fn commit_one_task(&self, task: CommitTask) -> LoadResult<()> {
        let result = self.commit_task(task);
        if result.is_err() {
            self.storage.rollback_statement();
        }
        result
    }

    fn commit_task(&self, task: CommitTask) -> LoadResult<()> {
        if let Err(err) = self.insert_batch(task) {
            error!(error = %err, "commit error at insert");
            return Err(err);
        }
        let _txn = self.txn_in_use.lock();
        self.storage.commit_statement()?;
        if let Err(err) = self.storage.refresh_txn() {
            error!(error = %err, "commit error at refresh");
            return Err(err.into());
        }
        Ok(())
    }

    fn insert_batch(&self, task: CommitTask) -> LoadResult<()> {
        if task.is_empty() {
            return Ok(());
        }
        self.stmt.add_record_rows(task.row_count);
        for row in task.rows {
            self.add_record(row)?;
        }
        Ok(())
    }

    fn add_record(&self, row: Row) -> LoadResult<()> {
        match self.on_duplicate {
            DuplicateMode::Error => {
                if let Some(conflict) = self.storage.find_conflict(&row)? {
                    let err = LoadError::duplicate_key(conflict.key, conflict.index);
                    self.stmt.append_warning(err.to_string());
                    return Err(err);
                }
            }
            DuplicateMode::Ignore => {
                if let Some(conflict) = self.storage.find_conflict(&row)? {
                    self.stmt.append_warning(format!(
                        "Duplicate entry '{}' for key '{}'",
                        conflict.key, conflict.index
                    ));
                    return Ok(());
                }
            }
            DuplicateMode::Replace => {
                while let Some(conflict) = self.storage.find_conflict(&row)? {
                    self.storage.remove_row(conflict.handle)?;
                    self.stmt.add_deleted_rows(1);
                }
            }
        }
        self.storage.add_row(row)?;
        self.stmt.add_copied_rows(1);
        Ok(())
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datum::Datum;
    use crate::engine::Conflict;
    use crate::error::{StorageError, StorageResult};
    use crate::pipeline::{task_queue, QuitSignal};
    use std::collections::BTreeMap;

    /// Rows keyed by their first value.
    #[derive(Default)]
    struct KeyedStore {
        rows: Mutex<BTreeMap<i64, Row>>,
        pending: Mutex<Vec<i64>>,
        commits: Mutex<u32>,
        rollbacks: Mutex<u32>,
        fail_refresh: bool,
        panic_on: Option<i64>,
    }

    fn key(row: &Row) -> i64 {
        match row[0] {
            Datum::Int(v) => v,
            _ => -1,
        }
    }

    impl Storage for KeyedStore {
        fn find_conflict(&self, row: &Row) -> StorageResult<Option<Conflict>> {
            let k = key(row);
            Ok(self.rows.lock().contains_key(&k).then(|| Conflict {
                key: k.to_string(),
                index: "PRIMARY".into(),
                handle: k,
            }))
        }

        fn remove_row(&self, handle: i64) -> StorageResult<()> {
            self.rows.lock().remove(&handle);
            Ok(())
        }

        fn add_row(&self, row: Row) -> StorageResult<i64> {
            let k = key(&row);
            if Some(k) == self.panic_on {
                panic!("storage exploded");
            }
            self.rows.lock().insert(k, row);
            self.pending.lock().push(k);
            Ok(k)
        }

        fn commit_statement(&self) -> StorageResult<()> {
            self.pending.lock().clear();
            *self.commits.lock() += 1;
            Ok(())
        }

        fn rollback_statement(&self) {
            let mut rows = self.rows.lock();
            for k in self.pending.lock().drain(..) {
                rows.remove(&k);
            }
            *self.rollbacks.lock() += 1;
        }

        fn refresh_txn(&self) -> StorageResult<()> {
            if self.fail_refresh {
                return Err(StorageError::Refresh("context lost".into()));
            }
            Ok(())
        }
    }

    fn rows(keys: &[i64]) -> Vec<Row> {
        keys.iter().map(|k| vec![Datum::Int(*k)]).collect()
    }

    fn worker(
        store: Arc<KeyedStore>,
        mode: DuplicateMode,
        tasks: Vec<CommitTask>,
    ) -> (CommitWorker, Arc<StatementContext>, Arc<Session>, QuitSignal) {
        let quit = QuitSignal::new();
        let (tx, rx) = task_queue(tasks.len() + 1, quit.clone());
        for task in tasks {
            tx.enqueue(task).unwrap();
        }
        tx.close();
        let stmt = Arc::new(StatementContext::new());
        let session = Arc::new(Session::new());
        let worker = CommitWorker::new(
            rx,
            store,
            session.clone(),
            stmt.clone(),
            Arc::new(Mutex::new(())),
            mode,
        );
        (worker, stmt, session, quit)
    }

    #[test]
    fn test_drains_and_counts() {
        let store = Arc::new(KeyedStore::default());
        let tasks = vec![
            CommitTask::new(2, rows(&[1, 2])),
            CommitTask::new(3, rows(&[3])),
        ];
        let (worker, stmt, _, quit) = worker(store.clone(), DuplicateMode::Error, tasks);
        worker.run().unwrap();
        assert!(!quit.is_fired());
        assert_eq!(*store.commits.lock(), 2);
        assert_eq!(stmt.record_rows(), 5);
        assert_eq!(stmt.copied_rows(), 3);
        assert_eq!(stmt.skipped_rows(), 2);
    }

    #[test]
    fn test_duplicate_error_mode_aborts_and_rolls_back() {
        let store = Arc::new(KeyedStore::default());
        let tasks = vec![
            CommitTask::new(1, rows(&[1])),
            CommitTask::new(2, rows(&[2, 1])),
        ];
        let (worker, stmt, _, quit) = worker(store.clone(), DuplicateMode::Error, tasks);
        let err = worker.run().unwrap_err();
        assert!(matches!(err, LoadError::DuplicateKey { .. }));
        assert!(quit.is_fired());
        assert!(*store.rollbacks.lock() >= 1);
        // first task committed, second rolled back
        assert_eq!(store.rows.lock().keys().copied().collect::<Vec<_>>(), vec![1]);
        assert_eq!(stmt.warning_count(), 1);
    }

    #[test]
    fn test_duplicate_ignore_mode_warns() {
        let store = Arc::new(KeyedStore::default());
        let tasks = vec![CommitTask::new(3, rows(&[1, 1, 2]))];
        let (worker, stmt, _, _) = worker(store, DuplicateMode::Ignore, tasks);
        worker.run().unwrap();
        assert_eq!(stmt.copied_rows(), 2);
        assert_eq!(
            stmt.warnings()[0].message,
            "Duplicate entry '1' for key 'PRIMARY'"
        );
        assert_eq!(stmt.message(), "Records: 3  Deleted: 0  Skipped: 1  Warnings: 1");
    }

    #[test]
    fn test_duplicate_replace_mode_deletes() {
        let store = Arc::new(KeyedStore::default());
        let tasks = vec![CommitTask::new(3, rows(&[1, 1, 1]))];
        let (worker, stmt, _, _) = worker(store, DuplicateMode::Replace, tasks);
        worker.run().unwrap();
        assert_eq!(stmt.deleted_rows(), 2);
        assert_eq!(stmt.copied_rows(), 3);
    }

    #[test]
    fn test_refresh_failure_is_fatal() {
        let store = Arc::new(KeyedStore {
            fail_refresh: true,
            ..Default::default()
        });
        let tasks = vec![CommitTask::new(1, rows(&[1]))];
        let (worker, _, _, quit) = worker(store, DuplicateMode::Error, tasks);
        let err = worker.run().unwrap_err();
        assert!(matches!(err, LoadError::Storage(StorageError::Refresh(_))));
        assert!(quit.is_fired());
    }

    #[test]
    fn test_panic_is_caught() {
        let store = Arc::new(KeyedStore {
            panic_on: Some(2),
            ..Default::default()
        });
        let tasks = vec![CommitTask::new(2, rows(&[1, 2]))];
        let (worker, _, _, quit) = worker(store.clone(), DuplicateMode::Error, tasks);
        let err = worker.run().unwrap_err();
        assert!(matches!(err, LoadError::WorkerPanicked(ref m) if m == "storage exploded"));
        assert!(quit.is_fired());
        assert!(store.rows.lock().is_empty());
    }

    #[test]
    fn test_kill_flag_interrupts_after_task() {
        let store = Arc::new(KeyedStore::default());
        let tasks = vec![
            CommitTask::new(1, rows(&[1])),
            CommitTask::new(1, rows(&[2])),
        ];
        let (worker, _, session, quit) = worker(store.clone(), DuplicateMode::Error, tasks);
        session.kill();
        let err = worker.run().unwrap_err();
        assert!(matches!(err, LoadError::Interrupted));
        assert!(quit.is_fired());
        assert!(!session.is_killed());
        assert_eq!(*store.commits.lock(), 1);
    }

    #[test]
    fn test_kill_flag_checked_when_queue_closes() {
        let store = Arc::new(KeyedStore::default());
        let (idle, _, session, quit) = worker(store.clone(), DuplicateMode::Error, Vec::new());
        session.kill();
        let err = idle.run().unwrap_err();
        assert!(matches!(err, LoadError::Interrupted));
        assert!(quit.is_fired());
        assert!(!session.is_killed());
        assert_eq!(*store.commits.lock(), 0);
    }
}
