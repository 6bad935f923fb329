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


//! Statement driver: runs a whole `LOAD DATA` from a reader.

use crate::assembler::RecordAssembler;
use crate::config::LoadDataStmt;
use crate::engine::{ExprEvaluator, RowEncoder, Storage};
use crate::error::{CancelSide, LoadError, LoadResult};
use crate::loader::LoadData;
use crate::mapping::FieldMapping;
use crate::pipeline::{task_queue, QuitSignal};
use crate::schema::TableSchema;
use crate::session::{Session, StatementContext};
use crate::worker::{panic_message, CommitWorker};
use parking_lot::Mutex;
use std::fs::File;
use std::io::{self, Read};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use tracing::{debug, error, info, warn};

/// Final counters of a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadSummary {
    /// Lines handed to the commit stage.
    pub records: u64,
    /// Rows removed by `REPLACE`.
    pub deleted: u64,
    /// Records not written.
    pub skipped: u64,
    /// Warnings raised.
    pub warnings: u64,
    /// `Records: R  Deleted: D  Skipped: S  Warnings: W`
    pub message: String,
}

impl LoadSummary {
    /// Snapshot a statement context.
    pub fn from_context(ctx: &StatementContext) -> Self {
        Self {
            records: ctx.record_rows(),
            deleted: ctx.deleted_rows(),
            skipped: ctx.skipped_rows(),
            warnings: ctx.warning_count(),
            message: ctx.message(),
        }
    }
}

/// The two pipeline halves of one statement, ready to run.
pub struct PreparedLoad {
    /// Producer half.
    pub loader: LoadData,
    /// Consumer half.
    pub worker: CommitWorker,
    /// Fires to cancel both halves.
    pub quit: QuitSignal,
    /// Held by the producer while parsing, by the worker while committing.
    pub txn_in_use: Arc<Mutex<()>>,
}

/// Executes one `LOAD DATA` statement.
///
/// # Examples
///
/// ```rust,ignore
/// let exec = LoadDataExec::new(stmt, schema, session, storage, encoder, evaluator);
/// let summary = exec.execute(std::io::Cursor::new(b"1,foo\n2,\\N\n"))?;
/// println!("{}", summary.message);
/// ```
pub struct LoadDataExec {
    stmt: LoadDataStmt,
    schema: Arc<TableSchema>,
    session: Arc<Session>,
    storage: Arc<dyn Storage>,
    encoder: Arc<dyn RowEncoder>,
    evaluator: Arc<dyn ExprEvaluator>,
    ctx: Arc<StatementContext>,
}

impl LoadDataExec {
    /// Bind a statement to its collaborators.
    pub fn new(
        stmt: LoadDataStmt,
        schema: Arc<TableSchema>,
        session: Arc<Session>,
        storage: Arc<dyn Storage>,
        encoder: Arc<dyn RowEncoder>,
        evaluator: Arc<dyn ExprEvaluator>,
    ) -> Self {
        Self {
            stmt,
            schema,
            session,
            storage,
            encoder,
            evaluator,
            ctx: Arc::new(StatementContext::new()),
        }
    }

    /// The bound statement.
    pub fn statement(&self) -> &LoadDataStmt {
        &self.stmt
    }

    /// Counters and warnings, also valid after a failed execution.
    pub fn statement_context(&self) -> &Arc<StatementContext> {
        &self.ctx
    }

    /// Snapshot of the counters.
    pub fn summary(&self) -> LoadSummary {
        LoadSummary::from_context(&self.ctx)
    }

    /// Resolve columns and build both pipeline halves without running them.
    pub fn start(&self) -> LoadResult<PreparedLoad> {
        let config = &self.stmt.config;
        self.stmt.format.validate()?;
        let (mapping, columns) = FieldMapping::build(
            &self.schema,
            &self.stmt.columns,
            &self.stmt.assignments,
            config.allow_write_row_id,
        )?;

        let quit = QuitSignal::new();
        let (sender, receiver) = task_queue(config.task_queue_size, quit.clone());
        let txn_in_use = Arc::new(Mutex::new(()));

        let assembler = RecordAssembler::new(
            self.schema.clone(),
            mapping,
            columns,
            self.stmt.assignments.clone(),
            self.session.clone(),
            self.ctx.clone(),
            self.encoder.clone(),
            self.evaluator.clone(),
        );
        let loader = LoadData::new(
            self.stmt.format.clone(),
            config.ignore_lines,
            config.max_rows_in_batch,
            assembler,
            sender,
        );
        let worker = CommitWorker::new(
            receiver,
            self.storage.clone(),
            self.session.clone(),
            self.ctx.clone(),
            txn_in_use.clone(),
            config.on_duplicate,
        );

        Ok(PreparedLoad {
            loader,
            worker,
            quit,
            txn_in_use,
        })
    }

    /// Open the statement's path and load it.
    pub fn execute_path(&self) -> LoadResult<LoadSummary> {
        self.check_statement()?;
        let file = File::open(&self.stmt.path)?;
        self.run(file)
    }

    /// Load everything `reader` yields.
    ///
    /// Spawns the commit worker, parses on the calling thread and waits for
    /// the worker to drain. On error the pipeline is force-quit and the
    /// current statement rolled back; batches committed before the failure
    /// stay committed and remain visible in [`summary`](Self::summary).
    pub fn execute<R: Read>(&self, reader: R) -> LoadResult<LoadSummary> {
        self.check_statement()?;
        self.run(reader)
    }

    fn check_statement(&self) -> LoadResult<()> {
        if !self.stmt.config.local {
            return Err(LoadError::config(
                "don't support load data without local field",
            ));
        }
        if self.stmt.path.is_empty() {
            return Err(LoadError::config("infile path is empty"));
        }
        Ok(())
    }

    fn run<R: Read>(&self, mut reader: R) -> LoadResult<LoadSummary> {
        self.stmt.format.validate()?;
        let _guard = self.session.begin_load()?;

        let PreparedLoad {
            mut loader,
            worker,
            quit,
            txn_in_use,
        } = self.start()?;

        info!(path = %self.stmt.path, table = %self.schema.name, "load data started");

        let outcome = thread::scope(|scope| {
            let handle = thread::Builder::new()
                .name("infile-commit".to_string())
                .spawn_scoped(scope, move || worker.run())?;

            let produced = panic::catch_unwind(AssertUnwindSafe(|| {
                self.produce(&mut loader, &mut reader, &txn_in_use, &quit)
            }))
            .unwrap_or_else(|payload| {
                let message = panic_message(payload.as_ref());
                error!(panic = %message, "load data producer panicked");
                Err(LoadError::ProducerPanicked(message))
            });
            if let Err(err) = &produced {
                warn!(error = %err, "load data preparation failed");
                quit.force_quit();
            }
            loader.close_task_queue();

            let committed = handle.join().unwrap_or_else(|payload| {
                Err(LoadError::WorkerPanicked(panic_message(payload.as_ref())))
            });
            if produced.is_err() {
                // worker has exited, nothing else touches the statement
                self.storage.rollback_statement();
            }
            Ok::<_, LoadError>(merge_outcome(produced, committed))
        })?;

        let summary = self.summary();
        match outcome {
            Ok(()) => {
                info!(message = %summary.message, "load data finished");
                Ok(summary)
            }
            Err(err) => {
                debug!(message = %summary.message, "load data aborted");
                Err(err)
            }
        }
    }

    fn produce<R: Read>(
        &self,
        loader: &mut LoadData,
        reader: &mut R,
        txn_in_use: &Mutex<()>,
        quit: &QuitSignal,
    ) -> LoadResult<()> {
        let mut buf = vec![0u8; self.stmt.config.read_buffer_size.max(1)];
        let mut prev = Vec::new();
        loop {
            if quit.is_fired() {
                return Err(LoadError::cancelled(CancelSide::Producer));
            }
            let n = match reader.read(&mut buf) {
                Ok(n) => n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            };
            let eof = n == 0;
            let mut cur = &buf[..n];
            loop {
                let (rest, reach_limit) = {
                    let _txn = txn_in_use.lock();
                    loader.insert_data(&prev, cur, eof)?
                };
                prev = rest;
                cur = &[];
                if !reach_limit {
                    break;
                }
                loader.enqueue_task()?;
            }
            if eof {
                break;
            }
        }
        loader.enqueue_task()
    }
}

/// A forced quit on one side is the echo of a failure on the other; report
/// the failure.
fn merge_outcome(produced: LoadResult<()>, committed: LoadResult<()>) -> LoadResult<()> {
    match (produced, committed) {
        (Ok(()), Ok(())) => Ok(()),
        (Err(p), Ok(())) => Err(p),
        (Ok(()), Err(c)) => Err(c),
        (Err(p), Err(c)) => {
            if p.is_forced_quit() && !c.is_forced_quit() {
                Err(c)
            } else {
                Err(p)
            }
        }
    }
}
