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


//! The producer side: bytes in, batched rows out.

use crate::assembler::RecordAssembler;
use crate::datum::Row;
use crate::error::{LoadError, LoadResult};
use crate::pipeline::{CommitTask, TaskSender};
use infile_core::lex::{scan_fields, LineSplitter};
use infile_core::LoadFormat;
use std::borrow::Cow;
use tracing::info;

/// Upper bound for the row buffer reserved up front per batch.
const MAX_PREALLOC_ROWS: u64 = 4096;

/// Parses input chunks into rows and hands full batches to the commit queue.
///
/// Bytes not yet forming a complete line are returned to the caller and must
/// be passed back as `prev` on the next call.
pub struct LoadData {
    format: LoadFormat,
    splitter: LineSplitter,
    assembler: RecordAssembler,
    queue: Option<TaskSender>,
    ignore_lines: u64,
    max_rows_in_batch: u64,
    rows: Vec<Row>,
    cur_batch_cnt: u64,
    row_count: u64,
}

impl LoadData {
    /// Create a producer. `format` must already be validated.
    pub fn new(
        format: LoadFormat,
        ignore_lines: u64,
        max_rows_in_batch: u64,
        assembler: RecordAssembler,
        queue: TaskSender,
    ) -> Self {
        let splitter = LineSplitter::new(&format);
        let mut loader = Self {
            format,
            splitter,
            assembler,
            queue: Some(queue),
            ignore_lines,
            max_rows_in_batch: 0,
            rows: Vec::new(),
            cur_batch_cnt: 0,
            row_count: 0,
        };
        loader.set_max_rows_in_batch(max_rows_in_batch);
        loader
    }

    /// Parse `prev` followed by `cur`.
    ///
    /// Returns the unconsumed tail and whether the batch limit was reached.
    /// On a limit hit the caller enqueues the batch with
    /// [`enqueue_task`](Self::enqueue_task) and calls again with the tail and
    /// no new bytes. With `eof` set, a final unterminated line is loaded and
    /// a tail lacking the line starting marker is dropped.
    pub fn insert_data(&mut self, prev: &[u8], cur: &[u8], eof: bool) -> LoadResult<(Vec<u8>, bool)> {
        let data: Cow<'_, [u8]> = match (prev.is_empty(), cur.is_empty()) {
            (true, _) => Cow::Borrowed(cur),
            (false, true) => Cow::Borrowed(prev),
            (false, false) => Cow::Owned([prev, cur].concat()),
        };

        let mut rest: &[u8] = &data;
        let mut reach_limit = false;
        while !rest.is_empty() {
            let split = self.splitter.split(rest, self.ignore_lines > 0);
            let line = match split.line {
                Some(line) => {
                    rest = split.rest;
                    line
                }
                None if !eof => {
                    rest = split.rest;
                    break;
                }
                None if !split.has_starting => {
                    rest = &[];
                    break;
                }
                None => {
                    let line = &split.rest[self.splitter.starting_len()..];
                    rest = &[];
                    line
                }
            };

            if self.ignore_lines > 0 {
                self.ignore_lines -= 1;
                continue;
            }

            let fields = scan_fields(line, &self.format.fields);
            self.row_count += 1;
            self.cur_batch_cnt += 1;
            if let Some(row) = self.assembler.assemble(fields)? {
                self.rows.push(row);
            }

            if self.max_rows_in_batch != 0 && self.cur_batch_cnt >= self.max_rows_in_batch {
                reach_limit = true;
                info!(
                    max_batch_rows = self.max_rows_in_batch,
                    total_rows = self.row_count,
                    "batch limit hit when inserting rows"
                );
                break;
            }
        }

        Ok((rest.to_vec(), reach_limit))
    }

    /// Hand the current batch to the commit worker, blocking while the queue
    /// is full. No-op for an empty batch.
    ///
    /// # Errors
    ///
    /// [`LoadError::Cancelled`] if the pipeline was force-quit,
    /// [`LoadError::QueueClosed`] after [`close_task_queue`](Self::close_task_queue).
    pub fn enqueue_task(&mut self) -> LoadResult<()> {
        if self.cur_batch_cnt == 0 {
            return Ok(());
        }
        let queue = self.queue.as_ref().ok_or(LoadError::QueueClosed)?;
        let rows = std::mem::replace(&mut self.rows, Self::fresh_batch(self.max_rows_in_batch));
        queue.enqueue(CommitTask::new(self.cur_batch_cnt, rows))?;
        self.cur_batch_cnt = 0;
        Ok(())
    }

    /// Tell the worker no more tasks follow.
    pub fn close_task_queue(&mut self) {
        if let Some(queue) = self.queue.take() {
            queue.close();
        }
    }

    /// Set the batch size and start a fresh, empty batch.
    pub fn set_max_rows_in_batch(&mut self, limit: u64) {
        self.max_rows_in_batch = limit;
        self.rows = Self::fresh_batch(limit);
        self.cur_batch_cnt = 0;
    }

    /// Lines turned into rows so far, including dropped rows.
    #[inline]
    pub fn row_count(&self) -> u64 {
        self.row_count
    }

    /// Lines in the pending batch.
    #[inline]
    pub fn cur_batch_count(&self) -> u64 {
        self.cur_batch_cnt
    }

    /// Rows of the pending batch.
    #[inline]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Leading lines still to be skipped.
    #[inline]
    pub fn ignore_lines(&self) -> u64 {
        self.ignore_lines
    }

    fn fresh_batch(limit: u64) -> Vec<Row> {
        Vec::with_capacity(limit.min(MAX_PREALLOC_ROWS) as usize)
    }
}
