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


//! The bounded commit task queue and its quit signal.
//!
//! One producer and one commit worker share a FIFO queue of
//! [`CommitTask`]s. Both blocking points, enqueue on a full queue and
//! dequeue on an empty one, also wait on the [`QuitSignal`], so a forced
//! quit from either side unblocks the other immediately.
//!
//! ```text
//!   producer --enqueue--> [ task | task | ... ] --recv--> commit worker
//!       \                                                  /
//!        +------------------ QuitSignal ------------------+
//! ```

use crate::datum::Row;
use crate::error::{CancelSide, LoadError, LoadResult};
use crossbeam_channel::{bounded, select, Receiver, Sender, TryRecvError};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::error;

/// One batch of rows travelling from producer to worker.
///
/// `row_count` counts every line the batch consumed, including lines whose
/// row was dropped with a warning, so `rows.len() <= row_count`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CommitTask {
    pub row_count: u64,
    pub rows: Vec<Row>,
}

impl CommitTask {
    /// Create a task.
    pub fn new(row_count: u64, rows: Vec<Row>) -> Self {
        Self { row_count, rows }
    }

    /// Whether the task consumed no lines.
    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }
}

/// Set-once cancellation broadcast.
///
/// Firing drops the only sender of an internal channel. Every receiver then
/// observes a disconnect, which is both selectable and non-consuming.
///
/// ```rust
/// use infile::QuitSignal;
///
/// let quit = QuitSignal::new();
/// let other = quit.clone();
/// assert!(!other.is_fired());
/// assert!(quit.force_quit());
/// assert!(!quit.force_quit());
/// assert!(other.is_fired());
/// ```
#[derive(Debug, Clone)]
pub struct QuitSignal {
    trigger: Arc<Mutex<Option<Sender<()>>>>,
    fired: Receiver<()>,
}

impl Default for QuitSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl QuitSignal {
    /// Create an unfired signal.
    pub fn new() -> Self {
        let (tx, rx) = bounded(0);
        Self {
            trigger: Arc::new(Mutex::new(Some(tx))),
            fired: rx,
        }
    }

    /// Fire the signal. Returns true only for the call that fired it.
    pub fn force_quit(&self) -> bool {
        self.trigger.lock().take().is_some()
    }

    /// Whether the signal has fired.
    pub fn is_fired(&self) -> bool {
        matches!(self.fired.try_recv(), Err(TryRecvError::Disconnected))
    }

    fn receiver(&self) -> &Receiver<()> {
        &self.fired
    }
}

/// Create a queue holding at most `capacity` tasks (at least one).
pub fn task_queue(capacity: usize, quit: QuitSignal) -> (TaskSender, TaskReceiver) {
    let (tx, rx) = bounded(capacity.max(1));
    (
        TaskSender {
            tx,
            quit: quit.clone(),
        },
        TaskReceiver { rx, quit },
    )
}

/// Producer end. Dropping it (or [`close`](Self::close)) tells the worker no
/// more tasks follow.
#[derive(Debug)]
pub struct TaskSender {
    tx: Sender<CommitTask>,
    quit: QuitSignal,
}

impl TaskSender {
    /// Send a task, blocking while the queue is full.
    ///
    /// # Errors
    ///
    /// [`LoadError::Cancelled`] if the quit signal fires first or the worker
    /// is gone.
    pub fn enqueue(&self, task: CommitTask) -> LoadResult<()> {
        if self.quit.is_fired() {
            return Err(self.forced_quit());
        }
        select! {
            send(self.tx, task) -> res => res.map_err(|_| self.forced_quit()),
            recv(self.quit.receiver()) -> _ => Err(self.forced_quit()),
        }
    }

    /// Close the queue.
    pub fn close(self) {}

    /// Tasks waiting in the queue.
    pub fn len(&self) -> usize {
        self.tx.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.tx.is_empty()
    }

    /// The signal this queue observes.
    pub fn quit_signal(&self) -> &QuitSignal {
        &self.quit
    }

    fn forced_quit(&self) -> LoadError {
        error!("enqueue forced to quit, possible commit failure");
        LoadError::cancelled(CancelSide::Producer)
    }
}

/// Worker end.
#[derive(Debug)]
pub struct TaskReceiver {
    rx: Receiver<CommitTask>,
    quit: QuitSignal,
}

impl TaskReceiver {
    /// Next task in FIFO order, or `None` once the queue is closed and
    /// drained.
    ///
    /// No task is returned after the quit signal has fired.
    ///
    /// # Errors
    ///
    /// [`LoadError::Cancelled`] when the quit signal fires.
    pub fn recv(&self) -> LoadResult<Option<CommitTask>> {
        if self.quit.is_fired() {
            return Err(self.forced_quit());
        }
        let received = select! {
            recv(self.quit.receiver()) -> _ => None,
            recv(self.rx) -> msg => Some(msg.ok()),
        };
        match received {
            Some(task) if !self.quit.is_fired() => Ok(task),
            _ => Err(self.forced_quit()),
        }
    }

    /// Tasks waiting in the queue.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// The signal this queue observes.
    pub fn quit_signal(&self) -> &QuitSignal {
        &self.quit
    }

    fn forced_quit(&self) -> LoadError {
        error!("commit forced to quit, possible preparation failed");
        LoadError::cancelled(CancelSide::Worker)
    }
}
