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


//! Session and statement state shared by the producer and the commit worker.

use crate::datum::Datum;
use crate::error::{LoadError, LoadResult};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Warnings kept with their message; further ones are only counted.
pub const MAX_STORED_WARNINGS: usize = 64;

/// Per-connection state.
///
/// The kill flag is polled by the commit worker between tasks; it is never
/// pushed into the pipeline.
#[derive(Debug, Default)]
pub struct Session {
    user_vars: Mutex<HashMap<String, Datum>>,
    killed: AtomicBool,
    load_in_progress: AtomicBool,
}

impl Session {
    /// Create a session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a user variable. Names are case-insensitive.
    pub fn set_user_var(&self, name: &str, value: Datum) {
        self.user_vars.lock().insert(name.to_ascii_lowercase(), value);
    }

    /// Read a user variable.
    pub fn user_var(&self, name: &str) -> Option<Datum> {
        self.user_vars.lock().get(&name.to_ascii_lowercase()).cloned()
    }

    /// Request that the running statement stops.
    pub fn kill(&self) {
        self.killed.store(true, Ordering::SeqCst);
    }

    /// Whether a kill is pending.
    pub fn is_killed(&self) -> bool {
        self.killed.load(Ordering::SeqCst)
    }

    /// Consume a pending kill. Returns true at most once per [`kill`](Self::kill).
    pub fn take_kill(&self) -> bool {
        self.killed
            .compare_exchange(true, false, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Mark a load as running on this session.
    ///
    /// Fails if a marker is already set; the marker is cleared so the next
    /// attempt succeeds.
    pub fn begin_load(&self) -> LoadResult<LoadGuard<'_>> {
        if self.load_in_progress.swap(true, Ordering::SeqCst) {
            self.load_in_progress.store(false, Ordering::SeqCst);
            return Err(LoadError::config(
                "previous load data option isn't closed normal",
            ));
        }
        Ok(LoadGuard { session: self })
    }

    /// Whether a load marker is set.
    pub fn load_in_progress(&self) -> bool {
        self.load_in_progress.load(Ordering::SeqCst)
    }
}

/// Clears the session's load marker on drop.
#[derive(Debug)]
pub struct LoadGuard<'a> {
    session: &'a Session,
}

impl Drop for LoadGuard<'_> {
    fn drop(&mut self) {
        self.session.load_in_progress.store(false, Ordering::SeqCst);
    }
}

/// A recorded warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub message: String,
}

/// Counters and warnings of one statement.
///
/// Written by both pipeline sides, so every counter is atomic.
///
/// # Examples
///
/// ```rust
/// use infile::StatementContext;
///
/// let ctx = StatementContext::new();
/// ctx.add_record_rows(3);
/// ctx.add_copied_rows(2);
/// ctx.append_warning("Duplicate entry '1' for key 'PRIMARY'");
/// assert_eq!(ctx.message(), "Records: 3  Deleted: 0  Skipped: 1  Warnings: 1");
/// ```
#[derive(Debug, Default)]
pub struct StatementContext {
    record_rows: AtomicU64,
    copied_rows: AtomicU64,
    deleted_rows: AtomicU64,
    warning_count: AtomicU64,
    warnings: Mutex<Vec<Warning>>,
}

impl StatementContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count rows handed to the commit stage.
    pub fn add_record_rows(&self, n: u64) {
        self.record_rows.fetch_add(n, Ordering::Relaxed);
    }

    /// Count rows written.
    pub fn add_copied_rows(&self, n: u64) {
        self.copied_rows.fetch_add(n, Ordering::Relaxed);
    }

    /// Count rows removed by `REPLACE`.
    pub fn add_deleted_rows(&self, n: u64) {
        self.deleted_rows.fetch_add(n, Ordering::Relaxed);
    }

    pub fn record_rows(&self) -> u64 {
        self.record_rows.load(Ordering::Relaxed)
    }

    pub fn copied_rows(&self) -> u64 {
        self.copied_rows.load(Ordering::Relaxed)
    }

    pub fn deleted_rows(&self) -> u64 {
        self.deleted_rows.load(Ordering::Relaxed)
    }

    /// Rows handed over but not written.
    pub fn skipped_rows(&self) -> u64 {
        self.record_rows().saturating_sub(self.copied_rows())
    }

    /// Record a warning.
    pub fn append_warning(&self, message: impl Into<String>) {
        self.warning_count.fetch_add(1, Ordering::Relaxed);
        let mut warnings = self.warnings.lock();
        if warnings.len() < MAX_STORED_WARNINGS {
            warnings.push(Warning {
                message: message.into(),
            });
        }
    }

    /// Total warnings, including ones not stored.
    pub fn warning_count(&self) -> u64 {
        self.warning_count.load(Ordering::Relaxed)
    }

    /// Stored warnings, oldest first.
    pub fn warnings(&self) -> Vec<Warning> {
        self.warnings.lock().clone()
    }

    /// `Records: R  Deleted: D  Skipped: S  Warnings: W`
    pub fn message(&self) -> String {
        format!(
            "Records: {}  Deleted: {}  Skipped: {}  Warnings: {}",
            self.record_rows(),
            self.deleted_rows(),
            self.skipped_rows(),
            self.warning_count()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_vars_case_insensitive() {
        let session = Session::new();
        session.set_user_var("Foo", Datum::from("x"));
        assert_eq!(session.user_var("FOO"), Some(Datum::from("x")));
        assert_eq!(session.user_var("bar"), None);
    }

    #[test]
    fn test_take_kill_once() {
        let session = Session::new();
        assert!(!session.take_kill());
        session.kill();
        assert!(session.is_killed());
        assert!(session.take_kill());
        assert!(!session.take_kill());
        assert!(!session.is_killed());
    }

    #[test]
    fn test_load_guard() {
        let session = Session::new();
        {
            let _guard = session.begin_load().unwrap();
            assert!(session.load_in_progress());
        }
        assert!(!session.load_in_progress());
    }

    #[test]
    fn test_stale_marker_is_reported_then_cleared() {
        let session = Session::new();
        let guard = session.begin_load().unwrap();
        std::mem::forget(guard);

        let err = session.begin_load().unwrap_err();
        assert!(err.to_string().contains("isn't closed normal"));
        assert!(!session.load_in_progress());
        assert!(session.begin_load().is_ok());
    }

    #[test]
    fn test_warning_cap() {
        let ctx = StatementContext::new();
        for i in 0..100 {
            ctx.append_warning(format!("w{i}"));
        }
        assert_eq!(ctx.warning_count(), 100);
        let stored = ctx.warnings();
        assert_eq!(stored.len(), MAX_STORED_WARNINGS);
        assert_eq!(stored[0].message, "w0");
    }

    #[test]
    fn test_message_format() {
        let ctx = StatementContext::new();
        ctx.add_record_rows(5);
        ctx.add_copied_rows(5);
        ctx.add_deleted_rows(2);
        assert_eq!(ctx.message(), "Records: 5  Deleted: 2  Skipped: 0  Warnings: 0");
    }
}
