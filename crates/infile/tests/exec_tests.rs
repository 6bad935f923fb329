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


//! End-to-end statement execution against recording test doubles.

mod common;

use common::{
    first_column, PassThroughEncoder, RecordingStorage, TripwireEncoder, VarEvaluator, WAIT,
};
use infile::{
    Column, ColumnOrVar, ColumnType, LoadConfig, LoadDataExec, LoadDataStmt, LoadError,
    LoadFormat, RowEncoder, RowError, Session, TableSchema,
};
use std::io::{self, Cursor, Read, Write};
use std::sync::Arc;
use std::thread;
use tempfile::NamedTempFile;

fn schema() -> Arc<TableSchema> {
    Arc::new(TableSchema::new(
        "t",
        vec![
            Column::new("id", ColumnType::Int),
            Column::new("name", ColumnType::Varchar),
        ],
    ))
}

fn csv_stmt(path: &str) -> LoadDataStmt {
    LoadDataStmt::new(path, "t").with_format(LoadFormat::csv())
}

fn small_batches(rows: u64) -> LoadConfig {
    LoadConfig {
        max_rows_in_batch: rows,
        read_buffer_size: 3,
        ..LoadConfig::default()
    }
}

fn exec_with(
    stmt: LoadDataStmt,
    session: Arc<Session>,
    storage: Arc<RecordingStorage>,
) -> LoadDataExec {
    LoadDataExec::new(
        stmt,
        schema(),
        session,
        storage,
        Arc::new(PassThroughEncoder),
        Arc::new(VarEvaluator),
    )
}

fn exec_encoding(
    stmt: LoadDataStmt,
    session: Arc<Session>,
    storage: Arc<RecordingStorage>,
    encoder: Arc<dyn RowEncoder>,
) -> LoadDataExec {
    LoadDataExec::new(stmt, schema(), session, storage, encoder, Arc::new(VarEvaluator))
}

/// Yields its data, then fails instead of reporting end of input.
struct BrokenReader(Cursor<Vec<u8>>);

impl Read for BrokenReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.0.read(buf)? {
            0 => Err(io::Error::new(io::ErrorKind::Other, "connection reset")),
            n => Ok(n),
        }
    }
}

/// Committed first values must be a prefix of `expected`.
fn assert_committed_prefix(storage: &RecordingStorage, expected: &[&str]) {
    let rows = first_column(&storage.rows());
    assert!(
        rows.len() <= expected.len() && rows.iter().zip(expected).all(|(a, b)| a == b),
        "unexpected commits {rows:?}"
    );
}

fn exec(stmt: LoadDataStmt, storage: Arc<RecordingStorage>) -> LoadDataExec {
    exec_with(stmt, Arc::new(Session::new()), storage)
}

// ==================== Happy path ====================

#[test]
fn test_load_csv_with_null() {
    let storage = Arc::new(RecordingStorage::new());
    let summary = exec(csv_stmt("data.csv"), storage.clone())
        .execute(Cursor::new(b"1,foo\n2,\\N\n"))
        .unwrap();

    let rows = storage.rows();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0][0].to_string(), "1");
    assert_eq!(rows[0][1].to_string(), "foo");
    assert_eq!(rows[1][0].to_string(), "2");
    assert!(rows[1][1].is_null());

    assert_eq!(summary.records, 2);
    assert_eq!(summary.message, "Records: 2  Deleted: 0  Skipped: 0  Warnings: 0");
}

#[test]
fn test_last_line_without_terminator() {
    let storage = Arc::new(RecordingStorage::new());
    exec(csv_stmt("data.csv"), storage.clone())
        .execute(Cursor::new(b"1,a\n2,b"))
        .unwrap();
    assert_eq!(first_column(&storage.rows()), vec!["1", "2"]);
}

#[test]
fn test_small_batches_committed_in_order() {
    let storage = Arc::new(RecordingStorage::new());
    let input = b"1,a\n2,b\n3,c\n4,d\n5,e\n6,f\n7,g\n";
    let summary = exec(
        csv_stmt("data.csv").with_config(small_batches(2)),
        storage.clone(),
    )
    .execute(Cursor::new(input))
    .unwrap();

    let committed = storage.committed();
    let sizes: Vec<usize> = committed.iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![2, 2, 2, 1]);
    assert_eq!(
        first_column(&storage.rows()),
        vec!["1", "2", "3", "4", "5", "6", "7"]
    );
    assert_eq!(summary.records, 7);
}

#[test]
fn test_ignore_header_line() {
    let storage = Arc::new(RecordingStorage::new());
    let config = LoadConfig {
        ignore_lines: 1,
        ..LoadConfig::default()
    };
    exec(csv_stmt("data.csv").with_config(config), storage.clone())
        .execute(Cursor::new(b"id,name\n1,a\n2,b\n"))
        .unwrap();
    assert_eq!(first_column(&storage.rows()), vec!["1", "2"]);
}

#[test]
fn test_user_variable_assignment() {
    let storage = Arc::new(RecordingStorage::new());
    let stmt = csv_stmt("data.csv")
        .with_columns([ColumnOrVar::parse("id"), ColumnOrVar::parse("@n")])
        .with_assignment("name", "@n");
    let session = Arc::new(Session::new());
    exec_with(stmt, session.clone(), storage.clone())
        .execute(Cursor::new(b"1,foo\n2,bar\n"))
        .unwrap();

    let rows = storage.rows();
    assert_eq!(rows[0][1].to_string(), "foo");
    assert_eq!(rows[1][1].to_string(), "bar");
    assert_eq!(session.user_var("n").map(|d| d.to_string()), Some("bar".into()));
}

#[test]
fn test_execute_path_reads_file() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"10\tten\n20\ttwenty\n").unwrap();
    file.flush().unwrap();

    let storage = Arc::new(RecordingStorage::new());
    let path = file.path().to_string_lossy().into_owned();
    let summary = exec(LoadDataStmt::new(path, "t"), storage.clone())
        .execute_path()
        .unwrap();

    assert_eq!(summary.records, 2);
    assert_eq!(first_column(&storage.rows()), vec!["10", "20"]);
}

// ==================== Statement errors ====================

#[test]
fn test_non_local_rejected() {
    let config = LoadConfig {
        local: false,
        ..LoadConfig::default()
    };
    let err = exec(
        csv_stmt("data.csv").with_config(config),
        Arc::new(RecordingStorage::new()),
    )
    .execute(Cursor::new(b"1,a\n"))
    .unwrap_err();
    assert!(matches!(err, LoadError::Config(_)));
}

#[test]
fn test_empty_line_terminator_rejected() {
    let storage = Arc::new(RecordingStorage::new());
    let stmt = LoadDataStmt::new("data.csv", "t")
        .with_format(LoadFormat::csv().with_line_terminator(""));
    let err = exec(stmt, storage.clone())
        .execute(Cursor::new(b"1,a\n"))
        .unwrap_err();
    assert!(matches!(err, LoadError::Format(_)));
    assert!(storage.committed().is_empty());
}

#[test]
fn test_empty_path_rejected() {
    let err = exec(csv_stmt(""), Arc::new(RecordingStorage::new()))
        .execute(Cursor::new(b"1,a\n"))
        .unwrap_err();
    assert!(err.to_string().contains("infile path is empty"));
}

#[test]
fn test_missing_file_is_io_error() {
    let err = exec(
        csv_stmt("/nonexistent/infile/data.csv"),
        Arc::new(RecordingStorage::new()),
    )
    .execute_path()
    .unwrap_err();
    assert!(matches!(err, LoadError::Io(_)));
}

#[test]
fn test_unknown_column_rejected() {
    let stmt = csv_stmt("data.csv").with_columns([ColumnOrVar::parse("nope")]);
    let err = exec(stmt, Arc::new(RecordingStorage::new()))
        .execute(Cursor::new(b"1\n"))
        .unwrap_err();
    assert!(matches!(err, LoadError::UnknownColumn { .. }));
}

#[test]
fn test_load_already_in_progress() {
    let session = Arc::new(Session::new());
    let storage = Arc::new(RecordingStorage::new());
    let load = exec_with(csv_stmt("data.csv"), session.clone(), storage.clone());

    let guard = session.begin_load().unwrap();
    let err = load.execute(Cursor::new(b"1,a\n")).unwrap_err();
    assert!(err.to_string().contains("isn't closed normal"));
    drop(guard);

    // the stale marker was cleared; the next statement runs
    load.execute(Cursor::new(b"1,a\n")).unwrap();
    assert!(!session.load_in_progress());
    assert_eq!(storage.rows().len(), 1);
}

// ==================== Failures mid-load ====================

#[test]
fn test_commit_failure_keeps_earlier_batches() {
    let storage = Arc::new(RecordingStorage::failing_commit(2));
    let load = exec(
        csv_stmt("data.csv").with_config(small_batches(1)),
        storage.clone(),
    );
    let err = load
        .execute(Cursor::new(b"1,a\n2,b\n3,c\n4,d\n5,e\n"))
        .unwrap_err();

    assert!(matches!(err, LoadError::Storage(_)), "got {err:?}");
    assert_eq!(first_column(&storage.rows()), vec!["1"]);
    assert!(storage.rollbacks() >= 1);
    assert!(load.summary().records >= 2);
}

#[test]
fn test_kill_interrupts_after_current_task() {
    let session = Arc::new(Session::new());
    let storage = Arc::new(RecordingStorage::new());
    let load = exec_with(
        csv_stmt("data.csv").with_config(small_batches(1)),
        session.clone(),
        storage.clone(),
    );
    session.kill();

    let err = load
        .execute(Cursor::new(b"1,a\n2,b\n3,c\n4,d\n"))
        .unwrap_err();
    assert!(matches!(err, LoadError::Interrupted), "got {err:?}");
    assert_eq!(storage.committed().len(), 1);
    assert!(!session.is_killed());
}

#[test]
fn test_kill_after_last_task_interrupts() {
    let session = Arc::new(Session::new());
    let storage = Arc::new(RecordingStorage::new());
    let load = exec_with(csv_stmt("data.csv"), session.clone(), storage.clone());
    session.kill();

    let err = load.execute(Cursor::new(b"")).unwrap_err();
    assert!(matches!(err, LoadError::Interrupted), "got {err:?}");
    assert!(storage.committed().is_empty());
    assert!(!session.is_killed());
}

// ==================== Producer failures ====================

#[test]
fn test_producer_panic_cancels_load() {
    let session = Arc::new(Session::new());
    let storage = Arc::new(RecordingStorage::new());
    let load = exec_encoding(
        csv_stmt("data.csv").with_config(small_batches(1)),
        session.clone(),
        storage.clone(),
        Arc::new(TripwireEncoder::panicking("boom")),
    );

    let (tx, rx) = crossbeam_channel::bounded(1);
    thread::spawn(move || {
        let _ = tx.send(load.execute(Cursor::new(b"1,a\nboom,b\n3,c\n")));
    });
    let err = rx
        .recv_timeout(WAIT)
        .expect("load did not return after a producer panic")
        .unwrap_err();

    assert!(
        matches!(err, LoadError::ProducerPanicked(ref m) if m == "cannot encode boom"),
        "got {err:?}"
    );
    assert!(!session.load_in_progress());
    assert!(storage.rollbacks() >= 1);
    assert_committed_prefix(&storage, &["1"]);
}

#[test]
fn test_producer_fatal_row_error_rolls_back() {
    let session = Arc::new(Session::new());
    let storage = Arc::new(RecordingStorage::new());
    let load = exec_encoding(
        csv_stmt("data.csv").with_config(small_batches(1)),
        session.clone(),
        storage.clone(),
        Arc::new(TripwireEncoder::fatal("3")),
    );

    let err = load
        .execute(Cursor::new(b"1,a\n2,b\n3,c\n4,d\n5,e\n"))
        .unwrap_err();

    assert!(matches!(err, LoadError::Row(RowError::Fatal(_))), "got {err:?}");
    assert!(storage.rollbacks() >= 1);
    assert!(!session.load_in_progress());
    // queued tasks behind the failure are discarded
    assert_committed_prefix(&storage, &["1", "2"]);
}

#[test]
fn test_reader_error_mid_stream() {
    let session = Arc::new(Session::new());
    let storage = Arc::new(RecordingStorage::new());
    let load = exec_with(
        csv_stmt("data.csv").with_config(small_batches(1)),
        session.clone(),
        storage.clone(),
    );

    let reader = BrokenReader(Cursor::new(b"1,a\n2,b\n3,".to_vec()));
    let err = load.execute(reader).unwrap_err();

    assert!(matches!(err, LoadError::Io(ref e) if e.to_string() == "connection reset"), "got {err:?}");
    assert!(storage.rollbacks() >= 1);
    assert!(!session.load_in_progress());
    assert_committed_prefix(&storage, &["1", "2"]);

    // the session is free for the next statement
    load.execute(Cursor::new(b"9,z\n")).unwrap();
    assert_eq!(first_column(&storage.rows()).last().map(String::as_str), Some("9"));
}
