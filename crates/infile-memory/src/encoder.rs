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


//! Schema-driven row encoding.
//!
//! Turns the assembler's values (raw field bytes, NULLs, `SET` results) into
//! full table rows: each value is coerced to its column type, columns
//! outside the load list get their default, auto-increment columns are
//! numbered and `NOT NULL` is enforced. Coercion failures are
//! [`RowError::Value`], so the row is dropped with a warning.

use chrono::{NaiveDate, NaiveDateTime};
use infile::{
    Column, ColumnType, Datum, LoadColumn, LoadColumns, Row, RowEncoder, RowError, RowResult,
    TableSchema,
};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"];

/// Default expressions that mean "the current time".
const CURRENT_TIME_DEFAULTS: [&str; 3] = ["CURRENT_TIMESTAMP", "NOW()", "CURRENT_TIMESTAMP()"];

/// A [`RowEncoder`] for one [`TableSchema`].
///
/// # Examples
///
/// ```rust
/// use infile::{Column, ColumnType, Datum, FieldMapping, RowEncoder, TableSchema};
/// use infile_memory::SchemaRowEncoder;
/// use std::sync::Arc;
///
/// let schema = Arc::new(TableSchema::new(
///     "t",
///     vec![
///         Column::new("id", ColumnType::Int).auto_increment(),
///         Column::new("qty", ColumnType::Int).with_default("1"),
///     ],
/// ));
/// let (_, columns) = FieldMapping::build(&schema, &[], &[], false).unwrap();
/// let encoder = SchemaRowEncoder::new(schema);
///
/// let row = encoder.encode(&columns, vec![Datum::Null, Datum::from("5")]).unwrap();
/// assert_eq!(row, vec![Datum::Int(1), Datum::Int(5)]);
/// ```
#[derive(Debug)]
pub struct SchemaRowEncoder {
    schema: Arc<TableSchema>,
    next_auto_id: AtomicI64,
}

impl SchemaRowEncoder {
    pub fn new(schema: Arc<TableSchema>) -> Self {
        Self {
            schema,
            next_auto_id: AtomicI64::new(1),
        }
    }

    fn next_id(&self) -> i64 {
        self.next_auto_id.fetch_add(1, Ordering::SeqCst)
    }

    fn observe_id(&self, id: i64) {
        self.next_auto_id
            .fetch_max(id.saturating_add(1), Ordering::SeqCst);
    }

    fn default_value(&self, col: &Column) -> RowResult<Datum> {
        match &col.default {
            Some(text) if is_current_time(text) => Ok(Datum::current_time(col.ty)),
            Some(text) => coerce(col, Datum::from(text.as_str())),
            None => Ok(Datum::Null),
        }
    }
}

impl RowEncoder for SchemaRowEncoder {
    fn encode(&self, columns: &LoadColumns, values: Vec<Datum>) -> RowResult<Row> {
        let mut slots: Vec<Option<Datum>> = vec![None; self.schema.columns.len()];
        let mut row_id = None;

        for (column, value) in columns.iter().zip(values) {
            match column {
                LoadColumn::Table(idx) => {
                    let col = &self.schema.columns[idx];
                    slots[idx] = Some(coerce(col, value)?);
                }
                LoadColumn::RowId => {
                    row_id = match value {
                        Datum::Null => None,
                        other => Some(to_int(infile::ROW_ID_COLUMN, other)?),
                    };
                }
            }
        }

        let mut row = Vec::with_capacity(slots.len() + usize::from(row_id.is_some()));
        for (col, slot) in self.schema.columns.iter().zip(slots) {
            let mut value = match slot {
                _ if col.generated => Datum::Null,
                Some(value) => value,
                None => self.default_value(col)?,
            };
            if col.auto_increment {
                match value {
                    Datum::Null | Datum::Int(0) => value = Datum::Int(self.next_id()),
                    Datum::Int(id) => self.observe_id(id),
                    _ => {}
                }
            }
            if value.is_null() && col.not_null && !col.generated {
                return Err(RowError::value(&col.name, "cannot be null"));
            }
            row.push(value);
        }
        if let Some(handle) = row_id {
            row.push(Datum::Int(handle));
        }
        Ok(row)
    }
}

fn is_current_time(text: &str) -> bool {
    CURRENT_TIME_DEFAULTS
        .iter()
        .any(|name| name.eq_ignore_ascii_case(text.trim()))
}

/// Convert `value` to the representation of `col`'s type.
pub fn coerce(col: &Column, value: Datum) -> RowResult<Datum> {
    if value.is_null() {
        return Ok(Datum::Null);
    }
    match col.ty {
        ColumnType::Int | ColumnType::BigInt => to_int(&col.name, value).map(Datum::Int),
        ColumnType::Double => to_float(&col.name, value).map(Datum::Float),
        ColumnType::Varchar | ColumnType::Text | ColumnType::Blob => Ok(match value {
            Datum::Bytes(bytes) => Datum::Bytes(bytes),
            other => Datum::from(other.to_text()),
        }),
        ColumnType::Date => to_date(&col.name, value),
        ColumnType::Datetime | ColumnType::Timestamp => to_datetime(&col.name, value),
    }
}

fn text<'a>(column: &str, bytes: &'a [u8]) -> RowResult<&'a str> {
    std::str::from_utf8(bytes)
        .map(str::trim)
        .map_err(|_| RowError::value(column, "invalid utf-8"))
}

fn to_int(column: &str, value: Datum) -> RowResult<i64> {
    match value {
        Datum::Int(v) => Ok(v),
        Datum::Float(v) => Ok(v.round() as i64),
        Datum::Bytes(bytes) => {
            let s = text(column, &bytes)?;
            s.parse::<i64>()
                .map_err(|_| RowError::value(column, format!("Incorrect integer value: '{s}'")))
        }
        other => Err(RowError::value(
            column,
            format!("Incorrect integer value: '{other}'"),
        )),
    }
}

fn to_float(column: &str, value: Datum) -> RowResult<f64> {
    match value {
        Datum::Int(v) => Ok(v as f64),
        Datum::Float(v) => Ok(v),
        Datum::Bytes(bytes) => {
            let s = text(column, &bytes)?;
            s.parse::<f64>()
                .map_err(|_| RowError::value(column, format!("Incorrect double value: '{s}'")))
        }
        other => Err(RowError::value(
            column,
            format!("Incorrect double value: '{other}'"),
        )),
    }
}

fn to_date(column: &str, value: Datum) -> RowResult<Datum> {
    match value {
        Datum::Date(d) => Ok(Datum::Date(d)),
        Datum::DateTime(dt) => Ok(Datum::Date(dt.date())),
        Datum::Bytes(bytes) => {
            let s = text(column, &bytes)?;
            parse_date(s)
                .or_else(|| parse_datetime(s).map(|dt| dt.date()))
                .map(Datum::Date)
                .ok_or_else(|| RowError::value(column, format!("Incorrect date value: '{s}'")))
        }
        other => Err(RowError::value(
            column,
            format!("Incorrect date value: '{other}'"),
        )),
    }
}

fn to_datetime(column: &str, value: Datum) -> RowResult<Datum> {
    match value {
        Datum::DateTime(dt) => Ok(Datum::DateTime(dt)),
        Datum::Date(d) => Ok(Datum::DateTime(d.and_time(Default::default()))),
        Datum::Bytes(bytes) => {
            let s = text(column, &bytes)?;
            parse_datetime(s)
                .or_else(|| parse_date(s).map(|d| d.and_time(Default::default())))
                .map(Datum::DateTime)
                .ok_or_else(|| RowError::value(column, format!("Incorrect datetime value: '{s}'")))
        }
        other => Err(RowError::value(
            column,
            format!("Incorrect datetime value: '{other}'"),
        )),
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).ok()
}

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
}
