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


//! Values and rows.

use crate::schema::ColumnType;
use chrono::{Local, NaiveDate, NaiveDateTime};
use std::fmt;

/// A single column value.
///
/// Input fields enter as [`Datum::Bytes`]; typed variants are produced by a
/// [`RowEncoder`](crate::RowEncoder) or an expression evaluator.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Datum {
    /// SQL NULL.
    #[default]
    Null,
    /// Signed integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// Raw bytes, usually text.
    Bytes(Vec<u8>),
    /// Calendar date.
    Date(NaiveDate),
    /// Date and time without zone.
    DateTime(NaiveDateTime),
}

/// One table row in column order.
pub type Row = Vec<Datum>;

impl Datum {
    /// Create a bytes datum.
    #[inline]
    pub fn bytes(value: impl Into<Vec<u8>>) -> Self {
        Datum::Bytes(value.into())
    }

    /// Whether this is NULL.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Datum::Null)
    }

    /// The current local time in the representation of `ty`.
    ///
    /// Used for missing `NOT NULL` temporal columns.
    ///
    /// ```rust
    /// use infile::{ColumnType, Datum};
    ///
    /// assert!(matches!(Datum::current_time(ColumnType::Date), Datum::Date(_)));
    /// assert!(matches!(Datum::current_time(ColumnType::Timestamp), Datum::DateTime(_)));
    /// ```
    pub fn current_time(ty: ColumnType) -> Self {
        let now = Local::now().naive_local();
        match ty {
            ColumnType::Date => Datum::Date(now.date()),
            _ => Datum::DateTime(now),
        }
    }

    /// Text form used for messages and keys. NULL renders as `NULL`.
    pub fn to_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Datum::Null => f.write_str("NULL"),
            Datum::Int(v) => write!(f, "{v}"),
            Datum::Float(v) => write!(f, "{v}"),
            Datum::Bytes(v) => f.write_str(&String::from_utf8_lossy(v)),
            Datum::Date(v) => write!(f, "{}", v.format("%Y-%m-%d")),
            Datum::DateTime(v) => write!(f, "{}", v.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl From<i64> for Datum {
    fn from(v: i64) -> Self {
        Datum::Int(v)
    }
}

impl From<&str> for Datum {
    fn from(v: &str) -> Self {
        Datum::Bytes(v.as_bytes().to_vec())
    }
}

impl From<String> for Datum {
    fn from(v: String) -> Self {
        Datum::Bytes(v.into_bytes())
    }
}
