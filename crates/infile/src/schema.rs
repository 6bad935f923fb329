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


//! Table schema as seen by the loader.
//!
//! Only what column resolution and default-value policy need: names, types,
//! nullability, generated and auto-increment flags, defaults and unique keys.

/// Name of the hidden row handle column.
///
/// Present when the primary key is not itself the row handle.
pub const ROW_ID_COLUMN: &str = "_rowid";

/// Name reported for primary key conflicts.
pub const PRIMARY_KEY_NAME: &str = "PRIMARY";

/// Column data type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ColumnType {
    Int,
    BigInt,
    Double,
    Varchar,
    Text,
    Blob,
    Date,
    Datetime,
    Timestamp,
}

impl ColumnType {
    /// Date, datetime and timestamp columns.
    #[inline]
    pub fn is_temporal(self) -> bool {
        matches!(
            self,
            ColumnType::Date | ColumnType::Datetime | ColumnType::Timestamp
        )
    }

    /// Integer columns.
    #[inline]
    pub fn is_integer(self) -> bool {
        matches!(self, ColumnType::Int | ColumnType::BigInt)
    }
}

/// A table column.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Column {
    pub name: String,

    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub ty: ColumnType,

    #[cfg_attr(feature = "serde", serde(default))]
    pub not_null: bool,

    /// Computed from other columns; never written by a load.
    #[cfg_attr(feature = "serde", serde(default))]
    pub generated: bool,

    #[cfg_attr(feature = "serde", serde(default))]
    pub auto_increment: bool,

    /// Default value in text form.
    #[cfg_attr(feature = "serde", serde(default))]
    pub default: Option<String>,
}

impl Column {
    /// A nullable column without default.
    pub fn new(name: impl Into<String>, ty: ColumnType) -> Self {
        Self {
            name: name.into(),
            ty,
            not_null: false,
            generated: false,
            auto_increment: false,
            default: None,
        }
    }

    /// Mark `NOT NULL`.
    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    /// Mark as generated.
    pub fn generated(mut self) -> Self {
        self.generated = true;
        self
    }

    /// Mark `AUTO_INCREMENT`.
    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    /// Set a default value.
    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }
}

/// A unique index over one or more columns.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UniqueKey {
    pub name: String,
    pub columns: Vec<String>,
}

/// Table definition.
///
/// # Examples
///
/// ```rust
/// use infile::{Column, ColumnType, TableSchema};
///
/// let schema = TableSchema::new(
///     "t",
///     vec![
///         Column::new("id", ColumnType::Int).not_null(),
///         Column::new("name", ColumnType::Varchar),
///     ],
/// )
/// .with_primary_key(["id"]);
///
/// let (idx, col) = schema.find_column("ID").unwrap();
/// assert_eq!(idx, 0);
/// assert_eq!(col.name, "id");
/// assert!(schema.pk_is_handle);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TableSchema {
    pub name: String,

    pub columns: Vec<Column>,

    #[cfg_attr(feature = "serde", serde(default))]
    pub primary_key: Vec<String>,

    /// The primary key is a single integer column used as row handle.
    #[cfg_attr(feature = "serde", serde(default))]
    pub pk_is_handle: bool,

    #[cfg_attr(feature = "serde", serde(default))]
    pub unique_keys: Vec<UniqueKey>,
}

impl TableSchema {
    /// A table without keys.
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            columns,
            primary_key: Vec::new(),
            pk_is_handle: false,
            unique_keys: Vec::new(),
        }
    }

    /// Set the primary key. A single integer column becomes the row handle.
    pub fn with_primary_key<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_key = columns.into_iter().map(Into::into).collect();
        self.pk_is_handle = match self.primary_key.as_slice() {
            [only] => self
                .find_column(only)
                .is_some_and(|(_, col)| col.ty.is_integer()),
            _ => false,
        };
        self
    }

    /// Add a unique key.
    pub fn with_unique_key<I, S>(mut self, name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unique_keys.push(UniqueKey {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Look a column up by name, ignoring ASCII case.
    pub fn find_column(&self, name: &str) -> Option<(usize, &Column)> {
        self.columns
            .iter()
            .enumerate()
            .find(|(_, col)| col.name.eq_ignore_ascii_case(name))
    }

    /// Whether rows carry the hidden [`ROW_ID_COLUMN`].
    #[inline]
    pub fn has_row_id(&self) -> bool {
        !self.pk_is_handle
    }

    /// Primary key first, then unique keys, as `(name, column indexes)`.
    ///
    /// Keys naming unknown columns are skipped.
    pub fn keys(&self) -> Vec<(String, Vec<usize>)> {
        let mut keys = Vec::with_capacity(1 + self.unique_keys.len());
        if !self.primary_key.is_empty() {
            if let Some(cols) = self.resolve(&self.primary_key) {
                keys.push((PRIMARY_KEY_NAME.to_string(), cols));
            }
        }
        for key in &self.unique_keys {
            if let Some(cols) = self.resolve(&key.columns) {
                keys.push((key.name.clone(), cols));
            }
        }
        keys
    }

    fn resolve(&self, names: &[String]) -> Option<Vec<usize>> {
        names
            .iter()
            .map(|name| self.find_column(name).map(|(idx, _)| idx))
            .collect()
    }
}
