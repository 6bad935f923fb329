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


//! Field mapping: which input field feeds which column or user variable.
//!
//! Built once per statement. The mapping is addressed positionally: entry
//! `i` consumes field `i` of every line. [`LoadColumns`] describes the row
//! the assembler produces: one value per column target in mapping order,
//! followed by one value per `SET` assignment.

use crate::config::{Assignment, ColumnOrVar};
use crate::error::{LoadError, LoadResult};
use crate::schema::{TableSchema, ROW_ID_COLUMN};
use std::collections::HashSet;

/// Destination of one input field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingTarget {
    /// Table column by schema index.
    Column(usize),
    /// The hidden row handle.
    RowId,
    /// User variable (lowercase name).
    UserVar(String),
    /// Consumed and dropped (generated column in an implicit mapping).
    Discard,
}

/// A column in the assembled row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadColumn {
    /// Table column by schema index.
    Table(usize),
    /// The hidden row handle.
    RowId,
}

/// Columns of the assembled row, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadColumns {
    columns: Vec<LoadColumn>,
}

impl LoadColumns {
    /// Number of values per assembled row.
    #[inline]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// True when rows carry no values.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Iterate in row order.
    pub fn iter(&self) -> impl Iterator<Item = LoadColumn> + '_ {
        self.columns.iter().copied()
    }

    /// Column at row position `pos`.
    #[inline]
    pub fn get(&self, pos: usize) -> Option<LoadColumn> {
        self.columns.get(pos).copied()
    }

    /// Whether the row-id column is written.
    pub fn has_row_id(&self) -> bool {
        self.columns.contains(&LoadColumn::RowId)
    }

    /// Row position of the column named `name`.
    pub fn position(&self, schema: &TableSchema, name: &str) -> Option<usize> {
        self.columns.iter().position(|col| match *col {
            LoadColumn::Table(idx) => schema.columns[idx].name.eq_ignore_ascii_case(name),
            LoadColumn::RowId => name.eq_ignore_ascii_case(ROW_ID_COLUMN),
        })
    }
}

/// Ordered input field destinations.
///
/// # Examples
///
/// ```rust
/// use infile::{Assignment, Column, ColumnOrVar, ColumnType, FieldMapping, MappingTarget, TableSchema};
///
/// let schema = TableSchema::new(
///     "t",
///     vec![
///         Column::new("id", ColumnType::Int),
///         Column::new("name", ColumnType::Varchar),
///     ],
/// );
/// let list = [ColumnOrVar::parse("id"), ColumnOrVar::parse("@raw")];
/// let set = [Assignment::new("name", "UPPER(@raw)")];
///
/// let (mapping, columns) = FieldMapping::build(&schema, &list, &set, false).unwrap();
/// assert_eq!(mapping.targets()[1], MappingTarget::UserVar("raw".into()));
/// assert_eq!(columns.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMapping {
    targets: Vec<MappingTarget>,
}

impl FieldMapping {
    /// Resolve the column list and `SET` targets against the schema.
    ///
    /// # Errors
    ///
    /// - [`LoadError::UnknownColumn`] for a name not in the table
    /// - [`LoadError::DuplicateColumn`] for a column targeted twice
    /// - [`LoadError::GeneratedColumn`] for an explicit generated target
    /// - [`LoadError::RowIdNotAllowed`] for the row-id column without
    ///   `allow_write_row_id`
    pub fn build(
        schema: &TableSchema,
        columns_and_vars: &[ColumnOrVar],
        assignments: &[Assignment],
        allow_write_row_id: bool,
    ) -> LoadResult<(FieldMapping, LoadColumns)> {
        let mut targets = Vec::new();
        let mut columns = Vec::new();

        if columns_and_vars.is_empty() {
            for (idx, col) in schema.columns.iter().enumerate() {
                if col.generated {
                    targets.push(MappingTarget::Discard);
                } else {
                    targets.push(MappingTarget::Column(idx));
                    columns.push(LoadColumn::Table(idx));
                }
            }
        } else {
            for entry in columns_and_vars {
                match entry {
                    ColumnOrVar::UserVar(name) => {
                        targets.push(MappingTarget::UserVar(name.to_ascii_lowercase()));
                    }
                    ColumnOrVar::Column(name) => {
                        let col = resolve(schema, name, allow_write_row_id)?;
                        targets.push(match col {
                            LoadColumn::Table(idx) => MappingTarget::Column(idx),
                            LoadColumn::RowId => MappingTarget::RowId,
                        });
                        columns.push(col);
                    }
                }
            }
        }

        for assignment in assignments {
            columns.push(resolve(schema, &assignment.column, allow_write_row_id)?);
        }

        let mut seen = HashSet::with_capacity(columns.len());
        for col in &columns {
            if !seen.insert(*col) {
                let name = match *col {
                    LoadColumn::Table(idx) => schema.columns[idx].name.clone(),
                    LoadColumn::RowId => ROW_ID_COLUMN.to_string(),
                };
                return Err(LoadError::DuplicateColumn(name));
            }
        }

        Ok((FieldMapping { targets }, LoadColumns { columns }))
    }

    /// Destinations in field order.
    #[inline]
    pub fn targets(&self) -> &[MappingTarget] {
        &self.targets
    }

    /// Number of fields the mapping consumes.
    #[inline]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// True for an empty mapping.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

fn resolve(schema: &TableSchema, name: &str, allow_write_row_id: bool) -> LoadResult<LoadColumn> {
    if let Some((idx, col)) = schema.find_column(name) {
        if col.generated {
            return Err(LoadError::generated_column(&schema.name, &col.name));
        }
        return Ok(LoadColumn::Table(idx));
    }
    if schema.has_row_id() && name.eq_ignore_ascii_case(ROW_ID_COLUMN) {
        if !allow_write_row_id {
            return Err(LoadError::RowIdNotAllowed(ROW_ID_COLUMN.to_string()));
        }
        return Ok(LoadColumn::RowId);
    }
    Err(LoadError::unknown_column(&schema.name, name))
}
