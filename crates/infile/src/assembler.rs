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


//! Record assembly: scanned fields to a table row.

use crate::config::Assignment;
use crate::datum::{Datum, Row};
use crate::engine::{EvalContext, ExprEvaluator, RowEncoder};
use crate::error::{LoadError, LoadResult, RowError};
use crate::mapping::{FieldMapping, LoadColumns, MappingTarget};
use crate::schema::TableSchema;
use crate::session::{Session, StatementContext};
use infile_core::Field;
use std::sync::Arc;
use tracing::debug;

/// Builds rows from fields according to a [`FieldMapping`].
///
/// Field-level policy:
///
/// - a missing field sets a user variable to the empty string, a missing
///   `NOT NULL` temporal column to the current time, anything else to NULL
/// - an unenclosed NULL sentinel becomes NULL; an enclosed one stays literal
/// - `SET` assignments are evaluated after all fields, in order
///
/// Recoverable errors become statement warnings and drop the row.
pub struct RecordAssembler {
    schema: Arc<TableSchema>,
    mapping: FieldMapping,
    columns: LoadColumns,
    assignments: Vec<Assignment>,
    session: Arc<Session>,
    stmt: Arc<StatementContext>,
    encoder: Arc<dyn RowEncoder>,
    evaluator: Arc<dyn ExprEvaluator>,
}

impl RecordAssembler {
    /// Create an assembler. `columns` must come from the same
    /// [`FieldMapping::build`] call as `mapping`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        schema: Arc<TableSchema>,
        mapping: FieldMapping,
        columns: LoadColumns,
        assignments: Vec<Assignment>,
        session: Arc<Session>,
        stmt: Arc<StatementContext>,
        encoder: Arc<dyn RowEncoder>,
        evaluator: Arc<dyn ExprEvaluator>,
    ) -> Self {
        Self {
            schema,
            mapping,
            columns,
            assignments,
            session,
            stmt,
            encoder,
            evaluator,
        }
    }

    /// Columns of the assembled row.
    pub fn columns(&self) -> &LoadColumns {
        &self.columns
    }

    /// Build one row.
    ///
    /// Returns `Ok(None)` when the row was dropped with a warning.
    pub fn assemble(&self, fields: Vec<Field>) -> LoadResult<Option<Row>> {
        let mut values = Vec::with_capacity(self.columns.len());
        let mut fields = fields.into_iter();

        for target in self.mapping.targets() {
            let field = fields.next();
            match target {
                MappingTarget::Discard => {}
                MappingTarget::UserVar(name) => {
                    let value = match field {
                        None => Datum::bytes(Vec::new()),
                        Some(f) if f.is_null() => Datum::Null,
                        Some(f) => Datum::Bytes(f.bytes),
                    };
                    self.session.set_user_var(name, value);
                }
                MappingTarget::Column(idx) => {
                    let value = match field {
                        None => {
                            let col = &self.schema.columns[*idx];
                            if col.ty.is_temporal() && col.not_null {
                                Datum::current_time(col.ty)
                            } else {
                                Datum::Null
                            }
                        }
                        Some(f) => field_value(f),
                    };
                    values.push(value);
                }
                MappingTarget::RowId => {
                    values.push(field.map_or(Datum::Null, field_value));
                }
            }
        }

        for assignment in &self.assignments {
            let ctx = EvalContext {
                session: &self.session,
                schema: &self.schema,
                columns: &self.columns,
                values: &values,
            };
            match self.evaluator.eval(&assignment.expr, &ctx) {
                Ok(value) => values.push(value),
                Err(err) => return self.drop_row(err),
            }
        }

        match self.encoder.encode(&self.columns, values) {
            Ok(row) => Ok(Some(row)),
            Err(err) => self.drop_row(err),
        }
    }

    fn drop_row(&self, err: RowError) -> LoadResult<Option<Row>> {
        if err.is_fatal() {
            return Err(LoadError::Row(err));
        }
        debug!(error = %err, "row dropped with warning");
        self.stmt.append_warning(err.to_string());
        Ok(None)
    }
}

fn field_value(field: Field) -> Datum {
    if field.is_null() {
        Datum::Null
    } else {
        Datum::Bytes(field.bytes)
    }
}
