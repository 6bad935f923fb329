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


//! Load command - run a `LOAD DATA LOCAL INFILE` into an in-memory table

use super::{datum_to_json, read_schema};
use crate::error::CliError;
use colored::Colorize;
use infile::{ColumnOrVar, LoadConfig, LoadDataExec, LoadDataStmt, Session};
use infile_core::LoadFormat;
use infile_memory::{MemStorage, SchemaRowEncoder, SimpleEvaluator};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Everything the load command needs.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Input file.
    pub file: String,
    /// JSON table schema.
    pub schema: String,
    /// `FIELDS`/`LINES` options.
    pub format: LoadFormat,
    /// Column/variable list; `@name` is a user variable.
    pub columns: Vec<String>,
    /// `SET` assignments as `column=expr`.
    pub assignments: Vec<String>,
    /// Batching, duplicate handling and skipped lines.
    pub config: LoadConfig,
    /// Print the table contents after loading.
    pub dump: bool,
}

/// Load a file and print the summary.
///
/// Warnings go to stderr. With `dump`, every row of the table is printed
/// as a JSON array after the summary.
///
/// # Errors
///
/// Returns `Err` if the schema cannot be read, an assignment is malformed,
/// or the statement fails. Batches committed before a failure are reported
/// on stderr.
///
/// # Examples
///
/// ```no_run
/// use infile_cli::commands::{load, LoadOptions};
/// use infile_core::LoadFormat;
///
/// # fn main() -> Result<(), infile_cli::error::CliError> {
/// load(&LoadOptions {
///     file: "users.csv".into(),
///     schema: "users.json".into(),
///     format: LoadFormat::csv(),
///     ..LoadOptions::default()
/// })?;
/// # Ok(())
/// # }
/// ```
pub fn load(options: &LoadOptions) -> Result<(), CliError> {
    let schema = Arc::new(read_schema(&options.schema)?);

    let mut stmt = LoadDataStmt::new(options.file.as_str(), schema.name.as_str())
        .with_format(options.format.clone())
        .with_config(options.config.clone())
        .with_columns(options.columns.iter().map(|c| ColumnOrVar::parse(c.trim())));
    for assignment in &options.assignments {
        let (column, expr) = parse_assignment(assignment)?;
        stmt = stmt.with_assignment(column, expr);
    }
    debug!(?stmt, "statement built");

    let storage = Arc::new(MemStorage::new(schema.clone()));
    let exec = LoadDataExec::new(
        stmt,
        schema.clone(),
        Arc::new(Session::new()),
        storage.clone(),
        Arc::new(SchemaRowEncoder::new(schema)),
        Arc::new(SimpleEvaluator::new()),
    );

    let result = exec.execute_path();
    for warning in exec.statement_context().warnings() {
        eprintln!("{} {}", "Warning:".yellow(), warning.message);
    }
    let summary = match result {
        Ok(summary) => summary,
        Err(err) => {
            eprintln!(
                "{} {} (committed rows kept: {})",
                "✗".red(),
                exec.summary().message,
                storage.len()
            );
            return Err(err.into());
        }
    };

    println!("{} {}", "✓".green(), summary.message);
    if options.dump {
        for row in storage.rows() {
            let values: Vec<Value> = row.iter().map(datum_to_json).collect();
            println!("{}", serde_json::to_string(&Value::Array(values))?);
        }
    }
    Ok(())
}

fn parse_assignment(text: &str) -> Result<(&str, &str), CliError> {
    match text.split_once('=') {
        Some((column, expr)) if !column.trim().is_empty() && !expr.trim().is_empty() => {
            Ok((column.trim(), expr.trim()))
        }
        _ => Err(CliError::invalid_input(format!(
            "assignment '{}' must look like column=expr",
            text
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            parse_assignment("name = UPPER(@n)").unwrap(),
            ("name", "UPPER(@n)")
        );
        assert_eq!(parse_assignment("a=b=c").unwrap(), ("a", "b=c"));
        assert!(parse_assignment("name").is_err());
        assert!(parse_assignment("=1").is_err());
    }
}
