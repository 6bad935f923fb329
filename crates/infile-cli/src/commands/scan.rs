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


//! Scan command - show how a file is split into lines and fields

use crate::error::CliError;
use infile_core::lex::{scan_fields, Field, LineSplitter};
use infile_core::LoadFormat;
use serde_json::Value;
use std::fs;
use std::io::{self, Write};

/// Options of the scan command.
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Input file.
    pub file: String,
    /// `FIELDS`/`LINES` options.
    pub format: LoadFormat,
    /// Stop after this many lines.
    pub limit: Option<usize>,
}

/// Print every line's fields as a JSON array; NULL fields print as `null`.
///
/// A final line without terminator is included, as a load would.
///
/// # Errors
///
/// Returns `Err` if the format is invalid or the file cannot be read.
pub fn scan(options: &ScanOptions) -> Result<(), CliError> {
    options.format.validate()?;
    let data = fs::read(&options.file).map_err(|e| CliError::io_error(&options.file, e))?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for line in lines(&data, &options.format)
        .into_iter()
        .take(options.limit.unwrap_or(usize::MAX))
    {
        let fields: Vec<Value> = line.iter().map(field_to_json).collect();
        writeln!(out, "{}", serde_json::to_string(&Value::Array(fields))?)
            .map_err(|e| CliError::Output(e.to_string()))?;
    }
    Ok(())
}

/// Scan `data` completely into lines of fields.
pub fn lines(data: &[u8], format: &LoadFormat) -> Vec<Vec<Field>> {
    let splitter = LineSplitter::new(format);
    let mut rows = Vec::new();
    let mut rest = data;
    loop {
        let split = splitter.split(rest, false);
        match split.line {
            Some(line) => {
                rows.push(scan_fields(line, &format.fields));
                rest = split.rest;
            }
            None => {
                if split.has_starting && split.rest.len() > splitter.starting_len() {
                    let line = &split.rest[splitter.starting_len()..];
                    rows.push(scan_fields(line, &format.fields));
                }
                return rows;
            }
        }
    }
}

fn field_to_json(field: &Field) -> Value {
    if field.is_null() {
        Value::Null
    } else {
        Value::String(String::from_utf8_lossy(&field.bytes).into_owned())
    }
}
