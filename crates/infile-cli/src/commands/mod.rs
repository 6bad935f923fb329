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


//! CLI command implementations

mod load;
mod scan;

pub use load::{load, LoadOptions};
pub use scan::{scan, ScanOptions};

use crate::error::CliError;
use infile::{Datum, TableSchema};
use serde_json::Value;
use std::fs;

/// Decode backslash escapes in a command-line option value.
///
/// Recognized: `\t`, `\n`, `\r`, `\0`, `\\`, `\'`, `\"`.
///
/// ```
/// use infile_cli::commands::unescape;
///
/// assert_eq!(unescape(r"\t").unwrap(), b"\t");
/// assert_eq!(unescape(r"\r\n").unwrap(), b"\r\n");
/// assert_eq!(unescape("||").unwrap(), b"||");
/// assert!(unescape(r"\q").is_err());
/// ```
pub fn unescape(value: &str) -> Result<Vec<u8>, CliError> {
    let mut out = Vec::with_capacity(value.len());
    let mut bytes = value.bytes();
    while let Some(b) = bytes.next() {
        if b != b'\\' {
            out.push(b);
            continue;
        }
        let decoded = match bytes.next() {
            Some(b't') => b'\t',
            Some(b'n') => b'\n',
            Some(b'r') => b'\r',
            Some(b'0') => 0,
            Some(c @ (b'\\' | b'\'' | b'"')) => c,
            Some(other) => {
                return Err(CliError::invalid_input(format!(
                    "unknown escape '\\{}' in '{}'",
                    other as char, value
                )))
            }
            None => {
                return Err(CliError::invalid_input(format!(
                    "trailing backslash in '{}'",
                    value
                )))
            }
        };
        out.push(decoded);
    }
    Ok(out)
}

/// Read a table schema from a JSON file.
///
/// The row handle flag is derived from the primary key, not read.
pub fn read_schema(path: &str) -> Result<TableSchema, CliError> {
    let content = fs::read_to_string(path).map_err(|e| CliError::io_error(path, e))?;
    let mut schema: TableSchema =
        serde_json::from_str(&content).map_err(|e| CliError::schema(path, e.to_string()))?;
    if schema.columns.is_empty() {
        return Err(CliError::schema(path, "table has no columns"));
    }
    let primary_key = std::mem::take(&mut schema.primary_key);
    for name in &primary_key {
        if schema.find_column(name).is_none() {
            return Err(CliError::schema(
                path,
                format!("primary key column '{}' does not exist", name),
            ));
        }
    }
    Ok(schema.with_primary_key(primary_key))
}

/// JSON form of a stored value.
pub fn datum_to_json(datum: &Datum) -> Value {
    match datum {
        Datum::Null => Value::Null,
        Datum::Int(v) => Value::from(*v),
        Datum::Float(v) => serde_json::Number::from_f64(*v)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        other => Value::String(other.to_text()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_unescape() {
        assert_eq!(unescape(",").unwrap(), b",");
        assert_eq!(unescape(r"\\").unwrap(), b"\\");
        assert_eq!(unescape(r"\0").unwrap(), vec![0]);
        assert_eq!(unescape(r#"\""#).unwrap(), b"\"");
        assert!(unescape("\\").is_err());
    }

    #[test]
    fn test_datum_to_json() {
        assert_eq!(datum_to_json(&Datum::Null), Value::Null);
        assert_eq!(datum_to_json(&Datum::Int(3)), Value::from(3));
        assert_eq!(datum_to_json(&Datum::Float(0.5)), Value::from(0.5));
        assert_eq!(datum_to_json(&Datum::from("x")), Value::from("x"));
    }

    #[test]
    fn test_read_schema_derives_handle() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"name":"t","columns":[{{"name":"id","type":"bigint"}},{{"name":"v","type":"text"}}],"primary_key":["id"]}}"#
        )
        .unwrap();
        let schema = read_schema(file.path().to_str().unwrap()).unwrap();
        assert!(schema.pk_is_handle);
        assert_eq!(schema.primary_key, vec!["id".to_string()]);
    }

    #[test]
    fn test_read_schema_rejects_unknown_key_column() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"name":"t","columns":[{{"name":"id","type":"int"}}],"primary_key":["nope"]}}"#
        )
        .unwrap();
        let err = read_schema(file.path().to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
