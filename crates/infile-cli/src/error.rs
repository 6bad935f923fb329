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


//! Error type for the infile CLI.

use infile::LoadError;
use infile_core::FormatError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors reported by CLI commands.
///
/// # Examples
///
/// ```rust,no_run
/// use infile_cli::error::CliError;
///
/// fn read(path: &str) -> Result<Vec<u8>, CliError> {
///     std::fs::read(path).map_err(|e| CliError::io_error(path, e))
/// }
/// ```
#[derive(Error, Debug)]
pub enum CliError {
    /// A file could not be read.
    #[error("I/O error for '{path}': {message}")]
    Io {
        /// The file path that caused the error
        path: PathBuf,
        /// The error message
        message: String,
    },

    /// The table schema file is not valid.
    #[error("Invalid schema '{path}': {message}")]
    Schema {
        /// The schema file path
        path: PathBuf,
        /// What was wrong with it
        message: String,
    },

    /// A `FIELDS`/`LINES` option is not valid.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// The load statement failed.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Output could not be produced.
    #[error("Output error: {0}")]
    Output(String),

    /// Invalid input provided by the user.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl CliError {
    /// Create an I/O error with file path context.
    pub fn io_error(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: source.to_string(),
        }
    }

    /// Create a schema error.
    pub fn schema(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Schema {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        Self::Output(err.to_string())
    }
}
