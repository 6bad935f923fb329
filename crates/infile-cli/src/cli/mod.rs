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


//! CLI command definitions and argument parsing.
//!
//! - [`Commands`]: the `load` and `scan` subcommands
//! - [`FormatArgs`]: `FIELDS`/`LINES` flags shared by both

mod format;

use crate::commands::{self, LoadOptions, ScanOptions};
use crate::error::CliError;
use clap::Subcommand;
use infile::{DuplicateMode, LoadConfig, DEFAULT_MAX_ROWS_IN_BATCH, DEFAULT_TASK_QUEUE_SIZE};

pub use format::FormatArgs;

/// Top-level CLI commands.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use infile_cli::cli::Commands;
///
/// #[derive(Parser)]
/// struct Cli {
///     #[command(subcommand)]
///     command: Commands,
/// }
/// ```
#[derive(Subcommand)]
pub enum Commands {
    /// Load a delimited file into an in-memory table
    ///
    /// Runs the equivalent of `LOAD DATA LOCAL INFILE` against a table
    /// described by a JSON schema, then prints the summary line.
    Load {
        /// Input file path
        #[arg(value_name = "FILE")]
        file: String,

        /// JSON table schema
        #[arg(short, long, value_name = "SCHEMA")]
        schema: String,

        #[command(flatten)]
        format: FormatArgs,

        /// Column/variable list, e.g. `id,@raw,name`
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,

        /// SET assignment `column=expr` (repeatable)
        #[arg(long = "set", value_name = "COL=EXPR")]
        assignments: Vec<String>,

        /// Skip this many leading lines
        #[arg(long, default_value_t = 0)]
        ignore_lines: u64,

        /// Rows per commit (0 = one commit at the end)
        #[arg(long, default_value_t = DEFAULT_MAX_ROWS_IN_BATCH)]
        batch_size: u64,

        /// Commit batches buffered between reader and committer
        #[arg(long, default_value_t = DEFAULT_TASK_QUEUE_SIZE)]
        queue_size: usize,

        /// Replace rows that conflict on a unique key
        #[arg(long, conflicts_with = "ignore")]
        replace: bool,

        /// Skip rows that conflict on a unique key
        #[arg(long)]
        ignore: bool,

        /// Allow writing the hidden `_rowid` column
        #[arg(long)]
        allow_row_id: bool,

        /// Print the table as JSON arrays after loading
        #[arg(long)]
        dump: bool,
    },

    /// Print the fields of each line as JSON arrays
    ///
    /// Shows how the lexer splits a file with the given options, without
    /// loading anything. NULL fields print as `null`.
    Scan {
        /// Input file path
        #[arg(value_name = "FILE")]
        file: String,

        #[command(flatten)]
        format: FormatArgs,

        /// Stop after N lines
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
}

impl Commands {
    /// Execute the command.
    ///
    /// # Errors
    ///
    /// Returns `Err` if option values are invalid or the command fails.
    pub fn execute(self) -> Result<(), CliError> {
        match self {
            Commands::Load {
                file,
                schema,
                format,
                columns,
                assignments,
                ignore_lines,
                batch_size,
                queue_size,
                replace,
                ignore,
                allow_row_id,
                dump,
            } => {
                let on_duplicate = if replace {
                    DuplicateMode::Replace
                } else if ignore {
                    DuplicateMode::Ignore
                } else {
                    DuplicateMode::Error
                };
                let config = LoadConfig {
                    max_rows_in_batch: batch_size,
                    task_queue_size: queue_size,
                    on_duplicate,
                    ignore_lines,
                    allow_write_row_id: allow_row_id,
                    ..LoadConfig::default()
                };
                commands::load(&LoadOptions {
                    file,
                    schema,
                    format: format.to_format()?,
                    columns,
                    assignments,
                    config,
                    dump,
                })
            }
            Commands::Scan {
                file,
                format,
                limit,
            } => commands::scan(&ScanOptions {
                file,
                format: format.to_format()?,
                limit,
            }),
        }
    }
}
