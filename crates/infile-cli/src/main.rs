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


//! infile Command Line Interface

use clap::Parser;
use infile_cli::cli::Commands;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// infile - bulk load delimited text
///
/// # Examples
///
/// ```bash
/// # Load a CSV file into the table described by users.json
/// infile load users.csv --schema users.json --csv
///
/// # Tab separated with a header line, replacing duplicates
/// infile load users.tsv --schema users.json --ignore-lines 1 --replace
///
/// # See how a file is split
/// infile scan data.txt --fields-terminated-by '|' --lines-terminated-by '\r\n'
/// ```
#[derive(Parser)]
#[command(name = "infile")]
#[command(author, version, about = "infile - bulk load delimited text", long_about = None)]
struct Cli {
    /// Verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Log to stderr. `RUST_LOG` overrides the default level.
fn init_tracing(verbose: bool) {
    let default = if verbose { "infile=debug" } else { "infile=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command.execute() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
