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


//! `FIELDS`/`LINES` flags.

use crate::commands::unescape;
use crate::error::CliError;
use clap::Args;
use infile_core::LoadFormat;

/// Format flags. Values accept backslash escapes (`\t`, `\n`, `\r`, `\\`,
/// `\0`). Unset flags keep the MySQL defaults, or the CSV preset with
/// `--csv`.
#[derive(Args, Debug, Clone, Default)]
pub struct FormatArgs {
    /// Start from comma separated, double-quote enclosed
    #[arg(long)]
    pub csv: bool,

    /// FIELDS TERMINATED BY
    #[arg(long, value_name = "STR")]
    pub fields_terminated_by: Option<String>,

    /// FIELDS ENCLOSED BY (one byte, empty to disable)
    #[arg(long, value_name = "CHAR")]
    pub fields_enclosed_by: Option<String>,

    /// FIELDS ESCAPED BY (one byte, empty to disable)
    #[arg(long, value_name = "CHAR")]
    pub fields_escaped_by: Option<String>,

    /// LINES STARTING BY
    #[arg(long, value_name = "STR")]
    pub lines_starting_by: Option<String>,

    /// LINES TERMINATED BY
    #[arg(long, value_name = "STR")]
    pub lines_terminated_by: Option<String>,
}

impl FormatArgs {
    /// Build and validate the load format.
    ///
    /// # Errors
    ///
    /// Returns `Err` for a malformed escape, a multi-byte enclosing or
    /// escape character, or an empty terminator.
    pub fn to_format(&self) -> Result<LoadFormat, CliError> {
        let mut format = if self.csv {
            LoadFormat::csv()
        } else {
            LoadFormat::default()
        };
        if let Some(value) = &self.fields_terminated_by {
            format.fields.terminated = unescape(value)?;
        }
        if let Some(value) = &self.fields_enclosed_by {
            format.fields.set_enclosed(&unescape(value)?)?;
        }
        if let Some(value) = &self.fields_escaped_by {
            format.fields.set_escaped(&unescape(value)?)?;
        }
        if let Some(value) = &self.lines_starting_by {
            format.lines.starting = unescape(value)?;
        }
        if let Some(value) = &self.lines_terminated_by {
            format.lines.terminated = unescape(value)?;
        }
        format.validate()?;
        Ok(format)
    }
}
