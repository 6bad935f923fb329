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


#![no_main]

use infile_core::lex::{scan_fields, LineSplitter};
use infile_core::LoadFormat;
use libfuzzer_sys::fuzz_target;

/// Fuzz target for line splitting and field scanning.
///
/// The first byte selects a format; the rest is fed in two chunks split at
/// an input-derived offset. Checks that the lexer never panics, always makes
/// progress, and that chunked feeding yields the same lines as whole input.
///
/// ```bash
/// cargo fuzz run fuzz_split_lines -- -max_len=4096
/// ```
fuzz_target!(|data: &[u8]| {
    let Some((&selector, input)) = data.split_first() else {
        return;
    };

    let format = match selector % 4 {
        0 => LoadFormat::default(),
        1 => LoadFormat::csv(),
        2 => LoadFormat::default()
            .with_field_terminator("\r")
            .with_line_terminator("\r\n"),
        _ => LoadFormat::csv().with_line_starting("::"),
    };
    let splitter = LineSplitter::new(&format);

    let whole = collect(&splitter, &format, &[input]);
    let cut = usize::from(selector) % (input.len() + 1);
    let chunked = collect(&splitter, &format, &[&input[..cut], &input[cut..]]);
    assert_eq!(whole, chunked);
});

fn collect(splitter: &LineSplitter, format: &LoadFormat, chunks: &[&[u8]]) -> Vec<Vec<u8>> {
    let mut lines = Vec::new();
    let mut pending = Vec::new();
    for chunk in chunks {
        pending.extend_from_slice(chunk);
        let mut rest = pending.as_slice();
        loop {
            let split = splitter.split(rest, false);
            assert!(split.rest.len() <= rest.len());
            let Some(line) = split.line else {
                rest = split.rest;
                break;
            };
            let _ = scan_fields(line, &format.fields);
            lines.push(line.to_vec());
            rest = split.rest;
        }
        pending = rest.to_vec();
    }
    lines
}
