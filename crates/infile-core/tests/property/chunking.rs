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

//! Property-based tests for line splitting across chunk boundaries.
//!
//! The caller carries leftover bytes between chunks; the lines produced must
//! not depend on where the input was cut.

use infile_core::lex::LineSplitter;
use infile_core::LoadFormat;
use proptest::prelude::*;

fn split_chunked(splitter: &LineSplitter, chunks: &[&[u8]]) -> Vec<Vec<u8>> {
    let mut lines = Vec::new();
    let mut leftover: Vec<u8> = Vec::new();
    for chunk in chunks {
        leftover.extend_from_slice(chunk);
        loop {
            let split = splitter.split(&leftover, false);
            match split.line {
                Some(line) => {
                    lines.push(line.to_vec());
                    leftover = split.rest.to_vec();
                }
                None => break,
            }
        }
    }
    if !leftover.is_empty() {
        lines.push(leftover);
    }
    lines
}

fn rows_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(
        prop::collection::vec(
            prop_oneof!["[a-z0-9]{0,6}", "\"[a-z,\n]{0,6}\""],
            1..5,
        )
        .prop_map(|fields| fields.join(",")),
        1..10,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    /// Property: any two-way cut of the input yields the same lines.
    #[test]
    fn prop_chunking_invariance(rows in rows_strategy(), cut in any::<prop::sample::Index>()) {
        let format = LoadFormat::csv();
        let splitter = LineSplitter::new(&format);
        let data = format!("{}\n", rows.join("\n"));
        let bytes = data.as_bytes();

        let whole = split_chunked(&splitter, &[bytes]);
        let at = cut.index(bytes.len() + 1);
        let parts = split_chunked(&splitter, &[&bytes[..at], &bytes[at..]]);

        prop_assert_eq!(whole.len(), rows.len());
        prop_assert_eq!(whole, parts);
    }

    /// Property: byte-at-a-time feeding yields the same lines.
    #[test]
    fn prop_bytewise_feeding(rows in rows_strategy()) {
        let format = LoadFormat::csv();
        let splitter = LineSplitter::new(&format);
        let data = format!("{}\n", rows.join("\n"));
        let bytes = data.as_bytes();

        let whole = split_chunked(&splitter, &[bytes]);
        let single: Vec<&[u8]> = bytes.chunks(1).collect();
        prop_assert_eq!(whole, split_chunked(&splitter, &single));
    }
}
