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

//! Property-based tests for field scanning.
//!
//! # Properties Tested
//!
//! 1. **Plain round-trip**: joining N plain fields with the terminator and
//!    scanning the result yields the same N fields
//! 2. **Enclosed round-trip**: any content survives quoting with doubled
//!    quotes and escaped backslashes, including terminators and newlines

use infile_core::lex::{scan_fields, LineSplitter};
use infile_core::LoadFormat;
use proptest::prelude::*;

fn enclose(content: &str) -> String {
    let mut out = String::with_capacity(content.len() + 2);
    out.push('"');
    for ch in content.chars() {
        match ch {
            '"' => out.push_str("\"\""),
            '\\' => out.push_str("\\\\"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Property: plain fields round-trip through join + scan.
    #[test]
    fn prop_plain_fields_roundtrip(fields in prop::collection::vec("[a-z0-9 ._-]{0,8}", 1..12)) {
        let format = LoadFormat::csv();
        let line = fields.join(",");
        let scanned = scan_fields(line.as_bytes(), &format.fields);

        prop_assert_eq!(scanned.len(), fields.len());
        for (got, want) in scanned.iter().zip(&fields) {
            prop_assert_eq!(&got.bytes, &want.as_bytes().to_vec());
            prop_assert!(!got.enclosed);
        }
    }

    /// Property: plain fields round-trip with a multi-byte terminator.
    #[test]
    fn prop_multibyte_terminator_roundtrip(fields in prop::collection::vec("[a-z0-9|]{0,6}", 1..8)) {
        let format = LoadFormat::default().with_field_terminator("<|>");
        let line = fields.join("<|>");
        let scanned = scan_fields(line.as_bytes(), &format.fields);

        prop_assert_eq!(scanned.len(), fields.len());
        for (got, want) in scanned.iter().zip(&fields) {
            prop_assert_eq!(&got.bytes, &want.as_bytes().to_vec());
        }
    }

    /// Property: enclosed content with terminators, quotes, backslashes and
    /// newlines survives line splitting and scanning.
    #[test]
    fn prop_enclosed_fields_roundtrip(fields in prop::collection::vec("[a-z,\n\"\\\\ N]{0,10}", 1..6)) {
        let format = LoadFormat::csv();
        let splitter = LineSplitter::new(&format);

        let encoded: Vec<String> = fields.iter().map(|f| enclose(f)).collect();
        let data = format!("{}\n", encoded.join(","));

        let split = splitter.split(data.as_bytes(), false);
        prop_assert!(split.rest.is_empty(), "rest: {:?}", split.rest);
        let line = split.line.expect("complete line");

        let scanned = scan_fields(line, &format.fields);
        prop_assert_eq!(scanned.len(), fields.len());
        for (got, want) in scanned.iter().zip(&fields) {
            prop_assert_eq!(&got.bytes, &want.as_bytes().to_vec());
            prop_assert!(got.enclosed);
            prop_assert!(!got.is_null());
        }
    }
}
