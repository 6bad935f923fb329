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

//! Line boundary detection over a partially received buffer.
//!
//! [`LineSplitter::split`] is a pure function of the buffer: bytes carried over
//! from the previous chunk are the caller's to keep and prepend.
//!
//! # Terminator search
//!
//! With an enclosing byte configured, a line terminator may legally appear
//! inside a quoted field, so the search walks the buffer field by field with
//! the same rules [`FieldScanner`](super::FieldScanner) uses. When neither an
//! enclosing nor an escape byte is configured and the two terminators cannot
//! overlap, nothing can hide a terminator and a SIMD substring search is used.

use super::terminator::{TermKind, Terminators};
use crate::format::LoadFormat;
use memchr::memmem;

/// Outcome of one [`LineSplitter::split`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSplit<'a> {
    /// The line without starting marker and terminator, if one is complete.
    pub line: Option<&'a [u8]>,
    /// Bytes after the line terminator, or the unconsumed buffer when no
    /// complete line was found.
    pub rest: &'a [u8],
    /// Whether the line starting marker was found (always true without one).
    pub has_starting: bool,
}

/// Carves lines out of a byte buffer.
///
/// # Examples
///
/// ```rust
/// use infile_core::{lex::LineSplitter, LoadFormat};
///
/// let format = LoadFormat::csv();
/// let splitter = LineSplitter::new(&format);
///
/// let split = splitter.split(b"1,\"a\nb\"\n2,c", false);
/// assert_eq!(split.line, Some(&b"1,\"a\nb\""[..]));
/// assert_eq!(split.rest, b"2,c");
///
/// // No terminator yet: wait for more bytes.
/// let split = splitter.split(split.rest, false);
/// assert_eq!(split.line, None);
/// assert_eq!(split.rest, b"2,c");
/// ```
#[derive(Debug, Clone)]
pub struct LineSplitter {
    terms: Terminators,
    starting: Vec<u8>,
    enclosed: Option<u8>,
    escaped: Option<u8>,
    finder: memmem::Finder<'static>,
    fast_path: bool,
}

impl LineSplitter {
    /// Create a splitter for a validated format.
    pub fn new(format: &LoadFormat) -> Self {
        let terms = Terminators::new(&format.fields.terminated, &format.lines.terminated);
        let fast_path =
            format.fields.enclosed.is_none() && format.fields.escaped.is_none() && terms.disjoint();
        Self {
            finder: memmem::Finder::new(&format.lines.terminated).into_owned(),
            terms,
            starting: format.lines.starting.clone(),
            enclosed: format.fields.enclosed,
            escaped: format.fields.escaped,
            fast_path,
        }
    }

    /// Length of the line starting marker.
    #[inline]
    pub fn starting_len(&self) -> usize {
        self.starting.len()
    }

    /// Whether terminator search skips the quoting-aware scan.
    #[inline]
    pub fn uses_fast_path(&self) -> bool {
        self.fast_path
    }

    /// Find the next complete line in `data`.
    ///
    /// With `skip_unterminated` the terminator is located by plain substring
    /// search. Used for lines that are discarded anyway (`IGNORE n LINES`).
    pub fn split<'a>(&self, data: &'a [u8], skip_unterminated: bool) -> LineSplit<'a> {
        let start_len = self.starting.len();
        let mut data = data;
        if start_len != 0 {
            if data.len() < start_len {
                return LineSplit {
                    line: None,
                    rest: data,
                    has_starting: false,
                };
            }
            match memmem::find(data, &self.starting) {
                Some(idx) => data = &data[idx..],
                None => {
                    // keep a tail that may still grow into the marker
                    return LineSplit {
                        line: None,
                        rest: &data[data.len() - start_len + 1..],
                        has_starting: false,
                    };
                }
            }
        }

        let body = &data[start_len..];
        let end = if skip_unterminated || self.fast_path {
            self.finder.find(body)
        } else {
            self.index_of_terminator(body)
        };

        match end {
            Some(idx) => LineSplit {
                line: Some(&body[..idx]),
                rest: &body[idx + self.terms.line().len()..],
                has_starting: true,
            },
            None => LineSplit {
                line: None,
                rest: data,
                has_starting: true,
            },
        }
    }

    /// Offset of the first line terminator that is not inside an enclosed
    /// field or behind an escape byte.
    ///
    /// ```rust
    /// use infile_core::{lex::LineSplitter, LoadFormat};
    ///
    /// let format = LoadFormat::csv();
    /// let splitter = LineSplitter::new(&format);
    /// assert_eq!(splitter.index_of_terminator(b"\"x\ny\",z\nrest"), Some(7));
    /// assert_eq!(splitter.index_of_terminator(b"\"open\n"), None);
    /// ```
    pub fn index_of_terminator(&self, bs: &[u8]) -> Option<usize> {
        let field_len = self.terms.field().len();
        let mut at_field_start = true;
        let mut in_quote = false;
        let mut i = 0;

        while i < bs.len() {
            let b = bs[i];

            if at_field_start && Some(b) == self.enclosed {
                in_quote = !in_quote;
                at_field_start = false;
                i += 1;
                continue;
            }

            if in_quote && Some(b) == self.enclosed {
                // doubled quote stays inside the enclosure
                if bs.get(i + 1).copied() == self.enclosed {
                    i += 2;
                    continue;
                }
                match self.terms.classify(&bs[i + 1..]) {
                    TermKind::Line => return Some(i + 1),
                    TermKind::Field => {
                        i += 1 + field_len;
                        in_quote = false;
                        at_field_start = true;
                        continue;
                    }
                    TermKind::None => {}
                }
            }

            if !in_quote {
                match self.terms.classify(&bs[i..]) {
                    TermKind::Line => return Some(i),
                    TermKind::Field => {
                        i += field_len;
                        at_field_start = true;
                        continue;
                    }
                    TermKind::None => {}
                }
            }

            if Some(b) == self.escaped {
                i += 1;
            }
            at_field_start = false;
            i += 1;
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(splitter: &LineSplitter, mut data: &[u8]) -> Vec<Vec<u8>> {
        let mut out = Vec::new();
        loop {
            let split = splitter.split(data, false);
            match split.line {
                Some(line) => {
                    out.push(line.to_vec());
                    data = split.rest;
                }
                None => return out,
            }
        }
    }

    #[test]
    fn test_split_simple_lines() {
        let splitter = LineSplitter::new(&LoadFormat::csv());
        let got = lines(&splitter, b"a,b\nc,d\n");
        assert_eq!(got, vec![b"a,b".to_vec(), b"c,d".to_vec()]);
    }

    #[test]
    fn test_incomplete_line_is_left_in_rest() {
        let splitter = LineSplitter::new(&LoadFormat::csv());
        let split = splitter.split(b"a,b", false);
        assert_eq!(split.line, None);
        assert_eq!(split.rest, b"a,b");
        assert!(split.has_starting);
    }

    #[test]
    fn test_quoted_line_terminator_is_literal() {
        let splitter = LineSplitter::new(&LoadFormat::csv());
        let got = lines(&splitter, b"1,\"x\ny\"\n2,z\n");
        assert_eq!(got, vec![b"1,\"x\ny\"".to_vec(), b"2,z".to_vec()]);
    }

    #[test]
    fn test_doubled_quote_does_not_close_enclosure() {
        let splitter = LineSplitter::new(&LoadFormat::csv());
        let got = lines(&splitter, b"\"a\"\",\nb\"\nnext\n");
        assert_eq!(got, vec![b"\"a\"\",\nb\"".to_vec(), b"next".to_vec()]);
    }

    #[test]
    fn test_escaped_line_terminator_is_literal() {
        let splitter = LineSplitter::new(&LoadFormat::csv());
        let got = lines(&splitter, b"a\\\nb\nc\n");
        assert_eq!(got, vec![b"a\\\nb".to_vec(), b"c".to_vec()]);
    }

    #[test]
    fn test_prefix_ambiguity_prefers_line_terminator() {
        let format = LoadFormat::default()
            .with_field_terminator("\r")
            .with_line_terminator("\r\n");
        let splitter = LineSplitter::new(&format);
        let got = lines(&splitter, b"a\r\nb\r\n");
        assert_eq!(got, vec![b"a".to_vec(), b"b".to_vec()]);

        let got = lines(&splitter, b"a\rb\r\nc\r\n");
        assert_eq!(got, vec![b"a\rb".to_vec(), b"c".to_vec()]);
    }

    #[test]
    fn test_overlapping_terminators_walk_fields() {
        let format = LoadFormat::default()
            .with_escaped(None)
            .with_field_terminator("ab")
            .with_line_terminator("ba");
        let splitter = LineSplitter::new(&format);
        assert!(!splitter.uses_fast_path());
        // `ab` is consumed as a field break, so the `ba` at offset 1 never matches
        let split = splitter.split(b"xabaz", false);
        assert_eq!(split.line, None);
    }

    #[test]
    fn test_fast_path_selection() {
        let plain = LoadFormat::default()
            .with_field_terminator(",")
            .with_escaped(None);
        assert!(LineSplitter::new(&plain).uses_fast_path());
        assert!(!LineSplitter::new(&LoadFormat::csv()).uses_fast_path());
        assert!(!LineSplitter::new(&LoadFormat::default()).uses_fast_path());

        let splitter = LineSplitter::new(&plain);
        let got = lines(&splitter, b"a,\"b\nc\"\n");
        assert_eq!(got, vec![b"a,\"b".to_vec(), b"c\"".to_vec()]);
    }

    #[test]
    fn test_starting_marker() {
        let format = LoadFormat::csv().with_line_starting("xxx");
        let splitter = LineSplitter::new(&format);

        let split = splitter.split(b"junk xxxa,b\nxxxc\n", false);
        assert!(split.has_starting);
        assert_eq!(split.line, Some(&b"a,b"[..]));
        assert_eq!(split.rest, b"xxxc\n");

        let split = splitter.split(split.rest, false);
        assert_eq!(split.line, Some(&b"c"[..]));
        assert!(split.rest.is_empty());
    }

    #[test]
    fn test_missing_starting_marker_keeps_possible_prefix() {
        let format = LoadFormat::csv().with_line_starting("xxx");
        let splitter = LineSplitter::new(&format);

        let split = splitter.split(b"no marker here x", false);
        assert!(!split.has_starting);
        assert_eq!(split.line, None);
        assert_eq!(split.rest, b" x");

        let split = splitter.split(b"xx", false);
        assert!(!split.has_starting);
        assert_eq!(split.rest, b"xx");
    }

    #[test]
    fn test_marker_without_terminator_returns_marker_onwards() {
        let format = LoadFormat::csv().with_line_starting(">");
        let splitter = LineSplitter::new(&format);
        let split = splitter.split(b"junk>abc", false);
        assert!(split.has_starting);
        assert_eq!(split.line, None);
        assert_eq!(split.rest, b">abc");
    }

    #[test]
    fn test_skip_unterminated_uses_plain_search() {
        let splitter = LineSplitter::new(&LoadFormat::csv());
        let split = splitter.split(b"\"header\nstill\"\nrow\n", true);
        assert_eq!(split.line, Some(&b"\"header"[..]));
        assert_eq!(split.rest, b"still\"\nrow\n");
    }

    #[test]
    fn test_empty_lines() {
        let splitter = LineSplitter::new(&LoadFormat::csv());
        let got = lines(&splitter, b"\n\nx\n");
        assert_eq!(got, vec![Vec::new(), Vec::new(), b"x".to_vec()]);
    }
}
