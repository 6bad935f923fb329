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

//! Field scanning for a single line.
//!
//! Scanning happens in two passes:
//!
//! 1. [`FieldScanner`] splits the line on the field terminator, honoring the
//!    enclosing byte. Escape pairs are copied through verbatim so an escaped
//!    byte can never be mistaken for a terminator.
//! 2. [`Field::decode`] rewrites escape pairs into a fresh buffer.
//!
//! [`scan_fields`] runs both passes and also applies the `NULL` word rule.

use super::terminator::decode_escape;
use crate::format::FieldsFormat;

const NULL_WORD: &[u8] = b"NULL";

/// A field scanned from one line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Field {
    /// Field content with enclosing quotes removed.
    pub bytes: Vec<u8>,
    /// The content decoded from the NULL sentinel.
    pub maybe_null: bool,
    /// The field was wrapped in the enclosing byte.
    pub enclosed: bool,
}

impl Field {
    /// Create an unenclosed field from raw bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            maybe_null: false,
            enclosed: false,
        }
    }

    /// Whether this field denotes SQL NULL.
    ///
    /// Only an unenclosed `\N` (or the bare word `NULL`) qualifies; quoting
    /// forces the literal value.
    ///
    /// ```rust
    /// use infile_core::{lex::scan_fields, LoadFormat};
    ///
    /// let format = LoadFormat::csv();
    /// let fields = scan_fields(br#"\N,"\N""#, &format.fields);
    /// assert!(fields[0].is_null());
    /// assert!(!fields[1].is_null());
    /// assert_eq!(fields[1].bytes, br"\N");
    /// ```
    #[inline]
    pub fn is_null(&self) -> bool {
        self.maybe_null && !self.enclosed && self.bytes == b"N"
    }

    /// Decode escape pairs into a new buffer.
    ///
    /// Inside an enclosed field `\N` is kept verbatim so a quoted sentinel
    /// loads as the two-byte string.
    pub fn decode(self, escape: Option<u8>) -> Field {
        let Some(esc) = escape else {
            return self;
        };
        if !self.bytes.contains(&esc) {
            return self;
        }

        let src = &self.bytes;
        let mut out = Vec::with_capacity(src.len());
        let mut maybe_null = self.maybe_null;
        let mut i = 0;
        while i < src.len() {
            let c = src[i];
            if c == esc && i + 1 < src.len() {
                let next = src[i + 1];
                if next == b'N' && self.enclosed {
                    out.push(c);
                    out.push(next);
                } else {
                    let decoded = decode_escape(next);
                    maybe_null |= decoded.null;
                    out.push(decoded.byte);
                }
                i += 2;
            } else {
                out.push(c);
                i += 1;
            }
        }

        Field {
            bytes: out,
            maybe_null,
            enclosed: self.enclosed,
        }
    }

    /// Turn an unenclosed `NULL` word into the NULL sentinel.
    fn normalize_null_word(mut self) -> Field {
        if !self.enclosed && self.bytes == NULL_WORD {
            self.bytes = vec![b'N'];
            self.maybe_null = true;
        }
        self
    }
}

/// Single-pass field splitter over one line.
///
/// Restartable per line only: create a new scanner for every line.
///
/// # Examples
///
/// ```rust
/// use infile_core::{lex::FieldScanner, LoadFormat};
///
/// let format = LoadFormat::csv();
/// let mut scanner = FieldScanner::new(br#"1,"a,b""#, &format.fields);
///
/// let (eol, first) = scanner.next_field();
/// assert!(!eol);
/// assert_eq!(first.bytes, b"1");
///
/// let (eol, second) = scanner.next_field();
/// assert!(eol);
/// assert_eq!(second.bytes, b"a,b");
/// assert!(second.enclosed);
/// ```
#[derive(Debug)]
pub struct FieldScanner<'a> {
    line: &'a [u8],
    pos: usize,
    term: &'a [u8],
    enclosed: Option<u8>,
    escaped: Option<u8>,
    out: Vec<u8>,
    in_enclosure: bool,
    at_field_start: bool,
    done: bool,
}

impl<'a> FieldScanner<'a> {
    /// Create a scanner for `line`.
    pub fn new(line: &'a [u8], fields: &'a FieldsFormat) -> Self {
        Self {
            line,
            pos: 0,
            term: &fields.terminated,
            enclosed: fields.enclosed,
            escaped: fields.escaped,
            out: Vec::new(),
            in_enclosure: false,
            at_field_start: true,
            done: false,
        }
    }

    #[inline]
    fn bump(&mut self) -> Option<u8> {
        let ch = self.line.get(self.pos).copied()?;
        self.pos += 1;
        Some(ch)
    }

    /// `first` was just consumed; if it starts the field terminator, consume
    /// the rest of the terminator too.
    #[inline]
    fn at_terminator(&mut self, first: u8) -> bool {
        let Some((&head, tail)) = self.term.split_first() else {
            return false;
        };
        if first != head || !self.line[self.pos..].starts_with(tail) {
            return false;
        }
        self.pos += tail.len();
        true
    }

    fn emit(&mut self, closed: bool) -> Field {
        let mut bytes = std::mem::take(&mut self.out);
        if self.in_enclosure && !closed {
            // never closed: the opening quote is data
            if let Some(quote) = self.enclosed {
                bytes.insert(0, quote);
            }
        }
        self.in_enclosure = false;
        self.at_field_start = true;
        Field {
            bytes,
            maybe_null: false,
            enclosed: closed,
        }
    }

    /// Scan the next field.
    ///
    /// The flag is true when the scanner consumed the last byte of the line,
    /// i.e. the returned field is the final one.
    pub fn next_field(&mut self) -> (bool, Field) {
        loop {
            let Some(ch) = self.bump() else {
                return (true, self.emit(false));
            };

            if self.at_field_start && Some(ch) == self.enclosed {
                self.in_enclosure = true;
                self.at_field_start = false;
                continue;
            }
            self.at_field_start = false;

            if !self.in_enclosure && self.at_terminator(ch) {
                return (false, self.emit(false));
            }

            if self.in_enclosure && Some(ch) == self.enclosed {
                match self.bump() {
                    None => return (true, self.emit(true)),
                    Some(next) if Some(next) == self.enclosed => self.out.push(next),
                    Some(next) if self.at_terminator(next) => return (false, self.emit(true)),
                    Some(_) => {
                        // stray quote inside the enclosure is kept literally
                        self.out.push(ch);
                        self.pos -= 1;
                    }
                }
                continue;
            }

            if Some(ch) == self.escaped {
                if let Some(next) = self.bump() {
                    self.out.push(ch);
                    self.out.push(next);
                }
                continue;
            }

            self.out.push(ch);
        }
    }
}

impl Iterator for FieldScanner<'_> {
    type Item = Field;

    fn next(&mut self) -> Option<Field> {
        if self.done {
            return None;
        }
        let (eol, field) = self.next_field();
        self.done = eol;
        Some(field)
    }
}

/// Split one line into decoded fields.
///
/// An empty line yields a single empty field.
///
/// ```rust
/// use infile_core::{lex::scan_fields, LoadFormat};
///
/// let format = LoadFormat::csv();
/// let fields = scan_fields(br#""a""b",c\td"#, &format.fields);
/// assert_eq!(fields.len(), 2);
/// assert_eq!(fields[0].bytes, br#"a"b"#);
/// assert_eq!(fields[1].bytes, b"c\td");
/// ```
pub fn scan_fields(line: &[u8], fields: &FieldsFormat) -> Vec<Field> {
    FieldScanner::new(line, fields)
        .map(|field| field.decode(fields.escaped).normalize_null_word())
        .collect()
}
