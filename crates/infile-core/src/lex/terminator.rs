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

//! Terminator detection and escape decoding primitives.
//!
//! Field and line terminators are usually one or two bytes, so matching is a
//! plain prefix comparison at the current position.

/// What the bytes at a position start with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermKind {
    /// Neither terminator.
    None,
    /// The field terminator.
    Field,
    /// The line terminator.
    Line,
}

/// A field/line terminator pair with a precomputed comparison order.
///
/// When the field terminator is a strict prefix of the line terminator the
/// line terminator is tried first, otherwise `a\r\nb` with `\r` / `\r\n`
/// would be read as a field break followed by a stray `\n`.
///
/// # Examples
///
/// ```rust
/// use infile_core::lex::{TermKind, Terminators};
///
/// let terms = Terminators::new(b"\r", b"\r\n");
/// assert_eq!(terms.classify(b"\r\nb"), TermKind::Line);
/// assert_eq!(terms.classify(b"\rb"), TermKind::Field);
/// assert_eq!(terms.classify(b"b"), TermKind::None);
/// ```
#[derive(Debug, Clone)]
pub struct Terminators {
    field: Vec<u8>,
    line: Vec<u8>,
    line_first: bool,
}

impl Terminators {
    /// Build the pair.
    pub fn new(field: &[u8], line: &[u8]) -> Self {
        let line_first = line.len() > field.len() && line.starts_with(field);
        Self {
            field: field.to_vec(),
            line: line.to_vec(),
            line_first,
        }
    }

    /// The field terminator bytes.
    #[inline]
    pub fn field(&self) -> &[u8] {
        &self.field
    }

    /// The line terminator bytes.
    #[inline]
    pub fn line(&self) -> &[u8] {
        &self.line
    }

    /// Whether the line terminator is compared before the field terminator.
    #[inline]
    pub fn line_first(&self) -> bool {
        self.line_first
    }

    /// Classify the bytes at the start of `bytes`.
    #[inline]
    pub fn classify(&self, bytes: &[u8]) -> TermKind {
        if self.line_first {
            if is_prefix(&self.line, bytes) {
                return TermKind::Line;
            }
            if is_prefix(&self.field, bytes) {
                return TermKind::Field;
            }
        } else {
            if is_prefix(&self.field, bytes) {
                return TermKind::Field;
            }
            if is_prefix(&self.line, bytes) {
                return TermKind::Line;
            }
        }
        TermKind::None
    }

    /// True when no byte of the field terminator occurs in the line terminator.
    ///
    /// Matches of the two can then never overlap, and a plain substring search
    /// for the line terminator agrees with [`classify`](Self::classify).
    pub fn disjoint(&self) -> bool {
        !self.field.iter().any(|b| self.line.contains(b))
    }
}

#[inline]
fn is_prefix(term: &[u8], bytes: &[u8]) -> bool {
    !term.is_empty() && bytes.starts_with(term)
}

/// Result of decoding the byte following an escape character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Escaped {
    /// The decoded byte.
    pub byte: u8,
    /// The pair was `\N`, the NULL sentinel.
    pub null: bool,
}

/// Decode the byte that follows an escape character.
///
/// Unrecognized bytes decode to themselves, so `\x` yields `x`.
///
/// | pair | result |
/// |------|--------|
/// | `\0` | NUL    |
/// | `\b` | BS     |
/// | `\n` | LF     |
/// | `\r` | CR     |
/// | `\t` | TAB    |
/// | `\Z` | 0x1A   |
/// | `\N` | `N` + NULL marker |
///
/// ```rust
/// use infile_core::lex::decode_escape;
///
/// assert_eq!(decode_escape(b't').byte, b'\t');
/// assert!(decode_escape(b'N').null);
/// assert_eq!(decode_escape(b'q').byte, b'q');
/// ```
#[inline]
pub fn decode_escape(c: u8) -> Escaped {
    let byte = match c {
        b'0' => 0,
        b'b' => 0x08,
        b'n' => b'\n',
        b'r' => b'\r',
        b't' => b'\t',
        b'Z' => 0x1a,
        other => other,
    };
    Escaped {
        byte,
        null: c == b'N',
    }
}
