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


//! A small expression language for `SET col = expr`.
//!
//! # Grammar
//!
//! ```text
//! expr    = call | atom
//! call    = ident "(" (expr ("," expr)*)? ")"
//! atom    = "@" ident | ident | NULL | number | string
//! string  = "'" ... "'" | '"' ... '"'     (quote doubled to escape)
//! ```
//!
//! Functions: `NOW()`, `UPPER(x)`, `LOWER(x)`, `CONCAT(a, b, ...)`.
//! Parsed expressions are cached per source text.

use infile::{ColumnType, Datum, EvalContext, ExprEvaluator, RowError, RowResult};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Expression syntax errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExprError {
    #[error("unexpected character '{ch}' at position {pos}")]
    UnexpectedChar { ch: char, pos: usize },

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("unterminated string literal")]
    UnclosedQuote,

    #[error("invalid number '{0}'")]
    InvalidNumber(String),
}

impl From<ExprError> for RowError {
    fn from(err: ExprError) -> Self {
        RowError::eval(err.to_string())
    }
}

/// Parsed expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Null,
    Int(i64),
    Float(f64),
    Str(String),
    /// `@name`, stored lowercase.
    UserVar(String),
    /// A column of the row being loaded.
    Column(String),
    /// Function call, name stored uppercase.
    Call { name: String, args: Vec<Expr> },
}

/// Parse `source` into an [`Expr`].
///
/// ```rust
/// use infile_memory::{parse_expr, Expr};
///
/// let expr = parse_expr("concat(@first, ' ', last)").unwrap();
/// assert_eq!(
///     expr,
///     Expr::Call {
///         name: "CONCAT".into(),
///         args: vec![
///             Expr::UserVar("first".into()),
///             Expr::Str(" ".into()),
///             Expr::Column("last".into()),
///         ],
///     }
/// );
/// ```
pub fn parse_expr(source: &str) -> Result<Expr, ExprError> {
    let mut parser = Parser {
        chars: source.chars().collect(),
        pos: 0,
    };
    let expr = parser.expr()?;
    parser.skip_whitespace();
    match parser.peek() {
        None => Ok(expr),
        Some(ch) => Err(ExprError::UnexpectedChar {
            ch,
            pos: parser.pos,
        }),
    }
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, want: char) -> Result<(), ExprError> {
        self.skip_whitespace();
        match self.advance() {
            Some(ch) if ch == want => Ok(()),
            Some(ch) => Err(ExprError::UnexpectedChar {
                ch,
                pos: self.pos - 1,
            }),
            None => Err(ExprError::UnexpectedEnd),
        }
    }

    fn expr(&mut self) -> Result<Expr, ExprError> {
        self.skip_whitespace();
        match self.peek() {
            Some('\'' | '"') => self.string().map(Expr::Str),
            Some('@') => {
                self.advance();
                Ok(Expr::UserVar(self.ident()?.to_ascii_lowercase()))
            }
            Some(ch) if ch.is_ascii_digit() || ch == '-' || ch == '.' => self.number(),
            Some(ch) if ch.is_alphabetic() || ch == '_' => {
                let ident = self.ident()?;
                self.skip_whitespace();
                if self.peek() == Some('(') {
                    self.advance();
                    let args = self.args()?;
                    return Ok(Expr::Call {
                        name: ident.to_ascii_uppercase(),
                        args,
                    });
                }
                if ident.eq_ignore_ascii_case("null") {
                    Ok(Expr::Null)
                } else {
                    Ok(Expr::Column(ident))
                }
            }
            Some(ch) => Err(ExprError::UnexpectedChar { ch, pos: self.pos }),
            None => Err(ExprError::UnexpectedEnd),
        }
    }

    fn args(&mut self) -> Result<Vec<Expr>, ExprError> {
        let mut args = Vec::new();
        self.skip_whitespace();
        if self.peek() == Some(')') {
            self.advance();
            return Ok(args);
        }
        loop {
            args.push(self.expr()?);
            self.skip_whitespace();
            match self.advance() {
                Some(',') => continue,
                Some(')') => return Ok(args),
                Some(ch) => {
                    return Err(ExprError::UnexpectedChar {
                        ch,
                        pos: self.pos - 1,
                    })
                }
                None => return Err(ExprError::UnexpectedEnd),
            }
        }
    }

    fn ident(&mut self) -> Result<String, ExprError> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|ch| ch.is_alphanumeric() || ch == '_' || ch == '$')
        {
            self.pos += 1;
        }
        if start == self.pos {
            return match self.peek() {
                Some(ch) => Err(ExprError::UnexpectedChar { ch, pos: self.pos }),
                None => Err(ExprError::UnexpectedEnd),
            };
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn string(&mut self) -> Result<String, ExprError> {
        let quote = self.advance().ok_or(ExprError::UnexpectedEnd)?;
        let mut out = String::new();
        loop {
            match self.advance() {
                Some(ch) if ch == quote => {
                    if self.peek() == Some(quote) {
                        self.advance();
                        out.push(quote);
                    } else {
                        return Ok(out);
                    }
                }
                Some(ch) => out.push(ch),
                None => return Err(ExprError::UnclosedQuote),
            }
        }
    }

    fn number(&mut self) -> Result<Expr, ExprError> {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.pos += 1;
        }
        while self
            .peek()
            .is_some_and(|ch| ch.is_ascii_digit() || ch == '.')
        {
            self.pos += 1;
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        if text.contains('.') {
            text.parse()
                .map(Expr::Float)
                .map_err(|_| ExprError::InvalidNumber(text))
        } else {
            text.parse()
                .map(Expr::Int)
                .map_err(|_| ExprError::InvalidNumber(text))
        }
    }
}

/// [`ExprEvaluator`] for the [`Expr`] language.
///
/// NULL propagates through every function. Column references see only
/// values assembled before the assignment.
#[derive(Debug, Default)]
pub struct SimpleEvaluator {
    cache: Mutex<HashMap<String, Arc<Expr>>>,
}

impl SimpleEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    fn parsed(&self, source: &str) -> Result<Arc<Expr>, ExprError> {
        if let Some(expr) = self.cache.lock().get(source) {
            return Ok(expr.clone());
        }
        let expr = Arc::new(parse_expr(source)?);
        self.cache.lock().insert(source.to_string(), expr.clone());
        Ok(expr)
    }
}

impl ExprEvaluator for SimpleEvaluator {
    fn eval(&self, expr: &str, ctx: &EvalContext<'_>) -> RowResult<Datum> {
        let parsed = self.parsed(expr)?;
        evaluate(&parsed, ctx)
    }
}

fn evaluate(expr: &Expr, ctx: &EvalContext<'_>) -> RowResult<Datum> {
    match expr {
        Expr::Null => Ok(Datum::Null),
        Expr::Int(v) => Ok(Datum::Int(*v)),
        Expr::Float(v) => Ok(Datum::Float(*v)),
        Expr::Str(s) => Ok(Datum::from(s.as_str())),
        Expr::UserVar(name) => Ok(ctx.user_var(name)),
        Expr::Column(name) => ctx
            .column(name)
            .cloned()
            .ok_or_else(|| RowError::eval(format!("Unknown column '{name}' in 'field list'"))),
        Expr::Call { name, args } => call(name, args, ctx),
    }
}

fn call(name: &str, args: &[Expr], ctx: &EvalContext<'_>) -> RowResult<Datum> {
    let values = args
        .iter()
        .map(|arg| evaluate(arg, ctx))
        .collect::<RowResult<Vec<_>>>()?;

    match (name, values.as_slice()) {
        ("NOW" | "CURRENT_TIMESTAMP", []) => Ok(Datum::current_time(ColumnType::Datetime)),
        ("UPPER" | "UCASE", [value]) => Ok(map_text(value, |s| s.to_uppercase())),
        ("LOWER" | "LCASE", [value]) => Ok(map_text(value, |s| s.to_lowercase())),
        ("CONCAT", values) if !values.is_empty() => {
            if values.iter().any(Datum::is_null) {
                return Ok(Datum::Null);
            }
            let mut out = Vec::new();
            for value in values {
                match value {
                    Datum::Bytes(bytes) => out.extend_from_slice(bytes),
                    other => out.extend_from_slice(other.to_text().as_bytes()),
                }
            }
            Ok(Datum::Bytes(out))
        }
        ("NOW" | "CURRENT_TIMESTAMP" | "UPPER" | "UCASE" | "LOWER" | "LCASE" | "CONCAT", _) => {
            Err(RowError::eval(format!(
                "Incorrect parameter count in the call to native function '{name}'"
            )))
        }
        _ => Err(RowError::eval(format!("FUNCTION {name} does not exist"))),
    }
}

fn map_text(value: &Datum, f: impl Fn(&str) -> String) -> Datum {
    match value {
        Datum::Null => Datum::Null,
        Datum::Bytes(bytes) => Datum::from(f(&String::from_utf8_lossy(bytes))),
        other => Datum::from(f(&other.to_text())),
    }
}
