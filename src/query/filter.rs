//! Filter expressions.
//!
//! Grammar, with keywords matched case-insensitively:
//!
//! ```text
//! filter  := or
//! or      := and ("or" and)*
//! and     := unary ("and" unary)*
//! unary   := "not" "(" filter ")" | primary
//! primary := "(" filter ")" | path "pr" | path op value
//! op      := eq | ne | co | sw | ew | gt | ge | lt | le
//! value   := "json string" | number | true | false | null
//! ```
//!
//! Chains of the same logical operator are flattened, so `a and (b and c)`
//! parses to the same tree as `a and b and c`.

use super::path::AttributePath;
use crate::error::{ScimError, ScimResult};

use serde_json::{Number, Value};
use std::fmt;

/// Maximum depth of parentheses and `not` groups.
const MAX_FILTER_NESTING: usize = 64;

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    Ne,
    Co,
    Sw,
    Ew,
    Gt,
    Ge,
    Lt,
    Le,
}

impl CompareOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Co => "co",
            Self::Sw => "sw",
            Self::Ew => "ew",
            Self::Gt => "gt",
            Self::Ge => "ge",
            Self::Lt => "lt",
            Self::Le => "le",
        }
    }

    fn from_keyword(word: &str) -> Option<Self> {
        let op = match word.to_ascii_lowercase().as_str() {
            "eq" => Self::Eq,
            "ne" => Self::Ne,
            "co" => Self::Co,
            "sw" => Self::Sw,
            "ew" => Self::Ew,
            "gt" => Self::Gt,
            "ge" => Self::Ge,
            "lt" => Self::Lt,
            "le" => Self::Le,
            _ => return None,
        };
        Some(op)
    }
}

/// Literal on the right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    String(String),
    Boolean(bool),
    Number(Number),
    Null,
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{}", Value::String(s.clone())),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Number(n) => write!(f, "{}", n),
            Self::Null => f.write_str("null"),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

/// Parsed filter tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
    Compare {
        path: AttributePath,
        op: CompareOp,
        value: FilterValue,
    },
    Present(AttributePath),
}

impl Filter {
    /// Parse a filter expression.
    pub fn parse(input: &str) -> ScimResult<Self> {
        let tokens = Lexer::new(input).lex()?;
        let mut parser = Parser {
            input,
            tokens,
            index: 0,
            nesting: 0,
        };
        let filter = parser.parse_or()?;
        parser.expect_eof()?;
        Ok(filter)
    }

    pub fn compare(path: AttributePath, op: CompareOp, value: impl Into<FilterValue>) -> Self {
        Self::Compare {
            path,
            op,
            value: value.into(),
        }
    }

    pub fn eq(attribute: &str, value: impl Into<FilterValue>) -> Self {
        Self::compare(AttributePath::new(attribute), CompareOp::Eq, value)
    }

    pub fn present(attribute: &str) -> Self {
        Self::Present(AttributePath::new(attribute))
    }

    pub fn and(self, other: Filter) -> Self {
        join(self, other, true)
    }

    pub fn or(self, other: Filter) -> Self {
        join(self, other, false)
    }

    pub fn negate(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Every attribute path referenced by the filter.
    pub fn paths(&self) -> Vec<&AttributePath> {
        let mut paths = Vec::new();
        self.collect_paths(&mut paths);
        paths
    }

    fn collect_paths<'a>(&'a self, paths: &mut Vec<&'a AttributePath>) {
        match self {
            Self::And(parts) | Self::Or(parts) => {
                for part in parts {
                    part.collect_paths(paths);
                }
            }
            Self::Not(inner) => inner.collect_paths(paths),
            Self::Compare { path, .. } | Self::Present(path) => paths.push(path),
        }
    }
}

fn join(left: Filter, right: Filter, conjunction: bool) -> Filter {
    let mut parts = Vec::new();
    for side in [left, right] {
        match (side, conjunction) {
            (Filter::And(inner), true) | (Filter::Or(inner), false) => parts.extend(inner),
            (other, _) => parts.push(other),
        }
    }
    if conjunction { Filter::And(parts) } else { Filter::Or(parts) }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And(parts) => {
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" and ")?;
                    }
                    if matches!(part, Self::Or(_)) {
                        write!(f, "({})", part)?;
                    } else {
                        write!(f, "{}", part)?;
                    }
                }
                Ok(())
            }
            Self::Or(parts) => {
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" or ")?;
                    }
                    write!(f, "{}", part)?;
                }
                Ok(())
            }
            Self::Not(inner) => write!(f, "not ({})", inner),
            Self::Compare { path, op, value } => write!(f, "{} {} {}", path, op.as_str(), value),
            Self::Present(path) => write!(f, "{} pr", path),
        }
    }
}

fn filter_error(message: impl Into<String>, fragment: impl Into<String>, position: usize) -> ScimError {
    ScimError::InvalidFilter {
        message: message.into(),
        fragment: fragment.into(),
        position,
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token<'a> {
    LParen,
    RParen,
    /// Bare word: keyword, operator, attribute path or literal.
    Word(&'a str),
    /// Decoded quoted string.
    Str(String),
    Eof,
}

#[derive(Debug, Clone)]
struct SpannedToken<'a> {
    token: Token<'a>,
    position: usize,
    text: &'a str,
}

struct Lexer<'a> {
    input: &'a str,
    offset: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, offset: 0 }
    }

    fn lex(&mut self) -> ScimResult<Vec<SpannedToken<'a>>> {
        let bytes = self.input.as_bytes();
        let mut tokens = Vec::new();

        while self.offset < bytes.len() {
            let start = self.offset;
            match bytes[start] {
                b' ' | b'\t' | b'\n' | b'\r' => self.offset += 1,
                b'(' => {
                    self.offset += 1;
                    tokens.push(self.spanned(Token::LParen, start));
                }
                b')' => {
                    self.offset += 1;
                    tokens.push(self.spanned(Token::RParen, start));
                }
                b'"' => {
                    let value = self.string(start)?;
                    tokens.push(self.spanned(Token::Str(value), start));
                }
                _ => {
                    while let Some(&b) = bytes.get(self.offset) {
                        if matches!(b, b' ' | b'\t' | b'\n' | b'\r' | b'(' | b')' | b'"') {
                            break;
                        }
                        self.offset += 1;
                    }
                    let word = &self.input[start..self.offset];
                    tokens.push(self.spanned(Token::Word(word), start));
                }
            }
        }

        if tokens.is_empty() {
            return Err(filter_error("empty filter", "", 0));
        }
        tokens.push(SpannedToken {
            token: Token::Eof,
            position: self.offset,
            text: "",
        });
        Ok(tokens)
    }

    fn spanned(&self, token: Token<'a>, start: usize) -> SpannedToken<'a> {
        SpannedToken {
            token,
            position: start,
            text: &self.input[start..self.offset],
        }
    }

    /// Scan a JSON string literal starting at `start` and decode it.
    fn string(&mut self, start: usize) -> ScimResult<String> {
        let bytes = self.input.as_bytes();
        let mut i = start + 1;
        loop {
            match bytes.get(i) {
                None => return Err(filter_error("unterminated string", &self.input[start..], start)),
                Some(b'\\') => i += 2,
                Some(b'"') => break,
                Some(_) => i += 1,
            }
        }
        self.offset = i + 1;
        let literal = &self.input[start..self.offset];
        serde_json::from_str::<String>(literal)
            .map_err(|e| filter_error(format!("invalid string literal: {}", e), literal, start))
    }
}

struct Parser<'a> {
    input: &'a str,
    tokens: Vec<SpannedToken<'a>>,
    index: usize,
    nesting: usize,
}

impl<'a> Parser<'a> {
    fn parse_or(&mut self) -> ScimResult<Filter> {
        let mut parts = vec![self.parse_and()?];
        while self.matches_keyword("or") {
            parts.push(self.parse_and()?);
        }
        Ok(collapse(parts, false))
    }

    fn parse_and(&mut self) -> ScimResult<Filter> {
        let mut parts = vec![self.parse_unary()?];
        while self.matches_keyword("and") {
            parts.push(self.parse_unary()?);
        }
        Ok(collapse(parts, true))
    }

    fn parse_unary(&mut self) -> ScimResult<Filter> {
        if self.is_keyword("not") && matches!(self.peek().token, Token::LParen) {
            let position = self.current().position;
            self.advance();
            self.advance();
            let inner = self.with_nesting(position, |p| p.parse_or())?;
            self.expect_rparen()?;
            return Ok(Filter::Not(Box::new(inner)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> ScimResult<Filter> {
        let current = self.current().clone();
        match &current.token {
            Token::LParen => {
                self.advance();
                let inner = self.with_nesting(current.position, |p| p.parse_or())?;
                self.expect_rparen()?;
                Ok(inner)
            }
            Token::Word(word) => {
                let path = AttributePath::parse(word, "filter").map_err(|_| {
                    filter_error("expected an attribute path", *word, current.position)
                })?;
                self.advance();
                self.parse_comparison(path)
            }
            _ => Err(self.unexpected("expected an attribute path or '('")),
        }
    }

    fn parse_comparison(&mut self, path: AttributePath) -> ScimResult<Filter> {
        let op = match &self.current().token {
            Token::Word(word) if word.eq_ignore_ascii_case("pr") => {
                self.advance();
                return Ok(Filter::Present(path));
            }
            Token::Word(word) => CompareOp::from_keyword(word),
            _ => None,
        };
        let Some(op) = op else {
            return Err(self.unexpected("expected an operator"));
        };
        self.advance();

        let value = self.parse_value()?;
        Ok(Filter::Compare { path, op, value })
    }

    fn parse_value(&mut self) -> ScimResult<FilterValue> {
        let current = self.current().clone();
        let value = match current.token {
            Token::Str(s) => FilterValue::String(s),
            Token::Word(word) if word.eq_ignore_ascii_case("true") => FilterValue::Boolean(true),
            Token::Word(word) if word.eq_ignore_ascii_case("false") => FilterValue::Boolean(false),
            Token::Word(word) if word.eq_ignore_ascii_case("null") => FilterValue::Null,
            Token::Word(word) => match serde_json::from_str::<Number>(word) {
                Ok(number) => FilterValue::Number(number),
                Err(_) => {
                    return Err(filter_error(
                        "expected a quoted string, number, true, false or null",
                        word,
                        current.position,
                    ));
                }
            },
            _ => return Err(self.unexpected("expected a comparison value")),
        };
        self.advance();
        Ok(value)
    }

    fn with_nesting<T>(&mut self, position: usize, f: impl FnOnce(&mut Self) -> ScimResult<T>) -> ScimResult<T> {
        if self.nesting + 1 > MAX_FILTER_NESTING {
            return Err(filter_error(
                format!("nesting deeper than {} levels", MAX_FILTER_NESTING),
                self.tail(position),
                position,
            ));
        }
        self.nesting += 1;
        let result = f(self);
        self.nesting -= 1;
        result
    }

    fn expect_rparen(&mut self) -> ScimResult<()> {
        if matches!(self.current().token, Token::RParen) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected("expected ')'"))
        }
    }

    fn expect_eof(&self) -> ScimResult<()> {
        if matches!(self.current().token, Token::Eof) {
            Ok(())
        } else {
            Err(self.unexpected("unexpected trailing input"))
        }
    }

    fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self.current().token, Token::Word(word) if word.eq_ignore_ascii_case(keyword))
    }

    fn matches_keyword(&mut self, keyword: &str) -> bool {
        if self.is_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn current(&self) -> &SpannedToken<'a> {
        &self.tokens[self.index]
    }

    fn peek(&self) -> &SpannedToken<'a> {
        &self.tokens[(self.index + 1).min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) {
        if self.index < self.tokens.len() - 1 {
            self.index += 1;
        }
    }

    fn tail(&self, position: usize) -> &'a str {
        let rest = &self.input[position..];
        match rest.char_indices().nth(32) {
            Some((end, _)) => &rest[..end],
            None => rest,
        }
    }

    fn unexpected(&self, message: &str) -> ScimError {
        let current = self.current();
        let fragment = match current.token {
            Token::Eof => "end of input",
            _ => current.text,
        };
        filter_error(message, fragment, current.position)
    }
}

fn collapse(parts: Vec<Filter>, conjunction: bool) -> Filter {
    let mut parts = parts.into_iter();
    let Some(first) = parts.next() else {
        return Filter::And(Vec::new());
    };
    parts.fold(first, |acc, next| join(acc, next, conjunction))
}
