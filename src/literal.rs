//! Python-style literal values.
//!
//! Graph files are a single literal: dicts, sets, lists, tuples, strings,
//! numbers, `None`, `True` and `False`. Unlike JSON the format has set
//! literals (`{'a', 'b'}`, `set()`), so it gets its own small reader and
//! writer.

use std::fmt::{self, Write as _};
use std::iter::Peekable;
use std::str::CharIndices;

use crate::error::{ModsphereError, Result};

/// Deepest container nesting `parse` accepts.
const MAX_DEPTH: usize = 256;

/// A parsed literal value. Containers keep source order.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Literal>),
    Tuple(Vec<Literal>),
    Set(Vec<Literal>),
    Dict(Vec<(Literal, Literal)>),
}

impl Literal {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Literal::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Items of a set, list or tuple.
    pub fn as_items(&self) -> Option<&[Literal]> {
        match self {
            Literal::Set(items) | Literal::List(items) | Literal::Tuple(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&[(Literal, Literal)]> {
        match self {
            Literal::Dict(entries) => Some(entries),
            _ => None,
        }
    }

    /// Value stored under string key `key` in a dict.
    pub fn get(&self, key: &str) -> Option<&Literal> {
        self.as_dict()?
            .iter()
            .find(|(k, _)| k.as_str() == Some(key))
            .map(|(_, v)| v)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Literal::None => "None",
            Literal::Bool(_) => "bool",
            Literal::Int(_) => "int",
            Literal::Float(_) => "float",
            Literal::Str(_) => "str",
            Literal::List(_) => "list",
            Literal::Tuple(_) => "tuple",
            Literal::Set(_) => "set",
            Literal::Dict(_) => "dict",
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::None => f.write_str("None"),
            Literal::Bool(true) => f.write_str("True"),
            Literal::Bool(false) => f.write_str("False"),
            Literal::Int(n) => write!(f, "{n}"),
            Literal::Float(x) => write!(f, "{x:?}"),
            Literal::Str(s) => write_quoted(f, s),
            Literal::List(items) => write_seq(f, "[", items, "]"),
            Literal::Tuple(items) if items.len() == 1 => write!(f, "({},)", items[0]),
            Literal::Tuple(items) => write_seq(f, "(", items, ")"),
            Literal::Set(items) if items.is_empty() => f.write_str("set()"),
            Literal::Set(items) => write_seq(f, "{", items, "}"),
            Literal::Dict(entries) => {
                f.write_char('{')?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_char('}')
            }
        }
    }
}

fn write_seq(f: &mut fmt::Formatter<'_>, open: &str, items: &[Literal], close: &str) -> fmt::Result {
    f.write_str(open)?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    f.write_str(close)
}

fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_char('\'')?;
    for c in s.chars() {
        match c {
            '\\' => f.write_str("\\\\")?,
            '\'' => f.write_str("\\'")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c if c.is_control() => write!(f, "\\x{:02x}", c as u32)?,
            c => f.write_char(c)?,
        }
    }
    f.write_char('\'')
}

/// Parse a complete literal. Trailing non-whitespace is an error.
pub fn parse(input: &str) -> Result<Literal> {
    let mut reader = Reader {
        input,
        chars: input.char_indices().peekable(),
        depth: 0,
    };
    let value = reader.value()?;
    reader.skip_whitespace();
    match reader.chars.peek() {
        None => Ok(value),
        Some(&(pos, c)) => Err(error(pos, format!("unexpected trailing `{c}`"))),
    }
}

fn error(position: usize, message: impl Into<String>) -> ModsphereError {
    ModsphereError::Literal {
        position,
        message: message.into(),
    }
}

struct Reader<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
    depth: usize,
}

impl Reader<'_> {
    fn skip_whitespace(&mut self) {
        while self.chars.peek().is_some_and(|&(_, c)| c.is_whitespace()) {
            self.chars.next();
        }
    }

    fn position(&mut self) -> usize {
        self.chars.peek().map_or(self.input.len(), |&(pos, _)| pos)
    }

    fn expect(&mut self, wanted: char) -> Result<()> {
        self.skip_whitespace();
        match self.chars.next() {
            Some((_, c)) if c == wanted => Ok(()),
            Some((pos, c)) => Err(error(pos, format!("expected `{wanted}`, found `{c}`"))),
            None => Err(error(self.input.len(), format!("expected `{wanted}`, found end of input"))),
        }
    }

    /// Consume `c` if it is the next non-whitespace character.
    fn eat(&mut self, c: char) -> bool {
        self.skip_whitespace();
        if self.chars.peek().is_some_and(|&(_, next)| next == c) {
            self.chars.next();
            true
        } else {
            false
        }
    }

    fn value(&mut self) -> Result<Literal> {
        self.skip_whitespace();
        let Some(&(pos, c)) = self.chars.peek() else {
            return Err(error(self.input.len(), "expected a value, found end of input"));
        };
        match c {
            '{' | '[' | '(' => self.container(pos, c),
            '\'' | '"' => Ok(Literal::Str(self.string()?)),
            c if c == '-' || c == '+' || c.is_ascii_digit() => self.number(),
            c if c.is_alphabetic() || c == '_' => self.word(),
            c => Err(error(pos, format!("unexpected `{c}`"))),
        }
    }

    fn container(&mut self, pos: usize, open: char) -> Result<Literal> {
        if self.depth == MAX_DEPTH {
            return Err(error(pos, "nesting too deep"));
        }
        self.depth += 1;
        let value = match open {
            '{' => self.brace()?,
            '[' => {
                self.chars.next();
                Literal::List(self.items(']')?)
            }
            _ => {
                self.chars.next();
                Literal::Tuple(self.items(')')?)
            }
        };
        self.depth -= 1;
        Ok(value)
    }

    /// Comma-separated values up to `close`, trailing comma allowed.
    fn items(&mut self, close: char) -> Result<Vec<Literal>> {
        let mut items = Vec::new();
        loop {
            if self.eat(close) {
                return Ok(items);
            }
            items.push(self.value()?);
            if !self.eat(',') {
                self.expect(close)?;
                return Ok(items);
            }
        }
    }

    /// `{}` is an empty dict; otherwise the first separator decides
    /// between dict and set.
    fn brace(&mut self) -> Result<Literal> {
        self.expect('{')?;
        if self.eat('}') {
            return Ok(Literal::Dict(Vec::new()));
        }
        let first = self.value()?;
        if !self.eat(':') {
            let mut items = vec![first];
            if self.eat(',') {
                items.extend(self.items('}')?);
            } else {
                self.expect('}')?;
            }
            return Ok(Literal::Set(items));
        }

        let mut entries = vec![(first, self.value()?)];
        loop {
            if !self.eat(',') {
                self.expect('}')?;
                return Ok(Literal::Dict(entries));
            }
            if self.eat('}') {
                return Ok(Literal::Dict(entries));
            }
            let key = self.value()?;
            self.expect(':')?;
            entries.push((key, self.value()?));
        }
    }

    fn string(&mut self) -> Result<String> {
        let (start, quote) = match self.chars.next() {
            Some(pair) => pair,
            None => return Err(error(self.input.len(), "expected a string")),
        };
        let mut s = String::new();
        loop {
            match self.chars.next() {
                Some((_, c)) if c == quote => return Ok(s),
                Some((pos, '\\')) => s.push(self.escape(pos)?),
                Some((_, c)) => s.push(c),
                None => return Err(error(start, "unterminated string")),
            }
        }
    }

    fn escape(&mut self, pos: usize) -> Result<char> {
        let Some((_, c)) = self.chars.next() else {
            return Err(error(pos, "unterminated escape"));
        };
        Ok(match c {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            '0' => '\0',
            '\\' | '\'' | '"' => c,
            'x' => self.hex_escape(pos, 2)?,
            'u' => self.hex_escape(pos, 4)?,
            'U' => self.hex_escape(pos, 8)?,
            other => return Err(error(pos, format!("unknown escape `\\{other}`"))),
        })
    }

    fn hex_escape(&mut self, pos: usize, digits: usize) -> Result<char> {
        let mut code = 0u32;
        for _ in 0..digits {
            let digit = self
                .chars
                .next()
                .and_then(|(_, c)| c.to_digit(16))
                .ok_or_else(|| error(pos, "malformed hex escape"))?;
            code = code * 16 + digit;
        }
        char::from_u32(code).ok_or_else(|| error(pos, "escape is not a valid character"))
    }

    fn number(&mut self) -> Result<Literal> {
        let start = self.position();
        let mut end = start;
        let mut is_float = false;
        while let Some(&(pos, c)) = self.chars.peek() {
            let accepted = match c {
                '0'..='9' | '_' => true,
                '+' | '-' => pos == start || self.input[..pos].ends_with(['e', 'E']),
                '.' | 'e' | 'E' => {
                    is_float = true;
                    true
                }
                _ => false,
            };
            if !accepted {
                break;
            }
            end = pos + c.len_utf8();
            self.chars.next();
        }
        let text = self.input[start..end].replace('_', "");
        let parsed = if is_float {
            text.parse::<f64>().ok().map(Literal::Float)
        } else {
            text.parse::<i64>().ok().map(Literal::Int)
        };
        parsed.ok_or_else(|| error(start, format!("invalid number `{text}`")))
    }

    fn word(&mut self) -> Result<Literal> {
        let start = self.position();
        let mut end = start;
        while let Some(&(pos, c)) = self.chars.peek() {
            if !(c.is_alphanumeric() || c == '_') {
                break;
            }
            end = pos + c.len_utf8();
            self.chars.next();
        }
        match &self.input[start..end] {
            "None" => Ok(Literal::None),
            "True" => Ok(Literal::Bool(true)),
            "False" => Ok(Literal::Bool(false)),
            "set" => {
                self.expect('(')?;
                self.expect(')')?;
                Ok(Literal::Set(Vec::new()))
            }
            other => Err(error(start, format!("unknown name `{other}`"))),
        }
    }
}
