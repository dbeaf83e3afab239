// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.


//! Tokenizer over a refillable byte buffer.
//!
//! Input may come from any `Read`; the buffer is refilled on demand, so
//! strings, escapes and whitespace runs may straddle refills.

use std::borrow::Cow;
use std::io::{ErrorKind, Read};

use super::element::{JsonElement, JsonObject};
use super::path::JsonPath;
use crate::error::Error;

const DEFAULT_CHUNK_SIZE: usize = 16 * 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Token {
    BeginObject,
    EndObject,
    BeginList,
    EndList,
    Comma,
    Colon,
    /// Opening quote of a string.
    String,
    /// Start of an unquoted literal: number, `true`, `null`, ...
    Literal,
    Eof,
}

impl Token {
    pub(crate) fn describe(self) -> &'static str {
        match self {
            Token::BeginObject => "start of the object '{'",
            Token::EndObject => "end of the object '}'",
            Token::BeginList => "start of the array '['",
            Token::EndList => "end of the array ']'",
            Token::Comma => "comma ','",
            Token::Colon => "colon ':'",
            Token::String => "quotation mark '\"'",
            Token::Literal => "literal",
            Token::Eof => "EOF",
        }
    }

    #[inline]
    fn of(byte: u8) -> Token {
        match byte {
            b'{' => Token::BeginObject,
            b'}' => Token::EndObject,
            b'[' => Token::BeginList,
            b']' => Token::EndList,
            b',' => Token::Comma,
            b':' => Token::Colon,
            b'"' => Token::String,
            _ => Token::Literal,
        }
    }
}

#[inline]
fn is_whitespace(byte: u8) -> bool {
    matches!(byte, b' ' | b'\n' | b'\r' | b'\t')
}

#[inline]
fn is_terminator(byte: u8) -> bool {
    is_whitespace(byte) || Token::of(byte) != Token::Literal
}

pub(crate) struct JsonLexer<'r> {
    reader: Box<dyn Read + 'r>,
    buf: Vec<u8>,
    pos: usize,
    /// Absolute input offset of `buf[0]`.
    base: usize,
    chunk: usize,
    eof: bool,
    scratch: Vec<u8>,
    pub(crate) path: JsonPath,
}

impl<'r> JsonLexer<'r> {
    pub(crate) fn from_str(input: &str) -> Self {
        JsonLexer {
            reader: Box::new(std::io::empty()),
            buf: input.as_bytes().to_vec(),
            pos: 0,
            base: 0,
            chunk: DEFAULT_CHUNK_SIZE,
            eof: true,
            scratch: Vec::new(),
            path: JsonPath::default(),
        }
    }

    pub(crate) fn from_reader<R: Read + 'r>(reader: R) -> Self {
        Self::with_chunk_size(reader, DEFAULT_CHUNK_SIZE)
    }

    pub(crate) fn with_chunk_size<R: Read + 'r>(reader: R, chunk: usize) -> Self {
        JsonLexer {
            reader: Box::new(reader),
            buf: Vec::with_capacity(chunk),
            pos: 0,
            base: 0,
            chunk: chunk.max(1),
            eof: false,
            scratch: Vec::new(),
            path: JsonPath::default(),
        }
    }

    #[inline]
    pub(crate) fn offset(&self) -> usize {
        self.base + self.pos
    }

    #[cold]
    pub(crate) fn fail<M: Into<Cow<'static, str>>>(&self, message: M) -> Error {
        Error::json_decoding(self.offset(), message, self.path.render())
    }

    /// Makes at least `need` unread bytes available unless the input ends
    /// first. Returns whether they are available.
    fn fill(&mut self, need: usize) -> Result<bool, Error> {
        while self.buf.len() - self.pos < need && !self.eof {
            if self.pos > 0 {
                self.buf.drain(..self.pos);
                self.base += self.pos;
                self.pos = 0;
            }
            let start = self.buf.len();
            self.buf.resize(start + self.chunk, 0);
            let read = loop {
                match self.reader.read(&mut self.buf[start..]) {
                    Ok(n) => break n,
                    Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                    Err(e) => {
                        self.buf.truncate(start);
                        return Err(e.into());
                    }
                }
            };
            self.buf.truncate(start + read);
            if read == 0 {
                self.eof = true;
            }
        }
        Ok(self.buf.len() - self.pos >= need)
    }

    #[inline]
    fn peek_byte(&mut self) -> Result<Option<u8>, Error> {
        if self.pos < self.buf.len() || self.fill(1)? {
            Ok(Some(self.buf[self.pos]))
        } else {
            Ok(None)
        }
    }

    fn next_byte(&mut self) -> Result<Option<u8>, Error> {
        let byte = self.peek_byte()?;
        if byte.is_some() {
            self.pos += 1;
        }
        Ok(byte)
    }

    fn skip_whitespace(&mut self) -> Result<(), Error> {
        loop {
            while self.pos < self.buf.len() {
                if !is_whitespace(self.buf[self.pos]) {
                    return Ok(());
                }
                self.pos += 1;
            }
            if !self.fill(1)? {
                return Ok(());
            }
        }
    }

    /// Class of the next non-whitespace byte, without consuming it.
    pub(crate) fn peek_token(&mut self) -> Result<Token, Error> {
        self.skip_whitespace()?;
        Ok(match self.peek_byte()? {
            Some(byte) => Token::of(byte),
            None => Token::Eof,
        })
    }

    #[cold]
    pub(crate) fn unexpected(&mut self, expected: &str) -> Error {
        let found = match self.peek_byte() {
            Ok(Some(byte)) => format!("'{}'", byte as char),
            _ => "EOF".to_string(),
        };
        self.fail(format!("Expected {expected}, but had {found} instead"))
    }

    /// Consumes a single-character token.
    pub(crate) fn consume_token(&mut self, expected: Token) -> Result<(), Error> {
        if self.peek_token()? != expected {
            return Err(self.unexpected(expected.describe()));
        }
        self.pos += 1;
        Ok(())
    }

    pub(crate) fn try_consume_comma(&mut self) -> Result<bool, Error> {
        if self.peek_token()? == Token::Comma {
            self.pos += 1;
            return Ok(true);
        }
        Ok(false)
    }

    /// True when the next token can start a value.
    pub(crate) fn can_consume_value(&mut self) -> Result<bool, Error> {
        Ok(matches!(
            self.peek_token()?,
            Token::BeginObject | Token::BeginList | Token::String | Token::Literal
        ))
    }

    /// True when the next token is the `null` literal. Nothing is consumed.
    pub(crate) fn peek_null(&mut self) -> Result<bool, Error> {
        if self.peek_token()? != Token::Literal || !self.fill(4)? {
            return Ok(false);
        }
        if &self.buf[self.pos..self.pos + 4] != b"null" {
            return Ok(false);
        }
        if self.fill(5)? {
            return Ok(is_terminator(self.buf[self.pos + 4]));
        }
        Ok(true)
    }

    pub(crate) fn consume_null(&mut self) -> Result<(), Error> {
        if !self.peek_null()? {
            return Err(self.unexpected("'null' literal"));
        }
        self.pos += 4;
        Ok(())
    }

    fn take_scratch(&mut self) -> Result<String, Error> {
        match std::str::from_utf8(&self.scratch) {
            Ok(s) => Ok(s.to_owned()),
            Err(e) => Err(self.fail(format!("Invalid UTF-8 sequence: {e}"))),
        }
    }

    /// Reads a quoted string, decoding escapes.
    pub(crate) fn consume_string(&mut self) -> Result<String, Error> {
        self.consume_token(Token::String)?;
        self.scratch.clear();
        loop {
            if self.pos >= self.buf.len() && !self.fill(1)? {
                return Err(self.fail("Unexpected EOF during string literal"));
            }
            let window = &self.buf[self.pos..];
            match window.iter().position(|&b| b == b'"' || b == b'\\') {
                None => {
                    self.scratch.extend_from_slice(window);
                    self.pos = self.buf.len();
                }
                Some(i) => {
                    self.scratch.extend_from_slice(&window[..i]);
                    let stop = window[i];
                    self.pos += i + 1;
                    if stop == b'"' {
                        break;
                    }
                    self.consume_escape()?;
                }
            }
        }
        self.take_scratch()
    }

    fn consume_escape(&mut self) -> Result<(), Error> {
        let Some(escaped) = self.next_byte()? else {
            return Err(self.fail("Unexpected EOF after escape character"));
        };
        let byte = match escaped {
            b'"' => b'"',
            b'\\' => b'\\',
            b'/' => b'/',
            b'b' => 0x08,
            b'f' => 0x0c,
            b'n' => b'\n',
            b'r' => b'\r',
            b't' => b'\t',
            b'u' => {
                let c = self.consume_unicode_escape()?;
                let mut utf8 = [0u8; 4];
                self.scratch
                    .extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
                return Ok(());
            }
            other => {
                return Err(self.fail(format!("Invalid escaped char '{}'", other as char)));
            }
        };
        self.scratch.push(byte);
        Ok(())
    }

    fn read_hex4(&mut self) -> Result<u32, Error> {
        if !self.fill(4)? {
            return Err(self.fail("Unexpected EOF during unicode escape"));
        }
        let mut value = 0;
        for i in 0..4 {
            let digit = (self.buf[self.pos + i] as char).to_digit(16);
            match digit {
                Some(d) => value = value * 16 + d,
                None => return Err(self.fail("Invalid hex digit in unicode escape")),
            }
        }
        self.pos += 4;
        Ok(value)
    }

    fn consume_unicode_escape(&mut self) -> Result<char, Error> {
        let first = self.read_hex4()?;
        if (0xD800..0xDC00).contains(&first) {
            if !self.fill(2)? || &self.buf[self.pos..self.pos + 2] != b"\\u" {
                return Err(self.fail("Unpaired high surrogate in unicode escape"));
            }
            self.pos += 2;
            let second = self.read_hex4()?;
            if !(0xDC00..0xE000).contains(&second) {
                return Err(self.fail("Invalid low surrogate in unicode escape"));
            }
            let code = 0x10000 + ((first - 0xD800) << 10) + (second - 0xDC00);
            return char::from_u32(code).ok_or_else(|| self.fail("Invalid unicode escape"));
        }
        char::from_u32(first).ok_or_else(|| self.fail("Unpaired low surrogate in unicode escape"))
    }

    /// Reads an unquoted literal up to the next structural character or
    /// whitespace.
    pub(crate) fn consume_literal(&mut self) -> Result<String, Error> {
        self.skip_whitespace()?;
        self.scratch.clear();
        loop {
            if self.pos >= self.buf.len() && !self.fill(1)? {
                break;
            }
            let window = &self.buf[self.pos..];
            let end = window.iter().position(|&b| is_terminator(b));
            let take = end.unwrap_or(window.len());
            self.scratch.extend_from_slice(&window[..take]);
            self.pos += take;
            if end.is_some() {
                break;
            }
        }
        if self.scratch.is_empty() {
            return Err(self.unexpected("a literal"));
        }
        self.take_scratch()
    }

    /// Text of the next primitive and whether it was quoted.
    pub(crate) fn consume_primitive(&mut self) -> Result<(String, bool), Error> {
        match self.peek_token()? {
            Token::String => Ok((self.consume_string()?, true)),
            Token::Literal => Ok((self.consume_literal()?, false)),
            _ => Err(self.unexpected("a primitive value")),
        }
    }

    /// Reads a string value or object key. Unquoted text is accepted only
    /// when `lenient`.
    pub(crate) fn consume_string_lenient(&mut self, lenient: bool) -> Result<String, Error> {
        match self.peek_token()? {
            Token::String => self.consume_string(),
            Token::Literal if lenient => {
                let start = self.offset();
                let literal = self.consume_literal()?;
                if literal == "null" {
                    return Err(Error::json_decoding(
                        start,
                        "Unexpected 'null' literal when a string was expected",
                        self.path.render(),
                    ));
                }
                Ok(literal)
            }
            _ => Err(self.unexpected(Token::String.describe())),
        }
    }

    /// Skips one complete value of any shape.
    pub(crate) fn skip_element(&mut self) -> Result<(), Error> {
        let mut closers: Vec<Token> = Vec::new();
        loop {
            match self.peek_token()? {
                Token::BeginObject => {
                    self.pos += 1;
                    closers.push(Token::EndObject);
                }
                Token::BeginList => {
                    self.pos += 1;
                    closers.push(Token::EndList);
                }
                token @ (Token::EndObject | Token::EndList) => {
                    if closers.last() != Some(&token) {
                        return Err(self.fail(format!(
                            "found {} instead of {}",
                            token.describe(),
                            closers.last().map_or("a value", |t| t.describe())
                        )));
                    }
                    self.pos += 1;
                    closers.pop();
                }
                Token::Comma | Token::Colon if !closers.is_empty() => self.pos += 1,
                Token::String => {
                    self.consume_string()?;
                }
                Token::Literal => {
                    self.consume_literal()?;
                }
                Token::Eof => return Err(self.fail("Unexpected EOF while skipping a value")),
                Token::Comma | Token::Colon => return Err(self.unexpected("a value")),
            }
            if closers.is_empty() {
                return Ok(());
            }
        }
    }

    /// Parses the next value into a tree.
    pub(crate) fn parse_element(&mut self, lenient: bool) -> Result<JsonElement, Error> {
        match self.peek_token()? {
            Token::BeginObject => {
                self.pos += 1;
                let mut object = JsonObject::new();
                if self.peek_token()? == Token::EndObject {
                    self.pos += 1;
                    return Ok(JsonElement::Object(object));
                }
                loop {
                    let key = self.consume_string_lenient(lenient)?;
                    self.consume_token(Token::Colon)?;
                    let value = self.parse_element(lenient)?;
                    object.insert(key, value);
                    if self.try_consume_comma()? {
                        if self.peek_token()? == Token::EndObject {
                            return Err(self.fail("Trailing comma before the end of JSON object"));
                        }
                        continue;
                    }
                    self.consume_token(Token::EndObject)?;
                    return Ok(JsonElement::Object(object));
                }
            }
            Token::BeginList => {
                self.pos += 1;
                let mut items = Vec::new();
                if self.peek_token()? == Token::EndList {
                    self.pos += 1;
                    return Ok(JsonElement::Array(items));
                }
                loop {
                    items.push(self.parse_element(lenient)?);
                    if self.try_consume_comma()? {
                        if self.peek_token()? == Token::EndList {
                            return Err(self.fail("Trailing comma before the end of JSON array"));
                        }
                        continue;
                    }
                    self.consume_token(Token::EndList)?;
                    return Ok(JsonElement::Array(items));
                }
            }
            Token::String => Ok(JsonElement::String(self.consume_string()?)),
            Token::Literal => {
                let start = self.offset();
                let literal = self.consume_literal()?;
                Ok(match literal.as_str() {
                    "null" => JsonElement::Null,
                    "true" => JsonElement::Bool(true),
                    "false" => JsonElement::Bool(false),
                    _ if looks_numeric(&literal) => JsonElement::Number(literal),
                    _ if lenient => JsonElement::String(literal),
                    _ => {
                        return Err(Error::json_decoding(
                            start,
                            format!("Unexpected literal '{literal}'"),
                            self.path.render(),
                        ))
                    }
                })
            }
            _ => Err(self.unexpected("a value")),
        }
    }

    /// Fails unless only whitespace remains.
    pub(crate) fn expect_eof(&mut self) -> Result<(), Error> {
        if self.peek_token()? != Token::Eof {
            return Err(self.unexpected("EOF after parsing the root value"));
        }
        Ok(())
    }
}

/// Numbers plus the special floating-point literals.
pub(crate) fn looks_numeric(literal: &str) -> bool {
    let digits = literal.strip_prefix('-').unwrap_or(literal);
    digits.starts_with(|c: char| c.is_ascii_digit()) || matches!(literal, "NaN" | "Infinity" | "-Infinity")
}
