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


//! Streaming decoder driven directly by the lexer.

use std::borrow::Cow;

use tracing::trace;

use super::element::JsonElement;
use super::lexer::{looks_numeric, JsonLexer, Token};
use super::literal::{parse_bool, parse_char, parse_f32, parse_f64, parse_integer, parse_u64};
use super::tree::TreeDecoder;
use super::{element_index, switch_mode, Json, WriteMode};
use crate::descriptor::SerialDescriptor;
use crate::encoding::{CompositeDecoder, Decoder, DecoderFn, ElementIndex, ElementMarker, PolymorphicFn};
use crate::error::Error;
use crate::format::AbsentDecoder;
use crate::module::SerializersModule;

pub(crate) struct JsonDecoder<'a, 'r> {
    json: &'a Json,
    lexer: &'a mut JsonLexer<'r>,
}

impl<'a, 'r> JsonDecoder<'a, 'r> {
    pub(crate) fn new(json: &'a Json, lexer: &'a mut JsonLexer<'r>) -> Self {
        JsonDecoder { json, lexer }
    }

    /// Reads the next primitive and converts it, reporting failures at the
    /// literal's start.
    fn parse<T, F>(&mut self, parse: F) -> Result<T, Error>
    where
        F: FnOnce(&str) -> Result<T, Cow<'static, str>>,
    {
        self.lexer.peek_token()?;
        let start = self.lexer.offset();
        let (text, _quoted) = self.lexer.consume_primitive()?;
        parse(&text).map_err(|message| Error::json_decoding(start, message, self.lexer.path.render()))
    }
}

impl Decoder for JsonDecoder<'_, '_> {
    fn serializers_module(&self) -> &SerializersModule {
        self.json.serializers_module()
    }

    fn decode_not_null_mark(&mut self) -> Result<bool, Error> {
        Ok(!self.lexer.peek_null()?)
    }

    fn decode_null(&mut self) -> Result<(), Error> {
        self.lexer.consume_null()
    }

    fn decode_bool(&mut self) -> Result<bool, Error> {
        self.parse(parse_bool)
    }

    fn decode_i8(&mut self) -> Result<i8, Error> {
        self.parse(|t| parse_integer(t, "i8"))
    }

    fn decode_i16(&mut self) -> Result<i16, Error> {
        self.parse(|t| parse_integer(t, "i16"))
    }

    fn decode_i32(&mut self) -> Result<i32, Error> {
        self.parse(|t| parse_integer(t, "i32"))
    }

    fn decode_i64(&mut self) -> Result<i64, Error> {
        self.parse(|t| parse_integer(t, "i64"))
    }

    fn decode_u64(&mut self) -> Result<u64, Error> {
        self.parse(parse_u64)
    }

    fn decode_f32(&mut self) -> Result<f32, Error> {
        let allow = self.json.config.is_allow_special_floats();
        self.parse(|t| parse_f32(t, allow))
    }

    fn decode_f64(&mut self) -> Result<f64, Error> {
        let allow = self.json.config.is_allow_special_floats();
        self.parse(|t| parse_f64(t, allow))
    }

    fn decode_char(&mut self) -> Result<char, Error> {
        self.lexer.peek_token()?;
        let start = self.lexer.offset();
        let text = self.decode_string()?;
        parse_char(&text).map_err(|message| Error::json_decoding(start, message, self.lexer.path.render()))
    }

    fn decode_string(&mut self) -> Result<String, Error> {
        self.lexer.consume_string_lenient(self.json.config.is_lenient())
    }

    fn decode_enum(&mut self, descriptor: &SerialDescriptor) -> Result<usize, Error> {
        self.lexer.peek_token()?;
        let start = self.lexer.offset();
        let name = self.decode_string()?;
        element_index(descriptor, &name).ok_or_else(|| {
            Error::json_decoding(
                start,
                format!("{} does not contain element with name '{name}'", descriptor.serial_name()),
                self.lexer.path.render(),
            )
        })
    }

    fn begin_structure(
        &mut self,
        descriptor: &SerialDescriptor,
    ) -> Result<Box<dyn CompositeDecoder + '_>, Error> {
        let mode = switch_mode(descriptor).map_err(|message| self.lexer.fail(message))?;
        match mode {
            WriteMode::Obj => {
                self.lexer.consume_token(Token::BeginObject)?;
                self.lexer.path.push_object();
            }
            WriteMode::Map => {
                self.lexer.consume_token(Token::BeginObject)?;
                self.lexer.path.push_map();
            }
            WriteMode::List | WriteMode::PolyObj => {
                self.lexer.consume_token(Token::BeginList)?;
                self.lexer.path.push_list();
            }
        }
        let marker = (mode == WriteMode::Obj && !self.json.config.is_explicit_nulls())
            .then(|| ElementMarker::new(descriptor));
        Ok(Box::new(JsonCompositeDecoder {
            json: self.json,
            lexer: &mut *self.lexer,
            mode,
            count: 0,
            marker,
            absent: None,
        }))
    }

    /// Parses the whole object into a tree, pulls out the discriminator and
    /// hands the rest to a [`TreeDecoder`].
    fn decode_inline_polymorphic(
        &mut self,
        base: &SerialDescriptor,
        f: &mut PolymorphicFn<'_>,
    ) -> Result<bool, Error> {
        let config = &self.json.config;
        if config.is_use_array_polymorphism() {
            return Ok(false);
        }
        self.lexer.peek_token()?;
        let start = self.lexer.offset();
        let mut object = match self.lexer.parse_element(config.is_lenient())? {
            JsonElement::Object(object) => object,
            other => {
                return Err(Error::json_decoding(
                    start,
                    format!(
                        "Expected JsonObject for polymorphic '{}', but had {}",
                        base.serial_name(),
                        other.type_name()
                    ),
                    self.lexer.path.render(),
                ))
            }
        };
        let key = config.get_class_discriminator();
        let serial_name = match object.remove(key) {
            None | Some(JsonElement::Null) => None,
            Some(JsonElement::String(name)) => Some(name),
            Some(other) => {
                return Err(Error::json_decoding(
                    start,
                    format!("Class discriminator '{key}' must be a string, but had {other}"),
                    self.lexer.path.render(),
                ))
            }
        };
        let element = JsonElement::Object(object);
        let mut tree = TreeDecoder::new(self.json, Some(&element), &mut self.lexer.path, start);
        f(serial_name.as_deref(), &mut tree)?;
        Ok(true)
    }
}

struct JsonCompositeDecoder<'a, 'r> {
    json: &'a Json,
    lexer: &'a mut JsonLexer<'r>,
    mode: WriteMode,
    /// Elements handed out so far.
    count: usize,
    /// Present when omitted nulls must be surfaced as elements.
    marker: Option<ElementMarker>,
    /// Element reported by the marker; its value is not in the input.
    absent: Option<usize>,
}

impl JsonCompositeDecoder<'_, '_> {
    fn list_index(&mut self) -> Result<ElementIndex, Error> {
        let has_comma = self.lexer.try_consume_comma()?;
        if !self.lexer.can_consume_value()? {
            if has_comma {
                return Err(self.lexer.fail("Trailing comma before the end of JSON array"));
            }
            return Ok(ElementIndex::Done);
        }
        if self.count == 0 && has_comma {
            return Err(self.lexer.fail("Unexpected leading comma"));
        }
        if self.count > 0 && !has_comma {
            return Err(self.lexer.fail("Expected end of the array or comma"));
        }
        let index = self.count;
        self.count += 1;
        self.lexer.path.set_index(index);
        Ok(ElementIndex::Element(index))
    }

    fn map_index(&mut self) -> Result<ElementIndex, Error> {
        let decoding_key = self.count % 2 == 0;
        let mut has_comma = false;
        if !decoding_key {
            self.lexer.consume_token(Token::Colon)?;
        } else if self.count > 0 {
            has_comma = self.lexer.try_consume_comma()?;
        }
        if !self.lexer.can_consume_value()? {
            if !decoding_key {
                return Err(self.lexer.unexpected("a map value"));
            }
            if has_comma {
                return Err(self.lexer.fail("Trailing comma before the end of JSON object"));
            }
            return Ok(ElementIndex::Done);
        }
        if decoding_key && self.count > 0 && !has_comma {
            return Err(self.lexer.fail("Expected comma after the key-value pair"));
        }
        let index = self.count;
        self.count += 1;
        Ok(ElementIndex::Element(index))
    }

    fn object_index(&mut self, descriptor: &SerialDescriptor) -> Result<ElementIndex, Error> {
        let config = &self.json.config;
        let mut has_comma = self.lexer.try_consume_comma()?;
        if has_comma && self.count == 0 {
            return Err(self.lexer.fail("Unexpected leading comma"));
        }
        while self.lexer.can_consume_value()? {
            if self.count > 0 && !has_comma {
                return Err(self.lexer.fail("Expected comma after the key-value pair"));
            }
            self.count += 1;
            let key = self.lexer.consume_string_lenient(config.is_lenient())?;
            self.lexer.consume_token(Token::Colon)?;
            if let Some(index) = element_index(descriptor, &key) {
                if let Some(marker) = &mut self.marker {
                    marker.mark(index);
                }
                self.lexer.path.set_field(&descriptor.element_name(index));
                return Ok(ElementIndex::Element(index));
            }
            if !config.is_ignore_unknown_keys() {
                return Err(self.lexer.fail(format!(
                    "Encountered an unknown key '{key}'. Use 'ignore_unknown_keys' to skip unknown keys"
                )));
            }
            trace!(key = %key, serial_name = descriptor.serial_name(), "skipping unknown JSON key");
            self.lexer.skip_element()?;
            has_comma = self.lexer.try_consume_comma()?;
        }
        if has_comma {
            return Err(self.lexer.fail("Trailing comma before the end of JSON object"));
        }
        if let Some(marker) = &mut self.marker {
            let absent = marker.next_unmarked_index(descriptor, |d, i| {
                !d.is_element_optional(i) && d.element_descriptor(i).is_nullable()
            });
            if let Some(index) = absent {
                self.absent = Some(index);
                return Ok(ElementIndex::Element(index));
            }
        }
        Ok(ElementIndex::Done)
    }

    /// Map keys are always primitives; they are read here so the path can
    /// name them, then decoded from a one-node tree.
    fn decode_map_key(&mut self, f: &mut DecoderFn<'_>) -> Result<(), Error> {
        self.lexer.peek_token()?;
        let start = self.lexer.offset();
        let (text, quoted) = self.lexer.consume_primitive()?;
        self.lexer.path.set_map_key(&text);
        let key = match text.as_str() {
            _ if quoted => JsonElement::String(text),
            "null" => JsonElement::Null,
            "true" => JsonElement::Bool(true),
            "false" => JsonElement::Bool(false),
            _ if looks_numeric(&text) || !self.json.config.is_lenient() => JsonElement::Number(text),
            _ => JsonElement::String(text),
        };
        let mut tree = TreeDecoder::new(self.json, Some(&key), &mut self.lexer.path, start);
        f(&mut tree)
    }
}

impl CompositeDecoder for JsonCompositeDecoder<'_, '_> {
    fn decode_element_index(&mut self, descriptor: &SerialDescriptor) -> Result<ElementIndex, Error> {
        match self.mode {
            WriteMode::Obj => self.object_index(descriptor),
            WriteMode::Map => self.map_index(),
            WriteMode::List | WriteMode::PolyObj => self.list_index(),
        }
    }

    fn decode_element(
        &mut self,
        descriptor: &SerialDescriptor,
        index: usize,
        f: &mut DecoderFn<'_>,
    ) -> Result<(), Error> {
        if self.absent == Some(index) {
            self.absent = None;
            let mut absent = AbsentDecoder::new(self.json.serializers_module(), descriptor, index);
            return f(&mut absent);
        }
        if self.mode == WriteMode::Map && index % 2 == 0 {
            return self.decode_map_key(f);
        }
        let mut element = JsonDecoder {
            json: self.json,
            lexer: &mut *self.lexer,
        };
        f(&mut element)
    }

    fn end_structure(&mut self, _descriptor: &SerialDescriptor) -> Result<(), Error> {
        let end = match self.mode {
            WriteMode::Obj | WriteMode::Map => Token::EndObject,
            WriteMode::List | WriteMode::PolyObj => Token::EndList,
        };
        self.lexer.consume_token(end)?;
        self.lexer.path.pop();
        Ok(())
    }
}
