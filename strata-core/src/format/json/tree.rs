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


//! Decoding from an already parsed [`JsonElement`].
//!
//! Used for polymorphic values, whose discriminator may appear anywhere in
//! the object, and by [`Json::decode_from_element`].

use std::borrow::Cow;

use tracing::trace;

use super::element::{JsonElement, JsonObject};
use super::literal::{parse_bool, parse_char, parse_f32, parse_f64, parse_integer, parse_u64};
use super::path::JsonPath;
use super::{element_index, switch_mode, Json, WriteMode};
use crate::descriptor::SerialDescriptor;
use crate::encoding::{CompositeDecoder, Decoder, DecoderFn, ElementIndex, ElementMarker, PolymorphicFn};
use crate::error::Error;
use crate::module::SerializersModule;

/// Decoder over one node; `None` is a value missing from its parent object
/// and reads as null.
pub(crate) struct TreeDecoder<'a, 'p> {
    json: &'a Json,
    value: Option<&'a JsonElement>,
    path: &'p mut JsonPath,
    /// Input offset of the parsed tree, used for every error inside it.
    origin: usize,
}

impl<'a, 'p> TreeDecoder<'a, 'p> {
    pub(crate) fn new(
        json: &'a Json,
        value: Option<&'a JsonElement>,
        path: &'p mut JsonPath,
        origin: usize,
    ) -> Self {
        TreeDecoder {
            json,
            value,
            path,
            origin,
        }
    }

    #[cold]
    fn fail<M: Into<Cow<'static, str>>>(&self, message: M) -> Error {
        Error::json_decoding(self.origin, message, self.path.render())
    }

    fn primitive(&self, expected: &str) -> Result<(&'a str, bool), Error> {
        match self.value {
            Some(value) => value.primitive_content().ok_or_else(|| {
                self.fail(format!(
                    "Expected JsonPrimitive for {expected}, but had {}",
                    value.type_name()
                ))
            }),
            None => Err(self.fail(format!("Expected {expected}, but the value is absent"))),
        }
    }

    fn parse<T, F>(&self, expected: &str, parse: F) -> Result<T, Error>
    where
        F: FnOnce(&str) -> Result<T, Cow<'static, str>>,
    {
        let (text, _quoted) = self.primitive(expected)?;
        parse(text).map_err(|message| self.fail(message))
    }

    fn string(&self) -> Result<&'a str, Error> {
        match self.value {
            Some(JsonElement::String(s)) => Ok(s),
            Some(JsonElement::Null) | None => {
                Err(self.fail("Unexpected 'null' literal when a string was expected"))
            }
            Some(JsonElement::Number(text)) if self.json.config.is_lenient() => Ok(text),
            Some(JsonElement::Bool(b)) if self.json.config.is_lenient() => {
                Ok(if *b { "true" } else { "false" })
            }
            Some(other) => Err(self.fail(format!(
                "Expected quoted string literal, but had {}",
                other.type_name()
            ))),
        }
    }

    fn discriminated(&self, base: &SerialDescriptor) -> Result<(Option<String>, JsonObject), Error> {
        let object = match self.value {
            Some(JsonElement::Object(object)) => object,
            other => {
                return Err(self.fail(format!(
                    "Expected JsonObject for polymorphic '{}', but had {}",
                    base.serial_name(),
                    other.map_or("nothing", JsonElement::type_name)
                )))
            }
        };
        let key = self.json.config.get_class_discriminator();
        let mut rest = object.clone();
        let serial_name = match rest.remove(key) {
            None | Some(JsonElement::Null) => None,
            Some(JsonElement::String(name)) => Some(name),
            Some(other) => {
                return Err(self.fail(format!(
                    "Class discriminator '{key}' must be a string, but had {other}"
                )))
            }
        };
        Ok((serial_name, rest))
    }
}

impl Decoder for TreeDecoder<'_, '_> {
    fn serializers_module(&self) -> &SerializersModule {
        self.json.serializers_module()
    }

    fn decode_not_null_mark(&mut self) -> Result<bool, Error> {
        Ok(matches!(self.value, Some(value) if !value.is_null()))
    }

    fn decode_null(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn decode_bool(&mut self) -> Result<bool, Error> {
        self.parse("bool", parse_bool)
    }

    fn decode_i8(&mut self) -> Result<i8, Error> {
        self.parse("i8", |t| parse_integer(t, "i8"))
    }

    fn decode_i16(&mut self) -> Result<i16, Error> {
        self.parse("i16", |t| parse_integer(t, "i16"))
    }

    fn decode_i32(&mut self) -> Result<i32, Error> {
        self.parse("i32", |t| parse_integer(t, "i32"))
    }

    fn decode_i64(&mut self) -> Result<i64, Error> {
        self.parse("i64", |t| parse_integer(t, "i64"))
    }

    fn decode_u64(&mut self) -> Result<u64, Error> {
        self.parse("u64", parse_u64)
    }

    fn decode_f32(&mut self) -> Result<f32, Error> {
        let allow = self.json.config.is_allow_special_floats();
        self.parse("f32", |t| parse_f32(t, allow))
    }

    fn decode_f64(&mut self) -> Result<f64, Error> {
        let allow = self.json.config.is_allow_special_floats();
        self.parse("f64", |t| parse_f64(t, allow))
    }

    fn decode_char(&mut self) -> Result<char, Error> {
        let text = self.string()?;
        parse_char(text).map_err(|message| self.fail(message))
    }

    fn decode_string(&mut self) -> Result<String, Error> {
        self.string().map(str::to_owned)
    }

    fn decode_enum(&mut self, descriptor: &SerialDescriptor) -> Result<usize, Error> {
        let name = self.string()?;
        element_index(descriptor, name).ok_or_else(|| {
            self.fail(format!(
                "{} does not contain element with name '{name}'",
                descriptor.serial_name()
            ))
        })
    }

    fn begin_structure(
        &mut self,
        descriptor: &SerialDescriptor,
    ) -> Result<Box<dyn CompositeDecoder + '_>, Error> {
        let mode = switch_mode(descriptor).map_err(|message| self.fail(message))?;
        let (json, origin) = (self.json, self.origin);
        match (mode, self.value) {
            (WriteMode::Obj, Some(JsonElement::Object(object))) => {
                self.path.push_object();
                let marker = (!json.config.is_explicit_nulls()).then(|| ElementMarker::new(descriptor));
                Ok(Box::new(TreeObjectDecoder {
                    json,
                    object,
                    position: 0,
                    current: None,
                    marker,
                    path: &mut *self.path,
                    origin,
                }))
            }
            (WriteMode::Map, Some(JsonElement::Object(object))) => {
                self.path.push_map();
                Ok(Box::new(TreeMapDecoder {
                    json,
                    object,
                    count: 0,
                    path: &mut *self.path,
                    origin,
                }))
            }
            (WriteMode::List | WriteMode::PolyObj, Some(JsonElement::Array(items))) => {
                self.path.push_list();
                Ok(Box::new(TreeListDecoder {
                    json,
                    items,
                    count: 0,
                    path: &mut *self.path,
                    origin,
                }))
            }
            (mode, other) => {
                let expected = match mode {
                    WriteMode::Obj | WriteMode::Map => "JsonObject",
                    WriteMode::List | WriteMode::PolyObj => "JsonArray",
                };
                Err(self.fail(format!(
                    "Expected {expected} as the serialized body of {}, but had {}",
                    descriptor.serial_name(),
                    other.map_or("nothing", JsonElement::type_name)
                )))
            }
        }
    }

    fn decode_inline_polymorphic(
        &mut self,
        base: &SerialDescriptor,
        f: &mut PolymorphicFn<'_>,
    ) -> Result<bool, Error> {
        if self.json.config.is_use_array_polymorphism() {
            return Ok(false);
        }
        let (serial_name, rest) = self.discriminated(base)?;
        let rest = JsonElement::Object(rest);
        let mut inner = TreeDecoder::new(self.json, Some(&rest), &mut *self.path, self.origin);
        f(serial_name.as_deref(), &mut inner)?;
        Ok(true)
    }
}

struct TreeObjectDecoder<'a, 'p> {
    json: &'a Json,
    object: &'a JsonObject,
    position: usize,
    current: Option<&'a JsonElement>,
    marker: Option<ElementMarker>,
    path: &'p mut JsonPath,
    origin: usize,
}

impl CompositeDecoder for TreeObjectDecoder<'_, '_> {
    fn decode_element_index(&mut self, descriptor: &SerialDescriptor) -> Result<ElementIndex, Error> {
        while let Some((key, value)) = self.object.entry_at(self.position) {
            self.position += 1;
            if let Some(index) = element_index(descriptor, key) {
                if let Some(marker) = &mut self.marker {
                    marker.mark(index);
                }
                self.current = Some(value);
                self.path.set_field(&descriptor.element_name(index));
                return Ok(ElementIndex::Element(index));
            }
            if !self.json.config.is_ignore_unknown_keys() {
                return Err(Error::json_decoding(
                    self.origin,
                    format!("Encountered an unknown key '{key}'. Use 'ignore_unknown_keys' to skip unknown keys"),
                    self.path.render(),
                ));
            }
            trace!(key, serial_name = descriptor.serial_name(), "skipping unknown JSON key");
        }
        if let Some(marker) = &mut self.marker {
            let absent = marker.next_unmarked_index(descriptor, |d, i| {
                !d.is_element_optional(i) && d.element_descriptor(i).is_nullable()
            });
            if let Some(index) = absent {
                self.current = None;
                return Ok(ElementIndex::Element(index));
            }
        }
        Ok(ElementIndex::Done)
    }

    fn decode_element(
        &mut self,
        _descriptor: &SerialDescriptor,
        _index: usize,
        f: &mut DecoderFn<'_>,
    ) -> Result<(), Error> {
        let mut element = TreeDecoder::new(self.json, self.current.take(), &mut *self.path, self.origin);
        f(&mut element)
    }

    fn end_structure(&mut self, _descriptor: &SerialDescriptor) -> Result<(), Error> {
        self.path.pop();
        Ok(())
    }
}

struct TreeListDecoder<'a, 'p> {
    json: &'a Json,
    items: &'a [JsonElement],
    count: usize,
    path: &'p mut JsonPath,
    origin: usize,
}

impl CompositeDecoder for TreeListDecoder<'_, '_> {
    fn decode_element_index(&mut self, _descriptor: &SerialDescriptor) -> Result<ElementIndex, Error> {
        if self.count >= self.items.len() {
            return Ok(ElementIndex::Done);
        }
        let index = self.count;
        self.count += 1;
        self.path.set_index(index);
        Ok(ElementIndex::Element(index))
    }

    fn decode_collection_size(&mut self, _descriptor: &SerialDescriptor) -> Result<Option<usize>, Error> {
        Ok(Some(self.items.len()))
    }

    fn decode_element(
        &mut self,
        _descriptor: &SerialDescriptor,
        index: usize,
        f: &mut DecoderFn<'_>,
    ) -> Result<(), Error> {
        let mut element = TreeDecoder::new(self.json, self.items.get(index), &mut *self.path, self.origin);
        f(&mut element)
    }

    fn end_structure(&mut self, _descriptor: &SerialDescriptor) -> Result<(), Error> {
        self.path.pop();
        Ok(())
    }
}

/// Entry `i` of the object is element `2i` (its key) and `2i + 1`.
struct TreeMapDecoder<'a, 'p> {
    json: &'a Json,
    object: &'a JsonObject,
    count: usize,
    path: &'p mut JsonPath,
    origin: usize,
}

impl CompositeDecoder for TreeMapDecoder<'_, '_> {
    fn decode_element_index(&mut self, _descriptor: &SerialDescriptor) -> Result<ElementIndex, Error> {
        if self.count >= self.object.len() * 2 {
            return Ok(ElementIndex::Done);
        }
        let index = self.count;
        self.count += 1;
        Ok(ElementIndex::Element(index))
    }

    fn decode_collection_size(&mut self, _descriptor: &SerialDescriptor) -> Result<Option<usize>, Error> {
        Ok(Some(self.object.len()))
    }

    fn decode_element(
        &mut self,
        descriptor: &SerialDescriptor,
        index: usize,
        f: &mut DecoderFn<'_>,
    ) -> Result<(), Error> {
        let Some((key, value)) = self.object.entry_at(index / 2) else {
            return Err(Error::unknown_element_index(index, descriptor.serial_name()));
        };
        if index % 2 == 1 {
            let mut element = TreeDecoder::new(self.json, Some(value), &mut *self.path, self.origin);
            return f(&mut element);
        }
        self.path.set_map_key(key);
        let key = JsonElement::String(key.to_owned());
        let mut element = TreeDecoder::new(self.json, Some(&key), &mut *self.path, self.origin);
        f(&mut element)
    }

    fn end_structure(&mut self, _descriptor: &SerialDescriptor) -> Result<(), Error> {
        self.path.pop();
        Ok(())
    }
}
