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


//! Concrete formats: JSON, protobuf, CBOR and flat property maps.
//!
//! Each format is a small value type holding a [`Config`] and a shared
//! [`SerializersModule`]; it drives any [`Serializer`] through the protocol in
//! [`crate::encoding`].

pub mod cbor;
pub mod json;
pub mod properties;
pub mod protobuf;

use std::io::{Read, Write};

use crate::config::Config;
use crate::descriptor::SerialDescriptor;
use crate::encoding::{CompositeDecoder, Decoder, DecoderFn, ElementIndex};
use crate::error::Error;
use crate::framing::{DelimitedReader, DelimitedWriter};
use crate::module::SerializersModule;
use crate::serializer::{Serializable, Serializer};

/// A format producing bytes.
pub trait BinaryFormat {
    fn config(&self) -> &Config;

    fn serializers_module(&self) -> &SerializersModule;

    fn encode_to_bytes<S>(&self, serializer: &S, value: &S::Value) -> Result<Vec<u8>, Error>
    where
        S: Serializer + ?Sized;

    fn decode_from_bytes<S>(&self, serializer: &S, bytes: &[u8]) -> Result<S::Value, Error>
    where
        S: Serializer + ?Sized;

    /// Encodes with the serializer the module resolves for `T`.
    fn encode<T: Serializable>(&self, value: &T) -> Result<Vec<u8>, Error> {
        let serializer = self.serializers_module().serializer::<T>();
        self.encode_to_bytes(&*serializer, value)
    }

    fn decode<T: Serializable>(&self, bytes: &[u8]) -> Result<T, Error> {
        let serializer = self.serializers_module().serializer::<T>();
        self.decode_from_bytes(&*serializer, bytes)
    }

    /// Reader over `inner` limited to this format's `max_message_size`.
    fn delimited_reader<R: Read>(&self, inner: R) -> DelimitedReader<R> {
        DelimitedReader::new(inner).with_max_message_size(self.config().get_max_message_size())
    }

    /// Encodes `value` and writes it as one length-prefixed message.
    fn encode_delimited<S, W>(
        &self,
        serializer: &S,
        value: &S::Value,
        writer: &mut DelimitedWriter<W>,
    ) -> Result<(), Error>
    where
        S: Serializer + ?Sized,
        W: Write,
    {
        let payload = self.encode_to_bytes(serializer, value)?;
        writer.write_message(&payload)
    }

    /// Decodes the next message, or returns `None` at a clean end of stream.
    fn decode_delimited<S, R>(
        &self,
        serializer: &S,
        reader: &mut DelimitedReader<R>,
    ) -> Result<Option<S::Value>, Error>
    where
        S: Serializer + ?Sized,
        R: Read,
    {
        match reader.read_message()? {
            Some(payload) => self.decode_from_bytes(serializer, &payload).map(Some),
            None => Ok(None),
        }
    }
}

/// A format producing text.
pub trait StringFormat {
    fn config(&self) -> &Config;

    fn serializers_module(&self) -> &SerializersModule;

    fn encode_to_string<S>(&self, serializer: &S, value: &S::Value) -> Result<String, Error>
    where
        S: Serializer + ?Sized;

    fn decode_from_str<S>(&self, serializer: &S, input: &str) -> Result<S::Value, Error>
    where
        S: Serializer + ?Sized;

    fn encode<T: Serializable>(&self, value: &T) -> Result<String, Error> {
        let serializer = self.serializers_module().serializer::<T>();
        self.encode_to_string(&*serializer, value)
    }

    fn decode<T: Serializable>(&self, input: &str) -> Result<T, Error> {
        let serializer = self.serializers_module().serializer::<T>();
        self.decode_from_str(&*serializer, input)
    }
}

/// Stands in for an element the input does not carry.
///
/// It reads as null when asked, and as an empty structure when opened.
/// Formats use it for absent nullable fields and absent collections; any
/// primitive read reports the element as missing.
pub(crate) struct AbsentDecoder<'a> {
    module: &'a SerializersModule,
    descriptor: &'a SerialDescriptor,
    index: usize,
}

impl<'a> AbsentDecoder<'a> {
    pub(crate) fn new(module: &'a SerializersModule, descriptor: &'a SerialDescriptor, index: usize) -> Self {
        AbsentDecoder {
            module,
            descriptor,
            index,
        }
    }

    fn missing(&self) -> Error {
        Error::missing_field(
            self.descriptor.element_name(self.index).into_owned(),
            self.descriptor.serial_name(),
        )
    }
}

impl Decoder for AbsentDecoder<'_> {
    fn serializers_module(&self) -> &SerializersModule {
        self.module
    }

    fn decode_not_null_mark(&mut self) -> Result<bool, Error> {
        Ok(false)
    }

    fn decode_null(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn decode_bool(&mut self) -> Result<bool, Error> {
        Err(self.missing())
    }

    fn decode_i8(&mut self) -> Result<i8, Error> {
        Err(self.missing())
    }

    fn decode_i16(&mut self) -> Result<i16, Error> {
        Err(self.missing())
    }

    fn decode_i32(&mut self) -> Result<i32, Error> {
        Err(self.missing())
    }

    fn decode_i64(&mut self) -> Result<i64, Error> {
        Err(self.missing())
    }

    fn decode_f32(&mut self) -> Result<f32, Error> {
        Err(self.missing())
    }

    fn decode_f64(&mut self) -> Result<f64, Error> {
        Err(self.missing())
    }

    fn decode_char(&mut self) -> Result<char, Error> {
        Err(self.missing())
    }

    fn decode_string(&mut self) -> Result<String, Error> {
        Err(self.missing())
    }

    fn decode_enum(&mut self, _descriptor: &SerialDescriptor) -> Result<usize, Error> {
        Err(self.missing())
    }

    fn begin_structure(
        &mut self,
        _descriptor: &SerialDescriptor,
    ) -> Result<Box<dyn CompositeDecoder + '_>, Error> {
        Ok(Box::new(EmptyComposite))
    }
}

struct EmptyComposite;

impl CompositeDecoder for EmptyComposite {
    fn decode_element_index(&mut self, _descriptor: &SerialDescriptor) -> Result<ElementIndex, Error> {
        Ok(ElementIndex::Done)
    }

    fn decode_collection_size(&mut self, _descriptor: &SerialDescriptor) -> Result<Option<usize>, Error> {
        Ok(Some(0))
    }

    fn decode_element(
        &mut self,
        descriptor: &SerialDescriptor,
        index: usize,
        _f: &mut DecoderFn<'_>,
    ) -> Result<(), Error> {
        Err(Error::unknown_element_index(index, descriptor.serial_name()))
    }

    fn end_structure(&mut self, _descriptor: &SerialDescriptor) -> Result<(), Error> {
        Ok(())
    }
}
