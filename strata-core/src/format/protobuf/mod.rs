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


//! Tag-length-value binary format, wire compatible with protocol buffers.
//!
//! Every element of a class is a field whose number comes from
//! [`ElementAnnotation::ProtoNumber`](crate::descriptor::ElementAnnotation)
//! or defaults to its position plus one. Values that are not messages are
//! written at the top level as field 1 of an implicit message.
//!
//! Nulls are encoded by omission. Absent nullable fields decode as null and
//! absent collections as empty.
//!
//! ```
//! use strata_core::format::protobuf::ProtoBuf;
//! use strata_core::format::BinaryFormat;
//!
//! let proto = ProtoBuf::default();
//! let bytes = proto.encode(&(150i32, "hi".to_string())).unwrap();
//! assert_eq!(bytes, [0x08, 0x96, 0x01, 0x12, 0x02, b'h', b'i']);
//! let back: (i32, String) = proto.decode(&bytes).unwrap();
//! assert_eq!(back, (150, "hi".to_string()));
//! ```

mod decoder;
mod encoder;

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::buffer::Writer;
use crate::config::Config;
use crate::descriptor::{
    is_packed, proto_integer_type, proto_number, PrimitiveKind, ProtoIntegerType, SerialDescriptor,
    SerialKind,
};
use crate::error::Error;
use crate::format::BinaryFormat;
use crate::module::SerializersModule;
use crate::serializer::Serializer;
use decoder::ProtobufDecoder;
use encoder::ProtobufEncoder;

/// Largest field number protocol buffers allow.
pub const MAX_FIELD_NUMBER: u32 = (1 << 29) - 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum WireType {
    Varint = 0,
    Fixed64 = 1,
    LengthDelimited = 2,
    Fixed32 = 5,
}

/// Field number and encoding of one element.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ProtoField {
    pub(crate) number: u32,
    pub(crate) integer_type: ProtoIntegerType,
    pub(crate) packed: bool,
}

impl ProtoField {
    /// Field carrying a top-level value that is not a message.
    pub(crate) const ROOT: ProtoField = ProtoField::plain(1);

    pub(crate) const fn plain(number: u32) -> ProtoField {
        ProtoField {
            number,
            integer_type: ProtoIntegerType::Default,
            packed: false,
        }
    }
}

#[inline]
pub(crate) fn write_tag(out: &mut Writer, number: u32, wire_type: WireType) {
    out.write_varuint32((number << 3) | u8::from(wire_type) as u32);
}

/// An empty root message cannot tell `None` from an empty `Some`.
#[cold]
pub(crate) fn nullable_root() -> Error {
    Error::unsupported("Nullable values are not supported at the root of a protobuf message; wrap them in a message")
}

/// Wire type of a scalar of `kind`, or `None` for strings and structures.
/// Exactly the kinds with a scalar wire type can be packed.
pub(crate) fn scalar_wire_type(kind: SerialKind, integer_type: ProtoIntegerType) -> Option<WireType> {
    let fixed = integer_type == ProtoIntegerType::Fixed;
    match kind {
        SerialKind::Primitive(PrimitiveKind::Float) => Some(WireType::Fixed32),
        SerialKind::Primitive(PrimitiveKind::Double) => Some(WireType::Fixed64),
        SerialKind::Primitive(PrimitiveKind::Long) if fixed => Some(WireType::Fixed64),
        SerialKind::Primitive(PrimitiveKind::Byte | PrimitiveKind::Short | PrimitiveKind::Int) if fixed => {
            Some(WireType::Fixed32)
        }
        SerialKind::Primitive(
            PrimitiveKind::Boolean
            | PrimitiveKind::Char
            | PrimitiveKind::Byte
            | PrimitiveKind::Short
            | PrimitiveKind::Int
            | PrimitiveKind::Long,
        )
        | SerialKind::Enum => Some(WireType::Varint),
        _ => None,
    }
}

/// Field layout of one message type.
#[derive(Debug)]
pub(crate) struct MessageSchema {
    fields: Vec<ProtoField>,
    by_number: HashMap<u32, usize>,
}

impl MessageSchema {
    fn build(descriptor: &SerialDescriptor) -> Result<MessageSchema, Error> {
        let count = descriptor.elements_count();
        let mut fields = Vec::with_capacity(count);
        let mut by_number = HashMap::with_capacity(count);
        for index in 0..count {
            let annotations = descriptor.element_annotations(index);
            let number = proto_number(annotations).unwrap_or(index as u32 + 1);
            if number == 0 || number > MAX_FIELD_NUMBER {
                return Err(Error::invalid_data(format!(
                    "Invalid field number {number} for '{}' of '{}'",
                    descriptor.element_name(index),
                    descriptor.serial_name()
                )));
            }
            if let Some(previous) = by_number.insert(number, index) {
                return Err(Error::invalid_data(format!(
                    "Field number {number} is used by both '{}' and '{}' of '{}'",
                    descriptor.element_name(previous),
                    descriptor.element_name(index),
                    descriptor.serial_name()
                )));
            }
            fields.push(ProtoField {
                number,
                integer_type: proto_integer_type(annotations),
                packed: is_packed(annotations),
            });
        }
        Ok(MessageSchema { fields, by_number })
    }

    pub(crate) fn field(&self, descriptor: &SerialDescriptor, index: usize) -> Result<ProtoField, Error> {
        self.fields
            .get(index)
            .copied()
            .ok_or_else(|| Error::unknown_element_index(index, descriptor.serial_name()))
    }

    pub(crate) fn index_of(&self, number: u32) -> Option<usize> {
        self.by_number.get(&number).copied()
    }
}

/// Protocol buffers format.
///
/// Defaults differ from [`Config::default`] in one place: default values
/// are omitted, as they are absent on the protobuf wire.
#[derive(Clone)]
pub struct ProtoBuf {
    config: Config,
    module: Arc<SerializersModule>,
    /// Message layouts by serial name, shared between clones.
    schemas: Arc<DashMap<String, Arc<MessageSchema>>>,
}

impl Default for ProtoBuf {
    fn default() -> Self {
        ProtoBuf {
            config: Config::default().omit_defaults(true),
            module: SerializersModule::empty(),
            schemas: Arc::new(DashMap::new()),
        }
    }
}

impl ProtoBuf {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn with_module<M: Into<Arc<SerializersModule>>>(mut self, module: M) -> Self {
        self.module = module.into();
        self
    }

    pub fn omit_defaults(mut self, omit_defaults: bool) -> Self {
        self.config.omit_defaults = omit_defaults;
        self
    }

    pub fn max_message_size(mut self, limit: usize) -> Self {
        self.config.max_message_size = limit;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn serializers_module(&self) -> &SerializersModule {
        &self.module
    }

    pub(crate) fn schema(&self, descriptor: &SerialDescriptor) -> Result<Arc<MessageSchema>, Error> {
        if let Some(schema) = self.schemas.get(descriptor.serial_name()) {
            return Ok(schema.value().clone());
        }
        let schema = Arc::new(MessageSchema::build(descriptor)?);
        self.schemas
            .insert(descriptor.serial_name().to_string(), schema.clone());
        Ok(schema)
    }
}

impl BinaryFormat for ProtoBuf {
    fn config(&self) -> &Config {
        &self.config
    }

    fn serializers_module(&self) -> &SerializersModule {
        &self.module
    }

    fn encode_to_bytes<S>(&self, serializer: &S, value: &S::Value) -> Result<Vec<u8>, Error>
    where
        S: Serializer + ?Sized,
    {
        let mut out = Writer::new();
        let mut encoder = ProtobufEncoder::root(self, &mut out);
        serializer.serialize(&mut encoder, value)?;
        Ok(out.into_inner())
    }

    fn decode_from_bytes<S>(&self, serializer: &S, bytes: &[u8]) -> Result<S::Value, Error>
    where
        S: Serializer + ?Sized,
    {
        let mut decoder = ProtobufDecoder::root(self, bytes);
        serializer.deserialize(&mut decoder)
    }
}
