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


use std::sync::Arc;

use super::{nullable_root, scalar_wire_type, write_tag, MessageSchema, ProtoBuf, ProtoField, WireType};
use crate::buffer::Writer;
use crate::descriptor::{proto_number, ProtoIntegerType, SerialDescriptor, SerialKind, StructureKind};
use crate::encoding::{CompositeEncoder, Encoder, EncoderFn};
use crate::error::Error;
use crate::module::SerializersModule;

/// Writes one value as the field `field` into `out`.
pub(crate) struct ProtobufEncoder<'a> {
    proto: &'a ProtoBuf,
    out: &'a mut Writer,
    field: ProtoField,
    /// Top-level message: written without tag and length.
    root: bool,
    /// Element of a repeated field; another collection cannot nest here.
    repeated: bool,
    /// Element of a packed run; scalars are written without tags.
    untagged: bool,
}

impl<'a> ProtobufEncoder<'a> {
    pub(crate) fn root(proto: &'a ProtoBuf, out: &'a mut Writer) -> Self {
        ProtobufEncoder {
            proto,
            out,
            field: ProtoField::ROOT,
            root: true,
            repeated: false,
            untagged: false,
        }
    }

    fn field(proto: &'a ProtoBuf, out: &'a mut Writer, field: ProtoField) -> Self {
        ProtobufEncoder {
            proto,
            out,
            field,
            root: false,
            repeated: false,
            untagged: false,
        }
    }

    #[inline]
    fn tag(&mut self, wire_type: WireType) {
        if !self.untagged {
            write_tag(self.out, self.field.number, wire_type);
        }
    }

    fn begin_repeated(&mut self, descriptor: &SerialDescriptor) -> Result<Box<dyn CompositeEncoder + '_>, Error> {
        let element = descriptor.element_descriptor(0);
        let wrapped = element.is_nullable();
        let packable = scalar_wire_type(element.kind(), self.field.integer_type).is_some();
        let run = (self.field.packed && packable && !wrapped).then(Writer::new);
        Ok(Box::new(RepeatedEncoder {
            proto: self.proto,
            out: &mut *self.out,
            field: self.field,
            wrapped,
            run,
        }))
    }
}

fn nested_collection(descriptor: &SerialDescriptor) -> Error {
    Error::unsupported(format!(
        "Nested collections are not supported in protobuf; wrap the elements of '{}' in a message",
        descriptor.serial_name()
    ))
}

impl Encoder for ProtobufEncoder<'_> {
    fn serializers_module(&self) -> &SerializersModule {
        self.proto.serializers_module()
    }

    fn encode_bool(&mut self, value: bool) -> Result<(), Error> {
        self.tag(WireType::Varint);
        self.out.write_u8(value as u8);
        Ok(())
    }

    fn encode_i8(&mut self, value: i8) -> Result<(), Error> {
        self.encode_i32(value as i32)
    }

    fn encode_i16(&mut self, value: i16) -> Result<(), Error> {
        self.encode_i32(value as i32)
    }

    fn encode_i32(&mut self, value: i32) -> Result<(), Error> {
        match self.field.integer_type {
            // Negative values are sign-extended to ten bytes, as int32 is on the wire.
            ProtoIntegerType::Default => {
                self.tag(WireType::Varint);
                self.out.write_varuint64(value as i64 as u64);
            }
            ProtoIntegerType::Signed => {
                self.tag(WireType::Varint);
                self.out.write_varint32(value);
            }
            ProtoIntegerType::Fixed => {
                self.tag(WireType::Fixed32);
                self.out.write_u32_le(value as u32);
            }
        }
        Ok(())
    }

    fn encode_i64(&mut self, value: i64) -> Result<(), Error> {
        match self.field.integer_type {
            ProtoIntegerType::Default => {
                self.tag(WireType::Varint);
                self.out.write_varuint64(value as u64);
            }
            ProtoIntegerType::Signed => {
                self.tag(WireType::Varint);
                self.out.write_varint64(value);
            }
            ProtoIntegerType::Fixed => {
                self.tag(WireType::Fixed64);
                self.out.write_u64_le(value as u64);
            }
        }
        Ok(())
    }

    fn encode_u64(&mut self, value: u64) -> Result<(), Error> {
        match self.field.integer_type {
            ProtoIntegerType::Default => {
                self.tag(WireType::Varint);
                self.out.write_varuint64(value);
            }
            ProtoIntegerType::Signed => self.encode_i64(value as i64)?,
            ProtoIntegerType::Fixed => {
                self.tag(WireType::Fixed64);
                self.out.write_u64_le(value);
            }
        }
        Ok(())
    }

    fn encode_f32(&mut self, value: f32) -> Result<(), Error> {
        self.tag(WireType::Fixed32);
        self.out.write_u32_le(value.to_bits());
        Ok(())
    }

    fn encode_f64(&mut self, value: f64) -> Result<(), Error> {
        self.tag(WireType::Fixed64);
        self.out.write_u64_le(value.to_bits());
        Ok(())
    }

    fn encode_char(&mut self, value: char) -> Result<(), Error> {
        self.tag(WireType::Varint);
        self.out.write_varuint32(value as u32);
        Ok(())
    }

    fn encode_str(&mut self, value: &str) -> Result<(), Error> {
        self.tag(WireType::LengthDelimited);
        self.out.write_varuint64(value.len() as u64);
        self.out.write_bytes(value.as_bytes());
        Ok(())
    }

    fn encode_null(&mut self) -> Result<(), Error> {
        if self.root {
            return Err(nullable_root());
        }
        Ok(())
    }

    fn encode_not_null_mark(&mut self) -> Result<(), Error> {
        if self.root {
            return Err(nullable_root());
        }
        Ok(())
    }

    fn encode_enum(&mut self, descriptor: &SerialDescriptor, ordinal: usize) -> Result<(), Error> {
        let number = proto_number(descriptor.element_annotations(ordinal)).unwrap_or(ordinal as u32);
        self.tag(WireType::Varint);
        self.out.write_varuint64(number as u64);
        Ok(())
    }

    fn begin_structure(
        &mut self,
        descriptor: &SerialDescriptor,
    ) -> Result<Box<dyn CompositeEncoder + '_>, Error> {
        match descriptor.kind() {
            SerialKind::Structure(StructureKind::List | StructureKind::Map) if self.repeated => {
                Err(nested_collection(descriptor))
            }
            SerialKind::Structure(StructureKind::List) => self.begin_repeated(descriptor),
            SerialKind::Structure(StructureKind::Map) => Ok(Box::new(MapEncoder {
                proto: self.proto,
                out: &mut *self.out,
                field: self.field,
                entry: Writer::new(),
            })),
            SerialKind::Structure(_) | SerialKind::Polymorphic(_) => Ok(Box::new(MessageEncoder {
                proto: self.proto,
                parent: &mut *self.out,
                field: (!self.root).then_some(self.field),
                schema: self.proto.schema(descriptor)?,
                body: Writer::new(),
            })),
            other => Err(Error::encoding(format!(
                "Cannot write {other} '{}' as a protobuf message",
                descriptor.serial_name()
            ))),
        }
    }
}

struct MessageEncoder<'a> {
    proto: &'a ProtoBuf,
    parent: &'a mut Writer,
    field: Option<ProtoField>,
    schema: Arc<MessageSchema>,
    body: Writer,
}

impl CompositeEncoder for MessageEncoder<'_> {
    fn encode_element(
        &mut self,
        descriptor: &SerialDescriptor,
        index: usize,
        f: &mut EncoderFn<'_>,
    ) -> Result<(), Error> {
        let field = self.schema.field(descriptor, index)?;
        let mut element = ProtobufEncoder::field(self.proto, &mut self.body, field);
        f(&mut element)
    }

    fn encode_null_element(&mut self, _descriptor: &SerialDescriptor, _index: usize) -> Result<(), Error> {
        Ok(())
    }

    fn should_encode_element_default(&self, _descriptor: &SerialDescriptor, _index: usize) -> bool {
        !self.proto.config().is_omit_defaults()
    }

    fn end_structure(&mut self, _descriptor: &SerialDescriptor) -> Result<(), Error> {
        if let Some(field) = self.field {
            write_tag(self.parent, field.number, WireType::LengthDelimited);
            self.parent.write_varuint64(self.body.len() as u64);
        }
        self.parent.write_bytes(self.body.as_slice());
        Ok(())
    }
}

/// Elements of a list, each written as an occurrence of the same field.
struct RepeatedEncoder<'a> {
    proto: &'a ProtoBuf,
    out: &'a mut Writer,
    field: ProtoField,
    /// Nullable elements: each one is a message whose field 1 holds the value.
    wrapped: bool,
    /// Pending packed run.
    run: Option<Writer>,
}

impl RepeatedEncoder<'_> {
    fn write_wrapper(&mut self, body: &Writer) {
        write_tag(self.out, self.field.number, WireType::LengthDelimited);
        self.out.write_varuint64(body.len() as u64);
        self.out.write_bytes(body.as_slice());
    }
}

impl CompositeEncoder for RepeatedEncoder<'_> {
    fn encode_element(
        &mut self,
        _descriptor: &SerialDescriptor,
        _index: usize,
        f: &mut EncoderFn<'_>,
    ) -> Result<(), Error> {
        if let Some(run) = &mut self.run {
            let mut element = ProtobufEncoder::field(self.proto, run, self.field);
            element.untagged = true;
            element.repeated = true;
            return f(&mut element);
        }
        if self.wrapped {
            let mut body = Writer::new();
            let inner = ProtoField {
                number: 1,
                packed: false,
                ..self.field
            };
            f(&mut ProtobufEncoder::field(self.proto, &mut body, inner))?;
            self.write_wrapper(&body);
            return Ok(());
        }
        let mut element = ProtobufEncoder::field(self.proto, &mut *self.out, self.field);
        element.repeated = true;
        f(&mut element)
    }

    fn encode_null_element(&mut self, descriptor: &SerialDescriptor, _index: usize) -> Result<(), Error> {
        if !self.wrapped {
            return Err(Error::encoding(format!(
                "'null' is not allowed in '{}': its elements are not nullable",
                descriptor.serial_name()
            )));
        }
        self.write_wrapper(&Writer::new());
        Ok(())
    }

    fn end_structure(&mut self, _descriptor: &SerialDescriptor) -> Result<(), Error> {
        if let Some(run) = self.run.take() {
            if !run.is_empty() {
                write_tag(self.out, self.field.number, WireType::LengthDelimited);
                self.out.write_varuint64(run.len() as u64);
                self.out.write_bytes(run.as_slice());
            }
        }
        Ok(())
    }
}

/// Map entries as repeated messages with the key in field 1 and the value in
/// field 2.
struct MapEncoder<'a> {
    proto: &'a ProtoBuf,
    out: &'a mut Writer,
    field: ProtoField,
    entry: Writer,
}

impl MapEncoder<'_> {
    fn flush_entry(&mut self) {
        write_tag(self.out, self.field.number, WireType::LengthDelimited);
        self.out.write_varuint64(self.entry.len() as u64);
        self.out.write_bytes(self.entry.as_slice());
        self.entry.reset();
    }
}

impl CompositeEncoder for MapEncoder<'_> {
    fn encode_element(
        &mut self,
        _descriptor: &SerialDescriptor,
        index: usize,
        f: &mut EncoderFn<'_>,
    ) -> Result<(), Error> {
        let is_value = index % 2 == 1;
        let field = ProtoField::plain(if is_value { 2 } else { 1 });
        f(&mut ProtobufEncoder::field(self.proto, &mut self.entry, field))?;
        if is_value {
            self.flush_entry();
        }
        Ok(())
    }

    fn encode_null_element(&mut self, descriptor: &SerialDescriptor, index: usize) -> Result<(), Error> {
        if index % 2 == 0 {
            return Err(Error::encoding(format!(
                "'null' keys are not supported in protobuf map '{}'",
                descriptor.serial_name()
            )));
        }
        self.flush_entry();
        Ok(())
    }

    fn end_structure(&mut self, _descriptor: &SerialDescriptor) -> Result<(), Error> {
        Ok(())
    }
}
