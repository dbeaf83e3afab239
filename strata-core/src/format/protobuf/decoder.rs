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


//! Decoding works on pre-scanned messages: the body of a message is split
//! into field occurrences before any element is handed out, so fields may
//! arrive in any order and repeated fields need not be contiguous.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::trace;

use super::{nullable_root, scalar_wire_type, MessageSchema, ProtoBuf, ProtoField, WireType};
use crate::buffer::Reader;
use crate::descriptor::{proto_number, ProtoIntegerType, SerialDescriptor, SerialKind, StructureKind};
use crate::encoding::{CompositeDecoder, Decoder, DecoderFn, ElementIndex, ElementMarker};
use crate::error::Error;
use crate::format::AbsentDecoder;
use crate::module::SerializersModule;

/// One occurrence of a field on the wire.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Occurrence<'a> {
    wire_type: WireType,
    /// The payload; for length-delimited values, the bytes after the length.
    data: &'a [u8],
    /// Absolute offset of `data` in the input.
    offset: usize,
}

impl<'a> Occurrence<'a> {
    fn reader(&self) -> Reader<'a> {
        Reader::nested(self.data, self.offset)
    }
}

/// Consumes one varint and returns its raw bytes.
fn take_varint<'a>(reader: &mut Reader<'a>) -> Result<&'a [u8], Error> {
    let rest = reader.slice_after_cursor();
    let before = reader.remaining();
    reader.read_varuint64()?;
    Ok(&rest[..before - reader.remaining()])
}

/// Splits a message body into `(field number, occurrence)` pairs in wire order.
pub(crate) fn scan_message(data: &[u8], offset: usize) -> Result<Vec<(u32, Occurrence<'_>)>, Error> {
    let mut reader = Reader::nested(data, offset);
    let mut fields = Vec::new();
    while !reader.is_empty() {
        let tag_offset = reader.position();
        let tag = reader.read_varuint32()?;
        let number = tag >> 3;
        let wire_type = WireType::try_from((tag & 7) as u8).map_err(|_| {
            Error::protobuf_decoding(
                tag_offset,
                format!("Unsupported wire type {} for field {number}", tag & 7),
            )
        })?;
        if number == 0 {
            return Err(Error::protobuf_decoding(tag_offset, "Invalid field number 0"));
        }
        let (payload, start) = match wire_type {
            WireType::Varint => {
                let start = reader.position();
                (take_varint(&mut reader)?, start)
            }
            WireType::Fixed32 => (reader.read_bytes(4)?, reader.position() - 4),
            WireType::Fixed64 => (reader.read_bytes(8)?, reader.position() - 8),
            WireType::LengthDelimited => {
                let length_offset = reader.position();
                let len = reader.read_varuint64()?;
                if len > reader.remaining() as u64 {
                    return Err(Error::protobuf_decoding(
                        length_offset,
                        format!(
                            "Length {len} of field {number} exceeds the {} remaining bytes",
                            reader.remaining()
                        ),
                    ));
                }
                let start = reader.position();
                (reader.read_bytes(len as usize)?, start)
            }
        };
        fields.push((
            number,
            Occurrence {
                wire_type,
                data: payload,
                offset: start,
            },
        ));
    }
    Ok(fields)
}

fn occurrences_of(data: &[u8], offset: usize, number: u32) -> Result<Vec<Occurrence<'_>>, Error> {
    Ok(scan_message(data, offset)?
        .into_iter()
        .filter(|(n, _)| *n == number)
        .map(|(_, occurrence)| occurrence)
        .collect())
}

/// Splits a packed run into one occurrence per scalar.
fn split_packed<'a>(
    run: Occurrence<'a>,
    item_type: WireType,
    items: &mut Vec<Vec<Occurrence<'a>>>,
) -> Result<(), Error> {
    let mut reader = run.reader();
    while !reader.is_empty() {
        let offset = reader.position();
        let data = match item_type {
            WireType::Varint => take_varint(&mut reader)?,
            WireType::Fixed32 => reader.read_bytes(4)?,
            WireType::Fixed64 => reader.read_bytes(8)?,
            WireType::LengthDelimited => {
                return Err(Error::protobuf_decoding(offset, "Length-delimited values cannot be packed"))
            }
        };
        items.push(vec![Occurrence {
            wire_type: item_type,
            data,
            offset,
        }]);
    }
    Ok(())
}

enum Input<'a> {
    /// The whole top-level input.
    Root(&'a [u8]),
    /// Every occurrence of one field; the last one wins for singular values.
    Field {
        field: ProtoField,
        occurrences: Vec<Occurrence<'a>>,
        /// Offset of the enclosing message, reported when the field is absent.
        origin: usize,
    },
}

pub(crate) struct ProtobufDecoder<'a, 'p> {
    proto: &'p ProtoBuf,
    input: Input<'a>,
    /// Element of a repeated field; another collection cannot nest here.
    repeated: bool,
}

impl<'a, 'p> ProtobufDecoder<'a, 'p> {
    pub(crate) fn root(proto: &'p ProtoBuf, bytes: &'a [u8]) -> Self {
        ProtobufDecoder {
            proto,
            input: Input::Root(bytes),
            repeated: false,
        }
    }

    fn field(proto: &'p ProtoBuf, field: ProtoField, occurrences: Vec<Occurrence<'a>>, origin: usize) -> Self {
        ProtobufDecoder {
            proto,
            input: Input::Field {
                field,
                occurrences,
                origin,
            },
            repeated: false,
        }
    }

    /// The field view of the input. A top-level value that is not a message
    /// is field 1 of the input.
    fn field_input(&mut self) -> Result<(ProtoField, &[Occurrence<'a>], usize), Error> {
        if let Input::Root(data) = self.input {
            let occurrences = occurrences_of(data, 0, ProtoField::ROOT.number)?;
            self.input = Input::Field {
                field: ProtoField::ROOT,
                occurrences,
                origin: 0,
            };
        }
        match &self.input {
            Input::Field {
                field,
                occurrences,
                origin,
            } => Ok((*field, occurrences.as_slice(), *origin)),
            Input::Root(_) => Ok((ProtoField::ROOT, &[], 0)),
        }
    }

    fn integer_type(&mut self) -> Result<ProtoIntegerType, Error> {
        Ok(self.field_input()?.0.integer_type)
    }

    fn last(&mut self, expected: WireType) -> Result<Occurrence<'a>, Error> {
        let (field, occurrences, origin) = self.field_input()?;
        let Some(occurrence) = occurrences.last().copied() else {
            return Err(Error::protobuf_decoding(
                origin,
                format!("Field {} is absent", field.number),
            ));
        };
        if occurrence.wire_type != expected {
            return Err(Error::protobuf_decoding(
                occurrence.offset,
                format!(
                    "Expected wire type {expected:?} for field {}, but had {:?}",
                    field.number, occurrence.wire_type
                ),
            ));
        }
        Ok(occurrence)
    }

    fn integer(&mut self, wide: bool) -> Result<i64, Error> {
        Ok(match self.integer_type()? {
            ProtoIntegerType::Default => self.last(WireType::Varint)?.reader().read_varuint64()? as i64,
            ProtoIntegerType::Signed => self.last(WireType::Varint)?.reader().read_varint64()?,
            ProtoIntegerType::Fixed if wide => self.last(WireType::Fixed64)?.reader().read_u64_le()? as i64,
            ProtoIntegerType::Fixed => self.last(WireType::Fixed32)?.reader().read_u32_le()? as i32 as i64,
        })
    }

    fn narrow<T: TryFrom<i32>>(&mut self, type_name: &str) -> Result<T, Error> {
        let value = self.decode_i32()?;
        T::try_from(value).map_err(|_| Error::invalid_data(format!("Value {value} does not fit in {type_name}")))
    }

    fn begin_repeated(&mut self, descriptor: &SerialDescriptor) -> Result<Box<dyn CompositeDecoder + '_>, Error> {
        let element = descriptor.element_descriptor(0);
        let wrapped = element.is_nullable();
        let (field, occurrences, origin) = self.field_input()?;
        let packable = scalar_wire_type(element.kind(), field.integer_type);
        let mut items = Vec::with_capacity(occurrences.len());
        for occurrence in occurrences {
            match packable {
                Some(item_type) if !wrapped && occurrence.wire_type == WireType::LengthDelimited => {
                    split_packed(*occurrence, item_type, &mut items)?
                }
                _ if wrapped => {
                    if occurrence.wire_type != WireType::LengthDelimited {
                        return Err(Error::protobuf_decoding(
                            occurrence.offset,
                            format!("Expected a wrapper message for an element of field {}", field.number),
                        ));
                    }
                    items.push(occurrences_of(occurrence.data, occurrence.offset, 1)?);
                }
                _ => items.push(vec![*occurrence]),
            }
        }
        Ok(Box::new(RepeatedDecoder {
            proto: self.proto,
            field,
            wrapped,
            items,
            origin,
            next: 0,
        }))
    }

    fn begin_map(&mut self) -> Result<Box<dyn CompositeDecoder + '_>, Error> {
        let (field, occurrences, origin) = self.field_input()?;
        let mut entries = Vec::with_capacity(occurrences.len());
        for occurrence in occurrences {
            if occurrence.wire_type != WireType::LengthDelimited {
                return Err(Error::protobuf_decoding(
                    occurrence.offset,
                    format!("Expected a map entry message for field {}", field.number),
                ));
            }
            let mut key = Vec::new();
            let mut value = Vec::new();
            for (number, inner) in scan_message(occurrence.data, occurrence.offset)? {
                match number {
                    1 => key.push(inner),
                    2 => value.push(inner),
                    other => trace!(number = other, "skipping unknown field of a map entry"),
                }
            }
            entries.push((occurrence.offset, key, value));
        }
        Ok(Box::new(MapDecoder {
            proto: self.proto,
            entries,
            origin,
            next: 0,
        }))
    }
}

impl Decoder for ProtobufDecoder<'_, '_> {
    fn serializers_module(&self) -> &SerializersModule {
        self.proto.serializers_module()
    }

    fn decode_not_null_mark(&mut self) -> Result<bool, Error> {
        match &self.input {
            Input::Root(_) => Err(nullable_root()),
            Input::Field { occurrences, .. } => Ok(!occurrences.is_empty()),
        }
    }

    fn decode_null(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn decode_bool(&mut self) -> Result<bool, Error> {
        Ok(self.last(WireType::Varint)?.reader().read_varuint64()? != 0)
    }

    fn decode_i8(&mut self) -> Result<i8, Error> {
        self.narrow("i8")
    }

    fn decode_i16(&mut self) -> Result<i16, Error> {
        self.narrow("i16")
    }

    fn decode_i32(&mut self) -> Result<i32, Error> {
        Ok(self.integer(false)? as i32)
    }

    fn decode_i64(&mut self) -> Result<i64, Error> {
        self.integer(true)
    }

    fn decode_u64(&mut self) -> Result<u64, Error> {
        match self.integer_type()? {
            ProtoIntegerType::Default => self.last(WireType::Varint)?.reader().read_varuint64(),
            ProtoIntegerType::Signed => Ok(self.integer(true)? as u64),
            ProtoIntegerType::Fixed => self.last(WireType::Fixed64)?.reader().read_u64_le(),
        }
    }

    fn decode_f32(&mut self) -> Result<f32, Error> {
        Ok(f32::from_bits(self.last(WireType::Fixed32)?.reader().read_u32_le()?))
    }

    fn decode_f64(&mut self) -> Result<f64, Error> {
        Ok(f64::from_bits(self.last(WireType::Fixed64)?.reader().read_u64_le()?))
    }

    fn decode_char(&mut self) -> Result<char, Error> {
        let occurrence = self.last(WireType::Varint)?;
        let code = occurrence.reader().read_varuint32()?;
        char::from_u32(code).ok_or_else(|| {
            Error::protobuf_decoding(occurrence.offset, format!("{code:#x} is not a valid char"))
        })
    }

    fn decode_string(&mut self) -> Result<String, Error> {
        let occurrence = self.last(WireType::LengthDelimited)?;
        std::str::from_utf8(occurrence.data)
            .map(str::to_owned)
            .map_err(|e| Error::protobuf_decoding(occurrence.offset, format!("Invalid UTF-8 string: {e}")))
    }

    fn decode_enum(&mut self, descriptor: &SerialDescriptor) -> Result<usize, Error> {
        let occurrence = self.last(WireType::Varint)?;
        let number = occurrence.reader().read_varuint64()?;
        (0..descriptor.elements_count())
            .find(|&i| proto_number(descriptor.element_annotations(i)).unwrap_or(i as u32) as u64 == number)
            .ok_or_else(|| {
                Error::protobuf_decoding(
                    occurrence.offset,
                    format!("{number} is not among valid '{}' enum proto numbers", descriptor.serial_name()),
                )
            })
    }

    fn begin_structure(
        &mut self,
        descriptor: &SerialDescriptor,
    ) -> Result<Box<dyn CompositeDecoder + '_>, Error> {
        match descriptor.kind() {
            SerialKind::Structure(StructureKind::List | StructureKind::Map) if self.repeated => {
                Err(Error::unsupported(format!(
                    "Nested collections are not supported in protobuf; wrap the elements of '{}' in a message",
                    descriptor.serial_name()
                )))
            }
            SerialKind::Structure(StructureKind::List) => self.begin_repeated(descriptor),
            SerialKind::Structure(StructureKind::Map) => self.begin_map(),
            SerialKind::Structure(_) | SerialKind::Polymorphic(_) => {
                let (data, offset) = if let Input::Root(data) = self.input {
                    (data, 0)
                } else {
                    let occurrence = self.last(WireType::LengthDelimited)?;
                    (occurrence.data, occurrence.offset)
                };
                let schema = self.proto.schema(descriptor)?;
                Ok(Box::new(MessageDecoder::new(self.proto, descriptor, schema, data, offset)?))
            }
            other => Err(Error::protobuf_decoding(
                0,
                format!("Cannot read {other} '{}' as a protobuf message", descriptor.serial_name()),
            )),
        }
    }
}

struct MessageDecoder<'a, 'p> {
    proto: &'p ProtoBuf,
    schema: Arc<MessageSchema>,
    /// Element index and every occurrence of its field, in order of first
    /// appearance.
    fields: Vec<(usize, Vec<Occurrence<'a>>)>,
    offset: usize,
    next: usize,
    marker: ElementMarker,
    /// Element reported by the marker; the wire does not carry it.
    absent: Option<usize>,
}

impl<'a, 'p> MessageDecoder<'a, 'p> {
    fn new(
        proto: &'p ProtoBuf,
        descriptor: &SerialDescriptor,
        schema: Arc<MessageSchema>,
        data: &'a [u8],
        offset: usize,
    ) -> Result<Self, Error> {
        let mut fields: Vec<(usize, Vec<Occurrence<'a>>)> = Vec::new();
        let mut slots: HashMap<usize, usize> = HashMap::new();
        for (number, occurrence) in scan_message(data, offset)? {
            let Some(index) = schema.index_of(number) else {
                trace!(
                    number,
                    wire_type = ?occurrence.wire_type,
                    serial_name = descriptor.serial_name(),
                    "skipping unknown protobuf field"
                );
                continue;
            };
            match slots.get(&index) {
                Some(&slot) => fields[slot].1.push(occurrence),
                None => {
                    slots.insert(index, fields.len());
                    fields.push((index, vec![occurrence]));
                }
            }
        }
        Ok(MessageDecoder {
            proto,
            schema,
            fields,
            offset,
            next: 0,
            marker: ElementMarker::new(descriptor),
            absent: None,
        })
    }
}

impl CompositeDecoder for MessageDecoder<'_, '_> {
    fn decode_element_index(&mut self, descriptor: &SerialDescriptor) -> Result<ElementIndex, Error> {
        if let Some((index, _)) = self.fields.get(self.next) {
            let index = *index;
            self.next += 1;
            self.marker.mark(index);
            return Ok(ElementIndex::Element(index));
        }
        let absent = self.marker.next_unmarked_index(descriptor, |d, i| {
            let element = d.element_descriptor(i);
            !d.is_element_optional(i) && (element.is_nullable() || element.kind().is_collection())
        });
        match absent {
            Some(index) => {
                self.absent = Some(index);
                Ok(ElementIndex::Element(index))
            }
            None => Ok(ElementIndex::Done),
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
            let mut absent = AbsentDecoder::new(self.proto.serializers_module(), descriptor, index);
            return f(&mut absent);
        }
        let occurrences = self
            .fields
            .iter_mut()
            .find(|(i, _)| *i == index)
            .map(|(_, occurrences)| std::mem::take(occurrences))
            .unwrap_or_default();
        let field = self.schema.field(descriptor, index)?;
        f(&mut ProtobufDecoder::field(self.proto, field, occurrences, self.offset))
    }

    fn end_structure(&mut self, _descriptor: &SerialDescriptor) -> Result<(), Error> {
        Ok(())
    }
}

struct RepeatedDecoder<'a, 'p> {
    proto: &'p ProtoBuf,
    field: ProtoField,
    wrapped: bool,
    /// One entry per element; an empty entry is a null wrapped element.
    items: Vec<Vec<Occurrence<'a>>>,
    origin: usize,
    next: usize,
}

impl CompositeDecoder for RepeatedDecoder<'_, '_> {
    fn decode_element_index(&mut self, _descriptor: &SerialDescriptor) -> Result<ElementIndex, Error> {
        if self.next >= self.items.len() {
            return Ok(ElementIndex::Done);
        }
        self.next += 1;
        Ok(ElementIndex::Element(self.next - 1))
    }

    fn decode_sequentially(&self) -> bool {
        true
    }

    fn decode_collection_size(&mut self, _descriptor: &SerialDescriptor) -> Result<Option<usize>, Error> {
        Ok(Some(self.items.len()))
    }

    fn decode_element(
        &mut self,
        descriptor: &SerialDescriptor,
        index: usize,
        f: &mut DecoderFn<'_>,
    ) -> Result<(), Error> {
        let Some(item) = self.items.get_mut(index) else {
            return Err(Error::unknown_element_index(index, descriptor.serial_name()));
        };
        let occurrences = std::mem::take(item);
        let field = if self.wrapped {
            ProtoField {
                number: 1,
                packed: false,
                ..self.field
            }
        } else {
            self.field
        };
        let mut element = ProtobufDecoder::field(self.proto, field, occurrences, self.origin);
        element.repeated = !self.wrapped;
        f(&mut element)
    }

    fn end_structure(&mut self, _descriptor: &SerialDescriptor) -> Result<(), Error> {
        Ok(())
    }
}

/// Entry `i` is element `2i` (field 1 of the entry) and `2i + 1` (field 2).
struct MapDecoder<'a, 'p> {
    proto: &'p ProtoBuf,
    entries: Vec<(usize, Vec<Occurrence<'a>>, Vec<Occurrence<'a>>)>,
    origin: usize,
    next: usize,
}

impl CompositeDecoder for MapDecoder<'_, '_> {
    fn decode_element_index(&mut self, _descriptor: &SerialDescriptor) -> Result<ElementIndex, Error> {
        if self.next >= self.entries.len() * 2 {
            return Ok(ElementIndex::Done);
        }
        self.next += 1;
        Ok(ElementIndex::Element(self.next - 1))
    }

    fn decode_sequentially(&self) -> bool {
        true
    }

    fn decode_collection_size(&mut self, _descriptor: &SerialDescriptor) -> Result<Option<usize>, Error> {
        Ok(Some(self.entries.len()))
    }

    fn decode_element(
        &mut self,
        descriptor: &SerialDescriptor,
        index: usize,
        f: &mut DecoderFn<'_>,
    ) -> Result<(), Error> {
        let Some((offset, key, value)) = self.entries.get_mut(index / 2) else {
            return Err(Error::unknown_element_index(index, descriptor.serial_name()));
        };
        let (number, occurrences) = if index % 2 == 0 {
            (1, std::mem::take(key))
        } else {
            (2, std::mem::take(value))
        };
        let origin = if occurrences.is_empty() { *offset } else { self.origin };
        f(&mut ProtobufDecoder::field(self.proto, ProtoField::plain(number), occurrences, origin))
    }

    fn end_structure(&mut self, _descriptor: &SerialDescriptor) -> Result<(), Error> {
        Ok(())
    }
}
