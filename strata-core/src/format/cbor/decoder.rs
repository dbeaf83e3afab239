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


use std::borrow::Cow;

use tracing::trace;

use super::{
    checked_len, half_to_f32, read_argument, skip_item, Cbor, BEGIN_ARRAY, BEGIN_MAP, BREAK, DOUBLE_FLOAT,
    FALSE, HALF_FLOAT, INDEFINITE, MAJOR_ARRAY, MAJOR_MAP, MAJOR_NEGATIVE, MAJOR_TEXT, MAJOR_UNSIGNED, NULL,
    SINGLE_FLOAT, TRUE, UNDEFINED,
};
use crate::buffer::Reader;
use crate::descriptor::{SerialDescriptor, SerialKind, StructureKind};
use crate::encoding::{CompositeDecoder, Decoder, DecoderFn, ElementIndex, ElementMarker};
use crate::error::Error;
use crate::format::AbsentDecoder;
use crate::module::SerializersModule;

pub(crate) struct CborDecoder<'a, 'c> {
    cbor: &'c Cbor,
    reader: &'c mut Reader<'a>,
}

impl<'a, 'c> CborDecoder<'a, 'c> {
    pub(crate) fn new(cbor: &'c Cbor, reader: &'c mut Reader<'a>) -> Self {
        CborDecoder { cbor, reader }
    }

    fn read_text(&mut self) -> Result<String, Error> {
        read_text(self.reader)
    }

    fn narrow<T: TryFrom<i64>>(&mut self, type_name: &str) -> Result<T, Error> {
        let value = self.decode_i64()?;
        T::try_from(value).map_err(|_| Error::invalid_data(format!("Value {value} does not fit in {type_name}")))
    }

    fn read_f32(&mut self) -> Result<f32, Error> {
        let initial = self.reader.read_u8()?;
        match initial {
            HALF_FLOAT => Ok(half_to_f32(self.reader.read_u16()?)),
            SINGLE_FLOAT => self.reader.read_f32(),
            DOUBLE_FLOAT => Ok(self.reader.read_f64()? as f32),
            _ => Err(Error::cbor_decoding("a floating point number", initial)),
        }
    }

    fn read_f64(&mut self) -> Result<f64, Error> {
        let initial = self.reader.read_u8()?;
        match initial {
            HALF_FLOAT => Ok(half_to_f32(self.reader.read_u16()?) as f64),
            SINGLE_FLOAT => Ok(self.reader.read_f32()? as f64),
            DOUBLE_FLOAT => self.reader.read_f64(),
            _ => Err(Error::cbor_decoding("a floating point number", initial)),
        }
    }
}

/// Reads a text string, definite or chunked.
fn read_text(reader: &mut Reader<'_>) -> Result<String, Error> {
    let initial = reader.read_u8()?;
    if initial & 0xe0 != MAJOR_TEXT {
        return Err(Error::cbor_decoding("a text string", initial));
    }
    let bytes: Cow<'_, [u8]> = if initial & 0x1f == INDEFINITE {
        let mut chunks = Vec::new();
        while reader.peek_u8()? != BREAK {
            let chunk = reader.read_u8()?;
            if chunk & 0xe0 != MAJOR_TEXT || chunk & 0x1f == INDEFINITE {
                return Err(Error::cbor_decoding("a definite text chunk", chunk));
            }
            let len = read_argument(reader, chunk)?;
            let len = checked_len(reader, len, chunk)?;
            chunks.extend_from_slice(reader.read_bytes(len)?);
        }
        reader.read_u8()?;
        Cow::Owned(chunks)
    } else {
        let len = read_argument(reader, initial)?;
        let len = checked_len(reader, len, initial)?;
        Cow::Borrowed(reader.read_bytes(len)?)
    };
    match String::from_utf8(bytes.into_owned()) {
        Ok(text) => Ok(text),
        Err(e) => Err(Error::invalid_data(format!(
            "Invalid UTF-8 text before offset {}: {e}",
            reader.position()
        ))),
    }
}

impl Decoder for CborDecoder<'_, '_> {
    fn serializers_module(&self) -> &SerializersModule {
        self.cbor.serializers_module()
    }

    fn decode_not_null_mark(&mut self) -> Result<bool, Error> {
        let initial = self.reader.peek_u8()?;
        Ok(initial != NULL && initial != UNDEFINED)
    }

    fn decode_null(&mut self) -> Result<(), Error> {
        match self.reader.read_u8()? {
            NULL | UNDEFINED => Ok(()),
            other => Err(Error::cbor_decoding("null", other)),
        }
    }

    fn decode_bool(&mut self) -> Result<bool, Error> {
        match self.reader.read_u8()? {
            TRUE => Ok(true),
            FALSE => Ok(false),
            other => Err(Error::cbor_decoding("a boolean", other)),
        }
    }

    fn decode_i8(&mut self) -> Result<i8, Error> {
        self.narrow("i8")
    }

    fn decode_i16(&mut self) -> Result<i16, Error> {
        self.narrow("i16")
    }

    fn decode_i32(&mut self) -> Result<i32, Error> {
        self.narrow("i32")
    }

    fn decode_i64(&mut self) -> Result<i64, Error> {
        let initial = self.reader.read_u8()?;
        let major = initial & 0xe0;
        if major != MAJOR_UNSIGNED && major != MAJOR_NEGATIVE {
            return Err(Error::cbor_decoding("an integer", initial));
        }
        let argument = read_argument(self.reader, initial)?;
        let magnitude = i64::try_from(argument)
            .map_err(|_| Error::invalid_data(format!("CBOR integer {argument} does not fit in i64")))?;
        Ok(if major == MAJOR_NEGATIVE { -1 - magnitude } else { magnitude })
    }

    fn decode_u64(&mut self) -> Result<u64, Error> {
        let initial = self.reader.read_u8()?;
        if initial & 0xe0 != MAJOR_UNSIGNED {
            return Err(Error::cbor_decoding("an unsigned integer", initial));
        }
        read_argument(self.reader, initial)
    }

    fn decode_f32(&mut self) -> Result<f32, Error> {
        self.read_f32()
    }

    fn decode_f64(&mut self) -> Result<f64, Error> {
        self.read_f64()
    }

    fn decode_char(&mut self) -> Result<char, Error> {
        let code = self.decode_u64()?;
        u32::try_from(code)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| Error::invalid_data(format!("{code:#x} is not a valid char")))
    }

    fn decode_string(&mut self) -> Result<String, Error> {
        self.read_text()
    }

    fn decode_enum(&mut self, descriptor: &SerialDescriptor) -> Result<usize, Error> {
        let name = self.read_text()?;
        descriptor.get_element_index(&name).ok_or_else(|| {
            Error::invalid_data(format!(
                "{} does not contain element with name '{name}'",
                descriptor.serial_name()
            ))
        })
    }

    fn begin_structure(
        &mut self,
        descriptor: &SerialDescriptor,
    ) -> Result<Box<dyn CompositeDecoder + '_>, Error> {
        let (mode, begin, major, expected) = match descriptor.kind() {
            SerialKind::Structure(StructureKind::List) | SerialKind::Polymorphic(_) => {
                (Mode::Array, BEGIN_ARRAY, MAJOR_ARRAY, "start of array")
            }
            SerialKind::Structure(StructureKind::Map) => (Mode::Map, BEGIN_MAP, MAJOR_MAP, "start of map"),
            SerialKind::Structure(_) => (Mode::Class, BEGIN_MAP, MAJOR_MAP, "start of map"),
            other => {
                return Err(Error::invalid_data(format!(
                    "Cannot read {other} '{}' as a CBOR structure",
                    descriptor.serial_name()
                )))
            }
        };
        let initial = self.reader.read_u8()?;
        let remaining = if initial == begin {
            None
        } else if initial & 0xe0 == major {
            let count = read_argument(self.reader, initial)?;
            // every item takes at least one byte
            let items = if major == MAJOR_MAP { count.saturating_mul(2) } else { count };
            checked_len(self.reader, items, initial)?;
            Some(usize::try_from(count).map_err(|_| Error::cbor_decoding("a smaller count", initial))?)
        } else {
            return Err(Error::cbor_decoding(expected, initial));
        };
        let marker = (mode == Mode::Class).then(|| ElementMarker::new(descriptor));
        Ok(Box::new(CborCompositeDecoder {
            cbor: self.cbor,
            reader: &mut *self.reader,
            mode,
            remaining,
            next: 0,
            marker,
            absent: None,
        }))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Array,
    Map,
    Class,
}

struct CborCompositeDecoder<'a, 'c> {
    cbor: &'c Cbor,
    reader: &'c mut Reader<'a>,
    mode: Mode,
    /// Items (array) or entries (maps) left for definite lengths; `None`
    /// until the break byte for indefinite ones.
    remaining: Option<usize>,
    next: usize,
    marker: Option<ElementMarker>,
    absent: Option<usize>,
}

impl CborCompositeDecoder<'_, '_> {
    fn has_next(&mut self) -> Result<bool, Error> {
        match self.remaining {
            Some(0) => Ok(false),
            Some(n) => {
                self.remaining = Some(n - 1);
                Ok(true)
            }
            None => Ok(self.reader.peek_u8()? != BREAK),
        }
    }

    fn class_index(&mut self, descriptor: &SerialDescriptor) -> Result<ElementIndex, Error> {
        while self.has_next()? {
            let offset = self.reader.position();
            let key = read_text(self.reader)?;
            if let Some(index) = descriptor.get_element_index(&key) {
                if let Some(marker) = &mut self.marker {
                    marker.mark(index);
                }
                return Ok(ElementIndex::Element(index));
            }
            if !self.cbor.config().is_ignore_unknown_keys() {
                return Err(Error::unknown_field(
                    key,
                    descriptor.serial_name(),
                    format!(" at CBOR offset {offset}"),
                ));
            }
            trace!(key = %key, serial_name = descriptor.serial_name(), "skipping unknown CBOR key");
            skip_item(self.reader)?;
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
}

impl CompositeDecoder for CborCompositeDecoder<'_, '_> {
    fn decode_element_index(&mut self, descriptor: &SerialDescriptor) -> Result<ElementIndex, Error> {
        if self.mode == Mode::Class {
            return self.class_index(descriptor);
        }
        // A map value always follows its key.
        let value_of_entry = self.mode == Mode::Map && self.next % 2 == 1;
        if value_of_entry || self.has_next()? {
            self.next += 1;
            return Ok(ElementIndex::Element(self.next - 1));
        }
        Ok(ElementIndex::Done)
    }

    fn decode_collection_size(&mut self, _descriptor: &SerialDescriptor) -> Result<Option<usize>, Error> {
        Ok(self.remaining)
    }

    fn decode_element(
        &mut self,
        descriptor: &SerialDescriptor,
        index: usize,
        f: &mut DecoderFn<'_>,
    ) -> Result<(), Error> {
        if self.absent == Some(index) {
            self.absent = None;
            let mut absent = AbsentDecoder::new(self.cbor.serializers_module(), descriptor, index);
            return f(&mut absent);
        }
        f(&mut CborDecoder::new(self.cbor, &mut *self.reader))
    }

    fn end_structure(&mut self, descriptor: &SerialDescriptor) -> Result<(), Error> {
        match self.remaining {
            None => match self.reader.read_u8()? {
                BREAK => Ok(()),
                other => Err(Error::cbor_decoding("end of structure (0xff)", other)),
            },
            Some(0) => Ok(()),
            Some(n) => Err(Error::invalid_data(format!(
                "{n} undecoded items left in '{}'",
                descriptor.serial_name()
            ))),
        }
    }
}
