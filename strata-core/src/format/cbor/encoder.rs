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


use super::{
    write_header, Cbor, BEGIN_ARRAY, BEGIN_MAP, BREAK, DOUBLE_FLOAT, FALSE, MAJOR_NEGATIVE, MAJOR_TEXT,
    MAJOR_UNSIGNED, NULL, SINGLE_FLOAT, TRUE,
};
use crate::buffer::Writer;
use crate::descriptor::{SerialDescriptor, SerialKind, StructureKind};
use crate::encoding::{CompositeEncoder, Encoder, EncoderFn};
use crate::error::Error;
use crate::module::SerializersModule;

pub(crate) struct CborEncoder<'a> {
    cbor: &'a Cbor,
    out: &'a mut Writer,
}

impl<'a> CborEncoder<'a> {
    pub(crate) fn new(cbor: &'a Cbor, out: &'a mut Writer) -> Self {
        CborEncoder { cbor, out }
    }
}

fn write_text(out: &mut Writer, value: &str) {
    write_header(out, MAJOR_TEXT, value.len() as u64);
    out.write_bytes(value.as_bytes());
}

impl Encoder for CborEncoder<'_> {
    fn serializers_module(&self) -> &SerializersModule {
        self.cbor.serializers_module()
    }

    fn encode_bool(&mut self, value: bool) -> Result<(), Error> {
        self.out.write_u8(if value { TRUE } else { FALSE });
        Ok(())
    }

    fn encode_i8(&mut self, value: i8) -> Result<(), Error> {
        self.encode_i64(value as i64)
    }

    fn encode_i16(&mut self, value: i16) -> Result<(), Error> {
        self.encode_i64(value as i64)
    }

    fn encode_i32(&mut self, value: i32) -> Result<(), Error> {
        self.encode_i64(value as i64)
    }

    fn encode_i64(&mut self, value: i64) -> Result<(), Error> {
        if value >= 0 {
            write_header(self.out, MAJOR_UNSIGNED, value as u64);
        } else {
            // -1 - n, which is the bitwise complement
            write_header(self.out, MAJOR_NEGATIVE, !value as u64);
        }
        Ok(())
    }

    fn encode_u64(&mut self, value: u64) -> Result<(), Error> {
        write_header(self.out, MAJOR_UNSIGNED, value);
        Ok(())
    }

    fn encode_f32(&mut self, value: f32) -> Result<(), Error> {
        self.out.write_u8(SINGLE_FLOAT);
        self.out.write_f32(value);
        Ok(())
    }

    fn encode_f64(&mut self, value: f64) -> Result<(), Error> {
        self.out.write_u8(DOUBLE_FLOAT);
        self.out.write_f64(value);
        Ok(())
    }

    fn encode_char(&mut self, value: char) -> Result<(), Error> {
        write_header(self.out, MAJOR_UNSIGNED, value as u64);
        Ok(())
    }

    fn encode_str(&mut self, value: &str) -> Result<(), Error> {
        write_text(self.out, value);
        Ok(())
    }

    fn encode_null(&mut self) -> Result<(), Error> {
        self.out.write_u8(NULL);
        Ok(())
    }

    fn encode_enum(&mut self, descriptor: &SerialDescriptor, ordinal: usize) -> Result<(), Error> {
        write_text(self.out, &descriptor.element_name(ordinal));
        Ok(())
    }

    fn begin_structure(
        &mut self,
        descriptor: &SerialDescriptor,
    ) -> Result<Box<dyn CompositeEncoder + '_>, Error> {
        let keyed = match descriptor.kind() {
            SerialKind::Structure(StructureKind::List) | SerialKind::Polymorphic(_) => {
                self.out.write_u8(BEGIN_ARRAY);
                false
            }
            SerialKind::Structure(StructureKind::Map) => {
                self.out.write_u8(BEGIN_MAP);
                false
            }
            SerialKind::Structure(_) => {
                self.out.write_u8(BEGIN_MAP);
                true
            }
            other => {
                return Err(Error::encoding(format!(
                    "Cannot write {other} '{}' as a CBOR structure",
                    descriptor.serial_name()
                )))
            }
        };
        Ok(Box::new(CborCompositeEncoder {
            cbor: self.cbor,
            out: &mut *self.out,
            keyed,
        }))
    }
}

struct CborCompositeEncoder<'a> {
    cbor: &'a Cbor,
    out: &'a mut Writer,
    /// Class map: each element is preceded by its name.
    keyed: bool,
}

impl CompositeEncoder for CborCompositeEncoder<'_> {
    fn encode_element(
        &mut self,
        descriptor: &SerialDescriptor,
        index: usize,
        f: &mut EncoderFn<'_>,
    ) -> Result<(), Error> {
        if self.keyed {
            write_text(self.out, &descriptor.element_name(index));
        }
        f(&mut CborEncoder::new(self.cbor, &mut *self.out))
    }

    fn encode_null_element(&mut self, descriptor: &SerialDescriptor, index: usize) -> Result<(), Error> {
        if self.keyed {
            if !self.cbor.config().is_explicit_nulls() {
                return Ok(());
            }
            write_text(self.out, &descriptor.element_name(index));
        }
        self.out.write_u8(NULL);
        Ok(())
    }

    fn should_encode_element_default(&self, _descriptor: &SerialDescriptor, _index: usize) -> bool {
        !self.cbor.config().is_omit_defaults()
    }

    fn end_structure(&mut self, _descriptor: &SerialDescriptor) -> Result<(), Error> {
        self.out.write_u8(BREAK);
        Ok(())
    }
}
