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


use super::composer::Composer;
use super::literal::{f32_text, float_text, special_float_message};
use super::{switch_mode, Json, WriteMode};
use crate::descriptor::{SerialDescriptor, SerialKind, StructureKind};
use crate::encoding::{CompositeEncoder, Encoder, EncoderFn};
use crate::error::Error;
use crate::module::SerializersModule;

/// Value-level JSON writer. One is created per element and they all share
/// the same [`Composer`].
pub(crate) struct JsonEncoder<'a> {
    json: &'a Json,
    composer: &'a mut Composer,
    /// Map keys: primitives are written as strings.
    force_quoting: bool,
    /// Discriminator key and serial name to open the next structure with.
    discriminator: Option<(String, String)>,
}

impl<'a> JsonEncoder<'a> {
    pub(crate) fn new(json: &'a Json, composer: &'a mut Composer) -> Self {
        JsonEncoder {
            json,
            composer,
            force_quoting: false,
            discriminator: None,
        }
    }

    fn print_primitive(&mut self, text: &str) {
        if self.force_quoting {
            self.composer.print_quoted(text);
        } else {
            self.composer.print(text);
        }
    }

    fn check_float(&self, value: f64) -> Result<(), Error> {
        if !value.is_finite() && !self.json.config.is_allow_special_floats() {
            return Err(Error::encoding(special_float_message(value)));
        }
        Ok(())
    }
}

impl Encoder for JsonEncoder<'_> {
    fn serializers_module(&self) -> &SerializersModule {
        self.json.serializers_module()
    }

    fn encode_bool(&mut self, value: bool) -> Result<(), Error> {
        self.print_primitive(if value { "true" } else { "false" });
        Ok(())
    }

    fn encode_i8(&mut self, value: i8) -> Result<(), Error> {
        self.print_primitive(&value.to_string());
        Ok(())
    }

    fn encode_i16(&mut self, value: i16) -> Result<(), Error> {
        self.print_primitive(&value.to_string());
        Ok(())
    }

    fn encode_i32(&mut self, value: i32) -> Result<(), Error> {
        self.print_primitive(&value.to_string());
        Ok(())
    }

    fn encode_i64(&mut self, value: i64) -> Result<(), Error> {
        self.print_primitive(&value.to_string());
        Ok(())
    }

    fn encode_u64(&mut self, value: u64) -> Result<(), Error> {
        self.print_primitive(&value.to_string());
        Ok(())
    }

    fn encode_f32(&mut self, value: f32) -> Result<(), Error> {
        self.check_float(value as f64)?;
        self.print_primitive(&f32_text(value));
        Ok(())
    }

    fn encode_f64(&mut self, value: f64) -> Result<(), Error> {
        self.check_float(value)?;
        self.print_primitive(&float_text(value));
        Ok(())
    }

    fn encode_char(&mut self, value: char) -> Result<(), Error> {
        let mut utf8 = [0u8; 4];
        self.composer.print_quoted(value.encode_utf8(&mut utf8));
        Ok(())
    }

    fn encode_str(&mut self, value: &str) -> Result<(), Error> {
        self.composer.print_quoted(value);
        Ok(())
    }

    fn encode_null(&mut self) -> Result<(), Error> {
        self.composer.print("null");
        Ok(())
    }

    fn encode_enum(&mut self, descriptor: &SerialDescriptor, ordinal: usize) -> Result<(), Error> {
        self.composer.print_quoted(&descriptor.element_name(ordinal));
        Ok(())
    }

    fn begin_structure(
        &mut self,
        descriptor: &SerialDescriptor,
    ) -> Result<Box<dyn CompositeEncoder + '_>, Error> {
        let mode = switch_mode(descriptor).map_err(Error::encoding)?;
        self.composer.print_char(mode.begin());
        self.composer.indent();
        if let Some((key, serial_name)) = self.discriminator.take() {
            self.composer.next_item();
            self.composer.print_quoted(&key);
            self.composer.print_char(':');
            self.composer.space();
            self.composer.print_quoted(&serial_name);
        }
        Ok(Box::new(JsonCompositeEncoder {
            json: self.json,
            composer: &mut *self.composer,
            mode,
        }))
    }

    fn encode_inline_discriminator(
        &mut self,
        _base: &SerialDescriptor,
        serial_name: &str,
        actual: &SerialDescriptor,
    ) -> Result<bool, Error> {
        let config = self.json.config();
        if config.is_use_array_polymorphism() {
            return Ok(false);
        }
        let key = config.get_class_discriminator();
        match actual.kind() {
            SerialKind::Structure(StructureKind::Class | StructureKind::Object) | SerialKind::Contextual => {}
            kind => {
                return Err(Error::encoding(format!(
                    "'{serial_name}' of kind {kind} cannot be serialized polymorphically with \
                     class discriminator '{key}'; enable 'use_array_polymorphism' instead"
                )))
            }
        }
        if actual.get_element_index(key).is_some() {
            return Err(Error::encoding(format!(
                "'{serial_name}' cannot be serialized polymorphically because it has a property \
                 named '{key}' that conflicts with the JSON class discriminator"
            )));
        }
        self.discriminator = Some((key.to_string(), serial_name.to_string()));
        Ok(true)
    }
}

struct JsonCompositeEncoder<'a> {
    json: &'a Json,
    composer: &'a mut Composer,
    mode: WriteMode,
}

impl JsonCompositeEncoder<'_> {
    /// Writes what precedes element `index`. Returns whether the element is a
    /// map key.
    fn begin_element(&mut self, descriptor: &SerialDescriptor, index: usize) -> bool {
        match self.mode {
            WriteMode::List => {
                if !self.composer.writing_first {
                    self.composer.print_char(',');
                }
                self.composer.next_item();
                false
            }
            WriteMode::Map if index % 2 == 0 => {
                if !self.composer.writing_first {
                    self.composer.print_char(',');
                }
                self.composer.next_item();
                true
            }
            WriteMode::Map => {
                self.composer.print_char(':');
                self.composer.space();
                false
            }
            WriteMode::PolyObj => {
                if index == 1 {
                    self.composer.print_char(',');
                    self.composer.space();
                }
                false
            }
            WriteMode::Obj => {
                if !self.composer.writing_first {
                    self.composer.print_char(',');
                }
                self.composer.next_item();
                self.composer.print_quoted(&descriptor.element_name(index));
                self.composer.print_char(':');
                self.composer.space();
                false
            }
        }
    }
}

impl CompositeEncoder for JsonCompositeEncoder<'_> {
    fn encode_element(
        &mut self,
        descriptor: &SerialDescriptor,
        index: usize,
        f: &mut EncoderFn<'_>,
    ) -> Result<(), Error> {
        let force_quoting = self.begin_element(descriptor, index);
        let mut element = JsonEncoder {
            json: self.json,
            composer: &mut *self.composer,
            force_quoting,
            discriminator: None,
        };
        f(&mut element)
    }

    fn encode_null_element(&mut self, descriptor: &SerialDescriptor, index: usize) -> Result<(), Error> {
        if self.mode == WriteMode::Obj && !self.json.config().is_explicit_nulls() {
            return Ok(());
        }
        self.encode_element(descriptor, index, &mut |e| e.encode_null())
    }

    fn should_encode_element_default(&self, _descriptor: &SerialDescriptor, _index: usize) -> bool {
        !self.json.config().is_omit_defaults()
    }

    fn end_structure(&mut self, _descriptor: &SerialDescriptor) -> Result<(), Error> {
        self.composer.unindent();
        self.composer.next_item_if_not_first();
        self.composer.print_char(self.mode.end());
        Ok(())
    }
}
