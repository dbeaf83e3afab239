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


use std::collections::BTreeMap;

use super::{child_key, Properties, SIZE_KEY};
use crate::descriptor::{SerialDescriptor, SerialKind, StructureKind};
use crate::encoding::{CompositeEncoder, Encoder, EncoderFn};
use crate::error::Error;
use crate::module::SerializersModule;

pub(crate) struct PropertiesEncoder<'a> {
    properties: &'a Properties,
    out: &'a mut BTreeMap<String, String>,
    path: String,
}

impl<'a> PropertiesEncoder<'a> {
    pub(crate) fn new(properties: &'a Properties, out: &'a mut BTreeMap<String, String>, path: String) -> Self {
        PropertiesEncoder { properties, out, path }
    }

    fn put(&mut self, value: String) -> Result<(), Error> {
        if self.path.is_empty() {
            return Err(Error::unsupported(
                "Properties can only hold a structure at the top level",
            ));
        }
        self.out.insert(self.path.clone(), value);
        Ok(())
    }
}

impl Encoder for PropertiesEncoder<'_> {
    fn serializers_module(&self) -> &SerializersModule {
        self.properties.serializers_module()
    }

    fn encode_bool(&mut self, value: bool) -> Result<(), Error> {
        self.put(value.to_string())
    }

    fn encode_i8(&mut self, value: i8) -> Result<(), Error> {
        self.put(value.to_string())
    }

    fn encode_i16(&mut self, value: i16) -> Result<(), Error> {
        self.put(value.to_string())
    }

    fn encode_i32(&mut self, value: i32) -> Result<(), Error> {
        self.put(value.to_string())
    }

    fn encode_i64(&mut self, value: i64) -> Result<(), Error> {
        self.put(value.to_string())
    }

    fn encode_u64(&mut self, value: u64) -> Result<(), Error> {
        self.put(value.to_string())
    }

    fn encode_f32(&mut self, value: f32) -> Result<(), Error> {
        self.put(value.to_string())
    }

    fn encode_f64(&mut self, value: f64) -> Result<(), Error> {
        self.put(value.to_string())
    }

    fn encode_char(&mut self, value: char) -> Result<(), Error> {
        self.put(value.to_string())
    }

    fn encode_str(&mut self, value: &str) -> Result<(), Error> {
        self.put(value.to_string())
    }

    fn encode_null(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn encode_enum(&mut self, descriptor: &SerialDescriptor, ordinal: usize) -> Result<(), Error> {
        self.put(descriptor.element_name(ordinal).into_owned())
    }

    fn begin_structure(
        &mut self,
        descriptor: &SerialDescriptor,
    ) -> Result<Box<dyn CompositeEncoder + '_>, Error> {
        let collection = matches!(
            descriptor.kind(),
            SerialKind::Structure(StructureKind::List | StructureKind::Map)
        );
        if collection && self.path.is_empty() {
            return Err(Error::unsupported(
                "Properties can only hold a structure at the top level",
            ));
        }
        Ok(Box::new(PropertiesCompositeEncoder {
            properties: self.properties,
            out: &mut *self.out,
            path: &self.path,
            collection,
            written: 0,
        }))
    }
}

struct PropertiesCompositeEncoder<'a> {
    properties: &'a Properties,
    out: &'a mut BTreeMap<String, String>,
    path: &'a str,
    /// Lists and maps: elements are keyed by index and a size is written.
    collection: bool,
    /// Highest element index written plus one.
    written: usize,
}

impl PropertiesCompositeEncoder<'_> {
    fn element_key(&self, descriptor: &SerialDescriptor, index: usize) -> String {
        if self.collection {
            child_key(self.path, &index.to_string())
        } else {
            child_key(self.path, &descriptor.element_name(index))
        }
    }
}

impl CompositeEncoder for PropertiesCompositeEncoder<'_> {
    fn encode_element(
        &mut self,
        descriptor: &SerialDescriptor,
        index: usize,
        f: &mut EncoderFn<'_>,
    ) -> Result<(), Error> {
        self.written = self.written.max(index + 1);
        let key = self.element_key(descriptor, index);
        f(&mut PropertiesEncoder::new(self.properties, &mut *self.out, key))
    }

    fn encode_null_element(&mut self, _descriptor: &SerialDescriptor, index: usize) -> Result<(), Error> {
        self.written = self.written.max(index + 1);
        Ok(())
    }

    fn should_encode_element_default(&self, _descriptor: &SerialDescriptor, _index: usize) -> bool {
        !self.properties.config().is_omit_defaults()
    }

    fn end_structure(&mut self, descriptor: &SerialDescriptor) -> Result<(), Error> {
        if self.collection {
            let size = if descriptor.kind() == SerialKind::MAP {
                self.written.div_ceil(2)
            } else {
                self.written
            };
            self.out.insert(child_key(self.path, SIZE_KEY), size.to_string());
        }
        Ok(())
    }
}
