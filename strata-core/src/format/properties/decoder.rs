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


use std::collections::{BTreeMap, HashSet};
use std::fmt::Display;
use std::ops::Bound;
use std::str::FromStr;

use super::{child_key, is_present, Properties, SIZE_KEY};
use crate::descriptor::{SerialDescriptor, SerialKind, StructureKind};
use crate::encoding::{CompositeDecoder, Decoder, DecoderFn, ElementIndex};
use crate::error::Error;
use crate::module::SerializersModule;

pub(crate) struct PropertiesDecoder<'a> {
    properties: &'a Properties,
    map: &'a BTreeMap<String, String>,
    path: String,
}

impl<'a> PropertiesDecoder<'a> {
    pub(crate) fn new(properties: &'a Properties, map: &'a BTreeMap<String, String>, path: String) -> Self {
        PropertiesDecoder { properties, map, path }
    }

    fn value(&self) -> Result<&'a str, Error> {
        self.map
            .get(&self.path)
            .map(String::as_str)
            .ok_or_else(|| Error::properties_decoding(self.path.clone(), "Missing value"))
    }

    fn parse<T>(&self, type_name: &str) -> Result<T, Error>
    where
        T: FromStr,
        T::Err: Display,
    {
        let text = self.value()?;
        text.parse().map_err(|e| {
            Error::properties_decoding(
                self.path.clone(),
                format!("Failed to parse '{text}' as {type_name}: {e}"),
            )
        })
    }
}

impl Decoder for PropertiesDecoder<'_> {
    fn serializers_module(&self) -> &SerializersModule {
        self.properties.serializers_module()
    }

    fn decode_not_null_mark(&mut self) -> Result<bool, Error> {
        Ok(is_present(self.map, &self.path))
    }

    fn decode_null(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn decode_bool(&mut self) -> Result<bool, Error> {
        self.parse("bool")
    }

    fn decode_i8(&mut self) -> Result<i8, Error> {
        self.parse("i8")
    }

    fn decode_i16(&mut self) -> Result<i16, Error> {
        self.parse("i16")
    }

    fn decode_i32(&mut self) -> Result<i32, Error> {
        self.parse("i32")
    }

    fn decode_i64(&mut self) -> Result<i64, Error> {
        self.parse("i64")
    }

    fn decode_u64(&mut self) -> Result<u64, Error> {
        self.parse("u64")
    }

    fn decode_f32(&mut self) -> Result<f32, Error> {
        self.parse("f32")
    }

    fn decode_f64(&mut self) -> Result<f64, Error> {
        self.parse("f64")
    }

    fn decode_char(&mut self) -> Result<char, Error> {
        self.parse("char")
    }

    fn decode_string(&mut self) -> Result<String, Error> {
        self.value().map(str::to_owned)
    }

    fn decode_enum(&mut self, descriptor: &SerialDescriptor) -> Result<usize, Error> {
        let name = self.value()?;
        descriptor.get_element_index(name).ok_or_else(|| {
            Error::properties_decoding(
                self.path.clone(),
                format!("{} does not contain element with name '{name}'", descriptor.serial_name()),
            )
        })
    }

    fn begin_structure(
        &mut self,
        descriptor: &SerialDescriptor,
    ) -> Result<Box<dyn CompositeDecoder + '_>, Error> {
        let size = match descriptor.kind() {
            SerialKind::Structure(StructureKind::List) => Some(self.collection_size(descriptor, 1)?),
            SerialKind::Structure(StructureKind::Map) => Some(self.collection_size(descriptor, 2)?),
            _ => None,
        };
        Ok(Box::new(PropertiesCompositeDecoder {
            properties: self.properties,
            map: self.map,
            path: &self.path,
            size,
            next: 0,
        }))
    }
}

impl PropertiesDecoder<'_> {
    /// Reads `<path>.size`, or counts entries of `stride` indices until the
    /// first one with nothing stored.
    ///
    /// A declared size may not exceed the entries stored under the path.
    /// Elements that can be stored as nothing (nulls, classes with every
    /// field omitted) are only held to `max_message_size`.
    fn collection_size(&self, descriptor: &SerialDescriptor, stride: usize) -> Result<usize, Error> {
        let key = child_key(&self.path, SIZE_KEY);
        let Some(text) = self.map.get(&key) else {
            let mut size = 0;
            while is_present(self.map, &child_key(&self.path, &(size * stride).to_string())) {
                size += 1;
            }
            return Ok(size);
        };
        let size: usize = text.parse().map_err(|e| {
            Error::properties_decoding(key.clone(), format!("Invalid collection size '{text}': {e}"))
        })?;
        let limit = if always_stored(descriptor.element_descriptor(0)) {
            self.stored_entries(stride)
        } else {
            self.properties.config().get_max_message_size()
        };
        if size > limit {
            return Err(Error::properties_decoding(
                key,
                format!("Collection size {size} exceeds the {limit} entries that can be read"),
            ));
        }
        Ok(size)
    }

    /// Distinct element indices stored below the path, counting one per
    /// `stride` indices.
    fn stored_entries(&self, stride: usize) -> usize {
        let prefix = child_key(&self.path, "");
        let indices: HashSet<usize> = self
            .map
            .range::<str, _>((Bound::Included(prefix.as_str()), Bound::Unbounded))
            .take_while(|(key, _)| key.starts_with(&prefix))
            .filter_map(|(key, _)| {
                let segment = key[prefix.len()..].split('.').next()?;
                segment.parse::<usize>().ok()
            })
            .filter(|index| index % stride == 0)
            .collect();
        indices.len()
    }
}

/// Whether every value of `descriptor` leaves at least one key behind.
fn always_stored(descriptor: &SerialDescriptor) -> bool {
    !descriptor.is_nullable()
        && matches!(
            descriptor.kind(),
            SerialKind::Primitive(_)
                | SerialKind::Enum
                | SerialKind::Structure(StructureKind::List | StructureKind::Map)
        )
}

struct PropertiesCompositeDecoder<'a> {
    properties: &'a Properties,
    map: &'a BTreeMap<String, String>,
    path: &'a str,
    /// Entry count of a list or map; `None` for classes.
    size: Option<usize>,
    next: usize,
}

impl CompositeDecoder for PropertiesCompositeDecoder<'_> {
    fn decode_element_index(&mut self, descriptor: &SerialDescriptor) -> Result<ElementIndex, Error> {
        if let Some(size) = self.size {
            let count = if descriptor.kind() == SerialKind::MAP { size * 2 } else { size };
            if self.next >= count {
                return Ok(ElementIndex::Done);
            }
            self.next += 1;
            return Ok(ElementIndex::Element(self.next - 1));
        }
        while self.next < descriptor.elements_count() {
            let index = self.next;
            self.next += 1;
            let key = child_key(self.path, &descriptor.element_name(index));
            let absent_null = !descriptor.is_element_optional(index)
                && descriptor.element_descriptor(index).is_nullable();
            if absent_null || is_present(self.map, &key) {
                return Ok(ElementIndex::Element(index));
            }
        }
        Ok(ElementIndex::Done)
    }

    fn decode_sequentially(&self) -> bool {
        self.size.is_some()
    }

    fn decode_collection_size(&mut self, _descriptor: &SerialDescriptor) -> Result<Option<usize>, Error> {
        Ok(self.size)
    }

    fn decode_element(
        &mut self,
        descriptor: &SerialDescriptor,
        index: usize,
        f: &mut DecoderFn<'_>,
    ) -> Result<(), Error> {
        let name = match self.size {
            Some(_) => index.to_string(),
            None => descriptor.element_name(index).into_owned(),
        };
        let key = child_key(self.path, &name);
        f(&mut PropertiesDecoder::new(self.properties, self.map, key))
    }

    fn end_structure(&mut self, _descriptor: &SerialDescriptor) -> Result<(), Error> {
        Ok(())
    }
}
