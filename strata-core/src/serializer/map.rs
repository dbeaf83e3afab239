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

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::marker::PhantomData;

use crate::descriptor::SerialDescriptor;
use crate::encoding::{CompositeDecoder, Decoder, ElementIndex, Encoder};
use crate::error::Error;
use crate::serializer::collection::MAX_PREALLOCATED;
use crate::serializer::{Serializable, Serializer};

/// Serializer for maps. Entry `i` occupies element indices `2i` (key) and
/// `2i + 1` (value).
pub struct MapSerializer<M, K, V> {
    serial_name: &'static str,
    key: K,
    value: V,
    _map: PhantomData<fn() -> M>,
}

impl<M, K, V> MapSerializer<M, K, V> {
    pub fn new(serial_name: &'static str, key: K, value: V) -> Self {
        MapSerializer {
            serial_name,
            key,
            value,
            _map: PhantomData,
        }
    }

    fn read_entry(
        &self,
        composite: &mut dyn CompositeDecoder,
        descriptor: &SerialDescriptor,
        index: usize,
        check_index: bool,
    ) -> Result<(K::Value, V::Value), Error>
    where
        K: Serializer,
        V: Serializer,
    {
        let key = composite.decode_serializable_element(descriptor, index, &self.key)?;
        let value_index = if check_index {
            match composite.decode_element_index(descriptor)? {
                ElementIndex::Element(i) if i == index + 1 => i,
                other => {
                    return Err(Error::invalid_data(format!(
                        "Value must follow key in a map, index for key: {index}, returned index for value: {other:?}"
                    )))
                }
            }
        } else {
            index + 1
        };
        let value = composite.decode_serializable_element(descriptor, value_index, &self.value)?;
        Ok((key, value))
    }
}

impl<M, K, V> Serializer for MapSerializer<M, K, V>
where
    K: Serializer,
    V: Serializer,
    M: FromIterator<(K::Value, V::Value)>,
    for<'a> &'a M: IntoIterator<Item = (&'a K::Value, &'a V::Value)>,
{
    type Value = M;

    fn descriptor(&self) -> SerialDescriptor {
        SerialDescriptor::map(self.serial_name, self.key.descriptor(), self.value.descriptor())
    }

    fn serialize(&self, encoder: &mut dyn Encoder, value: &M) -> Result<(), Error> {
        let descriptor = self.descriptor();
        let iter = value.into_iter();
        let size = iter.size_hint().0;
        encoder.encode_collection(&descriptor, size, |c| {
            for (i, (k, v)) in iter.enumerate() {
                c.encode_serializable_element(&descriptor, 2 * i, &self.key, k)?;
                c.encode_serializable_element(&descriptor, 2 * i + 1, &self.value, v)?;
            }
            Ok(())
        })
    }

    fn deserialize(&self, decoder: &mut dyn Decoder) -> Result<M, Error> {
        let descriptor = self.descriptor();
        decoder.decode_structure(&descriptor, |c| {
            let mut entries = Vec::new();
            if c.decode_sequentially() {
                let size = c.decode_collection_size(&descriptor)?.unwrap_or(0);
                entries.reserve(size.min(MAX_PREALLOCATED));
                for i in 0..size {
                    entries.push(self.read_entry(c, &descriptor, 2 * i, false)?);
                }
            } else {
                loop {
                    match c.decode_element_index(&descriptor)? {
                        ElementIndex::Done => break,
                        ElementIndex::Element(index) => {
                            entries.push(self.read_entry(c, &descriptor, index, true)?);
                        }
                    }
                }
            }
            Ok(entries.into_iter().collect())
        })
    }
}

impl<K, V> Serializable for HashMap<K, V>
where
    K: Serializable + Eq + Hash,
    V: Serializable,
{
    type Serializer = MapSerializer<HashMap<K, V>, K::Serializer, V::Serializer>;

    fn serializer() -> Self::Serializer {
        MapSerializer::new("HashMap", K::serializer(), V::serializer())
    }
}

impl<K, V> Serializable for BTreeMap<K, V>
where
    K: Serializable + Ord,
    V: Serializable,
{
    type Serializer = MapSerializer<BTreeMap<K, V>, K::Serializer, V::Serializer>;

    fn serializer() -> Self::Serializer {
        MapSerializer::new("BTreeMap", K::serializer(), V::serializer())
    }
}
