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

use std::collections::{BTreeSet, HashSet, VecDeque};
use std::hash::Hash;
use std::marker::PhantomData;

use crate::descriptor::SerialDescriptor;
use crate::encoding::{CompositeDecoder, CompositeEncoder, Decoder, ElementIndex, Encoder};
use crate::error::Error;
use crate::serializer::{Serializable, Serializer};

/// Writes every item of `iter` as consecutive list elements.
pub fn write_list<'a, S, I>(
    composite: &mut dyn CompositeEncoder,
    descriptor: &SerialDescriptor,
    element: &S,
    iter: I,
) -> Result<(), Error>
where
    S: Serializer + ?Sized,
    S::Value: 'a,
    I: IntoIterator<Item = &'a S::Value>,
{
    for (index, item) in iter.into_iter().enumerate() {
        composite.encode_serializable_element(descriptor, index, element, item)?;
    }
    Ok(())
}

/// Upper bound on capacity reserved from a size read off the input.
pub(crate) const MAX_PREALLOCATED: usize = 1024;

/// Reads list elements until the structure is exhausted.
pub fn read_list<S, C>(
    composite: &mut dyn CompositeDecoder,
    descriptor: &SerialDescriptor,
    element: &S,
) -> Result<C, Error>
where
    S: Serializer + ?Sized,
    C: FromIterator<S::Value>,
{
    let mut items = Vec::new();
    if composite.decode_sequentially() {
        let size = composite.decode_collection_size(descriptor)?.unwrap_or(0);
        items.reserve(size.min(MAX_PREALLOCATED));
        for index in 0..size {
            items.push(composite.decode_serializable_element(descriptor, index, element)?);
        }
    } else {
        if let Some(size) = composite.decode_collection_size(descriptor)? {
            items.reserve(size.min(MAX_PREALLOCATED));
        }
        loop {
            match composite.decode_element_index(descriptor)? {
                ElementIndex::Done => break,
                ElementIndex::Element(index) => {
                    items.push(composite.decode_serializable_element(descriptor, index, element)?);
                }
            }
        }
    }
    Ok(items.into_iter().collect())
}

/// Serializer for list-like collections of `S::Value`.
///
/// `C` is the collection type; it must be buildable from an iterator and
/// iterable by reference.
pub struct ListSerializer<C, S> {
    serial_name: &'static str,
    element: S,
    _collection: PhantomData<fn() -> C>,
}

impl<C, S> ListSerializer<C, S> {
    pub fn new(serial_name: &'static str, element: S) -> Self {
        ListSerializer {
            serial_name,
            element,
            _collection: PhantomData,
        }
    }
}

impl<C, S> Serializer for ListSerializer<C, S>
where
    S: Serializer,
    C: FromIterator<S::Value>,
    for<'a> &'a C: IntoIterator<Item = &'a S::Value>,
{
    type Value = C;

    fn descriptor(&self) -> SerialDescriptor {
        SerialDescriptor::list(self.serial_name, self.element.descriptor())
    }

    fn serialize(&self, encoder: &mut dyn Encoder, value: &C) -> Result<(), Error> {
        let descriptor = self.descriptor();
        let iter = value.into_iter();
        let size = iter.size_hint().0;
        encoder.encode_collection(&descriptor, size, |c| {
            write_list(c, &descriptor, &self.element, iter)
        })
    }

    fn deserialize(&self, decoder: &mut dyn Decoder) -> Result<C, Error> {
        let descriptor = self.descriptor();
        decoder.decode_structure(&descriptor, |c| read_list(c, &descriptor, &self.element))
    }
}

pub type VecSerializer<S> = ListSerializer<Vec<<S as Serializer>::Value>, S>;

impl<T: Serializable> Serializable for Vec<T> {
    type Serializer = VecSerializer<T::Serializer>;

    fn serializer() -> Self::Serializer {
        ListSerializer::new("Vec", T::serializer())
    }
}

impl<T: Serializable> Serializable for VecDeque<T> {
    type Serializer = ListSerializer<VecDeque<T>, T::Serializer>;

    fn serializer() -> Self::Serializer {
        ListSerializer::new("VecDeque", T::serializer())
    }
}

impl<T: Serializable + Eq + Hash> Serializable for HashSet<T> {
    type Serializer = ListSerializer<HashSet<T>, T::Serializer>;

    fn serializer() -> Self::Serializer {
        ListSerializer::new("HashSet", T::serializer())
    }
}

impl<T: Serializable + Ord> Serializable for BTreeSet<T> {
    type Serializer = ListSerializer<BTreeSet<T>, T::Serializer>;

    fn serializer() -> Self::Serializer {
        ListSerializer::new("BTreeSet", T::serializer())
    }
}
