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

use crate::descriptor::SerialDescriptor;
use crate::encoding::{unknown_index, Decoder, ElementIndex, Encoder};
use crate::error::Error;
use crate::serializer::{Serializable, Serializer};

/// Serializer for a singleton: written as an empty structure, read back as a
/// clone of `instance`.
#[derive(Clone)]
pub struct ObjectSerializer<T> {
    descriptor: SerialDescriptor,
    instance: T,
}

impl<T: Clone> ObjectSerializer<T> {
    pub fn new(serial_name: &'static str, instance: T) -> Self {
        ObjectSerializer {
            descriptor: SerialDescriptor::object(serial_name),
            instance,
        }
    }
}

impl<T: Clone + Send + Sync> Serializer for ObjectSerializer<T> {
    type Value = T;

    fn descriptor(&self) -> SerialDescriptor {
        self.descriptor.clone()
    }

    fn serialize(&self, encoder: &mut dyn Encoder, _value: &T) -> Result<(), Error> {
        encoder.encode_structure(&self.descriptor, |_| Ok(()))
    }

    fn deserialize(&self, decoder: &mut dyn Decoder) -> Result<T, Error> {
        decoder.decode_structure(&self.descriptor, |c| {
            if !c.decode_sequentially() {
                if let ElementIndex::Element(i) = c.decode_element_index(&self.descriptor)? {
                    return Err(unknown_index(&self.descriptor, i));
                }
            }
            Ok(self.instance.clone())
        })
    }
}

impl Serializable for () {
    type Serializer = ObjectSerializer<()>;

    fn serializer() -> Self::Serializer {
        ObjectSerializer::new("()", ())
    }
}
