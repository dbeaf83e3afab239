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
use crate::encoding::{Decoder, Encoder};
use crate::error::Error;
use crate::serializer::Serializer;

/// Serializer for field-less enums.
///
/// `values` lists the constants in declaration order; the ordinal of a value
/// is its position in that slice, and the element names of the descriptor
/// are the names formats write.
///
/// ```
/// use strata_core::serializer::EnumSerializer;
///
/// #[derive(Clone, Copy, PartialEq, Debug)]
/// enum Color { Red, Green }
///
/// let serializer = EnumSerializer::new("Color", &["Red", "Green"], &[Color::Red, Color::Green]);
/// assert_eq!(serializer.ordinal(&Color::Green), Some(1));
/// ```
#[derive(Clone)]
pub struct EnumSerializer<E: 'static> {
    descriptor: SerialDescriptor,
    values: &'static [E],
}

impl<E> EnumSerializer<E>
where
    E: Copy + PartialEq + 'static,
{
    /// # Panics
    /// If `names` and `values` differ in length.
    pub fn new(serial_name: &'static str, names: &[&'static str], values: &'static [E]) -> Self {
        assert_eq!(
            names.len(),
            values.len(),
            "Enum '{serial_name}' must name every constant"
        );
        EnumSerializer {
            descriptor: SerialDescriptor::enumeration(serial_name, names),
            values,
        }
    }

    pub fn ordinal(&self, value: &E) -> Option<usize> {
        self.values.iter().position(|v| v == value)
    }
}

impl<E> Serializer for EnumSerializer<E>
where
    E: Copy + PartialEq + Send + Sync + 'static,
{
    type Value = E;

    fn descriptor(&self) -> SerialDescriptor {
        self.descriptor.clone()
    }

    fn serialize(&self, encoder: &mut dyn Encoder, value: &E) -> Result<(), Error> {
        let ordinal = self.ordinal(value).ok_or_else(|| {
            Error::encoding(format!(
                "Value is not a constant of enum '{}'",
                self.descriptor.serial_name()
            ))
        })?;
        encoder.encode_enum(&self.descriptor, ordinal)
    }

    fn deserialize(&self, decoder: &mut dyn Decoder) -> Result<E, Error> {
        let ordinal = decoder.decode_enum(&self.descriptor)?;
        self.values.get(ordinal).copied().ok_or_else(|| {
            Error::invalid_data(format!(
                "{} is not among valid {} enum values, values size is {}",
                ordinal,
                self.descriptor.serial_name(),
                self.values.len()
            ))
        })
    }
}
