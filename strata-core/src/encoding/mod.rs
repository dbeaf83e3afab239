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

//! The structural protocol between serializers and formats.
//!
//! A [`Serializer`](crate::serializer::Serializer) drives an [`Encoder`] with
//! primitive calls and nested structures; each format translates those calls
//! into its own bytes or text. Nested structures are opened with
//! `begin_structure`, which hands out a [`CompositeEncoder`] that borrows its
//! parent, so a child can never outlive the structure it belongs to.
//!
//! Prefer the scoped helpers on `dyn Encoder` / `dyn Decoder`
//! ([`encode_structure`](trait.Encoder.html#method.encode_structure),
//! [`decode_structure`](trait.Decoder.html#method.decode_structure)): they
//! call `end_structure` exactly once on every path, including failures.
//!
//! Decoding is pull-based. Inside a structure the deserializer loops on
//! [`CompositeDecoder::decode_element_index`] until it sees
//! [`ElementIndex::Done`]:
//!
//! ```ignore
//! loop {
//!     match composite.decode_element_index(&desc)? {
//!         ElementIndex::Done => break,
//!         ElementIndex::Element(0) => x = Some(composite.decode_i32_element(&desc, 0)?),
//!         ElementIndex::Element(i) => return Err(Error::unknown_element_index(i, desc.serial_name())),
//!     }
//! }
//! ```

mod decoder;
mod encoder;
mod marker;

pub use decoder::{CompositeDecoder, Decoder, DecoderFn, PolymorphicFn};
pub use encoder::{CompositeEncoder, Encoder, EncoderFn};
pub use marker::ElementMarker;

use crate::descriptor::SerialDescriptor;
use crate::error::Error;

/// Result of [`CompositeDecoder::decode_element_index`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElementIndex {
    /// The next element to decode.
    Element(usize),
    /// No more elements in this structure.
    Done,
}

impl ElementIndex {
    pub fn index(self) -> Option<usize> {
        match self {
            ElementIndex::Element(i) => Some(i),
            ElementIndex::Done => None,
        }
    }
}

/// Unwraps a decoded element or reports it as missing.
///
/// Optional elements should be defaulted by the caller instead.
pub fn required<T>(descriptor: &SerialDescriptor, index: usize, value: Option<T>) -> Result<T, Error> {
    match value {
        Some(v) => Ok(v),
        None => Err(Error::missing_field(
            descriptor.element_name(index).into_owned(),
            descriptor.serial_name(),
        )),
    }
}

/// Error for an index the deserializer has no slot for.
pub fn unknown_index(descriptor: &SerialDescriptor, index: usize) -> Error {
    Error::unknown_element_index(index, descriptor.serial_name())
}
