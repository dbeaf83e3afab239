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
use crate::serializer::{Serializable, Serializer};

/// Wraps a serializer so that `None` is written as null.
///
/// The descriptor is the nullable view of the inner descriptor.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullableSerializer<S>(pub S);

impl<S: Serializer> Serializer for NullableSerializer<S> {
    type Value = Option<S::Value>;

    fn descriptor(&self) -> SerialDescriptor {
        self.0.descriptor().nullable()
    }

    fn serialize(&self, encoder: &mut dyn Encoder, value: &Option<S::Value>) -> Result<(), Error> {
        match value {
            Some(v) => {
                encoder.encode_not_null_mark()?;
                self.0.serialize(encoder, v)
            }
            None => encoder.encode_null(),
        }
    }

    fn deserialize(&self, decoder: &mut dyn Decoder) -> Result<Option<S::Value>, Error> {
        if decoder.decode_not_null_mark()? {
            self.0.deserialize(decoder).map(Some)
        } else {
            decoder.decode_null()?;
            Ok(None)
        }
    }
}

impl<T: Serializable> Serializable for Option<T> {
    type Serializer = NullableSerializer<T::Serializer>;

    fn serializer() -> Self::Serializer {
        NullableSerializer(T::serializer())
    }
}

/// Serializes `Box<T>` as `T`.
#[derive(Clone, Copy, Debug, Default)]
pub struct BoxSerializer<S>(pub S);

impl<S: Serializer> Serializer for BoxSerializer<S> {
    type Value = Box<S::Value>;

    fn descriptor(&self) -> SerialDescriptor {
        self.0.descriptor()
    }

    fn serialize(&self, encoder: &mut dyn Encoder, value: &Box<S::Value>) -> Result<(), Error> {
        self.0.serialize(encoder, value)
    }

    fn deserialize(&self, decoder: &mut dyn Decoder) -> Result<Box<S::Value>, Error> {
        self.0.deserialize(decoder).map(Box::new)
    }
}

impl<T: Serializable> Serializable for Box<T> {
    type Serializer = BoxSerializer<T::Serializer>;

    fn serializer() -> Self::Serializer {
        BoxSerializer(T::serializer())
    }
}
