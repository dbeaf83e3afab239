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

use std::sync::Arc;

use crate::descriptor::SerialDescriptor;
use crate::encoding::{Decoder, Encoder};
use crate::error::Error;
use crate::module::SerializersModule;
use crate::serializer::{DynSerializer, Serializer};

/// Defers the choice of serializer for `T` to the module in use.
///
/// A contextual registration for `T` always wins; the fallback is used only
/// when the module has none.
pub struct ContextualSerializer<T> {
    descriptor: SerialDescriptor,
    fallback: Option<DynSerializer<T>>,
}

impl<T: 'static> ContextualSerializer<T> {
    pub fn new(serial_name: &'static str) -> Self {
        ContextualSerializer {
            descriptor: SerialDescriptor::contextual(serial_name),
            fallback: None,
        }
    }

    pub fn with_fallback<S>(serial_name: &'static str, fallback: S) -> Self
    where
        S: Serializer<Value = T> + 'static,
    {
        ContextualSerializer {
            descriptor: SerialDescriptor::contextual(serial_name),
            fallback: Some(Arc::new(fallback)),
        }
    }

    fn resolve(&self, module: &SerializersModule) -> Result<DynSerializer<T>, Error> {
        module
            .get_contextual::<T>()
            .or_else(|| self.fallback.clone())
            .ok_or_else(|| {
                Error::serializer_not_found(self.descriptor.serial_name(), "SerializersModule")
            })
    }
}

impl<T> Clone for ContextualSerializer<T> {
    fn clone(&self) -> Self {
        ContextualSerializer {
            descriptor: self.descriptor.clone(),
            fallback: self.fallback.clone(),
        }
    }
}

impl<T: 'static> Serializer for ContextualSerializer<T> {
    type Value = T;

    fn descriptor(&self) -> SerialDescriptor {
        self.descriptor.clone()
    }

    fn serialize(&self, encoder: &mut dyn Encoder, value: &T) -> Result<(), Error> {
        let actual = self.resolve(encoder.serializers_module())?;
        actual.serialize(encoder, value)
    }

    fn deserialize(&self, decoder: &mut dyn Decoder) -> Result<T, Error> {
        let actual = self.resolve(decoder.serializers_module())?;
        actual.deserialize(decoder)
    }
}
