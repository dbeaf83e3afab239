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

//! Serializers for values known only through a base type.
//!
//! Both serializers write a discriminator (the subclass serial name) next to
//! the value. The structured form is a two-element structure, `type` then
//! `value`; formats that prefer to fold the discriminator into the value's own
//! structure (JSON) take over through
//! [`Encoder::encode_inline_discriminator`] and
//! [`Decoder::decode_inline_polymorphic`].

use std::marker::PhantomData;
use std::sync::Arc;

use crate::descriptor::{PolymorphicKind, PrimitiveKind, SerialDescriptor, SerialKind};
use crate::encoding::{unknown_index, CompositeDecoder, Decoder, ElementIndex, Encoder};
use crate::error::Error;
use crate::module::scope::{PolymorphicEntry, PolymorphicScope};
use crate::module::{short_type_name, SerializersModule};
use crate::serializer::{AsAny, DynSerializer, Serializer};

fn structured_descriptor(
    serial_name: String,
    kind: PolymorphicKind,
    value: SerialDescriptor,
) -> SerialDescriptor {
    SerialDescriptor::builder(serial_name)
        .kind(SerialKind::Polymorphic(kind))
        .element(
            "type",
            SerialDescriptor::primitive("String", PrimitiveKind::String),
            false,
        )
        .element("value", value, false)
        .build()
}

fn write_polymorphic<Base: ?Sized + 'static>(
    encoder: &mut dyn Encoder,
    descriptor: &SerialDescriptor,
    serial_name: &str,
    actual: DynSerializer<Box<Base>>,
    value: &Box<Base>,
) -> Result<(), Error> {
    let actual_descriptor = actual.descriptor();
    if encoder.encode_inline_discriminator(descriptor, serial_name, &actual_descriptor)? {
        return actual.serialize(encoder, value);
    }
    encoder.encode_structure(descriptor, |c| {
        c.encode_str_element(descriptor, 0, serial_name)?;
        c.encode_serializable_element(descriptor, 1, &*actual, value)
    })
}

type Resolver<'r, Base> =
    dyn Fn(&SerializersModule, Option<&str>) -> Result<DynSerializer<Box<Base>>, Error> + 'r;

fn read_polymorphic<Base: ?Sized + 'static>(
    decoder: &mut dyn Decoder,
    descriptor: &SerialDescriptor,
    resolve: &Resolver<'_, Base>,
) -> Result<Box<Base>, Error> {
    let mut out = None;
    let inline = decoder.decode_inline_polymorphic(descriptor, &mut |serial_name, d| {
        let actual = resolve(d.serializers_module(), serial_name)?;
        out = Some(actual.deserialize(d)?);
        Ok(())
    })?;
    if inline {
        return out.ok_or_else(|| missing_value(descriptor));
    }
    decoder.decode_structure(descriptor, |c| {
        let mut serial_name: Option<String> = None;
        let mut value = None;
        let mut read_value = |c: &mut dyn CompositeDecoder, name: &str| {
            c.decode_element(descriptor, 1, &mut |d| {
                let actual = resolve(d.serializers_module(), Some(name))?;
                value = Some(actual.deserialize(d)?);
                Ok(())
            })
        };
        if c.decode_sequentially() {
            let name = c.decode_string_element(descriptor, 0)?;
            read_value(&mut *c, &name)?;
        } else {
            loop {
                match c.decode_element_index(descriptor)? {
                    ElementIndex::Done => break,
                    ElementIndex::Element(0) => {
                        serial_name = Some(c.decode_string_element(descriptor, 0)?);
                    }
                    ElementIndex::Element(1) => {
                        let Some(name) = serial_name.as_deref() else {
                            return Err(Error::invalid_data(format!(
                                "Cannot read polymorphic value of '{}' before its type token",
                                descriptor.serial_name()
                            )));
                        };
                        read_value(&mut *c, name)?;
                    }
                    ElementIndex::Element(i) => return Err(unknown_index(descriptor, i)),
                }
            }
        }
        value.ok_or_else(|| missing_value(descriptor))
    })
}

#[cold]
fn missing_value(descriptor: &SerialDescriptor) -> Error {
    Error::missing_field("value", descriptor.serial_name())
}

/// Open polymorphism over `Base`: subclasses come from the
/// [`SerializersModule`] of the encoder or decoder.
///
/// `Base` is usually a trait object type whose trait has [`AsAny`] as a
/// supertrait.
pub struct PolymorphicSerializer<Base: ?Sized> {
    base_name: &'static str,
    descriptor: SerialDescriptor,
    _base: PhantomData<fn() -> Box<Base>>,
}

impl<Base: ?Sized + 'static> PolymorphicSerializer<Base> {
    /// Uses the last path segment of `Base`'s type name as base name.
    pub fn new() -> Self {
        Self::with_base_name(short_type_name::<Base>())
    }

    pub fn with_base_name(base_name: &'static str) -> Self {
        let serial_name = format!("Polymorphic<{base_name}>");
        let value = SerialDescriptor::contextual(serial_name.clone());
        PolymorphicSerializer {
            base_name,
            descriptor: structured_descriptor(serial_name, PolymorphicKind::Open, value),
            _base: PhantomData,
        }
    }
}

impl<Base: ?Sized + 'static> Default for PolymorphicSerializer<Base> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Base: ?Sized + 'static> Clone for PolymorphicSerializer<Base> {
    fn clone(&self) -> Self {
        PolymorphicSerializer {
            base_name: self.base_name,
            descriptor: self.descriptor.clone(),
            _base: PhantomData,
        }
    }
}

impl<Base> Serializer for PolymorphicSerializer<Base>
where
    Base: ?Sized + AsAny + 'static,
{
    type Value = Box<Base>;

    fn descriptor(&self) -> SerialDescriptor {
        self.descriptor.clone()
    }

    fn serialize(&self, encoder: &mut dyn Encoder, value: &Box<Base>) -> Result<(), Error> {
        let actual_value: &Base = value;
        let (serial_name, actual) = encoder
            .serializers_module()
            .find_polymorphic_serializer::<Base>(actual_value)
            .ok_or_else(|| Error::serializer_not_found(actual_value.runtime_type_name(), self.base_name))?;
        write_polymorphic(encoder, &self.descriptor, &serial_name, actual, value)
    }

    fn deserialize(&self, decoder: &mut dyn Decoder) -> Result<Box<Base>, Error> {
        let base_name = self.base_name;
        read_polymorphic(decoder, &self.descriptor, &move |module, serial_name| {
            module
                .find_polymorphic_deserializer::<Base>(serial_name)
                .ok_or_else(|| not_found(serial_name, base_name))
        })
    }
}

#[cold]
fn not_found(serial_name: Option<&str>, base_name: &str) -> Error {
    match serial_name {
        Some(name) => Error::serializer_not_found(name, base_name),
        None => Error::serializer_not_found("<missing class discriminator>", base_name),
    }
}

/// Closed polymorphism over `Base`: the subclasses are fixed when the
/// serializer is built. Unknown discriminators fall back to the module's
/// registrations and default providers for `Base`.
pub struct SealedSerializer<Base: ?Sized + 'static> {
    base_name: &'static str,
    descriptor: SerialDescriptor,
    subclasses: Arc<PolymorphicScope<Base>>,
}

impl<Base: ?Sized + 'static> Clone for SealedSerializer<Base> {
    fn clone(&self) -> Self {
        SealedSerializer {
            base_name: self.base_name,
            descriptor: self.descriptor.clone(),
            subclasses: self.subclasses.clone(),
        }
    }
}

impl<Base: ?Sized + AsAny + 'static> SealedSerializer<Base> {
    pub fn builder(base_name: &'static str) -> SealedSerializerBuilder<Base> {
        SealedSerializerBuilder {
            base_name,
            subclasses: PolymorphicScope::new(base_name),
            order: Vec::new(),
            error: None,
        }
    }
}

/// Builder for [`SealedSerializer`].
pub struct SealedSerializerBuilder<Base: ?Sized + 'static> {
    base_name: &'static str,
    subclasses: PolymorphicScope<Base>,
    order: Vec<(Arc<str>, SerialDescriptor)>,
    error: Option<Error>,
}

impl<Base: ?Sized + AsAny + 'static> SealedSerializerBuilder<Base> {
    /// Adds a subclass under the serial name of its descriptor.
    pub fn subclass<S>(self, serializer: S, upcast: fn(S::Value) -> Box<Base>) -> Self
    where
        S: Serializer + 'static,
        S::Value: 'static,
    {
        let serial_name = serializer.descriptor().serial_name().to_string();
        self.subclass_with_name(serial_name, serializer, upcast)
    }

    pub fn subclass_with_name<S>(
        mut self,
        serial_name: impl Into<Arc<str>>,
        serializer: S,
        upcast: fn(S::Value) -> Box<Base>,
    ) -> Self
    where
        S: Serializer + 'static,
        S::Value: 'static,
    {
        if self.error.is_some() {
            return self;
        }
        let serial_name = serial_name.into();
        let descriptor = serializer.descriptor();
        match self
            .subclasses
            .register(PolymorphicEntry::new(serial_name.clone(), serializer, upcast))
        {
            Ok(()) => self.order.push((serial_name, descriptor)),
            Err(e) => self.error = Some(e),
        }
        self
    }

    /// Fails if two subclasses share a serial name or a runtime type.
    pub fn build(self) -> Result<SealedSerializer<Base>, Error> {
        if let Some(error) = self.error {
            return Err(error);
        }
        let serial_name = format!("Sealed<{}>", self.base_name);
        let mut value = SerialDescriptor::builder(serial_name.clone()).kind(SerialKind::Contextual);
        for (name, descriptor) in &self.order {
            value = value.element(name.to_string(), descriptor, false);
        }
        Ok(SealedSerializer {
            base_name: self.base_name,
            descriptor: structured_descriptor(serial_name, PolymorphicKind::Sealed, value.build()),
            subclasses: Arc::new(self.subclasses),
        })
    }
}

impl<Base> Serializer for SealedSerializer<Base>
where
    Base: ?Sized + AsAny + 'static,
{
    type Value = Box<Base>;

    fn descriptor(&self) -> SerialDescriptor {
        self.descriptor.clone()
    }

    fn serialize(&self, encoder: &mut dyn Encoder, value: &Box<Base>) -> Result<(), Error> {
        let actual_value: &Base = value;
        let found = match self.subclasses.serializer_for(actual_value) {
            Some(found) => Some(found),
            None => encoder
                .serializers_module()
                .find_polymorphic_serializer::<Base>(actual_value),
        };
        let (serial_name, actual) = found
            .ok_or_else(|| Error::serializer_not_found(actual_value.runtime_type_name(), self.base_name))?;
        write_polymorphic(encoder, &self.descriptor, &serial_name, actual, value)
    }

    fn deserialize(&self, decoder: &mut dyn Decoder) -> Result<Box<Base>, Error> {
        let subclasses = &self.subclasses;
        let base_name = self.base_name;
        read_polymorphic(decoder, &self.descriptor, &move |module, serial_name| {
            subclasses
                .deserializer_for(serial_name)
                .or_else(|| module.find_polymorphic_deserializer::<Base>(serial_name))
                .ok_or_else(|| not_found(serial_name, base_name))
        })
    }
}
