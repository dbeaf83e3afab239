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

use std::any::{Any, TypeId};
use std::sync::Arc;

use crate::descriptor::SerialDescriptor;
use crate::encoding::{Decoder, Encoder};
use crate::error::Error;

/// Translates values of one type to and from the encoding protocol.
///
/// A serializer never touches bytes. It describes the value with its
/// [`descriptor`](Serializer::descriptor) and drives an [`Encoder`] or
/// [`Decoder`] with primitive calls and nested structures. Serializers hold no
/// per-call state and are shared freely between threads.
///
/// The trait is object safe, so `Arc<dyn Serializer<Value = T>>` is the
/// common currency of the registry.
///
/// # Example
/// ```
/// use strata_core::descriptor::{PrimitiveKind, SerialDescriptor};
/// use strata_core::encoding::{required, unknown_index, Decoder, ElementIndex, Encoder};
/// use strata_core::error::Error;
/// use strata_core::serializer::Serializer;
///
/// struct Point { x: i32, y: i32 }
///
/// struct PointSerializer;
///
/// impl Serializer for PointSerializer {
///     type Value = Point;
///
///     fn descriptor(&self) -> SerialDescriptor {
///         let int = SerialDescriptor::primitive("i32", PrimitiveKind::Int);
///         SerialDescriptor::builder("Point")
///             .element("x", int.clone(), false)
///             .element("y", int, false)
///             .build()
///     }
///
///     fn serialize(&self, encoder: &mut dyn Encoder, value: &Point) -> Result<(), Error> {
///         let desc = self.descriptor();
///         encoder.encode_structure(&desc, |s| {
///             s.encode_i32_element(&desc, 0, value.x)?;
///             s.encode_i32_element(&desc, 1, value.y)
///         })
///     }
///
///     fn deserialize(&self, decoder: &mut dyn Decoder) -> Result<Point, Error> {
///         let desc = self.descriptor();
///         decoder.decode_structure(&desc, |s| {
///             let (mut x, mut y) = (None, None);
///             loop {
///                 match s.decode_element_index(&desc)? {
///                     ElementIndex::Done => break,
///                     ElementIndex::Element(0) => x = Some(s.decode_i32_element(&desc, 0)?),
///                     ElementIndex::Element(1) => y = Some(s.decode_i32_element(&desc, 1)?),
///                     ElementIndex::Element(i) => return Err(unknown_index(&desc, i)),
///                 }
///             }
///             Ok(Point { x: required(&desc, 0, x)?, y: required(&desc, 1, y)? })
///         })
///     }
/// }
/// ```
pub trait Serializer: Send + Sync {
    type Value;

    fn descriptor(&self) -> SerialDescriptor;

    fn serialize(&self, encoder: &mut dyn Encoder, value: &Self::Value) -> Result<(), Error>;

    fn deserialize(&self, decoder: &mut dyn Decoder) -> Result<Self::Value, Error>;
}

impl<S: Serializer + ?Sized> Serializer for Arc<S> {
    type Value = S::Value;

    #[inline(always)]
    fn descriptor(&self) -> SerialDescriptor {
        (**self).descriptor()
    }

    #[inline(always)]
    fn serialize(&self, encoder: &mut dyn Encoder, value: &Self::Value) -> Result<(), Error> {
        (**self).serialize(encoder, value)
    }

    #[inline(always)]
    fn deserialize(&self, decoder: &mut dyn Decoder) -> Result<Self::Value, Error> {
        (**self).deserialize(decoder)
    }
}

impl<S: Serializer + ?Sized> Serializer for &S {
    type Value = S::Value;

    #[inline(always)]
    fn descriptor(&self) -> SerialDescriptor {
        (**self).descriptor()
    }

    #[inline(always)]
    fn serialize(&self, encoder: &mut dyn Encoder, value: &Self::Value) -> Result<(), Error> {
        (**self).serialize(encoder, value)
    }

    #[inline(always)]
    fn deserialize(&self, decoder: &mut dyn Decoder) -> Result<Self::Value, Error> {
        (**self).deserialize(decoder)
    }
}

/// Shared, type-erased-by-implementation serializer handle.
pub type DynSerializer<T> = Arc<dyn Serializer<Value = T>>;

/// Types with a default serializer.
pub trait Serializable: Sized + 'static {
    type Serializer: Serializer<Value = Self> + 'static;

    fn serializer() -> Self::Serializer;
}

/// Runtime type access for values behind a polymorphic base.
///
/// Implemented for every sized `'static` type. Make it a supertrait of a
/// trait used as polymorphic base so that `dyn Base` can report the concrete
/// type of the value it points at:
///
/// ```
/// use strata_core::serializer::AsAny;
///
/// trait Shape: AsAny + Send + Sync {
///     fn area(&self) -> f64;
/// }
/// ```
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;

    fn runtime_type_name(&self) -> &'static str;
}

impl<T: Any> AsAny for T {
    #[inline(always)]
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn runtime_type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

impl AsAny for dyn Any {
    #[inline(always)]
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn runtime_type_name(&self) -> &'static str {
        "dyn Any"
    }
}

impl AsAny for dyn Any + Send + Sync {
    #[inline(always)]
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn runtime_type_name(&self) -> &'static str {
        "dyn Any"
    }
}

/// Object-safe view of a serializer with its value type erased to `dyn Any`.
///
/// Blanket-implemented for every `'static` [`Serializer`].
pub trait AnySerializer: Send + Sync {
    fn erased_descriptor(&self) -> SerialDescriptor;

    /// `TypeId` of the value type handled.
    fn value_type_id(&self) -> TypeId;

    /// `TypeId` of the serializer itself, used to compare registrations.
    fn serializer_type_id(&self) -> TypeId;

    fn serialize_any(&self, encoder: &mut dyn Encoder, value: &dyn Any) -> Result<(), Error>;

    fn deserialize_any(&self, decoder: &mut dyn Decoder) -> Result<Box<dyn Any>, Error>;
}

impl<S> AnySerializer for S
where
    S: Serializer + 'static,
    S::Value: 'static,
{
    fn erased_descriptor(&self) -> SerialDescriptor {
        Serializer::descriptor(self)
    }

    fn value_type_id(&self) -> TypeId {
        TypeId::of::<S::Value>()
    }

    fn serializer_type_id(&self) -> TypeId {
        TypeId::of::<S>()
    }

    fn serialize_any(&self, encoder: &mut dyn Encoder, value: &dyn Any) -> Result<(), Error> {
        match value.downcast_ref::<S::Value>() {
            Some(v) => self.serialize(encoder, v),
            None => Err(Error::invalid_data(format!(
                "Serializer for '{}' cannot write a value of another type",
                Serializer::descriptor(self).serial_name()
            ))),
        }
    }

    fn deserialize_any(&self, decoder: &mut dyn Decoder) -> Result<Box<dyn Any>, Error> {
        Ok(Box::new(self.deserialize(decoder)?))
    }
}

/// Two registrations are interchangeable when they are the same serializer
/// type producing equal descriptors.
pub fn same_serializer(a: &dyn AnySerializer, b: &dyn AnySerializer) -> bool {
    a.serializer_type_id() == b.serializer_type_id() && a.erased_descriptor() == b.erased_descriptor()
}
