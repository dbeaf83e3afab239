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

use super::ElementIndex;
use crate::descriptor::SerialDescriptor;
use crate::error::Error;
use crate::module::SerializersModule;
use crate::serializer::Serializer;

/// Callback that reads one element through the element-level decoder.
pub type DecoderFn<'f> = dyn FnMut(&mut dyn Decoder) -> Result<(), Error> + 'f;

/// Callback used by [`Decoder::decode_inline_polymorphic`]: receives the
/// discriminator (if the input carried one) and a decoder positioned on the
/// delegate's value.
pub type PolymorphicFn<'f> = dyn FnMut(Option<&str>, &mut dyn Decoder) -> Result<(), Error> + 'f;

/// Value-level reader, the mirror of [`Encoder`](super::Encoder).
pub trait Decoder {
    fn serializers_module(&self) -> &SerializersModule;

    /// `false` when the next value is null. Must be asked before decoding a
    /// nullable value.
    fn decode_not_null_mark(&mut self) -> Result<bool, Error>;
    fn decode_null(&mut self) -> Result<(), Error>;

    fn decode_bool(&mut self) -> Result<bool, Error>;
    fn decode_i8(&mut self) -> Result<i8, Error>;
    fn decode_i16(&mut self) -> Result<i16, Error>;
    fn decode_i32(&mut self) -> Result<i32, Error>;
    fn decode_i64(&mut self) -> Result<i64, Error>;
    fn decode_f32(&mut self) -> Result<f32, Error>;
    fn decode_f64(&mut self) -> Result<f64, Error>;
    fn decode_char(&mut self) -> Result<char, Error>;
    fn decode_string(&mut self) -> Result<String, Error>;

    /// Mirror of [`Encoder::encode_u64`](super::Encoder::encode_u64).
    fn decode_u64(&mut self) -> Result<u64, Error> {
        Ok(self.decode_i64()? as u64)
    }

    /// Returns the ordinal of the decoded enum constant.
    fn decode_enum(&mut self, descriptor: &SerialDescriptor) -> Result<usize, Error>;

    fn begin_structure(
        &mut self,
        descriptor: &SerialDescriptor,
    ) -> Result<Box<dyn CompositeDecoder + '_>, Error>;

    /// Hook for formats that carry the discriminator inside the delegate's
    /// structure.
    ///
    /// A format that handles it locates the discriminator, calls `f` once with
    /// it and a decoder for the delegate value, and returns `true`. The
    /// default returns `false`, and the caller falls back to the structured
    /// two-element form.
    fn decode_inline_polymorphic(
        &mut self,
        base: &SerialDescriptor,
        f: &mut PolymorphicFn<'_>,
    ) -> Result<bool, Error> {
        let _ = (base, f);
        Ok(false)
    }
}

macro_rules! decode_element_defaults {
    ($(($name:ident, $ty:ty, $decode:ident, $init:expr)),* $(,)?) => {
        paste::paste! {
            $(
                fn [<decode_ $name _element>](
                    &mut self,
                    descriptor: &SerialDescriptor,
                    index: usize,
                ) -> Result<$ty, Error> {
                    let mut out: $ty = $init;
                    self.decode_element(descriptor, index, &mut |d| {
                        out = d.$decode()?;
                        Ok(())
                    })?;
                    Ok(out)
                }
            )*
        }
    };
}

/// Reader for the elements of one open structure.
pub trait CompositeDecoder {
    /// Next element to decode, or [`ElementIndex::Done`].
    ///
    /// Every present element is reported once. Absent elements are simply
    /// never reported; the deserializer defaults them or fails with
    /// [`Error::MissingField`].
    fn decode_element_index(&mut self, descriptor: &SerialDescriptor) -> Result<ElementIndex, Error>;

    /// `true` when every element is present and in declaration order, so the
    /// caller may read indices `0..n` without asking for each one.
    fn decode_sequentially(&self) -> bool {
        false
    }

    /// Element count of a collection when the format knows it up front.
    fn decode_collection_size(&mut self, descriptor: &SerialDescriptor) -> Result<Option<usize>, Error> {
        let _ = descriptor;
        Ok(None)
    }

    /// Positions the input on element `index` and lets `f` read its value.
    fn decode_element(
        &mut self,
        descriptor: &SerialDescriptor,
        index: usize,
        f: &mut DecoderFn<'_>,
    ) -> Result<(), Error>;

    decode_element_defaults!(
        (bool, bool, decode_bool, false),
        (i8, i8, decode_i8, 0),
        (i16, i16, decode_i16, 0),
        (i32, i32, decode_i32, 0),
        (i64, i64, decode_i64, 0),
        (u64, u64, decode_u64, 0),
        (f32, f32, decode_f32, 0.0),
        (f64, f64, decode_f64, 0.0),
        (char, char, decode_char, '\0'),
        (string, String, decode_string, String::new()),
    );

    /// Closes the structure. Called exactly once per `begin_structure`.
    fn end_structure(&mut self, descriptor: &SerialDescriptor) -> Result<(), Error>;
}

impl<'a> dyn Decoder + 'a {
    pub fn decode_serializable_value<S>(&mut self, serializer: &S) -> Result<S::Value, Error>
    where
        S: Serializer + ?Sized,
    {
        serializer.deserialize(self)
    }

    pub fn decode_nullable_serializable_value<S>(&mut self, serializer: &S) -> Result<Option<S::Value>, Error>
    where
        S: Serializer + ?Sized,
    {
        if self.decode_not_null_mark()? {
            serializer.deserialize(self).map(Some)
        } else {
            self.decode_null()?;
            Ok(None)
        }
    }

    /// Opens a structure, runs `f` on it and closes it on every path.
    ///
    /// If `f` fails, its error is returned and any error from closing the
    /// half-read structure is discarded.
    pub fn decode_structure<R, F>(&mut self, descriptor: &SerialDescriptor, f: F) -> Result<R, Error>
    where
        F: FnOnce(&mut dyn CompositeDecoder) -> Result<R, Error>,
    {
        let mut composite = self.begin_structure(descriptor)?;
        let result = f(&mut *composite);
        let end = composite.end_structure(descriptor);
        let value = result?;
        end?;
        Ok(value)
    }
}

impl<'a> dyn CompositeDecoder + 'a {
    pub fn decode_serializable_element<S>(
        &mut self,
        descriptor: &SerialDescriptor,
        index: usize,
        serializer: &S,
    ) -> Result<S::Value, Error>
    where
        S: Serializer + ?Sized,
    {
        let mut out = None;
        self.decode_element(descriptor, index, &mut |d| {
            out = Some(serializer.deserialize(d)?);
            Ok(())
        })?;
        out.ok_or_else(|| element_not_read(descriptor, index))
    }

    pub fn decode_nullable_serializable_element<S>(
        &mut self,
        descriptor: &SerialDescriptor,
        index: usize,
        serializer: &S,
    ) -> Result<Option<S::Value>, Error>
    where
        S: Serializer + ?Sized,
    {
        let mut out = None;
        self.decode_element(descriptor, index, &mut |d| {
            out = Some(d.decode_nullable_serializable_value(serializer)?);
            Ok(())
        })?;
        out.ok_or_else(|| element_not_read(descriptor, index))
    }
}

#[cold]
fn element_not_read(descriptor: &SerialDescriptor, index: usize) -> Error {
    Error::invalid_data(format!(
        "Element '{}' of '{}' was positioned but never read",
        descriptor.element_name(index),
        descriptor.serial_name()
    ))
}
