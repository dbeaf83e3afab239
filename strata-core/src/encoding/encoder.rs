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
use crate::error::Error;
use crate::module::SerializersModule;
use crate::serializer::Serializer;

/// Callback that writes one element through the element-level encoder.
pub type EncoderFn<'f> = dyn FnMut(&mut dyn Encoder) -> Result<(), Error> + 'f;

/// Value-level writer.
///
/// One encoder writes exactly one value: a primitive, a null, an enum, or a
/// structure opened with [`begin_structure`](Encoder::begin_structure).
pub trait Encoder {
    fn serializers_module(&self) -> &SerializersModule;

    fn encode_bool(&mut self, value: bool) -> Result<(), Error>;
    fn encode_i8(&mut self, value: i8) -> Result<(), Error>;
    fn encode_i16(&mut self, value: i16) -> Result<(), Error>;
    fn encode_i32(&mut self, value: i32) -> Result<(), Error>;
    fn encode_i64(&mut self, value: i64) -> Result<(), Error>;
    fn encode_f32(&mut self, value: f32) -> Result<(), Error>;
    fn encode_f64(&mut self, value: f64) -> Result<(), Error>;
    fn encode_char(&mut self, value: char) -> Result<(), Error>;
    fn encode_str(&mut self, value: &str) -> Result<(), Error>;

    /// Unsigned 64-bit value. Defaults to the two's-complement `i64` with the
    /// same bits; text formats override it to keep large values readable.
    fn encode_u64(&mut self, value: u64) -> Result<(), Error> {
        self.encode_i64(value as i64)
    }

    fn encode_null(&mut self) -> Result<(), Error>;

    /// Called before a present value of a nullable type.
    fn encode_not_null_mark(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn encode_enum(&mut self, descriptor: &SerialDescriptor, ordinal: usize) -> Result<(), Error>;

    fn begin_structure(
        &mut self,
        descriptor: &SerialDescriptor,
    ) -> Result<Box<dyn CompositeEncoder + '_>, Error>;

    /// Opens a list or map whose element count is known up front.
    fn begin_collection(
        &mut self,
        descriptor: &SerialDescriptor,
        size: usize,
    ) -> Result<Box<dyn CompositeEncoder + '_>, Error> {
        let _ = size;
        self.begin_structure(descriptor)
    }

    /// Hook for formats that store the polymorphic discriminator inside the
    /// delegate's own structure.
    ///
    /// Returning `true` means the format has recorded `serial_name` and the
    /// caller must now encode the value with its concrete serializer directly
    /// on this encoder. Returning `false` selects the structured form: a
    /// two-element structure of discriminator and value.
    fn encode_inline_discriminator(
        &mut self,
        base: &SerialDescriptor,
        serial_name: &str,
        actual: &SerialDescriptor,
    ) -> Result<bool, Error> {
        let _ = (base, serial_name, actual);
        Ok(false)
    }
}

macro_rules! encode_element_defaults {
    ($(($name:ident, $ty:ty)),* $(,)?) => {
        paste::paste! {
            $(
                fn [<encode_ $name _element>](
                    &mut self,
                    descriptor: &SerialDescriptor,
                    index: usize,
                    value: $ty,
                ) -> Result<(), Error> {
                    self.encode_element(descriptor, index, &mut |e| e.[<encode_ $name>](value))
                }
            )*
        }
    };
}

/// Writer for the elements of one open structure.
pub trait CompositeEncoder {
    /// Positions the output on element `index` and lets `f` write its value.
    fn encode_element(
        &mut self,
        descriptor: &SerialDescriptor,
        index: usize,
        f: &mut EncoderFn<'_>,
    ) -> Result<(), Error>;

    encode_element_defaults!(
        (bool, bool),
        (i8, i8),
        (i16, i16),
        (i32, i32),
        (i64, i64),
        (u64, u64),
        (f32, f32),
        (f64, f64),
        (char, char),
        (str, &str),
    );

    /// Writes an explicit null for a nullable element. Formats that encode
    /// null by omission override this to write nothing.
    fn encode_null_element(
        &mut self,
        descriptor: &SerialDescriptor,
        index: usize,
    ) -> Result<(), Error> {
        self.encode_element(descriptor, index, &mut |e| e.encode_null())
    }

    /// Whether an element holding its default value should still be written.
    fn should_encode_element_default(&self, descriptor: &SerialDescriptor, index: usize) -> bool {
        let _ = (descriptor, index);
        true
    }

    /// Closes the structure. Called exactly once per `begin_structure`.
    fn end_structure(&mut self, descriptor: &SerialDescriptor) -> Result<(), Error>;
}

impl<'a> dyn Encoder + 'a {
    pub fn encode_serializable_value<S>(&mut self, serializer: &S, value: &S::Value) -> Result<(), Error>
    where
        S: Serializer + ?Sized,
    {
        serializer.serialize(self, value)
    }

    pub fn encode_nullable_serializable_value<S>(
        &mut self,
        serializer: &S,
        value: Option<&S::Value>,
    ) -> Result<(), Error>
    where
        S: Serializer + ?Sized,
    {
        match value {
            Some(v) => {
                self.encode_not_null_mark()?;
                serializer.serialize(self, v)
            }
            None => self.encode_null(),
        }
    }

    /// Opens a structure, runs `f` on it and closes it on every path.
    ///
    /// If `f` fails, its error is returned even when closing also fails.
    pub fn encode_structure<R, F>(&mut self, descriptor: &SerialDescriptor, f: F) -> Result<R, Error>
    where
        F: FnOnce(&mut dyn CompositeEncoder) -> Result<R, Error>,
    {
        let mut composite = self.begin_structure(descriptor)?;
        finish_encode(&mut *composite, descriptor, f)
    }

    /// Like [`encode_structure`](Self::encode_structure) for collections of a known size.
    pub fn encode_collection<R, F>(
        &mut self,
        descriptor: &SerialDescriptor,
        size: usize,
        f: F,
    ) -> Result<R, Error>
    where
        F: FnOnce(&mut dyn CompositeEncoder) -> Result<R, Error>,
    {
        let mut composite = self.begin_collection(descriptor, size)?;
        finish_encode(&mut *composite, descriptor, f)
    }
}

fn finish_encode<R, F>(
    composite: &mut dyn CompositeEncoder,
    descriptor: &SerialDescriptor,
    f: F,
) -> Result<R, Error>
where
    F: FnOnce(&mut dyn CompositeEncoder) -> Result<R, Error>,
{
    let result = f(&mut *composite);
    let end = composite.end_structure(descriptor);
    let value = result?;
    end?;
    Ok(value)
}

impl<'a> dyn CompositeEncoder + 'a {
    pub fn encode_serializable_element<S>(
        &mut self,
        descriptor: &SerialDescriptor,
        index: usize,
        serializer: &S,
        value: &S::Value,
    ) -> Result<(), Error>
    where
        S: Serializer + ?Sized,
    {
        self.encode_element(descriptor, index, &mut |e| serializer.serialize(e, value))
    }

    /// Writes a nullable element. `None` goes through
    /// [`encode_null_element`](CompositeEncoder::encode_null_element) so the
    /// format can choose between an explicit null and omission.
    pub fn encode_nullable_serializable_element<S>(
        &mut self,
        descriptor: &SerialDescriptor,
        index: usize,
        serializer: &S,
        value: Option<&S::Value>,
    ) -> Result<(), Error>
    where
        S: Serializer + ?Sized,
    {
        match value {
            Some(v) => self.encode_element(descriptor, index, &mut |e| {
                e.encode_not_null_mark()?;
                serializer.serialize(e, v)
            }),
            None => self.encode_null_element(descriptor, index),
        }
    }
}
