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

use std::sync::OnceLock;

use crate::descriptor::{PrimitiveKind, SerialDescriptor};
use crate::encoding::{Decoder, Encoder};
use crate::error::Error;
use crate::serializer::{Serializable, Serializer};

macro_rules! impl_primitive_serializer {
    ($ser:ident, $ty:ty, $name:literal, $kind:expr, $encode:ident, $decode:ident) => {
        #[doc = concat!("Serializer for `", stringify!($ty), "`.")]
        #[derive(Clone, Copy, Debug, Default)]
        pub struct $ser;

        impl Serializer for $ser {
            type Value = $ty;

            fn descriptor(&self) -> SerialDescriptor {
                static DESCRIPTOR: OnceLock<SerialDescriptor> = OnceLock::new();
                DESCRIPTOR
                    .get_or_init(|| SerialDescriptor::primitive($name, $kind))
                    .clone()
            }

            #[inline(always)]
            fn serialize(&self, encoder: &mut dyn Encoder, value: &$ty) -> Result<(), Error> {
                encoder.$encode(*value)
            }

            #[inline(always)]
            fn deserialize(&self, decoder: &mut dyn Decoder) -> Result<$ty, Error> {
                decoder.$decode()
            }
        }

        impl Serializable for $ty {
            type Serializer = $ser;

            #[inline(always)]
            fn serializer() -> $ser {
                $ser
            }
        }
    };
}

// Unsigned types travel as the next wider signed kind, so every format sees
// a value it can represent without a sign flip.
macro_rules! impl_unsigned_serializer {
    ($ser:ident, $ty:ty, $name:literal, $kind:expr, $wide:ty, $encode:ident, $decode:ident) => {
        #[doc = concat!("Serializer for `", stringify!($ty), "`.")]
        #[derive(Clone, Copy, Debug, Default)]
        pub struct $ser;

        impl Serializer for $ser {
            type Value = $ty;

            fn descriptor(&self) -> SerialDescriptor {
                static DESCRIPTOR: OnceLock<SerialDescriptor> = OnceLock::new();
                DESCRIPTOR
                    .get_or_init(|| SerialDescriptor::primitive($name, $kind))
                    .clone()
            }

            #[inline(always)]
            fn serialize(&self, encoder: &mut dyn Encoder, value: &$ty) -> Result<(), Error> {
                encoder.$encode(<$wide>::from(*value))
            }

            fn deserialize(&self, decoder: &mut dyn Decoder) -> Result<$ty, Error> {
                let wide = decoder.$decode()?;
                <$ty>::try_from(wide).map_err(|_| {
                    Error::invalid_data(format!("{} is out of range for {}", wide, $name))
                })
            }
        }

        impl Serializable for $ty {
            type Serializer = $ser;

            #[inline(always)]
            fn serializer() -> $ser {
                $ser
            }
        }
    };
}

impl_primitive_serializer!(BoolSerializer, bool, "bool", PrimitiveKind::Boolean, encode_bool, decode_bool);
impl_primitive_serializer!(I8Serializer, i8, "i8", PrimitiveKind::Byte, encode_i8, decode_i8);
impl_primitive_serializer!(I16Serializer, i16, "i16", PrimitiveKind::Short, encode_i16, decode_i16);
impl_primitive_serializer!(I32Serializer, i32, "i32", PrimitiveKind::Int, encode_i32, decode_i32);
impl_primitive_serializer!(I64Serializer, i64, "i64", PrimitiveKind::Long, encode_i64, decode_i64);
impl_primitive_serializer!(U64Serializer, u64, "u64", PrimitiveKind::Long, encode_u64, decode_u64);
impl_primitive_serializer!(F32Serializer, f32, "f32", PrimitiveKind::Float, encode_f32, decode_f32);
impl_primitive_serializer!(F64Serializer, f64, "f64", PrimitiveKind::Double, encode_f64, decode_f64);
impl_primitive_serializer!(CharSerializer, char, "char", PrimitiveKind::Char, encode_char, decode_char);

impl_unsigned_serializer!(U8Serializer, u8, "u8", PrimitiveKind::Short, i16, encode_i16, decode_i16);
impl_unsigned_serializer!(U16Serializer, u16, "u16", PrimitiveKind::Int, i32, encode_i32, decode_i32);
impl_unsigned_serializer!(U32Serializer, u32, "u32", PrimitiveKind::Long, i64, encode_i64, decode_i64);

/// Serializer for `String`.
#[derive(Clone, Copy, Debug, Default)]
pub struct StringSerializer;

impl Serializer for StringSerializer {
    type Value = String;

    fn descriptor(&self) -> SerialDescriptor {
        static DESCRIPTOR: OnceLock<SerialDescriptor> = OnceLock::new();
        DESCRIPTOR
            .get_or_init(|| SerialDescriptor::primitive("String", PrimitiveKind::String))
            .clone()
    }

    #[inline(always)]
    fn serialize(&self, encoder: &mut dyn Encoder, value: &String) -> Result<(), Error> {
        encoder.encode_str(value)
    }

    #[inline(always)]
    fn deserialize(&self, decoder: &mut dyn Decoder) -> Result<String, Error> {
        decoder.decode_string()
    }
}

impl Serializable for String {
    type Serializer = StringSerializer;

    fn serializer() -> StringSerializer {
        StringSerializer
    }
}
