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


//! CBOR (RFC 7049) subset.
//!
//! Classes are indefinite-length maps keyed by element name; lists and
//! polymorphic values are indefinite-length arrays. Decoding also accepts
//! definite-length arrays and maps, and half-precision floats.
//!
//! ```
//! use strata_core::format::cbor::Cbor;
//! use strata_core::format::BinaryFormat;
//!
//! let cbor = Cbor::default();
//! let bytes = cbor.encode(&vec![1i32, -1]).unwrap();
//! assert_eq!(bytes, [0x9f, 0x01, 0x20, 0xff]);
//! assert_eq!(cbor.decode::<Vec<i32>>(&[0x82, 0x01, 0x20]).unwrap(), vec![1, -1]);
//! ```

mod decoder;
mod encoder;

use std::sync::Arc;

use crate::buffer::{Reader, Writer};
use crate::config::{Config, UnknownKeys};
use crate::error::Error;
use crate::format::BinaryFormat;
use crate::module::SerializersModule;
use crate::serializer::Serializer;
use decoder::CborDecoder;
use encoder::CborEncoder;

pub(crate) const MAJOR_UNSIGNED: u8 = 0x00;
pub(crate) const MAJOR_NEGATIVE: u8 = 0x20;
pub(crate) const MAJOR_BYTES: u8 = 0x40;
pub(crate) const MAJOR_TEXT: u8 = 0x60;
pub(crate) const MAJOR_ARRAY: u8 = 0x80;
pub(crate) const MAJOR_MAP: u8 = 0xa0;
pub(crate) const MAJOR_TAG: u8 = 0xc0;
pub(crate) const MAJOR_SIMPLE: u8 = 0xe0;

pub(crate) const BEGIN_ARRAY: u8 = 0x9f;
pub(crate) const BEGIN_MAP: u8 = 0xbf;
pub(crate) const BREAK: u8 = 0xff;
pub(crate) const FALSE: u8 = 0xf4;
pub(crate) const TRUE: u8 = 0xf5;
pub(crate) const NULL: u8 = 0xf6;
pub(crate) const UNDEFINED: u8 = 0xf7;
pub(crate) const HALF_FLOAT: u8 = 0xf9;
pub(crate) const SINGLE_FLOAT: u8 = 0xfa;
pub(crate) const DOUBLE_FLOAT: u8 = 0xfb;

/// Additional-information value marking an indefinite length.
pub(crate) const INDEFINITE: u8 = 31;

/// Writes a major type with its argument in the shortest form.
pub(crate) fn write_header(out: &mut Writer, major: u8, value: u64) {
    match value {
        0..=23 => out.write_u8(major | value as u8),
        24..=0xff => {
            out.write_u8(major | 24);
            out.write_u8(value as u8);
        }
        0x100..=0xffff => {
            out.write_u8(major | 25);
            out.write_u16(value as u16);
        }
        0x1_0000..=0xffff_ffff => {
            out.write_u8(major | 26);
            out.write_u32(value as u32);
        }
        _ => {
            out.write_u8(major | 27);
            out.write_u64(value);
        }
    }
}

/// Reads the argument that follows `initial`.
pub(crate) fn read_argument(reader: &mut Reader<'_>, initial: u8) -> Result<u64, Error> {
    match initial & 0x1f {
        n @ 0..=23 => Ok(n as u64),
        24 => Ok(reader.read_u8()? as u64),
        25 => Ok(reader.read_u16()? as u64),
        26 => Ok(reader.read_u32()? as u64),
        27 => reader.read_u64(),
        _ => Err(Error::cbor_decoding("a definite argument", initial)),
    }
}

/// Skips one complete data item of any major type.
pub(crate) fn skip_item(reader: &mut Reader<'_>) -> Result<(), Error> {
    let initial = reader.read_u8()?;
    let indefinite = initial & 0x1f == INDEFINITE;
    match initial & 0xe0 {
        MAJOR_UNSIGNED | MAJOR_NEGATIVE => {
            read_argument(reader, initial)?;
        }
        MAJOR_BYTES | MAJOR_TEXT if indefinite => {
            while reader.peek_u8()? != BREAK {
                skip_item(reader)?;
            }
            reader.read_u8()?;
        }
        MAJOR_BYTES | MAJOR_TEXT => {
            let len = read_argument(reader, initial)?;
            reader.skip(checked_len(reader, len, initial)?)?;
        }
        MAJOR_ARRAY | MAJOR_MAP if indefinite => {
            while reader.peek_u8()? != BREAK {
                skip_item(reader)?;
            }
            reader.read_u8()?;
        }
        major @ (MAJOR_ARRAY | MAJOR_MAP) => {
            let count = read_argument(reader, initial)?;
            let items = if major == MAJOR_MAP { count.saturating_mul(2) } else { count };
            for _ in 0..items {
                skip_item(reader)?;
            }
        }
        MAJOR_TAG => {
            read_argument(reader, initial)?;
            skip_item(reader)?;
        }
        MAJOR_SIMPLE => match initial & 0x1f {
            0..=23 => {}
            24 => reader.skip(1)?,
            25 => reader.skip(2)?,
            26 => reader.skip(4)?,
            27 => reader.skip(8)?,
            _ => return Err(Error::cbor_decoding("a data item", initial)),
        },
        _ => return Err(Error::cbor_decoding("a data item", initial)),
    }
    Ok(())
}

/// Converts a declared length to `usize`, rejecting lengths past the input.
pub(crate) fn checked_len(reader: &Reader<'_>, len: u64, initial: u8) -> Result<usize, Error> {
    match usize::try_from(len) {
        Ok(len) if len <= reader.remaining() => Ok(len),
        _ => Err(Error::cbor_decoding(
            format!("a length within the {} remaining bytes, not {len}", reader.remaining()),
            initial,
        )),
    }
}

pub(crate) fn half_to_f32(bits: u16) -> f32 {
    let sign = if bits & 0x8000 != 0 { -1.0 } else { 1.0 };
    let exponent = ((bits >> 10) & 0x1f) as i32;
    let mantissa = (bits & 0x3ff) as f32;
    match exponent {
        0 => sign * mantissa * 2f32.powi(-24),
        31 if mantissa == 0.0 => sign * f32::INFINITY,
        31 => f32::NAN,
        _ => sign * (1.0 + mantissa / 1024.0) * 2f32.powi(exponent - 15),
    }
}

#[derive(Clone)]
pub struct Cbor {
    config: Config,
    module: Arc<SerializersModule>,
}

impl Default for Cbor {
    fn default() -> Self {
        Cbor {
            config: Config::default(),
            module: SerializersModule::empty(),
        }
    }
}

impl Cbor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn with_module<M: Into<Arc<SerializersModule>>>(mut self, module: M) -> Self {
        self.module = module.into();
        self
    }

    pub fn ignore_unknown_keys(mut self, ignore: bool) -> Self {
        self.config.unknown_keys = if ignore {
            UnknownKeys::Ignore
        } else {
            UnknownKeys::Fail
        };
        self
    }

    pub fn omit_defaults(mut self, omit_defaults: bool) -> Self {
        self.config.omit_defaults = omit_defaults;
        self
    }

    /// When disabled, null class elements are left out of the map.
    pub fn explicit_nulls(mut self, explicit_nulls: bool) -> Self {
        self.config.explicit_nulls = explicit_nulls;
        self
    }

    pub fn max_message_size(mut self, limit: usize) -> Self {
        self.config.max_message_size = limit;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn serializers_module(&self) -> &SerializersModule {
        &self.module
    }
}

impl BinaryFormat for Cbor {
    fn config(&self) -> &Config {
        &self.config
    }

    fn serializers_module(&self) -> &SerializersModule {
        &self.module
    }

    fn encode_to_bytes<S>(&self, serializer: &S, value: &S::Value) -> Result<Vec<u8>, Error>
    where
        S: Serializer + ?Sized,
    {
        let mut out = Writer::new();
        serializer.serialize(&mut CborEncoder::new(self, &mut out), value)?;
        Ok(out.into_inner())
    }

    fn decode_from_bytes<S>(&self, serializer: &S, bytes: &[u8]) -> Result<S::Value, Error>
    where
        S: Serializer + ?Sized,
    {
        let mut reader = Reader::new(bytes);
        let value = serializer.deserialize(&mut CborDecoder::new(self, &mut reader))?;
        if !reader.is_empty() {
            return Err(Error::invalid_data(format!(
                "{} trailing bytes after the CBOR value at offset {}",
                reader.remaining(),
                reader.position()
            )));
        }
        Ok(value)
    }
}
