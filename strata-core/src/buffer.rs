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

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::error::Error;
use crate::varint::{zigzag_decode32, zigzag_decode64, zigzag_encode32, zigzag_encode64};

/// Growable output buffer for binary formats.
///
/// Plain `write_*` methods are big-endian, `write_*_le` are little-endian
/// (protobuf fixed32/fixed64).
#[derive(Default, Debug, Clone)]
pub struct Writer {
    pub(crate) bf: Vec<u8>,
}

impl Writer {
    pub fn new() -> Writer {
        Writer::default()
    }

    pub fn with_capacity(capacity: usize) -> Writer {
        Writer {
            bf: Vec::with_capacity(capacity),
        }
    }

    pub fn reset(&mut self) {
        // keep capacity and reset len to 0
        self.bf.clear();
    }

    pub fn dump(&self) -> Vec<u8> {
        self.bf.clone()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.bf
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bf
    }

    pub fn len(&self) -> usize {
        self.bf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bf.is_empty()
    }

    pub fn reserve(&mut self, additional: usize) {
        self.bf.reserve(additional);
    }

    pub fn write_bytes(&mut self, v: &[u8]) -> usize {
        self.bf.extend_from_slice(v);
        v.len()
    }

    #[inline(always)]
    pub fn write_u8(&mut self, value: u8) {
        self.bf.push(value);
    }

    #[inline(always)]
    pub fn write_i8(&mut self, value: i8) {
        self.bf.push(value as u8);
    }

    pub fn write_u16(&mut self, value: u16) {
        let mut b = [0u8; 2];
        BigEndian::write_u16(&mut b, value);
        self.bf.extend_from_slice(&b);
    }

    pub fn write_i16(&mut self, value: i16) {
        self.write_u16(value as u16);
    }

    pub fn write_u32(&mut self, value: u32) {
        let mut b = [0u8; 4];
        BigEndian::write_u32(&mut b, value);
        self.bf.extend_from_slice(&b);
    }

    pub fn write_i32(&mut self, value: i32) {
        self.write_u32(value as u32);
    }

    pub fn write_u64(&mut self, value: u64) {
        let mut b = [0u8; 8];
        BigEndian::write_u64(&mut b, value);
        self.bf.extend_from_slice(&b);
    }

    pub fn write_i64(&mut self, value: i64) {
        self.write_u64(value as u64);
    }

    /// Writes the raw IEEE-754 bits, so NaN payloads and signed zero survive.
    pub fn write_f32(&mut self, value: f32) {
        self.write_u32(value.to_bits());
    }

    pub fn write_f64(&mut self, value: f64) {
        self.write_u64(value.to_bits());
    }

    pub fn write_u32_le(&mut self, value: u32) {
        let mut b = [0u8; 4];
        LittleEndian::write_u32(&mut b, value);
        self.bf.extend_from_slice(&b);
    }

    pub fn write_u64_le(&mut self, value: u64) {
        let mut b = [0u8; 8];
        LittleEndian::write_u64(&mut b, value);
        self.bf.extend_from_slice(&b);
    }

    pub fn write_varint32(&mut self, value: i32) {
        self.write_varuint32(zigzag_encode32(value))
    }

    pub fn write_varuint32(&mut self, value: u32) {
        if value < 0x80 {
            self.write_u8(value as u8);
        } else if value < 0x4000 {
            // 2 bytes
            let u1 = ((value as u8) & 0x7F) | 0x80;
            let u2 = (value >> 7) as u8;
            self.bf.extend_from_slice(&[u1, u2]);
        } else if value < 0x200000 {
            // 3 bytes
            let u1 = ((value as u8) & 0x7F) | 0x80;
            let u2 = (((value >> 7) as u8) & 0x7F) | 0x80;
            let u3 = (value >> 14) as u8;
            self.bf.extend_from_slice(&[u1, u2, u3]);
        } else if value < 0x10000000 {
            // 4 bytes
            let u1 = ((value as u8) & 0x7F) | 0x80;
            let u2 = (((value >> 7) as u8) & 0x7F) | 0x80;
            let u3 = (((value >> 14) as u8) & 0x7F) | 0x80;
            let u4 = (value >> 21) as u8;
            self.bf.extend_from_slice(&[u1, u2, u3, u4]);
        } else {
            // 5 bytes
            let u1 = ((value as u8) & 0x7F) | 0x80;
            let u2 = (((value >> 7) as u8) & 0x7F) | 0x80;
            let u3 = (((value >> 14) as u8) & 0x7F) | 0x80;
            let u4 = (((value >> 21) as u8) & 0x7F) | 0x80;
            let u5 = (value >> 28) as u8;
            self.bf.extend_from_slice(&[u1, u2, u3, u4, u5]);
        }
    }

    pub fn write_varint64(&mut self, value: i64) {
        self.write_varuint64(zigzag_encode64(value))
    }

    pub fn write_varuint64(&mut self, mut value: u64) {
        if value < 0x80 {
            self.write_u8(value as u8);
            return;
        }
        let mut buf = [0u8; 10];
        let mut i = 0;
        while value >= 0x80 {
            buf[i] = (value as u8) | 0x80;
            value >>= 7;
            i += 1;
        }
        buf[i] = value as u8;
        self.bf.extend_from_slice(&buf[..=i]);
    }

    /// Writes `s` as a varint byte length followed by its UTF-8 bytes.
    pub fn write_utf8_string(&mut self, s: &str) {
        self.write_varuint32(s.len() as u32);
        self.bf.extend_from_slice(s.as_bytes());
    }
}

/// Bounds-checked cursor over a byte slice.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    bf: &'a [u8],
    cursor: usize,
    /// Absolute offset of `bf[0]` in the outermost input, for error messages.
    base: usize,
}

impl<'a> Reader<'a> {
    pub fn new(bf: &'a [u8]) -> Reader<'a> {
        Reader {
            bf,
            cursor: 0,
            base: 0,
        }
    }

    /// Creates a reader over a sub-slice that reports offsets relative to the
    /// outer input.
    pub fn nested(bf: &'a [u8], base: usize) -> Reader<'a> {
        Reader {
            bf,
            cursor: 0,
            base,
        }
    }

    pub fn get_cursor(&self) -> usize {
        self.cursor
    }

    /// Absolute position of the cursor in the outermost input.
    pub fn position(&self) -> usize {
        self.base + self.cursor
    }

    pub fn remaining(&self) -> usize {
        self.bf.len() - self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.cursor >= self.bf.len()
    }

    pub fn slice_after_cursor(&self) -> &'a [u8] {
        &self.bf[self.cursor..]
    }

    #[inline(always)]
    fn check(&self, n: usize) -> Result<(), Error> {
        if self.remaining() < n {
            return Err(Error::unexpected_eof(
                self.position(),
                n - self.remaining(),
            ));
        }
        Ok(())
    }

    pub fn peek_u8(&self) -> Result<u8, Error> {
        self.check(1)?;
        Ok(self.bf[self.cursor])
    }

    #[inline(always)]
    pub fn read_u8(&mut self) -> Result<u8, Error> {
        self.check(1)?;
        let v = self.bf[self.cursor];
        self.cursor += 1;
        Ok(v)
    }

    pub fn read_i8(&mut self) -> Result<i8, Error> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_u16(&mut self) -> Result<u16, Error> {
        Ok(BigEndian::read_u16(self.read_bytes(2)?))
    }

    pub fn read_i16(&mut self) -> Result<i16, Error> {
        Ok(self.read_u16()? as i16)
    }

    pub fn read_u32(&mut self) -> Result<u32, Error> {
        Ok(BigEndian::read_u32(self.read_bytes(4)?))
    }

    pub fn read_i32(&mut self) -> Result<i32, Error> {
        Ok(self.read_u32()? as i32)
    }

    pub fn read_u64(&mut self) -> Result<u64, Error> {
        Ok(BigEndian::read_u64(self.read_bytes(8)?))
    }

    pub fn read_i64(&mut self) -> Result<i64, Error> {
        Ok(self.read_u64()? as i64)
    }

    pub fn read_f32(&mut self) -> Result<f32, Error> {
        Ok(f32::from_bits(self.read_u32()?))
    }

    pub fn read_f64(&mut self) -> Result<f64, Error> {
        Ok(f64::from_bits(self.read_u64()?))
    }

    pub fn read_u32_le(&mut self) -> Result<u32, Error> {
        Ok(LittleEndian::read_u32(self.read_bytes(4)?))
    }

    pub fn read_u64_le(&mut self) -> Result<u64, Error> {
        Ok(LittleEndian::read_u64(self.read_bytes(8)?))
    }

    pub fn read_varuint32(&mut self) -> Result<u32, Error> {
        let start = self.position();
        let b0 = self.read_u8()? as u32;
        if b0 < 0x80 {
            return Ok(b0);
        }
        let mut encoded = b0 & 0x7F;
        let b1 = self.read_u8()? as u32;
        encoded |= (b1 & 0x7F) << 7;
        if b1 < 0x80 {
            return Ok(encoded);
        }
        let b2 = self.read_u8()? as u32;
        encoded |= (b2 & 0x7F) << 14;
        if b2 < 0x80 {
            return Ok(encoded);
        }
        let b3 = self.read_u8()? as u32;
        encoded |= (b3 & 0x7F) << 21;
        if b3 < 0x80 {
            return Ok(encoded);
        }
        let b4 = self.read_u8()? as u32;
        if b4 >= 0x80 {
            return Err(Error::malformed_varint(start));
        }
        encoded |= b4 << 28;
        Ok(encoded)
    }

    pub fn read_varint32(&mut self) -> Result<i32, Error> {
        Ok(zigzag_decode32(self.read_varuint32()?))
    }

    pub fn read_varuint64(&mut self) -> Result<u64, Error> {
        let start = self.position();
        let mut result = 0u64;
        for i in 0..10 {
            let b = self.read_u8()?;
            result |= ((b & 0x7F) as u64) << (7 * i);
            if b < 0x80 {
                if i == 9 && b > 1 {
                    return Err(Error::malformed_varint(start));
                }
                return Ok(result);
            }
        }
        Err(Error::malformed_varint(start))
    }

    pub fn read_varint64(&mut self) -> Result<i64, Error> {
        Ok(zigzag_decode64(self.read_varuint64()?))
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], Error> {
        self.check(len)?;
        let s = &self.bf[self.cursor..self.cursor + len];
        self.cursor += len;
        Ok(s)
    }

    pub fn skip(&mut self, len: usize) -> Result<(), Error> {
        self.check(len)?;
        self.cursor += len;
        Ok(())
    }

    /// Reads a varint length followed by that many UTF-8 bytes.
    pub fn read_utf8_string(&mut self) -> Result<String, Error> {
        let len = self.read_varuint32()? as usize;
        let start = self.position();
        let bytes = self.read_bytes(len)?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|e| Error::invalid_data(format!("Invalid UTF-8 at offset {start}: {e}")))
    }
}
