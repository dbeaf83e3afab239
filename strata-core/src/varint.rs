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

//! LEB128 varints and zig-zag mapping.
//!
//! Slice-based encoding lives on [`Writer`](crate::buffer::Writer) and
//! [`Reader`](crate::buffer::Reader); this module holds the width constants,
//! the zig-zag functions and the `std::io::Read` variant used by stream
//! framing.

use std::io::{ErrorKind, Read};

use crate::error::Error;

/// Maximum encoded width of a 32-bit varint.
pub const MAX_VARINT32_BYTES: usize = 5;
/// Maximum encoded width of a 64-bit varint.
pub const MAX_VARINT64_BYTES: usize = 10;

#[inline(always)]
pub const fn zigzag_encode32(value: i32) -> u32 {
    ((value << 1) ^ (value >> 31)) as u32
}

#[inline(always)]
pub const fn zigzag_decode32(value: u32) -> i32 {
    ((value >> 1) as i32) ^ -((value & 1) as i32)
}

#[inline(always)]
pub const fn zigzag_encode64(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

#[inline(always)]
pub const fn zigzag_decode64(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

/// Number of bytes `value` occupies as a varint.
#[inline]
pub const fn varint_len(value: u64) -> usize {
    let bits = 64 - (value | 1).leading_zeros() as usize;
    (bits + 6) / 7
}

/// Outcome of reading a varint from a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamVarint {
    Value(u64),
    /// The stream ended before the first byte.
    Eof,
    /// The stream ended after `n` bytes of an unfinished varint.
    Truncated(usize),
}

/// Reads an unsigned 64-bit varint byte by byte from `reader`.
///
/// A clean end of stream before the first byte is reported as
/// [`StreamVarint::Eof`] so callers can tell it apart from truncation.
pub fn read_varint64_from<R: Read + ?Sized>(reader: &mut R) -> Result<StreamVarint, Error> {
    let mut result = 0u64;
    let mut byte = [0u8; 1];
    for i in 0..MAX_VARINT64_BYTES {
        loop {
            match reader.read(&mut byte) {
                Ok(0) if i == 0 => return Ok(StreamVarint::Eof),
                Ok(0) => return Ok(StreamVarint::Truncated(i)),
                Ok(_) => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        let b = byte[0];
        result |= ((b & 0x7F) as u64) << (7 * i);
        if b < 0x80 {
            if i == MAX_VARINT64_BYTES - 1 && b > 1 {
                return Err(Error::malformed_varint(i));
            }
            return Ok(StreamVarint::Value(result));
        }
    }
    Err(Error::malformed_varint(MAX_VARINT64_BYTES))
}
