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


use proptest::prelude::*;
use strata::{Reader, Writer};
use strata_core::error::Error;
use strata_core::varint::{varint_len, zigzag_decode64, zigzag_encode64};

#[test]
fn test_varint32() {
    let test_data: Vec<i32> = vec![
        // 1 byte(0..127)
        0,
        1,
        127,
        // 2 byte(128..16_383)
        128,
        300,
        16_383,
        // 3 byte(16_384..2_097_151)
        16_384,
        2_097_151,
        // 4 byte(2_097_152..268_435_455)
        2_097_152,
        268_435_455,
        // 5 byte(268_435_456..i32::MAX)
        268_435_456,
        i32::MAX,
    ];
    for &data in &test_data {
        let mut writer = Writer::default();
        writer.write_varuint32(data as u32);
        assert_eq!(writer.len(), varint_len(data as u64));
        let mut reader = Reader::new(writer.as_slice());
        assert_eq!(reader.read_varuint32().unwrap(), data as u32);
        assert!(reader.is_empty());
    }
    for &data in &test_data {
        let mut writer = Writer::default();
        writer.write_varint32(-data);
        let mut reader = Reader::new(writer.as_slice());
        assert_eq!(reader.read_varint32().unwrap(), -data);
    }
}

#[test]
fn test_varint64_edges() {
    let mut writer = Writer::new();
    writer.write_varuint64(u64::MAX);
    assert_eq!(writer.as_slice(), &[0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x01]);
    writer.write_varint64(i64::MIN);
    let mut reader = Reader::new(writer.as_slice());
    assert_eq!(reader.read_varuint64().unwrap(), u64::MAX);
    assert_eq!(reader.read_varint64().unwrap(), i64::MIN);

    assert_eq!(zigzag_encode64(-1), 1);
    assert_eq!(zigzag_encode64(1), 2);
    assert_eq!(zigzag_decode64(3), -2);
}

#[test]
fn test_malformed_varints() {
    // continuation bit on the tenth byte
    let eleven = [0xff; 11];
    let err = Reader::new(&eleven).read_varuint64().unwrap_err();
    assert!(matches!(err, Error::MalformedVarint(0)), "{err}");
    // tenth byte carrying more than one bit
    let mut overflow = [0xff; 10];
    overflow[9] = 0x02;
    assert!(Reader::new(&overflow).read_varuint64().is_err());

    let err = Reader::new(&[0x80, 0x80]).read_varuint32().unwrap_err();
    assert!(matches!(err, Error::UnexpectedEof { offset: 2, .. }), "{err}");
}

#[test]
fn test_fixed_width_order() {
    let mut writer = Writer::new();
    writer.write_u32(0x0102_0304);
    writer.write_u32_le(0x0102_0304);
    writer.write_f64(1.5);
    assert_eq!(&writer.as_slice()[..8], &[1, 2, 3, 4, 4, 3, 2, 1]);
    let mut reader = Reader::new(writer.as_slice());
    assert_eq!(reader.read_u32().unwrap(), 0x0102_0304);
    assert_eq!(reader.read_u32_le().unwrap(), 0x0102_0304);
    assert_eq!(reader.read_f64().unwrap(), 1.5);
    assert!(matches!(reader.read_u8(), Err(Error::UnexpectedEof { offset: 16, needed: 1 })));
}

#[test]
fn test_nested_reader_offsets() {
    let outer = [0u8, 0, 0, 0x61, 0x62];
    let mut nested = Reader::nested(&outer[3..], 3);
    assert_eq!(nested.position(), 3);
    assert_eq!(nested.read_bytes(2).unwrap(), b"ab");
    assert_eq!(nested.get_cursor(), 2);
    let err = nested.read_u8().unwrap_err();
    assert!(matches!(err, Error::UnexpectedEof { offset: 5, .. }), "{err}");
}

#[test]
fn test_utf8_strings() {
    let mut writer = Writer::new();
    writer.write_utf8_string("héllo");
    assert_eq!(writer.as_slice()[0], 6);
    let mut reader = Reader::new(writer.as_slice());
    assert_eq!(reader.read_utf8_string().unwrap(), "héllo");

    let err = Reader::new(&[0x02, 0xc3, 0x28]).read_utf8_string().unwrap_err();
    assert!(err.is_malformed_data(), "{err}");
}

#[test]
fn test_float_bits_round_trip() {
    let singles = [0x7f80_0001u32, 0x7fc0_0000, 0xffc1_2345, 0, 0x8000_0000, 0x7f80_0000, 0xff80_0000];
    let doubles = [
        0x7ff0_0000_0000_0001u64,
        0x7ff8_0000_0000_0000,
        0xfff8_1234_5678_9abc,
        0,
        0x8000_0000_0000_0000,
        0x7ff0_0000_0000_0000,
        0xfff0_0000_0000_0000,
    ];
    let mut writer = Writer::new();
    for bits in singles {
        writer.write_f32(f32::from_bits(bits));
        writer.write_u32_le(f32::from_bits(bits).to_bits());
    }
    for bits in doubles {
        writer.write_f64(f64::from_bits(bits));
        writer.write_u64_le(f64::from_bits(bits).to_bits());
    }
    assert_eq!(writer.len(), singles.len() * 8 + doubles.len() * 16);

    let mut reader = Reader::new(writer.as_slice());
    for bits in singles {
        assert_eq!(reader.read_f32().unwrap().to_bits(), bits, "{bits:#x}");
        assert_eq!(reader.read_u32_le().unwrap(), bits, "{bits:#x}");
    }
    for bits in doubles {
        assert_eq!(reader.read_f64().unwrap().to_bits(), bits, "{bits:#x}");
        assert_eq!(reader.read_u64_le().unwrap(), bits, "{bits:#x}");
    }
}

proptest! {
    #[test]
    fn varuint64_round_trips(value in any::<u64>()) {
        let mut writer = Writer::new();
        writer.write_varuint64(value);
        prop_assert_eq!(writer.len(), varint_len(value));
        let mut reader = Reader::new(writer.as_slice());
        prop_assert_eq!(reader.read_varuint64().unwrap(), value);
    }

    #[test]
    fn zigzag_keeps_small_magnitudes_short(value in -64i64..64) {
        prop_assert_eq!(varint_len(zigzag_encode64(value)), 1);
        prop_assert_eq!(zigzag_decode64(zigzag_encode64(value)), value);
    }

    #[test]
    fn truncated_varints_never_panic(bytes in proptest::collection::vec(any::<u8>(), 0..12)) {
        let mut reader = Reader::new(&bytes);
        if let Err(e) = reader.read_varuint64() {
            prop_assert!(e.is_malformed_data());
        }
    }

    #[test]
    fn f32_bits_survive(bits in any::<u32>()) {
        let mut writer = Writer::new();
        writer.write_f32(f32::from_bits(bits));
        prop_assert_eq!(Reader::new(writer.as_slice()).read_f32().unwrap().to_bits(), bits);
    }

    #[test]
    fn f64_bits_survive(bits in any::<u64>()) {
        let mut writer = Writer::new();
        writer.write_f64(f64::from_bits(bits));
        prop_assert_eq!(Reader::new(writer.as_slice()).read_f64().unwrap().to_bits(), bits);
    }
}
