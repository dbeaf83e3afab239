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


mod test_helpers;

use std::collections::BTreeMap;

use strata::{BinaryFormat, Cbor, Error, PolymorphicSerializer};
use test_helpers::*;

fn text(s: &str) -> Vec<u8> {
    assert!(s.len() < 24);
    let mut out = vec![0x60 | s.len() as u8];
    out.extend_from_slice(s.as_bytes());
    out
}

#[test]
fn test_class_layout() {
    let cbor = Cbor::default();
    let bytes = cbor
        .encode_to_bytes(&RectSerializer, &Rect { width: 2, height: 3 })
        .unwrap();
    let mut expected = vec![0xbf];
    expected.extend(text("width"));
    expected.push(0x02);
    expected.extend(text("height"));
    expected.push(0x03);
    expected.push(0xff);
    assert_eq!(bytes, expected);

    // Definite-length maps decode the same.
    let mut definite = vec![0xa2];
    definite.extend(text("height"));
    definite.push(0x03);
    definite.extend(text("width"));
    definite.push(0x02);
    let back = cbor.decode_from_bytes(&RectSerializer, &definite).unwrap();
    assert_eq!(back, Rect { width: 2, height: 3 });
}

#[test]
fn test_class_round_trip() {
    let cbor = Cbor::default();
    let project = Project {
        name: "strata".to_string(),
        language: None,
        stars: -500,
        tags: vec!["x".to_string()],
    };
    let bytes = cbor.encode(&project).unwrap();
    assert_eq!(cbor.decode::<Project>(&bytes).unwrap(), project);

    let mut stars = text("stars");
    stars.extend_from_slice(&[0x39, 0x01, 0xf3]);
    assert!(bytes.windows(stars.len()).any(|w| w == stars.as_slice()));
}

#[test]
fn test_nulls() {
    let project = Project::new("x");
    let explicit = Cbor::default().encode(&project).unwrap();
    let mut language = text("language");
    language.push(0xf6);
    assert!(explicit.windows(language.len()).any(|w| w == language.as_slice()));

    let implicit = Cbor::default().explicit_nulls(false).encode(&project).unwrap();
    assert!(!implicit.windows(language.len()).any(|w| w == language.as_slice()));
    assert_eq!(Cbor::default().decode::<Project>(&implicit).unwrap(), project);
}

#[test]
fn test_numbers() {
    let cbor = Cbor::default();
    assert_eq!(cbor.encode(&-1i64).unwrap(), vec![0x20]);
    assert_eq!(cbor.encode(&23i32).unwrap(), vec![0x17]);
    assert_eq!(cbor.encode(&24i32).unwrap(), vec![0x18, 0x18]);
    assert_eq!(cbor.encode(&u64::MAX).unwrap(), vec![0x1b, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]);
    assert_eq!(
        cbor.encode(&1.5f64).unwrap(),
        vec![0xfb, 0x3f, 0xf8, 0, 0, 0, 0, 0, 0]
    );
    // Half, single and double precision all widen.
    assert_eq!(cbor.decode::<f32>(&[0xf9, 0x3c, 0x00]).unwrap(), 1.0);
    assert_eq!(cbor.decode::<f64>(&[0xfa, 0x3f, 0xc0, 0x00, 0x00]).unwrap(), 1.5);
    assert!(cbor.decode::<i8>(&[0x18, 0xc8]).is_err());
}

#[test]
fn test_maps_with_integer_keys() {
    let cbor = Cbor::default();
    let map = BTreeMap::from([(1i32, "a".to_string()), (-1, "b".to_string())]);
    let bytes = cbor.encode(&map).unwrap();
    assert_eq!(bytes, vec![0xbf, 0x20, 0x61, b'b', 0x01, 0x61, b'a', 0xff]);
    assert_eq!(cbor.decode::<BTreeMap<i32, String>>(&bytes).unwrap(), map);
    let definite = [0xa1, 0x01, 0x61, b'a'];
    let back = cbor.decode::<BTreeMap<i32, String>>(&definite).unwrap();
    assert_eq!(back.get(&1).map(String::as_str), Some("a"));
}

#[test]
fn test_unknown_keys() {
    let mut bytes = vec![0xbf];
    bytes.extend(text("width"));
    bytes.push(0x01);
    bytes.extend(text("depth"));
    bytes.extend_from_slice(&[0x82, 0x01, 0xbf, 0xff]);
    bytes.extend(text("height"));
    bytes.push(0x01);
    bytes.push(0xff);

    let err = Cbor::default()
        .decode_from_bytes(&RectSerializer, &bytes)
        .unwrap_err();
    assert!(matches!(err, Error::UnknownField { ref field, .. } if field == "depth"), "{err}");

    let ignoring = Cbor::default().ignore_unknown_keys(true);
    let rect = ignoring.decode_from_bytes(&RectSerializer, &bytes).unwrap();
    assert_eq!(rect, Rect { width: 1, height: 1 });
}

#[test]
fn test_polymorphic_array() {
    let cbor = Cbor::default().with_module(shapes_module());
    let shape = PolymorphicSerializer::<dyn Shape>::new();
    let value: Box<dyn Shape> = Box::new(Circle { radius: 0.5 });
    let bytes = cbor.encode_to_bytes(&shape, &value).unwrap();
    let mut expected = vec![0x9f];
    expected.extend(text("circle"));
    expected.push(0xbf);
    expected.extend(text("radius"));
    expected.extend_from_slice(&[0xfb, 0x3f, 0xe0, 0, 0, 0, 0, 0, 0]);
    expected.extend_from_slice(&[0xff, 0xff]);
    assert_eq!(bytes, expected);
    let back = cbor.decode_from_bytes(&shape, &bytes).unwrap();
    assert_eq!(as_circle(&*back), Some(&Circle { radius: 0.5 }));
}

#[test]
fn test_malformed_input() {
    let cbor = Cbor::default();
    for bytes in [
        &[0x9f, 0x01][..],
        &[0x82, 0x01][..],
        &[0x61][..],
        &[0x01, 0x02][..],
        &[0x41, 0x00][..],
    ] {
        let err = cbor.decode::<Vec<i32>>(bytes).unwrap_err();
        assert!(err.is_malformed_data(), "{bytes:?}: {err}");
    }
    let err = cbor.decode::<bool>(&[0xf6]).unwrap_err();
    assert_eq!(err.to_string(), "Expected a boolean, but found 0xf6");
}

#[test]
fn test_declared_length_beyond_input() {
    let cbor = Cbor::default();
    let huge_array = [0x9b, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff];
    let err = cbor.decode::<Vec<i32>>(&huge_array).unwrap_err();
    assert!(matches!(err, Error::CborDecoding { found: 0x9b, .. }), "{err}");

    // five entries need at least ten bytes
    let short_map = [0xa5, 0x01, 0x02];
    let err = cbor.decode::<BTreeMap<i32, i32>>(&short_map).unwrap_err();
    assert!(err.is_malformed_data(), "{err}");

    let err = cbor.decode::<Vec<i32>>(&[0x83, 0x01, 0x02]).unwrap_err();
    assert!(err.is_malformed_data(), "{err}");
}

#[test]
fn test_float_bits_round_trip() {
    let cbor = Cbor::default();
    for bits in [0x7f80_0001u32, 0x7fc0_0000, 0xffc1_2345, 0x0000_0000, 0x8000_0000, 0x7f80_0000, 0xff80_0000] {
        let value = f32::from_bits(bits);
        let bytes = cbor.encode(&value).unwrap();
        assert_eq!(bytes[0], 0xfa);
        let back: f32 = cbor.decode(&bytes).unwrap();
        assert_eq!(back.to_bits(), bits, "{bits:#x}");
    }
    for bits in [
        0x7ff0_0000_0000_0001u64,
        0x7ff8_0000_0000_0000,
        0xfff8_0000_dead_beef,
        0x0000_0000_0000_0000,
        0x8000_0000_0000_0000,
        0x7ff0_0000_0000_0000,
        0xfff0_0000_0000_0000,
    ] {
        let value = f64::from_bits(bits);
        let bytes = cbor.encode(&value).unwrap();
        assert_eq!(bytes[0], 0xfb);
        let back: f64 = cbor.decode(&bytes).unwrap();
        assert_eq!(back.to_bits(), bits, "{bits:#x}");
    }
    // half precision widens: -0.0 and +infinity
    assert_eq!(cbor.decode::<f32>(&[0xf9, 0x80, 0x00]).unwrap().to_bits(), 0x8000_0000);
    assert_eq!(cbor.decode::<f64>(&[0xf9, 0x7c, 0x00]).unwrap(), f64::INFINITY);
}

#[test]
fn test_skipping_simple_values() {
    let ignoring = Cbor::default().ignore_unknown_keys(true);
    let mut bytes = vec![0xbf];
    bytes.extend(text("width"));
    bytes.push(0x02);
    for skipped in [&[0xf5][..], &[0xf9, 0x3c, 0x00], &[0xfa, 0, 0, 0, 0], &[0xfb, 0, 0, 0, 0, 0, 0, 0, 0], &[0xf8, 0x20]] {
        bytes.extend(text("extra"));
        bytes.extend_from_slice(skipped);
    }
    bytes.extend(text("height"));
    bytes.push(0x03);
    let mut reserved = bytes.clone();
    bytes.push(0xff);
    let rect = ignoring.decode_from_bytes(&RectSerializer, &bytes).unwrap();
    assert_eq!(rect, Rect { width: 2, height: 3 });

    // additional information 28 to 30 is reserved
    reserved.extend(text("extra"));
    reserved.extend_from_slice(&[0xfc, 0xff]);
    let err = ignoring.decode_from_bytes(&RectSerializer, &reserved).unwrap_err();
    assert!(matches!(err, Error::CborDecoding { found: 0xfc, .. }), "{err}");
}
