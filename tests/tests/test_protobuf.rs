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

use strata::{
    required, unknown_index, BinaryFormat, Decoder, ElementAnnotation, ElementIndex, Encoder, Error,
    PolymorphicSerializer, PrimitiveKind, ProtoBuf, ProtoIntegerType, SerialDescriptor, Serializable,
    Serializer,
};
use test_helpers::*;

#[derive(Debug, PartialEq)]
struct Reading {
    id: i32,
    temperature: f32,
    samples: Vec<i32>,
}

struct ReadingSerializer;

impl Serializer for ReadingSerializer {
    type Value = Reading;

    fn descriptor(&self) -> SerialDescriptor {
        use ElementAnnotation::*;
        SerialDescriptor::builder("Reading")
            .element_with_annotations(
                "id",
                SerialDescriptor::primitive("i32", PrimitiveKind::Int),
                false,
                vec![ProtoNumber(5), ProtoType(ProtoIntegerType::Signed)],
            )
            .element_with_annotations(
                "temperature",
                SerialDescriptor::primitive("f32", PrimitiveKind::Float),
                true,
                vec![ProtoNumber(2)],
            )
            .element_with_annotations(
                "samples",
                <Vec<i32>>::serializer().descriptor(),
                true,
                vec![ProtoNumber(7), ProtoPacked],
            )
            .build()
    }

    fn serialize(&self, encoder: &mut dyn Encoder, value: &Reading) -> Result<(), Error> {
        let desc = self.descriptor();
        encoder.encode_structure(&desc, |s| {
            s.encode_i32_element(&desc, 0, value.id)?;
            if value.temperature.to_bits() != 0 || s.should_encode_element_default(&desc, 1) {
                s.encode_f32_element(&desc, 1, value.temperature)?;
            }
            if !value.samples.is_empty() || s.should_encode_element_default(&desc, 2) {
                s.encode_serializable_element(&desc, 2, &<Vec<i32>>::serializer(), &value.samples)?;
            }
            Ok(())
        })
    }

    fn deserialize(&self, decoder: &mut dyn Decoder) -> Result<Reading, Error> {
        let desc = self.descriptor();
        decoder.decode_structure(&desc, |s| {
            let mut id = None;
            let mut temperature = 0.0;
            let mut samples = Vec::new();
            loop {
                match s.decode_element_index(&desc)? {
                    ElementIndex::Done => break,
                    ElementIndex::Element(0) => id = Some(s.decode_i32_element(&desc, 0)?),
                    ElementIndex::Element(1) => temperature = s.decode_f32_element(&desc, 1)?,
                    ElementIndex::Element(2) => {
                        samples = s.decode_serializable_element(&desc, 2, &<Vec<i32>>::serializer())?;
                    }
                    ElementIndex::Element(i) => return Err(unknown_index(&desc, i)),
                }
            }
            Ok(Reading {
                id: required(&desc, 0, id)?,
                temperature,
                samples,
            })
        })
    }
}

#[test]
fn test_message_layout() {
    let proto = ProtoBuf::default();
    let project = Project {
        name: "strata".to_string(),
        language: Some("rust".to_string()),
        stars: 5,
        tags: vec!["a".to_string(), "bc".to_string()],
    };
    let bytes = proto.encode(&project).unwrap();
    let mut expected = vec![0x0a, 0x06];
    expected.extend_from_slice(b"strata");
    expected.extend_from_slice(&[0x12, 0x04]);
    expected.extend_from_slice(b"rust");
    expected.extend_from_slice(&[0x18, 0x05, 0x22, 0x01, b'a', 0x22, 0x02, b'b', b'c']);
    assert_eq!(bytes, expected);
    assert_eq!(proto.decode::<Project>(&bytes).unwrap(), project);
}

#[test]
fn test_defaults_are_omitted() {
    let proto = ProtoBuf::default();
    let bytes = proto.encode(&Project::new("x")).unwrap();
    assert_eq!(bytes, vec![0x0a, 0x01, b'x']);
    assert_eq!(proto.decode::<Project>(&bytes).unwrap(), Project::new("x"));

    let verbose = ProtoBuf::default().omit_defaults(false);
    let bytes = verbose.encode(&Project::new("x")).unwrap();
    // The null language is still absent; stars is written as zero.
    assert_eq!(bytes, vec![0x0a, 0x01, b'x', 0x18, 0x00]);
}

#[test]
fn test_annotated_fields() {
    let proto = ProtoBuf::default();
    let reading = Reading {
        id: -2,
        temperature: 1.0,
        samples: vec![1, 2, 300],
    };
    let bytes = proto.encode_to_bytes(&ReadingSerializer, &reading).unwrap();
    assert_eq!(
        bytes,
        vec![0x28, 0x03, 0x15, 0x00, 0x00, 0x80, 0x3f, 0x3a, 0x04, 0x01, 0x02, 0xac, 0x02]
    );
    assert_eq!(proto.decode_from_bytes(&ReadingSerializer, &bytes).unwrap(), reading);

    // Unpacked samples and fields out of order decode the same.
    let unpacked = [0x38, 0x01, 0x38, 0x02, 0x28, 0x03, 0x38, 0xac, 0x02];
    let back = proto.decode_from_bytes(&ReadingSerializer, &unpacked).unwrap();
    assert_eq!(back, Reading { id: -2, temperature: 0.0, samples: vec![1, 2, 300] });
}

#[test]
fn test_negative_int_takes_ten_bytes() {
    let proto = ProtoBuf::default();
    let bytes = proto.encode(&-1i32).unwrap();
    let mut expected = vec![0x08];
    expected.extend_from_slice(&[0xff; 9]);
    expected.push(0x01);
    assert_eq!(bytes, expected);
    assert_eq!(proto.decode::<i32>(&bytes).unwrap(), -1);
}

#[test]
fn test_root_collections() {
    let proto = ProtoBuf::default();
    let bytes = proto.encode(&vec![Project::new("a")]).unwrap();
    assert_eq!(bytes, vec![0x0a, 0x03, 0x0a, 0x01, b'a']);
    assert_eq!(proto.decode::<Vec<Project>>(&bytes).unwrap(), vec![Project::new("a")]);

    let map = BTreeMap::from([("a".to_string(), 1i32)]);
    let bytes = proto.encode(&map).unwrap();
    assert_eq!(bytes, vec![0x0a, 0x05, 0x0a, 0x01, b'a', 0x10, 0x01]);
    assert_eq!(proto.decode::<BTreeMap<String, i32>>(&bytes).unwrap(), map);

    // A packed run of the same field.
    let packed = [0x0a, 0x03, 0x01, 0x02, 0x03];
    assert_eq!(proto.decode::<Vec<i32>>(&packed).unwrap(), vec![1, 2, 3]);
}

#[test]
fn test_unknown_fields_are_skipped() {
    let proto = ProtoBuf::default();
    let bytes = [
        0x0a, 0x01, b'x', // name
        0x48, 0x07, // field 9, varint
        0x55, 0x01, 0x02, 0x03, 0x04, // field 10, fixed32
        0x18, 0x01, 0x18, 0x02, // stars twice
    ];
    let project = proto.decode::<Project>(&bytes).unwrap();
    assert_eq!(project.name, "x");
    assert_eq!(project.stars, 2);
}

#[test]
fn test_malformed_messages() {
    let proto = ProtoBuf::default();
    for bytes in [
        &[0x0a, 0x05, b'a'][..],
        &[0x0a][..],
        &[0x18, 0x80][..],
        &[0x0b, 0x00][..],
        &[0x00, 0x01][..],
    ] {
        let err = proto.decode::<Project>(bytes).unwrap_err();
        assert!(err.is_malformed_data(), "{bytes:?}: {err}");
    }
    let err = proto.decode::<Project>(&[0x18, 0x01]).unwrap_err();
    assert!(matches!(err, Error::MissingField { .. }), "{err}");
}

#[test]
fn test_nested_collections_are_unsupported() {
    let proto = ProtoBuf::default();
    let err = proto.encode(&vec![vec![1i32]]).unwrap_err();
    assert!(matches!(err, Error::Unsupported(_)), "{err}");
}

#[test]
fn test_polymorphic_message() {
    let proto = ProtoBuf::default().with_module(shapes_module());
    let shape = PolymorphicSerializer::<dyn Shape>::new();
    let value: Box<dyn Shape> = Box::new(Rect { width: 2, height: 3 });
    let bytes = proto.encode_to_bytes(&shape, &value).unwrap();
    let mut expected = vec![0x0a, 0x04];
    expected.extend_from_slice(b"rect");
    expected.extend_from_slice(&[0x12, 0x04, 0x08, 0x02, 0x10, 0x03]);
    assert_eq!(bytes, expected);
    let back = proto.decode_from_bytes(&shape, &bytes).unwrap();
    assert_eq!(as_rect(&*back), Some(&Rect { width: 2, height: 3 }));
}

#[test]
fn test_sample_round_trip() {
    let sample = Sample {
        a: 1,
        b: vec![Some(true), None],
    };
    let proto = ProtoBuf::default();
    let bytes = proto.encode_to_bytes(&SampleSerializer, &sample).unwrap();
    // a = 1, then one wrapper message per element; the null wrapper is empty
    assert_eq!(bytes, vec![0x08, 0x01, 0x12, 0x02, 0x08, 0x01, 0x12, 0x00]);
    assert_eq!(proto.decode_from_bytes(&SampleSerializer, &bytes).unwrap(), sample);
}

#[test]
fn test_nullable_root_is_unsupported() {
    let proto = ProtoBuf::default();
    // an empty message would read back as None
    let err = proto.encode(&Some(Vec::<i32>::new())).unwrap_err();
    assert!(matches!(err, Error::Unsupported(_)), "{err}");
    let err = proto.encode(&None::<i32>).unwrap_err();
    assert!(matches!(err, Error::Unsupported(_)), "{err}");
    let err = proto.decode::<Option<i32>>(&[]).unwrap_err();
    assert!(matches!(err, Error::Unsupported(_)), "{err}");

    // nullable fields inside a message are unaffected
    let mut project = Project::new("strata");
    project.language = Some(String::new());
    let bytes = proto.encode(&project).unwrap();
    assert_eq!(proto.decode::<Project>(&bytes).unwrap(), project);
    let bytes = proto.encode(&Project::new("strata")).unwrap();
    assert_eq!(proto.decode::<Project>(&bytes).unwrap().language, None);
}

#[test]
fn test_float_bits_round_trip() {
    let proto = ProtoBuf::default().omit_defaults(false);
    for bits in [0x7f80_0001u32, 0x7fc0_0000, 0xffc1_2345, 0, 0x8000_0000, 0x7f80_0000, 0xff80_0000] {
        let bytes = proto.encode(&f32::from_bits(bits)).unwrap();
        let mut expected = vec![0x0d];
        expected.extend_from_slice(&bits.to_le_bytes());
        assert_eq!(bytes, expected);
        assert_eq!(proto.decode::<f32>(&bytes).unwrap().to_bits(), bits, "{bits:#x}");
    }
    for bits in [
        0x7ff0_0000_0000_0001u64,
        0x7ff8_0000_0000_0000,
        0xfff8_1234_5678_9abc,
        0,
        0x8000_0000_0000_0000,
        0x7ff0_0000_0000_0000,
        0xfff0_0000_0000_0000,
    ] {
        let bytes = proto.encode(&f64::from_bits(bits)).unwrap();
        let mut expected = vec![0x09];
        expected.extend_from_slice(&bits.to_le_bytes());
        assert_eq!(bytes, expected);
        assert_eq!(proto.decode::<f64>(&bytes).unwrap().to_bits(), bits, "{bits:#x}");
    }

    // negative zero is not the default value, so it is written even when omitting defaults
    let proto = ProtoBuf::default();
    let reading = Reading {
        id: 1,
        temperature: -0.0,
        samples: Vec::new(),
    };
    let bytes = proto.encode_to_bytes(&ReadingSerializer, &reading).unwrap();
    let back = proto.decode_from_bytes(&ReadingSerializer, &bytes).unwrap();
    assert_eq!(back.temperature.to_bits(), 0x8000_0000);
}
