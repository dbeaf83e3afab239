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

use strata::{BinaryFormat, Cbor, DelimitedReader, DelimitedWriter, Json, ProtoBuf, StringFormat};
use test_helpers::*;
use tracing_test::traced_test;

#[test]
#[traced_test]
fn test_skipped_keys_are_traced() {
    let json = Json::default().ignore_unknown_keys(true);
    let project: Project = json.decode(r#"{"name":"a","color":"red"}"#).unwrap();
    assert_eq!(project, Project::new("a"));
    assert!(logs_contain("skipping unknown JSON key"));
    assert!(logs_contain("color"));
}

#[test]
#[traced_test]
fn test_unknown_protobuf_fields_are_traced() {
    let proto = ProtoBuf::default();
    let project: Project = proto.decode(&[0x0a, 0x01, b'a', 0x78, 0x01]).unwrap();
    assert_eq!(project, Project::new("a"));
    assert!(logs_contain("number=15"));
}

#[test]
#[traced_test]
fn test_module_building_is_logged() {
    let _ = shapes_module();
    assert!(logs_contain("built serializers module"));
    assert!(logs_contain("polymorphic=2"));
}

#[test]
#[traced_test]
fn test_oversized_frames_are_logged() {
    let mut writer = DelimitedWriter::new(Vec::new());
    writer.write_message(&[0u8; 16]).unwrap();
    let bytes = writer.into_inner();
    let mut reader = DelimitedReader::new(bytes.as_slice()).with_max_message_size(8);
    assert!(reader.read_message().is_err());
    assert!(logs_contain("rejecting delimited message above the size limit"));
}

#[test]
#[traced_test]
fn test_default_provider_resolution_is_traced() {
    let mut builder = strata::SerializersModule::builder();
    builder
        .polymorphic_default_deserializer::<dyn Shape, _>(|_| {
            Some(std::sync::Arc::new(RectAsShape) as strata::DynSerializer<Box<dyn Shape>>)
        })
        .unwrap();
    let cbor = Cbor::default().with_module(builder.build());
    let shape = strata::PolymorphicSerializer::<dyn Shape>::new();
    let value: Box<dyn Shape> = Box::new(Rect { width: 1, height: 2 });
    let bytes = Cbor::default()
        .with_module(shapes_module())
        .encode_to_bytes(&shape, &value)
        .unwrap();
    let back = cbor.decode_from_bytes(&shape, &bytes).unwrap();
    assert_eq!(back.area(), 2.0);
    assert!(logs_contain("resolved by default provider"));
}

struct RectAsShape;

impl strata::Serializer for RectAsShape {
    type Value = Box<dyn Shape>;

    fn descriptor(&self) -> strata::SerialDescriptor {
        strata::Serializer::descriptor(&RectSerializer)
    }

    fn serialize(&self, encoder: &mut dyn strata::Encoder, value: &Box<dyn Shape>) -> Result<(), strata::Error> {
        let rect = as_rect(&**value).ok_or_else(|| strata::Error::encoding("not a rect"))?;
        strata::Serializer::serialize(&RectSerializer, encoder, rect)
    }

    fn deserialize(&self, decoder: &mut dyn strata::Decoder) -> Result<Box<dyn Shape>, strata::Error> {
        strata::Serializer::deserialize(&RectSerializer, decoder).map(upcast_rect)
    }
}
