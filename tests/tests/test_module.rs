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

use std::sync::Arc;

use strata::{
    AsAny, BinaryFormat, ContextualSerializer, Decoder, DynSerializer, Encoder, Error, Json, PolymorphicSerializer,
    PrimitiveKind, ProtoBuf, SerialDescriptor, SerializersModule, Serializer, StringFormat,
};
use strata_core::module::SerializersModuleCollector;
use test_helpers::*;

#[derive(Clone, Copy, Debug, PartialEq)]
struct Timestamp(i64);

struct TimestampAsNumber;

impl Serializer for TimestampAsNumber {
    type Value = Timestamp;

    fn descriptor(&self) -> SerialDescriptor {
        SerialDescriptor::primitive("Timestamp", PrimitiveKind::Long)
    }

    fn serialize(&self, encoder: &mut dyn Encoder, value: &Timestamp) -> Result<(), Error> {
        encoder.encode_i64(value.0)
    }

    fn deserialize(&self, decoder: &mut dyn Decoder) -> Result<Timestamp, Error> {
        decoder.decode_i64().map(Timestamp)
    }
}

struct TimestampAsText;

impl Serializer for TimestampAsText {
    type Value = Timestamp;

    fn descriptor(&self) -> SerialDescriptor {
        SerialDescriptor::primitive("TimestampText", PrimitiveKind::String)
    }

    fn serialize(&self, encoder: &mut dyn Encoder, value: &Timestamp) -> Result<(), Error> {
        encoder.encode_str(&format!("@{}", value.0))
    }

    fn deserialize(&self, decoder: &mut dyn Decoder) -> Result<Timestamp, Error> {
        let text = decoder.decode_string()?;
        text.strip_prefix('@')
            .and_then(|n| n.parse().ok())
            .map(Timestamp)
            .ok_or_else(|| Error::invalid_data(format!("Bad timestamp '{text}'")))
    }
}

/// Serializes rectangles only; stands in for an "unknown shape" handler.
struct FallbackShape;

impl Serializer for FallbackShape {
    type Value = Box<dyn Shape>;

    fn descriptor(&self) -> SerialDescriptor {
        RectSerializer.descriptor()
    }

    fn serialize(&self, encoder: &mut dyn Encoder, value: &Box<dyn Shape>) -> Result<(), Error> {
        let rect = as_rect(&**value).ok_or_else(|| Error::encoding("not a rect"))?;
        RectSerializer.serialize(encoder, rect)
    }

    fn deserialize(&self, decoder: &mut dyn Decoder) -> Result<Box<dyn Shape>, Error> {
        RectSerializer.deserialize(decoder).map(upcast_rect)
    }
}

#[test]
fn test_contextual_lookup() {
    let serializer = ContextualSerializer::<Timestamp>::with_fallback("Timestamp", TimestampAsNumber);
    let plain = Json::default();
    assert_eq!(plain.encode_to_string(&serializer, &Timestamp(7)).unwrap(), "7");

    let mut builder = SerializersModule::builder();
    builder.contextual(TimestampAsText).unwrap();
    let json = Json::default().with_module(builder.build());
    assert_eq!(json.encode_to_string(&serializer, &Timestamp(7)).unwrap(), r#""@7""#);
    assert_eq!(json.decode_from_str(&serializer, r#""@9""#).unwrap(), Timestamp(9));
}

#[test]
fn test_contextual_without_fallback() {
    let serializer = ContextualSerializer::<Timestamp>::new("Timestamp");
    let err = ProtoBuf::default()
        .encode_to_bytes(&serializer, &Timestamp(1))
        .unwrap_err();
    assert!(matches!(err, Error::SerializerNotFound { .. }), "{err}");
}

#[test]
fn test_duplicate_registrations() {
    let mut builder = SerializersModule::builder();
    builder.polymorphic::<dyn Shape, _>(CircleSerializer, upcast_circle).unwrap();
    // The same registration again is accepted.
    builder.polymorphic::<dyn Shape, _>(CircleSerializer, upcast_circle).unwrap();
    let err = builder
        .polymorphic_with_name::<dyn Shape, _>("circle", RectSerializer, upcast_rect)
        .err()
        .unwrap();
    assert!(matches!(err, Error::DuplicateSerializer(_)), "{err}");
    let err = builder
        .polymorphic_with_name::<dyn Shape, _>("round", CircleSerializer, upcast_circle)
        .err()
        .unwrap();
    assert!(err.to_string().contains("under the serial name 'circle'"), "{err}");
}

#[test]
fn test_merge_and_overwrite() {
    let shapes = shapes_module();
    assert!(shapes.merge(&shapes_module()).is_ok());

    let mut other = SerializersModule::builder();
    other
        .polymorphic_with_name::<dyn Shape, _>("rect", CircleSerializer, upcast_circle)
        .unwrap();
    let other = other.build();
    assert!(matches!(shapes.merge(&other), Err(Error::DuplicateSerializer(_))));

    let combined = shapes.overwrite_with(&other);
    let json = Json::default().with_module(combined);
    let shape = PolymorphicSerializer::<dyn Shape>::new();
    let back = json
        .decode_from_str(&shape, r#"{"type":"rect","radius":1.0}"#)
        .unwrap();
    assert_eq!(as_circle(&*back), Some(&Circle { radius: 1.0 }));
}

#[test]
fn test_default_deserializer() {
    let mut builder = SerializersModule::builder();
    builder
        .polymorphic::<dyn Shape, _>(CircleSerializer, upcast_circle)
        .unwrap()
        .polymorphic_default_deserializer::<dyn Shape, _>(|name| {
            (name != Some("forbidden")).then(|| Arc::new(FallbackShape) as DynSerializer<Box<dyn Shape>>)
        })
        .unwrap();
    let json = Json::default().with_module(builder.build());
    let shape = PolymorphicSerializer::<dyn Shape>::new();

    let back = json
        .decode_from_str(&shape, r#"{"type":"square","width":2,"height":2}"#)
        .unwrap();
    assert_eq!(back.area(), 4.0);
    // No discriminator at all also reaches the provider.
    let back = json
        .decode_from_str(&shape, r#"{"width":1,"height":3}"#)
        .unwrap();
    assert_eq!(back.area(), 3.0);
    assert!(json
        .decode_from_str(&shape, r#"{"type":"forbidden","width":1,"height":1}"#)
        .is_err());
}

#[derive(Default)]
struct Listing {
    entries: Vec<String>,
}

impl SerializersModuleCollector for Listing {
    fn contextual(&mut self, type_name: &'static str, descriptor: &SerialDescriptor) {
        let short = type_name.rsplit("::").next().unwrap_or(type_name);
        self.entries
            .push(format!("contextual {short} -> {}", descriptor.serial_name()));
    }

    fn polymorphic(
        &mut self,
        base_name: &'static str,
        _subject_name: &'static str,
        serial_name: &str,
        _descriptor: &SerialDescriptor,
    ) {
        self.entries.push(format!("{base_name}: {serial_name}"));
    }
}

#[test]
fn test_dump_to_collector() {
    let mut builder = SerializersModule::builder();
    builder.contextual(TimestampAsText).unwrap();
    let module = builder.build().merge(&shapes_module()).unwrap();
    let mut listing = Listing::default();
    module.dump_to(&mut listing);
    listing.entries.sort();
    assert_eq!(
        listing.entries,
        vec![
            "Shape: circle".to_string(),
            "Shape: rect".to_string(),
            "contextual Timestamp -> TimestampText".to_string(),
        ]
    );
}

trait Solid: AsAny + Send + Sync + std::fmt::Debug {}

impl Solid for Circle {}

fn upcast_solid(c: Circle) -> Box<dyn Solid> {
    Box::new(c)
}

#[test]
fn test_polymorphic_registrations_are_scoped_by_base() {
    let shape = PolymorphicSerializer::<dyn Shape>::new();
    let solid = PolymorphicSerializer::<dyn Solid>::new();
    let text = r#"{"type":"circle","radius":1.0}"#;

    // registered under Shape only
    let json = Json::default().with_module(shapes_module());
    let value: Box<dyn Solid> = Box::new(Circle { radius: 1.0 });
    let err = json.encode_to_string(&solid, &value).unwrap_err();
    assert!(matches!(err, Error::SerializerNotFound { .. }), "{err}");
    let err = json.decode_from_str(&solid, text).unwrap_err();
    assert!(matches!(&err, Error::SerializerNotFound { subject, .. } if subject == "circle"), "{err}");
    let back = json.decode_from_str(&shape, text).unwrap();
    assert_eq!(as_circle(&*back), Some(&Circle { radius: 1.0 }));

    // registered under Solid only
    let mut builder = SerializersModule::builder();
    builder.polymorphic::<dyn Solid, _>(CircleSerializer, upcast_solid).unwrap();
    let json = Json::default().with_module(builder.build());
    let err = json.decode_from_str(&shape, text).unwrap_err();
    assert!(matches!(&err, Error::SerializerNotFound { subject, .. } if subject == "circle"), "{err}");
    let value: Box<dyn Shape> = Box::new(Circle { radius: 1.0 });
    let err = json.encode_to_string(&shape, &value).unwrap_err();
    assert!(matches!(err, Error::SerializerNotFound { .. }), "{err}");
    let back = json.decode_from_str(&solid, text).unwrap();
    assert_eq!((*back).as_any().downcast_ref::<Circle>(), Some(&Circle { radius: 1.0 }));
}
