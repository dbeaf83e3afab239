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


//! # Strata
//!
//! Format-agnostic serialization. A type is described once, by a
//! [`Serializer`] and its [`SerialDescriptor`], and can then be written as
//! JSON, protobuf, CBOR or a flat property map.
//!
//! ## Formats
//!
//! | Format | Type | Output |
//! |--------|------|--------|
//! | JSON | [`Json`] | `String` |
//! | Protocol Buffers | [`ProtoBuf`] | `Vec<u8>` |
//! | CBOR | [`Cbor`] | `Vec<u8>` |
//! | Properties | [`Properties`] | `BTreeMap<String, String>` |
//!
//! ## Writing a serializer
//!
//! ```rust
//! use strata::{
//!     required, unknown_index, BinaryFormat, Cbor, Decoder, ElementIndex, Encoder, Error, Json,
//!     PrimitiveKind, SerialDescriptor, Serializer, StringFormat,
//! };
//!
//! #[derive(Debug, PartialEq)]
//! struct User {
//!     name: String,
//!     age: i32,
//! }
//!
//! struct UserSerializer;
//!
//! impl Serializer for UserSerializer {
//!     type Value = User;
//!
//!     fn descriptor(&self) -> SerialDescriptor {
//!         SerialDescriptor::builder("User")
//!             .element("name", SerialDescriptor::primitive("String", PrimitiveKind::String), false)
//!             .element("age", SerialDescriptor::primitive("i32", PrimitiveKind::Int), true)
//!             .build()
//!     }
//!
//!     fn serialize(&self, encoder: &mut dyn Encoder, value: &User) -> Result<(), Error> {
//!         let desc = self.descriptor();
//!         encoder.encode_structure(&desc, |s| {
//!             s.encode_str_element(&desc, 0, &value.name)?;
//!             if value.age != 0 || s.should_encode_element_default(&desc, 1) {
//!                 s.encode_i32_element(&desc, 1, value.age)?;
//!             }
//!             Ok(())
//!         })
//!     }
//!
//!     fn deserialize(&self, decoder: &mut dyn Decoder) -> Result<User, Error> {
//!         let desc = self.descriptor();
//!         decoder.decode_structure(&desc, |s| {
//!             let (mut name, mut age) = (None, 0);
//!             loop {
//!                 match s.decode_element_index(&desc)? {
//!                     ElementIndex::Done => break,
//!                     ElementIndex::Element(0) => name = Some(s.decode_string_element(&desc, 0)?),
//!                     ElementIndex::Element(1) => age = s.decode_i32_element(&desc, 1)?,
//!                     ElementIndex::Element(i) => return Err(unknown_index(&desc, i)),
//!                 }
//!             }
//!             Ok(User { name: required(&desc, 0, name)?, age })
//!         })
//!     }
//! }
//!
//! # fn main() -> Result<(), Error> {
//! let user = User { name: "ann".to_string(), age: 0 };
//! let json = Json::default();
//! let text = json.encode_to_string(&UserSerializer, &user)?;
//! assert_eq!(text, r#"{"name":"ann","age":0}"#);
//!
//! let cbor = Cbor::default();
//! let bytes = cbor.encode_to_bytes(&UserSerializer, &user)?;
//! assert_eq!(cbor.decode_from_bytes(&UserSerializer, &bytes)?, user);
//! # Ok(())
//! # }
//! ```
//!
//! Types with a default serializer (primitives, `String`, `Vec`, maps,
//! tuples, `Option`) go through `encode` and `decode` directly:
//!
//! ```rust
//! use strata::{BinaryFormat, ProtoBuf};
//!
//! let proto = ProtoBuf::default();
//! let bytes = proto.encode(&vec![1i32, 2, 3]).unwrap();
//! assert_eq!(proto.decode::<Vec<i32>>(&bytes).unwrap(), vec![1, 2, 3]);
//! ```

pub use strata_core::{
    buffer::{Reader, Writer},
    config::{Config, UnknownKeys},
    descriptor::{
        ElementAnnotation, PolymorphicKind, PrimitiveKind, ProtoIntegerType, SerialDescriptor,
        SerialKind, StructureKind,
    },
    encoding::{
        required, unknown_index, CompositeDecoder, CompositeEncoder, Decoder, ElementIndex,
        ElementMarker, Encoder,
    },
    error::Error,
    format::{
        cbor::Cbor,
        json::{Json, JsonElement, JsonObject},
        properties::Properties,
        protobuf::ProtoBuf,
        BinaryFormat, StringFormat,
    },
    framing::{DelimitedReader, DelimitedWriter},
    module::{SerializersModule, SerializersModuleBuilder},
    serializer::{
        serializer, AsAny, ContextualSerializer, DynSerializer, PolymorphicSerializer,
        SealedSerializer, Serializable, Serializer,
    },
};
