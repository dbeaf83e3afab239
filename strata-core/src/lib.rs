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


//! # Strata Core
//!
//! The engine behind `strata`: a descriptor model, a format-neutral encoding
//! protocol, a registry of serializers and four concrete formats built on
//! the same protocol.
//!
//! ## Architecture
//!
//! - **`descriptor`**: [`SerialDescriptor`](descriptor::SerialDescriptor),
//!   the shape of a serializable type (kind, elements, annotations)
//! - **`encoding`**: the `Encoder`/`Decoder` protocol that serializers drive
//! - **`serializer`**: serializers for primitives, collections, enums,
//!   tuples, options and polymorphic values
//! - **`module`**: `SerializersModule`, the contextual and polymorphic registry
//! - **`format`**: JSON, protobuf, CBOR and properties
//! - **`buffer`** and **`varint`**: the byte-level reader and writer
//! - **`framing`**: varint length-delimited message streams
//! - **`config`**: format switches shared by every format
//! - **`error`**: the crate-wide [`Error`](error::Error)
//!
//! A serializer never sees bytes and a format never sees user types; the
//! descriptor is the only thing they share.
//!
//! ```rust
//! use std::collections::BTreeMap;
//! use strata_core::format::json::Json;
//! use strata_core::format::StringFormat;
//!
//! let json = Json::default();
//! let scores = BTreeMap::from([("ann".to_string(), vec![3, 4])]);
//! let text = json.encode(&scores).unwrap();
//! assert_eq!(text, r#"{"ann":[3,4]}"#);
//! let back: BTreeMap<String, Vec<i32>> = json.decode(&text).unwrap();
//! assert_eq!(back, scores);
//! ```

pub mod buffer;
pub mod config;
pub mod descriptor;
pub mod encoding;
pub mod error;
pub mod format;
pub mod framing;
pub mod module;
pub mod serializer;
pub mod varint;

pub use error::Error;
