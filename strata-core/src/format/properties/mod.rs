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


//! Flat string-to-string maps.
//!
//! Nested elements are addressed by dotted keys: element `b` of element `a`
//! is `a.b`, item 2 of list `xs` is `xs.2`. Collections also write
//! `<path>.size`. Map entry `i` stores its key under `<path>.<2i>` and its
//! value under `<path>.<2i + 1>`. Nulls are encoded by omission.
//!
//! ```
//! use std::collections::BTreeMap;
//! use strata_core::format::properties::Properties;
//! use strata_core::serializer::Serializable;
//!
//! let properties = Properties::default();
//! let value = (7i32, vec!["a".to_string()]);
//! let map = properties.encode_to_map(&<(i32, Vec<String>)>::serializer(), &value).unwrap();
//! let expected: BTreeMap<String, String> = [("first", "7"), ("second.0", "a"), ("second.size", "1")]
//!     .into_iter()
//!     .map(|(k, v)| (k.to_string(), v.to_string()))
//!     .collect();
//! assert_eq!(map, expected);
//! ```

mod decoder;
mod encoder;

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

use crate::config::Config;
use crate::error::Error;
use crate::module::SerializersModule;
use crate::serializer::{Serializable, Serializer};
use decoder::PropertiesDecoder;
use encoder::PropertiesEncoder;

/// Key suffix holding the element count of a collection.
pub const SIZE_KEY: &str = "size";

#[derive(Clone)]
pub struct Properties {
    config: Config,
    module: Arc<SerializersModule>,
}

impl Default for Properties {
    fn default() -> Self {
        Properties {
            config: Config::default(),
            module: SerializersModule::empty(),
        }
    }
}

impl Properties {
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

    pub fn omit_defaults(mut self, omit_defaults: bool) -> Self {
        self.config.omit_defaults = omit_defaults;
        self
    }

    /// Bound on the declared size of collections whose elements may be
    /// stored as nothing.
    pub fn max_message_size(mut self, max_message_size: usize) -> Self {
        self.config.max_message_size = max_message_size;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn serializers_module(&self) -> &SerializersModule {
        &self.module
    }

    /// Flattens `value` into a map. The value must be a structure.
    pub fn encode_to_map<S>(&self, serializer: &S, value: &S::Value) -> Result<BTreeMap<String, String>, Error>
    where
        S: Serializer + ?Sized,
    {
        let mut out = BTreeMap::new();
        let mut encoder = PropertiesEncoder::new(self, &mut out, String::new());
        serializer.serialize(&mut encoder, value)?;
        Ok(out)
    }

    pub fn decode_from_map<S>(&self, serializer: &S, map: &BTreeMap<String, String>) -> Result<S::Value, Error>
    where
        S: Serializer + ?Sized,
    {
        let mut decoder = PropertiesDecoder::new(self, map, String::new());
        serializer.deserialize(&mut decoder)
    }

    pub fn encode<T: Serializable>(&self, value: &T) -> Result<BTreeMap<String, String>, Error> {
        let serializer = self.module.serializer::<T>();
        self.encode_to_map(&*serializer, value)
    }

    pub fn decode<T: Serializable>(&self, map: &BTreeMap<String, String>) -> Result<T, Error> {
        let serializer = self.module.serializer::<T>();
        self.decode_from_map(&*serializer, map)
    }
}

/// Key of `name` below `path`; the root path is empty.
pub(crate) fn child_key(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{path}.{name}")
    }
}

/// True when `path` holds a value or has keys nested below it.
pub(crate) fn is_present(map: &BTreeMap<String, String>, path: &str) -> bool {
    if path.is_empty() {
        return !map.is_empty();
    }
    if map.contains_key(path) {
        return true;
    }
    let prefix = format!("{path}.");
    map.range::<str, _>((Bound::Included(prefix.as_str()), Bound::Unbounded))
        .next()
        .is_some_and(|(key, _)| key.starts_with(&prefix))
}
