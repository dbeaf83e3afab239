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


//! JSON text format.
//!
//! ```
//! use strata_core::format::json::Json;
//! use strata_core::serializer::{serializer, Serializable};
//!
//! let json = Json::default();
//! let text = json.encode_to_string(&serializer::<Vec<Option<i32>>>(), &vec![Some(1), None]).unwrap();
//! assert_eq!(text, "[1,null]");
//! let back: Vec<Option<i32>> = json.decode_from_str(&serializer::<Vec<Option<i32>>>(), &text).unwrap();
//! assert_eq!(back, vec![Some(1), None]);
//! ```

mod composer;
mod decoder;
mod element;
mod encoder;
mod lexer;
mod literal;
mod path;
mod tree;

pub use element::{JsonElement, JsonObject};

use std::io::{Read, Write};
use std::sync::Arc;

use crate::config::{Config, UnknownKeys};
use crate::descriptor::{ElementAnnotation, SerialDescriptor, SerialKind, StructureKind};
use crate::error::Error;
use crate::format::StringFormat;
use crate::module::SerializersModule;
use crate::serializer::Serializer;

use composer::Composer;
use decoder::JsonDecoder;
use encoder::JsonEncoder;
use lexer::JsonLexer;
use path::JsonPath;
use tree::TreeDecoder;

/// JSON format: a [`Config`] plus the [`SerializersModule`] used for
/// polymorphic and contextual lookups.
#[derive(Clone)]
pub struct Json {
    config: Config,
    module: Arc<SerializersModule>,
}

impl Default for Json {
    fn default() -> Self {
        Json {
            config: Config::default(),
            module: SerializersModule::empty(),
        }
    }
}

impl Json {
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

    /// Accept unquoted strings and keys.
    pub fn lenient(mut self, lenient: bool) -> Self {
        self.config.lenient = lenient;
        self
    }

    pub fn ignore_unknown_keys(mut self, ignore: bool) -> Self {
        self.config.unknown_keys = if ignore {
            UnknownKeys::Ignore
        } else {
            UnknownKeys::Fail
        };
        self
    }

    pub fn omit_defaults(mut self, omit_defaults: bool) -> Self {
        self.config.omit_defaults = omit_defaults;
        self
    }

    pub fn explicit_nulls(mut self, explicit_nulls: bool) -> Self {
        self.config.explicit_nulls = explicit_nulls;
        self
    }

    pub fn class_discriminator<S: Into<String>>(mut self, key: S) -> Self {
        self.config.class_discriminator = key.into();
        self
    }

    pub fn allow_special_floats(mut self, allow: bool) -> Self {
        self.config.allow_special_floats = allow;
        self
    }

    pub fn use_array_polymorphism(mut self, use_array: bool) -> Self {
        self.config.use_array_polymorphism = use_array;
        self
    }

    pub fn pretty_print(mut self, pretty_print: bool) -> Self {
        self.config.pretty_print = pretty_print;
        self
    }

    pub fn pretty_print_indent<S: Into<String>>(mut self, indent: S) -> Self {
        self.config.pretty_print_indent = indent.into();
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn serializers_module(&self) -> &SerializersModule {
        &self.module
    }

    pub fn encode_to_string<S>(&self, serializer: &S, value: &S::Value) -> Result<String, Error>
    where
        S: Serializer + ?Sized,
    {
        let indent = self
            .config
            .is_pretty_print()
            .then(|| self.config.pretty_print_indent.clone());
        let mut composer = Composer::new(indent);
        let mut encoder = JsonEncoder::new(self, &mut composer);
        serializer.serialize(&mut encoder, value)?;
        Ok(composer.finish())
    }

    pub fn encode_to_writer<S, W>(&self, serializer: &S, value: &S::Value, mut writer: W) -> Result<(), Error>
    where
        S: Serializer + ?Sized,
        W: Write,
    {
        let text = self.encode_to_string(serializer, value)?;
        writer.write_all(text.as_bytes())?;
        Ok(())
    }

    pub fn decode_from_str<S>(&self, serializer: &S, input: &str) -> Result<S::Value, Error>
    where
        S: Serializer + ?Sized,
    {
        self.decode_with(serializer, JsonLexer::from_str(input))
    }

    /// Decodes one value from `reader`. Only whitespace may follow it.
    pub fn decode_from_reader<S, R>(&self, serializer: &S, reader: R) -> Result<S::Value, Error>
    where
        S: Serializer + ?Sized,
        R: Read,
    {
        self.decode_with(serializer, JsonLexer::from_reader(reader))
    }

    fn decode_with<S>(&self, serializer: &S, mut lexer: JsonLexer<'_>) -> Result<S::Value, Error>
    where
        S: Serializer + ?Sized,
    {
        let value = serializer.deserialize(&mut JsonDecoder::new(self, &mut lexer))?;
        lexer.expect_eof()?;
        Ok(value)
    }

    pub fn encode_to_element<S>(&self, serializer: &S, value: &S::Value) -> Result<JsonElement, Error>
    where
        S: Serializer + ?Sized,
    {
        let compact = self.clone().pretty_print(false);
        let text = compact.encode_to_string(serializer, value)?;
        self.parse_to_element(&text)
    }

    pub fn decode_from_element<S>(&self, serializer: &S, element: &JsonElement) -> Result<S::Value, Error>
    where
        S: Serializer + ?Sized,
    {
        let mut path = JsonPath::default();
        serializer.deserialize(&mut TreeDecoder::new(self, Some(element), &mut path, 0))
    }

    pub fn parse_to_element(&self, input: &str) -> Result<JsonElement, Error> {
        let mut lexer = JsonLexer::from_str(input);
        let element = lexer.parse_element(self.config.is_lenient())?;
        lexer.expect_eof()?;
        Ok(element)
    }
}

impl StringFormat for Json {
    fn config(&self) -> &Config {
        &self.config
    }

    fn serializers_module(&self) -> &SerializersModule {
        &self.module
    }

    fn encode_to_string<S>(&self, serializer: &S, value: &S::Value) -> Result<String, Error>
    where
        S: Serializer + ?Sized,
    {
        Json::encode_to_string(self, serializer, value)
    }

    fn decode_from_str<S>(&self, serializer: &S, input: &str) -> Result<S::Value, Error>
    where
        S: Serializer + ?Sized,
    {
        Json::decode_from_str(self, serializer, input)
    }
}

/// Shape of the structure being written or read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum WriteMode {
    Obj,
    List,
    Map,
    /// `["SerialName", {...}]`
    PolyObj,
}

impl WriteMode {
    pub(crate) fn begin(self) -> char {
        match self {
            WriteMode::Obj | WriteMode::Map => '{',
            WriteMode::List | WriteMode::PolyObj => '[',
        }
    }

    pub(crate) fn end(self) -> char {
        match self {
            WriteMode::Obj | WriteMode::Map => '}',
            WriteMode::List | WriteMode::PolyObj => ']',
        }
    }
}

/// Picks the mode for `descriptor`. Map keys must be primitives or enums,
/// since JSON object keys are strings.
pub(crate) fn switch_mode(descriptor: &SerialDescriptor) -> Result<WriteMode, String> {
    Ok(match descriptor.kind() {
        SerialKind::Polymorphic(_) => WriteMode::PolyObj,
        SerialKind::Structure(StructureKind::List) => WriteMode::List,
        SerialKind::Structure(StructureKind::Map) => {
            let key = descriptor.element_descriptor(0);
            match key.kind() {
                SerialKind::Primitive(_) | SerialKind::Enum | SerialKind::Contextual => WriteMode::Map,
                kind => {
                    return Err(format!(
                        "Value of type '{}' can't be used in JSON as a key in the map. \
                         It should have either primitive or enum kind, but its kind is '{kind}'",
                        key.serial_name()
                    ))
                }
            }
        }
        _ => WriteMode::Obj,
    })
}

/// Element index for `key`, honouring alternative names from
/// [`ElementAnnotation::JsonNames`].
pub(crate) fn element_index(descriptor: &SerialDescriptor, key: &str) -> Option<usize> {
    descriptor.get_element_index(key).or_else(|| {
        (0..descriptor.elements_count()).find(|&i| {
            descriptor.element_annotations(i).iter().any(|a| match a {
                ElementAnnotation::JsonNames(names) => names.contains(&key),
                _ => false,
            })
        })
    })
}
