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

/// Default cap for a single delimited message: 64 MiB.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 64 * 1024 * 1024;

/// What a decoder does with input keys or fields its descriptor does not declare.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum UnknownKeys {
    /// Skip the value and continue.
    Ignore,
    /// Fail with [`Error::UnknownField`](crate::error::Error::UnknownField)
    /// or a format decoding error.
    #[default]
    Fail,
}

/// Configuration shared by every format.
///
/// Each format reads the options that make sense for it and ignores the rest;
/// the format entry points (`Json`, `ProtoBuf`, `Cbor`, `Properties`) expose
/// builder setters for the options they honour.
#[derive(Clone, Debug)]
pub struct Config {
    /// Skip elements whose value equals their declared default on encode.
    pub omit_defaults: bool,
    /// Accept unquoted strings and keys in text input.
    pub lenient: bool,
    /// Policy for undeclared keys or fields.
    pub unknown_keys: UnknownKeys,
    /// Key carrying the polymorphic discriminator inside JSON objects.
    pub class_discriminator: String,
    /// Write `null` for absent nullable values. When disabled, nulls are
    /// omitted on encode and absent nullable elements decode as null.
    pub explicit_nulls: bool,
    /// Allow `NaN` and `Infinity` literals in JSON.
    pub allow_special_floats: bool,
    /// Encode polymorphic values as `["Name", {...}]` instead of an inline
    /// discriminator key.
    pub use_array_polymorphism: bool,
    /// Indent and line-break JSON output.
    pub pretty_print: bool,
    pub pretty_print_indent: String,
    /// Upper bound for one length-prefixed message.
    pub max_message_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            omit_defaults: false,
            lenient: false,
            unknown_keys: UnknownKeys::Fail,
            class_discriminator: "type".to_string(),
            explicit_nulls: true,
            allow_special_floats: false,
            use_array_polymorphism: false,
            pretty_print: false,
            pretty_print_indent: "    ".to_string(),
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }
}

impl Config {
    /// Creates a new Config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn omit_defaults(mut self, omit_defaults: bool) -> Self {
        self.omit_defaults = omit_defaults;
        self
    }

    pub fn lenient(mut self, lenient: bool) -> Self {
        self.lenient = lenient;
        self
    }

    pub fn unknown_keys(mut self, unknown_keys: UnknownKeys) -> Self {
        self.unknown_keys = unknown_keys;
        self
    }

    /// Shorthand for `unknown_keys(UnknownKeys::Ignore)`.
    pub fn ignore_unknown_keys(self, ignore: bool) -> Self {
        self.unknown_keys(if ignore {
            UnknownKeys::Ignore
        } else {
            UnknownKeys::Fail
        })
    }

    pub fn class_discriminator<S: Into<String>>(mut self, key: S) -> Self {
        self.class_discriminator = key.into();
        self
    }

    pub fn explicit_nulls(mut self, explicit_nulls: bool) -> Self {
        self.explicit_nulls = explicit_nulls;
        self
    }

    pub fn allow_special_floats(mut self, allow: bool) -> Self {
        self.allow_special_floats = allow;
        self
    }

    pub fn use_array_polymorphism(mut self, use_array: bool) -> Self {
        self.use_array_polymorphism = use_array;
        self
    }

    pub fn pretty_print(mut self, pretty_print: bool) -> Self {
        self.pretty_print = pretty_print;
        self
    }

    /// Indent unit for pretty printing. Only whitespace makes sense here.
    pub fn pretty_print_indent<S: Into<String>>(mut self, indent: S) -> Self {
        self.pretty_print_indent = indent.into();
        self
    }

    pub fn max_message_size(mut self, max_message_size: usize) -> Self {
        self.max_message_size = max_message_size;
        self
    }

    #[inline(always)]
    pub fn is_omit_defaults(&self) -> bool {
        self.omit_defaults
    }

    #[inline(always)]
    pub fn is_lenient(&self) -> bool {
        self.lenient
    }

    /// Check if unknown keys are skipped rather than rejected.
    #[inline(always)]
    pub fn is_ignore_unknown_keys(&self) -> bool {
        self.unknown_keys == UnknownKeys::Ignore
    }

    #[inline(always)]
    pub fn get_class_discriminator(&self) -> &str {
        &self.class_discriminator
    }

    #[inline(always)]
    pub fn is_explicit_nulls(&self) -> bool {
        self.explicit_nulls
    }

    #[inline(always)]
    pub fn is_allow_special_floats(&self) -> bool {
        self.allow_special_floats
    }

    #[inline(always)]
    pub fn is_use_array_polymorphism(&self) -> bool {
        self.use_array_polymorphism
    }

    #[inline(always)]
    pub fn is_pretty_print(&self) -> bool {
        self.pretty_print
    }

    #[inline(always)]
    pub fn get_max_message_size(&self) -> usize {
        self.max_message_size
    }
}
