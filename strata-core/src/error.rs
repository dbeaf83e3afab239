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

//! Error type shared by every strata format.
//!
//! Constructors are marked `#[cold]` and `#[track_caller]`: they sit on every
//! buffer read and every token check, so keeping them out of line keeps the
//! successful paths tight.

use std::borrow::Cow;

use thiserror::Error;

/// Global flag to check if STRATA_PANIC_ON_ERROR environment variable is set at compile time.
/// Set STRATA_PANIC_ON_ERROR=1 at compile time to enable panic on error.
pub const PANIC_ON_ERROR: bool = option_env!("STRATA_PANIC_ON_ERROR").is_some();

/// Check if STRATA_PANIC_ON_ERROR environment variable is set.
#[inline(always)]
pub const fn should_panic_on_error() -> bool {
    PANIC_ON_ERROR
}

/// Error type for strata serialization and deserialization operations.
///
/// # Always use the constructor functions
///
/// Do not build variants with the enum syntax. Use the associated functions
/// instead, e.g. [`Error::missing_field`] or [`Error::json_decoding`]:
///
/// ```rust
/// use strata_core::error::Error;
///
/// let err = Error::missing_field("name", "com.example.User");
/// let err = Error::malformed_varint(12);
/// let err = Error::invalid_data(format!("bad tag {}", 0));
/// ```
///
/// ## Debug mode: STRATA_PANIC_ON_ERROR
///
/// Building with `STRATA_PANIC_ON_ERROR` set makes every constructor panic at
/// the place the error is created, which gives a full stack trace:
///
/// ```bash
/// RUST_BACKTRACE=1 STRATA_PANIC_ON_ERROR=1 cargo test
/// ```
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// One or more required elements never arrived while decoding.
    ///
    /// Do not construct this variant directly; use [`Error::missing_field`] or
    /// [`Error::missing_fields`] instead.
    #[error("{}", missing_message(.fields, .serial_name))]
    MissingField {
        fields: Vec<String>,
        serial_name: String,
    },

    /// The input contains an element the descriptor does not declare.
    ///
    /// Do not construct this variant directly; use [`Error::unknown_field`] instead.
    #[error("Encountered an unknown field '{field}' for type with serial name '{serial_name}'{location}")]
    UnknownField {
        field: String,
        serial_name: String,
        location: String,
    },

    /// A deserializer was handed an element index it has no slot for.
    ///
    /// Do not construct this variant directly; use [`Error::unknown_element_index`] instead.
    #[error("Unexpected element index {index} for type with serial name '{serial_name}'")]
    UnknownElementIndex { index: usize, serial_name: String },

    /// Polymorphic or contextual resolution failed.
    ///
    /// Do not construct this variant directly; use [`Error::serializer_not_found`] instead.
    #[error("Serializer for '{subject}' is not found in the scope of '{base}'")]
    SerializerNotFound { subject: String, base: String },

    /// A registry received two unequal serializers for the same key.
    ///
    /// Do not construct this variant directly; use [`Error::duplicate_serializer`] instead.
    #[error("{0}")]
    DuplicateSerializer(Cow<'static, str>),

    /// Varint longer than the maximum width of its target type.
    ///
    /// Do not construct this variant directly; use [`Error::malformed_varint`] instead.
    #[error("Malformed varint at offset {0}: continuation bit set past the maximum width")]
    MalformedVarint(usize),

    /// Input ended in the middle of a primitive.
    ///
    /// Do not construct this variant directly; use [`Error::unexpected_eof`] instead.
    #[error("Unexpected end of input at offset {offset}: {needed} more byte(s) required")]
    UnexpectedEof { offset: usize, needed: usize },

    /// Malformed JSON input, a JSON type mismatch or an unknown key in strict mode.
    ///
    /// Do not construct this variant directly; use [`Error::json_decoding`] instead.
    #[error("Unexpected JSON token at offset {offset}: {message} at path: {path}")]
    JsonDecoding {
        offset: usize,
        message: Cow<'static, str>,
        path: String,
    },

    /// Malformed protobuf input.
    ///
    /// Do not construct this variant directly; use [`Error::protobuf_decoding`] instead.
    #[error("Malformed protobuf input at offset {offset}: {message}")]
    ProtobufDecoding {
        offset: usize,
        message: Cow<'static, str>,
    },

    /// Malformed CBOR input.
    ///
    /// Do not construct this variant directly; use [`Error::cbor_decoding`] instead.
    #[error("Expected {expected}, but found {found:#04x}")]
    CborDecoding { expected: Cow<'static, str>, found: u8 },

    /// A property value that cannot be parsed as the requested type.
    ///
    /// Do not construct this variant directly; use [`Error::properties_decoding`] instead.
    #[error("Invalid value for property '{key}': {message}")]
    PropertiesDecoding {
        key: String,
        message: Cow<'static, str>,
    },

    /// The value cannot be expressed by the target format.
    ///
    /// Do not construct this variant directly; use [`Error::encoding`] instead.
    #[error("{0}")]
    Encoding(Cow<'static, str>),

    /// A delimited stream ended in the middle of a length prefix or a payload.
    ///
    /// Do not construct this variant directly; use [`Error::truncated_message`] instead.
    #[error("Truncated message: expected {expected} byte(s), got {received}")]
    TruncatedMessage { expected: usize, received: usize },

    /// A delimited message declares a length above the configured maximum.
    ///
    /// Do not construct this variant directly; use [`Error::message_too_large`] instead.
    #[error("Message of {length} bytes exceeds the maximum message size of {limit} bytes")]
    MessageTooLarge { length: u64, limit: usize },

    /// Generic invalid or corrupted data.
    ///
    /// Do not construct this variant directly; use [`Error::invalid_data`] instead.
    #[error("{0}")]
    InvalidData(Cow<'static, str>),

    /// Operation not supported by the format.
    ///
    /// Do not construct this variant directly; use [`Error::unsupported`] instead.
    #[error("{0}")]
    Unsupported(Cow<'static, str>),

    /// I/O failure of an underlying reader or writer.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn missing_message(fields: &[String], serial_name: &str) -> String {
    match fields {
        [single] => format!(
            "Field '{single}' is required for type with serial name '{serial_name}', but it was missing"
        ),
        _ => format!(
            "Fields {fields:?} are required for type with serial name '{serial_name}', but they were missing"
        ),
    }
}

macro_rules! panic_on_error {
    ($err:expr) => {{
        let err = $err;
        if PANIC_ON_ERROR {
            panic!("STRATA_PANIC_ON_ERROR: {}", err);
        }
        err
    }};
}

impl Error {
    /// Creates a new [`Error::MissingField`] for a single field.
    ///
    /// # Example
    /// ```
    /// use strata_core::error::Error;
    ///
    /// let err = Error::missing_field("id", "com.example.User");
    /// assert!(err.to_string().contains("'id'"));
    /// ```
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn missing_field<F: Into<String>, N: Into<String>>(field: F, serial_name: N) -> Self {
        panic_on_error!(Error::MissingField {
            fields: vec![field.into()],
            serial_name: serial_name.into(),
        })
    }

    /// Creates a new [`Error::MissingField`] listing every absent field.
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn missing_fields<N: Into<String>>(fields: Vec<String>, serial_name: N) -> Self {
        panic_on_error!(Error::MissingField {
            fields,
            serial_name: serial_name.into(),
        })
    }

    /// Creates a new [`Error::UnknownField`].
    ///
    /// `location` is appended verbatim and may be empty; formats use it for
    /// paths and byte offsets.
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn unknown_field<F: Into<String>, N: Into<String>, L: Into<String>>(
        field: F,
        serial_name: N,
        location: L,
    ) -> Self {
        panic_on_error!(Error::UnknownField {
            field: field.into(),
            serial_name: serial_name.into(),
            location: location.into(),
        })
    }

    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn unknown_element_index<N: Into<String>>(index: usize, serial_name: N) -> Self {
        panic_on_error!(Error::UnknownElementIndex {
            index,
            serial_name: serial_name.into(),
        })
    }

    /// Creates a new [`Error::SerializerNotFound`].
    ///
    /// # Example
    /// ```
    /// use strata_core::error::Error;
    ///
    /// let err = Error::serializer_not_found("Dog", "Animal");
    /// assert!(err.to_string().contains("Animal"));
    /// ```
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn serializer_not_found<S: Into<String>, B: Into<String>>(subject: S, base: B) -> Self {
        panic_on_error!(Error::SerializerNotFound {
            subject: subject.into(),
            base: base.into(),
        })
    }

    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn duplicate_serializer<S: Into<Cow<'static, str>>>(s: S) -> Self {
        panic_on_error!(Error::DuplicateSerializer(s.into()))
    }

    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn malformed_varint(offset: usize) -> Self {
        panic_on_error!(Error::MalformedVarint(offset))
    }

    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn unexpected_eof(offset: usize, needed: usize) -> Self {
        panic_on_error!(Error::UnexpectedEof { offset, needed })
    }

    /// Creates a new [`Error::JsonDecoding`].
    ///
    /// # Example
    /// ```
    /// use strata_core::error::Error;
    ///
    /// let err = Error::json_decoding(7, "Expected ':'", "$.data");
    /// assert!(err.to_string().contains("$.data"));
    /// ```
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn json_decoding<M: Into<Cow<'static, str>>, P: Into<String>>(
        offset: usize,
        message: M,
        path: P,
    ) -> Self {
        panic_on_error!(Error::JsonDecoding {
            offset,
            message: message.into(),
            path: path.into(),
        })
    }

    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn protobuf_decoding<M: Into<Cow<'static, str>>>(offset: usize, message: M) -> Self {
        panic_on_error!(Error::ProtobufDecoding {
            offset,
            message: message.into(),
        })
    }

    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn cbor_decoding<E: Into<Cow<'static, str>>>(expected: E, found: u8) -> Self {
        panic_on_error!(Error::CborDecoding {
            expected: expected.into(),
            found,
        })
    }

    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn properties_decoding<K: Into<String>, M: Into<Cow<'static, str>>>(
        key: K,
        message: M,
    ) -> Self {
        panic_on_error!(Error::PropertiesDecoding {
            key: key.into(),
            message: message.into(),
        })
    }

    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn encoding<S: Into<Cow<'static, str>>>(s: S) -> Self {
        panic_on_error!(Error::Encoding(s.into()))
    }

    /// Creates a new [`Error::TruncatedMessage`].
    ///
    /// Only framing readers raise this; a clean end of stream between two
    /// messages is not an error.
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn truncated_message(expected: usize, received: usize) -> Self {
        panic_on_error!(Error::TruncatedMessage { expected, received })
    }

    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn message_too_large(length: u64, limit: usize) -> Self {
        panic_on_error!(Error::MessageTooLarge { length, limit })
    }

    /// Creates a new [`Error::InvalidData`] from a string or static message.
    ///
    /// # Example
    /// ```
    /// use strata_core::error::Error;
    ///
    /// let err = Error::invalid_data("Invalid data format");
    /// let err = Error::invalid_data(format!("Invalid data at position {}", 42));
    /// ```
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn invalid_data<S: Into<Cow<'static, str>>>(s: S) -> Self {
        panic_on_error!(Error::InvalidData(s.into()))
    }

    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn unsupported<S: Into<Cow<'static, str>>>(s: S) -> Self {
        panic_on_error!(Error::Unsupported(s.into()))
    }

    /// Returns `true` for the malformed-input family of errors.
    pub fn is_malformed_data(&self) -> bool {
        matches!(
            self,
            Error::MalformedVarint(_)
                | Error::UnexpectedEof { .. }
                | Error::JsonDecoding { .. }
                | Error::ProtobufDecoding { .. }
                | Error::CborDecoding { .. }
                | Error::PropertiesDecoding { .. }
                | Error::InvalidData(_)
        )
    }
}

/// Ensures a condition is true; otherwise returns an [`enum@Error`].
///
/// # Examples
/// ```
/// use strata_core::ensure;
/// use strata_core::error::Error;
///
/// fn check_value(n: i32) -> Result<(), Error> {
///     ensure!(n > 0, "value must be positive");
///     ensure!(n < 10, "value {} too large", n);
///     Ok(())
/// }
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $msg:literal) => {
        if !$cond {
            return Err($crate::error::Error::invalid_data($msg));
        }
    };
    ($cond:expr, $err:expr) => {
        if !$cond {
            return Err($err);
        }
    };
    ($cond:expr, $fmt:expr, $($arg:tt)*) => {
        if !$cond {
            return Err($crate::error::Error::invalid_data(format!($fmt, $($arg)*)));
        }
    };
}

/// Returns early with an [`enum@Error`].
///
/// # Examples
/// ```
/// use strata_core::bail;
/// use strata_core::error::Error;
///
/// fn fail_fast() -> Result<(), Error> {
///     bail!("something went wrong");
/// }
/// ```
#[macro_export]
macro_rules! bail {
    ($err:expr) => {
        return Err($crate::error::Error::invalid_data($err))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::error::Error::invalid_data(format!($fmt, $($arg)*)))
    };
}
