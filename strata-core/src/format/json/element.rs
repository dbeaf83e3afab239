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


use std::fmt::{self, Write as _};

/// Parsed JSON value.
///
/// Numbers keep their literal text so that decoding to the target width
/// happens once, with the target's own range checks.
#[derive(Clone, Debug, PartialEq)]
pub enum JsonElement {
    Null,
    Bool(bool),
    /// Unquoted numeric literal, including `NaN` and `Infinity`.
    Number(String),
    String(String),
    Array(Vec<JsonElement>),
    Object(JsonObject),
}

impl JsonElement {
    /// Short name used in type-mismatch messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            JsonElement::Null => "JsonNull",
            JsonElement::Bool(_) | JsonElement::Number(_) | JsonElement::String(_) => "JsonPrimitive",
            JsonElement::Array(_) => "JsonArray",
            JsonElement::Object(_) => "JsonObject",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, JsonElement::Null)
    }

    pub fn as_object(&self) -> Option<&JsonObject> {
        match self {
            JsonElement::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[JsonElement]> {
        match self {
            JsonElement::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            JsonElement::String(s) => Some(s),
            _ => None,
        }
    }

    /// Text of a primitive and whether it was quoted. `None` for structures.
    pub(crate) fn primitive_content(&self) -> Option<(&str, bool)> {
        match self {
            JsonElement::Null => Some(("null", false)),
            JsonElement::Bool(true) => Some(("true", false)),
            JsonElement::Bool(false) => Some(("false", false)),
            JsonElement::Number(n) => Some((n, false)),
            JsonElement::String(s) => Some((s, true)),
            JsonElement::Array(_) | JsonElement::Object(_) => None,
        }
    }
}

impl From<bool> for JsonElement {
    fn from(v: bool) -> Self {
        JsonElement::Bool(v)
    }
}

impl From<&str> for JsonElement {
    fn from(v: &str) -> Self {
        JsonElement::String(v.to_string())
    }
}

impl From<String> for JsonElement {
    fn from(v: String) -> Self {
        JsonElement::String(v)
    }
}

impl From<i64> for JsonElement {
    fn from(v: i64) -> Self {
        JsonElement::Number(v.to_string())
    }
}

/// JSON object that keeps keys in insertion order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct JsonObject {
    entries: Vec<(String, JsonElement)>,
}

impl JsonObject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&JsonElement> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Inserts or replaces `key`, returning the previous value. A replaced
    /// key keeps its original position.
    pub fn insert<K: Into<String>>(&mut self, key: K, value: JsonElement) -> Option<JsonElement> {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<JsonElement> {
        let position = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(position).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &JsonElement)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub(crate) fn entry_at(&self, index: usize) -> Option<(&str, &JsonElement)> {
        self.entries.get(index).map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, JsonElement)> for JsonObject {
    fn from_iter<I: IntoIterator<Item = (String, JsonElement)>>(iter: I) -> Self {
        let mut object = JsonObject::new();
        for (k, v) in iter {
            object.insert(k, v);
        }
        object
    }
}

pub(crate) fn write_quoted(out: &mut String, value: &str) {
    out.push('"');
    let mut start = 0;
    for (i, b) in value.bytes().enumerate() {
        let escape = match b {
            b'"' => "\\\"",
            b'\\' => "\\\\",
            b'\n' => "\\n",
            b'\r' => "\\r",
            b'\t' => "\\t",
            0x08 => "\\b",
            0x0c => "\\f",
            0x00..=0x1f => "",
            _ => continue,
        };
        out.push_str(&value[start..i]);
        if escape.is_empty() {
            let _ = write!(out, "\\u{:04x}", b);
        } else {
            out.push_str(escape);
        }
        start = i + 1;
    }
    out.push_str(&value[start..]);
    out.push('"');
}

/// Compact JSON text.
impl fmt::Display for JsonElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsonElement::Null => f.write_str("null"),
            JsonElement::Bool(b) => write!(f, "{b}"),
            JsonElement::Number(n) => f.write_str(n),
            JsonElement::String(s) => {
                let mut out = String::with_capacity(s.len() + 2);
                write_quoted(&mut out, s);
                f.write_str(&out)
            }
            JsonElement::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            JsonElement::Object(object) => {
                f.write_str("{")?;
                for (i, (key, value)) in object.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    let mut quoted = String::with_capacity(key.len() + 2);
                    write_quoted(&mut quoted, key);
                    write!(f, "{quoted}:{value}")?;
                }
                f.write_str("}")
            }
        }
    }
}
