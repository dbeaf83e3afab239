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

/// Integer wire encoding for protobuf fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum ProtoIntegerType {
    /// Plain varint; negative numbers take ten bytes.
    #[default]
    Default,
    /// Zig-zag varint (`sint32`/`sint64`).
    Signed,
    /// Little-endian fixed width (`fixed32`/`fixed64`).
    Fixed,
}

/// Format hints attached to a descriptor or one of its elements.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ElementAnnotation {
    /// Explicit protobuf field number.
    ProtoNumber(u32),
    ProtoType(ProtoIntegerType),
    /// Write a primitive repeated field as one length-delimited run.
    ProtoPacked,
    /// Extra keys accepted for this element when decoding JSON.
    JsonNames(Vec<&'static str>),
}

pub(crate) fn proto_number(annotations: &[ElementAnnotation]) -> Option<u32> {
    annotations.iter().find_map(|a| match a {
        ElementAnnotation::ProtoNumber(n) => Some(*n),
        _ => None,
    })
}

pub(crate) fn proto_integer_type(annotations: &[ElementAnnotation]) -> ProtoIntegerType {
    annotations
        .iter()
        .find_map(|a| match a {
            ElementAnnotation::ProtoType(t) => Some(*t),
            _ => None,
        })
        .unwrap_or_default()
}

pub(crate) fn is_packed(annotations: &[ElementAnnotation]) -> bool {
    annotations
        .iter()
        .any(|a| matches!(a, ElementAnnotation::ProtoPacked))
}
