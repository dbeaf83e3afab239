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

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Boolean,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Char,
    String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StructureKind {
    /// A type with named elements.
    Class,
    /// A singleton with no elements.
    Object,
    /// Homogeneous sequence; every index maps to the same element descriptor.
    List,
    /// Key/value pairs; even indices are keys and odd indices are values.
    Map,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PolymorphicKind {
    /// Closed set of subclasses known to the serializer itself.
    Sealed,
    /// Subclasses resolved through a [`SerializersModule`](crate::module::SerializersModule).
    Open,
}

/// Shape category of a [`SerialDescriptor`](super::SerialDescriptor).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SerialKind {
    Primitive(PrimitiveKind),
    Structure(StructureKind),
    Enum,
    Polymorphic(PolymorphicKind),
    /// Resolved at runtime from the serializers module.
    Contextual,
}

impl SerialKind {
    pub const CLASS: SerialKind = SerialKind::Structure(StructureKind::Class);
    pub const OBJECT: SerialKind = SerialKind::Structure(StructureKind::Object);
    pub const LIST: SerialKind = SerialKind::Structure(StructureKind::List);
    pub const MAP: SerialKind = SerialKind::Structure(StructureKind::Map);

    #[inline]
    pub fn is_primitive(self) -> bool {
        matches!(self, SerialKind::Primitive(_))
    }

    #[inline]
    pub fn is_collection(self) -> bool {
        matches!(
            self,
            SerialKind::Structure(StructureKind::List | StructureKind::Map)
        )
    }

    #[inline]
    pub fn is_polymorphic(self) -> bool {
        matches!(self, SerialKind::Polymorphic(_))
    }
}

impl fmt::Display for SerialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SerialKind::Primitive(PrimitiveKind::Boolean) => "BOOLEAN",
            SerialKind::Primitive(PrimitiveKind::Byte) => "BYTE",
            SerialKind::Primitive(PrimitiveKind::Short) => "SHORT",
            SerialKind::Primitive(PrimitiveKind::Int) => "INT",
            SerialKind::Primitive(PrimitiveKind::Long) => "LONG",
            SerialKind::Primitive(PrimitiveKind::Float) => "FLOAT",
            SerialKind::Primitive(PrimitiveKind::Double) => "DOUBLE",
            SerialKind::Primitive(PrimitiveKind::Char) => "CHAR",
            SerialKind::Primitive(PrimitiveKind::String) => "STRING",
            SerialKind::Structure(StructureKind::Class) => "CLASS",
            SerialKind::Structure(StructureKind::Object) => "OBJECT",
            SerialKind::Structure(StructureKind::List) => "LIST",
            SerialKind::Structure(StructureKind::Map) => "MAP",
            SerialKind::Enum => "ENUM",
            SerialKind::Polymorphic(PolymorphicKind::Sealed) => "SEALED",
            SerialKind::Polymorphic(PolymorphicKind::Open) => "OPEN",
            SerialKind::Contextual => "CONTEXTUAL",
        };
        f.write_str(name)
    }
}

impl From<PrimitiveKind> for SerialKind {
    fn from(kind: PrimitiveKind) -> Self {
        SerialKind::Primitive(kind)
    }
}

impl From<StructureKind> for SerialKind {
    fn from(kind: StructureKind) -> Self {
        SerialKind::Structure(kind)
    }
}

impl From<PolymorphicKind> for SerialKind {
    fn from(kind: PolymorphicKind) -> Self {
        SerialKind::Polymorphic(kind)
    }
}
