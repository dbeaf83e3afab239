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

pub mod collection;
mod contextual;
mod core;
mod enum_;
pub mod map;
mod object;
mod option;
mod polymorphic;
mod primitive;
mod tuple;

pub use self::core::{
    same_serializer, AnySerializer, AsAny, DynSerializer, Serializable, Serializer,
};
pub use collection::{ListSerializer, VecSerializer};
pub use contextual::ContextualSerializer;
pub use enum_::EnumSerializer;
pub use map::MapSerializer;
pub use object::ObjectSerializer;
pub use option::{BoxSerializer, NullableSerializer};
pub use polymorphic::{PolymorphicSerializer, SealedSerializer, SealedSerializerBuilder};
pub use primitive::{
    BoolSerializer, CharSerializer, F32Serializer, F64Serializer, I16Serializer, I32Serializer,
    I64Serializer, I8Serializer, StringSerializer, U16Serializer, U32Serializer, U64Serializer,
    U8Serializer,
};
pub use tuple::{PairSerializer, TripleSerializer};

/// Default serializer of `T`.
#[inline(always)]
pub fn serializer<T: Serializable>() -> T::Serializer {
    T::serializer()
}
