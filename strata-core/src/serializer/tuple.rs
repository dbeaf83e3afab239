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

//! Tuples are classes with positional element names.

use crate::descriptor::SerialDescriptor;
use crate::encoding::{required, unknown_index, Decoder, ElementIndex, Encoder};
use crate::error::Error;
use crate::serializer::{Serializable, Serializer};

macro_rules! impl_tuple_serializer {
    ($ser:ident, $name:literal, $(($idx:tt, $field:literal, $s:ident, $t:ident, $var:ident)),+) => {
        #[doc = concat!("Serializer for ", $name, " tuples.")]
        #[derive(Clone, Copy, Debug, Default)]
        pub struct $ser<$($s),+>($(pub $s),+);

        impl<$($s: Serializer),+> Serializer for $ser<$($s),+> {
            type Value = ($($s::Value,)+);

            fn descriptor(&self) -> SerialDescriptor {
                SerialDescriptor::builder($name)
                    $(.element($field, self.$idx.descriptor(), false))+
                    .build()
            }

            fn serialize(&self, encoder: &mut dyn Encoder, value: &Self::Value) -> Result<(), Error> {
                let descriptor = self.descriptor();
                encoder.encode_structure(&descriptor, |c| {
                    $(c.encode_serializable_element(&descriptor, $idx, &self.$idx, &value.$idx)?;)+
                    Ok(())
                })
            }

            fn deserialize(&self, decoder: &mut dyn Decoder) -> Result<Self::Value, Error> {
                let descriptor = self.descriptor();
                decoder.decode_structure(&descriptor, |c| {
                    if c.decode_sequentially() {
                        return Ok(($(c.decode_serializable_element(&descriptor, $idx, &self.$idx)?,)+));
                    }
                    $(let mut $var = None;)+
                    loop {
                        match c.decode_element_index(&descriptor)? {
                            ElementIndex::Done => break,
                            $(ElementIndex::Element($idx) => {
                                $var = Some(c.decode_serializable_element(&descriptor, $idx, &self.$idx)?);
                            })+
                            ElementIndex::Element(i) => return Err(unknown_index(&descriptor, i)),
                        }
                    }
                    Ok(($(required(&descriptor, $idx, $var)?,)+))
                })
            }
        }

        impl<$($t: Serializable),+> Serializable for ($($t,)+) {
            type Serializer = $ser<$($t::Serializer),+>;

            fn serializer() -> Self::Serializer {
                $ser($($t::serializer()),+)
            }
        }
    };
}

impl_tuple_serializer!(PairSerializer, "Pair", (0, "first", SA, A, first), (1, "second", SB, B, second));
impl_tuple_serializer!(
    TripleSerializer,
    "Triple",
    (0, "first", SA, A, first),
    (1, "second", SB, B, second),
    (2, "third", SC, C, third)
);
