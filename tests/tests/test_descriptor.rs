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


mod test_helpers;

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;

use strata::{
    required, unknown_index, BinaryFormat, Cbor, Decoder, ElementIndex, Encoder, Error, Json, PrimitiveKind,
    SerialDescriptor, SerialKind, Serializable, Serializer, StringFormat, StructureKind,
};
use strata_core::descriptor::{DescriptorCache, LazyDescriptor};
use strata_core::serializer::ListSerializer;
use test_helpers::*;

#[derive(Debug, PartialEq)]
struct Node {
    value: i32,
    children: Vec<Node>,
}

#[derive(Clone, Copy)]
struct NodeSerializer;

fn children_serializer() -> ListSerializer<Vec<Node>, NodeSerializer> {
    ListSerializer::new("Vec", NodeSerializer)
}

impl Serializer for NodeSerializer {
    type Value = Node;

    fn descriptor(&self) -> SerialDescriptor {
        SerialDescriptor::builder("Node")
            .element("value", SerialDescriptor::primitive("i32", PrimitiveKind::Int), false)
            .element(
                "children",
                LazyDescriptor::deferred(|| children_serializer().descriptor()),
                true,
            )
            .build()
    }

    fn serialize(&self, encoder: &mut dyn Encoder, value: &Node) -> Result<(), Error> {
        let desc = self.descriptor();
        encoder.encode_structure(&desc, |s| {
            s.encode_i32_element(&desc, 0, value.value)?;
            if !value.children.is_empty() {
                s.encode_serializable_element(&desc, 1, &children_serializer(), &value.children)?;
            }
            Ok(())
        })
    }

    fn deserialize(&self, decoder: &mut dyn Decoder) -> Result<Node, Error> {
        let desc = self.descriptor();
        decoder.decode_structure(&desc, |s| {
            let mut value = None;
            let mut children = Vec::new();
            loop {
                match s.decode_element_index(&desc)? {
                    ElementIndex::Done => break,
                    ElementIndex::Element(0) => value = Some(s.decode_i32_element(&desc, 0)?),
                    ElementIndex::Element(1) => {
                        children = s.decode_serializable_element(&desc, 1, &children_serializer())?;
                    }
                    ElementIndex::Element(i) => return Err(unknown_index(&desc, i)),
                }
            }
            Ok(Node {
                value: required(&desc, 0, value)?,
                children,
            })
        })
    }
}

fn tree() -> Node {
    Node {
        value: 1,
        children: vec![
            Node {
                value: 2,
                children: vec![Node { value: 3, children: vec![] }],
            },
            Node { value: 4, children: vec![] },
        ],
    }
}

#[test]
fn test_recursive_descriptor() {
    let desc = NodeSerializer.descriptor();
    let children = desc.element_descriptor(1);
    assert_eq!(children.kind(), SerialKind::LIST);
    assert_eq!(children.element_descriptor(0).serial_name(), "Node");
    assert_eq!(children.element_descriptor(0), &desc);

    let json = Json::default();
    let text = json.encode_to_string(&NodeSerializer, &tree()).unwrap();
    assert_eq!(
        text,
        r#"{"value":1,"children":[{"value":2,"children":[{"value":3}]},{"value":4}]}"#
    );
    assert_eq!(json.decode_from_str(&NodeSerializer, &text).unwrap(), tree());

    let cbor = Cbor::default();
    let bytes = cbor.encode_to_bytes(&NodeSerializer, &tree()).unwrap();
    assert_eq!(cbor.decode_from_bytes(&NodeSerializer, &bytes).unwrap(), tree());
}

#[test]
fn test_builtin_descriptors() {
    let kind = |d: SerialDescriptor| d.kind();
    assert_eq!(kind(bool::serializer().descriptor()), SerialKind::Primitive(PrimitiveKind::Boolean));
    assert_eq!(kind(u8::serializer().descriptor()), SerialKind::Primitive(PrimitiveKind::Short));
    assert_eq!(kind(u32::serializer().descriptor()), SerialKind::Primitive(PrimitiveKind::Long));
    assert_eq!(kind(char::serializer().descriptor()), SerialKind::Primitive(PrimitiveKind::Char));
    assert_eq!(kind(<Vec<i32>>::serializer().descriptor()), SerialKind::LIST);
    assert_eq!(
        kind(<HashMap<String, i32>>::serializer().descriptor()),
        SerialKind::Structure(StructureKind::Map)
    );

    let option = <Option<String>>::serializer().descriptor();
    assert!(option.is_nullable());
    assert_eq!(option.non_nullable(), String::serializer().descriptor());
    assert_eq!(option.to_string(), "String?");

    let pair = <(i32, String)>::serializer().descriptor();
    assert_eq!(pair.kind(), SerialKind::CLASS);
    assert_eq!(pair.element_names().collect::<Vec<_>>(), vec!["first", "second"]);
    let triple = <(i32, String, bool)>::serializer().descriptor();
    assert_eq!(triple.get_element_index("third"), Some(2));

    let map = <HashMap<String, Vec<i32>>>::serializer().descriptor();
    assert_eq!(map.element_descriptor(5).kind(), SerialKind::LIST);
    assert_eq!(map.element_name(5), "5");
}

#[test]
fn test_class_descriptor() {
    let desc = Project::serializer().descriptor();
    assert_eq!(desc.serial_name(), "Project");
    assert_eq!(desc.elements_count(), 4);
    assert_eq!(desc.get_element_index("stars"), Some(2));
    assert_eq!(desc.get_element_index("missing"), None);
    assert!(!desc.is_element_optional(0));
    assert!(desc.is_element_optional(1));
    assert!(desc.element_descriptor(1).is_nullable());
    assert_eq!(format!("{desc:?}"), r#"Project(CLASS)["name", "language", "stars", "tags"]"#);
}

#[test]
fn test_enum_descriptor() {
    let desc = color_serializer().descriptor();
    assert_eq!(desc.kind(), SerialKind::Enum);
    assert_eq!(desc.element_name(2), "BLUE");
    assert_eq!(desc.element_descriptor(0).serial_name(), "Color.RED");
    assert_eq!(color_serializer().ordinal(&Color::Blue), Some(2));
}

#[test]
fn test_descriptor_cache() {
    let cache = Arc::new(DescriptorCache::new());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let cache = cache.clone();
            thread::spawn(move || cache.get_or_init::<Node, _>(|| NodeSerializer.descriptor()))
        })
        .collect();
    let descriptors: Vec<SerialDescriptor> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(descriptors.windows(2).all(|w| w[0].ptr_eq(&w[1])));
    assert_eq!(cache.len(), 1);
    assert!(cache.get::<Project>().is_none());
}
