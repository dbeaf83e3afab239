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

use std::collections::BTreeMap;

use strata::{Error, Properties, Serializable};
use test_helpers::*;

fn map(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn test_flat_keys() {
    let properties = Properties::default();
    let project = Project {
        name: "strata".to_string(),
        language: Some("rust".to_string()),
        stars: 5,
        tags: vec!["serde".to_string(), "codec".to_string()],
    };
    let encoded = properties.encode(&project).unwrap();
    assert_eq!(
        encoded,
        map(&[
            ("name", "strata"),
            ("language", "rust"),
            ("stars", "5"),
            ("tags.0", "serde"),
            ("tags.1", "codec"),
            ("tags.size", "2"),
        ])
    );
    assert_eq!(properties.decode::<Project>(&encoded).unwrap(), project);
}

#[test]
fn test_nested_structures() {
    let properties = Properties::default().omit_defaults(true);
    let value = (1i32, vec![Project::new("a"), Project::new("b")]);
    let serializer = <(i32, Vec<Project>)>::serializer();
    let encoded = properties.encode_to_map(&serializer, &value).unwrap();
    assert_eq!(
        encoded,
        map(&[
            ("first", "1"),
            ("second.0.name", "a"),
            ("second.1.name", "b"),
            ("second.size", "2"),
        ])
    );
    assert_eq!(properties.decode_from_map(&serializer, &encoded).unwrap(), value);
}

#[test]
fn test_maps() {
    let properties = Properties::default();
    let value = (
        BTreeMap::from([("k".to_string(), 1i64), ("l".to_string(), 2)]),
        'c',
    );
    let serializer = <(BTreeMap<String, i64>, char)>::serializer();
    let encoded = properties.encode_to_map(&serializer, &value).unwrap();
    assert_eq!(
        encoded,
        map(&[
            ("first.0", "k"),
            ("first.1", "1"),
            ("first.2", "l"),
            ("first.3", "2"),
            ("first.size", "2"),
            ("second", "c"),
        ])
    );
    assert_eq!(properties.decode_from_map(&serializer, &encoded).unwrap(), value);
}

#[test]
fn test_missing_size_counts_present_indices() {
    let properties = Properties::default();
    let input = map(&[("name", "x"), ("tags.0", "a"), ("tags.1", "b")]);
    let project = properties.decode::<Project>(&input).unwrap();
    assert_eq!(project.tags, vec!["a".to_string(), "b".to_string()]);
}

#[test]
fn test_nulls_are_omitted() {
    let properties = Properties::default();
    let encoded = properties.encode(&Project::new("x")).unwrap();
    assert!(!encoded.contains_key("language"));
    assert_eq!(properties.decode::<Project>(&encoded).unwrap(), Project::new("x"));
}

#[test]
fn test_invalid_values() {
    let properties = Properties::default();
    let err = properties
        .decode::<Project>(&map(&[("name", "x"), ("stars", "many")]))
        .unwrap_err();
    assert!(matches!(err, Error::PropertiesDecoding { ref key, .. } if key == "stars"), "{err}");

    let err = properties.decode::<Project>(&map(&[("stars", "1")])).unwrap_err();
    assert!(matches!(err, Error::MissingField { .. }), "{err}");
}

#[test]
fn test_top_level_must_be_a_structure() {
    let properties = Properties::default();
    assert!(matches!(properties.encode(&1i32), Err(Error::Unsupported(_))));
    assert!(properties.encode(&vec![1i32]).is_err());
}

#[test]
fn test_declared_size_beyond_stored_entries() {
    let properties = Properties::default();
    let input = map(&[("first", "1"), ("second.size", "1000000000000")]);
    let err = properties.decode::<(i32, Vec<String>)>(&input).unwrap_err();
    assert!(
        matches!(err, Error::PropertiesDecoding { ref key, .. } if key == "second.size"),
        "{err}"
    );

    let input = map(&[("first", "1"), ("second.size", "2"), ("second.0", "a")]);
    assert!(properties.decode::<(i32, Vec<String>)>(&input).is_err());

    let input = map(&[("first", "1"), ("second.size", "2"), ("second.0", "a"), ("second.1", "b")]);
    let (first, second) = properties.decode::<(i32, Vec<String>)>(&input).unwrap();
    assert_eq!((first, second), (1, vec!["a".to_string(), "b".to_string()]));
}

#[test]
fn test_null_elements_are_bounded_by_message_size() {
    let value = (1i32, vec![Some(1i32), None, None]);
    let properties = Properties::default();
    let encoded = properties.encode(&value).unwrap();
    assert_eq!(encoded.get("second.size").map(String::as_str), Some("3"));
    assert_eq!(properties.decode::<(i32, Vec<Option<i32>>)>(&encoded).unwrap(), value);

    let tight = Properties::default().max_message_size(2);
    let err = tight.decode::<(i32, Vec<Option<i32>>)>(&encoded).unwrap_err();
    assert!(matches!(err, Error::PropertiesDecoding { .. }), "{err}");
}
