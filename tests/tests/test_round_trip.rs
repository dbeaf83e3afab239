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
use std::fmt::Debug;

use proptest::collection::{btree_map, vec};
use proptest::option;
use proptest::prelude::*;
use strata::{BinaryFormat, Cbor, Json, Properties, ProtoBuf, Serializable, StringFormat};
use test_helpers::*;

fn project() -> impl Strategy<Value = Project> {
    (".*", option::of(".*"), any::<i32>(), vec(".*", 0..4)).prop_map(|(name, language, stars, tags)| Project {
        name,
        language,
        stars,
        tags,
    })
}

fn sample() -> impl Strategy<Value = Sample> {
    (any::<i32>(), vec(option::of(any::<bool>()), 0..6)).prop_map(|(a, b)| Sample { a, b })
}

fn json<T: Serializable + PartialEq + Debug>(value: &T) -> T {
    let json = Json::default();
    let text = json.encode(value).unwrap();
    json.decode(&text).unwrap()
}

fn protobuf<T: Serializable + PartialEq + Debug>(value: &T) -> T {
    let proto = ProtoBuf::default();
    proto.decode(&proto.encode(value).unwrap()).unwrap()
}

fn cbor<T: Serializable + PartialEq + Debug>(value: &T) -> T {
    let cbor = Cbor::default();
    cbor.decode(&cbor.encode(value).unwrap()).unwrap()
}

/// Only structures flatten to properties.
fn properties<T: Serializable + PartialEq + Debug>(value: &T) -> T {
    let properties = Properties::default();
    properties.decode(&properties.encode(value).unwrap()).unwrap()
}

proptest! {
    #[test]
    fn project_round_trips(value in project()) {
        prop_assert_eq!(&json(&value), &value);
        prop_assert_eq!(&protobuf(&value), &value);
        prop_assert_eq!(&cbor(&value), &value);
        prop_assert_eq!(&properties(&value), &value);
    }

    #[test]
    fn sample_round_trips(value in sample()) {
        let json = Json::default();
        let text = json.encode_to_string(&SampleSerializer, &value).unwrap();
        prop_assert_eq!(&json.decode_from_str(&SampleSerializer, &text).unwrap(), &value);

        let proto = ProtoBuf::default();
        let bytes = proto.encode_to_bytes(&SampleSerializer, &value).unwrap();
        prop_assert_eq!(&proto.decode_from_bytes(&SampleSerializer, &bytes).unwrap(), &value);

        let cbor = Cbor::default();
        let bytes = cbor.encode_to_bytes(&SampleSerializer, &value).unwrap();
        prop_assert_eq!(&cbor.decode_from_bytes(&SampleSerializer, &bytes).unwrap(), &value);

        let properties = Properties::default();
        let map = properties.encode_to_map(&SampleSerializer, &value).unwrap();
        prop_assert_eq!(&properties.decode_from_map(&SampleSerializer, &map).unwrap(), &value);
    }

    #[test]
    fn nullable_longs_round_trip(value in vec(option::of(any::<i64>()), 0..8)) {
        prop_assert_eq!(&json(&value), &value);
        prop_assert_eq!(&protobuf(&value), &value);
        prop_assert_eq!(&cbor(&value), &value);
        let record = (0i32, value);
        prop_assert_eq!(&properties(&record), &record);
    }

    #[test]
    fn string_maps_round_trip(value in btree_map(".*", any::<i32>(), 0..6)) {
        prop_assert_eq!(&json(&value), &value);
        prop_assert_eq!(&protobuf(&value), &value);
        prop_assert_eq!(&cbor(&value), &value);
        let record = (0i32, value);
        prop_assert_eq!(&properties(&record), &record);
    }

    #[test]
    fn records_of_projects_round_trip(
        id in any::<i64>(),
        projects in vec(project(), 0..3),
        scores in btree_map("[a-z]{1,8}", any::<f64>().prop_filter("JSON has no literal for non-finite numbers", |f| f.is_finite()), 0..4),
    ) {
        let value = (id, projects, scores);
        prop_assert_eq!(&json(&value), &value);
        prop_assert_eq!(&protobuf(&value), &value);
        prop_assert_eq!(&cbor(&value), &value);
        prop_assert_eq!(&properties(&value), &value);
    }
}

#[test]
fn properties_map_keys_are_stored_as_values() {
    let map: BTreeMap<String, i32> = [("a.b".to_string(), 1), (String::new(), 2)].into_iter().collect();
    let record = (7i32, map);
    assert_eq!(properties(&record), record);
}
