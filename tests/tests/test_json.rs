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

use strata::{Error, Json, JsonElement, PolymorphicSerializer, Serializable, Serializer, StringFormat};
use strata_core::serializer::ListSerializer;
use test_helpers::*;

fn sample() -> Project {
    Project {
        name: "strata".to_string(),
        language: Some("rust".to_string()),
        stars: 5,
        tags: vec!["serde".to_string(), "codec".to_string()],
    }
}

#[test]
fn test_class_round_trip() {
    let json = Json::default();
    let text = json.encode(&sample()).unwrap();
    assert_eq!(
        text,
        r#"{"name":"strata","language":"rust","stars":5,"tags":["serde","codec"]}"#
    );
    let back: Project = json.decode(&text).unwrap();
    assert_eq!(back, sample());
}

#[test]
fn test_defaults_and_nulls() {
    let project = Project::new("bare");
    let json = Json::default();
    assert_eq!(
        json.encode(&project).unwrap(),
        r#"{"name":"bare","language":null,"stars":0,"tags":[]}"#
    );
    let compact = Json::default().omit_defaults(true);
    assert_eq!(compact.encode(&project).unwrap(), r#"{"name":"bare"}"#);

    let no_nulls = Json::default().explicit_nulls(false);
    assert_eq!(
        no_nulls.encode(&project).unwrap(),
        r#"{"name":"bare","stars":0,"tags":[]}"#
    );
    let back: Project = json.decode(r#"{"name":"bare"}"#).unwrap();
    assert_eq!(back, project);
}

#[test]
fn test_nested_collections() {
    let json = Json::default();
    let value: BTreeMap<String, Vec<Option<bool>>> =
        BTreeMap::from([("a".to_string(), vec![Some(true), None]), ("b".to_string(), vec![])]);
    let text = json.encode(&value).unwrap();
    assert_eq!(text, r#"{"a":[true,null],"b":[]}"#);
    let back: BTreeMap<String, Vec<Option<bool>>> = json.decode(&text).unwrap();
    assert_eq!(back, value);
}

#[test]
fn test_pretty_print() {
    let json = Json::default().pretty_print(true).explicit_nulls(false);
    let project = Project {
        stars: 1,
        tags: vec!["x".to_string()],
        ..Project::new("a")
    };
    let expected = "{\n    \"name\": \"a\",\n    \"stars\": 1,\n    \"tags\": [\n        \"x\"\n    ]\n}";
    assert_eq!(json.encode(&project).unwrap(), expected);
    let back: Project = json.decode(expected).unwrap();
    assert_eq!(back, project);

    let empty = Json::default().pretty_print(true).pretty_print_indent("  ");
    assert_eq!(empty.encode(&Vec::<i32>::new()).unwrap(), "[]");
}

#[test]
fn test_missing_required_field() {
    let err = Json::default().decode::<Project>(r#"{"stars":3}"#).unwrap_err();
    assert!(matches!(err, Error::MissingField { .. }), "{err}");
    assert_eq!(
        err.to_string(),
        "Field 'name' is required for type with serial name 'Project', but it was missing"
    );
}

#[test]
fn test_unknown_keys() {
    let input = r#"{"name":"a","extra":{"deep":[1,2,{"x":null}]},"stars":2}"#;
    let err = Json::default().decode::<Project>(input).unwrap_err();
    assert!(
        err.to_string().contains("Encountered an unknown key 'extra'"),
        "{err}"
    );
    let lenient = Json::default().ignore_unknown_keys(true);
    let project: Project = lenient.decode(input).unwrap();
    assert_eq!(project.stars, 2);
}

#[test]
fn test_error_path() {
    let input = r#"[{"name":"a"},{"name":"b","stars":"many"}]"#;
    let err = Json::default().decode::<Vec<Project>>(input).unwrap_err();
    match err {
        Error::JsonDecoding { path, .. } => assert_eq!(path, "$[1].stars"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_malformed_input() {
    let json = Json::default();
    for input in ["[1,2", "[1,,2]", "[1,]", r#"{"name" "a"}"#, "", "[1] 2"] {
        let err = json.decode::<Vec<i32>>(input).unwrap_err();
        assert!(err.is_malformed_data(), "{input}: {err}");
    }
}

#[test]
fn test_lenient_strings() {
    let lenient = Json::default().lenient(true);
    let project: Project = lenient.decode(r#"{name:strata,stars:4}"#).unwrap();
    assert_eq!(project.name, "strata");
    assert_eq!(project.stars, 4);
    assert!(Json::default().decode::<Project>(r#"{name:strata}"#).is_err());
}

#[test]
fn test_special_floats() {
    let strict = Json::default();
    assert!(strict.encode(&f64::NAN).is_err());
    let allowing = Json::default().allow_special_floats(true);
    assert_eq!(allowing.encode(&vec![f64::INFINITY]).unwrap(), "[Infinity]");
    let back: Vec<f64> = allowing.decode("[-Infinity]").unwrap();
    assert_eq!(back, vec![f64::NEG_INFINITY]);
}

#[test]
fn test_enum_by_name() {
    let json = Json::default();
    let colors = ListSerializer::<Vec<Color>, _>::new("Colors", color_serializer());
    let text = json
        .encode_to_string(&colors, &vec![Color::Green, Color::Blue])
        .unwrap();
    assert_eq!(text, r#"["GREEN","BLUE"]"#);
    let err = json.decode_from_str(&colors, r#"["PURPLE"]"#).unwrap_err();
    assert!(
        err.to_string().contains("Color does not contain element with name 'PURPLE'"),
        "{err}"
    );
}

#[test]
fn test_polymorphic_discriminator() {
    let json = Json::default().with_module(shapes_module());
    let shapes = ListSerializer::<Vec<Box<dyn Shape>>, _>::new(
        "Shapes",
        PolymorphicSerializer::<dyn Shape>::new(),
    );
    let value: Vec<Box<dyn Shape>> = vec![
        Box::new(Circle { radius: 1.5 }),
        Box::new(Rect { width: 2, height: 3 }),
    ];
    let text = json.encode_to_string(&shapes, &value).unwrap();
    assert_eq!(
        text,
        r#"[{"type":"circle","radius":1.5},{"type":"rect","width":2,"height":3}]"#
    );

    // The discriminator need not come first.
    let back = json
        .decode_from_str(&shapes, r#"[{"radius":1.5,"type":"circle"},{"width":2,"height":3,"type":"rect"}]"#)
        .unwrap();
    assert_eq!(as_circle(&*back[0]), Some(&Circle { radius: 1.5 }));
    assert_eq!(as_rect(&*back[1]), Some(&Rect { width: 2, height: 3 }));
}

#[test]
fn test_array_polymorphism() {
    let json = Json::default()
        .with_module(shapes_module())
        .use_array_polymorphism(true);
    let shape = PolymorphicSerializer::<dyn Shape>::new();
    let value: Box<dyn Shape> = Box::new(Rect { width: 1, height: 1 });
    let text = json.encode_to_string(&shape, &value).unwrap();
    assert_eq!(text, r#"["rect",{"width":1,"height":1}]"#);
    let back = json.decode_from_str(&shape, &text).unwrap();
    assert_eq!(back.area(), 1.0);
}

#[test]
fn test_unregistered_subclass() {
    let json = Json::default().with_module(shapes_module());
    let shape = PolymorphicSerializer::<dyn Shape>::new();
    let err = json
        .decode_from_str(&shape, r#"{"type":"triangle","a":1}"#)
        .unwrap_err();
    assert!(matches!(err, Error::SerializerNotFound { .. }), "{err}");
    assert!(err.to_string().contains("'triangle'"), "{err}");
}

#[test]
fn test_custom_discriminator() {
    let json = Json::default()
        .with_module(shapes_module())
        .class_discriminator("kind");
    let shape = PolymorphicSerializer::<dyn Shape>::new();
    let value: Box<dyn Shape> = Box::new(Circle { radius: 2.0 });
    let text = json.encode_to_string(&shape, &value).unwrap();
    assert_eq!(text, r#"{"kind":"circle","radius":2.0}"#);
}

#[test]
fn test_element_tree() {
    let json = Json::default();
    let element = json.encode_to_element(&Project::serializer(), &sample()).unwrap();
    let object = element.as_object().unwrap();
    assert_eq!(object.get("name").and_then(JsonElement::as_str), Some("strata"));
    assert_eq!(object.get("tags").and_then(JsonElement::as_array).map(<[_]>::len), Some(2));

    let back = json
        .decode_from_element(&Project::serializer(), &element)
        .unwrap();
    assert_eq!(back, sample());

    let parsed = json.parse_to_element(r#"{"a":[1,true,null]}"#).unwrap();
    assert_eq!(parsed.to_string(), r#"{"a":[1,true,null]}"#);
}

#[test]
fn test_streams() {
    let json = Json::default();
    let mut out = Vec::new();
    json.encode_to_writer(&Project::serializer(), &sample(), &mut out)
        .unwrap();
    let back = json
        .decode_from_reader(&Project::serializer(), out.as_slice())
        .unwrap();
    assert_eq!(back, sample());
}

#[test]
fn test_sample_brackets_balanced() {
    let sample = Sample {
        a: 1,
        b: vec![Some(true), None],
    };
    let json = Json::default();
    let text = json.encode_to_string(&SampleSerializer, &sample).unwrap();
    assert_eq!(text, r#"{"a":1,"b":[true,null]}"#);
    assert_eq!(json.decode_from_str(&SampleSerializer, &text).unwrap(), sample);
}
