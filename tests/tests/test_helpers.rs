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


#![allow(dead_code)]

use std::sync::OnceLock;

use strata::{
    required, unknown_index, AsAny, Decoder, ElementIndex, Encoder, Error, PrimitiveKind, SerialDescriptor,
    Serializable, Serializer,
};
use strata_core::serializer::{EnumSerializer, StringSerializer};

fn string() -> SerialDescriptor {
    SerialDescriptor::primitive("String", PrimitiveKind::String)
}

fn int() -> SerialDescriptor {
    SerialDescriptor::primitive("i32", PrimitiveKind::Int)
}

/// `name` is required; every other field has a default.
#[derive(Clone, Debug, PartialEq)]
pub struct Project {
    pub name: String,
    pub language: Option<String>,
    pub stars: i32,
    pub tags: Vec<String>,
}

impl Project {
    pub fn new(name: &str) -> Self {
        Project {
            name: name.to_string(),
            language: None,
            stars: 0,
            tags: Vec::new(),
        }
    }
}

#[derive(Clone, Copy, Default)]
pub struct ProjectSerializer;

impl Serializer for ProjectSerializer {
    type Value = Project;

    fn descriptor(&self) -> SerialDescriptor {
        static DESCRIPTOR: OnceLock<SerialDescriptor> = OnceLock::new();
        DESCRIPTOR
            .get_or_init(|| {
                SerialDescriptor::builder("Project")
                    .element("name", string(), false)
                    .element("language", string().nullable(), true)
                    .element("stars", int(), true)
                    .element("tags", <Vec<String>>::serializer().descriptor(), true)
                    .build()
            })
            .clone()
    }

    fn serialize(&self, encoder: &mut dyn Encoder, value: &Project) -> Result<(), Error> {
        let desc = self.descriptor();
        encoder.encode_structure(&desc, |s| {
            s.encode_str_element(&desc, 0, &value.name)?;
            if value.language.is_some() || s.should_encode_element_default(&desc, 1) {
                s.encode_nullable_serializable_element(&desc, 1, &StringSerializer, value.language.as_ref())?;
            }
            if value.stars != 0 || s.should_encode_element_default(&desc, 2) {
                s.encode_i32_element(&desc, 2, value.stars)?;
            }
            if !value.tags.is_empty() || s.should_encode_element_default(&desc, 3) {
                s.encode_serializable_element(&desc, 3, &<Vec<String>>::serializer(), &value.tags)?;
            }
            Ok(())
        })
    }

    fn deserialize(&self, decoder: &mut dyn Decoder) -> Result<Project, Error> {
        let desc = self.descriptor();
        decoder.decode_structure(&desc, |s| {
            let mut name = None;
            let mut project = Project::new("");
            loop {
                match s.decode_element_index(&desc)? {
                    ElementIndex::Done => break,
                    ElementIndex::Element(0) => name = Some(s.decode_string_element(&desc, 0)?),
                    ElementIndex::Element(1) => {
                        project.language = s.decode_nullable_serializable_element(&desc, 1, &StringSerializer)?;
                    }
                    ElementIndex::Element(2) => project.stars = s.decode_i32_element(&desc, 2)?,
                    ElementIndex::Element(3) => {
                        project.tags = s.decode_serializable_element(&desc, 3, &<Vec<String>>::serializer())?;
                    }
                    ElementIndex::Element(i) => return Err(unknown_index(&desc, i)),
                }
            }
            project.name = required(&desc, 0, name)?;
            Ok(project)
        })
    }
}

impl Serializable for Project {
    type Serializer = ProjectSerializer;

    fn serializer() -> ProjectSerializer {
        ProjectSerializer
    }
}

/// `{"a": 1, "b": [true, null]}`-shaped record.
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    pub a: i32,
    pub b: Vec<Option<bool>>,
}

pub struct SampleSerializer;

impl Serializer for SampleSerializer {
    type Value = Sample;

    fn descriptor(&self) -> SerialDescriptor {
        SerialDescriptor::builder("Sample")
            .element("a", int(), false)
            .element("b", <Vec<Option<bool>>>::serializer().descriptor(), false)
            .build()
    }

    fn serialize(&self, encoder: &mut dyn Encoder, value: &Sample) -> Result<(), Error> {
        let desc = self.descriptor();
        encoder.encode_structure(&desc, |s| {
            s.encode_i32_element(&desc, 0, value.a)?;
            s.encode_serializable_element(&desc, 1, &<Vec<Option<bool>>>::serializer(), &value.b)
        })
    }

    fn deserialize(&self, decoder: &mut dyn Decoder) -> Result<Sample, Error> {
        let desc = self.descriptor();
        decoder.decode_structure(&desc, |s| {
            let (mut a, mut b) = (None, None);
            loop {
                match s.decode_element_index(&desc)? {
                    ElementIndex::Done => break,
                    ElementIndex::Element(0) => a = Some(s.decode_i32_element(&desc, 0)?),
                    ElementIndex::Element(1) => {
                        b = Some(s.decode_serializable_element(&desc, 1, &<Vec<Option<bool>>>::serializer())?);
                    }
                    ElementIndex::Element(i) => return Err(unknown_index(&desc, i)),
                }
            }
            Ok(Sample {
                a: required(&desc, 0, a)?,
                b: required(&desc, 1, b)?,
            })
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Color {
    Red,
    Green,
    Blue,
}

pub fn color_serializer() -> EnumSerializer<Color> {
    EnumSerializer::new("Color", &["RED", "GREEN", "BLUE"], &[Color::Red, Color::Green, Color::Blue])
}

pub trait Shape: AsAny + Send + Sync + std::fmt::Debug {
    fn area(&self) -> f64;
}

#[derive(Clone, Debug, PartialEq)]
pub struct Circle {
    pub radius: f64,
}

impl Shape for Circle {
    fn area(&self) -> f64 {
        std::f64::consts::PI * self.radius * self.radius
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Rect {
    pub width: i32,
    pub height: i32,
}

impl Shape for Rect {
    fn area(&self) -> f64 {
        (self.width * self.height) as f64
    }
}

#[derive(Clone, Copy, Default)]
pub struct CircleSerializer;

impl Serializer for CircleSerializer {
    type Value = Circle;

    fn descriptor(&self) -> SerialDescriptor {
        SerialDescriptor::builder("circle")
            .element("radius", SerialDescriptor::primitive("f64", PrimitiveKind::Double), false)
            .build()
    }

    fn serialize(&self, encoder: &mut dyn Encoder, value: &Circle) -> Result<(), Error> {
        let desc = self.descriptor();
        encoder.encode_structure(&desc, |s| s.encode_f64_element(&desc, 0, value.radius))
    }

    fn deserialize(&self, decoder: &mut dyn Decoder) -> Result<Circle, Error> {
        let desc = self.descriptor();
        decoder.decode_structure(&desc, |s| {
            let mut radius = None;
            loop {
                match s.decode_element_index(&desc)? {
                    ElementIndex::Done => break,
                    ElementIndex::Element(0) => radius = Some(s.decode_f64_element(&desc, 0)?),
                    ElementIndex::Element(i) => return Err(unknown_index(&desc, i)),
                }
            }
            Ok(Circle {
                radius: required(&desc, 0, radius)?,
            })
        })
    }
}

#[derive(Clone, Copy, Default)]
pub struct RectSerializer;

impl Serializer for RectSerializer {
    type Value = Rect;

    fn descriptor(&self) -> SerialDescriptor {
        SerialDescriptor::builder("rect")
            .element("width", int(), false)
            .element("height", int(), false)
            .build()
    }

    fn serialize(&self, encoder: &mut dyn Encoder, value: &Rect) -> Result<(), Error> {
        let desc = self.descriptor();
        encoder.encode_structure(&desc, |s| {
            s.encode_i32_element(&desc, 0, value.width)?;
            s.encode_i32_element(&desc, 1, value.height)
        })
    }

    fn deserialize(&self, decoder: &mut dyn Decoder) -> Result<Rect, Error> {
        let desc = self.descriptor();
        decoder.decode_structure(&desc, |s| {
            let (mut width, mut height) = (None, None);
            loop {
                match s.decode_element_index(&desc)? {
                    ElementIndex::Done => break,
                    ElementIndex::Element(0) => width = Some(s.decode_i32_element(&desc, 0)?),
                    ElementIndex::Element(1) => height = Some(s.decode_i32_element(&desc, 1)?),
                    ElementIndex::Element(i) => return Err(unknown_index(&desc, i)),
                }
            }
            Ok(Rect {
                width: required(&desc, 0, width)?,
                height: required(&desc, 1, height)?,
            })
        })
    }
}

pub fn upcast_circle(c: Circle) -> Box<dyn Shape> {
    Box::new(c)
}

pub fn upcast_rect(r: Rect) -> Box<dyn Shape> {
    Box::new(r)
}

/// Module with `circle` and `rect` registered under `dyn Shape`.
pub fn shapes_module() -> strata::SerializersModule {
    let mut builder = strata::SerializersModule::builder();
    builder
        .polymorphic::<dyn Shape, _>(CircleSerializer, upcast_circle)
        .unwrap()
        .polymorphic::<dyn Shape, _>(RectSerializer, upcast_rect)
        .unwrap();
    builder.build()
}

pub fn as_circle(shape: &dyn Shape) -> Option<&Circle> {
    shape.as_any().downcast_ref::<Circle>()
}

pub fn as_rect(shape: &dyn Shape) -> Option<&Rect> {
    shape.as_any().downcast_ref::<Rect>()
}
