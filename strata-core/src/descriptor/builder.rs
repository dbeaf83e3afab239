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

use std::borrow::Cow;

use super::{ElementAnnotation, ElementInfo, LazyDescriptor, SerialDescriptor, SerialKind};

/// Builder for structured descriptors, created by [`SerialDescriptor::builder`].
pub struct ClassDescriptorBuilder {
    serial_name: Cow<'static, str>,
    kind: SerialKind,
    elements: Vec<ElementInfo>,
    annotations: Vec<ElementAnnotation>,
}

impl ClassDescriptorBuilder {
    pub(super) fn new(serial_name: Cow<'static, str>) -> Self {
        ClassDescriptorBuilder {
            serial_name,
            kind: SerialKind::CLASS,
            elements: Vec::new(),
            annotations: Vec::new(),
        }
    }

    /// Overrides the kind; defaults to [`SerialKind::CLASS`].
    pub fn kind(mut self, kind: SerialKind) -> Self {
        self.kind = kind;
        self
    }

    /// Appends an element.
    ///
    /// `is_optional` marks elements that have a default value and may be
    /// absent from the input.
    ///
    /// # Panics
    /// If an element with the same name was already added.
    pub fn element<N, D>(self, name: N, descriptor: D, is_optional: bool) -> Self
    where
        N: Into<Cow<'static, str>>,
        D: Into<LazyDescriptor>,
    {
        self.element_with_annotations(name, descriptor, is_optional, Vec::new())
    }

    pub fn element_with_annotations<N, D>(
        mut self,
        name: N,
        descriptor: D,
        is_optional: bool,
        annotations: Vec<ElementAnnotation>,
    ) -> Self
    where
        N: Into<Cow<'static, str>>,
        D: Into<LazyDescriptor>,
    {
        let name = name.into();
        assert!(
            self.elements.iter().all(|e| e.name != name),
            "Element with name '{name}' is already registered in {}",
            self.serial_name
        );
        self.elements.push(ElementInfo {
            name,
            descriptor: descriptor.into(),
            optional: is_optional,
            annotations,
        });
        self
    }

    /// Adds a type-level annotation.
    pub fn annotation(mut self, annotation: ElementAnnotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn build(self) -> SerialDescriptor {
        SerialDescriptor::from_parts(self.serial_name, self.kind, self.elements, self.annotations)
    }
}
