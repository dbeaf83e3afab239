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

//! Immutable schema of a type's serial shape.
//!
//! A [`SerialDescriptor`] names a type, states its [`SerialKind`] and lists its
//! elements. Element descriptors are held as [`LazyDescriptor`]s so that a
//! recursive type can point at its own, not yet finished, descriptor.

mod annotation;
mod builder;
mod cache;
mod kind;

pub use annotation::{ElementAnnotation, ProtoIntegerType};
pub(crate) use annotation::{is_packed, proto_integer_type, proto_number};
pub use builder::ClassDescriptorBuilder;
pub use cache::DescriptorCache;
pub use kind::{PolymorphicKind, PrimitiveKind, SerialKind, StructureKind};

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Sentinel index meaning "no element with that name".
///
/// [`SerialDescriptor::get_element_index`] returns `None` in that case; the
/// constant exists for formats that keep indices in plain integers.
pub const UNKNOWN_NAME: usize = usize::MAX;

/// Descriptors with more elements than this get a name lookup table.
const NAME_INDEX_THRESHOLD: usize = 8;

type DescriptorThunk = Box<dyn Fn() -> SerialDescriptor + Send + Sync>;

/// A nested descriptor that may be computed on first use.
#[derive(Clone)]
pub struct LazyDescriptor(Arc<LazyInner>);

struct LazyInner {
    cell: OnceLock<SerialDescriptor>,
    init: Option<DescriptorThunk>,
}

impl LazyDescriptor {
    /// Defers construction until the descriptor is first requested. `init`
    /// runs at most once.
    pub fn deferred<F>(init: F) -> LazyDescriptor
    where
        F: Fn() -> SerialDescriptor + Send + Sync + 'static,
    {
        LazyDescriptor(Arc::new(LazyInner {
            cell: OnceLock::new(),
            init: Some(Box::new(init)),
        }))
    }

    pub fn get(&self) -> &SerialDescriptor {
        let inner = &*self.0;
        inner.cell.get_or_init(|| match &inner.init {
            Some(init) => init(),
            None => unreachable!("ready descriptors are initialised on construction"),
        })
    }

    pub fn is_resolved(&self) -> bool {
        self.0.cell.get().is_some()
    }
}

impl From<SerialDescriptor> for LazyDescriptor {
    fn from(descriptor: SerialDescriptor) -> Self {
        LazyDescriptor(Arc::new(LazyInner {
            cell: OnceLock::from(descriptor),
            init: None,
        }))
    }
}

impl From<&SerialDescriptor> for LazyDescriptor {
    fn from(descriptor: &SerialDescriptor) -> Self {
        descriptor.clone().into()
    }
}

impl fmt::Debug for LazyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.cell.get() {
            Some(d) => write!(f, "{}", d.serial_name()),
            None => f.write_str("<deferred>"),
        }
    }
}

pub(crate) struct ElementInfo {
    pub(crate) name: Cow<'static, str>,
    pub(crate) descriptor: LazyDescriptor,
    pub(crate) optional: bool,
    pub(crate) annotations: Vec<ElementAnnotation>,
}

struct DescriptorInner {
    serial_name: Cow<'static, str>,
    kind: SerialKind,
    elements: Vec<ElementInfo>,
    annotations: Vec<ElementAnnotation>,
    name_index: Option<HashMap<Cow<'static, str>, usize>>,
}

/// Schema of one serializable shape.
///
/// Cloning is cheap; the element table is shared. The nullable flag is kept
/// on the handle so `T` and `Option<T>` share the same table.
#[derive(Clone)]
pub struct SerialDescriptor {
    inner: Arc<DescriptorInner>,
    nullable: bool,
}

impl SerialDescriptor {
    pub(crate) fn from_parts(
        serial_name: Cow<'static, str>,
        kind: SerialKind,
        elements: Vec<ElementInfo>,
        annotations: Vec<ElementAnnotation>,
    ) -> SerialDescriptor {
        let name_index = (elements.len() > NAME_INDEX_THRESHOLD).then(|| {
            elements
                .iter()
                .enumerate()
                .map(|(i, e)| (e.name.clone(), i))
                .collect()
        });
        SerialDescriptor {
            inner: Arc::new(DescriptorInner {
                serial_name,
                kind,
                elements,
                annotations,
                name_index,
            }),
            nullable: false,
        }
    }

    /// Starts a [`StructureKind::Class`] descriptor.
    ///
    /// # Example
    /// ```
    /// use strata_core::descriptor::{SerialDescriptor, PrimitiveKind};
    ///
    /// let int = SerialDescriptor::primitive("i32", PrimitiveKind::Int);
    /// let point = SerialDescriptor::builder("Point")
    ///     .element("x", int.clone(), false)
    ///     .element("y", int, true)
    ///     .build();
    /// assert_eq!(point.get_element_index("y"), Some(1));
    /// assert_eq!(point.element_name(1), "y");
    /// ```
    pub fn builder<N: Into<Cow<'static, str>>>(serial_name: N) -> ClassDescriptorBuilder {
        ClassDescriptorBuilder::new(serial_name.into())
    }

    pub fn primitive<N: Into<Cow<'static, str>>>(
        serial_name: N,
        kind: PrimitiveKind,
    ) -> SerialDescriptor {
        Self::from_parts(serial_name.into(), kind.into(), Vec::new(), Vec::new())
    }

    /// Singleton with no elements.
    pub fn object<N: Into<Cow<'static, str>>>(serial_name: N) -> SerialDescriptor {
        Self::from_parts(serial_name.into(), SerialKind::OBJECT, Vec::new(), Vec::new())
    }

    /// Enum whose element names are the variant names.
    pub fn enumeration<N: Into<Cow<'static, str>>>(
        serial_name: N,
        variants: &[&'static str],
    ) -> SerialDescriptor {
        let serial_name = serial_name.into();
        let elements = variants
            .iter()
            .map(|v| ElementInfo {
                name: Cow::Borrowed(*v),
                descriptor: SerialDescriptor::object(format!("{serial_name}.{v}")).into(),
                optional: false,
                annotations: Vec::new(),
            })
            .collect();
        Self::from_parts(serial_name, SerialKind::Enum, elements, Vec::new())
    }

    pub fn list<N, E>(serial_name: N, element: E) -> SerialDescriptor
    where
        N: Into<Cow<'static, str>>,
        E: Into<LazyDescriptor>,
    {
        let elements = vec![ElementInfo {
            name: Cow::Borrowed("0"),
            descriptor: element.into(),
            optional: false,
            annotations: Vec::new(),
        }];
        Self::from_parts(serial_name.into(), SerialKind::LIST, elements, Vec::new())
    }

    pub fn map<N, K, V>(serial_name: N, key: K, value: V) -> SerialDescriptor
    where
        N: Into<Cow<'static, str>>,
        K: Into<LazyDescriptor>,
        V: Into<LazyDescriptor>,
    {
        let elements = vec![
            ElementInfo {
                name: Cow::Borrowed("0"),
                descriptor: key.into(),
                optional: false,
                annotations: Vec::new(),
            },
            ElementInfo {
                name: Cow::Borrowed("1"),
                descriptor: value.into(),
                optional: false,
                annotations: Vec::new(),
            },
        ];
        Self::from_parts(serial_name.into(), SerialKind::MAP, elements, Vec::new())
    }

    /// Placeholder for a type whose serializer is looked up at runtime.
    pub fn contextual<N: Into<Cow<'static, str>>>(serial_name: N) -> SerialDescriptor {
        Self::from_parts(
            serial_name.into(),
            SerialKind::Contextual,
            Vec::new(),
            Vec::new(),
        )
    }

    #[inline(always)]
    pub fn serial_name(&self) -> &str {
        &self.inner.serial_name
    }

    #[inline(always)]
    pub fn kind(&self) -> SerialKind {
        self.inner.kind
    }

    #[inline(always)]
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Returns the nullable view of this descriptor.
    pub fn nullable(&self) -> SerialDescriptor {
        SerialDescriptor {
            inner: self.inner.clone(),
            nullable: true,
        }
    }

    /// Returns the non-null view of this descriptor.
    pub fn non_nullable(&self) -> SerialDescriptor {
        SerialDescriptor {
            inner: self.inner.clone(),
            nullable: false,
        }
    }

    pub fn annotations(&self) -> &[ElementAnnotation] {
        &self.inner.annotations
    }

    /// Number of declared elements. Lists report one and maps report two;
    /// their actual size is only known per value.
    pub fn elements_count(&self) -> usize {
        self.inner.elements.len()
    }

    #[inline]
    fn slot(&self, index: usize) -> Option<&ElementInfo> {
        let elements = &self.inner.elements;
        match self.inner.kind {
            SerialKind::Structure(StructureKind::List) => elements.first(),
            SerialKind::Structure(StructureKind::Map) => elements.get(index % 2),
            _ => elements.get(index),
        }
    }

    fn expect_slot(&self, index: usize) -> &ElementInfo {
        match self.slot(index) {
            Some(slot) => slot,
            None => panic!(
                "Index {index} out of bounds for descriptor '{}' with {} elements",
                self.serial_name(),
                self.elements_count()
            ),
        }
    }

    /// Name of the element at `index`. Collections use the decimal index.
    ///
    /// # Panics
    /// If `index` is not a valid element index of a non-collection descriptor.
    pub fn element_name(&self, index: usize) -> Cow<'_, str> {
        if self.kind().is_collection() {
            return Cow::Owned(index.to_string());
        }
        Cow::Borrowed(self.expect_slot(index).name.as_ref())
    }

    /// Inverse of [`element_name`](Self::element_name); `None` for unknown names.
    pub fn get_element_index(&self, name: &str) -> Option<usize> {
        if self.kind().is_collection() {
            return name.parse().ok();
        }
        if let Some(index) = &self.inner.name_index {
            return index.get(name).copied();
        }
        self.inner.elements.iter().position(|e| e.name == name)
    }

    /// Resolves the element descriptor, running its deferred initializer if needed.
    ///
    /// # Panics
    /// If `index` is not a valid element index of a non-collection descriptor.
    pub fn element_descriptor(&self, index: usize) -> &SerialDescriptor {
        self.expect_slot(index).descriptor.get()
    }

    pub fn is_element_optional(&self, index: usize) -> bool {
        self.slot(index).map_or(false, |e| e.optional)
    }

    pub fn element_annotations(&self, index: usize) -> &[ElementAnnotation] {
        self.slot(index).map_or(&[], |e| &e.annotations)
    }

    /// Iterates over declared element names.
    pub fn element_names(&self) -> impl Iterator<Item = &str> {
        self.inner.elements.iter().map(|e| e.name.as_ref())
    }

    /// True when both handles share the same element table.
    pub fn ptr_eq(&self, other: &SerialDescriptor) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

/// Structural equality over name, kind, nullability and element names.
/// Element descriptors are not compared, so recursive descriptors terminate.
impl PartialEq for SerialDescriptor {
    fn eq(&self, other: &Self) -> bool {
        if self.nullable != other.nullable {
            return false;
        }
        if self.ptr_eq(other) {
            return true;
        }
        let (a, b) = (&*self.inner, &*other.inner);
        a.serial_name == b.serial_name
            && a.kind == b.kind
            && a.elements.len() == b.elements.len()
            && a
                .elements
                .iter()
                .zip(&b.elements)
                .all(|(x, y)| x.name == y.name && x.optional == y.optional)
    }
}

impl Eq for SerialDescriptor {}

impl fmt::Debug for SerialDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.serial_name())?;
        if self.nullable {
            f.write_str("?")?;
        }
        write!(f, "({})", self.kind())?;
        if !self.inner.elements.is_empty() {
            f.debug_list().entries(self.element_names()).finish()?;
        }
        Ok(())
    }
}

impl fmt::Display for SerialDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.serial_name())?;
        if self.nullable {
            f.write_str("?")?;
        }
        Ok(())
    }
}
