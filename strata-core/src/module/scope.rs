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

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use tracing::trace;

use super::SerializersModuleCollector;
use crate::descriptor::SerialDescriptor;
use crate::encoding::{Decoder, Encoder};
use crate::error::Error;
use crate::serializer::{AsAny, DynSerializer, Serializer};

/// Resolves a serializer for a value with no registered subclass.
pub type DefaultSerializerProvider<Base> =
    Arc<dyn Fn(&Base) -> Option<DynSerializer<Box<Base>>> + Send + Sync>;

/// Resolves a deserializer for an unknown or missing discriminator.
pub type DefaultDeserializerProvider<Base> =
    Arc<dyn Fn(Option<&str>) -> Option<DynSerializer<Box<Base>>> + Send + Sync>;

/// Adapts a concrete serializer to a polymorphic base.
pub(crate) struct SubclassSerializer<S: Serializer, Base: ?Sized> {
    inner: S,
    upcast: fn(S::Value) -> Box<Base>,
}

impl<S: Serializer, Base: ?Sized> SubclassSerializer<S, Base> {
    pub(crate) fn new(inner: S, upcast: fn(S::Value) -> Box<Base>) -> Self {
        SubclassSerializer { inner, upcast }
    }
}

impl<S, Base> Serializer for SubclassSerializer<S, Base>
where
    S: Serializer,
    S::Value: 'static,
    Base: ?Sized + AsAny + 'static,
{
    type Value = Box<Base>;

    fn descriptor(&self) -> SerialDescriptor {
        self.inner.descriptor()
    }

    fn serialize(&self, encoder: &mut dyn Encoder, value: &Box<Base>) -> Result<(), Error> {
        let actual: &Base = value;
        match actual.as_any().downcast_ref::<S::Value>() {
            Some(v) => self.inner.serialize(encoder, v),
            None => Err(Error::invalid_data(format!(
                "Value of type '{}' cannot be written by the serializer for '{}'",
                actual.runtime_type_name(),
                self.inner.descriptor().serial_name()
            ))),
        }
    }

    fn deserialize(&self, decoder: &mut dyn Decoder) -> Result<Box<Base>, Error> {
        self.inner.deserialize(decoder).map(self.upcast)
    }
}

pub(crate) struct PolymorphicEntry<Base: ?Sized> {
    pub(crate) serial_name: Arc<str>,
    pub(crate) subject: TypeId,
    pub(crate) subject_name: &'static str,
    serializer_type: TypeId,
    descriptor: SerialDescriptor,
    pub(crate) serializer: DynSerializer<Box<Base>>,
}

impl<Base: ?Sized> Clone for PolymorphicEntry<Base> {
    fn clone(&self) -> Self {
        PolymorphicEntry {
            serial_name: self.serial_name.clone(),
            subject: self.subject,
            subject_name: self.subject_name,
            serializer_type: self.serializer_type,
            descriptor: self.descriptor.clone(),
            serializer: self.serializer.clone(),
        }
    }
}

impl<Base: ?Sized + AsAny + 'static> PolymorphicEntry<Base> {
    pub(crate) fn new<S>(serial_name: Arc<str>, serializer: S, upcast: fn(S::Value) -> Box<Base>) -> Self
    where
        S: Serializer + 'static,
        S::Value: 'static,
    {
        PolymorphicEntry {
            serial_name,
            subject: TypeId::of::<S::Value>(),
            subject_name: std::any::type_name::<S::Value>(),
            serializer_type: TypeId::of::<S>(),
            descriptor: serializer.descriptor(),
            serializer: Arc::new(SubclassSerializer::new(serializer, upcast)),
        }
    }

    fn same_as(&self, other: &Self) -> bool {
        self.subject == other.subject
            && self.serializer_type == other.serializer_type
            && self.descriptor == other.descriptor
    }
}

/// Subclass table of one polymorphic base type.
pub(crate) struct PolymorphicScope<Base: ?Sized + 'static> {
    pub(crate) base_name: &'static str,
    by_name: HashMap<Arc<str>, PolymorphicEntry<Base>>,
    by_type: HashMap<TypeId, Arc<str>>,
    default_serializer: Option<DefaultSerializerProvider<Base>>,
    default_deserializer: Option<DefaultDeserializerProvider<Base>>,
}

impl<Base: ?Sized + 'static> Clone for PolymorphicScope<Base> {
    fn clone(&self) -> Self {
        PolymorphicScope {
            base_name: self.base_name,
            by_name: self.by_name.clone(),
            by_type: self.by_type.clone(),
            default_serializer: self.default_serializer.clone(),
            default_deserializer: self.default_deserializer.clone(),
        }
    }
}

impl<Base: ?Sized + AsAny + 'static> PolymorphicScope<Base> {
    pub(crate) fn new(base_name: &'static str) -> Self {
        PolymorphicScope {
            base_name,
            by_name: HashMap::new(),
            by_type: HashMap::new(),
            default_serializer: None,
            default_deserializer: None,
        }
    }

    /// Adds `entry`, failing if its serial name or its subject is already
    /// bound to a different serializer.
    pub(crate) fn register(&mut self, entry: PolymorphicEntry<Base>) -> Result<(), Error> {
        if let Some(existing) = self.by_name.get(&*entry.serial_name) {
            if existing.same_as(&entry) {
                return Ok(());
            }
            return Err(Error::duplicate_serializer(format!(
                "Multiple polymorphic serializers in a scope of '{}' have the same serial name '{}'",
                self.base_name, entry.serial_name
            )));
        }
        if let Some(existing) = self.by_type.get(&entry.subject) {
            return Err(Error::duplicate_serializer(format!(
                "Serializer for '{}' is already registered in the scope of '{}' under the serial name '{}'",
                entry.subject_name, self.base_name, existing
            )));
        }
        self.insert(entry);
        Ok(())
    }

    /// Adds `entry`, evicting whatever it collides with.
    pub(crate) fn register_overwriting(&mut self, entry: PolymorphicEntry<Base>) {
        if let Some(old_name) = self.by_type.remove(&entry.subject) {
            self.by_name.remove(&old_name);
        }
        if let Some(old) = self.by_name.remove(&*entry.serial_name) {
            self.by_type.remove(&old.subject);
        }
        self.insert(entry);
    }

    fn insert(&mut self, entry: PolymorphicEntry<Base>) {
        self.by_type.insert(entry.subject, entry.serial_name.clone());
        self.by_name.insert(entry.serial_name.clone(), entry);
    }

    pub(crate) fn set_default_serializer(
        &mut self,
        provider: DefaultSerializerProvider<Base>,
        overwrite: bool,
    ) -> Result<(), Error> {
        if let Some(existing) = &self.default_serializer {
            if !overwrite && !Arc::ptr_eq(existing, &provider) {
                return Err(Error::duplicate_serializer(format!(
                    "Default serializer provider for '{}' is already registered",
                    self.base_name
                )));
            }
        }
        self.default_serializer = Some(provider);
        Ok(())
    }

    pub(crate) fn set_default_deserializer(
        &mut self,
        provider: DefaultDeserializerProvider<Base>,
        overwrite: bool,
    ) -> Result<(), Error> {
        if let Some(existing) = &self.default_deserializer {
            if !overwrite && !Arc::ptr_eq(existing, &provider) {
                return Err(Error::duplicate_serializer(format!(
                    "Default deserializer provider for '{}' is already registered",
                    self.base_name
                )));
            }
        }
        self.default_deserializer = Some(provider);
        Ok(())
    }

    /// Registered serializer for the runtime type of `value`, else the default
    /// provider's answer. Returns the discriminator to write with it.
    pub(crate) fn serializer_for(&self, value: &Base) -> Option<(Arc<str>, DynSerializer<Box<Base>>)> {
        let runtime_type = Any::type_id(value.as_any());
        if let Some(name) = self.by_type.get(&runtime_type) {
            if let Some(entry) = self.by_name.get(name) {
                return Some((entry.serial_name.clone(), entry.serializer.clone()));
            }
        }
        let provider = self.default_serializer.as_ref()?;
        let serializer = provider(value)?;
        trace!(
            base = self.base_name,
            subject = value.runtime_type_name(),
            "polymorphic serializer resolved by default provider"
        );
        let name: Arc<str> = Arc::from(serializer.descriptor().serial_name());
        Some((name, serializer))
    }

    pub(crate) fn deserializer_for(&self, serial_name: Option<&str>) -> Option<DynSerializer<Box<Base>>> {
        if let Some(entry) = serial_name.and_then(|name| self.by_name.get(name)) {
            return Some(entry.serializer.clone());
        }
        let provider = self.default_deserializer.as_ref()?;
        let serializer = provider(serial_name)?;
        trace!(
            base = self.base_name,
            discriminator = serial_name,
            "polymorphic deserializer resolved by default provider"
        );
        Some(serializer)
    }
}

/// Object-safe handle over `PolymorphicScope<Base>` for any base.
///
/// The module keys scopes by `TypeId::of::<Base>()`, so a scope is only ever
/// merged with a scope of the same concrete type.
pub(crate) trait ErasedScope: Send + Sync {
    fn scope_any(&self) -> &dyn Any;

    fn scope_any_mut(&mut self) -> &mut dyn Any;

    fn clone_box(&self) -> Box<dyn ErasedScope>;

    fn merge_from(&mut self, other: &dyn ErasedScope) -> Result<(), Error>;

    fn overwrite_from(&mut self, other: &dyn ErasedScope);

    fn len(&self) -> usize;

    fn dump_to(&self, collector: &mut dyn SerializersModuleCollector);
}

impl<Base: ?Sized + AsAny + 'static> PolymorphicScope<Base> {
    fn downcast(other: &dyn ErasedScope) -> Option<&Self> {
        other.scope_any().downcast_ref::<Self>()
    }
}

impl<Base: ?Sized + AsAny + 'static> ErasedScope for PolymorphicScope<Base> {
    fn scope_any(&self) -> &dyn Any {
        self
    }

    fn scope_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn clone_box(&self) -> Box<dyn ErasedScope> {
        Box::new(self.clone())
    }

    fn merge_from(&mut self, other: &dyn ErasedScope) -> Result<(), Error> {
        let Some(other) = Self::downcast(other) else {
            return Err(Error::invalid_data(format!(
                "Polymorphic scope of '{}' merged with a scope of another base",
                self.base_name
            )));
        };
        for entry in other.by_name.values() {
            self.register(entry.clone())?;
        }
        if let Some(provider) = &other.default_serializer {
            self.set_default_serializer(provider.clone(), false)?;
        }
        if let Some(provider) = &other.default_deserializer {
            self.set_default_deserializer(provider.clone(), false)?;
        }
        Ok(())
    }

    fn overwrite_from(&mut self, other: &dyn ErasedScope) {
        let Some(other) = Self::downcast(other) else {
            return;
        };
        for entry in other.by_name.values() {
            self.register_overwriting(entry.clone());
        }
        if let Some(provider) = &other.default_serializer {
            self.default_serializer = Some(provider.clone());
        }
        if let Some(provider) = &other.default_deserializer {
            self.default_deserializer = Some(provider.clone());
        }
    }

    fn len(&self) -> usize {
        self.by_name.len()
    }

    fn dump_to(&self, collector: &mut dyn SerializersModuleCollector) {
        let mut entries: Vec<_> = self.by_name.values().collect();
        entries.sort_by(|a, b| a.serial_name.cmp(&b.serial_name));
        for entry in entries {
            collector.polymorphic(self.base_name, entry.subject_name, &entry.serial_name, &entry.descriptor);
        }
        if self.default_serializer.is_some() {
            collector.polymorphic_default_serializer(self.base_name);
        }
        if self.default_deserializer.is_some() {
            collector.polymorphic_default_deserializer(self.base_name);
        }
    }
}
