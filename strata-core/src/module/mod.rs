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

//! Runtime serializer registry.
//!
//! A [`SerializersModule`] answers two questions the static serializer graph
//! cannot: which serializer handles a contextual type, and which concrete
//! serializer handles a polymorphic value (by runtime type on encode, by
//! discriminator on decode). Polymorphic registrations are scoped per base
//! type, so the same concrete type may be registered under several bases
//! with different names.
//!
//! Modules are immutable once built. Combine them with
//! [`merge`](SerializersModule::merge), which rejects conflicting
//! registrations, or [`overwrite_with`](SerializersModule::overwrite_with),
//! where the right-hand module wins.

mod builder;
mod collector;
pub(crate) mod scope;

pub use builder::SerializersModuleBuilder;
pub use collector::SerializersModuleCollector;
pub use scope::{DefaultDeserializerProvider, DefaultSerializerProvider};

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use tracing::debug;

use crate::descriptor::SerialDescriptor;
use crate::error::Error;
use crate::serializer::{AsAny, DynSerializer, Serializable, Serializer};
use scope::{ErasedScope, PolymorphicScope};

/// Last path segment of a type name, used in messages.
pub(crate) fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let trimmed = full.strip_prefix("dyn ").unwrap_or(full);
    if trimmed.contains('<') {
        return trimmed;
    }
    trimmed.rsplit("::").next().unwrap_or(trimmed)
}

#[derive(Clone)]
pub(crate) struct ContextualEntry {
    type_name: &'static str,
    serializer_type: TypeId,
    descriptor: SerialDescriptor,
    // Holds a `DynSerializer<T>` for the keyed `T`.
    serializer: Arc<dyn Any + Send + Sync>,
}

impl ContextualEntry {
    pub(crate) fn new<T, S>(serializer: S) -> Self
    where
        T: 'static,
        S: Serializer<Value = T> + 'static,
    {
        let descriptor = serializer.descriptor();
        let handle: DynSerializer<T> = Arc::new(serializer);
        ContextualEntry {
            type_name: std::any::type_name::<T>(),
            serializer_type: TypeId::of::<S>(),
            descriptor,
            serializer: Arc::new(handle),
        }
    }

    fn same_as(&self, other: &ContextualEntry) -> bool {
        self.serializer_type == other.serializer_type && self.descriptor == other.descriptor
    }
}

/// Immutable collection of contextual and polymorphic registrations.
#[derive(Clone, Default)]
pub struct SerializersModule {
    contextual: HashMap<TypeId, ContextualEntry>,
    polymorphic: HashMap<TypeId, Arc<dyn ErasedScope>>,
}

impl SerializersModule {
    pub fn builder() -> SerializersModuleBuilder {
        SerializersModuleBuilder::new()
    }

    /// Shared module with no registrations.
    pub fn empty() -> Arc<SerializersModule> {
        static EMPTY: OnceLock<Arc<SerializersModule>> = OnceLock::new();
        EMPTY.get_or_init(|| Arc::new(SerializersModule::default())).clone()
    }

    pub fn is_empty(&self) -> bool {
        self.contextual.is_empty() && self.polymorphic.is_empty()
    }

    /// Number of contextual registrations.
    pub fn contextual_len(&self) -> usize {
        self.contextual.len()
    }

    /// Number of polymorphic subclass registrations across every base.
    pub fn polymorphic_len(&self) -> usize {
        self.polymorphic.values().map(|s| s.len()).sum()
    }

    pub fn get_contextual<T: 'static>(&self) -> Option<DynSerializer<T>> {
        let entry = self.contextual.get(&TypeId::of::<T>())?;
        entry.serializer.downcast_ref::<DynSerializer<T>>().cloned()
    }

    /// Serializer for `T`: the contextual registration when there is one,
    /// otherwise `T`'s own serializer.
    pub fn serializer<T: Serializable>(&self) -> DynSerializer<T> {
        match self.get_contextual::<T>() {
            Some(serializer) => serializer,
            None => Arc::new(T::serializer()),
        }
    }

    fn scope<Base: ?Sized + AsAny + 'static>(&self) -> Option<&PolymorphicScope<Base>> {
        self.polymorphic
            .get(&TypeId::of::<Base>())?
            .scope_any()
            .downcast_ref::<PolymorphicScope<Base>>()
    }

    /// Serializer for the runtime type of `value` within the scope of `Base`,
    /// together with the discriminator to write.
    ///
    /// Falls back to the default serializer provider of the scope.
    pub fn find_polymorphic_serializer<Base>(&self, value: &Base) -> Option<(Arc<str>, DynSerializer<Box<Base>>)>
    where
        Base: ?Sized + AsAny + 'static,
    {
        self.scope::<Base>()?.serializer_for(value)
    }

    /// Serializer registered under `serial_name` within the scope of `Base`.
    ///
    /// Falls back to the default deserializer provider of the scope, which
    /// also receives `None` when the input carried no discriminator.
    pub fn find_polymorphic_deserializer<Base>(&self, serial_name: Option<&str>) -> Option<DynSerializer<Box<Base>>>
    where
        Base: ?Sized + AsAny + 'static,
    {
        self.scope::<Base>()?.deserializer_for(serial_name)
    }

    /// Union of both modules. Fails if they register different serializers
    /// for the same key; identical registrations are not a conflict.
    pub fn merge(&self, other: &SerializersModule) -> Result<SerializersModule, Error> {
        let mut builder = SerializersModuleBuilder::from_module(self);
        builder.include(other)?;
        let merged = builder.build();
        debug!(
            contextual = merged.contextual_len(),
            polymorphic = merged.polymorphic_len(),
            "merged serializers modules"
        );
        Ok(merged)
    }

    /// Union of both modules where registrations of `other` replace
    /// conflicting ones of `self`. Never fails.
    pub fn overwrite_with(&self, other: &SerializersModule) -> SerializersModule {
        let mut contextual = self.contextual.clone();
        let mut replaced = 0usize;
        for (key, entry) in &other.contextual {
            if let Some(old) = contextual.insert(*key, entry.clone()) {
                if !old.same_as(entry) {
                    replaced += 1;
                }
            }
        }
        let mut polymorphic = self.polymorphic.clone();
        for (key, scope) in &other.polymorphic {
            let combined: Arc<dyn ErasedScope> = match polymorphic.get(key) {
                Some(existing) => {
                    let mut copy = existing.clone_box();
                    copy.overwrite_from(&**scope);
                    Arc::from(copy)
                }
                None => scope.clone(),
            };
            polymorphic.insert(*key, combined);
        }
        debug!(replaced_contextual = replaced, "overwrote serializers module");
        SerializersModule {
            contextual,
            polymorphic,
        }
    }

    /// Reports every registration to `collector`.
    pub fn dump_to(&self, collector: &mut dyn SerializersModuleCollector) {
        let mut contextual: Vec<_> = self.contextual.values().collect();
        contextual.sort_by_key(|e| e.type_name);
        for entry in contextual {
            collector.contextual(entry.type_name, &entry.descriptor);
        }
        for scope in self.polymorphic.values() {
            scope.dump_to(collector);
        }
    }
}

impl std::fmt::Debug for SerializersModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerializersModule")
            .field("contextual", &self.contextual_len())
            .field("polymorphic", &self.polymorphic_len())
            .finish()
    }
}
