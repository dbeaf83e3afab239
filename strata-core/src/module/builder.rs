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

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::scope::{ErasedScope, PolymorphicEntry, PolymorphicScope};
use super::{short_type_name, ContextualEntry, SerializersModule};
use crate::error::Error;
use crate::serializer::{AsAny, DynSerializer, Serializer};

/// Collects registrations for a [`SerializersModule`].
///
/// Every registration method checks for conflicts against what is already
/// collected and returns [`Error::DuplicateSerializer`] on an unequal
/// collision.
///
/// ```
/// use strata_core::module::SerializersModule;
/// use strata_core::serializer::{AsAny, Serializer, I32Serializer};
///
/// trait Shape: AsAny + Send + Sync {}
/// impl Shape for i32 {}
///
/// let mut builder = SerializersModule::builder();
/// builder
///     .polymorphic_with_name::<dyn Shape, _>("int", I32Serializer, |v| Box::new(v) as Box<dyn Shape>)
///     .unwrap();
/// let module = builder.build();
/// assert!(module.find_polymorphic_deserializer::<dyn Shape>(Some("int")).is_some());
/// ```
#[derive(Default)]
pub struct SerializersModuleBuilder {
    contextual: HashMap<TypeId, ContextualEntry>,
    polymorphic: HashMap<TypeId, Box<dyn ErasedScope>>,
}

impl SerializersModuleBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub(super) fn from_module(module: &SerializersModule) -> Self {
        SerializersModuleBuilder {
            contextual: module.contextual.clone(),
            polymorphic: module
                .polymorphic
                .iter()
                .map(|(key, scope)| (*key, scope.clone_box()))
                .collect(),
        }
    }

    /// Registers `serializer` for every contextual use of `T`.
    pub fn contextual<T, S>(&mut self, serializer: S) -> Result<&mut Self, Error>
    where
        T: 'static,
        S: Serializer<Value = T> + 'static,
    {
        self.add_contextual(TypeId::of::<T>(), ContextualEntry::new(serializer))?;
        Ok(self)
    }

    fn add_contextual(&mut self, key: TypeId, entry: ContextualEntry) -> Result<(), Error> {
        if let Some(existing) = self.contextual.get(&key) {
            if existing.same_as(&entry) {
                return Ok(());
            }
            return Err(Error::duplicate_serializer(format!(
                "Contextual serializer for '{}' is already registered in this module",
                entry.type_name
            )));
        }
        self.contextual.insert(key, entry);
        Ok(())
    }

    fn scope_mut<Base>(&mut self) -> Result<&mut PolymorphicScope<Base>, Error>
    where
        Base: ?Sized + AsAny + 'static,
    {
        let scope = self
            .polymorphic
            .entry(TypeId::of::<Base>())
            .or_insert_with(|| Box::new(PolymorphicScope::<Base>::new(short_type_name::<Base>())));
        scope
            .scope_any_mut()
            .downcast_mut::<PolymorphicScope<Base>>()
            .ok_or_else(|| {
                Error::invalid_data(format!(
                    "Polymorphic scope of '{}' holds another base type",
                    short_type_name::<Base>()
                ))
            })
    }

    /// Registers a subclass of `Base`, using the serial name of the
    /// serializer's descriptor as discriminator. `upcast` turns a decoded
    /// value into the base type.
    pub fn polymorphic<Base, S>(
        &mut self,
        serializer: S,
        upcast: fn(S::Value) -> Box<Base>,
    ) -> Result<&mut Self, Error>
    where
        Base: ?Sized + AsAny + 'static,
        S: Serializer + 'static,
        S::Value: 'static,
    {
        let serial_name = serializer.descriptor().serial_name().to_string();
        self.polymorphic_with_name(serial_name, serializer, upcast)
    }

    /// Like [`polymorphic`](Self::polymorphic) with an explicit discriminator.
    pub fn polymorphic_with_name<Base, S>(
        &mut self,
        serial_name: impl Into<Arc<str>>,
        serializer: S,
        upcast: fn(S::Value) -> Box<Base>,
    ) -> Result<&mut Self, Error>
    where
        Base: ?Sized + AsAny + 'static,
        S: Serializer + 'static,
        S::Value: 'static,
    {
        let entry = PolymorphicEntry::new(serial_name.into(), serializer, upcast);
        self.scope_mut::<Base>()?.register(entry)?;
        Ok(self)
    }

    /// Provider consulted when a value of `Base` has no registered subclass
    /// serializer.
    pub fn polymorphic_default_serializer<Base, F>(&mut self, provider: F) -> Result<&mut Self, Error>
    where
        Base: ?Sized + AsAny + 'static,
        F: Fn(&Base) -> Option<DynSerializer<Box<Base>>> + Send + Sync + 'static,
    {
        self.scope_mut::<Base>()?
            .set_default_serializer(Arc::new(provider), false)?;
        Ok(self)
    }

    /// Provider consulted when the discriminator is unknown or absent.
    pub fn polymorphic_default_deserializer<Base, F>(&mut self, provider: F) -> Result<&mut Self, Error>
    where
        Base: ?Sized + AsAny + 'static,
        F: Fn(Option<&str>) -> Option<DynSerializer<Box<Base>>> + Send + Sync + 'static,
    {
        self.scope_mut::<Base>()?
            .set_default_deserializer(Arc::new(provider), false)?;
        Ok(self)
    }

    /// Adds every registration of `module`, with the same conflict rules as
    /// [`SerializersModule::merge`].
    pub fn include(&mut self, module: &SerializersModule) -> Result<&mut Self, Error> {
        for (key, entry) in &module.contextual {
            self.add_contextual(*key, entry.clone())?;
        }
        for (key, scope) in &module.polymorphic {
            match self.polymorphic.get_mut(key) {
                Some(existing) => existing.merge_from(&**scope)?,
                None => {
                    self.polymorphic.insert(*key, scope.clone_box());
                }
            }
        }
        Ok(self)
    }

    pub fn build(self) -> SerializersModule {
        let module = SerializersModule {
            contextual: self.contextual,
            polymorphic: self
                .polymorphic
                .into_iter()
                .map(|(key, scope)| (key, Arc::from(scope)))
                .collect(),
        };
        debug!(
            contextual = module.contextual_len(),
            polymorphic = module.polymorphic_len(),
            "built serializers module"
        );
        module
    }
}
