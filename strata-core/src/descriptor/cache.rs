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
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;

use super::SerialDescriptor;

/// Concurrent descriptor memo keyed by type identity.
///
/// Owned by the application and passed to whoever builds descriptors. Each
/// key is computed at most once; the shard lock is released before the
/// initializer runs, so an initializer may look up other types.
#[derive(Default)]
pub struct DescriptorCache {
    entries: DashMap<TypeId, Arc<OnceLock<SerialDescriptor>>>,
}

impl DescriptorCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached descriptor for `T`, computing it with `init` if absent.
    pub fn get_or_init<T, F>(&self, init: F) -> SerialDescriptor
    where
        T: ?Sized + 'static,
        F: FnOnce() -> SerialDescriptor,
    {
        let cell = self.entries.entry(TypeId::of::<T>()).or_default().clone();
        cell.get_or_init(init).clone()
    }

    pub fn get<T: ?Sized + 'static>(&self) -> Option<SerialDescriptor> {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|cell| cell.get().cloned())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
