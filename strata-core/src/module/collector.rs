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

use crate::descriptor::SerialDescriptor;

/// Visitor over the registrations of a
/// [`SerializersModule`](super::SerializersModule), see
/// [`dump_to`](super::SerializersModule::dump_to).
pub trait SerializersModuleCollector {
    fn contextual(&mut self, type_name: &'static str, descriptor: &SerialDescriptor);

    fn polymorphic(
        &mut self,
        base_name: &'static str,
        subject_name: &'static str,
        serial_name: &str,
        descriptor: &SerialDescriptor,
    );

    fn polymorphic_default_serializer(&mut self, base_name: &'static str) {
        let _ = base_name;
    }

    fn polymorphic_default_deserializer(&mut self, base_name: &'static str) {
        let _ = base_name;
    }
}
