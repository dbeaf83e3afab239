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
use crate::error::Error;

/// Tracks which elements of a structure have been seen while decoding.
///
/// Decoders whose wire format omits some values (absent nullable fields in
/// protobuf, omitted nulls in JSON) use it after the input is exhausted to
/// report the remaining elements they can synthesize.
#[derive(Clone, Debug)]
pub struct ElementMarker {
    words: Vec<u64>,
    len: usize,
}

impl ElementMarker {
    pub fn new(descriptor: &SerialDescriptor) -> Self {
        let len = descriptor.elements_count();
        ElementMarker {
            words: vec![0; (len + 63) / 64],
            len,
        }
    }

    /// Records element `index` as seen. Indices past the declared count are
    /// ignored.
    #[inline]
    pub fn mark(&mut self, index: usize) {
        if index < self.len {
            self.words[index / 64] |= 1 << (index % 64);
        }
    }

    #[inline]
    pub fn is_marked(&self, index: usize) -> bool {
        index < self.len && self.words[index / 64] & (1 << (index % 64)) != 0
    }

    /// Finds the next unseen element for which `read_if_absent` answers
    /// `true`, and marks it. Elements rejected by the predicate are marked too,
    /// so each element is offered once.
    pub fn next_unmarked_index<F>(&mut self, descriptor: &SerialDescriptor, mut read_if_absent: F) -> Option<usize>
    where
        F: FnMut(&SerialDescriptor, usize) -> bool,
    {
        for index in 0..self.len {
            if self.is_marked(index) {
                continue;
            }
            self.mark(index);
            if read_if_absent(descriptor, index) {
                return Some(index);
            }
        }
        None
    }

    /// Names of the unseen elements that are neither optional nor nullable.
    pub fn missing_fields(&self, descriptor: &SerialDescriptor) -> Vec<String> {
        (0..self.len)
            .filter(|&i| {
                !self.is_marked(i)
                    && !descriptor.is_element_optional(i)
                    && !descriptor.element_descriptor(i).is_nullable()
            })
            .map(|i| descriptor.element_name(i).into_owned())
            .collect()
    }

    /// Fails with [`Error::MissingField`] listing every required element that
    /// was not seen.
    pub fn ensure_complete(&self, descriptor: &SerialDescriptor) -> Result<(), Error> {
        let missing = self.missing_fields(descriptor);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::missing_fields(missing, descriptor.serial_name()))
        }
    }
}
