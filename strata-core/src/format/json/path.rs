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


use std::fmt::Write as _;

#[derive(Clone, Debug)]
enum Frame {
    Object(Option<String>),
    List(Option<usize>),
    Map(Option<String>),
}

/// Location of the decoder inside the input, rendered as `$.a.b[3]['key']`.
#[derive(Clone, Debug, Default)]
pub(crate) struct JsonPath {
    frames: Vec<Frame>,
}

impl JsonPath {
    pub(crate) fn push_object(&mut self) {
        self.frames.push(Frame::Object(None));
    }

    pub(crate) fn push_list(&mut self) {
        self.frames.push(Frame::List(None));
    }

    pub(crate) fn push_map(&mut self) {
        self.frames.push(Frame::Map(None));
    }

    pub(crate) fn pop(&mut self) {
        self.frames.pop();
    }

    pub(crate) fn set_field(&mut self, name: &str) {
        if let Some(Frame::Object(field)) = self.frames.last_mut() {
            *field = Some(name.to_string());
        }
    }

    pub(crate) fn set_index(&mut self, index: usize) {
        if let Some(Frame::List(current)) = self.frames.last_mut() {
            *current = Some(index);
        }
    }

    pub(crate) fn set_map_key(&mut self, key: &str) {
        if let Some(Frame::Map(current)) = self.frames.last_mut() {
            *current = Some(key.to_string());
        }
    }

    pub(crate) fn render(&self) -> String {
        let mut out = String::from("$");
        for frame in &self.frames {
            match frame {
                Frame::Object(Some(field)) => {
                    out.push('.');
                    out.push_str(field);
                }
                Frame::List(Some(index)) => {
                    let _ = write!(out, "[{index}]");
                }
                Frame::Map(Some(key)) => {
                    let _ = write!(out, "['{key}']");
                }
                _ => {}
            }
        }
        out
    }
}
