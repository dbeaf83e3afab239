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


use super::element::write_quoted;

/// Output sink of the JSON encoder, with optional pretty printing.
///
/// `writing_first` is true right after a structure opens and until its first
/// item, so separators and closing line breaks are only written between
/// items.
pub(crate) struct Composer {
    out: String,
    indent: Option<String>,
    level: usize,
    pub(crate) writing_first: bool,
}

impl Composer {
    pub(crate) fn new(indent: Option<String>) -> Self {
        Composer {
            out: String::with_capacity(128),
            indent,
            level: 0,
            writing_first: false,
        }
    }

    pub(crate) fn indent(&mut self) {
        self.writing_first = true;
        self.level += 1;
    }

    pub(crate) fn unindent(&mut self) {
        self.level -= 1;
    }

    /// Starts a new item: a line break plus indentation when pretty printing.
    pub(crate) fn next_item(&mut self) {
        self.writing_first = false;
        if let Some(indent) = &self.indent {
            self.out.push('\n');
            for _ in 0..self.level {
                self.out.push_str(indent);
            }
        }
    }

    pub(crate) fn next_item_if_not_first(&mut self) {
        if self.writing_first {
            self.writing_first = false;
        } else {
            self.next_item();
        }
    }

    pub(crate) fn space(&mut self) {
        if self.indent.is_some() {
            self.out.push(' ');
        }
    }

    #[inline]
    pub(crate) fn print(&mut self, s: &str) {
        self.out.push_str(s);
    }

    #[inline]
    pub(crate) fn print_char(&mut self, c: char) {
        self.out.push(c);
    }

    pub(crate) fn print_quoted(&mut self, s: &str) {
        write_quoted(&mut self.out, s);
    }

    pub(crate) fn finish(self) -> String {
        self.out
    }
}
