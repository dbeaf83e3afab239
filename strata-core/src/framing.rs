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


//! Length-prefixed message framing for binary formats.
//!
//! A stream holds `varint(length) || payload` records back to back and ends
//! at EOF. A clean EOF between two records ends the stream; an EOF inside a
//! length prefix or a payload is [`Error::TruncatedMessage`].

use std::io::{ErrorKind, Read, Write};

use tracing::debug;

use crate::buffer::Writer;
use crate::config::DEFAULT_MAX_MESSAGE_SIZE;
use crate::error::Error;
use crate::varint::{read_varint64_from, StreamVarint, MAX_VARINT64_BYTES};

/// Writes length-prefixed messages to `W`.
pub struct DelimitedWriter<W: Write> {
    inner: W,
    header: Writer,
}

impl<W: Write> DelimitedWriter<W> {
    pub fn new(inner: W) -> Self {
        DelimitedWriter {
            inner,
            header: Writer::with_capacity(MAX_VARINT64_BYTES),
        }
    }

    pub fn write_message(&mut self, payload: &[u8]) -> Result<(), Error> {
        self.header.reset();
        self.header.write_varuint64(payload.len() as u64);
        self.inner.write_all(self.header.as_slice())?;
        self.inner.write_all(payload)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), Error> {
        self.inner.flush()?;
        Ok(())
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// Reads length-prefixed messages from `R`.
///
/// ```
/// use strata_core::framing::{DelimitedReader, DelimitedWriter};
///
/// let mut writer = DelimitedWriter::new(Vec::new());
/// writer.write_message(b"one").unwrap();
/// writer.write_message(b"two").unwrap();
/// let bytes = writer.into_inner();
///
/// let mut reader = DelimitedReader::new(&bytes[..]);
/// let all: Vec<Vec<u8>> = reader.messages().collect::<Result<_, _>>().unwrap();
/// assert_eq!(all, vec![b"one".to_vec(), b"two".to_vec()]);
/// ```
pub struct DelimitedReader<R: Read> {
    inner: R,
    max_message_size: usize,
}

impl<R: Read> DelimitedReader<R> {
    pub fn new(inner: R) -> Self {
        DelimitedReader {
            inner,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }

    /// Rejects any message whose declared length exceeds `limit` before
    /// allocating for it.
    pub fn with_max_message_size(mut self, limit: usize) -> Self {
        self.max_message_size = limit;
        self
    }

    pub fn max_message_size(&self) -> usize {
        self.max_message_size
    }

    /// Next payload, or `None` at a clean end of stream.
    pub fn read_message(&mut self) -> Result<Option<Vec<u8>>, Error> {
        let length = match read_varint64_from(&mut self.inner)? {
            StreamVarint::Eof => return Ok(None),
            // the prefix needs at least one more byte than was read
            StreamVarint::Truncated(read) => return Err(Error::truncated_message(read + 1, read)),
            StreamVarint::Value(length) => length,
        };
        if length > self.max_message_size as u64 {
            debug!(
                length,
                limit = self.max_message_size,
                "rejecting delimited message above the size limit"
            );
            return Err(Error::message_too_large(length, self.max_message_size));
        }
        let length = length as usize;
        let mut payload = vec![0u8; length];
        let mut filled = 0;
        while filled < length {
            match self.inner.read(&mut payload[filled..]) {
                Ok(0) => return Err(Error::truncated_message(length, filled)),
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(Some(payload))
    }

    /// Iterates over the remaining messages. The iterator stops after the
    /// first error.
    pub fn messages(&mut self) -> Messages<'_, R> {
        Messages {
            reader: self,
            failed: false,
        }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

pub struct Messages<'a, R: Read> {
    reader: &'a mut DelimitedReader<R>,
    failed: bool,
}

impl<R: Read> Iterator for Messages<'_, R> {
    type Item = Result<Vec<u8>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.reader.read_message() {
            Ok(message) => message.map(Ok),
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
