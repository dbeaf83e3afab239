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


mod test_helpers;

use strata::{BinaryFormat, Cbor, DelimitedReader, DelimitedWriter, Error, ProtoBuf, Serializable};
use test_helpers::*;

#[test]
fn test_protobuf_stream() -> anyhow::Result<()> {
    let proto = ProtoBuf::default();
    let serializer = Project::serializer();
    let mut writer = DelimitedWriter::new(Vec::new());
    for name in ["a", "bb", "ccc"] {
        proto.encode_delimited(&serializer, &Project::new(name), &mut writer)?;
    }
    let bytes = writer.into_inner();
    // varint(3) || 0x0a 0x01 'a'
    assert_eq!(&bytes[..4], &[0x03, 0x0a, 0x01, b'a']);

    let mut reader = proto.delimited_reader(bytes.as_slice());
    let mut names = Vec::new();
    while let Some(project) = proto.decode_delimited(&serializer, &mut reader)? {
        names.push(project.name);
    }
    assert_eq!(names, vec!["a", "bb", "ccc"]);
    Ok(())
}

#[test]
fn test_empty_stream() {
    let mut reader = DelimitedReader::new(&[][..]);
    assert!(reader.read_message().unwrap().is_none());
    assert_eq!(reader.messages().count(), 0);
}

#[test]
fn test_empty_message() {
    let mut writer = DelimitedWriter::new(Vec::new());
    writer.write_message(&[]).unwrap();
    writer.write_message(b"x").unwrap();
    let bytes = writer.into_inner();
    assert_eq!(bytes, vec![0x00, 0x01, b'x']);
    let mut reader = DelimitedReader::new(bytes.as_slice());
    let messages: Vec<Vec<u8>> = reader.messages().collect::<Result<_, _>>().unwrap();
    assert_eq!(messages, vec![vec![], b"x".to_vec()]);
}

#[test]
fn test_truncated_payload() {
    let mut reader = DelimitedReader::new(&[0x05, 0x01, 0x02][..]);
    let err = reader.read_message().unwrap_err();
    assert!(
        matches!(err, Error::TruncatedMessage { expected: 5, received: 2 }),
        "{err}"
    );
}

#[test]
fn test_truncated_prefix() {
    let mut reader = DelimitedReader::new(&[0x01, b'x', 0x80][..]);
    let mut messages = reader.messages();
    assert_eq!(messages.next().unwrap().unwrap(), b"x".to_vec());
    assert!(matches!(messages.next(), Some(Err(Error::TruncatedMessage { .. }))));
    assert!(messages.next().is_none());
}

#[test]
fn test_size_limit() {
    let cbor = Cbor::default().max_message_size(4);
    let mut writer = DelimitedWriter::new(Vec::new());
    cbor.encode_delimited(&<Vec<i32>>::serializer(), &vec![1, 2, 3, 4, 5], &mut writer)
        .unwrap();
    let bytes = writer.into_inner();
    let mut reader = cbor.delimited_reader(bytes.as_slice());
    assert_eq!(reader.max_message_size(), 4);
    let err = cbor
        .decode_delimited(&<Vec<i32>>::serializer(), &mut reader)
        .unwrap_err();
    assert!(
        matches!(err, Error::MessageTooLarge { length: 7, limit: 4 }),
        "{err}"
    );
}
