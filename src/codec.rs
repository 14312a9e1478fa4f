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

use crate::{
    AvroResult, decode, encode, json_decode, json_encode,
    error::Details,
    schema::{Names, Parser, Schema},
    types::Value,
};
use serde_json::Value as JsonValue;
use std::io::{Read, Write};

/// A compiled encoder/decoder pair, specialized to one Avro schema.
///
/// A `Codec` is built once from schema text and is read-only afterwards: it
/// may be shared freely between threads, as long as every call supplies its
/// own reader or writer.
///
/// ```
/// # use avro_codec::{Codec, types::Value};
/// let codec = Codec::new(r#"["null", "int"]"#).unwrap();
///
/// let mut encoded = Vec::new();
/// codec.encode(&mut encoded, &Value::Int(42)).unwrap();
/// assert_eq!(encoded, [0x02, 0x54]);
///
/// let decoded = codec.decode(&mut &encoded[..]).unwrap();
/// assert_eq!(decoded, Value::Union(1, Box::new(Value::Int(42))));
/// ```
#[derive(Clone, Debug)]
pub struct Codec {
    /// The parsed schema tree rooted at the top-level type.
    root: Schema,
    /// The symbol table: fully qualified name to named type definition.
    names: Names,
    /// The canonical (whitespace-stripped) schema text.
    canonical: String,
}

impl Codec {
    /// Build a new `Codec` from an Avro schema, expressed as JSON text.
    pub fn new(schema_text: &str) -> AvroResult<Self> {
        let json: JsonValue =
            serde_json::from_str(schema_text).map_err(Details::ParseSchemaJson)?;
        let canonical = serde_json::to_string(&json).map_err(Details::SerializeSchemaJson)?;

        let mut parser = Parser::default();
        let root = parser.parse(&json, None)?;

        Ok(Codec {
            root,
            names: parser.into_names(),
            canonical,
        })
    }

    /// Write `value` to `writer` in Avro binary format, or return an error
    /// explaining why the datum cannot be converted into this codec's
    /// schema.
    ///
    /// On failure the stream is left in an unspecified partial state and
    /// must be treated as poisoned.
    ///
    /// A [`Value::Union`] selects its union member explicitly; any other
    /// value under a union schema is discriminated from its runtime type.
    pub fn encode<W: Write>(&self, writer: &mut W, value: &Value) -> AvroResult<()> {
        encode::encode(value, &self.root, &self.names, writer)
    }

    /// Read the next datum in Avro binary format from `reader`, or return
    /// an error explaining why the stream cannot be converted into this
    /// codec's schema.
    ///
    /// Trailing bytes are left unconsumed.
    pub fn decode<R: Read>(&self, reader: &mut R) -> AvroResult<Value> {
        decode::decode(&self.root, &self.names, reader)
    }

    /// Write `value` to `writer` in Avro JSON format.
    ///
    /// `bytes` and `fixed` data is written as a JSON string with one
    /// character per byte (U+0000..=U+00FF).
    pub fn json_encode<W: Write>(&self, writer: &mut W, value: &Value) -> AvroResult<()> {
        json_encode::json_encode(value, &self.root, &self.names, writer)
    }

    /// Read one datum in Avro JSON format from `reader`.
    pub fn json_decode<R: Read>(&self, reader: &mut R) -> AvroResult<Value> {
        json_decode::json_decode(&self.root, &self.names, reader)
    }

    /// The canonical form of the schema this codec was built from: the
    /// schema text round-tripped through JSON parse/serialize, with
    /// whitespace stripped.
    pub fn schema(&self) -> &str {
        &self.canonical
    }

    /// The root of the parsed schema tree.
    ///
    /// Useful to build record values with [`Record::new`](crate::types::Record::new).
    pub fn root(&self) -> &Schema {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_schema_is_canonicalized() {
        let codec = Codec::new(
            r#"{
                "type" : "record",
                "name" : "R",
                "fields" : [ {"name": "a", "type": "int"} ]
            }"#,
        )
        .unwrap();
        assert_eq!(
            codec.schema(),
            r#"{"type":"record","name":"R","fields":[{"name":"a","type":"int"}]}"#
        );
    }

    #[test]
    fn test_canonical_form_is_a_fixpoint() {
        let codec = Codec::new(
            r#"{
                "type": "record",
                "name": "LongList",
                "fields": [
                    {"name": "value", "type": "long"},
                    {"name": "next", "type": ["null", "LongList"]}
                ]
            }"#,
        )
        .unwrap();
        let again = Codec::new(codec.schema()).unwrap();
        assert_eq!(codec.schema(), again.schema());
    }

    #[test]
    fn test_malformed_schema_json() {
        match Codec::new("{").map_err(Error::into_details) {
            Err(Details::ParseSchemaJson(_)) => {}
            other => panic!("expected ParseSchemaJson, got {other:?}"),
        }
    }

    #[test]
    fn test_codec_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Codec>();
    }
}
