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

//! Error types of the crate.

use crate::{
    schema::{Name, SchemaKind},
    types::ValueKind,
};

/// Errors encountered while building or using a [`Codec`](crate::Codec).
///
/// To inspect the details of the error use [`details`](Self::details) or
/// [`into_details`](Self::into_details) to get a [`Details`] which contains
/// more precise error information.
#[derive(thiserror::Error, Debug)]
#[repr(transparent)]
#[error(transparent)]
pub struct Error {
    details: Box<Details>,
}

impl Error {
    pub fn new(details: Details) -> Self {
        Self {
            details: Box::new(details),
        }
    }

    pub fn details(&self) -> &Details {
        &self.details
    }

    pub fn into_details(self) -> Details {
        *self.details
    }

    /// Whether the error was raised while parsing a schema, as opposed to
    /// while encoding or decoding data.
    pub fn is_schema_parse(&self) -> bool {
        self.details.is_schema_parse()
    }
}

impl From<Details> for Error {
    fn from(details: Details) -> Self {
        Self::new(details)
    }
}

/// The precise reason for an [`Error`].
///
/// The variants fall into two families: schema parse errors, which can only
/// be raised while a codec is being built, and codec errors, which are raised
/// while encoding or decoding data. Codec errors for composite types carry
/// the friendly name of the failing type (`record (com.example.Foo)`,
/// `enum (Suit)`, ...) in their rendered message.
#[derive(thiserror::Error, Debug)]
pub enum Details {
    // ---------------------------------------------------------------------
    // Schema parse errors
    // ---------------------------------------------------------------------
    #[error("cannot parse schema: {0}")]
    ParseSchemaJson(#[source] serde_json::Error),

    #[error("cannot serialize schema: {0}")]
    SerializeSchemaJson(#[source] serde_json::Error),

    #[error("cannot parse schema: value ought to be string, object, or array")]
    ParseSchemaFromValidJson,

    #[error("schema object ought to have name key")]
    GetNameField,

    #[error("record field ought to have name key")]
    GetNameFieldFromRecord,

    #[error("invalid name: {0}; name must match the regex {1}")]
    InvalidSchemaName(String, &'static str),

    #[error("invalid namespace: {0}; namespace must match the regex {1}")]
    InvalidNamespace(String, &'static str),

    #[error("invalid enum symbol name: {0}")]
    EnumSymbolName(String),

    #[error("invalid record field name: {0}")]
    FieldName(String),

    #[error("schema object ought to have type key")]
    GetComplexTypeField,

    #[error("\"type\" ought to be string, object, or array; received: {0}")]
    GetComplexType(serde_json::Value),

    #[error("unknown type name: {0}")]
    UnknownTypeName(String),

    #[error("record ({0}): fields ought to be non-empty array")]
    GetRecordFields(String),

    #[error("record ({0}): duplicate field: {1}")]
    FieldNameDuplicate(String, String),

    #[error("record ({0}): field {1} ought to have type key")]
    GetRecordFieldType(String, String),

    #[error("enum ({0}): ought to have symbols key")]
    GetEnumSymbolsField(String),

    #[error("enum ({0}): symbols ought to be non-empty array")]
    GetEnumSymbols(String),

    #[error("enum ({0}): symbols array member ought to be string")]
    GetEnumSymbolString(String),

    #[error("enum ({0}): duplicate symbol: {1}")]
    EnumSymbolDuplicate(String, String),

    #[error("fixed ({0}): ought to have size key")]
    GetFixedSizeField(String),

    #[error("fixed ({0}): size ought to be a non-negative integer; received: {1}")]
    GetFixedSize(String, serde_json::Value),

    #[error("map ({0}): ought to have values key")]
    GetMapValuesField(String),

    #[error("array ({0}): ought to have items key")]
    GetArrayItemsField(String),

    #[error("union ought to have at least one member")]
    EmptyUnion,

    #[error("union: unions ought not contain other unions")]
    GetNestedUnion,

    #[error("union: duplicate member key: {0}")]
    GetUnionDuplicate(String),

    // ---------------------------------------------------------------------
    // Codec errors
    // ---------------------------------------------------------------------
    #[error("invalid byte for boolean: {0}")]
    BoolValue(u8),

    #[error("variable-length integer ought to fit in {max_bytes} bytes")]
    IntegerOverflow { max_bytes: usize },

    #[error("int out of range: {1}")]
    ZagI32(#[source] std::num::TryFromIntError, i64),

    #[error("cannot read bytes: {0}")]
    ReadBytes(#[source] std::io::Error),

    #[error("cannot write bytes: {0}")]
    WriteBytes(#[source] std::io::Error),

    #[error("byte length ought to be non-negative; received: {0}")]
    BytesLength(i64),

    #[error("block count ought to fit in memory; received: {0}")]
    BlockCount(i64),

    #[error("requested allocation of {desired} bytes exceeds the maximum of {maximum} bytes")]
    MemoryAllocation { desired: usize, maximum: usize },

    #[error("cannot convert bytes to utf-8 string: {0}")]
    ConvertToUtf8(#[source] std::string::FromUtf8Error),

    #[error("value of kind {value_kind:?} ought to encode as one of {supported_schema:?}")]
    EncodeValueAsSchemaError {
        value_kind: ValueKind,
        supported_schema: Vec<SchemaKind>,
    },

    #[error("record ({expected}): datum record name ought to match schema; received: {received}")]
    RecordName { expected: String, received: String },

    #[error("record ({record}): field has no datum and no default: {field}")]
    GetField { record: String, field: String },

    #[error("record ({record}): unknown field: {field}")]
    GetFieldUnknown { record: String, field: String },

    #[error("record ({record}): cannot bind default for field {field}")]
    GetDefaultValue {
        record: String,
        field: String,
        #[source]
        source: Box<Error>,
    },

    #[error("enum ({name}): index must be between 0 and {max}; read index: {index}")]
    GetEnumValue { name: String, index: i64, max: usize },

    #[error("enum ({name}): symbol not defined: {symbol}")]
    GetEnumSymbol { name: String, symbol: String },

    #[error("fixed ({name}): expected: {expected} bytes; received: {received}")]
    CompareFixedSizes {
        name: String,
        expected: usize,
        received: usize,
    },

    #[error("union: index must be between 0 and {max}; read index: {index}")]
    GetUnionValue { index: i64, max: usize },

    #[error("union: datum ought match schema: expected: {expected}; received: {received}")]
    GetUnionDatum { expected: String, received: String },

    #[error("union: unknown member key: {0}")]
    GetUnionMemberKey(String),

    #[error("union: ought to be null or a single-key object; received: {0}")]
    GetUnionJson(serde_json::Value),

    #[error("unresolved schema reference: {0}")]
    SchemaResolution(Name),

    #[error("cannot parse avro json: {0}")]
    ParseAvroJson(#[source] serde_json::Error),

    #[error("cannot write avro json: {0}")]
    WriteAvroJson(#[source] serde_json::Error),

    #[error("{friendly}: expected json {expected}; received: {received}")]
    GetJson {
        friendly: String,
        expected: &'static str,
        received: serde_json::Value,
    },

    #[error("{friendly}: character ought to be in U+0000..=U+00FF; received: {ch:?}")]
    JsonByteOutOfRange { friendly: String, ch: char },

    #[error("cannot represent {0} in json")]
    ConvertF64ToJson(f64),
}

impl Details {
    /// See [`Error::is_schema_parse`].
    pub fn is_schema_parse(&self) -> bool {
        use Details::*;
        matches!(
            self,
            ParseSchemaJson(_)
                | SerializeSchemaJson(_)
                | ParseSchemaFromValidJson
                | GetNameField
                | GetNameFieldFromRecord
                | InvalidSchemaName(..)
                | InvalidNamespace(..)
                | EnumSymbolName(_)
                | FieldName(_)
                | GetComplexTypeField
                | GetComplexType(_)
                | UnknownTypeName(_)
                | GetRecordFields(_)
                | FieldNameDuplicate(..)
                | GetRecordFieldType(..)
                | GetEnumSymbolsField(_)
                | GetEnumSymbols(_)
                | GetEnumSymbolString(_)
                | EnumSymbolDuplicate(..)
                | GetFixedSizeField(_)
                | GetFixedSize(..)
                | GetMapValuesField(_)
                | GetArrayItemsField(_)
                | EmptyUnion
                | GetNestedUnion
                | GetUnionDuplicate(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_size() {
        // The boxed details keep the hot-path result small.
        assert_eq!(
            std::mem::size_of::<Error>(),
            std::mem::size_of::<usize>()
        );
    }

    #[test]
    fn test_union_mismatch_message() {
        let err = Error::from(Details::GetUnionDatum {
            expected: "null, int32".to_string(),
            received: "string".to_string(),
        });
        assert_eq!(
            err.to_string(),
            "union: datum ought match schema: expected: null, int32; received: string"
        );
        assert!(!err.is_schema_parse());
    }

    #[test]
    fn test_parse_family() {
        let err = Error::from(Details::UnknownTypeName("com.example.Missing".to_string()));
        assert!(err.is_schema_parse());
    }
}
