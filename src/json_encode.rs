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

//! The Avro JSON encoding.
//!
//! Avro JSON is not plain JSON: non-null union values are wrapped in a
//! single-key object naming the member, enums are bare strings, and
//! `bytes`/`fixed` become strings with one character per byte
//! (U+0000..=U+00FF).

use crate::{
    AvroResult,
    encode::record_field_datum,
    error::Details,
    schema::{
        ArraySchema, EnumSchema, FixedSchema, MapSchema, Names, Namespace, RecordSchema, Schema,
        SchemaKind, UnionSchema,
    },
    types::{Value, ValueKind},
};
use log::error;
use serde_json::{Map as JsonMap, Number, Value as JsonValue};
use std::collections::HashMap;
use std::io::Write;

/// Encode a [`Value`] into Avro JSON format.
pub(crate) fn json_encode<W: Write>(
    value: &Value,
    schema: &Schema,
    names: &Names,
    writer: &mut W,
) -> AvroResult<()> {
    let json = value_to_json(value, schema, names, &None)?;
    serde_json::to_writer(writer, &json).map_err(|e| Details::WriteAvroJson(e).into())
}

fn mismatch(value: &Value, schema: &Schema, supported_schema: Vec<SchemaKind>) -> Details {
    error!("invalid value {value:?} for schema: {schema:?}");
    Details::EncodeValueAsSchemaError {
        value_kind: ValueKind::from(value),
        supported_schema,
    }
}

/// One JSON-string character per byte, the Avro 1.7 convention for bytes in
/// JSON. Characters are the latin-1 codepoints U+0000..=U+00FF.
pub(crate) fn bytes_to_json_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

fn float_to_json(x: f64) -> AvroResult<JsonValue> {
    Number::from_f64(x)
        .map(JsonValue::Number)
        .ok_or_else(|| Details::ConvertF64ToJson(x).into())
}

pub(crate) fn value_to_json(
    value: &Value,
    schema: &Schema,
    names: &Names,
    enclosing_namespace: &Namespace,
) -> AvroResult<JsonValue> {
    if let Schema::Ref { name } = schema {
        let fully_qualified_name = name.fully_qualified_name(enclosing_namespace);
        let resolved = names
            .get(&fully_qualified_name)
            .ok_or(Details::SchemaResolution(fully_qualified_name))?;
        return value_to_json(value, resolved, names, enclosing_namespace);
    }

    match schema {
        Schema::Union(union) => union_to_json(value, union, names, enclosing_namespace),
        Schema::Null => match value {
            Value::Null => Ok(JsonValue::Null),
            _ => Err(mismatch(value, schema, vec![SchemaKind::Null]).into()),
        },
        Schema::Boolean => match value {
            Value::Boolean(b) => Ok(JsonValue::Bool(*b)),
            _ => Err(mismatch(value, schema, vec![SchemaKind::Boolean]).into()),
        },
        Schema::Int => match value {
            Value::Int(i) => Ok(JsonValue::Number(Number::from(*i))),
            _ => Err(mismatch(value, schema, vec![SchemaKind::Int]).into()),
        },
        Schema::Long => match value {
            Value::Long(i) => Ok(JsonValue::Number(Number::from(*i))),
            _ => Err(mismatch(value, schema, vec![SchemaKind::Long]).into()),
        },
        Schema::Float => match value {
            Value::Float(x) => float_to_json(f64::from(*x)),
            _ => Err(mismatch(value, schema, vec![SchemaKind::Float]).into()),
        },
        Schema::Double => match value {
            Value::Double(x) => float_to_json(*x),
            _ => Err(mismatch(value, schema, vec![SchemaKind::Double]).into()),
        },
        Schema::Bytes => match value {
            Value::Bytes(bytes) => Ok(JsonValue::String(bytes_to_json_string(bytes))),
            _ => Err(mismatch(value, schema, vec![SchemaKind::Bytes]).into()),
        },
        Schema::String => match value {
            Value::String(s) => Ok(JsonValue::String(s.clone())),
            _ => Err(mismatch(value, schema, vec![SchemaKind::String]).into()),
        },
        Schema::Fixed(FixedSchema { name, size, .. }) => {
            let bytes = match value {
                Value::Fixed(_, bytes) | Value::Bytes(bytes) => bytes,
                _ => {
                    return Err(
                        mismatch(value, schema, vec![SchemaKind::Fixed, SchemaKind::Bytes]).into(),
                    );
                }
            };
            if bytes.len() != *size {
                return Err(Details::CompareFixedSizes {
                    name: name.fullname(None),
                    expected: *size,
                    received: bytes.len(),
                }
                .into());
            }
            Ok(JsonValue::String(bytes_to_json_string(bytes)))
        }
        Schema::Enum(EnumSchema { name, symbols, .. }) => {
            let symbol = match value {
                Value::Enum(_, symbol) | Value::String(symbol) => symbol,
                _ => {
                    return Err(
                        mismatch(value, schema, vec![SchemaKind::Enum, SchemaKind::String]).into(),
                    );
                }
            };
            if !symbols.contains(symbol) {
                return Err(Details::GetEnumSymbol {
                    name: name.fullname(None),
                    symbol: symbol.clone(),
                }
                .into());
            }
            Ok(JsonValue::String(symbol.clone()))
        }
        Schema::Array(ArraySchema { items, .. }) => match value {
            Value::Array(values) => values
                .iter()
                .map(|item| value_to_json(item, items, names, enclosing_namespace))
                .collect::<Result<Vec<_>, _>>()
                .map(JsonValue::Array),
            _ => Err(mismatch(value, schema, vec![SchemaKind::Array]).into()),
        },
        Schema::Map(MapSchema { values, .. }) => match value {
            Value::Map(items) => {
                let mut object = JsonMap::with_capacity(items.len());
                for (key, item) in items {
                    object.insert(
                        key.clone(),
                        value_to_json(item, values, names, enclosing_namespace)?,
                    );
                }
                Ok(JsonValue::Object(object))
            }
            _ => Err(mismatch(value, schema, vec![SchemaKind::Map]).into()),
        },
        Schema::Record(RecordSchema {
            name,
            fields: schema_fields,
            ..
        }) => match value {
            Value::Record(value_name, value_fields) => {
                let fullname = name.fullname(None);
                if *value_name != fullname {
                    return Err(Details::RecordName {
                        expected: fullname,
                        received: value_name.clone(),
                    }
                    .into());
                }

                let record_namespace = name.namespace.clone();
                let lookup: HashMap<&String, &Value> = value_fields
                    .iter()
                    .map(|(name, field)| (name, field))
                    .collect();

                // Key order is a visible property of this encoding: it must
                // match the schema field order.
                let mut object = JsonMap::with_capacity(schema_fields.len());
                for schema_field in schema_fields.iter() {
                    let datum = record_field_datum(
                        &fullname,
                        &lookup,
                        schema_field,
                        names,
                        &record_namespace,
                    )?;
                    object.insert(
                        schema_field.name.clone(),
                        value_to_json(&datum, &schema_field.schema, names, &record_namespace)?,
                    );
                }
                Ok(JsonValue::Object(object))
            }
            _ => Err(mismatch(value, schema, vec![SchemaKind::Record]).into()),
        },
        Schema::Ref { .. } => unreachable!("Ref is resolved above"),
    }
}

fn union_to_json(
    value: &Value,
    union: &UnionSchema,
    names: &Names,
    enclosing_namespace: &Namespace,
) -> AvroResult<JsonValue> {
    let (index, variant, datum) = match value {
        Value::Union(index, datum) => {
            let variant = union.variants().get(*index as usize).ok_or_else(|| {
                Details::GetUnionValue {
                    index: i64::from(*index),
                    max: union.variants().len() - 1,
                }
            })?;
            (*index as usize, variant, datum.as_ref())
        }
        datum => {
            let tag = datum.union_tag();
            let (index, variant) = union.find_by_tag(tag).ok_or_else(|| {
                error!("no union member for {tag:?}");
                Details::GetUnionDatum {
                    expected: union.expected_tags(),
                    received: tag.to_string(),
                }
            })?;
            (index, variant, datum)
        }
    };

    let inner = value_to_json(datum, variant, names, enclosing_namespace)?;

    // Null members are emitted bare; everything else is wrapped in a
    // single-key object naming the member.
    if let Schema::Null = variant {
        Ok(inner)
    } else {
        let mut wrapper = JsonMap::with_capacity(1);
        wrapper.insert(union.json_name(index).to_string(), inner);
        Ok(JsonValue::Object(wrapper))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Details, Error};
    use pretty_assertions::assert_eq;

    fn parsed(input: &str) -> (Schema, Names) {
        let mut parser = crate::schema::Parser::default();
        let schema = parser.parse_str(input).unwrap();
        (schema, parser.into_names())
    }

    fn json_for(input: &str, value: &Value) -> AvroResult<String> {
        let (schema, names) = parsed(input);
        let mut buffer = Vec::new();
        json_encode(value, &schema, &names, &mut buffer)?;
        Ok(String::from_utf8(buffer).unwrap())
    }

    #[test]
    fn test_primitives() {
        assert_eq!(json_for(r#""null""#, &Value::Null).unwrap(), "null");
        assert_eq!(
            json_for(r#""boolean""#, &Value::Boolean(true)).unwrap(),
            "true"
        );
        assert_eq!(json_for(r#""int""#, &Value::Int(42)).unwrap(), "42");
        assert_eq!(
            json_for(r#""long""#, &Value::Long(9007199254740993)).unwrap(),
            "9007199254740993"
        );
        assert_eq!(
            json_for(r#""string""#, &Value::String("foo".to_string())).unwrap(),
            "\"foo\""
        );
    }

    #[test]
    fn test_union_wrapping() {
        let schema = r#"["null", "int"]"#;
        assert_eq!(json_for(schema, &Value::Null).unwrap(), "null");
        assert_eq!(json_for(schema, &Value::Int(42)).unwrap(), r#"{"int":42}"#);
        assert_eq!(
            json_for(schema, &Value::Union(1, Box::new(Value::Int(42)))).unwrap(),
            r#"{"int":42}"#
        );
    }

    #[test]
    fn test_union_wraps_named_member_with_fullname() {
        let schema = r#"["null", {"type": "enum", "name": "E", "namespace": "com.example",
                         "symbols": ["A", "B"]}]"#;
        assert_eq!(
            json_for(
                schema,
                &Value::Enum("com.example.E".to_string(), "B".to_string())
            )
            .unwrap(),
            r#"{"com.example.E":"B"}"#
        );
    }

    #[test]
    fn test_record_key_order_matches_schema() {
        let schema = r#"{"type": "record", "name": "R", "fields": [
            {"name": "a", "type": "int"},
            {"name": "b", "type": "string"}
        ]}"#;
        let value = Value::Record(
            "R".to_string(),
            vec![
                // Deliberately supplied out of order.
                ("b".to_string(), Value::String("hi".to_string())),
                ("a".to_string(), Value::Int(7)),
            ],
        );
        assert_eq!(json_for(schema, &value).unwrap(), r#"{"a":7,"b":"hi"}"#);
    }

    #[test]
    fn test_record_union_field_is_wrapped() {
        let schema = r#"{"type": "record", "name": "R", "fields": [
            {"name": "a", "type": ["null", "int"]}
        ]}"#;
        let value = Value::Record("R".to_string(), vec![("a".to_string(), Value::Int(1))]);
        assert_eq!(json_for(schema, &value).unwrap(), r#"{"a":{"int":1}}"#);
    }

    #[test]
    fn test_enum_is_bare_string() {
        let schema = r#"{"type": "enum", "name": "E", "symbols": ["A", "B", "C"]}"#;
        assert_eq!(
            json_for(schema, &Value::Enum("E".to_string(), "B".to_string())).unwrap(),
            "\"B\""
        );
    }

    #[test]
    fn test_bytes_one_character_per_byte() {
        // 0xFF becomes U+00FF, which is two bytes of UTF-8 in the output.
        assert_eq!(
            json_for(r#""bytes""#, &Value::Bytes(vec![0x66, 0xFF])).unwrap(),
            "\"f\u{00ff}\""
        );
    }

    #[test]
    fn test_fixed_length_validated() {
        let schema = r#"{"type": "fixed", "name": "F", "size": 2}"#;
        assert_eq!(
            json_for(schema, &Value::Fixed("F".to_string(), vec![0x61, 0x62])).unwrap(),
            "\"ab\""
        );
        match json_for(schema, &Value::Fixed("F".to_string(), vec![0x61]))
            .map_err(Error::into_details)
        {
            Err(Details::CompareFixedSizes { .. }) => {}
            other => panic!("expected CompareFixedSizes, got {other:?}"),
        }
    }

    #[test]
    fn test_nan_is_rejected() {
        match json_for(r#""double""#, &Value::Double(f64::NAN)).map_err(Error::into_details) {
            Err(Details::ConvertF64ToJson(_)) => {}
            other => panic!("expected ConvertF64ToJson, got {other:?}"),
        }
    }
}
