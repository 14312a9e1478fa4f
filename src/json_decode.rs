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

//! The Avro JSON decoding.
//!
//! Numbers are parsed as arbitrary-precision tokens and only narrowed when
//! bound to a specific Avro primitive; non-integers and out-of-range values
//! binding to `int`/`long` are rejected.

use crate::{
    AvroResult, Error,
    error::Details,
    schema::{
        ArraySchema, EnumSchema, FixedSchema, MapSchema, Names, Namespace, RecordSchema, Schema,
        UnionSchema,
    },
    types::Value,
};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::io::Read;

/// Decode one [`Value`] in Avro JSON format from the reader.
pub(crate) fn json_decode<R: Read>(
    schema: &Schema,
    names: &Names,
    reader: &mut R,
) -> AvroResult<Value> {
    let mut de = serde_json::Deserializer::from_reader(reader);
    let json = JsonValue::deserialize(&mut de).map_err(Details::ParseAvroJson)?;
    json_to_value(&json, schema, names, &None)
}

/// Bind a record field's schema default to a [`Value`].
///
/// Defaults are written in plain JSON; for a union field the default
/// corresponds to the first member and is not wrapped.
pub(crate) fn bind_default(
    default: &JsonValue,
    schema: &Schema,
    names: &Names,
    enclosing_namespace: &Namespace,
) -> AvroResult<Value> {
    match schema {
        Schema::Union(union) => {
            let first = &union.variants()[0];
            let value = json_to_value(default, first, names, enclosing_namespace)?;
            Ok(Value::Union(0, Box::new(value)))
        }
        _ => json_to_value(default, schema, names, enclosing_namespace),
    }
}

fn json_mismatch(friendly: &str, expected: &'static str, received: &JsonValue) -> Details {
    Details::GetJson {
        friendly: friendly.to_string(),
        expected,
        received: received.clone(),
    }
}

/// The byte content of an Avro JSON string holding `bytes` or `fixed`
/// data: one byte per character, characters above U+00FF rejected.
pub(crate) fn json_string_to_bytes(friendly: &str, s: &str) -> AvroResult<Vec<u8>> {
    s.chars()
        .map(|ch| {
            u8::try_from(u32::from(ch)).map_err(|_| {
                Details::JsonByteOutOfRange {
                    friendly: friendly.to_string(),
                    ch,
                }
                .into()
            })
        })
        .collect()
}

pub(crate) fn json_to_value(
    json: &JsonValue,
    schema: &Schema,
    names: &Names,
    enclosing_namespace: &Namespace,
) -> AvroResult<Value> {
    match schema {
        Schema::Ref { name } => {
            let fully_qualified_name = name.fully_qualified_name(enclosing_namespace);
            let resolved = names
                .get(&fully_qualified_name)
                .ok_or(Details::SchemaResolution(fully_qualified_name))?;
            json_to_value(json, resolved, names, enclosing_namespace)
        }
        Schema::Null => match json {
            JsonValue::Null => Ok(Value::Null),
            _ => Err(json_mismatch("null", "null", json).into()),
        },
        Schema::Boolean => match json {
            JsonValue::Bool(b) => Ok(Value::Boolean(*b)),
            _ => Err(json_mismatch("boolean", "boolean", json).into()),
        },
        Schema::Int => match json {
            JsonValue::Number(n) => n
                .as_i64()
                .and_then(|i| i32::try_from(i).ok())
                .map(Value::Int)
                .ok_or_else(|| json_mismatch("int", "32-bit integer", json).into()),
            _ => Err(json_mismatch("int", "32-bit integer", json).into()),
        },
        Schema::Long => match json {
            JsonValue::Number(n) => n
                .as_i64()
                .map(Value::Long)
                .ok_or_else(|| json_mismatch("long", "64-bit integer", json).into()),
            _ => Err(json_mismatch("long", "64-bit integer", json).into()),
        },
        Schema::Float => match json {
            JsonValue::Number(n) => n
                .as_f64()
                .map(|x| Value::Float(x as f32))
                .ok_or_else(|| json_mismatch("float", "number", json).into()),
            _ => Err(json_mismatch("float", "number", json).into()),
        },
        Schema::Double => match json {
            JsonValue::Number(n) => n
                .as_f64()
                .map(Value::Double)
                .ok_or_else(|| json_mismatch("double", "number", json).into()),
            _ => Err(json_mismatch("double", "number", json).into()),
        },
        Schema::Bytes => match json {
            JsonValue::String(s) => json_string_to_bytes("bytes", s).map(Value::Bytes),
            _ => Err(json_mismatch("bytes", "string", json).into()),
        },
        Schema::String => match json {
            JsonValue::String(s) => Ok(Value::String(s.clone())),
            _ => Err(json_mismatch("string", "string", json).into()),
        },
        Schema::Fixed(FixedSchema { name, size, .. }) => {
            let fullname = name.fullname(None);
            let friendly = format!("fixed ({fullname})");
            match json {
                JsonValue::String(s) => {
                    let bytes = json_string_to_bytes(&friendly, s)?;
                    if bytes.len() != *size {
                        return Err(Details::CompareFixedSizes {
                            name: fullname,
                            expected: *size,
                            received: bytes.len(),
                        }
                        .into());
                    }
                    Ok(Value::Fixed(fullname, bytes))
                }
                _ => Err(json_mismatch(&friendly, "string", json).into()),
            }
        }
        Schema::Enum(EnumSchema { name, symbols, .. }) => {
            let fullname = name.fullname(None);
            match json {
                JsonValue::String(symbol) => {
                    if !symbols.contains(symbol) {
                        return Err(Details::GetEnumSymbol {
                            name: fullname,
                            symbol: symbol.clone(),
                        }
                        .into());
                    }
                    Ok(Value::Enum(fullname, symbol.clone()))
                }
                _ => Err(json_mismatch(&format!("enum ({fullname})"), "string", json).into()),
            }
        }
        Schema::Union(union) => json_to_union(json, union, names, enclosing_namespace),
        Schema::Array(ArraySchema { items, .. }) => match json {
            JsonValue::Array(values) => values
                .iter()
                .map(|item| json_to_value(item, items, names, enclosing_namespace))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            _ => Err(json_mismatch("array (items)", "array", json).into()),
        },
        Schema::Map(MapSchema { values, .. }) => match json {
            JsonValue::Object(items) => {
                let mut collected = HashMap::with_capacity(items.len());
                for (key, item) in items {
                    collected.insert(
                        key.clone(),
                        json_to_value(item, values, names, enclosing_namespace)?,
                    );
                }
                Ok(Value::Map(collected))
            }
            _ => Err(json_mismatch("map (values)", "object", json).into()),
        },
        Schema::Record(RecordSchema {
            name,
            fields,
            lookup,
            ..
        }) => {
            let fullname = name.fullname(None);
            let object = match json {
                JsonValue::Object(object) => object,
                _ => {
                    return Err(
                        json_mismatch(&format!("record ({fullname})"), "object", json).into(),
                    );
                }
            };

            let record_namespace = name.namespace.clone();

            // Missing keys are left absent; they are populated with the
            // schema defaults at a subsequent encode. Unknown keys fail.
            let mut slots: Vec<Option<Value>> = vec![None; fields.len()];
            for (key, item) in object {
                let position = *lookup.get(key).ok_or_else(|| {
                    Error::from(Details::GetFieldUnknown {
                        record: fullname.clone(),
                        field: key.clone(),
                    })
                })?;
                let field = &fields[position];
                slots[position] =
                    Some(json_to_value(item, &field.schema, names, &record_namespace)?);
            }

            let collected = fields
                .iter()
                .zip(slots)
                .filter_map(|(field, slot)| slot.map(|value| (field.name.clone(), value)))
                .collect();
            Ok(Value::Record(fullname, collected))
        }
    }
}

fn json_to_union(
    json: &JsonValue,
    union: &UnionSchema,
    names: &Names,
    enclosing_namespace: &Namespace,
) -> AvroResult<Value> {
    let (member_key, inner) = match json {
        // Bare null is the only unwrapped member.
        JsonValue::Null => ("null".to_string(), json),
        JsonValue::Object(wrapper) if wrapper.len() == 1 => {
            let (key, inner) = wrapper.iter().next().expect("single-key object");
            (key.clone(), inner)
        }
        _ => return Err(Details::GetUnionJson(json.clone()).into()),
    };

    let (index, variant) = union
        .find_by_json_name(&member_key)
        .ok_or_else(|| Details::GetUnionMemberKey(member_key))?;
    let value = json_to_value(inner, variant, names, enclosing_namespace)?;
    Ok(Value::Union(index as u32, Box::new(value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parsed(input: &str) -> (Schema, Names) {
        let mut parser = crate::schema::Parser::default();
        let schema = parser.parse_str(input).unwrap();
        (schema, parser.into_names())
    }

    fn value_from(input: &str, json: &str) -> AvroResult<Value> {
        let (schema, names) = parsed(input);
        json_decode(&schema, &names, &mut json.as_bytes())
    }

    #[test]
    fn test_primitives() {
        assert_eq!(value_from(r#""null""#, "null").unwrap(), Value::Null);
        assert_eq!(
            value_from(r#""boolean""#, "true").unwrap(),
            Value::Boolean(true)
        );
        assert_eq!(value_from(r#""int""#, "42").unwrap(), Value::Int(42));
        assert_eq!(
            value_from(r#""long""#, "9007199254740993").unwrap(),
            Value::Long(9007199254740993)
        );
        assert_eq!(
            value_from(r#""double""#, "1.5").unwrap(),
            Value::Double(1.5)
        );
        assert_eq!(
            value_from(r#""string""#, "\"foo\"").unwrap(),
            Value::String("foo".to_string())
        );
    }

    #[test]
    fn test_int_binding_rejects_non_integers() {
        match value_from(r#""int""#, "7.5").map_err(Error::into_details) {
            Err(Details::GetJson { friendly, .. }) => assert_eq!(friendly, "int"),
            other => panic!("expected GetJson, got {other:?}"),
        }
    }

    #[test]
    fn test_int_binding_rejects_out_of_range() {
        match value_from(r#""int""#, "2147483648").map_err(Error::into_details) {
            Err(Details::GetJson { .. }) => {}
            other => panic!("expected GetJson, got {other:?}"),
        }
        match value_from(r#""long""#, "9223372036854775808").map_err(Error::into_details) {
            Err(Details::GetJson { .. }) => {}
            other => panic!("expected GetJson, got {other:?}"),
        }
    }

    #[test]
    fn test_long_binding_keeps_full_precision() {
        // 2^53 + 1 is not representable as an f64; the token must bind
        // exactly.
        assert_eq!(
            value_from(r#""long""#, "9007199254740993").unwrap(),
            Value::Long(9_007_199_254_740_993)
        );
    }

    #[test]
    fn test_union() {
        let schema = r#"["null", "int"]"#;
        assert_eq!(
            value_from(schema, "null").unwrap(),
            Value::Union(0, Box::new(Value::Null))
        );
        assert_eq!(
            value_from(schema, r#"{"int": 42}"#).unwrap(),
            Value::Union(1, Box::new(Value::Int(42)))
        );
    }

    #[test]
    fn test_union_wrong_shape() {
        match value_from(r#"["null", "int"]"#, "42").map_err(Error::into_details) {
            Err(Details::GetUnionJson(_)) => {}
            other => panic!("expected GetUnionJson, got {other:?}"),
        }
        match value_from(r#"["null", "int"]"#, r#"{"long": 42}"#).map_err(Error::into_details) {
            Err(Details::GetUnionMemberKey(key)) => assert_eq!(key, "long"),
            other => panic!("expected GetUnionMemberKey, got {other:?}"),
        }
    }

    #[test]
    fn test_union_without_null_member_rejects_null() {
        match value_from(r#"["int", "string"]"#, "null").map_err(Error::into_details) {
            Err(Details::GetUnionMemberKey(key)) => assert_eq!(key, "null"),
            other => panic!("expected GetUnionMemberKey, got {other:?}"),
        }
    }

    #[test]
    fn test_record_missing_keys_stay_absent() {
        let schema = r#"{"type": "record", "name": "R", "fields": [
            {"name": "a", "type": "int", "default": 7},
            {"name": "b", "type": "string"}
        ]}"#;
        assert_eq!(
            value_from(schema, r#"{"b": "hi"}"#).unwrap(),
            Value::Record(
                "R".to_string(),
                vec![("b".to_string(), Value::String("hi".to_string()))]
            )
        );
    }

    #[test]
    fn test_record_unknown_key_fails() {
        let schema = r#"{"type": "record", "name": "R", "fields": [
            {"name": "a", "type": "int"}
        ]}"#;
        match value_from(schema, r#"{"a": 1, "nope": 2}"#).map_err(Error::into_details) {
            Err(Details::GetFieldUnknown { field, .. }) => assert_eq!(field, "nope"),
            other => panic!("expected GetFieldUnknown, got {other:?}"),
        }
    }

    #[test]
    fn test_record_union_field() {
        let schema = r#"{"type": "record", "name": "R", "fields": [
            {"name": "a", "type": ["null", "int"]}
        ]}"#;
        assert_eq!(
            value_from(schema, r#"{"a": {"int": 1}}"#).unwrap(),
            Value::Record(
                "R".to_string(),
                vec![(
                    "a".to_string(),
                    Value::Union(1, Box::new(Value::Int(1)))
                )]
            )
        );
    }

    #[test]
    fn test_bytes_from_latin1_string() {
        assert_eq!(
            value_from(r#""bytes""#, "\"f\u{00ff}\"").unwrap(),
            Value::Bytes(vec![0x66, 0xFF])
        );
        match value_from(r#""bytes""#, "\"\u{0100}\"").map_err(Error::into_details) {
            Err(Details::JsonByteOutOfRange { ch, .. }) => assert_eq!(ch, '\u{0100}'),
            other => panic!("expected JsonByteOutOfRange, got {other:?}"),
        }
    }

    #[test]
    fn test_fixed_rejects_length_mismatch() {
        let schema = r#"{"type": "fixed", "name": "F", "size": 2}"#;
        assert_eq!(
            value_from(schema, "\"ab\"").unwrap(),
            Value::Fixed("F".to_string(), vec![0x61, 0x62])
        );
        match value_from(schema, "\"abc\"").map_err(Error::into_details) {
            Err(Details::CompareFixedSizes {
                expected: 2,
                received: 3,
                ..
            }) => {}
            other => panic!("expected CompareFixedSizes, got {other:?}"),
        }
    }

    #[test]
    fn test_enum_membership_checked() {
        let schema = r#"{"type": "enum", "name": "E", "symbols": ["A", "B"]}"#;
        assert_eq!(
            value_from(schema, "\"B\"").unwrap(),
            Value::Enum("E".to_string(), "B".to_string())
        );
        match value_from(schema, "\"D\"").map_err(Error::into_details) {
            Err(Details::GetEnumSymbol { symbol, .. }) => assert_eq!(symbol, "D"),
            other => panic!("expected GetEnumSymbol, got {other:?}"),
        }
    }

    #[test]
    fn test_bind_default_wraps_union_first_member() {
        let (schema, names) = parsed(r#"["null", "int"]"#);
        assert_eq!(
            bind_default(&JsonValue::Null, &schema, &names, &None).unwrap(),
            Value::Union(0, Box::new(Value::Null))
        );
    }

    #[test]
    fn test_malformed_json() {
        match value_from(r#""int""#, "{").map_err(Error::into_details) {
            Err(Details::ParseAvroJson(_)) => {}
            other => panic!("expected ParseAvroJson, got {other:?}"),
        }
    }
}
