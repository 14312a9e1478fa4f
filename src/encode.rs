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
    AvroResult,
    error::Details,
    json_decode::bind_default,
    schema::{
        ArraySchema, EnumSchema, FixedSchema, MapSchema, Names, Namespace, RecordField,
        RecordSchema, Schema, SchemaKind, UnionSchema,
    },
    types::{Value, ValueKind},
    util::{zig_i32, zig_i64},
};
use log::error;
use std::borrow::Cow;
use std::collections::HashMap;
use std::io::Write;

/// Maximum number of items emitted per array block.
const ITEMS_PER_ARRAY_BLOCK: usize = 10;

/// Encode a [`Value`] into Avro binary format.
///
/// The schema is needed to guide the encoding; the value must be admissible
/// under it.
pub(crate) fn encode<W: Write>(
    value: &Value,
    schema: &Schema,
    names: &Names,
    writer: &mut W,
) -> AvroResult<()> {
    encode_internal(value, schema, names, &None, writer)
}

pub(crate) fn encode_bytes<B: AsRef<[u8]> + ?Sized, W: Write>(
    s: &B,
    writer: &mut W,
) -> AvroResult<()> {
    let bytes = s.as_ref();
    zig_i64(bytes.len() as i64, &mut *writer)?;
    writer
        .write_all(bytes)
        .map_err(|e| Details::WriteBytes(e).into())
}

fn mismatch(value: &Value, schema: &Schema, supported_schema: Vec<SchemaKind>) -> Details {
    error!("invalid value {value:?} for schema: {schema:?}");
    Details::EncodeValueAsSchemaError {
        value_kind: ValueKind::from(value),
        supported_schema,
    }
}

pub(crate) fn encode_internal<W: Write>(
    value: &Value,
    schema: &Schema,
    names: &Names,
    enclosing_namespace: &Namespace,
    writer: &mut W,
) -> AvroResult<()> {
    if let Schema::Ref { name } = schema {
        let fully_qualified_name = name.fully_qualified_name(enclosing_namespace);
        let resolved = names
            .get(&fully_qualified_name)
            .ok_or(Details::SchemaResolution(fully_qualified_name))?;
        return encode_internal(value, resolved, names, enclosing_namespace, writer);
    }

    match schema {
        Schema::Union(union) => encode_union(value, union, names, enclosing_namespace, writer),
        Schema::Null => match value {
            Value::Null => Ok(()),
            _ => Err(mismatch(value, schema, vec![SchemaKind::Null]).into()),
        },
        Schema::Boolean => match value {
            Value::Boolean(b) => writer
                .write_all(&[u8::from(*b)])
                .map_err(|e| Details::WriteBytes(e).into()),
            _ => Err(mismatch(value, schema, vec![SchemaKind::Boolean]).into()),
        },
        Schema::Int => match value {
            Value::Int(i) => zig_i32(*i, writer),
            _ => Err(mismatch(value, schema, vec![SchemaKind::Int]).into()),
        },
        Schema::Long => match value {
            Value::Long(i) => zig_i64(*i, writer),
            _ => Err(mismatch(value, schema, vec![SchemaKind::Long]).into()),
        },
        Schema::Float => match value {
            Value::Float(x) => writer
                .write_all(&x.to_le_bytes())
                .map_err(|e| Details::WriteBytes(e).into()),
            _ => Err(mismatch(value, schema, vec![SchemaKind::Float]).into()),
        },
        Schema::Double => match value {
            Value::Double(x) => writer
                .write_all(&x.to_le_bytes())
                .map_err(|e| Details::WriteBytes(e).into()),
            _ => Err(mismatch(value, schema, vec![SchemaKind::Double]).into()),
        },
        Schema::Bytes => match value {
            Value::Bytes(bytes) => encode_bytes(bytes, writer),
            _ => Err(mismatch(value, schema, vec![SchemaKind::Bytes]).into()),
        },
        Schema::String => match value {
            Value::String(s) => encode_bytes(s, writer),
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
            writer
                .write_all(bytes)
                .map_err(|e| Details::WriteBytes(e).into())
        }
        Schema::Enum(EnumSchema { name, symbols, .. }) => {
            let symbol = match value {
                Value::Enum(_, symbol) => symbol,
                Value::String(symbol) => symbol,
                _ => {
                    return Err(
                        mismatch(value, schema, vec![SchemaKind::Enum, SchemaKind::String]).into(),
                    );
                }
            };
            match symbols.iter().position(|item| item == symbol) {
                Some(index) => zig_i64(index as i64, writer),
                None => {
                    error!("invalid symbol {symbol:?} for enum {name}");
                    Err(Details::GetEnumSymbol {
                        name: name.fullname(None),
                        symbol: symbol.clone(),
                    }
                    .into())
                }
            }
        }
        Schema::Array(ArraySchema { items, .. }) => match value {
            Value::Array(values) => {
                for block in values.chunks(ITEMS_PER_ARRAY_BLOCK) {
                    zig_i64(block.len() as i64, &mut *writer)?;
                    for item in block {
                        encode_internal(item, items, names, enclosing_namespace, writer)?;
                    }
                }
                zig_i64(0, writer)
            }
            _ => Err(mismatch(value, schema, vec![SchemaKind::Array]).into()),
        },
        Schema::Map(MapSchema { values, .. }) => match value {
            Value::Map(items) => {
                if !items.is_empty() {
                    zig_i64(items.len() as i64, &mut *writer)?;
                    for (key, item) in items {
                        encode_bytes(key, writer)?;
                        encode_internal(item, values, names, enclosing_namespace, writer)?;
                    }
                }
                zig_i64(0, writer)
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

                for schema_field in schema_fields.iter() {
                    let datum = record_field_datum(
                        &fullname,
                        &lookup,
                        schema_field,
                        names,
                        &record_namespace,
                    )?;
                    encode_internal(&datum, &schema_field.schema, names, &record_namespace, writer)?;
                }
                Ok(())
            }
            _ => Err(mismatch(value, schema, vec![SchemaKind::Record]).into()),
        },
        Schema::Ref { .. } => unreachable!("Ref is resolved above"),
    }
}

/// The datum to encode for one record field: the caller-supplied value if
/// present, the bound schema default otherwise.
pub(crate) fn record_field_datum<'a>(
    record_fullname: &str,
    value_fields: &HashMap<&String, &'a Value>,
    schema_field: &RecordField,
    names: &Names,
    record_namespace: &Namespace,
) -> AvroResult<Cow<'a, Value>> {
    let datum = value_fields.get(&schema_field.name).or_else(|| {
        schema_field
            .aliases
            .iter()
            .find_map(|alias| value_fields.get(alias))
    });

    if let Some(&datum) = datum {
        return Ok(Cow::Borrowed(datum));
    }
    match schema_field.default {
        Some(ref default) => {
            bind_default(default, &schema_field.schema, names, record_namespace)
                .map(Cow::Owned)
                .map_err(|e| {
                    Details::GetDefaultValue {
                        record: record_fullname.to_string(),
                        field: schema_field.name.clone(),
                        source: Box::new(e),
                    }
                    .into()
                })
        }
        None => Err(Details::GetField {
            record: record_fullname.to_string(),
            field: schema_field.name.clone(),
        }
        .into()),
    }
}

fn encode_union<W: Write>(
    value: &Value,
    union: &UnionSchema,
    names: &Names,
    enclosing_namespace: &Namespace,
    writer: &mut W,
) -> AvroResult<()> {
    // An explicit Union value names its member; anything else is
    // discriminated through the member tables.
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
    zig_i32(index as i32, &mut *writer)?;
    encode_internal(datum, variant, names, enclosing_namespace, writer)
}

/// Encode a [`Value`] into a fresh buffer.
#[cfg(test)]
pub(crate) fn encode_to_vec(value: &Value, schema: &Schema, names: &Names) -> AvroResult<Vec<u8>> {
    let mut buffer = Vec::new();
    encode(value, schema, names, &mut buffer)?;
    Ok(buffer)
}
