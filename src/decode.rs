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
    schema::{
        ArraySchema, EnumSchema, FixedSchema, MapSchema, Names, Namespace, RecordSchema, Schema,
        UnionSchema,
    },
    types::Value,
    util::{safe_len, zag_i32, zag_i64},
};
use std::collections::HashMap;
use std::io::Read;

/// Decode one [`Value`] in Avro binary format from the reader.
///
/// Trailing bytes are left unconsumed.
pub(crate) fn decode<R: Read>(schema: &Schema, names: &Names, reader: &mut R) -> AvroResult<Value> {
    decode_internal(schema, names, &None, reader)
}

/// Read a `long` length prefix and check it against the allocation limit.
fn decode_len<R: Read>(reader: &mut R) -> AvroResult<usize> {
    let len = zag_i64(reader)?;
    if len < 0 {
        return Err(Details::BytesLength(len).into());
    }
    safe_len(len as usize)
}

/// Read a block count for an array or map.
///
/// A negative count means its absolute value entries follow, preceded by a
/// `long` with the block's size in bytes, which this format has no use for.
fn decode_block_count<R: Read>(reader: &mut R) -> AvroResult<usize> {
    let count = zag_i64(reader)?;
    let count = if count < 0 {
        let _block_bytes = zag_i64(reader)?;
        count.checked_neg().ok_or(Details::BlockCount(count))?
    } else {
        count
    };
    safe_len(usize::try_from(count).map_err(|_| Details::BlockCount(count))?)
}

fn decode_string<R: Read>(reader: &mut R) -> AvroResult<String> {
    let len = decode_len(reader)?;
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf).map_err(Details::ReadBytes)?;
    String::from_utf8(buf).map_err(|e| Details::ConvertToUtf8(e).into())
}

pub(crate) fn decode_internal<R: Read>(
    schema: &Schema,
    names: &Names,
    enclosing_namespace: &Namespace,
    reader: &mut R,
) -> AvroResult<Value> {
    match schema {
        Schema::Ref { name } => {
            let fully_qualified_name = name.fully_qualified_name(enclosing_namespace);
            let resolved = names
                .get(&fully_qualified_name)
                .ok_or(Details::SchemaResolution(fully_qualified_name))?;
            decode_internal(resolved, names, enclosing_namespace, reader)
        }
        Schema::Null => Ok(Value::Null),
        Schema::Boolean => {
            let mut buf = [0u8; 1];
            reader.read_exact(&mut buf[..]).map_err(Details::ReadBytes)?;
            match buf[0] {
                0u8 => Ok(Value::Boolean(false)),
                1u8 => Ok(Value::Boolean(true)),
                _ => Err(Details::BoolValue(buf[0]).into()),
            }
        }
        Schema::Int => zag_i32(reader).map(Value::Int),
        Schema::Long => zag_i64(reader).map(Value::Long),
        Schema::Float => {
            let mut buf = [0u8; 4];
            reader.read_exact(&mut buf[..]).map_err(Details::ReadBytes)?;
            Ok(Value::Float(f32::from_le_bytes(buf)))
        }
        Schema::Double => {
            let mut buf = [0u8; 8];
            reader.read_exact(&mut buf[..]).map_err(Details::ReadBytes)?;
            Ok(Value::Double(f64::from_le_bytes(buf)))
        }
        Schema::Bytes => {
            let len = decode_len(reader)?;
            let mut buf = vec![0u8; len];
            reader.read_exact(&mut buf).map_err(Details::ReadBytes)?;
            Ok(Value::Bytes(buf))
        }
        Schema::String => decode_string(reader).map(Value::String),
        Schema::Fixed(FixedSchema { name, size, .. }) => {
            let mut buf = vec![0u8; safe_len(*size)?];
            reader.read_exact(&mut buf).map_err(Details::ReadBytes)?;
            Ok(Value::Fixed(name.fullname(None), buf))
        }
        Schema::Enum(EnumSchema { name, symbols, .. }) => {
            let index = zag_i64(reader)?;
            match usize::try_from(index).ok().and_then(|i| symbols.get(i)) {
                Some(symbol) => Ok(Value::Enum(name.fullname(None), symbol.clone())),
                None => Err(Details::GetEnumValue {
                    name: name.fullname(None),
                    index,
                    max: symbols.len() - 1,
                }
                .into()),
            }
        }
        Schema::Union(union) => decode_union(union, names, enclosing_namespace, reader),
        Schema::Array(ArraySchema { items, .. }) => {
            let mut collected = Vec::new();
            loop {
                let block_count = decode_block_count(reader)?;
                if block_count == 0 {
                    break;
                }
                collected.reserve(block_count);
                for _ in 0..block_count {
                    collected.push(decode_internal(items, names, enclosing_namespace, reader)?);
                }
            }
            Ok(Value::Array(collected))
        }
        Schema::Map(MapSchema { values, .. }) => {
            let mut collected = HashMap::new();
            loop {
                let block_count = decode_block_count(reader)?;
                if block_count == 0 {
                    break;
                }
                for _ in 0..block_count {
                    let key = decode_string(reader)?;
                    let value = decode_internal(values, names, enclosing_namespace, reader)?;
                    // Duplicate keys in the stream overwrite earlier values.
                    collected.insert(key, value);
                }
            }
            Ok(Value::Map(collected))
        }
        Schema::Record(RecordSchema { name, fields, .. }) => {
            let record_namespace = name.namespace.clone();
            let mut collected = Vec::with_capacity(fields.len());
            for field in fields {
                let value = decode_internal(&field.schema, names, &record_namespace, reader)?;
                collected.push((field.name.clone(), value));
            }
            Ok(Value::Record(name.fullname(None), collected))
        }
    }
}

fn decode_union<R: Read>(
    union: &UnionSchema,
    names: &Names,
    enclosing_namespace: &Namespace,
    reader: &mut R,
) -> AvroResult<Value> {
    let index = zag_i32(reader)?;
    let variants = union.variants();
    let variant = usize::try_from(index)
        .ok()
        .and_then(|i| variants.get(i))
        .ok_or(Details::GetUnionValue {
            index: i64::from(index),
            max: variants.len() - 1,
        })?;
    let value = decode_internal(variant, names, enclosing_namespace, reader)?;
    Ok(Value::Union(index as u32, Box::new(value)))
}
