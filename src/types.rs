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

//! Logic handling the intermediate representation of Avro values.

use crate::schema::{RecordSchema, Schema};
use std::collections::{BTreeMap, HashMap};
use strum_macros::EnumDiscriminants;

/// Represents any valid Avro value.
///
/// Named values (`Enum`, `Fixed`, `Record`) carry the fully qualified name
/// of their type, which is what union encoding discriminates on.
#[derive(Clone, Debug, PartialEq, EnumDiscriminants)]
#[strum_discriminants(name(ValueKind))]
pub enum Value {
    /// A `null` Avro value.
    Null,
    /// A `boolean` Avro value.
    Boolean(bool),
    /// An `int` Avro value.
    Int(i32),
    /// A `long` Avro value.
    Long(i64),
    /// A `float` Avro value.
    Float(f32),
    /// A `double` Avro value.
    Double(f64),
    /// A `bytes` Avro value.
    Bytes(Vec<u8>),
    /// A `string` Avro value.
    String(String),
    /// An `enum` Avro value: the fully qualified type name and the symbol.
    Enum(String, String),
    /// A `fixed` Avro value: the fully qualified type name and the bytes.
    Fixed(String, Vec<u8>),
    /// A `record` Avro value: the fully qualified type name and the fields
    /// that are present, in schema declaration order.
    ///
    /// Fields without a datum are simply absent; encoding fills them from
    /// the schema's defaults, or fails.
    Record(String, Vec<(String, Value)>),
    /// An `array` Avro value.
    Array(Vec<Value>),
    /// A `map` Avro value.
    Map(HashMap<String, Value>),
    /// A `union` Avro value: the zero-based member index and the member
    /// datum.
    ///
    /// Encoding a union also accepts any bare value and discriminates it
    /// at runtime; decoding always produces this tagged form.
    Union(u32, Box<Value>),
}

impl Value {
    /// The discriminator tag used to select a union member for this value.
    ///
    /// Primitives map to the native tags the symbol table is seeded with;
    /// named values use their declared type name.
    pub(crate) fn union_tag(&self) -> &str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "bool",
            Value::Int(_) => "int32",
            Value::Long(_) => "int64",
            Value::Float(_) => "float32",
            Value::Double(_) => "float64",
            Value::Bytes(_) => "[]uint8",
            Value::String(_) => "string",
            Value::Map(_) => "map",
            Value::Array(_) => "array",
            Value::Enum(name, _) | Value::Fixed(name, _) | Value::Record(name, _) => name,
            Value::Union(_, _) => "union",
        }
    }
}

impl From<()> for Value {
    fn from((): ()) -> Self {
        Self::Null
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Long(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Self::Bytes(value.to_vec())
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Self::Array(value)
    }
}

impl From<HashMap<String, Value>> for Value {
    fn from(value: HashMap<String, Value>) -> Self {
        Self::Map(value)
    }
}

/// A convenience type for building a [`Value::Record`] against a record
/// schema, field by field.
///
/// ```
/// # use avro_codec::{Codec, types::{Record, Value}};
/// let codec = Codec::new(r#"{
///     "type": "record", "name": "test",
///     "fields": [{"name": "a", "type": "long"}, {"name": "b", "type": "string"}]
/// }"#).unwrap();
/// let mut record = Record::new(codec.root()).unwrap();
/// record.put("a", 27i64);
/// record.put("b", "foo");
/// let value = Value::from(record);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Record<'a> {
    /// The fully qualified name of the record type.
    name: String,
    /// One slot per schema field, in declaration order; `None` is absent.
    fields: Vec<(String, Option<Value>)>,
    /// Field name (or alias) to position.
    schema_lookup: &'a BTreeMap<String, usize>,
}

impl<'a> Record<'a> {
    /// Create a `Record` given a `Schema`.
    ///
    /// If the `Schema` is not a record variant, `None` will be returned.
    pub fn new(schema: &'a Schema) -> Option<Record<'a>> {
        match schema {
            Schema::Record(RecordSchema {
                name,
                fields: schema_fields,
                lookup: schema_lookup,
                ..
            }) => {
                let mut fields = Vec::with_capacity(schema_fields.len());
                for schema_field in schema_fields.iter() {
                    fields.push((schema_field.name.clone(), None));
                }

                Some(Record {
                    name: name.fullname(None),
                    fields,
                    schema_lookup,
                })
            }
            _ => None,
        }
    }

    /// Put a value of type `V` for the field with the given `name`.
    ///
    /// **NOTE** Only ensures that the field name is present in the record
    /// being built; does not perform any schema validation.
    pub fn put<V>(&mut self, field: &str, value: V)
    where
        V: Into<Value>,
    {
        if let Some(&position) = self.schema_lookup.get(field) {
            self.fields[position].1 = Some(value.into())
        }
    }
}

impl From<Record<'_>> for Value {
    fn from(value: Record<'_>) -> Self {
        Self::Record(
            value.name,
            value
                .fields
                .into_iter()
                .filter_map(|(name, datum)| datum.map(|datum| (name, datum)))
                .collect(),
        )
    }
}
