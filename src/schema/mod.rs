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

//! Logic for parsing and interacting with schemas in Avro format.

mod name;
mod parser;

pub use name::{Alias, Aliases, Name, Names, Namespace, NamespaceRef};
pub(crate) use name::error_namespace;
pub(crate) use parser::Parser;

use crate::error::{Details, Error};
use serde::{
    Serialize, Serializer,
    ser::{SerializeMap, SerializeSeq},
};
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use strum::EnumDiscriminants;

/// Represents documentation for complex Avro schemas.
pub type Documentation = Option<String>;

/// Represents any valid Avro schema.
///
/// More information about Avro schemas can be found in the
/// [Avro Specification](https://avro.apache.org/docs/1.7.7/spec.html#schemas)
#[derive(Clone, Debug, PartialEq, EnumDiscriminants)]
#[strum_discriminants(name(SchemaKind), derive(Hash, Ord, PartialOrd))]
pub enum Schema {
    /// A `null` Avro schema.
    Null,
    /// A `boolean` Avro schema.
    Boolean,
    /// An `int` Avro schema.
    Int,
    /// A `long` Avro schema.
    Long,
    /// A `float` Avro schema.
    Float,
    /// A `double` Avro schema.
    Double,
    /// A `bytes` Avro schema.
    ///
    /// `Bytes` represents a sequence of 8-bit unsigned bytes.
    Bytes,
    /// A `string` Avro schema.
    ///
    /// `String` represents a unicode character sequence.
    String,
    /// An `array` Avro schema.
    ///
    /// All items will have the same schema.
    Array(ArraySchema),
    /// A `map` Avro schema.
    ///
    /// Keys are always strings and all values will have the same schema.
    Map(MapSchema),
    /// A `union` Avro schema.
    Union(UnionSchema),
    /// A `record` Avro schema.
    Record(RecordSchema),
    /// An `enum` Avro schema.
    Enum(EnumSchema),
    /// A `fixed` Avro schema.
    Fixed(FixedSchema),
    /// A reference to another schema, by fully qualified name.
    ///
    /// References keep the schema graph acyclic: a named type is defined
    /// once and every later mention resolves through the symbol table.
    Ref { name: Name },
}

impl SchemaKind {
    pub fn is_primitive(self) -> bool {
        matches!(
            self,
            SchemaKind::Null
                | SchemaKind::Boolean
                | SchemaKind::Int
                | SchemaKind::Long
                | SchemaKind::Double
                | SchemaKind::Float
                | SchemaKind::Bytes
                | SchemaKind::String,
        )
    }
}

/// A description of an Array schema.
#[derive(Clone, Debug, PartialEq)]
pub struct ArraySchema {
    /// The schema of the array's items.
    pub items: Box<Schema>,
    /// The custom attributes of the schema.
    pub attributes: BTreeMap<String, JsonValue>,
}

/// A description of a Map schema.
#[derive(Clone, Debug, PartialEq)]
pub struct MapSchema {
    /// The schema of the map's values.
    pub values: Box<Schema>,
    /// The custom attributes of the schema.
    pub attributes: BTreeMap<String, JsonValue>,
}

/// A description of a Record schema.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordSchema {
    /// The name of the schema.
    pub name: Name,
    /// The aliases of the schema.
    pub aliases: Aliases,
    /// The documentation of the schema.
    pub doc: Documentation,
    /// The set of fields of the schema, in declaration order.
    pub fields: Vec<RecordField>,
    /// The set of fields (and their aliases) to their position in the schema.
    pub lookup: BTreeMap<String, usize>,
    /// The custom attributes of the schema.
    pub attributes: BTreeMap<String, JsonValue>,
}

/// Represents a `field` in a `record` Avro schema.
#[derive(bon::Builder, Clone, Debug, PartialEq)]
pub struct RecordField {
    /// Name of the field.
    #[builder(into)]
    pub name: String,
    /// Documentation of the field.
    #[builder(default)]
    pub doc: Documentation,
    /// Aliases of the field's name. They have no namespace.
    #[builder(default)]
    pub aliases: Vec<String>,
    /// Default value of the field, as it appears in the schema JSON.
    ///
    /// It is bound through the field's schema when a record datum omits
    /// the field at encode time.
    pub default: Option<JsonValue>,
    /// Schema of the field.
    pub schema: Schema,
    /// A collection of all unknown keys in the record field.
    #[builder(default = BTreeMap::new())]
    pub custom_attributes: BTreeMap<String, JsonValue>,
}

/// A description of an Enum schema.
#[derive(bon::Builder, Clone, Debug, PartialEq)]
pub struct EnumSchema {
    /// The name of the schema.
    pub name: Name,
    /// The aliases of the schema.
    #[builder(default)]
    pub aliases: Aliases,
    /// The documentation of the schema.
    #[builder(default)]
    pub doc: Documentation,
    /// The set of symbols of the schema.
    pub symbols: Vec<String>,
    /// The custom attributes of the schema.
    #[builder(default = BTreeMap::new())]
    pub attributes: BTreeMap<String, JsonValue>,
}

/// A description of a Fixed schema.
#[derive(bon::Builder, Clone, Debug, PartialEq)]
pub struct FixedSchema {
    /// The name of the schema.
    pub name: Name,
    /// The aliases of the schema.
    #[builder(default)]
    pub aliases: Aliases,
    /// The documentation of the schema.
    #[builder(default)]
    pub doc: Documentation,
    /// The number of bytes of the fixed schema.
    pub size: usize,
    /// The custom attributes of the schema.
    #[builder(default = BTreeMap::new())]
    pub attributes: BTreeMap<String, JsonValue>,
}

/// A description of a Union schema.
///
/// Alongside the member schemas it holds the three parallel member tables
/// used by the codecs: member index to schema, discriminator tag to member,
/// and Avro JSON member key to member.
#[derive(Clone, Debug)]
pub struct UnionSchema {
    /// The schemas that make up this union, in declaration order.
    schemas: Vec<Schema>,
    /// The discriminator tag of each member, parallel to `schemas`.
    tags: Vec<String>,
    /// The Avro JSON member key of each member, parallel to `schemas`.
    json_names: Vec<String>,
    /// Constant time lookup from a datum's discriminator tag to its member.
    variant_index: HashMap<String, usize>,
    /// Constant time lookup from an Avro JSON member key to its member.
    json_index: HashMap<String, usize>,
}

impl UnionSchema {
    /// Creates a new `UnionSchema` from a vector of member schemas.
    ///
    /// # Errors
    /// Will return an error if `schemas` is empty, contains a union, or
    /// contains two members that share a discriminator key.
    pub fn new(schemas: Vec<Schema>) -> Result<Self, Error> {
        if schemas.is_empty() {
            return Err(Details::EmptyUnion.into());
        }

        let mut tags = Vec::with_capacity(schemas.len());
        let mut json_names = Vec::with_capacity(schemas.len());
        let mut variant_index = HashMap::with_capacity(schemas.len());
        let mut json_index = HashMap::with_capacity(schemas.len());
        for (i, schema) in schemas.iter().enumerate() {
            if let Schema::Union(_) = schema {
                return Err(Details::GetNestedUnion.into());
            }
            let tag = member_tag(schema);
            let json_name = member_json_name(schema);
            if variant_index.insert(tag.clone(), i).is_some() {
                return Err(Details::GetUnionDuplicate(tag).into());
            }
            json_index.insert(json_name.clone(), i);
            tags.push(tag);
            json_names.push(json_name);
        }

        Ok(UnionSchema {
            schemas,
            tags,
            json_names,
            variant_index,
            json_index,
        })
    }

    /// Returns a slice to all variants of this schema.
    pub fn variants(&self) -> &[Schema] {
        &self.schemas
    }

    /// Returns true if any of the variants of this `UnionSchema` is `Null`.
    pub fn is_nullable(&self) -> bool {
        self.schemas.iter().any(|x| matches!(x, Schema::Null))
    }

    /// The member matching a datum's discriminator tag, with its index.
    pub(crate) fn find_by_tag(&self, tag: &str) -> Option<(usize, &Schema)> {
        self.variant_index.get(tag).map(|&i| (i, &self.schemas[i]))
    }

    /// The member matching an Avro JSON member key, with its index.
    pub(crate) fn find_by_json_name(&self, json_name: &str) -> Option<(usize, &Schema)> {
        self.json_index.get(json_name).map(|&i| (i, &self.schemas[i]))
    }

    /// The Avro JSON member key of the member at `index`.
    pub(crate) fn json_name(&self, index: usize) -> &str {
        &self.json_names[index]
    }

    /// The discriminator tags of all members, for error messages.
    pub(crate) fn expected_tags(&self) -> String {
        self.tags.join(", ")
    }
}

// No need to compare the lookup tables, they are derivative of the schemas.
impl PartialEq for UnionSchema {
    fn eq(&self, other: &UnionSchema) -> bool {
        self.schemas.eq(&other.schemas)
    }
}

/// The discriminator tag of a union member.
///
/// Primitives use the native tags the symbol table is seeded with, named
/// types their fully qualified name.
fn member_tag(schema: &Schema) -> String {
    match schema {
        Schema::Null => "null".to_string(),
        Schema::Boolean => "bool".to_string(),
        Schema::Int => "int32".to_string(),
        Schema::Long => "int64".to_string(),
        Schema::Float => "float32".to_string(),
        Schema::Double => "float64".to_string(),
        Schema::Bytes => "[]uint8".to_string(),
        Schema::String => "string".to_string(),
        Schema::Map(_) => "map".to_string(),
        Schema::Array(_) => "array".to_string(),
        Schema::Record(RecordSchema { name, .. })
        | Schema::Enum(EnumSchema { name, .. })
        | Schema::Fixed(FixedSchema { name, .. })
        | Schema::Ref { name } => name.fullname(None),
        Schema::Union(_) => "union".to_string(),
    }
}

/// The key a union member contributes to the Avro JSON single-key wrapper.
///
/// Primitives use the Avro type name, named types their fully qualified
/// name.
fn member_json_name(schema: &Schema) -> String {
    match schema {
        Schema::Null => "null".to_string(),
        Schema::Boolean => "boolean".to_string(),
        Schema::Int => "int".to_string(),
        Schema::Long => "long".to_string(),
        Schema::Float => "float".to_string(),
        Schema::Double => "double".to_string(),
        Schema::Bytes => "bytes".to_string(),
        Schema::String => "string".to_string(),
        Schema::Map(_) => "map".to_string(),
        Schema::Array(_) => "array".to_string(),
        Schema::Record(RecordSchema { name, .. })
        | Schema::Enum(EnumSchema { name, .. })
        | Schema::Fixed(FixedSchema { name, .. })
        | Schema::Ref { name } => name.fullname(None),
        Schema::Union(_) => "union".to_string(),
    }
}

impl Schema {
    /// Create a `Schema` from a string representing a JSON Avro schema.
    pub fn parse_str(input: &str) -> Result<Schema, Error> {
        let mut parser = Parser::default();
        parser.parse_str(input)
    }

    /// Create a `Schema` from a JSON value representing an Avro schema.
    pub fn parse(value: &JsonValue) -> Result<Schema, Error> {
        let mut parser = Parser::default();
        parser.parse(value, None)
    }

    /// The name of the schema, if it is a named type.
    pub fn name(&self) -> Option<&Name> {
        match self {
            Schema::Record(RecordSchema { name, .. })
            | Schema::Enum(EnumSchema { name, .. })
            | Schema::Fixed(FixedSchema { name, .. })
            | Schema::Ref { name } => Some(name),
            _ => None,
        }
    }

    /// The namespace of the schema, if it is a named type with one.
    pub fn namespace(&self) -> Namespace {
        self.name().and_then(|name| name.namespace.clone())
    }

    /// Whether the schema defines or references a named type.
    pub fn is_named(&self) -> bool {
        self.name().is_some()
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

impl Serialize for Schema {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Schema::Null => serializer.serialize_str("null"),
            Schema::Boolean => serializer.serialize_str("boolean"),
            Schema::Int => serializer.serialize_str("int"),
            Schema::Long => serializer.serialize_str("long"),
            Schema::Float => serializer.serialize_str("float"),
            Schema::Double => serializer.serialize_str("double"),
            Schema::Bytes => serializer.serialize_str("bytes"),
            Schema::String => serializer.serialize_str("string"),
            Schema::Array(inner) => {
                let mut map = serializer.serialize_map(Some(2 + inner.attributes.len()))?;
                map.serialize_entry("type", "array")?;
                map.serialize_entry("items", &*inner.items)?;
                for attr in &inner.attributes {
                    map.serialize_entry(attr.0, attr.1)?;
                }
                map.end()
            }
            Schema::Map(inner) => {
                let mut map = serializer.serialize_map(Some(2 + inner.attributes.len()))?;
                map.serialize_entry("type", "map")?;
                map.serialize_entry("values", &*inner.values)?;
                for attr in &inner.attributes {
                    map.serialize_entry(attr.0, attr.1)?;
                }
                map.end()
            }
            Schema::Union(inner) => {
                let variants = inner.variants();
                let mut seq = serializer.serialize_seq(Some(variants.len()))?;
                for v in variants {
                    seq.serialize_element(v)?;
                }
                seq.end()
            }
            Schema::Record(RecordSchema {
                name,
                aliases,
                doc,
                fields,
                attributes,
                ..
            }) => {
                let mut map = serializer.serialize_map(None)?;
                map.serialize_entry("type", "record")?;
                if let Some(ref n) = name.namespace {
                    map.serialize_entry("namespace", n)?;
                }
                map.serialize_entry("name", &name.name)?;
                if let Some(ref docstr) = doc {
                    map.serialize_entry("doc", docstr)?;
                }
                if let Some(ref aliases) = aliases {
                    map.serialize_entry("aliases", aliases)?;
                }
                map.serialize_entry("fields", fields)?;
                for attr in attributes {
                    map.serialize_entry(attr.0, attr.1)?;
                }
                map.end()
            }
            Schema::Enum(EnumSchema {
                name,
                aliases,
                doc,
                symbols,
                attributes,
            }) => {
                let mut map = serializer.serialize_map(None)?;
                map.serialize_entry("type", "enum")?;
                if let Some(ref n) = name.namespace {
                    map.serialize_entry("namespace", n)?;
                }
                map.serialize_entry("name", &name.name)?;
                if let Some(ref docstr) = doc {
                    map.serialize_entry("doc", docstr)?;
                }
                if let Some(ref aliases) = aliases {
                    map.serialize_entry("aliases", aliases)?;
                }
                map.serialize_entry("symbols", symbols)?;
                for attr in attributes {
                    map.serialize_entry(attr.0, attr.1)?;
                }
                map.end()
            }
            Schema::Fixed(FixedSchema {
                name,
                aliases,
                doc,
                size,
                attributes,
            }) => {
                let mut map = serializer.serialize_map(None)?;
                map.serialize_entry("type", "fixed")?;
                if let Some(ref n) = name.namespace {
                    map.serialize_entry("namespace", n)?;
                }
                map.serialize_entry("name", &name.name)?;
                if let Some(ref docstr) = doc {
                    map.serialize_entry("doc", docstr)?;
                }
                if let Some(ref aliases) = aliases {
                    map.serialize_entry("aliases", aliases)?;
                }
                map.serialize_entry("size", size)?;
                for attr in attributes {
                    map.serialize_entry(attr.0, attr.1)?;
                }
                map.end()
            }
            Schema::Ref { name } => serializer.serialize_str(&name.fullname(None)),
        }
    }
}

impl Serialize for RecordField {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("name", &self.name)?;
        map.serialize_entry("type", &self.schema)?;

        if let Some(ref default) = self.default {
            map.serialize_entry("default", default)?;
        }

        if let Some(ref doc) = self.doc {
            map.serialize_entry("doc", doc)?;
        }

        if !self.aliases.is_empty() {
            map.serialize_entry("aliases", &self.aliases)?;
        }

        for attr in &self.custom_attributes {
            map.serialize_entry(attr.0, attr.1)?;
        }

        map.end()
    }
}

impl RecordField {
    /// Returns true if this `RecordField` is nullable: its schema is a
    /// union whose first variant is `null`.
    pub fn is_nullable(&self) -> bool {
        match self.schema {
            Schema::Union(ref inner) => matches!(inner.variants().first(), Some(Schema::Null)),
            _ => false,
        }
    }
}
