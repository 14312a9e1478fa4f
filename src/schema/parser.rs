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

use crate::error::Details;
use crate::schema::{
    Alias, Aliases, ArraySchema, EnumSchema, FixedSchema, MapSchema, Name, Names, NamespaceRef,
    RecordField, RecordSchema, Schema, UnionSchema, error_namespace,
};
use crate::util::MapHelper;
use crate::validator::{validate_enum_symbol_name, validate_record_field_name};
use crate::{AvroResult, Error};
use log::{debug, warn};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};

/// The recursive schema builder and its symbol table.
///
/// One `Parser` is created per top-level schema build. Named types are
/// registered before their children are compiled, so self-referential
/// schemas resolve to a [`Schema::Ref`] pointing back at the definition.
#[derive(Default)]
pub(crate) struct Parser {
    /// Named types that are still being compiled. Used to resolve cyclic
    /// references, i.e. when a field's type is a reference to its record's
    /// type.
    resolving_schemas: Names,
    /// Named types that are fully compiled.
    parsed_schemas: Names,
}

impl Parser {
    /// Create a `Schema` from a string representing a JSON Avro schema.
    pub(crate) fn parse_str(&mut self, input: &str) -> AvroResult<Schema> {
        let value = serde_json::from_str(input).map_err(Details::ParseSchemaJson)?;
        self.parse(&value, None)
    }

    /// The symbol table of fully compiled named types.
    pub(crate) fn into_names(self) -> Names {
        self.parsed_schemas
    }

    /// Create a `Schema` from a `serde_json::Value` representing a JSON
    /// Avro schema.
    pub(crate) fn parse(
        &mut self,
        value: &Value,
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<Schema> {
        match *value {
            Value::String(ref t) => self.parse_known_schema(t.as_str(), enclosing_namespace),
            Value::Object(ref data) => self.parse_complex(data, enclosing_namespace),
            Value::Array(ref data) => self.parse_union(data, enclosing_namespace),
            _ => Err(Details::ParseSchemaFromValidJson.into()),
        }
    }

    /// Parse a string as a primitive type or a reference to a named type.
    fn parse_known_schema(
        &mut self,
        name: &str,
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<Schema> {
        match name {
            "null" => Ok(Schema::Null),
            "boolean" => Ok(Schema::Boolean),
            "int" => Ok(Schema::Int),
            "long" => Ok(Schema::Long),
            "double" => Ok(Schema::Double),
            "float" => Ok(Schema::Float),
            "bytes" => Ok(Schema::Bytes),
            "string" => Ok(Schema::String),
            _ => self.fetch_schema_ref(name, enclosing_namespace),
        }
    }

    /// Given a name, tries to retrieve the schema from the symbol table,
    /// checking fully compiled types first and currently resolving ones
    /// second.
    fn fetch_schema_ref(
        &mut self,
        name: &str,
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<Schema> {
        let fully_qualified_name = Name::new_with_enclosing_namespace(name, enclosing_namespace)?;

        if self.parsed_schemas.contains_key(&fully_qualified_name)
            || self.resolving_schemas.contains_key(&fully_qualified_name)
        {
            return Ok(Schema::Ref {
                name: fully_qualified_name,
            });
        }

        Err(Details::UnknownTypeName(fully_qualified_name.fullname(None)).into())
    }

    /// Parse a `serde_json::Value` representing a complex Avro type into a
    /// `Schema`.
    ///
    /// Avro supports "recursive" definition of types, e.g:
    /// `{"type": {"type": "string"}}`.
    fn parse_complex(
        &mut self,
        complex: &Map<String, Value>,
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<Schema> {
        match complex.get("type") {
            Some(Value::String(t)) => match t.as_str() {
                "record" => self.parse_record(complex, enclosing_namespace),
                "enum" => self.parse_enum(complex, enclosing_namespace),
                "array" => self.parse_array(complex, enclosing_namespace),
                "map" => self.parse_map(complex, enclosing_namespace),
                "fixed" => self.parse_fixed(complex, enclosing_namespace),
                other => self.parse_known_schema(other, enclosing_namespace),
            },
            Some(Value::Object(data)) => self.parse_complex(data, enclosing_namespace),
            Some(Value::Array(variants)) => self.parse_union(variants, enclosing_namespace),
            Some(unknown) => Err(Details::GetComplexType(unknown.clone()).into()),
            None => Err(Details::GetComplexTypeField.into()),
        }
    }

    fn register_resolving_schema(&mut self, name: &Name, aliases: &Aliases) {
        let resolving_schema = Schema::Ref { name: name.clone() };
        self.resolving_schemas
            .insert(name.clone(), resolving_schema.clone());

        if let Some(aliases) = aliases {
            for alias in aliases {
                let alias_fullname = alias.fully_qualified_name(&name.namespace);
                self.resolving_schemas
                    .insert(alias_fullname, resolving_schema.clone());
            }
        }
    }

    fn register_parsed_schema(
        &mut self,
        fully_qualified_name: &Name,
        schema: &Schema,
        aliases: &Aliases,
    ) {
        self.parsed_schemas
            .insert(fully_qualified_name.clone(), schema.clone());
        self.resolving_schemas.remove(fully_qualified_name);

        if let Some(aliases) = aliases {
            for alias in aliases {
                let alias_fullname = alias.fully_qualified_name(&fully_qualified_name.namespace);
                self.resolving_schemas.remove(&alias_fullname);
                self.parsed_schemas.insert(alias_fullname, schema.clone());
            }
        }
    }

    /// Parse a `serde_json::Value` representing an Avro record type into a
    /// `Schema`.
    fn parse_record(
        &mut self,
        complex: &Map<String, Value>,
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<Schema> {
        let fully_qualified_name = Name::parse(complex, enclosing_namespace)?;
        let aliases =
            self.fix_aliases_namespace(complex.aliases(), fully_qualified_name.namespace.as_deref());

        let mut lookup = BTreeMap::new();

        // Register before compiling the fields so self-references resolve.
        self.register_resolving_schema(&fully_qualified_name, &aliases);

        debug!("Going to parse record schema: {:?}", &fully_qualified_name);

        let fields: Vec<RecordField> = complex
            .get("fields")
            .and_then(|fields| fields.as_array())
            .filter(|fields| !fields.is_empty())
            .ok_or_else(|| {
                Error::new(Details::GetRecordFields(fully_qualified_name.fullname(None)))
            })
            .and_then(|fields| {
                fields
                    .iter()
                    .map(|field| self.parse_record_field(field, &fully_qualified_name))
                    .collect::<Result<_, _>>()
            })?;

        for (position, field) in fields.iter().enumerate() {
            if lookup.insert(field.name.clone(), position).is_some() {
                return Err(Details::FieldNameDuplicate(
                    fully_qualified_name.fullname(None),
                    field.name.clone(),
                )
                .into());
            }

            for alias in &field.aliases {
                lookup.insert(alias.clone(), position);
            }
        }

        let schema = Schema::Record(RecordSchema {
            name: fully_qualified_name.clone(),
            aliases: aliases.clone(),
            doc: complex.doc(),
            fields,
            lookup,
            attributes: self.get_custom_attributes(complex, &["fields"]),
        });

        self.register_parsed_schema(&fully_qualified_name, &schema, &aliases);
        Ok(schema)
    }

    /// Parse a member of a record's `fields` array into a [`RecordField`].
    fn parse_record_field(
        &mut self,
        field: &Value,
        enclosing_record: &Name,
    ) -> AvroResult<RecordField> {
        let field = field
            .as_object()
            .ok_or(Details::GetNameFieldFromRecord)?;
        let name = field.name().ok_or(Details::GetNameFieldFromRecord)?;

        validate_record_field_name(&name)?;

        let ty = field.get("type").ok_or_else(|| {
            Details::GetRecordFieldType(enclosing_record.fullname(None), name.clone())
        })?;
        let schema = self.parse(ty, enclosing_record.namespace.as_deref())?;

        let aliases = field
            .get("aliases")
            .and_then(|aliases| {
                aliases.as_array().map(|aliases| {
                    aliases
                        .iter()
                        .flat_map(|alias| alias.as_str())
                        .map(|alias| alias.to_string())
                        .collect::<Vec<String>>()
                })
            })
            .unwrap_or_default();

        Ok(RecordField {
            name,
            doc: field.doc(),
            default: field.get("default").cloned(),
            aliases,
            schema,
            custom_attributes: Self::get_field_custom_attributes(field),
        })
    }

    /// Parse a `serde_json::Value` representing an Avro enum type into a
    /// `Schema`.
    fn parse_enum(
        &mut self,
        complex: &Map<String, Value>,
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<Schema> {
        let fully_qualified_name = Name::parse(complex, enclosing_namespace)?;
        let fullname = fully_qualified_name.fullname(None);
        let aliases =
            self.fix_aliases_namespace(complex.aliases(), fully_qualified_name.namespace.as_deref());

        let symbols_json = complex
            .get("symbols")
            .ok_or_else(|| Error::new(Details::GetEnumSymbolsField(fullname.clone())))?
            .as_array()
            .filter(|symbols| !symbols.is_empty())
            .ok_or_else(|| Error::new(Details::GetEnumSymbols(fullname.clone())))?;

        let mut symbols: Vec<String> = Vec::with_capacity(symbols_json.len());
        for symbol in symbols_json {
            match symbol.as_str() {
                Some(symbol) => symbols.push(symbol.to_string()),
                None => return Err(Details::GetEnumSymbolString(fullname.clone()).into()),
            }
        }

        let mut existing_symbols: HashSet<&String> = HashSet::with_capacity(symbols.len());
        for symbol in symbols.iter() {
            validate_enum_symbol_name(symbol)?;

            if !existing_symbols.insert(symbol) {
                return Err(
                    Details::EnumSymbolDuplicate(fullname.clone(), symbol.to_string()).into(),
                );
            }
        }

        let schema = Schema::Enum(EnumSchema {
            name: fully_qualified_name.clone(),
            aliases: aliases.clone(),
            doc: complex.doc(),
            symbols,
            attributes: self.get_custom_attributes(complex, &["symbols"]),
        });

        self.register_parsed_schema(&fully_qualified_name, &schema, &aliases);

        Ok(schema)
    }

    /// Parse a `serde_json::Value` representing an Avro fixed type into a
    /// `Schema`.
    fn parse_fixed(
        &mut self,
        complex: &Map<String, Value>,
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<Schema> {
        let fully_qualified_name = Name::parse(complex, enclosing_namespace)?;
        let fullname = fully_qualified_name.fullname(None);
        let aliases =
            self.fix_aliases_namespace(complex.aliases(), fully_qualified_name.namespace.as_deref());

        let size = match complex.get("size") {
            Some(size) => size
                .as_u64()
                .ok_or_else(|| Details::GetFixedSize(fullname.clone(), size.clone())),
            None => Err(Details::GetFixedSizeField(fullname.clone())),
        }?;

        let schema = Schema::Fixed(FixedSchema {
            name: fully_qualified_name.clone(),
            aliases: aliases.clone(),
            doc: complex.doc(),
            size: size as usize,
            attributes: self.get_custom_attributes(complex, &["size"]),
        });

        self.register_parsed_schema(&fully_qualified_name, &schema, &aliases);

        Ok(schema)
    }

    /// Parse a `serde_json::Value` representing an Avro array type into a
    /// `Schema`.
    fn parse_array(
        &mut self,
        complex: &Map<String, Value>,
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<Schema> {
        let items = complex
            .get("items")
            .ok_or_else(|| {
                Error::new(Details::GetArrayItemsField(error_namespace(
                    enclosing_namespace,
                )))
            })
            .and_then(|items| self.parse(items, enclosing_namespace))?;

        Ok(Schema::Array(ArraySchema {
            items: Box::new(items),
            attributes: self.get_custom_attributes(complex, &["items"]),
        }))
    }

    /// Parse a `serde_json::Value` representing an Avro map type into a
    /// `Schema`.
    fn parse_map(
        &mut self,
        complex: &Map<String, Value>,
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<Schema> {
        let values = complex
            .get("values")
            .ok_or_else(|| {
                Error::new(Details::GetMapValuesField(error_namespace(
                    enclosing_namespace,
                )))
            })
            .and_then(|values| self.parse(values, enclosing_namespace))?;

        Ok(Schema::Map(MapSchema {
            values: Box::new(values),
            attributes: self.get_custom_attributes(complex, &["values"]),
        }))
    }

    /// Parse a `serde_json::Value` representing an Avro union type into a
    /// `Schema`.
    fn parse_union(
        &mut self,
        items: &[Value],
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<Schema> {
        if items.len() == 1 {
            warn!("Union schema with just one member! Consider dropping the union!");
        }
        items
            .iter()
            .map(|v| self.parse(v, enclosing_namespace))
            .collect::<Result<Vec<_>, _>>()
            .and_then(|schemas| Ok(Schema::Union(UnionSchema::new(schemas)?)))
    }

    // A type alias may be specified either fully namespace-qualified, or
    // relative to the namespace of the name it is an alias for. For example,
    // if a type named "a.b" has aliases of "c" and "x.y", then the fully
    // qualified names of its aliases are "a.c" and "x.y".
    fn fix_aliases_namespace(
        &self,
        aliases: Option<Vec<String>>,
        namespace: NamespaceRef,
    ) -> Aliases {
        aliases.map(|aliases| {
            aliases
                .iter()
                .map(|alias| {
                    if alias.find('.').is_none() {
                        match namespace {
                            Some(ns) => format!("{ns}.{alias}"),
                            None => alias.clone(),
                        }
                    } else {
                        alias.clone()
                    }
                })
                .map(|alias| Alias::new(alias.as_str()).unwrap())
                .collect()
        })
    }

    fn get_custom_attributes(
        &self,
        complex: &Map<String, Value>,
        excluded: &[&'static str],
    ) -> BTreeMap<String, Value> {
        let mut custom_attributes: BTreeMap<String, Value> = BTreeMap::new();
        for (key, value) in complex {
            match key.as_str() {
                "type" | "name" | "namespace" | "doc" | "aliases" => continue,
                candidate if excluded.contains(&candidate) => continue,
                _ => custom_attributes.insert(key.clone(), value.clone()),
            };
        }
        custom_attributes
    }

    fn get_field_custom_attributes(field: &Map<String, Value>) -> BTreeMap<String, Value> {
        let mut custom_attributes: BTreeMap<String, Value> = BTreeMap::new();
        for (key, value) in field {
            match key.as_str() {
                "type" | "name" | "doc" | "default" | "aliases" => continue,
                _ => custom_attributes.insert(key.clone(), value.clone()),
            };
        }
        custom_attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Details;
    use pretty_assertions::assert_eq;

    fn parse(input: &str) -> AvroResult<Schema> {
        Parser::default().parse_str(input)
    }

    #[test]
    fn test_record_schema() {
        let schema = parse(
            r#"{
                "type": "record",
                "name": "test",
                "fields": [
                    {"name": "a", "type": "long", "default": 42},
                    {"name": "b", "type": "string"}
                ]
            }"#,
        )
        .unwrap();

        let Schema::Record(record) = schema else {
            panic!("expected a record schema");
        };
        assert_eq!(record.name.fullname(None), "test");
        assert_eq!(record.fields.len(), 2);
        assert_eq!(record.fields[0].name, "a");
        assert_eq!(record.fields[0].schema, Schema::Long);
        assert_eq!(record.fields[0].default, Some(serde_json::json!(42)));
        assert_eq!(record.fields[1].name, "b");
        assert_eq!(record.fields[1].default, None);
        assert_eq!(record.lookup.get("b"), Some(&1));
    }

    #[test]
    fn test_record_without_fields() {
        match parse(r#"{"type": "record", "name": "test"}"#).map_err(Error::into_details) {
            Err(Details::GetRecordFields(name)) => assert_eq!(name, "test"),
            other => panic!("expected GetRecordFields, got {other:?}"),
        }
        match parse(r#"{"type": "record", "name": "test", "fields": []}"#)
            .map_err(Error::into_details)
        {
            Err(Details::GetRecordFields(_)) => {}
            other => panic!("expected GetRecordFields, got {other:?}"),
        }
    }

    #[test]
    fn test_record_duplicate_field() {
        match parse(
            r#"{"type": "record", "name": "test", "fields": [
                {"name": "a", "type": "int"},
                {"name": "a", "type": "string"}
            ]}"#,
        )
        .map_err(Error::into_details)
        {
            Err(Details::FieldNameDuplicate(_, field)) => assert_eq!(field, "a"),
            other => panic!("expected FieldNameDuplicate, got {other:?}"),
        }
    }

    #[test]
    fn test_enum_schema() {
        let schema =
            parse(r#"{"type": "enum", "name": "Suit", "symbols": ["diamonds", "spades"]}"#)
                .unwrap();
        let Schema::Enum(enum_schema) = schema else {
            panic!("expected an enum schema");
        };
        assert_eq!(enum_schema.symbols, vec!["diamonds", "spades"]);
    }

    #[test]
    fn test_enum_schema_errors() {
        match parse(r#"{"type": "enum", "name": "Suit"}"#).map_err(Error::into_details) {
            Err(Details::GetEnumSymbolsField(_)) => {}
            other => panic!("expected GetEnumSymbolsField, got {other:?}"),
        }
        match parse(r#"{"type": "enum", "name": "Suit", "symbols": []}"#)
            .map_err(Error::into_details)
        {
            Err(Details::GetEnumSymbols(_)) => {}
            other => panic!("expected GetEnumSymbols, got {other:?}"),
        }
        match parse(r#"{"type": "enum", "name": "Suit", "symbols": ["a", 2]}"#)
            .map_err(Error::into_details)
        {
            Err(Details::GetEnumSymbolString(_)) => {}
            other => panic!("expected GetEnumSymbolString, got {other:?}"),
        }
        match parse(r#"{"type": "enum", "name": "Suit", "symbols": ["a", "a"]}"#)
            .map_err(Error::into_details)
        {
            Err(Details::EnumSymbolDuplicate(_, _)) => {}
            other => panic!("expected EnumSymbolDuplicate, got {other:?}"),
        }
    }

    #[test]
    fn test_fixed_schema() {
        let schema = parse(r#"{"type": "fixed", "name": "md5", "size": 16}"#).unwrap();
        let Schema::Fixed(fixed) = schema else {
            panic!("expected a fixed schema");
        };
        assert_eq!(fixed.size, 16);

        match parse(r#"{"type": "fixed", "name": "md5"}"#).map_err(Error::into_details) {
            Err(Details::GetFixedSizeField(_)) => {}
            other => panic!("expected GetFixedSizeField, got {other:?}"),
        }
        match parse(r#"{"type": "fixed", "name": "md5", "size": -2}"#).map_err(Error::into_details)
        {
            Err(Details::GetFixedSize(..)) => {}
            other => panic!("expected GetFixedSize, got {other:?}"),
        }
    }

    #[test]
    fn test_map_and_array_schema_errors() {
        match parse(r#"{"type": "map"}"#).map_err(Error::into_details) {
            Err(Details::GetMapValuesField(ns)) => assert_eq!(ns, "null namespace"),
            other => panic!("expected GetMapValuesField, got {other:?}"),
        }
        match parse(r#"{"type": "array"}"#).map_err(Error::into_details) {
            Err(Details::GetArrayItemsField(_)) => {}
            other => panic!("expected GetArrayItemsField, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_and_bad_type_key() {
        match parse(r#"{"name": "test"}"#).map_err(Error::into_details) {
            Err(Details::GetComplexTypeField) => {}
            other => panic!("expected GetComplexTypeField, got {other:?}"),
        }
        match parse(r#"{"type": 12}"#).map_err(Error::into_details) {
            Err(Details::GetComplexType(_)) => {}
            other => panic!("expected GetComplexType, got {other:?}"),
        }
    }

    #[test]
    fn test_recursive_schema() {
        let mut parser = Parser::default();
        let schema = parser
            .parse_str(
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

        let Schema::Record(record) = &schema else {
            panic!("expected a record schema");
        };
        let Schema::Union(union) = &record.fields[1].schema else {
            panic!("expected a union schema");
        };
        assert_eq!(
            union.variants()[1],
            Schema::Ref {
                name: Name::new("LongList").unwrap()
            }
        );

        // The symbol table holds the full definition.
        let names = parser.into_names();
        assert!(names.contains_key(&Name::new("LongList").unwrap()));
    }

    #[test]
    fn test_namespace_inheritance() {
        let mut parser = Parser::default();
        parser
            .parse_str(
                r#"{
                    "type": "record",
                    "name": "Outer",
                    "namespace": "com.example",
                    "fields": [
                        {"name": "inner", "type": {
                            "type": "record",
                            "name": "Inner",
                            "fields": [{"name": "z", "type": "int"}]
                        }},
                        {"name": "another", "type": "Inner"}
                    ]
                }"#,
            )
            .unwrap();

        // Inner inherits the com.example namespace, and the reference
        // "Inner" resolves through it.
        let names = parser.into_names();
        assert!(names.contains_key(&Name::new("com.example.Inner").unwrap()));
    }

    #[test]
    fn test_aliases_resolve() {
        let mut parser = Parser::default();
        parser
            .parse_str(
                r#"{
                    "type": "record",
                    "name": "a.b",
                    "aliases": ["c", "x.y"],
                    "fields": [{"name": "f", "type": "int"}]
                }"#,
            )
            .unwrap();
        let names = parser.into_names();
        assert!(names.contains_key(&Name::new("a.b").unwrap()));
        assert!(names.contains_key(&Name::new("a.c").unwrap()));
        assert!(names.contains_key(&Name::new("x.y").unwrap()));
    }
}
