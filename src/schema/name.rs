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

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::{
    AvroResult, Error, Schema,
    error::Details,
    util::MapHelper,
    validator::{validate_namespace, validate_schema_name},
};

/// Represents names for `record`, `enum` and `fixed` Avro schemas.
///
/// Each of these `Schema`s has a `fullname` composed of two parts:
///   * a name
///   * a namespace
///
/// `aliases` can also be defined to let old names keep resolving.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct Name {
    /// The name part, without any dots.
    pub name: String,
    /// The namespace part. `None` is the null namespace.
    pub namespace: Namespace,
}

/// Represents the aliases for a named schema.
pub type Aliases = Option<Vec<Alias>>;
/// Represents schema lookup within a schema: the symbol table of one build.
pub type Names = HashMap<Name, Schema>;
/// Represents the namespace for a named schema.
pub type Namespace = Option<String>;
/// A borrowed [`Namespace`].
pub type NamespaceRef<'a> = Option<&'a str>;

impl Name {
    /// Create a new `Name`.
    ///
    /// Parses the optional namespace from the `name` string: if `name`
    /// contains a dot, everything up to the last dot is the namespace.
    pub fn new(name: &str) -> AvroResult<Self> {
        Self::new_with_enclosing_namespace(name, None)
    }

    /// Create a new `Name`, using `enclosing_namespace` when `name` itself
    /// does not carry one.
    pub fn new_with_enclosing_namespace(
        name: &str,
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<Self> {
        let index_of_name = validate_schema_name(name)?;

        if index_of_name == 0 {
            let namespace = match enclosing_namespace {
                Some(ns) if !ns.is_empty() => {
                    validate_namespace(ns)?;
                    Some(ns.to_string())
                }
                _ => None,
            };
            Ok(Self {
                name: name.to_string(),
                namespace,
            })
        } else {
            // A leading dot is an explicit "no namespace".
            let namespace = match &name[..index_of_name - 1] {
                "" => None,
                ns => Some(ns.to_string()),
            };
            Ok(Self {
                name: name[index_of_name..].to_string(),
                namespace,
            })
        }
    }

    /// Parse a schema object into a `Name`.
    pub(crate) fn parse(
        complex: &Map<String, Value>,
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<Self> {
        let name_field = complex.name().ok_or(Details::GetNameField)?;
        let namespace = complex.string("namespace");
        Self::new_with_enclosing_namespace(
            &name_field,
            namespace.as_deref().or(enclosing_namespace),
        )
    }

    /// Return the `fullname` of this `Name`: `namespace.name`, or just the
    /// name when the namespace is null.
    pub fn fullname(&self, default_namespace: NamespaceRef) -> String {
        match self
            .namespace
            .as_deref()
            .or(default_namespace)
            .filter(|ns| !ns.is_empty())
        {
            Some(ns) => format!("{ns}.{}", self.name),
            None => self.name.clone(),
        }
    }

    /// Construct the fully qualified name, filling a missing namespace from
    /// the enclosing one.
    pub fn fully_qualified_name(&self, enclosing_namespace: &Namespace) -> Name {
        Name {
            name: self.name.clone(),
            namespace: self
                .namespace
                .clone()
                .or_else(|| enclosing_namespace.clone().filter(|ns| !ns.is_empty())),
        }
    }
}

impl TryFrom<&str> for Name {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl FromStr for Name {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Display for Name {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.fullname(None))
    }
}

/// Newtype pattern for `Name` with the `serde_json` representation used by
/// schema aliases: a plain full-name string.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct Alias(Name);

impl Alias {
    pub fn new(name: &str) -> AvroResult<Self> {
        Name::new(name).map(Self)
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn namespace(&self) -> NamespaceRef<'_> {
        self.0.namespace.as_deref()
    }

    pub fn fullname(&self, default_namespace: NamespaceRef) -> String {
        self.0.fullname(default_namespace)
    }

    pub fn fully_qualified_name(&self, default_namespace: &Namespace) -> Name {
        self.0.fully_qualified_name(default_namespace)
    }
}

impl Serialize for Alias {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.fullname(None))
    }
}

/// The null namespace rendered for humans. Only ever used in error messages.
pub(crate) fn error_namespace(namespace: NamespaceRef) -> String {
    match namespace {
        Some(ns) if !ns.is_empty() => ns.to_string(),
        _ => "null namespace".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Details;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_name_with_namespace_inside() {
        let name = Name::new("com.example.Thing").unwrap();
        assert_eq!(name.name, "Thing");
        assert_eq!(name.namespace, Some("com.example".to_string()));
        assert_eq!(name.fullname(None), "com.example.Thing");
    }

    #[test]
    fn test_enclosing_namespace_is_inherited() {
        let name = Name::new_with_enclosing_namespace("Thing", Some("com.example")).unwrap();
        assert_eq!(name.fullname(None), "com.example.Thing");
    }

    #[test]
    fn test_contained_namespace_wins() {
        let name = Name::new_with_enclosing_namespace("org.other.Thing", Some("com.example"))
            .unwrap();
        assert_eq!(name.fullname(None), "org.other.Thing");
    }

    /// Zero-length namespace is considered as no-namespace.
    #[test]
    fn test_namespace_from_name_with_empty_value() {
        let name = Name::new(".name").unwrap();
        assert_eq!(name.name, "name");
        assert_eq!(name.namespace, None);
    }

    /// Whitespace is not allowed in the name.
    #[test]
    fn test_name_with_whitespace_value() {
        match Name::new(" ").map_err(Error::into_details) {
            Err(Details::InvalidSchemaName(_, _)) => {}
            _ => panic!("Expected a Details::InvalidSchemaName!"),
        }
    }

    /// The name must be non-empty.
    #[test]
    fn test_name_with_no_name_part() {
        match Name::new("space.").map_err(Error::into_details) {
            Err(Details::InvalidSchemaName(_, _)) => {}
            _ => panic!("Expected a Details::InvalidSchemaName!"),
        }
    }

    #[test]
    fn test_error_namespace_sentinel() {
        assert_eq!(error_namespace(None), "null namespace");
        assert_eq!(error_namespace(Some("")), "null namespace");
        assert_eq!(error_namespace(Some("com.example")), "com.example");
    }
}
