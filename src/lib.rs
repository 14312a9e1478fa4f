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

//! A schema-driven codec for the [Apache Avro](https://avro.apache.org/)
//! data format, version 1.7.7.
//!
//! Given an Avro schema, expressed as JSON text, [`Codec::new`] compiles a
//! reusable encoder/decoder pair exposing four operations over the generic
//! [`Value`](types::Value) type: binary encode, binary decode, Avro JSON
//! encode, and Avro JSON decode.
//!
//! ```
//! use avro_codec::{Codec, types::{Record, Value}};
//!
//! # fn main() -> Result<(), avro_codec::Error> {
//! let codec = Codec::new(r#"
//!     {
//!         "type": "record",
//!         "name": "test",
//!         "fields": [
//!             {"name": "a", "type": "long", "default": 42},
//!             {"name": "b", "type": "string"}
//!         ]
//!     }
//! "#)?;
//!
//! let mut record = Record::new(codec.root()).unwrap();
//! record.put("a", 27i64);
//! record.put("b", "foo");
//!
//! // Binary flavor.
//! let mut encoded = Vec::new();
//! codec.encode(&mut encoded, &record.clone().into())?;
//! let decoded = codec.decode(&mut &encoded[..])?;
//!
//! // Avro JSON flavor. Record keys follow the schema field order.
//! let mut json = Vec::new();
//! codec.json_encode(&mut json, &record.into())?;
//! assert_eq!(json, br#"{"a":27,"b":"foo"}"#);
//! # Ok(())
//! # }
//! ```
//!
//! A compiled codec is immutable and may be used concurrently from multiple
//! callers, provided each supplies its own reader or writer. Schemas,
//! values and streams are borrowed for the duration of a call and never
//! retained.
//!
//! Note that Avro JSON is not plain JSON: non-null union values are wrapped
//! in a single-key object naming the member, enums are bare strings, and
//! `bytes`/`fixed` data becomes a string with one character per byte.

mod codec;
mod decode;
mod encode;
mod json_decode;
mod json_encode;
mod validator;

pub mod error;
pub mod schema;
pub mod types;
pub mod util;

pub use codec::Codec;
pub use error::Error;
pub use schema::Schema;
pub use types::{Record, Value};

/// A convenience type alias for `Result`s with `Error`s.
pub type AvroResult<T> = Result<T, Error>;
