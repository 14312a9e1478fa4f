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

//! Variable-length zig-zag integer primitives and decoding safety limits.

use crate::AvroResult;
use crate::error::Details;
use serde_json::{Map, Value};
use std::io::{Read, Write};
use std::sync::{
    Once,
    atomic::{AtomicUsize, Ordering},
};

/// Maximum number of bytes that can be allocated when decoding
/// Avro-encoded values. This is a protection against ill-formed
/// data, whose length field might be interpreted as enormous.
/// See [`max_allocation_bytes`] to change this limit.
pub const DEFAULT_MAX_ALLOCATION_BYTES: usize = 512 * 1024 * 1024;
static MAX_ALLOCATION_BYTES: AtomicUsize = AtomicUsize::new(DEFAULT_MAX_ALLOCATION_BYTES);
static MAX_ALLOCATION_BYTES_ONCE: Once = Once::new();

/// An `int` is at most 5 varint bytes, a `long` at most 10.
pub(crate) const MAX_INT_VARINT_BYTES: usize = 5;
pub(crate) const MAX_LONG_VARINT_BYTES: usize = 10;

/// Set a new maximum number of bytes that can be allocated when decoding data.
/// Once called, the limit cannot be changed.
///
/// **NOTE** This function must be called before decoding **any** data. The
/// library leverages [`std::sync::Once`] to set the limit either when calling
/// this method, or when decoding for the first time.
pub fn max_allocation_bytes(num_bytes: usize) -> usize {
    MAX_ALLOCATION_BYTES_ONCE.call_once(|| {
        MAX_ALLOCATION_BYTES.store(num_bytes, Ordering::Release);
    });
    MAX_ALLOCATION_BYTES.load(Ordering::Acquire)
}

pub fn safe_len(len: usize) -> AvroResult<usize> {
    let max_bytes = max_allocation_bytes(DEFAULT_MAX_ALLOCATION_BYTES);

    if len <= max_bytes {
        Ok(len)
    } else {
        Err(Details::MemoryAllocation {
            desired: len,
            maximum: max_bytes,
        }
        .into())
    }
}

/// Convenience accessors for string-valued keys of a schema object.
pub(crate) trait MapHelper {
    fn string(&self, key: &str) -> Option<String>;

    fn name(&self) -> Option<String> {
        self.string("name")
    }

    fn doc(&self) -> Option<String> {
        self.string("doc")
    }

    fn aliases(&self) -> Option<Vec<String>>;
}

impl MapHelper for Map<String, Value> {
    fn string(&self, key: &str) -> Option<String> {
        self.get(key)
            .and_then(|v| v.as_str())
            .map(|v| v.to_string())
    }

    fn aliases(&self) -> Option<Vec<String>> {
        self.get("aliases")
            .and_then(|aliases| aliases.as_array())
            .and_then(|aliases| {
                aliases
                    .iter()
                    .map(|alias| alias.as_str())
                    .map(|alias| alias.map(|a| a.to_string()))
                    .collect::<Option<_>>()
            })
    }
}

pub fn zig_i32<W: Write>(n: i32, buffer: W) -> AvroResult<()> {
    zig_i64(n as i64, buffer)
}

pub fn zig_i64<W: Write>(n: i64, writer: W) -> AvroResult<()> {
    encode_variable(((n << 1) ^ (n >> 63)) as u64, writer)
}

pub fn zag_i32<R: Read>(reader: &mut R) -> AvroResult<i32> {
    let z = decode_variable(reader, MAX_INT_VARINT_BYTES)?;
    let i = zag(z);
    i32::try_from(i).map_err(|e| Details::ZagI32(e, i).into())
}

pub fn zag_i64<R: Read>(reader: &mut R) -> AvroResult<i64> {
    decode_variable(reader, MAX_LONG_VARINT_BYTES).map(zag)
}

fn zag(z: u64) -> i64 {
    if z & 0x1 == 0 {
        (z >> 1) as i64
    } else {
        !(z >> 1) as i64
    }
}

fn encode_variable<W: Write>(mut z: u64, mut writer: W) -> AvroResult<()> {
    let mut buffer = [0u8; 10];
    let mut i: usize = 0;
    loop {
        if z <= 0x7F {
            buffer[i] = (z & 0x7F) as u8;
            i += 1;
            break;
        } else {
            buffer[i] = (0x80 | (z & 0x7F)) as u8;
            i += 1;
            z >>= 7;
        }
    }
    writer
        .write_all(&buffer[..i])
        .map_err(|e| Details::WriteBytes(e).into())
}

fn decode_variable<R: Read>(reader: &mut R, max_bytes: usize) -> AvroResult<u64> {
    let mut i = 0u64;
    let mut buf = [0u8; 1];

    let mut j = 0;
    loop {
        if j >= max_bytes {
            return Err(Details::IntegerOverflow { max_bytes }.into());
        }
        reader
            .read_exact(&mut buf[..])
            .map_err(Details::ReadBytes)?;
        i |= u64::from(buf[0] & 0x7F) << (j * 7);
        if (buf[0] >> 7) == 0 {
            break;
        } else {
            j += 1;
        }
    }

    Ok(i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Details, Error};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_zigzag() {
        let mut a = Vec::new();
        let mut b = Vec::new();
        zig_i32(42i32, &mut a).unwrap();
        zig_i64(42i64, &mut b).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_zig_i64() {
        let mut s = Vec::new();

        zig_i64(0, &mut s).unwrap();
        assert_eq!(s, [0]);

        s.clear();
        zig_i64(-1, &mut s).unwrap();
        assert_eq!(s, [1]);

        s.clear();
        zig_i64(1, &mut s).unwrap();
        assert_eq!(s, [2]);

        s.clear();
        zig_i64(-64, &mut s).unwrap();
        assert_eq!(s, [127]);

        s.clear();
        zig_i64(64, &mut s).unwrap();
        assert_eq!(s, [128, 1]);

        s.clear();
        zig_i64(i32::MAX as i64, &mut s).unwrap();
        assert_eq!(s, [254, 255, 255, 255, 15]);

        s.clear();
        zig_i64(i32::MIN as i64, &mut s).unwrap();
        assert_eq!(s, [255, 255, 255, 255, 15]);

        s.clear();
        zig_i64(i64::MAX, &mut s).unwrap();
        assert_eq!(s, [254, 255, 255, 255, 255, 255, 255, 255, 255, 1]);

        s.clear();
        zig_i64(i64::MIN, &mut s).unwrap();
        assert_eq!(s, [255, 255, 255, 255, 255, 255, 255, 255, 255, 1]);
    }

    #[test]
    fn test_zag_round_trip() {
        for n in [0i64, -1, 1, 63, -64, 64, i64::MAX, i64::MIN] {
            let mut s = Vec::new();
            zig_i64(n, &mut s).unwrap();
            assert_eq!(zag_i64(&mut &s[..]).unwrap(), n);
        }
    }

    #[test]
    fn test_long_overflow() {
        // An eleventh continuation byte never fits a long.
        let causes_overflow: &[u8] = &[
            0xe1, 0xe1, 0xe1, 0xe1, 0xe1, 0xe1, 0xe1, 0xe1, 0xe1, 0xe1, 0x01,
        ];
        match zag_i64(&mut &*causes_overflow).map_err(Error::into_details) {
            Err(Details::IntegerOverflow { max_bytes: 10 }) => {}
            other => panic!("expected IntegerOverflow, got {other:?}"),
        }
    }

    #[test]
    fn test_int_rejects_more_than_five_bytes() {
        // Valid as a long, but six varint bytes wide.
        let mut s = Vec::new();
        zig_i64(1i64 << 40, &mut s).unwrap();
        match zag_i32(&mut &s[..]).map_err(Error::into_details) {
            Err(Details::IntegerOverflow { max_bytes: 5 }) => {}
            other => panic!("expected IntegerOverflow, got {other:?}"),
        }
    }

    #[test]
    fn test_int_out_of_range_in_five_bytes() {
        // Five bytes can carry up to 35 data bits, which overflows an i32.
        let wide: &[u8] = &[0xfe, 0xff, 0xff, 0xff, 0x1f];
        match zag_i32(&mut &*wide).map_err(Error::into_details) {
            Err(Details::ZagI32(..)) => {}
            other => panic!("expected ZagI32, got {other:?}"),
        }
    }

    #[test]
    fn test_short_read() {
        // Continuation bit set but the stream ends.
        let truncated: &[u8] = &[0x80];
        match zag_i64(&mut &*truncated).map_err(Error::into_details) {
            Err(Details::ReadBytes(_)) => {}
            other => panic!("expected ReadBytes, got {other:?}"),
        }
    }

    #[test]
    fn test_safe_len() {
        assert_eq!(42usize, safe_len(42usize).unwrap());
        assert!(safe_len(1024 * 1024 * 1024).is_err());
    }
}
