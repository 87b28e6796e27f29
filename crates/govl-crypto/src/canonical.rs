//! Canonical byte encoding of entry fields.
//!
//! Layout (all integers big-endian, strings as `u64` length + UTF-8 bytes):
//!
//! ```text
//! sequence        u64
//! timestamp       u64 unix_ms, u32 logical
//! kind            u8 tag
//! payload         u8 tag, then
//!   decision      model_version str, outcome u8, probability u64 (IEEE-754 bits),
//!                 inputs as a sorted object value
//!   gate          reason str
//! ```
//!
//! JSON values are encoded structurally with a one-byte type tag. Object keys
//! are sorted here rather than trusting the map's iteration order, and numbers
//! are written in serde_json's shortest round-trip form.

use std::collections::BTreeMap;

use govl_types::{EncodingError, EntryFields, EntryPayload};
use serde_json::Value;

const PAYLOAD_DECISION: u8 = 1;
const PAYLOAD_GATE: u8 = 2;

const VALUE_NULL: u8 = 0;
const VALUE_BOOL: u8 = 1;
const VALUE_NUMBER: u8 = 2;
const VALUE_STRING: u8 = 3;
const VALUE_ARRAY: u8 = 4;
const VALUE_OBJECT: u8 = 5;

/// Encode every hashed field of an entry. Fails before producing any bytes
/// if the fields are malformed.
pub fn encode_fields(fields: &EntryFields<'_>) -> Result<Vec<u8>, EncodingError> {
    fields.validate()?;

    let mut out = CanonicalWriter::with_capacity(128);
    out.put_u64(fields.sequence);
    out.put_u64(fields.timestamp.unix_ms);
    out.put_u32(fields.timestamp.logical);
    out.put_u8(fields.kind.tag());

    match fields.payload {
        EntryPayload::Decision(decision) => {
            out.put_u8(PAYLOAD_DECISION);
            out.put_str(&decision.model_version);
            out.put_u8(decision.outcome.tag());
            out.put_u64(decision.probability.to_bits());
            out.put_object(decision.inputs.iter());
        }
        EntryPayload::Gate { reason } => {
            out.put_u8(PAYLOAD_GATE);
            out.put_str(reason);
        }
    }

    Ok(out.finish())
}

struct CanonicalWriter {
    buf: Vec<u8>,
}

impl CanonicalWriter {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    fn put_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn put_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    fn put_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    fn put_len(&mut self, len: usize) {
        self.put_u64(len as u64);
    }

    fn put_str(&mut self, s: &str) {
        self.put_len(s.len());
        self.buf.extend_from_slice(s.as_bytes());
    }

    fn put_object<'a>(&mut self, entries: impl Iterator<Item = (&'a String, &'a Value)>) {
        let sorted: BTreeMap<&str, &Value> = entries.map(|(k, v)| (k.as_str(), v)).collect();
        self.put_u8(VALUE_OBJECT);
        self.put_len(sorted.len());
        for (key, value) in sorted {
            self.put_str(key);
            self.put_value(value);
        }
    }

    fn put_value(&mut self, value: &Value) {
        match value {
            Value::Null => self.put_u8(VALUE_NULL),
            Value::Bool(b) => {
                self.put_u8(VALUE_BOOL);
                self.put_u8(u8::from(*b));
            }
            Value::Number(n) => {
                self.put_u8(VALUE_NUMBER);
                self.put_str(&n.to_string());
            }
            Value::String(s) => {
                self.put_u8(VALUE_STRING);
                self.put_str(s);
            }
            Value::Array(items) => {
                self.put_u8(VALUE_ARRAY);
                self.put_len(items.len());
                for item in items {
                    self.put_value(item);
                }
            }
            Value::Object(map) => self.put_object(map.iter()),
        }
    }

    fn finish(self) -> Vec<u8> {
        self.buf
    }
}
