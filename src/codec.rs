//! Value encoding for the remote store.
//!
//! Redis stores strings, so every value is turned into one before it is
//! written. Structured values are wrapped in a small JSON envelope
//! (`{"value": ...}`) so that any JSON value, including `null`, booleans and
//! bare strings, survives the trip unchanged.
//!
//! The one exception is a single decimal digit. It is stored as the bare
//! numeral so that INCRBY/DECRBY keep working on it: a counter written with
//! `write("hits", 0)` can be incremented by the store itself. The check is
//! deliberately narrow. `42` is *not* stored raw; it gets the envelope like
//! any other value.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;

/// The wrapper every non-digit value is stored in.
#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct Envelope<'a> {
    value: Cow<'a, Value>,
}

/// Returns `true` if `value` is an integer in `0..=9`.
///
/// Only these values are stored without an envelope.
pub fn is_single_digit(value: &Value) -> bool {
    matches!(value.as_u64(), Some(n) if n <= 9)
}

/// Encode a value into the string that is sent to the store.
pub fn encode(value: &Value) -> String {
    if is_single_digit(value) {
        return value.to_string();
    }
    let envelope = Envelope {
        value: Cow::Borrowed(value),
    };
    // Serializing a `Value` cannot fail: its map keys are always strings.
    serde_json::to_string(&envelope).unwrap_or_default()
}

/// Decode a stored string back into a value.
///
/// Anything that is not an envelope is a raw scalar: usually a digit written
/// by [`encode`] or a counter that the store has since incremented. Raw
/// scalars that parse as an `i64` come back as numbers, everything else as
/// the original string. Decoding never fails.
pub fn decode(stored: &str) -> Value {
    match serde_json::from_str::<Envelope>(stored) {
        Ok(envelope) => envelope.value.into_owned(),
        Err(_) => raw_scalar(stored),
    }
}

fn raw_scalar(stored: &str) -> Value {
    match stored.parse::<i64>() {
        Ok(n) => Value::from(n),
        Err(_) => Value::String(stored.to_string()),
    }
}
