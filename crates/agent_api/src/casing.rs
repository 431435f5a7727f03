//! Key-convention translation between caller (camelCase) and wire (snake_case) bodies.
//!
//! Keys are rewritten by an explicit per-character scan. Only ASCII letters and `_`
//! participate in a rewrite; every other character is copied through untouched, so
//! malformed keys degrade to a best-effort rewrite instead of an error.

use serde_json::{Map, Value};

/// Structured body value exchanged with the backend.
pub type StructuredValue = Value;

/// Field-naming spelling of structured keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamingConvention {
    /// `userInput`, `tokensUsed`: used inside the consuming application.
    Caller,
    /// `user_input`, `tokens_used`: used on the wire.
    Wire,
}

impl NamingConvention {
    pub fn rename_key(self, key: &str) -> String {
        match self {
            Self::Caller => to_caller_key(key),
            Self::Wire => to_wire_key(key),
        }
    }
}

/// Recursively rename every mapping key in `value` to the `target` convention.
///
/// Sequences keep their order and length; scalars are returned unchanged. When two keys
/// collapse onto the same target key, the one visited later wins.
pub fn normalize(value: &Value, target: NamingConvention) -> Value {
    match value {
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| normalize(item, target))
                .collect(),
        ),
        Value::Object(entries) => {
            let mut out = Map::with_capacity(entries.len());
            for (key, entry) in entries {
                out.insert(target.rename_key(key), normalize(entry, target));
            }
            Value::Object(out)
        }
        scalar => scalar.clone(),
    }
}

/// `userInput` -> `user_input`. The leading character is never rewritten.
pub fn to_wire_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for (index, ch) in key.chars().enumerate() {
        if index > 0 && ch.is_ascii_uppercase() {
            out.push('_');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// `tokens_used` -> `tokensUsed`. An underscore survives unless a lowercase letter follows it.
pub fn to_caller_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut chars = key.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '_' {
            if let Some(next) = chars.peek().copied().filter(char::is_ascii_lowercase) {
                chars.next();
                out.push(next.to_ascii_uppercase());
                continue;
            }
        }
        out.push(ch);
    }
    out
}
