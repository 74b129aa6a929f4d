//! Best-effort decoding of frame payloads into structured JSON.
//!
//! The backend serializes `data` inconsistently: sometimes as plain JSON,
//! sometimes as a base64 string, sometimes as a byte buffer that was
//! naively JSON-encoded into `{"0": 123, "1": 34, ...}`, and sometimes as
//! model prose with a JSON object buried inside it. [`normalize`] tries each
//! decoding in a fixed order and falls back to the input unchanged, so it
//! never fails.

use std::sync::LazyLock;

use base64::Engine as _;
use regex::Regex;
use serde_json::{Map, Value};

static BASE64_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9+/]+={0,2}$").expect("valid regex"));

/// Upper bound on `{` positions tried when hunting for embedded JSON.
const MAX_EMBEDDED_CANDIDATES: usize = 32;

/// Normalizes an arbitrary payload value.
///
/// Strategies, first match wins:
/// 1. pseudo-byte-array object → bytes → UTF-8 → JSON (or the text)
/// 2. base64 string → bytes → UTF-8 → JSON (or the text)
/// 3. string with embedded or loose JSON → JSON (or the string itself)
/// 4. anything else is returned untouched
#[must_use]
pub fn normalize(value: Value) -> Value {
    if let Value::Object(map) = &value {
        if let Some(decoded) = decode_pseudo_byte_array(map) {
            return decoded;
        }
    }

    if let Value::String(text) = &value {
        if let Some(decoded) = decode_base64(text) {
            return decoded;
        }
        return decode_loose_json(text);
    }

    value
}

/// Decodes `{"0": b0, "1": b1, ...}` back into the document it encodes.
///
/// Returns `None` unless the keys are exactly the canonical decimal strings
/// `"0"..="n-1"` and every value is an integer byte.
pub(crate) fn decode_pseudo_byte_array(map: &Map<String, Value>) -> Option<Value> {
    if map.is_empty() {
        return None;
    }

    let mut bytes: Vec<Option<u8>> = vec![None; map.len()];
    for (key, value) in map {
        let index: usize = key.parse().ok()?;
        // Rejects "01", "+1" and similar non-canonical spellings.
        if index.to_string() != *key {
            return None;
        }
        let byte = value.as_u64().and_then(|b| u8::try_from(b).ok())?;
        *bytes.get_mut(index)? = Some(byte);
    }

    let bytes: Vec<u8> = bytes.into_iter().collect::<Option<_>>()?;
    let text = String::from_utf8_lossy(&bytes).into_owned();
    Some(parse_json_or_text(text))
}

/// Decodes a standard, padded base64 string.
///
/// Returns `None` when the string is outside the base64 alphabet, fails to
/// decode, or decodes to bytes that are not printable UTF-8 text. The last
/// check keeps short alphanumeric words from being misread as base64.
pub(crate) fn decode_base64(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if !BASE64_RE.is_match(trimmed) {
        return None;
    }

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(trimmed)
        .ok()?;
    let decoded = String::from_utf8(bytes).ok()?;
    if decoded
        .chars()
        .any(|c| c.is_control() && !matches!(c, '\n' | '\r' | '\t'))
    {
        return None;
    }

    Some(parse_json_or_text(decoded))
}

/// Pulls JSON out of a string that may wrap it in prose.
///
/// Prefers the first top-level `{...}` that parses; otherwise parses the
/// trimmed whole string (this is also how arrays are recovered); otherwise
/// returns the string unchanged.
pub(crate) fn decode_loose_json(text: &str) -> Value {
    let trimmed = text.trim();

    // A leading bracket means the objects inside are not top-level.
    if !trimmed.starts_with('[') {
        let mut offset = 0usize;
        for _ in 0..MAX_EMBEDDED_CANDIDATES {
            let Some(relative) = trimmed[offset..].find('{') else {
                break;
            };
            let start = offset + relative;
            // Unterminated: every later brace is nested inside this one.
            let Some(candidate) = extract_balanced_object(&trimmed[start..]) else {
                break;
            };
            if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(candidate) {
                return value;
            }
            offset = start + candidate.len();
        }
    }

    serde_json::from_str::<Value>(trimmed).unwrap_or_else(|_| Value::String(text.to_owned()))
}

/// Returns the shortest prefix of `s` that is a brace-balanced `{...}`.
///
/// String literals and escapes are respected. Only `}` at depth 0 closes the
/// object, so `{1]` is never accepted.
pub(crate) fn extract_balanced_object(s: &str) -> Option<&str> {
    if !s.starts_with('{') {
        return None;
    }
    let mut depth: i32 = 0;
    let mut in_string = false;
    let mut escape = false;
    for (i, c) in s.char_indices() {
        if escape {
            escape = false;
            continue;
        }
        if in_string {
            match c {
                '\\' => escape = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '[' | '{' => depth += 1,
            ']' => depth -= 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

fn parse_json_or_text(text: String) -> Value {
    match serde_json::from_str::<Value>(text.trim()) {
        Ok(value) => value,
        Err(_) => Value::String(text),
    }
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
