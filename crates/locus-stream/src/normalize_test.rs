use base64::Engine as _;
use serde_json::json;

use super::*;

fn as_pseudo_byte_array(doc: &Value) -> Value {
    let bytes = serde_json::to_vec(doc).unwrap();
    let map: Map<String, Value> = bytes
        .iter()
        .enumerate()
        .map(|(i, b)| (i.to_string(), Value::from(*b)))
        .collect();
    Value::Object(map)
}

// -----------------------------------------------------------------------
// pseudo-byte-array objects
// -----------------------------------------------------------------------

#[test]
fn pseudo_byte_array_round_trips_json_document() {
    let doc = json!({"restaurants": [{"name": "Café Lisboa", "rating": 4.5}]});
    assert_eq!(normalize(as_pseudo_byte_array(&doc)), doc);
}

#[test]
fn pseudo_byte_array_with_non_json_text_returns_text() {
    let text = "Searching Lisbon";
    let map: Map<String, Value> = text
        .bytes()
        .enumerate()
        .map(|(i, b)| (i.to_string(), Value::from(b)))
        .collect();
    assert_eq!(normalize(Value::Object(map)), json!("Searching Lisbon"));
}

#[test]
fn pseudo_byte_array_keys_may_arrive_out_of_order() {
    // "{}" is 0x7B 0x7D
    let value = json!({"1": 125, "0": 123});
    assert_eq!(normalize(value), json!({}));
}

#[test]
fn object_with_gap_in_keys_passes_through() {
    let value = json!({"0": 123, "2": 125});
    assert_eq!(normalize(value.clone()), value);
}

#[test]
fn object_with_non_canonical_keys_passes_through() {
    let value = json!({"00": 123, "1": 125});
    assert_eq!(normalize(value.clone()), value);
}

#[test]
fn object_with_out_of_range_byte_passes_through() {
    let value = json!({"0": 300});
    assert_eq!(normalize(value.clone()), value);
}

#[test]
fn ordinary_object_passes_through() {
    let value = json!({"hotels": [{"name": "Hotel B"}]});
    assert_eq!(normalize(value.clone()), value);
}

// -----------------------------------------------------------------------
// base64 strings
// -----------------------------------------------------------------------

#[test]
fn base64_round_trips_json_document() {
    let doc = json!({"hotels": [{"name": "Hotel Avenida", "latitude": 38.72}]});
    let encoded =
        base64::engine::general_purpose::STANDARD.encode(serde_json::to_vec(&doc).unwrap());
    assert_eq!(normalize(Value::String(encoded)), doc);
}

#[test]
fn base64_of_plain_text_returns_decoded_text() {
    let encoded = base64::engine::general_purpose::STANDARD.encode("Finding hotels");
    assert_eq!(normalize(Value::String(encoded)), json!("Finding hotels"));
}

#[test]
fn malformed_base64_falls_through_to_raw_string() {
    // Valid alphabet, invalid length.
    assert_eq!(normalize(json!("abcde")), json!("abcde"));
}

#[test]
fn short_word_decoding_to_binary_is_not_treated_as_base64() {
    assert_eq!(normalize(json!("Done")), json!("Done"));
    assert_eq!(normalize(json!("test")), json!("test"));
}

// -----------------------------------------------------------------------
// embedded / loose JSON strings
// -----------------------------------------------------------------------

#[test]
fn extracts_json_embedded_in_prose() {
    let text = r#"Here are some places: {"restaurants": [{"name": "Cafe A"}]} Enjoy!"#;
    assert_eq!(
        normalize(json!(text)),
        json!({"restaurants": [{"name": "Cafe A"}]})
    );
}

#[test]
fn skips_unparseable_brace_and_finds_later_object() {
    let text = r#"Note {not json} then {"items": [1]}"#;
    assert_eq!(normalize(json!(text)), json!({"items": [1]}));
}

#[test]
fn braces_inside_strings_do_not_end_the_object() {
    let text = r#"x {"name": "a } b", "n": 1} y"#;
    assert_eq!(normalize(json!(text)), json!({"name": "a } b", "n": 1}));
}

#[test]
fn top_level_array_string_is_parsed_whole() {
    let text = r#" [{"name": "A"}, {"name": "B"}] "#;
    assert_eq!(normalize(json!(text)), json!([{"name": "A"}, {"name": "B"}]));
}

#[test]
fn plain_prose_is_returned_unchanged() {
    let text = "Looking for the best seafood in Lisbon...";
    assert_eq!(normalize(json!(text)), json!(text));
}

#[test]
fn malformed_json_string_is_returned_unchanged() {
    let text = r#"{"restaurants": [{"name": "Cafe A"}"#;
    assert_eq!(normalize(json!(text)), json!(text));
}

// -----------------------------------------------------------------------
// totality
// -----------------------------------------------------------------------

#[test]
fn scalars_and_arrays_pass_through() {
    for value in [
        Value::Null,
        json!(true),
        json!(42),
        json!(-1.5),
        json!([1, 2, 3]),
        json!([]),
        json!({}),
    ] {
        assert_eq!(normalize(value.clone()), value);
    }
}

#[test]
fn hostile_strings_never_panic() {
    let inputs = [
        "",
        "{",
        "}{",
        "{{{{{{{{",
        "\"",
        "\\",
        "====",
        "{\"a\": \"\\",
        "[{]",
        "🍽️{\"a\":1}🍽️",
    ];
    for input in inputs {
        let _ = normalize(json!(input));
    }
}

#[test]
fn embedded_object_after_multibyte_prefix() {
    assert_eq!(normalize(json!("🍽️{\"a\":1}🍽️")), json!({"a": 1}));
}

// -----------------------------------------------------------------------
// extract_balanced_object
// -----------------------------------------------------------------------

#[test]
fn balanced_object_rejects_mismatched_closer() {
    assert_eq!(extract_balanced_object("{42]"), None);
}

#[test]
fn balanced_object_accepts_nested_arrays() {
    let s = r#"{"a": [{"b": 2}]} trailing"#;
    assert_eq!(extract_balanced_object(s), Some(r#"{"a": [{"b": 2}]}"#));
}
