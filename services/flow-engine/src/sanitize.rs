//! Payload sanitizer
//!
//! Two passes run before typed decoding. `replace_non_finite_literals`
//! rewrites bare `NaN`/`Infinity` tokens and out-of-range numbers such as
//! `1e400` in the raw text, which `serde_json` would otherwise reject.
//! `sanitize_value` then walks the parsed `data` tree and nulls
//! non-finite tokens smuggled in as strings. Typed records are sanitized a
//! second time at store upsert.

use std::borrow::Cow;

use serde_json::Value;

const NON_FINITE_TOKENS: &[&str] = &[
    "nan",
    "+nan",
    "-nan",
    "inf",
    "+inf",
    "-inf",
    "infinity",
    "+infinity",
    "-infinity",
];

fn is_non_finite_token(s: &str) -> bool {
    let lowered = s.trim().to_ascii_lowercase();
    NON_FINITE_TOKENS.contains(&lowered.as_str())
}

/// Bytes that can make up a bare JSON literal (number, keyword or
/// non-finite token).
fn is_literal_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'+' | b'-' | b'.')
}

/// `NaN`, `Infinity`, `-Infinity` and numbers that overflow `f64`.
fn is_non_finite_literal(literal: &str) -> bool {
    literal.parse::<f64>().map_or(false, |v| !v.is_finite())
}

/// Rewrite bare non-finite literals outside string values to `null`.
///
/// Returns the rewritten text (borrowed when nothing matched) and the
/// number of literals replaced. Text inside strings is never touched.
pub fn replace_non_finite_literals(raw: &str) -> (Cow<'_, str>, usize) {
    let bytes = raw.as_bytes();
    let mut out: Option<String> = None;
    let mut copied = 0;
    let mut replaced = 0;
    let mut in_string = false;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if in_string {
            match b {
                b'\\' => i += 2,
                b'"' => {
                    in_string = false;
                    i += 1;
                }
                _ => i += 1,
            }
            continue;
        }
        if b == b'"' {
            in_string = true;
            i += 1;
            continue;
        }
        if !is_literal_byte(b) {
            i += 1;
            continue;
        }

        let start = i;
        while i < bytes.len() && is_literal_byte(bytes[i]) {
            i += 1;
        }
        if is_non_finite_literal(&raw[start..i]) {
            let buf = out.get_or_insert_with(|| String::with_capacity(raw.len()));
            buf.push_str(&raw[copied..start]);
            buf.push_str("null");
            copied = i;
            replaced += 1;
        }
    }

    match out {
        None => (Cow::Borrowed(raw), 0),
        Some(mut buf) => {
            buf.push_str(&raw[copied..]);
            (Cow::Owned(buf), replaced)
        }
    }
}

/// Replace non-finite string leaves with `null`, in place.
///
/// Returns the number of leaves replaced.
pub fn sanitize_value(value: &mut Value) -> usize {
    match value {
        Value::String(s) => {
            if is_non_finite_token(s) {
                *value = Value::Null;
                1
            } else {
                0
            }
        }
        Value::Array(items) => items.iter_mut().map(sanitize_value).sum(),
        Value::Object(map) => map.values_mut().map(sanitize_value).sum(),
        Value::Null | Value::Bool(_) | Value::Number(_) => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_tokens_replaced() {
        let mut v = json!({
            "notional_eur": "NaN",
            "legs": [{"fixed_rate": "-Infinity"}, {"fixed_rate": 0.03}],
            "inner": {"deep": ["inf", "10Y"]}
        });
        let replaced = sanitize_value(&mut v);
        assert_eq!(replaced, 3);
        assert_eq!(v["notional_eur"], Value::Null);
        assert_eq!(v["legs"][0]["fixed_rate"], Value::Null);
        assert_eq!(v["legs"][1]["fixed_rate"], json!(0.03));
        assert_eq!(v["inner"]["deep"], json!([null, "10Y"]));
    }

    #[test]
    fn test_ordinary_strings_untouched() {
        let mut v = json!({"message": "Infinite curve steepener", "instrument": "NaNY"});
        assert_eq!(sanitize_value(&mut v), 0);
        assert_eq!(v["message"], json!("Infinite curve steepener"));
    }

    #[test]
    fn test_bare_tokens_become_null() {
        let raw = r#"{"a":NaN,"b":[Infinity,-Infinity],"c":1e400,"d":-1e400,"e":1.5}"#;
        let (text, replaced) = replace_non_finite_literals(raw);
        assert_eq!(replaced, 5);
        let v: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(
            v,
            json!({"a": null, "b": [null, null], "c": null, "d": null, "e": 1.5})
        );
    }

    #[test]
    fn test_literals_inside_strings_untouched() {
        let raw = r#"{"msg":"NaN \"Infinity\" 1e400","k":true,"n":null,"x":-2e-5}"#;
        let (text, replaced) = replace_non_finite_literals(raw);
        assert_eq!(replaced, 0);
        assert!(matches!(text, Cow::Borrowed(_)));
        let v: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(v["msg"], json!("NaN \"Infinity\" 1e400"));
        assert_eq!(v["x"], json!(-2e-5));
    }

    #[test]
    fn test_escaped_backslash_closes_string() {
        let raw = r#"{"path":"C:\\","v":NaN}"#;
        let (text, replaced) = replace_non_finite_literals(raw);
        assert_eq!(replaced, 1);
        let v: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(v["path"], json!("C:\\"));
        assert!(v["v"].is_null());
    }

    #[test]
    fn test_scalars() {
        let mut v = json!(" NaN ");
        assert_eq!(sanitize_value(&mut v), 1);
        assert!(v.is_null());

        let mut b = json!(true);
        assert_eq!(sanitize_value(&mut b), 0);
    }
}
