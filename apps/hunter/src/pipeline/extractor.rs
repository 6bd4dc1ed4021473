//! Noisy-text extractor: recovers one JSON array or object from capability
//! output that was asked to be "JSON only" but often is not.
//!
//! Recoverable malformations, in the order they are tried:
//! 1. surrounding whitespace
//! 2. a markdown fence (with optional language tag) around the payload
//! 3. the payload as a complete document, including a payload that is one
//!    JSON string holding the real document (double encoding, one level)
//! 4. commentary before/after the payload: balanced `[..]` / `{..}` regions
//!    of the expected kind are tried in order of their opening bracket and
//!    the first one that decodes wins, so a bracketed aside in the
//!    commentary does not hide the payload
//! 5. one level of backslash escaping (`[{\"title\": ..}]`), undone only when
//!    everything above failed, so clean JSON with escaped quotes in its
//!    string values is never rewritten
//!
//! Anything else is an `ExtractError`. Nothing here ever returns an empty
//! collection in place of a failure.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// The structured shape a stage expects from its capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Array,
    Object,
}

impl Shape {
    fn delimiters(self) -> (char, char) {
        match self {
            Shape::Array => ('[', ']'),
            Shape::Object => ('{', '}'),
        }
    }

    fn matches(self, value: &Value) -> bool {
        match self {
            Shape::Array => value.is_array(),
            Shape::Object => value.is_object(),
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Array => f.write_str("JSON array"),
            Shape::Object => f.write_str("JSON object"),
        }
    }
}

/// Extraction failure. Always carries the untouched raw text for diagnosis.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("output contains no balanced {expected}")]
    NoStructuredRegion { expected: Shape, raw: String },

    #[error("{expected} in output could not be decoded: {detail}")]
    Undecodable {
        expected: Shape,
        detail: String,
        raw: String,
    },
}

impl ExtractError {
    pub fn raw(&self) -> &str {
        match self {
            ExtractError::NoStructuredRegion { raw, .. }
            | ExtractError::Undecodable { raw, .. } => raw,
        }
    }
}

/// Why a single decode attempt failed, before it is tied to the raw text.
#[derive(Debug)]
enum Attempt {
    NoRegion,
    Undecodable(String),
}

impl Attempt {
    fn into_error(self, expected: Shape, raw: &str) -> ExtractError {
        let raw = raw.to_string();
        match self {
            Attempt::NoRegion => ExtractError::NoStructuredRegion { expected, raw },
            Attempt::Undecodable(detail) => ExtractError::Undecodable {
                expected,
                detail,
                raw,
            },
        }
    }
}

/// Extracts a value of the expected `shape` from noisy capability output.
pub fn extract(raw: &str, shape: Shape) -> Result<Value, ExtractError> {
    let text = strip_fences(raw.trim());

    let first_failure = match decode(text, shape, true) {
        Ok(value) => return Ok(value),
        Err(failure) => failure,
    };

    if text.contains("\\\"") {
        if let Some(unescaped) = unescape_once(text) {
            if let Ok(value) = decode(strip_fences(unescaped.trim()), shape, true) {
                return Ok(value);
            }
        }
    }

    Err(first_failure.into_error(shape, raw))
}

fn decode(text: &str, shape: Shape, unwrap_string: bool) -> Result<Value, Attempt> {
    if let Ok(value) = serde_json::from_str::<Value>(text) {
        match value {
            Value::String(inner) if unwrap_string => {
                return decode(strip_fences(inner.trim()), shape, false);
            }
            value if shape.matches(&value) => return Ok(value),
            // A complete document of the wrong kind may still wrap the payload.
            _ => {}
        }
    }

    // A region opens with the shape's own bracket, so a successful parse is
    // always of the expected kind. The first decode error is the one reported.
    let (open, _) = shape.delimiters();
    let mut failure = Attempt::NoRegion;
    let mut from = 0;

    while let Some(start) = text[from..].find(open).map(|i| from + i) {
        if let Some(region) = balanced_at(text, start, shape) {
            match serde_json::from_str(region) {
                Ok(value) => return Ok(value),
                Err(e) => {
                    if matches!(failure, Attempt::NoRegion) {
                        failure = Attempt::Undecodable(e.to_string());
                    }
                }
            }
        }
        from = start + open.len_utf8();
    }

    Err(failure)
}

/// Strips a leading ```` ``` ```` fence, its language tag and the closing fence.
/// Text that does not start with a fence is returned as-is.
pub fn strip_fences(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };

    let rest = match rest.find('\n') {
        Some(newline) if is_language_tag(&rest[..newline]) => &rest[newline + 1..],
        _ => rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
    };

    let rest = rest.trim_end();
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn is_language_tag(line: &str) -> bool {
    line.trim()
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Returns the region that opens at `start` (which must hold the shape's
/// opening bracket) and closes at its matching bracket. Brackets inside JSON
/// string literals do not count.
fn balanced_at(text: &str, start: usize, shape: Shape) -> Option<&str> {
    let (open, close) = shape.delimiters();

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        if ch == '"' {
            in_string = true;
        } else if ch == open {
            depth += 1;
        } else if ch == close {
            depth -= 1;
            if depth == 0 {
                let end = start + offset + ch.len_utf8();
                return Some(&text[start..end]);
            }
        }
    }

    None
}

/// Undoes one level of backslash escaping (`\"`, `\\`, `\n`, `\uXXXX`, ...).
/// Unknown escapes are kept verbatim. Returns `None` on a broken `\u` escape.
fn unescape_once(text: &str) -> Option<String> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }

        match chars.next() {
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('/') => out.push('/'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('u') => {
                let high = read_hex4(&mut chars)?;
                let code = if (0xD800..0xDC00).contains(&high) {
                    // Surrogate pair: expect `\uDC00..\uDFFF` right after.
                    if chars.next() != Some('\\') || chars.next() != Some('u') {
                        return None;
                    }
                    let low = read_hex4(&mut chars)?;
                    if !(0xDC00..0xE000).contains(&low) {
                        return None;
                    }
                    0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00)
                } else {
                    high
                };
                out.push(char::from_u32(code)?);
            }
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }

    Some(out)
}

fn read_hex4(chars: &mut std::str::Chars<'_>) -> Option<u32> {
    let mut code = 0u32;
    for _ in 0..4 {
        code = code * 16 + chars.next()?.to_digit(16)?;
    }
    Some(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const CLEAN_ARRAY: &str = r#"[{"title":"X","company":"Y","description":"Z","source_url":"u"}]"#;

    fn clean_value() -> Value {
        json!([{"title": "X", "company": "Y", "description": "Z", "source_url": "u"}])
    }

    #[test]
    fn test_clean_array_is_returned_unchanged() {
        assert_eq!(extract(CLEAN_ARRAY, Shape::Array).unwrap(), clean_value());
    }

    #[test]
    fn test_clean_object_is_returned_unchanged() {
        let value = extract(r#"{"a": {"b": [1, 2]}}"#, Shape::Object).unwrap();
        assert_eq!(value, json!({"a": {"b": [1, 2]}}));
    }

    #[test]
    fn test_clean_json_with_escaped_quotes_in_values_is_not_rewritten() {
        let raw = r#"[{"title":"The \"AI\" team","company":"Y","description":"a\\b","source_url":"u"}]"#;
        let value = extract(raw, Shape::Array).unwrap();
        assert_eq!(value[0]["title"], "The \"AI\" team");
        assert_eq!(value[0]["description"], "a\\b");
    }

    #[test]
    fn test_fenced_payload() {
        let raw = format!("```json\n{CLEAN_ARRAY}\n```");
        assert_eq!(extract(&raw, Shape::Array).unwrap(), clean_value());
    }

    #[test]
    fn test_fenced_payload_without_language_tag() {
        let raw = format!("```\n{CLEAN_ARRAY}\n```");
        assert_eq!(extract(&raw, Shape::Array).unwrap(), clean_value());
    }

    #[test]
    fn test_escaped_inner_quotes() {
        let raw = r#"[{\"title\":\"X\",\"company\":\"Y\",\"description\":\"Z\",\"source_url\":\"u\"}]"#;
        assert_eq!(extract(raw, Shape::Array).unwrap(), clean_value());
    }

    #[test]
    fn test_double_encoded_payload() {
        let raw = serde_json::to_string(CLEAN_ARRAY).unwrap();
        assert!(raw.starts_with('"'));
        assert_eq!(extract(&raw, Shape::Array).unwrap(), clean_value());
    }

    #[test]
    fn test_fenced_double_encoded_payload() {
        let encoded = serde_json::to_string(CLEAN_ARRAY).unwrap();
        let raw = format!("```json\n{encoded}\n```");
        assert_eq!(extract(&raw, Shape::Array).unwrap(), clean_value());
    }

    #[test]
    fn test_leading_and_trailing_commentary() {
        let raw = format!("Here is what I found:\n{CLEAN_ARRAY}\nLet me know if you need more.");
        assert_eq!(extract(&raw, Shape::Array).unwrap(), clean_value());
    }

    #[test]
    fn test_commentary_before_fenced_block() {
        let raw = "Sure! Here are the jobs:\n```json\n[{\"title\":\"X\",\"company\":\"Y\",\"description\":\"Z\",\"source_url\":\"u\"}]\n```";
        let value = extract(raw, Shape::Array).unwrap();
        assert_eq!(value, clean_value());
        assert_eq!(value.as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_brackets_inside_string_values_do_not_end_region() {
        let raw = r#"Result: [{"title":"Intern [remote]","company":"Y]","description":"uses a[0]","source_url":"u"}] done"#;
        let value = extract(raw, Shape::Array).unwrap();
        assert_eq!(value[0]["title"], "Intern [remote]");
        assert_eq!(value[0]["company"], "Y]");
    }

    #[test]
    fn test_nested_objects_in_object_payload() {
        let raw = "Package:\n{\"cold_email\": {\"subject\": \"Hi {name}\", \"body\": \"b\"}}\nThanks";
        let value = extract(raw, Shape::Object).unwrap();
        assert_eq!(value["cold_email"]["subject"], "Hi {name}");
    }

    #[test]
    fn test_bracketed_aside_in_commentary_is_skipped() {
        let raw = format!("Top results [from Internshala]:\n{CLEAN_ARRAY}");
        assert_eq!(extract(&raw, Shape::Array).unwrap(), clean_value());
    }

    #[test]
    fn test_braced_aside_before_object_payload_is_skipped() {
        let raw = "Draft {see below}:\n{\"cold_email\": {\"subject\": \"s\", \"body\": \"b\"}}";
        let value = extract(raw, Shape::Object).unwrap();
        assert_eq!(value["cold_email"]["subject"], "s");
    }

    #[test]
    fn test_only_undecodable_regions_still_fail() {
        let err = extract("Notes [a] and [b, c]", Shape::Array).unwrap_err();
        assert!(matches!(err, ExtractError::Undecodable { .. }));
    }

    #[test]
    fn test_object_wrapper_around_expected_array() {
        let raw = r#"{"jobs": [{"title":"X","company":"Y","description":"Z","source_url":"u"}]}"#;
        assert_eq!(extract(raw, Shape::Array).unwrap(), clean_value());
    }

    #[test]
    fn test_no_region_is_a_failure_not_an_empty_collection() {
        let raw = "I could not find any internships today.";
        let err = extract(raw, Shape::Array).unwrap_err();
        assert!(matches!(err, ExtractError::NoStructuredRegion { .. }));
        assert_eq!(err.raw(), raw);
    }

    #[test]
    fn test_unbalanced_region_fails() {
        let err = extract(r#"[{"title": "X""#, Shape::Array).unwrap_err();
        assert!(matches!(err, ExtractError::NoStructuredRegion { .. }));
    }

    #[test]
    fn test_undecodable_region_fails() {
        let err = extract("[{title: X}]", Shape::Array).unwrap_err();
        assert!(matches!(err, ExtractError::Undecodable { .. }));
    }

    #[test]
    fn test_double_encoded_non_payload_fails() {
        let err = extract(r#""[1, 2]""#, Shape::Object).unwrap_err();
        assert!(matches!(err, ExtractError::NoStructuredRegion { .. }));
        let err = extract(r#""\"hello\"""#, Shape::Array).unwrap_err();
        assert!(matches!(err, ExtractError::NoStructuredRegion { .. }));
    }

    #[test]
    fn test_raw_text_is_preserved_untrimmed() {
        let raw = "  nothing here  ";
        let err = extract(raw, Shape::Object).unwrap_err();
        assert_eq!(err.raw(), raw);
    }

    #[test]
    fn test_strip_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_fences_single_line() {
        assert_eq!(strip_fences("```json [1, 2]```"), "[1, 2]");
    }

    #[test]
    fn test_strip_fences_no_fences() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(strip_fences(input), input);
    }

    #[test]
    fn test_unescape_once_handles_unicode_and_surrogates() {
        assert_eq!(unescape_once(r#"caf\u00e9 \ud83d\ude80"#).unwrap(), "café 🚀");
        assert_eq!(unescape_once(r#"a\"b\\c\q"#).unwrap(), "a\"b\\c\\q");
        assert!(unescape_once(r#"\u12"#).is_none());
    }
}
