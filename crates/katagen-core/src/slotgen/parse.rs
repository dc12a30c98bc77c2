//! Tolerant extraction of a JSON object from raw LLM text.
//!
//! Accepts fenced code blocks and leading/trailing prose, as long as one
//! balanced top-level `{…}` can be isolated. The extractor is
//! string-aware, so braces inside JSON strings do not unbalance the scan.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref FENCE_RE: Regex =
        Regex::new(r"```(?:json|JSON)?\s*\n?((?s).*?)```").expect("static regex");
}

/// Isolate the first balanced top-level JSON object in `text`.
pub fn extract_json_object(text: &str) -> Option<String> {
    // Prefer a fenced block when one contains an object.
    for caps in FENCE_RE.captures_iter(text) {
        let inner = caps.get(1).expect("group 1").as_str();
        if let Some(object) = balanced_object(inner) {
            return Some(object);
        }
    }
    balanced_object(text)
}

/// Parse the extracted object into `T`, tolerating surrounding prose.
pub fn extract_and_parse<T: serde::de::DeserializeOwned>(text: &str) -> Option<T> {
    let object = extract_json_object(text)?;
    serde_json::from_str(&object).ok()
}

fn balanced_object(text: &str) -> Option<String> {
    let bytes = text.as_bytes();
    let start = bytes.iter().position(|&b| b == b'{')?;
    let mut depth = 0i32;
    let mut in_string = false;
    let mut i = start;
    while i < bytes.len() {
        let b = bytes[i];
        if in_string {
            match b {
                b'\\' => i += 1,
                b'"' => in_string = false,
                _ => {}
            }
        } else {
            match b {
                b'"' => in_string = true,
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(text[start..=i].to_string());
                    }
                }
                _ => {}
            }
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_bare_object() {
        let text = r#"{"a": 1}"#;
        assert_eq!(extract_json_object(text).unwrap(), text);
    }

    #[test]
    fn extracts_from_fenced_block() {
        let text = "Here is the problem:\n```json\n{\"title\": \"Sum\"}\n```\nDone.";
        assert_eq!(extract_json_object(text).unwrap(), "{\"title\": \"Sum\"}");
    }

    #[test]
    fn extracts_with_trailing_prose() {
        let text = "{\"a\": {\"b\": 2}} and some explanation afterwards";
        assert_eq!(extract_json_object(text).unwrap(), "{\"a\": {\"b\": 2}}");
    }

    #[test]
    fn braces_inside_strings_do_not_unbalance() {
        let text = r#"{"code": "class A { void m() { } }"}"#;
        assert_eq!(extract_json_object(text).unwrap(), text);
    }

    #[test]
    fn escaped_quote_inside_string_is_handled() {
        let text = r#"{"s": "he said \"hi\" {"}"#;
        assert_eq!(extract_json_object(text).unwrap(), text);
    }

    #[test]
    fn no_object_yields_none() {
        assert!(extract_json_object("no json here").is_none());
        assert!(extract_json_object("{unclosed").is_none());
    }

    #[test]
    fn parses_into_struct() {
        #[derive(serde::Deserialize)]
        struct Payload {
            test_suite: String,
        }
        let text = "```json\n{\"test_suite\": \"def test_case_1(): pass\"}\n```";
        let payload: Payload = extract_and_parse(text).unwrap();
        assert!(payload.test_suite.contains("test_case_1"));
    }
}
