//! Response sanitizing and parsing.
//!
//! Generated JSON arrives wrapped in prose or markdown fences and carries
//! structural noise. This module recovers the payload, repairs the noise and
//! parses it. Repairs are done by a single scanner that tracks string
//! boundaries, so text inside string values is never rewritten: raw control
//! characters in strings are escaped, not reinterpreted.
//!
//! Valid JSON passes through [`sanitize`] unchanged.

use serde_json::Value;

/// Characters of context shown on each side of a parse failure.
pub const DEFAULT_DIAGNOSTIC_WINDOW: usize = 50;

/// A payload that still failed to parse after sanitizing.
///
/// `offset` counts chars into the sanitized text; `excerpt` is the text
/// around it. Informational only.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to parse response at offset {offset}: {message} (near: {excerpt:?})")]
pub struct ParseError {
    pub message: String,
    pub offset: usize,
    pub excerpt: String,
}

/// Picks the preferred JSON payload out of a raw response.
///
/// Prefers the contents of a fenced code block, then the span from the first
/// `{` to the last `}`, then the trimmed text itself.
pub fn extract_payload(raw: &str) -> &str {
    payload_candidates(raw)[0]
}

/// Every distinct payload candidate, in preference order. Never empty.
pub fn payload_candidates(raw: &str) -> Vec<&str> {
    let text = raw.trim();
    let mut candidates = Vec::with_capacity(3);
    if let Some(inner) = fenced_block(text) {
        candidates.push(inner);
    }
    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if start < end {
            candidates.push(&text[start..=end]);
        }
    }
    candidates.push(text);
    candidates.dedup();
    candidates
}

fn fenced_block(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let after = &text[open + 3..];
    // Skip a language tag such as `json`.
    let tag_len = after
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(after.len());
    let body = &after[tag_len..];
    let close = body.find("```")?;
    Some(body[..close].trim())
}

/// Repairs structural noise outside string values:
///
/// - control characters other than JSON whitespace are dropped
/// - a comma is inserted when a value is followed by a newline and then a
///   `"` or `{` with no separator
/// - trailing commas before `}` or `]` are removed
///
/// Inside string values raw tabs, newlines and carriage returns are escaped
/// and other control characters are dropped.
pub fn sanitize(payload: &str) -> String {
    let chars: Vec<char> = payload.chars().collect();
    let mut out = String::with_capacity(payload.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
                match c {
                    '\t' => out.push('t'),
                    '\n' => out.push('n'),
                    '\r' => out.push('r'),
                    c if c.is_control() && (c as u32) < 0x20 => {
                        out.push_str(&format!("u{:04x}", c as u32));
                    }
                    c => out.push(c),
                }
                continue;
            }
            match c {
                '\\' => {
                    escaped = true;
                    out.push(c);
                }
                '"' => {
                    in_string = false;
                    out.push(c);
                    if needs_comma_after(&chars, i) {
                        out.push(',');
                    }
                }
                '\t' => out.push_str("\\t"),
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                c if (c as u32) < 0x20 => {}
                c => out.push(c),
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            ',' => {
                if !closes_next(&chars, i) {
                    out.push(c);
                }
            }
            '}' | ']' => {
                out.push(c);
                if needs_comma_after(&chars, i) {
                    out.push(',');
                }
            }
            ' ' | '\t' | '\n' | '\r' => out.push(c),
            c if c.is_control() || c == '\u{feff}' => {}
            c => out.push(c),
        }
    }

    out
}

fn is_skippable(c: char) -> bool {
    c.is_whitespace() || c.is_control() || c == '\u{feff}'
}

/// True if the next significant char after `i` closes an object or array.
fn closes_next(chars: &[char], i: usize) -> bool {
    chars[i + 1..]
        .iter()
        .find(|c| !is_skippable(**c))
        .is_some_and(|c| *c == '}' || *c == ']')
}

/// True if the value ending at `i` is followed, across at least one newline,
/// by the start of another property or object with no comma between them.
fn needs_comma_after(chars: &[char], i: usize) -> bool {
    let mut saw_newline = false;
    for &c in &chars[i + 1..] {
        if c == '\n' || c == '\r' {
            saw_newline = true;
        } else if !is_skippable(c) {
            return saw_newline && (c == '"' || c == '{');
        }
    }
    false
}

/// Extracts, sanitizes and parses a raw response.
///
/// Each payload candidate is tried in turn; the first that parses wins.
/// If none does, the error describes the last attempt.
pub fn parse_response(raw: &str, window: usize) -> Result<Value, ParseError> {
    let mut last_error = None;
    for candidate in payload_candidates(raw) {
        let sanitized = sanitize(candidate);
        match serde_json::from_str(&sanitized) {
            Ok(value) => return Ok(value),
            Err(e) => last_error = Some(diagnose(&sanitized, &e, window)),
        }
    }
    Err(last_error.unwrap_or_else(|| ParseError {
        message: "empty response".to_string(),
        offset: 0,
        excerpt: String::new(),
    }))
}

fn diagnose(text: &str, error: &serde_json::Error, window: usize) -> ParseError {
    let byte = byte_offset(text, error.line(), error.column());
    let offset = text[..byte].chars().count();
    let excerpt: String = text
        .chars()
        .skip(offset.saturating_sub(window))
        .take(window * 2)
        .collect();

    tracing::debug!("Response parse failed at offset {}: {}", offset, error);
    ParseError {
        message: error.to_string(),
        offset,
        excerpt,
    }
}

/// Converts serde_json's one-based line/column into a byte offset.
fn byte_offset(text: &str, line: usize, column: usize) -> usize {
    let line_start: usize = text
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    let mut offset = (line_start + column.saturating_sub(1)).min(text.len());
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_json_fenced() {
        let text = "Here you go:\n```json\n{\"events\": []}\n```\nEnjoy.";
        assert_eq!(extract_payload(text), r#"{"events": []}"#);
    }

    #[test]
    fn test_extract_json_fenced_no_tag() {
        let text = "```\n{\"events\": []}\n```";
        assert_eq!(extract_payload(text), r#"{"events": []}"#);
    }

    #[test]
    fn test_extract_json_braces() {
        let text = "Sure! {\"a\": {\"b\": 1}} Hope that helps.";
        assert_eq!(extract_payload(text), r#"{"a": {"b": 1}}"#);
    }

    #[test]
    fn test_extract_json_plain() {
        assert_eq!(extract_payload("  [1, 2]  "), "[1, 2]");
    }

    #[test]
    fn test_unterminated_fence_falls_back_to_braces() {
        let text = "```json\n{\"a\": 1}";
        assert_eq!(extract_payload(text), r#"{"a": 1}"#);
    }

    #[test]
    fn test_trailing_commas_removed() {
        let fixed = sanitize(r#"{"a": [1, 2, ], "b": {"c": 3,},}"#);
        assert_eq!(serde_json::from_str::<Value>(&fixed).unwrap(), json!({"a": [1, 2], "b": {"c": 3}}));
    }

    #[test]
    fn test_missing_comma_between_properties() {
        let fixed = sanitize("{\n  \"name\": \"Ada\"\n  \"mood\": \"calm\"\n}");
        assert_eq!(
            serde_json::from_str::<Value>(&fixed).unwrap(),
            json!({"name": "Ada", "mood": "calm"})
        );
    }

    #[test]
    fn test_missing_comma_between_objects() {
        let fixed = sanitize("[\n  {\"a\": 1}\n  {\"a\": 2}\n]");
        assert_eq!(serde_json::from_str::<Value>(&fixed).unwrap(), json!([{"a": 1}, {"a": 2}]));
    }

    #[test]
    fn test_raw_tab_and_newline_in_string_escaped() {
        let fixed = sanitize("{\"text\": \"a\tb\nc\"}");
        assert_eq!(fixed, r#"{"text": "a\tb\nc"}"#);
        assert_eq!(serde_json::from_str::<Value>(&fixed).unwrap()["text"], json!("a\tb\nc"));
    }

    #[test]
    fn test_control_characters_stripped() {
        let fixed = sanitize("{\u{0}\"a\u{7}\": \u{1b}1}");
        assert_eq!(serde_json::from_str::<Value>(&fixed).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn test_string_content_untouched() {
        let valid = r#"{"quote": "She said, \"wait,}\" and left", "list": "a,]", "t": "x\ty"}"#;
        assert_eq!(sanitize(valid), valid);
    }

    #[test]
    fn test_valid_json_is_unchanged() {
        let valid = "{\n  \"characters\": [\n    {\"name\": \"Ada\", \"inventory\": [\"map\"]}\n  ],\n  \"events\": []\n}";
        assert_eq!(sanitize(valid), valid);
        assert_eq!(
            parse_response(valid, DEFAULT_DIAGNOSTIC_WINDOW).unwrap(),
            serde_json::from_str::<Value>(valid).unwrap()
        );
    }

    #[test]
    fn test_non_ascii_survives() {
        let valid = r#"{"who": "ミラ", "what": "港へ行った"}"#;
        assert_eq!(sanitize(valid), valid);
    }

    #[test]
    fn test_backticks_inside_fenced_string() {
        let raw = "```json\n{\"what\": \"types ``` in chat\", \"n\": 1}\n```";
        assert_eq!(
            parse_response(raw, DEFAULT_DIAGNOSTIC_WINDOW).unwrap(),
            json!({"what": "types ``` in chat", "n": 1})
        );
    }

    #[test]
    fn test_candidates_in_preference_order() {
        let raw = "Note:\n```json\n{\"a\": 1}\n```";
        assert_eq!(payload_candidates(raw), vec![r#"{"a": 1}"#, raw.trim()]);
        assert_eq!(payload_candidates("  [1]  "), vec!["[1]"]);
    }

    #[test]
    fn test_parse_error_has_offset_and_excerpt() {
        let err = parse_response(r#"{"a": 1 "b": 2}"#, 5).unwrap_err();
        assert!((7..=9).contains(&err.offset), "offset {}", err.offset);
        assert!(err.excerpt.contains("\"b\""), "excerpt {:?}", err.excerpt);
        assert!(err.to_string().contains(&format!("offset {}", err.offset)));
    }

    #[test]
    fn test_parse_error_window_is_bounded() {
        let noisy = format!("{{\"a\": {}nope}}", "1, ".repeat(100));
        let err = parse_response(&noisy, 10).unwrap_err();
        assert!(err.excerpt.chars().count() <= 20);
    }
}
