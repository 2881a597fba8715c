use rust_decimal::Decimal;

use crate::error::AgentError;

/// Pull the first JSON object out of model output that may carry fences or
/// surrounding prose, and deserialize it.
pub fn parse_payload(raw: &str) -> Result<serde_json::Value, AgentError> {
    let candidate = strip_fences(raw.trim());

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(candidate) {
        if value.is_object() {
            return Ok(value);
        }
    }

    if let Some(object) = first_balanced_object(candidate) {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(object) {
            return Ok(value);
        }
    }

    Err(AgentError::Parse(format!(
        "no JSON object in model output (length={})",
        raw.len()
    )))
}

/// Drop a surrounding ```json ... ``` (or bare ```) fence if present.
fn strip_fences(text: &str) -> &str {
    let Some(open) = text.find("```") else {
        return text;
    };
    let body_start = match text[open..].find('\n') {
        Some(offset) => open + offset + 1,
        None => return text,
    };
    match text[body_start..].find("```") {
        Some(close) => text[body_start..body_start + close].trim(),
        None => text,
    }
}

/// Locate the first balanced `{ ... }` span, respecting JSON strings.
fn first_balanced_object(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut start = None;
    let mut in_string = false;
    let mut escaped = false;

    for (i, ch) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            '}' if !in_string => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return start.map(|s| &text[s..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Read a confidence figure from a payload field that may be a JSON string
/// ("0.8") or a number (0.8). Returns None when absent or unparseable.
pub fn payload_confidence(payload: &serde_json::Value) -> Option<Decimal> {
    let value = payload.get("confidence")?;
    serde_json::from_value::<Decimal>(value.clone()).ok()
}

/// Lowercased `recommendation` field, if any.
pub fn payload_recommendation(payload: &serde_json::Value) -> Option<String> {
    payload
        .get("recommendation")
        .and_then(|v| v.as_str())
        .map(|s| s.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn parse_clean_object() {
        let value = parse_payload(r#"{"recommendation": "buy", "confidence": "0.8"}"#).unwrap();
        assert_eq!(payload_recommendation(&value).as_deref(), Some("buy"));
        assert_eq!(payload_confidence(&value), Some(dec!(0.8)));
    }

    #[test]
    fn parse_fenced_object() {
        let raw = "Here is my view:\n```json\n{\"recommendation\": \"SELL\"}\n```\nDone.";
        let value = parse_payload(raw).unwrap();
        assert_eq!(payload_recommendation(&value).as_deref(), Some("sell"));
    }

    #[test]
    fn parse_object_after_prose() {
        let raw = "Based on flow data: {\"recommendation\": \"hold\", \"confidence\": 0.55}";
        let value = parse_payload(raw).unwrap();
        assert_eq!(payload_confidence(&value), Some(dec!(0.55)));
    }

    #[test]
    fn braces_inside_strings_do_not_confuse() {
        let raw = r#"{"reasoning": "range {440, 450}", "confidence": "0.5"}"#;
        let value = parse_payload(raw).unwrap();
        assert_eq!(value["reasoning"], "range {440, 450}");
    }

    #[test]
    fn nested_object() {
        let raw = r#"{"analysis": {"trend": "up"}, "levels": [1, 2]}"#;
        let value = parse_payload(raw).unwrap();
        assert_eq!(value["analysis"]["trend"], "up");
    }

    #[test]
    fn plain_text_is_an_error() {
        assert!(parse_payload("no structured output here").is_err());
    }

    #[test]
    fn missing_confidence_is_none() {
        let value = parse_payload(r#"{"recommendation": "buy"}"#).unwrap();
        assert!(payload_confidence(&value).is_none());
    }
}
