// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Adserver error bodies.

use serde_json::Value;

/// Flatten an adserver error body into display lines.
///
/// - `{"errors": {"field": ["a", "b"]}}` yields every message, followed by an
///   empty line per field.
/// - `{"code": 422, "message": "..."}` yields `"Error 422 ..."`.
/// - anything else yields `"Unknown error"`.
pub fn parse_errors(body: &Value) -> Vec<String> {
    if let Some(errors) = body.get("errors").and_then(Value::as_object) {
        let mut out = Vec::new();
        for messages in errors.values() {
            match messages {
                Value::Array(items) => out.extend(items.iter().map(text)),
                other => out.push(text(other)),
            }
            out.push(String::new());
        }
        return out;
    }
    if let Some(message) = body.get("message").filter(|m| !m.is_null()) {
        let code = body.get("code").map(text).unwrap_or_default();
        return vec![format!("Error {code} {}", text(message))];
    }
    vec!["Unknown error".to_owned()]
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
