use serde_json::Value;

/// A backend reply reduced to success or failure.
///
/// Replies are `{"result": ...}` or `{"error": ...}`; a reply with neither is
/// a success with a `null` result. A `null` error counts as absent.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Ok(Value),
    Err(String),
}

impl Reply {
    pub fn classify(reply: &Value) -> Self {
        match reply.get("error") {
            Some(err) if !err.is_null() => Reply::Err(error_text(err)),
            _ => Reply::Ok(reply.get("result").cloned().unwrap_or(Value::Null)),
        }
    }
}

/// `"text"`, `{"message": "text"}`, or the raw JSON as a last resort.
fn error_text(err: &Value) -> String {
    match err {
        Value::String(s) => s.clone(),
        Value::Object(map) => match map.get("message") {
            Some(Value::String(s)) => s.clone(),
            _ => err.to_string(),
        },
        other => other.to_string(),
    }
}
