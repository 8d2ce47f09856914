//! Attachment records to image URLs.

use serde_json::Value;

/// Fields that may carry an attachment's external URL, in priority order.
const URL_FIELDS: [&str; 3] = ["externalLink", "external_link", "content"];

/// Collect the external URL of each attachment record.
///
/// Each record contributes the first truthy value among [`URL_FIELDS`]; only strings
/// starting with `http` are kept. Anything other than a JSON array yields no URLs.
/// Duplicates are left for the caller to collapse.
pub fn extract_attachment_urls(attachments: &Value) -> Vec<String> {
    let Some(records) = attachments.as_array() else {
        return Vec::new();
    };

    records
        .iter()
        .filter_map(|record| URL_FIELDS.iter().find_map(|field| truthy(record.get(*field)?)))
        .filter_map(|url| url.as_str())
        .filter(|url| url.starts_with("http"))
        .map(str::to_string)
        .collect()
}

fn truthy(value: &Value) -> Option<&Value> {
    let is_truthy = match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    };
    is_truthy.then_some(value)
}
