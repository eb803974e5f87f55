//! Normalization of workflow success bodies into text.

use serde_json::Value;

/// Output fields tried, in order, under `data.outputs`.
///
/// The remote workflows do not declare which field carries their result, so
/// the first non-empty string among these wins.
pub const OUTPUT_FIELDS: [&str; 3] = ["text", "message", "result"];

/// Extract the result text from a workflow response body.
///
/// Reads `data.outputs` (an absent or non-object value counts as `{}`), then
/// tries [`OUTPUT_FIELDS`] in order, falling back to the compact JSON
/// serialization of the whole outputs object.
pub fn extract_output_text(body: &Value) -> String {
    let outputs = body
        .get("data")
        .and_then(|d| d.get("outputs"))
        .filter(|o| o.is_object())
        .cloned()
        .unwrap_or_else(|| Value::Object(serde_json::Map::new()));

    OUTPUT_FIELDS
        .iter()
        .find_map(|field| {
            outputs
                .get(*field)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
        })
        .map_or_else(|| outputs.to_string(), ToString::to_string)
}
