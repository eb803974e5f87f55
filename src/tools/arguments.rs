//! Typed decoding of tool-call arguments.

use serde_json::{Map, Value};

use crate::error::ArgumentError;

/// Parse the model's JSON-encoded argument text. Blank text means `{}`.
pub fn parse_raw(raw: &str) -> Result<Value, ArgumentError> {
    if raw.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_str(raw).map_err(|e| ArgumentError::Parse(e.to_string()))
}

/// Arguments of every URL-driven tool: `{ "url": string }` with `url` required.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlArguments {
    pub url: String,
}

impl UrlArguments {
    /// Validate decoded arguments against the tool's parameter schema.
    ///
    /// A non-object value is treated as an empty argument set.
    pub fn from_value(args: &Value) -> Result<Self, ArgumentError> {
        match args.get("url") {
            None | Some(Value::Null) => Err(ArgumentError::MissingParameter("url")),
            Some(Value::String(s)) if s.trim().is_empty() => {
                Err(ArgumentError::MissingParameter("url"))
            }
            Some(Value::String(s)) => Ok(Self { url: s.clone() }),
            Some(_) => Err(ArgumentError::InvalidParameter("url")),
        }
    }
}
