//! JSON argument parsing for search tool calls.
//!
//! ```rust
//! use sgsearch::{parse_json_object, required_string};
//!
//! let args = parse_json_object(r#"{"query":"rust"}"#).expect("object should parse");
//! let query = required_string(&args, "query").expect("query should be present");
//! assert_eq!(query, "rust");
//! ```

use serde_json::{Map, Value};

use crate::SearchError;

pub fn parse_json_object(args_json: &str) -> Result<Map<String, Value>, SearchError> {
    let value: Value = serde_json::from_str(args_json)
        .map_err(|err| SearchError::invalid_arguments(format!("invalid JSON arguments: {err}")))?;

    match value {
        Value::Object(map) => Ok(map),
        _ => Err(SearchError::invalid_arguments(
            "expected JSON object arguments",
        )),
    }
}

pub fn required_string(args: &Map<String, Value>, key: &str) -> Result<String, SearchError> {
    args.get(key)
        .and_then(Value::as_str)
        .map(ToString::to_string)
        .ok_or_else(|| SearchError::invalid_arguments(format!("missing required string: '{key}'")))
}

/// Extracts the `query` argument from a raw tool-call argument string.
pub fn parse_query(args_json: &str) -> Result<String, SearchError> {
    let args = parse_json_object(args_json)?;
    required_string(&args, "query")
}
