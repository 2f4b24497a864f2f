//! Turning raw platform responses into typed payloads.
//!
//! `cards` handles the rendered search pages, `boards` the JSON trending boards and groups.
//! The helpers here walk JSON values and fail with the path of the first missing field.

pub mod boards;
pub mod cards;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, Result};

pub use boards::{
    parse_groups, parse_hot_band, parse_topic_band, BandEntry, Group, HotBand, HotGov, TopicEntry,
};
pub use cards::{
    parse_post_card, parse_search_max, parse_topic_card, parse_user_card, select_cards,
};

/// Follow a dotted path such as `data.user` through nested objects.
///
/// # Errors
///
/// Returns [`Error::MissingField`] naming the full path if any segment is absent.
pub fn json_path<'a>(value: &'a Value, path: &str) -> Result<&'a Value> {
    path.split('.')
        .try_fold(value, |current, key| current.get(key))
        .ok_or_else(|| Error::missing(path))
}

/// Take the array at `path`, cloning its elements.
///
/// # Errors
///
/// Returns an error if the path is absent or does not hold an array.
pub fn json_array(value: &Value, path: &str) -> Result<Vec<Value>> {
    json_path(value, path)?
        .as_array()
        .cloned()
        .ok_or_else(|| Error::invalid(path, "expected an array"))
}

/// Take the string at `path`.
///
/// # Errors
///
/// Returns an error if the path is absent or does not hold a string.
pub fn json_str<'a>(value: &'a Value, path: &str) -> Result<&'a str> {
    json_path(value, path)?
        .as_str()
        .ok_or_else(|| Error::invalid(path, "expected a string"))
}

/// Deserialize the value at `path` into `T`.
///
/// # Errors
///
/// Returns an error if the path is absent or the value does not fit `T`.
pub fn json_at<T: DeserializeOwned>(value: &Value, path: &str) -> Result<T> {
    Ok(T::deserialize(json_path(value, path)?)?)
}

/// Parse a response body as JSON.
///
/// # Errors
///
/// Returns an error if the body is not valid JSON.
pub fn parse_json(body: &str) -> Result<Value> {
    Ok(serde_json::from_str(body)?)
}

/// Render a platform identifier that may arrive as a number or a string.
#[must_use]
pub fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_json_path_walks_nested_objects() {
        let value = json!({"data": {"user": {"idstr": "42"}}});
        assert_eq!(json_str(&value, "data.user.idstr").unwrap(), "42");
    }

    #[test]
    fn test_json_path_names_missing_path() {
        let value = json!({"data": {}});
        match json_path(&value, "data.user.idstr") {
            Err(Error::MissingField { field }) => assert_eq!(field, "data.user.idstr"),
            other => panic!("expected MissingField, got {other:?}"),
        }
    }

    #[test]
    fn test_json_array_rejects_non_array() {
        let value = json!({"statuses": {"a": 1}});
        assert!(matches!(
            json_array(&value, "statuses"),
            Err(Error::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_id_string() {
        assert_eq!(id_string(&json!(123)), Some("123".to_string()));
        assert_eq!(id_string(&json!("abc")), Some("abc".to_string()));
        assert_eq!(id_string(&json!(null)), None);
    }
}
