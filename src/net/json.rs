//! JSON extraction helpers for catalog payloads.
//!
//! The catalog API is treated as an opaque JSON source. These helpers pull the
//! few fields the client actually needs out of it without committing to a full
//! schema.
//!
//! ```rust
//! use yomu::net::json;
//! use serde_json::json;
//!
//! let data = json!({
//!     "images": [
//!         {"url": "https://cdn.example.com/1.jpg"},
//!         {"url": "https://cdn.example.com/2.jpg"}
//!     ]
//! });
//!
//! assert_eq!(json::image_urls(&data).unwrap().len(), 2);
//! assert_eq!(json::extract_array(&data, "images").len(), 2);
//! ```

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, Result};

/// Navigates nested objects and arrays with a dot-separated path.
///
/// Numeric segments index into arrays, so `"images.0.url"` works.
pub fn extract_path<'a>(json: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = json;
    for key in path.split('.').filter(|k| !k.is_empty()) {
        current = match current {
            Value::Array(items) => items.get(key.parse::<usize>().ok()?)?,
            other => other.get(key)?,
        };
    }
    Some(current)
}

/// Deserializes the value at `path`.
pub fn extract_as<T>(json: &Value, path: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    let value = extract_path(json, path)
        .ok_or_else(|| Error::parse(format!("Path not found: {path}")))?;
    T::deserialize(value).map_err(Into::into)
}

/// The array at `path`, or an empty slice when missing or not an array.
pub fn extract_array<'a>(json: &'a Value, path: &str) -> &'a [Value] {
    extract_path(json, path)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// Ordered page image URLs from a chapter-images payload.
///
/// Accepts `{"images": [{"url": ...}]}`, `{"images": ["..."]}`, or a bare
/// top-level array of either form. Entries without a usable URL are skipped.
///
/// # Errors
///
/// [`Error::Parse`] when no image list can be found at all.
pub fn image_urls(payload: &Value) -> Result<Vec<String>> {
    let items = match payload {
        Value::Array(items) => items.as_slice(),
        other => extract_path(other, "images")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .ok_or_else(|| Error::parse("chapter payload has no images array"))?,
    };

    Ok(items
        .iter()
        .filter_map(|item| match item {
            Value::String(url) => Some(url.as_str()),
            other => other.get("url").and_then(Value::as_str),
        })
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(str::to_owned)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extract_path_walks_arrays() {
        let data = json!({"images": [{"url": "a"}, {"url": "b"}]});
        assert_eq!(extract_path(&data, "images.1.url"), Some(&json!("b")));
        assert_eq!(extract_path(&data, "images.5.url"), None);
    }

    #[test]
    fn extract_as_reports_missing_path() {
        let data = json!({});
        let err = extract_as::<String>(&data, "title").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn image_urls_accepts_strings_and_objects() {
        let data = json!({"images": ["a.jpg", {"url": "b.jpg"}, {"alt": "no url"}, {"url": "  "}]});
        assert_eq!(image_urls(&data).unwrap(), vec!["a.jpg", "b.jpg"]);
    }

    #[test]
    fn image_urls_accepts_bare_array() {
        let data = json!([{"url": "x.png"}]);
        assert_eq!(image_urls(&data).unwrap(), vec!["x.png"]);
    }

    #[test]
    fn image_urls_requires_a_list() {
        assert!(image_urls(&json!({"title": "nope"})).is_err());
    }
}
