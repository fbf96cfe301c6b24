//! Request payload wrapper with normalization helpers.

use serde_json::{Map, Value};

use tradeerp_core::Slug;

use crate::errors::RequestError;

/// A JSON object submitted to an endpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Input(Map<String, Value>);

impl Input {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Wrap a request body. Only JSON objects are accepted; `null` is an empty input.
    pub fn from_value(value: Value) -> Result<Self, RequestError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Ok(Self(Map::new())),
            other => Err(RequestError::Malformed(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Trim every string and turn empty strings into `null`, recursively.
    pub fn normalize(&mut self) {
        for value in self.0.values_mut() {
            normalize_value(value);
        }
    }

    /// Look up a dotted path (`"items.0.quantity"`).
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let first = parts.next()?;
        let mut current = self.0.get(first)?;
        for part in parts {
            current = match current {
                Value::Object(map) => map.get(part)?,
                Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    /// Numeric value of a field, accepting numeric strings.
    pub fn get_f64(&self, path: &str) -> Option<f64> {
        self.get(path).and_then(as_number)
    }

    /// Key is present (even when `null`).
    pub fn has(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Key is present, not `null`, not an empty string or array.
    pub fn filled(&self, path: &str) -> bool {
        match self.get(path) {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.trim().is_empty(),
            Some(Value::Array(a)) => !a.is_empty(),
            Some(_) => true,
        }
    }

    /// Set a top-level key.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }

    /// Set a top-level key unless it is already filled.
    pub fn default(&mut self, key: &str, value: impl Into<Value>) {
        if !self.filled(key) {
            self.set(key, value);
        }
    }

    /// Overwrite top-level keys from another object.
    pub fn merge(&mut self, other: Map<String, Value>) {
        self.0.extend(other);
    }

    /// Turn checkbox-style values into booleans. Unrecognized values are left
    /// alone so the `boolean` rule can reject them.
    pub fn coerce_bool(&mut self, key: &str) {
        let coerced = match self.0.get(key) {
            Some(Value::String(s)) => match s.to_ascii_lowercase().as_str() {
                "1" | "true" | "on" | "yes" => Some(true),
                "0" | "false" | "off" | "no" => Some(false),
                _ => None,
            },
            Some(Value::Number(n)) => match n.as_i64() {
                Some(1) => Some(true),
                Some(0) => Some(false),
                _ => None,
            },
            _ => None,
        };
        if let Some(b) = coerced {
            self.set(key, b);
        }
    }

    pub fn lowercase(&mut self, key: &str) {
        if let Some(Value::String(s)) = self.0.get_mut(key) {
            *s = s.to_lowercase();
        }
    }

    pub fn uppercase(&mut self, key: &str) {
        if let Some(Value::String(s)) = self.0.get_mut(key) {
            *s = s.to_uppercase();
        }
    }

    /// Fill `target` with a slug of `source` when `target` is not filled.
    /// An explicit `target` is slugged too, so `"Summer Sale"` becomes `"summer-sale"`.
    pub fn slug_from(&mut self, target: &str, source: &str) {
        let raw = match self.get_str(target) {
            Some(s) if !s.trim().is_empty() => s.to_string(),
            _ => match self.get_str(source) {
                Some(s) => s.to_string(),
                None => return,
            },
        };
        let slug = Slug::from_name(&raw);
        if !slug.is_empty() {
            self.set(target, slug.as_str());
        }
    }

    /// Expand a field pattern into the concrete paths present in the input.
    ///
    /// Non-wildcard patterns expand to themselves, present or not. A `*` over
    /// anything but an array expands to nothing.
    pub fn expand(&self, pattern: &str) -> Vec<String> {
        if !pattern.contains('*') {
            return vec![pattern.to_string()];
        }
        let mut paths = vec![String::new()];
        for segment in pattern.split('.') {
            let mut next = Vec::with_capacity(paths.len());
            for prefix in paths {
                if segment == "*" {
                    let len = match self.get(&prefix) {
                        Some(Value::Array(items)) => items.len(),
                        _ => 0,
                    };
                    next.extend((0..len).map(|i| format!("{prefix}.{i}")));
                } else if prefix.is_empty() {
                    next.push(segment.to_string());
                } else {
                    next.push(format!("{prefix}.{segment}"));
                }
            }
            paths = next;
        }
        paths
    }

    /// Replace the value at a concrete path (no-op when the path does not exist).
    pub(crate) fn replace(&mut self, path: &str, value: Value) {
        let mut parts = path.split('.');
        let Some(first) = parts.next() else { return };
        let Some(mut current) = self.0.get_mut(first) else { return };
        for part in parts {
            current = match current {
                Value::Object(map) => match map.get_mut(part) {
                    Some(v) => v,
                    None => return,
                },
                Value::Array(items) => match part.parse::<usize>().ok().and_then(|i| items.get_mut(i)) {
                    Some(v) => v,
                    None => return,
                },
                _ => return,
            };
        }
        *current = value;
    }

    /// Keep only the given top-level keys.
    pub(crate) fn only(&self, keys: &[&str]) -> Map<String, Value> {
        self.0
            .iter()
            .filter(|(k, _)| keys.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl From<Map<String, Value>> for Input {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

fn normalize_value(value: &mut Value) {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                *value = Value::Null;
            } else if trimmed.len() != s.len() {
                *s = trimmed.to_string();
            }
        }
        Value::Array(items) => items.iter_mut().for_each(normalize_value),
        Value::Object(map) => map.values_mut().for_each(normalize_value),
        _ => {}
    }
}

/// Numeric reading of a JSON value (numbers and numeric strings).
pub(crate) fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn input(v: Value) -> Input {
        Input::from_value(v).unwrap()
    }

    #[test]
    fn rejects_non_object_bodies() {
        assert!(matches!(
            Input::from_value(json!([1, 2])),
            Err(RequestError::Malformed(_))
        ));
        assert_eq!(Input::from_value(Value::Null).unwrap(), Input::new());
    }

    #[test]
    fn empty_inputs_accept_defaults() {
        let mut i = Input::new();
        assert!(i.get("per_page").is_none());
        i.default("per_page", 15);
        assert_eq!(i.get("per_page"), Some(&json!(15)));

        let mut n = Input::from_value(Value::Null).unwrap();
        n.default("per_page", 15);
        assert_eq!(n, i);
    }

    #[test]
    fn normalize_trims_and_nulls_empty_strings() {
        let mut i = input(json!({"name": "  Acme  ", "note": "   ", "tags": [" a ", ""]}));
        i.normalize();
        assert_eq!(i.get("name"), Some(&json!("Acme")));
        assert_eq!(i.get("note"), Some(&Value::Null));
        assert_eq!(i.get("tags"), Some(&json!(["a", null])));
    }

    #[test]
    fn dotted_paths_walk_objects_and_arrays() {
        let i = input(json!({"items": [{"qty": 2}, {"qty": 5}]}));
        assert_eq!(i.get("items.1.qty"), Some(&json!(5)));
        assert_eq!(i.get("items.2.qty"), None);
        assert_eq!(i.get("items.x"), None);
    }

    #[test]
    fn expand_walks_wildcards() {
        let i = input(json!({"items": [{"qty": 2}, {"qty": 5}], "tags": "nope"}));
        assert_eq!(i.expand("items.*.qty"), vec!["items.0.qty", "items.1.qty"]);
        assert!(i.expand("tags.*").is_empty());
        assert!(i.expand("missing.*.id").is_empty());
        assert_eq!(i.expand("name"), vec!["name"]);
    }

    #[test]
    fn default_only_fills_missing_or_blank() {
        let mut i = input(json!({"a": null, "b": "set"}));
        i.default("a", "x");
        i.default("b", "y");
        i.default("c", "z");
        assert_eq!(i.get_str("a"), Some("x"));
        assert_eq!(i.get_str("b"), Some("set"));
        assert_eq!(i.get_str("c"), Some("z"));
    }

    #[test]
    fn coerce_bool_understands_checkbox_values() {
        let mut i = input(json!({"a": "on", "b": "0", "c": 1, "d": "maybe"}));
        for k in ["a", "b", "c", "d"] {
            i.coerce_bool(k);
        }
        assert_eq!(i.get("a"), Some(&json!(true)));
        assert_eq!(i.get("b"), Some(&json!(false)));
        assert_eq!(i.get("c"), Some(&json!(true)));
        assert_eq!(i.get("d"), Some(&json!("maybe")));
    }

    #[test]
    fn slug_from_derives_or_cleans() {
        let mut i = input(json!({"name": "Winter Coat XL"}));
        i.slug_from("slug", "name");
        assert_eq!(i.get_str("slug"), Some("winter-coat-xl"));

        let mut i = input(json!({"name": "ignored", "slug": "My Custom Slug"}));
        i.slug_from("slug", "name");
        assert_eq!(i.get_str("slug"), Some("my-custom-slug"));
    }

    #[test]
    fn replace_updates_nested_values() {
        let mut i = input(json!({"items": [{"qty": "2"}]}));
        i.replace("items.0.qty", json!(2));
        i.replace("items.3.qty", json!(9));
        assert_eq!(i.get("items"), Some(&json!([{"qty": 2}])));
    }

    proptest::proptest! {
        #[test]
        fn wildcards_expand_to_one_path_per_element(n in 0usize..25) {
            let items: Vec<Value> = (0..n).map(|i| json!({"qty": i})).collect();
            let i = input(json!({"items": items}));
            let paths = i.expand("items.*.qty");
            proptest::prop_assert_eq!(paths.len(), n);
            proptest::prop_assert!(paths.iter().all(|p| i.has(p)));
        }
    }
}
