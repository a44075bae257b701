//! Field paths into arbitrary JSON, for custom API widgets.
//!
//! A path is a dot-separated list of keys, where any segment may carry a
//! single array index: `data.items[0].price`.

use serde_json::Value;

/// A field discovered in a sample response.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiField {
    pub path: String,
    pub kind: &'static str,
    pub children: Vec<ApiField>,
}

/// Resolve `path` against `root`. Returns `None` as soon as a segment is
/// missing.
pub fn field_value<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(root, |current, segment| {
        match segment.split_once('[') {
            Some((key, rest)) => {
                let index: usize = rest.trim_end_matches(']').parse().ok()?;
                let container = if key.is_empty() {
                    current
                } else {
                    current.get(key)?
                };
                container.get(index)
            }
            None => current.get(segment),
        }
    })
}

/// Walk an object and list its fields. Arrays of objects are described by
/// their first element, addressed as `path[0]`.
pub fn discover_fields(value: &Value) -> Vec<ApiField> {
    discover_with_prefix(value, "")
}

fn discover_with_prefix(value: &Value, prefix: &str) -> Vec<ApiField> {
    let Some(map) = value.as_object() else {
        return Vec::new();
    };
    map.iter()
        .map(|(key, child)| {
            let path = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{}.{}", prefix, key)
            };
            let children = match child {
                Value::Object(_) => discover_with_prefix(child, &path),
                Value::Array(items) => match items.first() {
                    Some(first @ Value::Object(_)) => {
                        discover_with_prefix(first, &format!("{}[0]", path))
                    }
                    _ => Vec::new(),
                },
                _ => Vec::new(),
            };
            ApiField {
                kind: kind_name(child),
                path,
                children,
            }
        })
        .collect()
}

/// Flatten a discovered tree into leaf paths (fields with no children).
pub fn leaf_paths(fields: &[ApiField]) -> Vec<String> {
    let mut out = Vec::new();
    for field in fields {
        if field.children.is_empty() {
            out.push(field.path.clone());
        } else {
            out.extend(leaf_paths(&field.children));
        }
    }
    out
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Render a resolved value for display. Numbers get thousands separators,
/// missing values render as `undefined`.
pub fn display_value(value: Option<&Value>) -> String {
    match value {
        None => "undefined".to_string(),
        Some(Value::Null) => "null".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => match n.as_f64() {
            Some(f) => group_thousands(f),
            None => n.to_string(),
        },
        Some(other) => other.to_string(),
    }
}

fn group_thousands(value: f64) -> String {
    let negative = value < 0.0;
    let rounded = format!("{:.3}", value.abs());
    let (int_part, frac_part) = rounded.split_once('.').unwrap_or((rounded.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');

    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::new();
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*c);
    }

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if !frac_part.is_empty() {
        out.push('.');
        out.push_str(frac_part);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "bitcoin": { "usd": 64123.5, "change": -1.2 },
            "items": [ { "name": "first", "price": 10 }, { "name": "second" } ],
            "status": "ok"
        })
    }

    #[test]
    fn test_field_value_paths() {
        let data = sample();
        assert_eq!(field_value(&data, "status"), Some(&json!("ok")));
        assert_eq!(field_value(&data, "bitcoin.usd"), Some(&json!(64123.5)));
        assert_eq!(field_value(&data, "items[1].name"), Some(&json!("second")));
        assert_eq!(field_value(&data, "items[0].price"), Some(&json!(10)));
        assert_eq!(field_value(&data, "items[5].name"), None);
        assert_eq!(field_value(&data, "bitcoin.eur"), None);
        assert_eq!(field_value(&data, "items[x]"), None);
    }

    #[test]
    fn test_discover_fields() {
        let fields = discover_fields(&sample());
        let bitcoin = fields.iter().find(|f| f.path == "bitcoin").unwrap();
        assert_eq!(bitcoin.kind, "object");
        assert_eq!(bitcoin.children.len(), 2);

        let items = fields.iter().find(|f| f.path == "items").unwrap();
        assert_eq!(items.kind, "array");
        assert!(items.children.iter().any(|f| f.path == "items[0].name"));

        let leaves = leaf_paths(&fields);
        assert!(leaves.contains(&"bitcoin.usd".to_string()));
        assert!(leaves.contains(&"items[0].price".to_string()));
        assert!(leaves.contains(&"status".to_string()));
        assert!(!leaves.contains(&"bitcoin".to_string()));
    }

    #[test]
    fn test_display_value() {
        assert_eq!(display_value(Some(&json!(64123.5))), "64,123.5");
        assert_eq!(display_value(Some(&json!(1000000))), "1,000,000");
        assert_eq!(display_value(Some(&json!(-1234.25))), "-1,234.25");
        assert_eq!(display_value(Some(&json!(12))), "12");
        assert_eq!(display_value(Some(&json!("ok"))), "ok");
        assert_eq!(display_value(Some(&json!(true))), "true");
        assert_eq!(display_value(None), "undefined");
    }
}
