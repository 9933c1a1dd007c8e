//! Property mapping between Notion's typed property objects and the flat
//! values the dashboard works with.
//!
//! Missing or falsy fields collapse to an empty value rather than failing.
//! "Falsy" means `null`, `false`, `0` or `""`; arrays and objects are truthy.

use serde_json::{json, Map, Value};

/// Flattens each Notion property into a plain JSON value.
///
/// A `date` property `key` also produces `key_end`. Unknown property types
/// pass through the raw field named by their `type`, and are omitted when
/// that field is absent.
pub fn simplify_properties(properties: &Map<String, Value>) -> Map<String, Value> {
    let mut simplified = Map::new();

    for (key, prop) in properties {
        let kind = prop.get("type").and_then(Value::as_str).unwrap_or_default();
        let field = |name: &str| prop.get(name).filter(|v| !v.is_null());

        let value = match kind {
            "title" | "rich_text" => Value::String(plain_text(field(kind))),
            "select" | "status" => string_or_empty(field(kind).and_then(|v| v.get("name"))),
            "multi_select" => list(field(kind), |item| item.get("name").cloned()),
            "date" => {
                let date = field(kind);
                simplified.insert(
                    format!("{key}_end"),
                    string_or_empty(date.and_then(|d| d.get("end"))),
                );
                string_or_empty(date.and_then(|d| d.get("start")))
            }
            "checkbox" => Value::Bool(field(kind).and_then(Value::as_bool).unwrap_or(false)),
            "number" => field(kind).cloned().unwrap_or(Value::Null),
            "url" | "email" | "phone_number" => string_or_empty(field(kind)),
            "formula" => {
                let formula = field(kind);
                let result_type = formula
                    .and_then(|f| f.get("type"))
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                first_truthy([formula.and_then(|f| f.get(result_type))])
            }
            "rollup" => {
                let rollup = field(kind);
                first_truthy(["array", "number", "date"].map(|k| rollup.and_then(|r| r.get(k))))
            }
            "relation" => list(field(kind), |item| item.get("id").cloned()),
            "people" => list(field(kind), |person| {
                person
                    .get("name")
                    .filter(|v| is_truthy(v))
                    .or_else(|| person.get("id"))
                    .cloned()
            }),
            "files" => list(field(kind), |file| {
                file.pointer("/external/url")
                    .filter(|v| is_truthy(v))
                    .or_else(|| file.pointer("/file/url"))
                    .cloned()
            }),
            _ => match prop.get(kind) {
                Some(raw) => raw.clone(),
                None => continue,
            },
        };

        simplified.insert(key.clone(), value);
    }

    simplified
}

/// Converts flat client values into Notion property objects.
///
/// The target type is sniffed from the value, then from the key name;
/// the first matching rule wins and `null` values are skipped.
pub fn to_notion_properties(properties: &Map<String, Value>) -> Map<String, Value> {
    let mut notion = Map::new();

    for (key, value) in properties {
        let lower = key.to_lowercase();

        let prop = match value {
            Value::Null => continue,
            Value::Bool(b) => json!({ "checkbox": b }),
            Value::Number(n) => json!({ "number": n }),
            Value::Array(items) => {
                let options: Vec<Value> = items.iter().map(|v| json!({ "name": v })).collect();
                json!({ "multi_select": options })
            }
            Value::String(s) if s.starts_with("http") => json!({ "url": s }),
            _ if lower.contains("date") => json!({ "date": { "start": value } }),
            _ if lower == "name" || lower == "title" => {
                json!({ "title": [{ "text": { "content": value } }] })
            }
            _ if matches!(lower.as_str(), "status" | "state" | "stage") => {
                json!({ "status": { "name": value } })
            }
            _ if lower.contains("select") => json!({ "select": { "name": value } }),
            _ => json!({ "rich_text": [{ "text": { "content": value } }] }),
        };

        notion.insert(key.clone(), prop);
    }

    notion
}

/// JSON truthiness: null, false, 0 and "" are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn first_truthy<const N: usize>(candidates: [Option<&Value>; N]) -> Value {
    candidates
        .into_iter()
        .flatten()
        .find(|v| is_truthy(v))
        .cloned()
        .unwrap_or_else(|| Value::String(String::new()))
}

fn plain_text(segments: Option<&Value>) -> String {
    segments
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|t| t.get("plain_text").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default()
}

fn string_or_empty(value: Option<&Value>) -> Value {
    value
        .filter(|v| is_truthy(v))
        .cloned()
        .unwrap_or_else(|| Value::String(String::new()))
}

fn list(items: Option<&Value>, map: impl Fn(&Value) -> Option<Value>) -> Value {
    let values = items
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|item| map(item).unwrap_or(Value::Null))
                .collect()
        })
        .unwrap_or_default();
    Value::Array(values)
}
