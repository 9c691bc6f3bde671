//! Session data handler

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
};
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::server::AppState;

/// Merge posted fields into the session data
///
/// **POST /save-widget-data**
///
/// Accepts a JSON object or a urlencoded form. Answers 200 with an empty
/// body, or 400 when the body is not an object.
pub async fn save(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    match parse_fields(&headers, &body) {
        Ok(fields) => {
            state.session.save_data(fields);
            StatusCode::OK
        },
        Err(reason) => {
            tracing::warn!("Rejected widget data: {}", reason);
            StatusCode::BAD_REQUEST
        },
    }
}

fn parse_fields(headers: &HeaderMap, body: &[u8]) -> Result<Map<String, Value>, String> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if content_type.starts_with("application/x-www-form-urlencoded") {
        return Ok(parse_form(body));
    }

    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(other) => Err(format!("expected a JSON object, got {other}")),
        Err(e) => Err(format!("invalid JSON: {e}")),
    }
}

/// Decode an urlencoded form with bracket nesting.
///
/// `a[b]=1` becomes `{"a": {"b": "1"}}`, `a[]=1` appends to an array and a
/// repeated key collects its values into an array in posting order.
fn parse_form(body: &[u8]) -> Map<String, Value> {
    let mut fields = Map::new();
    for (key, value) in url::form_urlencoded::parse(body) {
        let (root, path) = split_key(&key);
        let incoming = nest(&path, Value::String(value.into_owned()));
        match fields.get_mut(&root) {
            Some(existing) => combine(existing, incoming),
            None => {
                fields.insert(root, incoming);
            },
        }
    }
    fields
}

/// Split `a[b][]` into `("a", ["b", ""])`. Malformed keys stay literal.
fn split_key(key: &str) -> (String, Vec<String>) {
    let literal = || (key.to_string(), Vec::new());
    let open = match key.find('[') {
        Some(0) | None => return literal(),
        Some(open) => open,
    };

    let mut path = Vec::new();
    let mut rest = &key[open..];
    while let Some(inner) = rest.strip_prefix('[') {
        let Some(close) = inner.find(']') else {
            return literal();
        };
        path.push(inner[..close].to_string());
        rest = &inner[close + 1..];
    }
    if !rest.is_empty() {
        return literal();
    }
    (key[..open].to_string(), path)
}

fn nest(path: &[String], value: Value) -> Value {
    match path.split_first() {
        None => value,
        Some((segment, rest)) if segment.is_empty() => Value::Array(vec![nest(rest, value)]),
        Some((segment, rest)) => {
            let mut object = Map::new();
            object.insert(segment.clone(), nest(rest, value));
            Value::Object(object)
        },
    }
}

fn combine(existing: &mut Value, incoming: Value) {
    match (existing, incoming) {
        (Value::Object(current), Value::Object(incoming)) => {
            for (key, value) in incoming {
                match current.get_mut(&key) {
                    Some(slot) => combine(slot, value),
                    None => {
                        current.insert(key, value);
                    },
                }
            }
        },
        (Value::Array(items), Value::Array(more)) => items.extend(more),
        (Value::Array(items), value) => items.push(value),
        (slot, Value::Array(more)) => {
            let mut items = vec![slot.take()];
            items.extend(more);
            *slot = Value::Array(items);
        },
        (slot, value) => {
            *slot = Value::Array(vec![slot.take(), value]);
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use serde_json::json;

    fn headers(content_type: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_str(content_type).unwrap());
        headers
    }

    #[test]
    fn test_parse_json_object() {
        let fields = parse_fields(&headers("application/json"), br#"{"a": 1}"#).unwrap();
        assert_eq!(Value::Object(fields), json!({"a": 1}));
    }

    #[test]
    fn test_parse_form() {
        let fields = parse_fields(
            &headers("application/x-www-form-urlencoded; charset=utf-8"),
            b"title=Hello+World&count=3",
        )
        .unwrap();
        assert_eq!(Value::Object(fields), json!({"title": "Hello World", "count": "3"}));
    }

    #[test]
    fn test_form_repeated_keys_are_collected() {
        let fields = parse_fields(
            &headers("application/x-www-form-urlencoded"),
            b"tags=x&tags=y&tags=z",
        )
        .unwrap();
        assert_eq!(Value::Object(fields), json!({"tags": ["x", "y", "z"]}));
    }

    #[test]
    fn test_form_brackets_nest() {
        let fields = parse_fields(
            &headers("application/x-www-form-urlencoded"),
            b"a%5Bb%5D=1&a[c]=2&list[]=x&list[]=y&deep[k][]=v",
        )
        .unwrap();
        assert_eq!(
            Value::Object(fields),
            json!({
                "a": {"b": "1", "c": "2"},
                "list": ["x", "y"],
                "deep": {"k": ["v"]}
            })
        );
    }

    #[test]
    fn test_form_malformed_brackets_stay_literal() {
        let fields = parse_fields(
            &headers("application/x-www-form-urlencoded"),
            b"a[b=1&[c]=2&d[e]f=3",
        )
        .unwrap();
        assert_eq!(
            Value::Object(fields),
            json!({"a[b": "1", "[c]": "2", "d[e]f": "3"})
        );
    }

    #[test]
    fn test_empty_body_is_empty_object() {
        let fields = parse_fields(&HeaderMap::new(), b"").unwrap();
        assert!(fields.is_empty());
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(parse_fields(&headers("application/json"), b"[1, 2]").is_err());
        assert!(parse_fields(&headers("application/json"), b"{oops").is_err());
    }
}
