//! Assertion helpers for spec bodies
//!
//! Each helper returns `Err(E2eError::AssertionFailed)` instead of panicking so a
//! mismatch is recorded against the spec and the run carries on.

use std::fmt::Debug;

use reqwest::StatusCode;
use serde_json::Value;

use crate::api::ApiResponse;
use crate::error::{E2eError, E2eResult};

/// The response status must be exactly `expected`
pub fn expect_status(response: &ApiResponse, expected: StatusCode, context: &str) -> E2eResult<()> {
    if response.status == expected {
        return Ok(());
    }
    Err(E2eError::assertion(format!(
        "{}: expected status {}, got {} (body: {})",
        context,
        expected.as_u16(),
        response.status.as_u16(),
        response.body
    )))
}

pub fn expect_eq<T: PartialEq + Debug + ?Sized>(actual: &T, expected: &T, what: &str) -> E2eResult<()> {
    if actual == expected {
        return Ok(());
    }
    Err(E2eError::assertion(format!(
        "{}: expected {:?}, got {:?}",
        what, expected, actual
    )))
}

/// Every field of `submitted` must come back unchanged in `echoed`
pub fn expect_echoed_fields(echoed: &Value, submitted: &Value, what: &str) -> E2eResult<()> {
    let fields = submitted
        .as_object()
        .ok_or_else(|| E2eError::assertion(format!("{}: submitted payload is not an object", what)))?;
    for (key, value) in fields {
        let actual = echoed.get(key).unwrap_or(&Value::Null);
        expect_json_eq(actual, value, &format!("{}: field '{}'", what, key))?;
    }
    Ok(())
}

/// Structural equality of two JSON documents, reporting the first differing path
pub fn expect_json_eq(actual: &Value, expected: &Value, what: &str) -> E2eResult<()> {
    match first_difference(actual, expected, "$") {
        None => Ok(()),
        Some(path) => Err(E2eError::assertion(format!(
            "{}: values differ at {} (expected {}, got {})",
            what, path, expected, actual
        ))),
    }
}

pub fn expect_array<'a>(value: &'a Value, what: &str) -> E2eResult<&'a Vec<Value>> {
    value
        .as_array()
        .ok_or_else(|| E2eError::assertion(format!("{}: expected an array, got {}", what, value)))
}

/// The object must carry `key` with a non-null value
pub fn expect_property<'a>(value: &'a Value, key: &str) -> E2eResult<&'a Value> {
    match value.get(key) {
        Some(v) if !v.is_null() => Ok(v),
        _ => Err(E2eError::assertion(format!(
            "expected property '{}' in {}",
            key, value
        ))),
    }
}

/// The object must carry `key` as a non-empty string
pub fn expect_non_empty_string<'a>(value: &'a Value, key: &str) -> E2eResult<&'a str> {
    match expect_property(value, key)?.as_str() {
        Some(s) if !s.trim().is_empty() => Ok(s),
        _ => Err(E2eError::assertion(format!(
            "expected '{}' to be a non-empty string in {}",
            key, value
        ))),
    }
}

pub fn expect_true(condition: bool, message: impl Into<String>) -> E2eResult<()> {
    if condition {
        Ok(())
    } else {
        Err(E2eError::assertion(message))
    }
}

fn first_difference(actual: &Value, expected: &Value, path: &str) -> Option<String> {
    match (actual, expected) {
        (Value::Object(a), Value::Object(e)) => {
            for key in e.keys().chain(a.keys().filter(|k| !e.contains_key(*k))) {
                let child = format!("{}.{}", path, key);
                match (a.get(key), e.get(key)) {
                    (Some(av), Some(ev)) => {
                        if let Some(diff) = first_difference(av, ev, &child) {
                            return Some(diff);
                        }
                    }
                    _ => return Some(child),
                }
            }
            None
        }
        (Value::Array(a), Value::Array(e)) => {
            if a.len() != e.len() {
                return Some(format!("{} (length {} vs {})", path, a.len(), e.len()));
            }
            a.iter()
                .zip(e.iter())
                .enumerate()
                .find_map(|(i, (av, ev))| first_difference(av, ev, &format!("{}[{}]", path, i)))
        }
        // 10 and 10.0 are the same JSON number once a server has round-tripped it
        (Value::Number(a), Value::Number(e)) if a.as_f64() == e.as_f64() => None,
        _ if actual == expected => None,
        _ => Some(path.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(status: u16, body: Value) -> ApiResponse {
        ApiResponse {
            status: StatusCode::from_u16(status).unwrap(),
            body,
        }
    }

    #[test]
    fn test_expect_status() {
        assert!(expect_status(&response(201, json!({})), StatusCode::CREATED, "create").is_ok());
        let err = expect_status(&response(500, json!("boom")), StatusCode::CREATED, "create")
            .unwrap_err()
            .to_string();
        assert!(err.contains("expected status 201, got 500"));
    }

    #[test]
    fn test_json_eq_reports_path() {
        let expected = json!({ "id": 4, "name": "Kiwi", "tags": ["a", "b"] });
        assert!(expect_json_eq(&expected.clone(), &expected, "read-after-write").is_ok());

        let actual = json!({ "id": 4, "name": "Kiwi", "tags": ["a", "c"] });
        let err = expect_json_eq(&actual, &expected, "read-after-write").unwrap_err();
        assert!(err.to_string().contains("$.tags[1]"));

        let extra = json!({ "id": 4, "name": "Kiwi", "tags": ["a", "b"], "stock": 3 });
        let err = expect_json_eq(&extra, &expected, "read-after-write").unwrap_err();
        assert!(err.to_string().contains("$.stock"));
    }

    #[test]
    fn test_json_eq_does_not_coerce_numbers() {
        let err = expect_json_eq(&json!({ "price": "9.99" }), &json!({ "price": 9.99 }), "price");
        assert!(err.is_err());
    }

    #[test]
    fn test_json_eq_treats_integral_floats_as_equal() {
        assert!(expect_json_eq(&json!({ "price": 10 }), &json!({ "price": 10.0 }), "price").is_ok());
    }

    #[test]
    fn test_echoed_fields() {
        let submitted = json!({ "name": "Integration Test Fruit", "price": 9.99 });
        let echoed = json!({ "id": 12, "name": "Integration Test Fruit", "price": 9.99 });
        assert!(expect_echoed_fields(&echoed, &submitted, "POST /products").is_ok());

        let dropped = json!({ "id": 12, "name": "Integration Test Fruit" });
        let err = expect_echoed_fields(&dropped, &submitted, "POST /products").unwrap_err();
        assert!(err.to_string().contains("field 'price'"));
    }

    #[test]
    fn test_property_helpers() {
        let order = json!({ "id": 1, "orderDate": "", "total": null });
        assert!(expect_property(&order, "id").is_ok());
        assert!(expect_property(&order, "total").is_err());
        assert!(expect_non_empty_string(&order, "orderDate").is_err());
        assert!(expect_array(&json!([]), "orders").unwrap().is_empty());
        assert!(expect_array(&json!(null), "orders").is_err());
    }
}
