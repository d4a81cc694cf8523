//! Assertion macros and helpers for service and gateway tests.

use crate::error::TaskNestError;
use crate::validation::field_messages;

/// Assert that a result is Ok.
///
/// ```ignore
/// assert_ok!(services.categories.delete(&owner, guid, &()).await);
/// assert_ok!(result, "deleting {}", guid);
/// ```
#[macro_export]
macro_rules! assert_ok {
    ($expr:expr) => {
        match &$expr {
            Ok(_) => (),
            Err(e) => panic!("assertion failed: expected Ok, got Err({:?})", e),
        }
    };
    ($expr:expr, $($arg:tt)+) => {
        match &$expr {
            Ok(_) => (),
            Err(e) => panic!("assertion failed: {}: expected Ok, got Err({:?})", format_args!($($arg)+), e),
        }
    };
}

/// Assert that a result is Err.
#[macro_export]
macro_rules! assert_err {
    ($expr:expr) => {
        match &$expr {
            Err(_) => (),
            Ok(v) => panic!("assertion failed: expected Err, got Ok({:?})", v),
        }
    };
    ($expr:expr, $($arg:tt)+) => {
        match &$expr {
            Err(_) => (),
            Ok(v) => panic!("assertion failed: {}: expected Err, got Ok({:?})", format_args!($($arg)+), v),
        }
    };
}

/// Assert that an error matches a specific variant.
///
/// ```ignore
/// assert_err_variant!(result, TaskNestError::NotFound(_));
/// ```
#[macro_export]
macro_rules! assert_err_variant {
    ($expr:expr, $variant:pat) => {
        match &$expr {
            Err($variant) => (),
            Err(e) => panic!(
                "assertion failed: expected {}, got {:?}",
                stringify!($variant),
                e
            ),
            Ok(v) => panic!(
                "assertion failed: expected Err({}), got Ok({:?})",
                stringify!($variant),
                v
            ),
        }
    };
}

/// Assert that a result failed validation on a field.
///
/// The field is given as it appears in error bodies, e.g. `"duedate"`.
#[macro_export]
macro_rules! assert_validation_error {
    ($expr:expr, $field:expr) => {
        match &$expr {
            Err(e) if $crate::testing::validation_error_for_field(e, $field) => (),
            Err(e) => panic!(
                "assertion failed: expected validation error on '{}', got {:?}",
                $field, e
            ),
            Ok(v) => panic!(
                "assertion failed: expected validation error on '{}', got Ok({:?})",
                $field, v
            ),
        }
    };
}

/// Check if an error message contains a substring.
pub fn error_contains(error: &TaskNestError, substring: &str) -> bool {
    error.to_string().contains(substring)
}

/// Check if a validation error reports a field.
pub fn validation_error_for_field(error: &TaskNestError, field: &str) -> bool {
    match error {
        TaskNestError::Validation(errors) => field_messages(errors).contains_key(field),
        _ => false,
    }
}

/// Partial JSON match: objects in `pattern` only need a subset of keys.
///
/// ```ignore
/// let body = json!({"status": 400, "message": "Category has tasks.", "validations": {}});
/// assert!(json_matches(&body, &json!({"status": 400})));
/// ```
pub fn json_matches(actual: &serde_json::Value, pattern: &serde_json::Value) -> bool {
    match (actual, pattern) {
        (serde_json::Value::Object(a), serde_json::Value::Object(p)) => p
            .iter()
            .all(|(key, expected)| a.get(key).is_some_and(|v| json_matches(v, expected))),
        (serde_json::Value::Array(a), serde_json::Value::Array(p)) => {
            a.len() == p.len() && a.iter().zip(p).all(|(a, p)| json_matches(a, p))
        }
        (a, p) => a == p,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    use super::*;
    use crate::dto::AddTodoItemCmd;
    use crate::validation::Command;

    #[test]
    fn test_assert_ok_macro() {
        let result: Result<i32, String> = Ok(42);
        assert_ok!(result);
    }

    #[test]
    #[should_panic(expected = "expected Ok")]
    fn test_assert_ok_macro_fails() {
        let result: Result<i32, String> = Err("error".to_string());
        assert_ok!(result);
    }

    #[test]
    #[should_panic(expected = "expected Err")]
    fn test_assert_err_macro_fails() {
        let result: Result<i32, String> = Ok(42);
        assert_err!(result);
    }

    #[test]
    fn test_validation_error_for_field() {
        let now = Utc::now();
        let cmd = AddTodoItemCmd {
            title: "Late".into(),
            description: "d".into(),
            category_guid: Uuid::new_v4(),
            due_date: Some(now - Duration::days(1)),
        };
        let result = cmd.validate_at(now);
        assert_validation_error!(result, "duedate");

        let err = result.unwrap_err();
        assert!(!validation_error_for_field(&err, "title"));
        assert!(!validation_error_for_field(
            &TaskNestError::Internal("boom".into()),
            "duedate"
        ));
    }

    #[test]
    fn test_error_contains() {
        let error = TaskNestError::Integrity("TodoItem has tasks.".into());
        assert!(error_contains(&error, "has tasks"));
        assert!(!error_contains(&error, "Category"));
    }

    #[test]
    fn test_json_matches() {
        let actual = serde_json::json!({
            "status": 400,
            "message": "Category has tasks.",
            "validations": {"name": "required"},
            "list": [1, 2]
        });

        assert!(json_matches(&actual, &serde_json::json!({"status": 400})));
        assert!(json_matches(
            &actual,
            &serde_json::json!({"validations": {"name": "required"}})
        ));
        assert!(!json_matches(&actual, &serde_json::json!({"status": 404})));
        assert!(!json_matches(&actual, &serde_json::json!({"missing": true})));
        assert!(!json_matches(&actual, &serde_json::json!({"list": [1]})));
    }
}
