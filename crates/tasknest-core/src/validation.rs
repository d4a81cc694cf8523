//! Command validation.
//!
//! Field rules are declared with `validator` derives. Rules that need the
//! current time or a parsed value are layered on top through [`Command`].

use std::borrow::Cow;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::{Result, TaskNestError};
use crate::model::Priority;

/// An inbound command that must be valid before it touches the store.
pub trait Command: Validate {
    /// Additional checks evaluated against `now`.
    fn check(&self, _now: DateTime<Utc>, _errors: &mut ValidationErrors) {}

    /// Run derived field rules and [`Command::check`], collecting every failure.
    fn validate_at(&self, now: DateTime<Utc>) -> Result<()> {
        let mut errors = match self.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };
        self.check(now, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(TaskNestError::Validation(errors))
        }
    }
}

/// Build a validation error with a human-readable message.
pub fn error(code: &'static str, message: impl Into<Cow<'static, str>>) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

/// Record an error when `value` does not name a priority.
pub fn check_priority(value: &str, errors: &mut ValidationErrors) {
    if let Err(e) = value.parse::<Priority>() {
        errors.add("priority", error("priority", e.to_string()));
    }
}

/// Record an error when a due date is not strictly after `now`.
pub fn check_future(due_date: Option<DateTime<Utc>>, now: DateTime<Utc>, errors: &mut ValidationErrors) {
    if let Some(due) = due_date {
        if due <= now {
            errors.add("due_date", error("future", "Due date must be in the future."));
        }
    }
}

/// Flatten errors to one message per field.
///
/// Keys are the field name lowercased with separators removed, so
/// `due_date` and `dueDate` both become `duedate`.
pub fn field_messages(errors: &ValidationErrors) -> BTreeMap<String, String> {
    errors
        .field_errors()
        .into_iter()
        .filter_map(|(field, errs)| {
            let first = errs.first()?;
            let message = first
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("Invalid value ({})", first.code));
            Some((field.replace('_', "").to_lowercase(), message))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 1, max = 5, message = "Name must be 1-5 characters."))]
        name: String,
        due_date: Option<DateTime<Utc>>,
    }

    impl Command for Sample {
        fn check(&self, now: DateTime<Utc>, errors: &mut ValidationErrors) {
            check_future(self.due_date, now, errors);
        }
    }

    #[test]
    fn test_valid_command() {
        let now = Utc::now();
        let cmd = Sample {
            name: "ok".into(),
            due_date: Some(now + Duration::days(1)),
        };
        assert!(cmd.validate_at(now).is_ok());
    }

    #[test]
    fn test_collects_derived_and_custom_errors() {
        let now = Utc::now();
        let cmd = Sample {
            name: String::new(),
            due_date: Some(now - Duration::days(1)),
        };

        let err = cmd.validate_at(now).unwrap_err();
        let TaskNestError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        let messages = field_messages(&errors);
        assert_eq!(messages.get("name").unwrap(), "Name must be 1-5 characters.");
        assert_eq!(messages.get("duedate").unwrap(), "Due date must be in the future.");
    }

    #[test]
    fn test_due_date_equal_to_now_is_rejected() {
        let now = Utc::now();
        let mut errors = ValidationErrors::new();
        check_future(Some(now), now, &mut errors);
        assert!(!errors.is_empty());

        let mut errors = ValidationErrors::new();
        check_future(None, now, &mut errors);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_unknown_priority() {
        let mut errors = ValidationErrors::new();
        check_priority("Urgent", &mut errors);
        let messages = field_messages(&errors);
        assert!(messages.get("priority").unwrap().contains("Urgent"));

        let mut errors = ValidationErrors::new();
        check_priority("High", &mut errors);
        assert!(errors.is_empty());
    }
}
