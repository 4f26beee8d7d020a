use serde::{Deserialize, Deserializer};

use crate::errors::{AppError, FieldError};

/// Explicit DTO validation. Implementors list every rejected field.
pub trait Validate {
    fn validate(&self) -> Vec<FieldError>;

    fn check(&self) -> Result<(), AppError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(errors))
        }
    }
}

pub const MAX_TEXT_LEN: usize = 200;
pub const MAX_DESCRIPTION_LEN: usize = 5000;

pub fn required_text(errors: &mut Vec<FieldError>, field: &str, value: &str, max: usize) {
    if value.trim().is_empty() {
        errors.push(FieldError::new(field, "must not be empty"));
    } else if value.chars().count() > max {
        errors.push(FieldError::new(field, format!("must be at most {max} characters")));
    }
}

pub fn optional_text(errors: &mut Vec<FieldError>, field: &str, value: Option<&str>, max: usize) {
    if let Some(value) = value {
        required_text(errors, field, value, max);
    }
}

pub fn non_negative(errors: &mut Vec<FieldError>, field: &str, value: Option<i32>) {
    if matches!(value, Some(v) if v < 0) {
        errors.push(FieldError::new(field, "must not be negative"));
    }
}

pub fn in_range(errors: &mut Vec<FieldError>, field: &str, value: Option<i32>, min: i32, max: i32) {
    if let Some(v) = value {
        if !(min..=max).contains(&v) {
            errors.push(FieldError::new(field, format!("must be between {min} and {max}")));
        }
    }
}

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`)
/// in PATCH payloads. Use with `#[serde(default, deserialize_with = "double_option")]`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "double_option")]
        note: Option<Option<String>>,
    }

    #[test]
    fn test_required_text() {
        let mut errors = Vec::new();
        required_text(&mut errors, "name", "   ", 10);
        required_text(&mut errors, "title", "abcdefghijk", 10);
        required_text(&mut errors, "ok", "fine", 10);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].field, "name");
        assert_eq!(errors[1].field, "title");
    }

    #[test]
    fn test_range_and_sign() {
        let mut errors = Vec::new();
        non_negative(&mut errors, "display_order", Some(-1));
        non_negative(&mut errors, "display_order", None);
        in_range(&mut errors, "years", Some(81), 0, 80);
        in_range(&mut errors, "years", Some(80), 0, 80);
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_double_option_distinguishes_null_from_absent() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        let null: Patch = serde_json::from_str(r#"{"note": null}"#).unwrap();
        let set: Patch = serde_json::from_str(r#"{"note": "hi"}"#).unwrap();
        assert_eq!(absent.note, None);
        assert_eq!(null.note, Some(None));
        assert_eq!(set.note, Some(Some("hi".to_string())));
    }
}
