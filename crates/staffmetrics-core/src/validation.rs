use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::decimal::is_tenths;

/// A single rejected field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Field-level validation failures collected for one record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    pub fields: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.fields.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|error| error.field == field)
    }

    /// `Ok(())` when nothing was recorded, otherwise the collected errors.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }

    pub fn text(&mut self, field: &str, value: &str, max_len: usize) {
        if value.trim().is_empty() {
            self.push(field, "must not be blank");
        } else if value.chars().count() > max_len {
            self.push(field, format!("must be at most {max_len} characters"));
        }
    }

    pub fn int_range(&mut self, field: &str, value: i64, min: i64, max: i64) {
        if value < min || value > max {
            self.push(field, format!("must be between {min} and {max}"));
        }
    }

    pub fn tenths_range(&mut self, field: &str, value: Decimal, min: Decimal, max: Decimal) {
        if value < min || value > max {
            self.push(field, format!("must be between {min} and {max}"));
        } else if !is_tenths(value) {
            self.push(field, "must have at most one decimal place");
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, error) in self.fields.iter().enumerate() {
            if idx > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", error.field, error.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Records that can check their own field ranges before a write.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationErrors>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::tenths;

    #[test]
    fn collects_every_failing_field() {
        let mut errors = ValidationErrors::new();
        errors.text("first_name", "  ", 100);
        errors.int_range("age", 12, 16, 100);
        errors.tenths_range("score", Decimal::new(455, 2), tenths(10), tenths(50));

        assert_eq!(errors.fields.len(), 3);
        assert!(errors.has_field("first_name"));
        assert!(errors.has_field("age"));
        assert_eq!(
            errors.to_string(),
            "first_name: must not be blank; age: must be between 16 and 100; \
             score: must have at most one decimal place"
        );
    }

    #[test]
    fn empty_errors_are_ok() {
        assert!(ValidationErrors::new().into_result().is_ok());
    }
}
