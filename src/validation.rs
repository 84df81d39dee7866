//! Request validation.
//!
//! Every request body is a plain `Deserialize` struct implementing [`Validate`].
//! Validation walks all fields and reports every violation at once.

use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(transparent)]
pub struct ValidationErrors {
    #[schema(value_type = Vec<FieldError>)]
    pub errors: Vec<FieldError>,
}

pub trait Validate {
    fn validate(&self) -> Result<(), ValidationErrors>;
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    pub fn into_result(self) -> Result<(), Self> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    /// Character-count bounds; `max` of `None` means unbounded.
    pub fn check_length(&mut self, field: &str, value: &str, min: usize, max: Option<usize>) {
        let len = value.chars().count();
        match max {
            Some(max) if len < min || len > max => {
                self.add(field, format!("must be between {min} and {max} characters"));
            }
            None if len < min => {
                self.add(field, format!("must be at least {min} characters"));
            }
            _ => {}
        }
    }

    /// Prices must fit the `NUMERIC(12, 2)` column: 0.01 up to, not including, 10^10.
    pub fn check_price(&mut self, field: &str, value: Decimal) {
        if value < min_price() {
            self.add(field, "must be at least 0.01");
        } else if value >= max_price() {
            self.add(field, format!("must be less than {}", max_price()));
        }
    }

    pub fn check_segments(&mut self, field: &str, segments: &[String]) {
        for (idx, segment) in segments.iter().enumerate() {
            if segment.trim().is_empty() {
                self.add(format!("{field}[{idx}]"), "must not be blank");
            }
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for err in &self.errors {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", err.field, err.message)?;
            first = false;
        }
        Ok(())
    }
}

pub fn min_price() -> Decimal {
    Decimal::new(1, 2)
}

pub fn max_price() -> Decimal {
    Decimal::new(10_000_000_000, 0)
}

/// Minimal structural check: one `@`, non-empty local part, dotted domain, no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|label| !label.is_empty())
}
