//! Field rules applied to request payloads before they reach storage.

use std::sync::LazyLock;

use chrono::Utc;
use regex::Regex;

use crate::error_handling::types::ValidationError;
use crate::storage::types::{NewDog, NewOwner};

const MAX_NAME_LEN: usize = 50;
const MAX_POSTAL_CODE_LEN: usize = 10;
const MAX_EMAIL_LEN: usize = 254;
const MIN_PHONE_LEN: usize = 9;
const MAX_PHONE_LEN: usize = 15;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s.]+(\.[^@\s.]+)+$").expect("email pattern compiles")
});

pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

fn check_text(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty { field });
    }
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(())
}

fn check_postal_code(value: &str) -> Result<(), ValidationError> {
    check_text("postal_code", value, MAX_POSTAL_CODE_LEN)?;
    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == ' ' || c == '-')
    {
        return Err(ValidationError::InvalidFormat {
            field: "postal_code",
            reason: "only letters, digits, spaces and hyphens are allowed",
        });
    }
    Ok(())
}

fn check_email(value: &str) -> Result<(), ValidationError> {
    check_text("email", value, MAX_EMAIL_LEN)?;
    if !EMAIL_RE.is_match(value) {
        return Err(ValidationError::InvalidFormat {
            field: "email",
            reason: "must be a valid email address",
        });
    }
    Ok(())
}

fn check_phone(value: &str) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len < MIN_PHONE_LEN {
        return Err(ValidationError::TooShort {
            field: "phone",
            min: MIN_PHONE_LEN,
        });
    }
    if len > MAX_PHONE_LEN {
        return Err(ValidationError::TooLong {
            field: "phone",
            max: MAX_PHONE_LEN,
        });
    }
    if !value
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | ' ' | '-'))
    {
        return Err(ValidationError::InvalidFormat {
            field: "phone",
            reason: "only digits, spaces, '+' and '-' are allowed",
        });
    }
    Ok(())
}

impl Validate for NewOwner {
    fn validate(&self) -> Result<(), ValidationError> {
        check_text("first_name", &self.first_name, MAX_NAME_LEN)?;
        check_text("last_name", &self.last_name, MAX_NAME_LEN)?;
        check_text("city", &self.city, MAX_NAME_LEN)?;
        check_postal_code(&self.postal_code)?;
        check_email(&self.email)?;
        check_phone(&self.phone)
    }
}

impl Validate for NewDog {
    fn validate(&self) -> Result<(), ValidationError> {
        check_text("name", &self.name, MAX_NAME_LEN)?;
        if !self.weight.is_finite() || self.weight <= 0.0 {
            return Err(ValidationError::InvalidFormat {
                field: "weight",
                reason: "must be a positive number",
            });
        }
        if self.birth_date > Utc::now().date_naive() {
            return Err(ValidationError::InvalidFormat {
                field: "birth_date",
                reason: "cannot be in the future",
            });
        }
        Ok(())
    }
}
