//! Field-level validation of user records.
//!
//! The service takes any [`Validator`]; [`UserValidator`] is the rule set
//! used by the binary.

use crate::context::RequestContext;
use crate::error::Result;
use crate::model::User;
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};

pub const MAX_ID_LEN: usize = 40;
pub const MAX_USERNAME_LEN: usize = 100;
pub const MAX_EMAIL_LEN: usize = 100;
pub const MAX_PHONE_LEN: usize = 18;

/// One rejected field, returned verbatim to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl FieldError {
    pub fn new(field: &str, code: &str) -> Self {
        Self {
            field: field.to_string(),
            code: code.to_string(),
            param: None,
            message: None,
        }
    }

    pub fn required(field: &str) -> Self {
        Self::new(field, "required")
    }

    pub fn max_len(field: &str, max: usize) -> Self {
        Self {
            param: Some(max.to_string()),
            ..Self::new(field, "max")
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Checks a record before it is written.
///
/// `Ok` with an empty vector accepts the record, `Ok` with entries rejects
/// it, and `Err` means the check itself could not run.
#[async_trait]
pub trait Validator: Send + Sync {
    async fn validate(&self, ctx: &RequestContext, user: &User) -> Result<Vec<FieldError>>;
}

/// Default rules for the users table.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserValidator;

#[async_trait]
impl Validator for UserValidator {
    async fn validate(&self, ctx: &RequestContext, user: &User) -> Result<Vec<FieldError>> {
        ctx.check()?;
        Ok(check_user(user))
    }
}

fn check_user(user: &User) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if user.id.trim().is_empty() {
        errors.push(FieldError::required("id"));
    } else if user.id.chars().count() > MAX_ID_LEN {
        errors.push(FieldError::max_len("id", MAX_ID_LEN));
    }

    if user.username.chars().count() > MAX_USERNAME_LEN {
        errors.push(FieldError::max_len("username", MAX_USERNAME_LEN));
    }

    if !user.email.is_empty() {
        if user.email.chars().count() > MAX_EMAIL_LEN {
            errors.push(FieldError::max_len("email", MAX_EMAIL_LEN));
        } else if !is_email(&user.email) {
            errors.push(FieldError::new("email", "email"));
        }
    }

    if !user.phone.is_empty() {
        if user.phone.chars().count() > MAX_PHONE_LEN {
            errors.push(FieldError::max_len("phone", MAX_PHONE_LEN));
        } else if !is_phone(&user.phone) {
            errors.push(FieldError::new("phone", "phone"));
        }
    }

    if let Some(date) = user.date_of_birth {
        if date > Utc::now().date_naive() {
            errors.push(
                FieldError::new("dateOfBirth", "past").with_message("must not be in the future"),
            );
        }
    }

    errors
}

fn is_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !value.chars().any(char::is_whitespace)
        && domain
            .split('.')
            .filter(|label| !label.is_empty())
            .count()
            >= 2
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

fn is_phone(value: &str) -> bool {
    let digits = value.strip_prefix('+').unwrap_or(value);
    digits.chars().any(|c| c.is_ascii_digit())
        && digits
            .chars()
            .all(|c| c.is_ascii_digit() || c == ' ' || c == '-')
}
