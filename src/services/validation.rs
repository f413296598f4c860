// src/services/validation.rs

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{AppError, AppResult};
use crate::models::is_object_id;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{10}$").expect("phone pattern compiles"));

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Ten digits once all whitespace is removed.
pub fn is_valid_phone(phone: &str) -> bool {
    let compact: String = phone.chars().filter(|c| !c.is_whitespace()).collect();
    PHONE_RE.is_match(&compact)
}

/// Trims `value` and drops it when nothing is left.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Collects every failing rule of a form before reporting.
#[derive(Debug, Default)]
pub struct FieldErrors(Vec<String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, ok: bool, message: &str) -> &mut Self {
        if !ok {
            self.0.push(message.to_string());
        }
        self
    }

    pub fn check_id(&mut self, id: &str, field: &str) -> &mut Self {
        self.check(is_object_id(id), &format!("Invalid {field}"))
    }

    pub fn finish(self) -> AppResult<()> {
        match self.0.first() {
            None => Ok(()),
            Some(first) => Err(AppError::Validation {
                message: first.clone(),
                errors: self.0,
            }),
        }
    }
}
