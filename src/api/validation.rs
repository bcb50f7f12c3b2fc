//! Input validation for login and user forms.
//!
//! Validation always runs before a request is built; a form that fails here
//! never reaches the network. Errors are collected per field with
//! [`FieldErrors`] so every problem can be reported at once.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;

use crate::models::{Credentials, UserDraft};

/// Minimum password length accepted by the login form
pub const MIN_PASSWORD_LENGTH: usize = 6;

lazy_static! {
    /// Regex for validating email addresses (WHATWG "valid email address")
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).unwrap();
}

/// Field-level validation errors, keyed by form field name.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FieldErrors {
    errors: BTreeMap<String, Vec<String>>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a validation error for a field
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) -> &mut Self {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
        self
    }

    /// Record the outcome of a single-field validator
    pub fn check(&mut self, field: &str, result: Result<(), String>) -> &mut Self {
        if let Err(message) = result {
            self.add(field, message);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.errors.get(field).map(Vec::as_slice)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.errors.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Return Ok(()) if no errors were collected
    pub fn finish(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.errors {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{}: {}", field, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

/// Validate an email address
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.trim().is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 254 || !EMAIL_REGEX.is_match(email) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Validate a login password
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        ));
    }

    Ok(())
}

/// Validate a required free-text field
pub fn validate_required(value: &str, label: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} is required", label));
    }
    Ok(())
}

pub fn validate_credentials(credentials: &Credentials) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    errors
        .check("email", validate_email(&credentials.email))
        .check("password", validate_password(&credentials.password));
    errors.finish()
}

pub fn validate_user_draft(draft: &UserDraft) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    errors
        .check("email", validate_email(&draft.email))
        .check("first_name", validate_required(&draft.first_name, "First name"))
        .check("last_name", validate_required(&draft.last_name, "Last name"));
    errors.finish()
}
