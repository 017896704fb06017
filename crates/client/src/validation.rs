//! Local form validation. Nothing here touches the network.

use thiserror::Error;

use phoneplace_core::{Email, EmailError};

pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Malformed user input, caught before any request is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(&'static str),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("Password must be at least {min} characters")]
    PasswordTooShort { min: usize },

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("You must accept the terms and conditions")]
    TermsNotAccepted,

    #[error("Price must be greater than zero")]
    InvalidPrice,

    #[error("At least one image is required")]
    NoImages,

    #[error("Your cart is empty")]
    EmptyCart,
}

/// Trimmed value of a required field.
pub(crate) fn required(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        Err(ValidationError::Required(field))
    } else {
        Ok(value.to_string())
    }
}

pub(crate) fn email(value: &str) -> Result<Email, ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required("Email"));
    }
    Ok(Email::parse(value)?)
}

pub(crate) fn password(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::Required("Password"));
    }
    if value.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooShort {
            min: MIN_PASSWORD_LENGTH,
        });
    }
    Ok(())
}
