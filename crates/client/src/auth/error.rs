//! Authentication error types.

use thiserror::Error;

use crate::api::ApiError;
use crate::storage::StorageError;
use crate::validation::ValidationError;

/// Errors that can occur during login or signup.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The form was rejected locally; nothing was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Wrong email or password.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Signup for an email that is already registered.
    #[error("an account with this email already exists")]
    AccountExists,

    /// The auth service failed or could not be reached.
    #[error("auth service error: {0}")]
    Api(#[from] ApiError),

    /// Signed in, but the session could not be saved.
    #[error("could not save session: {0}")]
    Storage(#[from] StorageError),
}

impl AuthError {
    /// Whether a fallback authenticator may be consulted after this error.
    ///
    /// An unreachable or failing service qualifies, and so does a catalog
    /// service without auth routes (404 or 405). A rejected credential or
    /// form never does.
    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        match self {
            Self::Api(e) => {
                e.is_server_error()
                    || matches!(
                        e,
                        ApiError::NotFound(_) | ApiError::Client { status: 405, .. }
                    )
            }
            Self::Validation(_)
            | Self::InvalidCredentials
            | Self::AccountExists
            | Self::Storage(_) => false,
        }
    }
}
