use thiserror::Error;

/// Failures reported by an [`AuthBackend`](crate::auth::AuthBackend).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid login credentials")]
    InvalidCredentials,

    #[error("User already registered: {0}")]
    UserExists(String),

    #[error("Unable to validate email address: {0}")]
    InvalidEmail(String),

    #[error("Password should be at least {min} characters")]
    WeakPassword { min: usize },

    #[error("Not signed in")]
    NotAuthenticated,

    #[error("No such user: {0}")]
    UnknownUser(String),

    #[error("Password hash failure: {0}")]
    PasswordHash(String),

    /// Transport or service failure on the backend side.
    #[error("Auth backend error: {0}")]
    Backend(String),
}
