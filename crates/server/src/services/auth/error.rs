//! Authentication error types.

use thiserror::Error;

use tq_core::FormErrors;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] tq_core::EmailError),

    /// Registration or profile fields failed validation.
    #[error("invalid profile: {0}")]
    InvalidProfile(#[from] FormErrors),

    /// Invalid credentials (wrong password or user not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// User already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Recovery code wrong, expired or already used.
    #[error("invalid or expired recovery code")]
    InvalidRecoveryCode,

    /// No session cookie on the request.
    #[error("no session")]
    MissingSession,

    /// Session token failed verification or names a deleted account.
    #[error("invalid session: {0}")]
    InvalidSession(String),

    /// Session token could not be signed.
    #[error("token signing failed: {0}")]
    TokenSigning(#[source] jsonwebtoken::errors::Error),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
