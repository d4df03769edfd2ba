use crate::security::tokens::TokenType;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("Invalid token")]
    TokenInvalid,

    #[error("Token expired")]
    TokenExpired,

    #[error("Token replayed")]
    TokenReplayed,

    #[error("Wrong token type: expected {expected}, got {actual}")]
    WrongTokenType {
        expected: TokenType,
        actual: TokenType,
    },

    #[error("Verification code not found")]
    OtpNotFound,

    #[error("Verification code expired")]
    OtpExpired,

    #[error("Verification code already used")]
    OtpConsumed,

    #[error("Invalid verification code")]
    OtpMismatch,

    #[error("Linking state not found")]
    LinkingStateNotFound,

    #[error("Linking state expired")]
    LinkingStateExpired,

    #[error("Session renewal failed: {0}")]
    SessionRenewalFailed(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Token signing error: {0}")]
    Signing(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Message safe to hand to the caller.
    ///
    /// Internal failure kinds collapse to a generic message; client error
    /// kinds keep their text so the caller can distinguish expired from
    /// invalid and prompt accordingly.
    pub fn public_message(&self) -> String {
        match self {
            AuthError::SessionRenewalFailed(_) => "Session renewal failed".to_string(),
            AuthError::Database(_) | AuthError::Signing(_) | AuthError::Internal(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

// Conversions from external error types
impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {}", err);
        AuthError::Database(err.to_string())
    }
}
