//! Failure kinds of the authentication core.
//!
//! Every variant is a business outcome: the service turns it into a
//! `success = false` response record instead of a transport fault.

use thiserror::Error;

/// Errors raised by the user store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{field} already exists")]
    AlreadyExists { field: &'static str },
    #[error("user not found")]
    NotFound,
    #[error("invalid reset token")]
    InvalidToken,
}

/// Coarse classification surfaced to callers and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InputValidation,
    Conflict,
    NotFound,
    Expired,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("{0}")]
    InputValidation(String),
    #[error("{0}")]
    Conflict(String),
    /// Unknown user and wrong password share this variant.
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("{0}")]
    NotFound(String),
    #[error("invalid reset token")]
    InvalidToken,
    #[error("reset token expired")]
    Expired,
    #[error("invalid session token")]
    InvalidSession,
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        Self::Internal(err.to_string())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InputValidation(_) => ErrorKind::InputValidation,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::InvalidCredentials
            | Self::NotFound(_)
            | Self::InvalidToken
            | Self::InvalidSession => ErrorKind::NotFound,
            Self::Expired => ErrorKind::Expired,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AlreadyExists { .. } => Self::Conflict(err.to_string()),
            StoreError::NotFound => Self::NotFound(err.to_string()),
            StoreError::InvalidToken => Self::InvalidToken,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_conflict_keeps_the_field_name() {
        let err: AuthError = StoreError::AlreadyExists { field: "email" }.into();
        assert_eq!(err, AuthError::Conflict("email already exists".into()));
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn credential_failures_classify_as_not_found() {
        assert_eq!(AuthError::InvalidCredentials.kind(), ErrorKind::NotFound);
        assert_eq!(AuthError::InvalidSession.kind(), ErrorKind::NotFound);
        assert_eq!(AuthError::from(StoreError::InvalidToken).kind(), ErrorKind::NotFound);
        assert_eq!(AuthError::Expired.kind(), ErrorKind::Expired);
    }
}
