use serde::Serialize;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::auth::{
    errors::AuthError,
    token::{self, RESET_TOKEN_LEN},
};

/// A registered account, as held by the user store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: Uuid,                     // unique user ID
    pub username: String,             // unique, case-sensitive
    pub email: String,                // unique, case-sensitive
    #[serde(skip_serializing)]
    pub password_hash: String,        // Argon2 hash, not exposed in JSON
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,   // creation timestamp
    #[serde(skip_serializing)]
    pub reset_token: Option<String>,  // outstanding reset token, if any
    #[serde(skip_serializing)]
    pub reset_token_expires_at: Option<OffsetDateTime>,
}

impl User {
    pub fn new(username: &str, email: &str, password_hash: String) -> Self {
        Self {
            id: token::new_identifier(),
            username: username.to_owned(),
            email: email.to_owned(),
            password_hash,
            created_at: OffsetDateTime::now_utc(),
            reset_token: None,
            reset_token_expires_at: None,
        }
    }

    /// Replaces any outstanding reset token with a fresh one valid for `ttl`.
    /// Leaves the record untouched if the expiry cannot be represented.
    pub fn set_reset_token(&mut self, ttl: Duration) -> Result<String, AuthError> {
        let expires_at = OffsetDateTime::now_utc()
            .checked_add(ttl)
            .ok_or_else(|| AuthError::internal("reset token expiry out of range"))?;
        let token = token::new_token(RESET_TOKEN_LEN);
        self.reset_token = Some(token.clone());
        self.reset_token_expires_at = Some(expires_at);
        Ok(token)
    }

    pub fn clear_reset_token(&mut self) {
        self.reset_token = None;
        self.reset_token_expires_at = None;
    }

    /// Expired once `now` reaches the expiry instant; a missing expiry counts as expired.
    pub fn reset_token_expired(&self, now: OffsetDateTime) -> bool {
        self.reset_token_expires_at
            .map_or(true, |expires_at| expires_at <= now)
    }

    pub(crate) fn active_reset_token(&self) -> Option<&str> {
        self.reset_token.as_deref().filter(|t| !t.is_empty())
    }
}
