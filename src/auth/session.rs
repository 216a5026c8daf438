use std::collections::HashMap;

use parking_lot::RwLock;
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use crate::auth::{errors::AuthError, token};

#[derive(Debug, Clone, Copy)]
struct SessionEntry {
    user_id: Uuid,
    issued_at: OffsetDateTime,
}

/// Session token -> user id map. Sessions neither expire nor get revoked.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, SessionEntry>>,
    token_len: usize,
}

impl SessionRegistry {
    pub fn new(token_len: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            token_len,
        }
    }

    pub fn issue(&self, user_id: Uuid) -> String {
        let entry = SessionEntry {
            user_id,
            issued_at: OffsetDateTime::now_utc(),
        };
        let mut sessions = self.sessions.write();
        // A collision at this length is practically impossible; draw again rather than overwrite.
        let token = loop {
            let candidate = token::new_token(self.token_len);
            if !sessions.contains_key(&candidate) {
                break candidate;
            }
        };
        sessions.insert(token.clone(), entry);
        debug!(user_id = %user_id, issued_at = %entry.issued_at, "session issued");
        token
    }

    pub fn resolve(&self, token: &str) -> Result<Uuid, AuthError> {
        self.sessions
            .read()
            .get(token)
            .map(|entry| entry.user_id)
            .ok_or(AuthError::InvalidSession)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
