use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::auth::{errors::StoreError, repo_types::User};

/// Repository of user records with unique username/email indexes and a
/// reset-token lookup index.
pub trait UserStore: Send + Sync {
    fn create(&self, user: User) -> Result<(), StoreError>;
    fn get_by_username(&self, username: &str) -> Result<User, StoreError>;
    fn get_by_email(&self, email: &str) -> Result<User, StoreError>;
    fn get_by_id(&self, id: Uuid) -> Result<User, StoreError>;
    /// Ignores expiry; callers check `reset_token_expires_at`.
    fn get_by_reset_token(&self, token: &str) -> Result<User, StoreError>;
    fn update(&self, user: User) -> Result<(), StoreError>;
}

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    by_username: HashMap<String, Uuid>,
    by_email: HashMap<String, Uuid>,
    by_reset_token: HashMap<String, Uuid>,
}

impl Tables {
    fn lookup(&self, index: &HashMap<String, Uuid>, key: &str) -> Option<User> {
        index.get(key).and_then(|id| self.users.get(id)).cloned()
    }
}

/// Process-local store. One lock covers the record map and all three
/// indexes, so readers never see an index out of step with the records.
#[derive(Default)]
pub struct InMemoryUserStore {
    inner: RwLock<Tables>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.inner.read().users.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl UserStore for InMemoryUserStore {
    fn create(&self, user: User) -> Result<(), StoreError> {
        let mut t = self.inner.write();

        if t.users.contains_key(&user.id) {
            return Err(StoreError::AlreadyExists { field: "id" });
        }
        if t.by_username.contains_key(&user.username) {
            return Err(StoreError::AlreadyExists { field: "username" });
        }
        if t.by_email.contains_key(&user.email) {
            return Err(StoreError::AlreadyExists { field: "email" });
        }
        if let Some(token) = user.active_reset_token() {
            if t.by_reset_token.contains_key(token) {
                return Err(StoreError::AlreadyExists { field: "reset token" });
            }
            t.by_reset_token.insert(token.to_owned(), user.id);
        }

        t.by_username.insert(user.username.clone(), user.id);
        t.by_email.insert(user.email.clone(), user.id);
        debug!(user_id = %user.id, "user stored");
        t.users.insert(user.id, user);
        Ok(())
    }

    fn get_by_username(&self, username: &str) -> Result<User, StoreError> {
        let t = self.inner.read();
        t.lookup(&t.by_username, username).ok_or(StoreError::NotFound)
    }

    fn get_by_email(&self, email: &str) -> Result<User, StoreError> {
        let t = self.inner.read();
        t.lookup(&t.by_email, email).ok_or(StoreError::NotFound)
    }

    fn get_by_id(&self, id: Uuid) -> Result<User, StoreError> {
        self.inner
            .read()
            .users
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    fn get_by_reset_token(&self, token: &str) -> Result<User, StoreError> {
        let t = self.inner.read();
        t.lookup(&t.by_reset_token, token)
            .ok_or(StoreError::InvalidToken)
    }

    fn update(&self, user: User) -> Result<(), StoreError> {
        let mut guard = self.inner.write();
        let t = &mut *guard;

        let Some(current) = t.users.get(&user.id) else {
            return Err(StoreError::NotFound);
        };

        // Validate every index change before touching any of them.
        let username_changed = current.username != user.username;
        let email_changed = current.email != user.email;
        if username_changed && t.by_username.contains_key(&user.username) {
            return Err(StoreError::AlreadyExists { field: "username" });
        }
        if email_changed && t.by_email.contains_key(&user.email) {
            return Err(StoreError::AlreadyExists { field: "email" });
        }
        if let Some(token) = user.active_reset_token() {
            if t.by_reset_token.get(token).is_some_and(|id| *id != user.id) {
                return Err(StoreError::AlreadyExists { field: "reset token" });
            }
        }

        if username_changed {
            t.by_username.remove(&current.username);
            t.by_username.insert(user.username.clone(), user.id);
        }
        if email_changed {
            t.by_email.remove(&current.email);
            t.by_email.insert(user.email.clone(), user.id);
        }

        t.by_reset_token.retain(|_, id| *id != user.id);
        if let Some(token) = user.active_reset_token() {
            t.by_reset_token.insert(token.to_owned(), user.id);
        }

        debug!(user_id = %user.id, "user updated");
        t.users.insert(user.id, user);
        Ok(())
    }
}
