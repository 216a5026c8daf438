//! Register, login, password reset and session lookup.
//!
//! Each operation has a typed `try_*` core and a public wrapper that folds
//! the outcome into the `success` + `message` response record.

use std::sync::Arc;

use time::{Duration, OffsetDateTime};
use tracing::{debug, error, info, instrument, warn};

use crate::{
    auth::{
        dto::{
            LoginRequest, LoginResponse, NewPasswordRequest, NewPasswordResponse,
            PasswordResetRequest, PasswordResetResponse, RegisterRequest, RegisterResponse,
            UserInfoRequest, UserInfoResponse,
        },
        errors::{AuthError, ErrorKind},
        password::PasswordCodec,
        repo::{InMemoryUserStore, UserStore},
        repo_types::User,
        session::SessionRegistry,
    },
    config::{check_reset_ttl_hours, AuthConfig},
};

const MSG_FIELDS_REQUIRED: &str = "Username, email and password are required";
const MSG_BAD_CREDENTIALS: &str = "Invalid username or password";
const MSG_UNKNOWN_EMAIL: &str = "No account found with that email";
const MSG_INVALID_RESET_TOKEN: &str = "Invalid or expired reset token";
const MSG_RESET_TOKEN_EXPIRED: &str = "Reset token has expired";
const MSG_NEW_PASSWORD_REQUIRED: &str = "New password is required";
const MSG_INVALID_SESSION: &str = "Invalid session token";
const MSG_USER_NOT_FOUND: &str = "User not found";

/// Identity fields returned by a successful session lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInfo {
    pub user_id: String,
    pub username: String,
    pub email: String,
}

pub struct AuthService {
    store: Arc<dyn UserStore>,
    sessions: SessionRegistry,
    codec: PasswordCodec,
    reset_ttl: Duration,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn UserStore>,
        sessions: SessionRegistry,
        codec: PasswordCodec,
        reset_ttl: Duration,
    ) -> Self {
        Self {
            store,
            sessions,
            codec,
            reset_ttl,
        }
    }

    /// Service over a fresh in-memory store.
    pub fn in_memory(cfg: &AuthConfig) -> anyhow::Result<Self> {
        Ok(Self::new(
            Arc::new(InMemoryUserStore::new()),
            SessionRegistry::new(cfg.session_token_len),
            PasswordCodec::new(cfg.hash)?,
            Duration::hours(check_reset_ttl_hours(cfg.reset_ttl_hours)?),
        ))
    }

    #[cfg(test)]
    pub fn store(&self) -> &Arc<dyn UserStore> {
        &self.store
    }

    #[cfg(test)]
    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    // --- typed operations ---

    #[instrument(skip(self, username, email, password))]
    pub fn try_register(&self, username: &str, email: &str, password: &str) -> Result<User, AuthError> {
        if username.is_empty() || email.is_empty() || password.is_empty() {
            return Err(AuthError::InputValidation(MSG_FIELDS_REQUIRED.into()));
        }

        let hash = self.codec.hash(password)?;
        let user = User::new(username, email, hash);
        self.store.create(user.clone())?;

        info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    #[instrument(skip(self, password))]
    pub fn try_login(&self, username: &str, password: &str) -> Result<String, AuthError> {
        let user = match self.store.get_by_username(username) {
            Ok(u) => u,
            Err(_) => {
                warn!("login unknown username");
                return Err(AuthError::InvalidCredentials);
            }
        };

        if !self.codec.verify(&user.password_hash, password) {
            warn!(user_id = %user.id, "login invalid password");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.sessions.issue(user.id);
        info!(user_id = %user.id, "user logged in");
        Ok(token)
    }

    #[instrument(skip(self, email))]
    pub fn try_request_password_reset(&self, email: &str) -> Result<String, AuthError> {
        let mut user = self
            .store
            .get_by_email(email)
            .map_err(|_| AuthError::NotFound(MSG_UNKNOWN_EMAIL.into()))?;

        let user_id = user.id;
        let token = user.set_reset_token(self.reset_ttl).map_err(|e| {
            error!(error = %e, user_id = %user_id, "reset expiry out of range");
            e
        })?;
        self.store.update(user).map_err(|e| {
            error!(error = %e, user_id = %user_id, "storing reset token failed");
            AuthError::internal(e)
        })?;

        info!(user_id = %user_id, "password reset requested");
        Ok(token)
    }

    #[instrument(skip(self, reset_token, new_password))]
    pub fn try_reset_password(&self, reset_token: &str, new_password: &str) -> Result<(), AuthError> {
        self.reset_password_at(reset_token, new_password, OffsetDateTime::now_utc())
    }

    fn reset_password_at(
        &self,
        reset_token: &str,
        new_password: &str,
        now: OffsetDateTime,
    ) -> Result<(), AuthError> {
        let mut user = self
            .store
            .get_by_reset_token(reset_token)
            .map_err(|_| AuthError::InvalidToken)?;

        if user.reset_token_expired(now) {
            warn!(user_id = %user.id, "reset token expired");
            return Err(AuthError::Expired);
        }
        if new_password.is_empty() {
            return Err(AuthError::InputValidation(MSG_NEW_PASSWORD_REQUIRED.into()));
        }

        user.password_hash = self.codec.hash(new_password)?;
        user.clear_reset_token();
        let user_id = user.id;
        self.store.update(user).map_err(|e| {
            error!(error = %e, user_id = %user_id, "storing new password failed");
            AuthError::internal(e)
        })?;

        info!(user_id = %user_id, "password reset completed");
        Ok(())
    }

    #[instrument(skip(self, session_token))]
    pub fn try_get_user_info(&self, session_token: &str) -> Result<UserInfo, AuthError> {
        let user_id = self.sessions.resolve(session_token)?;
        let user = self.store.get_by_id(user_id).map_err(|e| {
            error!(error = %e, user_id = %user_id, "session points at a missing user");
            AuthError::NotFound(MSG_USER_NOT_FOUND.into())
        })?;
        Ok(UserInfo {
            user_id: user.id.to_string(),
            username: user.username,
            email: user.email,
        })
    }

    // --- response records ---

    pub fn register(&self, req: &RegisterRequest) -> RegisterResponse {
        match self.try_register(&req.username, &req.email, &req.password) {
            Ok(user) => RegisterResponse {
                success: true,
                message: "User registered successfully".into(),
                user_id: user.id.to_string(),
            },
            Err(e) => {
                log_failure("register", &e);
                RegisterResponse {
                    success: false,
                    message: register_failure(&e),
                    user_id: String::new(),
                }
            }
        }
    }

    pub fn login(&self, req: &LoginRequest) -> LoginResponse {
        match self.try_login(&req.username, &req.password) {
            Ok(session_token) => LoginResponse {
                success: true,
                message: "Login successful".into(),
                session_token,
            },
            Err(e) => {
                log_failure("login", &e);
                LoginResponse {
                    success: false,
                    message: MSG_BAD_CREDENTIALS.into(),
                    session_token: String::new(),
                }
            }
        }
    }

    pub fn request_password_reset(&self, req: &PasswordResetRequest) -> PasswordResetResponse {
        match self.try_request_password_reset(&req.email) {
            Ok(reset_token) => PasswordResetResponse {
                success: true,
                message: "Password reset link sent to your email".into(),
                reset_token,
            },
            Err(e) => {
                log_failure("request_password_reset", &e);
                PasswordResetResponse {
                    success: false,
                    message: match e {
                        AuthError::NotFound(msg) => msg,
                        _ => "Failed to process reset request".into(),
                    },
                    reset_token: String::new(),
                }
            }
        }
    }

    pub fn reset_password(&self, req: &NewPasswordRequest) -> NewPasswordResponse {
        let (success, message) = match self.try_reset_password(&req.reset_token, &req.new_password) {
            Ok(()) => (true, "Password has been reset successfully".to_string()),
            Err(e) => {
                log_failure("reset_password", &e);
                (false, reset_failure(e))
            }
        };
        NewPasswordResponse { success, message }
    }

    pub fn get_user_info(&self, req: &UserInfoRequest) -> UserInfoResponse {
        match self.try_get_user_info(&req.session_token) {
            Ok(info) => UserInfoResponse {
                success: true,
                message: "User information retrieved successfully".into(),
                user_id: info.user_id,
                username: info.username,
                email: info.email,
            },
            Err(e) => {
                log_failure("get_user_info", &e);
                UserInfoResponse {
                    success: false,
                    message: match e {
                        AuthError::InvalidSession => MSG_INVALID_SESSION.into(),
                        _ => MSG_USER_NOT_FOUND.into(),
                    },
                    user_id: String::new(),
                    username: String::new(),
                    email: String::new(),
                }
            }
        }
    }
}

fn log_failure(op: &'static str, err: &AuthError) {
    match err.kind() {
        ErrorKind::Internal => error!(op, error = %err, "auth operation failed"),
        kind => debug!(op, ?kind, error = %err, "auth operation rejected"),
    }
}

fn register_failure(err: &AuthError) -> String {
    match err {
        AuthError::InputValidation(msg) => msg.clone(),
        AuthError::Conflict(msg) => format!("Failed to register user: {msg}"),
        _ => "Failed to create user".into(),
    }
}

fn reset_failure(err: AuthError) -> String {
    match err {
        AuthError::Expired => MSG_RESET_TOKEN_EXPIRED.into(),
        AuthError::InputValidation(msg) => msg,
        AuthError::InvalidToken => MSG_INVALID_RESET_TOKEN.into(),
        _ => "Failed to update password".into(),
    }
}

#[cfg(test)]
pub(crate) fn test_service() -> AuthService {
    use crate::auth::password::cheap_codec;
    AuthService::new(
        Arc::new(InMemoryUserStore::new()),
        SessionRegistry::new(32),
        cheap_codec(),
        Duration::hours(24),
    )
}
