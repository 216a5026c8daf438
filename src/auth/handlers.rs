use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, instrument};

use crate::{
    auth::{
        dto::{
            LoginRequest, LoginResponse, NewPasswordRequest, NewPasswordResponse,
            PasswordResetRequest, PasswordResetResponse, RegisterRequest, RegisterResponse,
            UserInfoRequest, UserInfoResponse,
        },
        extractors::SessionToken,
        services::AuthService,
    },
    state::AppState,
};

type HandlerResult<T> = Result<Json<T>, (StatusCode, String)>;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/password-reset", post(request_password_reset))
        .route("/auth/password-reset/confirm", post(reset_password))
        .route("/auth/user-info", post(user_info))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

/// Argon2 work and lock waits are blocking, so the service runs off the
/// async workers. Only a failed task turns into a transport error.
async fn run_blocking<T, F>(state: &AppState, op: F) -> HandlerResult<T>
where
    T: Send + 'static,
    F: FnOnce(&AuthService) -> T + Send + 'static,
{
    let auth = state.auth.clone();
    tokio::task::spawn_blocking(move || op(auth.as_ref()))
        .await
        .map(Json)
        .map_err(|e| {
            error!(error = %e, "auth task failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "internal error".into())
        })
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> HandlerResult<RegisterResponse> {
    run_blocking(&state, move |auth| auth.register(&payload)).await
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> HandlerResult<LoginResponse> {
    run_blocking(&state, move |auth| auth.login(&payload)).await
}

#[instrument(skip(state, payload))]
pub async fn request_password_reset(
    State(state): State<AppState>,
    Json(payload): Json<PasswordResetRequest>,
) -> HandlerResult<PasswordResetResponse> {
    run_blocking(&state, move |auth| auth.request_password_reset(&payload)).await
}

#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<NewPasswordRequest>,
) -> HandlerResult<NewPasswordResponse> {
    run_blocking(&state, move |auth| auth.reset_password(&payload)).await
}

#[instrument(skip(state, payload))]
pub async fn user_info(
    State(state): State<AppState>,
    Json(payload): Json<UserInfoRequest>,
) -> HandlerResult<UserInfoResponse> {
    run_blocking(&state, move |auth| auth.get_user_info(&payload)).await
}

#[instrument(skip(state, token))]
pub async fn get_me(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
) -> HandlerResult<UserInfoResponse> {
    let req = UserInfoRequest {
        session_token: token,
    };
    run_blocking(&state, move |auth| auth.get_user_info(&req)).await
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body, Bytes},
        http::{header, Request},
    };
    use serde::de::DeserializeOwned;
    use serde_json::json;
    use tower::ServiceExt;

    use super::*;
    use crate::app::build_app;

    async fn call(app: &Router, req: Request<Body>) -> (StatusCode, Bytes) {
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, body)
    }

    async fn post_json<T: DeserializeOwned>(app: &Router, uri: &str, body: serde_json::Value) -> T {
        let req = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let (status, bytes) = call(app, req).await;
        assert_eq!(status, StatusCode::OK);
        serde_json::from_slice(&bytes).unwrap()
    }

    fn app() -> Router {
        build_app(AppState::fake())
    }

    #[tokio::test]
    async fn register_login_and_me_over_http() {
        let app = app();

        let reg: RegisterResponse = post_json(
            &app,
            "/api/v1/auth/register",
            json!({"username": "alice", "email": "a@x.com", "password": "pw1"}),
        )
        .await;
        assert!(reg.success, "{}", reg.message);

        let login: LoginResponse = post_json(
            &app,
            "/api/v1/auth/login",
            json!({"username": "alice", "password": "pw1"}),
        )
        .await;
        assert!(login.success);

        let req = Request::get("/api/v1/me")
            .header(header::AUTHORIZATION, format!("Bearer {}", login.session_token))
            .body(Body::empty())
            .unwrap();
        let (status, bytes) = call(&app, req).await;
        assert_eq!(status, StatusCode::OK);
        let me: UserInfoResponse = serde_json::from_slice(&bytes).unwrap();
        assert!(me.success);
        assert_eq!(me.user_id, reg.user_id);
        assert_eq!(me.email, "a@x.com");

        let info: UserInfoResponse = post_json(
            &app,
            "/api/v1/auth/user-info",
            json!({"session_token": login.session_token}),
        )
        .await;
        assert_eq!(info, me);
    }

    #[tokio::test]
    async fn business_failures_are_still_ok_responses() {
        let app = app();
        let login: LoginResponse = post_json(
            &app,
            "/api/v1/auth/login",
            json!({"username": "ghost", "password": "pw"}),
        )
        .await;
        assert!(!login.success);
        assert_eq!(login.message, "Invalid username or password");

        let reg: RegisterResponse =
            post_json(&app, "/api/v1/auth/register", json!({"username": "bob"})).await;
        assert!(!reg.success);
    }

    #[tokio::test]
    async fn password_reset_over_http() {
        let app = app();
        let _: RegisterResponse = post_json(
            &app,
            "/api/v1/auth/register",
            json!({"username": "alice", "email": "a@x.com", "password": "pw1"}),
        )
        .await;

        let reset: PasswordResetResponse =
            post_json(&app, "/api/v1/auth/password-reset", json!({"email": "a@x.com"})).await;
        assert!(reset.success);

        let done: NewPasswordResponse = post_json(
            &app,
            "/api/v1/auth/password-reset/confirm",
            json!({"reset_token": reset.reset_token, "new_password": "pw2"}),
        )
        .await;
        assert!(done.success, "{}", done.message);

        let login: LoginResponse = post_json(
            &app,
            "/api/v1/auth/login",
            json!({"username": "alice", "password": "pw2"}),
        )
        .await;
        assert!(login.success);
    }

    #[tokio::test]
    async fn me_without_bearer_is_unauthorized() {
        let app = app();
        let req = Request::get("/api/v1/me").body(Body::empty()).unwrap();
        let (status, _) = call(&app, req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let req = Request::get("/api/v1/me")
            .header(header::AUTHORIZATION, "Basic abc")
            .body(Body::empty())
            .unwrap();
        let (status, _) = call(&app, req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn me_with_unknown_token_reports_invalid_session() {
        let app = app();
        let req = Request::get("/api/v1/me")
            .header(header::AUTHORIZATION, "Bearer forged")
            .body(Body::empty())
            .unwrap();
        let (status, bytes) = call(&app, req).await;
        assert_eq!(status, StatusCode::OK);
        let me: UserInfoResponse = serde_json::from_slice(&bytes).unwrap();
        assert!(!me.success);
        assert_eq!(me.message, "Invalid session token");
    }

    #[tokio::test]
    async fn health_is_ok() {
        let req = Request::get("/api/v1/health").body(Body::empty()).unwrap();
        let (status, bytes) = call(&app(), req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(&bytes[..], b"ok");
    }
}
