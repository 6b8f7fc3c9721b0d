use axum::{
    extract::{rejection::JsonRejection, FromRef, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use super::{
    dto::{AuthResponse, LoginRequest, SignupRequest},
    jwt::JwtKeys,
    password::{hash_password_blocking, verify_password_blocking},
};
use crate::{
    error::{required, ApiError},
    state::AppState,
    users::repo_types::{NewUser, PublicUser},
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn normalize_email(raw: String) -> Result<String, ApiError> {
    let email = raw.trim().to_lowercase();
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(ApiError::validation("Invalid email"));
    }
    Ok(email)
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let Json(payload) = payload?;
    let name = required(payload.name)?;
    let email = normalize_email(required(payload.email)?)?;
    let password = required(payload.password)?;

    if state.store.find_user_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(ApiError::validation("User already exists"));
    }

    let password_hash = hash_password_blocking(password).await?;
    // A concurrent signup can claim the email between the check and here.
    let Some(user) = state
        .store
        .insert_user(NewUser {
            name,
            email: email.clone(),
            password_hash,
        })
        .await?
    else {
        warn!(email = %email, "email registered concurrently");
        return Err(ApiError::validation("User already exists"));
    };

    let token = JwtKeys::from_ref(&state).sign(user.id)?;

    info!(user_id = %user.id, email = %user.email, "user signed up");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: PublicUser::from(&user),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let Json(payload) = payload?;
    let email = normalize_email(required(payload.email)?)?;
    let password = required(payload.password)?;

    let Some(user) = state.store.find_user_by_email(&email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(ApiError::validation("Invalid credentials"));
    };

    if !verify_password_blocking(password, user.password_hash.clone()).await? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::validation("Invalid credentials"));
    }

    let token = JwtKeys::from_ref(&state).sign(user.id)?;

    info!(user_id = %user.id, "user logged in");
    Ok(Json(AuthResponse {
        token,
        user: PublicUser::from(&user),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::build_app;
    use crate::test_support::{read_json, send};
    use axum::http::Method;
    use serde_json::{json, Value};

    #[test]
    fn email_shape() {
        assert!(is_valid_email("ada@example.com"));
        assert!(!is_valid_email("ada@example"));
        assert!(!is_valid_email("ada example.com"));
    }

    #[tokio::test]
    async fn signup_returns_token_and_public_user() {
        let state = AppState::fake();
        let app = build_app(state.clone());
        let res = send(
            &app,
            Method::POST,
            "/api/v1/auth/signup",
            None,
            Some(json!({"name": "Ada", "email": " Ada@Example.com ", "password": "pw12345"})),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = read_json(res).await;
        assert_eq!(body["user"]["email"], "ada@example.com");
        assert_eq!(body["user"]["name"], "Ada");
        assert!(body["user"].get("password_hash").is_none());

        let keys = JwtKeys::from_ref(&state);
        let claims = keys.verify(body["token"].as_str().unwrap()).unwrap();
        assert_eq!(claims.sub.to_string(), body["user"]["id"].as_str().unwrap());
    }

    #[tokio::test]
    async fn signup_rejects_missing_fields_and_duplicates() {
        let app = build_app(AppState::fake());
        let res = send(
            &app,
            Method::POST,
            "/api/v1/auth/signup",
            None,
            Some(json!({"email": "a@example.com", "password": "pw"})),
        )
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let body = json!({"name": "A", "email": "a@example.com", "password": "pw"});
        let first = send(&app, Method::POST, "/api/v1/auth/signup", None, Some(body.clone())).await;
        assert_eq!(first.status(), StatusCode::CREATED);
        let again = send(&app, Method::POST, "/api/v1/auth/signup", None, Some(body)).await;
        assert_eq!(again.status(), StatusCode::BAD_REQUEST);
        let msg: Value = read_json(again).await;
        assert_eq!(msg["message"], "User already exists");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_signups_for_one_email_yield_one_account() {
        let state = AppState::fake();
        let app = build_app(state.clone());
        let body = json!({"name": "A", "email": "race@example.com", "password": "pw"});
        let (a, b) = tokio::join!(
            send(&app, Method::POST, "/api/v1/auth/signup", None, Some(body.clone())),
            send(&app, Method::POST, "/api/v1/auth/signup", None, Some(body.clone())),
        );

        let statuses = [a.status(), b.status()];
        assert!(statuses.contains(&StatusCode::CREATED));
        assert!(statuses.contains(&StatusCode::BAD_REQUEST));
        let loser = if a.status() == StatusCode::BAD_REQUEST { a } else { b };
        let msg: Value = read_json(loser).await;
        assert_eq!(msg["message"], "User already exists");
        assert_eq!(state.store.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn login_checks_credentials() {
        let app = build_app(AppState::fake());
        let signup = json!({"name": "A", "email": "a@example.com", "password": "right"});
        send(&app, Method::POST, "/api/v1/auth/signup", None, Some(signup)).await;

        let ok = send(
            &app,
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({"email": "a@example.com", "password": "right"})),
        )
        .await;
        assert_eq!(ok.status(), StatusCode::OK);

        let wrong = send(
            &app,
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({"email": "a@example.com", "password": "wrong"})),
        )
        .await;
        assert_eq!(wrong.status(), StatusCode::BAD_REQUEST);

        let unknown = send(
            &app,
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({"email": "nobody@example.com", "password": "right"})),
        )
        .await;
        assert_eq!(unknown.status(), StatusCode::BAD_REQUEST);

        let missing = send(
            &app,
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({"email": "a@example.com"})),
        )
        .await;
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
    }
}
