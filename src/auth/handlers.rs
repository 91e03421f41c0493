use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use time::OffsetDateTime;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, PublicUser, RefreshRequest, RegisterRequest},
        jwt::{AuthIdentity, JwtKeys},
        password::{hash_password, verify_password},
    },
    domain::{Identity, NewUser, Role},
    error::ApiError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if payload.name.trim().is_empty() {
        return Err(ApiError::invalid_input("Missing name, email, or password"));
    }
    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::invalid_input("Invalid email"));
    }
    if payload.password.len() < 8 {
        warn!("password too short");
        return Err(ApiError::invalid_input("Password too short"));
    }
    let role: Role = payload.user_type.parse().map_err(|_| {
        ApiError::invalid_input("Invalid user_type. Must be 'passenger' or 'driver'")
    })?;

    let hash = hash_password(&payload.password)?;
    let user = state
        .store
        .insert_user(NewUser {
            name: payload.name,
            email: payload.email,
            password_hash: hash,
            role,
            is_admin: payload.is_admin,
            registered_on: OffsetDateTime::now_utc(),
        })
        .await?;

    let identity = Identity {
        id: user.id,
        role: user.role,
        is_admin: user.is_admin,
    };
    let keys = JwtKeys::from_ref(&state);
    let access_token = keys.sign_access(identity)?;
    let refresh_token = keys.sign_refresh(identity)?;

    info!(user_id = user.id, email = %user.email, role = %user.role, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            access_token,
            refresh_token,
            user: PublicUser::from(&user),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    let user = state
        .store
        .user_by_email(&payload.email)
        .await?
        .ok_or_else(|| {
            warn!(email = %payload.email, "login unknown email");
            ApiError::not_found("Email not found")
        })?;

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(email = %payload.email, user_id = user.id, "login invalid password");
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let identity = Identity {
        id: user.id,
        role: user.role,
        is_admin: user.is_admin,
    };
    let keys = JwtKeys::from_ref(&state);
    let access_token = keys.sign_access(identity)?;
    let refresh_token = keys.sign_refresh(identity)?;

    info!(user_id = user.id, email = %user.email, "user logged in");
    Ok(Json(AuthResponse {
        access_token,
        refresh_token,
        user: PublicUser::from(&user),
    }))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|e| ApiError::unauthorized(e.to_string()))?;

    // Re-read the user so revoked roles/flags are not re-minted from stale claims
    let user = state
        .store
        .user_by_id(claims.sub)
        .await?
        .ok_or_else(|| ApiError::unauthorized("User not found"))?;

    let identity = Identity {
        id: user.id,
        role: user.role,
        is_admin: user.is_admin,
    };
    let access_token = keys.sign_access(identity)?;
    let refresh_token = keys.sign_refresh(identity)?;

    Ok(Json(AuthResponse {
        access_token,
        refresh_token,
        user: PublicUser::from(&user),
    }))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
) -> Result<Json<PublicUser>, ApiError> {
    let user = state
        .store
        .user_by_id(identity.id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("User not found"))?;
    Ok(Json(PublicUser::from(&user)))
}
