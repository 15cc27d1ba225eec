use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, ProfileResponse, RegisterRequest},
        extractors::{AuthUser, ValidJson},
        service::{self, is_valid_email},
    },
    error::ApiError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/profile", get(profile))
}

fn validate_credentials(email: &str, password: &str) -> Result<(), ApiError> {
    if !is_valid_email(email) {
        warn!("invalid email");
        return Err(ApiError::Validation("Invalid email".into()));
    }
    if password.len() < 6 {
        warn!("password too short");
        return Err(ApiError::Validation(
            "Password must be at least 6 characters".into(),
        ));
    }
    Ok(())
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    ValidJson(mut payload): ValidJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if payload.name.trim().is_empty() {
        warn!("empty name");
        return Err(ApiError::Validation("Name is required".into()));
    }
    validate_credentials(&payload.email, &payload.password)?;

    let response = service::register(&state, &payload.name, &payload.email, &payload.password)
        .await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ValidJson(mut payload): ValidJson<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!("invalid email");
        return Err(ApiError::Validation("Invalid email".into()));
    }

    let response = service::login(&state, &payload.email, &payload.password).await?;
    Ok(Json(response))
}

/// Returns the principal resolved by the authorization gate.
#[instrument(skip_all)]
pub async fn profile(user: AuthUser) -> Json<ProfileResponse> {
    Json(ProfileResponse {
        subject: user.subject,
        email: user.email,
    })
}
