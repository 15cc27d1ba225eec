use axum::{
    async_trait,
    extract::{FromRef, FromRequest, FromRequestParts, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use tracing::warn;
use uuid::Uuid;

use crate::auth::jwt::JwtKeys;
use crate::error::ApiError;
use crate::state::AppState;

/// JSON body extractor that rejects malformed bodies and unknown fields with
/// 400 instead of axum's default 422, keeping boundary validation inside the
/// error taxonomy.
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|e| {
            warn!(error = %e, "invalid request body");
            ApiError::Validation(e.body_text())
        })?;
        Ok(Self(value))
    }
}

/// Authorization gate. Extracts the bearer token, verifies it and resolves
/// the subject through the credential store, so a deactivated or deleted
/// account is rejected even while its token is still unexpired.
pub struct AuthUser {
    pub subject: Uuid,
    pub email: String,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".into()))?;

        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or_else(|| ApiError::Unauthorized("Invalid Authorization header".into()))?;

        let keys = JwtKeys::from_ref(state);
        // One rejection for expired, malformed and forged tokens alike.
        let claims = keys.verify(token).map_err(|_| {
            warn!("invalid or expired token");
            ApiError::Unauthorized("Invalid or expired token".into())
        })?;

        let user = state
            .store
            .find_by_id(claims.sub)
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(|| {
                warn!(user_id = %claims.sub, "token subject missing or inactive");
                ApiError::Unauthorized("Invalid or expired token".into())
            })?;

        Ok(AuthUser {
            subject: user.id,
            email: user.email,
        })
    }
}
