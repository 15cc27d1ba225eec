use axum::extract::FromRef;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use crate::auth::dto::AuthResponse;
use crate::auth::jwt::JwtKeys;
use crate::auth::password::{hash_password, verify_password};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Creates the user record and mints a token for it. Duplicate emails come
/// back as `Conflict` straight from the store.
pub async fn register(
    state: &AppState,
    name: &str,
    email: &str,
    password: &str,
) -> ApiResult<AuthResponse> {
    let hash = hash_password(password)?;
    let user = state.store.create(name, email, hash.as_str()).await?;

    let keys = JwtKeys::from_ref(state);
    let access_token = keys.sign(user.id, &user.email)?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(AuthResponse {
        access_token,
        user: user.into(),
    })
}

/// Unknown email and wrong password are indistinguishable to the caller.
pub async fn login(state: &AppState, email: &str, password: &str) -> ApiResult<AuthResponse> {
    let user = match state.store.find_by_email(email, true).await? {
        Some(u) => u,
        None => {
            warn!("login for unknown or inactive email");
            return Err(ApiError::Unauthorized("Invalid credentials".into()));
        }
    };

    if !verify_password(password, &user.password_hash) {
        warn!(user_id = %user.id, "login with invalid password");
        return Err(ApiError::Unauthorized("Invalid credentials".into()));
    }

    let keys = JwtKeys::from_ref(state);
    let access_token = keys.sign(user.id, &user.email)?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(AuthResponse {
        access_token,
        user: user.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;

    #[test]
    fn email_regex_accepts_plain_addresses() {
        assert!(is_valid_email("a@x.com"));
        assert!(is_valid_email("juan.perez@example.com"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a b@x.com"));
        assert!(!is_valid_email("a@x"));
    }

    #[tokio::test]
    async fn register_then_login_roundtrip() {
        let state = AppState::fake();
        let reg = register(&state, "A", "a@x.com", "secret1")
            .await
            .expect("register");
        assert!(!reg.access_token.is_empty());
        assert_eq!(reg.user.email, "a@x.com");

        let login = login(&state, "a@x.com", "secret1").await.expect("login");
        assert_eq!(login.user.id, reg.user.id);
    }

    #[tokio::test]
    async fn register_duplicate_email_variant_conflicts() {
        let state = AppState::fake();
        register(&state, "A", "a@x.com", "secret1")
            .await
            .expect("register");

        let err = register(&state, "B", "  A@X.Com ", "secret2")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let state = AppState::fake();
        register(&state, "A", "a@x.com", "secret1")
            .await
            .expect("register");

        let unknown = login(&state, "nobody@x.com", "secret1").await.unwrap_err();
        let wrong = login(&state, "a@x.com", "wrong").await.unwrap_err();
        assert_eq!(unknown.to_string(), wrong.to_string());
        assert!(matches!(unknown, ApiError::Unauthorized(_)));
        assert!(matches!(wrong, ApiError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn login_is_case_insensitive_on_email() {
        let state = AppState::fake();
        register(&state, "A", "a@x.com", "secret1")
            .await
            .expect("register");

        let res = login(&state, "A@X.COM", "secret1").await.expect("login");
        assert_eq!(res.user.email, "a@x.com");
    }

    #[tokio::test]
    async fn deactivated_user_cannot_log_in() {
        let state = AppState::fake();
        let reg = register(&state, "A", "a@x.com", "secret1")
            .await
            .expect("register");
        state.store.deactivate(reg.user.id).await.expect("deactivate");

        let err = login(&state, "a@x.com", "secret1").await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }
}
