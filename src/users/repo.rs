use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::users::repo_types::UserRecord;

/// Canonical form used for every email comparison and write.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Credential store. Owns the user records; the rest of the app only reads
/// through it, except for creation and deactivation. No hard delete.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `Conflict` when any record (active or not) already holds
    /// the normalized email.
    async fn create(&self, name: &str, email: &str, password_hash: &str)
        -> ApiResult<UserRecord>;

    async fn find_by_email(&self, email: &str, active_only: bool)
        -> ApiResult<Option<UserRecord>>;

    async fn find_by_id(&self, id: Uuid) -> ApiResult<Option<UserRecord>>;

    async fn list_active(&self) -> ApiResult<Vec<UserRecord>>;

    /// Soft delete. Idempotent: deactivating an already-inactive user
    /// succeeds and leaves `is_active = false`.
    async fn deactivate(&self, id: Uuid) -> ApiResult<UserRecord>;
}

/// Postgres-backed store. Uniqueness is enforced by the unique index on
/// `lower(email)`; the violation is surfaced as `Conflict`, which also covers
/// concurrent duplicate registrations.
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> ApiResult<UserRecord> {
        let email = normalize_email(email);
        let result = sqlx::query_as::<_, UserRecord>(
            r#"
            INSERT INTO users (name, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, name, email, password_hash, is_active, created_at, updated_at
            "#,
        )
        .bind(name.trim())
        .bind(&email)
        .bind(password_hash)
        .fetch_one(&self.db)
        .await;

        match result {
            Ok(user) => Ok(user),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(ApiError::Conflict("Email already registered".into()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_email(
        &self,
        email: &str,
        active_only: bool,
    ) -> ApiResult<Option<UserRecord>> {
        let email = normalize_email(email);
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, name, email, password_hash, is_active, created_at, updated_at
            FROM users
            WHERE lower(email) = $1 AND (NOT $2 OR is_active)
            "#,
        )
        .bind(&email)
        .bind(active_only)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> ApiResult<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, name, email, password_hash, is_active, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn list_active(&self) -> ApiResult<Vec<UserRecord>> {
        let users = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, name, email, password_hash, is_active, created_at, updated_at
            FROM users
            WHERE is_active
            ORDER BY created_at
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(users)
    }

    async fn deactivate(&self, id: Uuid) -> ApiResult<UserRecord> {
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            UPDATE users
            SET is_active = FALSE, updated_at = now()
            WHERE id = $1
            RETURNING id, name, email, password_hash, is_active, created_at, updated_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
        Ok(user)
    }
}

/// In-memory store used by `AppState::fake()` and the test suites.
#[derive(Default)]
pub struct MemoryStore {
    users: std::sync::Mutex<Vec<UserRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> ApiResult<UserRecord> {
        let email = normalize_email(email);
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == email) {
            return Err(ApiError::Conflict("Email already registered".into()));
        }
        let now = OffsetDateTime::now_utc();
        let user = UserRecord {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
            email,
            password_hash: password_hash.to_string(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn find_by_email(
        &self,
        email: &str,
        active_only: bool,
    ) -> ApiResult<Option<UserRecord>> {
        let email = normalize_email(email);
        let users = self.users.lock().unwrap();
        Ok(users
            .iter()
            .find(|u| u.email == email && (!active_only || u.is_active))
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> ApiResult<Option<UserRecord>> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn list_active(&self) -> ApiResult<Vec<UserRecord>> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().filter(|u| u.is_active).cloned().collect())
    }

    async fn deactivate(&self, id: Uuid) -> ApiResult<UserRecord> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
        user.is_active = false;
        user.updated_at = OffsetDateTime::now_utc();
        Ok(user.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_email_trims_and_lowercases() {
        assert_eq!(normalize_email("  A@X.Com "), "a@x.com");
        assert_eq!(normalize_email("a@x.com"), "a@x.com");
    }

    #[tokio::test]
    async fn create_rejects_duplicate_email_variants() {
        let store = MemoryStore::new();
        store.create("A", "a@x.com", "hash").await.expect("create");

        let err = store.create("B", " A@X.COM ", "hash2").await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn find_by_email_respects_active_only() {
        let store = MemoryStore::new();
        let user = store.create("A", "a@x.com", "hash").await.expect("create");
        store.deactivate(user.id).await.expect("deactivate");

        let found = store.find_by_email("a@x.com", false).await.expect("find");
        assert!(found.is_some());
        let found = store.find_by_email("a@x.com", true).await.expect("find");
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn deactivate_is_idempotent_and_soft() {
        let store = MemoryStore::new();
        let user = store.create("A", "a@x.com", "hash").await.expect("create");

        let first = store.deactivate(user.id).await.expect("first deactivate");
        assert!(!first.is_active);
        let second = store.deactivate(user.id).await.expect("second deactivate");
        assert!(!second.is_active);

        // Record still exists: soft delete only.
        assert!(store.find_by_id(user.id).await.expect("find").is_some());
        assert!(store.list_active().await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn deactivate_unknown_id_is_not_found() {
        let store = MemoryStore::new();
        let err = store.deactivate(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
