//! # User Repository
//!
//! Database access layer for the user directory.
//!
//! Users are keyed by email (case-insensitive). Sign-in is the only path that
//! creates end-user rows and it goes through [`UserRepository::upsert`], so a
//! repeated sign-in refreshes the profile instead of creating a duplicate.
//!
//! ## Example
//!
//! ```rust,no_run
//! # use lib_core::model::store::{UserRepository, models::UserForUpsert};
//! # async fn example() -> anyhow::Result<()> {
//! let pool = lib_core::create_in_memory_pool().await?;
//!
//! let identity = UserForUpsert::new("alice@example.com", "github", "12345").name("Alice");
//! let user = UserRepository::upsert(&pool, &identity).await?;
//!
//! let found = UserRepository::find_by_email(&pool, "ALICE@example.com").await?;
//! assert_eq!(found.map(|u| u.id), Some(user.id));
//! # Ok(())
//! # }
//! ```

use super::models::{User, UserForUpsert};
use super::DbPool;
use lib_utils::now_utc;
use sqlx::query_as;
use uuid::Uuid;

const USER_COLUMNS: &str =
    "id, email, name, image_url, provider, provider_account_id, created_at, updated_at";

/// User repository for database operations.
pub struct UserRepository;

impl UserRepository {
    /// Find a user by id.
    pub async fn find_by_id(pool: &DbPool, id: &str) -> Result<Option<User>, sqlx::Error> {
        query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by email, ignoring case.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(User))` - User found with matching email
    /// * `Ok(None)` - No user found with that email
    /// * `Err(sqlx::Error)` - Database error occurred
    pub async fn find_by_email(pool: &DbPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ? COLLATE NOCASE"
        ))
        .bind(email.trim())
        .fetch_optional(pool)
        .await
    }

    /// Insert a user, or update the existing row with the same email.
    ///
    /// On conflict the profile fields and provider link are overwritten with
    /// the new values; `id`, `email` and `created_at` are preserved.
    pub async fn upsert(pool: &DbPool, identity: &UserForUpsert) -> Result<User, sqlx::Error> {
        let now = now_utc();

        query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, email, name, image_url, provider, provider_account_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(email) DO UPDATE SET
                name = excluded.name,
                image_url = excluded.image_url,
                provider = excluded.provider,
                provider_account_id = excluded.provider_account_id,
                updated_at = excluded.updated_at
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4().to_string())
        .bind(identity.email.trim())
        .bind(&identity.name)
        .bind(&identity.image_url)
        .bind(&identity.provider)
        .bind(&identity.provider_account_id)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await
    }

    /// Insert a new user. Fails with a unique violation if the email exists.
    pub async fn insert(pool: &DbPool, identity: &UserForUpsert) -> Result<User, sqlx::Error> {
        let now = now_utc();

        query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, email, name, image_url, provider, provider_account_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4().to_string())
        .bind(identity.email.trim())
        .bind(&identity.name)
        .bind(&identity.image_url)
        .bind(&identity.provider)
        .bind(&identity.provider_account_id)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::store::test_support::setup_test_db;

    async fn count_users(pool: &DbPool) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await
            .unwrap()
    }

    // ========== Upsert Tests ==========

    #[tokio::test]
    async fn test_upsert_creates_user() {
        let pool = setup_test_db().await;
        let identity = UserForUpsert::new("a@x.com", "github", "111")
            .name("Alice")
            .image_url("https://img/a.png");

        let user = UserRepository::upsert(&pool, &identity).await.unwrap();

        assert_eq!(user.email, "a@x.com");
        assert_eq!(user.name.as_deref(), Some("Alice"));
        assert_eq!(user.image_url.as_deref(), Some("https://img/a.png"));
        assert_eq!(user.provider, "github");
        assert_eq!(user.provider_account_id, "111");
        assert!(!user.id.is_empty());
    }

    #[tokio::test]
    async fn test_upsert_twice_keeps_one_row_with_latest_values() {
        let pool = setup_test_db().await;

        let first = UserRepository::upsert(
            &pool,
            &UserForUpsert::new("a@x.com", "github", "111").name("Alice"),
        )
        .await
        .unwrap();

        let second = UserRepository::upsert(
            &pool,
            &UserForUpsert::new("a@x.com", "gitlab", "222").name("Alice B."),
        )
        .await
        .unwrap();

        assert_eq!(count_users(&pool).await, 1);
        assert_eq!(first.id, second.id);
        assert_eq!(second.name.as_deref(), Some("Alice B."));
        assert_eq!(second.provider, "gitlab");
        assert_eq!(second.provider_account_id, "222");
        assert!(second.image_url.is_none());
        assert!(second.updated_at >= first.updated_at);
        assert_eq!(second.created_at, first.created_at);
    }

    #[tokio::test]
    async fn test_upsert_matches_email_case_insensitively() {
        let pool = setup_test_db().await;

        let first = UserRepository::upsert(&pool, &UserForUpsert::new("a@x.com", "github", "111"))
            .await
            .unwrap();
        let second = UserRepository::upsert(&pool, &UserForUpsert::new("A@X.COM", "github", "111"))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(count_users(&pool).await, 1);
    }

    // ========== Lookup Tests ==========

    #[tokio::test]
    async fn test_find_by_email_ignores_case() {
        let pool = setup_test_db().await;
        let user = UserRepository::upsert(&pool, &UserForUpsert::new("Bob@X.com", "github", "2"))
            .await
            .unwrap();

        let found = UserRepository::find_by_email(&pool, "bob@x.COM").await.unwrap();

        assert_eq!(found.expect("user should be found").id, user.id);
    }

    #[tokio::test]
    async fn test_find_by_email_not_found() {
        let pool = setup_test_db().await;

        let found = UserRepository::find_by_email(&pool, "nobody@x.com").await.unwrap();

        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_find_by_id() {
        let pool = setup_test_db().await;
        let user = UserRepository::upsert(&pool, &UserForUpsert::new("a@x.com", "github", "1"))
            .await
            .unwrap();

        assert!(UserRepository::find_by_id(&pool, &user.id).await.unwrap().is_some());
        assert!(UserRepository::find_by_id(&pool, "missing").await.unwrap().is_none());
    }

    // ========== Insert Tests ==========

    #[tokio::test]
    async fn test_insert_duplicate_email_is_unique_violation() {
        let pool = setup_test_db().await;
        let identity = UserForUpsert::new("a@x.com", "github", "1");

        UserRepository::insert(&pool, &identity).await.unwrap();
        let err = UserRepository::insert(&pool, &UserForUpsert::new("A@x.com", "github", "1"))
            .await
            .unwrap_err();

        match err {
            sqlx::Error::Database(db_err) => assert!(db_err.is_unique_violation()),
            other => panic!("expected unique violation, got {other:?}"),
        }
    }
}
