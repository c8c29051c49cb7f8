//! # Database Store
//!
//! Database connection pool, schema migrations and repository implementations.

// region: --- Modules
pub mod models;
pub mod user_repository;
pub mod conversation_repository;
pub mod message_repository;
// endregion: --- Modules

// region: --- Re-exports
pub use conversation_repository::ConversationRepository;
pub use message_repository::MessageRepository;
pub use user_repository::UserRepository;
// endregion: --- Re-exports

// region: --- Types and Functions
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Type alias for SQLite connection pool.
pub type DbPool = SqlitePool;

/// Create a new SQLite connection pool, creating the database file if missing.
pub async fn create_pool(database_url: &str) -> anyhow::Result<DbPool> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new().connect_with(options).await?;

    Ok(pool)
}

/// Apply the embedded schema migrations.
pub async fn run_migrations(pool: &DbPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Create a migrated, single-connection in-memory database.
///
/// Every SQLite `:memory:` connection is its own database, so the pool is
/// pinned to exactly one connection that is never recycled.
pub async fn create_in_memory_pool() -> anyhow::Result<DbPool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}
// endregion: --- Types and Functions

// region: --- Test Support
#[cfg(test)]
pub(crate) mod test_support {
    use super::models::{User, UserForUpsert};
    use super::{create_in_memory_pool, DbPool, UserRepository};

    pub async fn setup_test_db() -> DbPool {
        create_in_memory_pool()
            .await
            .expect("Failed to create test database")
    }

    pub async fn create_test_user(pool: &DbPool, email: &str, name: &str) -> User {
        let identity = UserForUpsert::new(email, "github", &format!("gh-{email}")).name(name);
        UserRepository::upsert(pool, &identity)
            .await
            .expect("Failed to create test user")
    }
}
// endregion: --- Test Support
