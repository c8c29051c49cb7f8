//! # Conversation Repository
//!
//! Conversations and their membership join table.
//!
//! A conversation and its initial participants are written in one transaction,
//! so readers never observe a conversation without members. Membership is
//! unique per `(conversation_id, user_id)`; adding an existing member is a no-op.
//!
//! [`ConversationRepository::find_or_create_shared`] takes the SQLite write
//! lock up front (`BEGIN IMMEDIATE`), so concurrent callers looking for the
//! same pair serialise and agree on one conversation.

use std::collections::HashMap;

use super::models::{
    Conversation, ConversationParticipant, ConversationWithParticipants, UserProfile,
};
use super::DbPool;
use lib_utils::now_utc;
use sqlx::{query_as, FromRow, Sqlite, SqliteConnection};
use uuid::Uuid;

#[derive(FromRow)]
struct ParticipantRow {
    conversation_id: String,
    id: String,
    email: String,
    name: Option<String>,
    image_url: Option<String>,
}

impl ParticipantRow {
    fn into_parts(self) -> (String, UserProfile) {
        (
            self.conversation_id,
            UserProfile {
                id: self.id,
                email: self.email,
                name: self.name,
                image_url: self.image_url,
            },
        )
    }
}

async fn fetch_participants<'e, E>(
    executor: E,
    conversation_id: &str,
) -> Result<Vec<UserProfile>, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let rows = query_as::<_, ParticipantRow>(
        r#"
        SELECT p.conversation_id, u.id, u.email, u.name, u.image_url
        FROM conversation_participants p
        JOIN users u ON u.id = p.user_id
        WHERE p.conversation_id = ?
        ORDER BY p.id ASC
        "#,
    )
    .bind(conversation_id)
    .fetch_all(executor)
    .await?;

    Ok(rows.into_iter().map(|row| row.into_parts().1).collect())
}

async fn insert_participant(
    conn: &mut SqliteConnection,
    conversation_id: &str,
    user_id: &str,
) -> Result<Option<ConversationParticipant>, sqlx::Error> {
    let now = now_utc();

    query_as::<_, ConversationParticipant>(
        r#"
        INSERT INTO conversation_participants (conversation_id, user_id, created_at, updated_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(conversation_id, user_id) DO NOTHING
        RETURNING id, conversation_id, user_id, created_at, updated_at
        "#,
    )
    .bind(conversation_id)
    .bind(user_id)
    .bind(now)
    .bind(now)
    .fetch_optional(conn)
    .await
}

async fn insert_with_participants(
    conn: &mut SqliteConnection,
    title: Option<&str>,
    user_ids: &[&str],
) -> Result<ConversationWithParticipants, sqlx::Error> {
    let now = now_utc();

    let conversation = query_as::<_, Conversation>(
        r#"
        INSERT INTO conversations (id, title, created_at, updated_at)
        VALUES (?, ?, ?, ?)
        RETURNING id, title, created_at, updated_at
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(title)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;

    for user_id in user_ids {
        insert_participant(&mut *conn, &conversation.id, user_id).await?;
    }

    let participants = fetch_participants(&mut *conn, &conversation.id).await?;

    Ok(ConversationWithParticipants {
        conversation,
        participants,
    })
}

async fn shared_conversation_id<'e, E>(
    executor: E,
    user_a: &str,
    user_b: &str,
) -> Result<Option<String>, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query_scalar::<_, String>(
        r#"
        SELECT a.conversation_id
        FROM conversation_participants a
        JOIN conversation_participants b ON b.conversation_id = a.conversation_id
        JOIN conversations c ON c.id = a.conversation_id
        WHERE a.user_id = ? AND b.user_id = ?
        ORDER BY c.updated_at DESC, c.id ASC
        LIMIT 1
        "#,
    )
    .bind(user_a)
    .bind(user_b)
    .fetch_optional(executor)
    .await
}

/// Conversation repository for database operations.
pub struct ConversationRepository;

impl ConversationRepository {
    /// Create a conversation and its participant rows atomically.
    ///
    /// Duplicate ids in `user_ids` are collapsed by the membership unique index.
    pub async fn create_with_participants(
        pool: &DbPool,
        title: Option<&str>,
        user_ids: &[&str],
    ) -> Result<ConversationWithParticipants, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let created = insert_with_participants(&mut tx, title, user_ids).await?;
        tx.commit().await?;

        Ok(created)
    }

    /// Conversation shared by `user_a` and `user_b`, created with `members`
    /// when they have none.
    ///
    /// An existing conversation gets any of `members` it lacks. The lookup and
    /// the writes run in one `BEGIN IMMEDIATE` transaction. The flag is `true`
    /// when the conversation was created.
    pub async fn find_or_create_shared(
        pool: &DbPool,
        user_a: &str,
        user_b: &str,
        members: &[&str],
    ) -> Result<(ConversationWithParticipants, bool), sqlx::Error> {
        let mut tx = pool.begin_with("BEGIN IMMEDIATE").await?;

        let Some(id) = shared_conversation_id(&mut *tx, user_a, user_b).await? else {
            let created = insert_with_participants(&mut tx, None, members).await?;
            tx.commit().await?;
            return Ok((created, true));
        };

        for user_id in members {
            insert_participant(&mut tx, &id, user_id).await?;
        }

        let conversation = query_as::<_, Conversation>(
            "SELECT id, title, created_at, updated_at FROM conversations WHERE id = ?",
        )
        .bind(&id)
        .fetch_one(&mut *tx)
        .await?;
        let participants = fetch_participants(&mut *tx, &id).await?;
        tx.commit().await?;

        Ok((
            ConversationWithParticipants {
                conversation,
                participants,
            },
            false,
        ))
    }

    /// Find a conversation row by id.
    pub async fn find_by_id(pool: &DbPool, id: &str) -> Result<Option<Conversation>, sqlx::Error> {
        query_as::<_, Conversation>(
            "SELECT id, title, created_at, updated_at FROM conversations WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Whether `user_id` is a member of `conversation_id`.
    ///
    /// `false` both for non-members and for conversations that do not exist.
    pub async fn is_participant(
        pool: &DbPool,
        conversation_id: &str,
        user_id: &str,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM conversation_participants
                WHERE conversation_id = ? AND user_id = ?
            )
            "#,
        )
        .bind(conversation_id)
        .bind(user_id)
        .fetch_one(pool)
        .await
    }

    /// All conversations `user_id` belongs to, most recently active first,
    /// each with its participants resolved.
    pub async fn list_for_user(
        pool: &DbPool,
        user_id: &str,
    ) -> Result<Vec<ConversationWithParticipants>, sqlx::Error> {
        // One read transaction so both queries see the same snapshot.
        let mut tx = pool.begin().await?;

        let conversations = query_as::<_, Conversation>(
            r#"
            SELECT c.id, c.title, c.created_at, c.updated_at
            FROM conversations c
            JOIN conversation_participants p ON p.conversation_id = c.id
            WHERE p.user_id = ?
            ORDER BY c.updated_at DESC, c.id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await?;

        let rows = query_as::<_, ParticipantRow>(
            r#"
            SELECT p.conversation_id, u.id, u.email, u.name, u.image_url
            FROM conversation_participants p
            JOIN users u ON u.id = p.user_id
            WHERE p.conversation_id IN (
                SELECT conversation_id FROM conversation_participants WHERE user_id = ?
            )
            ORDER BY p.id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        let mut by_conversation: HashMap<String, Vec<UserProfile>> = HashMap::new();
        for row in rows {
            let (conversation_id, profile) = row.into_parts();
            by_conversation.entry(conversation_id).or_default().push(profile);
        }

        Ok(conversations
            .into_iter()
            .map(|conversation| {
                let participants = by_conversation.remove(&conversation.id).unwrap_or_default();
                ConversationWithParticipants {
                    conversation,
                    participants,
                }
            })
            .collect())
    }
}
