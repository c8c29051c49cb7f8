//! # Message Repository
//!
//! Messages are append-only. Appending a message and bumping the parent
//! conversation's `updated_at` happen in a single transaction.

use super::models::{Message, MessageWithAuthor, UserProfile};
use super::DbPool;
use chrono::{DateTime, Utc};
use lib_utils::now_utc;
use sqlx::{query_as, FromRow};
use uuid::Uuid;

#[derive(FromRow)]
struct MessageAuthorRow {
    id: i64,
    s_id: String,
    content: String,
    author_id: String,
    conversation_id: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    author_email: Option<String>,
    author_name: Option<String>,
    author_image_url: Option<String>,
}

impl From<MessageAuthorRow> for MessageWithAuthor {
    fn from(row: MessageAuthorRow) -> Self {
        let author = row.author_email.map(|email| UserProfile {
            id: row.author_id.clone(),
            email,
            name: row.author_name,
            image_url: row.author_image_url,
        });

        MessageWithAuthor {
            message: Message {
                id: row.id,
                s_id: row.s_id,
                content: row.content,
                author_id: row.author_id,
                conversation_id: row.conversation_id,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            author,
        }
    }
}

/// Message repository for database operations.
pub struct MessageRepository;

impl MessageRepository {
    /// Append a message and mark the conversation as active.
    ///
    /// Content is stored exactly as given.
    pub async fn append(
        pool: &DbPool,
        conversation_id: &str,
        author_id: &str,
        content: &str,
    ) -> Result<Message, sqlx::Error> {
        let now = now_utc();
        let mut tx = pool.begin().await?;

        let message = query_as::<_, Message>(
            r#"
            INSERT INTO messages (s_id, content, author_id, conversation_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id, s_id, content, author_id, conversation_id, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(content)
        .bind(author_id)
        .bind(conversation_id)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE conversations SET updated_at = ? WHERE id = ?")
            .bind(now)
            .bind(conversation_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(message)
    }

    /// All messages of a conversation in chronological order, with authors.
    ///
    /// Ties on `created_at` are broken by insertion order.
    pub async fn list_for_conversation(
        pool: &DbPool,
        conversation_id: &str,
    ) -> Result<Vec<MessageWithAuthor>, sqlx::Error> {
        let rows = query_as::<_, MessageAuthorRow>(
            r#"
            SELECT m.id, m.s_id, m.content, m.author_id, m.conversation_id, m.created_at, m.updated_at,
                   u.email AS author_email, u.name AS author_name, u.image_url AS author_image_url
            FROM messages m
            LEFT JOIN users u ON u.id = m.author_id
            WHERE m.conversation_id = ?
            ORDER BY m.created_at ASC, m.id ASC
            "#,
        )
        .bind(conversation_id)
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(MessageWithAuthor::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::store::test_support::{create_test_user, setup_test_db};
    use crate::model::store::ConversationRepository;

    #[tokio::test]
    async fn test_append_bumps_conversation_activity() {
        let pool = setup_test_db().await;
        let alice = create_test_user(&pool, "a@x.com", "Alice").await;
        let created = ConversationRepository::create_with_participants(&pool, None, &[&alice.id])
            .await
            .unwrap();

        let message = MessageRepository::append(&pool, created.id(), &alice.id, "  hello  ")
            .await
            .unwrap();

        assert_eq!(message.content, "  hello  ");
        assert_eq!(message.author_id, alice.id);
        assert!(!message.s_id.is_empty());

        let conversation = ConversationRepository::find_by_id(&pool, created.id())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(conversation.updated_at, message.created_at);
        assert!(conversation.updated_at >= created.conversation.updated_at);
    }

    #[tokio::test]
    async fn test_append_to_missing_conversation_fails() {
        let pool = setup_test_db().await;
        let alice = create_test_user(&pool, "a@x.com", "Alice").await;

        let result = MessageRepository::append(&pool, "missing", &alice.id, "hi").await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_list_for_conversation_in_order_with_authors() {
        let pool = setup_test_db().await;
        let alice = create_test_user(&pool, "a@x.com", "Alice").await;
        let bob = create_test_user(&pool, "b@x.com", "Bob").await;
        let created =
            ConversationRepository::create_with_participants(&pool, None, &[&alice.id, &bob.id])
                .await
                .unwrap();
        let other = ConversationRepository::create_with_participants(&pool, None, &[&alice.id])
            .await
            .unwrap();

        MessageRepository::append(&pool, created.id(), &alice.id, "one").await.unwrap();
        MessageRepository::append(&pool, created.id(), &bob.id, "two").await.unwrap();
        MessageRepository::append(&pool, other.id(), &alice.id, "elsewhere").await.unwrap();
        MessageRepository::append(&pool, created.id(), &alice.id, "three").await.unwrap();

        let listed = MessageRepository::list_for_conversation(&pool, created.id()).await.unwrap();

        let contents: Vec<&str> = listed.iter().map(|m| m.message.content.as_str()).collect();
        assert_eq!(contents, vec!["one", "two", "three"]);

        let bob_author = listed[1].author.as_ref().expect("author should be joined");
        assert_eq!(bob_author.id, bob.id);
        assert_eq!(bob_author.name.as_deref(), Some("Bob"));
    }

    #[tokio::test]
    async fn test_list_for_empty_conversation() {
        let pool = setup_test_db().await;

        let listed = MessageRepository::list_for_conversation(&pool, "missing").await.unwrap();

        assert!(listed.is_empty());
    }
}
