//! 消息Repository实现

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use application::repository::MessageRepository;
use domain::{
    Attachment, Message, MessageBody, MessageId, NewMessage, RepositoryError, UserId,
};

use crate::db::repositories::map_sqlx_error;
use crate::db::DbPool;

/// 数据库消息模型
#[derive(Debug, Clone, FromRow)]
struct DbMessage {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Option<Uuid>,
    pub body: String,
    pub attachment_url: Option<String>,
    pub attachment_expires_at: Option<DateTime<Utc>>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl From<DbMessage> for Message {
    fn from(row: DbMessage) -> Self {
        let attachment = match (row.attachment_url, row.attachment_expires_at) {
            (Some(url), Some(expires_at)) => Some(Attachment::new(url, expires_at)),
            _ => None,
        };

        Message {
            id: MessageId::from(row.id),
            sender_id: UserId::from(row.sender_id),
            receiver_id: row.receiver_id.map(UserId::from),
            body: MessageBody::new(row.body),
            attachment,
            is_admin: row.is_admin,
            created_at: row.created_at,
        }
    }
}

/// 消息Repository实现
///
/// id 与 created_at 由数据库分配（gen_random_uuid / now）。
pub struct PgMessageRepository {
    pool: DbPool,
}

impl PgMessageRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    async fn insert(&self, message: NewMessage) -> Result<Message, RepositoryError> {
        let (attachment_url, attachment_expires_at) = match &message.attachment {
            Some(attachment) => (Some(attachment.url.clone()), Some(attachment.expires_at)),
            None => (None, None),
        };

        let row = sqlx::query_as::<_, DbMessage>(
            r#"
            INSERT INTO messages (sender_id, receiver_id, body, attachment_url, attachment_expires_at, is_admin)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, sender_id, receiver_id, body, attachment_url, attachment_expires_at, is_admin, created_at
            "#,
        )
        .bind(Uuid::from(message.sender_id))
        .bind(message.receiver_id.map(Uuid::from))
        .bind(message.body.as_str())
        .bind(attachment_url)
        .bind(attachment_expires_at)
        .bind(message.is_admin)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn list_public(&self, limit: u32) -> Result<Vec<Message>, RepositoryError> {
        let rows = sqlx::query_as::<_, DbMessage>(
            r#"
            SELECT id, sender_id, receiver_id, body, attachment_url, attachment_expires_at, is_admin, created_at
            FROM messages
            WHERE receiver_id IS NULL
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        // 取最近 limit 条，再转为升序供展示
        let mut messages: Vec<Message> = rows.into_iter().map(Into::into).collect();
        messages.reverse();
        Ok(messages)
    }

    async fn list_private_between(
        &self,
        a: UserId,
        b: UserId,
        limit: u32,
    ) -> Result<Vec<Message>, RepositoryError> {
        let rows = sqlx::query_as::<_, DbMessage>(
            r#"
            SELECT id, sender_id, receiver_id, body, attachment_url, attachment_expires_at, is_admin, created_at
            FROM messages
            WHERE (sender_id = $1 AND receiver_id = $2)
               OR (sender_id = $2 AND receiver_id = $1)
            ORDER BY created_at DESC
            LIMIT $3
            "#,
        )
        .bind(Uuid::from(a))
        .bind(Uuid::from(b))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let mut messages: Vec<Message> = rows.into_iter().map(Into::into).collect();
        messages.reverse();
        Ok(messages)
    }
}
