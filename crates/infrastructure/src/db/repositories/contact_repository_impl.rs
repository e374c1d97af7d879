//! 联系人Repository实现

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use application::repository::ContactRepository;
use domain::{Contact, RepositoryError, UserId};

use crate::db::repositories::map_sqlx_error;
use crate::db::DbPool;

#[derive(Debug, Clone, FromRow)]
struct DbContact {
    pub owner_id: Uuid,
    pub friend_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<DbContact> for Contact {
    fn from(row: DbContact) -> Self {
        Contact {
            owner_id: UserId::from(row.owner_id),
            friend_id: UserId::from(row.friend_id),
            created_at: row.created_at,
        }
    }
}

pub struct PgContactRepository {
    pool: DbPool,
}

impl PgContactRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContactRepository for PgContactRepository {
    async fn upsert(&self, contact: Contact) -> Result<Contact, RepositoryError> {
        let row = sqlx::query_as::<_, DbContact>(
            r#"
            INSERT INTO contacts (owner_id, friend_id, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (owner_id, friend_id) DO UPDATE SET owner_id = EXCLUDED.owner_id
            RETURNING owner_id, friend_id, created_at
            "#,
        )
        .bind(Uuid::from(contact.owner_id))
        .bind(Uuid::from(contact.friend_id))
        .bind(contact.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn delete(&self, owner_id: UserId, friend_id: UserId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM contacts WHERE owner_id = $1 AND friend_id = $2")
            .bind(Uuid::from(owner_id))
            .bind(Uuid::from(friend_id))
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn list_for_owner(&self, owner_id: UserId) -> Result<Vec<Contact>, RepositoryError> {
        let rows = sqlx::query_as::<_, DbContact>(
            r#"
            SELECT owner_id, friend_id, created_at
            FROM contacts WHERE owner_id = $1 ORDER BY created_at
            "#,
        )
        .bind(Uuid::from(owner_id))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
