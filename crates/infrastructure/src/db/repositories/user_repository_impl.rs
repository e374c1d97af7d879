//! 用户Repository实现

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use application::repository::UserRepository;
use domain::{
    ModerationState, RepositoryError, User, UserId, UserProfile, UserRole, Username,
};

use crate::db::repositories::map_sqlx_error;
use crate::db::DbPool;

/// 数据库用户模型
#[derive(Debug, Clone, FromRow)]
struct DbUser {
    pub id: Uuid,
    pub username: String,
    pub role: String,
    pub status: String,
    pub blacklist_reason: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DbUser> for User {
    type Error = RepositoryError;

    fn try_from(row: DbUser) -> Result<Self, Self::Error> {
        let username = Username::parse(row.username)
            .map_err(|e| RepositoryError::storage(format!("invalid username in db: {e}")))?;

        let role = match row.role.as_str() {
            "admin" => UserRole::Admin,
            _ => UserRole::Normal,
        };

        let moderation = match row.status.as_str() {
            "blacklisted" => ModerationState::Blacklisted {
                reason: row.blacklist_reason.unwrap_or_default(),
            },
            _ => ModerationState::Active,
        };

        Ok(User {
            id: UserId::from(row.id),
            username,
            role,
            moderation,
            profile: UserProfile {
                avatar_url: row.avatar_url,
                bio: row.bio,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn role_str(role: UserRole) -> &'static str {
    match role {
        UserRole::Admin => "admin",
        UserRole::Normal => "normal",
    }
}

fn status_parts(moderation: &ModerationState) -> (&'static str, Option<&str>) {
    match moderation {
        ModerationState::Active => ("active", None),
        ModerationState::Blacklisted { reason } => ("blacklisted", Some(reason.as_str())),
    }
}

/// 用户Repository实现
pub struct PgUserRepository {
    pool: DbPool,
}

impl PgUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: User) -> Result<User, RepositoryError> {
        let (status, blacklist_reason) = status_parts(&user.moderation);

        let row = sqlx::query_as::<_, DbUser>(
            r#"
            INSERT INTO users (id, username, role, status, blacklist_reason, avatar_url, bio, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, username, role, status, blacklist_reason, avatar_url, bio, created_at, updated_at
            "#,
        )
        .bind(Uuid::from(user.id))
        .bind(user.username.as_str())
        .bind(role_str(user.role))
        .bind(status)
        .bind(blacklist_reason)
        .bind(&user.profile.avatar_url)
        .bind(&user.profile.bio)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.try_into()
    }

    async fn update(&self, user: User) -> Result<User, RepositoryError> {
        let (status, blacklist_reason) = status_parts(&user.moderation);

        let row = sqlx::query_as::<_, DbUser>(
            r#"
            UPDATE users
            SET username = $2, role = $3, status = $4, blacklist_reason = $5,
                avatar_url = $6, bio = $7, updated_at = $8
            WHERE id = $1
            RETURNING id, username, role, status, blacklist_reason, avatar_url, bio, created_at, updated_at
            "#,
        )
        .bind(Uuid::from(user.id))
        .bind(user.username.as_str())
        .bind(role_str(user.role))
        .bind(status)
        .bind(blacklist_reason)
        .bind(&user.profile.avatar_url)
        .bind(&user.profile.bio)
        .bind(user.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, DbUser>(
            r#"
            SELECT id, username, role, status, blacklist_reason, avatar_url, bio, created_at, updated_at
            FROM users WHERE id = $1
            "#,
        )
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(TryInto::try_into).transpose()
    }

    async fn find_by_username(
        &self,
        username: Username,
    ) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, DbUser>(
            r#"
            SELECT id, username, role, status, blacklist_reason, avatar_url, bio, created_at, updated_at
            FROM users WHERE username = $1
            "#,
        )
        .bind(username.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list(&self) -> Result<Vec<User>, RepositoryError> {
        let rows = sqlx::query_as::<_, DbUser>(
            r#"
            SELECT id, username, role, status, blacklist_reason, avatar_url, bio, created_at, updated_at
            FROM users ORDER BY created_at
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}
