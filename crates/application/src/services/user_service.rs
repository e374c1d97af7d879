//! 用户服务
//!
//! 按名字注册（首次注册创建身份，重名返回既有身份）、
//! 管理员拉黑/恢复、个人资料编辑。

use std::sync::Arc;

use domain::{RepositoryError, User, UserId, UserRole, Username};
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::ChatResult;
use crate::events::ServerEvent;
use crate::registry::ConnectionRegistry;
use crate::repository::UserRepository;

#[derive(Debug, Clone)]
pub struct RegisterUserRequest {
    pub username: String,
    pub role: UserRole,
}

pub struct UserServiceDependencies {
    pub users: Arc<dyn UserRepository>,
    pub registry: Arc<ConnectionRegistry>,
    pub clock: Arc<dyn Clock>,
}

pub struct UserService {
    deps: UserServiceDependencies,
}

impl UserService {
    pub fn new(deps: UserServiceDependencies) -> Self {
        Self { deps }
    }

    /// 按名字注册。名字已存在时返回既有用户（身份在首次注册时创建）。
    pub async fn register(&self, request: RegisterUserRequest) -> ChatResult<User> {
        let username = Username::parse(request.username)?;

        if let Some(existing) = self
            .deps
            .users
            .find_by_username(username.clone())
            .await?
        {
            return Ok(existing);
        }

        let now = self.deps.clock.now();
        let user = User::register(
            UserId::from(Uuid::new_v4()),
            username.clone(),
            request.role,
            now,
        );

        match self.deps.users.create(user).await {
            Ok(stored) => {
                tracing::info!(user_id = %stored.id, username = %stored.username, "新用户注册");
                Ok(stored)
            }
            // 并发注册同名时让先到者胜出
            Err(RepositoryError::Conflict) => {
                let existing = self
                    .deps
                    .users
                    .find_by_username(username)
                    .await?
                    .ok_or(RepositoryError::Conflict)?;
                Ok(existing)
            }
            Err(err) => Err(err.into()),
        }
    }

    pub async fn get_user(&self, user_id: Uuid) -> ChatResult<User> {
        let user = self
            .deps
            .users
            .find_by_id(UserId::from(user_id))
            .await?
            .ok_or(domain::DomainError::UserNotFound)?;
        Ok(user)
    }

    pub async fn list_users(&self) -> ChatResult<Vec<User>> {
        Ok(self.deps.users.list().await?)
    }

    /// 管理员设置拉黑状态。reason 为 Some 时拉黑，为 None 时恢复。
    /// 目标用户在线时会收到 `blacklisted` 审核推送。
    pub async fn set_blacklist(
        &self,
        user_id: Uuid,
        reason: Option<String>,
    ) -> ChatResult<User> {
        let mut user = self.get_user(user_id).await?;
        let now = self.deps.clock.now();

        match reason {
            Some(reason) => {
                user.blacklist(reason.clone(), now);
                let updated = self.deps.users.update(user).await?;

                if let Some(handle) = self.deps.registry.lookup(updated.id).await {
                    handle.deliver(ServerEvent::Blacklisted { reason });
                }
                tracing::warn!(user_id = %updated.id, "用户被拉黑");
                Ok(updated)
            }
            None => {
                user.reinstate(now);
                let updated = self.deps.users.update(user).await?;
                tracing::info!(user_id = %updated.id, "用户拉黑已解除");
                Ok(updated)
            }
        }
    }

    /// 用户自助编辑资料，未提供的字段保持不变。
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        avatar_url: Option<String>,
        bio: Option<String>,
    ) -> ChatResult<User> {
        let mut user = self.get_user(user_id).await?;
        user.update_profile(avatar_url, bio, self.deps.clock.now());
        let updated = self.deps.users.update(user).await?;
        Ok(updated)
    }
}
