//! 审核拦截
//!
//! 在动作被接受之前同步检查发起者的拉黑状态。
//! 查询本身失败时返回的是基础设施错误，与审核拒绝严格区分，
//! 调用方不得把两者混为一谈。

use std::sync::Arc;

use domain::{DomainError, User, UserId};

use crate::error::{ChatError, ChatResult};
use crate::repository::UserRepository;

pub struct ModerationGate {
    users: Arc<dyn UserRepository>,
}

impl ModerationGate {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// 检查用户是否允许执行动作，通过时返回该用户。
    ///
    /// - 被拉黑 ⇒ `ChatError::Blacklisted`（携带原因）
    /// - 用户不存在 ⇒ `ChatError::Domain(UserNotFound)`
    /// - 查询失败 ⇒ `ChatError::Repository`
    pub async fn check(&self, user_id: UserId) -> ChatResult<User> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(DomainError::UserNotFound)?;

        if let Some(reason) = user.blacklist_reason() {
            return Err(ChatError::blacklisted(reason));
        }

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockUserRepository;
    use chrono::Utc;
    use domain::{RepositoryError, UserRole, Username};
    use uuid::Uuid;

    fn active_user(id: UserId) -> User {
        User::register(id, Username::parse("alice").unwrap(), UserRole::Normal, Utc::now())
    }

    #[tokio::test]
    async fn active_user_passes() {
        let id = UserId::from(Uuid::new_v4());
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .returning(move |id| Ok(Some(active_user(id))));

        let gate = ModerationGate::new(Arc::new(users));
        let user = gate.check(id).await.unwrap();
        assert_eq!(user.id, id);
    }

    #[tokio::test]
    async fn blacklisted_user_is_denied_with_reason() {
        let id = UserId::from(Uuid::new_v4());
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().returning(move |id| {
            let mut user = active_user(id);
            user.blacklist("spam", Utc::now());
            Ok(Some(user))
        });

        let gate = ModerationGate::new(Arc::new(users));
        match gate.check(id).await {
            Err(ChatError::Blacklisted { reason }) => assert_eq!(reason, "spam"),
            other => panic!("expected Blacklisted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn lookup_failure_is_not_reported_as_denial() {
        let id = UserId::from(Uuid::new_v4());
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .returning(|_| Err(RepositoryError::storage("connection refused")));

        let gate = ModerationGate::new(Arc::new(users));
        match gate.check(id).await {
            Err(ChatError::Repository(RepositoryError::Storage { .. })) => {}
            other => panic!("expected Repository error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_user_is_distinct_from_denial() {
        let id = UserId::from(Uuid::new_v4());
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().returning(|_| Ok(None));

        let gate = ModerationGate::new(Arc::new(users));
        match gate.check(id).await {
            Err(ChatError::Domain(DomainError::UserNotFound)) => {}
            other => panic!("expected UserNotFound, got {other:?}"),
        }
    }
}
