//! 外部存储契约
//!
//! 核心引擎对持久化是无感的：这里的 trait 是与外部耐久存储之间的
//! 全部约定，任何一次调用都是一个挂起点。

use async_trait::async_trait;
use domain::{Contact, Message, NewMessage, RepositoryError, User, UserId, Username};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: User) -> Result<User, RepositoryError>;
    async fn update(&self, user: User) -> Result<User, RepositoryError>;
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;
    async fn find_by_username(&self, username: Username) -> Result<Option<User>, RepositoryError>;
    async fn list(&self) -> Result<Vec<User>, RepositoryError>;
}

#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// 持久化消息，由存储层分配 id 与单调不减的创建时间。
    async fn insert(&self, message: NewMessage) -> Result<Message, RepositoryError>;

    /// 公共消息（无接收者），按创建时间升序。
    async fn list_public(&self, limit: u32) -> Result<Vec<Message>, RepositoryError>;

    /// 两个用户之间的私聊消息（双向匹配），按创建时间升序。
    async fn list_private_between(
        &self,
        a: UserId,
        b: UserId,
        limit: u32,
    ) -> Result<Vec<Message>, RepositoryError>;
}

#[async_trait]
pub trait ContactRepository: Send + Sync {
    async fn upsert(&self, contact: Contact) -> Result<Contact, RepositoryError>;

    /// 删除联系人边；目标不存在时视为成功。
    async fn delete(&self, owner_id: UserId, friend_id: UserId) -> Result<(), RepositoryError>;

    async fn list_for_owner(&self, owner_id: UserId) -> Result<Vec<Contact>, RepositoryError>;
}

/// 内存实现（用于测试和无数据库运行）
pub mod memory {
    use super::*;
    use std::collections::HashMap;

    use chrono::Utc;
    use domain::{MessageId, Timestamp};
    use tokio::sync::RwLock;
    use uuid::Uuid;

    #[derive(Default)]
    pub struct InMemoryUserRepository {
        users: RwLock<HashMap<UserId, User>>,
    }

    impl InMemoryUserRepository {
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl UserRepository for InMemoryUserRepository {
        async fn create(&self, user: User) -> Result<User, RepositoryError> {
            let mut users = self.users.write().await;
            if users.values().any(|u| u.username == user.username) {
                return Err(RepositoryError::Conflict);
            }
            users.insert(user.id, user.clone());
            Ok(user)
        }

        async fn update(&self, user: User) -> Result<User, RepositoryError> {
            let mut users = self.users.write().await;
            if !users.contains_key(&user.id) {
                return Err(RepositoryError::NotFound);
            }
            users.insert(user.id, user.clone());
            Ok(user)
        }

        async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
            let users = self.users.read().await;
            Ok(users.get(&id).cloned())
        }

        async fn find_by_username(
            &self,
            username: Username,
        ) -> Result<Option<User>, RepositoryError> {
            let users = self.users.read().await;
            Ok(users.values().find(|u| u.username == username).cloned())
        }

        async fn list(&self) -> Result<Vec<User>, RepositoryError> {
            let users = self.users.read().await;
            let mut all: Vec<User> = users.values().cloned().collect();
            all.sort_by_key(|u| u.created_at);
            Ok(all)
        }
    }

    pub struct InMemoryMessageRepository {
        messages: RwLock<Vec<Message>>,
        last_created_at: RwLock<Option<Timestamp>>,
    }

    impl Default for InMemoryMessageRepository {
        fn default() -> Self {
            Self::new()
        }
    }

    impl InMemoryMessageRepository {
        pub fn new() -> Self {
            Self {
                messages: RwLock::new(Vec::new()),
                last_created_at: RwLock::new(None),
            }
        }

        /// 分配单调不减的创建时间。
        async fn next_timestamp(&self) -> Timestamp {
            let mut last = self.last_created_at.write().await;
            let now = Utc::now();
            let assigned = match *last {
                Some(prev) if prev > now => prev,
                _ => now,
            };
            *last = Some(assigned);
            assigned
        }
    }

    #[async_trait]
    impl MessageRepository for InMemoryMessageRepository {
        async fn insert(&self, message: NewMessage) -> Result<Message, RepositoryError> {
            let created_at = self.next_timestamp().await;
            let stored =
                Message::from_new(message, MessageId::from(Uuid::new_v4()), created_at);
            let mut messages = self.messages.write().await;
            messages.push(stored.clone());
            Ok(stored)
        }

        async fn list_public(&self, limit: u32) -> Result<Vec<Message>, RepositoryError> {
            let messages = self.messages.read().await;
            let mut public: Vec<Message> = messages
                .iter()
                .filter(|m| m.is_public())
                .cloned()
                .collect();
            public.sort_by_key(|m| m.created_at);
            truncate_tail(&mut public, limit);
            Ok(public)
        }

        async fn list_private_between(
            &self,
            a: UserId,
            b: UserId,
            limit: u32,
        ) -> Result<Vec<Message>, RepositoryError> {
            let messages = self.messages.read().await;
            let mut between: Vec<Message> = messages
                .iter()
                .filter(|m| m.is_between(a, b))
                .cloned()
                .collect();
            between.sort_by_key(|m| m.created_at);
            truncate_tail(&mut between, limit);
            Ok(between)
        }
    }

    /// 保留最近的 limit 条（升序排列的尾部）。
    fn truncate_tail(messages: &mut Vec<Message>, limit: u32) {
        let limit = limit as usize;
        if messages.len() > limit {
            messages.drain(..messages.len() - limit);
        }
    }

    #[derive(Default)]
    pub struct InMemoryContactRepository {
        contacts: RwLock<HashMap<(UserId, UserId), Contact>>,
    }

    impl InMemoryContactRepository {
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl ContactRepository for InMemoryContactRepository {
        async fn upsert(&self, contact: Contact) -> Result<Contact, RepositoryError> {
            let mut contacts = self.contacts.write().await;
            contacts.insert((contact.owner_id, contact.friend_id), contact.clone());
            Ok(contact)
        }

        async fn delete(
            &self,
            owner_id: UserId,
            friend_id: UserId,
        ) -> Result<(), RepositoryError> {
            let mut contacts = self.contacts.write().await;
            contacts.remove(&(owner_id, friend_id));
            Ok(())
        }

        async fn list_for_owner(&self, owner_id: UserId) -> Result<Vec<Contact>, RepositoryError> {
            let contacts = self.contacts.read().await;
            let mut owned: Vec<Contact> = contacts
                .values()
                .filter(|c| c.owner_id == owner_id)
                .cloned()
                .collect();
            owned.sort_by_key(|c| c.created_at);
            Ok(owned)
        }
    }
}
