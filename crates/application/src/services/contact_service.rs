//! 联系人服务
//!
//! 联系人边是有序对：A 添加 B 不会让 B 看到 A。

use std::sync::Arc;

use domain::{Contact, DomainError, UserId};
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::ChatResult;
use crate::repository::{ContactRepository, UserRepository};

pub struct ContactServiceDependencies {
    pub contacts: Arc<dyn ContactRepository>,
    pub users: Arc<dyn UserRepository>,
    pub clock: Arc<dyn Clock>,
}

pub struct ContactService {
    deps: ContactServiceDependencies,
}

impl ContactService {
    pub fn new(deps: ContactServiceDependencies) -> Self {
        Self { deps }
    }

    /// 添加联系人。目标用户必须存在；重复添加是幂等的。
    pub async fn add_contact(&self, owner_id: Uuid, friend_id: Uuid) -> ChatResult<Contact> {
        let friend_id = UserId::from(friend_id);
        if self.deps.users.find_by_id(friend_id).await?.is_none() {
            return Err(DomainError::UserNotFound.into());
        }

        let contact = Contact::new(UserId::from(owner_id), friend_id, self.deps.clock.now());
        let stored = self.deps.contacts.upsert(contact).await?;
        Ok(stored)
    }

    /// 删除联系人边；边不存在时也视为成功。
    pub async fn delete_contact(&self, owner_id: Uuid, friend_id: Uuid) -> ChatResult<()> {
        self.deps
            .contacts
            .delete(UserId::from(owner_id), UserId::from(friend_id))
            .await?;
        Ok(())
    }

    pub async fn list_contacts(&self, owner_id: Uuid) -> ChatResult<Vec<Contact>> {
        Ok(self
            .deps
            .contacts
            .list_for_owner(UserId::from(owner_id))
            .await?)
    }
}
