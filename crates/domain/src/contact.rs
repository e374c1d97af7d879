use serde::{Deserialize, Serialize};

use crate::value_objects::{Timestamp, UserId};

/// 联系人关系边：(owner, friend) 有序对，按对唯一。
///
/// 关系不对称：A 添加 B 不会让 B 的联系人列表出现 A。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub owner_id: UserId,
    pub friend_id: UserId,
    pub created_at: Timestamp,
}

impl Contact {
    pub fn new(owner_id: UserId, friend_id: UserId, created_at: Timestamp) -> Self {
        Self {
            owner_id,
            friend_id,
            created_at,
        }
    }
}
