use serde::{Deserialize, Serialize};

use crate::value_objects::{Timestamp, UserId, Username};

/// 用户角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Normal,
    Admin,
}

/// 用户审核状态
///
/// 被拉黑的用户在发送消息时会被统一拦截，拦截发生在持久化之前。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ModerationState {
    Active,
    Blacklisted { reason: String },
}

/// 用户个人资料（头像引用与签名）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: Username,
    pub role: UserRole,
    pub moderation: ModerationState,
    pub profile: UserProfile,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl User {
    /// 首次按名字注册时创建用户。
    pub fn register(id: UserId, username: Username, role: UserRole, now: Timestamp) -> Self {
        Self {
            id,
            username,
            role,
            moderation: ModerationState::Active,
            profile: UserProfile::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// 管理员拉黑操作。
    pub fn blacklist(&mut self, reason: impl Into<String>, now: Timestamp) {
        self.moderation = ModerationState::Blacklisted {
            reason: reason.into(),
        };
        self.updated_at = now;
    }

    /// 解除拉黑。
    pub fn reinstate(&mut self, now: Timestamp) {
        self.moderation = ModerationState::Active;
        self.updated_at = now;
    }

    pub fn update_profile(
        &mut self,
        avatar_url: Option<String>,
        bio: Option<String>,
        now: Timestamp,
    ) {
        if let Some(avatar) = avatar_url {
            self.profile.avatar_url = Some(avatar);
        }
        if let Some(bio) = bio {
            self.profile.bio = Some(bio);
        }
        self.updated_at = now;
    }

    pub fn is_blacklisted(&self) -> bool {
        matches!(self.moderation, ModerationState::Blacklisted { .. })
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// 拉黑原因，未拉黑时为空。
    pub fn blacklist_reason(&self) -> Option<&str> {
        match &self.moderation {
            ModerationState::Blacklisted { reason } => Some(reason),
            ModerationState::Active => None,
        }
    }
}
