use domain::{Attachment, Contact, Message, ModerationState, Timestamp, User, UserProfile, UserRole};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDto {
    pub id: Uuid,
    pub username: String,
    pub role: UserRole,
    pub moderation: ModerationState,
    pub profile: UserProfile,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<&User> for UserDto {
    fn from(user: &User) -> Self {
        Self {
            id: Uuid::from(user.id),
            username: user.username.as_str().to_owned(),
            role: user.role,
            moderation: user.moderation.clone(),
            profile: user.profile.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageDto {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Option<Uuid>,
    pub body: String,
    pub attachment: Option<Attachment>,
    pub is_admin: bool,
    pub created_at: Timestamp,
}

impl From<&Message> for MessageDto {
    fn from(message: &Message) -> Self {
        Self {
            id: Uuid::from(message.id),
            sender_id: Uuid::from(message.sender_id),
            receiver_id: message.receiver_id.map(Into::into),
            body: message.body.as_str().to_owned(),
            attachment: message.attachment.clone(),
            is_admin: message.is_admin,
            created_at: message.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactDto {
    pub owner_id: Uuid,
    pub friend_id: Uuid,
    pub created_at: Timestamp,
}

impl From<&Contact> for ContactDto {
    fn from(contact: &Contact) -> Self {
        Self {
            owner_id: Uuid::from(contact.owner_id),
            friend_id: Uuid::from(contact.friend_id),
            created_at: contact.created_at,
        }
    }
}
