use serde::{Deserialize, Serialize};

use crate::value_objects::{MessageBody, MessageId, Timestamp, UserId};

/// 图片附件引用。
///
/// 附件是短暂资源：任何暴露给客户端的附件引用都必须携带过期时间，
/// 消费方以 `now > expires_at` 判断附件是否已经失效。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub url: String,
    pub expires_at: Timestamp,
}

impl Attachment {
    pub fn new(url: impl Into<String>, expires_at: Timestamp) -> Self {
        Self {
            url: url.into(),
            expires_at,
        }
    }

    pub fn is_expired(&self, now: Timestamp) -> bool {
        now > self.expires_at
    }
}

/// 待持久化的消息。
///
/// id 与 created_at 由持久化层分配，created_at 单调不减。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub sender_id: UserId,
    pub receiver_id: Option<UserId>,
    pub body: MessageBody,
    pub attachment: Option<Attachment>,
    pub is_admin: bool,
}

impl NewMessage {
    pub fn public(sender_id: UserId, body: MessageBody, attachment: Option<Attachment>) -> Self {
        Self {
            sender_id,
            receiver_id: None,
            body,
            attachment,
            is_admin: false,
        }
    }

    pub fn private(
        sender_id: UserId,
        receiver_id: UserId,
        body: MessageBody,
        attachment: Option<Attachment>,
    ) -> Self {
        Self {
            sender_id,
            receiver_id: Some(receiver_id),
            body,
            attachment,
            is_admin: false,
        }
    }

    pub fn from_admin(mut self) -> Self {
        self.is_admin = true;
        self
    }
}

/// 已持久化的消息，创建后不可变。
///
/// receiver_id 缺失表示公共消息。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub sender_id: UserId,
    pub receiver_id: Option<UserId>,
    pub body: MessageBody,
    pub attachment: Option<Attachment>,
    pub is_admin: bool,
    pub created_at: Timestamp,
}

impl Message {
    pub fn from_new(new: NewMessage, id: MessageId, created_at: Timestamp) -> Self {
        Self {
            id,
            sender_id: new.sender_id,
            receiver_id: new.receiver_id,
            body: new.body,
            attachment: new.attachment,
            is_admin: new.is_admin,
            created_at,
        }
    }

    pub fn is_public(&self) -> bool {
        self.receiver_id.is_none()
    }

    /// 消息是否涉及指定的两个用户（任一方向）。
    pub fn is_between(&self, a: UserId, b: UserId) -> bool {
        match self.receiver_id {
            Some(receiver) => {
                (self.sender_id == a && receiver == b) || (self.sender_id == b && receiver == a)
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    #[test]
    fn attachment_expiry_comparison() {
        let now = Utc::now();
        let attachment = Attachment::new("http://blob/img.png", now + Duration::hours(24));

        assert!(!attachment.is_expired(now));
        assert!(!attachment.is_expired(now + Duration::hours(24)));
        assert!(attachment.is_expired(now + Duration::hours(24) + Duration::seconds(1)));
    }

    #[test]
    fn public_message_has_no_receiver() {
        let sender = UserId::from(Uuid::new_v4());
        let new = NewMessage::public(sender, MessageBody::new("hi"), None);
        let message = Message::from_new(new, MessageId::from(Uuid::new_v4()), Utc::now());

        assert!(message.is_public());
        assert_eq!(message.receiver_id, None);
    }

    #[test]
    fn is_between_matches_both_directions() {
        let a = UserId::from(Uuid::new_v4());
        let b = UserId::from(Uuid::new_v4());
        let c = UserId::from(Uuid::new_v4());
        let new = NewMessage::private(a, b, MessageBody::new("psst"), None);
        let message = Message::from_new(new, MessageId::from(Uuid::new_v4()), Utc::now());

        assert!(message.is_between(a, b));
        assert!(message.is_between(b, a));
        assert!(!message.is_between(a, c));
    }

    #[test]
    fn empty_body_without_attachment_is_accepted() {
        let sender = UserId::from(Uuid::new_v4());
        let new = NewMessage::public(sender, MessageBody::default(), None);
        let message = Message::from_new(new, MessageId::from(Uuid::new_v4()), Utc::now());

        assert!(message.body.is_empty());
        assert!(message.attachment.is_none());
    }
}
