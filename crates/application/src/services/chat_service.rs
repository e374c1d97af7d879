//! 消息路由服务
//!
//! 接收公共/私聊消息意图：先过审核拦截，再经外部存储持久化，
//! 最后按注册表扇出投递。持久化与投递之间没有跨调用事务，
//! 唯一的失败窗口是"已持久化、尚未投递"，后续历史查询会补齐。

use std::sync::Arc;

use domain::{Message, MessageBody, NewMessage, UserId};
use uuid::Uuid;

use crate::attachments::EphemeralResourceTracker;
use crate::clock::Clock;
use crate::dto::MessageDto;
use crate::error::ChatResult;
use crate::events::ServerEvent;
use crate::moderation::ModerationGate;
use crate::registry::ConnectionRegistry;
use crate::repository::{MessageRepository, UserRepository};

/// 历史查询默认返回条数。
const DEFAULT_HISTORY_LIMIT: u32 = 100;

#[derive(Debug, Clone)]
pub struct SendPublicRequest {
    pub sender_id: Uuid,
    pub body: String,
    pub attachment_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SendPrivateRequest {
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub body: String,
    pub attachment_url: Option<String>,
}

pub struct ChatServiceDependencies {
    pub users: Arc<dyn UserRepository>,
    pub messages: Arc<dyn MessageRepository>,
    pub registry: Arc<ConnectionRegistry>,
    pub clock: Arc<dyn Clock>,
}

pub struct ChatService {
    gate: ModerationGate,
    messages: Arc<dyn MessageRepository>,
    registry: Arc<ConnectionRegistry>,
    clock: Arc<dyn Clock>,
}

impl ChatService {
    pub fn new(deps: ChatServiceDependencies) -> Self {
        Self {
            gate: ModerationGate::new(deps.users),
            messages: deps.messages,
            registry: deps.registry,
            clock: deps.clock,
        }
    }

    /// 发送公共消息：审核 → 持久化 → 广播到所有在线连接（含发送者）。
    pub async fn send_public(&self, request: SendPublicRequest) -> ChatResult<Message> {
        let sender_id = UserId::from(request.sender_id);
        let sender = self.gate.check(sender_id).await?;

        let attachment = request
            .attachment_url
            .map(|url| EphemeralResourceTracker::stamp(url, self.clock.now()));

        let mut new = NewMessage::public(sender_id, MessageBody::new(request.body), attachment);
        if sender.is_admin() {
            new = new.from_admin();
        }

        let message = self.messages.insert(new).await?;

        let dto = MessageDto::from(&message);
        for handle in self.registry.snapshot().await {
            handle.deliver(ServerEvent::NewPublicMsg(dto.clone()));
        }

        tracing::info!(message_id = %message.id, sender = %message.sender_id, "公共消息已广播");
        Ok(message)
    }

    /// 发送私聊消息：审核 → 持久化 → 投递给接收者（在线时），
    /// 并总是回显给发送者自己的连接（支持多端一致）。
    /// 接收者不在线不是错误：消息已持久化，等待历史查询取回。
    pub async fn send_private(&self, request: SendPrivateRequest) -> ChatResult<Message> {
        let sender_id = UserId::from(request.sender_id);
        let receiver_id = UserId::from(request.receiver_id);
        let sender = self.gate.check(sender_id).await?;

        let attachment = request
            .attachment_url
            .map(|url| EphemeralResourceTracker::stamp(url, self.clock.now()));

        let mut new = NewMessage::private(
            sender_id,
            receiver_id,
            MessageBody::new(request.body),
            attachment,
        );
        if sender.is_admin() {
            new = new.from_admin();
        }

        let message = self.messages.insert(new).await?;
        let dto = MessageDto::from(&message);

        match self.registry.lookup(receiver_id).await {
            Some(receiver_handle) => {
                receiver_handle.deliver(ServerEvent::NewPrivateMsg(dto.clone()));
            }
            None => {
                tracing::debug!(
                    message_id = %message.id,
                    receiver = %receiver_id,
                    "接收者不在线，仅持久化"
                );
            }
        }

        if receiver_id != sender_id {
            if let Some(sender_handle) = self.registry.lookup(sender_id).await {
                sender_handle.deliver(ServerEvent::NewPrivateMsg(dto));
            }
        }

        Ok(message)
    }

    /// 公共历史消息，按创建时间升序。
    pub async fn public_history(&self, limit: Option<u32>) -> ChatResult<Vec<Message>> {
        let limit = limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
        let messages = self.messages.list_public(limit).await?;
        Ok(self.scrub_expired_attachments(messages))
    }

    /// 两个用户之间的私聊历史（双向匹配），按创建时间升序。
    pub async fn private_history(
        &self,
        user_id: Uuid,
        with: Uuid,
        limit: Option<u32>,
    ) -> ChatResult<Vec<Message>> {
        let limit = limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
        let messages = self
            .messages
            .list_private_between(UserId::from(user_id), UserId::from(with), limit)
            .await?;
        Ok(self.scrub_expired_attachments(messages))
    }

    /// 历史回放时把已过期的附件当作不存在。
    fn scrub_expired_attachments(&self, mut messages: Vec<Message>) -> Vec<Message> {
        let now = self.clock.now();
        for message in &mut messages {
            if message
                .attachment
                .as_ref()
                .is_some_and(|attachment| attachment.is_expired(now))
            {
                message.attachment = None;
            }
        }
        messages
    }
}
