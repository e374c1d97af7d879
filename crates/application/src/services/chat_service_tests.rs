//! 消息路由服务单元测试
//!
//! 覆盖审核拦截、持久化、公共广播与私聊投递的核心行为。

use std::sync::Arc;

use chrono::Utc;
use domain::{User, UserId, UserRole, Username};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::clock::SystemClock;
use crate::error::ChatError;
use crate::events::ServerEvent;
use crate::registry::{ConnectionHandle, ConnectionRegistry};
use crate::repository::memory::{InMemoryMessageRepository, InMemoryUserRepository};
use crate::repository::{MessageRepository, UserRepository};
use crate::services::chat_service::{
    ChatService, ChatServiceDependencies, SendPrivateRequest, SendPublicRequest,
};

struct TestSetup {
    service: ChatService,
    users: Arc<InMemoryUserRepository>,
    messages: Arc<InMemoryMessageRepository>,
    registry: Arc<ConnectionRegistry>,
}

fn build_service() -> TestSetup {
    let users = Arc::new(InMemoryUserRepository::new());
    let messages = Arc::new(InMemoryMessageRepository::new());
    let registry = Arc::new(ConnectionRegistry::new());

    let service = ChatService::new(ChatServiceDependencies {
        users: users.clone(),
        messages: messages.clone(),
        registry: registry.clone(),
        clock: Arc::new(SystemClock),
    });

    TestSetup {
        service,
        users,
        messages,
        registry,
    }
}

async fn create_user(users: &InMemoryUserRepository, name: &str, role: UserRole) -> Uuid {
    let user = User::register(
        UserId::from(Uuid::new_v4()),
        Username::parse(name).unwrap(),
        role,
        Utc::now(),
    );
    let stored = users.create(user).await.unwrap();
    Uuid::from(stored.id)
}

async fn connect(
    registry: &ConnectionRegistry,
    user_id: Uuid,
) -> mpsc::UnboundedReceiver<ServerEvent> {
    let (tx, rx) = mpsc::unbounded_channel();
    registry
        .register(ConnectionHandle::new(UserId::from(user_id), tx))
        .await;
    rx
}

fn drain(rx: &mut mpsc::UnboundedReceiver<ServerEvent>) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn public_message_reaches_every_connection_including_sender() {
    let setup = build_service();
    let alice = create_user(&setup.users, "alice", UserRole::Normal).await;
    let bob = create_user(&setup.users, "bob", UserRole::Normal).await;

    let mut alice_rx = connect(&setup.registry, alice).await;
    let mut bob_rx = connect(&setup.registry, bob).await;

    setup
        .service
        .send_public(SendPublicRequest {
            sender_id: alice,
            body: "hi".to_owned(),
            attachment_url: None,
        })
        .await
        .unwrap();

    for rx in [&mut alice_rx, &mut bob_rx] {
        let events = drain(rx);
        assert_eq!(events.len(), 1);
        match &events[0] {
            ServerEvent::NewPublicMsg(dto) => {
                assert_eq!(dto.sender_id, alice);
                assert_eq!(dto.body, "hi");
                assert_eq!(dto.receiver_id, None);
            }
            other => panic!("expected NewPublicMsg, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn public_send_then_history_returns_single_entry() {
    let setup = build_service();
    let alice = create_user(&setup.users, "alice", UserRole::Normal).await;

    setup
        .service
        .send_public(SendPublicRequest {
            sender_id: alice,
            body: "hi".to_owned(),
            attachment_url: None,
        })
        .await
        .unwrap();

    let history = setup.service.public_history(None).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(Uuid::from(history[0].sender_id), alice);
    assert_eq!(history[0].body.as_str(), "hi");
    assert!(history[0].receiver_id.is_none());
}

#[tokio::test]
async fn blacklisted_sender_is_rejected_before_persistence() {
    let setup = build_service();
    let alice = create_user(&setup.users, "alice", UserRole::Normal).await;
    let bob = create_user(&setup.users, "bob", UserRole::Normal).await;

    // 拉黑 bob
    let mut bob_user = setup
        .users
        .find_by_id(UserId::from(bob))
        .await
        .unwrap()
        .unwrap();
    bob_user.blacklist("spam", Utc::now());
    setup.users.update(bob_user).await.unwrap();

    let mut alice_rx = connect(&setup.registry, alice).await;

    let result = setup
        .service
        .send_public(SendPublicRequest {
            sender_id: bob,
            body: "buy now".to_owned(),
            attachment_url: None,
        })
        .await;

    match result {
        Err(ChatError::Blacklisted { reason }) => assert_eq!(reason, "spam"),
        other => panic!("expected Blacklisted, got {other:?}"),
    }

    // 既没有持久化，也没有广播
    assert!(setup.service.public_history(None).await.unwrap().is_empty());
    assert!(drain(&mut alice_rx).is_empty());
}

#[tokio::test]
async fn private_message_to_offline_receiver_is_persisted_with_single_echo() {
    let setup = build_service();
    let alice = create_user(&setup.users, "alice", UserRole::Normal).await;
    let bob = create_user(&setup.users, "bob", UserRole::Normal).await;

    let mut alice_rx = connect(&setup.registry, alice).await;
    // bob 不在线

    setup
        .service
        .send_private(SendPrivateRequest {
            sender_id: alice,
            receiver_id: bob,
            body: "psst".to_owned(),
            attachment_url: None,
        })
        .await
        .unwrap();

    // 恰好一次投递：发送者自己的回显
    let events = drain(&mut alice_rx);
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], ServerEvent::NewPrivateMsg(_)));

    // 历史查询可以取回
    let history = setup.service.private_history(bob, alice, None).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].body.as_str(), "psst");
}

#[tokio::test]
async fn private_message_with_both_online_delivers_exactly_twice() {
    let setup = build_service();
    let alice = create_user(&setup.users, "alice", UserRole::Normal).await;
    let bob = create_user(&setup.users, "bob", UserRole::Normal).await;

    let mut alice_rx = connect(&setup.registry, alice).await;
    let mut bob_rx = connect(&setup.registry, bob).await;

    setup
        .service
        .send_private(SendPrivateRequest {
            sender_id: alice,
            receiver_id: bob,
            body: "psst".to_owned(),
            attachment_url: None,
        })
        .await
        .unwrap();

    let alice_events = drain(&mut alice_rx);
    let bob_events = drain(&mut bob_rx);
    assert_eq!(alice_events.len(), 1);
    assert_eq!(bob_events.len(), 1);
    assert!(matches!(alice_events[0], ServerEvent::NewPrivateMsg(_)));
    assert!(matches!(bob_events[0], ServerEvent::NewPrivateMsg(_)));
}

#[tokio::test]
async fn attachment_is_stamped_with_expiry_on_send() {
    let setup = build_service();
    let alice = create_user(&setup.users, "alice", UserRole::Normal).await;

    let before = Utc::now();
    let message = setup
        .service
        .send_public(SendPublicRequest {
            sender_id: alice,
            body: String::new(),
            attachment_url: Some("http://blob/cat.png".to_owned()),
        })
        .await
        .unwrap();
    let after = Utc::now();

    let attachment = message.attachment.expect("attachment expected");
    assert_eq!(attachment.url, "http://blob/cat.png");
    let ttl = chrono::Duration::hours(24);
    assert!(attachment.expires_at >= before + ttl);
    assert!(attachment.expires_at <= after + ttl);
}

#[tokio::test]
async fn admin_sender_marks_message() {
    let setup = build_service();
    let root = create_user(&setup.users, "root", UserRole::Admin).await;

    let message = setup
        .service
        .send_public(SendPublicRequest {
            sender_id: root,
            body: "notice".to_owned(),
            attachment_url: None,
        })
        .await
        .unwrap();

    assert!(message.is_admin);
}

#[tokio::test]
async fn history_treats_expired_attachment_as_gone() {
    let setup = build_service();
    let alice = create_user(&setup.users, "alice", UserRole::Normal).await;

    // 直接写入一条附件早已过期的消息
    let expired = domain::Attachment::new("http://blob/old.png", Utc::now() - chrono::Duration::hours(48));
    setup
        .messages
        .insert(domain::NewMessage::public(
            UserId::from(alice),
            domain::MessageBody::new("old pic"),
            Some(expired),
        ))
        .await
        .unwrap();

    let history = setup.service.public_history(None).await.unwrap();
    assert_eq!(history.len(), 1);
    assert!(history[0].attachment.is_none());
}

#[tokio::test]
async fn unknown_sender_is_not_a_moderation_denial() {
    let setup = build_service();

    let result = setup
        .service
        .send_public(SendPublicRequest {
            sender_id: Uuid::new_v4(),
            body: "hi".to_owned(),
            attachment_url: None,
        })
        .await;

    match result {
        Err(ChatError::Domain(domain::DomainError::UserNotFound)) => {}
        other => panic!("expected UserNotFound, got {other:?}"),
    }
}
