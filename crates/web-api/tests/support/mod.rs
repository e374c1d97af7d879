#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream,
};
use uuid::Uuid;

use application::repository::memory::{
    InMemoryContactRepository, InMemoryMessageRepository, InMemoryUserRepository,
};
use application::{
    services::{
        ChatService, ChatServiceDependencies, ContactService, ContactServiceDependencies,
        UserService, UserServiceDependencies,
    },
    ConnectionRegistry, PresenceBroadcaster, SystemClock,
};
use infrastructure::LocalDiskBlobStore;
use web_api::{router, AppState};

pub const TEST_ADMIN_SECRET: &str = "integration-test-admin-secret";

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// 用内存存储搭建完整路由。
pub fn build_router() -> Router {
    let users = Arc::new(InMemoryUserRepository::new());
    let messages = Arc::new(InMemoryMessageRepository::new());
    let contacts = Arc::new(InMemoryContactRepository::new());

    let clock: Arc<dyn application::Clock> = Arc::new(SystemClock);
    let registry = Arc::new(ConnectionRegistry::new());
    let presence = Arc::new(PresenceBroadcaster::new(registry.clone()));

    let blob_root = std::env::temp_dir().join(format!("chatline-test-{}", Uuid::new_v4()));
    let blob_store = Arc::new(LocalDiskBlobStore::new(
        blob_root,
        "http://localhost/uploads",
    ));

    let user_service = UserService::new(UserServiceDependencies {
        users: users.clone(),
        registry: registry.clone(),
        clock: clock.clone(),
    });

    let chat_service = ChatService::new(ChatServiceDependencies {
        users: users.clone(),
        messages,
        registry: registry.clone(),
        clock: clock.clone(),
    });

    let contact_service = ContactService::new(ContactServiceDependencies {
        contacts,
        users,
        clock,
    });

    let state = AppState::new(
        Arc::new(user_service),
        Arc::new(chat_service),
        Arc::new(contact_service),
        presence,
        registry,
        blob_store,
        TEST_ADMIN_SECRET,
    );

    router(state)
}

/// 在随机端口启动服务器。
pub async fn spawn_server() -> SocketAddr {
    let app = build_router();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    addr
}

/// 通过 HTTP 注册用户，返回分配的 id。
pub async fn register_user(client: &reqwest::Client, addr: SocketAddr, username: &str) -> Uuid {
    let response = client
        .post(format!("http://{addr}/api/v1/register"))
        .json(&serde_json::json!({ "username": username }))
        .send()
        .await
        .expect("register request");
    assert!(response.status().is_success(), "register failed");

    let body: serde_json::Value = response.json().await.unwrap();
    body["id"].as_str().unwrap().parse().unwrap()
}

/// 建立 WebSocket 连接。
pub async fn connect_ws(addr: SocketAddr, user_id: Uuid) -> WsClient {
    let (ws, _) = connect_async(format!("ws://{addr}/ws?user_id={user_id}"))
        .await
        .expect("websocket connect");
    ws
}

/// 发送一个客户端事件。
pub async fn send_event(ws: &mut WsClient, event: serde_json::Value) {
    ws.send(Message::Text(event.to_string().into()))
        .await
        .expect("send event");
}

/// 读取下一个服务端事件。
pub async fn recv_event(ws: &mut WsClient) -> serde_json::Value {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for event")
            .expect("connection closed")
            .expect("websocket error");

        if let Message::Text(text) = frame {
            return serde_json::from_str(text.as_str()).expect("event is json");
        }
    }
}

/// 跳过无关事件，直到收到指定名称的事件。
pub async fn wait_for(ws: &mut WsClient, event_name: &str) -> serde_json::Value {
    for _ in 0..20 {
        let event = recv_event(ws).await;
        if event["event"] == event_name {
            return event;
        }
    }
    panic!("event {event_name} not received");
}
