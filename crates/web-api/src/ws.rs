//! WebSocket 实时通道
//!
//! 连接升级、事件解析与分发。每条连接的事件按到达顺序处理，
//! 不同连接之间不保证相对顺序。

use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    http::StatusCode,
    response::Response,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use application::services::{SendPrivateRequest, SendPublicRequest};
use application::{ConnectionHandle, ContactDto, MessageDto, ServerEvent, UserDto};
use domain::UserId;

use crate::state::AppState;

/// WebSocket连接查询参数
#[derive(Debug, Deserialize)]
pub struct WebSocketQuery {
    pub user_id: Uuid,
}

/// 客户端事件。事件名沿用线上协议。
#[derive(Debug, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
enum ClientEvent {
    SendPublicMsg {
        #[serde(default)]
        body: Option<String>,
        #[serde(default)]
        attachment_url: Option<String>,
    },
    SendPrivateMsg {
        receiver_id: Uuid,
        #[serde(default)]
        body: Option<String>,
        #[serde(default)]
        attachment_url: Option<String>,
    },
    GetHistoryMsgs {
        #[serde(default)]
        with: Option<Uuid>,
        #[serde(default)]
        limit: Option<u32>,
    },
    AddContact {
        friend_id: Uuid,
    },
    DeleteContact {
        friend_id: Uuid,
    },
    GetContacts,
    EditProfile {
        #[serde(default)]
        avatar_url: Option<String>,
        #[serde(default)]
        bio: Option<String>,
    },
}

/// 处理WebSocket连接升级
pub async fn websocket_upgrade(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(query): Query<WebSocketQuery>,
) -> Result<Response, StatusCode> {
    // 连接必须绑定已注册的用户
    if state.user_service.get_user(query.user_id).await.is_err() {
        warn!(user_id = %query.user_id, "WebSocket upgrade rejected: unknown user");
        return Err(StatusCode::UNAUTHORIZED);
    }

    info!(user_id = %query.user_id, "WebSocket upgrade");
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, query.user_id, state)))
}

/// 连接生命周期：Connecting → Online → Disconnected。
async fn handle_socket(socket: WebSocket, user_id: Uuid, state: AppState) {
    let (mut sink, mut stream) = socket.split();

    // 出站通道：注册表句柄写入，发送任务消费
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();
    let handle = ConnectionHandle::new(UserId::from(user_id), tx);

    // Online：注册并广播在线人数
    state.presence.connection_online(handle.clone()).await;

    let send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(json) => {
                    if sink.send(WsMessage::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    error!("failed to serialize server event: {e}");
                    break;
                }
            }
        }
    });

    let recv_state = state.clone();
    let recv_handle = handle.clone();
    let recv_task = tokio::spawn(async move {
        while let Some(frame) = stream.next().await {
            match frame {
                Ok(WsMessage::Text(text)) => {
                    handle_text_frame(&recv_state, &recv_handle, user_id, text.as_str()).await;
                }
                Ok(WsMessage::Close(_)) => {
                    debug!(user_id = %user_id, "client closed connection");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    debug!(user_id = %user_id, "websocket error: {e}");
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = send_task => {}
        _ = recv_task => {}
    }

    // Disconnected（终态）：注销并广播在线人数
    state.presence.connection_closed(&handle).await;
    info!(user_id = %user_id, "WebSocket connection closed");
}

async fn handle_text_frame(state: &AppState, handle: &ConnectionHandle, user_id: Uuid, text: &str) {
    let event: ClientEvent = match serde_json::from_str(text) {
        Ok(event) => event,
        Err(e) => {
            handle.deliver(ServerEvent::MsgError {
                message: format!("malformed event: {e}"),
            });
            return;
        }
    };

    match event {
        ClientEvent::SendPublicMsg {
            body,
            attachment_url,
        } => {
            let result = state
                .chat_service
                .send_public(SendPublicRequest {
                    sender_id: user_id,
                    body: body.unwrap_or_default(),
                    attachment_url,
                })
                .await;
            if let Err(e) = result {
                handle.deliver(ServerEvent::MsgError {
                    message: e.to_string(),
                });
            }
        }
        ClientEvent::SendPrivateMsg {
            receiver_id,
            body,
            attachment_url,
        } => {
            let result = state
                .chat_service
                .send_private(SendPrivateRequest {
                    sender_id: user_id,
                    receiver_id,
                    body: body.unwrap_or_default(),
                    attachment_url,
                })
                .await;
            if let Err(e) = result {
                handle.deliver(ServerEvent::MsgError {
                    message: e.to_string(),
                });
            }
        }
        ClientEvent::GetHistoryMsgs { with, limit } => {
            let result = match with {
                Some(with) => state.chat_service.private_history(user_id, with, limit).await,
                None => state.chat_service.public_history(limit).await,
            };
            match result {
                Ok(messages) => {
                    handle.deliver(ServerEvent::HistoryMsgs(
                        messages.iter().map(MessageDto::from).collect(),
                    ));
                }
                Err(e) => handle.deliver(ServerEvent::MsgError {
                    message: e.to_string(),
                }),
            }
        }
        ClientEvent::AddContact { friend_id } => {
            match state.contact_service.add_contact(user_id, friend_id).await {
                Ok(contact) => {
                    handle.deliver(ServerEvent::ContactAdded(ContactDto::from(&contact)));
                }
                Err(e) => handle.deliver(ServerEvent::MsgError {
                    message: e.to_string(),
                }),
            }
        }
        ClientEvent::DeleteContact { friend_id } => {
            match state.contact_service.delete_contact(user_id, friend_id).await {
                Ok(()) => handle.deliver(ServerEvent::ContactDeleted { friend_id }),
                Err(e) => handle.deliver(ServerEvent::MsgError {
                    message: e.to_string(),
                }),
            }
        }
        ClientEvent::GetContacts => {
            match state.contact_service.list_contacts(user_id).await {
                Ok(contacts) => handle.deliver(ServerEvent::ContactsList(
                    contacts.iter().map(ContactDto::from).collect(),
                )),
                Err(e) => handle.deliver(ServerEvent::MsgError {
                    message: e.to_string(),
                }),
            }
        }
        ClientEvent::EditProfile { avatar_url, bio } => {
            match state
                .user_service
                .update_profile(user_id, avatar_url, bio)
                .await
            {
                Ok(user) => handle.deliver(ServerEvent::ProfileUpdated(UserDto::from(&user))),
                Err(e) => handle.deliver(ServerEvent::ProfileError {
                    message: e.to_string(),
                }),
            }
        }
    }
}
