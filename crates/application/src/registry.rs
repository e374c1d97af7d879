//! 在线连接注册表
//!
//! 用户身份到活跃连接句柄的映射，同一用户最多保留一个连接，
//! 后连接的会话覆盖先前的（last-connect-wins）。
//! 注册表是进程内唯一的共享可变结构，所有访问都经过内部锁同步，
//! 原始映射不对外暴露。

use std::collections::HashMap;

use domain::UserId;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use crate::events::ServerEvent;

/// 活跃连接句柄。
///
/// 每个句柄对应一条 WebSocket 连接的出站通道；投递是尽力而为的，
/// 对端已经关闭时静默丢弃。
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    connection_id: Uuid,
    user_id: UserId,
    sender: mpsc::UnboundedSender<ServerEvent>,
}

impl ConnectionHandle {
    pub fn new(user_id: UserId, sender: mpsc::UnboundedSender<ServerEvent>) -> Self {
        Self {
            connection_id: Uuid::new_v4(),
            user_id,
            sender,
        }
    }

    pub fn connection_id(&self) -> Uuid {
        self.connection_id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// 向连接投递一个事件。
    pub fn deliver(&self, event: ServerEvent) {
        if self.sender.send(event).is_err() {
            tracing::debug!(
                connection_id = %self.connection_id,
                user_id = %self.user_id,
                "连接已关闭，事件被丢弃"
            );
        }
    }
}

/// 在线连接注册表
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<UserId, ConnectionHandle>>,
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// 注册连接：插入或替换该用户的映射。
    /// 同一用户已有旧连接时，旧句柄被静默覆盖，注册表本身不主动关闭它。
    pub async fn register(&self, handle: ConnectionHandle) {
        let mut connections = self.connections.write().await;
        if let Some(prior) = connections.insert(handle.user_id(), handle) {
            tracing::debug!(
                user_id = %prior.user_id(),
                superseded = %prior.connection_id(),
                "同一用户的新连接覆盖旧连接"
            );
        }
    }

    /// 注销连接：仅当存储的句柄与传入句柄是同一条连接时移除，
    /// 否则不做任何事。迟到的断开事件不会误删同一用户的新连接。
    pub async fn unregister(&self, handle: &ConnectionHandle) {
        let mut connections = self.connections.write().await;
        if let Some(stored) = connections.get(&handle.user_id()) {
            if stored.connection_id() == handle.connection_id() {
                connections.remove(&handle.user_id());
            }
        }
    }

    pub async fn lookup(&self, user_id: UserId) -> Option<ConnectionHandle> {
        let connections = self.connections.read().await;
        connections.get(&user_id).cloned()
    }

    /// 当前注册的去重用户数。
    pub async fn count(&self) -> usize {
        let connections = self.connections.read().await;
        connections.len()
    }

    /// 广播用的一致性快照。
    pub async fn snapshot(&self) -> Vec<ConnectionHandle> {
        let connections = self.connections.read().await;
        connections.values().cloned().collect()
    }
}
