//! 在线状态广播
//!
//! 连接生命周期：Connecting → Online → Disconnected（终态）。
//! 进入 Online 时注册连接并向所有连接广播在线人数，
//! 进入 Disconnected 时注销并再次广播。这两次广播是仅有的可观察副作用。

use std::sync::Arc;

use crate::events::ServerEvent;
use crate::registry::{ConnectionHandle, ConnectionRegistry};

pub struct PresenceBroadcaster {
    registry: Arc<ConnectionRegistry>,
}

impl PresenceBroadcaster {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// 连接转入 Online。
    pub async fn connection_online(&self, handle: ConnectionHandle) {
        tracing::info!(user_id = %handle.user_id(), "用户上线");
        self.registry.register(handle).await;
        self.broadcast_online_count().await;
    }

    /// 连接转入 Disconnected。
    pub async fn connection_closed(&self, handle: &ConnectionHandle) {
        tracing::info!(user_id = %handle.user_id(), "用户下线");
        self.registry.unregister(handle).await;
        self.broadcast_online_count().await;
    }

    /// 向所有连接广播当前在线人数。
    /// 人数取自同一份快照，与收到事件的连接集合保持一致。
    async fn broadcast_online_count(&self) {
        let snapshot = self.registry.snapshot().await;
        let count = snapshot.len();
        for handle in snapshot {
            handle.deliver(ServerEvent::OnlineCount { count });
        }
    }
}
