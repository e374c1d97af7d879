//! 实时事件定义
//!
//! 推送给客户端连接的事件载荷。事件名沿用线上协议，
//! 替换现网服务时必须保持兼容。

use serde::{Deserialize, Serialize};

use crate::dto::{ContactDto, MessageDto, UserDto};

/// 服务端推送事件
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// 新公共消息
    NewPublicMsg(MessageDto),
    /// 新私聊消息
    NewPrivateMsg(MessageDto),
    /// 历史消息查询结果
    HistoryMsgs(Vec<MessageDto>),
    /// 联系人添加成功
    ContactAdded(ContactDto),
    /// 联系人删除成功
    ContactDeleted { friend_id: uuid::Uuid },
    /// 联系人列表查询结果
    ContactsList(Vec<ContactDto>),
    /// 个人资料更新成功
    ProfileUpdated(UserDto),
    /// 审核推送：当前用户被拉黑
    Blacklisted { reason: String },
    /// 在线人数聚合
    OnlineCount { count: usize },
    /// 消息通道错误
    MsgError { message: String },
    /// 资料通道错误
    ProfileError { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_names_are_wire_compatible() {
        let event = ServerEvent::OnlineCount { count: 3 };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "online-count");
        assert_eq!(json["data"]["count"], 3);

        let event = ServerEvent::Blacklisted {
            reason: "spam".to_owned(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "blacklisted");

        let event = ServerEvent::MsgError {
            message: "boom".to_owned(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "msg-error");
    }
}
