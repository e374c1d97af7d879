//! 附件过期标记
//!
//! 上传的图片是短暂资源，固定存活 24 小时。这里只负责在创建时刻
//! 计算并附加正确的过期时间；过期附件的清理交给外部对象存储或
//! 独立的清理进程。

use chrono::Duration;
use domain::{Attachment, Timestamp};

/// 附件固定存活时长（小时）。
pub const ATTACHMENT_TTL_HOURS: i64 = 24;

pub struct EphemeralResourceTracker;

impl EphemeralResourceTracker {
    /// 计算过期时间：创建时刻 + 24h。纯时间运算，与时区无关。
    pub fn expiry_for(created_at: Timestamp) -> Timestamp {
        created_at + Duration::hours(ATTACHMENT_TTL_HOURS)
    }

    /// 为附件引用打上过期时间。
    pub fn stamp(url: impl Into<String>, created_at: Timestamp) -> Attachment {
        Attachment::new(url, Self::expiry_for(created_at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn expiry_is_exactly_24_hours_after_creation() {
        let created = Utc.with_ymd_and_hms(2024, 3, 10, 23, 30, 0).unwrap();
        let expiry = EphemeralResourceTracker::expiry_for(created);
        assert_eq!(expiry - created, Duration::hours(24));
        assert_eq!(expiry, Utc.with_ymd_and_hms(2024, 3, 11, 23, 30, 0).unwrap());
    }

    #[test]
    fn stamp_attaches_expiry_to_reference() {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let attachment = EphemeralResourceTracker::stamp("http://blob/cat.png", created);

        assert_eq!(attachment.url, "http://blob/cat.png");
        assert!(!attachment.is_expired(created + Duration::hours(24)));
        assert!(attachment.is_expired(created + Duration::hours(24) + Duration::seconds(1)));
    }
}
