use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(pub i64);

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    OrderNew,
    OrderConfirmed,
    OrderPreparing,
    OrderReady,
    OrderOnTheWay,
    OrderCompleted,
    OrderCancelled,
    LowStock,
    System,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(alias = "createdAt", deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Local>,
    #[serde(default, alias = "isRead")]
    pub is_read: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_number: Option<String>,
}

/// Body of `GET /api/notifications/unread/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnreadSummary {
    pub count: u32,
    #[serde(default)]
    pub notifications: Vec<Notification>,
}

/// Body of `GET /api/notifications/`. The backend also sends a `count`,
/// which is only the page length and is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationList {
    #[serde(default)]
    pub notifications: Vec<Notification>,
}

const NAIVE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Accepts RFC 3339 as well as the backend's zone-less `YYYY-mm-dd HH:MM:SS`,
/// which is taken as local time.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Local>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local));
    }
    let naive = NaiveDateTime::parse_from_str(raw, NAIVE_FORMAT).ok()?;
    Local.from_local_datetime(&naive).earliest()
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Local>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("unrecognised timestamp {raw:?}")))
}

#[cfg(test)]
pub(crate) fn sample(id: i64) -> Notification {
    Notification {
        id: NotificationId(id),
        kind: NotificationKind::OrderNew,
        title: format!("Order #{id}"),
        message: "A new order arrived".to_string(),
        created_at: Local::now(),
        is_read: false,
        order_id: Some(id * 10),
        order_number: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn parses_backend_unread_payload() {
        let body = r#"{
            "page": 1,
            "count": 2,
            "notifications": [
                {"id": 7, "type": "order_ready", "title": "Ready", "message": "Pick it up",
                 "created_at": "2025-03-01 14:05:09", "order_id": 3, "order_number": "PR-0003"},
                {"id": 8, "type": "promo_blast", "title": "?", "message": "",
                 "created_at": "2025-03-01T14:05:09Z"}
            ]
        }"#;
        let summary: UnreadSummary = serde_json::from_str(body).unwrap();
        assert_eq!(summary.count, 2);
        let first = &summary.notifications[0];
        assert_eq!(first.id, NotificationId(7));
        assert_eq!(first.kind, NotificationKind::OrderReady);
        assert!(!first.is_read);
        assert_eq!(first.order_number.as_deref(), Some("PR-0003"));
        assert_eq!(first.created_at.year(), 2025);
        assert_eq!(first.created_at.hour(), 14);
        assert_eq!(summary.notifications[1].kind, NotificationKind::Unknown);
    }

    #[test]
    fn accepts_camel_case_aliases() {
        let body = r#"{"notifications": [
            {"id": 1, "type": "system", "title": "t", "message": "m",
             "createdAt": "2025-01-01 00:00:00", "isRead": true}
        ], "count": 1}"#;
        let list: NotificationList = serde_json::from_str(body).unwrap();
        assert!(list.notifications[0].is_read);
    }

    #[test]
    fn rejects_garbage_timestamp() {
        let body = r#"{"id": 1, "type": "system", "title": "t", "created_at": "yesterday"}"#;
        assert!(serde_json::from_str::<Notification>(body).is_err());
    }
}
