use crate::common::{NotificationId, UserId};

pub const NOTIFICATIONS_PATH: &str = "/api/notifications";
pub const REQUEST_ID_HEADER: &str = "x-request-id";
pub const EVENT_STREAM_CONTENT_TYPE: &str = "text/event-stream";

/// SSE event names the server uses for connection bookkeeping rather than inbox changes.
pub const CONTROL_EVENTS: [&str; 3] = ["connect", "heartbeat", "ping"];

pub fn notification_path(id: NotificationId) -> String {
    format!("{NOTIFICATIONS_PATH}/{id}")
}

pub fn mark_read_path(id: NotificationId) -> String {
    format!("{NOTIFICATIONS_PATH}/{id}/read")
}

pub fn mark_all_read_path() -> String {
    format!("{NOTIFICATIONS_PATH}/read-all")
}

pub fn subscribe_path(user: UserId) -> String {
    format!("{NOTIFICATIONS_PATH}/subscribe/{user}")
}
