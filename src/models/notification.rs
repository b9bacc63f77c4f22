use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::NotificationId;
use crate::enums::NotificationType;
use crate::utils::time::{deserialize_optional_timestamp, deserialize_timestamp};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    pub id: NotificationId,
    #[serde(default)]
    pub r#type: NotificationType,
    pub message: String,
    #[serde(default)]
    pub is_read: bool,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
}

impl NotificationRecord {
    pub fn is_unread(&self) -> bool {
        !self.is_read
    }
}

/// Partial view of a notification used for field-level merges.
///
/// Only `id` is mandatory. Absent fields leave the stored record untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPatch {
    pub id: NotificationId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r#type: Option<NotificationType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_read: Option<bool>,
    #[serde(
        default,
        deserialize_with = "deserialize_optional_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

impl NotificationPatch {
    pub fn new(id: NotificationId) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    pub fn read_status(id: NotificationId, is_read: bool) -> Self {
        Self {
            id,
            is_read: Some(is_read),
            ..Self::default()
        }
    }

    /// Builds a full record when the patch carries everything an insert needs.
    pub fn to_record(&self) -> Option<NotificationRecord> {
        Some(NotificationRecord {
            id: self.id,
            r#type: self.r#type.unwrap_or_default(),
            message: self.message.clone()?,
            is_read: self.is_read.unwrap_or(false),
            created_at: self.created_at?,
        })
    }

    /// Overwrites the mutable fields present in the patch. `message` and
    /// `created_at` never change after creation. Returns whether anything changed.
    pub fn apply_to(&self, record: &mut NotificationRecord) -> bool {
        let mut changed = false;

        if let Some(is_read) = self.is_read {
            if record.is_read != is_read {
                record.is_read = is_read;
                changed = true;
            }
        }
        if let Some(r#type) = self.r#type {
            if record.r#type != r#type {
                record.r#type = r#type;
                changed = true;
            }
        }

        changed
    }
}

impl From<NotificationRecord> for NotificationPatch {
    fn from(record: NotificationRecord) -> Self {
        Self {
            id: record.id,
            r#type: Some(record.r#type),
            message: Some(record.message),
            is_read: Some(record.is_read),
            created_at: Some(record.created_at),
        }
    }
}
