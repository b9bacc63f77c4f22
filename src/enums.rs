use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Closed set of notification tags emitted by the marketplace backend.
///
/// Unknown tags decode to [`NotificationType::Default`] so a new server-side
/// type never breaks the inbox.
#[derive(
    Debug,
    Serialize,
    Deserialize,
    Clone,
    Copy,
    Default,
    EnumString,
    Display,
    PartialEq,
    Eq,
    Hash,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    FundingStarted,
    FundingSucceeded,
    FundingFailed,
    FundingDeadlineApproaching,
    ShippingStarted,
    ShippingCompleted,
    PaymentSucceeded,
    PaymentFailed,
    BackingCancelled,
    RefundCompleted,
    NewFollower,
    NewComment,
    QuestionReceived,
    QuestionAnswered,
    ReportReceived,
    ReportResolved,
    #[default]
    #[serde(other)]
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum NotificationCategory {
    Funding,
    Shipping,
    Payment,
    Social,
    Qna,
    Report,
    General,
}

impl NotificationType {
    pub fn category(self) -> NotificationCategory {
        use NotificationType::*;
        match self {
            FundingStarted | FundingSucceeded | FundingFailed | FundingDeadlineApproaching => {
                NotificationCategory::Funding
            }
            ShippingStarted | ShippingCompleted => NotificationCategory::Shipping,
            PaymentSucceeded | PaymentFailed | BackingCancelled | RefundCompleted => {
                NotificationCategory::Payment
            }
            NewFollower | NewComment => NotificationCategory::Social,
            QuestionReceived | QuestionAnswered => NotificationCategory::Qna,
            ReportReceived | ReportResolved => NotificationCategory::Report,
            Default => NotificationCategory::General,
        }
    }
}

#[derive(
    Debug, Serialize, Deserialize, Clone, Copy, EnumString, Display, PartialEq, Eq, Hash,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PushEventKind {
    Created,
    Updated,
    Deleted,
}

#[derive(Debug, Clone, Copy, Default, Display, PartialEq, Eq, Hash)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ChannelState {
    #[default]
    Closed,
    Connecting,
    Open,
    Reconnecting,
}

#[derive(Debug, Clone, Copy, Display, PartialEq, Eq, Hash)]
#[strum(serialize_all = "kebab-case")]
pub enum InboxAction {
    MarkRead,
    MarkAllRead,
    Delete,
    DeleteAll,
}

#[derive(Debug, Clone, Copy, Display, PartialEq, Eq, Hash)]
#[strum(serialize_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Failure,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn unknown_type_decodes_to_default() {
        let parsed: NotificationType = serde_json::from_str("\"SOMETHING_NEW\"").unwrap();
        assert_eq!(parsed, NotificationType::Default);
    }

    #[test]
    fn type_wire_names_are_screaming_snake_case() {
        let parsed: NotificationType = serde_json::from_str("\"SHIPPING_STARTED\"").unwrap();
        assert_eq!(parsed, NotificationType::ShippingStarted);
        assert_eq!(
            NotificationType::FundingDeadlineApproaching.to_string(),
            "FUNDING_DEADLINE_APPROACHING"
        );
    }

    #[test]
    fn shipping_types_share_a_category() {
        assert_eq!(
            NotificationType::ShippingCompleted.category(),
            NotificationCategory::Shipping
        );
        assert_eq!(NotificationType::Default.category(), NotificationCategory::General);
    }

    #[test]
    fn push_event_kind_parses_lowercase() {
        assert_eq!(PushEventKind::from_str("deleted").unwrap(), PushEventKind::Deleted);
        assert!(PushEventKind::from_str("message").is_err());
    }
}
