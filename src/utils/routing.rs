use crate::enums::NotificationCategory;
use crate::models::NotificationRecord;

/// Where the presentation layer navigates when an entry is clicked.
pub fn related_route(record: &NotificationRecord) -> &'static str {
    match record.r#type.category() {
        NotificationCategory::Shipping => "/orders/shipping",
        NotificationCategory::Payment => "/orders",
        NotificationCategory::Funding => "/projects/funding",
        NotificationCategory::Qna => "/projects/qna",
        NotificationCategory::Report => "/reports",
        NotificationCategory::Social => "/mypage/follows",
        NotificationCategory::General => "/notifications",
    }
}
