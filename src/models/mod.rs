pub mod notification;

pub use notification::{NotificationPatch, NotificationRecord};
