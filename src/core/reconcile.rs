//! User-initiated inbox actions.
//!
//! Each action checks its local precondition, asks the server, and only on
//! success applies the matching store primitive. A failed request leaves the
//! store untouched. The session owner is captured before the request so a
//! confirmation that lands after logout or an account switch is dropped.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::common::NotificationId;
use crate::core::api::NotificationApi;
use crate::core::store::{ScopedStore, StoreHandle};
use crate::enums::{InboxAction, NoticeLevel};
use crate::errors::Error;

const NOTICE_CAPACITY: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The server confirmed and the store was updated.
    Applied,
    /// Nothing to do locally, or the confirmation arrived for a session that
    /// has since ended.
    Skipped,
    /// The server (or the network) refused; the store was not touched.
    Failed,
}

/// Toast-style message for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub action: InboxAction,
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    fn success(action: InboxAction) -> Self {
        let message = match action {
            InboxAction::MarkRead => "Notification marked as read.",
            InboxAction::MarkAllRead => "All notifications marked as read.",
            InboxAction::Delete => "Notification deleted.",
            InboxAction::DeleteAll => "All notifications deleted.",
        };
        Self {
            action,
            level: NoticeLevel::Success,
            message: message.to_string(),
        }
    }

    fn failure(action: InboxAction) -> Self {
        let message = match action {
            InboxAction::MarkRead => "Could not mark the notification as read. Please try again.",
            InboxAction::MarkAllRead => "Could not mark notifications as read. Please try again.",
            InboxAction::Delete => "Could not delete the notification. Please try again.",
            InboxAction::DeleteAll => "Could not delete notifications. Please try again.",
        };
        Self {
            action,
            level: NoticeLevel::Failure,
            message: message.to_string(),
        }
    }
}

pub struct ReconciliationLayer {
    api: Arc<dyn NotificationApi>,
    store: StoreHandle,
    notices: broadcast::Sender<Notice>,
}

impl ReconciliationLayer {
    pub fn new(api: Arc<dyn NotificationApi>, store: StoreHandle) -> Self {
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);
        Self {
            api,
            store,
            notices,
        }
    }

    pub fn subscribe_notices(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }

    fn session(&self, action: InboxAction) -> Option<ScopedStore> {
        let owner = self.store.owner();
        if owner.is_none() {
            tracing::debug!("{action} skipped: no active session");
        }
        owner.map(|user| self.store.scoped(user))
    }

    pub async fn mark_read(&self, id: NotificationId) -> ActionOutcome {
        let action = InboxAction::MarkRead;
        let Some(scope) = self.session(action) else {
            return ActionOutcome::Skipped;
        };
        match self.store.get(id) {
            Some(record) if record.is_unread() => {}
            Some(_) => {
                tracing::debug!("{action} skipped: notification {id} already read");
                return ActionOutcome::Skipped;
            }
            None => {
                tracing::debug!("{action} skipped: notification {id} not in inbox");
                return ActionOutcome::Skipped;
            }
        }

        let result = self.api.mark_read(id).await;
        self.settle(action, result, || scope.mark_read_local(id))
    }

    pub async fn mark_all_read(&self) -> ActionOutcome {
        let action = InboxAction::MarkAllRead;
        let Some(scope) = self.session(action) else {
            return ActionOutcome::Skipped;
        };
        if self.store.unread_count() == 0 {
            tracing::debug!("{action} skipped: nothing unread");
            return ActionOutcome::Skipped;
        }

        let result = self.api.mark_all_read().await;
        self.settle(action, result, || scope.mark_all_read_local())
    }

    pub async fn delete(&self, id: NotificationId) -> ActionOutcome {
        let action = InboxAction::Delete;
        let Some(scope) = self.session(action) else {
            return ActionOutcome::Skipped;
        };
        if self.store.get(id).is_none() {
            tracing::debug!("{action} skipped: notification {id} not in inbox");
            return ActionOutcome::Skipped;
        }

        let result = self.api.delete(id).await;
        self.settle(action, result, || scope.delete_local(id))
    }

    pub async fn delete_all(&self) -> ActionOutcome {
        let action = InboxAction::DeleteAll;
        let Some(scope) = self.session(action) else {
            return ActionOutcome::Skipped;
        };
        if self.store.is_empty() {
            tracing::debug!("{action} skipped: inbox already empty");
            return ActionOutcome::Skipped;
        }

        let result = self.api.delete_all().await;
        self.settle(action, result, || scope.clear())
    }

    fn settle(
        &self,
        action: InboxAction,
        result: Result<(), Error>,
        apply: impl FnOnce() -> Option<bool>,
    ) -> ActionOutcome {
        match result {
            Ok(()) => {
                if apply().is_none() {
                    tracing::debug!("{action} confirmed after the session ended, ignoring");
                    return ActionOutcome::Skipped;
                }
                tracing::info!("{action} confirmed by server");
                self.publish(Notice::success(action));
                ActionOutcome::Applied
            }
            Err(e) => {
                tracing::warn!(code = e.code(), "{action} failed: {e}");
                self.publish(Notice::failure(action));
                ActionOutcome::Failed
            }
        }
    }

    fn publish(&self, notice: Notice) {
        // no subscribers is fine
        let _ = self.notices.send(notice);
    }
}
