mod common;

use std::sync::Arc;

use common::*;
use funding_inbox_sync::common::UserId;
use funding_inbox_sync::core::reconcile::{ActionOutcome, ReconciliationLayer};
use funding_inbox_sync::core::store::StoreHandle;
use funding_inbox_sync::enums::{InboxAction, NoticeLevel};

fn signed_in() -> (Arc<FakeApi>, StoreHandle, Arc<ReconciliationLayer>) {
    let api = Arc::new(FakeApi::default());
    let store = StoreHandle::new();
    store.begin_session(UserId(7));
    store.set_all(vec![record(1, false), record(2, true), record(3, false)]);
    let layer = Arc::new(ReconciliationLayer::new(api.clone(), store.clone()));
    (api, store, layer)
}

#[tokio::test]
async fn mark_read_applies_after_confirmation() {
    let (api, store, layer) = signed_in();
    let mut notices = layer.subscribe_notices();

    assert_eq!(layer.mark_read(1).await, ActionOutcome::Applied);

    assert!(store.get(1).unwrap().is_read);
    assert_eq!(store.unread_count(), 1);
    assert_eq!(api.calls(), vec!["mark_read:1"]);
    let notice = notices.try_recv().unwrap();
    assert_eq!(notice.action, InboxAction::MarkRead);
    assert_eq!(notice.level, NoticeLevel::Success);
}

#[tokio::test]
async fn rejected_action_leaves_store_untouched() {
    let (api, store, layer) = signed_in();
    api.reject_actions(true);
    let mut notices = layer.subscribe_notices();
    let before = store.records();
    let view = store.view();

    assert_eq!(layer.mark_read(1).await, ActionOutcome::Failed);
    assert_eq!(layer.mark_all_read().await, ActionOutcome::Failed);
    assert_eq!(layer.delete(3).await, ActionOutcome::Failed);
    assert_eq!(layer.delete_all().await, ActionOutcome::Failed);

    assert_eq!(store.records(), before);
    assert_eq!(store.view(), view);
    for _ in 0..4 {
        assert_eq!(notices.try_recv().unwrap().level, NoticeLevel::Failure);
    }
}

#[tokio::test]
async fn preconditions_skip_the_request() {
    let (api, _store, layer) = signed_in();

    assert_eq!(layer.mark_read(2).await, ActionOutcome::Skipped);
    assert_eq!(layer.mark_read(99).await, ActionOutcome::Skipped);
    assert_eq!(layer.delete(99).await, ActionOutcome::Skipped);

    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn bulk_actions_skip_when_nothing_to_do() {
    let api = Arc::new(FakeApi::default());
    let store = StoreHandle::new();
    store.begin_session(UserId(7));
    let layer = ReconciliationLayer::new(api.clone(), store.clone());

    assert_eq!(layer.mark_all_read().await, ActionOutcome::Skipped);
    assert_eq!(layer.delete_all().await, ActionOutcome::Skipped);

    store.set_all(vec![record(1, true)]);
    assert_eq!(layer.mark_all_read().await, ActionOutcome::Skipped);
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn no_session_means_no_request() {
    let api = Arc::new(FakeApi::default());
    let store = StoreHandle::new();
    let layer = ReconciliationLayer::new(api.clone(), store);

    assert_eq!(layer.mark_read(1).await, ActionOutcome::Skipped);
    assert_eq!(layer.delete_all().await, ActionOutcome::Skipped);
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn mark_all_read_and_deletes_apply() {
    let (api, store, layer) = signed_in();

    assert_eq!(layer.mark_all_read().await, ActionOutcome::Applied);
    assert_eq!(store.unread_count(), 0);

    assert_eq!(layer.delete(2).await, ActionOutcome::Applied);
    assert_eq!(ids(&store), vec![3, 1]);

    assert_eq!(layer.delete_all().await, ActionOutcome::Applied);
    assert!(store.is_empty());
    assert_eq!(store.owner(), Some(UserId(7)));

    assert_eq!(api.calls(), vec!["mark_all_read", "delete:2", "delete_all"]);
}

#[tokio::test]
async fn push_delete_during_mark_read_is_not_undone() {
    let (api, store, layer) = signed_in();
    api.pause();

    let pending = tokio::spawn({
        let layer = layer.clone();
        async move { layer.mark_read(1).await }
    });
    eventually(|| api.calls().len() == 1).await;

    store.scoped(UserId(7)).delete_local(1);
    api.resume();

    assert_eq!(pending.await.unwrap(), ActionOutcome::Applied);
    assert!(store.get(1).is_none());
    assert_eq!(ids(&store), vec![3, 2]);
}

#[tokio::test]
async fn confirmation_after_logout_is_ignored() {
    let (api, store, layer) = signed_in();
    let mut notices = layer.subscribe_notices();
    api.pause();

    let pending = tokio::spawn({
        let layer = layer.clone();
        async move { layer.mark_all_read().await }
    });
    eventually(|| api.calls().len() == 1).await;

    store.clear();
    store.begin_session(UserId(8));
    store.set_all(vec![record(1, false)]);
    api.resume();

    assert_eq!(pending.await.unwrap(), ActionOutcome::Skipped);
    assert_eq!(store.unread_count(), 1);
    assert_eq!(store.owner(), Some(UserId(8)));
    assert!(notices.try_recv().is_err());
}
