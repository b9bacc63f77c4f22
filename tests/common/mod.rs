#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use futures::channel::mpsc;
use funding_inbox_sync::common::{NotificationId, UserId};
use funding_inbox_sync::config::SyncConfig;
use funding_inbox_sync::core::api::NotificationApi;
use funding_inbox_sync::core::push::{PushStream, PushTransport, RawPushEvent};
use funding_inbox_sync::core::store::{StoreHandle, StoreView};
use funding_inbox_sync::enums::NotificationType;
use funding_inbox_sync::errors::Error;
use funding_inbox_sync::models::NotificationRecord;
use serde_json::json;
use tokio::sync::watch;

pub const WAIT: Duration = Duration::from_secs(5);

pub type EventSender = mpsc::UnboundedSender<Result<RawPushEvent, Error>>;

pub fn fast_config() -> SyncConfig {
    SyncConfig {
        request_timeout_secs: 1,
        reconnect_base_delay_ms: 1,
        reconnect_max_delay_ms: 5,
    }
}

pub fn record(id: NotificationId, is_read: bool) -> NotificationRecord {
    NotificationRecord {
        id,
        r#type: NotificationType::FundingSucceeded,
        message: format!("notification {id}"),
        is_read,
        created_at: Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
            + chrono::Duration::minutes(id),
    }
}

pub fn created(record: &NotificationRecord) -> RawPushEvent {
    RawPushEvent::new(
        "message",
        json!({ "kind": "created", "notification": record }).to_string(),
    )
}

pub fn marked_read(id: NotificationId) -> RawPushEvent {
    RawPushEvent::new("updated", json!({ "id": id, "isRead": true }).to_string())
}

pub fn deleted(id: NotificationId) -> RawPushEvent {
    RawPushEvent::new("deleted", id.to_string())
}

pub fn ids(store: &StoreHandle) -> Vec<NotificationId> {
    store.records().iter().map(|r| r.id).collect()
}

pub async fn wait_for_view(store: &StoreHandle, check: impl FnMut(&StoreView) -> bool) {
    let mut rx = store.subscribe();
    tokio::time::timeout(WAIT, rx.wait_for(check))
        .await
        .expect("timed out waiting for store")
        .expect("store dropped");
}

pub async fn eventually(mut check: impl FnMut() -> bool) {
    tokio::time::timeout(WAIT, async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition never became true");
}

/// In-memory notification resource with switchable failures and a pause gate.
pub struct FakeApi {
    snapshots: Mutex<HashMap<UserId, Vec<NotificationRecord>>>,
    reject_actions: AtomicBool,
    failing_snapshots: AtomicUsize,
    snapshots_served: AtomicUsize,
    calls: Mutex<Vec<String>>,
    paused: watch::Sender<bool>,
}

impl Default for FakeApi {
    fn default() -> Self {
        let (paused, _) = watch::channel(false);
        Self {
            snapshots: Mutex::new(HashMap::new()),
            reject_actions: AtomicBool::new(false),
            failing_snapshots: AtomicUsize::new(0),
            snapshots_served: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
            paused,
        }
    }
}

impl FakeApi {
    pub fn set_snapshot(&self, user: UserId, records: Vec<NotificationRecord>) {
        self.snapshots.lock().unwrap().insert(user, records);
    }

    pub fn reject_actions(&self, reject: bool) {
        self.reject_actions.store(reject, Ordering::SeqCst);
    }

    pub fn fail_next_snapshots(&self, count: usize) {
        self.failing_snapshots.store(count, Ordering::SeqCst);
    }

    pub fn snapshots_served(&self) -> usize {
        self.snapshots_served.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn pause(&self) {
        self.paused.send_replace(true);
    }

    pub fn resume(&self) {
        self.paused.send_replace(false);
    }

    async fn gate(&self) {
        let mut rx = self.paused.subscribe();
        let _ = rx.wait_for(|paused| !*paused).await;
    }

    async fn action(&self, call: String) -> Result<(), Error> {
        self.calls.lock().unwrap().push(call);
        self.gate().await;
        if self.reject_actions.load(Ordering::SeqCst) {
            return Err(Error::Rejected {
                status: 403,
                message: "rejected by fake".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl NotificationApi for FakeApi {
    async fn fetch_snapshot(&self, user: UserId) -> Result<Vec<NotificationRecord>, Error> {
        self.gate().await;
        let failing = self.failing_snapshots.load(Ordering::SeqCst);
        if failing > 0 {
            self.failing_snapshots.store(failing - 1, Ordering::SeqCst);
            return Err(Error::Stream("snapshot unavailable".into()));
        }
        let records = self
            .snapshots
            .lock()
            .unwrap()
            .get(&user)
            .cloned()
            .unwrap_or_default();
        self.snapshots_served.fetch_add(1, Ordering::SeqCst);
        Ok(records)
    }

    async fn mark_read(&self, id: NotificationId) -> Result<(), Error> {
        self.action(format!("mark_read:{id}")).await
    }

    async fn mark_all_read(&self) -> Result<(), Error> {
        self.action("mark_all_read".into()).await
    }

    async fn delete(&self, id: NotificationId) -> Result<(), Error> {
        self.action(format!("delete:{id}")).await
    }

    async fn delete_all(&self) -> Result<(), Error> {
        self.action("delete_all".into()).await
    }
}

enum Script {
    Refuse,
    Unauthorized,
    Stream(mpsc::UnboundedReceiver<Result<RawPushEvent, Error>>),
}

/// Push transport driven by the test: each connect consumes the next script.
/// With nothing scripted, connects succeed with a stream that never yields.
#[derive(Default)]
pub struct FakeTransport {
    scripts: Mutex<VecDeque<Script>>,
    connects: Mutex<Vec<UserId>>,
}

impl FakeTransport {
    pub fn open_stream(&self) -> EventSender {
        let (tx, rx) = mpsc::unbounded();
        self.scripts.lock().unwrap().push_back(Script::Stream(rx));
        tx
    }

    pub fn refuse_next(&self) {
        self.scripts.lock().unwrap().push_back(Script::Refuse);
    }

    pub fn unauthorized_next(&self) {
        self.scripts.lock().unwrap().push_back(Script::Unauthorized);
    }

    pub fn connects(&self) -> Vec<UserId> {
        self.connects.lock().unwrap().clone()
    }
}

#[async_trait]
impl PushTransport for FakeTransport {
    async fn connect(&self, user: UserId) -> Result<PushStream, Error> {
        self.connects.lock().unwrap().push(user);
        let script = self.scripts.lock().unwrap().pop_front();
        match script {
            Some(Script::Refuse) => Err(Error::Stream("connection refused".into())),
            Some(Script::Unauthorized) => Err(Error::Rejected {
                status: 401,
                message: "token expired".into(),
            }),
            Some(Script::Stream(rx)) => Ok(Box::pin(rx)),
            None => Ok(Box::pin(futures::stream::pending())),
        }
    }
}
