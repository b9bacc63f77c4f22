//! Long-lived push connection for one user.
//!
//! State machine: `CLOSED -> CONNECTING -> OPEN -> RECONNECTING -> OPEN ...`
//! and back to `CLOSED` on [`PushIngestionChannel::close`].
//!
//! Every open loads the snapshot through `set_all` after the stream is
//! connected and before the first frame is read. Frames pushed meanwhile wait
//! in the stream and land on top of the snapshot. On the first open this is
//! the session's initial load; on later opens it closes the delivery gap.

use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

use super::backoff::ReconnectBackoff;
use super::{PushEvent, PushStream, PushTransport, RawPushEvent};
use crate::common::UserId;
use crate::config::SyncConfig;
use crate::core::api::NotificationApi;
use crate::core::store::{ScopedStore, StoreHandle};
use crate::enums::ChannelState;
use crate::errors::Error;

/// Applies one decoded event. Every event kind is idempotent.
pub fn apply_push_event(store: &ScopedStore, event: PushEvent) {
    let id = event.notification_id();
    let kind = event.kind();

    let applied = match event {
        PushEvent::Created(record) => store.upsert_created(record).map(|o| o.changed()),
        PushEvent::Updated(patch) => store.upsert(patch).map(|o| o.changed()),
        PushEvent::Deleted(id) => store.delete_local(id),
    };

    match applied {
        Some(true) => tracing::debug!("applied {kind} event for notification {id}"),
        Some(false) => tracing::debug!("{kind} event for notification {id} changed nothing"),
        None => tracing::debug!("{kind} event for notification {id} arrived after session end"),
    }
}

/// Decodes and applies a raw frame; malformed frames are logged and dropped.
pub fn ingest_raw_event(store: &ScopedStore, raw: &RawPushEvent) {
    match PushEvent::decode(raw) {
        Ok(Some(event)) => apply_push_event(store, event),
        Ok(None) => tracing::trace!("ignoring control event '{}'", raw.event),
        Err(e) => tracing::warn!("dropping push event '{}': {e}", raw.event),
    }
}

pub struct PushIngestionChannel {
    user: UserId,
    state_rx: watch::Receiver<ChannelState>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl PushIngestionChannel {
    pub fn spawn(
        user: UserId,
        transport: Arc<dyn PushTransport>,
        api: Arc<dyn NotificationApi>,
        store: &StoreHandle,
        config: &SyncConfig,
    ) -> Self {
        let (state_tx, state_rx) = watch::channel(ChannelState::Closed);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let worker = ChannelWorker {
            user,
            transport,
            api,
            store: store.scoped(user),
            state_tx,
            backoff: ReconnectBackoff::from_config(config),
            loaded: false,
        };
        let task = tokio::spawn(worker.run(shutdown_rx));

        Self {
            user,
            state_rx,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }
    }

    pub fn user(&self) -> UserId {
        self.user
    }

    pub fn state(&self) -> ChannelState {
        *self.state_rx.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<ChannelState> {
        self.state_rx.clone()
    }

    /// Stops the connection and any pending backoff, then waits for the
    /// worker to report `CLOSED`.
    pub async fn close(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!("push channel task for user {} failed: {e}", self.user);
            }
        }
    }
}

impl Drop for PushIngestionChannel {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

struct ChannelWorker {
    user: UserId,
    transport: Arc<dyn PushTransport>,
    api: Arc<dyn NotificationApi>,
    store: ScopedStore,
    state_tx: watch::Sender<ChannelState>,
    backoff: ReconnectBackoff,
    /// A snapshot has been applied at least once.
    loaded: bool,
}

impl ChannelWorker {
    async fn run(mut self, shutdown: oneshot::Receiver<()>) {
        tracing::info!("opening push channel for user {}", self.user);

        tokio::select! {
            biased;
            _ = shutdown => {}
            _ = self.drive() => {}
        }

        self.set_state(ChannelState::Closed);
        tracing::info!("push channel for user {} closed", self.user);
    }

    fn set_state(&self, next: ChannelState) {
        let previous = self.state_tx.send_replace(next);
        if previous != next {
            tracing::debug!("push channel {}: {previous} -> {next}", self.user);
        }
    }

    /// Runs until the owning session ends; transport failures never escape.
    async fn drive(&mut self) {
        self.set_state(ChannelState::Connecting);

        loop {
            match self.transport.connect(self.user).await {
                Ok(stream) => {
                    if let Err(e) = self.resync().await {
                        tracing::warn!("snapshot after connect failed for user {}: {e}", self.user);
                        self.wait_before_retry().await;
                        continue;
                    }

                    self.backoff.reset();
                    self.set_state(ChannelState::Open);
                    self.consume(stream).await;
                }
                Err(e) => {
                    if e.is_transport() {
                        tracing::warn!("push connect failed for user {}: {e}", self.user);
                    } else {
                        tracing::error!(
                            code = e.code(),
                            "push handshake refused for user {}: {e}",
                            self.user
                        );
                    }

                    // load once even while push is down
                    if !self.loaded {
                        if let Err(e) = self.resync().await {
                            tracing::warn!("initial snapshot failed for user {}: {e}", self.user);
                        }
                    }
                }
            }

            self.wait_before_retry().await;
        }
    }

    async fn wait_before_retry(&mut self) {
        self.set_state(ChannelState::Reconnecting);
        let delay = self.backoff.next_delay();
        tracing::info!(
            "reconnecting push channel for user {} in {}ms (attempt {})",
            self.user,
            delay.as_millis(),
            self.backoff.attempt()
        );
        tokio::time::sleep(delay).await;
    }

    async fn resync(&mut self) -> Result<(), Error> {
        let records = self.api.fetch_snapshot(self.user).await?;
        let count = records.len();
        if self.store.set_all(records).is_some() {
            tracing::info!("loaded {count} notifications for user {}", self.user);
        }
        self.loaded = true;
        Ok(())
    }

    async fn consume(&self, mut stream: PushStream) {
        while let Some(frame) = stream.next().await {
            match frame {
                Ok(raw) => ingest_raw_event(&self.store, &raw),
                Err(e) => {
                    tracing::warn!("push stream for user {} broke: {e}", self.user);
                    return;
                }
            }
        }
        tracing::info!("push stream for user {} ended by server", self.user);
    }
}
