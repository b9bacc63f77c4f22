//! Ties the inbox lifecycle to the signed-in identity.
//!
//! Every identity change closes the current push channel and clears the
//! store. A non-zero identity then gets a fresh session and a new channel
//! scoped to that user, which loads the initial snapshot once connected.

use std::sync::Arc;

use tokio::sync::watch;

use crate::common::UserId;
use crate::config::SyncConfig;
use crate::core::api::NotificationApi;
use crate::core::push::{PushIngestionChannel, PushTransport};
use crate::core::store::StoreHandle;

pub struct InboxSession {
    api: Arc<dyn NotificationApi>,
    transport: Arc<dyn PushTransport>,
    store: StoreHandle,
    config: SyncConfig,
}

impl InboxSession {
    pub fn new(
        api: Arc<dyn NotificationApi>,
        transport: Arc<dyn PushTransport>,
        store: StoreHandle,
        config: SyncConfig,
    ) -> Self {
        Self {
            api,
            transport,
            store,
            config,
        }
    }

    pub fn store(&self) -> &StoreHandle {
        &self.store
    }

    /// Follows `identity` until its sender is dropped, then tears down.
    pub async fn run(self, mut identity: watch::Receiver<UserId>) {
        let mut channel: Option<PushIngestionChannel> = None;
        let mut current = UserId::ANONYMOUS;

        loop {
            let next = *identity.borrow_and_update();
            if next != current {
                tracing::info!("identity changed: {current} -> {next}");
                self.switch(&mut channel, next).await;
                current = next;
            }

            if identity.changed().await.is_err() {
                break;
            }
        }

        if let Some(open) = channel.take() {
            open.close().await;
        }
        self.store.clear();
        tracing::info!("inbox session stopped");
    }

    async fn switch(&self, channel: &mut Option<PushIngestionChannel>, user: UserId) {
        if let Some(open) = channel.take() {
            open.close().await;
        }
        self.store.clear();

        if !user.is_present() {
            return;
        }

        self.store.begin_session(user);
        *channel = Some(PushIngestionChannel::spawn(
            user,
            self.transport.clone(),
            self.api.clone(),
            &self.store,
            &self.config,
        ));
    }
}
