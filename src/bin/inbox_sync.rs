use std::sync::Arc;

use funding_inbox_sync::common::UserId;
use funding_inbox_sync::config::APP_CONFIG;
use funding_inbox_sync::core::api::HttpNotificationApi;
use funding_inbox_sync::core::push::SseTransport;
use funding_inbox_sync::core::session::InboxSession;
use funding_inbox_sync::core::store::StoreHandle;
use funding_inbox_sync::utils::tracing::init_standard_tracing;
use tokio::sync::watch;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    dotenvy::dotenv().ok();
    init_standard_tracing(env!("CARGO_CRATE_NAME"), &APP_CONFIG.log_level);

    let config = APP_CONFIG.sync_config().validated()?;
    let base_url = APP_CONFIG.api_base_url.clone();
    let token = APP_CONFIG.access_token.clone();

    let api = Arc::new(HttpNotificationApi::new(base_url.clone(), token.clone(), &config)?);
    let transport = Arc::new(SseTransport::new(base_url, token, &config)?);
    let store = StoreHandle::new();

    let mut changes = store.subscribe();
    tokio::spawn(async move {
        while changes.changed().await.is_ok() {
            let view = *changes.borrow_and_update();
            tracing::info!(
                "inbox revision {}: {} notifications, {} unread",
                view.revision,
                view.len,
                view.unread_count
            );
        }
    });

    let (identity_tx, identity_rx) = watch::channel(UserId::ANONYMOUS);
    let session = InboxSession::new(api, transport, store, config);
    let session_task = tokio::spawn(session.run(identity_rx));

    let user = APP_CONFIG.user();
    if !user.is_present() {
        tracing::warn!("USER_ID is not set; waiting without an inbox");
    }
    identity_tx.send_replace(user);
    tracing::info!("inbox sync running for user {user} ({} env)", APP_CONFIG.app_env);

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");

    identity_tx.send_replace(UserId::ANONYMOUS);
    drop(identity_tx);
    session_task.await?;

    Ok(())
}
