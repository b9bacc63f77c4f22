use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::Deserialize;
use uuid::Uuid;

use crate::common::{NotificationId, UserId};
use crate::config::SyncConfig;
use crate::constants::{
    NOTIFICATIONS_PATH, REQUEST_ID_HEADER, mark_all_read_path, mark_read_path, notification_path,
};
use crate::errors::Error;
use crate::models::NotificationRecord;

/// The notification REST resource: one bulk read and four mutations.
#[async_trait]
pub trait NotificationApi: Send + Sync + 'static {
    async fn fetch_snapshot(&self, user: UserId) -> Result<Vec<NotificationRecord>, Error>;

    async fn mark_read(&self, id: NotificationId) -> Result<(), Error>;

    async fn mark_all_read(&self) -> Result<(), Error>;

    async fn delete(&self, id: NotificationId) -> Result<(), Error>;

    async fn delete_all(&self) -> Result<(), Error>;
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SnapshotBody {
    Bare(Vec<NotificationRecord>),
    Enveloped { data: Vec<NotificationRecord> },
}

impl From<SnapshotBody> for Vec<NotificationRecord> {
    fn from(body: SnapshotBody) -> Self {
        match body {
            SnapshotBody::Bare(records) | SnapshotBody::Enveloped { data: records } => records,
        }
    }
}

pub struct HttpNotificationApi {
    client: reqwest::Client,
    base_url: String,
    access_token: Option<String>,
}

impl HttpNotificationApi {
    pub fn new(
        base_url: impl Into<String>,
        access_token: Option<String>,
        config: &SyncConfig,
    ) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path))
            .header(REQUEST_ID_HEADER, Uuid::new_v4().to_string());

        match &self.access_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, method: Method, path: &str) -> Result<Response, Error> {
        let response = self.request(method.clone(), path).send().await?;
        let status = response.status();
        tracing::debug!("{method} {path} -> {status}");

        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(Error::rejected(status, &body))
    }
}

#[async_trait]
impl NotificationApi for HttpNotificationApi {
    async fn fetch_snapshot(&self, user: UserId) -> Result<Vec<NotificationRecord>, Error> {
        let response = self.send(Method::GET, NOTIFICATIONS_PATH).await?;
        let bytes = response.bytes().await?;
        let body: SnapshotBody = serde_json::from_slice(&bytes)?;
        let records: Vec<NotificationRecord> = body.into();

        tracing::info!("fetched {} notifications for user {user}", records.len());
        Ok(records)
    }

    async fn mark_read(&self, id: NotificationId) -> Result<(), Error> {
        self.send(Method::PATCH, &mark_read_path(id)).await?;
        Ok(())
    }

    async fn mark_all_read(&self) -> Result<(), Error> {
        self.send(Method::PATCH, &mark_all_read_path()).await?;
        Ok(())
    }

    async fn delete(&self, id: NotificationId) -> Result<(), Error> {
        self.send(Method::DELETE, &notification_path(id)).await?;
        Ok(())
    }

    async fn delete_all(&self) -> Result<(), Error> {
        self.send(Method::DELETE, NOTIFICATIONS_PATH).await?;
        Ok(())
    }
}
