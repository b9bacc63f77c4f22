//! Server-sent events transport for the notification push channel.
//!
//! The stream is parsed with `eventsource-stream` on top of the reqwest byte
//! stream. Interpreting frames is left to [`super::event`].

use std::time::Duration;

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use reqwest::header::ACCEPT;
use uuid::Uuid;

use super::{PushStream, PushTransport, RawPushEvent};
use crate::common::UserId;
use crate::config::SyncConfig;
use crate::constants::{EVENT_STREAM_CONTENT_TYPE, REQUEST_ID_HEADER, subscribe_path};
use crate::errors::Error;

pub struct SseTransport {
    client: reqwest::Client,
    base_url: String,
    access_token: Option<String>,
}

impl SseTransport {
    /// The client only bounds the handshake. A whole-request timeout would
    /// cut every long-lived stream.
    pub fn new(
        base_url: impl Into<String>,
        access_token: Option<String>,
        config: &SyncConfig,
    ) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.request_timeout())
            .tcp_keepalive(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token,
        })
    }
}

#[async_trait]
impl PushTransport for SseTransport {
    async fn connect(&self, user: UserId) -> Result<PushStream, Error> {
        let url = format!("{}{}", self.base_url, subscribe_path(user));
        let request_id = Uuid::new_v4().to_string();

        let mut request = self
            .client
            .get(&url)
            .header(ACCEPT, EVENT_STREAM_CONTENT_TYPE)
            .header(REQUEST_ID_HEADER, &request_id);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::rejected(status, &body));
        }

        tracing::debug!("push stream for user {user} accepted (request {request_id})");
        Ok(parse_event_stream(response))
    }
}

pub fn parse_event_stream(response: reqwest::Response) -> PushStream {
    let events = response.bytes_stream().eventsource().map(|result| match result {
        Ok(event) => Ok(RawPushEvent {
            event: event.event,
            data: event.data,
            id: (!event.id.is_empty()).then_some(event.id),
        }),
        Err(e) => Err(Error::Stream(e.to_string())),
    });

    Box::pin(events)
}
