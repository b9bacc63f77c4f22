pub mod backoff;
pub mod channel;
pub mod event;
pub mod sse;

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::common::UserId;
use crate::errors::Error;

pub use channel::PushIngestionChannel;
pub use event::{PushEvent, RawPushEvent};
pub use sse::SseTransport;

pub type PushStream = Pin<Box<dyn Stream<Item = Result<RawPushEvent, Error>> + Send>>;

/// Opens the one-directional, user-scoped event stream.
///
/// A returned stream is considered open. An `Err` item or the end of the
/// stream is a transport disruption.
#[async_trait]
pub trait PushTransport: Send + Sync + 'static {
    async fn connect(&self, user: UserId) -> Result<PushStream, Error>;
}
