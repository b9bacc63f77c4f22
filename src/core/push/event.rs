use std::str::FromStr;

use serde::Deserialize;
use serde_json::Value;

use crate::common::NotificationId;
use crate::constants::CONTROL_EVENTS;
use crate::enums::PushEventKind;
use crate::errors::Error;
use crate::models::{NotificationPatch, NotificationRecord};

/// One undecoded frame from the push transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPushEvent {
    pub event: String,
    pub data: String,
    pub id: Option<String>,
}

impl RawPushEvent {
    pub fn new(event: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            data: data.into(),
            id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushEvent {
    Created(NotificationRecord),
    Updated(NotificationPatch),
    Deleted(NotificationId),
}

#[derive(Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum Envelope {
    Created { notification: NotificationRecord },
    Updated { notification: NotificationPatch },
    Deleted { id: NotificationId },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DeletedPayload {
    Bare(NotificationId),
    Object { id: NotificationId },
}

impl From<Envelope> for PushEvent {
    fn from(envelope: Envelope) -> Self {
        match envelope {
            Envelope::Created { notification } => PushEvent::Created(notification),
            Envelope::Updated { notification } => PushEvent::Updated(notification),
            Envelope::Deleted { id } => PushEvent::Deleted(id),
        }
    }
}

impl PushEvent {
    /// Decodes a raw frame. Control frames (`connect`, `heartbeat`, `ping`)
    /// yield `Ok(None)`.
    ///
    /// The kind comes from a `{"kind": ...}` envelope when present, otherwise
    /// from the SSE event name with the data holding the bare payload.
    pub fn decode(raw: &RawPushEvent) -> Result<Option<PushEvent>, Error> {
        if CONTROL_EVENTS.contains(&raw.event.as_str()) {
            return Ok(None);
        }

        let value: Value = serde_json::from_str(&raw.data)
            .map_err(|e| Error::malformed(format!("{} payload is not JSON: {e}", raw.event)))?;

        if value.get("kind").is_some() {
            return serde_json::from_value::<Envelope>(value)
                .map(|envelope| Some(envelope.into()))
                .map_err(|e| Error::malformed(format!("invalid envelope: {e}")));
        }

        let kind = PushEventKind::from_str(&raw.event)
            .map_err(|_| Error::malformed(format!("unknown event kind '{}'", raw.event)))?;

        let event = match kind {
            PushEventKind::Created => serde_json::from_value(value).map(PushEvent::Created),
            PushEventKind::Updated => serde_json::from_value(value).map(PushEvent::Updated),
            PushEventKind::Deleted => {
                serde_json::from_value::<DeletedPayload>(value).map(|payload| match payload {
                    DeletedPayload::Bare(id) | DeletedPayload::Object { id } => {
                        PushEvent::Deleted(id)
                    }
                })
            }
        }
        .map_err(|e| Error::malformed(format!("invalid {kind} payload: {e}")))?;

        Ok(Some(event))
    }

    pub fn kind(&self) -> PushEventKind {
        match self {
            PushEvent::Created(_) => PushEventKind::Created,
            PushEvent::Updated(_) => PushEventKind::Updated,
            PushEvent::Deleted(_) => PushEventKind::Deleted,
        }
    }

    pub fn notification_id(&self) -> NotificationId {
        match self {
            PushEvent::Created(record) => record.id,
            PushEvent::Updated(patch) => patch.id,
            PushEvent::Deleted(id) => *id,
        }
    }
}
