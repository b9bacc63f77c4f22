use reqwest::StatusCode;
use serde::Deserialize;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Request(#[from] reqwest::Error),

    #[error("{0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("Server rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Malformed push event: {0}")]
    MalformedEvent(String),

    #[error("Push stream error: {0}")]
    Stream(String),

    #[error("{0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl Error {
    /// Numeric code attached to log lines, grouped like HTTP classes.
    pub fn code(&self) -> u16 {
        match self {
            Error::Rejected { status, .. } => *status,
            Error::MalformedEvent(_) => 4001,
            Error::Validation(_) | Error::InvalidConfig(_) => 4002,
            Error::Request(_) => 5001,
            Error::Stream(_) => 5002,
            Error::SerdeJson(_) => 5003,
        }
    }

    /// Errors caused by the network rather than by the server's answer.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Request(_) | Error::Stream(_))
    }

    pub fn rejected(status: StatusCode, body: &str) -> Self {
        let message = match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) => parsed.message,
            Err(_) if body.trim().is_empty() => status
                .canonical_reason()
                .unwrap_or("unknown status")
                .to_string(),
            Err(_) => body.trim().to_string(),
        };

        Error::Rejected {
            status: status.as_u16(),
            message,
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Error::MalformedEvent(message.into())
    }
}
