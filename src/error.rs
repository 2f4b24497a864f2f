use thiserror::Error;

/// Errors produced while talking to the platform or normalizing its payloads.
#[derive(Debug, Error)]
pub enum Error {
    #[error("request to {url} failed with status {status}")]
    Status { status: u16, url: String },
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("missing field in payload: {field}")]
    MissingField { field: String },
    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
    #[error("unknown search type: {0}")]
    UnknownSearchType(String),
    #[error("unknown group: {0}")]
    UnknownGroup(String),
    #[error("cookie store error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn missing(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    pub(crate) fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
