//! Error types for the camera session.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GoProError {
    #[error("request timed out: {0}")]
    TransportTimeout(String),

    #[error("HTTP: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("camera error {code} (HTTP {status}): {message}")]
    DeviceReported { status: u16, code: i64, message: String },

    #[error("unsupported camera: {0}")]
    UnsupportedCamera(String),

    #[error("camera identification failed: {0}")]
    CameraIdentification(String),

    #[error("camera is busy recording or processing media")]
    DeviceBusy,

    #[error("status field {field} not reached after {polls} polls")]
    PollExhausted { field: String, polls: u32 },

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config: {0}")]
    Config(String),

    #[error("invalid file name: {0}")]
    InvalidFileName(String),

    #[error("unexpected payload: {0}")]
    Payload(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Handler(#[from] anyhow::Error),
}

impl GoProError {
    /// Map a reqwest failure onto the transport taxonomy.
    pub fn from_reqwest(url: &str, e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::TransportTimeout(url.to_string())
        } else if let Some(status) = e.status() {
            Self::HttpStatus { status: status.as_u16(), url: url.to_string() }
        } else {
            Self::Http(e)
        }
    }

    /// True for failures of the link rather than of the camera or the caller.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::TransportTimeout(_) | Self::Http(_) | Self::HttpStatus { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, GoProError>;
