use thiserror::Error;
use tokio_tungstenite::tungstenite;

#[derive(Error, Debug)]
pub enum HqError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Socket error: {0}")]
    Socket(#[from] tungstenite::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("User not found: {0}")]
    NotFound(String),

    #[error("Authentication failed: {status} - {message}")]
    AuthFailure { status: u16, message: String },

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Invalid header value: {0}")]
    InvalidHeader(String),

    #[error("Invalid phone number")]
    InvalidPhoneNumber,

    #[error("Live socket is not connected")]
    NotConnected,

    #[error("No broadcast is currently live")]
    NoActiveBroadcast,
}

impl From<HqError> for String {
    fn from(err: HqError) -> String {
        err.to_string()
    }
}
