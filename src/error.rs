//! Domain errors for the drawer

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DrawerError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("redirect did not contain an access token")]
    MissingToken,

    #[error("authorization was denied: {0}")]
    AuthDenied(String),

    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("malformed record: {0}")]
    Json(#[from] serde_json::Error),

    #[error("playback device unavailable: {0}")]
    DeviceUnavailable(String),
}
