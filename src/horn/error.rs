//! Error types shared by the horn core.
//!
//! Every error here is `Clone` because results travel through shared futures
//! (the asset load is awaited by every session that needs it).

use thiserror::Error;

/// Fetching or decoding the sound asset failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadError {
    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },
    #[error("fetching {url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("failed to decode audio: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlaybackError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error("audio graph error: {0}")]
    Graph(String),
    #[error("media element refused to play: {0}")]
    Media(String),
}

/// Install prompt failures, surfaced as the rejected outcome of `prompt()`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InstallError {
    #[error("user agent has not offered an install prompt")]
    NotOfferable,
    #[error("install prompt was already shown once")]
    AlreadyPrompted,
    #[error("install prompt rejected: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SensorError {
    #[error("ambient light sensor failed to start: {0}")]
    Start(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HookError {
    #[error("a listener is already registered for `{0}`")]
    AlreadyRegistered(&'static str),
}

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("malformed remote message: {0}")]
    Malformed(#[from] serde_json::Error),
}
