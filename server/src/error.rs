use std::time::Duration;

use system::{CodecError, SessionCode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("no stored canvas for {0}")]
    Missing(SessionCode),
}

/// Never reaches clients. Logged, then the next session is tried.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("store: {0}")]
    Store(#[from] StoreError),
    #[error("codec: {0}")]
    Codec(#[from] CodecError),
    #[error("stored under {stored} but encodes {decoded}")]
    CodeMismatch {
        stored: SessionCode,
        decoded: SessionCode,
    },
    #[error("write did not finish within {0:?}")]
    Timeout(Duration),
}

/// Rendering a canvas off the async runtime.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("render: {0}")]
    Render(#[from] system::RenderError),
    #[error("render task: {0}")]
    Join(#[from] tokio::task::JoinError),
}
