//! Error types for the poolwatch pipeline.

use thiserror::Error;

/// Errors that can occur while loading targets or syncing logs.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Network or HTTP failure talking to the chain endpoint.
    #[error("transport error: {0}")]
    Transport(String),

    /// The endpoint answered, but not with the shape we expected.
    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("unknown event '{0}'")]
    UnknownEvent(String),

    #[error("unsupported network '{0}'")]
    UnsupportedNetwork(String),

    #[error("sink error: {0}")]
    Sink(String),

    #[error("cursor store error: {0}")]
    Cursor(String),

    #[error("target loader error: {0}")]
    Loader(String),
}

impl SyncError {
    /// Returns `true` if the error came from talking to the chain endpoint.
    ///
    /// Chain errors abort the current network for this iteration only; the
    /// next iteration starts over from the cursor.
    pub fn is_chain_error(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Protocol(_))
    }

    /// Returns `true` for faults in the static configuration (target list,
    /// event names, network ids). Retrying will not fix these.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownEvent(_) | Self::UnsupportedNetwork(_) | Self::Loader(_)
        )
    }
}
