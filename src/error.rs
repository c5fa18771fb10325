use std::{io, path::PathBuf};

use thiserror::Error;

use crate::web::PageError;

/// Errors surfaced by the agent, the environment adapter and the training loop
///
/// Failures of a single action never show up here, they are turned into rewards by the environment.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read snapshot {}: {source}", path.display())]
    SnapshotIo { path: PathBuf, source: io::Error },

    #[error("snapshot {} is corrupt: {source}", path.display())]
    SnapshotCorrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("snapshot {} is invalid: {reason}", path.display())]
    SnapshotInvalid { path: PathBuf, reason: String },

    #[error("failed to encode snapshot: {source}")]
    SnapshotEncode { source: serde_json::Error },

    #[error("failed to write snapshot {}: {source}", path.display())]
    SnapshotWrite { path: PathBuf, source: io::Error },

    #[error("training log error: {0}")]
    Log(#[from] csv::Error),

    #[error("failed to read config {}: {source}", path.display())]
    ConfigIo { path: PathBuf, source: io::Error },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("page failure: {0}")]
    Page(#[from] PageError),

    #[error("no interactive elements found on the page")]
    NoActions,

    #[error("training session aborted after {completed} completed episodes: {source}")]
    SessionAborted { completed: usize, source: Box<Error> },
}

impl Error {
    /// Whether training can carry on from an empty table after this error
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::SnapshotIo { .. } | Self::SnapshotCorrupt { .. } | Self::SnapshotInvalid { .. }
        )
    }

    /// True for a snapshot read that failed only because the file does not exist yet
    pub fn is_missing_snapshot(&self) -> bool {
        matches!(self, Self::SnapshotIo { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
