use std::{fs, path::Path};

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{
    algo::AgentParams,
    error::{Error, Result},
};

/// Format version written into every snapshot
pub const SNAPSHOT_VERSION: u32 = 1;

/// Persisted state of a Q-table agent
///
/// Stored as JSON. The table is kept as a flat list of entries so that arbitrary state and
/// action types can be used without requiring them to serialize as map keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot<S, A> {
    pub version: u32,
    pub params: AgentParams,
    /// Episodes completed when the snapshot was taken
    pub episodes: u32,
    pub entries: Vec<Entry<S, A>>,
}

/// One Q-table entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry<S, A> {
    pub state: S,
    pub action: A,
    pub value: f64,
}

impl<S, A> Snapshot<S, A> {
    pub fn new(params: AgentParams, episodes: u32, entries: Vec<Entry<S, A>>) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            params,
            episodes,
            entries,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Serialize, A: Serialize> Snapshot<S, A> {
    /// Write the snapshot to `path`, replacing any existing file
    ///
    /// The data goes to a sibling temporary file first and is then renamed into place.
    pub fn write(&self, path: &Path) -> Result<()> {
        let write_err = |source| Error::SnapshotWrite {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let bytes =
            serde_json::to_vec_pretty(self).map_err(|source| Error::SnapshotEncode { source })?;
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        fs::write(&tmp, bytes).map_err(write_err)?;
        fs::rename(&tmp, path).map_err(write_err)
    }
}

impl<S: DeserializeOwned, A: DeserializeOwned> Snapshot<S, A> {
    /// Read and validate a snapshot from `path`
    pub fn read(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).map_err(|source| Error::SnapshotIo {
            path: path.to_path_buf(),
            source,
        })?;
        let snapshot: Self =
            serde_json::from_slice(&bytes).map_err(|source| Error::SnapshotCorrupt {
                path: path.to_path_buf(),
                source,
            })?;
        snapshot.validate(path)?;
        Ok(snapshot)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        let invalid = |reason: String| {
            Err(Error::SnapshotInvalid {
                path: path.to_path_buf(),
                reason,
            })
        };

        if self.version != SNAPSHOT_VERSION {
            return invalid(format!(
                "unsupported version {} (expected {SNAPSHOT_VERSION})",
                self.version
            ));
        }
        if let Some(i) = self.entries.iter().position(|e| !e.value.is_finite()) {
            return invalid(format!("entry {i} has a non-finite value"));
        }
        Ok(())
    }
}
