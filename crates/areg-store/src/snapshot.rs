//! On-disk snapshots of committed world state.
//!
//! A snapshot is a pretty-printed JSON document:
//!
//! ```json
//! {
//!   "version": 1,
//!   "entries": { "<key>": "<hex-encoded value>" }
//! }
//! ```
//!
//! Entry versions are not persisted; a loaded state starts a fresh version
//! sequence, so transactions never span a save/load cycle.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::memory::InMemoryWorldState;

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotFile {
    version: u32,
    entries: BTreeMap<String, String>,
}

impl InMemoryWorldState {
    /// Write the committed state to `path`.
    ///
    /// The file is written to a temporary sibling first and renamed into
    /// place, so readers never observe a half-written snapshot.
    pub fn save_snapshot(&self, path: &Path) -> StoreResult<()> {
        let entries = self
            .entries()?
            .into_iter()
            .map(|kv| (kv.key, hex::encode(kv.value)))
            .collect::<BTreeMap<_, _>>();
        let count = entries.len();
        let file = SnapshotFile {
            version: SNAPSHOT_VERSION,
            entries,
        };
        let json = serde_json::to_vec_pretty(&file)
            .map_err(|e| StoreError::Snapshot(e.to_string()))?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&json)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;

        debug!(path = %path.display(), entries = count, "snapshot saved");
        Ok(())
    }

    /// Load a state previously written by [`save_snapshot`](Self::save_snapshot).
    pub fn load_snapshot(path: &Path) -> StoreResult<Self> {
        let data = std::fs::read(path)?;
        let file: SnapshotFile =
            serde_json::from_slice(&data).map_err(|e| StoreError::Snapshot(e.to_string()))?;
        if file.version != SNAPSHOT_VERSION {
            return Err(StoreError::Snapshot(format!(
                "unsupported snapshot version {} (expected {SNAPSHOT_VERSION})",
                file.version
            )));
        }

        let mut entries = Vec::with_capacity(file.entries.len());
        for (key, value) in file.entries {
            let bytes = hex::decode(&value)
                .map_err(|e| StoreError::Snapshot(format!("bad value for key {key:?}: {e}")))?;
            entries.push((key, bytes));
        }
        debug!(path = %path.display(), entries = entries.len(), "snapshot loaded");
        Ok(Self::from_entries(entries))
    }

    /// Load `path` if it exists, otherwise start from an empty state.
    pub fn open_snapshot(path: &Path) -> StoreResult<Self> {
        if path.exists() {
            Self::load_snapshot(path)
        } else {
            Ok(Self::new())
        }
    }
}
