//! Durable storage for the run state pointer.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::{RunState, StateError};

/// Storage backend for the run state.
pub trait RunStateStore: Send + Sync {
    /// Load the persisted state. A store with nothing persisted yet returns
    /// the default state.
    fn load(&self) -> Result<RunState, StateError>;

    /// Persist `state`. Must not return before the write is durable.
    fn save(&self, state: &RunState) -> Result<(), StateError>;
}

/// Stores the run state as a small JSON document.
///
/// Writes go to a sibling temp file that is synced and then renamed over the
/// target, so an interrupted save leaves the previous document intact.
pub struct JsonFileStateStore {
    path: PathBuf,
}

impl JsonFileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RunStateStore for JsonFileStateStore {
    fn load(&self) -> Result<RunState, StateError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(
                    "No run state at {}, starting from the beginning",
                    self.path.display()
                );
                return Ok(RunState::default());
            }
            Err(e) => {
                return Err(StateError::Load(format!("{}: {}", self.path.display(), e)));
            }
        };

        match serde_json::from_str(&content) {
            Ok(state) => Ok(state),
            Err(e) => {
                warn!(
                    "Could not parse run state at {} ({}), starting from the beginning",
                    self.path.display(),
                    e
                );
                Ok(RunState::default())
            }
        }
    }

    fn save(&self, state: &RunState) -> Result<(), StateError> {
        let bytes = serde_json::to_vec_pretty(state)
            .map_err(|e| StateError::Persistence(e.to_string()))?;

        write_atomically(&self.path, &bytes)
            .map_err(|e| StateError::Persistence(format!("{}: {}", self.path.display(), e)))
    }
}

/// Write `bytes` to `path` via a synced temp file and a rename.
pub(crate) fn write_atomically(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp_path = temp_path_for(path);
    {
        let mut file = File::create(&tmp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }

    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }

    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
