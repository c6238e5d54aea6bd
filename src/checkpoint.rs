//! JSON-backed checkpoint store for generated summaries.
//!
//! The checkpoint maps requirement text to its [`SummaryRecord`] and only
//! ever grows. Saving goes through a temp file in the target directory
//! followed by a rename, so an interrupted save never corrupts the
//! previous checkpoint.

use crate::summary::SummaryRecord;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CheckpointError {
    #[error("failed to read checkpoint file: {0}")]
    ReadError(#[source] std::io::Error),
    #[error("checkpoint file is malformed: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("failed to write checkpoint file: {0}")]
    WriteError(#[source] std::io::Error),
}

/// In-memory checkpoint contents.
pub type Summaries = BTreeMap<String, SummaryRecord>;

/// Handle on the checkpoint file.
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load previously generated summaries.
    ///
    /// A missing file is a fresh start, not an error. A file that exists
    /// but fails to parse is an error: resuming on top of a corrupt
    /// checkpoint would silently discard prior work.
    pub fn load(&self) -> Result<Summaries, CheckpointError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Summaries::new());
            }
            Err(e) => return Err(CheckpointError::ReadError(e)),
        };
        Ok(serde_json::from_str(&content)?)
    }

    /// Persist the full checkpoint, creating parent directories as needed.
    pub fn save(&self, summaries: &Summaries) -> Result<(), CheckpointError> {
        let parent = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));
        std::fs::create_dir_all(&parent).map_err(CheckpointError::WriteError)?;

        let json = serde_json::to_string_pretty(summaries)?;
        let mut tmp =
            tempfile::NamedTempFile::new_in(&parent).map_err(CheckpointError::WriteError)?;
        tmp.write_all(json.as_bytes())
            .map_err(CheckpointError::WriteError)?;
        tmp.persist(&self.path)
            .map_err(|e| CheckpointError::WriteError(e.error))?;
        Ok(())
    }
}
