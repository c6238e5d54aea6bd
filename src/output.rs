//! Final lookup artifact.
//!
//! A versioned snapshot of the full checkpoint: a text → summary mapping
//! plus a text → flag mapping for the records that need review. Rebuilt
//! from the checkpoint on every run, even when nothing new was processed.

use crate::checkpoint::Summaries;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("failed to write output file: {0}")]
    WriteError(#[source] std::io::Error),
    #[error("failed to serialize output: {0}")]
    SerializeError(#[from] serde_json::Error),
}

/// The versioned lookup file consumed by the app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputArtifact {
    pub version: String,
    /// Generation date, YYYY-MM-DD.
    pub generated: String,
    pub summaries: BTreeMap<String, String>,
    pub flags: BTreeMap<String, String>,
}

/// Build the artifact from the full checkpoint contents.
pub fn build_artifact(summaries: &Summaries, generated: NaiveDate) -> OutputArtifact {
    let mut summary_map = BTreeMap::new();
    let mut flag_map = BTreeMap::new();

    for (text, record) in summaries {
        summary_map.insert(text.clone(), record.summary.clone());
        if let Some(flag) = &record.flag {
            flag_map.insert(text.clone(), flag.clone());
        }
    }

    OutputArtifact {
        version: "1.0".to_string(),
        generated: generated.format("%Y-%m-%d").to_string(),
        summaries: summary_map,
        flags: flag_map,
    }
}

/// Write the artifact, creating parent directories as needed.
pub fn write_artifact(path: &Path, artifact: &OutputArtifact) -> Result<(), OutputError> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&parent).map_err(OutputError::WriteError)?;

    let json = serde_json::to_string_pretty(artifact)?;
    let mut tmp = tempfile::NamedTempFile::new_in(&parent).map_err(OutputError::WriteError)?;
    tmp.write_all(json.as_bytes())
        .map_err(OutputError::WriteError)?;
    tmp.persist(path)
        .map_err(|e| OutputError::WriteError(e.error))?;
    Ok(())
}
