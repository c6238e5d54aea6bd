//! Input loader for the raw requirements dump.
//!
//! Extracts the set of unique requirement texts from the nested
//! badge → version → requirement structure, keeping one provenance
//! per text for reporting.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InputError {
    #[error("failed to read input file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("failed to parse input file: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// One badge entry in the raw dump.
#[derive(Debug, Clone, Deserialize)]
pub struct RawBadge {
    pub name: String,
    #[serde(default)]
    pub versions: Vec<RawVersion>,
}

/// One published version of a badge's requirement set.
#[derive(Debug, Clone, Deserialize)]
pub struct RawVersion {
    #[serde(default)]
    pub requirements: Vec<RawRequirement>,
}

/// A single requirement as it appears in the dump.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRequirement {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub number: String,
}

/// Where a requirement text was first seen. Used only for reporting,
/// never for identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provenance {
    pub badge: String,
    pub number: String,
}

/// Load the raw dump from disk and extract unique requirement texts.
pub fn load_requirements(path: &Path) -> Result<BTreeMap<String, Provenance>, InputError> {
    let content = std::fs::read_to_string(path)?;
    let badges: Vec<RawBadge> = serde_json::from_str(&content)?;
    Ok(parse_requirements(&badges))
}

/// Extract unique requirement texts with first-seen provenance.
///
/// Texts are trimmed; empty texts and note markers are skipped. When the
/// same text appears under several badges, the first badge/number wins.
pub fn parse_requirements(badges: &[RawBadge]) -> BTreeMap<String, Provenance> {
    let mut unique = BTreeMap::new();
    for badge in badges {
        for version in &badge.versions {
            for req in &version.requirements {
                let text = req.text.trim();
                if text.is_empty() || is_note(text) {
                    continue;
                }
                unique.entry(text.to_string()).or_insert(Provenance {
                    badge: badge.name.clone(),
                    number: req.number.clone(),
                });
            }
        }
    }
    unique
}

/// The dump embeds editorial notes as pseudo-requirements, sometimes with
/// HTML markup. They carry no summarizable content.
fn is_note(text: &str) -> bool {
    text.starts_with("<b>NOTE:</b>") || text.starts_with("NOTE:")
}
