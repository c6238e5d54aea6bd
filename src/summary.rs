//! SummaryRecord - the per-requirement result of summarization.

use serde::{Deserialize, Serialize};

/// Maximum number of characters allowed in a stored summary.
pub const MAX_SUMMARY_LEN: usize = 40;

/// Ellipsis marker appended to truncated summaries. Counts as one character.
pub const ELLIPSIS: char = '…';

/// A generated summary for one requirement text.
///
/// `flag` is set whenever the summary may have lost meaning: the model
/// reported dropped information, the reply was force-truncated, or the
/// API call failed and a deterministic fallback was substituted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRecord {
    /// The compact summary, at most [`MAX_SUMMARY_LEN`] characters.
    pub summary: String,
    /// Human-readable note when the summary is degraded, otherwise `None`.
    pub flag: Option<String>,
}

impl SummaryRecord {
    /// A verbatim record for text that already fits the length budget.
    pub fn verbatim(text: &str) -> Self {
        Self {
            summary: text.to_string(),
            flag: None,
        }
    }

    /// Deterministic fallback when the API call or reply parsing failed:
    /// the first 39 characters of the original text plus an ellipsis.
    pub fn fallback(text: &str, error: &str) -> Self {
        let prefix: String = error.chars().take(50).collect();
        Self {
            summary: truncate_with_ellipsis(text),
            flag: Some(format!("API error: {}", prefix)),
        }
    }

    /// Whether this record needs human review.
    pub fn is_flagged(&self) -> bool {
        self.flag.is_some()
    }
}

/// Truncate `text` to [`MAX_SUMMARY_LEN`] characters, replacing the tail
/// with an ellipsis. Texts already within budget are returned unchanged.
///
/// Counts Unicode scalar values, not bytes.
pub fn truncate_with_ellipsis(text: &str) -> String {
    if text.chars().count() <= MAX_SUMMARY_LEN {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(MAX_SUMMARY_LEN - 1).collect();
    truncated.push(ELLIPSIS);
    truncated
}
