//! Sequential batch driver.
//!
//! Walks the unprocessed requirement texts one at a time, accumulates
//! results into the checkpoint map, and persists every `batch_size` new
//! items so an interruption loses at most one batch of work.

use crate::agent::{self, Generate};
use crate::checkpoint::{CheckpointError, CheckpointStore, Summaries};
use crate::input::Provenance;
use std::collections::BTreeMap;
use std::time::Duration;

/// Pacing knobs for a batch run.
pub struct BatchOptions {
    /// Save the checkpoint every N new summaries.
    pub batch_size: usize,
    /// Pause between API calls.
    pub sleep: Duration,
}

/// One degraded summary, collected for the end-of-run report.
#[derive(Debug, Clone)]
pub struct FlaggedItem {
    pub badge: String,
    pub number: String,
    /// Original text, clipped to 100 characters for display.
    pub original: String,
    pub summary: String,
    pub flag: String,
}

/// What a batch run did.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Number of new summaries generated this run.
    pub processed: usize,
    pub flagged: Vec<FlaggedItem>,
}

/// Process every requirement text not yet present in `summaries`.
///
/// Strictly sequential, one call in flight at a time. An already-complete
/// checkpoint means zero calls and zero saves. The only errors that can
/// escape are checkpoint persistence failures; per-item API failures are
/// absorbed into flagged fallback records.
pub async fn run(
    generator: &dyn Generate,
    unique: &BTreeMap<String, Provenance>,
    summaries: &mut Summaries,
    store: &CheckpointStore,
    opts: &BatchOptions,
) -> Result<RunReport, CheckpointError> {
    let pending: Vec<(&String, &Provenance)> = unique
        .iter()
        .filter(|(text, _)| !summaries.contains_key(*text))
        .collect();

    let mut report = RunReport::default();
    if pending.is_empty() {
        return Ok(report);
    }

    let total = pending.len();
    let batch_size = opts.batch_size.max(1);

    for (text, prov) in pending {
        report.processed += 1;
        println!(
            "[{}/{}] {} {}: ",
            report.processed, total, prov.badge, prov.number
        );

        let record = agent::summarize(generator, text, &prov.badge, &prov.number).await;
        println!("  {}", record.summary);

        if let Some(flag) = &record.flag {
            report.flagged.push(FlaggedItem {
                badge: prov.badge.clone(),
                number: prov.number.clone(),
                original: clip_for_display(text),
                summary: record.summary.clone(),
                flag: flag.clone(),
            });
        }

        summaries.insert(text.clone(), record);

        if report.processed % batch_size == 0 {
            println!("  Saving checkpoint ({} processed)...", report.processed);
            store.save(summaries)?;
        }

        // Rate limiting - be nice to the API
        tokio::time::sleep(opts.sleep).await;
    }

    store.save(summaries)?;
    Ok(report)
}

fn clip_for_display(text: &str) -> String {
    if text.chars().count() <= 100 {
        return text.to_string();
    }
    let clipped: String = text.chars().take(100).collect();
    format!("{}...", clipped)
}
