//! # Reqsum
//!
//! Batch generator for compact merit badge requirement summaries.
//!
//! ## Pipeline
//!
//! - **Input loader**: extracts unique requirement texts from the raw dump
//! - **Checkpoint store**: JSON-backed map of everything generated so far
//! - **Agent**: one Anthropic API call per text, with a flagged fallback
//! - **Driver**: strictly sequential batch loop with periodic checkpointing
//! - **Output**: versioned lookup file plus a flagged-items report

pub mod agent;
pub mod checkpoint;
pub mod config;
pub mod driver;
pub mod input;
pub mod output;
pub mod summary;

pub use checkpoint::CheckpointStore;
pub use config::Config;
pub use summary::SummaryRecord;
