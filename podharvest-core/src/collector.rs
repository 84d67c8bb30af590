//! Incremental scroll-and-extract loop.
//!
//! The collector knows nothing about browsers or selectors. It drives a
//! [`RowSource`], which exposes the episode list as a growing sequence of rows,
//! and stops either when enough records were gathered or when the row count has
//! not grown for `max_stable_attempts` consecutive passes.
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::episode::RawEpisodeRecord;

/// Live, lazily growing list of episode rows.
///
/// Production code backs this with a WebDriver page; tests use scripted
/// in-memory lists.
#[async_trait]
pub trait RowSource: Send {
    /// Opaque handle to one rendered row.
    type Row: Send + Sync;

    /// Fresh read of every row currently in the list container.
    async fn rows(&mut self) -> anyhow::Result<Vec<Self::Row>>;

    /// Read the fields of one row. `Ok(None)` means the row has no title.
    async fn extract(&mut self, row: &Self::Row) -> anyhow::Result<Option<RawEpisodeRecord>>;

    /// Bring `row` into view; the site loads the next batch when the last row is visible.
    async fn scroll_into_view(&mut self, row: &Self::Row) -> anyhow::Result<()>;

    /// Scroll the viewport down by one screen height.
    async fn scroll_viewport(&mut self) -> anyhow::Result<()>;

    /// Give asynchronous rendering time to finish.
    async fn settle(&mut self, delay: Duration);
}

/// Tuning for the plateau detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectorSettings {
    /// Consecutive passes without row growth before the list counts as exhausted.
    pub max_stable_attempts: u32,
    /// Pause between passes.
    pub settle_delay: Duration,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            max_stable_attempts: 12,
            settle_delay: Duration::from_millis(800),
        }
    }
}

/// Why the collector stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    LimitReached,
    Plateau,
}

/// Result of one collection run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectOutcome {
    pub records: Vec<RawEpisodeRecord>,
    /// Number of extraction passes performed.
    pub iterations: u32,
    pub stop: StopReason,
}

/// Drives a [`RowSource`] until `limit` records are gathered or the list plateaus.
#[derive(Debug, Clone, Default)]
pub struct Collector {
    settings: CollectorSettings,
}

impl Collector {
    pub fn new(settings: CollectorSettings) -> Self {
        Self { settings }
    }

    /// Collect up to `limit` records.
    ///
    /// Never fails: row read errors count as an empty list, extraction errors
    /// skip the row and scroll errors are logged. A short (or empty) result
    /// means the list ran dry.
    pub async fn collect<S: RowSource>(&self, source: &mut S, limit: usize) -> CollectOutcome {
        let mut results: Vec<RawEpisodeRecord> = Vec::new();
        let mut prev_row_count = 0usize;
        let mut stable_attempts = 0u32;
        let mut consumed = 0usize;
        let mut iterations = 0u32;

        while results.len() < limit && stable_attempts < self.settings.max_stable_attempts {
            iterations += 1;

            let rows = read_rows(source).await;
            for row in rows.iter().skip(consumed) {
                if results.len() >= limit {
                    break;
                }
                consumed += 1;
                match source.extract(row).await {
                    Ok(Some(record)) => {
                        if results.last().map(|r| r.title.as_str()) == Some(record.title.as_str()) {
                            debug!(target: "collector", title = %record.title, "adjacent duplicate skipped");
                            continue;
                        }
                        results.push(record);
                    }
                    Ok(None) => {}
                    Err(err) => {
                        debug!(target: "collector", error = %err, "row extraction failed; skipping");
                    }
                }
            }

            let rows = read_rows(source).await;
            if rows.len() > prev_row_count {
                prev_row_count = rows.len();
                stable_attempts = 0;
            } else {
                stable_attempts += 1;
            }

            debug!(
                target: "collector",
                iteration = iterations,
                row_count = rows.len(),
                collected = results.len(),
                stable_attempts,
                "pass complete"
            );

            if results.len() >= limit {
                break;
            }

            let scrolled = match rows.last() {
                Some(last) => source.scroll_into_view(last).await,
                None => source.scroll_viewport().await,
            };
            if let Err(err) = scrolled {
                warn!(target: "collector", error = %err, "scroll request failed");
            }

            source.settle(self.settings.settle_delay).await;
        }

        results.truncate(limit);
        let stop = if results.len() >= limit {
            StopReason::LimitReached
        } else {
            StopReason::Plateau
        };
        info!(
            target: "collector",
            collected = results.len(),
            limit,
            iterations,
            stop = ?stop,
            "collection finished"
        );

        CollectOutcome {
            records: results,
            iterations,
            stop,
        }
    }
}

async fn read_rows<S: RowSource>(source: &mut S) -> Vec<S::Row> {
    match source.rows().await {
        Ok(rows) => rows,
        Err(err) => {
            warn!(target: "collector", error = %err, "reading rows failed; treating list as empty");
            Vec::new()
        }
    }
}
