//! Metrics describing a training run.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Reason the selector stopped picking segments.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StopReason {
    /// The remaining budget cannot hold even the shortest candidate.
    BudgetExhausted,
    /// Every candidate was picked, did not fit, or had no marginal benefit left.
    CandidatesExhausted,
}

/// Snapshot recorded for each accepted pick.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SelectionMetrics {
    /// Sequential pick number (1-indexed).
    pub pick: usize,
    /// Length of the selected segment.
    pub segment_len: usize,
    /// Marginal benefit credited to the segment.
    pub marginal_benefit: u64,
    /// Content budget left after the pick.
    pub remaining_budget: usize,
    /// Stale heap entries rescored and re-queued since the previous pick.
    pub rescored: usize,
    /// Time since selection started.
    pub elapsed_total: Duration,
}

/// Wall-clock time spent in each phase.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PhaseTimings {
    /// K-mer indexing.
    pub indexing: Duration,
    /// Candidate extraction and occurrence scanning.
    pub extraction: Duration,
    /// Greedy selection.
    pub selection: Duration,
    /// Dictionary assembly, including entropy statistics in compatible mode.
    pub assembly: Duration,
}

/// Aggregate metrics produced by a training session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrainingMetrics {
    /// Number of samples in the corpus.
    pub samples: usize,
    /// Total corpus bytes.
    pub corpus_bytes: usize,
    /// Samples shorter than the window width, skipped while indexing.
    pub skipped_samples: usize,
    /// Distinct windows in the frequency index.
    pub distinct_kmers: usize,
    /// Distinct windows meeting the minimum sample threshold.
    pub frequent_kmers: usize,
    /// Candidate segments handed to the selector.
    pub candidates: usize,
    /// Per-pick snapshots.
    pub picks: Vec<SelectionMetrics>,
    /// Sum of marginal benefits over the selected segments.
    pub total_benefit: u64,
    /// Content bytes in the dictionary.
    pub content_bytes: usize,
    /// Container header bytes (zero in raw mode).
    pub header_bytes: usize,
    /// Per-phase durations.
    pub timings: PhaseTimings,
    /// Total duration of the training session.
    pub total_duration: Duration,
    /// Resident set size sampled after training, from `/proc/self/status` on Linux.
    pub rss_kb: Option<usize>,
    /// Reason selection terminated.
    pub stop_reason: StopReason,
}

impl TrainingMetrics {
    /// Creates an empty metrics container for a corpus.
    #[must_use]
    pub fn new(samples: usize, corpus_bytes: usize) -> Self {
        Self {
            samples,
            corpus_bytes,
            skipped_samples: 0,
            distinct_kmers: 0,
            frequent_kmers: 0,
            candidates: 0,
            picks: Vec::new(),
            total_benefit: 0,
            content_bytes: 0,
            header_bytes: 0,
            timings: PhaseTimings::default(),
            total_duration: Duration::ZERO,
            rss_kb: None,
            stop_reason: StopReason::CandidatesExhausted,
        }
    }

    /// Number of segments placed in the dictionary.
    #[must_use]
    pub fn segments(&self) -> usize {
        self.picks.len()
    }
}

#[cfg(target_os = "linux")]
fn current_rss_kb() -> Option<usize> {
    use std::fs::File;
    use std::io::{BufRead, BufReader};

    let file = File::open("/proc/self/status").ok()?;
    for line in BufReader::new(file).lines().map_while(Result::ok) {
        if let Some(rest) = line.strip_prefix("VmRSS:") {
            let value = rest
                .split_whitespace()
                .find_map(|part| part.parse::<usize>().ok());
            return value;
        }
    }
    None
}

#[cfg(not(target_os = "linux"))]
fn current_rss_kb() -> Option<usize> {
    None
}

/// Samples the current resident set size (RSS) on supported platforms.
pub fn sample_rss_kb() -> Option<usize> {
    current_rss_kb()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_serialise_to_json() {
        let mut metrics = TrainingMetrics::new(3, 300);
        metrics.picks.push(SelectionMetrics {
            pick: 1,
            segment_len: 64,
            marginal_benefit: 128,
            remaining_budget: 960,
            rescored: 0,
            elapsed_total: Duration::from_millis(2),
        });
        let json = serde_json::to_string(&metrics).unwrap();
        let back: TrainingMetrics = serde_json::from_str(&json).unwrap();
        assert_eq!(back, metrics);
        assert_eq!(back.segments(), 1);
    }
}
