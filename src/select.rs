//! Lazy-greedy coverage selection under a byte budget.
//!
//! Candidates are ranked by benefit per byte.  Once a segment is chosen, the corpus bytes it
//! covers no longer count towards any other candidate, so scores only ever shrink.  Heap
//! entries may therefore be stale; the top entry is rescored before it is accepted and
//! pushed back when it no longer beats the runner-up.
//!
//! The pick order never looks at the budget.  When the best remaining candidate overflows
//! it, the prefix that still fits becomes the last pick, so a larger budget always selects a
//! superset of the bytes a smaller one does.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Instant;

use log::debug;

use crate::cancel::CancelToken;
use crate::error::{Phase, Result};
use crate::metrics::{SelectionMetrics, StopReason};
use crate::segment::Candidate;

/// Per-sample bitmap of bytes already served by selected segments.
#[derive(Debug, Clone)]
pub struct Coverage {
    bits: Vec<Vec<u64>>,
}

impl Coverage {
    /// Creates an empty coverage map for samples of the given lengths.
    pub fn new<I>(sample_lens: I) -> Self
    where
        I: IntoIterator<Item = usize>,
    {
        let bits = sample_lens
            .into_iter()
            .map(|len| vec![0u64; len.div_ceil(64)])
            .collect();
        Self { bits }
    }

    #[inline]
    fn is_covered(&self, sample: usize, pos: usize) -> bool {
        self.bits[sample][pos / 64] & (1u64 << (pos % 64)) != 0
    }

    /// Marks `start..end` of `sample` as covered.
    pub fn cover(&mut self, sample: usize, start: usize, end: usize) {
        let words = &mut self.bits[sample];
        for pos in start..end {
            words[pos / 64] |= 1u64 << (pos % 64);
        }
    }

    /// Counts uncovered bytes of `start..end` that sit in uncovered stretches of at least
    /// `min_run` bytes; shorter gaps are too small to be matched profitably.
    #[must_use]
    pub fn uncovered(&self, sample: usize, start: usize, end: usize, min_run: usize) -> u64 {
        let mut total = 0u64;
        let mut run = 0usize;
        for pos in start..end {
            if self.is_covered(sample, pos) {
                if run >= min_run {
                    total += run as u64;
                }
                run = 0;
            } else {
                run += 1;
            }
        }
        if run >= min_run {
            total += run as u64;
        }
        total
    }

    /// Marginal benefit of `candidate` given the current coverage.
    #[must_use]
    pub fn marginal(&self, candidate: &Candidate, min_run: usize) -> u64 {
        self.marginal_prefix(candidate, candidate.len(), min_run)
    }

    /// Marginal benefit of the first `len` bytes of `candidate`.
    #[must_use]
    pub fn marginal_prefix(&self, candidate: &Candidate, len: usize, min_run: usize) -> u64 {
        let len = len.min(candidate.len());
        candidate
            .occurrences()
            .iter()
            .map(|occ| {
                let start = occ.offset as usize;
                self.uncovered(occ.sample as usize, start, start + len, min_run)
            })
            .sum()
    }

    fn cover_prefix(&mut self, candidate: &Candidate, len: usize) {
        for occ in candidate.occurrences() {
            let start = occ.offset as usize;
            self.cover(occ.sample as usize, start, start + len);
        }
    }
}

/// A segment chosen for the dictionary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedSegment {
    /// Segment bytes.
    pub content: Vec<u8>,
    /// Marginal benefit at the moment the segment was picked.
    pub benefit: u64,
    /// Corpus-order rank of the originating candidate.
    pub rank: usize,
    /// Number of corpus occurrences of the segment.
    pub occurrences: usize,
}

/// Result of a selection pass.
#[derive(Debug, Clone)]
pub struct Selection {
    /// Segments in pick order.
    pub segments: Vec<SelectedSegment>,
    /// Why selection stopped.
    pub stop_reason: StopReason,
    /// One record per accepted pick.
    pub picks: Vec<SelectionMetrics>,
    /// Number of candidates considered.
    pub candidates: usize,
}

impl Selection {
    /// Total content bytes of the selected segments.
    #[must_use]
    pub fn content_len(&self) -> usize {
        self.segments.iter().map(|segment| segment.content.len()).sum()
    }

    /// Sum of marginal benefits of the selected segments.
    #[must_use]
    pub fn total_benefit(&self) -> u64 {
        self.segments.iter().map(|segment| segment.benefit).sum()
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
struct SegmentScore {
    benefit: u64,
    len: usize,
    rank: usize,
    id: usize,
}

impl Ord for SegmentScore {
    fn cmp(&self, other: &Self) -> Ordering {
        let lhs = u128::from(self.benefit) * other.len as u128;
        let rhs = u128::from(other.benefit) * self.len as u128;
        lhs.cmp(&rhs)
            .then_with(|| self.len.cmp(&other.len))
            .then_with(|| other.rank.cmp(&self.rank))
    }
}

impl PartialOrd for SegmentScore {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Picks segments whose total length stays within `budget`, approximately maximising the
/// covered corpus bytes.
///
/// `sample_lens` are the corpus sample lengths and `min_run` the shortest uncovered stretch
/// that still counts as a saving.  Selection stops once less than `min_run` bytes of budget
/// remain, or right after a pick had to be cut down to the remaining budget.
pub fn select(
    candidates: &[Candidate],
    sample_lens: &[usize],
    budget: usize,
    min_run: usize,
    cancel: &CancelToken,
) -> Result<Selection> {
    let mut heap: BinaryHeap<SegmentScore> = candidates
        .iter()
        .enumerate()
        .filter(|(_, candidate)| candidate.benefit() > 0)
        .map(|(id, candidate)| SegmentScore {
            benefit: candidate.benefit(),
            len: candidate.len(),
            rank: candidate.rank(),
            id,
        })
        .collect();

    let mut coverage = Coverage::new(sample_lens.iter().copied());
    let mut remaining = budget;
    let mut segments = Vec::new();
    let mut picks = Vec::new();
    let mut rescored = 0usize;
    let start = Instant::now();

    let stop_reason = loop {
        if remaining < min_run.max(1) {
            break StopReason::BudgetExhausted;
        }
        let Some(top) = heap.pop() else {
            break StopReason::CandidatesExhausted;
        };
        let candidate = &candidates[top.id];
        let marginal = coverage.marginal(candidate, min_run);
        if marginal == 0 {
            continue;
        }
        let fresh = SegmentScore {
            benefit: marginal,
            ..top
        };
        if marginal < top.benefit && heap.peek().is_some_and(|next| *next > fresh) {
            rescored += 1;
            heap.push(fresh);
            continue;
        }

        cancel.checkpoint(Phase::Selection)?;
        let clipped = candidate.len() > remaining;
        let (len, benefit) = if clipped {
            (remaining, coverage.marginal_prefix(candidate, remaining, min_run))
        } else {
            (candidate.len(), marginal)
        };
        if benefit > 0 {
            coverage.cover_prefix(candidate, len);
            remaining -= len;
            segments.push(SelectedSegment {
                content: candidate.content()[..len].to_vec(),
                benefit,
                rank: candidate.rank(),
                occurrences: candidate.occurrences().len(),
            });
            picks.push(SelectionMetrics {
                pick: segments.len(),
                segment_len: len,
                marginal_benefit: benefit,
                remaining_budget: remaining,
                rescored,
                elapsed_total: start.elapsed(),
            });
            debug!(
                "pick {:>4} len {:>6} benefit {:>8} remaining {:>8}{}",
                segments.len(),
                len,
                benefit,
                remaining,
                if clipped { " (clipped)" } else { "" }
            );
        }
        rescored = 0;
        if clipped {
            break StopReason::BudgetExhausted;
        }
    };

    Ok(Selection {
        segments,
        stop_reason,
        picks,
        candidates: candidates.len(),
    })
}
