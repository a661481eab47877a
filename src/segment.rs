//! Candidate segment extraction.
//!
//! Runs of consecutive windows that recur across samples are stitched into longer
//! segments.  Identical segments collapse into one [`Candidate`], and every sample is then
//! rescanned so a candidate also learns about occurrences buried inside longer runs
//! elsewhere in the corpus.

use rayon::prelude::*;
use rustc_hash::FxHashMap;

use crate::cancel::CancelToken;
use crate::error::{Phase, Result};
use crate::hash::{for_each_window, hash_window};
use crate::index::KmerIndex;

/// One place in the corpus where a candidate's content occurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Occurrence {
    /// Index of the sample.
    pub sample: u32,
    /// Byte offset inside the sample.
    pub offset: u32,
}

/// A contiguous byte run proposed for inclusion in the dictionary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    content: Vec<u8>,
    occurrences: Vec<Occurrence>,
    sample_count: usize,
    benefit: u64,
    rank: usize,
}

impl Candidate {
    /// Segment bytes.
    #[must_use]
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Segment length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// Always `false`; segments are at least one window long.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Non-overlapping occurrences in corpus order.
    #[must_use]
    pub fn occurrences(&self) -> &[Occurrence] {
        &self.occurrences
    }

    /// Number of distinct samples holding at least one occurrence.
    #[must_use]
    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    /// Distinct contributing sample indices, ascending.
    #[must_use]
    pub fn samples(&self) -> Vec<u32> {
        let mut samples: Vec<u32> = self.occurrences.iter().map(|occ| occ.sample).collect();
        samples.dedup();
        samples
    }

    /// Estimated literal bytes saved across the corpus: length times occurrences.
    #[must_use]
    pub fn benefit(&self) -> u64 {
        self.benefit
    }

    /// Position of the candidate in corpus order of first discovery; lower is earlier.
    #[must_use]
    pub fn rank(&self) -> usize {
        self.rank
    }
}

/// Longest candidate the trainer proposes, independent of the dictionary budget.
pub const MAX_SEGMENT_LEN: usize = 64 * 1024;

/// Tunables for [`extract`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractParams {
    /// Minimum distinct samples for a window to extend a run and for a segment to survive.
    pub min_sample_count: usize,
    /// Runs longer than this are split into pieces of at most this many bytes.
    pub max_segment_len: usize,
}

/// Builds deduplicated, scored candidates from the frequency index.
///
/// Output is ordered by [`Candidate::rank`].
pub fn extract(
    corpus: &[&[u8]],
    index: &KmerIndex<'_>,
    params: &ExtractParams,
    cancel: &CancelToken,
) -> Result<Vec<Candidate>> {
    let width = index.width();
    let min_samples = params.min_sample_count.max(1);
    let max_len = params.max_segment_len.max(width);

    let runs: Vec<Vec<(usize, usize)>> = corpus
        .par_iter()
        .map(|data| {
            cancel.checkpoint(Phase::Extraction)?;
            Ok(frequent_runs(data, index, min_samples, max_len))
        })
        .collect::<Result<_>>()?;

    let mut seen: FxHashMap<&[u8], usize> = FxHashMap::default();
    let mut contents: Vec<&[u8]> = Vec::new();
    for (sample, sample_runs) in runs.iter().enumerate() {
        for &(offset, len) in sample_runs {
            let content = &corpus[sample][offset..offset + len];
            seen.entry(content).or_insert_with(|| {
                contents.push(content);
                contents.len() - 1
            });
        }
    }
    if contents.is_empty() {
        return Ok(Vec::new());
    }

    let mut anchors: FxHashMap<u64, Vec<u32>> = FxHashMap::default();
    for (id, content) in contents.iter().enumerate() {
        anchors
            .entry(hash_window(&content[..width]))
            .or_default()
            .push(id as u32);
    }

    let found: Vec<Vec<(u32, usize)>> = corpus
        .par_iter()
        .map(|data| {
            cancel.checkpoint(Phase::Extraction)?;
            Ok(scan_occurrences(data, width, &contents, &anchors))
        })
        .collect::<Result<_>>()?;

    let mut occurrences: Vec<Vec<Occurrence>> = vec![Vec::new(); contents.len()];
    for (sample, hits) in found.into_iter().enumerate() {
        for (id, offset) in hits {
            occurrences[id as usize].push(Occurrence {
                sample: sample as u32,
                offset: offset as u32,
            });
        }
    }

    let candidates = contents
        .into_iter()
        .zip(occurrences)
        .enumerate()
        .filter_map(|(rank, (content, occurrences))| {
            let mut sample_count = 0usize;
            let mut last = None;
            for occ in &occurrences {
                if last != Some(occ.sample) {
                    sample_count += 1;
                    last = Some(occ.sample);
                }
            }
            if sample_count < min_samples {
                return None;
            }
            let benefit = content.len() as u64 * occurrences.len() as u64;
            Some(Candidate {
                content: content.to_vec(),
                occurrences,
                sample_count,
                benefit,
                rank,
            })
        })
        .collect();
    Ok(candidates)
}

/// Maximal runs of frequent windows in `data`, as `(offset, len)` byte ranges split to
/// at most `max_len` bytes.
fn frequent_runs(
    data: &[u8],
    index: &KmerIndex<'_>,
    min_samples: usize,
    max_len: usize,
) -> Vec<(usize, usize)> {
    let width = index.width();
    let mut runs = Vec::new();
    let mut start: Option<usize> = None;
    let mut last = 0usize;
    for_each_window(data, width, |offset, hash| {
        let window = &data[offset..offset + width];
        let frequent = index
            .lookup_hashed(hash, window)
            .is_some_and(|record| record.sample_count() >= min_samples);
        if frequent {
            if start.is_none() {
                start = Some(offset);
            }
            last = offset;
        } else if let Some(begin) = start.take() {
            split_run(begin, last + width, width, max_len, &mut runs);
        }
    });
    if let Some(begin) = start {
        split_run(begin, last + width, width, max_len, &mut runs);
    }
    runs
}

fn split_run(start: usize, end: usize, width: usize, max_len: usize, out: &mut Vec<(usize, usize)>) {
    let mut offset = start;
    while offset < end {
        let len = (end - offset).min(max_len);
        if len >= width {
            out.push((offset, len));
        }
        offset += len;
    }
}

/// Finds non-overlapping occurrences of every anchored candidate inside `data`.
fn scan_occurrences(
    data: &[u8],
    width: usize,
    contents: &[&[u8]],
    anchors: &FxHashMap<u64, Vec<u32>>,
) -> Vec<(u32, usize)> {
    let mut hits = Vec::new();
    let mut next_free: FxHashMap<u32, usize> = FxHashMap::default();
    for_each_window(data, width, |offset, hash| {
        let Some(ids) = anchors.get(&hash) else {
            return;
        };
        for &id in ids {
            if next_free.get(&id).is_some_and(|&free| offset < free) {
                continue;
            }
            let content = contents[id as usize];
            let end = offset + content.len();
            if end <= data.len() && &data[offset..end] == content {
                hits.push((id, offset));
                next_free.insert(id, end);
            }
        }
    });
    hits
}
