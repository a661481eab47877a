//! K-mer frequency index over the training corpus.
//!
//! Every overlapping `width`-byte window of every sample is counted.  Windows are keyed by
//! their rolling hash, but a hash only selects a bucket: records inside a bucket are told
//! apart by comparing the window bytes, so colliding windows never share a record.

use rayon::prelude::*;
use rustc_hash::FxHashMap;

use crate::cancel::CancelToken;
use crate::error::{DictError, Phase, Result};
use crate::hash::{for_each_window, hash_window};

/// Sorted set of distinct sample indices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleSet(Vec<u32>);

impl SampleSet {
    /// Set holding a single sample.
    #[must_use]
    pub fn single(sample: u32) -> Self {
        Self(vec![sample])
    }

    /// Adds `sample`, which must not precede any member already present.
    pub fn push_ascending(&mut self, sample: u32) {
        match self.0.last() {
            Some(&last) if last == sample => {}
            Some(&last) => {
                debug_assert!(last < sample, "samples must arrive in ascending order");
                self.0.push(sample);
            }
            None => self.0.push(sample),
        }
    }

    /// Merges `other` into `self`.
    pub fn union(&mut self, other: &SampleSet) {
        if other.0.is_empty() {
            return;
        }
        if self.0.last().is_some_and(|&last| last < other.0[0]) {
            self.0.extend_from_slice(&other.0);
            return;
        }
        let mut merged = Vec::with_capacity(self.0.len() + other.0.len());
        let (mut a, mut b) = (0usize, 0usize);
        while a < self.0.len() && b < other.0.len() {
            let (left, right) = (self.0[a], other.0[b]);
            if left <= right {
                merged.push(left);
                a += 1;
                if left == right {
                    b += 1;
                }
            } else {
                merged.push(right);
                b += 1;
            }
        }
        merged.extend_from_slice(&self.0[a..]);
        merged.extend_from_slice(&other.0[b..]);
        self.0 = merged;
    }

    /// Number of distinct samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when no sample is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns `true` when `sample` is a member.
    #[must_use]
    pub fn contains(&self, sample: u32) -> bool {
        self.0.binary_search(&sample).is_ok()
    }

    /// Members in ascending order.
    #[must_use]
    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }
}

/// Occurrence statistics for one distinct window.
#[derive(Debug, Clone)]
pub struct KmerRecord {
    sample: u32,
    offset: u32,
    count: u64,
    samples: SampleSet,
}

impl KmerRecord {
    fn new(sample: u32, offset: u32) -> Self {
        Self {
            sample,
            offset,
            count: 1,
            samples: SampleSet::single(sample),
        }
    }

    /// Total `(sample, offset)` occurrences of the window.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Distinct samples containing the window.
    #[must_use]
    pub fn samples(&self) -> &SampleSet {
        &self.samples
    }

    /// Number of distinct samples containing the window.
    #[must_use]
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// A representative `(sample, offset)` where the window occurs.
    #[must_use]
    pub fn position(&self) -> (usize, usize) {
        (self.sample as usize, self.offset as usize)
    }

    fn absorb(&mut self, other: &KmerRecord) {
        self.count += other.count;
        self.samples.union(&other.samples);
    }
}

type Buckets = FxHashMap<u64, Vec<KmerRecord>>;

/// Frequency table mapping each distinct window to its [`KmerRecord`].
#[derive(Debug)]
pub struct KmerIndex<'a> {
    corpus: &'a [&'a [u8]],
    width: usize,
    buckets: Buckets,
    distinct: usize,
    windows: u64,
}

impl<'a> KmerIndex<'a> {
    /// Scans every sample of `corpus` and counts its `width`-byte windows.
    ///
    /// Samples shorter than `width` contribute nothing.  Work is split per sample and the
    /// partial tables are merged by summing counts and unioning sample sets, so the result
    /// does not depend on scheduling.
    pub fn build(corpus: &'a [&'a [u8]], width: usize, cancel: &CancelToken) -> Result<Self> {
        let buckets = corpus
            .par_iter()
            .enumerate()
            .map(|(sample, data)| {
                cancel.checkpoint(Phase::Indexing)?;
                Ok::<_, DictError>(index_sample(corpus, sample, data, width))
            })
            .try_reduce(Buckets::default, |acc, local| {
                Ok(merge_buckets(corpus, width, acc, local))
            })?;

        let distinct = buckets.values().map(Vec::len).sum();
        let windows = buckets
            .values()
            .flat_map(|bucket| bucket.iter().map(KmerRecord::count))
            .sum();
        Ok(Self {
            corpus,
            width,
            buckets,
            distinct,
            windows,
        })
    }

    /// Window width in bytes.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of distinct windows.
    #[must_use]
    pub fn distinct(&self) -> usize {
        self.distinct
    }

    /// Total number of windows scanned.
    #[must_use]
    pub fn total_windows(&self) -> u64 {
        self.windows
    }

    /// Number of distinct windows present in at least `min_samples` samples.
    #[must_use]
    pub fn frequent(&self, min_samples: usize) -> usize {
        self.records()
            .filter(|record| record.sample_count() >= min_samples)
            .count()
    }

    /// Iterates every record in unspecified order.
    pub fn records(&self) -> impl Iterator<Item = &KmerRecord> + '_ {
        self.buckets.values().flatten()
    }

    /// Looks up `window`, whose hash the caller already computed.
    #[must_use]
    pub fn lookup_hashed(&self, hash: u64, window: &[u8]) -> Option<&KmerRecord> {
        self.buckets
            .get(&hash)?
            .iter()
            .find(|record| window_of(self.corpus, self.width, record) == window)
    }

    /// Looks up `window`, returning `None` when it never occurs or has the wrong width.
    #[must_use]
    pub fn lookup(&self, window: &[u8]) -> Option<&KmerRecord> {
        if window.len() != self.width {
            return None;
        }
        self.lookup_hashed(hash_window(window), window)
    }
}

fn window_of<'c>(corpus: &'c [&[u8]], width: usize, record: &KmerRecord) -> &'c [u8] {
    let (sample, offset) = record.position();
    &corpus[sample][offset..offset + width]
}

fn index_sample(corpus: &[&[u8]], sample: usize, data: &[u8], width: usize) -> Buckets {
    let mut local = Buckets::default();
    for_each_window(data, width, |offset, hash| {
        record_window(&mut local, corpus, width, sample, offset, hash);
    });
    local
}

/// Counts the window at `offset` of `sample` under `hash`, matching existing records by bytes.
fn record_window(
    buckets: &mut Buckets,
    corpus: &[&[u8]],
    width: usize,
    sample: usize,
    offset: usize,
    hash: u64,
) {
    let window = &corpus[sample][offset..offset + width];
    let sample_id = sample as u32;
    let bucket = buckets.entry(hash).or_default();
    match bucket
        .iter_mut()
        .find(|record| window_of(corpus, width, record) == window)
    {
        Some(record) => {
            record.count += 1;
            record.samples.push_ascending(sample_id);
        }
        None => bucket.push(KmerRecord::new(sample_id, offset as u32)),
    }
}

fn merge_buckets(corpus: &[&[u8]], width: usize, acc: Buckets, local: Buckets) -> Buckets {
    let (mut larger, smaller) = if acc.len() >= local.len() {
        (acc, local)
    } else {
        (local, acc)
    };
    for (hash, records) in smaller {
        let bucket = larger.entry(hash).or_default();
        for record in records {
            let window = window_of(corpus, width, &record);
            match bucket
                .iter_mut()
                .find(|existing| window_of(corpus, width, existing) == window)
            {
                Some(existing) => existing.absorb(&record),
                None => bucket.push(record),
            }
        }
    }
    larger
}
