//! Entropy tables for the Zstandard dictionary container.
//!
//! A greedy LZ parse of every sample against the dictionary content yields literal, offset,
//! match-length and literal-length statistics.  The statistics are smoothed so every code
//! the decoder may meet keeps a non-zero probability, then serialised as a direct-weight
//! Huffman literal table followed by three FSE normalised-count tables.

use rayon::prelude::*;
use rustc_hash::FxHashMap;

use crate::cancel::CancelToken;
use crate::config::CompressionLevel;
use crate::error::{Phase, Result};

/// Shortest match emitted by the statistics parse.
pub const MIN_MATCH: usize = 4;

/// Largest literal symbol carried by the literal table; higher bytes get weight zero.
pub const MAX_LITERAL_SYMBOL: usize = 128;

const MAX_LL_CODE: usize = 35;
const MAX_ML_CODE: usize = 52;
const MAX_OF_CODE: usize = 31;

const HUF_MAX_BITS: u8 = 11;
const OF_TABLE_LOG: u32 = 8;
const ML_TABLE_LOG: u32 = 9;
const LL_TABLE_LOG: u32 = 9;
const FSE_MIN_TABLE_LOG: u32 = 5;
const FSE_MAX_TABLE_LOG: u32 = 15;

/// Initial repeat offsets stored after the tables.
pub const REPEAT_OFFSETS: [u32; 3] = [1, 4, 8];

#[rustfmt::skip]
const LL_CODES: [u8; 64] = [
     0,  1,  2,  3,  4,  5,  6,  7,  8,  9, 10, 11, 12, 13, 14, 15,
    16, 16, 17, 17, 18, 18, 19, 19, 20, 20, 20, 20, 21, 21, 21, 21,
    22, 22, 22, 22, 22, 22, 22, 22, 23, 23, 23, 23, 23, 23, 23, 23,
    24, 24, 24, 24, 24, 24, 24, 24, 24, 24, 24, 24, 24, 24, 24, 24,
];

#[rustfmt::skip]
const ML_CODES: [u8; 128] = [
     0,  1,  2,  3,  4,  5,  6,  7,  8,  9, 10, 11, 12, 13, 14, 15,
    16, 17, 18, 19, 20, 21, 22, 23, 24, 25, 26, 27, 28, 29, 30, 31,
    32, 32, 33, 33, 34, 34, 35, 35, 36, 36, 36, 36, 37, 37, 37, 37,
    38, 38, 38, 38, 38, 38, 38, 38, 39, 39, 39, 39, 39, 39, 39, 39,
    40, 40, 40, 40, 40, 40, 40, 40, 40, 40, 40, 40, 40, 40, 40, 40,
    41, 41, 41, 41, 41, 41, 41, 41, 41, 41, 41, 41, 41, 41, 41, 41,
    42, 42, 42, 42, 42, 42, 42, 42, 42, 42, 42, 42, 42, 42, 42, 42,
    42, 42, 42, 42, 42, 42, 42, 42, 42, 42, 42, 42, 42, 42, 42, 42,
];

#[inline]
fn highbit(value: u32) -> u32 {
    debug_assert!(value > 0);
    31 - value.leading_zeros()
}

/// Literal-length code for a run of `len` literals.
#[must_use]
pub fn ll_code(len: usize) -> usize {
    if len < LL_CODES.len() {
        LL_CODES[len] as usize
    } else {
        let len = u32::try_from(len).unwrap_or(u32::MAX);
        (highbit(len) as usize + 19).min(MAX_LL_CODE)
    }
}

/// Match-length code for a match of `len >= 3` bytes.
#[must_use]
pub fn ml_code(len: usize) -> usize {
    let base = len.saturating_sub(3);
    if base < ML_CODES.len() {
        ML_CODES[base] as usize
    } else {
        let base = u32::try_from(base).unwrap_or(u32::MAX);
        (highbit(base) as usize + 36).min(MAX_ML_CODE)
    }
}

/// Offset code for a plain (non-repeat) match distance.
#[must_use]
pub fn of_code(offset: usize) -> usize {
    let base = u32::try_from(offset.saturating_add(3)).unwrap_or(u32::MAX);
    (highbit(base) as usize).min(MAX_OF_CODE)
}

/// Histograms gathered by the statistics parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceStats {
    /// Literal byte frequencies.
    pub literals: Vec<u64>,
    /// Literal-length code frequencies.
    pub lit_lengths: Vec<u64>,
    /// Match-length code frequencies.
    pub match_lengths: Vec<u64>,
    /// Offset code frequencies.
    pub offsets: Vec<u64>,
    /// Number of sequences emitted.
    pub sequences: u64,
}

impl Default for SequenceStats {
    fn default() -> Self {
        Self {
            literals: vec![0; 256],
            lit_lengths: vec![0; MAX_LL_CODE + 1],
            match_lengths: vec![0; MAX_ML_CODE + 1],
            offsets: vec![0; MAX_OF_CODE + 1],
            sequences: 0,
        }
    }
}

impl SequenceStats {
    fn add_literals(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.literals[byte as usize] += 1;
        }
    }

    fn record(&mut self, literals: &[u8], match_len: usize, offset: usize) {
        self.add_literals(literals);
        self.lit_lengths[ll_code(literals.len())] += 1;
        self.match_lengths[ml_code(match_len)] += 1;
        self.offsets[of_code(offset)] += 1;
        self.sequences += 1;
    }

    fn merge(mut self, other: SequenceStats) -> Self {
        for (dst, src) in [
            (&mut self.literals, &other.literals),
            (&mut self.lit_lengths, &other.lit_lengths),
            (&mut self.match_lengths, &other.match_lengths),
            (&mut self.offsets, &other.offsets),
        ] {
            for (a, b) in dst.iter_mut().zip(src) {
                *a += b;
            }
        }
        self.sequences += other.sequences;
        self
    }
}

const NO_POS: usize = usize::MAX;

/// Hash chain over the 4-byte prefixes of one buffer.
struct MatchChain {
    head: FxHashMap<u32, usize>,
    prev: Vec<usize>,
}

impl MatchChain {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            head: FxHashMap::default(),
            prev: Vec::with_capacity(capacity),
        }
    }

    fn over(data: &[u8]) -> Self {
        let mut chain = Self::with_capacity(data.len());
        if data.len() >= MIN_MATCH {
            for pos in 0..=data.len() - MIN_MATCH {
                chain.insert(key_at(data, pos), pos);
            }
        }
        chain
    }

    /// Positions must be inserted in ascending order without gaps.
    fn insert(&mut self, key: u32, pos: usize) {
        debug_assert_eq!(pos, self.prev.len());
        let previous = self.head.insert(key, pos).unwrap_or(NO_POS);
        self.prev.push(previous);
    }

    fn first(&self, key: u32) -> usize {
        self.head.get(&key).copied().unwrap_or(NO_POS)
    }

    fn next(&self, pos: usize) -> usize {
        self.prev[pos]
    }
}

#[inline]
fn key_at(data: &[u8], pos: usize) -> u32 {
    u32::from_le_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]])
}

#[inline]
fn common_prefix(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

fn search_depth(level: CompressionLevel) -> usize {
    match level {
        CompressionLevel::Fastest => 2,
        CompressionLevel::Default => 8,
        CompressionLevel::Better => 32,
        CompressionLevel::Best => 128,
    }
}

fn parse_sample(
    sample: &[u8],
    content: &[u8],
    content_chain: &MatchChain,
    depth: usize,
) -> SequenceStats {
    let mut stats = SequenceStats::default();
    if sample.len() < MIN_MATCH {
        stats.add_literals(sample);
        return stats;
    }
    let last = sample.len() - MIN_MATCH;
    let mut chain = MatchChain::with_capacity(sample.len());
    let mut pos = 0usize;
    let mut anchor = 0usize;

    while pos <= last {
        let key = key_at(sample, pos);
        let mut best_len = 0usize;
        let mut best_offset = 0usize;

        let mut candidate = chain.first(key);
        let mut steps = 0usize;
        while candidate != NO_POS && steps < depth {
            let len = common_prefix(&sample[candidate..], &sample[pos..]);
            if len > best_len {
                best_len = len;
                best_offset = pos - candidate;
            }
            candidate = chain.next(candidate);
            steps += 1;
        }

        let mut candidate = content_chain.first(key);
        steps = 0;
        while candidate != NO_POS && steps < depth {
            let mut len = common_prefix(&content[candidate..], &sample[pos..]);
            if candidate + len == content.len() {
                len += common_prefix(sample, &sample[pos + len..]);
            }
            if len > best_len {
                best_len = len;
                best_offset = content.len() - candidate + pos;
            }
            candidate = content_chain.next(candidate);
            steps += 1;
        }

        chain.insert(key, pos);
        if best_len >= MIN_MATCH {
            stats.record(&sample[anchor..pos], best_len, best_offset);
            let end = pos + best_len;
            for next in pos + 1..end.min(last + 1) {
                chain.insert(key_at(sample, next), next);
            }
            pos = end;
            anchor = end;
        } else {
            pos += 1;
        }
    }
    stats.add_literals(&sample[anchor..]);
    stats
}

/// Parses every sample against `content` and accumulates sequence statistics.
///
/// Samples are parsed in parallel; histograms are summed, so the result does not depend on
/// scheduling.
pub fn collect_stats(
    content: &[u8],
    corpus: &[&[u8]],
    level: CompressionLevel,
    cancel: &CancelToken,
) -> Result<SequenceStats> {
    let content_chain = MatchChain::over(content);
    let depth = search_depth(level);
    corpus
        .par_iter()
        .map(|sample| {
            cancel.checkpoint(Phase::Assembly)?;
            Ok(parse_sample(sample, content, &content_chain, depth))
        })
        .try_reduce(SequenceStats::default, |acc, stats| Ok(acc.merge(stats)))
}

/// Code lengths of a Huffman code over `counts`, no longer than `max_bits`.
///
/// Zero counts are treated as one so every symbol receives a code.  When the optimal tree is
/// too deep the counts are flattened and the tree rebuilt.
#[must_use]
pub fn huffman_lengths(counts: &[u64], max_bits: u8) -> Vec<u8> {
    let mut weights: Vec<u64> = counts.iter().map(|&count| count.max(1)).collect();
    loop {
        let lengths = tree_depths(&weights);
        if lengths.iter().all(|&len| len <= max_bits) {
            return lengths;
        }
        for weight in &mut weights {
            *weight = (*weight >> 1) + 1;
        }
    }
}

fn tree_depths(weights: &[u64]) -> Vec<u8> {
    use std::cmp::Reverse;
    use std::collections::BinaryHeap;

    let leaves = weights.len();
    if leaves < 2 {
        return vec![1; leaves];
    }
    let mut parent = vec![0usize; 2 * leaves - 1];
    let mut heap: BinaryHeap<Reverse<(u64, usize)>> = weights
        .iter()
        .enumerate()
        .map(|(id, &weight)| Reverse((weight, id)))
        .collect();
    let mut next = leaves;
    while heap.len() > 1 {
        let (Some(Reverse((wa, a))), Some(Reverse((wb, b)))) = (heap.pop(), heap.pop()) else {
            break;
        };
        parent[a] = next;
        parent[b] = next;
        heap.push(Reverse((wa + wb, next)));
        next += 1;
    }
    // Parents always carry larger ids than their children.
    let root = next - 1;
    let mut depth = vec![0u8; next];
    for id in (0..root).rev() {
        depth[id] = depth[parent[id]].saturating_add(1);
    }
    depth.truncate(leaves);
    depth
}

/// Serialises the literal table in direct weight representation.
///
/// Symbols `0..=MAX_LITERAL_SYMBOL` get a code; the last symbol's weight is implied by
/// the others and therefore not written.
#[must_use]
pub fn write_huffman_table(literals: &[u64]) -> Vec<u8> {
    let counts: Vec<u64> = (0..=MAX_LITERAL_SYMBOL)
        .map(|symbol| literals.get(symbol).copied().unwrap_or(0) + 1)
        .collect();
    let lengths = huffman_lengths(&counts, HUF_MAX_BITS);
    let max_len = lengths.iter().copied().max().unwrap_or(1);
    let weights: Vec<u8> = lengths.iter().map(|&len| max_len + 1 - len).collect();

    let explicit = &weights[..MAX_LITERAL_SYMBOL];
    let mut out = Vec::with_capacity(1 + explicit.len().div_ceil(2));
    out.push(127 + explicit.len() as u8);
    for pair in explicit.chunks(2) {
        let high = pair[0];
        let low = pair.get(1).copied().unwrap_or(0);
        out.push((high << 4) | low);
    }
    out
}

/// Scales `counts` to a distribution summing to `1 << table_log`.
///
/// Every non-zero count keeps at least one slot.
#[must_use]
pub fn normalize_counts(counts: &[u64], table_log: u32) -> Vec<i16> {
    let table_size = 1i64 << table_log;
    let total: u64 = counts.iter().sum();
    if total == 0 {
        return vec![0; counts.len()];
    }
    let mut normalized: Vec<i64> = counts
        .iter()
        .map(|&count| {
            if count == 0 {
                0
            } else {
                ((u128::from(count) * table_size as u128 / u128::from(total)) as i64).max(1)
            }
        })
        .collect();

    let mut sum: i64 = normalized.iter().sum();
    while sum != table_size {
        let Some((largest, _)) = normalized
            .iter()
            .enumerate()
            .max_by(|(ia, a), (ib, b)| a.cmp(b).then_with(|| ib.cmp(ia)))
        else {
            break;
        };
        if sum < table_size {
            normalized[largest] += table_size - sum;
            sum = table_size;
        } else {
            let take = (sum - table_size).min(normalized[largest] - 1);
            if take == 0 {
                break;
            }
            normalized[largest] -= take;
            sum -= take;
        }
    }
    normalized.into_iter().map(|count| count as i16).collect()
}

struct BitWriter {
    out: Vec<u8>,
    acc: u64,
    bits: u32,
}

impl BitWriter {
    fn new() -> Self {
        Self {
            out: Vec::new(),
            acc: 0,
            bits: 0,
        }
    }

    fn write(&mut self, value: u32, nbits: u32) {
        let mask = (1u64 << nbits) - 1;
        self.acc |= (u64::from(value) & mask) << self.bits;
        self.bits += nbits;
        while self.bits >= 8 {
            self.out.push(self.acc as u8);
            self.acc >>= 8;
            self.bits -= 8;
        }
    }

    fn finish(mut self) -> Vec<u8> {
        if self.bits > 0 {
            self.out.push(self.acc as u8);
        }
        self.out
    }
}

/// Serialises a normalised distribution in the FSE table header format.
#[must_use]
pub fn write_ncount(normalized: &[i16], table_log: u32) -> Vec<u8> {
    let mut writer = BitWriter::new();
    writer.write(table_log - FSE_MIN_TABLE_LOG, 4);

    let mut remaining = (1i32 << table_log) + 1;
    let mut threshold = 1i32 << table_log;
    let mut nb_bits = table_log + 1;
    let mut symbol = 0usize;
    let mut previous_zero = false;

    while symbol < normalized.len() && remaining > 1 {
        if previous_zero {
            let start = symbol;
            while symbol < normalized.len() && normalized[symbol] == 0 {
                symbol += 1;
            }
            if symbol == normalized.len() {
                break;
            }
            let mut run = symbol - start;
            while run >= 3 {
                writer.write(3, 2);
                run -= 3;
            }
            writer.write(run as u32, 2);
        }
        let count = i32::from(normalized[symbol]);
        symbol += 1;
        let max = 2 * threshold - 1 - remaining;
        remaining -= count.abs();
        let mut value = count + 1;
        if value >= threshold {
            value += max;
        }
        let width = if value < max { nb_bits - 1 } else { nb_bits };
        writer.write(value as u32, width);
        previous_zero = value == 1;
        while remaining < threshold {
            nb_bits -= 1;
            threshold >>= 1;
        }
    }
    debug_assert_eq!(remaining, 1, "distribution must sum to the table size");
    writer.finish()
}

/// A decoded FSE table header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedCounts {
    /// Normalised count per symbol.
    pub counts: Vec<i16>,
    /// Table log.
    pub table_log: u32,
    /// Bytes consumed by the header.
    pub header_len: usize,
}

struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BitReader<'a> {
    fn peek(&self, nbits: u32) -> u32 {
        let mut value = 0u32;
        for i in 0..nbits as usize {
            let bit = self.pos + i;
            let byte = self.data.get(bit / 8).copied().unwrap_or(0);
            value |= u32::from((byte >> (bit % 8)) & 1) << i;
        }
        value
    }

    fn consume(&mut self, nbits: u32) -> Option<()> {
        self.pos += nbits as usize;
        (self.pos <= self.data.len() * 8).then_some(())
    }

    fn read(&mut self, nbits: u32) -> Option<u32> {
        let value = self.peek(nbits);
        self.consume(nbits)?;
        Some(value)
    }
}

/// Parses an FSE table header, returning `None` when it is malformed.
#[must_use]
pub fn read_ncount(data: &[u8]) -> Option<NormalizedCounts> {
    let mut reader = BitReader { data, pos: 0 };
    let table_log = reader.read(4)? + FSE_MIN_TABLE_LOG;
    if table_log > FSE_MAX_TABLE_LOG {
        return None;
    }
    let mut remaining = (1i32 << table_log) + 1;
    let mut threshold = 1i32 << table_log;
    let mut nb_bits = table_log + 1;
    let mut counts: Vec<i16> = Vec::new();
    let mut previous_zero = false;

    while remaining > 1 {
        if previous_zero {
            loop {
                let run = reader.read(2)?;
                counts.extend(std::iter::repeat(0).take(run as usize));
                if run != 3 {
                    break;
                }
            }
        }
        let max = 2 * threshold - 1 - remaining;
        let low = reader.peek(nb_bits - 1) as i32;
        let value = if low < max {
            reader.consume(nb_bits - 1)?;
            low
        } else {
            let full = reader.read(nb_bits)? as i32;
            if full >= threshold {
                full - max
            } else {
                full
            }
        };
        let count = value - 1;
        remaining -= count.abs();
        counts.push(count as i16);
        previous_zero = count == 0;
        while remaining < threshold {
            nb_bits -= 1;
            threshold >>= 1;
        }
        if counts.len() > 256 {
            return None;
        }
    }
    if remaining != 1 {
        return None;
    }
    Some(NormalizedCounts {
        counts,
        table_log,
        header_len: reader.pos.div_ceil(8),
    })
}

fn smoothed(counts: &[u64], always: usize) -> Vec<u64> {
    let observed = counts.iter().rposition(|&count| count > 0).unwrap_or(0);
    let symbols = observed.max(always) + 1;
    (0..symbols)
        .map(|symbol| {
            let count = counts.get(symbol).copied().unwrap_or(0);
            if symbol <= always {
                count + 1
            } else {
                count
            }
        })
        .collect()
}

/// Serialises the literal table and the offset, match-length and literal-length tables for a
/// dictionary whose content is `content_len` bytes long.
#[must_use]
pub fn build_tables(stats: &SequenceStats, content_len: usize) -> Vec<u8> {
    let reach = u32::try_from(content_len.saturating_add(128 * 1024)).unwrap_or(u32::MAX);
    let max_offset_code = (highbit(reach) as usize).min(MAX_OF_CODE);

    let mut out = write_huffman_table(&stats.literals);
    for (counts, always, log) in [
        (&stats.offsets, max_offset_code, OF_TABLE_LOG),
        (&stats.match_lengths, MAX_ML_CODE, ML_TABLE_LOG),
        (&stats.lit_lengths, MAX_LL_CODE, LL_TABLE_LOG),
    ] {
        let normalized = normalize_counts(&smoothed(counts, always), log);
        out.extend_from_slice(&write_ncount(&normalized, log));
    }
    out
}

/// Length of the literal table plus the three FSE tables at the start of `data`.
#[must_use]
pub fn tables_len(data: &[u8]) -> Option<usize> {
    let first = *data.first()? as usize;
    let mut pos = if first >= 128 {
        1 + (first - 127).div_ceil(2)
    } else {
        1 + first
    };
    for _ in 0..3 {
        let table = read_ncount(data.get(pos..)?)?;
        pos += table.header_len;
    }
    (pos <= data.len()).then_some(pos)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_tables_match_baselines() {
        assert_eq!(ll_code(0), 0);
        assert_eq!(ll_code(15), 15);
        assert_eq!(ll_code(16), 16);
        assert_eq!(ll_code(63), 24);
        assert_eq!(ll_code(64), 25);
        assert_eq!(ll_code(65_536), 35);
        assert_eq!(ll_code(usize::MAX), 35);

        assert_eq!(ml_code(3), 0);
        assert_eq!(ml_code(34), 31);
        assert_eq!(ml_code(35), 32);
        assert_eq!(ml_code(130), 42);
        assert_eq!(ml_code(131), 43);
        assert_eq!(ml_code(usize::MAX), 52);

        assert_eq!(of_code(1), 2);
        assert_eq!(of_code(5), 3);
        assert_eq!(of_code(1 << 20), 20);
    }

    #[test]
    fn normalized_counts_fill_the_table() {
        let counts = [1000u64, 1, 1, 0, 5, 77, 1];
        let normalized = normalize_counts(&counts, 8);
        assert_eq!(normalized.iter().map(|&c| i32::from(c)).sum::<i32>(), 256);
        for (count, norm) in counts.iter().zip(&normalized) {
            assert_eq!(*count == 0, *norm == 0);
        }
    }

    #[test]
    fn ncount_header_reads_back() {
        let counts: Vec<u64> = (0..53u64).map(|i| if i % 7 == 3 { 0 } else { 1 + i * i }).collect();
        for log in [OF_TABLE_LOG, ML_TABLE_LOG] {
            let normalized = normalize_counts(&counts, log);
            let bytes = write_ncount(&normalized, log);
            let decoded = read_ncount(&bytes).expect("header decodes");
            assert_eq!(decoded.table_log, log);
            assert_eq!(decoded.header_len, bytes.len());
            let last = normalized.iter().rposition(|&c| c != 0).unwrap();
            assert_eq!(decoded.counts, normalized[..=last].to_vec());
        }
    }

    #[test]
    fn long_zero_runs_are_encoded() {
        let mut counts = vec![0u64; 40];
        counts[0] = 10;
        counts[30] = 10;
        counts[39] = 12;
        let normalized = normalize_counts(&counts, 6);
        let decoded = read_ncount(&write_ncount(&normalized, 6)).expect("header decodes");
        assert_eq!(decoded.counts, normalized);
    }

    #[test]
    fn huffman_weights_describe_a_complete_code() {
        let mut literals = vec![0u64; 256];
        for (i, slot) in literals.iter_mut().enumerate().take(129) {
            *slot = ((i * 37) % 101) as u64 * 1_000;
        }
        literals[b'a' as usize] = 5_000_000;
        let table = write_huffman_table(&literals);
        assert_eq!(table[0], 255);
        assert_eq!(table.len(), 65);

        let mut weights = Vec::new();
        for byte in &table[1..] {
            weights.push(byte >> 4);
            weights.push(byte & 15);
        }
        let total: u32 = weights.iter().map(|&w| (1u32 << w) >> 1).sum();
        let table_log = highbit(total) + 1;
        assert!(table_log <= u32::from(HUF_MAX_BITS));
        let rest = (1u32 << table_log) - total;
        assert!(rest.is_power_of_two());
        weights.push((highbit(rest) + 1) as u8);
        let rank_one = weights.iter().filter(|&&w| w == 1).count();
        assert!(rank_one >= 2 && rank_one % 2 == 0);
    }

    #[test]
    fn length_limit_is_enforced() {
        let counts: Vec<u64> = (0..40).map(|i| 1u64 << i.min(60)).collect();
        let lengths = huffman_lengths(&counts, 11);
        assert!(lengths.iter().all(|&len| (1..=11).contains(&len)));
        let kraft: f64 = lengths.iter().map(|&len| 0.5f64.powi(i32::from(len))).sum();
        assert!((kraft - 1.0).abs() < 1e-9);
    }

    #[test]
    fn parse_finds_matches_in_content() {
        let content = b"the quick brown fox jumps over the lazy dog".to_vec();
        let samples: Vec<&[u8]> = vec![&b"XXthe quick brown fox jumps"[..], &b"lazy dog!"[..]];
        let stats = collect_stats(
            &content,
            &samples,
            CompressionLevel::Default,
            &CancelToken::new(),
        )
        .unwrap();
        assert_eq!(stats.sequences, 2);
        assert_eq!(stats.literals.iter().sum::<u64>(), 2 + 1);
    }

    #[test]
    fn tables_fit_the_header_reservation() {
        let stats = SequenceStats::default();
        let tables = build_tables(&stats, 100_000);
        assert!(8 + tables.len() + 12 <= crate::dictionary::COMPAT_HEADER_RESERVE);
        assert_eq!(tables_len(&tables), Some(tables.len()));
    }
}
