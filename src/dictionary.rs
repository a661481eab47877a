//! Dictionary assembly and header inspection.

use std::io::Write;

use log::info;
use serde::{Deserialize, Serialize};

use crate::bytes::preview;
use crate::cancel::CancelToken;
use crate::config::{SegmentOrder, TrainerConfig};
use crate::entropy::{build_tables, collect_stats, tables_len, REPEAT_OFFSETS};
use crate::error::{DictError, Result};
use crate::select::{SelectedSegment, Selection};

/// Magic number opening a Zstandard dictionary container (stored little-endian).
pub const ZSTD_DICT_MAGIC: u32 = 0xEC30_A437;

/// Bytes set aside for the container header before selection runs.
pub const COMPAT_HEADER_RESERVE: usize = 256;

/// Smallest content budget accepted in compatible mode.
pub const MIN_COMPAT_CONTENT: usize = 8;

/// A trained dictionary and the metadata describing how it was laid out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dictionary {
    bytes: Vec<u8>,
    header_len: usize,
    segments: usize,
    dict_id: u32,
    compat: bool,
}

impl Dictionary {
    /// Final dictionary bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consumes the dictionary and returns its bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Segment content, without any container header.
    #[must_use]
    pub fn content(&self) -> &[u8] {
        &self.bytes[self.header_len..]
    }

    /// Total size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` when the dictionary holds no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Container header size; zero in raw mode.
    #[must_use]
    pub fn header_len(&self) -> usize {
        self.header_len
    }

    /// Number of segments placed in the content.
    #[must_use]
    pub fn segments(&self) -> usize {
        self.segments
    }

    /// Identifier written into the container; zero in raw mode.
    #[must_use]
    pub fn dict_id(&self) -> u32 {
        self.dict_id
    }

    /// Returns `true` when the bytes are wrapped in a Zstandard container.
    #[must_use]
    pub fn is_compat(&self) -> bool {
        self.compat
    }
}

/// Orders segments for placement: by marginal benefit, ties in selection order.
fn ordered(segments: &[SelectedSegment], order: SegmentOrder) -> Vec<&SelectedSegment> {
    let mut placed: Vec<&SelectedSegment> = segments.iter().collect();
    placed.sort_by(|a, b| b.benefit.cmp(&a.benefit));
    if order == SegmentOrder::MostBenefitLast {
        placed.reverse();
    }
    placed
}

/// Drops `excess` bytes from the low-benefit end of `content`.
fn trim_low_benefit(content: &mut Vec<u8>, excess: usize, order: SegmentOrder) {
    let excess = excess.min(content.len());
    match order {
        SegmentOrder::MostBenefitFirst => content.truncate(content.len() - excess),
        SegmentOrder::MostBenefitLast => {
            content.drain(..excess);
        }
    }
}

/// Serialises `selection` into a dictionary blob.
///
/// Raw mode emits the concatenated segments.  Compatible mode wraps them in a Zstandard
/// dictionary container whose entropy tables are derived from `corpus`.  The result never
/// exceeds `cfg.max_dict_size`; if the header outgrows its reservation the content loses
/// bytes from whichever end holds the lowest-benefit segments.
pub fn assemble(
    selection: &Selection,
    corpus: &[&[u8]],
    cfg: &TrainerConfig,
    cancel: &CancelToken,
    out: &mut dyn Write,
) -> Result<Dictionary> {
    let placed = ordered(&selection.segments, cfg.segment_order);
    let mut content = Vec::with_capacity(selection.content_len());
    for segment in &placed {
        content.extend_from_slice(&segment.content);
    }
    let io_err = |err| DictError::io(err, None);

    if !cfg.compat_mode {
        if content.len() > cfg.max_dict_size {
            let excess = content.len() - cfg.max_dict_size;
            trim_low_benefit(&mut content, excess, cfg.segment_order);
        }
        writeln!(
            out,
            "assembled raw dictionary: {} segment(s), {} bytes",
            placed.len(),
            content.len()
        )
        .map_err(io_err)?;
        return Ok(Dictionary {
            bytes: content,
            header_len: 0,
            segments: placed.len(),
            dict_id: 0,
            compat: false,
        });
    }

    let stats = collect_stats(&content, corpus, cfg.level, cancel)?;
    let tables = build_tables(&stats, content.len());
    let header_len = 8 + tables.len() + 4 * REPEAT_OFFSETS.len();
    if header_len + content.len() > cfg.max_dict_size {
        let excess = header_len + content.len() - cfg.max_dict_size;
        if excess >= content.len() {
            return Err(DictError::Internal(format!(
                "container header of {header_len} bytes leaves no room for content"
            )));
        }
        trim_low_benefit(&mut content, excess, cfg.segment_order);
    }
    if cfg.show_progress {
        info!(
            "entropy tables from {} sequence(s), header {} bytes",
            stats.sequences, header_len
        );
    }

    let mut bytes = Vec::with_capacity(header_len + content.len());
    bytes.extend_from_slice(&ZSTD_DICT_MAGIC.to_le_bytes());
    bytes.extend_from_slice(&cfg.dict_id.to_le_bytes());
    bytes.extend_from_slice(&tables);
    for offset in REPEAT_OFFSETS {
        // Repeat offsets may not reach past the start of the content.
        let offset = offset.min(u32::try_from(content.len()).unwrap_or(u32::MAX));
        bytes.extend_from_slice(&offset.to_le_bytes());
    }
    bytes.extend_from_slice(&content);

    writeln!(
        out,
        "assembled zstd dictionary: id {}, {} segment(s), header {} + content {} = {} bytes",
        cfg.dict_id,
        placed.len(),
        header_len,
        content.len(),
        bytes.len()
    )
    .map_err(io_err)?;
    if let Some(first) = placed.first() {
        writeln!(out, "leading segment: {}", preview(&first.content, 48)).map_err(io_err)?;
    }

    Ok(Dictionary {
        bytes,
        header_len,
        segments: placed.len(),
        dict_id: cfg.dict_id,
        compat: true,
    })
}

/// Layout summary of a dictionary blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictionaryHeader {
    /// `true` when the blob is a Zstandard dictionary container.
    pub compat: bool,
    /// Container dictionary id; zero for raw dictionaries.
    pub dict_id: u32,
    /// Bytes preceding the content.
    pub header_len: usize,
    /// Bytes of raw content.
    pub content_len: usize,
}

impl DictionaryHeader {
    /// Inspects `bytes`; anything without the container magic is reported as raw content.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let raw = Self {
            compat: false,
            dict_id: 0,
            header_len: 0,
            content_len: bytes.len(),
        };
        let Some(magic) = bytes.get(..4) else {
            return Ok(raw);
        };
        if magic != ZSTD_DICT_MAGIC.to_le_bytes() {
            return Ok(raw);
        }
        let corrupted = || DictError::Serialization("truncated or corrupted dictionary header".into());
        let id = bytes.get(4..8).ok_or_else(corrupted)?;
        let dict_id = u32::from_le_bytes([id[0], id[1], id[2], id[3]]);
        let tables = tables_len(&bytes[8..]).ok_or_else(corrupted)?;
        let header_len = 8 + tables + 4 * REPEAT_OFFSETS.len();
        if header_len > bytes.len() {
            return Err(corrupted());
        }
        Ok(Self {
            compat: true,
            dict_id,
            header_len,
            content_len: bytes.len() - header_len,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::StopReason;

    fn selection(parts: &[(&[u8], u64)]) -> Selection {
        Selection {
            segments: parts
                .iter()
                .enumerate()
                .map(|(rank, (content, benefit))| SelectedSegment {
                    content: content.to_vec(),
                    benefit: *benefit,
                    rank,
                    occurrences: 2,
                })
                .collect(),
            stop_reason: StopReason::CandidatesExhausted,
            picks: Vec::new(),
            candidates: parts.len(),
        }
    }

    fn raw_cfg(order: SegmentOrder) -> TrainerConfig {
        TrainerConfig {
            max_dict_size: 64,
            hash_bytes: 2,
            segment_order: order,
            ..TrainerConfig::default()
        }
    }

    #[test]
    fn raw_mode_orders_by_benefit() {
        let picked = selection(&[(b"bb", 10), (b"aa", 30), (b"cc", 10)]);
        let corpus: Vec<&[u8]> = Vec::new();
        let cancel = CancelToken::new();
        let first = assemble(
            &picked,
            &corpus,
            &raw_cfg(SegmentOrder::MostBenefitFirst),
            &cancel,
            &mut std::io::sink(),
        )
        .unwrap();
        assert_eq!(first.as_bytes(), b"aabbcc");
        assert_eq!(first.header_len(), 0);

        let last = assemble(
            &picked,
            &corpus,
            &raw_cfg(SegmentOrder::MostBenefitLast),
            &cancel,
            &mut std::io::sink(),
        )
        .unwrap();
        assert_eq!(last.as_bytes(), b"ccbbaa");
    }

    #[test]
    fn compat_mode_writes_container_header() {
        let picked = selection(&[(b"shared-record-prefix:", 40)]);
        let samples = [b"shared-record-prefix:1".to_vec(), b"shared-record-prefix:2".to_vec()];
        let corpus: Vec<&[u8]> = samples.iter().map(Vec::as_slice).collect();
        let cfg = TrainerConfig {
            max_dict_size: 1024,
            hash_bytes: 4,
            compat_mode: true,
            dict_id: 0x1234_5678,
            ..TrainerConfig::default()
        };
        let mut log = Vec::new();
        let dict = assemble(&picked, &corpus, &cfg, &CancelToken::new(), &mut log).unwrap();
        assert!(dict.len() <= 1024);
        assert_eq!(&dict.as_bytes()[..4], &[0x37, 0xA4, 0x30, 0xEC]);
        assert_eq!(&dict.as_bytes()[4..8], &0x1234_5678u32.to_le_bytes());
        assert_eq!(dict.content(), b"shared-record-prefix:");
        assert!(String::from_utf8(log).unwrap().contains("zstd dictionary"));

        let header = DictionaryHeader::parse(dict.as_bytes()).unwrap();
        assert!(header.compat);
        assert_eq!(header.dict_id, 0x1234_5678);
        assert_eq!(header.header_len, dict.header_len());
        assert_eq!(header.content_len, 21);
    }

    #[test]
    fn trimming_spares_the_most_valuable_segment() {
        let mut leading = b"AAAAbbbbcc".to_vec();
        trim_low_benefit(&mut leading, 3, SegmentOrder::MostBenefitFirst);
        assert_eq!(leading, b"AAAAbbb");

        let mut trailing = b"ccbbbbAAAA".to_vec();
        trim_low_benefit(&mut trailing, 3, SegmentOrder::MostBenefitLast);
        assert_eq!(trailing, b"bbbAAAA");

        let mut short = b"ab".to_vec();
        trim_low_benefit(&mut short, 5, SegmentOrder::MostBenefitFirst);
        assert!(short.is_empty());
    }

    #[test]
    fn compat_container_accepts_content_shorter_than_repeat_offsets() {
        let picked = selection(&[(b"tiny", 8)]);
        let samples = [b"tiny-one".to_vec(), b"tiny-two".to_vec()];
        let corpus: Vec<&[u8]> = samples.iter().map(Vec::as_slice).collect();
        let cfg = TrainerConfig {
            max_dict_size: 512,
            hash_bytes: 4,
            compat_mode: true,
            ..TrainerConfig::default()
        };
        let dict = assemble(&picked, &corpus, &cfg, &CancelToken::new(), &mut std::io::sink())
            .unwrap();
        assert_eq!(dict.content(), b"tiny");
        let header = dict.header_len();
        let repcodes = &dict.as_bytes()[header - 12..header];
        for chunk in repcodes.chunks(4) {
            let offset = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            assert!((1..=4).contains(&offset), "repeat offset {offset}");
        }

        let codec = crate::codec::ZstdCodec;
        for level in crate::config::CompressionLevel::ALL {
            for sample in &samples {
                let packed = crate::codec::Codec::compress(&codec, sample, dict.as_bytes(), level)
                    .unwrap();
                let unpacked =
                    crate::codec::Codec::decompress(&codec, &packed, dict.as_bytes()).unwrap();
                assert_eq!(&unpacked, sample);
            }
        }
    }

    #[test]
    fn raw_blobs_parse_as_content() {
        let header = DictionaryHeader::parse(b"plain content").unwrap();
        assert!(!header.compat);
        assert_eq!(header.content_len, 13);
    }

    #[test]
    fn truncated_container_is_rejected() {
        let mut bytes = ZSTD_DICT_MAGIC.to_le_bytes().to_vec();
        bytes.extend_from_slice(&[1, 0]);
        assert!(DictionaryHeader::parse(&bytes).is_err());
    }
}
