//! Round-trip validation of a dictionary against a corpus.

use std::io::Write;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::cancel::CancelToken;
use crate::codec::Codec;
use crate::config::CompressionLevel;
use crate::error::{DictError, Phase, Result};

/// Sizes measured for one sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleReport {
    /// Original size in bytes.
    pub raw: usize,
    /// Compressed size in bytes.
    pub compressed: usize,
}

/// Outcome of a successful validation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Compression effort used.
    pub level: CompressionLevel,
    /// Dictionary size in bytes.
    pub dict_len: usize,
    /// Per-sample sizes in corpus order.
    pub samples: Vec<SampleReport>,
    /// Total raw bytes.
    pub raw_bytes: usize,
    /// Total compressed bytes.
    pub compressed_bytes: usize,
    /// Wall-clock time spent.
    pub duration: Duration,
}

impl ValidationReport {
    /// Raw bytes divided by compressed bytes; zero when nothing was compressed.
    #[must_use]
    pub fn ratio(&self) -> f64 {
        if self.compressed_bytes == 0 {
            0.0
        } else {
            self.raw_bytes as f64 / self.compressed_bytes as f64
        }
    }
}

fn round_trip<C: Codec + ?Sized>(
    codec: &C,
    dict: &[u8],
    level: CompressionLevel,
    index: usize,
    sample: &[u8],
) -> Result<SampleReport> {
    let packed = codec
        .compress(sample, dict, level)
        .map_err(|source| DictError::Codec {
            phase: Phase::Validation,
            sample: index,
            source,
        })?;
    let restored = codec
        .decompress(&packed, dict)
        .map_err(|source| DictError::Codec {
            phase: Phase::Validation,
            sample: index,
            source,
        })?;
    if restored != sample {
        return Err(DictError::RoundTripMismatch { sample: index });
    }
    Ok(SampleReport {
        raw: sample.len(),
        compressed: packed.len(),
    })
}

/// Compresses and decompresses every sample with `dict`, checking the bytes survive.
///
/// Samples are processed in parallel; the report lists them in corpus order and the first
/// failing sample in corpus order determines the error.  The dictionary is never modified.
pub fn validate_dictionary<C, S>(
    codec: &C,
    dict: &[u8],
    samples: &[S],
    level: CompressionLevel,
    cancel: &CancelToken,
    out: &mut dyn Write,
) -> Result<ValidationReport>
where
    C: Codec + ?Sized,
    S: AsRef<[u8]> + Sync,
{
    let start = Instant::now();
    let outcomes: Vec<Result<SampleReport>> = samples
        .par_iter()
        .enumerate()
        .map(|(index, sample)| {
            cancel.checkpoint(Phase::Validation)?;
            round_trip(codec, dict, level, index, sample.as_ref())
        })
        .collect();
    let reports = outcomes.into_iter().collect::<Result<Vec<_>>>()?;

    let raw_bytes = reports.iter().map(|report| report.raw).sum();
    let compressed_bytes = reports.iter().map(|report| report.compressed).sum();
    let report = ValidationReport {
        level,
        dict_len: dict.len(),
        samples: reports,
        raw_bytes,
        compressed_bytes,
        duration: start.elapsed(),
    };
    writeln!(
        out,
        "validated {} sample(s) at level {}: {} -> {} bytes (ratio {:.3})",
        report.samples.len(),
        level,
        report.raw_bytes,
        report.compressed_bytes,
        report.ratio()
    )
    .map_err(|err| DictError::io(err, None))?;
    Ok(report)
}
