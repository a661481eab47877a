//! Training pipeline turning a sample corpus into a dictionary.

use std::io::{self, Write};
use std::time::Instant;
use std::{fmt, path::Path};

use log::info;

use crate::cancel::CancelToken;
use crate::config::{IngestConfig, TrainerBuilder, TrainerConfig};
use crate::corpus::load_samples;
use crate::dictionary::{assemble, Dictionary};
use crate::error::{DictError, Result};
use crate::index::KmerIndex;
use crate::metrics::{sample_rss_kb, TrainingMetrics};
use crate::segment::{extract, ExtractParams, MAX_SEGMENT_LEN};
use crate::select::select;

/// High-level façade configuring and executing dictionary training runs.
#[derive(Debug, Clone)]
pub struct Trainer {
    cfg: TrainerConfig,
    cancel: CancelToken,
}

/// Artifacts returned after a training session completes.
#[must_use]
#[derive(Debug, Clone)]
pub struct TrainerArtifacts {
    /// Trained dictionary.
    pub dictionary: Dictionary,
    /// Detailed metrics captured during training.
    pub metrics: TrainingMetrics,
}

impl Trainer {
    /// Creates a new trainer for the supplied configuration.
    #[must_use]
    pub fn new(cfg: TrainerConfig) -> Self {
        Self {
            cfg,
            cancel: CancelToken::new(),
        }
    }

    /// Returns a [`TrainerBuilder`] with default settings.
    #[must_use]
    pub fn builder() -> TrainerBuilder {
        TrainerConfig::builder()
    }

    /// Returns an immutable reference to the underlying configuration.
    #[must_use]
    pub fn config(&self) -> &TrainerConfig {
        &self.cfg
    }

    /// Attaches a cancellation token checked between samples.
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Returns the token observed by this trainer.
    #[must_use]
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Trains a dictionary by loading samples from disk according to [`IngestConfig`].
    pub fn train_from_paths<P: AsRef<Path>>(
        &self,
        inputs: &[P],
        ingest: &IngestConfig,
    ) -> Result<TrainerArtifacts> {
        let samples = load_samples(inputs, ingest)?;
        self.train(&samples)
    }

    /// Trains a dictionary from in-memory samples.
    pub fn train<S: AsRef<[u8]> + Sync>(&self, samples: &[S]) -> Result<TrainerArtifacts> {
        self.train_with_output(samples, &mut io::sink())
    }

    /// Trains a dictionary, writing a human-readable summary to `out`.
    ///
    /// The sink only receives diagnostics; it has no influence on the dictionary bytes.
    pub fn train_with_output<S, W>(&self, samples: &[S], out: &mut W) -> Result<TrainerArtifacts>
    where
        S: AsRef<[u8]> + Sync,
        W: Write,
    {
        self.cfg.validate()?;
        if samples.len() < 2 {
            return Err(DictError::EmptyCorpus {
                found: samples.len(),
            });
        }
        let corpus: Vec<&[u8]> = samples.iter().map(AsRef::as_ref).collect();
        let width = self.cfg.hash_bytes;
        let longest = corpus.iter().map(|sample| sample.len()).max().unwrap_or(0);
        if width > longest {
            return Err(DictError::InvalidConfig(format!(
                "hash_bytes ({width}) exceeds the longest sample ({longest} bytes)"
            )));
        }

        let corpus_bytes = corpus.iter().map(|sample| sample.len()).sum();
        let mut metrics = TrainingMetrics::new(corpus.len(), corpus_bytes);
        metrics.skipped_samples = corpus.iter().filter(|sample| sample.len() < width).count();
        let training_start = Instant::now();
        let io_err = |err| DictError::io(err, None);

        let phase_start = Instant::now();
        let index = KmerIndex::build(&corpus, width, &self.cancel)?;
        metrics.timings.indexing = phase_start.elapsed();
        metrics.distinct_kmers = index.distinct();
        metrics.frequent_kmers = index.frequent(self.cfg.min_sample_count);
        if self.cfg.show_progress {
            info!(
                "indexed {} windows: {} distinct, {} in >= {} samples ({:.2?})",
                index.total_windows(),
                metrics.distinct_kmers,
                metrics.frequent_kmers,
                self.cfg.min_sample_count,
                metrics.timings.indexing
            );
        }

        let phase_start = Instant::now();
        let params = ExtractParams {
            min_sample_count: self.cfg.min_sample_count,
            max_segment_len: MAX_SEGMENT_LEN,
        };
        let candidates = extract(&corpus, &index, &params, &self.cancel)?;
        drop(index);
        metrics.timings.extraction = phase_start.elapsed();
        metrics.candidates = candidates.len();
        if self.cfg.show_progress {
            info!(
                "extracted {} candidate segment(s) ({:.2?})",
                candidates.len(),
                metrics.timings.extraction
            );
        }

        let phase_start = Instant::now();
        let sample_lens: Vec<usize> = corpus.iter().map(|sample| sample.len()).collect();
        let selection = select(
            &candidates,
            &sample_lens,
            self.cfg.content_budget(),
            width,
            &self.cancel,
        )?;
        metrics.timings.selection = phase_start.elapsed();
        metrics.stop_reason = selection.stop_reason;
        if selection.segments.is_empty() {
            return Err(DictError::EmptyDictionary {
                candidates: candidates.len(),
            });
        }
        if self.cfg.show_progress {
            info!(
                "selected {} segment(s), {} bytes, stop reason {:?} ({:.2?})",
                selection.segments.len(),
                selection.content_len(),
                selection.stop_reason,
                metrics.timings.selection
            );
        }
        writeln!(
            out,
            "selected {} of {} candidate segment(s) covering {} bytes ({:?})",
            selection.segments.len(),
            candidates.len(),
            selection.content_len(),
            selection.stop_reason
        )
        .map_err(io_err)?;

        let phase_start = Instant::now();
        let dictionary = assemble(&selection, &corpus, &self.cfg, &self.cancel, out)?;
        metrics.timings.assembly = phase_start.elapsed();
        metrics.total_benefit = selection.total_benefit();
        metrics.picks = selection.picks;
        metrics.content_bytes = dictionary.content().len();
        metrics.header_bytes = dictionary.header_len();
        metrics.total_duration = training_start.elapsed();
        metrics.rss_kb = sample_rss_kb();

        if self.cfg.show_progress {
            info!(
                "dictionary of {} bytes ({} header + {} content) in {:.2?}",
                dictionary.len(),
                metrics.header_bytes,
                metrics.content_bytes,
                metrics.total_duration
            );
        }
        Ok(TrainerArtifacts {
            dictionary,
            metrics,
        })
    }
}

/// Trains a dictionary from `samples` and returns its bytes.
///
/// ```
/// use zdict::{train, TrainerConfig};
///
/// # fn main() -> zdict::Result<()> {
/// let samples: Vec<Vec<u8>> = (0..8u8)
///     .map(|i| {
///         let mut sample = b"GET /api/v1/items HTTP/1.1\r\nHost: example.org\r\n".to_vec();
///         sample.push(b'0' + i);
///         sample
///     })
///     .collect();
/// let cfg = TrainerConfig::builder().max_dict_size(256).hash_bytes(4).build()?;
/// let dict = train(&samples, &cfg)?;
/// assert!(!dict.is_empty() && dict.len() <= 256);
/// # Ok(())
/// # }
/// ```
pub fn train<S: AsRef<[u8]> + Sync>(samples: &[S], cfg: &TrainerConfig) -> Result<Vec<u8>> {
    let artifacts = Trainer::new(cfg.clone()).train(samples)?;
    Ok(artifacts.dictionary.into_bytes())
}

impl fmt::Display for TrainerArtifacts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.dictionary.is_compat() {
            "zstd"
        } else {
            "raw"
        };
        writeln!(
            f,
            "{kind} dictionary of {} bytes with {} segment(s)",
            self.dictionary.len(),
            self.dictionary.segments()
        )?;
        writeln!(f, "Stop reason: {:?}", self.metrics.stop_reason)?;
        writeln!(f, "Total duration: {:?}", self.metrics.total_duration)?;
        Ok(())
    }
}
