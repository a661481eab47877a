//! Configuration builders controlling training and corpus ingestion.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::dictionary::{COMPAT_HEADER_RESERVE, MIN_COMPAT_CONTENT};
use crate::error::{DictError, Result};

/// Compression effort used when finalising and validating a dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionLevel {
    /// Fastest encoder settings.
    Fastest,
    /// The codec's balanced default.
    #[default]
    Default,
    /// Slower settings trading speed for ratio.
    Better,
    /// Strongest settings.
    Best,
}

impl CompressionLevel {
    /// All levels, weakest first.
    pub const ALL: [CompressionLevel; 4] = [Self::Fastest, Self::Default, Self::Better, Self::Best];

    /// Numeric Zstandard level corresponding to this effort class.
    #[must_use]
    pub fn zstd_level(self) -> i32 {
        match self {
            Self::Fastest => 1,
            Self::Default => 3,
            Self::Better => 9,
            Self::Best => 19,
        }
    }
}

impl fmt::Display for CompressionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Fastest => "fastest",
            Self::Default => "default",
            Self::Better => "better",
            Self::Best => "best",
        };
        f.write_str(name)
    }
}

impl FromStr for CompressionLevel {
    type Err = DictError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "fastest" => Ok(Self::Fastest),
            "default" => Ok(Self::Default),
            "better" => Ok(Self::Better),
            "best" => Ok(Self::Best),
            other => Err(DictError::InvalidConfig(format!(
                "unknown compression level `{other}` (expected fastest, default, better or best)"
            ))),
        }
    }
}

/// Placement of selected segments inside the dictionary content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentOrder {
    /// Highest-benefit segment at the start of the content.
    #[default]
    MostBenefitFirst,
    /// Highest-benefit segment at the end, closest to the data being compressed.
    MostBenefitLast,
}

/// Configuration for dictionary training.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TrainerConfig {
    /// Hard cap on the size of the produced dictionary, header included.
    pub max_dict_size: usize,
    /// Width of the k-mer windows used for frequency analysis.
    pub hash_bytes: usize,
    /// Dictionary identifier written in compatible mode; `0` leaves it unregistered.
    pub dict_id: u32,
    /// Wraps the content in a standard Zstandard dictionary container.
    pub compat_mode: bool,
    /// Compression effort used for entropy statistics and validation.
    pub level: CompressionLevel,
    /// Minimum number of distinct samples a window or segment must appear in.
    pub min_sample_count: usize,
    /// Placement of segments inside the dictionary content.
    pub segment_order: SegmentOrder,
    /// Enables per-phase logging through the `log` facade.
    pub show_progress: bool,
}

impl TrainerConfig {
    /// Returns a builder initialised with [`TrainerConfig::default`].
    #[must_use]
    pub fn builder() -> TrainerBuilder {
        TrainerBuilder::default()
    }

    /// Loads a configuration from a JSON file; missing fields take their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)
            .map_err(|err| DictError::io(err, Some(path.to_path_buf())))?;
        let cfg: Self = serde_json::from_str(&data)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Number of bytes reserved for the container header.
    #[must_use]
    pub fn header_reserve(&self) -> usize {
        if self.compat_mode {
            COMPAT_HEADER_RESERVE
        } else {
            0
        }
    }

    /// Bytes available for segment content once the header reservation is removed.
    #[must_use]
    pub fn content_budget(&self) -> usize {
        self.max_dict_size.saturating_sub(self.header_reserve())
    }

    /// Validates the invariants required for training.
    pub fn validate(&self) -> Result<()> {
        if self.max_dict_size == 0 {
            return Err(DictError::InvalidConfig(
                "max_dict_size must be greater than zero".into(),
            ));
        }
        if self.hash_bytes == 0 {
            return Err(DictError::InvalidConfig(
                "hash_bytes must be greater than zero".into(),
            ));
        }
        if self.min_sample_count == 0 {
            return Err(DictError::InvalidConfig(
                "min_sample_count must be greater than zero".into(),
            ));
        }
        if self.compat_mode {
            let minimum = COMPAT_HEADER_RESERVE + MIN_COMPAT_CONTENT.max(self.hash_bytes);
            if self.max_dict_size < minimum {
                return Err(DictError::InvalidConfig(format!(
                    "max_dict_size ({}) must be at least {minimum} in compatible mode",
                    self.max_dict_size
                )));
            }
        }
        if self.hash_bytes > self.content_budget() {
            return Err(DictError::InvalidConfig(format!(
                "hash_bytes ({}) exceeds the {} bytes available for dictionary content",
                self.hash_bytes,
                self.content_budget()
            )));
        }
        Ok(())
    }
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            max_dict_size: 112_640,
            hash_bytes: 6,
            dict_id: 0,
            compat_mode: false,
            level: CompressionLevel::Default,
            min_sample_count: 2,
            segment_order: SegmentOrder::MostBenefitFirst,
            show_progress: false,
        }
    }
}

/// Builder for [`TrainerConfig`].
#[derive(Debug, Default, Clone)]
pub struct TrainerBuilder {
    cfg: TrainerConfig,
}

impl TrainerBuilder {
    /// Creates a builder with [`TrainerConfig::default`] settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the hard byte cap on the produced dictionary.
    #[must_use]
    pub fn max_dict_size(mut self, value: usize) -> Self {
        self.cfg.max_dict_size = value;
        self
    }

    /// Sets the k-mer window width.
    #[must_use]
    pub fn hash_bytes(mut self, value: usize) -> Self {
        self.cfg.hash_bytes = value;
        self
    }

    /// Sets the dictionary identifier used in compatible mode.
    #[must_use]
    pub fn dict_id(mut self, value: u32) -> Self {
        self.cfg.dict_id = value;
        self
    }

    /// Selects compatible (container) or raw output.
    #[must_use]
    pub fn compat_mode(mut self, enabled: bool) -> Self {
        self.cfg.compat_mode = enabled;
        self
    }

    /// Sets the compression effort.
    #[must_use]
    pub fn level(mut self, level: CompressionLevel) -> Self {
        self.cfg.level = level;
        self
    }

    /// Sets the minimum distinct-sample threshold for frequent windows and segments.
    #[must_use]
    pub fn min_sample_count(mut self, value: usize) -> Self {
        self.cfg.min_sample_count = value;
        self
    }

    /// Sets the segment placement order.
    #[must_use]
    pub fn segment_order(mut self, order: SegmentOrder) -> Self {
        self.cfg.segment_order = order;
        self
    }

    /// Enables or disables per-phase logging.
    #[must_use]
    pub fn show_progress(mut self, enabled: bool) -> Self {
        self.cfg.show_progress = enabled;
        self
    }

    /// Finalises the builder, returning a validated [`TrainerConfig`].
    pub fn build(self) -> Result<TrainerConfig> {
        self.cfg.validate()?;
        Ok(self.cfg)
    }
}

/// Configuration controlling how binary corpora are read from disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IngestConfig {
    /// Size of chunks to read from each input file; `0` makes every file one sample.
    pub chunk_size: usize,
    /// Enables recursive directory traversal.
    pub recursive: bool,
    /// Follows symlinks encountered during traversal.
    pub follow_symlinks: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            chunk_size: 0,
            recursive: true,
            follow_symlinks: false,
        }
    }
}

impl IngestConfig {
    /// Returns a builder initialised with [`IngestConfig::default`].
    #[must_use]
    pub fn builder() -> IngestBuilder {
        IngestBuilder::default()
    }
}

/// Builder for [`IngestConfig`].
#[derive(Debug, Default, Clone)]
pub struct IngestBuilder {
    cfg: IngestConfig,
}

impl IngestBuilder {
    /// Creates a new builder with [`IngestConfig::default`] settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the chunk size in bytes (0 = one sample per file).
    #[must_use]
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.cfg.chunk_size = size;
        self
    }

    /// Enables or disables recursive directory traversal.
    #[must_use]
    pub fn recursive(mut self, enabled: bool) -> Self {
        self.cfg.recursive = enabled;
        self
    }

    /// Enables or disables following of symlinks when traversing directories.
    #[must_use]
    pub fn follow_symlinks(mut self, enabled: bool) -> Self {
        self.cfg.follow_symlinks = enabled;
        self
    }

    /// Finalises the builder, returning the [`IngestConfig`].
    pub fn build(self) -> IngestConfig {
        self.cfg
    }
}
