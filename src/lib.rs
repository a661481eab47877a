//! Shared compression dictionary training library and CLI.
//!
//! The crate turns a corpus of mutually similar binary samples into a size-bounded
//! dictionary that improves Zstandard compression of those samples and of future data
//! that looks like them ("train once, compress many").  Training indexes every k-byte
//! window of the corpus, stitches windows that recur across samples into candidate
//! segments, and greedily packs the segments covering the most corpus bytes into the
//! byte budget.  The result is either raw content or a standard Zstandard dictionary.
//!
//! ```no_run
//! use zdict::{validate_dictionary, CancelToken, IngestConfig, Trainer, TrainerConfig, ZstdCodec};
//!
//! # fn main() -> zdict::Result<()> {
//! let trainer_cfg = TrainerConfig::builder()
//!     .max_dict_size(16 * 1024)
//!     .hash_bytes(6)
//!     .compat_mode(true)
//!     .build()?;
//! let trainer = Trainer::new(trainer_cfg);
//! let ingest_cfg = IngestConfig::default();
//! let artifacts = trainer.train_from_paths(&["/path/to/samples"], &ingest_cfg)?;
//! std::fs::write("samples.dict", artifacts.dictionary.as_bytes())
//!     .map_err(|err| zdict::DictError::io(err, None))?;
//!
//! let samples = zdict::corpus::load_samples(&["/path/to/samples"], &ingest_cfg)?;
//! let report = validate_dictionary(
//!     &ZstdCodec,
//!     artifacts.dictionary.as_bytes(),
//!     &samples,
//!     trainer.config().level,
//!     &CancelToken::new(),
//!     &mut std::io::stdout(),
//! )?;
//! println!("ratio {:.2}", report.ratio());
//! # Ok(())
//! # }
//! ```
//!
//! The CLI is enabled by default through the `cli` feature.  Users targeting the
//! library portion only can disable default features to avoid the CLI
//! dependencies: `zdict = { version = "...", default-features = false }`.

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    clippy::all,
    rust_2018_idioms,
    future_incompatible,
    unused_lifetimes,
    unreachable_pub
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
    clippy::doc_markdown,
    clippy::multiple_crate_versions
)]

pub mod bytes;
pub mod cancel;
pub mod codec;
pub mod config;
pub mod corpus;
pub mod dictionary;
pub mod entropy;
pub mod error;
pub mod hash;
pub mod index;
pub mod metrics;
pub mod segment;
pub mod select;
pub mod trainer;
pub mod validate;

pub use cancel::CancelToken;
pub use codec::{Codec, ZstdCodec};
pub use config::{
    CompressionLevel, IngestBuilder, IngestConfig, SegmentOrder, TrainerBuilder, TrainerConfig,
};
pub use dictionary::{Dictionary, DictionaryHeader};
pub use error::{DictError, Phase, Result};
pub use metrics::{SelectionMetrics, StopReason, TrainingMetrics};
pub use trainer::{train, Trainer, TrainerArtifacts};
pub use validate::{validate_dictionary, ValidationReport};
