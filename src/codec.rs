//! Codec boundary used to exercise a trained dictionary.

use std::io::{self, Read, Write};

use crate::config::CompressionLevel;

/// A dictionary-aware compressor and decompressor.
///
/// Implementations must be shareable across the validation worker threads.
pub trait Codec: Sync {
    /// Compresses `data` with `dict` at the given effort.
    fn compress(&self, data: &[u8], dict: &[u8], level: CompressionLevel) -> io::Result<Vec<u8>>;

    /// Restores data produced by [`Codec::compress`] with the same dictionary.
    fn decompress(&self, data: &[u8], dict: &[u8]) -> io::Result<Vec<u8>>;
}

/// Zstandard codec backed by the `zstd` crate.
///
/// Raw dictionaries are loaded as plain content; blobs starting with the dictionary magic
/// are parsed as full Zstandard dictionaries.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZstdCodec;

impl Codec for ZstdCodec {
    fn compress(&self, data: &[u8], dict: &[u8], level: CompressionLevel) -> io::Result<Vec<u8>> {
        let mut encoder =
            zstd::stream::write::Encoder::with_dictionary(Vec::new(), level.zstd_level(), dict)?;
        encoder.write_all(data)?;
        encoder.finish()
    }

    fn decompress(&self, data: &[u8], dict: &[u8]) -> io::Result<Vec<u8>> {
        let mut decoder = zstd::stream::read::Decoder::with_dictionary(data, dict)?;
        let mut out = Vec::new();
        decoder.read_to_end(&mut out)?;
        Ok(out)
    }
}
