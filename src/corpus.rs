//! Facilities for discovering sample files and loading training corpora.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::IngestConfig;
use crate::error::{DictError, Result};

/// Discovers files rooted at the provided input paths according to the ingest configuration.
///
/// Directories are traversed recursively by default; set [`IngestConfig::recursive`] to `false`
/// to limit discovery to the first level.  Paths are returned sorted within each input so the
/// corpus order, and with it the trained dictionary, does not depend on directory listing order.
pub fn collect_paths<P: AsRef<Path>>(inputs: &[P], cfg: &IngestConfig) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        let path = input.as_ref();
        if !path.exists() {
            return Err(DictError::InvalidConfig(format!(
                "input path {path:?} does not exist"
            )));
        }
        let metadata = path
            .symlink_metadata()
            .map_err(|err| DictError::io(err, Some(path.to_path_buf())))?;
        if metadata.is_dir() {
            let mut found = Vec::new();
            let depth = if cfg.recursive { usize::MAX } else { 1 };
            let walker = WalkDir::new(path)
                .max_depth(depth)
                .follow_links(cfg.follow_symlinks)
                .sort_by_file_name();
            for entry in walker {
                let entry = entry.map_err(|err| {
                    let entry_path = err.path().map(Path::to_path_buf);
                    match err.into_io_error() {
                        Some(io) => DictError::io(io, entry_path),
                        None => DictError::Internal("filesystem loop detected".into()),
                    }
                })?;
                if entry.file_type().is_file() {
                    found.push(entry.into_path());
                }
            }
            files.extend(found);
        } else if metadata.is_file() || (cfg.follow_symlinks && path.is_file()) {
            files.push(path.to_path_buf());
        }
    }
    if files.is_empty() {
        return Err(DictError::InvalidConfig(
            "no files discovered in provided inputs".into(),
        ));
    }
    Ok(files)
}

/// Loads samples into memory based on the ingest configuration.
///
/// Files are loaded in order.  With [`IngestConfig::chunk_size`] set, each file is split
/// into fixed-size chunks and every chunk becomes its own sample.  Empty files are skipped.
pub fn load_samples<P: AsRef<Path>>(inputs: &[P], cfg: &IngestConfig) -> Result<Vec<Vec<u8>>> {
    let file_paths = collect_paths(inputs, cfg)?;
    let mut samples = Vec::new();
    for file_path in file_paths {
        let mut file =
            File::open(&file_path).map_err(|err| DictError::io(err, Some(file_path.clone())))?;
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)
            .map_err(|err| DictError::io(err, Some(file_path.clone())))?;
        if buffer.is_empty() {
            continue;
        }
        if cfg.chunk_size == 0 {
            samples.push(buffer);
        } else {
            samples.extend(buffer.chunks(cfg.chunk_size).map(<[u8]>::to_vec));
        }
    }
    if samples.is_empty() {
        return Err(DictError::InvalidConfig(
            "no sample data could be loaded from inputs".into(),
        ));
    }
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn collect_paths_discovers_files_recursively() {
        let dir = tempdir().expect("tempdir");
        let nested = dir.path().join("nested");
        fs::create_dir(&nested).expect("create nested directory");
        let file_a = dir.path().join("a.bin");
        let file_b = nested.join("b.bin");
        fs::write(&file_a, [1u8, 2, 3]).expect("write a");
        fs::write(&file_b, [4u8, 5, 6]).expect("write b");

        let paths = collect_paths(&[dir.path()], &IngestConfig::default()).expect("collect paths");
        assert_eq!(paths, vec![file_a.clone(), file_b]);

        let cfg = IngestConfig {
            recursive: false,
            ..IngestConfig::default()
        };
        let shallow = collect_paths(&[dir.path()], &cfg).expect("collect paths");
        assert_eq!(shallow, vec![file_a]);
    }

    #[test]
    fn missing_input_is_reported() {
        let dir = tempdir().expect("tempdir");
        let err = collect_paths(&[dir.path().join("absent")], &IngestConfig::default())
            .expect_err("missing path");
        assert!(matches!(err, DictError::InvalidConfig(_)));
    }

    #[test]
    fn load_samples_splits_chunks() {
        let dir = tempdir().expect("tempdir");
        let file = dir.path().join("data.bin");
        let bytes: Vec<u8> = (0..=9).collect();
        fs::write(&file, &bytes).expect("write data");

        let cfg = IngestConfig {
            chunk_size: 4,
            ..IngestConfig::default()
        };
        let samples = load_samples(&[file], &cfg).expect("load corpus with chunking enabled");
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0], vec![0, 1, 2, 3]);
        assert_eq!(samples[1], vec![4, 5, 6, 7]);
        assert_eq!(samples[2], vec![8, 9]);
    }

    #[test]
    fn load_samples_keeps_whole_files_when_chunk_zero() {
        let dir = tempdir().expect("tempdir");
        let first = dir.path().join("a.bin");
        let second = dir.path().join("b.bin");
        let empty = dir.path().join("c.bin");
        fs::write(&first, b"first sample").expect("write a");
        fs::write(&second, b"second sample").expect("write b");
        fs::write(&empty, b"").expect("write c");

        let samples =
            load_samples(&[dir.path()], &IngestConfig::default()).expect("load corpus");
        assert_eq!(samples, vec![b"first sample".to_vec(), b"second sample".to_vec()]);
    }
}
