//! Copies bundled model files into a cache directory before first use.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::{Error, Result};

/// Makes sure every file in `files` is present in `cache_dir`, copying it from
/// `source_dir` when it is missing. Returns the cached paths in order.
///
/// Files already in the cache are left untouched.
pub fn prepare(source_dir: &Path, cache_dir: &Path, files: &[&str]) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(cache_dir).map_err(|err| Error::Resource {
        path: cache_dir.to_owned(),
        reason: err.to_string(),
    })?;

    files
        .iter()
        .map(|name| {
            let target = cache_dir.join(name);
            if target.exists() {
                return Ok(target);
            }

            let source = source_dir.join(name);
            if !source.is_file() {
                return Err(Error::Resource {
                    path: source,
                    reason: "bundled file not found".to_string(),
                });
            }

            debug!("Copying {} to {}", source.display(), target.display());
            fs::copy(&source, &target).map_err(|err| Error::Resource {
                path: target.clone(),
                reason: err.to_string(),
            })?;
            Ok(target)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::prepare;
    use crate::Error;

    #[test]
    fn copies_missing_files() {
        let source = tempfile::tempdir().unwrap();
        let cache = tempfile::tempdir().unwrap();
        fs::write(source.path().join("model.onnx"), b"model").unwrap();
        fs::write(source.path().join("tokenizer.json"), b"{}").unwrap();

        let cache_dir = cache.path().join("heb-lemmatizer");
        let files = prepare(source.path(), &cache_dir, &["model.onnx", "tokenizer.json"]).unwrap();

        assert_eq!(files, vec![cache_dir.join("model.onnx"), cache_dir.join("tokenizer.json")]);
        assert_eq!(fs::read(&files[0]).unwrap(), b"model");
    }

    #[test]
    fn keeps_cached_files() {
        let source = tempfile::tempdir().unwrap();
        let cache = tempfile::tempdir().unwrap();
        fs::write(source.path().join("model.onnx"), b"new").unwrap();
        fs::write(cache.path().join("model.onnx"), b"cached").unwrap();

        let files = prepare(source.path(), cache.path(), &["model.onnx"]).unwrap();
        assert_eq!(fs::read(&files[0]).unwrap(), b"cached");
    }

    #[test]
    fn missing_bundle_fails() {
        let source = tempfile::tempdir().unwrap();
        let cache = tempfile::tempdir().unwrap();
        match prepare(source.path(), cache.path(), &["model.onnx"]) {
            Err(Error::Resource { path, .. }) => assert!(path.ends_with("model.onnx")),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
