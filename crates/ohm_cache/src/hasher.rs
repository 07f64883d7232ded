//! Content hashing of staged sources and compiled artifacts.

use std::path::Path;

use ohm_common::ContentHash;

use crate::error::CacheError;

/// Computes the content hashes the ledger stores.
pub struct SourceHasher;

impl SourceHasher {
    /// Reads a file and returns its XXH3-128 content hash.
    pub fn hash_file(path: &Path) -> Result<ContentHash, CacheError> {
        let content = std::fs::read(path).map_err(|e| CacheError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(ContentHash::from_bytes(&content))
    }

    /// Like [`hash_file`](Self::hash_file), but a missing file is `None`.
    pub fn hash_if_exists(path: &Path) -> Result<Option<ContentHash>, CacheError> {
        match std::fs::read(path) {
            Ok(content) => Ok(Some(ContentHash::from_bytes(&content))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CacheError::Io {
                path: path.to_path_buf(),
                source: e,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_file_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.js");
        std::fs::write(&path, "export const a = 1;").unwrap();

        let h1 = SourceHasher::hash_file(&path).unwrap();
        let h2 = SourceHasher::hash_file(&path).unwrap();
        assert_eq!(h1, h2);
        assert_eq!(h1, ContentHash::from_bytes(b"export const a = 1;"));
    }

    #[test]
    fn hash_file_changes_with_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.js");
        std::fs::write(&path, "v1").unwrap();
        let h1 = SourceHasher::hash_file(&path).unwrap();
        std::fs::write(&path, "v2").unwrap();
        assert_ne!(h1, SourceHasher::hash_file(&path).unwrap());
    }

    #[test]
    fn hash_missing_file_errors() {
        let err = SourceHasher::hash_file(Path::new("/nonexistent/a.js")).unwrap_err();
        assert!(matches!(err, CacheError::Io { .. }));
    }

    #[test]
    fn hash_if_exists_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(SourceHasher::hash_if_exists(&dir.path().join("gone.abc"))
            .unwrap()
            .is_none());
    }
}
