//! Copying sources into the cache directory.

use crate::error::InventoryError;
use crate::record::ModuleRecord;

/// Copies each record's source to its cache path when the staged copy is
/// missing or differs. Returns the number of files written.
///
/// Identical content is left alone so staged hashes, and with them the
/// ledger, stay stable across invocations.
pub fn stage_sources<'a>(
    records: impl IntoIterator<Item = &'a ModuleRecord>,
) -> Result<usize, InventoryError> {
    let mut written = 0;
    for record in records {
        let source = std::fs::read(&record.source_path).map_err(|e| InventoryError::Io {
            path: record.source_path.clone(),
            source: e,
        })?;
        match std::fs::read(&record.cache_path) {
            Ok(existing) if existing == source => continue,
            _ => {}
        }
        if let Some(parent) = record.cache_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| InventoryError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        std::fs::write(&record.cache_path, &source).map_err(|e| InventoryError::Io {
            path: record.cache_path.clone(),
            source: e,
        })?;
        written += 1;
    }
    if written > 0 {
        tracing::debug!(written, "staged sources");
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::SourceKind;
    use std::path::Path;

    fn record(dir: &Path) -> ModuleRecord {
        ModuleRecord {
            source_path: dir.join("src/a.ts"),
            cache_path: dir.join("cache/temporary/src/a.js"),
            artifact_path: dir.join("cache/temporary/src/a.abc"),
            module_url: "b/m/a".into(),
            is_common_format: false,
            package_name: "m".into(),
            package_version: None,
            relative_path: "src/a.ts".into(),
            source_kind: SourceKind::TypedScript,
        }
    }

    #[test]
    fn stages_missing_and_changed_files_only() {
        let dir = tempfile::tempdir().unwrap();
        let rec = record(dir.path());
        std::fs::create_dir_all(dir.path().join("src")).unwrap();
        std::fs::write(&rec.source_path, "let a = 1;").unwrap();

        assert_eq!(stage_sources([&rec]).unwrap(), 1);
        assert_eq!(std::fs::read_to_string(&rec.cache_path).unwrap(), "let a = 1;");
        let mtime = std::fs::metadata(&rec.cache_path).unwrap().modified().unwrap();

        assert_eq!(stage_sources([&rec]).unwrap(), 0);
        assert_eq!(
            std::fs::metadata(&rec.cache_path).unwrap().modified().unwrap(),
            mtime
        );

        std::fs::write(&rec.source_path, "let a = 2;").unwrap();
        assert_eq!(stage_sources([&rec]).unwrap(), 1);
        assert_eq!(std::fs::read_to_string(&rec.cache_path).unwrap(), "let a = 2;");
    }

    #[test]
    fn missing_source_errors() {
        let dir = tempfile::tempdir().unwrap();
        let err = stage_sources([&record(dir.path())]).unwrap_err();
        assert!(matches!(err, InventoryError::Io { .. }));
    }
}
