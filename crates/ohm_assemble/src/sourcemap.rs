//! Source-map consolidation.
//!
//! The compiler leaves an optional fragment at `<cachePath>.map` for every
//! file it compiles. Fragments are collected into one JSON object keyed by
//! each file's project-relative path, stamped with package origin fields,
//! and persisted in the cache so unchanged files keep their entries.

use ohm_inventory::ModuleRecord;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{io_err, AssembleError};

/// File name of the consolidated source map in the output directory.
pub const SOURCE_MAP_FILE: &str = "sourceMaps.map";

/// File name of the cached copy in the cache directory.
pub const SOURCE_MAP_CACHE: &str = "sourceMaps.json";

/// The project's own package, stamped on every entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageStamp {
    /// Package name.
    pub name: String,
    /// Package version, if known.
    pub version: Option<String>,
}

fn stamp(name: &str, version: Option<&str>) -> String {
    format!("{name}|{}", version.unwrap_or(""))
}

/// Consolidated source maps, keyed by relative path.
#[derive(Debug, Default)]
pub struct SourceMapStore {
    entries: BTreeMap<String, Value>,
}

impl SourceMapStore {
    /// An empty store, used for patch builds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the cached copy from `cache_dir`. A missing or unreadable copy
    /// gives an empty store.
    pub fn load_cached(cache_dir: &Path) -> Self {
        Self::load_from(&cache_dir.join(SOURCE_MAP_CACHE))
    }

    /// Loads a consolidated document from `path`, or an empty store.
    pub fn load_from(path: &Path) -> Self {
        let entries = std::fs::read_to_string(path)
            .ok()
            .and_then(|text| serde_json::from_str::<BTreeMap<String, Value>>(&text).ok())
            .unwrap_or_default();
        tracing::debug!(entries = entries.len(), "cached source maps loaded");
        Self { entries }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entry for a relative path.
    pub fn get(&self, relative_path: &str) -> Option<&Value> {
        self.entries.get(relative_path)
    }

    /// Drops entries for files not in `live`, then replaces the entries of
    /// `compiled` with their fresh fragments. A compiled file that left no
    /// fragment loses its entry.
    pub fn update(
        &mut self,
        live: &[ModuleRecord],
        compiled: &[ModuleRecord],
        project: &PackageStamp,
    ) -> Result<(), AssembleError> {
        let keep: std::collections::HashSet<&str> =
            live.iter().map(|r| r.relative_path.as_str()).collect();
        self.entries.retain(|k, _| keep.contains(k.as_str()));

        let entry_info = stamp(&project.name, project.version.as_deref());
        for record in compiled {
            let Some(mut map) = read_fragment(&fragment_path(record))? else {
                self.entries.remove(&record.relative_path);
                continue;
            };
            map.insert("entry-package-info".to_string(), Value::String(entry_info.clone()));
            map.insert(
                "package-info".to_string(),
                Value::String(stamp(&record.package_name, record.package_version.as_deref())),
            );
            self.entries.insert(record.relative_path.clone(), Value::Object(map));
        }
        Ok(())
    }

    /// Writes the consolidated document to `path`.
    pub fn write(&self, path: &Path) -> Result<(), AssembleError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err(parent))?;
        }
        let json = serde_json::to_string_pretty(&self.entries).map_err(|e| AssembleError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::other(e),
        })?;
        std::fs::write(path, json).map_err(io_err(path))
    }
}

/// Where the compiler leaves a file's source-map fragment.
pub fn fragment_path(record: &ModuleRecord) -> PathBuf {
    let mut path = record.cache_path.clone().into_os_string();
    path.push(".map");
    PathBuf::from(path)
}

fn read_fragment(path: &Path) -> Result<Option<Map<String, Value>>, AssembleError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(io_err(path)(e)),
    };
    match serde_json::from_str(&text) {
        Ok(Value::Object(map)) => Ok(Some(map)),
        Ok(_) => Err(AssembleError::SourceMapParse {
            path: path.to_path_buf(),
            reason: "expected a JSON object".to_string(),
        }),
        Err(e) => Err(AssembleError::SourceMapParse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ohm_inventory::SourceKind;

    fn record(dir: &Path, name: &str) -> ModuleRecord {
        ModuleRecord {
            source_path: dir.join(format!("src/{name}.ets")),
            cache_path: dir.join(format!("cache/{name}.js")),
            artifact_path: dir.join(format!("cache/{name}.abc")),
            module_url: format!("b/entry/{name}"),
            is_common_format: false,
            package_name: "entry".into(),
            package_version: Some("1.0.0".into()),
            relative_path: format!("src/{name}.ets"),
            source_kind: SourceKind::DeclarativeScript,
        }
    }

    fn fragment(record: &ModuleRecord, mappings: &str) {
        std::fs::create_dir_all(record.cache_path.parent().unwrap()).unwrap();
        std::fs::write(
            fragment_path(record),
            format!(r#"{{"version": 3, "sources": ["{}"], "mappings": "{mappings}"}}"#, record.relative_path),
        )
        .unwrap();
    }

    fn project() -> PackageStamp {
        PackageStamp {
            name: "entry".into(),
            version: None,
        }
    }

    #[test]
    fn fragments_are_stamped() {
        let dir = tempfile::tempdir().unwrap();
        let a = record(dir.path(), "a");
        fragment(&a, "AAAA");
        let mut store = SourceMapStore::new();
        store.update(&[a.clone()], &[a], &project()).unwrap();
        let entry = store.get("src/a.ets").unwrap();
        assert_eq!(entry["mappings"], "AAAA");
        assert_eq!(entry["entry-package-info"], "entry|");
        assert_eq!(entry["package-info"], "entry|1.0.0");
    }

    #[test]
    fn stale_entries_dropped_and_recompiled_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let a = record(dir.path(), "a");
        let b = record(dir.path(), "b");
        fragment(&a, "AAAA");
        fragment(&b, "BBBB");
        let mut store = SourceMapStore::new();
        store.update(&[a.clone(), b.clone()], &[a.clone(), b.clone()], &project()).unwrap();
        store.write(&dir.path().join("cache").join(SOURCE_MAP_CACHE)).unwrap();

        fragment(&a, "CCCC");
        let mut store = SourceMapStore::load_cached(&dir.path().join("cache"));
        assert_eq!(store.len(), 2);
        store.update(&[a.clone()], &[a], &project()).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("src/a.ets").unwrap()["mappings"], "CCCC");
        assert!(store.get("src/b.ets").is_none());
    }

    #[test]
    fn unchanged_files_keep_cached_entry() {
        let dir = tempfile::tempdir().unwrap();
        let a = record(dir.path(), "a");
        fragment(&a, "AAAA");
        let mut store = SourceMapStore::new();
        store.update(&[a.clone()], &[a.clone()], &project()).unwrap();
        std::fs::remove_file(fragment_path(&a)).unwrap();
        store.update(&[a], &[], &project()).unwrap();
        assert_eq!(store.get("src/a.ets").unwrap()["mappings"], "AAAA");
    }

    #[test]
    fn recompiled_file_without_fragment_loses_entry() {
        let dir = tempfile::tempdir().unwrap();
        let a = record(dir.path(), "a");
        let b = record(dir.path(), "b");
        fragment(&a, "AAAA");
        fragment(&b, "BBBB");
        let mut store = SourceMapStore::new();
        store.update(&[a.clone(), b.clone()], &[a.clone(), b.clone()], &project()).unwrap();

        std::fs::remove_file(fragment_path(&a)).unwrap();
        store.update(&[a.clone(), b.clone()], &[a], &project()).unwrap();
        assert!(store.get("src/a.ets").is_none());
        assert_eq!(store.get("src/b.ets").unwrap()["mappings"], "BBBB");
    }

    #[test]
    fn malformed_fragment_errors() {
        let dir = tempfile::tempdir().unwrap();
        let a = record(dir.path(), "a");
        std::fs::create_dir_all(dir.path().join("cache")).unwrap();
        std::fs::write(fragment_path(&a), "[1, 2]").unwrap();
        let err = SourceMapStore::new().update(&[a.clone()], &[a], &project()).unwrap_err();
        assert!(matches!(err, AssembleError::SourceMapParse { .. }));
    }

    #[test]
    fn write_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let recs = [record(dir.path(), "b"), record(dir.path(), "a")];
        for r in &recs {
            fragment(r, "AAAA");
        }
        let mut store = SourceMapStore::new();
        store.update(&recs, &recs, &project()).unwrap();
        let p1 = dir.path().join("one.map");
        let p2 = dir.path().join("two.map");
        store.write(&p1).unwrap();
        SourceMapStore::load_from(&p1).write(&p2).unwrap();
        assert_eq!(std::fs::read(p1).unwrap(), std::fs::read(p2).unwrap());
    }
}
