//! The persisted fine-grained ledger.
//!
//! `ledger.json` is a flat JSON object. The reserved key `@fingerprint`
//! holds the coarse configuration fingerprint; every other key is the unix
//! path of a staged source or compiled artifact, mapped to its content hash.
//!
//! A `ledger.pending` marker is written before compilation starts and
//! removed only after a verified commit. A marker found at load time means
//! the previous invocation died mid-build, so its ledger is not trusted.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use ohm_common::{to_unix_path, ContentHash};

use crate::error::CacheError;
use crate::hasher::SourceHasher;

/// Name of the ledger file within the cache directory.
pub const LEDGER_FILE: &str = "ledger.json";

/// Name of the in-progress marker within the cache directory.
pub const PENDING_MARKER: &str = "ledger.pending";

/// Reserved ledger key holding the coarse fingerprint.
pub const FINGERPRINT_KEY: &str = "@fingerprint";

/// Something the ledger tracks: a staged source and its compiled artifact.
pub trait LedgerItem {
    /// The staged source the compiler reads.
    fn cache_path(&self) -> &Path;
    /// The artifact the compiler writes.
    fn artifact_path(&self) -> &Path;
}

/// How the ledger was obtained at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// No ledger existed.
    Fresh,
    /// The stored ledger was loaded and its fingerprint matched.
    Loaded,
    /// The stored fingerprint differed; all entries were discarded.
    FingerprintChanged,
    /// A pending marker was left behind; all entries were discarded.
    Interrupted,
    /// The stored ledger exists but could not be read or parsed; all entries
    /// were discarded.
    Corrupt,
}

/// Candidates split by whether their cached artifact is still valid.
#[derive(Debug)]
pub struct Partition<T> {
    /// Items whose staged source and artifact both match the ledger.
    pub reusable: Vec<T>,
    /// Items that must be compiled this invocation.
    pub must_compile: Vec<T>,
}

impl<T> Partition<T> {
    /// Every item must be compiled. Used when no ledger is kept.
    pub fn all_stale(items: Vec<T>) -> Self {
        Self {
            reusable: Vec::new(),
            must_compile: items,
        }
    }
}

/// The fine ledger for one invocation.
#[derive(Debug)]
pub struct Ledger {
    cache_dir: PathBuf,
    fingerprint: String,
    stored: BTreeMap<String, ContentHash>,
    next: BTreeMap<String, ContentHash>,
    outcome: LoadOutcome,
}

impl Ledger {
    /// Loads the ledger from `cache_dir`, discarding it when the stored
    /// fingerprint differs from `fingerprint`, a pending marker is present,
    /// or the file is unreadable.
    pub fn load(cache_dir: &Path, fingerprint: &str) -> Self {
        let (stored, outcome) = Self::read_stored(cache_dir, fingerprint);
        match outcome {
            LoadOutcome::Fresh => tracing::debug!("no ledger found, starting fresh"),
            LoadOutcome::Loaded => tracing::debug!(entries = stored.len(), "ledger loaded"),
            LoadOutcome::FingerprintChanged => {
                tracing::info!("configuration fingerprint changed, discarding ledger")
            }
            LoadOutcome::Interrupted => {
                tracing::warn!("previous build did not finish, discarding ledger")
            }
            LoadOutcome::Corrupt => tracing::warn!("ledger is unreadable, discarding it"),
        }
        Self {
            cache_dir: cache_dir.to_path_buf(),
            fingerprint: fingerprint.to_string(),
            stored,
            next: BTreeMap::new(),
            outcome,
        }
    }

    fn read_stored(cache_dir: &Path, fingerprint: &str) -> (BTreeMap<String, ContentHash>, LoadOutcome) {
        let empty = BTreeMap::new();
        if cache_dir.join(PENDING_MARKER).exists() {
            return (empty, LoadOutcome::Interrupted);
        }
        let path = cache_dir.join(LEDGER_FILE);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return (empty, LoadOutcome::Fresh)
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to read ledger");
                return (empty, LoadOutcome::Corrupt);
            }
        };
        let Ok(mut raw) = serde_json::from_str::<BTreeMap<String, String>>(&content) else {
            return (empty, LoadOutcome::Corrupt);
        };
        if raw.remove(FINGERPRINT_KEY).as_deref() != Some(fingerprint) {
            return (empty, LoadOutcome::FingerprintChanged);
        }
        let parsed: Result<BTreeMap<String, ContentHash>, _> = raw
            .into_iter()
            .map(|(k, v)| v.parse().map(|h| (k, h)))
            .collect();
        match parsed {
            Ok(entries) => (entries, LoadOutcome::Loaded),
            Err(_) => (empty, LoadOutcome::Corrupt),
        }
    }

    /// How this ledger was obtained.
    pub fn outcome(&self) -> LoadOutcome {
        self.outcome
    }

    /// Number of entries loaded from disk.
    pub fn stored_len(&self) -> usize {
        self.stored.len()
    }

    /// Whether every entry loaded from disk was carried forward unchanged by
    /// [`filter_reusable`](Self::filter_reusable).
    ///
    /// False when a tracked file was dropped from the inventory, so an image
    /// assembled from the stored entries would still contain it.
    pub fn carries_forward_all(&self) -> bool {
        self.next == self.stored
    }

    /// Marks a build as in progress. Must precede any compilation.
    pub fn begin(&self) -> Result<(), CacheError> {
        std::fs::create_dir_all(&self.cache_dir).map_err(|e| CacheError::Io {
            path: self.cache_dir.clone(),
            source: e,
        })?;
        let marker = self.cache_dir.join(PENDING_MARKER);
        std::fs::write(&marker, &self.fingerprint).map_err(|e| CacheError::Io {
            path: marker,
            source: e,
        })
    }

    /// Splits `candidates` into reusable and must-compile items.
    ///
    /// Every candidate's staged source must exist; a missing one is fatal.
    /// Reusable items carry their entries forward into the next ledger.
    pub fn filter_reusable<T: LedgerItem>(
        &mut self,
        candidates: Vec<T>,
    ) -> Result<Partition<T>, CacheError> {
        let mut reusable = Vec::new();
        let mut must_compile = Vec::new();

        for item in candidates {
            let cache_hash = SourceHasher::hash_if_exists(item.cache_path())?.ok_or_else(|| {
                CacheError::MissingCacheFile {
                    path: item.cache_path().to_path_buf(),
                }
            })?;
            let cache_key = to_unix_path(item.cache_path());
            let artifact_key = to_unix_path(item.artifact_path());

            let source_matches = self.stored.get(&cache_key) == Some(&cache_hash);
            let artifact_hash = if source_matches {
                SourceHasher::hash_if_exists(item.artifact_path())?
            } else {
                None
            };

            match artifact_hash {
                Some(h) if self.stored.get(&artifact_key) == Some(&h) => {
                    self.next.insert(cache_key, cache_hash);
                    self.next.insert(artifact_key, h);
                    reusable.push(item);
                }
                _ => must_compile.push(item),
            }
        }

        tracing::debug!(
            reusable = reusable.len(),
            must_compile = must_compile.len(),
            "ledger filter"
        );
        Ok(Partition {
            reusable,
            must_compile,
        })
    }

    /// Records fresh hashes for `compiled` and persists the ledger.
    ///
    /// Every artifact the new ledger references must exist. The ledger file
    /// is replaced atomically and the pending marker removed last.
    pub fn commit<T: LedgerItem>(&mut self, compiled: &[T]) -> Result<(), CacheError> {
        for item in compiled {
            let artifact = item.artifact_path();
            if !artifact.exists() {
                return Err(CacheError::MissingArtifact {
                    path: artifact.to_path_buf(),
                });
            }
            let cache_hash = SourceHasher::hash_file(item.cache_path())?;
            let artifact_hash = SourceHasher::hash_file(artifact)?;
            self.next.insert(to_unix_path(item.cache_path()), cache_hash);
            self.next.insert(to_unix_path(artifact), artifact_hash);
        }

        let mut doc: BTreeMap<&str, String> = BTreeMap::new();
        doc.insert(FINGERPRINT_KEY, self.fingerprint.clone());
        for (key, hash) in &self.next {
            doc.insert(key.as_str(), hash.to_string());
        }
        let json = serde_json::to_string_pretty(&doc).map_err(|e| CacheError::Serialization {
            reason: e.to_string(),
        })?;

        let path = self.cache_dir.join(LEDGER_FILE);
        let tmp = self.cache_dir.join(format!("{LEDGER_FILE}.tmp"));
        std::fs::write(&tmp, json).map_err(|e| CacheError::Io {
            path: tmp.clone(),
            source: e,
        })?;
        std::fs::rename(&tmp, &path).map_err(|e| CacheError::Io {
            path: path.clone(),
            source: e,
        })?;

        let marker = self.cache_dir.join(PENDING_MARKER);
        match std::fs::remove_file(&marker) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(CacheError::Io { path: marker, source: e }),
        }
        tracing::debug!(entries = self.next.len(), "ledger committed");
        self.stored = std::mem::take(&mut self.next);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Item {
        cache: PathBuf,
        artifact: PathBuf,
    }

    impl LedgerItem for Item {
        fn cache_path(&self) -> &Path {
            &self.cache
        }
        fn artifact_path(&self) -> &Path {
            &self.artifact
        }
    }

    fn item(dir: &Path, name: &str) -> Item {
        Item {
            cache: dir.join(format!("temporary/{name}.js")),
            artifact: dir.join(format!("temporary/{name}.abc")),
        }
    }

    fn stage(item: &Item, source: &str) {
        std::fs::create_dir_all(item.cache.parent().unwrap()).unwrap();
        std::fs::write(&item.cache, source).unwrap();
    }

    fn compile(item: &Item) {
        let src = std::fs::read(&item.cache).unwrap();
        std::fs::write(&item.artifact, [b"abc:".as_slice(), &src].concat()).unwrap();
    }

    /// Runs one build over `names` and returns the names that were compiled.
    fn build(dir: &Path, fp: &str, names: &[&str]) -> Vec<String> {
        let mut ledger = Ledger::load(dir, fp);
        ledger.begin().unwrap();
        let items: Vec<Item> = names.iter().map(|n| item(dir, n)).collect();
        let part = ledger.filter_reusable(items).unwrap();
        for i in &part.must_compile {
            compile(i);
        }
        ledger.commit(&part.must_compile).unwrap();
        part.must_compile
            .iter()
            .map(|i| i.cache.file_stem().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn fresh_ledger_compiles_everything() {
        let dir = tempfile::tempdir().unwrap();
        for n in ["a", "b"] {
            stage(&item(dir.path(), n), n);
        }
        assert_eq!(Ledger::load(dir.path(), "fp").outcome(), LoadOutcome::Fresh);
        assert_eq!(build(dir.path(), "fp", &["a", "b"]), vec!["a", "b"]);
    }

    #[test]
    fn unchanged_rebuild_reuses_everything() {
        let dir = tempfile::tempdir().unwrap();
        for n in ["a", "b"] {
            stage(&item(dir.path(), n), n);
        }
        build(dir.path(), "fp", &["a", "b"]);
        let ledger_before = std::fs::read(dir.path().join(LEDGER_FILE)).unwrap();

        assert!(build(dir.path(), "fp", &["a", "b"]).is_empty());
        assert_eq!(std::fs::read(dir.path().join(LEDGER_FILE)).unwrap(), ledger_before);
        assert!(!dir.path().join(PENDING_MARKER).exists());
    }

    #[test]
    fn edited_source_recompiles_only_that_file() {
        let dir = tempfile::tempdir().unwrap();
        for n in ["a", "b", "c"] {
            stage(&item(dir.path(), n), n);
        }
        build(dir.path(), "fp", &["a", "b", "c"]);
        stage(&item(dir.path(), "b"), "b edited");
        assert_eq!(build(dir.path(), "fp", &["a", "b", "c"]), vec!["b"]);
    }

    #[test]
    fn tampered_artifact_recompiles() {
        let dir = tempfile::tempdir().unwrap();
        let a = item(dir.path(), "a");
        stage(&a, "a");
        build(dir.path(), "fp", &["a"]);
        std::fs::write(&a.artifact, "garbage").unwrap();
        assert_eq!(build(dir.path(), "fp", &["a"]), vec!["a"]);

        std::fs::remove_file(&a.artifact).unwrap();
        assert_eq!(build(dir.path(), "fp", &["a"]), vec!["a"]);
    }

    #[test]
    fn fingerprint_change_invalidates_all() {
        let dir = tempfile::tempdir().unwrap();
        for n in ["a", "b"] {
            stage(&item(dir.path(), n), n);
        }
        build(dir.path(), "fp1", &["a", "b"]);
        assert_eq!(
            Ledger::load(dir.path(), "fp2").outcome(),
            LoadOutcome::FingerprintChanged
        );
        assert_eq!(build(dir.path(), "fp2", &["a", "b"]), vec!["a", "b"]);
    }

    #[test]
    fn removed_files_drop_out_of_ledger() {
        let dir = tempfile::tempdir().unwrap();
        for n in ["a", "b"] {
            stage(&item(dir.path(), n), n);
        }
        build(dir.path(), "fp", &["a", "b"]);
        build(dir.path(), "fp", &["a"]);
        let ledger = Ledger::load(dir.path(), "fp");
        assert_eq!(ledger.stored_len(), 2);
    }

    #[test]
    fn dropped_file_is_not_carried_forward() {
        let dir = tempfile::tempdir().unwrap();
        for n in ["a", "b"] {
            stage(&item(dir.path(), n), n);
        }
        build(dir.path(), "fp", &["a", "b"]);

        let mut ledger = Ledger::load(dir.path(), "fp");
        let part = ledger
            .filter_reusable(vec![item(dir.path(), "a"), item(dir.path(), "b")])
            .unwrap();
        assert!(part.must_compile.is_empty());
        assert!(ledger.carries_forward_all());

        let mut ledger = Ledger::load(dir.path(), "fp");
        let part = ledger.filter_reusable(vec![item(dir.path(), "a")]).unwrap();
        assert!(part.must_compile.is_empty());
        assert!(!ledger.carries_forward_all());
    }

    #[test]
    fn leftover_marker_discards_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let a = item(dir.path(), "a");
        stage(&a, "a");
        build(dir.path(), "fp", &["a"]);

        let ledger = Ledger::load(dir.path(), "fp");
        ledger.begin().unwrap();
        drop(ledger);

        assert_eq!(Ledger::load(dir.path(), "fp").outcome(), LoadOutcome::Interrupted);
        assert_eq!(build(dir.path(), "fp", &["a"]), vec!["a"]);
        assert_eq!(Ledger::load(dir.path(), "fp").outcome(), LoadOutcome::Loaded);
    }

    #[test]
    fn missing_cache_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut ledger = Ledger::load(dir.path(), "fp");
        let err = ledger.filter_reusable(vec![item(dir.path(), "ghost")]).unwrap_err();
        assert!(matches!(err, CacheError::MissingCacheFile { .. }));
    }

    #[test]
    fn commit_requires_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let a = item(dir.path(), "a");
        stage(&a, "a");
        let mut ledger = Ledger::load(dir.path(), "fp");
        ledger.begin().unwrap();
        let part = ledger.filter_reusable(vec![a]).unwrap();
        let err = ledger.commit(&part.must_compile).unwrap_err();
        assert!(matches!(err, CacheError::MissingArtifact { .. }));
        assert!(dir.path().join(PENDING_MARKER).exists());
        assert!(!dir.path().join(LEDGER_FILE).exists());
    }

    #[test]
    fn corrupt_ledger_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(LEDGER_FILE), "not json {{{").unwrap();
        assert_eq!(Ledger::load(dir.path(), "fp").outcome(), LoadOutcome::Corrupt);

        std::fs::write(
            dir.path().join(LEDGER_FILE),
            r#"{"@fingerprint": "fp", "/c/a.js": "zz"}"#,
        )
        .unwrap();
        assert_eq!(Ledger::load(dir.path(), "fp").outcome(), LoadOutcome::Corrupt);
    }

    #[test]
    fn unreadable_ledger_is_corrupt_not_fresh() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(LEDGER_FILE)).unwrap();
        let ledger = Ledger::load(dir.path(), "fp");
        assert_eq!(ledger.outcome(), LoadOutcome::Corrupt);
        assert_eq!(ledger.stored_len(), 0);
    }

    #[test]
    fn ledger_file_is_flat_json() {
        let dir = tempfile::tempdir().unwrap();
        let a = item(dir.path(), "a");
        stage(&a, "a");
        build(dir.path(), "fp", &["a"]);
        let doc: BTreeMap<String, String> =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join(LEDGER_FILE)).unwrap())
                .unwrap();
        assert_eq!(doc[FINGERPRINT_KEY], "fp");
        assert_eq!(doc.len(), 3);
        assert_eq!(
            doc[&to_unix_path(&a.cache)],
            ContentHash::from_bytes(b"a").to_string()
        );
    }
}
