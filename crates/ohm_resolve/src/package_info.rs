//! Bundle and module names read from the package metadata file.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::ResolveError;

/// The names that prefix every module URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageInfo {
    /// Application bundle name, e.g. `com.example.app`.
    pub bundle_name: String,
    /// Name of the module being built, e.g. `entry`.
    pub module_name: String,
}

#[derive(Deserialize)]
struct ModuleJson {
    app: AppSection,
    module: ModuleSection,
}

#[derive(Deserialize)]
struct AppSection {
    #[serde(rename = "bundleName")]
    bundle_name: String,
}

#[derive(Deserialize)]
struct ModuleSection {
    name: String,
}

/// Parses each metadata file at most once per invocation.
#[derive(Debug, Default)]
pub struct PackageInfoMemo {
    parsed: HashMap<PathBuf, PackageInfo>,
}

impl PackageInfoMemo {
    /// Creates an empty memo.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `app.bundleName` and `module.name` from `path`.
    pub fn load(&mut self, path: &Path) -> Result<PackageInfo, ResolveError> {
        if let Some(info) = self.parsed.get(path) {
            return Ok(info.clone());
        }
        tracing::debug!(path = %path.display(), "reading package metadata");
        let text = std::fs::read_to_string(path).map_err(|source| ResolveError::MetadataIo {
            path: path.to_path_buf(),
            source,
        })?;
        let doc: ModuleJson =
            serde_json::from_str(&text).map_err(|e| ResolveError::MetadataParse {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        let info = PackageInfo {
            bundle_name: doc.app.bundle_name,
            module_name: doc.module.name,
        };
        self.parsed.insert(path.to_path_buf(), info.clone());
        Ok(info)
    }

    /// Returns the package names, preferring explicit values over the
    /// metadata file. The file is only read when a name is missing.
    pub fn resolve(
        &mut self,
        bundle_name: Option<&str>,
        module_name: Option<&str>,
        metadata: Option<&Path>,
    ) -> Result<PackageInfo, ResolveError> {
        if let (Some(bundle), Some(module)) = (bundle_name, module_name) {
            return Ok(PackageInfo {
                bundle_name: bundle.to_string(),
                module_name: module.to_string(),
            });
        }
        let from_file = match metadata {
            Some(path) => Some(self.load(path)?),
            None => None,
        };
        let bundle_name = bundle_name
            .map(str::to_string)
            .or_else(|| from_file.as_ref().map(|i| i.bundle_name.clone()))
            .ok_or(ResolveError::MissingName { field: "bundle name" })?;
        let module_name = module_name
            .map(str::to_string)
            .or_else(|| from_file.map(|i| i.module_name))
            .ok_or(ResolveError::MissingName { field: "module name" })?;
        Ok(PackageInfo {
            bundle_name,
            module_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODULE_JSON: &str = r#"{
  "app": { "bundleName": "com.example.app", "versionCode": 1 },
  "module": { "name": "entry", "type": "entry" }
}"#;

    #[test]
    fn reads_names_from_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("module.json");
        std::fs::write(&path, MODULE_JSON).unwrap();

        let mut memo = PackageInfoMemo::new();
        let info = memo.load(&path).unwrap();
        assert_eq!(info.bundle_name, "com.example.app");
        assert_eq!(info.module_name, "entry");
    }

    #[test]
    fn metadata_is_parsed_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("module.json");
        std::fs::write(&path, MODULE_JSON).unwrap();

        let mut memo = PackageInfoMemo::new();
        memo.load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(memo.load(&path).unwrap().module_name, "entry");
    }

    #[test]
    fn explicit_names_win() {
        let mut memo = PackageInfoMemo::new();
        let info = memo
            .resolve(Some("b"), Some("m"), Some(Path::new("/does/not/exist.json")))
            .unwrap();
        assert_eq!(info.bundle_name, "b");
        assert_eq!(info.module_name, "m");
    }

    #[test]
    fn partial_override_reads_rest_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("module.json");
        std::fs::write(&path, MODULE_JSON).unwrap();

        let mut memo = PackageInfoMemo::new();
        let info = memo.resolve(None, Some("feature"), Some(&path)).unwrap();
        assert_eq!(info.bundle_name, "com.example.app");
        assert_eq!(info.module_name, "feature");
    }

    #[test]
    fn missing_names_without_metadata() {
        let mut memo = PackageInfoMemo::new();
        let err = memo.resolve(Some("b"), None, None).unwrap_err();
        assert!(matches!(err, ResolveError::MissingName { field: "module name" }));
    }

    #[test]
    fn malformed_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("module.json");
        std::fs::write(&path, "{ \"app\": {} }").unwrap();
        let err = PackageInfoMemo::new().load(&path).unwrap_err();
        assert!(matches!(err, ResolveError::MetadataParse { .. }));
    }
}
