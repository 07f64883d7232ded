//! Text manifests handed to the compiler.
//!
//! All manifests are newline-terminated lines of unix paths and URLs:
//!
//! - files-info: `cachePath;moduleURL;commonjs|esm;sourcePath;packageName`,
//!   where the last column is the artifact path on the whole-file path;
//! - reuse list: `cachePath;artifactPath` for fragments compiled earlier;
//! - entries: `entryIdentifier:buildTargetPath`.

use ohm_common::to_unix_path;
use ohm_inventory::{ModuleRecord, PackageEntryRecord};
use std::fmt::Write as _;
use std::path::Path;

use crate::error::DispatchError;
use crate::worker::CompilePath;

/// Renders one files-info line.
pub fn files_info_line(record: &ModuleRecord, path: CompilePath) -> String {
    let last = match path {
        CompilePath::WholeFile => to_unix_path(&record.artifact_path),
        CompilePath::PerModule => record.package_name.clone(),
    };
    format!(
        "{};{};{};{};{}",
        to_unix_path(&record.cache_path),
        record.module_url,
        record.format_kind(),
        to_unix_path(&record.source_path),
        last
    )
}

/// Renders a files-info manifest.
pub fn render_files_info<'a>(
    records: impl IntoIterator<Item = &'a ModuleRecord>,
    path: CompilePath,
) -> String {
    let mut out = String::new();
    for record in records {
        out.push_str(&files_info_line(record, path));
        out.push('\n');
    }
    out
}

/// Renders the reuse list of previously compiled fragments.
pub fn render_reuse_list<'a>(records: impl IntoIterator<Item = &'a ModuleRecord>) -> String {
    let mut out = String::new();
    for record in records {
        let _ = writeln!(
            out,
            "{};{}",
            to_unix_path(&record.cache_path),
            to_unix_path(&record.artifact_path)
        );
    }
    out
}

/// Renders the package entries manifest.
pub fn render_entries(entries: &[PackageEntryRecord]) -> String {
    let mut out = String::new();
    for entry in entries {
        let _ = writeln!(out, "{}:{}", entry.entry_identifier, entry.build_target_path);
    }
    out
}

/// Writes a manifest, creating its directory.
pub fn write_manifest(path: &Path, content: &str) -> Result<(), DispatchError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| DispatchError::Io {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    std::fs::write(path, content).map_err(|e| DispatchError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ohm_inventory::SourceKind;
    use std::path::PathBuf;

    fn record(common: bool) -> ModuleRecord {
        ModuleRecord {
            source_path: PathBuf::from("/p/entry/src/main/ets/a.ets"),
            cache_path: PathBuf::from("/c/temporary/entry/src/main/ets/a.js"),
            artifact_path: PathBuf::from("/c/temporary/entry/src/main/ets/a.abc"),
            module_url: "com.example.app/entry/ets/a".into(),
            is_common_format: common,
            package_name: "entry".into(),
            package_version: None,
            relative_path: "entry/src/main/ets/a.ets".into(),
            source_kind: SourceKind::DeclarativeScript,
        }
    }

    #[test]
    fn per_module_line_ends_with_package() {
        assert_eq!(
            files_info_line(&record(false), CompilePath::PerModule),
            "/c/temporary/entry/src/main/ets/a.js;com.example.app/entry/ets/a;esm;\
             /p/entry/src/main/ets/a.ets;entry"
        );
    }

    #[test]
    fn whole_file_line_ends_with_artifact() {
        let line = files_info_line(&record(true), CompilePath::WholeFile);
        assert!(line.contains(";commonjs;"));
        assert!(line.ends_with(";/c/temporary/entry/src/main/ets/a.abc"));
    }

    #[test]
    fn manifests_are_newline_terminated() {
        let recs = [record(false), record(true)];
        assert_eq!(render_files_info(&recs, CompilePath::PerModule).lines().count(), 2);
        assert_eq!(
            render_reuse_list(&recs[..1]),
            "/c/temporary/entry/src/main/ets/a.js;/c/temporary/entry/src/main/ets/a.abc\n"
        );
        let entries = [PackageEntryRecord {
            entry_identifier: "pkg_modules/foo".into(),
            build_target_path: "pkg_modules/foo/index".into(),
        }];
        assert_eq!(render_entries(&entries), "pkg_modules/foo:pkg_modules/foo/index\n");
    }

    #[test]
    fn write_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/filesInfo.txt");
        write_manifest(&path, "x\n").unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "x\n");
    }
}
