//! Inventory construction.

use indexmap::IndexMap;
use ohm_common::{relative_unix, replace_extension, to_unix_path};
use ohm_config::{Backend, CompileMode, ResolvedConfig};
use ohm_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink};
use ohm_resolve::ModuleUrlResolver;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::classify::classify;
use crate::file_list::{FileEntry, FileList, ModuleFormat};
use crate::record::{ModuleRecord, PackageEntryRecord};

/// Subdirectory of the cache holding staged sources and fragments.
pub const TEMPORARY_DIR: &str = "temporary";

/// Subdirectory of [`TEMPORARY_DIR`] for files outside the project root.
const EXTERNAL_DIR: &str = "external";

/// The module records and package entries of one invocation.
#[derive(Debug, Default)]
pub struct Inventory {
    modules: IndexMap<PathBuf, ModuleRecord>,
    package_entries: Vec<PackageEntryRecord>,
}

impl Inventory {
    /// Builds the inventory in one pass over `list`.
    ///
    /// Files that cannot be compiled are skipped. A path no resolution rule
    /// matches keeps its own path as URL and is reported as a warning.
    pub fn build(
        list: &FileList,
        config: &ResolvedConfig,
        resolver: &ModuleUrlResolver,
        sink: &DiagnosticSink,
    ) -> Self {
        let builder = Builder {
            config,
            resolver,
            sink,
            project_root: to_unix_path(&config.project_root),
            artifact_ext: if config.backend == Backend::Legacy
                && config.compile_mode == CompileMode::Module
            {
                ".protoBin"
            } else {
                ".abc"
            },
        };

        let mut inventory = Inventory::default();
        let mut seen_packages: HashSet<PathBuf> = HashSet::new();
        let mut seen_entries: HashSet<String> = HashSet::new();

        for entry in &list.files {
            if inventory.modules.contains_key(&entry.path) {
                continue;
            }
            let Some(record) = builder.record(entry) else {
                continue;
            };
            if entry.is_entry {
                if let Some(pkg) = &entry.package {
                    let physical = std::fs::canonicalize(&pkg.root).unwrap_or_else(|_| pkg.root.clone());
                    let identifier = builder.package_identifier(&pkg.root);
                    if seen_packages.insert(physical) && seen_entries.insert(identifier.clone()) {
                        inventory.package_entries.push(PackageEntryRecord {
                            entry_identifier: identifier,
                            build_target_path: record.module_url.clone(),
                        });
                    }
                }
            }
            inventory.modules.insert(entry.path.clone(), record);
        }

        tracing::debug!(
            modules = inventory.modules.len(),
            package_entries = inventory.package_entries.len(),
            "inventory built"
        );
        inventory
    }

    /// Module records in file-list order.
    pub fn modules(&self) -> impl Iterator<Item = &ModuleRecord> {
        self.modules.values()
    }

    /// The record for a source path.
    pub fn get(&self, source_path: &Path) -> Option<&ModuleRecord> {
        self.modules.get(source_path)
    }

    /// Number of module records.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Returns `true` if no file made it into the inventory.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Dependency package entry points, deduplicated.
    pub fn package_entries(&self) -> &[PackageEntryRecord] {
        &self.package_entries
    }

    /// Clones all module records in order.
    pub fn to_records(&self) -> Vec<ModuleRecord> {
        self.modules.values().cloned().collect()
    }
}

struct Builder<'a> {
    config: &'a ResolvedConfig,
    resolver: &'a ModuleUrlResolver,
    sink: &'a DiagnosticSink,
    project_root: String,
    artifact_ext: &'static str,
}

impl Builder<'_> {
    fn record(&self, entry: &FileEntry) -> Option<ModuleRecord> {
        let source = to_unix_path(&entry.path);
        let (source_kind, cache_ext) = match classify(&source, self.config.emit_typescript) {
            Ok(found) => found,
            Err(reason) => {
                tracing::trace!(path = %source, ?reason, "skipped");
                return None;
            }
        };
        if self.is_build_output(&entry.path) {
            tracing::trace!(path = %source, "skipped build output");
            return None;
        }

        let relative = relative_unix(&source, &self.project_root);
        let staged = match &relative {
            Some(rel) => format!("{TEMPORARY_DIR}/{rel}"),
            None => format!(
                "{TEMPORARY_DIR}/{EXTERNAL_DIR}/{}",
                source.trim_start_matches('/').replace(':', "")
            ),
        };
        let cache_unix = replace_extension(
            &format!("{}/{staged}", to_unix_path(&self.config.cache_dir)),
            cache_ext,
        );
        let artifact_path = PathBuf::from(replace_extension(&cache_unix, self.artifact_ext));

        let module_url = match self
            .resolver
            .try_resolve(&source, entry.namespace.as_deref())
        {
            Ok(url) => url,
            Err(err) => {
                let mut diag = err.to_diagnostic();
                diag.severity = ohm_diagnostics::Severity::Warning;
                self.sink.emit(diag);
                source.clone()
            }
        };

        let is_cjs = source.ends_with(".cjs");
        let (package_name, package_version) = match &entry.package {
            Some(pkg) => (pkg.name.clone(), pkg.version.clone()),
            None => (
                self.resolver.layout().module_name.clone(),
                self.config.package_version.clone(),
            ),
        };

        Some(ModuleRecord {
            source_path: entry.path.clone(),
            cache_path: PathBuf::from(cache_unix),
            artifact_path,
            module_url,
            is_common_format: is_cjs || entry.format == Some(ModuleFormat::Commonjs),
            package_name,
            package_version,
            relative_path: relative.unwrap_or(source),
            source_kind,
        })
    }

    fn is_build_output(&self, path: &Path) -> bool {
        path.starts_with(&self.config.cache_dir) || path.starts_with(&self.config.output_dir)
    }

    fn package_identifier(&self, root: &Path) -> String {
        let root = to_unix_path(root);
        self.resolver.resolve_package_root(&root).unwrap_or_else(|err| {
            self.sink.emit(
                Diagnostic::warning(DiagnosticCode::RESOLVE_FAILED, "Failed to resolve package root")
                    .with_cause(err.to_string())
                    .with_position(root.clone()),
            );
            root
        })
    }
}
