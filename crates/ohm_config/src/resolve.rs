//! Resolution of a parsed configuration into the settings of one invocation.
//!
//! Relative paths are anchored at the configuration file's directory, the
//! backend string becomes a [`Backend`], host mode overrides are merged with
//! `[mode]`, and cross-field constraints are checked. Nothing here touches
//! the filesystem.

use indexmap::IndexMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use crate::error::ConfigError;
use crate::mode::{BuildMode, ModeFlags};
use crate::types::{CompileMode, PackageStrategy, PartitionSection, ProjectConfig};

/// The external compiler program the pipeline targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// Multithreaded compiler consuming one files-info manifest.
    Modern,
    /// Single-threaded compiler driven through the worker pool.
    Legacy,
}

impl FromStr for Backend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "modern" => Ok(Backend::Modern),
            "legacy" => Ok(Backend::Legacy),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Modern => f.write_str("modern"),
            Backend::Legacy => f.write_str("legacy"),
        }
    }
}

/// Fully resolved settings for one invocation.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Absolute project root.
    pub project_root: PathBuf,
    /// Source root of the module being built.
    pub source_root: PathBuf,
    /// Explicit bundle name, overriding the metadata file.
    pub bundle_name: Option<String>,
    /// Explicit module name, overriding the metadata file.
    pub module_name: Option<String>,
    /// Metadata file carrying bundle and module names.
    pub module_json: Option<PathBuf>,
    /// Namespace for module URLs.
    pub namespace: Option<String>,
    /// Dependency-package directory name.
    pub package_dir: String,
    /// Dependency-package URL strategy.
    pub package_strategy: PackageStrategy,
    /// The project's own package name.
    pub package_name: Option<String>,
    /// The project's own package version.
    pub package_version: Option<String>,
    /// Module name to absolute module root, in declaration order.
    pub modules: IndexMap<String, PathBuf>,
    /// Cache directory.
    pub cache_dir: PathBuf,
    /// Output directory of the selected mode.
    pub output_dir: PathBuf,
    /// Compiler backend.
    pub backend: Backend,
    /// Compilation granularity.
    pub compile_mode: CompileMode,
    /// Copy sources into the cache when missing or stale.
    pub stage_sources: bool,
    /// Keep a ledger across invocations.
    pub incremental: bool,
    /// Let the compiler consume typed sources directly.
    pub emit_typescript: bool,
    /// Worker process bound.
    pub max_workers: usize,
    /// Partition policies.
    pub partition: PartitionSection,
    /// Compiler program.
    pub compiler_path: PathBuf,
    /// Compiler version.
    pub compiler_version: Option<String>,
    /// Merge tool program.
    pub merge_tool: Option<PathBuf>,
    /// Target SDK version.
    pub target_sdk: Option<String>,
    /// Compatible SDK version.
    pub compatible_sdk: Option<String>,
    /// Runtime OS.
    pub runtime_os: Option<String>,
    /// AOT mode.
    pub aot_mode: Option<String>,
    /// AOT profile path.
    pub aot_profile: Option<PathBuf>,
    /// Selected build mode.
    pub mode: BuildMode,
    /// Changed-files document.
    pub changed_files: Option<PathBuf>,
    /// Symbol table written by the first reload build.
    pub symbol_map: PathBuf,
    /// Symbol table of the image a hot fix patches.
    pub old_symbol_map: Option<PathBuf>,
    /// Patch output directory.
    pub patch_dir: PathBuf,
}

/// Joins a relative path onto `base` and folds `.` and `..` lexically.
fn anchor(base: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };
    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Resolves a parsed configuration against `base_dir`, the directory holding
/// the configuration file, merging `overrides` into the `[mode]` flags.
pub fn resolve_config(
    config: &ProjectConfig,
    base_dir: &Path,
    overrides: ModeFlags,
) -> Result<ResolvedConfig, ConfigError> {
    let backend: Backend = config.build.backend.parse()?;
    let mode = config.mode.merged(overrides).select()?;

    if mode.is_patch() && backend == Backend::Legacy {
        return Err(ConfigError::ValidationError(format!(
            "{mode} requires the modern backend"
        )));
    }
    if mode.is_patch() && config.build.compile_mode == CompileMode::Bundle {
        return Err(ConfigError::ValidationError(format!(
            "{mode} requires compile_mode = \"module\""
        )));
    }
    if mode == BuildMode::HotFix && config.reload.old_symbol_map.is_none() {
        return Err(ConfigError::MissingField("reload.old_symbol_map".to_string()));
    }
    if backend == Backend::Legacy
        && config.build.compile_mode == CompileMode::Module
        && config.compiler.merge_tool.is_none()
    {
        return Err(ConfigError::MissingField("compiler.merge_tool".to_string()));
    }

    let project_root = anchor(base_dir, &config.project.root);
    let cache_dir = anchor(base_dir, &config.build.cache_dir);
    let output_dir = if mode == BuildMode::Preview {
        anchor(base_dir, &config.build.preview_output_dir)
    } else {
        anchor(base_dir, &config.build.output_dir)
    };
    let source_root = config
        .project
        .source_root
        .as_deref()
        .map(|p| anchor(base_dir, p))
        .unwrap_or_else(|| project_root.clone());

    let reload = &config.reload;
    let symbol_map = reload
        .symbol_map
        .as_deref()
        .map(|p| anchor(base_dir, p))
        .unwrap_or_else(|| cache_dir.join("symbolMap.map"));
    let patch_dir = reload
        .patch_dir
        .as_deref()
        .map(|p| anchor(base_dir, p))
        .unwrap_or_else(|| cache_dir.join("patch"));

    let modules = config
        .modules
        .iter()
        .map(|(name, root)| (name.clone(), anchor(base_dir, root)))
        .collect();

    let compiler = &config.compiler;
    Ok(ResolvedConfig {
        project_root,
        source_root,
        bundle_name: config.project.bundle_name.clone(),
        module_name: config.project.module_name.clone(),
        module_json: config.project.module_json.as_deref().map(|p| anchor(base_dir, p)),
        namespace: config.project.namespace.clone(),
        package_dir: config.project.package_dir.clone(),
        package_strategy: config.project.package_strategy,
        package_name: config.project.package_name.clone(),
        package_version: config.project.package_version.clone(),
        modules,
        cache_dir,
        output_dir,
        backend,
        compile_mode: config.build.compile_mode,
        stage_sources: config.build.stage_sources,
        incremental: config.build.incremental,
        emit_typescript: config.build.emit_typescript,
        max_workers: config.build.max_workers,
        partition: config.build.partition,
        compiler_path: anchor(base_dir, &compiler.path),
        compiler_version: compiler.version.clone(),
        merge_tool: compiler.merge_tool.as_deref().map(|p| anchor(base_dir, p)),
        target_sdk: compiler.target_sdk.clone(),
        compatible_sdk: compiler.compatible_sdk.clone(),
        runtime_os: compiler.runtime_os.clone(),
        aot_mode: compiler.aot_mode.clone(),
        aot_profile: compiler.aot_profile.as_deref().map(|p| anchor(base_dir, p)),
        mode,
        changed_files: reload.changed_files.as_deref().map(|p| anchor(base_dir, p)),
        symbol_map,
        old_symbol_map: reload.old_symbol_map.as_deref().map(|p| anchor(base_dir, p)),
        patch_dir,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_config_from_str;

    fn parse(extra: &str) -> ProjectConfig {
        let toml = format!(
            "[project]\nroot = \".\"\n[compiler]\npath = \"sdk/es2abc\"\n{extra}"
        );
        load_config_from_str(&toml).unwrap()
    }

    #[test]
    fn anchors_relative_paths() {
        let config = parse("[modules]\nentry = \"entry\"\n");
        let r = resolve_config(&config, Path::new("/work"), ModeFlags::default()).unwrap();
        assert_eq!(r.project_root, PathBuf::from("/work"));
        assert_eq!(r.cache_dir, PathBuf::from("/work/build/cache"));
        assert_eq!(r.output_dir, PathBuf::from("/work/build/out"));
        assert_eq!(r.compiler_path, PathBuf::from("/work/sdk/es2abc"));
        assert_eq!(r.modules["entry"], PathBuf::from("/work/entry"));
        assert_eq!(r.symbol_map, PathBuf::from("/work/build/cache/symbolMap.map"));
        assert_eq!(r.patch_dir, PathBuf::from("/work/build/cache/patch"));
        assert_eq!(r.mode, BuildMode::FullBuild);
        assert_eq!(r.backend, Backend::Modern);
    }

    #[test]
    fn folds_dot_components() {
        assert_eq!(
            anchor(Path::new("/work/app"), Path::new("../sdk/./bin")),
            PathBuf::from("/work/sdk/bin")
        );
    }

    #[test]
    fn preview_uses_preview_output() {
        let config = parse("");
        let flags = ModeFlags {
            preview: true,
            ..Default::default()
        };
        let r = resolve_config(&config, Path::new("/w"), flags).unwrap();
        assert_eq!(r.mode, BuildMode::Preview);
        assert_eq!(r.output_dir, PathBuf::from("/w/build/preview"));
    }

    #[test]
    fn reload_with_legacy_backend_rejected() {
        let config = parse(
            "merge_tool = \"m\"\n[build]\nbackend = \"legacy\"\n[mode]\nhot_reload = true\n",
        );
        let err = resolve_config(&config, Path::new("/w"), ModeFlags::default()).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(ref m) if m.contains("modern")));
    }

    #[test]
    fn hot_fix_requires_old_symbol_map() {
        let config = parse("");
        let flags = ModeFlags {
            hot_fix: true,
            ..Default::default()
        };
        let err = resolve_config(&config, Path::new("/w"), flags).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(ref f) if f == "reload.old_symbol_map"));
    }

    #[test]
    fn legacy_module_path_requires_merge_tool() {
        let config = parse("[build]\nbackend = \"legacy\"\n");
        let err = resolve_config(&config, Path::new("/w"), ModeFlags::default()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(ref f) if f == "compiler.merge_tool"));
    }

    #[test]
    fn cli_override_conflicts_with_config_mode() {
        let config = parse("[mode]\ncold_reload = true\n");
        let flags = ModeFlags {
            hot_reload: true,
            ..Default::default()
        };
        let err = resolve_config(&config, Path::new("/w"), flags).unwrap_err();
        assert!(matches!(err, ConfigError::ConflictingModes(_)));
    }
}
