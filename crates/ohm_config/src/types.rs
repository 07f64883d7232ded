//! Configuration types deserialized from `ohm.toml`.
//!
//! Paths are kept exactly as written; [`resolve_config`](crate::resolve_config)
//! anchors relative paths at the configuration file's directory.

use indexmap::IndexMap;
use serde::Deserialize;
use std::path::PathBuf;

use crate::mode::ModeFlags;

/// The top-level project configuration parsed from `ohm.toml`.
#[derive(Debug, Deserialize)]
pub struct ProjectConfig {
    /// Project identity and layout.
    pub project: ProjectSection,
    /// Module name to module root, in declaration order.
    #[serde(default)]
    pub modules: IndexMap<String, PathBuf>,
    /// Cache, output and distribution settings.
    #[serde(default)]
    pub build: BuildSection,
    /// External tool locations and fingerprinted compiler settings.
    pub compiler: CompilerSection,
    /// Build mode flags supplied by the host.
    #[serde(default)]
    pub mode: ModeFlags,
    /// Inputs and outputs of the patch modes.
    #[serde(default)]
    pub reload: ReloadSection,
}

/// Project identity and source layout.
#[derive(Debug, Deserialize)]
pub struct ProjectSection {
    /// Project root directory. Cache paths are laid out relative to it.
    pub root: PathBuf,
    /// Bundle name; read from `module_json` when absent.
    #[serde(default)]
    pub bundle_name: Option<String>,
    /// Name of the module being built; read from `module_json` when absent.
    #[serde(default)]
    pub module_name: Option<String>,
    /// Metadata file carrying `app.bundleName` and `module.name`.
    #[serde(default)]
    pub module_json: Option<PathBuf>,
    /// Namespace appended to module URLs as `module@namespace`.
    #[serde(default)]
    pub namespace: Option<String>,
    /// Source root of the module; relative changed-file entries are anchored here.
    #[serde(default)]
    pub source_root: Option<PathBuf>,
    /// Name of the dependency-package directory.
    #[serde(default = "default_package_dir")]
    pub package_dir: String,
    /// How dependency-package URLs are anchored.
    #[serde(default)]
    pub package_strategy: PackageStrategy,
    /// Name of the project's own package, recorded in source maps.
    #[serde(default)]
    pub package_name: Option<String>,
    /// Version of the project's own package, recorded in source maps.
    #[serde(default)]
    pub package_version: Option<String>,
}

fn default_package_dir() -> String {
    "oh_modules".to_string()
}

/// How URLs of files inside dependency-package directories are anchored.
#[derive(Debug, Default, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum PackageStrategy {
    /// Search the project root's package directory, then every module root's.
    #[default]
    ProjectFirst,
    /// Distinguish project-level and module-level package directories by suffix.
    LevelSuffix,
}

/// Compilation granularity.
#[derive(Debug, Default, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CompileMode {
    /// Every file compiles to its own artifact ("whole-file" path).
    Bundle,
    /// Files compile to fragments merged into one image ("per-module" path).
    #[default]
    Module,
}

/// How must-compile modules are split into worker batches.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum PartitionPolicy {
    /// Greedy longest-processing-time bin packing by file size.
    SizeBalanced,
    /// Item `i` goes to batch `i % n`.
    RoundRobin,
}

/// Partition policy per compilation path.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PartitionSection {
    /// Policy for the whole-file (bundle) path.
    #[serde(default = "default_whole_file_policy")]
    pub whole_file: PartitionPolicy,
    /// Policy for the per-module path.
    #[serde(default = "default_per_module_policy")]
    pub per_module: PartitionPolicy,
}

fn default_whole_file_policy() -> PartitionPolicy {
    PartitionPolicy::SizeBalanced
}

fn default_per_module_policy() -> PartitionPolicy {
    PartitionPolicy::RoundRobin
}

impl Default for PartitionSection {
    fn default() -> Self {
        Self {
            whole_file: default_whole_file_policy(),
            per_module: default_per_module_policy(),
        }
    }
}

/// Cache, output and work-distribution settings.
#[derive(Debug, Deserialize)]
pub struct BuildSection {
    /// Directory holding the ledger and temporary per-file fragments.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    /// Directory receiving the final images and source maps.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Directory receiving preview builds.
    #[serde(default = "default_preview_dir")]
    pub preview_output_dir: PathBuf,
    /// Compiler backend: `modern` or `legacy`.
    #[serde(default = "default_backend")]
    pub backend: String,
    /// Compilation granularity.
    #[serde(default)]
    pub compile_mode: CompileMode,
    /// Copy sources into the cache when no upstream transform has.
    #[serde(default = "default_true")]
    pub stage_sources: bool,
    /// Keep a ledger and skip unchanged files.
    #[serde(default = "default_true")]
    pub incremental: bool,
    /// Let the compiler consume typed sources directly.
    #[serde(default)]
    pub emit_typescript: bool,
    /// Upper bound on worker processes for the legacy backend.
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
    /// Partition policy per compilation path.
    #[serde(default)]
    pub partition: PartitionSection,
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("build/cache")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("build/out")
}

fn default_preview_dir() -> PathBuf {
    PathBuf::from("build/preview")
}

fn default_backend() -> String {
    "modern".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_workers() -> usize {
    3
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            output_dir: default_output_dir(),
            preview_output_dir: default_preview_dir(),
            backend: default_backend(),
            compile_mode: CompileMode::default(),
            stage_sources: true,
            incremental: true,
            emit_typescript: false,
            max_workers: default_max_workers(),
            partition: PartitionSection::default(),
        }
    }
}

/// External tools and the compiler settings folded into the global fingerprint.
#[derive(Debug, Deserialize)]
pub struct CompilerSection {
    /// Path to the bytecode compiler.
    pub path: PathBuf,
    /// Compiler version string.
    #[serde(default)]
    pub version: Option<String>,
    /// Path to the merge tool (legacy per-module path only).
    #[serde(default)]
    pub merge_tool: Option<PathBuf>,
    /// Target SDK version.
    #[serde(default)]
    pub target_sdk: Option<String>,
    /// Minimum compatible SDK version.
    #[serde(default)]
    pub compatible_sdk: Option<String>,
    /// Runtime operating system.
    #[serde(default)]
    pub runtime_os: Option<String>,
    /// Ahead-of-time compilation mode.
    #[serde(default)]
    pub aot_mode: Option<String>,
    /// Ahead-of-time profile path.
    #[serde(default)]
    pub aot_profile: Option<PathBuf>,
}

/// Inputs and outputs of the hot reload, cold reload and hot fix modes.
#[derive(Debug, Default, Deserialize)]
pub struct ReloadSection {
    /// Changed-files document written by the host before each patch build.
    #[serde(default)]
    pub changed_files: Option<PathBuf>,
    /// Symbol table dumped by the first build of a session.
    #[serde(default)]
    pub symbol_map: Option<PathBuf>,
    /// Symbol table of the shipped image a hot fix patches.
    #[serde(default)]
    pub old_symbol_map: Option<PathBuf>,
    /// Directory receiving patch images.
    #[serde(default)]
    pub patch_dir: Option<PathBuf>,
}
