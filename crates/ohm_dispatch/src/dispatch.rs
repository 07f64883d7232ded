//! Choosing and running a distribution strategy.

use ohm_config::{Backend, ResolvedConfig};
use ohm_inventory::{ModuleRecord, PackageEntryRecord};
use std::path::{Path, PathBuf};

use crate::command::{thread_hint, ModernCommand, SymbolFlags};
use crate::error::DispatchError;
use crate::manifest::{render_entries, render_files_info, render_reuse_list, write_manifest};
use crate::partition::partition;
use crate::pool::WorkerPool;
use crate::runner::run_tool;
use crate::worker::{CompilePath, FileJob, WorkerBatch};

/// File name of the merged bytecode image.
pub const MODULES_IMAGE: &str = "modules.abc";

const FILES_INFO: &str = "filesInfo.txt";
const ENTRIES: &str = "npmEntries.txt";
const REUSE_LIST: &str = "cacheFiles.txt";

/// Inputs of one compilation pass.
pub struct CompileRequest<'a> {
    /// Resolved configuration.
    pub config: &'a ResolvedConfig,
    /// Modules to compile.
    pub must_compile: &'a [ModuleRecord],
    /// Modules whose previous fragments go on the reuse list. Those not in
    /// `must_compile` are merged as-is; those also in it are a cache the
    /// compiler consults for unchanged sources.
    pub reusable: &'a [ModuleRecord],
    /// Dependency package entry points.
    pub package_entries: &'a [PackageEntryRecord],
    /// Patch-mode flags.
    pub symbols: SymbolFlags,
    /// Directory receiving the merged image on the modern per-module path.
    pub image_dir: &'a Path,
    /// Directory for manifests and oversized worker batches.
    pub scratch_dir: &'a Path,
    /// Worker pool for the legacy backend.
    pub pool: Option<&'a WorkerPool>,
}

/// Compiles `must_compile` and returns the manifests written on the way,
/// for the caller to delete once the outputs are assembled.
pub fn compile(req: &CompileRequest<'_>) -> Result<Vec<PathBuf>, DispatchError> {
    let path = CompilePath::from(req.config.compile_mode);
    match req.config.backend {
        Backend::Modern => compile_modern(req, path),
        Backend::Legacy => compile_legacy(req, path),
    }
}

/// Arguments every compiler call starts with.
pub fn base_args(config: &ResolvedConfig) -> Vec<String> {
    match &config.target_sdk {
        Some(sdk) => vec!["--target-api-version".to_string(), sdk.clone()],
        None => Vec::new(),
    }
}

fn compile_modern(req: &CompileRequest<'_>, path: CompilePath) -> Result<Vec<PathBuf>, DispatchError> {
    let mut written = Vec::new();

    let files_info = req.scratch_dir.join(FILES_INFO);
    write_manifest(&files_info, &render_files_info(req.must_compile, path))?;
    written.push(files_info.clone());

    let entries = if req.package_entries.is_empty() {
        None
    } else {
        let p = req.scratch_dir.join(ENTRIES);
        write_manifest(&p, &render_entries(req.package_entries))?;
        written.push(p.clone());
        Some(p)
    };

    let per_module = path == CompilePath::PerModule;
    let reuse_list = if per_module && !req.reusable.is_empty() {
        let p = req.scratch_dir.join(REUSE_LIST);
        write_manifest(&p, &render_reuse_list(req.reusable))?;
        written.push(p.clone());
        Some(p)
    } else {
        None
    };

    let merged_output = per_module.then(|| req.image_dir.join(MODULES_IMAGE));
    if per_module {
        std::fs::create_dir_all(req.image_dir).map_err(|e| DispatchError::Io {
            path: req.image_dir.to_path_buf(),
            source: e,
        })?;
    }

    let base = base_args(req.config);
    let args = ModernCommand {
        program: &req.config.compiler_path,
        base_args: &base,
        files_info: &files_info,
        merged_output: merged_output.as_deref(),
        entries: entries.as_deref(),
        reuse_list: reuse_list.as_deref(),
        threads: thread_hint(),
        symbols: &req.symbols,
    }
    .build();

    tracing::info!(
        modules = req.must_compile.len(),
        reused = req.reusable.len(),
        "compiling with the modern backend"
    );
    run_tool(&args)?;
    Ok(written)
}

fn compile_legacy(req: &CompileRequest<'_>, path: CompilePath) -> Result<Vec<PathBuf>, DispatchError> {
    let config = req.config;
    let policy = match path {
        CompilePath::WholeFile => config.partition.whole_file,
        CompilePath::PerModule => config.partition.per_module,
    };
    let groups = partition(
        req.must_compile.iter().collect(),
        config.max_workers,
        policy,
        |r: &&ModuleRecord| std::fs::metadata(&r.cache_path).map(|m| m.len()).unwrap_or(0),
    );

    let base = base_args(config);
    let mut written = Vec::new();
    let mut batches = Vec::with_capacity(groups.len());
    for (index, group) in groups.into_iter().enumerate() {
        let mut batch = WorkerBatch {
            index,
            program: config.compiler_path.clone(),
            base_args: base.clone(),
            compile_path: path,
            jobs: Vec::new(),
            manifest: None,
        };
        match path {
            CompilePath::WholeFile => {
                batch.jobs = group
                    .iter()
                    .map(|r| FileJob {
                        cache_path: r.cache_path.clone(),
                        artifact_path: r.artifact_path.clone(),
                    })
                    .collect();
            }
            CompilePath::PerModule => {
                let manifest = req.scratch_dir.join(format!("filesInfo_{index}.txt"));
                write_manifest(&manifest, &render_files_info(group.iter().copied(), path))?;
                written.push(manifest.clone());
                batch.manifest = Some(manifest);
            }
        }
        batches.push(batch);
    }

    if batches.is_empty() {
        return Ok(written);
    }
    tracing::info!(
        modules = req.must_compile.len(),
        workers = batches.len(),
        "compiling with the legacy backend"
    );
    let fallback;
    let pool = match req.pool {
        Some(pool) => pool,
        None => {
            fallback = WorkerPool::current()?;
            &fallback
        }
    };
    pool.run(&batches, req.scratch_dir)?;
    Ok(written)
}
