//! One invocation of the build pipeline, per build mode.

use ohm_assemble::{
    cleanup, copy_artifacts, merge_fragments, SourceMapStore, SOURCE_MAP_CACHE, SOURCE_MAP_FILE,
};
use ohm_cache::{global_fingerprint, Ledger, Partition};
use ohm_config::{Backend, BuildMode, CompileMode, ConfigError};
use ohm_dispatch::{compile, CompileRequest, SymbolFlags, MODULES_IMAGE};
use ohm_inventory::{stage_sources, FileEntry, FileList, Inventory, ModuleRecord};
use std::path::PathBuf;

use crate::changed::{read_changed_files, ChangeSet, ReloadSkip};
use crate::context::PipelineContext;
use crate::error::DriverError;
use crate::session::SessionState;

/// What an invocation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    /// The mode that ran.
    pub mode: BuildMode,
    /// Modules handed to the compiler.
    pub compiled: usize,
    /// Modules whose previous artifacts were reused.
    pub reused: usize,
    /// Directory holding the image and source map written.
    pub output_dir: PathBuf,
    /// Set when a reload build was skipped.
    pub skipped: Option<ReloadSkip>,
}

impl BuildReport {
    fn skipped(mode: BuildMode, output_dir: PathBuf, reason: ReloadSkip) -> Self {
        Self {
            mode,
            compiled: 0,
            reused: 0,
            output_dir,
            skipped: Some(reason),
        }
    }
}

/// Runs the mode selected in `ctx` over `list`.
///
/// The reload modes consult and update `session`; the other modes leave it
/// untouched apart from the build counter.
pub fn run(
    ctx: &mut PipelineContext,
    session: &mut SessionState,
    list: &FileList,
) -> Result<BuildReport, DriverError> {
    let mode = ctx.config.mode;
    let incremental = ctx.config.incremental;
    tracing::info!(%mode, files = list.files.len(), "build started");
    let report = match mode {
        BuildMode::FullBuild | BuildMode::Preview => {
            build_image(ctx, list, SymbolFlags::None, incremental)?
        }
        BuildMode::HotReload | BuildMode::ColdReload if session.is_first_build() => {
            let symbol_map = ctx.config.symbol_map.clone();
            let report = build_image(ctx, list, SymbolFlags::Dump(symbol_map.clone()), false)?;
            session.record_first_build(symbol_map);
            report
        }
        BuildMode::HotReload | BuildMode::ColdReload => reload_patch(ctx, session, list)?,
        BuildMode::HotFix => hot_fix(ctx, list)?,
    };
    session.record_build();
    tracing::info!(
        %mode,
        compiled = report.compiled,
        reused = report.reused,
        "build finished"
    );
    Ok(report)
}

fn inventory(ctx: &PipelineContext, list: &FileList) -> Result<Inventory, DriverError> {
    let inventory = Inventory::build(list, &ctx.config, &ctx.resolver, &ctx.sink);
    if ctx.config.stage_sources {
        stage_sources(inventory.modules())?;
    }
    Ok(inventory)
}

/// The full-build machinery: ledger filter, compile, assemble, commit.
fn build_image(
    ctx: &mut PipelineContext,
    list: &FileList,
    symbols: SymbolFlags,
    use_ledger: bool,
) -> Result<BuildReport, DriverError> {
    let inventory = inventory(ctx, list)?;
    let records = inventory.to_records();
    let config = &ctx.config;

    let mut ledger = if use_ledger {
        let ledger = Ledger::load(
            &config.cache_dir,
            &global_fingerprint(config, &ctx.package.bundle_name),
        );
        ledger.begin()?;
        Some(ledger)
    } else {
        None
    };
    let mut split = match ledger.as_mut() {
        Some(ledger) => ledger.filter_reusable(records.clone())?,
        None => Partition::all_stale(records.clone()),
    };

    let per_module = config.compile_mode == CompileMode::Module;
    if per_module
        && split.must_compile.is_empty()
        && !split.reusable.is_empty()
        && !config.output_dir.join(MODULES_IMAGE).exists()
    {
        tracing::info!("output image is missing, recompiling everything");
        split = Partition::all_stale(records.clone());
    }
    // The merged image holds every module the ledger tracked, so it is current
    // only if all of them were carried forward.
    let image_current = !per_module || ledger.as_ref().is_some_and(Ledger::carries_forward_all);

    let mut manifests = Vec::new();
    if split.must_compile.is_empty() && image_current {
        tracing::info!(reused = split.reusable.len(), "nothing to compile");
    } else {
        manifests = compile(&CompileRequest {
            config,
            must_compile: &split.must_compile,
            reusable: &split.reusable,
            package_entries: inventory.package_entries(),
            symbols,
            image_dir: &config.output_dir,
            scratch_dir: &config.cache_dir,
            pool: ctx.pool.as_ref(),
        })?;
        if config.backend == Backend::Legacy && per_module {
            manifests.extend(merge_fragments(
                config,
                &records,
                inventory.package_entries(),
                &config.output_dir,
                &config.cache_dir,
            )?);
        }
    }
    if !per_module {
        copy_artifacts(&records, &config.output_dir)?;
    }

    let mut source_maps = if use_ledger {
        SourceMapStore::load_cached(&config.cache_dir)
    } else {
        SourceMapStore::new()
    };
    source_maps.update(&records, &split.must_compile, &ctx.package_stamp())?;
    source_maps.write(&config.output_dir.join(SOURCE_MAP_FILE))?;
    source_maps.write(&config.cache_dir.join(SOURCE_MAP_CACHE))?;

    if let Some(ledger) = ledger.as_mut() {
        ledger.commit(&split.must_compile)?;
    }

    let retain = use_ledger || config.mode == BuildMode::Preview || config.mode.is_reload();
    cleanup(&manifests, &records, retain)?;

    let report = BuildReport {
        mode: config.mode,
        compiled: split.must_compile.len(),
        reused: split.reusable.len(),
        output_dir: config.output_dir.clone(),
        skipped: None,
    };
    ctx.source_maps = source_maps;
    Ok(report)
}

/// A later reload build: only the changed files, patched against the
/// session's symbol table.
fn reload_patch(
    ctx: &mut PipelineContext,
    session: &SessionState,
    list: &FileList,
) -> Result<BuildReport, DriverError> {
    let config = &ctx.config;
    let changed = read_changed_files(
        config.changed_files.as_deref(),
        &config.source_root,
        &config.project_root,
    )?;
    let files = match changed {
        ChangeSet::Files(files) => files,
        ChangeSet::Skip(reason) => {
            tracing::info!(%reason, "reload skipped");
            return Ok(BuildReport::skipped(config.mode, config.patch_dir.clone(), reason));
        }
    };

    // Changed files keep the metadata the host listed them with.
    let subset = FileList {
        files: files
            .iter()
            .map(|path| {
                list.files
                    .iter()
                    .find(|entry| &entry.path == path)
                    .cloned()
                    .unwrap_or_else(|| FileEntry::plain(path))
            })
            .collect(),
    };
    let input = session
        .symbol_map()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| config.symbol_map.clone());
    let symbols = SymbolFlags::Reload {
        input,
        cold: config.mode == BuildMode::ColdReload,
    };
    let inventory = inventory(ctx, &subset)?;
    patch_pass(ctx, &inventory, symbols, true)
}

/// A hot fix: the full inventory patched against the shipped symbol table.
fn hot_fix(ctx: &mut PipelineContext, list: &FileList) -> Result<BuildReport, DriverError> {
    let input = ctx
        .config
        .old_symbol_map
        .clone()
        .ok_or_else(|| ConfigError::MissingField("reload.old_symbol_map".to_string()))?;
    let inventory = inventory(ctx, list)?;
    patch_pass(ctx, &inventory, SymbolFlags::HotFix { input }, false)
}

/// Compiles `inventory` into the patch directory. Never touches the ledger.
///
/// Reload patches hand the fragments retained from earlier builds to the
/// compiler as a cache; hot fixes always compile from source.
fn patch_pass(
    ctx: &mut PipelineContext,
    inventory: &Inventory,
    symbols: SymbolFlags,
    retain_fragments: bool,
) -> Result<BuildReport, DriverError> {
    let config = &ctx.config;
    let records: Vec<ModuleRecord> = inventory.to_records();
    let cached: Vec<ModuleRecord> = if matches!(symbols, SymbolFlags::Reload { .. }) {
        records
            .iter()
            .filter(|r| r.artifact_path.exists())
            .cloned()
            .collect()
    } else {
        Vec::new()
    };
    let manifests = compile(&CompileRequest {
        config,
        must_compile: &records,
        reusable: &cached,
        package_entries: inventory.package_entries(),
        symbols,
        image_dir: &config.patch_dir,
        scratch_dir: &config.cache_dir,
        pool: ctx.pool.as_ref(),
    })?;

    let mut source_maps = SourceMapStore::new();
    source_maps.update(&records, &records, &ctx.package_stamp())?;
    source_maps.write(&config.patch_dir.join(SOURCE_MAP_FILE))?;
    cleanup(&manifests, &records, retain_fragments)?;

    let report = BuildReport {
        mode: config.mode,
        compiled: records.len(),
        reused: 0,
        output_dir: config.patch_dir.clone(),
        skipped: None,
    };
    ctx.source_maps = source_maps;
    Ok(report)
}
