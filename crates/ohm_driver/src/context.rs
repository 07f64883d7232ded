//! Per-invocation pipeline state.

use ohm_assemble::{PackageStamp, SourceMapStore};
use ohm_config::ResolvedConfig;
use ohm_diagnostics::{Diagnostic, DiagnosticSink, SignatureTable};
use ohm_dispatch::WorkerPool;
use ohm_resolve::{ModuleUrlResolver, PackageInfo, PackageInfoMemo, ProjectLayout};

use crate::error::DriverError;

/// Everything one invocation owns: the configuration, the resolver and its
/// package-info memo, the source-map accumulator and the diagnostics sink.
///
/// Nothing in here survives the invocation. State that must outlive it
/// belongs in [`SessionState`](crate::SessionState).
pub struct PipelineContext {
    pub(crate) config: ResolvedConfig,
    pub(crate) package: PackageInfo,
    pub(crate) resolver: ModuleUrlResolver,
    pub(crate) package_memo: PackageInfoMemo,
    pub(crate) source_maps: SourceMapStore,
    pub(crate) sink: DiagnosticSink,
    pub(crate) signatures: SignatureTable,
    pub(crate) pool: Option<WorkerPool>,
}

impl PipelineContext {
    /// Determines the package names and builds the resolver.
    ///
    /// Explicit bundle and module names win over the metadata file, which is
    /// read at most once.
    pub fn new(config: ResolvedConfig) -> Result<Self, DriverError> {
        let mut package_memo = PackageInfoMemo::new();
        let package = package_memo.resolve(
            config.bundle_name.as_deref(),
            config.module_name.as_deref(),
            config.module_json.as_deref(),
        )?;
        let resolver = ModuleUrlResolver::new(ProjectLayout::from_config(&config, &package));
        tracing::debug!(
            bundle = %package.bundle_name,
            module = %package.module_name,
            mode = %config.mode,
            "pipeline context ready"
        );
        Ok(Self {
            config,
            package,
            resolver,
            package_memo,
            source_maps: SourceMapStore::new(),
            sink: DiagnosticSink::new(),
            signatures: SignatureTable::builtin(),
            pool: None,
        })
    }

    /// Uses `pool` for legacy-backend workers instead of re-running the
    /// current executable.
    pub fn with_worker_pool(mut self, pool: WorkerPool) -> Self {
        self.pool = Some(pool);
        self
    }

    /// The resolved configuration.
    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    /// Bundle and module names of this invocation.
    pub fn package(&self) -> &PackageInfo {
        &self.package
    }

    /// The module URL resolver.
    pub fn resolver(&self) -> &ModuleUrlResolver {
        &self.resolver
    }

    /// Package-info memo shared by every lookup of this invocation.
    pub fn package_memo(&mut self) -> &mut PackageInfoMemo {
        &mut self.package_memo
    }

    /// Source maps consolidated so far.
    pub fn source_maps(&self) -> &SourceMapStore {
        &self.source_maps
    }

    /// Non-fatal diagnostics collected so far.
    pub fn sink(&self) -> &DiagnosticSink {
        &self.sink
    }

    /// Known compiler error signatures.
    pub fn signatures(&self) -> &SignatureTable {
        &self.signatures
    }

    /// The project's own package as stamped on source-map entries. Falls
    /// back to the module name when no package name is configured.
    pub fn package_stamp(&self) -> PackageStamp {
        PackageStamp {
            name: self
                .config
                .package_name
                .clone()
                .unwrap_or_else(|| self.package.module_name.clone()),
            version: self.config.package_version.clone(),
        }
    }

    /// Turns a fatal error into a diagnostic and logs it.
    pub fn diagnose(&self, err: &DriverError) -> Diagnostic {
        let diag = err.to_diagnostic(&self.signatures);
        tracing::error!(code = %diag.code, cause = diag.cause.as_deref().unwrap_or(""), "{}", diag.description);
        diag
    }
}
