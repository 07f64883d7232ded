//! The project layout the resolution rules match against.

use indexmap::IndexMap;
use ohm_common::to_unix_path;
use ohm_config::{PackageStrategy, ResolvedConfig};

use crate::package_info::PackageInfo;

/// Project layout as forward-slash strings.
///
/// Built once per invocation; every rule reads it and none mutate it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    /// Bundle name prefixing every in-project URL.
    pub bundle_name: String,
    /// Name of the module being built.
    pub module_name: String,
    /// Project root without a trailing slash.
    pub project_root: String,
    /// Dependency-package directory name.
    pub package_dir: String,
    /// How dependency-package URLs are anchored.
    pub package_strategy: PackageStrategy,
    /// Module name to module root, in declaration order.
    pub modules: IndexMap<String, String>,
}

impl ProjectLayout {
    /// Builds the layout from resolved configuration and package names.
    pub fn from_config(config: &ResolvedConfig, info: &PackageInfo) -> Self {
        Self {
            bundle_name: info.bundle_name.clone(),
            module_name: info.module_name.clone(),
            project_root: trim_root(to_unix_path(&config.project_root)),
            package_dir: config.package_dir.clone(),
            package_strategy: config.package_strategy,
            modules: config
                .modules
                .iter()
                .map(|(name, root)| (name.clone(), trim_root(to_unix_path(root))))
                .collect(),
        }
    }

    /// Root of the module being built, if it is declared in `[modules]`.
    pub fn current_module_root(&self) -> Option<&str> {
        self.modules.get(&self.module_name).map(String::as_str)
    }

    /// `module` with `@namespace` appended when a distinct namespace is set.
    pub fn module_segment(&self, module: &str, namespace: Option<&str>) -> String {
        match namespace {
            Some(ns) if !ns.is_empty() && ns != module => format!("{module}@{ns}"),
            _ => module.to_string(),
        }
    }
}

fn trim_root(mut root: String) -> String {
    while root.len() > 1 && root.ends_with('/') {
        root.pop();
    }
    root
}
