//! The resolver that runs the rule cascade.

use crate::error::ResolveError;
use crate::layout::ProjectLayout;
use crate::request::{resolve_request, rewrite_import};
use crate::rules::{
    CanonicalSourceRule, ModuleRootRule, NormalizedPath, PackageDirRule, RuleContext, UrlRule,
};

/// Maps file paths to module URLs.
///
/// Resolution is a pure function of the path, the namespace and the layout:
/// the same inputs always give the same URL.
pub struct ModuleUrlResolver {
    layout: ProjectLayout,
    rules: Vec<Box<dyn UrlRule>>,
}

impl ModuleUrlResolver {
    /// Creates a resolver with the standard cascade: canonical source
    /// directories, then package directories, then module roots.
    pub fn new(layout: ProjectLayout) -> Self {
        Self::with_rules(
            layout,
            vec![
                Box::new(CanonicalSourceRule),
                Box::new(PackageDirRule),
                Box::new(ModuleRootRule),
            ],
        )
    }

    /// Creates a resolver with an explicit rule order.
    pub fn with_rules(layout: ProjectLayout, rules: Vec<Box<dyn UrlRule>>) -> Self {
        Self { layout, rules }
    }

    /// The layout this resolver matches against.
    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    /// Resolves a file path, failing when no rule matches.
    pub fn try_resolve(&self, path: &str, namespace: Option<&str>) -> Result<String, ResolveError> {
        self.run(NormalizedPath::file(path), namespace)
    }

    /// Resolves a file path, logging a diagnostic and returning the path
    /// unchanged when no rule matches.
    pub fn resolve(&self, path: &str, namespace: Option<&str>) -> String {
        self.try_resolve(path, namespace).unwrap_or_else(|err| {
            let diag = err.to_diagnostic();
            tracing::error!(code = %diag.code, path, "{}", diag.description);
            path.to_string()
        })
    }

    /// Resolves a package root directory. Unlike files, the final segment
    /// keeps any dots it has.
    pub fn resolve_package_root(&self, dir: &str) -> Result<String, ResolveError> {
        self.run(NormalizedPath::directory(dir), None)
    }

    /// Rewrites an import request: system modules and native libraries map
    /// directly, anything else is resolved as the file at `target`.
    pub fn resolve_import(&self, request: &str, target: &str, namespace: Option<&str>) -> String {
        if let Some(url) = resolve_request(request, &self.layout) {
            return url;
        }
        match self.try_resolve(target, namespace) {
            Ok(url) => rewrite_import(&url),
            Err(_) => request.to_string(),
        }
    }

    fn run(&self, path: NormalizedPath, namespace: Option<&str>) -> Result<String, ResolveError> {
        let cx = RuleContext {
            layout: &self.layout,
            namespace,
        };
        for rule in &self.rules {
            if let Some(url) = rule.apply(&path, &cx)? {
                tracing::trace!(rule = rule.name(), path = path.as_str(), %url, "resolved");
                return Ok(url);
            }
        }
        Err(ResolveError::Unresolved {
            path: path.original().to_string(),
        })
    }
}
