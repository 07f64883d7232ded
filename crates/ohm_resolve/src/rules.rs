//! The ordered rules that map a normalized path to a module URL.
//!
//! Each rule produces a URL, declines, or fails the resolution outright. The
//! resolver tries them in order, so a rule may assume every earlier rule
//! declined.

use once_cell::sync::Lazy;
use ohm_common::{relative_unix, strip_extension};
use ohm_config::PackageStrategy;
use regex::Regex;

use crate::error::ResolveError;
use crate::layout::ProjectLayout;
use crate::request::PACKAGE_TOKEN;

/// `<prefix>/src/(main|ohosTest)/(ets|js|mock)/<rest>`.
static CANONICAL_SOURCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\S+)/src/(?:main|ohosTest)/(ets|js|mock)/(\S+)")
        .unwrap_or_else(|e| panic!("BUG: Invalid canonical source regex pattern: {}", e))
});

/// A canonical source directory appearing inside a prefix.
static NESTED_SOURCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"src/(?:main|ohosTest)/(ets|js)/")
        .unwrap_or_else(|e| panic!("BUG: Invalid nested source regex pattern: {}", e))
});

/// A path prepared for rule matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedPath {
    original: String,
    unix: String,
}

impl NormalizedPath {
    /// Normalizes a file path: drops a leading virtual-module marker (`\0`),
    /// converts separators and strips the extension.
    pub fn file(path: &str) -> Self {
        let unix = Self::directory(path).unix;
        Self {
            original: path.to_string(),
            unix: strip_extension(&unix).to_string(),
        }
    }

    /// Normalizes a directory path; no extension is stripped.
    pub fn directory(path: &str) -> Self {
        let unix = path.strip_prefix('\0').unwrap_or(path).replace('\\', "/");
        Self {
            original: path.to_string(),
            unix,
        }
    }

    /// The path exactly as it was passed in.
    pub fn original(&self) -> &str {
        &self.original
    }

    /// The normalized forward-slash path.
    pub fn as_str(&self) -> &str {
        &self.unix
    }

    /// The path with the project root removed, keeping the leading `/`.
    /// Paths outside the project are returned whole.
    fn project_relative(&self, layout: &ProjectLayout) -> String {
        match relative_unix(&self.unix, &layout.project_root) {
            Some(rel) => format!("/{rel}"),
            None => self.unix.clone(),
        }
    }
}

/// Inputs shared by every rule for one resolution.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    /// The project layout.
    pub layout: &'a ProjectLayout,
    /// Namespace for the `module@namespace` URL segment.
    pub namespace: Option<&'a str>,
}

/// One step of the resolution cascade.
pub trait UrlRule: Send + Sync {
    /// Short name used in trace output.
    fn name(&self) -> &'static str;

    /// Returns the URL for `path`, `Ok(None)` to let the next rule try, or
    /// an error that ends the cascade.
    fn apply(&self, path: &NormalizedPath, cx: &RuleContext<'_>)
        -> Result<Option<String>, ResolveError>;
}

fn has_segment(path: &str, segment: &str) -> bool {
    path.split('/').any(|s| s == segment)
}

/// Files under a canonical source directory of the module being built.
pub struct CanonicalSourceRule;

impl UrlRule for CanonicalSourceRule {
    fn name(&self) -> &'static str {
        "canonical-source"
    }

    fn apply(
        &self,
        path: &NormalizedPath,
        cx: &RuleContext<'_>,
    ) -> Result<Option<String>, ResolveError> {
        Ok(Self::matched(path, cx))
    }
}

impl CanonicalSourceRule {
    fn matched(path: &NormalizedPath, cx: &RuleContext<'_>) -> Option<String> {
        let layout = cx.layout;
        let project_path = path.project_relative(layout);
        let caps = CANONICAL_SOURCE.captures(&project_path)?;
        let prefix = caps.get(1)?;
        if has_segment(prefix.as_str(), &layout.package_dir) {
            return None;
        }

        let (lang, rest) = match NESTED_SOURCE.captures(prefix.as_str()) {
            Some(inner) => {
                let whole = inner.get(0)?;
                let lang = inner.get(1)?.as_str();
                (lang, &project_path[prefix.start() + whole.end()..])
            }
            None => (caps.get(2)?.as_str(), caps.get(3)?.as_str()),
        };

        let module = layout.module_segment(&layout.module_name, cx.namespace);
        Some(format!("{}/{module}/{lang}/{rest}", layout.bundle_name))
    }
}

/// Files inside a dependency-package directory.
pub struct PackageDirRule;

impl PackageDirRule {
    fn project_first(path: &str, layout: &ProjectLayout) -> Option<String> {
        let dir = &layout.package_dir;
        let project_pkg = format!("{}/{dir}", layout.project_root);
        if let Some(rel) = relative_unix(path, &project_pkg) {
            return Some(format!("{dir}/{rel}"));
        }
        layout.modules.iter().find_map(|(name, root)| {
            relative_unix(path, &format!("{root}/{dir}")).map(|rel| format!("{dir}@{name}/{rel}"))
        })
    }

    fn level_suffix(path: &str, layout: &ProjectLayout) -> Option<String> {
        let dir = &layout.package_dir;
        let project_pkg = format!("{}/{dir}", layout.project_root);
        if let Some(rel) = relative_unix(path, &project_pkg) {
            return Some(format!("{dir}/1/{rel}"));
        }
        let module_root = layout.current_module_root()?;
        relative_unix(path, &format!("{module_root}/{dir}")).map(|rel| format!("{dir}/0/{rel}"))
    }
}

impl UrlRule for PackageDirRule {
    fn name(&self) -> &'static str {
        "package-dir"
    }

    fn apply(
        &self,
        path: &NormalizedPath,
        cx: &RuleContext<'_>,
    ) -> Result<Option<String>, ResolveError> {
        let layout = cx.layout;
        if !has_segment(&path.project_relative(layout), &layout.package_dir) {
            return Ok(None);
        }
        match layout.package_strategy {
            PackageStrategy::ProjectFirst => match Self::project_first(path.as_str(), layout) {
                Some(url) => Ok(Some(url.replace(layout.package_dir.as_str(), PACKAGE_TOKEN))),
                // A package file outside every package root has no identity.
                None => Err(ResolveError::Unresolved {
                    path: path.original().to_string(),
                }),
            },
            PackageStrategy::LevelSuffix => match Self::level_suffix(path.as_str(), layout) {
                Some(url) => Ok(Some(url.replace(layout.package_dir.as_str(), PACKAGE_TOKEN))),
                None => {
                    tracing::debug!(
                        path = path.as_str(),
                        "package directory outside the project and current module roots"
                    );
                    Ok(None)
                }
            },
        }
    }
}

/// Any file under a declared module root.
///
/// The URL always names the module being built, whichever declared root
/// contains the file.
pub struct ModuleRootRule;

impl UrlRule for ModuleRootRule {
    fn name(&self) -> &'static str {
        "module-root"
    }

    fn apply(
        &self,
        path: &NormalizedPath,
        cx: &RuleContext<'_>,
    ) -> Result<Option<String>, ResolveError> {
        let layout = cx.layout;
        let module = layout.module_segment(&layout.module_name, cx.namespace);
        Ok(layout
            .modules
            .values()
            .find_map(|root| relative_unix(path.as_str(), root))
            .map(|rel| format!("{}/{module}/{rel}", layout.bundle_name)))
    }
}
