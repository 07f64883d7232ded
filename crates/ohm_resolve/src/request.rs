//! Import requests that never go through path resolution.
//!
//! System modules (`@ohos.router`) and native libraries (`libfoo.so`) are
//! rewritten straight to runtime URLs; resolved paths are prefixed with the
//! registry they live in.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::layout::ProjectLayout;

/// Replacement for the dependency-package directory name in module URLs.
pub const PACKAGE_TOKEN: &str = "pkg_modules";

/// System modules implemented natively by the runtime.
const NATIVE_MODULES: &[&str] = &[
    "system.app",
    "ohos.app",
    "system.router",
    "system.curves",
    "ohos.curves",
    "system.matrix4",
    "ohos.matrix4",
];

static SYSTEM_MODULE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^@(ohos|system|arkts)\.(\S+)$")
        .unwrap_or_else(|e| panic!("BUG: Invalid system module regex pattern: {}", e))
});

static NATIVE_LIBRARY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^lib(\S+)\.so$")
        .unwrap_or_else(|e| panic!("BUG: Invalid native library regex pattern: {}", e))
});

/// Rewrites a system-module or native-library request to its runtime URL.
///
/// Returns `None` for ordinary requests, which resolve by path instead.
pub fn resolve_request(request: &str, layout: &ProjectLayout) -> Option<String> {
    if let Some(caps) = SYSTEM_MODULE.captures(request) {
        let prefix = caps.get(1)?.as_str();
        let name = caps.get(2)?.as_str();
        let qualified = format!("{prefix}.{name}");
        return Some(if NATIVE_MODULES.contains(&qualified.as_str()) {
            format!("@native:{qualified}")
        } else if prefix == "arkts" {
            format!("@ohos:arkts.{name}")
        } else {
            format!("@ohos:{name}")
        });
    }
    NATIVE_LIBRARY.captures(request).and_then(|caps| {
        let lib = caps.get(1)?.as_str();
        Some(format!(
            "@app:{}/{}/{lib}",
            layout.bundle_name, layout.module_name
        ))
    })
}

/// Prefixes a resolved module URL for use as an import target.
pub fn rewrite_import(url: &str) -> String {
    if url.starts_with(PACKAGE_TOKEN) {
        format!("@package:{url}")
    } else {
        format!("@bundle:{url}")
    }
}
