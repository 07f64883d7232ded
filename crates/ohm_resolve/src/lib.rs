//! Module URL resolution.
//!
//! Every compiled file is identified at runtime by a module URL such as
//! `com.example.app/entry/ets/pages/Index`. The URL is both the target that
//! import specifiers are rewritten to and the key of the runtime module
//! registry, so it must be a pure function of the file path and the project
//! layout.
//!
//! [`ModuleUrlResolver`] runs an ordered cascade of [`UrlRule`] matchers over
//! a [`NormalizedPath`]; the first rule that produces a URL wins. System
//! modules and native libraries are handled first by [`resolve_request`].

#![warn(missing_docs)]

pub mod error;
pub mod layout;
pub mod package_info;
pub mod request;
pub mod resolver;
pub mod rules;

pub use error::ResolveError;
pub use layout::ProjectLayout;
pub use package_info::{PackageInfo, PackageInfoMemo};
pub use request::{resolve_request, rewrite_import, PACKAGE_TOKEN};
pub use resolver::ModuleUrlResolver;
pub use rules::{
    CanonicalSourceRule, ModuleRootRule, NormalizedPath, PackageDirRule, RuleContext, UrlRule,
};
