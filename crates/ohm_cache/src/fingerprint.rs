//! The coarse configuration fingerprint.
//!
//! Any setting that can silently change the bytecode produced from the same
//! sources is folded into one string. When the string differs from the one
//! stored in the ledger, every per-file entry is discarded.

use ohm_common::{to_unix_path, ContentHash};
use ohm_config::{CompileMode, ResolvedConfig};

const ABSENT: &str = "-";

/// Computes the global fingerprint for one invocation.
///
/// `bundle_name` is passed separately because it may come from the package
/// metadata file rather than the configuration.
pub fn global_fingerprint(config: &ResolvedConfig, bundle_name: &str) -> String {
    let opt = |v: &Option<String>| v.clone().unwrap_or_else(|| ABSENT.to_string());

    let mut fields = vec![
        opt(&config.target_sdk),
        opt(&config.compatible_sdk),
        opt(&config.runtime_os),
        to_unix_path(&config.compiler_path),
        opt(&config.compiler_version),
    ];

    if config.compile_mode == CompileMode::Module {
        let mut names: Vec<&str> = config.modules.keys().map(String::as_str).collect();
        names.sort_unstable();
        fields.push(if bundle_name.is_empty() {
            ABSENT.to_string()
        } else {
            bundle_name.to_string()
        });
        fields.push(ContentHash::from_parts(names).to_string());
        fields.push(opt(&config.aot_mode));
        fields.push(
            config
                .aot_profile
                .as_deref()
                .map(to_unix_path)
                .unwrap_or_else(|| ABSENT.to_string()),
        );
    }

    fields.join("|")
}
