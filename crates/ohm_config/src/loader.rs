//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::resolve::Backend;
use crate::types::ProjectConfig;
use std::path::Path;

/// Name of the configuration file looked up in a project directory.
pub const CONFIG_FILE: &str = "ohm.toml";

/// Loads and validates an `ohm.toml` configuration from a project directory.
pub fn load_config(project_dir: &Path) -> Result<ProjectConfig, ConfigError> {
    load_config_from_path(&project_dir.join(CONFIG_FILE))
}

/// Loads and validates a configuration file at an explicit path.
pub fn load_config_from_path(config_path: &Path) -> Result<ProjectConfig, ConfigError> {
    tracing::debug!(path = %config_path.display(), "loading configuration");
    let content = std::fs::read_to_string(config_path)?;
    load_config_from_str(&content)
}

/// Parses and validates an `ohm.toml` configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<ProjectConfig, ConfigError> {
    let config: ProjectConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates that required fields are present and values are consistent.
fn validate_config(config: &ProjectConfig) -> Result<(), ConfigError> {
    if config.project.root.as_os_str().is_empty() {
        return Err(ConfigError::MissingField("project.root".to_string()));
    }
    if config.compiler.path.as_os_str().is_empty() {
        return Err(ConfigError::MissingField("compiler.path".to_string()));
    }
    let package_dir = &config.project.package_dir;
    if package_dir.is_empty() || package_dir.contains('/') || package_dir.contains('\\') {
        return Err(ConfigError::ValidationError(format!(
            "project.package_dir must be a single directory name, got '{package_dir}'"
        )));
    }
    if config.build.max_workers == 0 {
        return Err(ConfigError::ValidationError(
            "build.max_workers must be at least 1".to_string(),
        ));
    }
    config.build.backend.parse::<Backend>()?;
    for (name, root) in &config.modules {
        if name.is_empty() {
            return Err(ConfigError::ValidationError(
                "module names in [modules] must not be empty".to_string(),
            ));
        }
        if root.as_os_str().is_empty() {
            return Err(ConfigError::MissingField(format!("modules.{name}")));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CompileMode, PackageStrategy};

    const MINIMAL: &str = r#"
[project]
root = "/project"

[compiler]
path = "/sdk/bin/es2abc"
"#;

    #[test]
    fn parse_minimal_config() {
        let config = load_config_from_str(MINIMAL).unwrap();
        assert_eq!(config.project.root.to_str(), Some("/project"));
        assert_eq!(config.project.package_dir, "oh_modules");
        assert_eq!(config.project.package_strategy, PackageStrategy::ProjectFirst);
        assert!(config.modules.is_empty());
        assert_eq!(config.build.backend, "modern");
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
[project]
root = "/project"
bundle_name = "com.example.app"
module_name = "entry"
namespace = "shared"
source_root = "entry/src/main"
package_dir = "node_modules"
package_strategy = "level-suffix"
package_name = "entry"
package_version = "1.0.0"

[modules]
entry = "/project/entry"
feature = "/project/feature"

[build]
cache_dir = "out/cache"
backend = "legacy"
compile_mode = "bundle"
max_workers = 2

[build.partition]
whole_file = "round-robin"

[compiler]
path = "/sdk/bin/js2abc"
version = "4.1.0"
merge_tool = "/sdk/bin/merge_abc"
target_sdk = "12"
compatible_sdk = "10"
runtime_os = "HarmonyOS"

[mode]
preview = true

[reload]
patch_dir = "out/patch"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.project.bundle_name.as_deref(), Some("com.example.app"));
        assert_eq!(config.project.package_dir, "node_modules");
        assert_eq!(config.modules.len(), 2);
        assert_eq!(config.build.compile_mode, CompileMode::Bundle);
        assert_eq!(config.build.max_workers, 2);
        assert_eq!(
            config.build.partition.whole_file,
            crate::types::PartitionPolicy::RoundRobin
        );
        assert_eq!(
            config.build.partition.per_module,
            crate::types::PartitionPolicy::RoundRobin
        );
        assert_eq!(config.compiler.version.as_deref(), Some("4.1.0"));
        assert!(config.mode.preview);
        assert!(config.reload.patch_dir.is_some());
    }

    #[test]
    fn unknown_backend_errors() {
        let toml = format!("{MINIMAL}\n[build]\nbackend = \"turbo\"\n");
        let err = load_config_from_str(&toml).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownBackend(ref b) if b == "turbo"));
    }

    #[test]
    fn missing_compiler_path_errors() {
        let toml = "[project]\nroot = \"/p\"\n[compiler]\npath = \"\"\n";
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(ref f) if f == "compiler.path"));
    }

    #[test]
    fn nested_package_dir_rejected() {
        let toml = "[project]\nroot = \"/p\"\npackage_dir = \"a/b\"\n[compiler]\npath = \"/c\"\n";
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn zero_workers_rejected() {
        let toml = format!("{MINIMAL}\n[build]\nmax_workers = 0\n");
        assert!(matches!(
            load_config_from_str(&toml).unwrap_err(),
            ConfigError::ValidationError(_)
        ));
    }

    #[test]
    fn invalid_toml_errors() {
        let err = load_config_from_str("this is not valid toml {{{}}}").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), MINIMAL).unwrap();
        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.compiler.path.to_str(), Some("/sdk/bin/es2abc"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_config(dir.path()).unwrap_err(),
            ConfigError::IoError(_)
        ));
    }
}
