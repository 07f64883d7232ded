//! Error types for configuration loading and validation.

/// Errors that can occur when loading or validating an `ohm.toml` configuration.
///
/// All of these are fatal at startup, before any file is touched.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An I/O error occurred while reading the configuration file.
    #[error("failed to read configuration: {0}")]
    IoError(#[from] std::io::Error),

    /// The TOML content could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// The selected compiler backend is not one of the supported backends.
    #[error("unknown compiler backend '{0}' (expected 'modern' or 'legacy')")]
    UnknownBackend(String),

    /// A required field is missing from the configuration.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// More than one exclusive build mode was requested.
    #[error("conflicting build modes: {0}")]
    ConflictingModes(String),

    /// A configuration value failed validation.
    #[error("validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_unknown_backend() {
        let err = ConfigError::UnknownBackend("turbo".to_string());
        assert_eq!(
            format!("{err}"),
            "unknown compiler backend 'turbo' (expected 'modern' or 'legacy')"
        );
    }

    #[test]
    fn display_missing_field() {
        let err = ConfigError::MissingField("compiler.path".to_string());
        assert_eq!(format!("{err}"), "missing required field: compiler.path");
    }

    #[test]
    fn display_conflicting_modes() {
        let err = ConfigError::ConflictingModes("hot_reload, hot_fix".to_string());
        assert_eq!(format!("{err}"), "conflicting build modes: hot_reload, hot_fix");
    }

    #[test]
    fn display_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = ConfigError::IoError(io_err);
        assert!(format!("{err}").starts_with("failed to read configuration:"));
    }
}
