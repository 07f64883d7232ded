//! Build mode flags and the once-per-invocation mode selection.

use serde::Deserialize;
use std::fmt;

use crate::error::ConfigError;

/// Mode flags as supplied by the host, either in `[mode]` or on the command line.
#[derive(Debug, Default, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct ModeFlags {
    /// Build a preview image.
    #[serde(default)]
    pub preview: bool,
    /// Patch a running application without restarting it.
    #[serde(default)]
    pub hot_reload: bool,
    /// Patch a running application and restart its page stack.
    #[serde(default)]
    pub cold_reload: bool,
    /// Build a patch against an externally shipped image.
    #[serde(default)]
    pub hot_fix: bool,
}

impl ModeFlags {
    /// Overlays `other` on `self`: any flag set in either is set in the result.
    pub fn merged(self, other: ModeFlags) -> ModeFlags {
        ModeFlags {
            preview: self.preview || other.preview,
            hot_reload: self.hot_reload || other.hot_reload,
            cold_reload: self.cold_reload || other.cold_reload,
            hot_fix: self.hot_fix || other.hot_fix,
        }
    }

    /// Selects the single build mode these flags describe.
    ///
    /// No flag selects [`BuildMode::FullBuild`]. Setting more than one flag is
    /// a configuration error.
    pub fn select(self) -> Result<BuildMode, ConfigError> {
        let set: Vec<(&str, BuildMode)> = [
            (self.preview, "preview", BuildMode::Preview),
            (self.hot_reload, "hot_reload", BuildMode::HotReload),
            (self.cold_reload, "cold_reload", BuildMode::ColdReload),
            (self.hot_fix, "hot_fix", BuildMode::HotFix),
        ]
        .into_iter()
        .filter(|(on, _, _)| *on)
        .map(|(_, name, mode)| (name, mode))
        .collect();

        match set.as_slice() {
            [] => Ok(BuildMode::FullBuild),
            [(_, mode)] => Ok(*mode),
            many => Err(ConfigError::ConflictingModes(
                many.iter().map(|(n, _)| *n).collect::<Vec<_>>().join(", "),
            )),
        }
    }
}

/// The build mode chosen for one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildMode {
    /// Compile every stale file into the main image.
    FullBuild,
    /// Like a full build, written to the preview output directory.
    Preview,
    /// Session-latched patch builds without restart.
    HotReload,
    /// Patch against an externally supplied symbol table.
    HotFix,
    /// Session-latched patch builds with restart.
    ColdReload,
}

impl BuildMode {
    /// Returns `true` for the modes that share the session's first-build latch.
    pub fn is_reload(self) -> bool {
        matches!(self, BuildMode::HotReload | BuildMode::ColdReload)
    }

    /// Returns `true` for every mode that can emit a patch image.
    pub fn is_patch(self) -> bool {
        matches!(
            self,
            BuildMode::HotReload | BuildMode::ColdReload | BuildMode::HotFix
        )
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuildMode::FullBuild => "full build",
            BuildMode::Preview => "preview",
            BuildMode::HotReload => "hot reload",
            BuildMode::HotFix => "hot fix",
            BuildMode::ColdReload => "cold reload",
        };
        f.write_str(name)
    }
}
