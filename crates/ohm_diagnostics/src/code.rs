//! Eight-digit diagnostic codes identifying the reporting subsystem and error class.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The subsystem a diagnostic originates from, forming the first three digits.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Subsystem {
    /// The build layer itself: resolution, cache, inventory, distribution.
    Pipeline,
    /// The external bytecode compiler.
    Compiler,
    /// The external merge tool.
    MergeTool,
}

impl Subsystem {
    /// Returns the three-digit numeric prefix for this subsystem.
    pub fn prefix(self) -> u16 {
        match self {
            Subsystem::Pipeline => 103,
            Subsystem::Compiler => 105,
            Subsystem::MergeTool => 108,
        }
    }
}

/// Whether the error is caused by user input or by the toolchain itself.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Caused by project sources or configuration; the user can fix it.
    External,
    /// Caused by an inconsistent toolchain state; indicates a bug.
    Internal,
}

impl ErrorKind {
    /// Returns the two-digit numeric infix for this kind.
    pub fn infix(self) -> u8 {
        match self {
            ErrorKind::External => 11,
            ErrorKind::Internal => 30,
        }
    }

    /// Returns the headline shown before every diagnostic of this kind.
    pub fn headline(self) -> &'static str {
        match self {
            ErrorKind::External => "bytecode build error",
            ErrorKind::Internal => "bytecode build internal error",
        }
    }
}

/// A structured diagnostic code.
///
/// Displayed as eight digits: subsystem (3), kind (2), number (3), e.g.
/// `10311001` for a module URL that could not be resolved.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct DiagnosticCode {
    /// The reporting subsystem.
    pub subsystem: Subsystem,
    /// The error class.
    pub kind: ErrorKind,
    /// The numeric identifier within subsystem and kind.
    pub number: u16,
}

impl DiagnosticCode {
    /// Creates a new diagnostic code.
    pub const fn new(subsystem: Subsystem, kind: ErrorKind, number: u16) -> Self {
        Self {
            subsystem,
            kind,
            number,
        }
    }

    /// A module path could not be mapped to a module URL.
    pub const RESOLVE_FAILED: Self = Self::new(Subsystem::Pipeline, ErrorKind::External, 1);
    /// The project configuration is invalid.
    pub const INVALID_CONFIG: Self = Self::new(Subsystem::Pipeline, ErrorKind::External, 2);
    /// An expected source-cache file is missing.
    pub const MISSING_CACHE_FILE: Self = Self::new(Subsystem::Pipeline, ErrorKind::Internal, 1);
    /// A compiled artifact referenced by the ledger is missing.
    pub const MISSING_ARTIFACT: Self = Self::new(Subsystem::Pipeline, ErrorKind::Internal, 2);
    /// Reading or writing cache state failed.
    pub const CACHE_IO: Self = Self::new(Subsystem::Pipeline, ErrorKind::Internal, 3);
    /// A worker process failed.
    pub const WORKER_FAILED: Self = Self::new(Subsystem::Pipeline, ErrorKind::Internal, 4);
    /// Writing an output file failed.
    pub const OUTPUT_IO: Self = Self::new(Subsystem::Pipeline, ErrorKind::Internal, 5);
    /// The compiler exited with output no signature matched.
    pub const COMPILER_FAILED: Self = Self::new(Subsystem::Compiler, ErrorKind::External, 1);
    /// The compiler program could not be launched.
    pub const COMPILER_LAUNCH: Self = Self::new(Subsystem::Compiler, ErrorKind::Internal, 1);
    /// The merge tool failed or could not be launched.
    pub const MERGE_FAILED: Self = Self::new(Subsystem::MergeTool, ErrorKind::Internal, 1);
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:03}{:02}{:03}",
            self.subsystem.prefix(),
            self.kind.infix(),
            self.number
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_eight_digits() {
        assert_eq!(DiagnosticCode::RESOLVE_FAILED.to_string(), "10311001");
        assert_eq!(DiagnosticCode::MISSING_CACHE_FILE.to_string(), "10330001");
        assert_eq!(DiagnosticCode::MERGE_FAILED.to_string(), "10830001");
        let code = DiagnosticCode::new(Subsystem::Compiler, ErrorKind::External, 42);
        assert_eq!(code.to_string(), "10511042");
    }

    #[test]
    fn headlines() {
        assert_eq!(ErrorKind::External.headline(), "bytecode build error");
        assert_eq!(ErrorKind::Internal.headline(), "bytecode build internal error");
    }

    #[test]
    fn serde_roundtrip() {
        let code = DiagnosticCode::COMPILER_FAILED;
        let json = serde_json::to_string(&code).unwrap();
        let back: DiagnosticCode = serde_json::from_str(&json).unwrap();
        assert_eq!(code, back);
    }
}
