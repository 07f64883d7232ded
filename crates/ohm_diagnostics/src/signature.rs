//! Known error signatures of the external compiler.
//!
//! When a compiler or worker exits non-zero, its captured output is matched
//! against this table. The first output line that starts with a known
//! prefix selects the code, description and remediation; the remainder of
//! the output becomes the cause. Unmatched output is passed through verbatim
//! as the cause of a generic compiler failure.

use crate::code::{DiagnosticCode, ErrorKind, Subsystem};
use crate::diagnostic::Diagnostic;

/// One known compiler error signature.
#[derive(Clone, Debug)]
pub struct Signature {
    /// Leading text identifying the error.
    pub prefix: &'static str,
    /// The code reported when the signature matches.
    pub code: DiagnosticCode,
    /// The description reported when the signature matches.
    pub description: &'static str,
    /// Remediation steps.
    pub solutions: &'static [&'static str],
}

/// An ordered table of signatures, longest prefix first.
#[derive(Clone, Debug)]
pub struct SignatureTable {
    signatures: Vec<Signature>,
}

const fn compiler(number: u16) -> DiagnosticCode {
    DiagnosticCode::new(Subsystem::Compiler, ErrorKind::External, number)
}

const fn compiler_internal(number: u16) -> DiagnosticCode {
    DiagnosticCode::new(Subsystem::Compiler, ErrorKind::Internal, number)
}

const BUILTIN: &[Signature] = &[
    Signature {
        prefix: "SyntaxError:",
        code: compiler(2),
        description: "Syntax error in compiled source",
        solutions: &["Check the reported position for invalid syntax."],
    },
    Signature {
        prefix: "Failed to read input file:",
        code: compiler_internal(2),
        description: "The compiler could not read an input file",
        solutions: &[
            "Make sure the cache directory is not modified while a build runs.",
            "Run a clean build.",
        ],
    },
    Signature {
        prefix: "Failed to write output file:",
        code: compiler_internal(3),
        description: "The compiler could not write its output",
        solutions: &["Check free disk space and permissions of the output directory."],
    },
    Signature {
        prefix: "Failed to read symbol table:",
        code: compiler(3),
        description: "The symbol table of the previous build is unusable",
        solutions: &["Run a full build to regenerate the symbol table."],
    },
    Signature {
        prefix: "Unknown option:",
        code: compiler_internal(4),
        description: "The compiler rejected a command-line option",
        solutions: &["Check that the compiler version matches the configured SDK."],
    },
    Signature {
        prefix: "Patch generation failed:",
        code: compiler(4),
        description: "The compiler could not generate a patch",
        solutions: &["Modifications that change a module's exports require a full build."],
    },
];

impl SignatureTable {
    /// Creates a table from the given signatures, ordering longer prefixes first.
    pub fn new(mut signatures: Vec<Signature>) -> Self {
        signatures.sort_by(|a, b| b.prefix.len().cmp(&a.prefix.len()));
        Self { signatures }
    }

    /// Creates the table of signatures the supported compilers are known to emit.
    pub fn builtin() -> Self {
        Self::new(BUILTIN.to_vec())
    }

    /// Returns the matching signature for a single line, if any.
    pub fn lookup(&self, line: &str) -> Option<&Signature> {
        self.signatures.iter().find(|s| line.starts_with(s.prefix))
    }

    /// Converts captured tool output into a diagnostic.
    ///
    /// `fallback` is the code used when no signature matches.
    pub fn classify(&self, output: &str, fallback: DiagnosticCode) -> Diagnostic {
        let lines: Vec<&str> = output.lines().map(str::trim_end).collect();
        for (i, line) in lines.iter().enumerate() {
            let trimmed = line.trim_start();
            if let Some(sig) = self.lookup(trimmed) {
                let mut cause = trimmed[sig.prefix.len()..].trim().to_string();
                for rest in &lines[i + 1..] {
                    if !rest.is_empty() {
                        if !cause.is_empty() {
                            cause.push('\n');
                        }
                        cause.push_str(rest);
                    }
                }
                let mut diag = Diagnostic::error(sig.code, sig.description);
                if !cause.is_empty() {
                    diag = diag.with_cause(cause);
                }
                for solution in sig.solutions {
                    diag = diag.with_solution(*solution);
                }
                return diag;
            }
        }

        let verbatim = output.trim();
        let diag = Diagnostic::error(fallback, "External tool failed");
        if verbatim.is_empty() {
            diag
        } else {
            diag.with_cause(verbatim)
        }
    }
}

impl Default for SignatureTable {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_known_prefix_and_keeps_cause() {
        let table = SignatureTable::builtin();
        let diag = table.classify(
            "warning: noise\nSyntaxError: Unexpected token '}'\n  at a.js:3:7\n",
            DiagnosticCode::COMPILER_FAILED,
        );
        assert_eq!(diag.code.to_string(), "10511002");
        assert_eq!(diag.description, "Syntax error in compiled source");
        assert_eq!(diag.cause.as_deref(), Some("Unexpected token '}'\n  at a.js:3:7"));
        assert_eq!(diag.solutions.len(), 1);
    }

    #[test]
    fn unmatched_passes_through_verbatim() {
        let table = SignatureTable::builtin();
        let diag = table.classify("segfault somewhere\n", DiagnosticCode::COMPILER_FAILED);
        assert_eq!(diag.code, DiagnosticCode::COMPILER_FAILED);
        assert_eq!(diag.cause.as_deref(), Some("segfault somewhere"));
        assert!(diag.solutions.is_empty());
    }

    #[test]
    fn empty_output_has_no_cause() {
        let table = SignatureTable::builtin();
        let diag = table.classify("", DiagnosticCode::MERGE_FAILED);
        assert_eq!(diag.code, DiagnosticCode::MERGE_FAILED);
        assert!(diag.cause.is_none());
    }

    #[test]
    fn longest_prefix_wins() {
        let table = SignatureTable::new(vec![
            Signature {
                prefix: "Error:",
                code: compiler(90),
                description: "generic",
                solutions: &[],
            },
            Signature {
                prefix: "Error: link",
                code: compiler(91),
                description: "link",
                solutions: &[],
            },
        ]);
        let diag = table.classify("Error: link failed", DiagnosticCode::COMPILER_FAILED);
        assert_eq!(diag.code, compiler(91));
        assert_eq!(diag.cause.as_deref(), Some("failed"));
    }
}
