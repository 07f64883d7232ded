//! Compiler command lines.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Upper bound on the compiler's own thread count.
const MAX_THREADS: usize = 16;

/// Thread hint for the modern backend: available CPUs, capped at 16.
pub fn thread_hint() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(MAX_THREADS)
}

/// A program and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerArgs {
    /// The program to run.
    pub program: PathBuf,
    /// Arguments in order.
    pub args: Vec<OsString>,
}

impl CompilerArgs {
    /// Starts a command line for `program`.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Appends one argument.
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends a flag followed by a path.
    pub fn flag_path(self, flag: &str, path: &Path) -> Self {
        self.arg(flag).arg(path.as_os_str())
    }

    /// Builds the process command.
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

impl fmt::Display for CompilerArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Symbol-table flags of the patch modes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SymbolFlags {
    /// No symbol table involved.
    #[default]
    None,
    /// First reload build: dump the symbol table.
    Dump(PathBuf),
    /// Later reload build: patch against the dumped table.
    Reload {
        /// Symbol table of the running image.
        input: PathBuf,
        /// Restart the page stack rather than patching in place.
        cold: bool,
    },
    /// Hot fix against an externally shipped table.
    HotFix {
        /// Symbol table of the shipped image.
        input: PathBuf,
    },
}

impl SymbolFlags {
    fn apply(&self, args: CompilerArgs) -> CompilerArgs {
        match self {
            SymbolFlags::None => args,
            SymbolFlags::Dump(path) => args.flag_path("--dump-symbol-table", path),
            SymbolFlags::Reload { input, cold } => args
                .flag_path("--input-symbol-table", input)
                .arg(if *cold { "--cold-reload" } else { "--hot-reload" }),
            SymbolFlags::HotFix { input } => args
                .flag_path("--input-symbol-table", input)
                .arg("--generate-patch"),
        }
    }
}

/// Builder for the single modern-backend invocation.
#[derive(Debug, Clone)]
pub struct ModernCommand<'a> {
    /// Compiler program.
    pub program: &'a Path,
    /// Arguments shared by every invocation.
    pub base_args: &'a [String],
    /// Files-info manifest.
    pub files_info: &'a Path,
    /// Merged image; `Some` on the per-module path.
    pub merged_output: Option<&'a Path>,
    /// Package entries manifest.
    pub entries: Option<&'a Path>,
    /// Reuse list of previously compiled fragments.
    pub reuse_list: Option<&'a Path>,
    /// Compiler thread count.
    pub threads: usize,
    /// Patch-mode flags.
    pub symbols: &'a SymbolFlags,
}

impl ModernCommand<'_> {
    /// Renders the command line.
    pub fn build(&self) -> CompilerArgs {
        let mut files_info = OsString::from("@");
        files_info.push(self.files_info.as_os_str());

        let mut args = CompilerArgs::new(self.program);
        for a in self.base_args {
            args = args.arg(a);
        }
        args = args.arg(files_info);
        if let Some(entries) = self.entries {
            args = args.flag_path("--npm-module-entry-list", entries);
        }
        if let Some(output) = self.merged_output {
            args = args.flag_path("--output", output);
        }
        args = args.arg("--file-threads").arg(self.threads.to_string());
        if let Some(reuse) = self.reuse_list {
            args = args.flag_path("--cache-file", reuse);
        }
        if self.merged_output.is_some() {
            args = args.arg("--merge-abc");
        }
        self.symbols.apply(args)
    }
}
