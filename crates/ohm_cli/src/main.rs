//! Ohm CLI: drives the incremental bytecode build layer.
//!
//! Provides `ohm build` for one invocation in any build mode, `ohm watch`
//! for a reload session driven by stdin, and `ohm resolve` for printing
//! module URLs. The hidden `ohm worker` entry point is what the legacy
//! backend's worker pool spawns.

#![warn(missing_docs)]

mod build;
mod logging;
mod pipeline;
mod resolve;
mod watch;
mod worker;

use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand, ValueEnum};
use ohm_config::ModeFlags;

/// Ohm incremental bytecode builds.
#[derive(Parser, Debug)]
#[command(name = "ohm", version, about = "Ohm incremental bytecode build layer")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Control colored output.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Path to a custom `ohm.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the project once.
    Build(BuildArgs),
    /// Keep a reload session open, rebuilding once per line on stdin.
    Watch(BuildArgs),
    /// Print the module URL of each path.
    Resolve(ResolveArgs),
    /// Run one worker batch from the environment.
    #[command(hide = true)]
    Worker,
}

/// Arguments shared by `ohm build` and `ohm watch`.
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// JSON file list; defaults to every source under the module roots.
    #[arg(long)]
    pub files: Option<PathBuf>,

    /// Build mode overrides.
    #[command(flatten)]
    pub mode: ModeArgs,

    /// Output format for diagnostics and the build summary.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Build mode flags, merged with `[mode]` from `ohm.toml`.
#[derive(Args, Debug, Default, Clone, Copy)]
pub struct ModeArgs {
    /// Build a preview image.
    #[arg(long)]
    pub preview: bool,

    /// Emit hot reload patches after the first build.
    #[arg(long)]
    pub hot_reload: bool,

    /// Emit cold reload patches after the first build.
    #[arg(long)]
    pub cold_reload: bool,

    /// Build a hot fix patch against `reload.old_symbol_map`.
    #[arg(long)]
    pub hot_fix: bool,
}

impl ModeArgs {
    /// The flags as the configuration layer sees them.
    pub fn flags(self) -> ModeFlags {
        ModeFlags {
            preview: self.preview,
            hot_reload: self.hot_reload,
            cold_reload: self.cold_reload,
            hot_fix: self.hot_fix,
        }
    }
}

/// Arguments for the `ohm resolve` subcommand.
#[derive(Parser, Debug)]
pub struct ResolveArgs {
    /// Source paths to resolve.
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Namespace appended to the module segment.
    #[arg(long)]
    pub namespace: Option<String>,
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Detect from terminal capabilities.
    Auto,
    /// Always produce colored output.
    Always,
    /// Never produce colored output.
    Never,
}

/// Diagnostic output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable terminal output.
    Text,
    /// Machine-readable JSON output, one object per line.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Whether to use colored output.
    pub color: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    // Worker stderr is the failure channel back to the parent; keep it clean.
    if let Command::Worker = cli.command {
        process::exit(worker::run());
    }

    logging::init(cli.verbose, cli.quiet);

    let color = match cli.color {
        ColorChoice::Auto => std::env::var("TERM").is_ok(),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        color,
        config: cli.config,
    };

    let result = match cli.command {
        Command::Build(ref args) => build::run(args, &global),
        Command::Watch(ref args) => watch::run(args, &global),
        Command::Resolve(ref args) => resolve::run(args, &global),
        Command::Worker => Ok(worker::run()),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_build_default() {
        let cli = Cli::parse_from(["ohm", "build"]);
        match cli.command {
            Command::Build(ref args) => {
                assert!(args.files.is_none());
                assert_eq!(args.mode.flags(), ModeFlags::default());
                assert_eq!(args.format, ReportFormat::Text);
            }
            _ => panic!("expected Build command"),
        }
    }

    #[test]
    fn parse_build_with_args() {
        let cli = Cli::parse_from([
            "ohm",
            "build",
            "--files",
            "build/files.json",
            "--hot-fix",
            "--format",
            "json",
        ]);
        match cli.command {
            Command::Build(ref args) => {
                assert_eq!(args.files, Some(PathBuf::from("build/files.json")));
                assert!(args.mode.hot_fix);
                assert!(!args.mode.preview);
                assert_eq!(args.format, ReportFormat::Json);
            }
            _ => panic!("expected Build command"),
        }
    }

    #[test]
    fn conflicting_mode_flags_parse() {
        // Conflicts are rejected once merged with [mode], not by the parser.
        let cli = Cli::parse_from(["ohm", "build", "--preview", "--cold-reload"]);
        match cli.command {
            Command::Build(ref args) => {
                let flags = args.mode.flags();
                assert!(flags.preview && flags.cold_reload);
                assert!(flags.select().is_err());
            }
            _ => panic!("expected Build command"),
        }
    }

    #[test]
    fn parse_watch() {
        let cli = Cli::parse_from(["ohm", "watch", "--hot-reload"]);
        match cli.command {
            Command::Watch(ref args) => assert!(args.mode.hot_reload),
            _ => panic!("expected Watch command"),
        }
    }

    #[test]
    fn parse_resolve() {
        let cli = Cli::parse_from(["ohm", "resolve", "a.ets", "b.ets", "--namespace", "shared"]);
        match cli.command {
            Command::Resolve(ref args) => {
                assert_eq!(args.paths.len(), 2);
                assert_eq!(args.namespace.as_deref(), Some("shared"));
            }
            _ => panic!("expected Resolve command"),
        }
    }

    #[test]
    fn resolve_requires_a_path() {
        assert!(Cli::try_parse_from(["ohm", "resolve"]).is_err());
    }

    #[test]
    fn parse_hidden_worker() {
        let cli = Cli::parse_from(["ohm", "worker"]);
        assert!(matches!(cli.command, Command::Worker));
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::parse_from(["ohm", "--quiet", "--color", "never", "build"]);
        assert!(cli.quiet);
        assert!(!cli.verbose);
        assert_eq!(cli.color, ColorChoice::Never);
    }

    #[test]
    fn parse_config_path() {
        let cli = Cli::parse_from(["ohm", "build", "--config", "/path/to/ohm.toml"]);
        assert_eq!(cli.config.as_deref(), Some("/path/to/ohm.toml"));
    }
}
