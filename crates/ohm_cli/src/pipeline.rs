//! Shared helpers for CLI commands.
//!
//! Contains the steps every command repeats: locating `ohm.toml`, resolving
//! it with the command-line mode flags, building the file list, and
//! rendering diagnostics.

use std::path::{Path, PathBuf};

use ohm_config::{ConfigError, ModeFlags, ResolvedConfig, CONFIG_FILE};
use ohm_diagnostics::{Diagnostic, DiagnosticRenderer, JsonRenderer, TerminalRenderer};
use ohm_inventory::FileList;

use crate::{GlobalArgs, ReportFormat};

/// Extensions picked up when no file list is given.
const SOURCE_EXTENSIONS: &[&str] = &["ets", "ts", "js", "mjs", "cjs"];

/// Walks up from `start` looking for the nearest directory containing `ohm.toml`.
pub fn find_project_root(start: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(CONFIG_FILE).exists() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(format!(
                "could not find {CONFIG_FILE} in {} or any parent directory",
                start.display()
            )
            .into());
        }
    }
}

/// The configuration file to load.
///
/// `--config` may name the file or its directory. Otherwise the nearest
/// `ohm.toml` above the current directory is used.
pub fn config_path(global: &GlobalArgs) -> Result<PathBuf, Box<dyn std::error::Error>> {
    match &global.config {
        Some(path) => {
            let p = PathBuf::from(path);
            if p.is_dir() {
                Ok(p.join(CONFIG_FILE))
            } else {
                Ok(p)
            }
        }
        None => Ok(find_project_root(&std::env::current_dir()?)?.join(CONFIG_FILE)),
    }
}

/// Loads `path` and resolves it against its directory with `flags` merged in.
pub fn load_resolved(path: &Path, flags: ModeFlags) -> Result<ResolvedConfig, ConfigError> {
    let config = ohm_config::load_config_from_path(path)?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    let base = if base.as_os_str().is_empty() {
        std::env::current_dir()?
    } else {
        std::path::absolute(base)?
    };
    ohm_config::resolve_config(&config, &base, flags)
}

/// The invocation's file list: the `--files` document if given, otherwise
/// every source under the module roots (the project root when none are
/// declared), sorted by path.
pub fn file_list(
    config: &ResolvedConfig,
    files: Option<&Path>,
) -> Result<FileList, Box<dyn std::error::Error>> {
    if let Some(path) = files {
        return Ok(FileList::load(path)?);
    }
    let roots: Vec<&Path> = if config.modules.is_empty() {
        vec![config.project_root.as_path()]
    } else {
        config.modules.values().map(PathBuf::as_path).collect()
    };
    let skip = [config.cache_dir.as_path(), config.output_dir.as_path()];
    let mut found = Vec::new();
    for root in roots {
        if root.is_dir() {
            walk_dir(root, &skip, &mut found)?;
        }
    }
    found.sort();
    found.dedup();
    Ok(FileList::from_paths(found))
}

fn walk_dir(
    dir: &Path,
    skip: &[&Path],
    files: &mut Vec<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let hidden = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with('.'));
        if hidden || skip.iter().any(|s| path.starts_with(s)) {
            continue;
        }
        if path.is_dir() {
            walk_dir(&path, skip, files)?;
        } else if path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| SOURCE_EXTENSIONS.contains(&e))
        {
            files.push(path);
        }
    }
    Ok(())
}

/// Renders diagnostics: text to stderr, JSON lines to stdout.
pub fn report_diagnostics(diagnostics: &[Diagnostic], format: ReportFormat, color: bool) {
    match format {
        ReportFormat::Text => {
            let renderer = TerminalRenderer::new(color);
            for diag in diagnostics {
                eprint!("{}", renderer.render(diag));
            }
        }
        ReportFormat::Json => {
            for diag in diagnostics {
                println!("{}", JsonRenderer.render(diag));
            }
        }
    }
}
