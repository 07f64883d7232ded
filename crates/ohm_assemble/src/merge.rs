//! Merging protobuf fragments into one image (legacy per-module path).

use ohm_common::to_unix_path;
use ohm_config::ResolvedConfig;
use ohm_dispatch::manifest::{render_entries, write_manifest};
use ohm_dispatch::{base_args, run_tool, CompilerArgs, DispatchError, MODULES_IMAGE};
use ohm_inventory::{ModuleRecord, PackageEntryRecord};
use std::path::{Path, PathBuf};

use crate::error::{io_err, AssembleError};

/// Compiled package entries, merged alongside module fragments.
pub const NPM_ENTRIES_PROTO: &str = "npm_entries.protoBin";

/// Sorted list of fragments handed to the merge tool.
pub const PROTO_LIST: &str = "protoFilesInfo.txt";

const ENTRIES_MANIFEST: &str = "npmEntries.txt";

/// Merges the fragments of `records` into `<image_dir>/modules.abc`.
///
/// Returns the temporary files written under `scratch_dir`.
pub fn merge_fragments(
    config: &ResolvedConfig,
    records: &[ModuleRecord],
    entries: &[PackageEntryRecord],
    image_dir: &Path,
    scratch_dir: &Path,
) -> Result<Vec<PathBuf>, AssembleError> {
    let merge_tool = config.merge_tool.as_deref().ok_or_else(|| AssembleError::MergeFailed {
        reason: "no merge tool configured".to_string(),
        output: String::new(),
    })?;
    let mut written = Vec::new();
    let mut protos: Vec<String> = records.iter().map(|r| to_unix_path(&r.artifact_path)).collect();

    if !entries.is_empty() {
        let manifest = scratch_dir.join(ENTRIES_MANIFEST);
        write_manifest(&manifest, &render_entries(entries))?;
        written.push(manifest.clone());

        let proto = scratch_dir.join(NPM_ENTRIES_PROTO);
        let args = base_args(config)
            .into_iter()
            .fold(CompilerArgs::new(&config.compiler_path), |a, s| a.arg(s))
            .flag_path("--compile-npm-entries", &manifest)
            .arg(proto.as_os_str());
        run_tool(&args)?;
        written.push(proto.clone());
        protos.push(to_unix_path(&proto));
    }

    protos.sort();
    let mut list = protos.join("\n");
    list.push('\n');
    let list_path = scratch_dir.join(PROTO_LIST);
    write_manifest(&list_path, &list)?;
    written.push(list_path.clone());

    std::fs::create_dir_all(image_dir).map_err(io_err(image_dir))?;
    let mut input = std::ffi::OsString::from("@");
    input.push(list_path.as_os_str());
    let args = CompilerArgs::new(merge_tool)
        .arg("--input")
        .arg(input)
        .flag_path("--outputFilePath", image_dir)
        .arg("--output")
        .arg(MODULES_IMAGE)
        .arg("--suffix")
        .arg("protoBin");

    tracing::info!(fragments = protos.len(), "merging fragments");
    run_tool(&args).map_err(|err| match err {
        DispatchError::CompilerFailed { status, output, .. } => AssembleError::MergeFailed {
            reason: match status {
                Some(code) => format!("exit code {code}"),
                None => "terminated by a signal".to_string(),
            },
            output,
        },
        other => AssembleError::MergeFailed {
            reason: other.to_string(),
            output: String::new(),
        },
    })?;
    Ok(written)
}
