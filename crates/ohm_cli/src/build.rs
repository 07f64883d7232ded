//! `ohm build`: one invocation in the selected build mode.
//!
//! 1. Locate and resolve `ohm.toml` with the mode flags merged in
//! 2. Build the file list
//! 3. Run the pipeline
//! 4. Render diagnostics and the summary

use ohm_diagnostics::SignatureTable;
use ohm_driver::{BuildReport, DriverError, PipelineContext, SessionState};

use crate::pipeline::{config_path, file_list, load_resolved, report_diagnostics};
use crate::{BuildArgs, GlobalArgs, ReportFormat};

/// Runs the `ohm build` command. Returns exit code 0 on success, 1 on error.
pub fn run(args: &BuildArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let mut session = SessionState::new();
    build_once(args, global, &mut session)
}

/// One pipeline invocation against `session`. Shared with `ohm watch`.
pub fn build_once(
    args: &BuildArgs,
    global: &GlobalArgs,
    session: &mut SessionState,
) -> Result<i32, Box<dyn std::error::Error>> {
    let path = config_path(global)?;
    let config = match load_resolved(&path, args.mode.flags()) {
        Ok(config) => config,
        Err(e) => {
            let diag = DriverError::from(e).to_diagnostic(&SignatureTable::builtin());
            report_diagnostics(&[diag], args.format, global.color);
            return Ok(1);
        }
    };

    if !global.quiet && args.format == ReportFormat::Text {
        eprintln!(
            "   Building {} ({}, {} backend)",
            config.project_root.display(),
            config.mode,
            config.backend
        );
    }

    let list = file_list(&config, args.files.as_deref())?;
    let mut ctx = match PipelineContext::new(config) {
        Ok(ctx) => ctx,
        Err(e) => {
            let diag = e.to_diagnostic(&SignatureTable::builtin());
            report_diagnostics(&[diag], args.format, global.color);
            return Ok(1);
        }
    };

    let result = ohm_driver::run(&mut ctx, session, &list);
    report_diagnostics(&ctx.sink().take_all(), args.format, global.color);
    match result {
        Ok(report) => {
            print_summary(&report, args.format, global.quiet);
            Ok(0)
        }
        Err(e) => {
            let diag = ctx.diagnose(&e);
            report_diagnostics(&[diag], args.format, global.color);
            Ok(1)
        }
    }
}

fn print_summary(report: &BuildReport, format: ReportFormat, quiet: bool) {
    match format {
        ReportFormat::Json => println!("{}", summary_json(report)),
        ReportFormat::Text if quiet => {}
        ReportFormat::Text => {
            if let Some(reason) = &report.skipped {
                eprintln!("     Skipped {} ({reason})", report.mode);
                return;
            }
            eprintln!(
                "   Compiled {} module(s), reused {}",
                report.compiled, report.reused
            );
            eprintln!("    Finished {} -> {}", report.mode, report.output_dir.display());
        }
    }
}

fn summary_json(report: &BuildReport) -> serde_json::Value {
    serde_json::json!({
        "mode": report.mode.to_string(),
        "compiled": report.compiled,
        "reused": report.reused,
        "output": report.output_dir.display().to_string(),
        "skipped": report.skipped.as_ref().map(|r| r.to_string()),
    })
}
