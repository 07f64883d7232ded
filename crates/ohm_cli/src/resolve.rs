//! `ohm resolve`: prints the module URL of each path.

use ohm_diagnostics::SignatureTable;
use ohm_driver::{DriverError, PipelineContext};

use crate::pipeline::{config_path, load_resolved, report_diagnostics};
use crate::{GlobalArgs, ReportFormat, ResolveArgs};

/// Runs the `ohm resolve` command. Unresolvable paths are reported and
/// printed unchanged, exactly as the build degrades them.
pub fn run(args: &ResolveArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let path = config_path(global)?;
    let config = match load_resolved(&path, Default::default()) {
        Ok(config) => config,
        Err(e) => {
            let diag = DriverError::from(e).to_diagnostic(&SignatureTable::builtin());
            report_diagnostics(&[diag], ReportFormat::Text, global.color);
            return Ok(1);
        }
    };
    let ctx = match PipelineContext::new(config) {
        Ok(ctx) => ctx,
        Err(e) => {
            let diag = e.to_diagnostic(&SignatureTable::builtin());
            report_diagnostics(&[diag], ReportFormat::Text, global.color);
            return Ok(1);
        }
    };

    let cwd = std::env::current_dir()?;
    let mut code = 0;
    for input in &args.paths {
        let absolute = cwd.join(input);
        let source = ohm_common::to_unix_path(&absolute);
        match ctx.resolver().try_resolve(&source, args.namespace.as_deref()) {
            Ok(url) => println!("{} -> {url}", input.display()),
            Err(e) => {
                report_diagnostics(&[e.to_diagnostic()], ReportFormat::Text, global.color);
                println!("{} -> {source}", input.display());
                code = 1;
            }
        }
    }
    Ok(code)
}
