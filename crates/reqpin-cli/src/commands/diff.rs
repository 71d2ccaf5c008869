use super::{json_pretty, render_drift, Context, EXIT_FAILURE, EXIT_SUCCESS};
use reqpin_core::diff_resolutions;
use std::path::Path;

/// Exits 0 when both trees resolve to the same pins and 1 otherwise.
pub fn run(ctx: &Context, old: &Path, new: &Path) -> Result<u8, String> {
    let old_res = ctx.resolve(old)?;
    let new_res = ctx.resolve(new)?;
    let report = diff_resolutions(&old_res, &new_res);

    if ctx.json {
        println!("{}", json_pretty(&report)?);
    } else if report.has_drift {
        for line in render_drift(&report) {
            println!("{line}");
        }
    } else {
        println!("no differences");
    }

    Ok(if report.has_drift {
        EXIT_FAILURE
    } else {
        EXIT_SUCCESS
    })
}
