use super::{json_pretty, Context, EXIT_SUCCESS};
use std::path::Path;

pub fn run(ctx: &Context, manifest: Option<&Path>) -> Result<u8, String> {
    let manifest = ctx.manifest_path(manifest);
    let resolution = ctx.resolve(&manifest)?;
    let changed = resolution
        .overrides
        .iter()
        .filter(|ov| ov.changes_version())
        .count();

    if ctx.json {
        let payload = serde_json::json!({
            "status": "ok",
            "manifest": manifest,
            "packages": resolution.len(),
            "files": resolution.sources.len(),
            "overrides": resolution.overrides.len(),
            "version_overrides": changed,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!(
            "{}: {} packages from {} files ({} overrides)",
            manifest.display(),
            resolution.len(),
            resolution.sources.len(),
            resolution.overrides.len()
        );
    }
    Ok(EXIT_SUCCESS)
}
