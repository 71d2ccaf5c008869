use super::{json_pretty, Context, EXIT_SUCCESS};
use reqpin_schema::LockFile;
use std::path::Path;
use tracing::debug;

pub fn run(ctx: &Context, manifest: Option<&Path>, output: Option<&Path>) -> Result<u8, String> {
    let manifest = ctx.manifest_path(manifest);
    let lock_path = ctx.lock_path(output);
    let resolution = ctx.resolve(&manifest)?;
    let lock = LockFile::from_resolution(&resolution);

    let unchanged = lock_path.is_file()
        && LockFile::read_from_file(&lock_path).is_ok_and(|old| old == lock);
    if unchanged {
        debug!("lock file {} already up to date", lock_path.display());
    } else {
        lock.write_to_file(&lock_path)
            .map_err(|e| format!("lock error: {e}"))?;
    }

    if ctx.json {
        let payload = serde_json::json!({
            "status": if unchanged { "unchanged" } else { "written" },
            "lock": lock_path,
            "digest": lock.digest,
            "short_digest": lock.short_digest,
            "packages": lock.packages.len(),
        });
        println!("{}", json_pretty(&payload)?);
    } else if unchanged {
        println!(
            "{} is up to date ({})",
            lock_path.display(),
            lock.short_digest
        );
    } else {
        println!(
            "locked {} packages to {} ({})",
            lock.packages.len(),
            lock_path.display(),
            lock.short_digest
        );
    }
    Ok(EXIT_SUCCESS)
}
