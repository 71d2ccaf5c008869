use super::{json_pretty, render_drift, Context, EXIT_LOCK_ERROR, EXIT_SUCCESS};
use reqpin_core::diff_lock;
use reqpin_schema::LockFile;
use std::path::Path;

pub fn run(ctx: &Context, manifest: Option<&Path>, lock: Option<&Path>) -> Result<u8, String> {
    let manifest = ctx.manifest_path(manifest);
    let lock_path = ctx.lock_path(lock);

    let lock = LockFile::read_from_file(&lock_path)
        .map_err(|e| format!("lock error: {}: {e}", lock_path.display()))?;
    lock.verify_integrity()
        .map_err(|e| format!("lock error: {}: {e}", lock_path.display()))?;

    let resolution = ctx.resolve(&manifest)?;
    let report = diff_lock(&lock, &resolution);
    // The digest check also catches what a by-key diff cannot see.
    let mismatch = lock.verify_resolution(&resolution).err();
    let drifted = report.has_drift || mismatch.is_some();

    if ctx.json {
        let payload = serde_json::json!({
            "status": if drifted { "drift" } else { "ok" },
            "lock": lock_path,
            "digest": lock.digest,
            "drift": report,
            "reason": mismatch.as_ref().map(ToString::to_string),
        });
        println!("{}", json_pretty(&payload)?);
    } else if drifted {
        println!(
            "{} has drifted from {} ({})",
            manifest.display(),
            lock_path.display(),
            report.summary()
        );
        for line in render_drift(&report) {
            println!("  {line}");
        }
        if let Some(e) = &mismatch {
            println!("  {e}");
        }
        println!("run 'reqpin lock' to update the lock file");
    } else {
        println!(
            "{} matches {} ({})",
            manifest.display(),
            lock_path.display(),
            lock.short_digest
        );
    }

    Ok(if drifted { EXIT_LOCK_ERROR } else { EXIT_SUCCESS })
}
