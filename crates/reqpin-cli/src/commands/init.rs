use super::{json_pretty, Context, EXIT_SUCCESS};
use reqpin_core::ProjectConfig;
use std::path::Path;

pub fn run(ctx: &Context, config_path: Option<&Path>, force: bool) -> Result<u8, String> {
    let path = ctx.config_path(config_path);
    if path.exists() && !force {
        return Err(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        ));
    }

    ProjectConfig::default()
        .save(&path)
        .map_err(|e| e.to_string())?;

    if ctx.json {
        let payload = serde_json::json!({
            "status": "created",
            "config": path,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!("wrote {}", path.display());
    }
    Ok(EXIT_SUCCESS)
}
