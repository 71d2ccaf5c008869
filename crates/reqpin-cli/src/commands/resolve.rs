use super::{json_pretty, Context, EXIT_SUCCESS};
use std::path::Path;

pub fn run(
    ctx: &Context,
    manifest: Option<&Path>,
    show_origin: bool,
    show_overrides: bool,
) -> Result<u8, String> {
    let manifest = ctx.manifest_path(manifest);
    let resolution = ctx.resolve(&manifest)?;

    if ctx.json {
        println!("{}", json_pretty(&resolution)?);
        return Ok(EXIT_SUCCESS);
    }

    for pin in resolution.iter() {
        if show_origin {
            println!("{}  # {}", pin.requirement(), pin.origin);
        } else {
            println!("{}", pin.requirement());
        }
    }

    if show_overrides {
        for ov in &resolution.overrides {
            println!(
                "# {} at {} overrides {} at {}",
                ov.replacement.requirement(),
                ov.replacement.origin,
                ov.previous.requirement(),
                ov.previous.origin
            );
        }
    }
    Ok(EXIT_SUCCESS)
}
