use anyhow::Result;

use crate::Context;
use crate::paths;
use crate::ui;

pub fn run(ctx: &Context) -> Result<()> {
    ui::header("Configuration");

    let dir = paths::config_dir()?;
    let file = dir.join(paths::CONFIG_FILE);
    println!();
    ui::kv("Config directory", &dir.display().to_string());
    if file.exists() {
        ui::kv("Config file", &file.display().to_string());
    } else {
        ui::kv("Config file", &format!("{} (not found, using defaults)", file.display()));
    }
    ui::kv("Package list", &ctx.list_path().display().to_string());
    if ctx.list_file.is_some() {
        ui::dim("Package list overridden by --list-file or UNIP_LIST_FILE");
    }

    ui::section("Effective settings");
    println!();
    for line in ctx.config.to_toml()?.lines() {
        println!("  {line}");
    }

    println!();
    ui::dim(&format!("Set {} to use another config directory.", paths::ENV_CONFIG_DIR));
    Ok(())
}
