use anyhow::Result;

use crate::Context;
use crate::cli::ListArgs;
use crate::ui;

pub fn run(ctx: &Context, args: &ListArgs) -> Result<()> {
    let registry = super::registry(ctx)?;
    let store = super::open_store(ctx, &registry)?;

    let entries: Vec<&String> = match &args.scheme {
        Some(scheme) => store.entries_for_scheme(scheme).collect(),
        None => store.entries().iter().collect(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        if !ctx.quiet {
            ui::info(&format!("No packages in {}", store.path().display()));
        }
        return Ok(());
    }

    for entry in entries {
        println!("{entry}");
    }
    Ok(())
}
