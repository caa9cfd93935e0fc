//! `toolscribe resolve` — Show the file names a command resolves to.

use std::path::Path;
use toolscribe_naming::{FragmentKind, NameContext, ResolvedName};
use super::{CmdResult, load_config};

pub async fn run(config_path: Option<&Path>, command: &str, kind: Option<&str>) -> CmdResult {
    let config = load_config(config_path)?;
    let names = NameContext::load(&config.naming)
        .map_err(|e| format!("Failed to load lookup tables: {e}"))?;
    let resolved = ResolvedName::resolve(Some(command), &names);

    if let Some(kind) = kind {
        let kind: FragmentKind = kind.parse()?;
        println!("{}", resolved.file_name(kind));
        return Ok(());
    }

    println!("🔎 {command}");
    println!("   Base:    {}", resolved.base_slug());
    println!("   Prefix:  {}", resolved.prefix_source());
    println!();
    for kind in FragmentKind::ALL {
        println!("   {:<15} {}", kind.as_str(), resolved.file_name(kind));
    }
    Ok(())
}
