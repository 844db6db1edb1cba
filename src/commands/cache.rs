use anyhow::Context;
use tstats::cache::{CacheStore, KEY_PREFIX};

use super::Stores;
use crate::args::CacheCommands;

pub(crate) fn cmd_cache(stores: &Stores, command: CacheCommands) -> anyhow::Result<()> {
    match command {
        CacheCommands::List => cmd_list(&stores.cache),
        CacheCommands::Clear => cmd_clear(&stores.cache),
    }
}

fn cmd_list(cache: &dyn CacheStore) -> anyhow::Result<()> {
    let entries = cache.list(KEY_PREFIX).context("Failed to read cache")?;
    if entries.is_empty() {
        println!("Cache is empty.");
        return Ok(());
    }
    for entry in entries {
        println!("{}  {}", entry.key, entry.value);
    }
    Ok(())
}

fn cmd_clear(cache: &dyn CacheStore) -> anyhow::Result<()> {
    let removed = cache.clear(KEY_PREFIX).context("Failed to clear cache")?;
    println!("Removed {removed} cached entr{}.", if removed == 1 { "y" } else { "ies" });
    Ok(())
}
