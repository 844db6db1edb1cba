use anyhow::Context;
use tstats::debug::DebugReport;

use super::Stores;

pub(crate) fn cmd_debug(stores: &Stores) -> anyhow::Result<()> {
    print_report(stores)
}

pub(crate) fn print_report(stores: &Stores) -> anyhow::Result<()> {
    let report =
        DebugReport::collect(&stores.settings, &stores.cache).context("Failed to collect debug information")?;
    print!("{}", report.render());
    Ok(())
}
