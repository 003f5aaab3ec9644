//! Handler for the `blacklist` command.

use std::collections::BTreeSet;

use serde_json::json;

use crate::adapter::inbound::cli::command::BlacklistArgs;
use crate::adapter::inbound::cli::output;
use crate::domain::PairSymbol;
use crate::error::Result;
use crate::infrastructure::config::settings::Config;
use crate::infrastructure::orchestration::live_components;
use crate::infrastructure::sync::fetch_blacklist;

/// Print the store's blacklist next to the configured manual pairs.
pub async fn execute(args: &BlacklistArgs) -> Result<()> {
    let config = Config::load(&args.config)?;
    let (gateway, _) = live_components(&config)?;
    let remote: BTreeSet<PairSymbol> = fetch_blacklist(gateway.as_ref()).await?.into_iter().collect();
    let manual: BTreeSet<PairSymbol> = config.blacklist.manual.iter().cloned().collect();

    if output::is_json() {
        output::document(&json!({
            "command": "blacklist",
            "remote": remote,
            "manual": manual,
        }));
        return Ok(());
    }

    output::pairs("Store blacklist", &remote, |_| None);
    output::pairs("Manual blacklist", &manual, |pair| {
        Some(if remote.contains(pair) { "also in store" } else { "config only" })
    });
    Ok(())
}
