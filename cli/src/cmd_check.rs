//! `poolwatch check`: validate config and targets without touching the network.

use std::collections::BTreeMap;

use anyhow::{bail, Context, Result};

use poolwatch_core::{shared_cursor_conflicts, TargetLoader};
use poolwatch_rpc::client::redact_url;
use poolwatch_storage::CsvTargetLoader;

use crate::config::Config;

pub fn run(config: &Config) -> Result<()> {
    let targets = CsvTargetLoader::new(&config.targets.path)
        .load()
        .context("loading targets")?;
    let catalog = config.catalog();
    let registry = config.network_registry().context("building network registry")?;

    let mut per_network: BTreeMap<&str, usize> = BTreeMap::new();
    let mut problems = 0;
    for target in &targets {
        *per_network.entry(target.network.as_str()).or_default() += 1;
        if let Err(e) = catalog.topic_for(&target.event_name) {
            println!("  ✗ {} {} ({}): {e}", target.network, target.contract_address, target.exchange_label);
            problems += 1;
        }
    }
    for (first, later) in shared_cursor_conflicts(&targets) {
        println!(
            "  ✗ {} {}: {} shares a cursor with {} and will never fetch",
            later.network, later.contract_address, later.event_name, first.event_name
        );
        problems += 1;
    }

    println!("Networks:");
    for (network, count) in &per_network {
        match registry.endpoint(network) {
            Ok(endpoint) => {
                println!("  ✓ {network:<12} {count:>4} target(s)  {}", redact_url(&endpoint.url()))
            }
            Err(e) => {
                println!("  ✗ {network:<12} {count:>4} target(s)  {e}");
                problems += 1;
            }
        }
    }

    if problems > 0 {
        bail!("{problems} problem(s) in {} targets", targets.len());
    }
    println!("\n{} targets across {} networks look good.", targets.len(), per_network.len());
    Ok(())
}
