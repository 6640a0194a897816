use crate::cli::context;
use crate::cli::output;
use crate::cli::Cli;
use crate::config::app_config::AppConfig;
use crate::core::errors::Result;
use crate::core::services::reconciler::Reconciler;
use crate::core::traits::inventory_provider::InventoryProvider;

/// Execute the `keysync status` command.
///
/// A dry run: fetches both inventories, shows the delta a sync would
/// apply, and mutates nothing.
pub fn execute(cli: &Cli) -> Result<()> {
    let config = AppConfig::resolve(cli, None)?;
    let (custodian, client) = context::providers(&config)?;
    let rt = context::runtime()?;

    let (custodian_inventory, client_inventory) =
        rt.block_on(async { tokio::try_join!(custodian.fetch(), client.fetch()) })?;

    let delta = Reconciler.reconcile(&custodian_inventory, &client_inventory);

    output::header("🔑 keysync status");
    output::success(&format!(
        "Custodian: {} keys ({})",
        custodian_inventory.len(),
        config.custodian_url
    ));
    output::success(&format!(
        "Client:    {} keys ({})",
        client_inventory.len(),
        config.client_url
    ));

    if delta.is_empty() {
        output::success("Inventories are in sync — nothing to do");
        return Ok(());
    }

    if !delta.to_add.is_empty() {
        output::warning(&format!("Keys to add ({}):", delta.to_add.len()));
        for key in &delta.to_add {
            output::key(key);
        }
    }

    if !delta.to_remove.is_empty() {
        output::warning(&format!("Keys to remove ({}):", delta.to_remove.len()));
        for key in &delta.to_remove {
            output::key(key);
        }
    }

    println!();
    output::success("Dry run — nothing was changed. Run 'keysync sync' to reconcile.");
    Ok(())
}
