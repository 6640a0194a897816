use std::sync::Arc;

use crate::adapters::custodian::http_custodian::HttpCustodian;
use crate::adapters::validator_client::http_validator_client::HttpValidatorClient;
use crate::config::app_config::AppConfig;
use crate::core::errors::Result;
use crate::core::services::cycle::CycleService;
use crate::core::traits::inventory_provider::InventoryProvider;
use crate::core::traits::mutator::KeyMutator;

/// Build the two HTTP endpoints from resolved configuration.
pub fn providers(config: &AppConfig) -> Result<(HttpCustodian, HttpValidatorClient)> {
    let custodian = HttpCustodian::new(&config.custodian_url, config.http_timeout)?;
    let client = HttpValidatorClient::new(
        &config.client_url,
        &config.custodian_url,
        config.http_timeout,
    )?;
    Ok((custodian, client))
}

/// Wire a full cycle service: both providers plus the mutator, which
/// is the validator client wearing its write hat.
pub fn cycle_service(config: &AppConfig) -> Result<CycleService> {
    let (custodian, client) = providers(config)?;
    let client = Arc::new(client);
    Ok(CycleService::new(
        Arc::new(custodian),
        Arc::clone(&client) as Arc<dyn InventoryProvider>,
        client as Arc<dyn KeyMutator>,
        config.allow_empty_custodian,
    ))
}

/// Single-threaded runtime for driving the async cycle from a
/// synchronous command.
pub fn runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}
