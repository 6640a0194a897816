use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::core::errors::{KeysyncError, Result};
use crate::core::models::inventory::{KeyInventory, Side};
use crate::core::models::key_record::KeyRecord;
use crate::core::traits::inventory_provider::InventoryProvider;

/// Keystores listing path on the remote signer (keymanager API).
const KEYSTORES_PATH: &str = "/eth/v1/keystores";

/// Reads the authoritative key inventory from a web3signer-style
/// custodian over HTTP.
pub struct HttpCustodian {
    client: reqwest::Client,
    url: String,
}

impl HttpCustodian {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("keysync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| KeysyncError::InvalidConfig {
                detail: format!("failed to create HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            url: format!("{}{KEYSTORES_PATH}", base_url.trim_end_matches('/')),
        })
    }

    fn fetch_error(&self, reason: String) -> KeysyncError {
        KeysyncError::Fetch {
            side: Side::Custodian,
            reason,
        }
    }
}

/// Response of the custodian's keystores listing.
///
/// Only `validating_pubkey` feeds the inventory; a missing `data`
/// field or a record without a pubkey is a parse failure, never an
/// empty default.
#[derive(Debug, Deserialize)]
struct KeystoreListing {
    data: Vec<KeystoreEntry>,
}

#[derive(Debug, Deserialize)]
struct KeystoreEntry {
    validating_pubkey: String,
    readonly: bool,
}

#[async_trait]
impl InventoryProvider for HttpCustodian {
    async fn fetch(&self) -> Result<KeyInventory> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| self.fetch_error(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(self.fetch_error(format!(
                "endpoint returned status {}",
                response.status()
            )));
        }

        let listing: KeystoreListing = response
            .json()
            .await
            .map_err(|e| self.fetch_error(format!("malformed listing: {e}")))?;

        Ok(KeyInventory::from_records(listing.data.into_iter().map(
            |entry| KeyRecord {
                identifier: entry.validating_pubkey,
                source_url: None,
                readonly: entry.readonly,
            },
        )))
    }
}
