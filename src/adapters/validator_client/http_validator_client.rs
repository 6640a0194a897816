use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::errors::{KeysyncError, Result};
use crate::core::models::cycle_report::{MutationKind, MutationOutcome};
use crate::core::models::inventory::{KeyInventory, Side};
use crate::core::models::key_record::{KeyIdentifier, KeyRecord};
use crate::core::traits::inventory_provider::InventoryProvider;
use crate::core::traits::mutator::KeyMutator;

/// Remote-keys path on the validator client (keymanager API). Listing,
/// import and delete all live on this one resource.
const REMOTE_KEYS_PATH: &str = "/eth/v1/remotekeys";

/// Talks to the validator client's remote-keys API: lists the loaded
/// keys, and applies batched imports and deletions.
pub struct HttpValidatorClient {
    client: reqwest::Client,
    url: String,
    /// Custodian base URL, sent as the `url` of every imported key so
    /// the validator knows which signer to dial for it.
    signer_url: String,
}

impl HttpValidatorClient {
    pub fn new(base_url: &str, signer_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("keysync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| KeysyncError::InvalidConfig {
                detail: format!("failed to create HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            url: format!("{}{REMOTE_KEYS_PATH}", base_url.trim_end_matches('/')),
            signer_url: signer_url.trim_end_matches('/').to_string(),
        })
    }

    /// Turn a batched mutation response into per-key outcomes.
    ///
    /// The API reports one status entry per submitted key, in
    /// submission order. A response with a different entry count is
    /// malformed — there is no safe way to attribute its statuses.
    async fn collect_outcomes(
        operation: MutationKind,
        keys: &BTreeSet<KeyIdentifier>,
        response: reqwest::Response,
    ) -> Result<Vec<MutationOutcome>> {
        let mutation_error = |reason: String| KeysyncError::Mutation { operation, reason };

        if !response.status().is_success() {
            return Err(mutation_error(format!(
                "endpoint returned status {}",
                response.status()
            )));
        }

        let listing: StatusListing = response
            .json()
            .await
            .map_err(|e| mutation_error(format!("malformed response: {e}")))?;

        if listing.data.len() != keys.len() {
            return Err(mutation_error(format!(
                "response carries {} statuses for {} submitted keys",
                listing.data.len(),
                keys.len()
            )));
        }

        Ok(keys
            .iter()
            .zip(listing.data)
            .map(|(key, entry)| MutationOutcome {
                identifier: key.clone(),
                succeeded: !entry.status.eq_ignore_ascii_case("error"),
                message: entry.message,
            })
            .collect())
    }
}

/// Response of the client's remote-keys listing.
#[derive(Debug, Deserialize)]
struct RemoteKeyListing {
    data: Vec<RemoteKeyEntry>,
}

#[derive(Debug, Deserialize)]
struct RemoteKeyEntry {
    pubkey: String,
    #[serde(default)]
    url: Option<String>,
    readonly: bool,
}

/// Batched import request: one call, the full set.
#[derive(Debug, Serialize)]
struct ImportRequest<'a> {
    remote_keys: Vec<ImportKey<'a>>,
}

#[derive(Debug, Serialize)]
struct ImportKey<'a> {
    pubkey: &'a str,
    url: &'a str,
}

/// Batched delete request.
#[derive(Debug, Serialize)]
struct DeleteRequest<'a> {
    pubkeys: Vec<&'a str>,
}

/// Shared shape of import and delete responses: one entry per
/// submitted key, order-corresponding.
#[derive(Debug, Deserialize)]
struct StatusListing {
    data: Vec<StatusEntry>,
}

#[derive(Debug, Deserialize)]
struct StatusEntry {
    status: String,
    #[serde(default)]
    message: String,
}

#[async_trait]
impl InventoryProvider for HttpValidatorClient {
    async fn fetch(&self) -> Result<KeyInventory> {
        let fetch_error = |reason: String| KeysyncError::Fetch {
            side: Side::Client,
            reason,
        };

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| fetch_error(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(fetch_error(format!(
                "endpoint returned status {}",
                response.status()
            )));
        }

        let listing: RemoteKeyListing = response
            .json()
            .await
            .map_err(|e| fetch_error(format!("malformed listing: {e}")))?;

        Ok(KeyInventory::from_records(listing.data.into_iter().map(
            |entry| KeyRecord {
                identifier: entry.pubkey,
                source_url: entry.url.filter(|u| !u.is_empty()),
                readonly: entry.readonly,
            },
        )))
    }
}

#[async_trait]
impl KeyMutator for HttpValidatorClient {
    async fn apply_additions(
        &self,
        keys: &BTreeSet<KeyIdentifier>,
    ) -> Result<Vec<MutationOutcome>> {
        let request = ImportRequest {
            remote_keys: keys
                .iter()
                .map(|pubkey| ImportKey {
                    pubkey: pubkey.as_str(),
                    url: self.signer_url.as_str(),
                })
                .collect(),
        };

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| KeysyncError::Mutation {
                operation: MutationKind::Import,
                reason: format!("request failed: {e}"),
            })?;

        Self::collect_outcomes(MutationKind::Import, keys, response).await
    }

    async fn apply_removals(
        &self,
        keys: &BTreeSet<KeyIdentifier>,
    ) -> Result<Vec<MutationOutcome>> {
        let request = DeleteRequest {
            pubkeys: keys.iter().map(String::as_str).collect(),
        };

        let response = self
            .client
            .delete(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| KeysyncError::Mutation {
                operation: MutationKind::Delete,
                reason: format!("request failed: {e}"),
            })?;

        Self::collect_outcomes(MutationKind::Delete, keys, response).await
    }
}
