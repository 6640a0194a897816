use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::cli::Cli;
use crate::core::errors::{KeysyncError, Result};

/// Config file looked up in the working directory when `--config` is
/// not given. Optional: everything can come from flags and env vars.
pub const DEFAULT_CONFIG_FILE: &str = "keysync.toml";

pub const DEFAULT_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;

/// Custodian endpoints shipped with keysync. Extendable (and
/// overridable) through `[networks]` in keysync.toml.
const BUILTIN_NETWORKS: &[(&str, &str)] = &[
    ("mainnet", "https://web3signer.web3signer.dappnode"),
    ("prater", "https://web3signer.web3signer-prater.dappnode"),
];

/// Fully resolved runtime configuration.
///
/// Precedence: CLI flag > environment variable > keysync.toml > default.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub custodian_url: String,
    pub client_url: String,
    pub interval: Duration,
    pub http_timeout: Duration,
    /// When false, a cycle whose custodian listing came back empty
    /// withholds removals instead of wiping the client.
    pub allow_empty_custodian: bool,
}

impl AppConfig {
    pub fn resolve(cli: &Cli, interval_flag: Option<u64>) -> Result<Self> {
        let file = FileConfig::load(cli.config.as_deref())?;
        merge(
            cli.network.as_deref(),
            cli.custodian_url.as_deref(),
            cli.client_url.as_deref(),
            interval_flag,
            file,
        )
    }
}

fn merge(
    cli_network: Option<&str>,
    cli_custodian_url: Option<&str>,
    cli_client_url: Option<&str>,
    interval_flag: Option<u64>,
    file: FileConfig,
) -> Result<AppConfig> {
    let custodian_url = match cli_custodian_url
        .map(str::to_string)
        .or(file.keysync.custodian_url)
    {
        Some(url) => url,
        None => {
            let network = cli_network
                .map(str::to_string)
                .or(file.keysync.network)
                .ok_or_else(|| KeysyncError::InvalidConfig {
                    detail: "no custodian endpoint configured. \
                             Pass --custodian-url (or set CUSTODIAN_URL), \
                             or pick a preset with --network."
                        .into(),
                })?;
            resolve_network(&network, &file.networks)?
        }
    };

    let client_url = cli_client_url
        .map(str::to_string)
        .or(file.keysync.client_url)
        .ok_or_else(|| KeysyncError::InvalidConfig {
            detail: "no client endpoint configured. \
                     Pass --client-url or set CLIENT_URL."
                .into(),
        })?;

    validate_endpoint(&custodian_url, "custodian")?;
    validate_endpoint(&client_url, "client")?;

    let interval_secs = interval_flag
        .or(file.keysync.interval_secs)
        .unwrap_or(DEFAULT_INTERVAL_SECS);
    if interval_secs == 0 {
        return Err(KeysyncError::InvalidConfig {
            detail: "interval must be at least 1 second".into(),
        });
    }

    Ok(AppConfig {
        custodian_url,
        client_url,
        interval: Duration::from_secs(interval_secs),
        http_timeout: Duration::from_secs(
            file.keysync
                .http_timeout_secs
                .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
        ),
        allow_empty_custodian: file.keysync.allow_empty_custodian.unwrap_or(true),
    })
}

/// Look up a network preset, letting keysync.toml entries shadow the
/// built-in ones.
fn resolve_network(name: &str, file_networks: &BTreeMap<String, String>) -> Result<String> {
    if let Some(url) = file_networks.get(name) {
        return Ok(url.clone());
    }
    if let Some((_, url)) = BUILTIN_NETWORKS.iter().find(|(n, _)| *n == name) {
        return Ok((*url).to_string());
    }

    let mut available: Vec<&str> = BUILTIN_NETWORKS.iter().map(|(n, _)| *n).collect();
    available.extend(file_networks.keys().map(String::as_str));
    available.sort_unstable();
    available.dedup();

    Err(KeysyncError::UnknownNetwork {
        name: name.to_string(),
        available: available.join(", "),
    })
}

fn validate_endpoint(url: &str, what: &str) -> Result<()> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(KeysyncError::InvalidConfig {
            detail: format!("{what} endpoint '{url}' must start with http:// or https://"),
        })
    }
}

/// Raw `keysync.toml` contents. Every field is optional — the file
/// only fills gaps the CLI and environment left open.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    #[serde(default)]
    keysync: KeysyncSection,
    #[serde(default)]
    networks: BTreeMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
struct KeysyncSection {
    network: Option<String>,
    custodian_url: Option<String>,
    client_url: Option<String>,
    interval_secs: Option<u64>,
    http_timeout_secs: Option<u64>,
    allow_empty_custodian: Option<bool>,
}

impl FileConfig {
    fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let path = match explicit_path {
            Some(path) => {
                if !path.exists() {
                    return Err(KeysyncError::InvalidConfig {
                        detail: format!("config file not found: {}", path.display()),
                    });
                }
                path
            }
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };

        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| KeysyncError::InvalidConfig {
            detail: format!("failed to parse {}: {e}", path.display()),
        })
    }
}
