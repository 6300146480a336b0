//! Configuration for the orchestrator and the networks it deploys to.
//!
//! Secrets (private keys, explorer API keys) only ever travel inside these
//! structs. Nothing in this crate reads the process environment.

use std::{collections::BTreeMap, fmt, path::PathBuf, str::FromStr, time::Duration};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::TxOverrides;

/// The default name for the shipwright configuration file.
pub const CONFIG_FILENAME: &str = "Shipwright.toml";

/// Confirmation depth required before verifying on a public network.
pub const DEFAULT_CONFIRMATIONS: u64 = 21;

/// Networks that exist only for a development session and have no explorer.
pub const DEFAULT_LOCAL_NETWORKS: &[&str] = &["hardhat", "localhost"];

/// Behaviour of the deployment pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// When `false`, the pipeline stops after reporting the deployed address.
    pub verify_after_deploy: bool,
    /// Network names (exact match) for which verification is skipped.
    pub local_networks: Vec<String>,
    /// Confirmations to wait for before verification.
    pub confirmations: u64,
    /// Upper bound for each confirmation wait. `None` waits indefinitely.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation_timeout_secs: Option<u64>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            verify_after_deploy: true,
            local_networks: DEFAULT_LOCAL_NETWORKS.iter().map(|n| n.to_string()).collect(),
            confirmations: DEFAULT_CONFIRMATIONS,
            confirmation_timeout_secs: None,
        }
    }
}

impl OrchestratorConfig {
    pub fn confirmation_timeout(&self) -> Option<Duration> {
        self.confirmation_timeout_secs.map(Duration::from_secs)
    }
}

/// Explorer status polling settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerSettings {
    /// Seconds between two verification status checks.
    pub poll_interval_secs: u64,
    /// Total number of status checks before giving up.
    pub max_polls: usize,
}

impl Default for ExplorerSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: 3,
            max_polls: 20,
        }
    }
}

impl ExplorerSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

/// Etherscan V2 API, serving every chain the explorer family indexes.
pub const ETHERSCAN_API_URL: &str = "https://api.etherscan.io/v2/api";

/// Networks with built-in defaults.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case")]
pub enum KnownNetwork {
    Hardhat,
    Localhost,
    Goerli,
    Sepolia,
    Mainnet,
    Polygon,
    /// BNB Smart Chain testnet.
    Binance,
}

impl KnownNetwork {
    pub fn chain_id(&self) -> u64 {
        match self {
            KnownNetwork::Hardhat | KnownNetwork::Localhost => 31337,
            KnownNetwork::Goerli => 5,
            KnownNetwork::Sepolia => 11155111,
            KnownNetwork::Mainnet => 1,
            KnownNetwork::Polygon => 137,
            KnownNetwork::Binance => 97,
        }
    }

    pub fn default_rpc_url(&self) -> Option<&'static str> {
        match self {
            KnownNetwork::Hardhat | KnownNetwork::Localhost => Some("http://127.0.0.1:8545"),
            KnownNetwork::Goerli => None,
            KnownNetwork::Sepolia => Some("https://ethereum-sepolia-rpc.publicnode.com"),
            KnownNetwork::Mainnet => Some("https://ethereum-rpc.publicnode.com"),
            KnownNetwork::Polygon => Some("https://polygon-bor-rpc.publicnode.com"),
            KnownNetwork::Binance => Some("https://bsc-testnet-rpc.publicnode.com"),
        }
    }

    /// Public networks share the multichain Etherscan endpoint, which selects
    /// the chain from the `chainid` parameter.
    pub fn explorer_api_url(&self) -> Option<&'static str> {
        match self {
            KnownNetwork::Hardhat | KnownNetwork::Localhost => None,
            KnownNetwork::Goerli
            | KnownNetwork::Sepolia
            | KnownNetwork::Mainnet
            | KnownNetwork::Polygon
            | KnownNetwork::Binance => Some(ETHERSCAN_API_URL),
        }
    }
}

/// A network entry as written in the configuration file.
///
/// Every field is optional: unset fields fall back to the [`KnownNetwork`]
/// preset of the same name.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rpc_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
    /// Hex private key of the deployer. Unlocked node accounts are used when unset.
    #[serde(skip_serializing)]
    pub private_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explorer_api_url: Option<String>,
    #[serde(skip_serializing)]
    pub explorer_api_key: Option<String>,
}

impl fmt::Debug for NetworkEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkEntry")
            .field("rpc_url", &self.rpc_url)
            .field("chain_id", &self.chain_id)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("explorer_api_url", &self.explorer_api_url)
            .field(
                "explorer_api_key",
                &self.explorer_api_key.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Explorer endpoint for a network.
#[derive(Clone, PartialEq, Eq)]
pub struct ExplorerConfig {
    pub api_url: Url,
    pub api_key: Option<String>,
}

impl fmt::Debug for ExplorerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExplorerConfig")
            .field("api_url", &self.api_url.as_str())
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Fully resolved network configuration, injected into the provider and verifier.
#[derive(Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    pub name: String,
    pub rpc_url: Url,
    /// Expected chain id. Checked against the node when set.
    pub chain_id: Option<u64>,
    pub private_key: Option<String>,
    pub explorer: Option<ExplorerConfig>,
}

impl fmt::Debug for NetworkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkConfig")
            .field("name", &self.name)
            .field("rpc_url", &self.rpc_url.as_str())
            .field("chain_id", &self.chain_id)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("explorer", &self.explorer)
            .finish()
    }
}

impl NetworkConfig {
    /// Merge a configuration entry over the preset of the same name.
    pub fn resolve(name: &str, entry: Option<&NetworkEntry>) -> Result<Self> {
        let preset = KnownNetwork::from_str(name).ok();

        if preset.is_none() && entry.is_none() {
            anyhow::bail!(
                "Unknown network `{}`: add a [networks.{}] section to {}",
                name,
                name,
                CONFIG_FILENAME
            );
        }

        let entry = entry.cloned().unwrap_or_default();

        let rpc_url = entry
            .rpc_url
            .or_else(|| preset.and_then(|p| p.default_rpc_url()).map(String::from))
            .with_context(|| {
                format!(
                    "No RPC URL configured for network `{}` (networks.{}.rpc_url)",
                    name, name
                )
            })?;
        let rpc_url = Url::parse(&rpc_url)
            .with_context(|| format!("Invalid RPC URL for network `{}`", name))?;

        let explorer_api_url = entry
            .explorer_api_url
            .or_else(|| preset.and_then(|p| p.explorer_api_url()).map(String::from));

        let explorer = explorer_api_url
            .map(|url| {
                Url::parse(&url)
                    .with_context(|| format!("Invalid explorer URL for network `{}`", name))
                    .map(|api_url| ExplorerConfig {
                        api_url,
                        api_key: entry.explorer_api_key.clone(),
                    })
            })
            .transpose()?;

        Ok(Self {
            name: name.to_string(),
            rpc_url,
            chain_id: entry.chain_id.or_else(|| preset.map(|p| p.chain_id())),
            private_key: entry.private_key,
            explorer,
        })
    }
}

/// One step of a deployment plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedDeployment {
    pub contract: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(flatten)]
    pub overrides: TxOverrides,
}

/// Contents of `Shipwright.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipwrightConfig {
    /// Path to the compilation artifacts directory.
    #[serde(default = "default_artifacts")]
    pub artifacts: PathBuf,
    #[serde(flatten)]
    pub orchestrator: OrchestratorConfig,
    #[serde(default)]
    pub explorer: ExplorerSettings,
    #[serde(default)]
    pub networks: BTreeMap<String, NetworkEntry>,
    /// Contracts deployed in order by `shipwright run`.
    #[serde(default)]
    pub deployments: Vec<PlannedDeployment>,
}

fn default_artifacts() -> PathBuf {
    PathBuf::from("artifacts")
}

impl Default for ShipwrightConfig {
    fn default() -> Self {
        Self {
            artifacts: default_artifacts(),
            orchestrator: OrchestratorConfig::default(),
            explorer: ExplorerSettings::default(),
            networks: BTreeMap::new(),
            deployments: Vec::new(),
        }
    }
}

impl ShipwrightConfig {
    /// Resolve a network by name.
    pub fn network(&self, name: &str) -> Result<NetworkConfig> {
        NetworkConfig::resolve(name, self.networks.get(name))
    }

    /// Every network name that can be resolved: presets first, then configured ones.
    pub fn network_names(&self) -> Vec<String> {
        use strum::IntoEnumIterator;

        let mut names: Vec<String> = KnownNetwork::iter().map(|n| n.to_string()).collect();
        for name in self.networks.keys() {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        names
    }

    /// Save the configuration to a TOML file. Secrets are never written.
    pub fn save_to_file(&self, path: &PathBuf) -> Result<()> {
        let content =
            toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;
        std::fs::write(path, content)
            .context(format!("Failed to write config to {}", path.display()))?;
        tracing::info!(path = %path.display(), "Configuration saved");
        Ok(())
    }
}
