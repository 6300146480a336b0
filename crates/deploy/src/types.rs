//! Transient values passed through a single deployment invocation.

use alloy_core::primitives::{Address, TxHash};
use derive_more::{Deref, Display};
use serde::{Deserialize, Serialize};

/// The network a deployment targets.
///
/// The label is only used for branching (local vs public network), never to
/// configure RPC access.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Deref, Serialize, Deserialize)]
pub struct NetworkContext(String);

impl NetworkContext {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    /// Exact, case-sensitive match against the set of local network names.
    pub fn is_local(&self, local_networks: &[String]) -> bool {
        local_networks.iter().any(|name| name == &self.0)
    }
}

impl From<&str> for NetworkContext {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for NetworkContext {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Optional overrides applied to the contract-creation transaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOverrides {
    /// Explicit gas ceiling. Skips gas estimation when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_limit: Option<u64>,
    /// Explicit gas price in wei.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<u64>,
}

impl TxOverrides {
    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = Some(gas_limit);
        self
    }

    pub fn with_gas_price(mut self, gas_price: u64) -> Self {
        self.gas_price = Some(gas_price);
        self
    }
}

/// Intent to deploy one contract instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentRequest {
    contract: String,
    constructor_args: Vec<String>,
    overrides: TxOverrides,
}

impl DeploymentRequest {
    pub fn new<I, S>(contract: impl Into<String>, constructor_args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            contract: contract.into(),
            constructor_args: constructor_args.into_iter().map(Into::into).collect(),
            overrides: TxOverrides::default(),
        }
    }

    pub fn with_overrides(mut self, overrides: TxOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn contract(&self) -> &str {
        &self.contract
    }

    /// Constructor arguments, in declaration order.
    pub fn constructor_args(&self) -> &[String] {
        &self.constructor_args
    }

    pub fn overrides(&self) -> &TxOverrides {
        &self.overrides
    }
}

/// A creation transaction accepted by the network but not yet mined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDeployment {
    pub contract: String,
    pub tx_hash: TxHash,
}

/// A mined creation transaction whose contract address is queryable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeployedContract {
    pub address: Address,
    pub tx_hash: TxHash,
    pub block_number: u64,
}

/// What happened to source verification for a deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum VerificationStatus {
    /// Verification was turned off for this run.
    #[display("disabled")]
    Disabled,
    /// The target is a local network without an explorer.
    #[display("skipped (local network)")]
    SkippedLocalNetwork,
    #[display("verified")]
    Verified,
}

/// Outcome of a successful deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentResult {
    contract: String,
    address: Address,
    tx_hash: TxHash,
    verification: VerificationStatus,
}

impl DeploymentResult {
    pub(crate) fn new(
        contract: String,
        deployed: DeployedContract,
        verification: VerificationStatus,
    ) -> Self {
        Self {
            contract,
            address: deployed.address,
            tx_hash: deployed.tx_hash,
            verification,
        }
    }

    pub fn contract(&self) -> &str {
        &self.contract
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn tx_hash(&self) -> TxHash {
        self.tx_hash
    }

    pub fn verification(&self) -> VerificationStatus {
        self.verification
    }
}
