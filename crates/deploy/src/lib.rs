//! shipwright-deploy - Contract deployment and source verification.
//!
//! This crate deploys compiled contracts to EVM networks, waits for the
//! creation transaction to be buried deep enough, and publishes the contract
//! source to an Etherscan-compatible explorer. Local development networks
//! skip verification.
//!
//! The [`Orchestrator`] only sees two capabilities, [`NetworkProvider`] and
//! [`VerificationService`]. [`JsonRpcProvider`] and [`EtherscanVerifier`] are
//! the implementations used by the `shipwright` binary.

pub use alloy_core::primitives::{Address, TxHash};

pub mod abi;
pub mod rpc;

mod artifacts;
pub use artifacts::{ArtifactStore, Blueprint, BuildInfo};

pub mod config;
pub use config::{
    CONFIG_FILENAME, DEFAULT_CONFIRMATIONS, DEFAULT_LOCAL_NETWORKS, ETHERSCAN_API_URL,
    ExplorerConfig, ExplorerSettings, KnownNetwork, NetworkConfig, NetworkEntry,
    OrchestratorConfig, PlannedDeployment, ShipwrightConfig,
};

mod error;
pub use error::{DeploymentError, WaitStage};

mod orchestrator;
pub use orchestrator::Orchestrator;

mod provider;
pub use provider::{JsonRpcProvider, LegacyTx, LocalSigner};

mod traits;
pub use traits::{NetworkProvider, VerificationService};

mod types;
pub use types::{
    DeployedContract, DeploymentRequest, DeploymentResult, NetworkContext, PendingDeployment,
    TxOverrides, VerificationStatus,
};

mod verify;
pub use verify::EtherscanVerifier;

#[cfg(test)]
mod test_utils;
