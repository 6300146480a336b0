//! Network provider capability.

use std::future::Future;

use alloy_core::primitives::TxHash;
use anyhow::Result;

use crate::{Blueprint, DeployedContract, PendingDeployment, TxOverrides};

/// Submits contract creations and reports their confirmation depth.
///
/// Implementations own all RPC configuration (endpoint, keys, gas policy).
/// They must not assume that calls are serialized by the caller.
pub trait NetworkProvider: Send + Sync {
    /// Look up the compiled blueprint for a contract identifier.
    ///
    /// Returns `Ok(None)` when the identifier is unknown.
    fn resolve_blueprint(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<Blueprint>>> + Send;

    /// Submit a contract-creation transaction.
    fn submit(
        &self,
        blueprint: &Blueprint,
        args: &[String],
        overrides: &TxOverrides,
    ) -> impl Future<Output = Result<PendingDeployment>> + Send;

    /// Wait until the creation transaction is mined and the contract exists.
    fn await_deployed(
        &self,
        pending: &PendingDeployment,
    ) -> impl Future<Output = Result<DeployedContract>> + Send;

    /// Wait until the transaction has at least `count` confirmations.
    fn await_confirmations(
        &self,
        tx_hash: &TxHash,
        count: u64,
    ) -> impl Future<Output = Result<()>> + Send;
}
