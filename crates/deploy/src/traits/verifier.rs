//! Source verification capability.

use std::future::Future;

use alloy_core::primitives::Address;
use anyhow::Result;

/// Publishes a deployed contract's source to a block explorer.
pub trait VerificationService: Send + Sync {
    /// Verify `contract` at `address`, built with `constructor_args`.
    ///
    /// The arguments must be the exact values the contract was deployed with.
    fn verify(
        &self,
        address: Address,
        contract: &str,
        constructor_args: &[String],
    ) -> impl Future<Output = Result<()>> + Send;
}
