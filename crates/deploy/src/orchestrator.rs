//! Deploy-then-verify pipeline.

use std::{future::Future, time::Duration};

use alloy_core::primitives::Address;

use crate::{
    DeployedContract, DeploymentError, DeploymentRequest, DeploymentResult, NetworkContext,
    NetworkProvider, OrchestratorConfig, VerificationService, VerificationStatus, WaitStage,
};

/// Await `fut`, bounded by `timeout` when one is configured.
///
/// Failures are classified into [`DeploymentError::ConfirmationTimeout`] or
/// [`DeploymentError::Confirmation`] for the given stage.
async fn bounded_wait<T>(
    fut: impl Future<Output = anyhow::Result<T>>,
    timeout: Option<Duration>,
    stage: WaitStage,
    address: Option<Address>,
) -> Result<T, DeploymentError> {
    let result = match timeout {
        Some(timeout) => tokio::time::timeout(timeout, fut).await.map_err(|_| {
            DeploymentError::ConfirmationTimeout {
                stage,
                address,
                timeout,
            }
        })?,
        None => fut.await,
    };

    result.map_err(|source| DeploymentError::Confirmation {
        stage,
        address,
        source,
    })
}

/// Runs deployments against a [`NetworkProvider`] and publishes sources
/// through a [`VerificationService`].
///
/// Holds no per-deployment state: a single orchestrator can serve several
/// concurrent [`Orchestrator::deploy`] calls.
pub struct Orchestrator<P, V> {
    provider: P,
    verifier: V,
    config: OrchestratorConfig,
}

impl<P: NetworkProvider, V: VerificationService> Orchestrator<P, V> {
    pub fn new(provider: P, verifier: V, config: OrchestratorConfig) -> Self {
        Self {
            provider,
            verifier,
            config,
        }
    }

    /// Deploy one contract and, on public networks, verify its source.
    ///
    /// Steps run strictly in order: blueprint resolution, submission, wait for
    /// the contract to exist, network gate, wait for
    /// [`OrchestratorConfig::confirmations`], verification. Nothing is retried.
    /// Calling this twice with the same request deploys two contracts.
    pub async fn deploy(
        &self,
        request: &DeploymentRequest,
        network: &NetworkContext,
    ) -> Result<DeploymentResult, DeploymentError> {
        let contract = request.contract();

        let blueprint = match self.provider.resolve_blueprint(contract).await {
            Ok(Some(blueprint)) => blueprint,
            Ok(None) => {
                return Err(DeploymentError::BlueprintNotFound {
                    contract: contract.to_string(),
                });
            }
            Err(source) => {
                return Err(DeploymentError::InvalidBlueprint {
                    contract: contract.to_string(),
                    source,
                });
            }
        };

        tracing::debug!(
            contract,
            network = %network,
            args = ?request.constructor_args(),
            gas_limit = ?request.overrides().gas_limit,
            "Submitting deployment"
        );

        let pending = self
            .provider
            .submit(&blueprint, request.constructor_args(), request.overrides())
            .await
            .map_err(|source| DeploymentError::Submission {
                contract: contract.to_string(),
                source,
            })?;

        let deployed: DeployedContract = bounded_wait(
            self.provider.await_deployed(&pending),
            self.config.confirmation_timeout(),
            WaitStage::Deployment,
            None,
        )
        .await?;

        tracing::info!(
            tx_hash = %deployed.tx_hash,
            block = deployed.block_number,
            "{} contract deployed to {}",
            contract,
            deployed.address
        );

        if !self.config.verify_after_deploy {
            tracing::debug!(contract, "Verification disabled, skipping");
            return Ok(DeploymentResult::new(
                contract.to_string(),
                deployed,
                VerificationStatus::Disabled,
            ));
        }

        if network.is_local(&self.config.local_networks) {
            tracing::debug!(
                contract,
                network = %network,
                "Local network, skipping verification"
            );
            return Ok(DeploymentResult::new(
                contract.to_string(),
                deployed,
                VerificationStatus::SkippedLocalNetwork,
            ));
        }

        let depth = self.config.confirmations;
        tracing::debug!(
            contract,
            confirmations = depth,
            "Waiting for confirmations before verification"
        );
        bounded_wait(
            self.provider.await_confirmations(&deployed.tx_hash, depth),
            self.config.confirmation_timeout(),
            WaitStage::Depth(depth),
            Some(deployed.address),
        )
        .await?;

        self.verify(contract, deployed.address, request.constructor_args())
            .await?;

        Ok(DeploymentResult::new(
            contract.to_string(),
            deployed,
            VerificationStatus::Verified,
        ))
    }

    /// Verify a contract that is already deployed, without redeploying it.
    ///
    /// `constructor_args` must be the values the contract was deployed with.
    pub async fn verify_only(
        &self,
        contract: &str,
        address: Address,
        constructor_args: &[String],
        network: &NetworkContext,
    ) -> Result<(), DeploymentError> {
        if network.is_local(&self.config.local_networks) {
            return Err(DeploymentError::LocalNetwork {
                network: network.name().to_string(),
            });
        }

        self.verify(contract, address, constructor_args).await
    }

    async fn verify(
        &self,
        contract: &str,
        address: Address,
        constructor_args: &[String],
    ) -> Result<(), DeploymentError> {
        tracing::info!(contract, address = %address, "Verifying...");

        self.verifier
            .verify(address, contract, constructor_args)
            .await
            .map_err(|source| DeploymentError::Verification {
                contract: contract.to_string(),
                address,
                source,
            })?;

        tracing::info!(contract, address = %address, "Contract verified successfully!");
        Ok(())
    }
}
