//! Failure taxonomy for a deployment run.

use std::time::Duration;

use alloy_core::primitives::Address;
use derive_more::Display;

/// Which confirmation wait a failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum WaitStage {
    /// Waiting for the creation transaction to be mined.
    #[display("deployment")]
    Deployment,
    /// Waiting for the given confirmation depth before verification.
    #[display("{_0} confirmations")]
    Depth(u64),
}

/// Errors returned by [`crate::Orchestrator`].
///
/// Every variant is terminal for the run. Variants raised after the creation
/// transaction was mined carry the live contract address, see
/// [`DeploymentError::deployed_address`].
#[derive(Debug, thiserror::Error)]
pub enum DeploymentError {
    #[error("contract `{contract}` not found in the compiled artifacts")]
    BlueprintNotFound { contract: String },

    #[error("failed to load blueprint for `{contract}`")]
    InvalidBlueprint {
        contract: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to submit creation transaction for `{contract}`")]
    Submission {
        contract: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("timed out after {timeout:?} waiting for {stage}")]
    ConfirmationTimeout {
        stage: WaitStage,
        address: Option<Address>,
        timeout: Duration,
    },

    #[error("failed while waiting for {stage}")]
    Confirmation {
        stage: WaitStage,
        address: Option<Address>,
        #[source]
        source: anyhow::Error,
    },

    #[error("contract `{contract}` is deployed at {address} but verification failed")]
    Verification {
        contract: String,
        address: Address,
        #[source]
        source: anyhow::Error,
    },

    #[error("network `{network}` is local and has no explorer to verify against")]
    LocalNetwork { network: String },
}

impl DeploymentError {
    /// The on-chain address, if the contract was deployed before the failure.
    ///
    /// `Some` means the contract is live and only verification needs to be
    /// re-run; `None` means the deployment itself did not complete.
    pub fn deployed_address(&self) -> Option<Address> {
        match self {
            Self::ConfirmationTimeout { address, .. } | Self::Confirmation { address, .. } => {
                *address
            }
            Self::Verification { address, .. } => Some(*address),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deployed_address_only_after_mining() {
        let address = Address::repeat_byte(0xaa);

        let err = DeploymentError::Submission {
            contract: "Purchase".to_string(),
            source: anyhow::anyhow!("insufficient funds"),
        };
        assert_eq!(err.deployed_address(), None);

        let err = DeploymentError::ConfirmationTimeout {
            stage: WaitStage::Deployment,
            address: None,
            timeout: Duration::from_secs(1),
        };
        assert_eq!(err.deployed_address(), None);

        let err = DeploymentError::ConfirmationTimeout {
            stage: WaitStage::Depth(21),
            address: Some(address),
            timeout: Duration::from_secs(1),
        };
        assert_eq!(err.deployed_address(), Some(address));

        let err = DeploymentError::Verification {
            contract: "Purchase".to_string(),
            address,
            source: anyhow::anyhow!("already verified"),
        };
        assert_eq!(err.deployed_address(), Some(address));
    }

    #[test]
    fn test_error_messages() {
        let err = DeploymentError::ConfirmationTimeout {
            stage: WaitStage::Depth(21),
            address: None,
            timeout: Duration::from_secs(5),
        };
        assert_eq!(err.to_string(), "timed out after 5s waiting for 21 confirmations");

        let err = DeploymentError::BlueprintNotFound {
            contract: "Nope".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "contract `Nope` not found in the compiled artifacts"
        );
    }
}
