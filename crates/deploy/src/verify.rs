//! Source verification against Etherscan-compatible explorers
//! (etherscan, polygonscan, bscscan).

use alloy_core::primitives::Address;
use anyhow::{Context, Result};
use backon::{ConstantBuilder, Retryable};
use serde::Deserialize;

use crate::{
    ArtifactStore, ExplorerConfig, NetworkConfig, VerificationService, abi,
    config::ExplorerSettings,
};

/// Returned by the explorer while a submission waits in its queue.
#[derive(Debug, thiserror::Error)]
#[error("verification is still pending")]
struct StillPending;

/// Envelope of every explorer API response.
#[derive(Debug, Deserialize)]
struct ExplorerResponse {
    status: String,
    #[serde(default)]
    message: String,
    result: String,
}

/// Outcome of a status check.
#[derive(Debug, PartialEq, Eq)]
enum VerificationState {
    Pending,
    Verified,
    Failed(String),
}

impl ExplorerResponse {
    fn state(&self) -> VerificationState {
        match self.result.as_str() {
            "Pending in queue" | "In progress" => VerificationState::Pending,
            "Pass - Verified" => VerificationState::Verified,
            other => VerificationState::Failed(other.to_string()),
        }
    }

    /// The submission GUID, or the explorer's rejection message.
    fn guid(self) -> Result<String> {
        if self.status != "1" {
            anyhow::bail!("Explorer rejected the verification request: {}", self.result);
        }
        Ok(self.result)
    }
}

/// Everything an explorer needs to rebuild and match the deployed bytecode.
struct VerificationRequest<'a> {
    address: Address,
    contract_name: String,
    compiler_version: String,
    source_code: String,
    constructor_args: String,
    api_key: &'a str,
}

impl VerificationRequest<'_> {
    fn form(&self) -> Vec<(&'static str, String)> {
        vec![
            ("apikey", self.api_key.to_string()),
            ("module", "contract".to_string()),
            ("action", "verifysourcecode".to_string()),
            ("contractaddress", self.address.to_string()),
            ("sourceCode", self.source_code.clone()),
            ("codeformat", "solidity-standard-json-input".to_string()),
            ("contractname", self.contract_name.clone()),
            ("compilerversion", self.compiler_version.clone()),
            // sic: the explorer API spells it this way
            ("constructorArguements", self.constructor_args.clone()),
        ]
    }
}

/// Verifies contracts through an explorer's `verifysourcecode` API.
pub struct EtherscanVerifier {
    client: reqwest::Client,
    network: String,
    /// Sent as `chainid` so multichain endpoints pick the right explorer.
    chain_id: Option<u64>,
    explorer: Option<ExplorerConfig>,
    artifacts: ArtifactStore,
    settings: ExplorerSettings,
}

impl EtherscanVerifier {
    /// Build a verifier for a network.
    ///
    /// Networks without an explorer are accepted; verification against them
    /// fails at call time.
    pub fn new(
        network: &NetworkConfig,
        artifacts: ArtifactStore,
        settings: ExplorerSettings,
    ) -> Result<Self> {
        Ok(Self {
            client: crate::rpc::create_client()?,
            network: network.name.clone(),
            chain_id: network.chain_id,
            explorer: network.explorer.clone(),
            artifacts,
            settings,
        })
    }

    fn explorer(&self) -> Result<(&ExplorerConfig, &str)> {
        let explorer = self.explorer.as_ref().with_context(|| {
            format!("No explorer API URL configured for network `{}`", self.network)
        })?;
        let api_key = explorer.api_key.as_deref().with_context(|| {
            format!(
                "No explorer API key configured for network `{}` (networks.{}.explorer_api_key)",
                self.network, self.network
            )
        })?;
        Ok((explorer, api_key))
    }

    fn chain_query(&self) -> Vec<(&'static str, String)> {
        self.chain_id
            .map(|id| ("chainid", id.to_string()))
            .into_iter()
            .collect()
    }

    async fn submit(
        &self,
        explorer: &ExplorerConfig,
        request: &VerificationRequest<'_>,
    ) -> Result<String> {
        let response: ExplorerResponse = self
            .client
            .post(explorer.api_url.clone())
            .query(&self.chain_query())
            .form(&request.form())
            .send()
            .await
            .context("Failed to send verification request")?
            .json()
            .await
            .context("Failed to parse verification response")?;

        tracing::debug!(
            status = %response.status,
            message = %response.message,
            "Verification request answered"
        );

        response.guid()
    }

    async fn check_status(
        &self,
        explorer: &ExplorerConfig,
        api_key: &str,
        guid: &str,
    ) -> Result<()> {
        let response: ExplorerResponse = self
            .client
            .get(explorer.api_url.clone())
            .query(&self.chain_query())
            .query(&[
                ("apikey", api_key),
                ("module", "contract"),
                ("action", "checkverifystatus"),
                ("guid", guid),
            ])
            .send()
            .await
            .context("Failed to query verification status")?
            .json()
            .await
            .context("Failed to parse verification status")?;

        match response.state() {
            VerificationState::Pending => Err(StillPending.into()),
            VerificationState::Verified => Ok(()),
            VerificationState::Failed(reason) => {
                anyhow::bail!("Explorer could not verify the contract: {}", reason)
            }
        }
    }
}

impl VerificationService for EtherscanVerifier {
    async fn verify(
        &self,
        address: Address,
        contract: &str,
        constructor_args: &[String],
    ) -> Result<()> {
        let (explorer, api_key) = self.explorer()?;

        let blueprint = self
            .artifacts
            .find(contract)?
            .with_context(|| {
                format!("Contract `{}` not found in the compiled artifacts", contract)
            })?;
        let build_info = self.artifacts.load_build_info(&blueprint)?;
        let encoded_args = abi::encode_constructor_args(&blueprint.abi, constructor_args)?;

        let request = VerificationRequest {
            address,
            contract_name: blueprint.fully_qualified_name(),
            compiler_version: format!("v{}", build_info.solc_long_version),
            source_code: serde_json::to_string(&build_info.input)
                .context("Failed to serialize compiler input")?,
            constructor_args: hex::encode(&encoded_args),
            api_key,
        };

        let guid = self.submit(explorer, &request).await?;
        tracing::debug!(guid = %guid, address = %address, "Verification request accepted");

        let interval = self.settings.poll_interval();
        tokio::time::sleep(interval).await;

        // The first check is not a retry.
        let checks = self.settings.max_polls.max(1);
        (|| async { self.check_status(explorer, api_key, &guid).await })
            .retry(
                ConstantBuilder::default()
                    .with_delay(interval)
                    .with_max_times(checks - 1),
            )
            .when(|e: &anyhow::Error| e.is::<StillPending>())
            .notify(|_, delay| {
                tracing::debug!(guid = %guid, next_check_in = ?delay, "Verification pending");
            })
            .await
            .map_err(|e| {
                if e.is::<StillPending>() {
                    anyhow::anyhow!(
                        "Verification still pending after {} status checks (guid {})",
                        checks,
                        guid
                    )
                } else {
                    e
                }
            })
    }
}
