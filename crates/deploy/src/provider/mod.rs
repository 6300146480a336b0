//! JSON-RPC implementation of [`NetworkProvider`].

mod signer;

use std::time::Duration;

use alloy_core::primitives::{Address, Bytes, TxHash};
use anyhow::{Context, Result};
use serde::Deserialize;
use tokio::sync::Mutex;

pub use signer::{LegacyTx, LocalSigner};

use crate::{
    ArtifactStore, Blueprint, DeployedContract, NetworkConfig, NetworkProvider,
    PendingDeployment, TxOverrides, abi, rpc,
};

/// Default interval between two receipt or block polls.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// How creation transactions get signed.
#[derive(Debug)]
enum Sender {
    /// Signed locally and sent with `eth_sendRawTransaction`.
    Local(LocalSigner),
    /// Signed by the node (hardhat, anvil) and sent with `eth_sendTransaction`.
    Unlocked(Address),
}

impl Sender {
    fn address(&self) -> Address {
        match self {
            Sender::Local(signer) => signer.address(),
            Sender::Unlocked(address) => *address,
        }
    }
}

/// The subset of a transaction receipt the provider needs.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionReceipt {
    #[serde(deserialize_with = "rpc::deserialize_u64_from_hex")]
    block_number: u64,
    contract_address: Option<Address>,
    /// `0x1` on success, `0x0` on revert. Absent before Byzantium.
    status: Option<String>,
}

impl TransactionReceipt {
    fn reverted(&self) -> bool {
        self.status.as_deref() == Some("0x0")
    }
}

/// Number of confirmations of a transaction mined in `mined_block` when the chain head is `head`.
fn confirmations(head: u64, mined_block: u64) -> u64 {
    if head < mined_block {
        0
    } else {
        head - mined_block + 1
    }
}

/// Talks to a node over HTTP JSON-RPC and resolves blueprints from local artifacts.
pub struct JsonRpcProvider {
    client: reqwest::Client,
    network: NetworkConfig,
    chain_id: u64,
    sender: Sender,
    artifacts: ArtifactStore,
    poll_interval: Duration,
    /// Held from nonce lookup until the raw transaction is accepted, so
    /// concurrent submissions from one signer get distinct nonces.
    submission: Mutex<()>,
}

impl JsonRpcProvider {
    /// Connect to the network's RPC endpoint and pick the deployer account.
    ///
    /// Fails if the node's chain id differs from the configured one, or if no
    /// private key is configured and the node has no unlocked account.
    pub async fn connect(network: NetworkConfig, artifacts: ArtifactStore) -> Result<Self> {
        let client = rpc::create_client()?;
        let url = network.rpc_url.as_str();

        let chain_id: String = rpc::json_rpc_call(&client, url, "eth_chainId", vec![])
            .await
            .with_context(|| {
                format!("Failed to reach RPC endpoint of network `{}`", network.name)
            })?;
        let chain_id = rpc::parse_quantity(&chain_id)?;

        if network.chain_id.is_some_and(|expected| expected != chain_id) {
            anyhow::bail!(
                "Network `{}` expects chain id {}, but the RPC endpoint reports {}",
                network.name,
                network.chain_id.unwrap_or_default(),
                chain_id
            );
        }

        let sender = match &network.private_key {
            Some(private_key) => Sender::Local(
                LocalSigner::from_private_key(private_key).with_context(|| {
                    format!("Invalid private key for network `{}`", network.name)
                })?,
            ),
            None => {
                let accounts: Vec<Address> =
                    rpc::json_rpc_call(&client, url, "eth_accounts", vec![]).await?;
                let account = accounts.first().copied().with_context(|| {
                    format!(
                        "No private key configured for network `{}` \
                         and the node has no unlocked accounts",
                        network.name
                    )
                })?;
                Sender::Unlocked(account)
            }
        };

        tracing::info!(
            network = %network.name,
            chain_id,
            deployer = %sender.address(),
            "Connected to network"
        );

        Ok(Self {
            client,
            network,
            chain_id,
            sender,
            artifacts,
            poll_interval: DEFAULT_POLL_INTERVAL,
            submission: Mutex::new(()),
        })
    }

    /// Set the interval between receipt and block polls.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// The account that pays for deployments.
    pub fn deployer(&self) -> Address {
        self.sender.address()
    }

    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<serde_json::Value>,
    ) -> Result<T> {
        rpc::json_rpc_call(&self.client, self.network.rpc_url.as_str(), method, params).await
    }

    async fn nonce(&self, address: Address) -> Result<u64> {
        let nonce: String = self
            .call(
                "eth_getTransactionCount",
                vec![serde_json::json!(address), serde_json::json!("pending")],
            )
            .await
            .context("Failed to fetch deployer nonce")?;
        rpc::parse_quantity(&nonce)
    }

    async fn gas_price(&self) -> Result<u128> {
        let price: String = self
            .call("eth_gasPrice", vec![])
            .await
            .context("Failed to fetch gas price")?;
        let digits = price.strip_prefix("0x").unwrap_or(&price);
        u128::from_str_radix(digits, 16).with_context(|| format!("Invalid gas price: {}", price))
    }

    async fn estimate_gas(&self, from: Address, data: &Bytes) -> Result<u64> {
        let estimate: String = self
            .call(
                "eth_estimateGas",
                vec![serde_json::json!({ "from": from, "data": data })],
            )
            .await
            .context("Gas estimation failed, consider setting an explicit gas limit")?;
        rpc::parse_quantity(&estimate)
    }

    async fn block_number(&self) -> Result<u64> {
        let block: String = self.call("eth_blockNumber", vec![]).await?;
        rpc::parse_quantity(&block)
    }

    async fn receipt(&self, tx_hash: &TxHash) -> Result<Option<TransactionReceipt>> {
        self.call("eth_getTransactionReceipt", vec![serde_json::json!(tx_hash)])
            .await
            .with_context(|| format!("Failed to fetch receipt for {}", tx_hash))
    }
}

impl NetworkProvider for JsonRpcProvider {
    async fn resolve_blueprint(&self, name: &str) -> Result<Option<Blueprint>> {
        self.artifacts.find(name)
    }

    async fn submit(
        &self,
        blueprint: &Blueprint,
        args: &[String],
        overrides: &TxOverrides,
    ) -> Result<PendingDeployment> {
        let encoded_args = abi::encode_constructor_args(&blueprint.abi, args)?;
        let data = abi::creation_code(&blueprint.bytecode, &encoded_args);
        let from = self.sender.address();

        let gas_limit = match overrides.gas_limit {
            Some(gas_limit) => gas_limit,
            None => self.estimate_gas(from, &data).await?,
        };
        let gas_price = match overrides.gas_price {
            Some(gas_price) => u128::from(gas_price),
            None => self.gas_price().await?,
        };

        tracing::debug!(
            contract = %blueprint.name,
            from = %from,
            gas_limit,
            gas_price,
            code_size = data.len(),
            "Submitting creation transaction"
        );

        let tx_hash: TxHash = match &self.sender {
            Sender::Local(signer) => {
                let _guard = self.submission.lock().await;
                let nonce = self.nonce(from).await?;
                let tx = LegacyTx::create(nonce, gas_price, gas_limit, data);
                let raw = signer.sign_legacy(&tx, self.chain_id)?;
                self.call("eth_sendRawTransaction", vec![serde_json::json!(raw)])
                    .await?
            }
            Sender::Unlocked(_) => {
                self.call(
                    "eth_sendTransaction",
                    vec![serde_json::json!({
                        "from": from,
                        "data": data,
                        "gas": rpc::quantity(gas_limit),
                        "gasPrice": format!("0x{:x}", gas_price),
                    })],
                )
                .await?
            }
        };

        tracing::info!(
            contract = %blueprint.name,
            tx_hash = %tx_hash,
            network = %self.network.name,
            "Creation transaction sent"
        );

        Ok(PendingDeployment {
            contract: blueprint.name.clone(),
            tx_hash,
        })
    }

    async fn await_deployed(&self, pending: &PendingDeployment) -> Result<DeployedContract> {
        let receipt = rpc::poll_until("transaction receipt", self.poll_interval, || {
            self.receipt(&pending.tx_hash)
        })
        .await?;

        if receipt.reverted() {
            anyhow::bail!(
                "Creation transaction {} for `{}` reverted in block {}",
                pending.tx_hash,
                pending.contract,
                receipt.block_number
            );
        }

        let address = receipt
            .contract_address
            .context("Receipt has no contract address, the transaction was not a creation")?;

        let code: Bytes = self
            .call(
                "eth_getCode",
                vec![serde_json::json!(address), serde_json::json!("latest")],
            )
            .await?;
        if code.is_empty() {
            anyhow::bail!("No code deployed at {}", address);
        }

        Ok(DeployedContract {
            address,
            tx_hash: pending.tx_hash,
            block_number: receipt.block_number,
        })
    }

    async fn await_confirmations(&self, tx_hash: &TxHash, count: u64) -> Result<()> {
        rpc::poll_until("confirmations", self.poll_interval, || async move {
            // Re-read the receipt on every poll: a reorg can move or drop it.
            let Some(receipt) = self.receipt(tx_hash).await? else {
                tracing::debug!(
                    tx_hash = %tx_hash,
                    "Receipt not available, waiting for inclusion"
                );
                return Ok(None);
            };

            let head = self.block_number().await?;
            let current = confirmations(head, receipt.block_number);
            tracing::debug!(
                tx_hash = %tx_hash,
                confirmations = current,
                target = count,
                "Waiting for confirmations"
            );

            Ok((current >= count).then_some(()))
        })
        .await
    }
}
