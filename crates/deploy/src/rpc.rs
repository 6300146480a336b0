//! Shared RPC utilities for interacting with Ethereum JSON-RPC endpoints.

use std::{future::Future, time::Duration};

use anyhow::Context;
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;

/// Default timeout for a single RPC request.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Create an HTTP client configured for JSON-RPC requests.
pub fn create_client() -> Result<reqwest::Client, anyhow::Error> {
    reqwest::Client::builder()
        .timeout(DEFAULT_TIMEOUT)
        .build()
        .context("Failed to create HTTP client")
}

/// Make a JSON-RPC call and deserialize the result.
///
/// # Arguments
/// * `client` - The HTTP client to use
/// * `url` - The RPC endpoint URL
/// * `method` - The RPC method name
/// * `params` - The method parameters
///
/// # Returns
/// The deserialized result, or an error if the request failed or returned an error response.
pub async fn json_rpc_call<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
    method: &str,
    params: Vec<Value>,
) -> Result<T, anyhow::Error> {
    let response = client
        .post(url)
        .json(&serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        }))
        .send()
        .await
        .with_context(|| format!("Failed to send {} request", method))?;

    let result: Value = response
        .json()
        .await
        .with_context(|| format!("Failed to parse {} response", method))?;

    parse_response(method, result)
}

/// Extract the `result` of a JSON-RPC response, surfacing node errors verbatim.
fn parse_response<T: DeserializeOwned>(method: &str, response: Value) -> Result<T, anyhow::Error> {
    if let Some(error) = response.get("error") {
        anyhow::bail!(
            "RPC error: {}",
            error
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("unknown")
        );
    }

    let result_value = response
        .get("result")
        .context("No result in response")?
        .clone();

    serde_json::from_value(result_value)
        .with_context(|| format!("Failed to deserialize {} result", method))
}

/// Parse a hex quantity (`0x1a`) into a u64.
pub fn parse_quantity(value: &str) -> Result<u64, anyhow::Error> {
    let digits = value
        .strip_prefix("0x")
        .with_context(|| format!("Quantity must be 0x-prefixed: {}", value))?;
    u64::from_str_radix(digits, 16).with_context(|| format!("Invalid hex quantity: {}", value))
}

/// Encode a u64 as a hex quantity.
pub fn quantity(value: u64) -> String {
    format!("0x{:x}", value)
}

/// Deserialize a u64 from a hex string (with 0x prefix).
pub fn deserialize_u64_from_hex<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    parse_quantity(&s).map_err(serde::de::Error::custom)
}

/// Poll `check_fn` until it yields a value.
///
/// `check_fn` returns `Ok(None)` while the awaited condition does not hold
/// yet. Errors end the wait immediately. There is no deadline here: callers
/// that need one wrap the future in `tokio::time::timeout`.
pub async fn poll_until<T, F, Fut>(
    name: &str,
    interval: Duration,
    check_fn: F,
) -> Result<T, anyhow::Error>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<Option<T>, anyhow::Error>>,
{
    loop {
        if let Some(value) = check_fn().await? {
            return Ok(value);
        }

        tracing::trace!(condition = %name, "Condition not met yet, polling again...");

        tokio::time::sleep(interval).await;
    }
}
