//! Tables printed at the end of a command.

use comfy_table::{Table, presets::UTF8_FULL_CONDENSED};
use shipwright_deploy::{DeploymentResult, KnownNetwork, NetworkConfig, ShipwrightConfig};

/// Where a network's settings come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "kebab-case")]
enum NetworkOrigin {
    Preset,
    Config,
    /// A preset with some fields overridden in the config.
    Customized,
}

fn origin(name: &str, config: &ShipwrightConfig) -> NetworkOrigin {
    let preset = name.parse::<KnownNetwork>().is_ok();
    match (preset, config.networks.contains_key(name)) {
        (true, true) => NetworkOrigin::Customized,
        (true, false) => NetworkOrigin::Preset,
        (false, _) => NetworkOrigin::Config,
    }
}

fn table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED).set_header(header.to_vec());
    table
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

fn network_row(network: &NetworkConfig, origin: NetworkOrigin, local: bool) -> Vec<String> {
    vec![
        network.name.clone(),
        network
            .chain_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string()),
        network.rpc_url.to_string(),
        network
            .explorer
            .as_ref()
            .map(|e| e.api_url.to_string())
            .unwrap_or_else(|| "-".to_string()),
        yes_no(local).to_string(),
        yes_no(network.private_key.is_some()).to_string(),
        origin.to_string(),
    ]
}

/// One row per resolvable network. Networks that fail to resolve are listed with the reason.
pub fn networks_table(config: &ShipwrightConfig) -> Table {
    let mut table = table(&[
        "Network", "Chain ID", "RPC URL", "Explorer API", "Local", "Key", "Source",
    ]);

    for name in config.network_names() {
        let local = config.orchestrator.local_networks.contains(&name);
        let origin = origin(&name, config);
        match config.network(&name) {
            Ok(network) => {
                table.add_row(network_row(&network, origin, local));
            }
            Err(err) => {
                table.add_row(vec![name, "-".to_string(), format!("unavailable: {}", err)]);
            }
        }
    }

    table
}

/// One row per successful deployment.
pub fn results_table(results: &[DeploymentResult]) -> Table {
    let mut table = table(&["Contract", "Address", "Transaction", "Verification"]);
    for result in results {
        table.add_row(vec![
            result.contract().to_string(),
            result.address().to_string(),
            result.tx_hash().to_string(),
            result.verification().to_string(),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use shipwright_deploy::NetworkEntry;

    #[test]
    fn test_network_origin() {
        let mut config = ShipwrightConfig::default();
        config.networks.insert(
            "sepolia".to_string(),
            NetworkEntry {
                rpc_url: Some("https://sepolia.example.org".to_string()),
                ..Default::default()
            },
        );
        config.networks.insert(
            "anvil".to_string(),
            NetworkEntry {
                rpc_url: Some("http://127.0.0.1:8546".to_string()),
                chain_id: Some(31337),
                ..Default::default()
            },
        );

        assert_eq!(origin("hardhat", &config), NetworkOrigin::Preset);
        assert_eq!(origin("sepolia", &config), NetworkOrigin::Customized);
        assert_eq!(origin("anvil", &config), NetworkOrigin::Config);
    }

    #[test]
    fn test_networks_table_lists_presets() {
        let rendered = networks_table(&ShipwrightConfig::default()).to_string();
        assert!(rendered.contains("hardhat"));
        assert!(rendered.contains("11155111"));
        assert!(rendered.contains("https://api.etherscan.io/v2/api"));
        // goerli has no public RPC preset
        assert!(rendered.contains("unavailable"));
    }
}
