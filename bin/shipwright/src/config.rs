//! Configuration loading: the config file, then `SHIPWRIGHT_*` environment
//! variables, then command line flags.

use std::path::Path;

use anyhow::{Context, Result};
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use shipwright_deploy::ShipwrightConfig;

/// Prefix of the environment variables merged over the config file.
///
/// Nested keys are separated by `__`, e.g.
/// `SHIPWRIGHT_NETWORKS__SEPOLIA__PRIVATE_KEY`.
const ENV_PREFIX: &str = "SHIPWRIGHT_";

/// Variables read by the command line parser rather than the config.
const CLI_ONLY_VARS: &[&str] = &["config", "verbosity", "network"];

fn figment(path: &Path) -> Figment {
    Figment::new().merge(Toml::file(path)).merge(
        Env::prefixed(ENV_PREFIX)
            .ignore(CLI_ONLY_VARS)
            .split("__"),
    )
}

/// Load the configuration. A missing file yields the defaults.
pub fn load(path: &Path) -> Result<ShipwrightConfig> {
    let config: ShipwrightConfig = figment(path)
        .extract()
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;

    tracing::debug!(
        path = %path.display(),
        file_found = path.exists(),
        networks = config.networks.len(),
        deployments = config.deployments.len(),
        "Configuration loaded"
    );

    Ok(config)
}

/// Flags that take precedence over the file and the environment.
#[derive(Debug, Default)]
pub struct Overrides {
    pub artifacts: Option<std::path::PathBuf>,
    pub no_verify: bool,
    pub confirmation_timeout: Option<u64>,
}

impl Overrides {
    pub fn apply(self, config: &mut ShipwrightConfig) {
        if let Some(artifacts) = self.artifacts {
            config.artifacts = artifacts;
        }
        if self.no_verify {
            config.orchestrator.verify_after_deploy = false;
        }
        if let Some(secs) = self.confirmation_timeout {
            config.orchestrator.confirmation_timeout_secs = Some(secs);
        }
    }
}
