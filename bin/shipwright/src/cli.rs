use std::path::PathBuf;

use clap::{Parser, Subcommand};
use shipwright_deploy::{Address, CONFIG_FILENAME, DeploymentRequest, TxOverrides};
use tracing::level_filters::LevelFilter;

/// The network used when none is given, as with a bare hardhat project.
const DEFAULT_NETWORK: &str = "hardhat";

#[derive(Parser)]
#[command(name = "shipwright")]
#[command(
    author,
    version,
    about = "Deploy compiled contracts and verify their sources on block explorers"
)]
pub struct Cli {
    /// The verbosity level.
    #[arg(
        short,
        long,
        global = true,
        env = "SHIPWRIGHT_VERBOSITY",
        default_value_t = LevelFilter::INFO
    )]
    pub verbosity: LevelFilter,

    /// Path to the configuration file.
    ///
    /// A missing file is not an error: built-in network presets and
    /// `SHIPWRIGHT_*` environment variables still apply.
    #[arg(
        long,
        alias = "conf",
        global = true,
        env = "SHIPWRIGHT_CONFIG",
        default_value = CONFIG_FILENAME
    )]
    pub config: PathBuf,

    /// Path to the compilation artifacts directory. Overrides `artifacts` from the config.
    #[arg(long, global = true)]
    pub artifacts: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Deploy a contract, then verify it unless the network is local.
    Deploy(DeployArgs),

    /// Verify an already deployed contract.
    ///
    /// Use this when a deployment succeeded but its verification failed.
    Verify(VerifyArgs),

    /// Deploy every contract of the `[[deployments]]` plan, in order.
    Run(RunArgs),

    /// List the networks that can be deployed to.
    Networks,

    /// Write a default configuration file.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Clone, clap::Args)]
pub struct NetworkArg {
    /// The network to deploy to, a built-in preset or a `[networks.<name>]` entry.
    #[arg(short, long, env = "SHIPWRIGHT_NETWORK", default_value = DEFAULT_NETWORK)]
    pub network: String,
}

#[derive(Debug, Clone, clap::Args)]
pub struct DeployArgs {
    /// The contract name, or `<source>:<name>` when the name is ambiguous.
    pub contract: String,

    /// Constructor arguments, in declaration order.
    pub args: Vec<String>,

    #[command(flatten)]
    pub network: NetworkArg,

    /// Gas limit for the creation transaction. Estimated when not provided.
    #[arg(long)]
    pub gas_limit: Option<u64>,

    /// Gas price in wei. Queried from the node when not provided.
    #[arg(long)]
    pub gas_price: Option<u64>,

    /// Skip source verification.
    #[arg(long)]
    pub no_verify: bool,

    /// Upper bound in seconds for each confirmation wait.
    #[arg(long)]
    pub confirmation_timeout: Option<u64>,
}

impl DeployArgs {
    pub fn request(&self) -> DeploymentRequest {
        let mut overrides = TxOverrides::default();
        if let Some(gas_limit) = self.gas_limit {
            overrides = overrides.with_gas_limit(gas_limit);
        }
        if let Some(gas_price) = self.gas_price {
            overrides = overrides.with_gas_price(gas_price);
        }

        DeploymentRequest::new(&self.contract, &self.args).with_overrides(overrides)
    }
}

#[derive(Debug, Clone, clap::Args)]
pub struct VerifyArgs {
    /// The contract name, or `<source>:<name>`.
    pub contract: String,

    /// Address the contract is deployed at.
    pub address: Address,

    /// The constructor arguments the contract was deployed with.
    pub args: Vec<String>,

    #[command(flatten)]
    pub network: NetworkArg,
}

#[derive(Debug, Clone, clap::Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub network: NetworkArg,

    /// Skip source verification.
    #[arg(long)]
    pub no_verify: bool,

    /// Upper bound in seconds for each confirmation wait.
    #[arg(long)]
    pub confirmation_timeout: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_deploy() {
        let cli = Cli::try_parse_from([
            "shipwright",
            "deploy",
            "Purchase",
            "0x07865c6E87B9F70255377e024ace6630C1Eaa37F",
            "20000000000000000000",
            "--network",
            "sepolia",
            "--gas-limit",
            "6000000",
        ])
        .unwrap();

        let Command::Deploy(args) = cli.command else {
            panic!("expected deploy");
        };
        assert_eq!(args.network.network, "sepolia");
        assert!(!args.no_verify);

        let request = args.request();
        assert_eq!(request.contract(), "Purchase");
        assert_eq!(request.constructor_args().len(), 2);
        assert_eq!(request.overrides().gas_limit, Some(6_000_000));
        assert_eq!(request.overrides().gas_price, None);
    }

    #[test]
    fn test_parse_verify_requires_address() {
        let cli = Cli::try_parse_from([
            "shipwright",
            "verify",
            "CBDToken",
            "0x5FbDB2315678afecb367f032d93F642f64180aa3",
            "CBD",
            "CBD",
            "-n",
            "goerli",
        ])
        .unwrap();

        let Command::Verify(args) = cli.command else {
            panic!("expected verify");
        };
        assert_eq!(args.args, vec!["CBD", "CBD"]);
        assert_eq!(args.network.network, "goerli");

        let invalid = Cli::try_parse_from(["shipwright", "verify", "CBDToken", "not-an-address"]);
        assert!(invalid.is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "shipwright",
            "networks",
            "--artifacts",
            "out/artifacts",
            "-v",
            "debug",
        ])
        .unwrap();

        assert_eq!(cli.artifacts, Some(PathBuf::from("out/artifacts")));
        assert_eq!(cli.verbosity, LevelFilter::DEBUG);
        assert!(matches!(cli.command, Command::Networks));
    }
}
