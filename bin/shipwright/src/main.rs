//! shipwright deploys compiled contracts and publishes their sources to block explorers.

mod cli;
mod config;
mod report;

use std::collections::HashMap;

use anyhow::{Context, Result};
use clap::Parser;

use cli::{Cli, Command, DeployArgs, RunArgs, VerifyArgs};
use config::Overrides;
use shipwright_deploy::{
    Address, ArtifactStore, DeploymentError, DeploymentRequest, DeploymentResult,
    EtherscanVerifier, JsonRpcProvider, NetworkContext, Orchestrator, PlannedDeployment,
    ShipwrightConfig,
};

type LiveOrchestrator = Orchestrator<JsonRpcProvider, EtherscanVerifier>;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize the logger.
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .init();

    let mut config = config::load(&cli.config)?;

    match cli.command {
        Command::Deploy(args) => {
            Overrides {
                artifacts: cli.artifacts,
                no_verify: args.no_verify,
                confirmation_timeout: args.confirmation_timeout,
            }
            .apply(&mut config);
            deploy(config, args).await
        }
        Command::Verify(args) => {
            Overrides {
                artifacts: cli.artifacts,
                ..Default::default()
            }
            .apply(&mut config);
            verify(config, args).await
        }
        Command::Run(args) => {
            Overrides {
                artifacts: cli.artifacts,
                no_verify: args.no_verify,
                confirmation_timeout: args.confirmation_timeout,
            }
            .apply(&mut config);
            run(config, args).await
        }
        Command::Networks => {
            println!("{}", report::networks_table(&config));
            Ok(())
        }
        Command::Init { force } => {
            if cli.config.exists() && !force {
                anyhow::bail!(
                    "{} already exists, pass --force to overwrite it",
                    cli.config.display()
                );
            }
            config.save_to_file(&cli.config)
        }
    }
}

/// Connect to `network` and build an orchestrator over the live collaborators.
async fn orchestrator(config: ShipwrightConfig, network: &str) -> Result<LiveOrchestrator> {
    let network = config.network(network)?;
    let artifacts = ArtifactStore::new(&config.artifacts);

    let verifier = EtherscanVerifier::new(&network, artifacts.clone(), config.explorer)?;
    let provider = JsonRpcProvider::connect(network, artifacts).await?;

    Ok(Orchestrator::new(provider, verifier, config.orchestrator))
}

/// Quote `arg` for a POSIX shell when it is not a plain word.
fn shell_quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:,=@%+".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

/// The `shipwright verify` invocation that finishes a deployment of `request` at `address`.
fn verify_command(
    request: &DeploymentRequest,
    address: Address,
    network: &NetworkContext,
) -> String {
    let mut words = vec![
        "shipwright".to_string(),
        "verify".to_string(),
        shell_quote(request.contract()),
        address.to_string(),
    ];
    words.extend(request.constructor_args().iter().map(|arg| shell_quote(arg)));
    words.extend(["--network".to_string(), shell_quote(network)]);
    words.join(" ")
}

/// Turn a pipeline failure into an operator-facing error.
///
/// A failure after mining means the contract is live: redeploying would
/// create a second instance, so point at `shipwright verify` instead.
fn report_failure(
    err: DeploymentError,
    network: &NetworkContext,
    request: &DeploymentRequest,
) -> anyhow::Error {
    if let Some(address) = err.deployed_address() {
        tracing::error!(
            contract = request.contract(),
            address = %address,
            "Contract is deployed but was not verified"
        );
        eprintln!(
            "To retry verification only, run:\n  {}",
            verify_command(request, address, network)
        );
    }
    anyhow::Error::new(err)
}

async fn deploy(config: ShipwrightConfig, args: DeployArgs) -> Result<()> {
    let network = NetworkContext::new(&args.network.network);
    let request = args.request();
    let orchestrator = orchestrator(config, &network).await?;

    let result = orchestrator
        .deploy(&request, &network)
        .await
        .map_err(|err| report_failure(err, &network, &request))?;

    println!("{}", report::results_table(&[result]));
    Ok(())
}

async fn verify(config: ShipwrightConfig, args: VerifyArgs) -> Result<()> {
    let network = NetworkContext::new(&args.network.network);
    let orchestrator = orchestrator(config, &network).await?;

    orchestrator
        .verify_only(&args.contract, args.address, &args.args, &network)
        .await?;

    Ok(())
}

/// Substitute `$Name` arguments with the address `Name` was deployed to earlier in the run.
fn resolve_plan_args(
    step: &PlannedDeployment,
    deployed: &HashMap<String, Address>,
) -> Result<Vec<String>> {
    step.args
        .iter()
        .map(|arg| match arg.strip_prefix('$') {
            Some(name) => deployed
                .get(name)
                .map(|address| address.to_string())
                .with_context(|| {
                    format!(
                        "Argument `{}` of `{}` refers to a contract \
                         not deployed earlier in the plan",
                        arg, step.contract
                    )
                }),
            None => Ok(arg.clone()),
        })
        .collect()
}

async fn run(config: ShipwrightConfig, args: RunArgs) -> Result<()> {
    let plan = config.deployments.clone();
    if plan.is_empty() {
        anyhow::bail!("No [[deployments]] in the configuration, nothing to run");
    }

    let network = NetworkContext::new(&args.network.network);
    let orchestrator = orchestrator(config, &network).await?;

    let mut deployed = HashMap::new();
    let mut results: Vec<DeploymentResult> = Vec::with_capacity(plan.len());

    for (index, step) in plan.iter().enumerate() {
        tracing::info!(
            step = index + 1,
            total = plan.len(),
            contract = %step.contract,
            network = %network,
            "Deploying"
        );

        let request = DeploymentRequest::new(&step.contract, resolve_plan_args(step, &deployed)?)
            .with_overrides(step.overrides);

        match orchestrator.deploy(&request, &network).await {
            Ok(result) => {
                deployed.insert(result.contract().to_string(), result.address());
                results.push(result);
            }
            Err(err) => {
                if !results.is_empty() {
                    println!("{}", report::results_table(&results));
                }
                return Err(report_failure(err, &network, &request));
            }
        }
    }

    println!("{}", report::results_table(&results));
    Ok(())
}
