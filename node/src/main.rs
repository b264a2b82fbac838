use anyhow::Error;
use clap::Parser;
use common::{
    execution_layer::{ExecutionLayer, config::ExecutionLayerConfig},
    utils::{
        self as common_utils,
        config::{Config, ConfigTrait},
    },
};
use conformance::{ConformanceChecker, RuleVariant};
use std::process::ExitCode;
use tracing::{error, info};

/// Checks that a block follows exactly one side of the Canyon upgrade for its base fee
/// and its receipts root.
///
/// Flags override environment variables, which override the defaults.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Block height to check [env: BLOCK_NUMBER, default: 111253022]
    #[arg(long)]
    number: Option<u64>,
    /// EIP-1559 elasticity, 6 on mainnet and sepolia, 10 on goerli [env: EIP1559_ELASTICITY, default: 6]
    #[arg(long)]
    elasticity: Option<u64>,
    /// Whether the block is expected to follow pre-upgrade rules [env: PRE_UPGRADE, default: true]
    #[arg(long = "pre-upgrade", value_name = "BOOL")]
    pre_upgrade: Option<bool>,
    /// JSON-RPC endpoint, http(s) or ws(s) [env: RPC_URL, default: https://mainnet.optimism.io]
    #[arg(long = "rpc-url", value_name = "URL")]
    rpc_url: Option<String>,
}

impl Args {
    fn apply(self, config: &mut Config) {
        if let Some(number) = self.number {
            config.block_number = number;
        }
        if let Some(elasticity) = self.elasticity {
            config.elasticity = elasticity;
        }
        if let Some(pre_upgrade) = self.pre_upgrade {
            config.pre_upgrade = pre_upgrade;
        }
        if let Some(rpc_url) = self.rpc_url {
            config.rpc_url = rpc_url;
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    common_utils::logging::init_logging();

    info!("🔎 Starting upgrade-check v{}", env!("CARGO_PKG_VERSION"));

    match run(args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            error!("Check could not complete: {:#}", e);
            ExitCode::from(2)
        }
    }
}

/// Returns whether the block conforms to the assumed rules.
async fn run(args: Args) -> Result<bool, Error> {
    let mut config = Config::read_env_variables()
        .map_err(|e| anyhow::anyhow!("Failed to read configuration: {}", e))?;
    args.apply(&mut config);
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;
    info!("Configuration:\n{}", config);

    let execution_layer = ExecutionLayer::connect(&ExecutionLayerConfig::from(&config)).await?;

    let assumed = RuleVariant::from_pre_upgrade(config.pre_upgrade);
    let report = ConformanceChecker::new(execution_layer, config.elasticity)
        .run(config.block_number, assumed)
        .await?;

    for failure in &report.failures {
        error!("❌ {}", failure);
    }
    if report.is_conformant() {
        info!(
            "✅ Block {} is valid as {} and invalid as {}",
            report.number,
            report.assumed,
            report.assumed.opposite()
        );
    }
    Ok(report.is_conformant())
}
