use anyhow::Error;
use std::{fmt, str::FromStr, time::Duration};
use tracing::warn;

pub trait ConfigTrait: Sized {
    fn read_env_variables() -> Result<Self, Error>;
}

#[derive(Debug, Clone)]
pub struct Config {
    pub rpc_url: String,
    pub block_number: u64,
    pub elasticity: u64,
    pub pre_upgrade: bool,
    pub rpc_dial_attempts: u64,
    pub rpc_dial_backoff: Duration,
    pub rpc_request_timeout: Duration,
}

impl ConfigTrait for Config {
    fn read_env_variables() -> Result<Self, Error> {
        // Load environment variables from .env file
        match dotenvy::dotenv() {
            Err(e) if !e.not_found() => warn!("Failed to load .env file: {}", e),
            _ => {}
        }

        Self::from_source(|key| std::env::var(key).ok())
    }
}

impl Config {
    /// Builds the configuration from an arbitrary key lookup, falling back to defaults
    /// for missing keys.
    pub fn from_source(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let rpc_url = lookup("RPC_URL").unwrap_or("https://mainnet.optimism.io".to_string());

        let block_number = parse_var(&lookup, "BLOCK_NUMBER", 111_253_022u64)?;

        // 6 on mainnet and sepolia, 10 on goerli
        let elasticity = parse_var(&lookup, "EIP1559_ELASTICITY", 6u64)?;

        let pre_upgrade = parse_var(&lookup, "PRE_UPGRADE", true)?;

        let rpc_dial_attempts = parse_var(&lookup, "RPC_DIAL_ATTEMPTS", 10u64)?;

        let rpc_dial_backoff =
            Duration::from_millis(parse_var(&lookup, "RPC_DIAL_BACKOFF_MS", 1000u64)?);

        let rpc_request_timeout =
            Duration::from_millis(parse_var(&lookup, "RPC_REQUEST_TIMEOUT_MS", 30_000u64)?);

        let config = Self {
            rpc_url,
            block_number,
            elasticity,
            pre_upgrade,
            rpc_dial_attempts,
            rpc_dial_backoff,
            rpc_request_timeout,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.elasticity == 0 {
            return Err(anyhow::anyhow!("EIP-1559 elasticity must be a positive number"));
        }
        if self.rpc_dial_attempts == 0 {
            return Err(anyhow::anyhow!("RPC_DIAL_ATTEMPTS must be a positive number"));
        }
        if self.rpc_url.is_empty() {
            return Err(anyhow::anyhow!("RPC URL must not be empty"));
        }
        Ok(())
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, Error>
where
    T::Err: fmt::Display,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Invalid value {value:?} for {key}: {e}")),
        None => Ok(default),
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "RPC URL: {}", self.rpc_url)?;
        writeln!(f, "Block number: {}", self.block_number)?;
        writeln!(f, "EIP-1559 elasticity: {}", self.elasticity)?;
        writeln!(f, "Assume pre-upgrade: {}", self.pre_upgrade)?;
        writeln!(f, "RPC dial attempts: {}", self.rpc_dial_attempts)?;
        writeln!(f, "RPC dial backoff: {:?}", self.rpc_dial_backoff)?;
        write!(f, "RPC request timeout: {:?}", self.rpc_request_timeout)
    }
}
