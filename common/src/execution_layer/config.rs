use crate::utils::config::Config;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct ExecutionLayerConfig {
    pub rpc_url: String,
    pub dial_attempts: u64,
    pub dial_backoff: Duration,
    pub request_timeout: Duration,
}

impl From<&Config> for ExecutionLayerConfig {
    fn from(config: &Config) -> Self {
        Self {
            rpc_url: config.rpc_url.clone(),
            dial_attempts: config.rpc_dial_attempts,
            dial_backoff: config.rpc_dial_backoff,
            request_timeout: config.rpc_request_timeout,
        }
    }
}
