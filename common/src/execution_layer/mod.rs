pub mod config;
mod rpc_types;

use crate::{
    chain_data::{BlockInfo, ChainDataSource, Receipt},
    shared::alloy_tools::create_read_only_provider,
};
use alloy::{
    eips::BlockNumberOrTag,
    primitives::B256,
    providers::{DynProvider, Provider},
};
use anyhow::Error;
use config::ExecutionLayerConfig;
use rpc_types::{RpcHeader, RpcReceipt, verify_receipts_order};
use std::{fmt::Display, future::IntoFuture, mem, time::Duration};
use tracing::{debug, info, warn};

/// JSON-RPC backed [`ChainDataSource`].
pub struct ExecutionLayer {
    provider: DynProvider,
    chain_id: u64,
    request_timeout: Duration,
}

impl ExecutionLayer {
    pub async fn new(provider: DynProvider, request_timeout: Duration) -> Result<Self, Error> {
        let chain_id = tokio::time::timeout(request_timeout, provider.get_chain_id())
            .await
            .map_err(|_| anyhow::anyhow!("Timed out getting chain ID after {request_timeout:?}"))?
            .map_err(|e| Error::msg(format!("Failed to get chain ID: {e}")))?;

        Ok(Self {
            provider,
            chain_id,
            request_timeout,
        })
    }

    /// Connects to `config.rpc_url`, retrying up to `config.dial_attempts` times.
    pub async fn connect(config: &ExecutionLayerConfig) -> Result<Self, Error> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match Self::dial(config).await {
                Ok(execution_layer) => {
                    info!(
                        "Connected to {} (chain_id: {}) after {} attempt(s)",
                        config.rpc_url, execution_layer.chain_id, attempt
                    );
                    return Ok(execution_layer);
                }
                Err(e) if attempt < config.dial_attempts => {
                    warn!(
                        "Failed to connect to {} (attempt {}/{}): {}. Retrying in {:?}",
                        config.rpc_url, attempt, config.dial_attempts, e, config.dial_backoff
                    );
                    tokio::time::sleep(config.dial_backoff).await;
                }
                Err(e) => {
                    return Err(anyhow::anyhow!(
                        "Failed to connect to {} after {} attempt(s): {}",
                        config.rpc_url,
                        attempt,
                        e
                    ));
                }
            }
        }
    }

    async fn dial(config: &ExecutionLayerConfig) -> Result<Self, Error> {
        let provider = create_read_only_provider(&config.rpc_url).await?;
        Self::new(provider, config.request_timeout).await
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn with_timeout<T, E: Display>(
        &self,
        method: &str,
        request: impl IntoFuture<Output = Result<T, E>>,
    ) -> Result<T, Error> {
        tokio::time::timeout(self.request_timeout, request)
            .await
            .map_err(|_| {
                anyhow::anyhow!(
                    "[chain_id: {}] {} timed out after {:?}",
                    self.chain_id,
                    method,
                    self.request_timeout
                )
            })?
            .map_err(|e| anyhow::anyhow!("[chain_id: {}] {} failed: {}", self.chain_id, method, e))
    }

    async fn get_block_info(&self, block: BlockNumberOrTag) -> Result<BlockInfo, Error> {
        let header = self
            .with_timeout(
                "eth_getBlockByNumber",
                self.provider
                    .client()
                    .request::<_, Option<RpcHeader>>("eth_getBlockByNumber", (block, false)),
            )
            .await?
            .ok_or_else(|| {
                anyhow::anyhow!("[chain_id: {}] Block {} not found", self.chain_id, block)
            })?;
        BlockInfo::try_from(header)
    }

    async fn get_header_by_hash(&self, hash: B256) -> Result<RpcHeader, Error> {
        self.with_timeout(
            "eth_getBlockByHash",
            self.provider
                .client()
                .request::<_, Option<RpcHeader>>("eth_getBlockByHash", (hash, false)),
        )
        .await?
        .ok_or_else(|| anyhow::anyhow!("[chain_id: {}] Block {} not found", self.chain_id, hash))
    }

    async fn get_block_receipts(&self, hash: B256) -> Result<Vec<RpcReceipt>, Error> {
        self.with_timeout(
            "eth_getBlockReceipts",
            self.provider
                .client()
                .request::<_, Option<Vec<RpcReceipt>>>("eth_getBlockReceipts", (hash,)),
        )
        .await?
        .ok_or_else(|| {
            anyhow::anyhow!(
                "[chain_id: {}] Receipts for block {} not available",
                self.chain_id,
                hash
            )
        })
    }
}

impl ChainDataSource for ExecutionLayer {
    async fn info_by_number(&self, number: u64) -> Result<BlockInfo, Error> {
        debug!("Fetching block {number}");
        self.get_block_info(BlockNumberOrTag::Number(number)).await
    }

    async fn fetch_receipts(&self, block_hash: B256) -> Result<(BlockInfo, Vec<Receipt>), Error> {
        debug!("Fetching receipts of block {block_hash}");
        let mut header = self.get_header_by_hash(block_hash).await?;
        let transactions = mem::take(&mut header.transactions);
        let block = BlockInfo::try_from(header)?;

        let receipts = self.get_block_receipts(block_hash).await?;
        verify_receipts_order(&transactions, &receipts).map_err(|e| {
            anyhow::anyhow!(
                "[chain_id: {}] Receipts of block {} ({}): {}",
                self.chain_id,
                block.number,
                block_hash,
                e
            )
        })?;
        let receipts = receipts
            .into_iter()
            .map(Receipt::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            "Fetched {} receipts of block {} ({})",
            receipts.len(),
            block.number,
            block_hash
        );
        Ok((block, receipts))
    }
}
