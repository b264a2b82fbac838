use alloy::primitives::{B256, Bloom, Log, logs_bloom};
use anyhow::Error;
use num_bigint::BigUint;
use std::future::Future;

/// Transaction type of legacy (untyped) receipts.
pub const LEGACY_TX_TYPE: u8 = 0x00;
/// Transaction type of OP-stack deposit transactions.
pub const DEPOSIT_TX_TYPE: u8 = 0x7e;

/// Header fields of a block that the conformance checks read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockInfo {
    pub number: u64,
    pub hash: B256,
    pub parent_hash: B256,
    pub gas_limit: u64,
    pub gas_used: u64,
    pub base_fee: BigUint,
    pub receipts_root: B256,
}

/// A transaction receipt as it takes part in the receipts commitment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt {
    pub tx_type: u8,
    pub status: bool,
    pub cumulative_gas_used: u64,
    pub logs_bloom: Bloom,
    pub logs: Vec<Log>,
    /// Nonce of a deposit transaction, set by nodes since Regolith.
    pub deposit_nonce: Option<u64>,
}

impl Receipt {
    /// Creates a receipt with the bloom derived from `logs` and no deposit fields.
    pub fn new(tx_type: u8, status: bool, cumulative_gas_used: u64, logs: Vec<Log>) -> Self {
        Self {
            tx_type,
            status,
            cumulative_gas_used,
            logs_bloom: logs_bloom(&logs),
            logs,
            deposit_nonce: None,
        }
    }

    pub fn with_deposit_nonce(mut self, nonce: Option<u64>) -> Self {
        self.deposit_nonce = nonce;
        self
    }

    pub fn is_deposit(&self) -> bool {
        self.tx_type == DEPOSIT_TX_TYPE
    }
}

/// Read access to the chain the checks run against.
///
/// Implementations own transport concerns (connection, retries, timeouts). Any failure
/// is reported as an error and treated by callers as "data unavailable".
pub trait ChainDataSource: Send + Sync {
    fn info_by_number(&self, number: u64) -> impl Future<Output = Result<BlockInfo, Error>> + Send;

    fn fetch_receipts(
        &self,
        block_hash: B256,
    ) -> impl Future<Output = Result<(BlockInfo, Vec<Receipt>), Error>> + Send;
}
