use crate::chain_data::{BlockInfo, Receipt};
use alloy::{
    primitives::{B256, Bloom, U256},
    rpc::types::Log as RpcLog,
};
use anyhow::Error;
use num_bigint::BigUint;
use serde::Deserialize;

/// The subset of an `eth_getBlockBy*` response needed to build a [`BlockInfo`].
///
/// Decoded by hand instead of through the typed alloy block so that L2-specific
/// header and transaction fields never get in the way.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcHeader {
    #[serde(with = "alloy::serde::quantity")]
    pub number: u64,
    pub hash: B256,
    pub parent_hash: B256,
    #[serde(with = "alloy::serde::quantity")]
    pub gas_limit: u64,
    #[serde(with = "alloy::serde::quantity")]
    pub gas_used: u64,
    #[serde(default)]
    pub base_fee_per_gas: Option<U256>,
    pub receipts_root: B256,
    /// Transaction hashes in block order, as returned without full transactions.
    #[serde(default)]
    pub transactions: Vec<B256>,
}

impl TryFrom<RpcHeader> for BlockInfo {
    type Error = Error;

    fn try_from(header: RpcHeader) -> Result<Self, Self::Error> {
        let base_fee = header.base_fee_per_gas.ok_or_else(|| {
            anyhow::anyhow!("Block {} ({}) has no base fee", header.number, header.hash)
        })?;

        Ok(Self {
            number: header.number,
            hash: header.hash,
            parent_hash: header.parent_hash,
            gas_limit: header.gas_limit,
            gas_used: header.gas_used,
            base_fee: BigUint::from_bytes_be(&base_fee.to_be_bytes::<32>()),
            receipts_root: header.receipts_root,
        })
    }
}

/// An `eth_getBlockReceipts` entry, including the OP-stack deposit nonce.
///
/// The node's `depositReceiptVersion` is ignored: which deposit encoding a block
/// commits to is decided by the rule variant under test.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcReceipt {
    #[serde(rename = "type", with = "alloy::serde::quantity")]
    pub tx_type: u8,
    #[serde(default, with = "alloy::serde::quantity::opt")]
    pub status: Option<u64>,
    #[serde(with = "alloy::serde::quantity")]
    pub cumulative_gas_used: u64,
    pub logs_bloom: Bloom,
    pub logs: Vec<RpcLog>,
    #[serde(default, with = "alloy::serde::quantity::opt")]
    pub deposit_nonce: Option<u64>,
    pub transaction_hash: B256,
}

impl TryFrom<RpcReceipt> for Receipt {
    type Error = Error;

    fn try_from(receipt: RpcReceipt) -> Result<Self, Self::Error> {
        // Receipts committing to a post-state root predate every network this tool targets
        let status = receipt.status.ok_or_else(|| {
            anyhow::anyhow!(
                "Receipt of transaction {} has no status field",
                receipt.transaction_hash
            )
        })?;

        Ok(Self {
            tx_type: receipt.tx_type,
            status: status != 0,
            cumulative_gas_used: receipt.cumulative_gas_used,
            logs_bloom: receipt.logs_bloom,
            logs: receipt.logs.into_iter().map(RpcLog::into_inner).collect(),
            deposit_nonce: receipt.deposit_nonce,
        })
    }
}

/// Fails unless `receipts` holds exactly one receipt per entry of `transactions`, in
/// the same order.
pub fn verify_receipts_order(transactions: &[B256], receipts: &[RpcReceipt]) -> Result<(), Error> {
    if transactions.len() != receipts.len() {
        return Err(anyhow::anyhow!(
            "block has {} transactions but {} receipts were returned",
            transactions.len(),
            receipts.len()
        ));
    }
    if let Some((index, (tx_hash, receipt))) = transactions
        .iter()
        .zip(receipts)
        .enumerate()
        .find(|(_, (tx_hash, receipt))| **tx_hash != receipt.transaction_hash)
    {
        return Err(anyhow::anyhow!(
            "receipt {} belongs to transaction {}, expected {}",
            index,
            receipt.transaction_hash,
            tx_hash
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain_data::DEPOSIT_TX_TYPE;
    use alloy::primitives::{address, b256};
    use serde_json::json;

    #[test]
    fn test_header_conversion() {
        let header: RpcHeader = serde_json::from_value(json!({
            "number": "0x6a1a3fe",
            "hash": "0x0101010101010101010101010101010101010101010101010101010101010101",
            "parentHash": "0x0202020202020202020202020202020202020202020202020202020202020202",
            "gasLimit": "0x1c9c380",
            "gasUsed": "0x4c4b40",
            "baseFeePerGas": "0x3b9aca00",
            "receiptsRoot": "0x56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421",
            "miner": "0x4200000000000000000000000000000000000011",
            "transactions": []
        }))
        .unwrap();

        let info = BlockInfo::try_from(header).unwrap();
        assert_eq!(info.number, 111_256_574);
        assert_eq!(info.gas_limit, 30_000_000);
        assert_eq!(info.gas_used, 5_000_000);
        assert_eq!(info.base_fee, BigUint::from(1_000_000_000u64));
        assert_eq!(info.parent_hash, B256::repeat_byte(0x02));
        assert_eq!(
            info.receipts_root,
            b256!("56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421")
        );
    }

    #[test]
    fn test_header_without_base_fee_is_rejected() {
        let header: RpcHeader = serde_json::from_value(json!({
            "number": "0x1",
            "hash": "0x0101010101010101010101010101010101010101010101010101010101010101",
            "parentHash": "0x0202020202020202020202020202020202020202020202020202020202020202",
            "gasLimit": "0x1c9c380",
            "gasUsed": "0x0",
            "receiptsRoot": "0x56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421"
        }))
        .unwrap();

        let err = BlockInfo::try_from(header).unwrap_err();
        assert!(err.to_string().contains("has no base fee"));
    }

    #[test]
    fn test_deposit_receipt_conversion() {
        let receipt: RpcReceipt = serde_json::from_value(json!({
            "type": "0x7e",
            "status": "0x1",
            "cumulativeGasUsed": "0xb741",
            "logsBloom": format!("0x{}", "00".repeat(256)),
            "logs": [{
                "address": "0x4200000000000000000000000000000000000006",
                "topics": ["0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"],
                "data": "0x",
                "blockNumber": "0x6a1a3fe",
                "transactionIndex": "0x0",
                "logIndex": "0x0",
                "removed": false
            }],
            "depositNonce": "0x12d687",
            "depositReceiptVersion": "0x1",
            "transactionHash": "0x0303030303030303030303030303030303030303030303030303030303030303",
            "gasUsed": "0xb741",
            "effectiveGasPrice": "0x0"
        }))
        .unwrap();

        let receipt = Receipt::try_from(receipt).unwrap();
        assert_eq!(receipt.tx_type, DEPOSIT_TX_TYPE);
        assert!(receipt.status);
        assert_eq!(receipt.cumulative_gas_used, 46_913);
        assert_eq!(receipt.deposit_nonce, Some(1_234_567));
        assert_eq!(receipt.logs.len(), 1);
        assert_eq!(
            receipt.logs[0].address,
            address!("4200000000000000000000000000000000000006")
        );
    }

    #[test]
    fn test_receipt_without_status_is_rejected() {
        let receipt: RpcReceipt = serde_json::from_value(json!({
            "type": "0x0",
            "root": "0x0101010101010101010101010101010101010101010101010101010101010101",
            "cumulativeGasUsed": "0x5208",
            "logsBloom": format!("0x{}", "00".repeat(256)),
            "logs": [],
            "transactionHash": "0x0303030303030303030303030303030303030303030303030303030303030303"
        }))
        .unwrap();

        assert!(Receipt::try_from(receipt).is_err());
    }

    fn receipt_of(tx_hash: B256) -> RpcReceipt {
        serde_json::from_value(json!({
            "type": "0x2",
            "status": "0x1",
            "cumulativeGasUsed": "0x5208",
            "logsBloom": format!("0x{}", "00".repeat(256)),
            "logs": [],
            "transactionHash": tx_hash
        }))
        .unwrap()
    }

    #[test]
    fn test_receipts_order_matches_transactions() {
        let txs = [B256::repeat_byte(0x03), B256::repeat_byte(0x04)];
        let receipts: Vec<_> = txs.iter().copied().map(receipt_of).collect();
        assert!(verify_receipts_order(&txs, &receipts).is_ok());
        assert!(verify_receipts_order(&[], &[]).is_ok());

        let err = verify_receipts_order(&txs, &receipts[..1]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "block has 2 transactions but 1 receipts were returned"
        );

        let swapped = vec![receipt_of(txs[1]), receipt_of(txs[0])];
        let err = verify_receipts_order(&txs, &swapped).unwrap_err();
        assert!(err.to_string().starts_with("receipt 0 belongs to transaction 0x0404"));
    }
}
