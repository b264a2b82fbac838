use crate::{root_hasher::ordered_root, rule_variant::RuleVariant};
use alloy::primitives::{B256, Bytes};
use alloy_rlp::{BufMut, Encodable, Header};
use common::chain_data::{LEGACY_TX_TYPE, Receipt};

/// A receipt as it is serialized for the receipts trie under one rule variant.
///
/// The layout follows op-geth: `rlp([status, cumulative_gas_used, logs_bloom, logs])`,
/// extended with `deposit_nonce` and the version marker for deposit receipts under
/// [`RuleVariant::Upgraded`]. Typed receipts are prefixed with their type byte (EIP-2718).
#[derive(Debug)]
pub struct ReceiptEncoding<'a> {
    receipt: &'a Receipt,
    deposit_receipt_version: Option<u64>,
}

impl<'a> ReceiptEncoding<'a> {
    /// Deposit receipts get the variant's version marker, or none at all under
    /// [`RuleVariant::Legacy`]. Other receipts never carry a marker.
    pub fn new(receipt: &'a Receipt, variant: RuleVariant) -> Self {
        let deposit_receipt_version = if receipt.is_deposit() {
            variant.deposit_receipt_version()
        } else {
            None
        };
        Self {
            receipt,
            deposit_receipt_version,
        }
    }

    fn payload_length(&self) -> usize {
        let receipt = self.receipt;
        let mut length = receipt.status.length()
            + receipt.cumulative_gas_used.length()
            + receipt.logs_bloom.length()
            + receipt.logs.length();
        if let Some(version) = self.deposit_receipt_version {
            length += receipt.deposit_nonce.unwrap_or_default().length() + version.length();
        }
        length
    }

    /// Writes the EIP-2718 envelope of the receipt.
    pub fn encode_2718(&self, out: &mut dyn BufMut) {
        if self.receipt.tx_type != LEGACY_TX_TYPE {
            out.put_u8(self.receipt.tx_type);
        }
        self.encode(out);
    }

    pub fn encoded_2718(&self) -> Bytes {
        let mut out = Vec::with_capacity(self.length() + 1);
        self.encode_2718(&mut out);
        out.into()
    }
}

impl Encodable for ReceiptEncoding<'_> {
    fn encode(&self, out: &mut dyn BufMut) {
        let receipt = self.receipt;
        Header {
            list: true,
            payload_length: self.payload_length(),
        }
        .encode(out);
        receipt.status.encode(out);
        receipt.cumulative_gas_used.encode(out);
        receipt.logs_bloom.encode(out);
        receipt.logs.encode(out);
        if let Some(version) = self.deposit_receipt_version {
            // A missing nonce is written as zero, like an unset optional field in op-geth
            receipt.deposit_nonce.unwrap_or_default().encode(out);
            version.encode(out);
        }
    }

    fn length(&self) -> usize {
        let payload_length = self.payload_length();
        payload_length + alloy_rlp::length_of_length(payload_length)
    }
}

/// Encodes every receipt for the receipts trie, in block order.
pub fn encode_receipts(receipts: &[Receipt], variant: RuleVariant) -> Vec<Bytes> {
    receipts
        .iter()
        .map(|receipt| ReceiptEncoding::new(receipt, variant).encoded_2718())
        .collect()
}

/// Receipts root of a block as computed under `variant`.
pub fn receipts_root(receipts: &[Receipt], variant: RuleVariant) -> B256 {
    ordered_root(&encode_receipts(receipts, variant))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::{
        eips::eip2718::Encodable2718,
        hex,
        primitives::{Address, Log, U256, address, b256, keccak256},
        trie::EMPTY_ROOT_HASH,
    };
    use common::chain_data::DEPOSIT_TX_TYPE;
    use op_alloy_consensus::{OpReceiptEnvelope, OpTxType};

    const VARIANTS: [RuleVariant; 2] = [RuleVariant::Legacy, RuleVariant::Upgraded];

    fn topic(address: Address) -> B256 {
        address.into_word()
    }

    fn transfer_log() -> Log {
        Log::new_unchecked(
            address!("4200000000000000000000000000000000000006"),
            vec![
                keccak256("Transfer(address,address,uint256)"),
                topic(address!("1111111111111111111111111111111111111111")),
                topic(address!("2222222222222222222222222222222222222222")),
            ],
            U256::from(1_000_000_000_000_000_000u64)
                .to_be_bytes::<32>()
                .to_vec()
                .into(),
        )
    }

    fn deposit_receipt() -> Receipt {
        Receipt::new(DEPOSIT_TX_TYPE, true, 46_913, vec![])
            .with_deposit_nonce(Some(1_234_567))
    }

    fn dynamic_fee_receipt() -> Receipt {
        Receipt::new(0x02, true, 98_613, vec![transfer_log()])
    }

    fn failed_legacy_receipt() -> Receipt {
        Receipt::new(LEGACY_TX_TYPE, false, 128_613, vec![])
    }

    fn block_receipts() -> Vec<Receipt> {
        vec![
            deposit_receipt(),
            dynamic_fee_receipt(),
            failed_legacy_receipt(),
        ]
    }

    fn empty_bloom_hex() -> String {
        "00".repeat(256)
    }

    /// The same receipt as op-alloy builds it for a block under `variant`.
    fn op_envelope(receipt: &Receipt, variant: RuleVariant) -> OpReceiptEnvelope {
        let tx_type = match receipt.tx_type {
            LEGACY_TX_TYPE => OpTxType::Legacy,
            0x01 => OpTxType::Eip2930,
            0x02 => OpTxType::Eip1559,
            0x04 => OpTxType::Eip7702,
            DEPOSIT_TX_TYPE => OpTxType::Deposit,
            other => panic!("Unsupported receipt type {other}"),
        };
        let version = variant.deposit_receipt_version();
        // Upgraded deposits always carry a nonce, absent ones being zero
        let nonce = version.map(|_| receipt.deposit_nonce.unwrap_or_default());
        OpReceiptEnvelope::from_parts(
            receipt.status,
            receipt.cumulative_gas_used,
            &receipt.logs,
            tx_type,
            nonce,
            version,
        )
    }

    #[test]
    fn test_deposit_receipt_layout() {
        let receipt = deposit_receipt();

        let legacy = ReceiptEncoding::new(&receipt, RuleVariant::Legacy).encoded_2718();
        let expected = "7ef90108".to_owned()
            + "01" // status
            + "82b741" // cumulative gas used
            + "b90100"
            + &empty_bloom_hex()
            + "c0"; // no logs
        assert_eq!(hex::encode(&legacy), expected);

        let upgraded = ReceiptEncoding::new(&receipt, RuleVariant::Upgraded).encoded_2718();
        let expected = "7ef9010d0182b741b90100".to_owned()
            + &empty_bloom_hex()
            + "c0"
            + "8312d687" // deposit nonce
            + "01"; // version marker
        assert_eq!(hex::encode(&upgraded), expected);
    }

    #[test]
    fn test_legacy_receipt_layout() {
        let receipt = failed_legacy_receipt();
        for variant in VARIANTS {
            let encoded = ReceiptEncoding::new(&receipt, variant).encoded_2718();
            let expected = "f90109808301f665b90100".to_owned() + &empty_bloom_hex() + "c0";
            assert_eq!(hex::encode(&encoded), expected);
        }
    }

    #[test]
    fn test_missing_deposit_nonce_is_encoded_as_zero() {
        let receipt = Receipt::new(DEPOSIT_TX_TYPE, true, 21_000, vec![]);
        let encoded = ReceiptEncoding::new(&receipt, RuleVariant::Upgraded).encoded_2718();
        assert!(hex::encode(&encoded).ends_with("c08001"));
    }

    #[test]
    fn test_non_deposit_receipts_are_variant_independent() {
        let receipts = vec![
            dynamic_fee_receipt(),
            failed_legacy_receipt(),
            // A nonce on a non-deposit receipt is never encoded
            Receipt::new(0x01, true, 150_000, vec![]).with_deposit_nonce(Some(3)),
        ];
        let legacy = encode_receipts(&receipts, RuleVariant::Legacy);
        let upgraded = encode_receipts(&receipts, RuleVariant::Upgraded);
        assert_eq!(legacy, upgraded);
        assert_eq!(legacy[0][0], 0x02);
        assert_eq!(legacy[2][0], 0x01);
        assert_eq!(legacy[2].len(), 269);
    }

    #[test]
    fn test_encoding_agrees_with_op_alloy() {
        let receipts = vec![
            deposit_receipt(),
            Receipt::new(DEPOSIT_TX_TYPE, false, 60_000, vec![transfer_log()])
                .with_deposit_nonce(Some(7)),
            Receipt::new(DEPOSIT_TX_TYPE, true, 81_000, vec![]),
            dynamic_fee_receipt(),
            failed_legacy_receipt(),
            Receipt::new(0x01, true, 150_000, vec![transfer_log()]),
            Receipt::new(0x04, true, 190_000, vec![]),
        ];
        for variant in VARIANTS {
            let ours = encode_receipts(&receipts, variant);
            for (receipt, encoded) in receipts.iter().zip(&ours) {
                assert_eq!(
                    encoded,
                    &op_envelope(receipt, variant).encoded_2718(),
                    "{variant}: {receipt:?}"
                );
            }
        }
    }

    #[test]
    fn test_encoding_does_not_mutate_receipts() {
        let receipts = block_receipts();
        let before = receipts.clone();
        encode_receipts(&receipts, RuleVariant::Legacy);
        encode_receipts(&receipts, RuleVariant::Upgraded);
        assert_eq!(receipts, before);
    }

    #[test]
    fn test_receipts_root_per_variant() {
        let receipts = block_receipts();
        assert_eq!(
            receipts_root(&receipts, RuleVariant::Legacy),
            b256!("27f6101af5005745d42ef3b15628d5cdb834a8aa72e10e86bdc666687032277c")
        );
        assert_eq!(
            receipts_root(&receipts, RuleVariant::Upgraded),
            b256!("f24c7e7648bd56fd0027357bfbe5440209e4ba180b5378c6ea65086feea7abfd")
        );
        assert_eq!(
            receipts_root(&[deposit_receipt()], RuleVariant::Legacy),
            b256!("3f71ebd8822765e8146170b0f930f55f753dbb867f55e4e605894016cd32f1e2")
        );
        assert_eq!(
            receipts_root(&[deposit_receipt()], RuleVariant::Upgraded),
            b256!("e1f92c25ac118766b5423720a6708e1f3cbfb3c24e1787684bb0de3a33390988")
        );
    }

    #[test]
    fn test_receipts_root_is_order_sensitive() {
        let mut receipts = block_receipts();
        receipts.swap(0, 1);
        assert_eq!(
            receipts_root(&receipts, RuleVariant::Upgraded),
            b256!("33951e40fe29a52830fff6b9fe6139eb127efd9853efaf935bd94da150c3142c")
        );
        for variant in VARIANTS {
            assert_ne!(
                receipts_root(&receipts, variant),
                receipts_root(&block_receipts(), variant)
            );
        }
    }

    #[test]
    fn test_empty_block_root() {
        for variant in VARIANTS {
            assert_eq!(receipts_root(&[], variant), EMPTY_ROOT_HASH);
        }
    }
}
