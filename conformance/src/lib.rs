//! Differential conformance checks for the fee-market and receipt-commitment rules of an
//! OP-stack chain on both sides of the Canyon upgrade.
pub mod checker;
pub mod error;
pub mod fee_model;
pub mod receipts;
pub mod root_hasher;
pub mod rule_variant;

pub use checker::{
    ActivationReport, CheckResult, ConformanceChecker, ConformanceReport, Property, PropertyValue,
};
pub use error::{CheckError, Validity};
pub use rule_variant::RuleVariant;
