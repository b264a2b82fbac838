use crate::{
    error::{CheckError, Validity},
    fee_model::compute_base_fee,
    receipts::receipts_root,
    rule_variant::RuleVariant,
};
use alloy::primitives::B256;
use common::chain_data::{BlockInfo, ChainDataSource};
use num_bigint::BigUint;
use std::fmt;
use strum::Display;
use tracing::{debug, error, info};


/// A block property whose derivation changed with the upgrade.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
pub enum Property {
    #[strum(serialize = "receipts root")]
    ReceiptsRoot,
    #[strum(serialize = "base fee")]
    BaseFee,
}

impl Property {
    /// Every property, in the order a full run evaluates them.
    pub const ALL: [Property; 2] = [Property::ReceiptsRoot, Property::BaseFee];
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PropertyValue {
    BaseFee(BigUint),
    ReceiptsRoot(B256),
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::BaseFee(fee) => write!(f, "{fee}"),
            PropertyValue::ReceiptsRoot(root) => write!(f, "{root}"),
        }
    }
}

/// Outcome of recomputing one property of one block under one variant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckResult {
    pub property: Property,
    pub variant: RuleVariant,
    pub number: u64,
    pub computed: PropertyValue,
    pub observed: PropertyValue,
}

impl CheckResult {
    pub fn is_match(&self) -> bool {
        self.computed == self.observed
    }

    pub fn into_result(self) -> Result<CheckResult, CheckError> {
        if self.is_match() {
            Ok(self)
        } else {
            Err(CheckError::Mismatch {
                property: self.property,
                variant: self.variant,
                number: self.number,
                have: self.computed,
                want: self.observed,
            })
        }
    }
}

/// Both checks of one property of one block, one per variant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActivationReport {
    pub property: Property,
    pub number: u64,
    pub assumed: RuleVariant,
    pub assumed_result: CheckResult,
    pub opposite_result: CheckResult,
}

impl ActivationReport {
    /// Variants whose computed value matches what the chain committed to.
    pub fn matching_variants(&self) -> Vec<RuleVariant> {
        [&self.assumed_result, &self.opposite_result]
            .into_iter()
            .filter(|result| result.is_match())
            .map(|result| result.variant)
            .collect()
    }

    /// The first broken expectation, if any: the assumed variant must match, the
    /// opposite one must not.
    fn violation(&self) -> Option<(&CheckResult, Validity)> {
        if !self.assumed_result.is_match() {
            Some((&self.assumed_result, Validity::Valid))
        } else if self.opposite_result.is_match() {
            Some((&self.opposite_result, Validity::Invalid))
        } else {
            None
        }
    }
}

impl fmt::Display for ActivationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.matching_variants().as_slice() {
            [] => write!(f, "matches neither variant"),
            [variant] => write!(f, "matches {variant} only"),
            _ => write!(f, "matches both variants"),
        }
    }
}

#[derive(Debug)]
pub struct ConformanceReport {
    pub number: u64,
    pub assumed: RuleVariant,
    pub activations: Vec<ActivationReport>,
    pub failures: Vec<CheckError>,
}

impl ConformanceReport {
    pub fn is_conformant(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Recomputes upgrade-sensitive block properties from chain data and compares them
/// with what the chain committed to.
pub struct ConformanceChecker<S: ChainDataSource> {
    source: S,
    elasticity: u64,
}

impl<S: ChainDataSource> ConformanceChecker<S> {
    pub fn new(source: S, elasticity: u64) -> Self {
        Self { source, elasticity }
    }

    async fn block(&self, number: u64) -> Result<BlockInfo, CheckError> {
        self.source
            .info_by_number(number)
            .await
            .map_err(CheckError::DataUnavailable)
    }

    pub async fn check_receipts(
        &self,
        number: u64,
        variant: RuleVariant,
    ) -> Result<CheckResult, CheckError> {
        let block = self.block(number).await?;
        let (_, receipts) = self
            .source
            .fetch_receipts(block.hash)
            .await
            .map_err(CheckError::DataUnavailable)?;

        let computed = receipts_root(&receipts, variant);
        debug!(
            "Block {}: {} receipts, computed root {} as {}, header root {}",
            number,
            receipts.len(),
            computed,
            variant,
            block.receipts_root
        );

        Ok(CheckResult {
            property: Property::ReceiptsRoot,
            variant,
            number,
            computed: PropertyValue::ReceiptsRoot(computed),
            observed: PropertyValue::ReceiptsRoot(block.receipts_root),
        })
    }

    /// Fails with [`CheckError::Mismatch`] unless the receipts root of block `number`
    /// is reproduced under `variant`.
    pub async fn validate_receipts(
        &self,
        number: u64,
        variant: RuleVariant,
    ) -> Result<(), CheckError> {
        self.check_receipts(number, variant).await?.into_result()?;
        Ok(())
    }

    pub async fn check_base_fee(
        &self,
        number: u64,
        elasticity: u64,
        variant: RuleVariant,
    ) -> Result<CheckResult, CheckError> {
        let block = self.block(number).await?;
        let parent_number = number.checked_sub(1).ok_or_else(|| {
            CheckError::DataUnavailable(anyhow::anyhow!("Block {number} has no parent"))
        })?;
        let parent = self.block(parent_number).await?;
        if parent.hash != block.parent_hash {
            return Err(CheckError::DataUnavailable(anyhow::anyhow!(
                "Block {} ({}) is not the parent of block {}, which builds on {}",
                parent_number,
                parent.hash,
                number,
                block.parent_hash
            )));
        }

        let computed = compute_base_fee(&parent, elasticity, variant);
        debug!(
            "Block {}: parent gas {}/{}, computed base fee {} as {}, header base fee {}",
            number, parent.gas_used, parent.gas_limit, computed, variant, block.base_fee
        );

        Ok(CheckResult {
            property: Property::BaseFee,
            variant,
            number,
            computed: PropertyValue::BaseFee(computed),
            observed: PropertyValue::BaseFee(block.base_fee),
        })
    }

    /// Fails with [`CheckError::Mismatch`] unless the base fee of block `number` is
    /// reproduced from its parent under `variant`.
    pub async fn validate_1559_params(
        &self,
        number: u64,
        elasticity: u64,
        variant: RuleVariant,
    ) -> Result<(), CheckError> {
        self.check_base_fee(number, elasticity, variant)
            .await?
            .into_result()?;
        Ok(())
    }

    pub async fn check(
        &self,
        property: Property,
        number: u64,
        variant: RuleVariant,
    ) -> Result<CheckResult, CheckError> {
        match property {
            Property::ReceiptsRoot => self.check_receipts(number, variant).await,
            Property::BaseFee => self.check_base_fee(number, self.elasticity, variant).await,
        }
    }

    pub async fn validate(
        &self,
        property: Property,
        number: u64,
        variant: RuleVariant,
    ) -> Result<(), CheckError> {
        match property {
            Property::ReceiptsRoot => self.validate_receipts(number, variant).await,
            Property::BaseFee => {
                self.validate_1559_params(number, self.elasticity, variant)
                    .await
            }
        }
    }

    /// Checks that `property` of block `number` is reproduced under `assumed` and not
    /// under the opposite variant.
    ///
    /// Both variants are always evaluated, so a violation also tells which rules the
    /// block does follow.
    pub async fn check_activation(
        &self,
        property: Property,
        number: u64,
        assumed: RuleVariant,
    ) -> Result<ActivationReport, CheckError> {
        let assumed_result = self.check(property, number, assumed).await?;
        let opposite_result = self.check(property, number, assumed.opposite()).await?;
        let report = ActivationReport {
            property,
            number,
            assumed,
            assumed_result,
            opposite_result,
        };

        let Some((result, expected)) = report.violation() else {
            info!(
                "{} of block {} is valid as {} and invalid as {}",
                property,
                number,
                assumed,
                assumed.opposite()
            );
            return Ok(report);
        };

        error!(
            "{} of block {} was expected to be {} as {}, {}. have: {}, want: {}",
            property, number, expected, result.variant, report, result.computed, result.observed
        );
        Err(CheckError::ActivationViolated {
            property,
            number,
            variant: result.variant,
            expected,
            have: result.computed.clone(),
            want: result.observed.clone(),
            report: Box::new(report.clone()),
        })
    }

    /// Runs [`Self::check_activation`] for every property.
    ///
    /// A conformance failure of one property does not stop the others from being
    /// evaluated. Unavailable chain data aborts the run.
    pub async fn run(
        &self,
        number: u64,
        assumed: RuleVariant,
    ) -> Result<ConformanceReport, CheckError> {
        info!(
            "Checking block {} as {} (elasticity {})",
            number, assumed, self.elasticity
        );

        let mut report = ConformanceReport {
            number,
            assumed,
            activations: Vec::with_capacity(Property::ALL.len()),
            failures: Vec::new(),
        };
        for property in Property::ALL {
            match self.check_activation(property, number, assumed).await {
                Ok(activation) => report.activations.push(activation),
                Err(e) if e.is_conformance_failure() => report.failures.push(e),
                Err(e) => {
                    error!("Failed to check {} of block {}: {}", property, number, e);
                    return Err(e);
                }
            }
        }

        if report.is_conformant() {
            info!("Block {} conforms to {}", number, assumed);
        } else {
            error!(
                "Block {} does not conform to {}: {} property check(s) failed",
                number,
                assumed,
                report.failures.len()
            );
        }
        Ok(report)
    }
}
