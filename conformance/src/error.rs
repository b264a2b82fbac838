use crate::{
    checker::{ActivationReport, Property, PropertyValue},
    rule_variant::RuleVariant,
};
use strum::Display;
use thiserror::Error;

/// What a check under one variant is expected to show.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Validity {
    Valid,
    Invalid,
}

#[derive(Debug, Error)]
pub enum CheckError {
    /// The data source could not deliver a block or its receipts. Inconclusive.
    #[error("Chain data unavailable: {0:#}")]
    DataUnavailable(anyhow::Error),

    #[error(
        "{property} of block {number} does not look correct as {variant}. have: {have}, want: {want}"
    )]
    Mismatch {
        property: Property,
        variant: RuleVariant,
        number: u64,
        have: PropertyValue,
        want: PropertyValue,
    },

    /// `variant` broke the `expected` outcome. `report` holds the results of both
    /// variants.
    #[error(
        "{property} of block {number} was expected to be {expected} as {variant}, {report}. have: {have}, want: {want}"
    )]
    ActivationViolated {
        property: Property,
        number: u64,
        variant: RuleVariant,
        expected: Validity,
        have: PropertyValue,
        want: PropertyValue,
        report: Box<ActivationReport>,
    },
}

impl CheckError {
    /// True when the chain was observed to break a rule, as opposed to the check not
    /// being able to run.
    pub fn is_conformance_failure(&self) -> bool {
        !matches!(self, CheckError::DataUnavailable(_))
    }

    /// Both variants' results when an activation expectation was violated.
    pub fn activation_report(&self) -> Option<&ActivationReport> {
        match self {
            CheckError::ActivationViolated { report, .. } => Some(report),
            _ => None,
        }
    }
}
