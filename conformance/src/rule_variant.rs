use anyhow::Error;
use std::{
    fmt::{Display, Formatter, Result},
    str::FromStr,
};

/// The two rule sets a node can follow around the Canyon upgrade.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RuleVariant {
    /// Pre-Canyon rules.
    Legacy,
    /// Post-Canyon rules.
    Upgraded,
}

impl RuleVariant {
    pub fn from_pre_upgrade(pre_upgrade: bool) -> Self {
        if pre_upgrade {
            RuleVariant::Legacy
        } else {
            RuleVariant::Upgraded
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            RuleVariant::Legacy => RuleVariant::Upgraded,
            RuleVariant::Upgraded => RuleVariant::Legacy,
        }
    }

    /// EIP-1559 base fee change denominator.
    pub fn base_fee_change_denominator(&self) -> u64 {
        match self {
            RuleVariant::Legacy => 50,
            RuleVariant::Upgraded => 250,
        }
    }

    /// Version marker attached to deposit receipts before hashing them.
    pub fn deposit_receipt_version(&self) -> Option<u64> {
        match self {
            RuleVariant::Legacy => None,
            RuleVariant::Upgraded => Some(1),
        }
    }
}

impl Display for RuleVariant {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "{:?}", self)
    }
}

impl FromStr for RuleVariant {
    type Err = Error;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "legacy" | "pre-canyon" => Ok(RuleVariant::Legacy),
            "upgraded" | "post-canyon" => Ok(RuleVariant::Upgraded),
            _ => Err(Error::msg(format!("Invalid rule variant: {}", s))),
        }
    }
}
