use crate::rule_variant::RuleVariant;
use common::chain_data::BlockInfo;
use num_bigint::BigUint;

/// Computes the base fee of the block following `parent`.
///
/// `target = gas_limit / elasticity`. Usage above target raises the fee by
/// `max(1, base_fee * (gas_used - target) / target / denominator)`, usage below lowers
/// it by `base_fee * (target - gas_used) / target / denominator` without going under
/// zero. Every division truncates and is applied in that order.
///
/// A zero target (elasticity larger than the gas limit, or zero) cannot be divided by;
/// any usage then raises the fee by the minimum step of one.
pub fn compute_base_fee(parent: &BlockInfo, elasticity: u64, variant: RuleVariant) -> BigUint {
    let gas_target = parent.gas_limit.checked_div(elasticity).unwrap_or(0);

    // If the parent gas used is the same as the target, the base fee remains unchanged.
    if parent.gas_used == gas_target {
        return parent.base_fee.clone();
    }
    if gas_target == 0 {
        return &parent.base_fee + 1u32;
    }

    let target = BigUint::from(gas_target);
    let denominator = BigUint::from(variant.base_fee_change_denominator());

    if parent.gas_used > gas_target {
        let gas_used_delta = BigUint::from(parent.gas_used - gas_target);
        let base_fee_delta = &parent.base_fee * gas_used_delta / &target / &denominator;
        &parent.base_fee + base_fee_delta.max(BigUint::from(1u32))
    } else {
        let gas_used_delta = BigUint::from(gas_target - parent.gas_used);
        let base_fee_delta = &parent.base_fee * gas_used_delta / &target / &denominator;
        if base_fee_delta >= parent.base_fee {
            BigUint::ZERO
        } else {
            &parent.base_fee - base_fee_delta
        }
    }
}
