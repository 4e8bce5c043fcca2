//! Proportional deposit and withdraw sizing
//!
//! Sizes the opposing side and the share-token amount for single-pool liquidity
//! changes. Deposits mint the lower of the two sides' fund returns; withdrawals
//! burn `percent * supply` shares split across two single-asset burns, guarded
//! against removing too large a slice of the pool in one call.

use crate::error::{AmmError, AmmResult};
use crate::registry::HydratedPool;
use crate::withdrawal::{WithdrawalPlan, WithdrawalStep};
use relay_types::{Decimal, Quantity};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Largest share of supply a single withdrawal call may burn (exclusive)
pub const CONCENTRATION_LIMIT: Decimal = dec!(0.30);

/// Share of supply removed per step of a split withdrawal
pub const STEP_FRACTION: Decimal = dec!(0.01);

/// Tolerance for clamping a withdrawal to the caller's owned shares
pub const OWNED_TOLERANCE: Decimal = dec!(0.01);

/// Share amount proportional to `deposit` relative to one reserve side
pub fn calculate_fund_return(
    deposit: &Quantity,
    reserve: &Quantity,
    supply: &Quantity,
) -> AmmResult<Quantity> {
    if !reserve.is_positive() {
        return Err(AmmError::InsufficientLiquidity(format!(
            "reserve {reserve} is empty"
        )));
    }
    let percent = deposit.ratio(reserve)?;
    Ok(supply.times(percent)?)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpposingDeposit {
    /// Amount of the other reserve keeping the pool ratio
    pub opposing: Quantity,
    /// Shares minted: the lower of both sides' fund returns
    pub share_amount: Quantity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpposingWithdraw {
    pub opposing: Quantity,
    /// Total shares burned across both burns
    pub share_amount: Quantity,
    /// Shares burned by the first single-asset burn
    pub per_burn: Quantity,
}

impl OpposingWithdraw {
    /// The two burns; the second carries the rounding remainder
    pub fn burns(&self) -> AmmResult<(Quantity, Quantity)> {
        let second = self.share_amount.checked_sub(&self.per_burn)?;
        Ok((self.per_burn.clone(), second))
    }
}

fn ensure_share_token(pool: &HydratedPool, supply: &Quantity) -> AmmResult<()> {
    if supply.token() != &pool.share.token {
        return Err(AmmError::InvalidInput(format!(
            "supply is denominated in {}, pool {} issues {}",
            supply.token(),
            pool.id(),
            pool.share.token
        )));
    }
    if !supply.is_positive() {
        return Err(AmmError::Unavailable(format!(
            "pool {} has no share supply",
            pool.id()
        )));
    }
    Ok(())
}

/// Rejects a size whose share amount truncates to zero
fn ensure_nonzero_shares(
    pool: &HydratedPool,
    share_amount: &Quantity,
    sized: &Quantity,
) -> AmmResult<()> {
    if !share_amount.is_positive() {
        return Err(AmmError::InsufficientLiquidity(format!(
            "{sized} is below one share unit of pool {}",
            pool.id()
        )));
    }
    Ok(())
}

fn half(amount: &Quantity) -> Quantity {
    amount.with_amount(amount.amount() / Decimal::TWO)
}

/// Opposing amount and shares minted for a single-side deposit
pub fn opposing_deposit(
    pool: &HydratedPool,
    supply: &Quantity,
    deposit: &Quantity,
) -> AmmResult<OpposingDeposit> {
    if !deposit.is_positive() {
        return Err(AmmError::NonPositiveQuantity(deposit.to_string()));
    }
    ensure_share_token(pool, supply)?;
    let (same, opposite) = pool.sides(deposit.token())?;
    if !same.balance.is_positive() {
        return Err(AmmError::InsufficientLiquidity(format!(
            "{} reserve of pool {} is empty",
            same.token,
            pool.id()
        )));
    }

    let percent = deposit.ratio(&same.balance)?;
    let opposing = opposite.balance.times(percent)?;

    let same_return = calculate_fund_return(deposit, &same.balance, supply)?;
    let opposing_return = calculate_fund_return(&opposing, &opposite.balance, supply)?;
    let share_amount = same_return.lowest(opposing_return)?;
    ensure_nonzero_shares(pool, &share_amount, deposit)?;

    debug!(
        pool = %pool.id(),
        deposit = %deposit,
        opposing = %opposing,
        shares = %share_amount,
        "Sized opposing deposit"
    );
    Ok(OpposingDeposit {
        opposing,
        share_amount,
    })
}

/// Opposing amount and shares burned for a single-side withdrawal target
///
/// A share amount within [`OWNED_TOLERANCE`] of `owned` is clamped to `owned`;
/// further above it the withdrawal is rejected.
pub fn opposing_withdraw(
    pool: &HydratedPool,
    supply: &Quantity,
    owned: &Quantity,
    target: &Quantity,
) -> AmmResult<OpposingWithdraw> {
    if !target.is_positive() {
        return Err(AmmError::NonPositiveQuantity(target.to_string()));
    }
    ensure_share_token(pool, supply)?;
    supply.ensure_compatible(owned)?;
    let (same, opposite) = pool.sides(target.token())?;
    if target.amount() > same.balance.amount() {
        return Err(AmmError::InsufficientReserve {
            token: same.token.clone(),
            reserve: same.balance.amount(),
            requested: target.amount(),
        });
    }

    let percent = target.ratio(&same.balance)?;
    let opposing = opposite.balance.times(percent)?;
    let mut share_amount = supply.times(percent)?;
    ensure_nonzero_shares(pool, &share_amount, target)?;

    if !owned.is_positive() {
        return Err(AmmError::InsufficientShares {
            requested: share_amount.amount(),
            owned: owned.amount(),
        });
    }
    let owned_ratio = share_amount.ratio(owned)?;
    if owned_ratio > Decimal::ONE + OWNED_TOLERANCE {
        return Err(AmmError::InsufficientShares {
            requested: share_amount.amount(),
            owned: owned.amount(),
        });
    }
    if owned_ratio > Decimal::ONE - OWNED_TOLERANCE {
        share_amount = owned.clone();
    }

    let per_burn = half(&share_amount);
    debug!(
        pool = %pool.id(),
        target = %target,
        opposing = %opposing,
        shares = %share_amount,
        "Sized opposing withdraw"
    );
    Ok(OpposingWithdraw {
        opposing,
        share_amount,
        per_burn,
    })
}

/// Share of supply `share_amount` represents; rejected at or above [`CONCENTRATION_LIMIT`]
pub fn check_concentration(share_amount: &Quantity, supply: &Quantity) -> AmmResult<Decimal> {
    if !supply.is_positive() {
        return Err(AmmError::Unavailable("share supply is zero".into()));
    }
    let fraction = share_amount.ratio(supply)?;
    if fraction >= CONCENTRATION_LIMIT {
        return Err(AmmError::ConcentrationGuard {
            fraction,
            limit: CONCENTRATION_LIMIT,
        });
    }
    Ok(fraction)
}

/// Split `total` into `ceil(fraction / STEP_FRACTION)` steps, minimum one
///
/// Collapses to a single step when the per-step amount rounds to zero. The
/// last step carries the remainder so the steps sum to `total` exactly.
pub fn split_shares(total: &Quantity, fraction: Decimal) -> AmmResult<Vec<Quantity>> {
    let raw_steps = (fraction / STEP_FRACTION).ceil().to_usize().unwrap_or(1);
    let mut steps = raw_steps.max(1);

    let mut per_step = total.with_amount(total.amount() / Decimal::from(steps));
    if per_step.is_zero() {
        steps = 1;
        per_step = total.clone();
    }

    let mut parts = Vec::with_capacity(steps);
    let mut allocated = total.with_amount(Decimal::ZERO);
    for _ in 1..steps {
        allocated = allocated.checked_add(&per_step)?;
        parts.push(per_step.clone());
    }
    parts.push(total.checked_sub(&allocated)?);
    Ok(parts)
}

/// Guarded, split withdrawal plan for a single-side target
pub fn plan_withdrawal(
    pool: &HydratedPool,
    supply: &Quantity,
    owned: &Quantity,
    target: &Quantity,
) -> AmmResult<WithdrawalPlan> {
    let sized = opposing_withdraw(pool, supply, owned, target)?;
    let fraction = check_concentration(&sized.share_amount, supply)?;
    let parts = split_shares(&sized.share_amount, fraction)?;

    let reserves = [pool.reserves[0].token.clone(), pool.reserves[1].token.clone()];
    let steps = parts
        .into_iter()
        .enumerate()
        .map(|(index, share_amount)| WithdrawalStep::new(index, share_amount, &reserves))
        .collect::<AmmResult<Vec<_>>>()?;

    debug!(pool = %pool.id(), steps = steps.len(), %fraction, "Planned withdrawal");
    Ok(WithdrawalPlan {
        pool: pool.id(),
        target: target.clone(),
        opposing: sized.opposing,
        share_amount: sized.share_amount,
        steps,
    })
}

/// Each reserve scaled by the owner's share of supply
pub fn max_withdrawals(
    pool: &HydratedPool,
    supply: &Quantity,
    owned: &Quantity,
) -> AmmResult<[Quantity; 2]> {
    ensure_share_token(pool, supply)?;
    let percent = owned.ratio(supply)?;
    Ok([
        pool.reserves[0].balance.times(percent)?,
        pool.reserves[1].balance.times(percent)?,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{PoolReserve, ShareToken};
    use relay_types::TokenId;

    fn id(s: &str) -> TokenId {
        s.parse().unwrap()
    }

    fn pool(a: Decimal, b: Decimal) -> HydratedPool {
        let reserve = |t: &str, amount: Decimal| PoolReserve {
            token: id(t),
            balance: Quantity::new(amount, id(t), 4),
            depth: amount,
        };
        HydratedPool {
            contract: "tlosdx.swaps".into(),
            share: ShareToken {
                token: id("relays.swaps-TLOSDX"),
                precision: 4,
                supply: None,
            },
            reserves: [
                reserve("eosio.token-TLOS", a),
                reserve("tokens.swaps-TLOSD", b),
            ],
            fee: dec!(20),
            amplifier: dec!(1),
            enabled: true,
            multi_contract: true,
        }
    }

    fn shares(amount: Decimal) -> Quantity {
        Quantity::new(amount, id("relays.swaps-TLOSDX"), 4)
    }

    fn tlos(amount: Decimal) -> Quantity {
        Quantity::new(amount, id("eosio.token-TLOS"), 4)
    }

    #[test]
    fn test_fund_return() {
        let r = calculate_fund_return(&tlos(dec!(10)), &tlos(dec!(1000)), &shares(dec!(500))).unwrap();
        assert_eq!(r.amount(), dec!(5));
        assert!(calculate_fund_return(&tlos(dec!(10)), &tlos(dec!(0)), &shares(dec!(500))).is_err());
    }

    #[test]
    fn test_opposing_deposit_uses_lower_return() {
        let p = pool(dec!(40000), dec!(10000));
        let sized = opposing_deposit(&p, &shares(dec!(2000)), &tlos(dec!(400))).unwrap();
        assert_eq!(sized.opposing.amount(), dec!(100));
        assert_eq!(sized.share_amount.amount(), dec!(20));

        // opposing 0.00015 truncates to 0.0001, so that side's return is the lower one
        let uneven = opposing_deposit(&pool(dec!(4), dec!(3)), &shares(dec!(100)), &tlos(dec!(0.0002))).unwrap();
        assert_eq!(uneven.opposing.amount(), dec!(0.0001));
        assert_eq!(uneven.share_amount.amount(), dec!(0.0033));
    }

    #[test]
    fn test_opposing_withdraw_totals_and_burns() {
        let p = pool(dec!(40000), dec!(10000));
        let sized = opposing_withdraw(&p, &shares(dec!(2000)), &shares(dec!(500)), &tlos(dec!(400))).unwrap();
        assert_eq!(sized.opposing.amount(), dec!(100));
        assert_eq!(sized.share_amount.amount(), dec!(20));
        let (first, second) = sized.burns().unwrap();
        assert_eq!(first.amount(), dec!(10));
        assert_eq!(second.amount(), dec!(10));
    }

    #[test]
    fn test_opposing_withdraw_clamps_to_owned() {
        let p = pool(dec!(40000), dec!(10000));
        // 20 shares requested, 19.9 owned: within 1%
        let sized = opposing_withdraw(&p, &shares(dec!(2000)), &shares(dec!(19.9)), &tlos(dec!(400))).unwrap();
        assert_eq!(sized.share_amount.amount(), dec!(19.9));
        assert_eq!(sized.per_burn.amount(), dec!(9.95));

        // 20 shares requested, 15 owned: rejected
        let err = opposing_withdraw(&p, &shares(dec!(2000)), &shares(dec!(15)), &tlos(dec!(400))).unwrap_err();
        assert!(matches!(err, AmmError::InsufficientShares { .. }));
    }

    #[test]
    fn test_sizes_below_one_share_unit_are_rejected() {
        let p = pool(dec!(1000000), dec!(1000000));
        let supply = shares(dec!(10));

        let err = opposing_deposit(&p, &supply, &tlos(dec!(1))).unwrap_err();
        assert!(matches!(err, AmmError::InsufficientLiquidity(_)));

        let err = opposing_withdraw(&p, &supply, &shares(dec!(5)), &tlos(dec!(1))).unwrap_err();
        assert!(matches!(err, AmmError::InsufficientLiquidity(_)));
        let err = plan_withdrawal(&p, &supply, &shares(dec!(5)), &tlos(dec!(1))).unwrap_err();
        assert!(matches!(err, AmmError::InsufficientLiquidity(_)));

        // 10 A is exactly one share unit
        let sized = opposing_deposit(&p, &supply, &tlos(dec!(10))).unwrap();
        assert_eq!(sized.share_amount.amount(), dec!(0.0001));
    }

    #[test]
    fn test_concentration_guard_boundary() {
        let supply = shares(dec!(1000));
        assert!(matches!(
            check_concentration(&shares(dec!(300)), &supply),
            Err(AmmError::ConcentrationGuard { .. })
        ));
        assert_eq!(
            check_concentration(&shares(dec!(299.99)), &supply).unwrap(),
            dec!(0.29999)
        );
    }

    #[test]
    fn test_split_steps() {
        let total = shares(dec!(50));
        let parts = split_shares(&total, dec!(0.05)).unwrap();
        assert_eq!(parts.len(), 5);
        assert!(parts.iter().all(|p| p.amount() == dec!(10)));

        let parts = split_shares(&shares(dec!(10)), dec!(0.025)).unwrap();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].amount(), dec!(3.3333));
        assert_eq!(parts[2].amount(), dec!(3.3334));

        let parts = split_shares(&shares(dec!(0.0002)), dec!(0.05)).unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].amount(), dec!(0.0002));

        assert_eq!(split_shares(&total, dec!(0.001)).unwrap().len(), 1);
    }

    #[test]
    fn test_plan_withdrawal() {
        let p = pool(dec!(40000), dec!(10000));
        let plan = plan_withdrawal(&p, &shares(dec!(1000)), &shares(dec!(100)), &tlos(dec!(2000))).unwrap();
        assert_eq!(plan.share_amount.amount(), dec!(50));
        assert_eq!(plan.steps.len(), 5);
        let total: Decimal = plan.steps.iter().map(|s| s.share_amount.amount()).sum();
        assert_eq!(total, dec!(50));

        let err = plan_withdrawal(&p, &shares(dec!(1000)), &shares(dec!(400)), &tlos(dec!(12000))).unwrap_err();
        assert!(matches!(err, AmmError::ConcentrationGuard { .. }));
    }

    #[test]
    fn test_max_withdrawals() {
        let p = pool(dec!(40000), dec!(10000));
        let [a, b] = max_withdrawals(&p, &shares(dec!(1000)), &shares(dec!(250))).unwrap();
        assert_eq!(a.amount(), dec!(10000));
        assert_eq!(b.amount(), dec!(2500));
    }
}
