//! Pool trait definitions for per-hop conversion quotes

use crate::bonding::BondingCurve;
use crate::error::{checked_div, checked_mul, AmmError, AmmResult};
use crate::pricing::{exact_inverse_fee, forward_fee};
use crate::registry::{HydratedPool, PoolId, PoolReserve};
use crate::reserve::ReserveModel;
use relay_types::{Decimal, Quantity, TokenId};
use serde::{Deserialize, Serialize};

/// Result of converting through one pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HopQuote {
    pub pool: PoolId,
    /// Gross amount paid in, fee included
    pub input: Quantity,
    pub output: Quantity,
    pub fee: Quantity,
    /// Deviation of this hop's rate from its spot rate
    pub slippage: Decimal,
}

/// Unified two-reserve pool interface for routing
pub trait ConversionPool {
    fn pool_id(&self) -> PoolId;

    /// `(side paid in, side paid out)` for a conversion from `from`
    fn reserve_pair(&self, from: &TokenId) -> AmmResult<(&PoolReserve, &PoolReserve)>;

    /// Token on the other side of `token`
    fn counterpart(&self, token: &TokenId) -> AmmResult<&TokenId> {
        let (_, other) = self.reserve_pair(token)?;
        Ok(&other.token)
    }

    /// Fee in parts per ten thousand
    fn fee(&self) -> Decimal;

    fn amplifier(&self) -> Decimal;

    /// Output for paying in `amount`
    fn quote_return(&self, amount: &Quantity) -> AmmResult<HopQuote> {
        if !amount.is_positive() {
            return Err(AmmError::NonPositiveQuantity(amount.to_string()));
        }
        let (from, to) = self.reserve_pair(amount.token())?;
        amount.ensure_compatible(&from.balance)?;

        let fee = forward_fee(amount, self.fee())?;
        let net = amount.checked_sub(&fee)?;
        let (upper_in, upper_out) = ReserveModel::uppers(&from.state(), &to.state(), self.amplifier())?;
        let raw_out = BondingCurve::checked_output(upper_in, upper_out, net.amount())?;

        let output = to.balance.with_amount(raw_out);
        if output.is_zero() {
            return Err(AmmError::InsufficientLiquidity(format!(
                "{amount} converts to less than one unit of {}",
                to.token
            )));
        }
        if output.amount() > to.balance.amount() {
            return Err(AmmError::InsufficientReserve {
                token: to.token.clone(),
                reserve: to.balance.amount(),
                requested: output.amount(),
            });
        }

        let slippage = hop_slippage(net.amount(), raw_out, upper_in, upper_out)?;
        Ok(HopQuote {
            pool: self.pool_id(),
            input: amount.clone(),
            output,
            fee,
            slippage,
        })
    }

    /// Gross input of `from` needed to receive `desired`, rounded up
    fn quote_cost(&self, from: &TokenId, desired: &Quantity) -> AmmResult<HopQuote> {
        if !desired.is_positive() {
            return Err(AmmError::NonPositiveQuantity(desired.to_string()));
        }
        let (source, target) = self.reserve_pair(from)?;
        desired.ensure_compatible(&target.balance)?;
        if desired.amount() > target.balance.amount() {
            return Err(AmmError::InsufficientReserve {
                token: target.token.clone(),
                reserve: target.balance.amount(),
                requested: desired.amount(),
            });
        }

        let (upper_in, upper_out) =
            ReserveModel::uppers(&source.state(), &target.state(), self.amplifier())?;
        let raw_net = BondingCurve::checked_input(upper_in, upper_out, desired.amount())?;
        let net = source.balance.with_amount_rounded_up(raw_net);
        let gross_up = exact_inverse_fee(net.amount(), self.fee())?;
        let input = net.with_amount_rounded_up(net.amount() + gross_up);
        let fee = input.checked_sub(&net)?;

        let slippage = hop_slippage(raw_net, desired.amount(), upper_in, upper_out)?;
        Ok(HopQuote {
            pool: self.pool_id(),
            input,
            output: desired.clone(),
            fee,
            slippage,
        })
    }
}

/// `ideal / actual - 1` where `ideal` is the spot-rate output for `net_in`
pub fn hop_slippage(
    net_in: Decimal,
    actual_out: Decimal,
    upper_in: Decimal,
    upper_out: Decimal,
) -> AmmResult<Decimal> {
    let ideal = checked_div(checked_mul(net_in, upper_out, "hop ideal output")?, upper_in, "hop ideal output")?;
    let ratio = checked_div(ideal, actual_out, "hop slippage")?;
    Ok(ratio - Decimal::ONE)
}

impl ConversionPool for HydratedPool {
    fn pool_id(&self) -> PoolId {
        self.id()
    }

    fn reserve_pair(&self, from: &TokenId) -> AmmResult<(&PoolReserve, &PoolReserve)> {
        self.sides(from)
    }

    fn fee(&self) -> Decimal {
        self.fee
    }

    fn amplifier(&self) -> Decimal {
        self.amplifier
    }
}
