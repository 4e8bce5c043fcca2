//! Constant-product bonding curve over virtual upper balances
//!
//! Pure functions, no validation beyond the zero clamp. The `checked_*`
//! variants turn a clamp into [`AmmError::InsufficientLiquidity`] so a clamp is
//! never mistaken for a free trade.

use crate::error::{checked_div, checked_mul, AmmError, AmmResult};
use rust_decimal::Decimal;

pub struct BondingCurve;

impl BondingCurve {
    /// `out = qty * quote_upper / (base_upper + qty)`, clamped at zero
    pub fn output(base_upper: Decimal, quote_upper: Decimal, quantity: Decimal) -> AmmResult<Decimal> {
        let denominator = base_upper
            .checked_add(quantity)
            .ok_or(AmmError::Arithmetic("bonding output denominator"))?;
        if denominator <= Decimal::ZERO {
            return Ok(Decimal::ZERO);
        }
        let numerator = checked_mul(quantity, quote_upper, "bonding output numerator")?;
        let out = checked_div(numerator, denominator, "bonding output")?;
        Ok(out.max(Decimal::ZERO))
    }

    /// `in = base_upper * out / (quote_upper - out)`, clamped at zero
    ///
    /// Asking for at least the whole quote side leaves a non-positive
    /// denominator, which clamps instead of dividing.
    pub fn input(base_upper: Decimal, quote_upper: Decimal, out: Decimal) -> AmmResult<Decimal> {
        let denominator = quote_upper
            .checked_sub(out)
            .ok_or(AmmError::Arithmetic("bonding input denominator"))?;
        if denominator <= Decimal::ZERO {
            return Ok(Decimal::ZERO);
        }
        let numerator = checked_mul(base_upper, out, "bonding input numerator")?;
        let input = checked_div(numerator, denominator, "bonding input")?;
        Ok(input.max(Decimal::ZERO))
    }

    pub fn checked_output(
        base_upper: Decimal,
        quote_upper: Decimal,
        quantity: Decimal,
    ) -> AmmResult<Decimal> {
        let out = Self::output(base_upper, quote_upper, quantity)?;
        if out <= Decimal::ZERO {
            return Err(AmmError::InsufficientLiquidity(format!(
                "no output for {quantity} against uppers {base_upper}/{quote_upper}"
            )));
        }
        Ok(out)
    }

    pub fn checked_input(base_upper: Decimal, quote_upper: Decimal, out: Decimal) -> AmmResult<Decimal> {
        if out >= quote_upper {
            return Err(AmmError::InsufficientLiquidity(format!(
                "requested {out} but the curve holds {quote_upper}"
            )));
        }
        let input = Self::input(base_upper, quote_upper, out)?;
        if input <= Decimal::ZERO {
            return Err(AmmError::InsufficientLiquidity(format!(
                "no input can buy {out} against uppers {base_upper}/{quote_upper}"
            )));
        }
        Ok(input)
    }
}
