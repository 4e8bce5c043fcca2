//! Amplified reserve model
//!
//! Converts a pool side's live balance `B` and configured depth `D` into the
//! virtual upper balance fed to the bonding curve:
//!
//! ```text
//! ratio = B / D
//! upper = A*D - D + D*ratio        (= D * (A - 1 + ratio))
//! ```
//!
//! With `A = 1` the upper equals the balance and the curve is a plain constant
//! product. Larger amplifiers add `(A - 1) * D` of virtual liquidity to each
//! side, flattening the curve around the calibration point.

use crate::error::{checked_div, checked_mul, AmmError, AmmResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Balance and depth of one pool side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReserveState {
    pub balance: Decimal,
    pub depth: Decimal,
}

impl ReserveState {
    pub fn new(balance: Decimal, depth: Decimal) -> Self {
        Self { balance, depth }
    }
}

/// Virtual upper balance computation
pub struct ReserveModel;

impl ReserveModel {
    /// Virtual upper balance for one side
    ///
    /// `label` names the side in the error raised for a non-positive depth.
    pub fn virtual_upper(
        balance: Decimal,
        depth: Decimal,
        amplifier: Decimal,
        label: &str,
    ) -> AmmResult<Decimal> {
        if depth <= Decimal::ZERO {
            return Err(AmmError::ZeroDepth(label.to_string()));
        }
        let ratio = checked_div(balance, depth, "reserve ratio")?;
        let amplified = checked_mul(amplifier, depth, "amplified depth")?;
        let scaled = checked_mul(depth, ratio, "scaled balance")?;
        (amplified - depth)
            .checked_add(scaled)
            .ok_or(AmmError::Arithmetic("virtual upper"))
    }

    /// `(base_upper, quote_upper)` for a pair of sides under one amplifier
    pub fn uppers(
        base: &ReserveState,
        quote: &ReserveState,
        amplifier: Decimal,
    ) -> AmmResult<(Decimal, Decimal)> {
        let base_upper = Self::virtual_upper(base.balance, base.depth, amplifier, "base reserve")?;
        let quote_upper =
            Self::virtual_upper(quote.balance, quote.depth, amplifier, "quote reserve")?;
        Ok((base_upper, quote_upper))
    }
}
