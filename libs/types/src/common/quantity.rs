//! Fixed-precision token quantities
//!
//! A [`Quantity`] is a decimal amount tagged with the token it counts and the
//! precision that token carries on the ledger. Amounts are normalised to that
//! precision on construction, rounding toward zero, so a quantity can always be
//! settled exactly.
//!
//! ## Design Principles
//!
//! - **No Floating Point**: amounts are `rust_decimal::Decimal`
//! - **Checked Arithmetic**: every combining operation returns `Result`
//! - **Type Safety**: combining two different tokens is a [`QuantityError`], never a number
//! - **Explicit Rounding**: callers choose toward-zero ([`Quantity::with_amount`]) or
//!   away-from-zero ([`Quantity::with_amount_rounded_up`]) when re-quantising

use crate::common::errors::QuantityError;
use crate::common::identifiers::{Symbol, SymbolCode, TokenId, MAX_PRECISION};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Decimal amount of one token at that token's ledger precision
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawQuantity")]
pub struct Quantity {
    amount: Decimal,
    token: TokenId,
    precision: u8,
}

#[derive(Deserialize)]
struct RawQuantity {
    amount: Decimal,
    token: TokenId,
    precision: u8,
}

impl From<RawQuantity> for Quantity {
    fn from(raw: RawQuantity) -> Self {
        Quantity::new(raw.amount, raw.token, raw.precision)
    }
}

fn quantise(amount: Decimal, precision: u8, strategy: RoundingStrategy) -> Decimal {
    let precision = u32::from(precision.min(MAX_PRECISION));
    let mut rounded = amount.round_dp_with_strategy(precision, strategy);
    rounded.rescale(precision);
    rounded
}

impl Quantity {
    /// Create a quantity, truncating `amount` to `precision` decimal places
    pub fn new(amount: Decimal, token: TokenId, precision: u8) -> Self {
        Self {
            amount: quantise(amount, precision, RoundingStrategy::ToZero),
            token,
            precision: precision.min(MAX_PRECISION),
        }
    }

    pub fn zero(token: TokenId, precision: u8) -> Self {
        Self::new(Decimal::ZERO, token, precision)
    }

    /// Parse a ledger asset string such as `"200000.0000 TLOS"` issued by `contract`
    ///
    /// The precision is the number of fractional digits written in the string.
    pub fn parse_asset(asset: &str, contract: &str) -> Result<Self, QuantityError> {
        let invalid = || QuantityError::InvalidAsset(asset.to_string());
        let (amount_str, code) = asset.trim().split_once(' ').ok_or_else(invalid)?;
        let precision = match amount_str.split_once('.') {
            Some((_, fraction)) => u8::try_from(fraction.len()).map_err(|_| invalid())?,
            None => 0,
        };
        if precision > MAX_PRECISION {
            return Err(QuantityError::InvalidPrecision {
                precision,
                max: MAX_PRECISION,
            });
        }
        let amount = Decimal::from_str(amount_str).map_err(|_| invalid())?;
        let code: SymbolCode = code.trim().parse()?;
        Ok(Self::new(amount, TokenId::new(contract, code), precision))
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn token(&self) -> &TokenId {
        &self.token
    }

    pub fn precision(&self) -> u8 {
        self.precision
    }

    pub fn symbol(&self) -> Symbol {
        Symbol {
            code: self.token.code.clone(),
            precision: self.precision,
        }
    }

    pub fn is_positive(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    pub fn is_negative(&self) -> bool {
        self.amount < Decimal::ZERO
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Same token, new amount truncated toward zero
    pub fn with_amount(&self, amount: Decimal) -> Self {
        Self::new(amount, self.token.clone(), self.precision)
    }

    /// Same token, new amount rounded away from zero
    pub fn with_amount_rounded_up(&self, amount: Decimal) -> Self {
        self.with_amount_rounded(amount, RoundingStrategy::AwayFromZero)
    }

    /// Same token, new amount quantised with an explicit strategy
    pub fn with_amount_rounded(&self, amount: Decimal, strategy: RoundingStrategy) -> Self {
        Self {
            amount: quantise(amount, self.precision, strategy),
            token: self.token.clone(),
            precision: self.precision,
        }
    }

    /// Fail unless `other` counts the same token at the same precision
    pub fn ensure_compatible(&self, other: &Quantity) -> Result<(), QuantityError> {
        if self.token != other.token {
            return Err(QuantityError::TokenMismatch {
                left: self.token.clone(),
                right: other.token.clone(),
            });
        }
        if self.precision != other.precision {
            return Err(QuantityError::PrecisionMismatch {
                token: self.token.clone(),
                left: self.precision,
                right: other.precision,
            });
        }
        Ok(())
    }

    pub fn checked_add(&self, other: &Quantity) -> Result<Self, QuantityError> {
        self.ensure_compatible(other)?;
        let amount = self
            .amount
            .checked_add(other.amount)
            .ok_or(QuantityError::Overflow("quantity addition"))?;
        Ok(self.with_amount(amount))
    }

    /// Subtraction; the result may be negative (remaining-reserve checks rely on that)
    pub fn checked_sub(&self, other: &Quantity) -> Result<Self, QuantityError> {
        self.ensure_compatible(other)?;
        let amount = self
            .amount
            .checked_sub(other.amount)
            .ok_or(QuantityError::Overflow("quantity subtraction"))?;
        Ok(self.with_amount(amount))
    }

    /// Scale by a plain multiplier, truncating to precision
    pub fn times(&self, multiplier: Decimal) -> Result<Self, QuantityError> {
        let amount = self
            .amount
            .checked_mul(multiplier)
            .ok_or(QuantityError::Overflow("quantity multiplication"))?;
        Ok(self.with_amount(amount))
    }

    /// Plain ratio `self / other` between two quantities of the same token
    pub fn ratio(&self, other: &Quantity) -> Result<Decimal, QuantityError> {
        self.ensure_compatible(other)?;
        if other.amount.is_zero() {
            return Err(QuantityError::DivisionByZero("quantity ratio"));
        }
        self.amount
            .checked_div(other.amount)
            .ok_or(QuantityError::Overflow("quantity ratio"))
    }

    /// The smaller of two compatible quantities
    pub fn lowest(self, other: Quantity) -> Result<Self, QuantityError> {
        self.ensure_compatible(&other)?;
        Ok(if other.amount < self.amount { other } else { self })
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.*} {}",
            usize::from(self.precision),
            self.amount,
            self.token.code
        )
    }
}
