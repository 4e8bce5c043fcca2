//! Error taxonomy for pricing, liquidity and routing
//!
//! Every variant is a local, recoverable condition reported to the immediate
//! caller. [`AmmError::kind`] collapses the variants into the categories a
//! caller actually branches on: retry smaller, fix the input, exclude the pool,
//! split the withdrawal, or report that no route exists.

use relay_types::{Decimal, QuantityError, SymbolCode, TokenId};
use thiserror::Error;

pub type AmmResult<T> = Result<T, AmmError>;

/// Caller-facing error category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed, non-positive or mismatched input; never retryable as-is
    InvalidInput,
    /// Curve clamp or reserve check failure; retry with a smaller size
    InsufficientLiquidity,
    /// Missing pool, settings row, hydration or price feed
    Unavailable,
    /// Withdrawal too large for a single call
    ConcentrationGuard,
    /// No connecting sequence of pools
    NoRoute,
    /// Data invariant violation to fix at configuration time
    Misconfiguration,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AmmError {
    #[error(transparent)]
    Quantity(#[from] QuantityError),

    #[error("Unknown token: {0}")]
    UnknownToken(String),

    #[error("Quantity must be positive, got {0}")]
    NonPositiveQuantity(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Insufficient liquidity: {0}")]
    InsufficientLiquidity(String),

    #[error("{token} insufficient remaining reserve: {reserve} available, {requested} requested")]
    InsufficientReserve {
        token: TokenId,
        reserve: Decimal,
        requested: Decimal,
    },

    #[error("Share amount {requested} exceeds owned balance {owned}")]
    InsufficientShares { requested: Decimal, owned: Decimal },

    #[error("Unavailable: {0}")]
    Unavailable(String),

    #[error(
        "Withdrawal is {fraction} of the pool's share supply, limit is {limit} per call; \
         withdraw in multiple steps instead"
    )]
    ConcentrationGuard { fraction: Decimal, limit: Decimal },

    #[error("No route from {from} to {to}")]
    NoRoute { from: TokenId, to: TokenId },

    #[error("Depth of {0} must be strictly positive")]
    ZeroDepth(String),

    #[error("Maker token {0} has a zero registry balance")]
    ZeroMakerBalance(SymbolCode),

    #[error("Invalid pool {pool}: {reason}")]
    InvalidPool { pool: String, reason: String },

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("Arithmetic overflow or division by zero in {0}")]
    Arithmetic(&'static str),
}

impl AmmError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AmmError::Quantity(_)
            | AmmError::UnknownToken(_)
            | AmmError::NonPositiveQuantity(_)
            | AmmError::InvalidInput(_)
            | AmmError::InvalidPool { .. }
            | AmmError::InsufficientShares { .. }
            | AmmError::Arithmetic(_) => ErrorKind::InvalidInput,
            AmmError::InsufficientLiquidity(_) | AmmError::InsufficientReserve { .. } => {
                ErrorKind::InsufficientLiquidity
            }
            AmmError::Unavailable(_) | AmmError::ZeroMakerBalance(_) => ErrorKind::Unavailable,
            AmmError::ConcentrationGuard { .. } => ErrorKind::ConcentrationGuard,
            AmmError::NoRoute { .. } => ErrorKind::NoRoute,
            AmmError::ZeroDepth(_) | AmmError::InvalidSettings(_) => ErrorKind::Misconfiguration,
        }
    }

    /// Whether the same request could succeed with a smaller amount
    pub fn is_retryable_smaller(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::InsufficientLiquidity | ErrorKind::ConcentrationGuard
        )
    }
}

pub(crate) fn checked_div(
    numerator: Decimal,
    denominator: Decimal,
    context: &'static str,
) -> AmmResult<Decimal> {
    numerator
        .checked_div(denominator)
        .ok_or(AmmError::Arithmetic(context))
}

pub(crate) fn checked_mul(left: Decimal, right: Decimal, context: &'static str) -> AmmResult<Decimal> {
    left.checked_mul(right).ok_or(AmmError::Arithmetic(context))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_kinds() {
        assert_eq!(
            AmmError::ZeroDepth("TLOS".into()).kind(),
            ErrorKind::Misconfiguration
        );
        assert_eq!(
            AmmError::InsufficientLiquidity("clamp".into()).kind(),
            ErrorKind::InsufficientLiquidity
        );
        let guard = AmmError::ConcentrationGuard {
            fraction: dec!(0.3),
            limit: dec!(0.3),
        };
        assert_eq!(guard.kind(), ErrorKind::ConcentrationGuard);
        assert!(guard.is_retryable_smaller());
        assert!(!AmmError::UnknownToken("X".into()).is_retryable_smaller());
    }

    #[test]
    fn test_quantity_errors_are_invalid_input() {
        let err: AmmError = QuantityError::InvalidSymbol("x".into()).into();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_checked_div_reports_zero_divisor() {
        assert_eq!(
            checked_div(dec!(1), dec!(0), "test"),
            Err(AmmError::Arithmetic("test"))
        );
        assert_eq!(checked_div(dec!(1), dec!(4), "test").unwrap(), dec!(0.25));
    }
}
