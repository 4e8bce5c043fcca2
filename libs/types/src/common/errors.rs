//! Error types for quantity arithmetic and identifier validation
//!
//! Every failure here is an invalid-input condition: a malformed symbol, a
//! malformed ledger asset string, or arithmetic attempted between quantities
//! that do not describe the same token.

use crate::common::identifiers::TokenId;
use thiserror::Error;

/// Errors raised while building identifiers or combining quantities
#[derive(Debug, Error, Clone, PartialEq)]
pub enum QuantityError {
    /// Symbol code is empty, too long, or not upper-case ASCII
    #[error("Invalid symbol code: '{0}'")]
    InvalidSymbol(String),

    /// Precision outside the supported range
    #[error("Invalid precision {precision}: maximum supported is {max}")]
    InvalidPrecision { precision: u8, max: u8 },

    /// Ledger asset string could not be parsed (`"1.0000 TLOS"` form expected)
    #[error("Invalid asset string: '{0}'")]
    InvalidAsset(String),

    /// Token id string could not be parsed (`"contract-CODE"` form expected)
    #[error("Invalid token id: '{0}'")]
    InvalidTokenId(String),

    /// Unknown token type tag
    #[error("Invalid token type: '{0}' (expected 'connector' or 'liquidity')")]
    InvalidTokenType(String),

    /// Arithmetic between two different tokens
    #[error("Token mismatch: {left} vs {right}")]
    TokenMismatch { left: TokenId, right: TokenId },

    /// Same token carried with two different precisions
    #[error("Precision mismatch for {token}: {left} vs {right}")]
    PrecisionMismatch { token: TokenId, left: u8, right: u8 },

    /// Result does not fit in a Decimal
    #[error("Arithmetic overflow in {0}")]
    Overflow(&'static str),

    /// Divisor was zero
    #[error("Division by zero in {0}")]
    DivisionByZero(&'static str),
}
