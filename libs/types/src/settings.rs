//! Ledger settings snapshot
//!
//! One row read from the relay contract's settings table per top-level
//! operation. Every pricing and routing function takes it as an explicit
//! argument; nothing in the workspace keeps a global copy.

use crate::common::identifiers::{Symbol, SymbolCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Denominator for fees expressed in parts per ten thousand
pub const FEE_DENOMINATOR: u32 = 10_000;

/// Immutable settings snapshot for the multi-token relay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Conversion fee in parts per ten thousand
    pub fee: u32,
    /// Curve steepness; `1` is a plain constant-product curve
    pub amplifier: Decimal,
    /// Contract issuing the proxy token
    pub proxy_contract: String,
    /// Connector token the maker token is priced through
    pub proxy_token: Symbol,
    /// Liquidity ("maker") token
    pub maker_token: Symbol,
}

impl Settings {
    pub fn proxy_code(&self) -> &SymbolCode {
        &self.proxy_token.code
    }

    pub fn maker_code(&self) -> &SymbolCode {
        &self.maker_token.code
    }

    /// A fee at or above the denominator would make every inverse quote diverge
    pub fn has_valid_fee(&self) -> bool {
        self.fee < FEE_DENOMINATOR
    }
}
