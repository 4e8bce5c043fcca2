//! # Token Identifiers
//!
//! Typed identity for every token the relay network touches.
//!
//! A token is identified by the account that issues it and its symbol code,
//! `eosio.token` + `TLOS` for example. Two tokens with the same code but
//! different issuers are different tokens, so registries and graphs key on
//! [`TokenId`] rather than on the code alone.
//!
//! ```rust
//! use relay_types::{SymbolCode, TokenId};
//!
//! let id: TokenId = "eosio.token-TLOS".parse().unwrap();
//! assert_eq!(id.contract, "eosio.token");
//! assert_eq!(id.code, SymbolCode::new("TLOS").unwrap());
//! ```

use crate::common::errors::QuantityError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Longest symbol code the ledger accepts
pub const MAX_SYMBOL_LEN: usize = 7;

/// Highest precision a symbol may carry
pub const MAX_PRECISION: u8 = 18;

/// Validated ledger symbol code (1-7 upper-case ASCII letters)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SymbolCode(String);

impl SymbolCode {
    pub fn new(code: &str) -> Result<Self, QuantityError> {
        let valid = !code.is_empty()
            && code.len() <= MAX_SYMBOL_LEN
            && code.bytes().all(|b| b.is_ascii_uppercase());
        if !valid {
            return Err(QuantityError::InvalidSymbol(code.to_string()));
        }
        Ok(Self(code.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SymbolCode {
    type Error = QuantityError;

    fn try_from(code: String) -> Result<Self, Self::Error> {
        Self::new(&code)
    }
}

impl From<SymbolCode> for String {
    fn from(code: SymbolCode) -> Self {
        code.0
    }
}

impl FromStr for SymbolCode {
    type Err = QuantityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for SymbolCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Symbol code together with its precision, ledger form `4,TLOS`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol {
    pub code: SymbolCode,
    pub precision: u8,
}

impl Symbol {
    pub fn new(code: SymbolCode, precision: u8) -> Result<Self, QuantityError> {
        if precision > MAX_PRECISION {
            return Err(QuantityError::InvalidPrecision {
                precision,
                max: MAX_PRECISION,
            });
        }
        Ok(Self { code, precision })
    }

    /// Parse the ledger `precision,CODE` form
    pub fn parse(s: &str) -> Result<Self, QuantityError> {
        let (precision, code) = s
            .split_once(',')
            .ok_or_else(|| QuantityError::InvalidSymbol(s.to_string()))?;
        let precision: u8 = precision
            .trim()
            .parse()
            .map_err(|_| QuantityError::InvalidSymbol(s.to_string()))?;
        Self::new(SymbolCode::new(code.trim())?, precision)
    }
}

impl TryFrom<String> for Symbol {
    type Error = QuantityError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.to_string()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.precision, self.code)
    }
}

/// Token identity: issuing contract plus symbol code
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TokenId {
    pub contract: String,
    pub code: SymbolCode,
}

impl TokenId {
    pub fn new(contract: impl Into<String>, code: SymbolCode) -> Self {
        Self {
            contract: contract.into(),
            code,
        }
    }
}

impl FromStr for TokenId {
    type Err = QuantityError;

    /// Parse the `contract-CODE` form used as the token id everywhere upstream
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (contract, code) = s
            .rsplit_once('-')
            .ok_or_else(|| QuantityError::InvalidTokenId(s.to_string()))?;
        if contract.is_empty() {
            return Err(QuantityError::InvalidTokenId(s.to_string()));
        }
        Ok(Self::new(contract, SymbolCode::new(code)?))
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.contract, self.code)
    }
}

/// How a token in the multi-token registry is priced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Priced directly from its own balance and depth
    Connector,
    /// Maker token, priced as a claim on the connector balances held for it
    Liquidity,
}

impl FromStr for TokenType {
    type Err = QuantityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "connector" => Ok(Self::Connector),
            "liquidity" => Ok(Self::Liquidity),
            other => Err(QuantityError::InvalidTokenType(other.to_string())),
        }
    }
}
