//! # Relay Types
//!
//! Shared value types for the relay pricing, routing and liquidity crates.
//!
//! ## Design Philosophy
//!
//! - **Typed Identity**: tokens are keyed by [`TokenId`] (issuing contract + symbol code),
//!   never by bare strings
//! - **No Precision Loss**: every settlement amount is a [`Quantity`] backed by
//!   `rust_decimal::Decimal` and normalised to its token's precision
//! - **Loud Mismatches**: arithmetic across token identities or precisions fails with
//!   [`QuantityError`] instead of silently producing a meaningless number
//! - **Explicit Settings**: the ledger settings row is an immutable [`Settings`] snapshot
//!   handed to every function that needs it
//!
//! ## Quick Start
//!
//! ```rust
//! use relay_types::{Quantity, TokenId};
//!
//! let tlos = Quantity::parse_asset("200000.0000 TLOS", "eosio.token").unwrap();
//! assert_eq!(tlos.precision(), 4);
//! assert_eq!(tlos.token().to_string(), "eosio.token-TLOS");
//!
//! let fee = tlos.times(rust_decimal::Decimal::new(25, 4)).unwrap();
//! assert_eq!(fee.to_string(), "500.0000 TLOS");
//! ```

pub mod common;
pub mod settings;

pub use common::errors::QuantityError;
pub use common::identifiers::{Symbol, SymbolCode, TokenId, TokenType};
pub use common::quantity::Quantity;
pub use settings::Settings;

/// Decimal type used for every amount, balance and rate
pub use rust_decimal::{Decimal, RoundingStrategy};
