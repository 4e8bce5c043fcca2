//! # Relay AMM Library - Amplified Two-Reserve Pool Mathematics
//!
//! ## Purpose
//!
//! Exact decimal arithmetic for converting between tokens through two-reserve
//! relay pools whose depth is amplified by a shared factor. Covers spot and
//! effective pricing, fee gross-up and gross-down, proportional liquidity
//! deposits and withdrawals, fewest-hop routing across many pools and the
//! per-pool price feeds used to rank them.
//!
//! ## Integration Points
//!
//! - **Input Sources**: Token and pool rows decoded by `relay-config`, balances
//!   attached by the hydrator service
//! - **Output Destinations**: Quote CLI, transaction builders that submit the
//!   conversions and withdrawal steps computed here
//! - **Precision**: Every value is a [`relay_types::Quantity`] bound to its
//!   token's precision; nothing is ever converted to floating point
//!
//! ## Architecture Role
//!
//! ```text
//! ReserveModel ──► BondingCurve ──► PricingContext   (single proxy/maker relay)
//!                        │
//!                        └────────► ConversionPool ──► Router ◄── PoolGraph
//!                                                        ▲
//! PoolRegistry (dry ─► hydrated snapshots) ──────────────┘
//!        │
//!        └──► liquidity ──► WithdrawalPlan ──► WithdrawalSequence
//! ```
//!
//! ## Rounding
//!
//! Amounts a user receives truncate toward zero. Amounts a user must provide
//! round up, so a cost quote never undershoots the return it was derived from.

pub mod bonding;
pub mod error;
pub mod feeds;
pub mod graph;
pub mod liquidity;
pub mod pool_traits;
pub mod pricing;
pub mod registry;
pub mod reserve;
pub mod router;
pub mod withdrawal;

pub use bonding::BondingCurve;
pub use error::{AmmError, AmmResult, ErrorKind};
pub use feeds::{build_all_feeds, build_feeds, KnownPrice, RelayFeed};
pub use graph::{Path, PathHop, PoolGraph};
pub use liquidity::{OpposingDeposit, OpposingWithdraw};
pub use pool_traits::{ConversionPool, HopQuote};
pub use pricing::PricingContext;
pub use registry::{
    DryPool, HydratedPool, PoolId, PoolRegistry, PoolReserve, ReserveRef, ShareToken, TokenEntry,
    TokenRegistry,
};
pub use reserve::{ReserveModel, ReserveState};
pub use router::{find_cost, find_return, PathQuote, Route, Router};
pub use withdrawal::{
    Burn, SequenceState, StepOutcome, WithdrawalPlan, WithdrawalSequence, WithdrawalStep,
};

/// Common types for AMM calculations
pub use rust_decimal::Decimal;
pub use rust_decimal_macros::dec;
