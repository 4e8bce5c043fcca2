//! # Relay Hydrator
//!
//! ## Purpose
//!
//! Turns dry pools (identity and reserve symbols only) into hydrated pools by
//! reading live balances, share supplies and fee settings from the ledger.
//! This is the only asynchronous part of the workspace; everything it
//! produces is plain data handed to `relay-amm`.
//!
//! ## Integration Points
//!
//! - **Input**: a [`LedgerSource`] implementation and a [`relay_amm::PoolRegistry`]
//! - **Output**: a new registry snapshot plus a [`HydrationReport`] naming every
//!   pool that was left out and why
//! - **Configuration**: [`relay_config::HydrationConfig`] chunk size, chunk wait
//!   and concurrency bound

pub mod error;
pub mod hydrator;
pub mod rows;
pub mod source;

pub use error::{HydrationError, HydrationResult};
pub use hydrator::{HydrationFailure, HydrationReport, Hydrator};
pub use rows::{FeeFormat, LegacySettingsRow, PoolRow, ReserveRow};
pub use source::{BalanceRow, LedgerSnapshot, LedgerSource, StaticSource, SupplyRow};
