//! Ledger row shapes read during hydration
//!
//! Legacy pools each run their own converter contract and keep their fee in a
//! per-contract `settings` row in millionths. Modern pools live together in one
//! multi-pool contract, are listed in bulk with their reserve balances inline
//! and keep their fee in parts per ten thousand. Both are normalised to parts
//! per ten thousand here.

use crate::error::HydrationError;
use relay_amm::{HydratedPool, PoolReserve, ShareToken};
use relay_types::{Decimal, Quantity, Symbol, TokenId};
use serde::{Deserialize, Serialize};

/// Fee encoding of a pool row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeFormat {
    /// Millionths (`2500` is 0.25%)
    Legacy,
    /// Parts per ten thousand (`25` is 0.25%)
    Modern,
}

impl FeeFormat {
    /// Raw fee in parts per ten thousand
    pub fn to_bps(self, raw: u64) -> Decimal {
        match self {
            FeeFormat::Legacy => Decimal::from(raw) / Decimal::ONE_HUNDRED,
            FeeFormat::Modern => Decimal::from(raw),
        }
    }
}

fn enabled_by_default() -> bool {
    true
}

/// Legacy converter `settings` row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacySettingsRow {
    #[serde(default)]
    pub smart_contract: String,
    #[serde(default)]
    pub smart_currency: String,
    #[serde(default = "enabled_by_default")]
    pub smart_enabled: bool,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default)]
    pub network: String,
    #[serde(default)]
    pub max_fee: u64,
    pub fee: u64,
}

/// One reserve of a modern pool listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReserveRow {
    pub contract: String,
    /// Asset string, e.g. `"40000.0000 TLOS"`
    pub balance: String,
}

impl ReserveRow {
    pub fn quantity(&self) -> Result<Quantity, HydrationError> {
        Ok(Quantity::parse_asset(&self.balance, &self.contract)?)
    }
}

/// One row of the modern multi-pool listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolRow {
    /// Share token symbol, e.g. `"4,TLOSDX"`
    pub currency: String,
    pub owner: String,
    pub fee: u64,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    pub reserves: Vec<ReserveRow>,
}

impl PoolRow {
    pub fn share_symbol(&self) -> Result<Symbol, HydrationError> {
        Ok(Symbol::parse(&self.currency)?)
    }

    /// Share token identity under the contract issuing modern share tokens
    pub fn share_token(&self, share_contract: &str) -> Result<TokenId, HydrationError> {
        Ok(TokenId::new(share_contract, self.share_symbol()?.code))
    }

    /// Hydrated pool with depth taken from the live balances
    pub fn hydrate(
        &self,
        share_contract: &str,
        relay_contract: &str,
        supply: Option<Quantity>,
    ) -> Result<HydratedPool, HydrationError> {
        let invalid = |reason: String| HydrationError::InvalidRow {
            row: self.currency.clone(),
            reason,
        };
        let [first, second] = self.reserves.as_slice() else {
            return Err(invalid(format!(
                "expected two reserves, found {}",
                self.reserves.len()
            )));
        };
        let reserve = |row: &ReserveRow| -> Result<PoolReserve, HydrationError> {
            let balance = row.quantity()?;
            Ok(PoolReserve {
                token: balance.token().clone(),
                depth: balance.amount(),
                balance,
            })
        };
        let symbol = self.share_symbol()?;
        let pool = HydratedPool {
            contract: relay_contract.to_string(),
            share: ShareToken {
                token: TokenId::new(share_contract, symbol.code),
                precision: symbol.precision,
                supply,
            },
            reserves: [reserve(first)?, reserve(second)?],
            fee: FeeFormat::Modern.to_bps(self.fee),
            amplifier: Decimal::ONE,
            enabled: self.enabled,
            multi_contract: true,
        };
        pool.validate()?;
        Ok(pool)
    }
}
