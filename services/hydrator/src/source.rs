//! Ledger read seam
//!
//! [`LedgerSource`] is everything hydration needs from the chain. A missing row
//! is `Ok(None)`, never a zero quantity; transport failures are errors.
//! [`StaticSource`] serves a JSON [`LedgerSnapshot`] and backs the quote tool
//! and tests.

use crate::error::{HydrationError, HydrationResult};
use crate::rows::{LegacySettingsRow, PoolRow};
use async_trait::async_trait;
use relay_amm::DryPool;
use relay_types::{Quantity, TokenId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

#[async_trait]
pub trait LedgerSource: Send + Sync {
    /// Balance of `token` held by `holder`
    async fn reserve_balance(&self, holder: &str, token: &TokenId)
        -> HydrationResult<Option<Quantity>>;

    /// Current supply of a share token
    async fn share_supply(&self, share: &TokenId) -> HydrationResult<Option<Quantity>>;

    /// `settings` row of a legacy converter contract
    async fn legacy_settings(&self, contract: &str) -> HydrationResult<Option<LegacySettingsRow>>;

    /// Every pool of the modern multi-pool contract
    async fn pool_listing(&self) -> HydrationResult<Vec<PoolRow>>;
}

/// Balance held by one account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceRow {
    pub holder: String,
    /// Issuing contract
    pub contract: String,
    /// Asset string, e.g. `"40000.0000 TLOS"`
    pub balance: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplyRow {
    pub contract: String,
    pub supply: String,
}

/// Point-in-time ledger contents
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// Contract issuing modern share tokens
    #[serde(default)]
    pub share_contract: String,
    /// Multi-pool contract holding modern reserves
    #[serde(default)]
    pub relay_contract: String,
    #[serde(default)]
    pub dry_pools: Vec<DryPool>,
    #[serde(default)]
    pub pools: Vec<PoolRow>,
    #[serde(default)]
    pub legacy_settings: BTreeMap<String, LegacySettingsRow>,
    #[serde(default)]
    pub balances: Vec<BalanceRow>,
    #[serde(default)]
    pub supplies: Vec<SupplyRow>,
}

impl LedgerSnapshot {
    pub fn from_json(json: &str) -> HydrationResult<Self> {
        serde_json::from_str(json).map_err(|e| HydrationError::Snapshot(e.to_string()))
    }
}

/// In-memory [`LedgerSource`] over a [`LedgerSnapshot`]
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    balances: HashMap<(String, TokenId), Quantity>,
    supplies: HashMap<TokenId, Quantity>,
    legacy_settings: BTreeMap<String, LegacySettingsRow>,
    pools: Vec<PoolRow>,
}

impl StaticSource {
    pub fn from_snapshot(snapshot: &LedgerSnapshot) -> HydrationResult<Self> {
        let balances = snapshot
            .balances
            .iter()
            .map(|row| {
                let quantity = Quantity::parse_asset(&row.balance, &row.contract)?;
                Ok(((row.holder.clone(), quantity.token().clone()), quantity))
            })
            .collect::<HydrationResult<HashMap<_, _>>>()?;
        let supplies = snapshot
            .supplies
            .iter()
            .map(|row| {
                let quantity = Quantity::parse_asset(&row.supply, &row.contract)?;
                Ok((quantity.token().clone(), quantity))
            })
            .collect::<HydrationResult<HashMap<_, _>>>()?;
        debug!(
            balances = balances.len(),
            supplies = supplies.len(),
            pools = snapshot.pools.len(),
            "Static ledger source loaded"
        );
        Ok(Self {
            balances,
            supplies,
            legacy_settings: snapshot.legacy_settings.clone(),
            pools: snapshot.pools.clone(),
        })
    }
}

#[async_trait]
impl LedgerSource for StaticSource {
    async fn reserve_balance(
        &self,
        holder: &str,
        token: &TokenId,
    ) -> HydrationResult<Option<Quantity>> {
        Ok(self
            .balances
            .get(&(holder.to_string(), token.clone()))
            .cloned())
    }

    async fn share_supply(&self, share: &TokenId) -> HydrationResult<Option<Quantity>> {
        Ok(self.supplies.get(share).cloned())
    }

    async fn legacy_settings(&self, contract: &str) -> HydrationResult<Option<LegacySettingsRow>> {
        Ok(self.legacy_settings.get(contract).cloned())
    }

    async fn pool_listing(&self) -> HydrationResult<Vec<PoolRow>> {
        Ok(self.pools.clone())
    }
}
