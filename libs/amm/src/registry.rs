//! # Token and pool registries
//!
//! ## Purpose
//!
//! Immutable snapshots of everything pricing and routing read: the multi-token
//! relay's token table ([`TokenRegistry`]) and the set of two-reserve pools
//! ([`PoolRegistry`]) in both their dry and hydrated forms.
//!
//! ## Integration Points
//!
//! - **Input**: rows decoded by `relay-config` and pools produced by the hydrator
//! - **Output**: [`crate::pricing::PricingContext`], [`crate::router::Router`],
//!   [`crate::liquidity`] sizing
//!
//! ## Lifecycle
//!
//! A dry pool is known only by identity and reserve symbols. Hydration attaches
//! live balances and produces a [`HydratedPool`]; [`PoolRegistry::with_hydration_pass`]
//! returns a new snapshot instead of mutating the old one. Lookups that miss
//! return an explicit error.

use crate::error::{AmmError, AmmResult};
use crate::feeds::RelayFeed;
use crate::liquidity;
use crate::reserve::ReserveState;
use relay_types::{Decimal, Quantity, Symbol, SymbolCode, TokenId, TokenType};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use tracing::{debug, info};

/// One row of the multi-token relay's token table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenEntry {
    pub symbol: Symbol,
    pub contract: String,
    pub balance: Decimal,
    pub depth: Decimal,
    pub reserve: Decimal,
    pub maker_pool: Decimal,
    pub token_type: TokenType,
}

impl TokenEntry {
    pub fn code(&self) -> &SymbolCode {
        &self.symbol.code
    }

    pub fn token_id(&self) -> TokenId {
        TokenId::new(self.contract.clone(), self.symbol.code.clone())
    }

    pub fn precision(&self) -> u8 {
        self.symbol.precision
    }

    /// Quantity of this token, truncated to its precision
    pub fn quantity(&self, amount: Decimal) -> Quantity {
        Quantity::new(amount, self.token_id(), self.symbol.precision)
    }

    pub fn is_connector(&self) -> bool {
        self.token_type == TokenType::Connector
    }

    pub fn is_liquidity(&self) -> bool {
        self.token_type == TokenType::Liquidity
    }
}

/// Token table keyed by symbol code
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenRegistry {
    tokens: BTreeMap<SymbolCode, TokenEntry>,
}

impl TokenRegistry {
    /// Build from rows, rejecting duplicates, negative amounts and connectors without depth
    pub fn new(entries: impl IntoIterator<Item = TokenEntry>) -> AmmResult<Self> {
        let mut tokens = BTreeMap::new();
        for entry in entries {
            let code = entry.code().clone();
            let negative = [entry.balance, entry.reserve, entry.maker_pool, entry.depth]
                .iter()
                .any(|amount| amount.is_sign_negative() && !amount.is_zero());
            if negative {
                return Err(AmmError::InvalidInput(format!(
                    "token {code} carries a negative amount"
                )));
            }
            if entry.is_connector() && entry.depth <= Decimal::ZERO {
                return Err(AmmError::ZeroDepth(code.to_string()));
            }
            if tokens.insert(code.clone(), entry).is_some() {
                return Err(AmmError::InvalidInput(format!("duplicate token {code}")));
            }
        }
        debug!(tokens = tokens.len(), "Token registry built");
        Ok(Self { tokens })
    }

    pub fn get(&self, code: &SymbolCode) -> AmmResult<&TokenEntry> {
        self.tokens
            .get(code)
            .ok_or_else(|| AmmError::UnknownToken(code.to_string()))
    }

    pub fn lookup(&self, code: &SymbolCode) -> Option<&TokenEntry> {
        self.tokens.get(code)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TokenEntry> {
        self.tokens.values()
    }

    pub fn connectors(&self) -> impl Iterator<Item = &TokenEntry> {
        self.iter().filter(|entry| entry.is_connector())
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Pool identity: the identity of the pool's share token
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoolId(pub TokenId);

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Share ("smart") token of a pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareToken {
    pub token: TokenId,
    pub precision: u8,
    /// Total supply, when it has been read
    pub supply: Option<Quantity>,
}

impl ShareToken {
    pub fn quantity(&self, amount: Decimal) -> Quantity {
        Quantity::new(amount, self.token.clone(), self.precision)
    }
}

/// Reserve side of a dry pool: identity only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReserveRef {
    pub contract: String,
    pub symbol: Symbol,
}

impl ReserveRef {
    pub fn token_id(&self) -> TokenId {
        TokenId::new(self.contract.clone(), self.symbol.code.clone())
    }
}

/// Pool known by identity and reserve symbols, awaiting balances
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DryPool {
    /// Account holding the pool's reserves
    pub contract: String,
    pub share: ShareToken,
    pub reserves: [ReserveRef; 2],
    /// Fee in parts per ten thousand
    pub fee: Decimal,
    pub enabled: bool,
    pub multi_contract: bool,
}

impl DryPool {
    pub fn id(&self) -> PoolId {
        PoolId(self.share.token.clone())
    }

    /// Attach live balances, in the same order as `reserves`
    ///
    /// Depth is the live balance and the amplifier is 1, a plain
    /// constant-product curve. Each balance must match its reserve's token
    /// and precision.
    pub fn hydrate(&self, balances: [Quantity; 2], supply: Option<Quantity>) -> AmmResult<HydratedPool> {
        let [first, second] = balances;
        let reserves = [
            Self::attach(&self.reserves[0], first)?,
            Self::attach(&self.reserves[1], second)?,
        ];
        Ok(HydratedPool {
            contract: self.contract.clone(),
            share: ShareToken {
                supply,
                ..self.share.clone()
            },
            reserves,
            fee: self.fee,
            amplifier: Decimal::ONE,
            enabled: self.enabled,
            multi_contract: self.multi_contract,
        })
    }

    fn attach(reserve: &ReserveRef, balance: Quantity) -> AmmResult<PoolReserve> {
        let expected = reserve.token_id();
        if balance.token() != &expected {
            return Err(AmmError::InvalidInput(format!(
                "balance for {} supplied for reserve {expected}",
                balance.token()
            )));
        }
        if balance.precision() != reserve.symbol.precision {
            return Err(AmmError::InvalidInput(format!(
                "balance {balance} has precision {}, reserve {expected} expects {}",
                balance.precision(),
                reserve.symbol.precision
            )));
        }
        Ok(PoolReserve {
            token: expected,
            depth: balance.amount(),
            balance,
        })
    }

    pub fn touches_any(&self, tokens: &HashSet<TokenId>) -> bool {
        self.reserves.iter().any(|r| tokens.contains(&r.token_id()))
    }
}

/// Reserve side with a live balance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolReserve {
    pub token: TokenId,
    pub balance: Quantity,
    pub depth: Decimal,
}

impl PoolReserve {
    pub fn state(&self) -> ReserveState {
        ReserveState::new(self.balance.amount(), self.depth)
    }
}

/// Pool with live balances, ready for pricing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HydratedPool {
    pub contract: String,
    pub share: ShareToken,
    pub reserves: [PoolReserve; 2],
    /// Fee in parts per ten thousand
    pub fee: Decimal,
    pub amplifier: Decimal,
    pub enabled: bool,
    pub multi_contract: bool,
}

impl HydratedPool {
    pub fn id(&self) -> PoolId {
        PoolId(self.share.token.clone())
    }

    pub fn reserve(&self, token: &TokenId) -> Option<&PoolReserve> {
        self.reserves.iter().find(|r| &r.token == token)
    }

    /// The side opposite `token`, if `token` is one of this pool's reserves
    pub fn opposite(&self, token: &TokenId) -> Option<&PoolReserve> {
        match &self.reserves {
            [a, b] if &a.token == token => Some(b),
            [a, b] if &b.token == token => Some(a),
            _ => None,
        }
    }

    /// `(same side, opposite side)` for `token`
    pub fn sides(&self, token: &TokenId) -> AmmResult<(&PoolReserve, &PoolReserve)> {
        let same = self.reserve(token).ok_or_else(|| {
            AmmError::UnknownToken(format!("{token} is not a reserve of pool {}", self.id()))
        })?;
        let opposite = self.opposite(token).ok_or_else(|| {
            AmmError::UnknownToken(format!("{token} is not a reserve of pool {}", self.id()))
        })?;
        Ok((same, opposite))
    }

    pub fn has_positive_balances(&self) -> bool {
        self.reserves.iter().all(|r| r.balance.is_positive())
    }

    /// Same-identity reserves; matched regardless of order
    pub fn same_pair(&self, other: &HydratedPool) -> bool {
        self.reserves
            .iter()
            .all(|r| other.reserves.iter().any(|o| o.token == r.token))
    }

    /// Check the data invariants pricing relies on
    pub fn validate(&self) -> AmmResult<()> {
        let invalid = |reason: String| AmmError::InvalidPool {
            pool: self.id().to_string(),
            reason,
        };
        let [a, b] = &self.reserves;
        if a.token == b.token {
            return Err(invalid(format!("both reserves are {}", a.token)));
        }
        for reserve in &self.reserves {
            if reserve.balance.token() != &reserve.token {
                return Err(invalid(format!(
                    "balance of {} is denominated in {}",
                    reserve.token,
                    reserve.balance.token()
                )));
            }
            if reserve.balance.is_negative() {
                return Err(invalid(format!("negative balance for {}", reserve.token)));
            }
            if reserve.depth <= Decimal::ZERO {
                return Err(AmmError::ZeroDepth(format!("{} in pool {}", reserve.token, self.id())));
            }
        }
        if self.fee < Decimal::ZERO || self.fee >= Decimal::from(10_000) {
            return Err(invalid(format!("fee {} outside [0, 10000)", self.fee)));
        }
        if self.amplifier <= Decimal::ZERO {
            return Err(invalid(format!("amplifier {} must be positive", self.amplifier)));
        }
        Ok(())
    }
}

/// Dry and hydrated pools, keyed by share-token identity
#[derive(Debug, Clone, Default)]
pub struct PoolRegistry {
    dry: BTreeMap<PoolId, DryPool>,
    hydrated: BTreeMap<PoolId, HydratedPool>,
}

impl PoolRegistry {
    pub fn new(dry: impl IntoIterator<Item = DryPool>) -> Self {
        let dry: BTreeMap<_, _> = dry.into_iter().map(|p| (p.id(), p)).collect();
        info!(pools = dry.len(), "Pool registry created");
        Self {
            dry,
            hydrated: BTreeMap::new(),
        }
    }

    /// New snapshot whose hydrated set is exactly `pools`
    ///
    /// A pool hydrated earlier but missing from this pass is dropped, so it
    /// is unavailable until a later pass hydrates it again.
    pub fn with_hydration_pass(&self, pools: impl IntoIterator<Item = HydratedPool>) -> Self {
        let next = Self {
            dry: self.dry.clone(),
            hydrated: pools.into_iter().map(|pool| (pool.id(), pool)).collect(),
        };
        debug!(
            dry = next.dry.len(),
            hydrated = next.hydrated.len(),
            "Pool registry snapshot updated"
        );
        next
    }

    pub fn dry_pools(&self) -> impl Iterator<Item = &DryPool> {
        self.dry.values()
    }

    pub fn hydrated_pools(&self) -> impl Iterator<Item = &HydratedPool> {
        self.hydrated.values()
    }

    /// A hydrated pool; a dry-only or unknown id is unavailable
    pub fn pool(&self, id: &PoolId) -> AmmResult<&HydratedPool> {
        if let Some(pool) = self.hydrated.get(id) {
            return Ok(pool);
        }
        if self.dry.contains_key(id) {
            return Err(AmmError::Unavailable(format!("pool {id} is not hydrated")));
        }
        Err(AmmError::Unavailable(format!("pool {id} is not registered")))
    }

    /// Snapshot without pools that hold any blacklisted reserve
    pub fn without_blacklisted(&self, blacklist: &[TokenId]) -> Self {
        let blocked: HashSet<TokenId> = blacklist.iter().cloned().collect();
        let dry: BTreeMap<_, _> = self
            .dry
            .iter()
            .filter(|(_, pool)| !pool.touches_any(&blocked))
            .map(|(id, pool)| (id.clone(), pool.clone()))
            .collect();
        let hydrated: BTreeMap<_, _> = self
            .hydrated
            .iter()
            .filter(|(_, pool)| !pool.reserves.iter().any(|r| blocked.contains(&r.token)))
            .map(|(id, pool)| (id.clone(), pool.clone()))
            .collect();
        let removed = self.dry.len() + self.hydrated.len() - dry.len() - hydrated.len();
        if removed > 0 {
            info!(removed, "Blacklisted pools filtered");
        }
        Self { dry, hydrated }
    }

    /// Deepest pool per reserve pair, deepest first
    ///
    /// Depth comes from the pool's feed; pools without a feed are skipped.
    pub fn convertible_pools(&self, feeds: &[RelayFeed]) -> Vec<&HydratedPool> {
        let mut ranked: Vec<(&HydratedPool, Decimal)> = self
            .hydrated
            .values()
            .filter_map(|pool| {
                let id = pool.id();
                feeds
                    .iter()
                    .find(|feed| feed.pool == id)
                    .map(|feed| (pool, feed.liquidity_depth))
            })
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));

        let mut kept: Vec<&HydratedPool> = Vec::new();
        for (pool, _) in ranked {
            if !kept.iter().any(|k| k.same_pair(pool)) {
                kept.push(pool);
            }
        }
        kept
    }

    /// Largest withdrawal per reserve for an owner of `owned` shares of pool `id`
    pub fn max_withdrawals(
        &self,
        id: &PoolId,
        supply: &Quantity,
        owned: &Quantity,
    ) -> AmmResult<[Quantity; 2]> {
        liquidity::max_withdrawals(self.pool(id)?, supply, owned)
    }
}
