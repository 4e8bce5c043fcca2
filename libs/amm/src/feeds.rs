//! USD price feeds derived from pool reserves
//!
//! Given a two-reserve pool where one side has a known USD unit price, the
//! other side's price follows from the reserve ratio:
//! `price_unknown = reserve_known / reserve_unknown * price_known`.
//! The pool's liquidity depth is the known side's reserve valued at its price.

use crate::error::{checked_div, checked_mul, AmmError, AmmResult};
use crate::registry::{HydratedPool, PoolId};
use relay_types::{Decimal, SymbolCode, TokenId};
use serde::{Deserialize, Serialize};

/// Externally sourced USD unit price for a symbol
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownPrice {
    pub symbol: SymbolCode,
    pub unit_price: Decimal,
}

/// Derived price of one reserve token through one pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayFeed {
    pub pool: PoolId,
    pub token: TokenId,
    pub cost_usd: Decimal,
    pub liquidity_depth: Decimal,
}

/// Feeds for both reserves of `pool`, known side first
pub fn build_feeds(pool: &HydratedPool, known: &[KnownPrice]) -> AmmResult<[RelayFeed; 2]> {
    let price_of = |token: &TokenId| {
        known
            .iter()
            .find(|price| price.symbol == token.code)
            .map(|price| price.unit_price)
    };

    let [first, second] = &pool.reserves;
    let (known_side, unknown_side, known_price) = match (price_of(&first.token), price_of(&second.token)) {
        (Some(price), _) => (first, second, price),
        (None, Some(price)) => (second, first, price),
        (None, None) => {
            return Err(AmmError::Unavailable(format!(
                "no known USD price for either reserve of pool {}",
                pool.id()
            )))
        }
    };

    if pool.reserves.iter().any(|r| r.balance.is_zero()) {
        return Err(AmmError::InsufficientLiquidity(format!(
            "pool {} has a zero reserve balance",
            pool.id()
        )));
    }

    let ratio = checked_div(
        known_side.balance.amount(),
        unknown_side.balance.amount(),
        "feed reserve ratio",
    )?;
    let unknown_price = checked_mul(ratio, known_price, "feed unit price")?;
    let liquidity_depth = checked_mul(known_side.balance.amount(), known_price, "feed liquidity depth")?;

    Ok([
        RelayFeed {
            pool: pool.id(),
            token: known_side.token.clone(),
            cost_usd: known_price,
            liquidity_depth,
        },
        RelayFeed {
            pool: pool.id(),
            token: unknown_side.token.clone(),
            cost_usd: unknown_price,
            liquidity_depth,
        },
    ])
}

/// Feeds for every pool that has a known price; the rest are skipped
pub fn build_all_feeds<'a>(
    pools: impl IntoIterator<Item = &'a HydratedPool>,
    known: &[KnownPrice],
) -> Vec<RelayFeed> {
    pools
        .into_iter()
        .filter_map(|pool| match build_feeds(pool, known) {
            Ok(feeds) => Some(feeds),
            Err(e) => {
                tracing::debug!(pool = %pool.id(), error = %e, "No feed for pool");
                None
            }
        })
        .flatten()
        .collect()
}
