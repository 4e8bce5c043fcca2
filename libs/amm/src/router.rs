//! # Router
//!
//! ## Purpose
//!
//! Composes per-pool quotes across a multi-hop path. [`find_return`] walks the
//! hops forward carrying each hop's output into the next; [`find_cost`] walks
//! them backward from a desired output to the required input. A path's
//! slippage is the worst single hop's slippage, not an average.
//!
//! ## Pool eligibility
//!
//! [`Router`] only prices hydrated, enabled pools with positive balances that
//! pass [`HydratedPool::validate`]. Everything else is excluded from the graph
//! with a warning, so one bad pool never blocks a quote through the others.

use crate::error::{AmmError, AmmResult};
use crate::graph::{Path, PoolGraph};
use crate::pool_traits::{ConversionPool, HopQuote};
use crate::registry::{HydratedPool, PoolId, PoolRegistry};
use relay_types::{Decimal, Quantity, TokenId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Composed quote across a path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathQuote {
    pub input: Quantity,
    pub output: Quantity,
    /// Per-hop quotes in path order
    pub hops: Vec<HopQuote>,
    pub highest_slippage: Decimal,
}

fn highest_slippage(hops: &[HopQuote]) -> Decimal {
    hops.iter()
        .map(|hop| hop.slippage)
        .max()
        .unwrap_or(Decimal::ZERO)
}

/// Convert `amount` through `pools` in order
pub fn find_return<P: ConversionPool>(amount: &Quantity, pools: &[&P]) -> AmmResult<PathQuote> {
    if pools.is_empty() {
        return Err(AmmError::InvalidInput("empty path".into()));
    }
    let mut running = amount.clone();
    let mut hops = Vec::with_capacity(pools.len());
    for pool in pools {
        let hop = pool.quote_return(&running)?;
        running = hop.output.clone();
        hops.push(hop);
    }
    let highest_slippage = highest_slippage(&hops);
    debug!(input = %amount, output = %running, hops = hops.len(), %highest_slippage, "Found return");
    Ok(PathQuote {
        input: amount.clone(),
        output: running,
        hops,
        highest_slippage,
    })
}

/// Input needed to receive `desired` out of the last of `pools`
pub fn find_cost<P: ConversionPool>(desired: &Quantity, pools: &[&P]) -> AmmResult<PathQuote> {
    if pools.is_empty() {
        return Err(AmmError::InvalidInput("empty path".into()));
    }
    let mut running = desired.clone();
    let mut hops = Vec::with_capacity(pools.len());
    for pool in pools.iter().rev() {
        let from = pool.counterpart(running.token())?.clone();
        let hop = pool.quote_cost(&from, &running)?;
        running = hop.input.clone();
        hops.push(hop);
    }
    hops.reverse();
    let highest_slippage = highest_slippage(&hops);
    debug!(output = %desired, input = %running, hops = hops.len(), %highest_slippage, "Found cost");
    Ok(PathQuote {
        input: running,
        output: desired.clone(),
        hops,
        highest_slippage,
    })
}

/// A path and its composed quote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub path: Path,
    pub quote: PathQuote,
}

/// Routing view over one registry snapshot
pub struct Router<'a> {
    registry: &'a PoolRegistry,
    graph: PoolGraph,
}

impl<'a> Router<'a> {
    pub fn new(registry: &'a PoolRegistry) -> Self {
        let routable: Vec<&HydratedPool> = registry
            .hydrated_pools()
            .filter(|pool| Self::is_routable(pool))
            .collect();
        let graph = PoolGraph::build(routable.iter().copied());
        info!(
            hydrated = registry.hydrated_pools().count(),
            routable = graph.pool_count(),
            "Router ready"
        );
        Self { registry, graph }
    }

    fn is_routable(pool: &HydratedPool) -> bool {
        if !pool.enabled {
            debug!(pool = %pool.id(), "Skipping disabled pool");
            return false;
        }
        if !pool.has_positive_balances() {
            warn!(pool = %pool.id(), "Skipping pool with an empty reserve");
            return false;
        }
        if let Err(e) = pool.validate() {
            warn!(pool = %pool.id(), error = %e, "Skipping invalid pool");
            return false;
        }
        true
    }

    pub fn graph(&self) -> &PoolGraph {
        &self.graph
    }

    pub fn find_path(&self, from: &TokenId, to: &TokenId) -> AmmResult<Path> {
        self.graph.find_path(from, to)
    }

    fn path_pools(&self, path: &Path) -> AmmResult<Vec<&'a HydratedPool>> {
        path.pools().map(|id| self.registry.pool(id)).collect()
    }

    /// Best-effort return for converting `amount` into `to`
    pub fn get_return(&self, amount: &Quantity, to: &TokenId) -> AmmResult<Route> {
        let path = self.find_path(amount.token(), to)?;
        let pools = self.path_pools(&path)?;
        let quote = find_return(amount, &pools)?;
        Ok(Route { path, quote })
    }

    /// Input of `from` needed to receive `desired`
    pub fn get_cost(&self, from: &TokenId, desired: &Quantity) -> AmmResult<Route> {
        let path = self.find_path(from, desired.token())?;
        let pools = self.path_pools(&path)?;
        let quote = find_cost(desired, &pools)?;
        Ok(Route { path, quote })
    }

    /// Quote through one specific pool; an unroutable pool is unavailable
    pub fn quote_pool(&self, id: &PoolId, amount: &Quantity) -> AmmResult<HopQuote> {
        let pool = self.registry.pool(id)?;
        if !Self::is_routable(pool) {
            return Err(AmmError::Unavailable(format!(
                "pool {id} is disabled, empty or invalid"
            )));
        }
        pool.quote_return(amount)
    }
}
