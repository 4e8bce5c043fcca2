//! Token graph over pools
//!
//! Nodes are token identities, each pool is one undirected edge between its two
//! reserves. Path search is breadth-first, so the path returned has the fewest
//! hops; ties resolve in the order pools were added.

use crate::error::{AmmError, AmmResult};
use crate::registry::{HydratedPool, PoolId};
use relay_types::TokenId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use tracing::{debug, warn};

/// One pool traversed from `from` to `to`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathHop {
    pub pool: PoolId,
    pub from: TokenId,
    pub to: TokenId,
}

/// Ordered hops; each hop's `to` is the next hop's `from`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Path {
    pub from: TokenId,
    pub to: TokenId,
    pub hops: Vec<PathHop>,
}

impl Path {
    pub fn len(&self) -> usize {
        self.hops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hops.is_empty()
    }

    pub fn pools(&self) -> impl Iterator<Item = &PoolId> {
        self.hops.iter().map(|hop| &hop.pool)
    }
}

#[derive(Debug, Clone)]
struct PoolEdge {
    pool: PoolId,
    neighbour: TokenId,
}

/// Adjacency-list pool graph
#[derive(Debug, Clone, Default)]
pub struct PoolGraph {
    adjacency: BTreeMap<TokenId, Vec<PoolEdge>>,
    pool_count: usize,
}

impl PoolGraph {
    /// Graph over hydrated pools
    pub fn build<'a>(pools: impl IntoIterator<Item = &'a HydratedPool>) -> Self {
        Self::from_pairs(pools.into_iter().map(|pool| {
            (
                pool.id(),
                pool.reserves[0].token.clone(),
                pool.reserves[1].token.clone(),
            )
        }))
    }

    /// One edge per `(pool, a, b)`; self-referential and repeated pools are skipped
    pub fn from_pairs(pairs: impl IntoIterator<Item = (PoolId, TokenId, TokenId)>) -> Self {
        let mut graph = Self::default();
        let mut seen: HashSet<PoolId> = HashSet::new();

        for (pool, a, b) in pairs {
            if a == b {
                warn!(pool = %pool, token = %a, "Excluding pool with self-referential reserves");
                continue;
            }
            if !seen.insert(pool.clone()) {
                warn!(pool = %pool, "Excluding duplicate pool");
                continue;
            }
            graph.adjacency.entry(a.clone()).or_default().push(PoolEdge {
                pool: pool.clone(),
                neighbour: b.clone(),
            });
            graph
                .adjacency
                .entry(b)
                .or_default()
                .push(PoolEdge { pool, neighbour: a });
            graph.pool_count += 1;
        }

        debug!(
            pools = graph.pool_count,
            tokens = graph.adjacency.len(),
            "Pool graph built"
        );
        graph
    }

    pub fn pool_count(&self) -> usize {
        self.pool_count
    }

    pub fn token_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn contains_token(&self, token: &TokenId) -> bool {
        self.adjacency.contains_key(token)
    }

    /// Fewest-hop path from `from` to `to`
    pub fn find_path(&self, from: &TokenId, to: &TokenId) -> AmmResult<Path> {
        if from == to {
            return Err(AmmError::InvalidInput(format!(
                "cannot route {from} to itself"
            )));
        }
        let no_route = || AmmError::NoRoute {
            from: from.clone(),
            to: to.clone(),
        };
        if !self.contains_token(from) || !self.contains_token(to) {
            return Err(no_route());
        }

        // token -> (previous token, pool used to reach it)
        let mut parents: HashMap<&TokenId, (&TokenId, &PoolId)> = HashMap::new();
        let mut visited: HashSet<&TokenId> = HashSet::from([from]);
        let mut queue: VecDeque<&TokenId> = VecDeque::from([from]);

        while let Some(current) = queue.pop_front() {
            let Some(edges) = self.adjacency.get(current) else {
                continue;
            };
            for edge in edges {
                if !visited.insert(&edge.neighbour) {
                    continue;
                }
                parents.insert(&edge.neighbour, (current, &edge.pool));
                if &edge.neighbour == to {
                    return Ok(Self::unwind(&parents, from, to));
                }
                queue.push_back(&edge.neighbour);
            }
        }
        Err(no_route())
    }

    fn unwind<'a>(
        parents: &HashMap<&'a TokenId, (&'a TokenId, &'a PoolId)>,
        from: &'a TokenId,
        to: &'a TokenId,
    ) -> Path {
        let mut hops = Vec::new();
        let mut cursor: &'a TokenId = to;
        while let Some(&(previous, pool)) = parents.get(cursor) {
            hops.push(PathHop {
                pool: pool.clone(),
                from: previous.clone(),
                to: cursor.clone(),
            });
            if previous == from {
                break;
            }
            cursor = previous;
        }
        hops.reverse();
        Path {
            from: from.clone(),
            to: to.clone(),
            hops,
        }
    }
}
