//! Dry pool → hydrated pool
//!
//! Legacy pools are read one contract at a time, so they are hydrated in
//! fixed-size chunks: every pool of a chunk is fetched concurrently and the
//! hydrator pauses between chunks. Modern pools arrive in one listing; only
//! their share supplies need separate reads, bounded by `max_concurrent`.
//!
//! A pool that fails to hydrate is reported and left out. It never fails the
//! batch it was part of.

use crate::error::{HydrationError, HydrationResult};
use crate::rows::{FeeFormat, PoolRow};
use crate::source::LedgerSource;
use futures::future::join_all;
use futures::stream::{self, StreamExt};
use relay_amm::{DryPool, HydratedPool, PoolRegistry, ReserveRef};
use relay_config::HydrationConfig;
use relay_types::Quantity;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// A pool left out of a hydration pass
#[derive(Debug, Clone, PartialEq)]
pub struct HydrationFailure {
    /// Pool id, or the raw row label when no id could be formed
    pub pool: String,
    pub error: HydrationError,
}

/// Outcome of one hydration pass
#[derive(Debug, Clone, Default)]
pub struct HydrationReport {
    pub hydrated: Vec<HydratedPool>,
    pub failures: Vec<HydrationFailure>,
    /// Legacy chunks fetched
    pub chunks: usize,
}

impl HydrationReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    fn record(&mut self, pool: String, result: HydrationResult<HydratedPool>) {
        match result {
            Ok(hydrated) => self.hydrated.push(hydrated),
            Err(error) => {
                warn!(%pool, %error, "Pool failed to hydrate, excluding it");
                self.failures.push(HydrationFailure { pool, error });
            }
        }
    }

    fn merge(&mut self, other: HydrationReport) {
        self.hydrated.extend(other.hydrated);
        self.failures.extend(other.failures);
        self.chunks += other.chunks;
    }
}

pub struct Hydrator<S: LedgerSource> {
    source: Arc<S>,
    config: HydrationConfig,
}

impl<S: LedgerSource> Hydrator<S> {
    pub fn new(source: Arc<S>, config: HydrationConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &HydrationConfig {
        &self.config
    }

    /// Hydrate legacy pools chunk by chunk
    pub async fn hydrate_legacy(&self, pools: &[DryPool]) -> HydrationReport {
        let started = Instant::now();
        let mut report = HydrationReport::default();
        let chunk_size = self.config.chunk_size.max(1);

        for (index, chunk) in pools.chunks(chunk_size).enumerate() {
            if index > 0 {
                tokio::time::sleep(self.config.chunk_wait()).await;
            }
            let results = join_all(chunk.iter().map(|pool| self.hydrate_legacy_pool(pool))).await;
            for (pool, result) in chunk.iter().zip(results) {
                report.record(pool.id().to_string(), result);
            }
            report.chunks += 1;
            debug!(chunk = index, pools = chunk.len(), "Legacy chunk hydrated");
        }

        info!(
            hydrated = report.hydrated.len(),
            failed = report.failures.len(),
            chunks = report.chunks,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Legacy pools hydrated"
        );
        report
    }

    async fn hydrate_legacy_pool(&self, pool: &DryPool) -> HydrationResult<HydratedPool> {
        let holder = pool.contract.as_str();
        let [first, second] = &pool.reserves;
        let (settings, first_balance, second_balance, supply) = futures::join!(
            self.source.legacy_settings(holder),
            self.balance(holder, first),
            self.balance(holder, second),
            self.source.share_supply(&pool.share.token),
        );
        let settings = settings?.ok_or_else(|| HydrationError::MissingSettings(holder.to_string()))?;

        let mut hydrated = pool.hydrate([first_balance?, second_balance?], supply?)?;
        hydrated.fee = FeeFormat::Legacy.to_bps(settings.fee);
        hydrated.enabled = pool.enabled && settings.enabled;
        hydrated.multi_contract = false;
        hydrated.validate()?;
        Ok(hydrated)
    }

    async fn balance(&self, holder: &str, reserve: &ReserveRef) -> HydrationResult<Quantity> {
        let token = reserve.token_id();
        self.source
            .reserve_balance(holder, &token)
            .await?
            .ok_or_else(|| HydrationError::MissingBalance {
                holder: holder.to_string(),
                token,
            })
    }

    /// Hydrate every pool of the modern listing
    ///
    /// Only a failed listing read fails the call.
    pub async fn hydrate_modern(
        &self,
        share_contract: &str,
        relay_contract: &str,
    ) -> HydrationResult<HydrationReport> {
        let listing = self.source.pool_listing().await?;
        let total = listing.len();

        let results: Vec<(String, HydrationResult<HydratedPool>)> = stream::iter(listing)
            .map(|row| async move {
                let label = row
                    .share_token(share_contract)
                    .map(|token| token.to_string())
                    .unwrap_or_else(|_| row.currency.clone());
                let result = self.hydrate_modern_row(&row, share_contract, relay_contract).await;
                (label, result)
            })
            .buffer_unordered(self.config.max_concurrent.max(1))
            .collect()
            .await;

        let mut report = HydrationReport::default();
        for (label, result) in results {
            report.record(label, result);
        }
        report.hydrated.sort_by_key(|pool| pool.id());
        report.failures.sort_by(|a, b| a.pool.cmp(&b.pool));

        info!(
            listed = total,
            hydrated = report.hydrated.len(),
            failed = report.failures.len(),
            "Modern pools hydrated"
        );
        Ok(report)
    }

    async fn hydrate_modern_row(
        &self,
        row: &PoolRow,
        share_contract: &str,
        relay_contract: &str,
    ) -> HydrationResult<HydratedPool> {
        let share = row.share_token(share_contract)?;
        let supply = self.source.share_supply(&share).await?;
        row.hydrate(share_contract, relay_contract, supply)
    }

    /// New registry snapshot built from one full hydration pass
    ///
    /// Every legacy dry pool and every listed modern pool is read again. The
    /// snapshot holds only the pools this pass hydrated; a failed listing read
    /// is reported against `relay_contract` and leaves the legacy results intact.
    pub async fn refresh(
        &self,
        registry: &PoolRegistry,
        share_contract: &str,
        relay_contract: &str,
    ) -> (PoolRegistry, HydrationReport) {
        let legacy_pools: Vec<DryPool> = registry
            .dry_pools()
            .filter(|pool| !pool.multi_contract)
            .cloned()
            .collect();
        let (modern, legacy) = futures::join!(
            self.hydrate_modern(share_contract, relay_contract),
            self.hydrate_legacy(&legacy_pools),
        );

        let mut report = legacy;
        match modern {
            Ok(modern) => report.merge(modern),
            Err(error) => report.record(relay_contract.to_string(), Err(error)),
        }
        let next = registry.with_hydration_pass(report.hydrated.iter().cloned());
        (next, report)
    }
}
