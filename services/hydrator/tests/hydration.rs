//! Hydration behaviour against an in-memory ledger

use async_trait::async_trait;
use relay_amm::{DryPool, PoolId, PoolRegistry, ReserveRef, Router, ShareToken};
use relay_config::HydrationConfig;
use relay_hydrator::{
    HydrationError, HydrationResult, Hydrator, LedgerSnapshot, LedgerSource, LegacySettingsRow,
    PoolRow, ReserveRow, StaticSource,
};
use relay_types::{Quantity, Symbol, TokenId};
use rust_decimal_macros::dec;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn id(s: &str) -> TokenId {
    s.parse().unwrap()
}

fn legacy_contract(i: usize) -> String {
    format!("legacy{i}.swaps")
}

fn dry(i: usize) -> DryPool {
    let code = format!("LP{}", char::from(b'A' + i as u8));
    DryPool {
        contract: legacy_contract(i),
        share: ShareToken {
            token: TokenId::new("relays.swaps", code.parse().unwrap()),
            precision: 4,
            supply: None,
        },
        reserves: [
            ReserveRef {
                contract: "eosio.token".into(),
                symbol: Symbol::parse("4,TLOS").unwrap(),
            },
            ReserveRef {
                contract: "tokens.swaps".into(),
                symbol: Symbol::parse("4,TLOSD").unwrap(),
            },
        ],
        fee: dec!(0),
        enabled: true,
        multi_contract: false,
    }
}

/// Ledger with per-contract fault injection and concurrency accounting
#[derive(Default)]
struct MockLedger {
    balances: HashMap<(String, TokenId), Quantity>,
    settings: HashMap<String, LegacySettingsRow>,
    listing: Vec<PoolRow>,
    failing: HashSet<String>,
    listing_fails: bool,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockLedger {
    fn with_legacy(count: usize) -> Self {
        let mut ledger = Self::default();
        for i in 0..count {
            let holder = legacy_contract(i);
            ledger.balances.insert(
                (holder.clone(), id("eosio.token-TLOS")),
                Quantity::new(dec!(40000), id("eosio.token-TLOS"), 4),
            );
            ledger.balances.insert(
                (holder.clone(), id("tokens.swaps-TLOSD")),
                Quantity::new(dec!(10000), id("tokens.swaps-TLOSD"), 4),
            );
            ledger.settings.insert(
                holder,
                LegacySettingsRow {
                    smart_contract: "relays.swaps".into(),
                    smart_currency: String::new(),
                    smart_enabled: true,
                    enabled: true,
                    network: String::new(),
                    max_fee: 30000,
                    fee: 2500,
                },
            );
        }
        ledger
    }

    async fn track<T>(&self, label: String, value: T) -> HydrationResult<T> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(5)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if self.failing.contains(&label) {
            return Err(HydrationError::Source(format!("{label} timed out")));
        }
        Ok(value)
    }
}

#[async_trait]
impl LedgerSource for MockLedger {
    async fn reserve_balance(
        &self,
        holder: &str,
        token: &TokenId,
    ) -> HydrationResult<Option<Quantity>> {
        let value = self.balances.get(&(holder.to_string(), token.clone())).cloned();
        self.track(holder.to_string(), value).await
    }

    async fn share_supply(&self, share: &TokenId) -> HydrationResult<Option<Quantity>> {
        self.track(
            share.to_string(),
            Some(Quantity::new(dec!(1000), share.clone(), 4)),
        )
        .await
    }

    async fn legacy_settings(&self, contract: &str) -> HydrationResult<Option<LegacySettingsRow>> {
        let value = self.settings.get(contract).cloned();
        self.track(contract.to_string(), value).await
    }

    async fn pool_listing(&self) -> HydrationResult<Vec<PoolRow>> {
        if self.listing_fails {
            return Err(HydrationError::Source("listing unavailable".into()));
        }
        Ok(self.listing.clone())
    }
}

fn config(chunk_size: usize, chunk_wait_ms: u64) -> HydrationConfig {
    HydrationConfig {
        chunk_size,
        chunk_wait_ms,
        max_concurrent: 2,
    }
}

fn modern_row(code: &str, tlos: &str) -> PoolRow {
    PoolRow {
        currency: format!("4,{code}"),
        owner: "owner".into(),
        fee: 20,
        enabled: true,
        reserves: vec![
            ReserveRow {
                contract: "eosio.token".into(),
                balance: format!("{tlos} TLOS"),
            },
            ReserveRow {
                contract: "tokens.swaps".into(),
                balance: "10000.0000 TLOSD".into(),
            },
        ],
    }
}

#[tokio::test]
async fn legacy_pools_hydrate_in_chunks() {
    let pools: Vec<DryPool> = (0..6).map(dry).collect();
    let ledger = Arc::new(MockLedger::with_legacy(6));
    let hydrator = Hydrator::new(ledger.clone(), config(4, 1));

    let report = hydrator.hydrate_legacy(&pools).await;

    assert!(report.is_complete());
    assert_eq!(report.chunks, 2);
    assert_eq!(report.hydrated.len(), 6);
    let pool = &report.hydrated[0];
    assert_eq!(pool.fee, dec!(25));
    assert!(!pool.multi_contract);
    assert_eq!(pool.share.supply.as_ref().unwrap().amount(), dec!(1000));
    assert_eq!(pool.reserves[0].depth, dec!(40000));
    // four fetches per pool, at most one chunk of pools in flight
    assert!(ledger.max_in_flight.load(Ordering::SeqCst) <= 16);
}

#[tokio::test]
async fn chunks_wait_between_batches() {
    let pools: Vec<DryPool> = (0..9).map(dry).collect();
    let ledger = Arc::new(MockLedger::with_legacy(9));
    let hydrator = Hydrator::new(ledger, config(4, 40));

    let started = Instant::now();
    let report = hydrator.hydrate_legacy(&pools).await;

    assert_eq!(report.chunks, 3);
    // two pauses between three chunks
    assert!(started.elapsed() >= Duration::from_millis(80));
}

#[tokio::test]
async fn failing_pool_is_excluded_not_fatal() {
    let pools: Vec<DryPool> = (0..4).map(dry).collect();
    let mut ledger = MockLedger::with_legacy(4);
    ledger.failing.insert(legacy_contract(1));
    ledger.settings.remove(&legacy_contract(2));
    ledger
        .balances
        .remove(&(legacy_contract(3), id("tokens.swaps-TLOSD")));
    let hydrator = Hydrator::new(Arc::new(ledger), config(4, 1));

    let report = hydrator.hydrate_legacy(&pools).await;

    assert_eq!(report.hydrated.len(), 1);
    assert_eq!(report.failures.len(), 3);
    assert!(matches!(report.failures[0].error, HydrationError::Source(_)));
    assert_eq!(
        report.failures[1].error,
        HydrationError::MissingSettings(legacy_contract(2))
    );
    assert!(matches!(
        report.failures[2].error,
        HydrationError::MissingBalance { .. }
    ));
}

#[tokio::test]
async fn modern_listing_hydrates_with_bounded_supply_reads() {
    let mut ledger = MockLedger::default();
    ledger.listing = vec![
        modern_row("TLOSDX", "40000.0000"),
        modern_row("TLOSDY", "20000.0000"),
        modern_row("TLOSDZ", "0.0000"),
        modern_row("TLOSDW", "30000.0000"),
    ];
    let ledger = Arc::new(ledger);
    let hydrator = Hydrator::new(ledger.clone(), config(4, 1));

    let report = hydrator
        .hydrate_modern("relays.swaps", "tlosdx.swaps")
        .await
        .unwrap();

    // zero balance means zero depth, which is rejected
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].pool, "relays.swaps-TLOSDZ");
    let ids: Vec<String> = report.hydrated.iter().map(|p| p.id().to_string()).collect();
    assert_eq!(
        ids,
        vec!["relays.swaps-TLOSDW", "relays.swaps-TLOSDX", "relays.swaps-TLOSDY"]
    );
    assert!(report.hydrated.iter().all(|p| p.multi_contract && p.fee == dec!(20)));
    assert!(ledger.max_in_flight.load(Ordering::SeqCst) <= 2);
}

#[tokio::test]
async fn failed_listing_fails_the_call() {
    let ledger = MockLedger {
        listing_fails: true,
        ..MockLedger::default()
    };
    let hydrator = Hydrator::new(Arc::new(ledger), config(4, 1));
    assert!(hydrator
        .hydrate_modern("relays.swaps", "tlosdx.swaps")
        .await
        .is_err());
}

#[tokio::test]
async fn refresh_produces_routable_snapshot() {
    let mut ledger = MockLedger::with_legacy(1);
    ledger.listing = vec![modern_row("TLOSDX", "40000.0000")];
    let hydrator = Hydrator::new(Arc::new(ledger), config(4, 1));

    let registry = PoolRegistry::new([dry(0)]);
    let (next, report) = hydrator
        .refresh(&registry, "relays.swaps", "tlosdx.swaps")
        .await;

    assert!(report.is_complete());
    assert_eq!(next.hydrated_pools().count(), 2);
    // the original snapshot is untouched
    assert_eq!(registry.hydrated_pools().count(), 0);

    let router = Router::new(&next);
    let amount = Quantity::new(dec!(100), id("eosio.token-TLOS"), 4);
    let quote = router.get_return(&amount, &id("tokens.swaps-TLOSD")).unwrap();
    assert_eq!(quote.path.len(), 1);
    assert!(router
        .quote_pool(&PoolId(id("relays.swaps-LPA")), &amount)
        .is_ok());
}

#[tokio::test]
async fn refresh_drops_pools_that_fail_rehydration() {
    let registry = PoolRegistry::new([dry(0)]);
    let mut healthy = MockLedger::with_legacy(1);
    healthy.listing = vec![modern_row("TLOSDX", "40000.0000")];
    let (first, report) = Hydrator::new(Arc::new(healthy), config(4, 1))
        .refresh(&registry, "relays.swaps", "tlosdx.swaps")
        .await;
    assert!(report.is_complete());
    assert!(first.pool(&PoolId(id("relays.swaps-TLOSDX"))).is_ok());

    // modern supply read fails, legacy balance moved since the first pass
    let mut degraded = MockLedger::with_legacy(1);
    degraded.listing = vec![modern_row("TLOSDX", "40000.0000")];
    degraded.failing.insert("relays.swaps-TLOSDX".into());
    degraded.balances.insert(
        (legacy_contract(0), id("eosio.token-TLOS")),
        Quantity::new(dec!(50000), id("eosio.token-TLOS"), 4),
    );
    let (second, report) = Hydrator::new(Arc::new(degraded), config(4, 1))
        .refresh(&first, "relays.swaps", "tlosdx.swaps")
        .await;

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].pool, "relays.swaps-TLOSDX");
    assert!(second.pool(&PoolId(id("relays.swaps-TLOSDX"))).is_err());
    let amount = Quantity::new(dec!(100), id("eosio.token-TLOS"), 4);
    assert!(Router::new(&second)
        .quote_pool(&PoolId(id("relays.swaps-TLOSDX")), &amount)
        .is_err());

    let legacy = second.pool(&PoolId(id("relays.swaps-LPA"))).unwrap();
    assert_eq!(legacy.reserves[0].depth, dec!(50000));
    // the first snapshot still holds its own pools
    assert_eq!(first.hydrated_pools().count(), 2);
}

#[tokio::test]
async fn failed_listing_keeps_legacy_pools() {
    let ledger = MockLedger {
        listing_fails: true,
        ..MockLedger::with_legacy(2)
    };
    let registry = PoolRegistry::new([dry(0), dry(1)]);
    let (next, report) = Hydrator::new(Arc::new(ledger), config(4, 1))
        .refresh(&registry, "relays.swaps", "tlosdx.swaps")
        .await;

    assert_eq!(report.hydrated.len(), 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].pool, "tlosdx.swaps");
    assert!(matches!(report.failures[0].error, HydrationError::Source(_)));
    assert_eq!(next.hydrated_pools().count(), 2);

    let router = Router::new(&next);
    let amount = Quantity::new(dec!(100), id("eosio.token-TLOS"), 4);
    assert!(router.get_return(&amount, &id("tokens.swaps-TLOSD")).is_ok());
}

#[tokio::test]
async fn static_snapshot_round_trip() {
    let json = r#"{
        "share_contract": "relays.swaps",
        "relay_contract": "tlosdx.swaps",
        "pools": [{
            "currency": "4,TLOSDX",
            "owner": "owner",
            "fee": 20,
            "reserves": [
                { "contract": "eosio.token", "balance": "40000.0000 TLOS" },
                { "contract": "tokens.swaps", "balance": "10000.0000 TLOSD" }
            ]
        }],
        "supplies": [{ "contract": "relays.swaps", "supply": "5000.0000 TLOSDX" }]
    }"#;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("snapshot.json");
    std::fs::write(&path, json).unwrap();

    let snapshot = LedgerSnapshot::from_json(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let source = Arc::new(StaticSource::from_snapshot(&snapshot).unwrap());
    let hydrator = Hydrator::new(source, HydrationConfig::default());
    let (registry, report) = hydrator
        .refresh(
            &PoolRegistry::new(snapshot.dry_pools.clone()),
            &snapshot.share_contract,
            &snapshot.relay_contract,
        )
        .await;

    assert!(report.is_complete());
    let pool = registry.pool(&PoolId(id("relays.swaps-TLOSDX"))).unwrap();
    assert_eq!(pool.share.supply.as_ref().unwrap().amount(), dec!(5000));
}
