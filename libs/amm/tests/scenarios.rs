//! End-to-end pricing, routing and withdrawal scenarios

use relay_amm::{
    liquidity, ConversionPool, DryPool, HydratedPool, KnownPrice, PoolId, PoolRegistry,
    PoolReserve, PricingContext, ReserveRef, Router, SequenceState, ShareToken, TokenEntry,
    TokenRegistry, WithdrawalSequence,
};
use relay_types::{Decimal, Quantity, Settings, Symbol, SymbolCode, TokenId, TokenType};
use rust_decimal_macros::dec;

fn id(s: &str) -> TokenId {
    s.parse().unwrap()
}

fn code(s: &str) -> SymbolCode {
    SymbolCode::new(s).unwrap()
}

fn entry(
    sym: &str,
    contract: &str,
    balance: Decimal,
    depth: Decimal,
    maker_pool: Decimal,
    token_type: TokenType,
) -> TokenEntry {
    TokenEntry {
        symbol: Symbol::parse(sym).unwrap(),
        contract: contract.into(),
        balance,
        depth,
        reserve: balance,
        maker_pool,
        token_type,
    }
}

fn relay_tokens(maker_balance: Decimal) -> TokenRegistry {
    TokenRegistry::new([
        entry("4,TLOS", "eosio.token", dec!(200000), dec!(25000), dec!(1000000), TokenType::Connector),
        entry("4,TLOSD", "tokens.swaps", dec!(50000), dec!(10000), dec!(0), TokenType::Connector),
        entry("4,TLOSM", "tokens.swaps", maker_balance, dec!(0), dec!(0), TokenType::Liquidity),
    ])
    .unwrap()
}

fn settings(fee: u32, amplifier: Decimal) -> Settings {
    Settings {
        fee,
        amplifier,
        proxy_contract: "eosio.token".into(),
        proxy_token: Symbol::parse("4,TLOS").unwrap(),
        maker_token: Symbol::parse("4,TLOSM").unwrap(),
    }
}

fn pool(share: &str, a: &str, b: &str, balance_a: Decimal, balance_b: Decimal) -> HydratedPool {
    let reserve = |t: &str, balance: Decimal| PoolReserve {
        token: id(t),
        balance: Quantity::new(balance, id(t), 4),
        depth: balance,
    };
    HydratedPool {
        contract: "relays.swaps".into(),
        share: ShareToken {
            token: id(share),
            precision: 4,
            supply: Some(Quantity::new(dec!(1000), id(share), 4)),
        },
        reserves: [reserve(a, balance_a), reserve(b, balance_b)],
        fee: dec!(0),
        amplifier: dec!(1),
        enabled: true,
        multi_contract: true,
    }
}

#[test]
fn unit_amplifier_price_matches_constant_product() {
    let tokens = relay_tokens(dec!(500000));
    let s = settings(0, dec!(1));
    let ctx = PricingContext::new(&tokens, &s).unwrap();

    let (base, quote) = ctx.get_uppers(&code("TLOS"), &code("TLOSD")).unwrap();
    assert_eq!((base, quote), (dec!(200000), dec!(50000)));

    let amount = Quantity::new(dec!(100), id("eosio.token-TLOS"), 4);
    let raw = relay_amm::BondingCurve::output(base, quote, amount.amount()).unwrap();
    assert_eq!(raw, dec!(100) * dec!(50000) / dec!(200100));

    let priced = ctx.get_price(&amount, &code("TLOSD")).unwrap();
    assert_eq!(priced.amount(), dec!(24.9875));
}

#[test]
fn doubled_amplifier_flattens_the_curve() {
    let tokens = relay_tokens(dec!(500000));
    let s = settings(0, dec!(2));
    let ctx = PricingContext::new(&tokens, &s).unwrap();

    let (base, quote) = ctx.get_uppers(&code("TLOS"), &code("TLOSD")).unwrap();
    assert_eq!((base, quote), (dec!(225000), dec!(60000)));

    let raw = relay_amm::BondingCurve::output(base, quote, dec!(100)).unwrap();
    assert_eq!(raw, dec!(100) * dec!(60000) / dec!(225100));

    let unit = settings(0, dec!(1));
    let flat = PricingContext::new(&tokens, &unit).unwrap();
    let amount = Quantity::new(dec!(100), id("eosio.token-TLOS"), 4);
    assert!(
        ctx.get_slippage(&amount, &code("TLOSD")).unwrap()
            < flat.get_slippage(&amount, &code("TLOSD")).unwrap()
    );
}

#[test]
fn maker_price_follows_pool_balance_sheet() {
    let tokens = relay_tokens(dec!(500000));
    let s = settings(0, dec!(1));
    let ctx = PricingContext::new(&tokens, &s).unwrap();

    assert_eq!(ctx.get_pool_balance().unwrap(), dec!(1000000));
    assert_eq!(ctx.get_maker_balance().unwrap(), dec!(500000));

    let proxy_spot = ctx.get_spot_price(&code("TLOSD"), &code("TLOS")).unwrap();
    let maker = ctx.get_spot_price(&code("TLOSD"), &code("TLOSM")).unwrap();
    assert_eq!(maker, proxy_spot * dec!(1000000) / dec!(500000));
    assert!(ctx.is_maker_token(&code("TLOSM")).unwrap());
    assert!(ctx.is_connector_token(&code("TLOSD")).unwrap());
}

#[test]
fn worst_hop_dominates_path_slippage() {
    let registry = PoolRegistry::default().with_hydration_pass([
        pool("relays-AB", "t-A", "t-B", dec!(1000000), dec!(1000000)),
        pool("relays-BC", "t-B", "t-C", dec!(1000), dec!(1000)),
        pool("relays-CD", "t-C", "t-D", dec!(1000000), dec!(1000000)),
    ]);
    let router = Router::new(&registry);
    let amount = Quantity::new(dec!(100), id("t-A"), 4);
    let route = router.get_return(&amount, &id("t-D")).unwrap();

    assert_eq!(route.path.len(), 3);
    let quote = &route.quote;
    assert_eq!(quote.highest_slippage, quote.hops[1].slippage);
    assert!(quote.hops.iter().all(|hop| hop.slippage <= quote.highest_slippage));

    let mean = quote.hops.iter().map(|hop| hop.slippage).sum::<Decimal>() / Decimal::from(3);
    assert!(quote.highest_slippage > mean);

    let json = serde_json::to_string(quote).unwrap();
    assert!(json.contains("highest_slippage"));
}

#[test]
fn dry_pools_hydrate_into_routable_snapshot() {
    let dry = DryPool {
        contract: "tlosdx.swaps".into(),
        share: ShareToken {
            token: id("relays.swaps-TLOSDX"),
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
        fee: dec!(20),
        enabled: true,
        multi_contract: true,
    };
    let registry = PoolRegistry::new([dry.clone()]);
    assert!(Router::new(&registry)
        .quote_pool(&dry.id(), &Quantity::new(dec!(1), id("eosio.token-TLOS"), 4))
        .is_err());

    let hydrated = dry
        .hydrate(
            [
                Quantity::new(dec!(40000), id("eosio.token-TLOS"), 4),
                Quantity::new(dec!(10000), id("tokens.swaps-TLOSD"), 4),
            ],
            Some(Quantity::new(dec!(5000), id("relays.swaps-TLOSDX"), 4)),
        )
        .unwrap();
    let registry = registry.with_hydration_pass([hydrated]);
    assert_eq!(registry.hydrated_pools().count(), registry.dry_pools().count());

    let router = Router::new(&registry);
    let hop = router
        .quote_pool(&dry.id(), &Quantity::new(dec!(100), id("eosio.token-TLOS"), 4))
        .unwrap();
    assert_eq!(hop.fee.amount(), dec!(0.2));
    assert_eq!(hop.output.token(), &id("tokens.swaps-TLOSD"));

    let feeds = relay_amm::build_all_feeds(
        registry.hydrated_pools(),
        &[KnownPrice {
            symbol: code("TLOSD"),
            unit_price: dec!(1),
        }],
    );
    assert_eq!(feeds.len(), 2);
    let tlos = feeds.iter().find(|f| f.token == id("eosio.token-TLOS")).unwrap();
    assert_eq!(tlos.cost_usd, dec!(0.25));
    assert_eq!(registry.convertible_pools(&feeds).len(), 1);

    let blocked = registry.without_blacklisted(&[id("tokens.swaps-TLOSD")]);
    assert_eq!(blocked.hydrated_pools().count(), 0);
    assert_eq!(blocked.dry_pools().count(), 0);
}

#[test]
fn large_withdrawal_runs_as_guarded_steps() {
    let p = pool("relays-AB", "t-A", "t-B", dec!(10000), dec!(10000));
    let supply = Quantity::new(dec!(1000), id("relays-AB"), 4);
    let owned = Quantity::new(dec!(500), id("relays-AB"), 4);

    // 25% of the pool: allowed, split into 1% steps
    let target = Quantity::new(dec!(2500), id("t-A"), 4);
    let plan = liquidity::plan_withdrawal(&p, &supply, &owned, &target).unwrap();
    assert_eq!(plan.steps.len(), 25);
    assert_eq!(plan.share_amount.amount(), dec!(250));
    assert_eq!(plan.opposing.amount(), dec!(2500));

    let mut sequence = WithdrawalSequence::new(plan);
    for i in 0..10 {
        sequence.record_success(format!("tx-{i}")).unwrap();
    }
    let state = sequence.record_failure("deadline exceeded").unwrap();
    assert_eq!(
        state,
        SequenceState::Failed {
            step: 10,
            reason: "deadline exceeded".into()
        }
    );
    assert_eq!(sequence.settled_share_amount().unwrap().amount(), dec!(100));
    assert_eq!(sequence.pending_steps().len(), 14);

    // 30% is rejected outright
    let too_much = Quantity::new(dec!(3000), id("t-A"), 4);
    let err = liquidity::plan_withdrawal(&p, &supply, &owned, &too_much).unwrap_err();
    assert_eq!(err.kind(), relay_amm::ErrorKind::ConcentrationGuard);
    assert!(err.is_retryable_smaller());
}

#[test]
fn max_withdrawals_scale_each_reserve() {
    let registry = PoolRegistry::default().with_hydration_pass([pool(
        "relays-AB",
        "t-A",
        "t-B",
        dec!(8000),
        dec!(2000),
    )]);
    let supply = Quantity::new(dec!(1000), id("relays-AB"), 4);
    let owned = Quantity::new(dec!(100), id("relays-AB"), 4);
    let [a, b] = registry
        .max_withdrawals(&PoolId(id("relays-AB")), &supply, &owned)
        .unwrap();
    assert_eq!(a.amount(), dec!(800));
    assert_eq!(b.amount(), dec!(200));
}

#[test]
fn cost_quote_never_undershoots_return() {
    let mut p = pool("relays-AB", "t-A", "t-B", dec!(123456), dec!(7890));
    p.fee = dec!(25);
    let desired = Quantity::new(dec!(12.3456), id("t-B"), 4);
    let cost = p.quote_cost(&id("t-A"), &desired).unwrap();
    let back = p.quote_return(&cost.input).unwrap();
    assert!(back.output.amount() >= desired.amount());
}
