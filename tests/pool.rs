// tests/pool.rs
use std::collections::BTreeMap;

use gacha_economy::systems::pool::*;
use gacha_economy::systems::rarity::RarityTier;

fn tiers() -> Vec<RarityTier> {
    vec![
        RarityTier::new("sr", "SR", Some(0.03), 2).with_color("#f0c"),
        RarityTier::new("n", "N", None, 0).auto(),
        RarityTier::new("r", "R", Some(0.17), 1),
    ]
}

fn state(items: Vec<ItemDefinition>) -> (CatalogState, RarityState) {
    let mut catalog = CatalogState::default();
    catalog.items_by_gacha.insert("g1".into(), items);
    let mut rarities = RarityState::default();
    rarities.tiers_by_gacha.insert("g1".into(), tiers());
    (catalog, rarities)
}

fn rate_of(pool: &GachaPoolDefinition, id: &str) -> f64 {
    pool.item(id).unwrap().item_rate
}

#[test]
fn rates_split_evenly_within_a_tier() {
    let (catalog, rarities) = state(vec![
        ItemDefinition::new("s1", "Star A", "sr").pickup(),
        ItemDefinition::new("s2", "Star B", "sr"),
        ItemDefinition::new("s3", "Star C", "sr"),
        ItemDefinition::new("n1", "Pebble", "n"),
    ]);
    let pools = build_gacha_pools(&catalog, &rarities, None);
    let pool = &pools.pools_by_gacha_id["g1"];

    for id in ["s1", "s2", "s3"] {
        assert!((rate_of(pool, id) - 0.01).abs() < 1e-12);
    }
    assert_eq!(pool.item("s1").unwrap().item_rate_display, "1");
    assert!(pool.item("s1").unwrap().pickup_target);
    // the auto tier absorbs 1 - 0.03 - 0.17
    assert!((rate_of(pool, "n1") - 0.80).abs() < 1e-12);
}

#[test]
fn rarity_groups_follow_sort_order_with_aggregates() {
    let (catalog, rarities) = state(vec![
        ItemDefinition::new("s1", "Star", "sr"),
        ItemDefinition::new("r1", "Ring", "r"),
        ItemDefinition::new("r2", "Rope", "r"),
    ]);
    let pools = build_gacha_pools(&catalog, &rarities, None);
    let pool = &pools.pools_by_gacha_id["g1"];

    let ids: Vec<&str> = pool.rarity_groups.iter().map(|g| g.rarity_id.as_str()).collect();
    assert_eq!(ids, ["n", "r", "sr"]);
    assert_eq!(pool.rarity("n").unwrap().item_count, 0);
    assert_eq!(pool.rarity("r").unwrap().item_count, 2);
    assert_eq!(pool.rarity("sr").unwrap().color, "#f0c");
    assert_eq!(pool.rarity("n").unwrap().emit_rate_display, "80");

    let item_ids: Vec<&str> = pool.items.iter().map(|i| i.item_id.as_str()).collect();
    assert_eq!(item_ids, ["r1", "r2", "s1"]);
    assert!(pool.rarity_rank("sr") > pool.rarity_rank("r"));
}

#[test]
fn overrides_leave_the_rest_to_the_equal_split() {
    let (catalog, rarities) = state(vec![
        ItemDefinition::new("s1", "Featured", "sr").with_rate(0.02),
        ItemDefinition::new("s2", "Other", "sr"),
        ItemDefinition::new("s3", "Other", "sr"),
    ]);
    let pools = build_gacha_pools(&catalog, &rarities, None);
    let pool = &pools.pools_by_gacha_id["g1"];

    assert!((rate_of(pool, "s1") - 0.02).abs() < 1e-12);
    assert!((rate_of(pool, "s2") - 0.005).abs() < 1e-12);
    assert!((rate_of(pool, "s3") - 0.005).abs() < 1e-12);
    let tier_mass: f64 = pool.items_in_rarity("sr").map(|i| i.item_rate).sum();
    assert!((tier_mass - 0.03).abs() < 1e-12);
}

#[test]
fn overflowing_overrides_are_scaled_to_the_tier() {
    let (catalog, rarities) = state(vec![
        ItemDefinition::new("s1", "A", "sr").with_rate(0.04),
        ItemDefinition::new("s2", "B", "sr").with_rate(0.02),
        ItemDefinition::new("s3", "C", "sr"),
    ]);
    let pools = build_gacha_pools(&catalog, &rarities, None);
    let pool = &pools.pools_by_gacha_id["g1"];

    assert!((rate_of(pool, "s1") - 0.02).abs() < 1e-12);
    assert!((rate_of(pool, "s2") - 0.01).abs() < 1e-12);
    assert!(rate_of(pool, "s3") < 1e-15);
}

#[test]
fn empty_gacha_yields_empty_pool() {
    let mut catalog = CatalogState::default();
    catalog.items_by_gacha.insert("empty".into(), Vec::new());
    let mut rarities = RarityState::default();
    rarities.tiers_by_gacha.insert("tiers-only".into(), tiers());

    let pools = build_gacha_pools(&catalog, &rarities, None);
    assert!(pools.pools_by_gacha_id["empty"].is_empty());
    assert!(pools.pools_by_gacha_id["tiers-only"].is_empty());
    assert!(pools.pools_by_gacha_id["tiers-only"].rarity_groups.is_empty());
}

#[test]
fn items_with_unknown_rarity_are_left_out() {
    let (catalog, rarities) = state(vec![
        ItemDefinition::new("s1", "Star", "sr"),
        ItemDefinition::new("x1", "Ghost", "ssr"),
    ]);
    let pools = build_gacha_pools(&catalog, &rarities, None);
    let pool = &pools.pools_by_gacha_id["g1"];
    assert!(pool.item("x1").is_none());
    assert_eq!(pool.items.len(), 1);
}

#[test]
fn inputs_are_not_mutated() {
    let (catalog, rarities) = state(vec![ItemDefinition::new("s1", "Star", "sr")]);
    let (c0, r0) = (catalog.clone(), rarities.clone());
    let _ = build_gacha_pools(&catalog, &rarities, None);
    assert_eq!(catalog, c0);
    assert_eq!(rarities, r0);
}

#[test]
fn tiny_rates_keep_their_digits() {
    let tiers = vec![
        RarityTier::new("base", "Base", None, 0).auto(),
        RarityTier::new("mythic", "Mythic", Some(1e-8), 1),
    ];
    let items = vec![
        ItemDefinition::new("b1", "Base", "base"),
        ItemDefinition::new("m1", "Relic", "mythic"),
        ItemDefinition::new("m2", "Relic", "mythic"),
    ];
    let pool = build_pool(&items, &tiers, None);
    assert_eq!(pool.item("m1").unwrap().item_rate_display, "0.0000005");
    assert_eq!(pool.rarity("mythic").unwrap().emit_rate_display, "0.000001");
}

#[test]
fn pinned_digit_budget_wins_over_inference() {
    let tiers = vec![RarityTier::new("only", "Only", Some(1.0 / 3.0), 0)];
    let items = vec![ItemDefinition::new("a", "A", "only")];
    let mut digits = BTreeMap::new();
    digits.insert("only".to_string(), 2);
    let pool = build_pool(&items, &tiers, Some(&digits));
    assert_eq!(pool.item("a").unwrap().item_rate_display, "33.33...");

    let tiers = vec![RarityTier::new("only", "Only", Some(0.123456), 0)];
    let pool = build_pool(&items, &tiers, Some(&digits));
    assert_eq!(pool.item("a").unwrap().item_rate_display, "12.35");
}

#[test]
fn odds_rows_normalize_by_pool_weight() {
    let (catalog, rarities) = state(vec![
        ItemDefinition::new("n1", "Pebble", "n"),
        ItemDefinition::new("r1", "Ring", "r"),
        ItemDefinition::new("s1", "Star", "sr"),
    ]);
    let pools = build_gacha_pools(&catalog, &rarities, None);
    let pool = &pools.pools_by_gacha_id["g1"];

    let rows = rarity_odds(pool, 10);
    let sum: f64 = rows.iter().map(|r| r.rate).sum();
    assert!((sum - 1.0).abs() < 1e-12);
    let sr = rows.iter().find(|r| r.id == "sr").unwrap();
    assert!((sr.at_least_one - (1.0 - 0.97f64.powi(10))).abs() < 1e-12);
    assert!((sr.expected - 0.3).abs() < 1e-12);

    let star = item_odds(pool, "s1", 100).unwrap();
    assert!((star.rate - 0.03).abs() < 1e-12);
    assert!(item_odds(pool, "missing", 1).is_none());
}
