// demos/draw.rs
// Run with:
//   cargo run --example draw

use gacha_economy::config::UnitPrice;
use gacha_economy::mechanics::{format_rarity_rate, seeded_source};
use gacha_economy::systems::draw::{ExecuteRequest, execute_gacha};
use gacha_economy::systems::plan::*;
use gacha_economy::systems::pool::{CatalogState, ItemDefinition, RarityState, build_gacha_pools, rarity_odds};
use gacha_economy::systems::rarity::{EmitRateEdit, RarityTier, apply_emit_rate_updates, build_emit_rate_updates};

fn main() {
    // Rarity tiers (the base tier absorbs whatever the others leave)
    let tiers = vec![
        RarityTier::new("n", "N", None, 0).auto(),
        RarityTier::new("r", "R", Some(0.15), 1),
        RarityTier::new("sr", "SR", Some(0.04), 2),
        RarityTier::new("ur", "UR", Some(0.01), 3).with_color("#e6b422"),
    ];

    // An operator bumps SR to 5%; an overflowing edit would come back as an error
    let updates = build_emit_rate_updates(EmitRateEdit {
        rarity_id: "sr",
        next_rate: 0.05,
        auto_adjust_rarity_id: Some("n"),
        rows: &tiers,
    });
    let tiers = match updates {
        Ok(u) => apply_emit_rate_updates(&tiers, &u),
        Err(e) => {
            eprintln!("edit rejected: {e}");
            tiers
        }
    };

    let mut catalog = CatalogState::default();
    catalog.items_by_gacha.insert(
        "summer".into(),
        vec![
            ItemDefinition::new("n1", "Seashell", "n"),
            ItemDefinition::new("n2", "Driftwood", "n"),
            ItemDefinition::new("r1", "Sunhat", "r").complete(),
            ItemDefinition::new("s1", "Surfboard", "sr").complete(),
            ItemDefinition::new("u1", "Lighthouse", "ur").pickup().complete(),
        ],
    );
    let mut rarities = RarityState::default();
    rarities.tiers_by_gacha.insert("summer".into(), tiers);

    let pools = build_gacha_pools(&catalog, &rarities, None);
    let Some(pool) = pools.pools_by_gacha_id.get("summer") else {
        return;
    };

    println!("== Pool ==");
    for g in &pool.rarity_groups {
        println!("{:>3} {:>8}%  ({} items)", g.label, g.emit_rate_display, g.item_count);
    }
    for it in &pool.items {
        println!("    {:<12} {:>8}%", it.name, it.item_rate_display);
    }

    let settings = PtSetting {
        per_pull: Some(UnitPrice { price: 300, pulls: 1 }),
        complete: Some(CompletePrice { price: 30_000 }),
        bundles: vec![BundlePrice { id: "ten".into(), price: 2_700, pulls: 10 }],
        guarantees: vec![GuaranteeSetting {
            id: "sr-per-ten".into(),
            rarity_id: "sr".into(),
            threshold: 10,
            quantity: 1,
            target: GuaranteeTarget::Rarity,
        }],
    };

    let points = 6_000;
    let plan = calculate_draw_plan(&PlanRequest { points, settings: &settings, total_item_types: pool.items.len() });
    println!("\n== Plan for {points} points ==");
    println!("{:?}", plan);

    match calculate_points_for_pulls(50, &settings, pool.items.len()) {
        Ok(found) => println!("50 pulls need {} points", found.points),
        Err(e) => println!("50 pulls unreachable: {e}"),
    }

    println!("\n== Odds over 20 pulls ==");
    for row in rarity_odds(pool, 20) {
        println!(
            "{:>3}: {:>10}% per pull, {:.2}% at least one, {:.2} expected",
            row.id,
            format_rarity_rate(row.rate),
            row.at_least_one * 100.0,
            row.expected
        );
    }

    let mut rng = seeded_source(2024);
    let result = execute_gacha(&ExecuteRequest { pool, settings: &settings, points }, &mut rng);
    println!("\n== Draw ({} pulls, {} points) ==", result.total_pulls, result.points_spent);
    for it in &result.items {
        println!("{:<4} x{:<3} (guaranteed {})", it.item_id, it.count, it.guaranteed_count);
    }
    for w in &result.warnings {
        println!("warning: {w:?}");
    }
    for t in result.rarity_totals(pool) {
        println!("{:>3}: {}", t.rarity_id, t.count);
    }
}
