// tests/odds.rs
use gacha_economy::mechanics::odds::*;

#[test]
fn at_least_one_matches_closed_form() {
    let p = calculate_at_least_one_rate(0.01, 10);
    assert!((p - (1.0 - 0.99f64.powi(10))).abs() < 1e-12);
    assert_eq!(calculate_at_least_one_rate(0.01, 0), 0.0);
    assert_eq!(calculate_at_least_one_rate(0.0, 100), 0.0);
    assert_eq!(calculate_at_least_one_rate(1.0, 3), 1.0);
    assert_eq!(calculate_at_least_one_rate(f64::NAN, 3), 0.0);
}

#[test]
fn exact_count_small_case() {
    let expected = 45.0 * 0.04 * 0.8f64.powi(8);
    assert!((calculate_exact_count_rate(0.2, 10, 2) - expected).abs() < 1e-12);
}

#[test]
fn exact_count_edges() {
    assert_eq!(calculate_exact_count_rate(0.3, 0, 0), 1.0);
    assert_eq!(calculate_exact_count_rate(0.3, 5, -1), 0.0);
    assert_eq!(calculate_exact_count_rate(0.3, 5, 6), 0.0);
    // rate 0: certain zero hits
    assert_eq!(calculate_exact_count_rate(0.0, 5, 0), 1.0);
    assert_eq!(calculate_exact_count_rate(0.0, 5, 1), 0.0);
    // rate 1: certain n hits
    assert_eq!(calculate_exact_count_rate(1.0, 5, 5), 1.0);
    assert_eq!(calculate_exact_count_rate(1.0, 5, 4), 0.0);
}

#[test]
fn pmf_sums_to_one() {
    let total: f64 = (0..=20).map(|k| calculate_exact_count_rate(0.3, 20, k)).sum();
    assert!((total - 1.0).abs() < 1e-9, "{total}");
}

#[test]
fn large_draw_counts_stay_finite() {
    // approaches Poisson(10) at k = 10
    let p = calculate_exact_count_rate(1e-6, 10_000_000, 10);
    assert!(p.is_finite());
    assert!((p - 0.125_110).abs() < 1e-4, "{p}");

    let q = calculate_at_least_one_rate(1e-9, u32::MAX as u64);
    assert!(q > 0.98 && q <= 1.0);
}

#[test]
fn at_least_count_sums_the_tail() {
    assert!((calculate_at_least_count_rate(0.5, 2, 2) - 0.25).abs() < 1e-12);
    assert_eq!(calculate_at_least_count_rate(0.5, 2, 0), 1.0);
    assert_eq!(calculate_at_least_count_rate(0.5, 2, 3), 0.0);
    assert!(
        (calculate_at_least_count_rate(0.1, 30, 1) - calculate_at_least_one_rate(0.1, 30)).abs() < 1e-12
    );
}

#[test]
fn expected_count_is_rate_times_draws() {
    assert!((expected_count(0.03, 100) - 3.0).abs() < 1e-12);
    assert_eq!(expected_count(2.0, 10), 10.0);
    assert_eq!(expected_count(f64::NAN, 10), 0.0);
}

#[test]
fn pulls_for_confidence_is_minimal() {
    assert_eq!(pulls_for_confidence(0.01, 0.5), Some(69));
    assert!(calculate_at_least_one_rate(0.01, 68) < 0.5);
    assert_eq!(pulls_for_confidence(1.0, 0.99), Some(1));
    assert_eq!(pulls_for_confidence(0.5, 0.0), Some(0));
    assert_eq!(pulls_for_confidence(0.0, 0.5), None);
    assert_eq!(pulls_for_confidence(0.5, 1.0), None);
}

#[test]
fn at_least_count_agrees_with_the_pmf_for_deep_tails() {
    let below: f64 = (0..60).map(|j| calculate_exact_count_rate(0.3, 200, j)).sum();
    assert!((calculate_at_least_count_rate(0.3, 200, 60) - (1.0 - below)).abs() < 1e-12);

    // P(X >= n/2) for a fair coin sits just above one half
    let p = calculate_at_least_count_rate(0.5, 100_000, 50_000);
    assert!(p > 0.5 && p < 0.51, "{p}");

    assert_eq!(calculate_at_least_count_rate(0.0, 10, 2), 0.0);
    assert_eq!(calculate_at_least_count_rate(1.0, 10, 10), 1.0);
}
