//! Closed-form draw odds for display. No randomness anywhere in here.
//!
//! All outputs are clamped to [0, 1] against floating error.

#[inline]
fn unit(p: f64) -> f64 {
    if p.is_finite() { p.clamp(0.0, 1.0) } else { 0.0 }
}

/// P(at least one hit in `n` pulls) = 1 − (1−rate)ⁿ, via expm1/log1p.
pub fn calculate_at_least_one_rate(rate: f64, n: u64) -> f64 {
    if n == 0 || !(rate > 0.0) {
        return 0.0;
    }
    if rate >= 1.0 {
        return 1.0;
    }
    unit(-(n as f64 * (-rate).ln_1p()).exp_m1())
}

/// Binomial PMF: P(exactly `k` hits in `n` pulls).
///
/// Multiplicative recurrence from k=0, carried in log space so large `n`
/// neither overflows the binomial nor underflows the seed term.
pub fn calculate_exact_count_rate(rate: f64, n: u64, k: i64) -> f64 {
    if k < 0 || k as u64 > n {
        return 0.0;
    }
    let k = k as u64;
    if n == 0 {
        return 1.0;
    }
    if !(rate > 0.0) {
        return if k == 0 { 1.0 } else { 0.0 };
    }
    if rate >= 1.0 {
        return if k == n { 1.0 } else { 0.0 };
    }

    log_pmf(rate, n).nth(k as usize).map_or(0.0, |log_p| unit(log_p.exp()))
}

/// P(at least `k` hits in `n` pulls).
pub fn calculate_at_least_count_rate(rate: f64, n: u64, k: i64) -> f64 {
    if k <= 0 {
        return 1.0;
    }
    if k == 1 {
        return calculate_at_least_one_rate(rate, n);
    }
    if k as u64 > n {
        return 0.0;
    }
    if !(rate > 0.0) {
        return 0.0;
    }
    if rate >= 1.0 {
        return 1.0;
    }
    let below: f64 = log_pmf(rate, n).take(k as usize).map(f64::exp).sum();
    unit(1.0 - below)
}

/// log P(exactly j hits) for j = 0, 1, ..., n. Needs 0 < rate < 1.
fn log_pmf(rate: f64, n: u64) -> impl Iterator<Item = f64> {
    let log_miss = (-rate).ln_1p();
    let log_odds = rate.ln() - log_miss;
    (0..=n).scan(n as f64 * log_miss, move |log_p, j| {
        let current = *log_p;
        if j < n {
            *log_p += ((n - j) as f64).ln() - ((j + 1) as f64).ln() + log_odds;
        }
        Some(current)
    })
}

/// Mean hits in `n` pulls.
#[inline]
pub fn expected_count(rate: f64, n: u64) -> f64 {
    if rate.is_finite() { rate.clamp(0.0, 1.0) * n as f64 } else { 0.0 }
}

/// Smallest `n` with P(at least one hit) ≥ `confidence`; `None` if unreachable.
pub fn pulls_for_confidence(rate: f64, confidence: f64) -> Option<u64> {
    if !confidence.is_finite() || !rate.is_finite() {
        return None;
    }
    if confidence <= 0.0 {
        return Some(0);
    }
    if rate <= 0.0 || (confidence >= 1.0 && rate < 1.0) {
        return None;
    }
    if rate >= 1.0 {
        return Some(1);
    }
    let n = ((-confidence).ln_1p() / (-rate).ln_1p()).ceil();
    if !n.is_finite() || n > u64::MAX as f64 {
        return None;
    }
    let mut n = n.max(1.0) as u64;
    // ceil on a float ratio can land one short
    while calculate_at_least_one_rate(rate, n) + 1e-15 < confidence {
        n += 1;
    }
    Some(n)
}
