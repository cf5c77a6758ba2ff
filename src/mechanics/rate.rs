//! Rate numerics: clamping, percentage display and parsing, digit budgets.
//!
//! Rates are fractions in [0,1]; everything user-facing is a percentage.

/// Slack allowed when checking that rates sum to at most 1.
pub const RATE_TOLERANCE: f64 = 1e-9;
/// Fraction digits of a displayed percentage.
pub const DEFAULT_FRACTION_DIGITS: usize = 10;
/// Upper bound for inferred digit budgets.
pub const MAX_FRACTION_DIGITS: usize = 20;

const HEADROOM_DIGITS: usize = 3;
const SIGNIFICANT_DIGITS: usize = 4;
/// Largest gap (in percentage points) a `...` rendering may read back with.
const ROUND_TRIP_PERCENT: f64 = 1e-11;

/// Clamp to [0,1]; NaN and infinities become 0.
#[inline]
pub fn clamp_rate(x: f64) -> f64 {
    if x.is_finite() { x.clamp(0.0, 1.0) } else { 0.0 }
}

/// Percentage string with up to 10 fraction digits, e.g. `0.04949` → `"4.949"`.
pub fn format_rarity_rate(rate: f64) -> String {
    format_rarity_rate_with_digits(rate, DEFAULT_FRACTION_DIGITS)
}

/// Percentage string with up to `fraction_digits` fraction digits.
///
/// Repeating tails render as `prefix + cycle + "..."` (single-digit cycles
/// are doubled: `0.0033...`) when that text parses back to the same value;
/// otherwise the rate is rounded. Non-zero rates never render as `"0"`.
pub fn format_rarity_rate_with_digits(rate: f64, fraction_digits: usize) -> String {
    let percent = clamp_rate(rate) * 100.0;
    if percent == 0.0 {
        return "0".to_string();
    }
    let digits = fraction_digits.clamp(1, MAX_FRACTION_DIGITS);

    let wide = format!("{:.*}", digits + HEADROOM_DIGITS, percent);
    let (int_part, frac) = wide.split_once('.').unwrap_or((wide.as_str(), ""));
    // last digit carries the rounding of the wide render
    let examined = &frac[..frac.len().saturating_sub(1)];
    if let Some((start, len)) = find_repeating_tail(examined) {
        let cycle = &examined[start..start + len];
        let shown = if len == 1 { cycle.repeat(2) } else { cycle.to_string() };
        let body = format!("{int_part}.{}{shown}", &examined[..start]);
        // the cycle form is kept only when the parser reads it back as this value
        if expand_repeating(&body).is_some_and(|v| (v - percent).abs() <= ROUND_TRIP_PERCENT) {
            return format!("{body}...");
        }
    }

    let trimmed = trim_fraction(&format!("{:.*}", digits, percent));
    if trimmed == "0" {
        return format_tiny_percent(percent);
    }
    trimmed
}

/// Parse a percentage (`"4.949"`, `"4.949%"`, `"0.0033..."`) into a rate.
/// Clamps to [0,100]%; `None` when unparsable or non-finite.
pub fn parse_rarity_rate_input(text: &str) -> Option<f64> {
    let text = text.trim();
    let text = text.strip_suffix('%').unwrap_or(text).trim_end();
    let (body, repeating) = match text.strip_suffix("...") {
        Some(body) => (body, true),
        None => (text, false),
    };
    if body.is_empty() {
        return None;
    }
    let mut percent: f64 = body.parse().ok()?;
    if !percent.is_finite() {
        return None;
    }
    if repeating {
        if let Some(expanded) = expand_repeating(body) {
            percent = expanded;
        }
    }
    Some(percent.clamp(0.0, 100.0) / 100.0)
}

/// Fraction digits needed so the smallest positive rate keeps four
/// significant digits, bounded by [`DEFAULT_FRACTION_DIGITS`, `MAX_FRACTION_DIGITS`].
pub fn infer_rarity_fraction_digits(rates: &[f64]) -> usize {
    infer_rarity_fraction_digits_ext(rates, DEFAULT_FRACTION_DIGITS, MAX_FRACTION_DIGITS)
}

pub fn infer_rarity_fraction_digits_ext(rates: &[f64], min_digits: usize, max_digits: usize) -> usize {
    let mut digits = min_digits;
    for &rate in rates {
        let percent = clamp_rate(rate) * 100.0;
        if percent <= 0.0 || percent >= 1.0 {
            continue;
        }
        let leading_zeros = (-percent.log10().floor()) as usize - 1;
        digits = digits.max(leading_zeros + SIGNIFICANT_DIGITS);
    }
    digits.min(max_digits.max(min_digits))
}

/* --- internals --- */

/// First (start, cycle_len) whose cycle repeats to the end of `digits`.
/// The tail must cover at least half the digits and repeat at least twice;
/// all-zero cycles are not cycles.
fn find_repeating_tail(digits: &str) -> Option<(usize, usize)> {
    let bytes = digits.as_bytes();
    let min_tail = (bytes.len() / 2).max(2);
    for start in 0..bytes.len() {
        let tail = &bytes[start..];
        if tail.len() < min_tail {
            break;
        }
        for len in 1..=tail.len() / 2 {
            let cycle = &tail[..len];
            if cycle.iter().all(|&b| b == b'0') {
                continue;
            }
            if tail.iter().enumerate().all(|(i, &b)| b == cycle[i % len]) {
                return Some((start, len));
            }
        }
    }
    None
}

fn trim_fraction(s: &str) -> String {
    if !s.contains('.') {
        return s.to_string();
    }
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Render a positive percentage below the digit budget with a few
/// significant digits after its leading zero run.
fn format_tiny_percent(percent: f64) -> String {
    let exponent = percent.log10().floor();
    let digits = (-exponent) as usize + SIGNIFICANT_DIGITS - 1;
    trim_fraction(&format!("{:.*}", digits, percent))
}

/// Expand a `...` body back into its repeating value.
///
/// A doubled final digit marks a single-digit cycle; otherwise the cycle is
/// every fraction digit after the leading zero run.
fn expand_repeating(body: &str) -> Option<f64> {
    let (_, frac) = body.split_once('.')?;
    let bytes = frac.as_bytes();
    let n = bytes.len();
    if n == 0 || !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }
    let cycle = if n >= 2 && bytes[n - 1] == bytes[n - 2] {
        &frac[n - 1..]
    } else {
        frac.trim_start_matches('0')
    };
    if cycle.is_empty() {
        return None;
    }
    let mut s = body.to_string();
    while s.len() < body.len() + 24 {
        s.push_str(cycle);
    }
    s.parse().ok()
}
