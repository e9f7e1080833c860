//! # engine::indicators
//!
//! Pure indicator math over close prices. No state, no I/O.
//!
//! ```text
//! closes ─► deltas ─┬─► gains  ─► SMA(period) ─┐
//!                   └─► losses ─► SMA(period) ─┴─► rs = gain/loss ─► 100 − 100/(1+rs)
//! ```

/// Lookback used when the config does not override it.
pub const DEFAULT_RSI_PERIOD: usize = 14;

/// Round to 2 decimals, half away from zero.
#[inline]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// RSI-style oscillator over the trailing `period` deltas.
///
/// Returns `None` when there are fewer than `period + 1` closes (not enough to
/// fill one window). Zero average loss saturates to `100.0`.
pub fn compute_oscillator(closes: &[f64], period: usize) -> Option<f64> {
    // `len <= period` rather than `len < period + 1`: no overflow on huge periods.
    if period == 0 || closes.len() <= period {
        return None;
    }

    // Only the most recent complete window matters; earlier windows would be
    // computed and thrown away.
    let window = &closes[closes.len() - period - 1..];

    let (gain_sum, loss_sum) = window
        .windows(2)
        .map(|pair| pair[1] - pair[0])
        .fold((0.0_f64, 0.0_f64), |(g, l), delta| {
            if delta > 0.0 {
                (g + delta, l)
            } else {
                (g, l - delta)
            }
        });

    let avg_gain = gain_sum / period as f64;
    let avg_loss = loss_sum / period as f64;

    if avg_loss == 0.0 {
        return Some(100.0);
    }

    let rs = avg_gain / avg_loss;
    let value = 100.0 - 100.0 / (1.0 + rs);

    Some(round2(value.clamp(0.0, 100.0)))
}

/// Latest close, rounded to 2 decimals.
pub fn last_price(closes: &[f64]) -> Option<f64> {
    closes.last().copied().map(round2)
}

/// Percent move between the last two closes.
///
/// `None` with fewer than two points or a zero previous close.
pub fn change_pct(closes: &[f64]) -> Option<f64> {
    let [.., prev, last] = closes else {
        return None;
    };

    if *prev == 0.0 {
        return None;
    }

    Some(round2((last - prev) / prev * 100.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic zig-zag with drift, enough variety to hit both branches.
    fn wobble(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 100.0 + (i as f64) * 0.3 + if i % 3 == 0 { -1.7 } else { 0.9 })
            .collect()
    }

    #[test]
    fn test_oscillator_needs_period_plus_one() {
        assert_eq!(compute_oscillator(&wobble(14), 14), None);
        assert!(compute_oscillator(&wobble(15), 14).is_some());
    }

    #[test]
    fn test_oscillator_empty_and_zero_period() {
        assert_eq!(compute_oscillator(&[], 14), None);
        assert_eq!(compute_oscillator(&wobble(30), 0), None);
    }

    #[test]
    fn test_oscillator_huge_period_is_unavailable() {
        assert_eq!(compute_oscillator(&[1.0, 2.0, 1.5], usize::MAX), None);
        assert_eq!(compute_oscillator(&wobble(30), usize::MAX - 1), None);
    }

    #[test]
    fn test_oscillator_saturates_without_losses() {
        let rising: Vec<f64> = (0..20).map(|i| 50.0 + i as f64).collect();
        assert_eq!(compute_oscillator(&rising, 14), Some(100.0));
    }

    #[test]
    fn test_oscillator_all_losses_is_zero() {
        let falling: Vec<f64> = (0..20).map(|i| 80.0 - i as f64).collect();
        assert_eq!(compute_oscillator(&falling, 14), Some(0.0));
    }

    #[test]
    fn test_oscillator_known_value() {
        // 14 deltas: 7 × +2, 7 × −1 → avg_gain 1.0, avg_loss 0.5, rs 2 → 66.67
        let mut closes = vec![100.0];
        for i in 0..14 {
            let prev = *closes.last().unwrap();
            closes.push(if i % 2 == 0 { prev + 2.0 } else { prev - 1.0 });
        }
        assert_eq!(compute_oscillator(&closes, 14), Some(66.67));
    }

    #[test]
    fn test_oscillator_uses_latest_window_only() {
        // Big early drop falls outside the trailing window.
        let mut closes = vec![500.0, 100.0];
        closes.extend((1..=14).map(|i| 100.0 + i as f64));
        assert_eq!(compute_oscillator(&closes, 14), Some(100.0));
    }

    #[test]
    fn test_oscillator_bounded() {
        for n in 15..60 {
            let v = compute_oscillator(&wobble(n), 14).unwrap();
            assert!((0.0..=100.0).contains(&v), "n={n} v={v}");
        }
    }

    #[test]
    fn test_change_pct() {
        assert_eq!(change_pct(&[100.0, 105.0]), Some(5.0));
        assert_eq!(change_pct(&[100.0]), None);
        assert_eq!(change_pct(&[]), None);
        assert_eq!(change_pct(&[0.0, 5.0]), None);
        assert_eq!(change_pct(&[1.0, 200.0, 199.0]), Some(-0.5));
    }

    #[test]
    fn test_last_price_rounds() {
        assert_eq!(last_price(&[1.0, 412.3456]), Some(412.35));
        assert_eq!(last_price(&[]), None);
    }
}
