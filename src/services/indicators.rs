//! Technical indicator math over daily close series.
//!
//! All functions take ascending closes and return series aligned with the
//! input: positions where a value is not yet defined hold `None` (rolling
//! windows) or seed from the first close (exponential averages). Callers
//! usually only read the last element.

/// Drop NaN so it can never reach serialization. JSON has no NaN literal;
/// a missing value is `null` and stays `null`.
pub fn sanitize(x: Option<f64>) -> Option<f64> {
    x.filter(|v| !v.is_nan())
}

/// Simple moving average. The first `window - 1` positions are `None`.
pub fn sma(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }
    values
        .iter()
        .enumerate()
        .scan(0.0_f64, |sum, (i, &v)| {
            *sum += v;
            if i >= window {
                *sum -= values[i - window];
            }
            Some((i + 1 >= window).then(|| *sum / window as f64))
        })
        .collect()
}

/// Exponential moving average with smoothing `alpha = 2 / (span + 1)`,
/// seeded from the first value. Defined from the first bar onward, so a
/// 200-span EMA over a six-month series still yields a value.
pub fn ema(values: &[f64], span: usize) -> Vec<f64> {
    if values.is_empty() || span == 0 {
        return Vec::new();
    }
    let alpha = 2.0 / (span as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut prev = values[0];
    out.push(prev);
    for &v in &values[1..] {
        prev = alpha * v + (1.0 - alpha) * prev;
        out.push(prev);
    }
    out
}

/// Relative strength index over `period` bars, using plain rolling means of
/// gains and losses (Cutler's variant, not Wilder smoothing).
///
/// A window with losses and no gains reads 0, all gains reads 100, and a
/// perfectly flat window has no defined value.
pub fn rsi(values: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 || values.len() < 2 {
        return vec![None; values.len()];
    }

    let mut gains = Vec::with_capacity(values.len() - 1);
    let mut losses = Vec::with_capacity(values.len() - 1);
    for w in values.windows(2) {
        let delta = w[1] - w[0];
        gains.push(if delta > 0.0 { delta } else { 0.0 });
        losses.push(if delta < 0.0 { -delta } else { 0.0 });
    }

    // Average each window directly: an all-zero window comes out exactly
    // 0.0, which the flat-window check depends on. The delta at index i
    // describes the close at i + 1, so the i-th window scores close
    // i + period.
    let mut out = vec![None; values.len()];
    for (i, (gw, lw)) in gains
        .windows(period)
        .zip(losses.windows(period))
        .enumerate()
    {
        let avg_gain = gw.iter().sum::<f64>() / period as f64;
        let avg_loss = lw.iter().sum::<f64>() / period as f64;
        out[i + period] = if avg_loss > 0.0 {
            Some(100.0 - 100.0 / (1.0 + avg_gain / avg_loss))
        } else if avg_gain > 0.0 {
            Some(100.0)
        } else {
            None // flat window: 0/0 has no answer
        };
    }
    out
}

/// MACD line (fast EMA minus slow EMA) and its signal line (EMA of the MACD
/// line over `signal_span`). Both series span the full input.
pub fn macd(
    values: &[f64],
    fast: usize,
    slow: usize,
    signal_span: usize,
) -> (Vec<f64>, Vec<f64>) {
    let fast_ema = ema(values, fast);
    let slow_ema = ema(values, slow);
    let macd_line: Vec<f64> = fast_ema.iter().zip(&slow_ema).map(|(f, s)| f - s).collect();
    let signal_line = ema(&macd_line, signal_span);
    (macd_line, signal_line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn sma_warms_up_then_averages() {
        let out = sma(&[1.0, 2.0, 3.0, 4.0], 2);
        assert_eq!(out, vec![None, Some(1.5), Some(2.5), Some(3.5)]);
    }

    #[test]
    fn sma_window_larger_than_input_is_all_none() {
        assert_eq!(sma(&[1.0, 2.0, 3.0], 5), vec![None, None, None]);
        assert_eq!(sma(&[1.0, 2.0, 3.0], 0), vec![None, None, None]);
        assert!(sma(&[], 3).is_empty());
    }

    #[test]
    fn sma_exact_window_fills_last_slot_only() {
        let out = sma(&[2.0, 4.0, 6.0], 3);
        assert_eq!(out, vec![None, None, Some(4.0)]);
    }

    #[test]
    fn ema_seeds_from_first_value() {
        // span 2 -> alpha = 2/3
        let out = ema(&[10.0, 20.0, 30.0], 2);
        assert_eq!(out.len(), 3);
        assert_relative_eq!(out[0], 10.0);
        assert_relative_eq!(out[1], 50.0 / 3.0);
        assert_relative_eq!(out[2], 230.0 / 9.0);
    }

    #[test]
    fn ema_of_constant_series_is_constant() {
        let out = ema(&[42.0; 50], 10);
        for v in out {
            assert_relative_eq!(v, 42.0);
        }
    }

    #[test]
    fn ema_long_span_still_covers_short_series() {
        // Six months of bars is far fewer than a 200 span; the average must
        // exist anyway.
        let closes: Vec<f64> = (0..126).map(|i| 100.0 + i as f64).collect();
        let out = ema(&closes, 200);
        assert_eq!(out.len(), 126);
        assert!(out[125] > 100.0);
    }

    #[test]
    fn ema_degenerate_inputs_are_empty() {
        assert!(ema(&[], 10).is_empty());
        assert!(ema(&[1.0, 2.0], 0).is_empty());
    }

    #[test]
    fn rsi_all_gains_pins_to_one_hundred() {
        let closes: Vec<f64> = (0..=15).map(|i| 100.0 + i as f64).collect();
        let out = rsi(&closes, 14);

        assert_eq!(out.len(), 16);
        for v in &out[..14] {
            assert!(v.is_none());
        }
        assert_eq!(out[14], Some(100.0));
        assert_eq!(out[15], Some(100.0));
    }

    #[test]
    fn rsi_all_losses_pins_to_zero() {
        let closes: Vec<f64> = (0..=15).map(|i| 200.0 - i as f64).collect();
        let out = rsi(&closes, 14);
        assert_eq!(out[14], Some(0.0));
    }

    #[test]
    fn rsi_flat_series_is_undefined() {
        let out = rsi(&[50.0; 20], 14);
        assert!(out.iter().all(Option::is_none));
    }

    #[test]
    fn rsi_mixed_moves_match_hand_computation() {
        // Deltas: +1.0, -0.5, +1.0. Period 2 windows:
        //   [+1.0, -0.5] -> gain 0.5, loss 0.25 -> RSI 66.67
        //   [-0.5, +1.0] -> gain 0.5, loss 0.25 -> RSI 66.67
        let out = rsi(&[10.0, 11.0, 10.5, 11.5], 2);
        assert!(out[0].is_none());
        assert!(out[1].is_none());
        assert_relative_eq!(out[2].unwrap(), 200.0 / 3.0, max_relative = 1e-12);
        assert_relative_eq!(out[3].unwrap(), 200.0 / 3.0, max_relative = 1e-12);
    }

    #[test]
    fn rsi_too_short_input_is_all_none() {
        assert_eq!(rsi(&[10.0], 14), vec![None]);
        assert!(rsi(&[], 14).is_empty());
    }

    #[test]
    fn macd_matches_ema_difference() {
        // fast span 1 tracks the input exactly, so the MACD line is just
        // input minus slow EMA.
        let closes = [1.0, 2.0, 3.0];
        let (line, signal) = macd(&closes, 1, 2, 1);

        let slow = ema(&closes, 2);
        assert_eq!(line.len(), 3);
        for i in 0..3 {
            assert_relative_eq!(line[i], closes[i] - slow[i]);
        }
        // signal span 1 tracks the MACD line exactly
        assert_eq!(signal, line);
    }

    #[test]
    fn macd_empty_input_is_empty() {
        let (line, signal) = macd(&[], 12, 26, 9);
        assert!(line.is_empty());
        assert!(signal.is_empty());
    }

    #[test]
    fn sanitize_drops_only_nan() {
        assert_eq!(sanitize(Some(f64::NAN)), None);
        assert_eq!(sanitize(None), None);
        assert_eq!(sanitize(Some(5.0)), Some(5.0));
        assert_eq!(sanitize(Some(0.0)), Some(0.0));
    }

    proptest! {
        #[test]
        fn rsi_stays_bounded(closes in proptest::collection::vec(0.01f64..10_000.0, 2..200)) {
            for v in rsi(&closes, 14).into_iter().flatten() {
                prop_assert!((0.0..=100.0).contains(&v), "RSI out of range: {v}");
            }
        }

        #[test]
        fn sma_stays_within_input_bounds(closes in proptest::collection::vec(1.0f64..1_000.0, 1..100)) {
            let lo = closes.iter().cloned().fold(f64::INFINITY, f64::min);
            let hi = closes.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            for v in sma(&closes, 14).into_iter().flatten() {
                prop_assert!(v >= lo - 1e-9 && v <= hi + 1e-9);
            }
        }
    }
}
