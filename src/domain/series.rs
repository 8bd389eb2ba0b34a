//! Series math primitives.
//!
//! Every function is a pure map from `&[f64]` to a `Vec<f64>` of the same
//! length. Positions without enough history are `NaN`. Rolling windows that
//! contain a `NaN` produce `NaN`. The exponential smoothers follow the usual
//! charting convention (recursive form, no bias adjustment): a `NaN` input
//! holds the previous average and decays its weight instead of resetting it.

pub fn rolling_mean(values: &[f64], period: usize) -> Vec<f64> {
    rolling(values, period, |window| {
        window.iter().sum::<f64>() / window.len() as f64
    })
}

/// Sample standard deviation (divides by n-1). A one-bar window has no sample
/// deviation and yields `NaN`.
pub fn rolling_std(values: &[f64], period: usize) -> Vec<f64> {
    if period < 2 {
        return vec![f64::NAN; values.len()];
    }
    rolling(values, period, |window| {
        let n = window.len() as f64;
        let mean = window.iter().sum::<f64>() / n;
        let ss: f64 = window.iter().map(|v| (v - mean) * (v - mean)).sum();
        (ss / (n - 1.0)).sqrt()
    })
}

pub fn rolling_min(values: &[f64], period: usize) -> Vec<f64> {
    rolling(values, period, |window| {
        window.iter().copied().fold(f64::INFINITY, f64::min)
    })
}

pub fn rolling_max(values: &[f64], period: usize) -> Vec<f64> {
    rolling(values, period, |window| {
        window.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    })
}

/// EMA with α = 2/(span+1), seeded from the first observation.
pub fn ewm_mean(values: &[f64], span: usize) -> Vec<f64> {
    if span == 0 {
        return vec![f64::NAN; values.len()];
    }
    ewm(values, 2.0 / (span as f64 + 1.0), 0)
}

/// EMA parameterised by centre of mass: α = 1/(1+com). No warmup.
pub fn ewm_com(values: &[f64], com: f64) -> Vec<f64> {
    if com < 0.0 || com.is_nan() {
        return vec![f64::NAN; values.len()];
    }
    ewm(values, 1.0 / (1.0 + com), 0)
}

/// Wilder smoothing: α = 1/period, and nothing is reported until `period`
/// observations have been seen.
pub fn wilder_ewm(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 {
        return vec![f64::NAN; values.len()];
    }
    ewm(values, 1.0 / period as f64, period)
}

/// First difference; position 0 is `NaN`.
pub fn diff(values: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len());
    for i in 0..values.len() {
        if i == 0 {
            out.push(f64::NAN);
        } else {
            out.push(values[i] - values[i - 1]);
        }
    }
    out
}

/// Element `n` positions from the end (`n = 0` is the last); `NaN` when out of range.
pub fn nth_back(values: &[f64], n: usize) -> f64 {
    if n < values.len() {
        values[values.len() - 1 - n]
    } else {
        f64::NAN
    }
}

pub fn last(values: &[f64]) -> f64 {
    nth_back(values, 0)
}

/// The trailing `n` elements (or all of them if shorter).
pub fn tail<T>(values: &[T], n: usize) -> &[T] {
    &values[values.len().saturating_sub(n)..]
}

/// Round half away from zero to `places` decimals.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

fn rolling<F>(values: &[f64], period: usize, reduce: F) -> Vec<f64>
where
    F: Fn(&[f64]) -> f64,
{
    let mut out = vec![f64::NAN; values.len()];
    if period == 0 || period > values.len() {
        return out;
    }
    for i in (period - 1)..values.len() {
        let window = &values[i + 1 - period..=i];
        if window.iter().any(|v| v.is_nan()) {
            continue;
        }
        out[i] = reduce(window);
    }
    out
}

fn ewm(values: &[f64], alpha: f64, min_periods: usize) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len());
    let mut weighted = f64::NAN;
    let mut old_wt = 1.0;
    let mut nobs = 0usize;

    for &x in values {
        let is_obs = !x.is_nan();
        if is_obs {
            nobs += 1;
        }

        if !weighted.is_nan() {
            old_wt *= 1.0 - alpha;
            if is_obs {
                if weighted != x {
                    weighted = (old_wt * weighted + alpha * x) / (old_wt + alpha);
                }
                old_wt = 1.0;
            }
        } else if is_obs {
            weighted = x;
        }

        if nobs >= min_periods.max(1) {
            out.push(weighted);
        } else {
            out.push(f64::NAN);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn ma3_over_one_to_ten() {
        let values: Vec<f64> = (1..=10).map(|v| v as f64).collect();
        let ma = rolling_mean(&values, 3);
        assert_eq!(ma.len(), 10);
        assert!(ma[0].is_nan());
        assert!(ma[1].is_nan());
        assert_relative_eq!(ma[2], 2.0);
        assert_relative_eq!(ma[9], 9.0);
    }

    #[test]
    fn rolling_mean_empty() {
        assert!(rolling_mean(&[], 5).is_empty());
    }

    #[test]
    fn rolling_mean_single_value_short_window() {
        let ma = rolling_mean(&[100.0], 5);
        assert_eq!(ma.len(), 1);
        assert!(ma[0].is_nan());
    }

    #[test]
    fn rolling_mean_oversized_period() {
        let ma = rolling_mean(&[1.0, 2.0, 3.0, 4.0, 5.0], 10);
        assert_eq!(ma.len(), 5);
        assert!(ma.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn rolling_mean_warmup_count() {
        let values: Vec<f64> = (0..30).map(|v| v as f64).collect();
        for p in 1..=30 {
            let ma = rolling_mean(&values, p);
            let nan_count = ma.iter().take_while(|v| v.is_nan()).count();
            assert_eq!(nan_count, p - 1, "period {}", p);
        }
    }

    #[test]
    fn rolling_window_with_nan_propagates() {
        let values = [1.0, f64::NAN, 3.0, 4.0, 5.0];
        let ma = rolling_mean(&values, 2);
        assert!(ma[1].is_nan());
        assert!(ma[2].is_nan());
        assert_relative_eq!(ma[3], 3.5);
    }

    #[test]
    fn rolling_std_is_sample_std() {
        let std = rolling_std(&[10.0, 20.0, 30.0], 3);
        assert!(std[1].is_nan());
        assert_relative_eq!(std[2], 10.0);
    }

    #[test]
    fn rolling_std_constant_is_zero() {
        let std = rolling_std(&[5.0; 6], 4);
        assert_relative_eq!(std[5], 0.0);
    }

    #[test]
    fn rolling_min_max() {
        let values = [3.0, 1.0, 4.0, 1.0, 5.0, 9.0];
        let min = rolling_min(&values, 3);
        let max = rolling_max(&values, 3);
        assert_relative_eq!(min[2], 1.0);
        assert_relative_eq!(max[2], 4.0);
        assert_relative_eq!(min[5], 1.0);
        assert_relative_eq!(max[5], 9.0);
    }

    #[test]
    fn ewm_mean_seeds_from_first_value() {
        let ema = ewm_mean(&[10.0, 20.0, 30.0], 3);
        assert_relative_eq!(ema[0], 10.0);
        // α = 0.5
        assert_relative_eq!(ema[1], 15.0);
        assert_relative_eq!(ema[2], 22.5);
    }

    #[test]
    fn ewm_mean_rising_input_ends_higher() {
        let values: Vec<f64> = (0..40).map(|v| 100.0 + v as f64).collect();
        let ema = ewm_mean(&values, 12);
        assert!(ema[39] > ema[0]);
    }

    #[test]
    fn ewm_leading_nan_seeds_on_first_observation() {
        let ema = ewm_com(&[f64::NAN, f64::NAN, 50.0, 80.0], 2.0);
        assert!(ema[0].is_nan());
        assert!(ema[1].is_nan());
        assert_relative_eq!(ema[2], 50.0);
        assert_relative_eq!(ema[3], 50.0 * 2.0 / 3.0 + 80.0 / 3.0);
    }

    #[test]
    fn ewm_interior_nan_holds_and_decays_weight() {
        let alpha: f64 = 0.5;
        let ema = ewm(&[10.0, f64::NAN, 30.0], alpha, 0);
        assert_relative_eq!(ema[1], 10.0);
        let old_wt = (1.0 - alpha) * (1.0 - alpha);
        let expected = (old_wt * 10.0 + alpha * 30.0) / (old_wt + alpha);
        assert_relative_eq!(ema[2], expected);
    }

    #[test]
    fn wilder_ewm_warmup() {
        let values: Vec<f64> = (0..20).map(|v| v as f64).collect();
        let out = wilder_ewm(&values, 14);
        for v in out.iter().take(13) {
            assert!(v.is_nan());
        }
        assert!(!out[13].is_nan());
    }

    #[test]
    fn wilder_ewm_alpha_is_reciprocal_period() {
        let out = wilder_ewm(&[0.0, 4.0], 2);
        assert!(out[0].is_nan());
        assert_relative_eq!(out[1], 2.0);
    }

    #[test]
    fn zero_period_is_all_nan() {
        assert!(rolling_mean(&[1.0, 2.0], 0).iter().all(|v| v.is_nan()));
        assert!(ewm_mean(&[1.0, 2.0], 0).iter().all(|v| v.is_nan()));
        assert!(wilder_ewm(&[1.0, 2.0], 0).iter().all(|v| v.is_nan()));
    }

    #[test]
    fn diff_leading_nan() {
        let d = diff(&[1.0, 4.0, 2.0]);
        assert!(d[0].is_nan());
        assert_relative_eq!(d[1], 3.0);
        assert_relative_eq!(d[2], -2.0);
    }

    #[test]
    fn nth_back_and_tail() {
        let values = [1.0, 2.0, 3.0];
        assert_relative_eq!(last(&values), 3.0);
        assert_relative_eq!(nth_back(&values, 2), 1.0);
        assert!(nth_back(&values, 3).is_nan());
        assert!(last(&[]).is_nan());
        assert_eq!(tail(&values, 2), &[2.0, 3.0]);
        assert_eq!(tail(&values, 10), &values);
    }

    #[test]
    fn round_to_places() {
        assert_relative_eq!(round_to(12.3456, 2), 12.35);
        assert_relative_eq!(round_to(-4.44, 1), -4.4);
        assert!(round_to(f64::NAN, 1).is_nan());
    }
}
