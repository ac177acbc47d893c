//! Price-series analytics.
//!
//! Pure functions over an ascending series of closes. `sma` and `ema` only
//! look at the first `period` values and return `None` when the series is
//! shorter than `period`.

use serde::{Deserialize, Serialize};

/// Nominal period for the moving averages in [`Analytics`].
pub const DEFAULT_PERIOD: usize = 20;

/// Arithmetic mean of the first `period` values.
pub fn sma(series: &[f64], period: usize) -> Option<f64> {
    if period == 0 || series.len() < period {
        return None;
    }
    let sum: f64 = series[..period].iter().sum();
    Some(sum / period as f64)
}

/// Exponential moving average seeded with `series[0]` and folded over
/// `series[1..period]`.
pub fn ema(series: &[f64], period: usize) -> Option<f64> {
    if period == 0 || series.len() < period {
        return None;
    }
    let multiplier = 2.0 / (period as f64 + 1.0);
    let ema = series[1..period]
        .iter()
        .fold(series[0], |ema, price| (price - ema) * multiplier + ema);
    Some(ema)
}

/// Percentage return from `start_price` to `end_price`.
///
/// `_initial_amount` is vestigial: it is accepted for call-site compatibility
/// and has no effect on the result.
pub fn roi(_initial_amount: f64, start_price: f64, end_price: f64) -> f64 {
    (end_price - start_price) / start_price * 100.0
}

/// Analytics attached to a history response.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Analytics {
    pub sma20: Option<f64>,
    pub ema20: Option<f64>,
    /// First-to-last return in percent
    pub roi: Option<f64>,
}

impl Analytics {
    /// Compute over an ascending series, shrinking the period to the series
    /// length when the series is shorter than [`DEFAULT_PERIOD`].
    pub fn from_series(closes: &[f64]) -> Self {
        let (Some(&first), Some(&last)) = (closes.first(), closes.last()) else {
            return Self::default();
        };
        let period = DEFAULT_PERIOD.min(closes.len());
        Self {
            sma20: sma(closes, period),
            ema20: ema(closes, period),
            roi: (first != 0.0).then(|| roi(1000.0, first, last)),
        }
    }
}
