use error_stack::{Report, bail};

use crate::error::IndicatorError;
use crate::indicator::{Indicator, IndicatorKind, IndicatorSeries, close_prices};
use crate::model::Candle;

/// RSI (Relative Strength Index) from simple rolling means of gains and losses.
///
/// The first delta is taken as zero, so the first defined value sits at index
/// `period - 1`.
pub struct Rsi {
    period: usize,
}

impl Rsi {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        if period == 0 {
            bail!(IndicatorError::InvalidParameter {
                name: "period must be > 0".into(),
            });
        }
        Ok(Self { period })
    }

    pub fn calculate_prices(&self, prices: &[f64]) -> Vec<Option<f64>> {
        let mut gains = Vec::with_capacity(prices.len());
        let mut losses = Vec::with_capacity(prices.len());
        for i in 0..prices.len() {
            let delta = if i == 0 { 0.0 } else { prices[i] - prices[i - 1] };
            gains.push(delta.max(0.0));
            losses.push((-delta).max(0.0));
        }

        let mut results = vec![None; prices.len()];
        let windows = gains.windows(self.period).zip(losses.windows(self.period));
        for (offset, (gain_window, loss_window)) in windows.enumerate() {
            let mean_gain = gain_window.iter().sum::<f64>() / self.period as f64;
            let mean_loss = loss_window.iter().sum::<f64>() / self.period as f64;
            results[offset + self.period - 1] = Some(rsi_value(mean_gain, mean_loss));
        }
        results
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        "rsi"
    }

    fn required_candles(&self) -> usize {
        self.period
    }

    fn calculate(&self, candles: &[Candle]) -> Vec<IndicatorSeries> {
        vec![IndicatorSeries::new(
            IndicatorKind::Rsi,
            vec![self.period],
            self.calculate_prices(&close_prices(candles)),
        )]
    }
}

// No losses in the window means an unbounded RS; pin it to fully overbought.
fn rsi_value(mean_gain: f64, mean_loss: f64) -> f64 {
    if mean_loss == 0.0 {
        return 100.0;
    }
    let rs = mean_gain / mean_loss;
    100.0 - 100.0 / (1.0 + rs)
}
