use error_stack::{Report, bail};

use crate::error::IndicatorError;
use crate::indicator::{Indicator, IndicatorKind, IndicatorSeries, close_prices};
use crate::model::Candle;

/// Simple moving average of closes.
///
/// The first `period - 1` values average whatever history is available, so
/// the line is defined from the very first candle.
pub struct MovingAverage {
    period: usize,
}

impl MovingAverage {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        if period == 0 {
            bail!(IndicatorError::InvalidParameter {
                name: "period must be > 0".into(),
            });
        }
        Ok(Self { period })
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// Running mean over the last `min(i + 1, period)` prices.
    pub fn calculate_prices(&self, prices: &[f64]) -> Vec<f64> {
        (0..prices.len())
            .map(|i| {
                let start = (i + 1).saturating_sub(self.period);
                let window = &prices[start..=i];
                window.iter().sum::<f64>() / window.len() as f64
            })
            .collect()
    }
}

impl Indicator for MovingAverage {
    fn name(&self) -> &str {
        "ma"
    }

    fn required_candles(&self) -> usize {
        1
    }

    fn calculate(&self, candles: &[Candle]) -> Vec<IndicatorSeries> {
        let values = self.calculate_prices(&close_prices(candles));
        vec![IndicatorSeries::dense(
            IndicatorKind::MovingAverage,
            vec![self.period],
            values,
        )]
    }
}

/// Exponential moving average seeded with the first value.
///
/// `ema[0] = x[0]`, `ema[i] = x[i] * k + ema[i - 1] * (1 - k)` with
/// `k = 2 / (span + 1)`. There is no warm-up gap.
pub struct Ema {
    span: usize,
}

impl Ema {
    pub fn new(span: usize) -> Result<Self, Report<IndicatorError>> {
        if span == 0 {
            bail!(IndicatorError::InvalidParameter {
                name: "span must be > 0".into(),
            });
        }
        Ok(Self { span })
    }

    pub fn smoothing(&self) -> f64 {
        2.0 / (self.span as f64 + 1.0)
    }

    pub fn calculate_prices(&self, prices: &[f64]) -> Vec<f64> {
        let k = self.smoothing();
        let mut results = Vec::with_capacity(prices.len());
        let mut iter = prices.iter();
        let Some(&first) = iter.next() else {
            return results;
        };

        let mut ema = first;
        results.push(ema);
        for &price in iter {
            ema = price * k + ema * (1.0 - k);
            results.push(ema);
        }
        results
    }
}
