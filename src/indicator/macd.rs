use error_stack::{Report, bail};
use serde::Serialize;

use crate::error::IndicatorError;
use crate::indicator::ma::Ema;
use crate::indicator::{Indicator, IndicatorKind, IndicatorSeries, close_prices};
use crate::model::Candle;

/// Moving Average Convergence Divergence.
///
/// `fast` is conventionally shorter than `slow`, but any positive spans are
/// accepted.
pub struct Macd {
    fast: Ema,
    slow: Ema,
    signal: Ema,
    periods: [usize; 3],
}

/// MACD line, signal line and histogram, all defined from index 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MacdLines {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

impl Macd {
    pub fn new(
        fast_period: usize,
        slow_period: usize,
        signal_period: usize,
    ) -> Result<Self, Report<IndicatorError>> {
        if fast_period == 0 || slow_period == 0 || signal_period == 0 {
            bail!(IndicatorError::InvalidParameter {
                name: "all periods must be > 0".into(),
            });
        }
        Ok(Self {
            fast: Ema::new(fast_period)?,
            slow: Ema::new(slow_period)?,
            signal: Ema::new(signal_period)?,
            periods: [fast_period, slow_period, signal_period],
        })
    }

    pub fn calculate_lines(&self, candles: &[Candle]) -> MacdLines {
        let prices = close_prices(candles);
        let fast_ema = self.fast.calculate_prices(&prices);
        let slow_ema = self.slow.calculate_prices(&prices);

        let macd: Vec<f64> = fast_ema.iter().zip(&slow_ema).map(|(f, s)| f - s).collect();
        let signal = self.signal.calculate_prices(&macd);
        let histogram = macd.iter().zip(&signal).map(|(m, s)| m - s).collect();

        MacdLines {
            macd,
            signal,
            histogram,
        }
    }
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        "macd"
    }

    fn required_candles(&self) -> usize {
        1
    }

    /// Returns MACD line, signal line and histogram, in that order.
    fn calculate(&self, candles: &[Candle]) -> Vec<IndicatorSeries> {
        let lines = self.calculate_lines(candles);
        let periods = self.periods.to_vec();
        vec![
            IndicatorSeries::dense(IndicatorKind::MacdLine, periods.clone(), lines.macd),
            IndicatorSeries::dense(IndicatorKind::MacdSignal, periods.clone(), lines.signal),
            IndicatorSeries::dense(IndicatorKind::MacdHistogram, periods, lines.histogram),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicator::test_support::candles_from_closes;

    #[test]
    fn macd_period_zero_invalid() {
        assert!(Macd::new(0, 26, 9).is_err());
        assert!(Macd::new(12, 0, 9).is_err());
        assert!(Macd::new(12, 26, 0).is_err());
    }

    #[test]
    fn macd_accepts_fast_above_slow() {
        let macd = Macd::new(26, 12, 9).unwrap();
        let closes: Vec<f64> = (1..=20).map(|i| i as f64).collect();
        let lines = macd.calculate_lines(&candles_from_closes(&closes));
        // slower EMA lags a rising series, so fast(26) - slow(12) goes negative
        assert!(lines.macd[19] < 0.0);
    }

    #[test]
    fn macd_flat_prices_returns_zero() {
        let macd = Macd::new(3, 5, 3).unwrap();
        let lines = macd.calculate_lines(&candles_from_closes(&[10.0_f64; 10]));
        for v in lines.macd.iter().chain(&lines.signal).chain(&lines.histogram) {
            assert!(v.abs() < 1e-9, "expected 0 for flat prices, got {v}");
        }
    }

    #[test]
    fn macd_defined_from_first_candle() {
        let macd = Macd::new(12, 26, 9).unwrap();
        let closes = [100.0, 102.0, 101.0];
        let series = macd.calculate(&candles_from_closes(&closes));
        assert_eq!(series.len(), 3);
        for line in &series {
            assert_eq!(line.len(), closes.len());
            assert!(line.values.iter().all(Option::is_some));
            assert_eq!(line.periods, vec![12, 26, 9]);
        }
        assert_eq!(series[0].get(0), Some(0.0));
    }

    #[test]
    fn histogram_equals_macd_minus_signal() {
        let macd = Macd::new(12, 26, 9).unwrap();
        let closes: Vec<f64> = (0..80)
            .map(|i| 100.0 + (i as f64 * 0.3).sin() * 8.0 + i as f64 * 0.1)
            .collect();
        let lines = macd.calculate_lines(&candles_from_closes(&closes));
        for i in 0..closes.len() {
            assert!((lines.histogram[i] - (lines.macd[i] - lines.signal[i])).abs() < 1e-9);
        }
    }

    #[test]
    fn macd_known_second_value() {
        // fast k = 0.5, slow k = 1/3, signal k = 1
        let macd = Macd::new(3, 5, 1).unwrap();
        let lines = macd.calculate_lines(&candles_from_closes(&[10.0, 16.0]));
        // fast = 13, slow = 12
        assert!((lines.macd[1] - 1.0).abs() < 1e-9);
        assert!((lines.signal[1] - 1.0).abs() < 1e-9);
        assert!(lines.histogram[1].abs() < 1e-9);
    }

    #[test]
    fn macd_empty_series() {
        let macd = Macd::new(12, 26, 9).unwrap();
        assert!(macd.calculate(&[]).iter().all(IndicatorSeries::is_empty));
    }
}
