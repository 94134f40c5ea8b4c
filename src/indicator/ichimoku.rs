use error_stack::{Report, bail};
use serde::Serialize;

use crate::error::IndicatorError;
use crate::indicator::{Indicator, IndicatorKind, IndicatorSeries, close_prices, highs, lows};
use crate::model::Candle;

/// Ichimoku Cloud.
///
/// Senkou spans are plotted `kijun` periods ahead of the candle that produced
/// them and the Chikou span `kijun` periods behind.
pub struct Ichimoku {
    tenkan: usize,
    kijun: usize,
    senkou: usize,
}

/// All Ichimoku lines aligned to the input candles.
///
/// `senkou_a_ahead`/`senkou_b_ahead` hold the last `kijun` unshifted span
/// values, which land past the final candle once shifted forward. Entry `j`
/// belongs to position `len + j`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IchimokuLines {
    pub tenkan: Vec<Option<f64>>,
    pub kijun: Vec<Option<f64>>,
    pub senkou_a: Vec<Option<f64>>,
    pub senkou_b: Vec<Option<f64>>,
    pub chikou: Vec<Option<f64>>,
    pub senkou_a_ahead: Vec<Option<f64>>,
    pub senkou_b_ahead: Vec<Option<f64>>,
}

impl Ichimoku {
    pub fn new(tenkan: usize, kijun: usize, senkou: usize) -> Result<Self, Report<IndicatorError>> {
        if tenkan == 0 || kijun == 0 || senkou == 0 {
            bail!(IndicatorError::InvalidParameter {
                name: "tenkan, kijun and senkou must be > 0".into(),
            });
        }
        Ok(Self {
            tenkan,
            kijun,
            senkou,
        })
    }

    pub fn calculate_lines(&self, candles: &[Candle]) -> IchimokuLines {
        let highs = highs(candles);
        let lows = lows(candles);
        let closes = close_prices(candles);
        let len = candles.len();

        let tenkan = midpoint(&highs, &lows, self.tenkan);
        let kijun = midpoint(&highs, &lows, self.kijun);
        let span_b = midpoint(&highs, &lows, self.senkou);
        let span_a: Vec<Option<f64>> = tenkan
            .iter()
            .zip(&kijun)
            .map(|(t, k)| Some((t.as_ref()? + k.as_ref()?) / 2.0))
            .collect();

        let split = len.saturating_sub(self.kijun);
        let chikou = (0..len)
            .map(|i| closes.get(i + self.kijun).copied())
            .collect();

        IchimokuLines {
            senkou_a: shift_forward(&span_a, self.kijun),
            senkou_b: shift_forward(&span_b, self.kijun),
            senkou_a_ahead: span_a[split..].to_vec(),
            senkou_b_ahead: span_b[split..].to_vec(),
            tenkan,
            kijun,
            chikou,
        }
    }
}

impl Indicator for Ichimoku {
    fn name(&self) -> &str {
        "ichimoku"
    }

    fn required_candles(&self) -> usize {
        self.tenkan.min(self.kijun)
    }

    /// Returns Tenkan, Kijun, Senkou A, Senkou B and Chikou, in that order.
    fn calculate(&self, candles: &[Candle]) -> Vec<IndicatorSeries> {
        let lines = self.calculate_lines(candles);
        let periods = vec![self.tenkan, self.kijun, self.senkou];
        vec![
            IndicatorSeries::new(IndicatorKind::Tenkan, periods.clone(), lines.tenkan),
            IndicatorSeries::new(IndicatorKind::Kijun, periods.clone(), lines.kijun),
            IndicatorSeries::new(IndicatorKind::SenkouA, periods.clone(), lines.senkou_a),
            IndicatorSeries::new(IndicatorKind::SenkouB, periods.clone(), lines.senkou_b),
            IndicatorSeries::new(IndicatorKind::Chikou, periods, lines.chikou),
        ]
    }
}

/// `(highest high + lowest low) / 2` over each full window of `period` candles.
fn midpoint(highs: &[f64], lows: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; highs.len()];
    for (offset, (h, l)) in highs.windows(period).zip(lows.windows(period)).enumerate() {
        let high = h.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let low = l.iter().copied().fold(f64::INFINITY, f64::min);
        out[offset + period - 1] = Some((high + low) / 2.0);
    }
    out
}

fn shift_forward(values: &[Option<f64>], by: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| i.checked_sub(by).and_then(|src| values[src]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicator::test_support::{candles_from_closes, candles_from_ranges};

    fn wavy_candles(len: usize) -> Vec<Candle> {
        let ranges: Vec<(f64, f64)> = (0..len)
            .map(|i| {
                let mid = 100.0 + (i as f64 * 0.4).sin() * 10.0;
                (mid - 1.5, mid + 2.0)
            })
            .collect();
        candles_from_ranges(&ranges)
    }

    #[test]
    fn ichimoku_period_zero_invalid() {
        assert!(Ichimoku::new(0, 26, 52).is_err());
        assert!(Ichimoku::new(9, 0, 52).is_err());
        assert!(Ichimoku::new(9, 26, 0).is_err());
    }

    #[test]
    fn tenkan_known_value() {
        let ichimoku = Ichimoku::new(2, 3, 4).unwrap();
        let candles = candles_from_ranges(&[(10.0, 12.0), (11.0, 15.0), (9.0, 13.0)]);
        let lines = ichimoku.calculate_lines(&candles);
        assert_eq!(lines.tenkan[0], None);
        assert_eq!(lines.tenkan[1], Some((15.0 + 10.0) / 2.0));
        assert_eq!(lines.tenkan[2], Some((15.0 + 9.0) / 2.0));
        assert_eq!(lines.kijun[2], Some((15.0 + 9.0) / 2.0));
    }

    #[test]
    fn senkou_spans_equal_unshifted_values_kijun_back() {
        let (tenkan, kijun, senkou) = (9, 26, 52);
        let ichimoku = Ichimoku::new(tenkan, kijun, senkou).unwrap();
        let candles = wavy_candles(120);
        let lines = ichimoku.calculate_lines(&candles);

        let highs = highs(&candles);
        let lows = lows(&candles);
        let t = midpoint(&highs, &lows, tenkan);
        let k = midpoint(&highs, &lows, kijun);
        let b = midpoint(&highs, &lows, senkou);

        for i in kijun..candles.len() {
            let src = i - kijun;
            let expected_a = match (t[src], k[src]) {
                (Some(t), Some(k)) => Some((t + k) / 2.0),
                _ => None,
            };
            assert_eq!(lines.senkou_a[i], expected_a);
            assert_eq!(lines.senkou_b[i], b[src]);
        }
        assert!(lines.senkou_a[..kijun].iter().all(Option::is_none));
        assert!(lines.senkou_b[..kijun].iter().all(Option::is_none));
    }

    #[test]
    fn projection_holds_values_past_the_end() {
        let ichimoku = Ichimoku::new(9, 26, 52).unwrap();
        let candles = wavy_candles(120);
        let lines = ichimoku.calculate_lines(&candles);
        assert_eq!(lines.senkou_a_ahead.len(), 26);
        assert_eq!(lines.senkou_b_ahead.len(), 26);
        assert!(lines.senkou_a_ahead.iter().all(Option::is_some));
    }

    #[test]
    fn required_candles_is_first_defined_length() {
        let ichimoku = Ichimoku::new(9, 26, 52).unwrap();
        assert_eq!(ichimoku.required_candles(), 9);

        let lines = ichimoku.calculate_lines(&wavy_candles(9));
        assert!(lines.tenkan[8].is_some());
        let lines = ichimoku.calculate_lines(&wavy_candles(8));
        assert!(lines.tenkan.iter().chain(&lines.kijun).all(Option::is_none));
        assert!(lines.chikou.iter().all(Option::is_none));

        // kijun shorter than tenkan: chikou and kijun appear first
        let ichimoku = Ichimoku::new(5, 2, 3).unwrap();
        assert_eq!(ichimoku.required_candles(), 2);
        assert!(ichimoku.calculate_lines(&wavy_candles(2)).kijun[1].is_some());
    }

    #[test]
    fn chikou_is_close_shifted_back() {
        let ichimoku = Ichimoku::new(1, 2, 3).unwrap();
        let closes = [1.0, 2.0, 3.0, 4.0, 5.0];
        let lines = ichimoku.calculate_lines(&candles_from_closes(&closes));
        assert_eq!(lines.chikou, vec![Some(3.0), Some(4.0), Some(5.0), None, None]);
    }

    #[test]
    fn short_series_is_all_undefined() {
        let ichimoku = Ichimoku::new(9, 26, 52).unwrap();
        let series = ichimoku.calculate(&wavy_candles(5));
        assert_eq!(series.len(), 5);
        for line in &series {
            assert_eq!(line.len(), 5);
            assert!(line.values.iter().all(Option::is_none));
        }
    }

    #[test]
    fn empty_series_yields_empty_lines() {
        let ichimoku = Ichimoku::new(9, 26, 52).unwrap();
        let lines = ichimoku.calculate_lines(&[]);
        assert!(lines.tenkan.is_empty());
        assert!(lines.senkou_a_ahead.is_empty());
        assert!(ichimoku.calculate(&[]).iter().all(IndicatorSeries::is_empty));
    }
}
