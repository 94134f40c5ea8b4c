pub mod ichimoku;
pub mod ma;
pub mod macd;
pub mod rsi;
pub mod volume;

use serde::Serialize;

use crate::model::Candle;

/// A technical analysis indicator that operates on a slice of candles.
///
/// Candles must be in ascending chronological order (oldest first).
/// Parameters are validated when the indicator is constructed, so calculation
/// itself cannot fail.
pub trait Indicator: Send + Sync {
    /// Unique name of this indicator (e.g., "rsi", "ma").
    fn name(&self) -> &str;

    /// Minimum number of candles required to produce at least one defined value.
    fn required_candles(&self) -> usize;

    /// Calculate every output line of this indicator.
    ///
    /// Each returned series has exactly one entry per input candle.
    fn calculate(&self, candles: &[Candle]) -> Vec<IndicatorSeries>;
}

/// Which line of which indicator a series holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorKind {
    MovingAverage,
    MacdLine,
    MacdSignal,
    MacdHistogram,
    Rsi,
    Tenkan,
    Kijun,
    SenkouA,
    SenkouB,
    Chikou,
}

impl IndicatorKind {
    /// Stable machine identifier, matching the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MovingAverage => "moving_average",
            Self::MacdLine => "macd_line",
            Self::MacdSignal => "macd_signal",
            Self::MacdHistogram => "macd_histogram",
            Self::Rsi => "rsi",
            Self::Tenkan => "tenkan",
            Self::Kijun => "kijun",
            Self::SenkouA => "senkou_a",
            Self::SenkouB => "senkou_b",
            Self::Chikou => "chikou",
        }
    }
}

/// A parallel-aligned indicator line: `values[i]` belongs to candle `i`.
///
/// `None` marks an index where the computation window was not yet full.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorSeries {
    pub kind: IndicatorKind,
    /// Periods the line was computed with, in constructor order.
    pub periods: Vec<usize>,
    pub values: Vec<Option<f64>>,
}

impl IndicatorSeries {
    pub fn new(kind: IndicatorKind, periods: Vec<usize>, values: Vec<Option<f64>>) -> Self {
        Self {
            kind,
            periods,
            values,
        }
    }

    /// Wrap a series that is defined at every index.
    pub fn dense(kind: IndicatorKind, periods: Vec<usize>, values: Vec<f64>) -> Self {
        Self::new(kind, periods, values.into_iter().map(Some).collect())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied().flatten()
    }

    /// Latest defined value.
    pub fn last(&self) -> Option<f64> {
        self.values.iter().rev().find_map(|v| *v)
    }

    /// `(index, value)` pairs for defined points only.
    pub fn defined(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.map(|value| (i, value)))
    }
}

/// Extract close prices from a slice of candles.
pub fn close_prices(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.close).collect()
}

/// Extract highs from a slice of candles.
pub fn highs(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.high).collect()
}

/// Extract lows from a slice of candles.
pub fn lows(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.low).collect()
}

/// Extract volumes from a slice of candles.
pub fn volumes(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.volume).collect()
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{DateTime, Duration, Utc};

    use crate::model::Candle;

    pub fn candles_from_closes(closes: &[f64]) -> Vec<Candle> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Candle {
                timestamp: DateTime::<Utc>::UNIX_EPOCH + Duration::minutes(i as i64),
                open: c,
                high: c,
                low: c,
                close: c,
                volume: 1.0,
            })
            .collect()
    }

    pub fn candles_from_ranges(ranges: &[(f64, f64)]) -> Vec<Candle> {
        ranges
            .iter()
            .enumerate()
            .map(|(i, &(low, high))| Candle {
                timestamp: DateTime::<Utc>::UNIX_EPOCH + Duration::minutes(i as i64),
                open: low,
                high,
                low,
                close: high,
                volume: 1.0,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_skips_undefined_tail() {
        let values = vec![Some(1.0), Some(2.0), None];
        let series = IndicatorSeries::new(IndicatorKind::Chikou, vec![2], values);
        assert_eq!(series.last(), Some(2.0));
        assert_eq!(series.get(2), None);
        assert_eq!(series.get(10), None);
    }

    #[test]
    fn defined_yields_indexed_values() {
        let values = vec![None, Some(50.0), Some(60.0)];
        let series = IndicatorSeries::new(IndicatorKind::Rsi, vec![2], values);
        let points: Vec<_> = series.defined().collect();
        assert_eq!(points, vec![(1, 50.0), (2, 60.0)]);
    }

    #[test]
    fn kind_serializes_as_identifier() {
        let json = serde_json::to_string(&IndicatorKind::SenkouA).unwrap();
        assert_eq!(json, format!("\"{}\"", IndicatorKind::SenkouA.as_str()));
    }

    #[test]
    fn undefined_serializes_as_null() {
        let series =
            IndicatorSeries::new(IndicatorKind::MovingAverage, vec![3], vec![None, Some(1.5)]);
        let json = serde_json::to_value(&series).unwrap();
        assert_eq!(json["values"], serde_json::json!([null, 1.5]));
        assert_eq!(json["kind"], "moving_average");
    }
}
