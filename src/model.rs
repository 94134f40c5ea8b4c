use std::ops::Deref;

use chrono::{DateTime, Utc};
use error_stack::{Report, bail};
use serde::{Deserialize, Serialize};

use crate::error::SeriesError;

/// One OHLCV observation for a fixed time period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// `low <= open, close <= high`.
    pub fn is_consistent(&self) -> bool {
        self.low <= self.high
            && self.low <= self.open
            && self.open <= self.high
            && self.low <= self.close
            && self.close <= self.high
    }

    fn invalid_reason(&self) -> Option<&'static str> {
        let prices = [self.open, self.high, self.low, self.close];
        if prices.iter().any(|p| !p.is_finite() || *p <= 0.0) {
            return Some("prices must be finite and positive");
        }
        if !self.volume.is_finite() || self.volume < 0.0 {
            return Some("volume must be finite and non-negative");
        }
        if !self.is_consistent() {
            return Some("low <= open, close <= high does not hold");
        }
        None
    }
}

/// An immutable, ascending-by-timestamp sequence of candles.
///
/// Gaps between timestamps are permitted. Indicator and level computations
/// take `&[Candle]`, which this type derefs to.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CandleSeries {
    candles: Vec<Candle>,
}

impl CandleSeries {
    /// Build a series, checking ordering and per-candle invariants.
    pub fn new(candles: Vec<Candle>) -> Result<Self, Report<SeriesError>> {
        for (index, candle) in candles.iter().enumerate() {
            if let Some(reason) = candle.invalid_reason() {
                bail!(SeriesError::InvalidCandle {
                    index,
                    reason: reason.into(),
                });
            }
            if index > 0 && candle.timestamp <= candles[index - 1].timestamp {
                bail!(SeriesError::Unordered { index });
            }
        }
        Ok(Self { candles })
    }

    /// Wrap candles the caller has already normalized.
    pub fn new_unchecked(candles: Vec<Candle>) -> Self {
        Self { candles }
    }
}

impl Deref for CandleSeries {
    type Target = [Candle];

    fn deref(&self) -> &[Candle] {
        &self.candles
    }
}
