//! Support/resistance detection from local extrema and touch counts.

use error_stack::{Report, bail};
use serde::Serialize;

use crate::error::LevelError;
use crate::model::Candle;

pub const DEFAULT_WINDOW: usize = 20;
pub const DEFAULT_PRICE_THRESHOLD: f64 = 0.02;
pub const DEFAULT_STRENGTH_THRESHOLD: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelKind {
    Support,
    Resistance,
}

/// A detected support or resistance price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceLevel {
    pub price: f64,
    pub kind: LevelKind,
    /// Later candles whose whole range sits inside the tolerance band.
    pub strength: usize,
    /// Index of the candle the extremum was found at.
    pub origin_index: usize,
}

/// Detector output, each list in detection order (ascending origin index).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DetectedLevels {
    pub supports: Vec<PriceLevel>,
    pub resistances: Vec<PriceLevel>,
}

impl DetectedLevels {
    pub fn is_empty(&self) -> bool {
        self.supports.is_empty() && self.resistances.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PriceLevel> {
        self.supports.iter().chain(&self.resistances)
    }
}

/// Scans a candle series for local extrema over a symmetric window.
///
/// A candle at `i` is a support candidate when its low is `<=` every other low
/// in `[i - window, i + window]` (ties all qualify), and a resistance candidate
/// when its high is `>=` every other high there. Candidates are visited by
/// ascending index, support before resistance at the same index. A candidate
/// is dropped when it sits within `price_threshold` of any level already
/// accepted (either kind) or when its strength is below `strength_threshold`.
#[derive(Debug, Clone, Copy)]
pub struct LevelDetector {
    window: usize,
    price_threshold: f64,
    strength_threshold: usize,
}

impl LevelDetector {
    pub fn new(
        window: usize,
        price_threshold: f64,
        strength_threshold: usize,
    ) -> Result<Self, Report<LevelError>> {
        if window == 0 {
            bail!(LevelError::InvalidParameter {
                name: "window must be > 0".into(),
            });
        }
        if !(price_threshold.is_finite() && price_threshold > 0.0) {
            bail!(LevelError::InvalidParameter {
                name: "price_threshold must be a finite value > 0".into(),
            });
        }
        Ok(Self {
            window,
            price_threshold,
            strength_threshold,
        })
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn price_threshold(&self) -> f64 {
        self.price_threshold
    }

    pub fn strength_threshold(&self) -> usize {
        self.strength_threshold
    }

    /// Minimum series length for any candidate to exist.
    pub fn required_candles(&self) -> usize {
        self.window.saturating_mul(2).saturating_add(1)
    }

    pub fn detect(&self, candles: &[Candle]) -> DetectedLevels {
        let mut levels = DetectedLevels::default();
        if candles.len() < self.required_candles() {
            tracing::debug!(
                available = candles.len(),
                required = self.required_candles(),
                "series too short for level detection"
            );
            return levels;
        }

        let mut accepted: Vec<f64> = Vec::new();
        for i in self.window..candles.len() - self.window {
            let neighbours = (i - self.window..=i + self.window).filter(|&j| j != i);

            if neighbours.clone().all(|j| candles[i].low <= candles[j].low) {
                if let Some(level) = self.evaluate(candles, i, LevelKind::Support, &accepted) {
                    accepted.push(level.price);
                    levels.supports.push(level);
                }
            }
            if neighbours.clone().all(|j| candles[i].high >= candles[j].high) {
                if let Some(level) = self.evaluate(candles, i, LevelKind::Resistance, &accepted) {
                    accepted.push(level.price);
                    levels.resistances.push(level);
                }
            }
        }

        tracing::debug!(
            candles = candles.len(),
            window = self.window,
            supports = levels.supports.len(),
            resistances = levels.resistances.len(),
            "level detection complete"
        );
        levels
    }

    fn evaluate(
        &self,
        candles: &[Candle],
        index: usize,
        kind: LevelKind,
        accepted: &[f64],
    ) -> Option<PriceLevel> {
        let price = match kind {
            LevelKind::Support => candles[index].low,
            LevelKind::Resistance => candles[index].high,
        };

        if accepted
            .iter()
            .any(|&existing| (price - existing).abs() / price <= self.price_threshold)
        {
            tracing::trace!(index, price, ?kind, "candidate too close to an accepted level");
            return None;
        }

        let strength = self.touches(&candles[index + 1..], price);
        if strength < self.strength_threshold {
            tracing::trace!(index, price, ?kind, strength, "candidate below strength threshold");
            return None;
        }

        Some(PriceLevel {
            price,
            kind,
            strength,
            origin_index: index,
        })
    }

    fn touches(&self, later: &[Candle], price: f64) -> usize {
        let band_low = price * (1.0 - self.price_threshold);
        let band_high = price * (1.0 + self.price_threshold);
        later
            .iter()
            .filter(|c| c.low >= band_low && c.high <= band_high)
            .count()
    }
}

impl Default for LevelDetector {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            price_threshold: DEFAULT_PRICE_THRESHOLD,
            strength_threshold: DEFAULT_STRENGTH_THRESHOLD,
        }
    }
}

/// Top `n` levels by descending strength; ties keep the earlier origin first.
///
/// Ranking is left to the caller; the detector itself never truncates.
pub fn strongest(levels: &[PriceLevel], n: usize) -> Vec<PriceLevel> {
    let mut ranked = levels.to_vec();
    ranked.sort_by(|a, b| {
        b.strength
            .cmp(&a.strength)
            .then(a.origin_index.cmp(&b.origin_index))
    });
    ranked.truncate(n);
    ranked
}
