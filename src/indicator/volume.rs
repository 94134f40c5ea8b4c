use error_stack::{Report, bail};
use serde::Serialize;

use crate::error::IndicatorError;
use crate::indicator::{close_prices, volumes};
use crate::model::Candle;

/// Volume Profile: traded volume summed over equal-population close-price buckets.
pub struct VolumeProfile {
    bins: usize,
}

/// One price bucket of a volume profile, covering `(low, high]`.
///
/// The lowest bucket also includes its `low` edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VolumeBucket {
    pub low: f64,
    pub high: f64,
    pub volume: f64,
}

impl VolumeProfile {
    pub fn new(bins: usize) -> Result<Self, Report<IndicatorError>> {
        if bins == 0 {
            bail!(IndicatorError::InvalidParameter {
                name: "bins must be > 0".into(),
            });
        }
        Ok(Self { bins })
    }

    /// Buckets ascending by price. Fewer than `bins` buckets are returned when
    /// repeated closes collapse quantile edges.
    pub fn calculate(&self, candles: &[Candle]) -> Vec<VolumeBucket> {
        if candles.is_empty() {
            return Vec::new();
        }

        let closes = close_prices(candles);
        let vols = volumes(candles);
        let mut sorted = closes.clone();
        sorted.sort_by(f64::total_cmp);

        let mut edges: Vec<f64> = (0..=self.bins)
            .map(|k| quantile(&sorted, k as f64 / self.bins as f64))
            .collect();
        edges.dedup();

        // A single distinct close leaves one edge; keep it as a zero-width bucket.
        if edges.len() == 1 {
            let total = vols.iter().sum();
            return vec![VolumeBucket {
                low: edges[0],
                high: edges[0],
                volume: total,
            }];
        }

        let mut buckets: Vec<VolumeBucket> = edges
            .windows(2)
            .map(|w| VolumeBucket {
                low: w[0],
                high: w[1],
                volume: 0.0,
            })
            .collect();

        for (&close, &volume) in closes.iter().zip(&vols) {
            let slot = buckets
                .iter()
                .position(|b| close <= b.high)
                .unwrap_or(buckets.len() - 1);
            buckets[slot].volume += volume;
        }
        buckets
    }
}

/// Linear-interpolated quantile of pre-sorted values.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}
