use error_stack::{Report, ResultExt};
use serde::Serialize;

use crate::config::{AnalysisConfig, IndicatorsConfig, LevelConfig};
use crate::error::{AnalysisError, IndicatorError, LevelError};
use crate::indicator::ichimoku::Ichimoku;
use crate::indicator::ma::MovingAverage;
use crate::indicator::macd::Macd;
use crate::indicator::rsi::Rsi;
use crate::indicator::volume::{VolumeBucket, VolumeProfile};
use crate::indicator::{Indicator, IndicatorSeries};
use crate::level::{DetectedLevels, LevelDetector};
use crate::model::Candle;

/// Everything computed for one candle series.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartAnalysis {
    pub indicators: Vec<IndicatorSeries>,
    pub levels: DetectedLevels,
    pub volume_profile: Option<Vec<VolumeBucket>>,
}

/// Run every enabled indicator and the level detector over `candles`.
///
/// All parameters are checked before any computation starts, so a call either
/// returns a complete result or fails without partial output.
pub fn analyze(
    candles: &[Candle],
    config: &AnalysisConfig,
) -> Result<ChartAnalysis, Report<AnalysisError>> {
    let indicators =
        build_indicators(&config.indicators).change_context(AnalysisError::Indicator)?;
    let detector = build_detector(&config.levels).change_context(AnalysisError::Levels)?;
    let profile = if config.volume_profile.enabled {
        Some(
            VolumeProfile::new(config.volume_profile.bins)
                .change_context(AnalysisError::Indicator)?,
        )
    } else {
        None
    };

    let mut series: Vec<IndicatorSeries> = Vec::new();
    for indicator in &indicators {
        if candles.len() < indicator.required_candles() {
            tracing::trace!(
                indicator = indicator.name(),
                required = indicator.required_candles(),
                available = candles.len(),
                "series too short, lines stay undefined"
            );
        }
        series.extend(indicator.calculate(candles));
    }
    let levels = detector
        .map(|d| d.detect(candles))
        .unwrap_or_default();
    let volume_profile = profile.map(|p| p.calculate(candles));

    tracing::debug!(
        candles = candles.len(),
        indicators = indicators.len(),
        lines = series.len(),
        supports = levels.supports.len(),
        resistances = levels.resistances.len(),
        "chart analysis complete"
    );

    Ok(ChartAnalysis {
        indicators: series,
        levels,
        volume_profile,
    })
}

/// Build the enabled indicators: MA lines in configured order, then MACD, RSI
/// and Ichimoku.
pub fn build_indicators(
    config: &IndicatorsConfig,
) -> Result<Vec<Box<dyn Indicator>>, Report<IndicatorError>> {
    let mut indicators: Vec<Box<dyn Indicator>> = Vec::new();

    if config.ma.enabled {
        for &period in &config.ma.periods {
            let ma = MovingAverage::new(period).attach_with(|| format!("ma period: {period}"))?;
            indicators.push(Box::new(ma));
        }
    }
    if config.macd.enabled {
        let macd = &config.macd;
        indicators.push(Box::new(Macd::new(macd.fast, macd.slow, macd.signal)?));
    }
    if config.rsi.enabled {
        indicators.push(Box::new(Rsi::new(config.rsi.period)?));
    }
    if config.ichimoku.enabled {
        let ichimoku = &config.ichimoku;
        indicators.push(Box::new(Ichimoku::new(
            ichimoku.tenkan,
            ichimoku.kijun,
            ichimoku.senkou,
        )?));
    }

    Ok(indicators)
}

fn build_detector(config: &LevelConfig) -> Result<Option<LevelDetector>, Report<LevelError>> {
    if !config.enabled {
        return Ok(None);
    }
    LevelDetector::new(
        config.window,
        config.price_threshold,
        config.strength_threshold,
    )
    .map(Some)
}
