use std::path::Path;

use error_stack::{Report, ResultExt};
use serde::Deserialize;

use crate::error::ConfigError;
use crate::level::{DEFAULT_PRICE_THRESHOLD, DEFAULT_STRENGTH_THRESHOLD, DEFAULT_WINDOW};

pub const MAX_MA_LINES: usize = 5;
pub const MAX_MA_PERIOD: usize = 200;
pub const MAX_PERIOD: usize = 100;

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "text".into()
}

fn default_true() -> bool {
    true
}

fn default_ma_periods() -> Vec<usize> {
    vec![20, 50, 100, 200]
}

fn default_macd_fast() -> usize {
    12
}

fn default_macd_slow() -> usize {
    26
}

fn default_macd_signal() -> usize {
    9
}

fn default_rsi_period() -> usize {
    14
}

fn default_tenkan() -> usize {
    9
}

fn default_kijun() -> usize {
    26
}

fn default_senkou() -> usize {
    52
}

fn default_window() -> usize {
    DEFAULT_WINDOW
}

fn default_price_threshold() -> f64 {
    DEFAULT_PRICE_THRESHOLD
}

fn default_strength_threshold() -> usize {
    DEFAULT_STRENGTH_THRESHOLD
}

fn default_bins() -> usize {
    10
}

#[derive(Debug, Default, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub indicators: IndicatorsConfig,
    #[serde(default)]
    pub levels: LevelConfig,
    #[serde(default)]
    pub volume_profile: VolumeProfileConfig,
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Accepted values: `"text"` | `"json"`
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct IndicatorsConfig {
    #[serde(default)]
    pub ma: MaConfig,
    #[serde(default)]
    pub macd: MacdConfig,
    #[serde(default)]
    pub rsi: RsiConfig,
    #[serde(default)]
    pub ichimoku: IchimokuConfig,
}

#[derive(Debug, Deserialize)]
pub struct MaConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_ma_periods")]
    pub periods: Vec<usize>,
}

impl Default for MaConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            periods: default_ma_periods(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MacdConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_macd_fast")]
    pub fast: usize,
    #[serde(default = "default_macd_slow")]
    pub slow: usize,
    #[serde(default = "default_macd_signal")]
    pub signal: usize,
}

impl Default for MacdConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            fast: default_macd_fast(),
            slow: default_macd_slow(),
            signal: default_macd_signal(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RsiConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_rsi_period")]
    pub period: usize,
}

impl Default for RsiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            period: default_rsi_period(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct IchimokuConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_tenkan")]
    pub tenkan: usize,
    #[serde(default = "default_kijun")]
    pub kijun: usize,
    #[serde(default = "default_senkou")]
    pub senkou: usize,
}

impl Default for IchimokuConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tenkan: default_tenkan(),
            kijun: default_kijun(),
            senkou: default_senkou(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LevelConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_window")]
    pub window: usize,
    #[serde(default = "default_price_threshold")]
    pub price_threshold: f64,
    #[serde(default = "default_strength_threshold")]
    pub strength_threshold: usize,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window: default_window(),
            price_threshold: default_price_threshold(),
            strength_threshold: default_strength_threshold(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct VolumeProfileConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_bins")]
    pub bins: usize,
}

impl Default for VolumeProfileConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bins: default_bins(),
        }
    }
}

/// Load and validate an `AnalysisConfig` from a TOML file at `path`.
pub fn load(path: &Path) -> Result<AnalysisConfig, Report<ConfigError>> {
    let content = std::fs::read_to_string(path)
        .change_context(ConfigError::ReadFile)
        .attach_with(|| format!("path: {}", path.display()))?;
    parse(&content)
}

/// Parse and validate an `AnalysisConfig` from TOML text.
pub fn parse(content: &str) -> Result<AnalysisConfig, Report<ConfigError>> {
    let config: AnalysisConfig = toml::from_str(content).change_context(ConfigError::Parse {
        reason: "invalid TOML syntax or schema mismatch".into(),
    })?;

    validate(&config)?;

    Ok(config)
}

const VALID_LOG_FORMATS: &[&str] = &["text", "json"];

fn validate(config: &AnalysisConfig) -> Result<(), Report<ConfigError>> {
    validate_logging(&config.logging)?;
    validate_ma(&config.indicators.ma)?;
    validate_periods(&config.indicators)?;
    validate_levels(&config.levels)?;
    validate_volume_profile(&config.volume_profile)?;
    Ok(())
}

fn invalid(field: String) -> Report<ConfigError> {
    Report::new(ConfigError::Validation { field })
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), Report<ConfigError>> {
    if !VALID_LOG_FORMATS.contains(&logging.format.as_str()) {
        return Err(invalid(format!(
            "logging.format \"{}\" is not one of {VALID_LOG_FORMATS:?}",
            logging.format
        )));
    }
    Ok(())
}

fn validate_ma(ma: &MaConfig) -> Result<(), Report<ConfigError>> {
    if ma.periods.len() > MAX_MA_LINES {
        return Err(invalid(format!(
            "indicators.ma.periods: at most {MAX_MA_LINES} lines, got {}",
            ma.periods.len()
        )));
    }
    for &period in &ma.periods {
        if !(1..=MAX_MA_PERIOD).contains(&period) {
            return Err(invalid(format!(
                "indicators.ma.periods: {period} is outside 1..={MAX_MA_PERIOD}"
            )));
        }
    }
    Ok(())
}

fn validate_periods(indicators: &IndicatorsConfig) -> Result<(), Report<ConfigError>> {
    let macd = &indicators.macd;
    let ichimoku = &indicators.ichimoku;
    let periods = [
        ("indicators.macd.fast", macd.fast),
        ("indicators.macd.slow", macd.slow),
        ("indicators.macd.signal", macd.signal),
        ("indicators.rsi.period", indicators.rsi.period),
        ("indicators.ichimoku.tenkan", ichimoku.tenkan),
        ("indicators.ichimoku.kijun", ichimoku.kijun),
        ("indicators.ichimoku.senkou", ichimoku.senkou),
    ];
    for (field, period) in periods {
        if !(1..=MAX_PERIOD).contains(&period) {
            return Err(invalid(format!(
                "{field}: {period} is outside 1..={MAX_PERIOD}"
            )));
        }
    }
    Ok(())
}

fn validate_levels(levels: &LevelConfig) -> Result<(), Report<ConfigError>> {
    if levels.window == 0 {
        return Err(invalid("levels.window must be > 0".into()));
    }
    if !(levels.price_threshold.is_finite() && levels.price_threshold > 0.0) {
        return Err(invalid(format!(
            "levels.price_threshold {} must be a finite value > 0",
            levels.price_threshold
        )));
    }
    Ok(())
}

fn validate_volume_profile(profile: &VolumeProfileConfig) -> Result<(), Report<ConfigError>> {
    if profile.bins == 0 {
        return Err(invalid("volume_profile.bins must be > 0".into()));
    }
    Ok(())
}
