use derive_more::{Display, Error};

#[derive(Debug, Display, Error)]
pub enum ConfigError {
    #[display("failed to read config file")]
    ReadFile,
    #[display("failed to parse config: {reason}")]
    Parse { reason: String },
    #[display("invalid config: {field}")]
    Validation { field: String },
}

#[derive(Debug, Display, Error)]
pub enum SeriesError {
    #[display("candle {index} is not after the previous candle")]
    Unordered { index: usize },
    #[display("candle {index} is invalid: {reason}")]
    InvalidCandle { index: usize, reason: String },
}

#[derive(Debug, Display, Error)]
pub enum IndicatorError {
    #[display("invalid parameter: {name}")]
    InvalidParameter { name: String },
}

#[derive(Debug, Display, Error)]
pub enum LevelError {
    #[display("invalid parameter: {name}")]
    InvalidParameter { name: String },
}

#[derive(Debug, Display, Error)]
pub enum AnalysisError {
    #[display("indicator setup failed")]
    Indicator,
    #[display("level detector setup failed")]
    Levels,
}
