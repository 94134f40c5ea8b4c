//! Technical indicators and support/resistance detection over OHLCV candles.
//!
//! Everything here is a pure function of an immutable candle slice: no I/O,
//! no shared state. Rendering, data fetching and caching belong to the host.

pub mod analysis;
pub mod config;
pub mod error;
pub mod indicator;
pub mod level;
pub mod logging;
pub mod model;

pub use analysis::{ChartAnalysis, analyze};
pub use indicator::{Indicator, IndicatorKind, IndicatorSeries};
pub use level::{DetectedLevels, LevelDetector, LevelKind, PriceLevel};
pub use model::{Candle, CandleSeries};
