use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Install a global fmt subscriber for host applications.
///
/// Does nothing if a global subscriber is already set.
pub fn init_tracing(config: &LoggingConfig) {
    let filter = EnvFilter::new(&config.level);
    let result = match config.format.as_str() {
        "json" => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .try_init(),
        _ => tracing_subscriber::fmt().with_env_filter(filter).try_init(),
    };
    if result.is_err() {
        tracing::debug!("global tracing subscriber already installed");
    }
}
