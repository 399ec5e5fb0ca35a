//! Logging utilities and structured logging support

use crate::core::LoggingConfig;

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system with the default `info` filter
pub fn init() {
    init_with(&LoggingConfig::default());
}

/// Initialize the logging system
///
/// `RUST_LOG` takes precedence over `config.level`. Calling this more than
/// once is harmless; later calls leave the first logger in place.
pub fn init_with(config: &LoggingConfig) {
    let env = env_logger::Env::default().default_filter_or(config.level.as_str());
    if env_logger::Builder::from_env(env).try_init().is_err() {
        log::debug!("Logger already initialized");
    }
}
