//! Logging utilities and structured logging support

pub use log::{debug, info, warn, error, trace};

/// Initialize the logging system with the default `env_logger` setup
pub fn init() {
    env_logger::init();
}

/// Initialize the logging system with a fallback level
///
/// `RUST_LOG` wins when it is set; otherwise `default_level` (for example
/// `"info"` or `"fly_engine=debug"`) is used as the filter.
pub fn init_with_level(default_level: &str) {
    let env = env_logger::Env::default().default_filter_or(default_level);
    if let Err(e) = env_logger::Builder::from_env(env).try_init() {
        // A logger was already installed (tests, embedding applications).
        log::debug!("Logger already initialized: {e}");
    }
}
