use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Installs the global fmt subscriber. `RUST_LOG` wins over the configured
/// level when it is set. Returns `false` if a subscriber was already
/// installed.
pub fn init(config: &LoggingConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("scrapeshelf={}", config.level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.with_target)
        .with_thread_ids(true)
        .with_thread_names(true)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_harmless() {
        let config = LoggingConfig {
            level: "debug".to_string(),
            with_target: true,
        };

        init(&config);
        assert!(!init(&config));
    }
}
