use ownership_config::OwnershipConfig;
use tracing_subscriber::EnvFilter;

/// Installs the process-wide fmt subscriber. `RUST_LOG` takes precedence over
/// the configured filter. Returns `false` when a subscriber was already set,
/// which is left untouched.
pub fn init_tracing(config: &OwnershipConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use ownership_config::OwnershipConfig;

    use super::init_tracing;

    #[test]
    fn second_initialisation_is_a_no_op() {
        let config = OwnershipConfig::default();
        let _ = init_tracing(&config);
        assert!(!init_tracing(&config));
    }
}
