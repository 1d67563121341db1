use super::{types::Config, ConfigError};
use crate::orchestrator::{MAX_PRODUCTS_PER_RUN, MIN_PRODUCTS_PER_RUN};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Default products_per_run is within the accepted range
/// - Video polling settings are non-zero
/// - Scheduler times parse when the scheduler is enabled
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    let per_run = config.defaults.products_per_run;
    if !(MIN_PRODUCTS_PER_RUN..=MAX_PRODUCTS_PER_RUN).contains(&per_run) {
        return Err(ConfigError::ValidationError(format!(
            "defaults.products_per_run must be between {} and {}, got {}",
            MIN_PRODUCTS_PER_RUN, MAX_PRODUCTS_PER_RUN, per_run
        )));
    }

    if config.orchestrator.video_poll_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "orchestrator.video_poll_interval_ms cannot be 0".to_string(),
        ));
    }

    if config.orchestrator.video_max_wait_secs == 0 {
        return Err(ConfigError::ValidationError(
            "orchestrator.video_max_wait_secs cannot be 0".to_string(),
        ));
    }

    if config.scheduler.enabled {
        config
            .scheduler
            .validate()
            .map_err(|e| ConfigError::ValidationError(format!("scheduler: {}", e)))?;
    }

    Ok(())
}
