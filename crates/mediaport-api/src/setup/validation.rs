//! Configuration validation
//!
//! Validates critical configuration values at startup to catch misconfigurations early.

use anyhow::Result;
use mediaport_core::Config;

/// Validate critical configuration values; fails fast on anything that would
/// break request handling or weaken security in production.
pub fn validate_config(config: &Config) -> Result<()> {
    config.validate()?;

    if config.is_production() && config.cors_origins.iter().any(|o| o == "*") {
        return Err(anyhow::anyhow!(
            "CORS configured to allow all origins (*) in production - this is a security risk. \
            Please set specific allowed origins via CORS_ORIGINS environment variable."
        ));
    }

    if config.broker.enabled && config.broker.user.is_none() {
        tracing::warn!("Broker enabled without BROKER_USER - connecting anonymously");
    }

    Ok(())
}
