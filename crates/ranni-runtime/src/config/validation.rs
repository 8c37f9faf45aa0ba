//! Configuration validation utilities.

use std::net::SocketAddr;

use ranni_transport::websocket::parse_ws_url;
use url::Url;

use super::error::{ConfigError, ConfigResult};
use super::schema::{ApiConfig, GatewayConfig, LogOutput, LoggingConfig, RanniConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &RanniConfig) -> ConfigResult<()> {
    validate_gateway_config(&config.gateway)?;
    validate_api_config(&config.api)?;
    validate_logging_config(&config.logging)?;
    Ok(())
}

fn validate_gateway_config(gateway: &GatewayConfig) -> ConfigResult<()> {
    if gateway.ws_url.is_empty() {
        return Err(ConfigError::validation("gateway.ws_url must not be empty"));
    }
    parse_ws_url(&gateway.ws_url)
        .map_err(|e| ConfigError::invalid_url(&gateway.ws_url, e.to_string()))?;

    let callback = Url::parse(&gateway.callback_url)
        .map_err(|e| ConfigError::invalid_url(&gateway.callback_url, e.to_string()))?;
    if !matches!(callback.scheme(), "http" | "https") {
        return Err(ConfigError::invalid_url(
            &gateway.callback_url,
            "callback URL must use http:// or https://",
        ));
    }

    if gateway.timeout_secs == 0 {
        return Err(ConfigError::validation("Timeout must be greater than 0"));
    }

    Ok(())
}

fn validate_api_config(api: &ApiConfig) -> ConfigResult<()> {
    if let Some(addr) = &api.listen_addr {
        addr.parse::<SocketAddr>().map_err(|e| {
            ConfigError::validation(format!("Invalid api.listen_addr '{addr}': {e}"))
        })?;
    }
    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::validation(
            "logging.file_path is required when logging.output is 'file'",
        ));
    }
    Ok(())
}
