//! Centralized configuration for api-server.
//!
//! All environment variables are loaded and validated at startup to fail fast
//! on misconfiguration rather than at request time.

use axum::http::HeaderValue;
use std::env;
use std::fmt;

use domain::LocationFilter;

/// Log output format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn from_str(s: &str) -> Self {
        if s.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Pretty
        }
    }
}

fn location_filter_from_str(s: &str) -> LocationFilter {
    if s.eq_ignore_ascii_case("matching") {
        LocationFilter::Matching
    } else {
        LocationFilter::Legacy
    }
}

/// Configuration error.
#[derive(Debug)]
pub struct ConfigError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Configuration error for {}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

/// Server configuration loaded from environment variables.
///
/// All fields are validated at construction time.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port (default: 3001)
    pub port: u16,
    /// Join-filter policy for the doctor-locations endpoint
    pub location_filter: LocationFilter,
    /// CORS allow origin
    pub cors_allow_origin: HeaderValue,
    /// Log format
    pub log_format: LogFormat,
    /// Instance secret (default: "dev"; has no bearing on endpoint behavior)
    pub secret_key: String,
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// Fails fast on invalid configuration.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Port
        let port = env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3001);

        // Join-filter policy. Defaults to the observed (inverted) behavior
        // to keep the external contract stable; set LOCATION_FILTER=matching
        // to opt into the evidently intended join.
        let location_filter = location_filter_from_str(
            &env::var("LOCATION_FILTER").unwrap_or_else(|_| "legacy".into()),
        );

        // CORS allow origin
        let cors_origin_str = env::var("CORS_ALLOW_ORIGIN").unwrap_or_else(|_| "*".into());
        let cors_allow_origin = if cors_origin_str == "*" {
            HeaderValue::from_static("*")
        } else {
            HeaderValue::from_str(&cors_origin_str).map_err(|e| ConfigError {
                field: "CORS_ALLOW_ORIGIN",
                message: format!("Invalid header value '{}': {}", cors_origin_str, e),
            })?
        };

        // Log format
        let log_format =
            LogFormat::from_str(&env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".into()));

        // Instance secret; the original app shipped a "dev" default meant to
        // be overridden by instance config
        let secret_key = env::var("SECRET_KEY").unwrap_or_else(|_| "dev".into());

        Ok(Self {
            port,
            location_filter,
            cors_allow_origin,
            log_format,
            secret_key,
        })
    }

    /// Log warnings about surprising or insecure configuration.
    pub fn warn_on_startup(&self) {
        if self.location_filter == LocationFilter::Legacy {
            tracing::warn!(
                "LOCATION_FILTER=legacy: /doctors/{{id}}/locations returns the locations of \
                 every doctor EXCEPT the requested one, matching the original service's \
                 inverted join. Set LOCATION_FILTER=matching for the intended behavior."
            );
        }
        if self.secret_key == "dev" {
            tracing::warn!(
                "SECRET_KEY is the default 'dev' value. Override it outside local development."
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_format_parsing() {
        assert_eq!(LogFormat::from_str("pretty"), LogFormat::Pretty);
        assert_eq!(LogFormat::from_str("json"), LogFormat::Json);
        assert_eq!(LogFormat::from_str("JSON"), LogFormat::Json);
        assert_eq!(LogFormat::from_str("anything"), LogFormat::Pretty);
    }

    #[test]
    fn location_filter_parsing() {
        assert_eq!(
            location_filter_from_str("legacy"),
            LocationFilter::Legacy
        );
        assert_eq!(
            location_filter_from_str("matching"),
            LocationFilter::Matching
        );
        assert_eq!(
            location_filter_from_str("MATCHING"),
            LocationFilter::Matching
        );
        assert_eq!(
            location_filter_from_str("anything"),
            LocationFilter::Legacy
        );
    }
}
