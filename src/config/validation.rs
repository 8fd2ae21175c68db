//! Configuration validation.
//!
//! # Responsibilities
//! - Normalize values with a documented default (zero attempts means one)
//! - Semantic validation (serde handles syntactic)
//! - Check the origin is usable as handshake provenance
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Runs before any connection attempt is made

use thiserror::Error;

use crate::config::schema::ClientConfig;

/// A single semantic problem with a [`ClientConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("host must not be empty")]
    EmptyHost,

    #[error("port must be non-zero")]
    InvalidPort,

    #[error("origin '{0}' is not an absolute URL")]
    InvalidOrigin(String),
}

pub(crate) fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Replace out-of-range values with their defaults.
pub fn normalize(config: &mut ClientConfig) {
    if config.retry.attempts == 0 {
        tracing::debug!("retry attempts of 0 normalized to 1");
        config.retry.attempts = 1;
    }
}

/// Validate a configuration, collecting every error found.
pub fn validate_config(config: &ClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.host.trim().is_empty() {
        errors.push(ValidationError::EmptyHost);
    }
    if config.port == 0 {
        errors.push(ValidationError::InvalidPort);
    }
    if url::Url::parse(&config.origin).is_err() {
        errors.push(ValidationError::InvalidOrigin(config.origin.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_attempts_normalized() {
        let mut config = ClientConfig::new("http://localhost/", "localhost", 3001, "k").with_retry(0);
        normalize(&mut config);
        assert_eq!(config.retry.attempts, 1);

        let mut config = config.with_retry(4);
        normalize(&mut config);
        assert_eq!(config.retry.attempts, 4);
    }

    #[test]
    fn test_collects_all_errors() {
        let config = ClientConfig::new("not a url", " ", 0, "k");
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::EmptyHost,
                ValidationError::InvalidPort,
                ValidationError::InvalidOrigin("not a url".to_string()),
            ]
        );
    }

    #[test]
    fn test_valid_config() {
        let config = ClientConfig::new(
            "http://localhost:3001/swagger/index.html",
            "localhost",
            3001,
            "EoCKgsUO2rMZdz1pqlJ0rvXTSCLDhjuomEyY",
        );
        assert!(validate_config(&config).is_ok());
    }
}
