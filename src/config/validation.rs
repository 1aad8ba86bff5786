use super::models::Config;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Runner name for '{handler}' must not be empty")]
    EmptyRunnerName { handler: String },

    #[error("Handler '{handler}' claims no schemes")]
    NoSchemes { handler: String },

    #[error("Invalid scheme '{scheme}' for handler '{handler}'")]
    InvalidScheme { handler: String, scheme: String },

    #[error("Scheme '{scheme}' is claimed by both the asset and network handlers")]
    SchemeConflict { scheme: String },

    #[error("Timeout must be positive: {field} = {value}")]
    InvalidTimeout { field: String, value: u64 },
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_runner_names(config)?;
    validate_schemes(config)?;
    validate_timeouts(config)?;
    Ok(())
}

fn validate_runner_names(config: &Config) -> Result<(), ValidationError> {
    let names = [
        ("asset", &config.worker.asset_runner_name),
        ("file", &config.worker.file_runner_name),
    ];

    for (handler, name) in names {
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyRunnerName {
                handler: handler.to_string(),
            });
        }
    }

    Ok(())
}

/// Schemes must be well-formed and claimed by one handler only
fn validate_schemes(config: &Config) -> Result<(), ValidationError> {
    let groups = [
        ("asset", &config.asset.schemes),
        ("network", &config.network.schemes),
    ];

    for (handler, schemes) in groups {
        if schemes.is_empty() {
            return Err(ValidationError::NoSchemes {
                handler: handler.to_string(),
            });
        }

        for scheme in schemes {
            if !is_valid_scheme(scheme) {
                return Err(ValidationError::InvalidScheme {
                    handler: handler.to_string(),
                    scheme: scheme.clone(),
                });
            }
        }
    }

    let asset: HashSet<String> = config
        .asset
        .schemes
        .iter()
        .map(|s| s.to_ascii_lowercase())
        .collect();
    if let Some(scheme) = config
        .network
        .schemes
        .iter()
        .find(|s| asset.contains(&s.to_ascii_lowercase()))
    {
        return Err(ValidationError::SchemeConflict {
            scheme: scheme.clone(),
        });
    }

    Ok(())
}

/// RFC 3986: ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )
fn is_valid_scheme(scheme: &str) -> bool {
    let mut chars = scheme.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        _ => false,
    }
}

fn validate_timeouts(config: &Config) -> Result<(), ValidationError> {
    let timeouts = [
        ("network.connect_timeout_ms", config.network.connect_timeout_ms),
        ("network.request_timeout_ms", config.network.request_timeout_ms),
    ];

    for (field, value) in timeouts {
        if value == 0 {
            return Err(ValidationError::InvalidTimeout {
                field: field.to_string(),
                value,
            });
        }
    }

    Ok(())
}
