use std::path::Path;

use crate::config::schema::Config;
use crate::error::ConfigError;
use crate::storage::ObjectUri;

const SCHEMA_JSON: &str = include_str!("../../schema/config-v1.json");

/// Loads a config file, applies environment overrides, and validates the result.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut config = parse_config(&content)?;
    config.apply_env_overrides();
    validate_config(&config)?;

    Ok(config)
}

/// Parses and validates config JSON without consulting the environment.
pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let config = parse_config(content)?;
    validate_config(&config)?;
    Ok(config)
}

fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;

    validate_schema(&json_value)?;

    Ok(serde_json::from_value(json_value)?)
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let validator = jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
        message: format!("Failed to compile JSON schema: {}", e),
    })?;

    let error_messages: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| e.to_string())
        .collect();
    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

pub(crate) fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    if config.region.trim().is_empty() {
        return Err(ConfigError::Validation {
            message: "region must not be empty".to_string(),
        });
    }

    ObjectUri::parse(&config.output_root).map_err(|e| ConfigError::Validation {
        message: format!("output_root: {}", e),
    })?;

    if config.extraction.poll_interval_secs == 0 || config.extraction.max_poll_attempts == 0 {
        return Err(ConfigError::Validation {
            message: "extraction polling interval and attempts must be positive".to_string(),
        });
    }

    if !(0.0..=1.0).contains(&config.model.temperature) {
        return Err(ConfigError::Validation {
            message: format!(
                "model temperature {} is outside [0, 1]",
                config.model.temperature
            ),
        });
    }

    if config.jobs.retention_hours == 0 || config.jobs.progress_channel_capacity == 0 {
        return Err(ConfigError::Validation {
            message: "job retention and progress channel capacity must be positive".to_string(),
        });
    }

    let pricing = &config.pricing;
    let rates = [
        pricing.standard_per_page,
        pricing.custom_per_page,
        pricing.custom_extra_field,
    ];
    let model_rates = pricing
        .models
        .values()
        .flat_map(|p| [p.input_per_1k, p.output_per_1k]);
    if rates.into_iter().chain(model_rates).any(|r| !r.is_finite() || r < 0.0) {
        return Err(ConfigError::Validation {
            message: "pricing rates must be finite and non-negative".to_string(),
        });
    }

    Ok(())
}
