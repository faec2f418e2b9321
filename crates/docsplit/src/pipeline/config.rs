use crate::config::{Config, GroupingConfig, PricingConfig};
use crate::error::ConfigError;
use crate::extraction::PollSettings;
use crate::storage::ObjectUri;

/// Settings both pipelines need, resolved once from the loaded config.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub profile_arn: String,
    pub standard_project_arn: String,
    pub custom_project_arn: Option<String>,
    pub output_root: ObjectUri,
    pub poll: PollSettings,
    pub grouping: GroupingConfig,
    pub pricing: PricingConfig,
}

impl PipelineConfig {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let profile_arn = config
            .extraction
            .profile_arn
            .clone()
            .filter(|arn| !arn.trim().is_empty())
            .ok_or(ConfigError::MissingSetting("extraction.profile_arn"))?;

        let output_root =
            ObjectUri::parse(&config.output_root).map_err(|e| ConfigError::Validation {
                message: format!("output_root: {}", e),
            })?;

        Ok(Self {
            profile_arn,
            standard_project_arn: config.extraction.standard_project_arn(&config.region),
            custom_project_arn: config.extraction.custom_project_arn.clone(),
            output_root,
            poll: PollSettings::new(
                config.extraction.poll_interval_secs,
                config.extraction.max_poll_attempts,
            ),
            grouping: config.grouping.clone(),
            pricing: config.pricing.clone(),
        })
    }
}
