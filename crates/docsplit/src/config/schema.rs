use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_region")]
    pub region: String,
    /// Root under which both pipelines write their extraction output and
    /// the audit record is stored.
    #[serde(default = "default_output_root")]
    pub output_root: String,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub grouping: GroupingConfig,
    #[serde(default)]
    pub jobs: JobsConfig,
    #[serde(default)]
    pub pricing: PricingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_version() -> String {
    "1.0".to_string()
}

fn default_region() -> String {
    "us-west-2".to_string()
}

fn default_output_root() -> String {
    "s3://document-splitting-demo/output".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            region: default_region(),
            output_root: default_output_root(),
            extraction: ExtractionConfig::default(),
            model: ModelConfig::default(),
            grouping: GroupingConfig::default(),
            jobs: JobsConfig::default(),
            pricing: PricingConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Applies the process environment on top of the loaded values.
    pub fn apply_env_overrides(&mut self) {
        self.apply_env_overrides_from(|name| std::env::var(name).ok());
    }

    /// Applies overrides from an arbitrary lookup. Empty values are ignored.
    pub fn apply_env_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(region) = get("AWS_REGION") {
            self.region = region;
        }
        if let Some(bucket) = get("S3_BUCKET") {
            self.output_root = format!("s3://{}/output", bucket.trim_matches('/'));
        }
        if let Some(arn) = get("BDA_PROFILE_ARN") {
            self.extraction.profile_arn = Some(arn);
        }
        if let Some(arn) = get("BDA_PROJECT_ARN") {
            self.extraction.custom_project_arn = Some(arn);
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Data-automation profile used for both invocations.
    #[serde(default)]
    pub profile_arn: Option<String>,
    /// Project carrying the custom blueprints. When absent the custom
    /// invocation runs without a project binding.
    #[serde(default)]
    pub custom_project_arn: Option<String>,
    #[serde(default)]
    pub standard_project_arn: Option<String>,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_max_poll_attempts")]
    pub max_poll_attempts: u32,
}

fn default_poll_interval_secs() -> u64 {
    10
}

fn default_max_poll_attempts() -> u32 {
    60
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            profile_arn: None,
            custom_project_arn: None,
            standard_project_arn: None,
            poll_interval_secs: default_poll_interval_secs(),
            max_poll_attempts: default_max_poll_attempts(),
        }
    }
}

impl ExtractionConfig {
    /// The configured standard project, or the region's public default one.
    pub fn standard_project_arn(&self, region: &str) -> String {
        self.standard_project_arn.clone().unwrap_or_else(|| {
            format!(
                "arn:aws:bedrock:{}:aws:data-automation-project/public-default",
                region
            )
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_key_file: Option<String>,
    #[serde(default = "default_api_key_env_var")]
    pub api_key_env_var: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_api_key_env_var() -> String {
    "BEDROCK_API_KEY".to_string()
}

fn default_max_tokens() -> u32 {
    1500
}

fn default_temperature() -> f64 {
    0.1
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_connect_timeout_secs() -> u64 {
    10
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            api_key_file: None,
            api_key_env_var: default_api_key_env_var(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl ModelConfig {
    pub fn endpoint(&self, region: &str) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://bedrock-runtime.{}.amazonaws.com", region),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupingConfig {
    /// Pages with more words than this carry substantive content.
    #[serde(default = "default_substantive_word_threshold")]
    pub substantive_word_threshold: usize,
    /// Pages past the first with more words than this look like a new first page.
    #[serde(default = "default_first_page_word_threshold")]
    pub first_page_word_threshold: usize,
}

fn default_substantive_word_threshold() -> usize {
    50
}

fn default_first_page_word_threshold() -> usize {
    100
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            substantive_word_threshold: default_substantive_word_threshold(),
            first_page_word_threshold: default_first_page_word_threshold(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobsConfig {
    #[serde(default = "default_retention_hours")]
    pub retention_hours: u64,
    #[serde(default = "default_progress_channel_capacity")]
    pub progress_channel_capacity: usize,
}

fn default_retention_hours() -> u64 {
    24
}

fn default_progress_channel_capacity() -> usize {
    100
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            retention_hours: default_retention_hours(),
            progress_channel_capacity: default_progress_channel_capacity(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelPrice {
    pub input_per_1k: f64,
    pub output_per_1k: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    #[serde(default = "default_standard_per_page")]
    pub standard_per_page: f64,
    #[serde(default = "default_custom_per_page")]
    pub custom_per_page: f64,
    #[serde(default = "default_custom_included_fields")]
    pub custom_included_fields: usize,
    #[serde(default = "default_custom_extra_field")]
    pub custom_extra_field: f64,
    /// Token prices keyed by public model id.
    #[serde(default = "default_model_prices")]
    pub models: BTreeMap<String, ModelPrice>,
}

fn default_standard_per_page() -> f64 {
    0.010
}

fn default_custom_per_page() -> f64 {
    0.040
}

fn default_custom_included_fields() -> usize {
    30
}

fn default_custom_extra_field() -> f64 {
    0.0005
}

fn default_model_prices() -> BTreeMap<String, ModelPrice> {
    [
        ("nova-lite", 0.00006, 0.00024),
        ("nova-micro", 0.000035, 0.00014),
        ("nova-pro", 0.0008, 0.0032),
        ("claude-3-7-sonnet", 0.003, 0.015),
    ]
    .into_iter()
    .map(|(id, input, output)| {
        (
            id.to_string(),
            ModelPrice {
                input_per_1k: input,
                output_per_1k: output,
            },
        )
    })
    .collect()
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            standard_per_page: default_standard_per_page(),
            custom_per_page: default_custom_per_page(),
            custom_included_fields: default_custom_included_fields(),
            custom_extra_field: default_custom_extra_field(),
            models: default_model_prices(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            filter: default_log_filter(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.region, "us-west-2");
        assert_eq!(config.extraction.poll_interval_secs, 10);
        assert_eq!(config.extraction.max_poll_attempts, 60);
        assert_eq!(config.model.max_tokens, 1500);
        assert_eq!(config.grouping.substantive_word_threshold, 50);
        assert_eq!(config.jobs.retention_hours, 24);
        assert_eq!(config.pricing.models.len(), 4);
        assert_eq!(config.logging.format, LogFormat::Text);
    }

    #[test]
    fn test_empty_object_deserializes_to_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.output_root, "s3://document-splitting-demo/output");
        assert_eq!(config.model.api_key_env_var, "BEDROCK_API_KEY");
        assert_eq!(
            config.pricing.models["claude-3-7-sonnet"],
            ModelPrice {
                input_per_1k: 0.003,
                output_per_1k: 0.015
            }
        );
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("AWS_REGION", "eu-central-1"),
            ("S3_BUCKET", "my-bucket"),
            ("BDA_PROFILE_ARN", "arn:profile"),
            ("BDA_PROJECT_ARN", ""),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_env_overrides_from(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.region, "eu-central-1");
        assert_eq!(config.output_root, "s3://my-bucket/output");
        assert_eq!(config.extraction.profile_arn.as_deref(), Some("arn:profile"));
        assert!(config.extraction.custom_project_arn.is_none());
    }

    #[test]
    fn test_standard_project_defaults_to_public() {
        let extraction = ExtractionConfig::default();
        assert_eq!(
            extraction.standard_project_arn("us-east-1"),
            "arn:aws:bedrock:us-east-1:aws:data-automation-project/public-default"
        );
    }

    #[test]
    fn test_model_endpoint() {
        let mut model = ModelConfig::default();
        assert_eq!(
            model.endpoint("us-west-2"),
            "https://bedrock-runtime.us-west-2.amazonaws.com"
        );
        model.endpoint = Some("http://localhost:9000/".to_string());
        assert_eq!(model.endpoint("us-west-2"), "http://localhost:9000");
    }
}
