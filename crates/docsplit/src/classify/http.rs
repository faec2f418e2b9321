use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, info};

use crate::classify::invoker::ModelRuntime;
use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::sanitize::truncate_for_log;
use crate::secrets::resolve_secret;

const SERVICE: &str = "model runtime";

/// Model runtime reached over HTTPS with a bearer API key.
pub struct HttpModelRuntime {
    client: Client,
    endpoint: String,
    api_key: SecretString,
}

fn create_http_client(connect_timeout: Duration, request_timeout: Duration) -> Result<Client> {
    Ok(Client::builder()
        .connect_timeout(connect_timeout)
        .timeout(request_timeout)
        .build()
        .map_err(|e| PipelineError::upstream(SERVICE, format!("Failed to create HTTP client: {}", e)))?)
}

impl HttpModelRuntime {
    pub fn new(endpoint: impl Into<String>, api_key: SecretString) -> Result<Self> {
        Ok(Self {
            client: create_http_client(Duration::from_secs(10), Duration::from_secs(120))?,
            endpoint: endpoint.into(),
            api_key,
        })
    }

    /// Builds the runtime from the model section, resolving the API key from
    /// its configured source.
    pub fn from_config(config: &Config) -> Result<Self> {
        let model = &config.model;
        let api_key = resolve_secret(
            model.api_key.as_deref(),
            model.api_key_file.as_deref(),
            Some(&model.api_key_env_var),
        )?;

        Ok(Self {
            client: create_http_client(
                Duration::from_secs(model.connect_timeout_secs),
                Duration::from_secs(model.request_timeout_secs),
            )?,
            endpoint: model.endpoint(&config.region),
            api_key,
        })
    }

    fn invoke_url(&self, runtime_model_id: &str) -> String {
        format!(
            "{}/model/{}/invoke",
            self.endpoint,
            runtime_model_id.replace(':', "%3A")
        )
    }
}

#[async_trait]
impl ModelRuntime for HttpModelRuntime {
    async fn invoke(
        &self,
        runtime_model_id: &str,
        body: Value,
    ) -> std::result::Result<Value, PipelineError> {
        let url = self.invoke_url(runtime_model_id);
        info!(model = runtime_model_id, "Invoking model");

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| PipelineError::upstream(SERVICE, format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(PipelineError::upstream(
                SERVICE,
                format!("Invocation failed ({}): {}", status, truncate_for_log(&text)),
            ));
        }

        let body: Value = response.json().await.map_err(|e| {
            PipelineError::upstream(SERVICE, format!("Failed to parse response: {}", e))
        })?;
        debug!(model = runtime_model_id, "Model response received");
        Ok(body)
    }
}
