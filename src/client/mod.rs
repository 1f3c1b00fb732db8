//! HTTP client for the Judgment evaluation platform API.

mod types;


pub use types::{Dataset, Example, Trace};

use crate::config::Config;
use crate::error::{JudgmentError, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.judgmentlabs.ai";

/// Remote operations this adapter forwards to.
///
/// The MCP server only talks to this trait, so tool dispatch can be tested
/// against a mock without a network.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JudgmentApi: Send + Sync {
    /// Fetch a trace by ID.
    async fn fetch_trace(&self, trace_id: &str) -> Result<Value>;

    /// Delete a trace by ID.
    async fn delete_trace(&self, trace_id: &str) -> Result<Value>;

    /// Run an evaluation; the payload is forwarded verbatim.
    async fn run_evaluation(&self, payload: &Value) -> Result<Value>;

    /// Fetch results for a named evaluation run.
    async fn fetch_evaluation_results(&self, project_name: &str, eval_name: &str) -> Result<Value>;

    /// Pull a dataset by alias and project.
    async fn pull_dataset(&self, alias: &str, project_name: &str) -> Result<Dataset>;

    /// Push a dataset. With `overwrite` the platform replaces any existing
    /// dataset under the alias instead of rejecting the write.
    async fn push_dataset(
        &self,
        alias: &str,
        project_name: &str,
        dataset: &Dataset,
        overwrite: bool,
    ) -> Result<Value>;

    /// Delete a dataset by alias and project.
    async fn delete_dataset(&self, alias: &str, project_name: &str) -> Result<Value>;

    /// Create a project.
    async fn create_project(&self, project_name: &str) -> Result<Value>;

    /// Delete a project and all its data.
    async fn delete_project(&self, project_name: &str) -> Result<Value>;

    /// Liveness probe.
    async fn health(&self) -> Result<()>;
}

/// reqwest-backed client for the Judgment REST API.
pub struct JudgmentClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl JudgmentClient {
    /// Create a new client against the production API.
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.to_string(), 30)
    }

    /// Create a client from configuration.
    pub fn from_config(config: &Config, api_key: String) -> Self {
        Self::with_base_url(api_key, config.base_url.clone(), config.timeout_secs)
    }

    /// Create with custom base URL (for testing).
    pub fn with_base_url(api_key: String, base_url: String, timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(body)
            .send()
            .await?;

        Self::decode(response).await
    }

    /// Turn an HTTP response into a JSON value or a typed API error whose
    /// message carries the status code and the body's `detail` field.
    async fn decode(response: reqwest::Response) -> Result<Value> {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(str::to_string))
                .unwrap_or_else(|| {
                    let trimmed = text.trim();
                    if trimmed.is_empty() {
                        "Unknown error".to_string()
                    } else {
                        trimmed.to_string()
                    }
                });

            return Err(JudgmentError::Api {
                status: status.as_u16(),
                message,
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl JudgmentApi for JudgmentClient {
    async fn fetch_trace(&self, trace_id: &str) -> Result<Value> {
        self.post("/traces/fetch", &json!({ "trace_id": trace_id }))
            .await
    }

    async fn delete_trace(&self, trace_id: &str) -> Result<Value> {
        self.post("/traces/delete", &json!({ "trace_id": trace_id }))
            .await
    }

    async fn run_evaluation(&self, payload: &Value) -> Result<Value> {
        self.post("/run_evaluation", payload).await
    }

    async fn fetch_evaluation_results(&self, project_name: &str, eval_name: &str) -> Result<Value> {
        self.post(
            "/fetch_eval_results",
            &json!({ "project_name": project_name, "eval_name": eval_name }),
        )
        .await
    }

    async fn pull_dataset(&self, alias: &str, project_name: &str) -> Result<Dataset> {
        let value = self
            .post(
                "/datasets/pull",
                &json!({ "alias": alias, "project_name": project_name }),
            )
            .await?;

        Ok(serde_json::from_value(value)?)
    }

    async fn push_dataset(
        &self,
        alias: &str,
        project_name: &str,
        dataset: &Dataset,
        overwrite: bool,
    ) -> Result<Value> {
        self.post(
            "/datasets/push",
            &json!({
                "alias": alias,
                "project_name": project_name,
                "examples": dataset.examples,
                "traces": dataset.traces,
                "overwrite": overwrite,
            }),
        )
        .await
    }

    async fn delete_dataset(&self, alias: &str, project_name: &str) -> Result<Value> {
        self.post(
            "/datasets/delete",
            &json!({ "alias": alias, "project_name": project_name }),
        )
        .await
    }

    async fn create_project(&self, project_name: &str) -> Result<Value> {
        self.post("/projects/add", &json!({ "project_name": project_name }))
            .await
    }

    async fn delete_project(&self, project_name: &str) -> Result<Value> {
        self.post("/projects/delete", &json!({ "project_name": project_name }))
            .await
    }

    async fn health(&self) -> Result<()> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(JudgmentError::Api {
                status: response.status().as_u16(),
                message: "health check failed".to_string(),
            });
        }

        Ok(())
    }
}
