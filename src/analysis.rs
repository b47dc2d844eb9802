//! Incident-analysis collaborator boundary: free text in, a structured JSON
//! object (incident type, severity, risk factors, recommended actions) out.
//! The pipeline only depends on this shape, not on the model behind it.

use std::time::Duration;

use anyhow::{bail, Context, Result as AnyResult};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

const SYSTEM_INSTRUCTION: &str = "You are a safety incident analysis expert. \
Analyze the incident description and provide: 1) Incident type classification \
2) Severity level 3) Key risk factors 4) Recommended immediate actions. \
Format as JSON.";

#[async_trait::async_trait]
pub trait IncidentAnalyzer: Send + Sync {
    async fn analyze(&self, description: &str) -> AnyResult<Value>;
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

pub struct ChatAnalyzer {
    http: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl ChatAnalyzer {
    pub fn new(api_key: &str, model: &str) -> AnyResult<Self> {
        if api_key.trim().is_empty() {
            bail!("language-model credential is missing");
        }

        let http = Client::builder().timeout(Duration::from_secs(60)).build()?;

        Ok(Self {
            http,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait::async_trait]
impl IncidentAnalyzer for ChatAnalyzer {
    async fn analyze(&self, description: &str) -> AnyResult<Value> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                ChatMessage { role: "system", content: SYSTEM_INSTRUCTION },
                ChatMessage { role: "user", content: description },
            ],
            "response_format": { "type": "json_object" },
        });

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("Language-model request failed")?;

        let status = response.status();
        if !status.is_success() {
            bail!("Language-model service returned {}", status);
        }

        let payload: Value = response
            .json()
            .await
            .context("Failed to read language-model response")?;

        let content = payload["choices"][0]["message"]["content"]
            .as_str()
            .context("Language-model response had no message content")?;

        let analysis: Value =
            serde_json::from_str(content).context("Analysis content was not a JSON object")?;

        info!("Incident analysis produced {} fields", analysis.as_object().map(|o| o.len()).unwrap_or(0));
        Ok(analysis)
    }
}
