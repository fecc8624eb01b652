//! Model provider interface and OpenRouter client
//!
//! The provider is an opaque collaborator: one request/response call
//! taking the assembled prompt and returning the report text or an error.
//! Nothing here assumes structured output beyond plain text; the report
//! contract is checked downstream.
//!
//! Uses a long-lived reqwest::Client for connection pooling.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info};

use crate::config::AgentConfig;
use crate::error::ProviderError;
use crate::Result;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Trait for the external model call (the only suspension point in the
/// pipeline). Construct once at process start and inject into the
/// orchestrator.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Reusable OpenRouter chat-completions client (connection-pooled)
pub struct OpenRouterClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenRouterClient {
    pub fn new(config: &AgentConfig) -> Self {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        }
    }
}

#[async_trait]
impl ModelProvider for OpenRouterClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        info!(model = %self.model, "calling model provider");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("provider request failed: {}", e);
                if e.is_timeout() {
                    ProviderError::Timeout(e.to_string())
                } else {
                    ProviderError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!(status = %status, "provider error response: {}", error_text);
            return Err(classify_status(status, error_text).into());
        }

        let completion: ChatResponse = response.json().await.map_err(|e| {
            error!("failed to parse provider response: {}", e);
            ProviderError::MalformedResponse(e.to_string())
        })?;

        let report = completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| {
                ProviderError::MalformedResponse("no choices in response".to_string())
            })?;

        info!(bytes = report.len(), "provider response received");

        Ok(report)
    }
}

fn classify_status(status: StatusCode, body: String) -> ProviderError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::Auth(body),
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimit(body),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            ProviderError::Timeout(body)
        }
        _ => ProviderError::Network(format!("{}: {}", status, body)),
    }
}

//
// ================= Wire Types =================
//

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

//
// ================= Static Provider =================
//

/// Canned provider for development & testing.
/// Keeps the system functional without a network dependency.
pub struct StaticProvider {
    response: String,
}

impl StaticProvider {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }

    /// A well-formed four-section Budget Health Report.
    pub fn canned_report() -> Self {
        Self::new(
            "## Budget Overview\n\
             | Total Income | Total Expenses | Net Savings |\n\
             |--------------|----------------|-------------|\n\
             | $4,500 | $15 | $4,485 |\n\n\
             ## Spending Analysis\n\
             | Category | Budgeted Amount | Actual Spent | Variance |\n\
             |----------|-----------------|--------------|----------|\n\
             | Entertainment | $20 | $15 | -$5 |\n\n\
             ## Key Insights & Recommendations\n\
             1. Insight: entertainment spending is within budget. \
             Recommendation: keep the current allocation.\n\n\
             ## Goal Progress\n\
             Emergency fund: $0 of $10,000 saved so far.\n",
        )
    }
}

#[async_trait]
impl ModelProvider for StaticProvider {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        Ok(self.response.clone())
    }
}
