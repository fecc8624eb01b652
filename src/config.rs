//! Environment configuration
//!
//! Credentials are externally supplied only. The API key is required and
//! its absence is a fatal startup condition for the networked binary,
//! never a runtime recoverable error.

use crate::error::{BudgetAgentError, Result};

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL: &str = "openai/gpt-3.5-turbo";
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub port: u16,
}

impl AgentConfig {
    /// Load configuration from the environment (and `.env` if present).
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let api_key = std::env::var("OPENROUTER_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                BudgetAgentError::Config(
                    "OPENROUTER_API_KEY not set - see .env.example".to_string(),
                )
            })?;

        let base_url = std::env::var("OPENROUTER_API_BASE")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let model = std::env::var("BUDGET_AGENT_MODEL")
            .ok()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let port = std::env::var("PORT")
            .or_else(|_| std::env::var("API_PORT"))
            .unwrap_or_else(|_| DEFAULT_PORT.to_string())
            .parse()
            .map_err(|e| BudgetAgentError::Config(format!("invalid port: {}", e)))?;

        Ok(Self {
            api_key,
            base_url,
            model,
            port,
        })
    }
}
