//! REST API Server for the Budget Manager Agent
//!
//! Exposes the orchestrator via HTTP endpoints.
//! The UI renders forms and the final Markdown report; this layer is the
//! boundary between them and the core pipeline.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::agent::Orchestrator;
use crate::error::BudgetAgentError;
use crate::models::{BudgetReport, ContractStatus};
use crate::parser::RawSubmission;

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct GenerateRequest {
    #[serde(default)]
    pub income: String,
    #[serde(default)]
    pub expenses: String,
    #[serde(default)]
    pub goals: String,
    #[serde(default)]
    pub spending_history: String,
    /// Content of an uploaded CSV file, if any.
    #[serde(default)]
    pub spending_history_csv: Option<String>,
}

impl From<GenerateRequest> for RawSubmission {
    fn from(req: GenerateRequest) -> Self {
        RawSubmission {
            income: req.income,
            expenses: req.expenses,
            goals: req.goals,
            spending_history: req.spending_history,
            spending_history_csv: req.spending_history_csv,
        }
    }
}

/// =============================
/// Response Wrapper
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub orchestrator: Arc<Orchestrator>,
}

/// =============================
/// Health Endpoint
/// =============================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Generate Endpoint
/// =============================

fn report_payload(report: &BudgetReport) -> serde_json::Value {
    let warning = match &report.contract {
        ContractStatus::Violated(violation) => Some(format!(
            "the report does not follow the expected structure ({})",
            violation
        )),
        ContractStatus::Satisfied => None,
    };

    serde_json::json!({
        "request_id": report.request_id,
        "report": report.markdown,
        "contract": report.contract,
        "warning": warning,
        "prompt_fingerprint": report.prompt_fingerprint,
        "elapsed_ms": report.elapsed_ms,
    })
}

fn error_status(error: &BudgetAgentError) -> StatusCode {
    match error {
        BudgetAgentError::EmptyInput => StatusCode::BAD_REQUEST,
        BudgetAgentError::RequestInFlight => StatusCode::CONFLICT,
        BudgetAgentError::Provider(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn generate_report(
    State(state): State<ApiState>,
    Json(req): Json<GenerateRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    info!("received generate request");

    match state.orchestrator.generate(req.into()).await {
        // contract violations are presented with a warning, never discarded
        Ok(report) => (
            StatusCode::OK,
            Json(ApiResponse::success(report_payload(&report))),
        ),
        Err(e) => (error_status(&e), Json(ApiResponse::error(e.to_string()))),
    }
}

/// =============================
/// Router
/// =============================

pub fn create_router(orchestrator: Arc<Orchestrator>) -> Router {
    let state = ApiState { orchestrator };

    Router::new()
        .route("/health", axum::routing::get(health))
        .route("/api/generate", post(generate_report))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    orchestrator: Arc<Orchestrator>,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(orchestrator);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            error_status(&BudgetAgentError::EmptyInput),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            error_status(&BudgetAgentError::RequestInFlight),
            StatusCode::CONFLICT
        );
        assert_eq!(
            error_status(&BudgetAgentError::Provider(ProviderError::Timeout(
                "t".to_string()
            ))),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_generate_request_defaults() {
        let req: GenerateRequest = serde_json::from_str("{}").unwrap();
        let submission: RawSubmission = req.into();
        assert!(submission.income.is_empty());
        assert!(submission.spending_history_csv.is_none());
    }

    #[test]
    fn test_report_payload_carries_warning_on_violation() {
        let report = BudgetReport {
            request_id: uuid::Uuid::new_v4(),
            markdown: "## Budget Overview\n".to_string(),
            contract: ContractStatus::Violated(crate::models::ContractViolation {
                missing: vec!["Goal Progress".to_string()],
                out_of_order: vec![],
            }),
            prompt_fingerprint: "00".repeat(32),
            elapsed_ms: 5,
        };

        let payload = report_payload(&report);
        let warning = payload["warning"].as_str().unwrap();
        assert!(warning.contains("Goal Progress"));
        assert_eq!(payload["report"], "## Budget Overview\n");
    }
}
