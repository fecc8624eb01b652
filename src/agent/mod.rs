//! Main orchestrator - implements the report pipeline
//!
//! COLLECT -> ASSEMBLE -> DISPATCH -> VALIDATE -> PRESENT

use std::sync::RwLock;
use std::time::Instant;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::assembler::{assemble_prompt, prompt_fingerprint};
use crate::contract::ContractValidator;
use crate::error::{BudgetAgentError, ProviderError};
use crate::models::{BudgetReport, ContractStatus, FinancialInputSet};
use crate::parser::{RawSubmission, RecordParser};
use crate::provider::ModelProvider;
use crate::Result;

/// Pipeline phases for one generate request. Reset on every new action;
/// the failure edges land in `Failed` before returning to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Collecting,
    Assembling,
    Dispatched,
    Validating,
    Presented,
    Failed,
}

/// Orchestrator that coordinates parse -> assemble -> dispatch ->
/// validate -> present for a single session.
///
/// Collaborators are injected at construction; the provider is the only
/// async boundary. One request may be in flight at a time - a second
/// generate while one is outstanding is rejected, not run in parallel.
pub struct Orchestrator {
    parser: RecordParser,
    validator: ContractValidator,
    provider: Box<dyn ModelProvider>,
    in_flight: tokio::sync::Mutex<()>,
    phase: RwLock<Phase>,
}

impl Orchestrator {
    pub fn new(
        parser: RecordParser,
        validator: ContractValidator,
        provider: Box<dyn ModelProvider>,
    ) -> Self {
        Self {
            parser,
            validator,
            provider,
            in_flight: tokio::sync::Mutex::new(()),
            phase: RwLock::new(Phase::Idle),
        }
    }

    /// Current pipeline phase, for progress indication.
    pub fn phase(&self) -> Phase {
        *self.phase.read().unwrap_or_else(|e| e.into_inner())
    }

    fn set_phase(&self, phase: Phase) {
        debug!(?phase, "phase transition");
        *self.phase.write().unwrap_or_else(|e| e.into_inner()) = phase;
    }

    /// Run one generate action end to end.
    ///
    /// Empty input fails before any provider call. A contract violation
    /// is a soft outcome: the report is still presented, flagged. No
    /// automatic retry is performed - transient provider failures are
    /// surfaced to the user.
    pub async fn generate(&self, submission: RawSubmission) -> Result<BudgetReport> {
        let _guard = self
            .in_flight
            .try_lock()
            .map_err(|_| BudgetAgentError::RequestInFlight)?;

        let result = self.run_pipeline(&submission).await;

        match &result {
            Ok(report) => {
                self.set_phase(Phase::Presented);
                info!(
                    request_id = %report.request_id,
                    contract_satisfied = report.contract.is_satisfied(),
                    elapsed_ms = report.elapsed_ms,
                    "report presented"
                );
            }
            Err(e) => {
                self.set_phase(Phase::Failed);
                warn!(error = %e, "generate failed");
                self.set_phase(Phase::Idle);
            }
        }

        result
    }

    async fn run_pipeline(&self, submission: &RawSubmission) -> Result<BudgetReport> {
        let start_time = Instant::now();
        let request_id = Uuid::new_v4();

        info!(request_id = %request_id, "orchestrator: starting generate");

        // === COLLECT ===
        self.set_phase(Phase::Collecting);
        let input = self.parser.parse(submission);

        if input.is_empty() {
            return Err(BudgetAgentError::EmptyInput);
        }
        log_input_stats(&input);

        // === ASSEMBLE ===
        self.set_phase(Phase::Assembling);
        let prompt = assemble_prompt(&input);
        let fingerprint = prompt_fingerprint(&prompt);

        debug!(
            request_id = %request_id,
            fingerprint = %fingerprint,
            prompt_bytes = prompt.len(),
            "prompt assembled"
        );

        // === DISPATCH ===
        self.set_phase(Phase::Dispatched);
        let markdown = self.provider.generate(&prompt).await?;

        // === VALIDATE ===
        self.set_phase(Phase::Validating);
        if markdown.trim().is_empty() {
            return Err(ProviderError::MalformedResponse("empty report".to_string()).into());
        }

        let contract = self.validator.validate(&markdown);

        if let ContractStatus::Violated(violation) = &contract {
            // soft warning: the raw response is still delivered
            warn!(
                request_id = %request_id,
                violation = %violation,
                "report violates the section contract"
            );
        }

        // === PRESENT ===
        Ok(BudgetReport {
            request_id,
            markdown,
            contract,
            prompt_fingerprint: fingerprint,
            elapsed_ms: start_time.elapsed().as_millis() as u64,
        })
    }
}

fn log_input_stats(input: &FinancialInputSet) {
    info!(
        income_records = input.income.records.len(),
        expense_records = input.expenses.records.len(),
        goal_records = input.goals.records.len(),
        transaction_records = input.transactions.records.len(),
        leftover_lines = input.income.unparsed.len()
            + input.expenses.unparsed.len()
            + input.goals.unparsed.len()
            + input.transactions.unparsed.len(),
        "input collected"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::create_default_validator;
    use crate::provider::StaticProvider;

    fn orchestrator_with(provider: Box<dyn ModelProvider>) -> Orchestrator {
        Orchestrator::new(RecordParser::new(), create_default_validator(), provider)
    }

    fn sample_submission() -> RawSubmission {
        RawSubmission {
            income: "Monthly Salary \u{2013} $4500".to_string(),
            expenses: "Netflix \u{2013} Entertainment \u{2013} $15".to_string(),
            goals: "Emergency fund \u{2013} $10000".to_string(),
            spending_history: String::new(),
            spending_history_csv: None,
        }
    }

    #[tokio::test]
    async fn test_generate_end_to_end() {
        let orchestrator = orchestrator_with(Box::new(StaticProvider::canned_report()));

        let report = orchestrator.generate(sample_submission()).await.unwrap();

        assert!(report.contract.is_satisfied());
        assert!(report.markdown.contains("## Budget Overview"));
        assert_eq!(report.prompt_fingerprint.len(), 64);
        assert_eq!(orchestrator.phase(), Phase::Presented);
    }

    #[tokio::test]
    async fn test_empty_input_blocks_before_dispatch() {
        struct PanicProvider;

        #[async_trait::async_trait]
        impl ModelProvider for PanicProvider {
            async fn generate(&self, _prompt: &str) -> crate::Result<String> {
                panic!("provider must not be called for empty input");
            }
        }

        let orchestrator = orchestrator_with(Box::new(PanicProvider));
        let result = orchestrator.generate(RawSubmission::default()).await;

        assert!(matches!(result, Err(BudgetAgentError::EmptyInput)));
        assert_eq!(orchestrator.phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn test_contract_violation_still_presents_report() {
        let partial = "## Budget Overview\nx\n\n## Spending Analysis\nx\n\n## Goal Progress\nx\n";
        let orchestrator = orchestrator_with(Box::new(StaticProvider::new(partial)));

        let report = orchestrator.generate(sample_submission()).await.unwrap();

        // delivered to the caller, flagged rather than discarded
        assert_eq!(report.markdown, partial);
        match report.contract {
            ContractStatus::Violated(violation) => {
                assert_eq!(
                    violation.missing,
                    vec!["Key Insights & Recommendations".to_string()]
                );
            }
            ContractStatus::Satisfied => panic!("expected a violation"),
        }
    }

    #[tokio::test]
    async fn test_blank_response_is_malformed() {
        let orchestrator = orchestrator_with(Box::new(StaticProvider::new("   \n")));
        let result = orchestrator.generate(sample_submission()).await;

        assert!(matches!(
            result,
            Err(BudgetAgentError::Provider(ProviderError::MalformedResponse(_)))
        ));
    }

    #[tokio::test]
    async fn test_provider_failure_surfaces_verbatim_category() {
        struct FailingProvider;

        #[async_trait::async_trait]
        impl ModelProvider for FailingProvider {
            async fn generate(&self, _prompt: &str) -> crate::Result<String> {
                Err(ProviderError::Network("connection refused".to_string()).into())
            }
        }

        let orchestrator = orchestrator_with(Box::new(FailingProvider));
        let result = orchestrator.generate(sample_submission()).await;

        match result {
            Err(BudgetAgentError::Provider(ProviderError::Network(_))) => {}
            other => panic!("expected a network provider error, got {:?}", other.err()),
        }
        assert_eq!(orchestrator.phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn test_second_generate_while_in_flight_is_rejected() {
        use std::sync::Arc;

        struct SlowProvider;

        #[async_trait::async_trait]
        impl ModelProvider for SlowProvider {
            async fn generate(&self, _prompt: &str) -> crate::Result<String> {
                tokio::time::sleep(std::time::Duration::from_millis(200)).await;
                Ok(StaticProvider::canned_report().generate("").await.unwrap())
            }
        }

        let orchestrator = Arc::new(orchestrator_with(Box::new(SlowProvider)));

        let first = {
            let orchestrator = Arc::clone(&orchestrator);
            tokio::spawn(async move { orchestrator.generate(sample_submission()).await })
        };

        // let the first request reach the provider call
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        let second = orchestrator.generate(sample_submission()).await;
        assert!(matches!(second, Err(BudgetAgentError::RequestInFlight)));

        let first = first.await.unwrap();
        assert!(first.is_ok());
    }
}
