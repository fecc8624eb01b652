use budget_manager_agent::{
    agent::Orchestrator,
    contract::create_default_validator,
    models::ContractStatus,
    parser::{RawSubmission, RecordParser},
    provider::StaticProvider,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    info!("Budget Manager Agent starting (offline demo)");

    // Create components; the canned provider keeps the demo networkless
    let orchestrator = Orchestrator::new(
        RecordParser::new(),
        create_default_validator(),
        Box::new(StaticProvider::canned_report()),
    );

    // A sample submission
    let submission = RawSubmission {
        income: "Monthly Salary \u{2013} $4,500\nFreelance Work \u{2013} $800".to_string(),
        expenses: "Rent \u{2013} Housing \u{2013} $1,200\nNetflix \u{2013} Entertainment \u{2013} $15"
            .to_string(),
        goals: "Emergency fund \u{2013} $10,000".to_string(),
        spending_history: "2024-01-05, Starbucks, -$6.50, Coffee\n2024-01-06, Uber, -$12.00, Transport"
            .to_string(),
        spending_history_csv: None,
    };

    info!("Running orchestrator on sample input");

    // Run the pipeline
    match orchestrator.generate(submission).await {
        Ok(report) => {
            info!("Generate successful");
            println!("\n=== BUDGET HEALTH REPORT ===");
            println!("Request ID: {}", report.request_id);
            println!("Prompt fingerprint: {}", report.prompt_fingerprint);
            match &report.contract {
                ContractStatus::Satisfied => println!("Contract: satisfied"),
                ContractStatus::Violated(violation) => {
                    println!("Contract: VIOLATED ({})", violation)
                }
            }
            println!("\n{}", report.markdown);
            Ok(())
        }
        Err(e) => {
            eprintln!("Generate failed: {}", e);
            Err(Box::new(e) as Box<dyn std::error::Error>)
        }
    }
}
