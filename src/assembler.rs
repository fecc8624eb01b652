//! Prompt Assembler
//!
//! Deterministically serializes a normalized input set into the prompt
//! sent to the model. Assembly is a pure function of the input set:
//! identical input yields a byte-identical prompt. Nothing time- or
//! id-dependent is ever embedded here.

use sha2::{Digest, Sha256};
use std::fmt::Write;

use crate::models::{FinancialInputSet, PromptDocument, PromptSection, RecordGroup, SectionLabel};

/// Contract revision embedded in the persona block. Bump when the
/// instruction text changes.
pub const PROMPT_CONTRACT_VERSION: &str = "v1";

/// Fixed persona/contract instruction block. Sent verbatim on every
/// request; the report contract validated downstream is defined by the
/// four `##` sections named here.
pub const PERSONA_CONTRACT: &str = r#"[budget-agent contract v1]

You are an AI-powered budget management agent. Your persona is that of a
precise, data-driven, and supportive financial analyst. You are encouraging
but always ground your insights in the data provided. You are a tool for
empowerment, helping users gain objective clarity on their financial habits.

Your primary directive is to transform user-provided financial data into a
structured, actionable budget and provide data-driven insights. You will:

1. Ingest & Categorize: parse the provided income and expense data. Where a
   category is marked as unspecified, ask for clarification instead of
   assuming one.
2. Budget Generation: based on the stated financial goals, generate a
   personalized budget clearly allocating funds to fixed costs, variable
   spending, and savings.
3. Spending Analysis: analyze spending patterns against the budget and
   quantify variances.
4. Formulate Recommendations: generate specific, actionable recommendations
   prioritized by impact on the user's goals.
5. Reporting: deliver insights as a structured, easy-to-read report.

The user data follows this message under these headings: "Income Sources"
(source and amount per line), "Expense Items" (item, category and amount),
"Financial Goals" (goal and target amount), and "Spending History" (past
transactions; negative amounts are debits). Entries that could not be
normalized are included verbatim - interpret them conservatively and ask
for clarification where they are ambiguous.

All responses must be well-structured Markdown. Your output is a Budget
Health Report containing the following sections, in this exact order:

1. ## Budget Overview: a top-level summary table showing Total Income,
   Total Expenses, and Net Savings for the period.
2. ## Spending Analysis: a breakdown of spending by category in a table
   with columns for Category, Budgeted Amount, Actual Spent, and Variance.
3. ## Key Insights & Recommendations: a numbered list of 2-3 specific,
   data-driven insights, each followed by a concrete recommendation.
4. ## Goal Progress: a status update on progress toward the stated goals.

Your tone must be consistently encouraging and objective. Frame insights
as observations, not judgments.

MUST NOT provide financial advice: never provide advice constituting
professional investment, tax, or legal guidance. If asked, respond with:
"As an AI agent, I cannot provide financial advice. Please consult a
certified financial professional for guidance on investments, taxes, or
legal matters."

MUST NOT handle real assets: you are forbidden from integrating with bank
accounts, making payments, or executing real-world transactions.

MUST NOT make unrealistic projections: all savings projections must be
based directly on the data provided. Do not speculate or make promises.

MUST NOT store PII: never request account numbers, social security
numbers, or addresses.

Base every analysis on the numerical data provided. If any input is
ambiguous, ask clarifying questions before proceeding; do not make
assumptions."#;

/// Build the ordered section list for an input set. Empty groups are
/// skipped entirely so the prompt carries no dangling headings.
pub fn build_document(input: &FinancialInputSet) -> PromptDocument {
    let mut sections = Vec::new();

    for label in SectionLabel::ORDERED {
        let body = match label {
            SectionLabel::IncomeSources => render_group(&input.income, |r, out| {
                let _ = writeln!(out, "- {}: {}", r.source, r.amount);
            }),
            SectionLabel::ExpenseItems => render_group(&input.expenses, |r, out| {
                let category = r.category.as_deref().unwrap_or("category unspecified");
                let _ = writeln!(out, "- {} [{}]: {}", r.item, category, r.amount);
            }),
            SectionLabel::FinancialGoals => render_group(&input.goals, |r, out| {
                let _ = writeln!(out, "- {}: target {}", r.goal, r.target_amount);
            }),
            SectionLabel::SpendingHistory => render_group(&input.transactions, |r, out| {
                match &r.category {
                    Some(category) => {
                        let _ = writeln!(
                            out,
                            "- {} | {} | {} | {}",
                            r.date, r.description, r.amount, category
                        );
                    }
                    None => {
                        let _ = writeln!(out, "- {} | {} | {}", r.date, r.description, r.amount);
                    }
                }
            }),
        };

        if let Some(body) = body {
            sections.push(PromptSection { label, body });
        }
    }

    PromptDocument { sections }
}

/// Render the full prompt string: persona block, then each section as a
/// Markdown heading, joined by blank lines.
pub fn assemble_prompt(input: &FinancialInputSet) -> String {
    let document = build_document(input);

    let mut prompt = String::from(PERSONA_CONTRACT);
    for section in &document.sections {
        prompt.push_str("\n\n## ");
        prompt.push_str(section.label.heading());
        prompt.push('\n');
        prompt.push_str(&section.body);
    }

    prompt
}

/// SHA-256 hex fingerprint of an assembled prompt. Stable across
/// requests for identical input; used for log correlation only.
pub fn prompt_fingerprint(prompt: &str) -> String {
    hex::encode(Sha256::digest(prompt.as_bytes()))
}

/// Serialized records first, then any leftover lines verbatim.
/// Returns `None` for an empty group so the section is omitted.
fn render_group<T>(group: &RecordGroup<T>, mut render: impl FnMut(&T, &mut String)) -> Option<String> {
    if group.is_empty() {
        return None;
    }

    let mut out = String::new();
    for record in &group.records {
        render(record, &mut out);
    }
    for line in &group.unparsed {
        out.push_str(line);
        out.push('\n');
    }

    // trailing newline is dropped so joins stay uniform
    while out.ends_with('\n') {
        out.pop();
    }

    Some(out)
}
