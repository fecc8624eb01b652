//! Core data models for the budget manager agent

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

//
// ================= Records =================
//

/// One income source, e.g. "Monthly Salary – $4,500"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeRecord {
    pub source: String,
    pub amount: Decimal,
}

/// One expense item. `category` stays `None` when the input line supplied
/// no category token; the model is asked to clarify, we never guess.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub item: String,
    pub amount: Decimal,
    pub category: Option<String>,
}

/// One savings goal with its target amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalRecord {
    pub goal: String,
    pub target_amount: Decimal,
}

/// One historical transaction. Amount sign marks debit vs credit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub date: TxnDate,
    pub description: String,
    pub amount: Decimal,
    pub category: Option<String>,
}

/// Transaction date: ISO where it parses, original text otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TxnDate {
    Iso(NaiveDate),
    Text(String),
}

impl fmt::Display for TxnDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxnDate::Iso(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            TxnDate::Text(s) => write!(f, "{}", s),
        }
    }
}

//
// ================= Input Set =================
//

/// Structured records for one input section, plus the lines of that
/// section that did not reduce to a record. Leftovers are preserved
/// verbatim so the model can attempt its own interpretation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordGroup<T> {
    pub records: Vec<T>,
    pub unparsed: Vec<String>,
}

impl<T> Default for RecordGroup<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            unparsed: Vec::new(),
        }
    }
}

impl<T> RecordGroup<T> {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.unparsed.is_empty()
    }

    /// Total input lines represented by this group.
    pub fn len(&self) -> usize {
        self.records.len() + self.unparsed.len()
    }
}

/// Everything one "Generate" action collected, normalized.
/// Lives for a single request; nothing is persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialInputSet {
    pub income: RecordGroup<IncomeRecord>,
    pub expenses: RecordGroup<ExpenseRecord>,
    pub goals: RecordGroup<GoalRecord>,
    pub transactions: RecordGroup<TransactionRecord>,
}

impl FinancialInputSet {
    pub fn is_empty(&self) -> bool {
        self.income.is_empty()
            && self.expenses.is_empty()
            && self.goals.is_empty()
            && self.transactions.is_empty()
    }
}

//
// ================= Prompt Sections =================
//

/// Labels for the prompt document sections, in their fixed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SectionLabel {
    IncomeSources,
    ExpenseItems,
    FinancialGoals,
    SpendingHistory,
}

impl SectionLabel {
    pub const ORDERED: [SectionLabel; 4] = [
        SectionLabel::IncomeSources,
        SectionLabel::ExpenseItems,
        SectionLabel::FinancialGoals,
        SectionLabel::SpendingHistory,
    ];

    pub fn heading(&self) -> &'static str {
        match self {
            SectionLabel::IncomeSources => "Income Sources",
            SectionLabel::ExpenseItems => "Expense Items",
            SectionLabel::FinancialGoals => "Financial Goals",
            SectionLabel::SpendingHistory => "Spending History",
        }
    }
}

impl fmt::Display for SectionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.heading())
    }
}

/// One rendered section of the prompt document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptSection {
    pub label: SectionLabel,
    pub body: String,
}

/// The structured text payload sent to the external model: the fixed
/// persona/contract block followed by the non-empty sections in their
/// fixed order. Empty groups produce no section at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptDocument {
    pub sections: Vec<PromptSection>,
}

//
// ================= Report Contract =================
//

/// Outcome of checking a model response against the report contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ContractStatus {
    Satisfied,
    Violated(ContractViolation),
}

impl ContractStatus {
    pub fn is_satisfied(&self) -> bool {
        matches!(self, ContractStatus::Satisfied)
    }
}

/// Sections the response got wrong. The response text itself is never
/// altered; this only flags it for the presentation layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContractViolation {
    pub missing: Vec<String>,
    pub out_of_order: Vec<String>,
}

impl fmt::Display for ContractViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if !self.missing.is_empty() {
            parts.push(format!("missing sections: {}", self.missing.join(", ")));
        }
        if !self.out_of_order.is_empty() {
            parts.push(format!(
                "out-of-order sections: {}",
                self.out_of_order.join(", ")
            ));
        }
        write!(f, "{}", parts.join("; "))
    }
}

//
// ================= Final Result =================
//

/// The presented outcome of one generate request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetReport {
    pub request_id: Uuid,
    /// Raw Markdown returned by the model, passed through unchanged.
    pub markdown: String,
    pub contract: ContractStatus,
    /// SHA-256 of the assembled prompt; identical input yields an
    /// identical fingerprint across requests.
    pub prompt_fingerprint: String,
    pub elapsed_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    #[test]
    fn test_input_set_emptiness() {
        let mut set = FinancialInputSet::default();
        assert!(set.is_empty());

        set.goals.unparsed.push("save more".to_string());
        assert!(!set.is_empty());

        let mut set = FinancialInputSet::default();
        set.income.records.push(IncomeRecord {
            source: "Salary".to_string(),
            amount: Decimal::from_str("4500").unwrap(),
        });
        assert!(!set.is_empty());
    }

    #[test]
    fn test_txn_date_display() {
        let iso = TxnDate::Iso(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        assert_eq!(iso.to_string(), "2024-01-05");

        let text = TxnDate::Text("last Tuesday".to_string());
        assert_eq!(text.to_string(), "last Tuesday");
    }

    #[test]
    fn test_section_order_is_fixed() {
        let headings: Vec<&str> = SectionLabel::ORDERED.iter().map(|s| s.heading()).collect();
        assert_eq!(
            headings,
            vec![
                "Income Sources",
                "Expense Items",
                "Financial Goals",
                "Spending History"
            ]
        );
    }
}
