//! Record Parser
//!
//! Normalizes heterogeneous free-text and CSV financial input into the
//! canonical record types. Every input line ends up either as a structured
//! record or verbatim in the group's leftover text - never dropped, never
//! fabricated.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{
    ExpenseRecord, FinancialInputSet, GoalRecord, IncomeRecord, RecordGroup, TransactionRecord,
    TxnDate,
};

pub mod amount;
pub mod csv;

pub use amount::{coerce_amount, coerce_positive_amount};

/// Raw user input as collected by one "Generate" action.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSubmission {
    #[serde(default)]
    pub income: String,
    #[serde(default)]
    pub expenses: String,
    #[serde(default)]
    pub goals: String,
    #[serde(default)]
    pub spending_history: String,
    /// Uploaded CSV content. Takes precedence over the free-text history.
    #[serde(default)]
    pub spending_history_csv: Option<String>,
}

/// Splits one free-text line into fields.
///
/// The dash heuristic is locale-sensitive, so it lives behind this trait
/// and can be swapped without touching assembly or validation.
pub trait FieldSplitter: Send + Sync {
    fn split<'a>(&self, line: &'a str) -> Vec<&'a str>;
}

/// Default splitter: spaced dash separators first (" – ", " — ", " - ")
/// so hyphenated words and ISO dates survive, then bare en/em dashes.
pub struct DashSplitter;

impl FieldSplitter for DashSplitter {
    fn split<'a>(&self, line: &'a str) -> Vec<&'a str> {
        for sep in [" \u{2013} ", " \u{2014} ", " - "] {
            if line.contains(sep) {
                return line
                    .split(sep)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .collect();
            }
        }
        for sep in ["\u{2013}", "\u{2014}"] {
            if line.contains(sep) {
                return line
                    .split(sep)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .collect();
            }
        }
        vec![line.trim()]
    }
}

/// Parses raw submissions into a [`FinancialInputSet`].
pub struct RecordParser {
    splitter: Box<dyn FieldSplitter>,
}

impl RecordParser {
    pub fn new() -> Self {
        Self {
            splitter: Box::new(DashSplitter),
        }
    }

    pub fn with_splitter(splitter: Box<dyn FieldSplitter>) -> Self {
        Self { splitter }
    }

    /// Parse a whole submission. Pure and synchronous; parse failures
    /// degrade per line into the group's leftovers.
    pub fn parse(&self, submission: &RawSubmission) -> FinancialInputSet {
        let transactions = match submission.spending_history_csv.as_deref() {
            Some(data) if !data.trim().is_empty() => csv::parse_history_csv(data),
            _ => self.parse_history(&submission.spending_history),
        };

        let set = FinancialInputSet {
            income: self.parse_income(&submission.income),
            expenses: self.parse_expenses(&submission.expenses),
            goals: self.parse_goals(&submission.goals),
            transactions,
        };

        debug!(
            income = set.income.len(),
            expenses = set.expenses.len(),
            goals = set.goals.len(),
            transactions = set.transactions.len(),
            "submission parsed"
        );

        set
    }

    /// Income lines: "source – amount".
    pub fn parse_income(&self, text: &str) -> RecordGroup<IncomeRecord> {
        let mut group = RecordGroup::default();

        for line in non_blank_lines(text) {
            let fields = self.splitter.split(line);
            match fields.as_slice() {
                [source, amount_token] if !source.is_empty() => {
                    match coerce_positive_amount(amount_token) {
                        Some(amount) => group.records.push(IncomeRecord {
                            source: source.to_string(),
                            amount,
                        }),
                        None => group.unparsed.push(line.to_string()),
                    }
                }
                _ => group.unparsed.push(line.to_string()),
            }
        }

        group
    }

    /// Expense lines: "item – category – amount" or "item – amount".
    /// A line with no category token is recorded with `category = None`.
    pub fn parse_expenses(&self, text: &str) -> RecordGroup<ExpenseRecord> {
        let mut group = RecordGroup::default();

        for line in non_blank_lines(text) {
            let fields = self.splitter.split(line);
            let record = match fields.as_slice() {
                [item, amount_token] if !item.is_empty() => {
                    coerce_positive_amount(amount_token).map(|amount| ExpenseRecord {
                        item: item.to_string(),
                        amount,
                        category: None,
                    })
                }
                [item, category, amount_token] if !item.is_empty() => {
                    coerce_positive_amount(amount_token).map(|amount| ExpenseRecord {
                        item: item.to_string(),
                        amount,
                        category: Some(category.to_string()),
                    })
                }
                _ => None,
            };

            match record {
                Some(record) => group.records.push(record),
                None => group.unparsed.push(line.to_string()),
            }
        }

        group
    }

    /// Goal lines: "goal – target amount".
    pub fn parse_goals(&self, text: &str) -> RecordGroup<GoalRecord> {
        let mut group = RecordGroup::default();

        for line in non_blank_lines(text) {
            let fields = self.splitter.split(line);
            match fields.as_slice() {
                [goal, amount_token] if !goal.is_empty() => {
                    match coerce_positive_amount(amount_token) {
                        Some(target_amount) => group.records.push(GoalRecord {
                            goal: goal.to_string(),
                            target_amount,
                        }),
                        None => group.unparsed.push(line.to_string()),
                    }
                }
                _ => group.unparsed.push(line.to_string()),
            }
        }

        group
    }

    /// Free-text spending history: comma rows of
    /// "date, description, amount[, category]".
    pub fn parse_history(&self, text: &str) -> RecordGroup<TransactionRecord> {
        let mut group = RecordGroup::default();

        for line in non_blank_lines(text) {
            let fields: Vec<&str> = line.split(',').map(str::trim).collect();
            let record = match fields.as_slice() {
                [date, description, amount_token] | [date, description, amount_token, _]
                    if !description.is_empty() =>
                {
                    coerce_amount(amount_token).map(|amount| TransactionRecord {
                        date: parse_txn_date(date),
                        description: description.to_string(),
                        amount,
                        category: fields.get(3).filter(|c| !c.is_empty()).map(|c| c.to_string()),
                    })
                }
                _ => None,
            };

            match record {
                Some(record) => group.records.push(record),
                None => group.unparsed.push(line.to_string()),
            }
        }

        group
    }
}

impl Default for RecordParser {
    fn default() -> Self {
        Self::new()
    }
}

fn non_blank_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().map(str::trim).filter(|l| !l.is_empty())
}

/// ISO date where it parses, original text otherwise.
pub(crate) fn parse_txn_date(token: &str) -> TxnDate {
    match token.parse() {
        Ok(date) => TxnDate::Iso(date),
        Err(_) => TxnDate::Text(token.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_income_en_dash_and_hyphen() {
        let parser = RecordParser::new();
        let group = parser.parse_income("Monthly Salary \u{2013} $4,500\nFreelance Work - $800");

        assert_eq!(group.records.len(), 2);
        assert_eq!(group.records[0].source, "Monthly Salary");
        assert_eq!(group.records[0].amount, dec("4500"));
        assert_eq!(group.records[1].source, "Freelance Work");
        assert_eq!(group.records[1].amount, dec("800"));
        assert!(group.unparsed.is_empty());
    }

    #[test]
    fn test_unparseable_income_goes_to_leftovers() {
        let parser = RecordParser::new();
        let group = parser.parse_income("my salary is pretty good\nSide gig \u{2013} some cash");

        assert!(group.records.is_empty());
        assert_eq!(
            group.unparsed,
            vec![
                "my salary is pretty good".to_string(),
                "Side gig \u{2013} some cash".to_string()
            ]
        );
    }

    #[test]
    fn test_expense_with_and_without_category() {
        let parser = RecordParser::new();
        let group =
            parser.parse_expenses("Netflix \u{2013} Entertainment \u{2013} $15\nRent \u{2013} $1,200");

        assert_eq!(group.records.len(), 2);
        assert_eq!(group.records[0].item, "Netflix");
        assert_eq!(group.records[0].category.as_deref(), Some("Entertainment"));
        assert_eq!(group.records[0].amount, dec("15"));

        // no category token: flagged ambiguous, never guessed
        assert_eq!(group.records[1].item, "Rent");
        assert_eq!(group.records[1].category, None);
        assert_eq!(group.records[1].amount, dec("1200"));
    }

    #[test]
    fn test_negative_expense_amount_degrades() {
        let parser = RecordParser::new();
        let group = parser.parse_expenses("Refund \u{2013} Shopping \u{2013} -$20");

        assert!(group.records.is_empty());
        assert_eq!(group.unparsed.len(), 1);
    }

    #[test]
    fn test_goal_lines() {
        let parser = RecordParser::new();
        let group = parser.parse_goals("Emergency fund \u{2013} $10,000");

        assert_eq!(group.records.len(), 1);
        assert_eq!(group.records[0].goal, "Emergency fund");
        assert_eq!(group.records[0].target_amount, dec("10000"));
    }

    #[test]
    fn test_history_free_text_rows() {
        let parser = RecordParser::new();
        let group = parser.parse_history(
            "2024-01-05, Starbucks, -$6.50, Coffee\n2024-01-06, Uber, -$12.00\nnot a transaction",
        );

        assert_eq!(group.records.len(), 2);
        assert_eq!(
            group.records[0].date,
            TxnDate::Iso(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap())
        );
        assert_eq!(group.records[0].description, "Starbucks");
        assert_eq!(group.records[0].amount, dec("-6.50"));
        assert_eq!(group.records[0].category.as_deref(), Some("Coffee"));
        assert_eq!(group.records[1].category, None);
        assert_eq!(group.unparsed, vec!["not a transaction".to_string()]);
    }

    #[test]
    fn test_history_free_text_date_kept_verbatim() {
        let parser = RecordParser::new();
        let group = parser.parse_history("last Tuesday, Whole Foods, $95.00");

        assert_eq!(group.records.len(), 1);
        assert_eq!(
            group.records[0].date,
            TxnDate::Text("last Tuesday".to_string())
        );
    }

    #[test]
    fn test_no_line_is_dropped() {
        let parser = RecordParser::new();
        let text = "Monthly Salary \u{2013} $4,500\ngarbage line\nBonus \u{2013} maybe\nSide \u{2013} $100";
        let group = parser.parse_income(text);

        let total = group.records.len() + group.unparsed.len();
        assert_eq!(total, 4);
    }

    struct PipeSplitter;

    impl FieldSplitter for PipeSplitter {
        fn split<'a>(&self, line: &'a str) -> Vec<&'a str> {
            line.split('|').map(str::trim).filter(|s| !s.is_empty()).collect()
        }
    }

    #[test]
    fn test_splitter_is_swappable() {
        let parser = RecordParser::with_splitter(Box::new(PipeSplitter));
        let group = parser.parse_income("Salary | $4500");

        assert_eq!(group.records.len(), 1);
        assert_eq!(group.records[0].source, "Salary");
    }
}
