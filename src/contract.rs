//! Report Contract Validator
//!
//! Checks that a model response carries the four required report sections
//! in their fixed order. Rules-based, deterministic. The validator flags
//! violations; it never edits or fabricates response content.

use tracing::info;

use crate::models::{ContractStatus, ContractViolation};

/// Required top-level report sections, in order.
pub const REQUIRED_SECTIONS: [&str; 4] = [
    "Budget Overview",
    "Spending Analysis",
    "Key Insights & Recommendations",
    "Goal Progress",
];

/// What a failed rule contributes to the violation report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    MissingSection,
    OutOfOrder,
}

pub struct RuleOutcome {
    pub passed: bool,
    /// Offending section names, in required order.
    pub sections: Vec<String>,
}

/// Trait for report contract rules
pub trait ContractRule: Send + Sync {
    fn name(&self) -> &'static str;

    /// Which violation field this rule's failures land in
    fn kind(&self) -> ViolationKind;

    fn check(&self, headings: &[String]) -> RuleOutcome;
}

/// Validator that runs contract rules over a response's headings
pub struct ContractValidator {
    rules: Vec<Box<dyn ContractRule>>,
}

impl ContractValidator {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn add_rule(&mut self, rule: Box<dyn ContractRule>) {
        self.rules.push(rule);
    }

    /// Validate a raw model response. The text passes through unchanged
    /// either way; only the status is produced here.
    pub fn validate(&self, markdown: &str) -> ContractStatus {
        let headings = extract_headings(markdown);

        let mut violation = ContractViolation::default();

        for rule in &self.rules {
            let outcome = rule.check(&headings);
            if outcome.passed {
                continue;
            }

            match rule.kind() {
                ViolationKind::MissingSection => violation.missing.extend(outcome.sections),
                ViolationKind::OutOfOrder => violation.out_of_order.extend(outcome.sections),
            }
        }

        let satisfied = violation.missing.is_empty() && violation.out_of_order.is_empty();

        info!(
            rule_count = self.rules.len(),
            satisfied = satisfied,
            "contract validation completed"
        );

        if satisfied {
            ContractStatus::Satisfied
        } else {
            ContractStatus::Violated(violation)
        }
    }
}

impl Default for ContractValidator {
    fn default() -> Self {
        Self::new()
    }
}

/// Collect normalized Markdown headings in document order.
fn extract_headings(markdown: &str) -> Vec<String> {
    markdown
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with('#'))
        .map(normalize_heading)
        .filter(|h| !h.is_empty())
        .collect()
}

/// Normalization tolerates minor heading variation: hash markers, list
/// numbering, trailing punctuation, case, and "&" vs "and".
fn normalize_heading(line: &str) -> String {
    let text = line.trim_start_matches('#').trim();
    let text = text
        .trim_start_matches(|c: char| c.is_ascii_digit() || c == '.' || c == ')')
        .trim();

    let lowered = text.to_lowercase().replace('&', "and");

    lowered
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn heading_matches(heading: &str, required: &str) -> bool {
    heading.contains(&normalize_heading(required))
}

/// Position of the first heading matching each required section.
fn section_positions(headings: &[String]) -> Vec<Option<usize>> {
    REQUIRED_SECTIONS
        .iter()
        .map(|required| headings.iter().position(|h| heading_matches(h, required)))
        .collect()
}

//
// ========== Contract Rules ==========
//

/// Rule: every required section must be present
pub struct SectionPresenceRule;

impl ContractRule for SectionPresenceRule {
    fn name(&self) -> &'static str {
        "required_sections_present"
    }

    fn kind(&self) -> ViolationKind {
        ViolationKind::MissingSection
    }

    fn check(&self, headings: &[String]) -> RuleOutcome {
        let missing: Vec<String> = section_positions(headings)
            .iter()
            .zip(REQUIRED_SECTIONS.iter())
            .filter(|(position, _)| position.is_none())
            .map(|(_, name)| name.to_string())
            .collect();

        RuleOutcome {
            passed: missing.is_empty(),
            sections: missing,
        }
    }
}

/// Rule: present sections must appear in the required order
pub struct SectionOrderRule;

impl ContractRule for SectionOrderRule {
    fn name(&self) -> &'static str {
        "required_sections_ordered"
    }

    fn kind(&self) -> ViolationKind {
        ViolationKind::OutOfOrder
    }

    fn check(&self, headings: &[String]) -> RuleOutcome {
        let mut out_of_order = Vec::new();
        let mut last_position = None;

        for (position, name) in section_positions(headings)
            .into_iter()
            .zip(REQUIRED_SECTIONS.iter())
        {
            // missing sections are the presence rule's concern
            let Some(position) = position else {
                continue;
            };

            if let Some(last) = last_position {
                if position < last {
                    out_of_order.push(name.to_string());
                    continue;
                }
            }
            last_position = Some(position);
        }

        RuleOutcome {
            passed: out_of_order.is_empty(),
            sections: out_of_order,
        }
    }
}

/// Create a validator enforcing the standard report contract
pub fn create_default_validator() -> ContractValidator {
    let mut validator = ContractValidator::new();
    validator.add_rule(Box::new(SectionPresenceRule));
    validator.add_rule(Box::new(SectionOrderRule));
    validator
}

//
// ================= Tests =================
//
