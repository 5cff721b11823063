//! Keyword rules mapping transaction descriptions to categories.
//!
//! Rules are evaluated in declaration order and the first category with a
//! whole-word keyword match wins, so reordering the table changes results.

use crate::error::{AnalyticsError, Result};
use crate::schema::{
    AnalyzedTransaction, CategoryRule, Transaction, TransactionType, OTHERS_CATEGORY,
    SALARY_CATEGORY,
};
use log::debug;
use regex::{Regex, RegexBuilder};

struct CompiledRule {
    label: String,
    pattern: Regex,
}

pub struct Categorizer {
    rules: Vec<CompiledRule>,
}

impl Categorizer {
    pub fn new(rules: &[CategoryRule]) -> Result<Self> {
        let mut compiled = Vec::with_capacity(rules.len());
        for rule in rules {
            let pattern = compile_rule(rule).map_err(|source| AnalyticsError::InvalidKeyword {
                category: rule.label.clone(),
                source,
            })?;

            // A rule without keywords can never match
            if let Some(pattern) = pattern {
                compiled.push(CompiledRule {
                    label: rule.label.clone(),
                    pattern,
                });
            }
        }

        Ok(Self { rules: compiled })
    }

    /// Category label for a description, `"Others"` when nothing matches.
    pub fn categorize(&self, description: &str) -> &str {
        self.rules
            .iter()
            .find(|rule| rule.pattern.is_match(description))
            .map(|rule| rule.label.as_str())
            .unwrap_or(OTHERS_CATEGORY)
    }

    pub fn apply(&self, transactions: &[Transaction]) -> Vec<AnalyzedTransaction> {
        let table: Vec<AnalyzedTransaction> = transactions
            .iter()
            .map(|txn| {
                let category = self.categorize(&txn.description).to_string();
                let transaction_type = transaction_type_for(&category, txn.amount);
                AnalyzedTransaction::new(txn, category, transaction_type)
            })
            .collect();

        debug!(
            "Categorized {} transactions ({} uncategorized)",
            table.len(),
            table
                .iter()
                .filter(|t| t.category == OTHERS_CATEGORY)
                .count()
        );

        table
    }
}

/// Salary is always income; any negative amount is a refund and counts as
/// income too. Everything else is an expense.
pub fn transaction_type_for(category: &str, amount: f64) -> TransactionType {
    if category == SALARY_CATEGORY || amount < 0.0 {
        TransactionType::Income
    } else {
        TransactionType::Expense
    }
}

fn compile_rule(rule: &CategoryRule) -> std::result::Result<Option<Regex>, regex::Error> {
    let alternatives: Vec<String> = rule
        .keywords
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .map(regex::escape)
        .collect();

    if alternatives.is_empty() {
        return Ok(None);
    }

    let source = format!(r"\b(?:{})\b", alternatives.join("|"));
    RegexBuilder::new(&source)
        .case_insensitive(true)
        .build()
        .map(Some)
}
