//! Plain-language observations derived from the analyzed table.
//!
//! Signals are computed once, then each rule reads them and emits zero or
//! more insights. Output order follows rule order and is stable across runs.

use crate::aggregation::{monthly_income_expense, top_expense_category, totals_by_type};
use crate::schema::AnalyzedTransaction;
use crate::utils::sample_std;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    NoIncome,
    Savings,
    TopCategory,
    Concentration,
    Anomalies,
    LargeTransactions,
    Volatility,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational - no action needed
    Info,
    /// Worth attention but not urgent
    Attention,
    /// Should be addressed soon
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub kind: InsightKind,
    pub severity: Severity,
    pub message: String,
}

impl Insight {
    fn new(kind: InsightKind, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity,
            message: message.into(),
        }
    }
}

impl fmt::Display for Insight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Read-only figures every rule draws from.
#[derive(Debug, Clone, PartialEq)]
pub struct InsightSignals {
    pub income: f64,
    pub expense: f64,
    pub savings_ratio: f64,
    pub top_category: Option<(String, f64)>,
    pub expense_count: usize,
    pub anomaly_count: usize,
    pub large_count: usize,
    /// Sample std of monthly savings, when at least two months exist.
    pub savings_volatility: Option<f64>,
}

impl InsightSignals {
    pub fn from_table(table: &[AnalyzedTransaction]) -> Self {
        let totals = totals_by_type(table);
        let savings_ratio = if totals.income == 0.0 {
            0.0
        } else {
            totals.savings() / totals.income
        };

        let expenses = || table.iter().filter(|t| t.is_expense());

        let monthly_savings: Vec<f64> = monthly_income_expense(table)
            .values()
            .map(|m| m.savings())
            .collect();

        Self {
            income: totals.income,
            expense: totals.expense,
            savings_ratio,
            top_category: top_expense_category(table),
            expense_count: expenses().count(),
            anomaly_count: expenses().filter(|t| t.is_anomaly).count(),
            large_count: expenses().filter(|t| t.is_large).count(),
            savings_volatility: sample_std(&monthly_savings),
        }
    }

    fn anomaly_ratio(&self) -> f64 {
        if self.expense_count == 0 {
            0.0
        } else {
            self.anomaly_count as f64 / self.expense_count as f64
        }
    }
}

type InsightRule = fn(&InsightSignals) -> Vec<Insight>;

const RULES: [InsightRule; 4] = [savings_rule, spending_rule, outlier_rule, volatility_rule];

pub fn generate_insights(table: &[AnalyzedTransaction]) -> Vec<Insight> {
    let signals = InsightSignals::from_table(table);

    if signals.income == 0.0 {
        return vec![Insight::new(
            InsightKind::NoIncome,
            Severity::Warning,
            "No income recorded, so financial health cannot be assessed.",
        )];
    }

    RULES.iter().flat_map(|rule| rule(&signals)).collect()
}

/// The ordered text sequence shown to users.
pub fn insight_messages(insights: &[Insight]) -> Vec<String> {
    insights.iter().map(|i| i.message.clone()).collect()
}

fn savings_rule(signals: &InsightSignals) -> Vec<Insight> {
    let pct = signals.savings_ratio * 100.0;
    let insight = if signals.savings_ratio > 0.30 {
        Insight::new(
            InsightKind::Savings,
            Severity::Info,
            format!("Excellent discipline: you are saving {:.1}% of your income.", pct),
        )
    } else if signals.savings_ratio > 0.10 {
        Insight::new(
            InsightKind::Savings,
            Severity::Info,
            format!("Healthy savings: {:.1}% of your income is left after expenses.", pct),
        )
    } else if signals.savings_ratio > 0.0 {
        Insight::new(
            InsightKind::Savings,
            Severity::Attention,
            format!(
                "Thin margin: only {:.1}% of your income is saved. Look for expenses to trim.",
                pct
            ),
        )
    } else {
        Insight::new(
            InsightKind::Savings,
            Severity::Warning,
            "Your expenses exceed income. Immediate optimization needed.",
        )
    };
    vec![insight]
}

fn spending_rule(signals: &InsightSignals) -> Vec<Insight> {
    let Some((category, total)) = &signals.top_category else {
        return Vec::new();
    };
    if signals.expense == 0.0 {
        return Vec::new();
    }

    let share = total / signals.expense * 100.0;
    let mut insights = vec![Insight::new(
        InsightKind::TopCategory,
        Severity::Info,
        format!(
            "Highest spending category is {} at {:.1}% of total expenses.",
            category, share
        ),
    )];

    if share > 50.0 {
        insights.push(Insight::new(
            InsightKind::Concentration,
            Severity::Attention,
            format!(
                "More than half of your spending goes to {}. Concentrated spending is a risk.",
                category
            ),
        ));
    }

    insights
}

fn outlier_rule(signals: &InsightSignals) -> Vec<Insight> {
    let ratio = signals.anomaly_ratio();
    let mut insights = vec![if ratio > 0.10 {
        Insight::new(
            InsightKind::Anomalies,
            Severity::Warning,
            format!(
                "{} unusual transactions make up {:.1}% of your expenses. Review them carefully.",
                signals.anomaly_count,
                ratio * 100.0
            ),
        )
    } else if ratio > 0.0 {
        Insight::new(
            InsightKind::Anomalies,
            Severity::Attention,
            format!("{} unusual transactions detected.", signals.anomaly_count),
        )
    } else {
        Insight::new(
            InsightKind::Anomalies,
            Severity::Info,
            "No suspicious activity detected.",
        )
    }];

    if signals.large_count > 0 {
        insights.push(Insight::new(
            InsightKind::LargeTransactions,
            Severity::Attention,
            format!(
                "{} unusually large transactions were flagged.",
                signals.large_count
            ),
        ));
    }

    insights
}

fn volatility_rule(signals: &InsightSignals) -> Vec<Insight> {
    match signals.savings_volatility {
        Some(std) if std.is_finite() && std > 0.0 => vec![Insight::new(
            InsightKind::Volatility,
            Severity::Info,
            format!(
                "Monthly savings vary with a standard deviation of {:.2}.",
                std
            ),
        )],
        _ => Vec::new(),
    }
}
