use crate::aggregation::{category_expense_totals, totals_by_type};
use crate::schema::{AnalyzedTransaction, HealthWeights};
use crate::utils::round_to;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Factor values behind a score, as percentages rounded to two decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthBreakdown {
    /// Savings over income after clamping to [-100, 100].
    pub savings_ratio_pct: f64,
    pub large_transaction_ratio_pct: f64,
    pub anomaly_ratio_pct: f64,
    pub top_category_concentration_pct: f64,
    pub large_transaction_count: usize,
    pub anomaly_count: usize,
    pub expense_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    /// Always within 0..=100.
    pub score: u8,
    /// `None` when the table has no income and cannot be scored.
    pub breakdown: Option<HealthBreakdown>,
}

impl HealthReport {
    pub fn unscored() -> Self {
        Self {
            score: 0,
            breakdown: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyHealth {
    pub year: i32,
    pub month: u32,
    pub score: u8,
}

pub struct HealthScorer {
    weights: HealthWeights,
}

impl HealthScorer {
    pub fn new(weights: HealthWeights) -> Self {
        let (min, max) = weights.theoretical_range();
        if min != 0.0 || max != 100.0 {
            warn!(
                "Health weights span [{}, {}] instead of [0, 100]; scores rely on clamping",
                min, max
            );
        }
        Self { weights }
    }

    pub fn score(&self, table: &[AnalyzedTransaction]) -> HealthReport {
        let totals = totals_by_type(table);
        if totals.income == 0.0 {
            return HealthReport::unscored();
        }

        let w = &self.weights;

        let savings_ratio = (totals.savings() / totals.income).clamp(-1.0, 1.0);
        let savings_score = savings_ratio * w.max_savings;

        let expenses: Vec<&AnalyzedTransaction> = table.iter().filter(|t| t.is_expense()).collect();
        let expense_count = expenses.len();
        let large_count = expenses.iter().filter(|t| t.is_large).count();
        let anomaly_count = expenses.iter().filter(|t| t.is_anomaly).count();

        let large_ratio = ratio(large_count as f64, expense_count as f64);
        let large_penalty = (large_ratio * w.max_large_penalty).min(w.max_large_penalty);

        let anomaly_ratio = ratio(anomaly_count as f64, expense_count as f64);
        let anomaly_penalty = (anomaly_ratio * w.max_anomaly_penalty).min(w.max_anomaly_penalty);

        let top_category_total = category_expense_totals(table)
            .values()
            .copied()
            .fold(0.0, f64::max);
        let concentration_ratio = ratio(top_category_total, totals.expense);
        let concentration_penalty = (concentration_ratio * w.max_concentration_penalty)
            .min(w.max_concentration_penalty);

        let raw = w.base + savings_score - large_penalty - anomaly_penalty - concentration_penalty;

        HealthReport {
            score: clamp_score(raw),
            breakdown: Some(HealthBreakdown {
                savings_ratio_pct: round_to(savings_ratio * 100.0, 2),
                large_transaction_ratio_pct: round_to(large_ratio * 100.0, 2),
                anomaly_ratio_pct: round_to(anomaly_ratio * 100.0, 2),
                top_category_concentration_pct: round_to(concentration_ratio * 100.0, 2),
                large_transaction_count: large_count,
                anomaly_count,
                expense_count,
            }),
        }
    }

    /// Scores every calendar month on its own rows, oldest first.
    pub fn monthly_trend(&self, table: &[AnalyzedTransaction]) -> Vec<MonthlyHealth> {
        let mut months: BTreeMap<(i32, u32), Vec<AnalyzedTransaction>> = BTreeMap::new();
        for txn in table {
            months.entry(txn.period()).or_default().push(txn.clone());
        }

        months
            .into_iter()
            .map(|((year, month), rows)| MonthlyHealth {
                year,
                month,
                score: self.score(&rows).score,
            })
            .collect()
    }
}

fn ratio(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        0.0
    } else {
        part / whole
    }
}

fn clamp_score(raw: f64) -> u8 {
    if raw.is_nan() {
        return 0;
    }
    raw.round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categorizer::Categorizer;
    use crate::schema::{default_category_rules, Transaction};
    use chrono::NaiveDate;

    fn build(rows: &[(u32, u32, &str, f64)]) -> Vec<AnalyzedTransaction> {
        let txns: Vec<Transaction> = rows
            .iter()
            .map(|&(m, d, desc, amt)| {
                Transaction::new(NaiveDate::from_ymd_opt(2024, m, d).unwrap(), desc, amt)
            })
            .collect();
        Categorizer::new(&default_category_rules()).unwrap().apply(&txns)
    }

    fn scorer() -> HealthScorer {
        HealthScorer::new(HealthWeights::default())
    }

    #[test]
    fn test_no_income_unscored() {
        let table = build(&[(1, 2, "swiggy", 300.0), (1, 3, "uber", 200.0)]);
        let report = scorer().score(&table);
        assert_eq!(report.score, 0);
        assert!(report.breakdown.is_none());
    }

    #[test]
    fn test_score_components() {
        // income 10000, expense 4000 across two categories
        let mut table = build(&[
            (1, 1, "salary", 10_000.0),
            (1, 2, "swiggy", 3_000.0),
            (1, 3, "uber", 500.0),
            (1, 4, "ola", 500.0),
        ]);
        table[1].is_large = true;
        table[1].is_anomaly = true;

        let report = scorer().score(&table);
        let breakdown = report.breakdown.unwrap();

        // savings 0.6 * 30 = 18; large 1/3 * 10; anomaly 1/3 * 10; concentration 0.75 * 20 = 15
        let expected: f64 = 70.0 + 18.0 - 10.0 / 3.0 - 10.0 / 3.0 - 15.0;
        assert_eq!(report.score, expected.round() as u8);
        assert_eq!(breakdown.savings_ratio_pct, 60.0);
        assert_eq!(breakdown.large_transaction_ratio_pct, 33.33);
        assert_eq!(breakdown.anomaly_ratio_pct, 33.33);
        assert_eq!(breakdown.top_category_concentration_pct, 75.0);
        assert_eq!(breakdown.expense_count, 3);
    }

    #[test]
    fn test_extreme_deficit_clamps() {
        // savings ratio of -5 clamps to -1 before weighting
        let table = build(&[(1, 1, "salary", 1_000.0), (1, 2, "amazon", 6_000.0)]);
        let report = scorer().score(&table);
        assert_eq!(report.breakdown.as_ref().unwrap().savings_ratio_pct, -100.0);
        // 70 - 30 - 0 - 0 - 20
        assert_eq!(report.score, 20);
    }

    #[test]
    fn test_misconfigured_weights_still_bounded() {
        let table = build(&[(1, 1, "salary", 1_000.0)]);
        let generous = HealthScorer::new(HealthWeights {
            base: 500.0,
            ..HealthWeights::default()
        });
        assert_eq!(generous.score(&table).score, 100);

        let harsh = HealthScorer::new(HealthWeights {
            base: -500.0,
            ..HealthWeights::default()
        });
        assert_eq!(harsh.score(&table).score, 0);
    }

    #[test]
    fn test_income_only_has_no_expense_penalties() {
        let table = build(&[(1, 1, "salary", 1_000.0)]);
        let report = scorer().score(&table);
        assert_eq!(report.score, 100);
        let breakdown = report.breakdown.unwrap();
        assert_eq!(breakdown.top_category_concentration_pct, 0.0);
        assert_eq!(breakdown.expense_count, 0);
    }

    #[test]
    fn test_single_month_trend_matches_score() {
        let table = build(&[
            (3, 1, "salary", 40_000.0),
            (3, 5, "electricity", 2_000.0),
            (3, 9, "netflix", 649.0),
        ]);
        let s = scorer();
        let trend = s.monthly_trend(&table);
        assert_eq!(trend.len(), 1);
        assert_eq!(trend[0].score, s.score(&table).score);
        assert_eq!((trend[0].year, trend[0].month), (2024, 3));
    }

    #[test]
    fn test_trend_months_scored_in_isolation() {
        let table = build(&[
            (2, 1, "salary", 10_000.0),
            (2, 2, "swiggy", 1_000.0),
            (1, 15, "amazon", 5_000.0),
        ]);
        let trend = scorer().monthly_trend(&table);
        assert_eq!(trend.len(), 2);
        assert_eq!((trend[0].year, trend[0].month, trend[0].score), (2024, 1, 0));
        assert!(trend[1].score > 0);
    }
}
