use crate::schema::AnalyzedTransaction;
use crate::utils::format_year_month;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyCategoryTotal {
    pub year: i32,
    pub month_number: u32,
    pub year_month: String,
    pub category: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyCategoryTotal {
    pub year: i32,
    pub category: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct IncomeExpense {
    pub income: f64,
    pub expense: f64,
}

impl IncomeExpense {
    pub fn savings(&self) -> f64 {
        self.income - self.expense
    }

    fn add(&mut self, txn: &AnalyzedTransaction) {
        if txn.is_income() {
            self.income += txn.magnitude();
        } else {
            self.expense += txn.magnitude();
        }
    }
}

pub fn totals_by_type(table: &[AnalyzedTransaction]) -> IncomeExpense {
    let mut totals = IncomeExpense::default();
    for txn in table {
        totals.add(txn);
    }
    totals
}

/// Income and expense per (year, month), in calendar order. Months with no
/// transactions are absent.
pub fn monthly_income_expense(table: &[AnalyzedTransaction]) -> BTreeMap<(i32, u32), IncomeExpense> {
    let mut months: BTreeMap<(i32, u32), IncomeExpense> = BTreeMap::new();
    for txn in table {
        months.entry(txn.period()).or_default().add(txn);
    }
    months
}

pub fn category_expense_totals(table: &[AnalyzedTransaction]) -> BTreeMap<String, f64> {
    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    for txn in table.iter().filter(|t| t.is_expense()) {
        *totals.entry(txn.category.clone()).or_insert(0.0) += txn.magnitude();
    }
    totals
}

/// Largest expense category and its total. Ties go to the alphabetically
/// first category.
pub fn top_expense_category(table: &[AnalyzedTransaction]) -> Option<(String, f64)> {
    category_expense_totals(table)
        .into_iter()
        .fold(None, |best: Option<(String, f64)>, (category, total)| match best {
            Some((_, best_total)) if best_total >= total => best,
            _ => Some((category, total)),
        })
}

/// Totals of every category (income and expense alike) per month.
pub fn monthly_category_summary(table: &[AnalyzedTransaction]) -> Vec<MonthlyCategoryTotal> {
    let mut grouped: BTreeMap<(i32, u32, String), f64> = BTreeMap::new();
    for txn in table {
        let (year, month) = txn.period();
        *grouped
            .entry((year, month, txn.category.clone()))
            .or_insert(0.0) += txn.magnitude();
    }

    grouped
        .into_iter()
        .map(|((year, month_number, category), amount)| MonthlyCategoryTotal {
            year,
            month_number,
            year_month: format_year_month(year, month_number),
            category,
            amount,
        })
        .collect()
}

pub fn yearly_category_summary(table: &[AnalyzedTransaction]) -> Vec<YearlyCategoryTotal> {
    let mut grouped: BTreeMap<(i32, String), f64> = BTreeMap::new();
    for txn in table {
        *grouped
            .entry((txn.features.year, txn.category.clone()))
            .or_insert(0.0) += txn.magnitude();
    }

    grouped
        .into_iter()
        .map(|((year, category), amount)| YearlyCategoryTotal {
            year,
            category,
            amount,
        })
        .collect()
}
