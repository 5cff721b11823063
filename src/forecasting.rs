//! Linear trend forecasts over monthly expense and savings series.

use crate::aggregation::monthly_income_expense;
use crate::schema::{AnalyzedTransaction, GapPolicy};
use crate::time_features::MonthName;
use crate::utils::{format_year_month, months_in_range, next_month, sample_std};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyAggregate {
    pub year: i32,
    pub month_number: u32,
    pub month_name: MonthName,
    pub year_month: String,
    pub amount: f64,
    /// 0-based position in the fitted series.
    pub time_index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    /// "YYYY-MM", continuing from the last historical month.
    pub period_label: String,
    pub time_index: usize,
    pub predicted: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub historical: Vec<MonthlyAggregate>,
    pub forecast: Vec<ForecastPoint>,
    pub slope: f64,
    pub intercept: f64,
    /// Sample std of the fit residuals.
    pub std_error: f64,
}

/// Ordinary least squares fit of `y = intercept + slope * x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearTrend {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearTrend {
    /// `None` below two points or when every x is identical.
    pub fn fit(xs: &[f64], ys: &[f64]) -> Option<Self> {
        if xs.len() < 2 || xs.len() != ys.len() {
            return None;
        }

        let n = xs.len() as f64;
        let mean_x = xs.iter().sum::<f64>() / n;
        let mean_y = ys.iter().sum::<f64>() / n;

        let (sxy, sxx) = xs
            .iter()
            .zip(ys.iter())
            .fold((0.0, 0.0), |(sxy, sxx), (&x, &y)| {
                (sxy + (x - mean_x) * (y - mean_y), sxx + (x - mean_x).powi(2))
            });

        if sxx == 0.0 {
            return None;
        }

        let slope = sxy / sxx;
        Some(Self {
            slope,
            intercept: mean_y - slope * mean_x,
        })
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

pub struct Forecaster {
    horizon: usize,
    confidence_multiplier: f64,
    gap_policy: GapPolicy,
}

impl Forecaster {
    pub fn new(horizon: usize, confidence_multiplier: f64, gap_policy: GapPolicy) -> Self {
        Self {
            horizon,
            confidence_multiplier,
            gap_policy,
        }
    }

    /// Monthly expense totals, optionally for one category only.
    pub fn monthly_expense_series(
        &self,
        table: &[AnalyzedTransaction],
        category: Option<&str>,
    ) -> Vec<MonthlyAggregate> {
        let mut totals: BTreeMap<(i32, u32), f64> = BTreeMap::new();
        for txn in table
            .iter()
            .filter(|t| t.is_expense())
            .filter(|t| category.map_or(true, |c| t.category == c))
        {
            *totals.entry(txn.period()).or_insert(0.0) += txn.magnitude();
        }
        self.index_series(totals)
    }

    /// Income minus expense per month that has any transaction.
    pub fn monthly_savings_series(&self, table: &[AnalyzedTransaction]) -> Vec<MonthlyAggregate> {
        let totals: BTreeMap<(i32, u32), f64> = monthly_income_expense(table)
            .into_iter()
            .map(|(period, totals)| (period, totals.savings()))
            .collect();
        self.index_series(totals)
    }

    pub fn forecast_expenses(
        &self,
        table: &[AnalyzedTransaction],
        category: Option<&str>,
    ) -> Option<ForecastResult> {
        self.project(self.monthly_expense_series(table, category))
    }

    pub fn forecast_savings(&self, table: &[AnalyzedTransaction]) -> Option<ForecastResult> {
        self.project(self.monthly_savings_series(table))
    }

    /// Fits the series and extends it `horizon` months. `None` when fewer
    /// than two months are available.
    pub fn project(&self, historical: Vec<MonthlyAggregate>) -> Option<ForecastResult> {
        let last = historical.last()?;
        if historical.len() < 2 {
            return None;
        }

        let xs: Vec<f64> = historical.iter().map(|p| p.time_index as f64).collect();
        let ys: Vec<f64> = historical.iter().map(|p| p.amount).collect();
        let trend = LinearTrend::fit(&xs, &ys)?;

        let residuals: Vec<f64> = xs
            .iter()
            .zip(ys.iter())
            .map(|(&x, &y)| y - trend.predict(x))
            .collect();
        let std_error = sample_std(&residuals).unwrap_or(0.0);
        let margin = self.confidence_multiplier * std_error;

        let mut period = (last.year, last.month_number);
        let forecast = (1..=self.horizon)
            .map(|step| {
                period = next_month(period.0, period.1);
                let time_index = last.time_index + step;
                let predicted = trend.predict(time_index as f64);
                ForecastPoint {
                    period_label: format_year_month(period.0, period.1),
                    time_index,
                    predicted,
                    lower_bound: predicted - margin,
                    upper_bound: predicted + margin,
                }
            })
            .collect();

        debug!(
            "Fitted {} months: slope {:.2}, intercept {:.2}, std error {:.2}",
            historical.len(),
            trend.slope,
            trend.intercept,
            std_error
        );

        Some(ForecastResult {
            historical,
            forecast,
            slope: trend.slope,
            intercept: trend.intercept,
            std_error,
        })
    }

    fn index_series(&self, mut totals: BTreeMap<(i32, u32), f64>) -> Vec<MonthlyAggregate> {
        if self.gap_policy == GapPolicy::ZeroFill {
            let bounds = totals
                .keys()
                .next()
                .copied()
                .zip(totals.keys().next_back().copied());
            if let Some((first, last)) = bounds {
                for period in months_in_range(first, last) {
                    totals.entry(period).or_insert(0.0);
                }
            }
        }

        totals
            .into_iter()
            .enumerate()
            .map(|(time_index, ((year, month_number), amount))| MonthlyAggregate {
                year,
                month_number,
                month_name: MonthName::from_number(month_number).unwrap_or(MonthName::January),
                year_month: format_year_month(year, month_number),
                amount,
                time_index,
            })
            .collect()
    }
}
