//! # Personal Finance Analytics
//!
//! A library for turning a cleaned ledger of personal transactions into an
//! analytical profile of the account holder's financial behaviour.
//!
//! ## Core Concepts
//!
//! - **Categorization**: ordered keyword rules assign a category; salary and
//!   negative amounts (refunds) are income, everything else is an expense
//! - **Outliers**: expenses above `mean + k * std` are *large*; an isolation
//!   forest independently marks *anomalous* expenses
//! - **Health Score**: a 0..=100 composite of savings ratio, large transaction
//!   ratio, anomaly ratio and category concentration, overall and per month
//! - **Forecasts**: least squares trends over monthly expenses and savings with
//!   a residual based confidence band
//! - **Insights**: ordered plain-language observations
//!
//! Insufficient data is never an error. No income gives a zero score with no
//! breakdown, fewer than two months give no forecast and fewer than five
//! expenses skip the anomaly model.
//!
//! ## Example
//!
//! ```rust,ignore
//! use personal_finance_analytics::*;
//!
//! let csv = "date,description,amount\n\
//!            2024-01-01,Salary January,50000\n\
//!            2024-01-04,Swiggy order #123,450\n";
//!
//! let transactions = read_csv(csv.as_bytes()).unwrap();
//! let analyzer = FinanceAnalyzer::new(AnalyticsConfig::default()).unwrap();
//! let report = analyzer.analyze(&transactions);
//!
//! println!("score: {}", report.health.score);
//! for line in report.insight_messages() {
//!     println!("- {}", line);
//! }
//! ```

pub mod aggregation;
pub mod categorizer;
pub mod error;
pub mod forecasting;
pub mod health;
pub mod ingestion;
pub mod insights;
pub mod isolation_forest;
pub mod outliers;
pub mod schema;
pub mod time_features;
pub mod utils;

pub use aggregation::{
    category_expense_totals, monthly_category_summary, monthly_income_expense,
    top_expense_category, totals_by_type, yearly_category_summary, IncomeExpense,
    MonthlyCategoryTotal, YearlyCategoryTotal,
};
pub use categorizer::{transaction_type_for, Categorizer};
pub use error::{AnalyticsError, Result};
pub use forecasting::{ForecastPoint, ForecastResult, Forecaster, LinearTrend, MonthlyAggregate};
pub use health::{HealthBreakdown, HealthReport, HealthScorer, MonthlyHealth};
pub use ingestion::{normalize_records, read_csv, RawRecord};
pub use insights::{generate_insights, insight_messages, Insight, InsightKind, InsightSignals, Severity};
pub use isolation_forest::IsolationForest;
pub use outliers::{
    detect_anomalies, detect_large_transactions, large_transaction_threshold, OutlierModel,
};
pub use schema::*;
pub use time_features::{add_time_features, MonthName, TimeFeatures};

use log::info;
use serde::{Deserialize, Serialize};

/// Everything presentation code needs from one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub transactions: Vec<AnalyzedTransaction>,
    pub large_transaction_threshold: f64,
    pub anomaly_count: usize,
    pub total_income: f64,
    pub total_expense: f64,
    pub health: HealthReport,
    pub monthly_health: Vec<MonthlyHealth>,
    pub expense_forecast: Option<ForecastResult>,
    pub savings_forecast: Option<ForecastResult>,
    pub insights: Vec<Insight>,
}

impl AnalysisReport {
    pub fn net_savings(&self) -> f64 {
        self.total_income - self.total_expense
    }

    pub fn insight_messages(&self) -> Vec<String> {
        insight_messages(&self.insights)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub struct FinanceAnalyzer {
    config: AnalyticsConfig,
    categorizer: Categorizer,
    model: Box<dyn OutlierModel>,
}

impl FinanceAnalyzer {
    pub fn new(config: AnalyticsConfig) -> Result<Self> {
        Self::with_model(config, Box::new(IsolationForest::default()))
    }

    /// Uses a different anomaly model in place of the isolation forest.
    pub fn with_model(config: AnalyticsConfig, model: Box<dyn OutlierModel>) -> Result<Self> {
        let categorizer = Categorizer::new(&config.category_rules)?;
        Ok(Self {
            config,
            categorizer,
            model,
        })
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    /// Categorizes, flags and time-features the table. Each call works on its
    /// own copy; the input is never modified.
    pub fn annotate(&self, transactions: &[Transaction]) -> (Vec<AnalyzedTransaction>, f64, usize) {
        let mut table = self.categorizer.apply(transactions);
        let threshold =
            detect_large_transactions(&mut table, self.config.large_transaction_multiplier);
        let anomaly_count = detect_anomalies(
            &mut table,
            self.model.as_ref(),
            self.config.anomaly_contamination,
        );
        add_time_features(&mut table);
        (table, threshold, anomaly_count)
    }

    pub fn analyze(&self, transactions: &[Transaction]) -> AnalysisReport {
        info!(
            "Analyzing {} transactions with {} category rules",
            transactions.len(),
            self.config.category_rules.len()
        );

        let (table, threshold, anomaly_count) = self.annotate(transactions);

        let scorer = HealthScorer::new(self.config.health.clone());
        let health = scorer.score(&table);
        let monthly_health = scorer.monthly_trend(&table);

        let forecaster = self.forecaster();
        let expense_forecast = forecaster.forecast_expenses(&table, None);
        let savings_forecast = forecaster.forecast_savings(&table);

        let insights = generate_insights(&table);
        let totals = totals_by_type(&table);

        info!(
            "Health score {} with {} insights ({} anomalies, threshold {:.2})",
            health.score,
            insights.len(),
            anomaly_count,
            threshold
        );

        AnalysisReport {
            transactions: table,
            large_transaction_threshold: threshold,
            anomaly_count,
            total_income: totals.income,
            total_expense: totals.expense,
            health,
            monthly_health,
            expense_forecast,
            savings_forecast,
            insights,
        }
    }

    /// Expense forecast restricted to one category of an annotated table.
    pub fn forecast_category(
        &self,
        table: &[AnalyzedTransaction],
        category: &str,
    ) -> Option<ForecastResult> {
        self.forecaster().forecast_expenses(table, Some(category))
    }

    fn forecaster(&self) -> Forecaster {
        Forecaster::new(
            self.config.forecast_horizon,
            self.config.confidence_multiplier,
            self.config.gap_policy,
        )
    }
}
