use crate::error::{AnalyticsError, Result};
use crate::time_features::TimeFeatures;
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Label assigned when no keyword rule matches.
pub const OTHERS_CATEGORY: &str = "Others";

/// Category whose transactions always count as income.
pub const SALARY_CATEGORY: &str = "Salary";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub enum TransactionType {
    Income,
    Expense,
}

/// A cleaned ledger row as handed over by the normalizer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub date: NaiveDate,
    /// Trimmed, lower-cased free text.
    pub description: String,
    /// Signed amount. Negative values are refunds or credits.
    pub amount: f64,
}

impl Transaction {
    pub fn new(date: NaiveDate, description: impl Into<String>, amount: f64) -> Self {
        Self {
            date,
            description: description.into(),
            amount,
        }
    }
}

/// A transaction after categorization, flagging and time feature extraction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalyzedTransaction {
    pub date: NaiveDate,
    pub description: String,
    pub amount: f64,
    pub category: String,
    pub transaction_type: TransactionType,
    pub is_large: bool,
    pub is_anomaly: bool,
    #[serde(flatten)]
    pub features: TimeFeatures,
}

impl AnalyzedTransaction {
    pub fn new(
        transaction: &Transaction,
        category: String,
        transaction_type: TransactionType,
    ) -> Self {
        Self {
            date: transaction.date,
            description: transaction.description.clone(),
            amount: transaction.amount,
            category,
            transaction_type,
            is_large: false,
            is_anomaly: false,
            features: TimeFeatures::from_date(transaction.date),
        }
    }

    /// Unsigned value used by every monetary aggregation, so a refund of -500
    /// contributes 500 of income.
    pub fn magnitude(&self) -> f64 {
        self.amount.abs()
    }

    pub fn is_expense(&self) -> bool {
        self.transaction_type == TransactionType::Expense
    }

    pub fn is_income(&self) -> bool {
        self.transaction_type == TransactionType::Income
    }

    /// Calendar bucket used for every monthly grouping.
    pub fn period(&self) -> (i32, u32) {
        (self.features.year, self.features.month_number)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct CategoryRule {
    #[schemars(description = "Category label assigned when any keyword matches (e.g. 'Food')")]
    pub label: String,

    #[schemars(
        description = "Keywords matched case-insensitively as whole words against the description. Multi-word keywords such as 'gas bill' are allowed."
    )]
    pub keywords: Vec<String>,
}

impl CategoryRule {
    pub fn new(label: &str, keywords: &[&str]) -> Self {
        Self {
            label: label.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

pub fn default_category_rules() -> Vec<CategoryRule> {
    vec![
        CategoryRule::new(
            SALARY_CATEGORY,
            &["salary", "credit from company", "monthly credit"],
        ),
        CategoryRule::new(
            "Food",
            &["swiggy", "zomato", "mcdonald", "dominos", "restaurant"],
        ),
        CategoryRule::new("Shopping", &["amazon", "flipkart", "myntra"]),
        CategoryRule::new("Travel", &["uber", "ola", "irctc", "petrol"]),
        CategoryRule::new("Bills", &["electricity", "water", "gas bill", "recharge"]),
        CategoryRule::new("Entertainment", &["netflix", "hotstar", "movie"]),
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct HealthWeights {
    #[schemars(description = "Starting score before savings reward and penalties")]
    pub base: f64,

    #[schemars(description = "Points added at a savings ratio of 100% (subtracted at -100%)")]
    pub max_savings: f64,

    #[schemars(description = "Penalty when every expense is a large transaction")]
    pub max_large_penalty: f64,

    #[schemars(description = "Penalty when every expense is flagged as anomalous")]
    pub max_anomaly_penalty: f64,

    #[schemars(description = "Penalty when all spending falls in a single category")]
    pub max_concentration_penalty: f64,
}

impl Default for HealthWeights {
    fn default() -> Self {
        Self {
            base: 70.0,
            max_savings: 30.0,
            max_large_penalty: 10.0,
            max_anomaly_penalty: 10.0,
            max_concentration_penalty: 20.0,
        }
    }
}

impl HealthWeights {
    /// Lowest and highest score these weights can produce before clamping.
    pub fn theoretical_range(&self) -> (f64, f64) {
        let min = self.base
            - self.max_savings
            - self.max_large_penalty
            - self.max_anomaly_penalty
            - self.max_concentration_penalty;
        let max = self.base + self.max_savings;
        (min, max)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum GapPolicy {
    #[default]
    #[schemars(
        description = "Index months by their position among months that have data. A month without transactions is skipped and compresses the time axis."
    )]
    Positional,

    #[schemars(
        description = "Insert zero-valued months between the first and last observed month so the index equals calendar distance."
    )]
    ZeroFill,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(default)]
pub struct AnalyticsConfig {
    #[schemars(description = "k in the large transaction threshold mean + k * std over expenses")]
    pub large_transaction_multiplier: f64,

    #[schemars(description = "Expected share of anomalous expenses, in (0, 0.5]")]
    pub anomaly_contamination: f64,

    pub health: HealthWeights,

    #[schemars(description = "Number of future months to project")]
    pub forecast_horizon: usize,

    #[schemars(description = "z multiplier for the forecast confidence band (1.96 is about 95%)")]
    pub confidence_multiplier: f64,

    pub gap_policy: GapPolicy,

    #[schemars(
        description = "Ordered category rules. Evaluated top to bottom, the first matching category wins."
    )]
    pub category_rules: Vec<CategoryRule>,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            large_transaction_multiplier: 2.0,
            anomaly_contamination: 0.05,
            health: HealthWeights::default(),
            forecast_horizon: 3,
            confidence_multiplier: 1.96,
            gap_policy: GapPolicy::default(),
            category_rules: default_category_rules(),
        }
    }
}

impl AnalyticsConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(AnalyticsConfig)
    }

    /// Checks values the detectors and forecaster cannot run without.
    /// Health weights are left alone, the final clamp keeps scores in range.
    pub fn validate(&self) -> Result<()> {
        if !(self.anomaly_contamination > 0.0 && self.anomaly_contamination <= 0.5) {
            return Err(AnalyticsError::InvalidConfig(format!(
                "anomaly_contamination must be in (0, 0.5], got {}",
                self.anomaly_contamination
            )));
        }

        if self.forecast_horizon == 0 {
            return Err(AnalyticsError::InvalidConfig(
                "forecast_horizon must be at least 1".to_string(),
            ));
        }

        for (name, value) in [
            ("large_transaction_multiplier", self.large_transaction_multiplier),
            ("confidence_multiplier", self.confidence_multiplier),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(AnalyticsError::InvalidConfig(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }

        for rule in &self.category_rules {
            if rule.keywords.iter().all(|k| k.trim().is_empty()) {
                return Err(AnalyticsError::InvalidConfig(format!(
                    "category '{}' has no keywords",
                    rule.label
                )));
            }
        }

        Ok(())
    }
}
