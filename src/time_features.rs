use crate::schema::AnalyzedTransaction;
use crate::utils::format_year_month;
use chrono::{Datelike, NaiveDate};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Calendar month as an ordered value, so sorting follows the calendar
/// rather than the alphabet.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
pub enum MonthName {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

impl MonthName {
    pub const ALL: [MonthName; 12] = [
        MonthName::January,
        MonthName::February,
        MonthName::March,
        MonthName::April,
        MonthName::May,
        MonthName::June,
        MonthName::July,
        MonthName::August,
        MonthName::September,
        MonthName::October,
        MonthName::November,
        MonthName::December,
    ];

    /// Maps 1..=12 to a month; anything else is `None`.
    pub fn from_number(month: u32) -> Option<Self> {
        month
            .checked_sub(1)
            .and_then(|idx| Self::ALL.get(idx as usize).copied())
    }

    pub fn number(&self) -> u32 {
        *self as u32 + 1
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MonthName::January => "January",
            MonthName::February => "February",
            MonthName::March => "March",
            MonthName::April => "April",
            MonthName::May => "May",
            MonthName::June => "June",
            MonthName::July => "July",
            MonthName::August => "August",
            MonthName::September => "September",
            MonthName::October => "October",
            MonthName::November => "November",
            MonthName::December => "December",
        }
    }
}

impl fmt::Display for MonthName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TimeFeatures {
    pub year: i32,
    pub month_number: u32,
    pub month_name: MonthName,
    /// ISO 8601 week number (1..=53).
    pub week: u32,
    /// ISO week key, e.g. "2024-W5". The year is the ISO week-year.
    pub year_week: String,
    /// Display key formatted as "YYYY-MM".
    pub year_month: String,
}

impl TimeFeatures {
    pub fn from_date(date: NaiveDate) -> Self {
        let iso = date.iso_week();
        let month_name = MonthName::from_number(date.month()).unwrap_or(MonthName::January);

        Self {
            year: date.year(),
            month_number: date.month(),
            month_name,
            week: iso.week(),
            year_week: format!("{}-W{}", iso.year(), iso.week()),
            year_month: format_year_month(date.year(), date.month()),
        }
    }
}

/// Re-derives the calendar attributes of every row from its date.
/// Running it on an already featured table leaves it unchanged.
pub fn add_time_features(transactions: &mut [AnalyzedTransaction]) {
    for txn in transactions.iter_mut() {
        txn.features = TimeFeatures::from_date(txn.date);
    }
}
