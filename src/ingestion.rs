//! Minimal normalizer turning raw ledger rows into a clean `Transaction` table.
//!
//! Rows with an unreadable date or amount are dropped, descriptions are
//! trimmed and lower-cased, exact duplicates are removed and the result is
//! sorted by date.

use crate::error::{AnalyticsError, Result};
use crate::schema::Transaction;
use chrono::NaiveDate;
use log::{debug, info};
use std::collections::HashSet;
use std::io::Read;

const REQUIRED_COLUMNS: [&str; 3] = ["date", "description", "amount"];

const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y", "%Y/%m/%d", "%d %b %Y"];

/// One uncleaned row: every field as it appeared in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub date: String,
    pub description: String,
    pub amount: String,
}

impl RawRecord {
    pub fn new(date: &str, description: &str, amount: &str) -> Self {
        Self {
            date: date.to_string(),
            description: description.to_string(),
            amount: amount.to_string(),
        }
    }
}

/// Reads a CSV export with (at least) `date`, `description` and `amount`
/// columns, in any order and any header case.
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<Transaction>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(AnalyticsError::EmptyInput);
    }

    let normalized: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
    let mut positions = [0usize; 3];
    for (slot, column) in positions.iter_mut().zip(REQUIRED_COLUMNS.iter()) {
        *slot = normalized
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| AnalyticsError::MissingColumn(column.to_string()))?;
    }
    let [date_idx, desc_idx, amount_idx] = positions;

    let mut records = Vec::new();
    for result in rdr.records() {
        let record = result?;
        records.push(RawRecord {
            date: record.get(date_idx).unwrap_or("").to_string(),
            description: record.get(desc_idx).unwrap_or("").to_string(),
            amount: record.get(amount_idx).unwrap_or("").to_string(),
        });
    }

    normalize_records(records)
}

pub fn normalize_records(records: Vec<RawRecord>) -> Result<Vec<Transaction>> {
    let total = records.len();
    let mut seen: HashSet<(NaiveDate, String, u64)> = HashSet::new();
    let mut transactions = Vec::with_capacity(total);

    for record in records {
        let Some(date) = parse_date(&record.date) else {
            debug!("Dropping row with unreadable date '{}'", record.date);
            continue;
        };
        let Some(amount) = parse_amount(&record.amount) else {
            debug!("Dropping row with unreadable amount '{}'", record.amount);
            continue;
        };
        let description = record.description.trim().to_lowercase();

        if seen.insert((date, description.clone(), amount.to_bits())) {
            transactions.push(Transaction {
                date,
                description,
                amount,
            });
        }
    }

    transactions.sort_by_key(|t| t.date);

    info!(
        "Normalized {} of {} rows into transactions",
        transactions.len(),
        total
    );

    Ok(transactions)
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    // Timestamps such as "2024-01-05 10:30:00" keep only the date part
    let date_part = match raw.split_once(['T', ' ']) {
        Some((head, _)) if NaiveDate::parse_from_str(head, "%Y-%m-%d").is_ok() => head,
        _ => raw,
    };

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
}

/// Strips thousands separators, currency symbols and whitespace before
/// parsing. Non-finite values are rejected.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, ',' | '₹' | '$' | '€' | '£') && !c.is_whitespace())
        .collect();

    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}
