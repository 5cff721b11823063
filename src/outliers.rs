use crate::schema::AnalyzedTransaction;
use crate::utils::{mean, quantile_sorted, sample_std};
use log::debug;

/// Fewer expense rows than this and the anomaly model is not fitted.
pub const MIN_ANOMALY_SAMPLE: usize = 5;

/// Seed handed to the anomaly model on every run.
pub const ANOMALY_SEED: u64 = 42;

/// An unsupervised outlier scorer over a one-dimensional sample.
///
/// Implementors only provide scores; labelling by contamination fraction is
/// shared so every model flags the same share of points.
pub trait OutlierModel: Send + Sync {
    /// One score per point, higher means more anomalous. Must be
    /// deterministic for a given sample and seed.
    fn score_samples(&self, sample: &[f64], seed: u64) -> Vec<f64>;

    /// Flags points whose score lies strictly above the `1 - contamination`
    /// quantile of all scores.
    fn fit_predict(&self, sample: &[f64], contamination: f64, seed: u64) -> Vec<bool> {
        let scores = self.score_samples(sample, seed);

        let mut sorted = scores.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));

        match quantile_sorted(&sorted, 1.0 - contamination) {
            Some(cutoff) => scores.iter().map(|&s| s > cutoff).collect(),
            None => vec![false; sample.len()],
        }
    }
}

/// Mean + k * sample std over expense amounts. Zero when there are no expenses.
pub fn large_transaction_threshold(table: &[AnalyzedTransaction], multiplier: f64) -> f64 {
    let amounts = expense_amounts(table);

    let Some(mean) = mean(&amounts) else {
        return 0.0;
    };
    let std = sample_std(&amounts).unwrap_or(0.0);

    mean + multiplier * std
}

/// Sets `is_large` on expenses above the threshold and returns the threshold.
pub fn detect_large_transactions(table: &mut [AnalyzedTransaction], multiplier: f64) -> f64 {
    let threshold = large_transaction_threshold(table, multiplier);
    let has_expenses = table.iter().any(|t| t.is_expense());

    for txn in table.iter_mut() {
        txn.is_large = has_expenses && txn.is_expense() && txn.magnitude() > threshold;
    }

    debug!(
        "Large transaction threshold {:.2} flagged {} rows",
        threshold,
        table.iter().filter(|t| t.is_large).count()
    );

    threshold
}

/// Sets `is_anomaly` on expenses the model labels as outliers and returns the
/// number flagged. Income rows are never scored.
pub fn detect_anomalies(
    table: &mut [AnalyzedTransaction],
    model: &dyn OutlierModel,
    contamination: f64,
) -> usize {
    for txn in table.iter_mut() {
        txn.is_anomaly = false;
    }

    let expense_idx: Vec<usize> = table
        .iter()
        .enumerate()
        .filter(|(_, t)| t.is_expense())
        .map(|(i, _)| i)
        .collect();

    if expense_idx.len() < MIN_ANOMALY_SAMPLE {
        debug!(
            "Skipping anomaly model: {} expense rows (minimum {})",
            expense_idx.len(),
            MIN_ANOMALY_SAMPLE
        );
        return 0;
    }

    let sample: Vec<f64> = expense_idx.iter().map(|&i| table[i].magnitude()).collect();
    let flags = model.fit_predict(&sample, contamination, ANOMALY_SEED);

    let mut flagged = 0;
    for (&i, &is_anomaly) in expense_idx.iter().zip(flags.iter()) {
        table[i].is_anomaly = is_anomaly;
        if is_anomaly {
            flagged += 1;
        }
    }

    debug!("Anomaly model flagged {} of {} expenses", flagged, sample.len());
    flagged
}

fn expense_amounts(table: &[AnalyzedTransaction]) -> Vec<f64> {
    table
        .iter()
        .filter(|t| t.is_expense())
        .map(|t| t.magnitude())
        .collect()
}
