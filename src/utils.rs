/// Returns the (year, month) that follows the given one, rolling December
/// over into January of the next year.
pub fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

/// Number of whole calendar months from `start` to `end`.
pub fn months_between(start: (i32, u32), end: (i32, u32)) -> i32 {
    let year_diff = end.0 - start.0;
    let month_diff = end.1 as i32 - start.1 as i32;
    year_diff * 12 + month_diff
}

/// Every (year, month) from `start` to `end` inclusive.
pub fn months_in_range(start: (i32, u32), end: (i32, u32)) -> Vec<(i32, u32)> {
    let mut months = Vec::new();
    let mut current = start;
    while months_between(current, end) >= 0 {
        months.push(current);
        current = next_month(current.0, current.1);
    }
    months
}

pub fn format_year_month(year: i32, month: u32) -> String {
    format!("{:04}-{:02}", year, month)
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator). `None` below two values.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values)?;
    let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    Some((sum_sq / (values.len() - 1) as f64).sqrt())
}

/// Linear-interpolated quantile over an ascending slice, `q` in [0, 1].
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let q = q.clamp(0.0, 1.0);
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
