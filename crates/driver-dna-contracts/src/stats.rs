//! Descriptive statistics shared by the pipeline stages.
//!
//! All functions return `None` for an empty input instead of NaN.

/// Arithmetic mean.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population variance (divides by `n`).
pub fn population_variance(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let sum_sq: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    Some(sum_sq / values.len() as f64)
}

/// Population standard deviation.
pub fn population_std(values: &[f64]) -> Option<f64> {
    population_variance(values).map(f64::sqrt)
}

/// Median; the mean of the two middle values for an even count.
pub fn median(values: &[f64]) -> Option<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted.get(mid).copied()
    } else {
        let upper = sorted.get(mid)?;
        let lower = sorted.get(mid.checked_sub(1)?)?;
        Some((lower + upper) / 2.0)
    }
}
