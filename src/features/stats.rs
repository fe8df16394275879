//! Null-safe reductions. Every function returns `None` instead of dividing by
//! zero or reducing an empty slice, and drops results that are not finite.

pub fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Ratio that is `None` when the denominator is zero or the result is not finite.
pub fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        return None;
    }
    finite(numerator / denominator)
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    finite(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population variance (divides by `n`, not `n - 1`).
pub fn population_variance(values: &[f64]) -> Option<f64> {
    let mu = mean(values)?;
    let squares: Vec<f64> = values.iter().map(|v| (v - mu).powi(2)).collect();
    mean(&squares)
}

/// Population standard deviation, undefined for fewer than two values.
pub fn population_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    population_variance(values).map(f64::sqrt)
}

pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        finite((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        finite(sorted[mid])
    }
}

pub fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max).and_then(finite)
}

pub fn rms(values: &[f64]) -> Option<f64> {
    let squares: Vec<f64> = values.iter().map(|v| v * v).collect();
    mean(&squares).map(f64::sqrt)
}
