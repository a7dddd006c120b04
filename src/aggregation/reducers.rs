// Numeric reducers applied to one property's values inside a bucket.

/// Arithmetic sum; 0 for no values.
pub fn sum(values: &[f64]) -> f64 {
    values.iter().sum()
}

/// Standard median: middle value for odd counts, mean of the two middle values
/// for even counts, 0 for no values.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let half = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[half]
    } else {
        (sorted[half - 1] + sorted[half]) / 2.0
    }
}
