/// Arithmetic mean, `None` for an empty slice
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let m = values.iter().sum::<f64>() / values.len() as f64;
    if m.is_finite() || values.iter().any(|v| !v.is_finite()) {
        return Some(m);
    }

    // The sum overflowed; average the values scaled down instead
    let scale = max_magnitude(values);
    Some(values.iter().map(|v| v / scale).sum::<f64>() / values.len() as f64 * scale)
}

/// Median; the mean of the two middle values for even lengths
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Sample standard deviation (n - 1 denominator), `None` below two values.
///
/// When the squares overflow, the values are scaled by their largest
/// magnitude first, so any finite input has a finite result.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }

    let std = two_pass_std(values)?;
    if std.is_finite() || values.iter().any(|v| !v.is_finite()) {
        return Some(std);
    }

    let scale = max_magnitude(values);
    let scaled: Vec<f64> = values.iter().map(|v| v / scale).collect();
    Some(two_pass_std(&scaled)? * scale)
}

fn two_pass_std(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let sum_sq: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((sum_sq / (values.len() - 1) as f64).sqrt())
}

fn max_magnitude(values: &[f64]) -> f64 {
    values.iter().fold(0.0, |acc: f64, v| acc.max(v.abs()))
}

pub fn min(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::min)
}

pub fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}
