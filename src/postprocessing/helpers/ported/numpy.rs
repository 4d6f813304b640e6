/* PORTED NUMPY FUNCTIONS */

/// Calculate mean and standard deviation over a 2-D array, equivalent to
/// numpy.mean / numpy.std with the default ddof=0.
///
/// # Arguments
///
/// * `array` - Array to find mean and standard deviation for.
///
/// # Returns
///
/// * A tuple with the mean and standard deviation. `(0.0, 0.0)` for an
///   empty array.
pub fn mean_std_dev(array: &[Vec<f32>]) -> (f32, f32) {
    let (sum, sum_squared, count) = array.iter().fold((0.0f32, 0.0f32, 0usize), |prev, row| {
        row.iter()
            .fold(prev, |p, &value| (p.0 + value, p.1 + value * value, p.2 + 1))
    });

    if count == 0 {
        return (0.0, 0.0);
    }

    let mean = sum / count as f32;
    let variance = (sum_squared / count as f32 - mean * mean).max(0.0);
    (mean, variance.sqrt())
}

/// Standard deviation over a 2-D array, equivalent to numpy.std.
pub fn std_dev(array: &[Vec<f32>]) -> f32 {
    mean_std_dev(array).1
}

/// Z-score normalization over the full 2-D array: `(x - mean) / std`.
///
/// A constant array has zero standard deviation; dividing would flood the
/// pipeline with NaN, which defeats every later threshold comparison, so
/// such input maps to an all-zero array and downstream stages see "no
/// detections" instead.
pub fn z_score(array: &[Vec<f32>]) -> Vec<Vec<f32>> {
    let (mean, std) = mean_std_dev(array);
    if std == 0.0 {
        return array
            .iter()
            .map(|row| vec![0.0; row.len()])
            .collect();
    }
    array
        .iter()
        .map(|row| row.iter().map(|&value| (value - mean) / std).collect())
        .collect()
}

/// np.digitize against `bins + 1` evenly spaced cut-offs starting at
/// `min_v`: returns the bin index the value falls into, with 0 for values
/// below the first cut-off and `bins + 1` for values at or past the last.
///
/// # Arguments
///
/// * `value` - The value to discretize.
/// * `min_v` - The first cut-off.
/// * `interval` - Spacing between consecutive cut-offs.
/// * `bins` - Number of intervals between the first and last cut-off.
pub fn digitize_uniform(value: f32, min_v: f32, interval: f32, bins: usize) -> usize {
    if value < min_v {
        return 0;
    }
    (((value - min_v) / interval) as usize + 1).min(bins + 1)
}
