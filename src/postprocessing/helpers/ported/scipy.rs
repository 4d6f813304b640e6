/* PORTED SCIPY FUNCTIONS */

/// Find all local maxima of a 1-D signal, midpoints of plateaus included.
/// A Rust port of the first stage of scipy.signal.find_peaks
/// (`_local_maxima_1d`). The first and last sample can never be maxima.
fn local_maxima(x: &[f32]) -> Vec<usize> {
    let mut midpoints = Vec::new();
    if x.len() < 3 {
        return midpoints;
    }

    let i_max = x.len() - 1;
    let mut i = 1;
    while i < i_max {
        if x[i - 1] < x[i] {
            // locate the end of a potential plateau
            let mut i_ahead = i + 1;
            while i_ahead < i_max && x[i_ahead] == x[i] {
                i_ahead += 1;
            }
            if x[i_ahead] < x[i] {
                let left_edge = i;
                let right_edge = i_ahead - 1;
                midpoints.push((left_edge + right_edge) / 2);
                i = i_ahead;
            }
        }
        i += 1;
    }

    midpoints
}

/// Remove peaks closer than `distance` samples to a higher peak, matching
/// scipy's `_select_by_peak_distance`. Higher peaks take priority; among
/// survivors the original order is preserved.
fn select_by_peak_distance(peaks: &[usize], heights: &[f32], distance: usize) -> Vec<usize> {
    let n = peaks.len();
    let mut keep = vec![true; n];

    // indices ordered by height, ascending
    let mut priority: Vec<usize> = (0..n).collect();
    priority.sort_by(|&a, &b| {
        heights[a]
            .partial_cmp(&heights[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    for &j in priority.iter().rev() {
        if !keep[j] {
            continue;
        }
        let mut k = j;
        while k > 0 && peaks[j] - peaks[k - 1] < distance {
            k -= 1;
            keep[k] = false;
        }
        k = j + 1;
        while k < n && peaks[k] - peaks[j] < distance {
            keep[k] = false;
            k += 1;
        }
    }

    peaks
        .iter()
        .zip(keep)
        .filter_map(|(&p, kept)| kept.then_some(p))
        .collect()
}

/// Prominence of each peak together with its left and right base, per
/// scipy.signal.peak_prominences.
///
/// # Returns
///
/// * One `(prominence, left_base, right_base)` triple per peak.
pub fn peak_prominences(x: &[f32], peaks: &[usize]) -> Vec<(f32, usize, usize)> {
    if x.is_empty() {
        return Vec::new();
    }
    let i_max = x.len() - 1;
    peaks
        .iter()
        .map(|&peak| {
            let mut left_base = peak;
            let mut left_min = x[peak];
            let mut i = peak;
            while i > 0 && x[i] <= x[peak] {
                i -= 1;
                if x[i] < left_min {
                    left_min = x[i];
                    left_base = i;
                }
            }

            let mut right_base = peak;
            let mut right_min = x[peak];
            let mut i = peak;
            while i < i_max && x[i] <= x[peak] {
                i += 1;
                if x[i] < right_min {
                    right_min = x[i];
                    right_base = i;
                }
            }

            (x[peak] - left_min.max(right_min), left_base, right_base)
        })
        .collect()
}

/// Width of each peak at half its prominence, with linear interpolation of
/// the crossing positions, per scipy.signal.peak_widths with the default
/// `rel_height=0.5`.
pub fn peak_widths(x: &[f32], peaks: &[usize], prominences: &[(f32, usize, usize)]) -> Vec<f32> {
    peaks
        .iter()
        .zip(prominences)
        .map(|(&peak, &(prominence, left_base, right_base))| {
            let height = x[peak] - prominence * 0.5;

            let mut i = peak;
            while i > left_base && height < x[i] {
                i -= 1;
            }
            let mut left_ip = i as f32;
            if x[i] < height {
                left_ip += (height - x[i]) / (x[i + 1] - x[i]);
            }

            let mut i = peak;
            while i < right_base && height < x[i] {
                i += 1;
            }
            let mut right_ip = i as f32;
            if x[i] < height {
                right_ip -= (height - x[i]) / (x[i - 1] - x[i]);
            }

            right_ip - left_ip
        })
        .collect()
}

/// Detect peaks in a 1-D signal, the subset of scipy.signal.find_peaks the
/// event segmenter relies on: a minimum horizontal `distance` between
/// surviving peaks and a minimum half-prominence width.
///
/// # Arguments
///
/// * `x` - The signal.
/// * `distance` - Minimal distance in samples between neighbouring peaks;
///   smaller peaks are removed first.
/// * `min_width` - Minimal required width in samples at half prominence.
///
/// # Returns
///
/// * Indices of the surviving peaks, ascending. Empty when the signal has
///   no qualifying peak.
pub fn find_peaks(x: &[f32], distance: usize, min_width: f32) -> Vec<usize> {
    let peaks = local_maxima(x);
    if peaks.is_empty() {
        return peaks;
    }

    let heights: Vec<f32> = peaks.iter().map(|&p| x[p]).collect();
    let peaks = select_by_peak_distance(&peaks, &heights, distance.max(1));

    let prominences = peak_prominences(x, &peaks);
    let widths = peak_widths(x, &peaks, &prominences);
    peaks
        .into_iter()
        .zip(widths)
        .filter_map(|(peak, width)| (width >= min_width).then_some(peak))
        .collect()
}

/// A natural cubic spline through samples taken at integer positions
/// 0, 1, .., n-1. Evaluation outside the sample range extrapolates the
/// boundary polynomial (queries never exceed the last knot by more than
/// one step).
///
/// Note: scipy's CubicSpline defaults to not-a-knot boundary conditions;
/// this uses natural boundaries (zero second derivative at both ends).
/// The two agree everywhere except the first and last segments, where the
/// channels are quiet lead-in/lead-out frames.
pub struct CubicSpline {
    y: Vec<f32>,
    /// Second derivative at each knot; zero at both ends.
    m: Vec<f32>,
}

impl CubicSpline {
    pub fn new(y: &[f32]) -> Self {
        let n = y.len();
        let mut m = vec![0.0f32; n];

        if n >= 3 {
            // tridiagonal system m[i-1] + 4 m[i] + m[i+1] = rhs[i] for the
            // interior knots, solved with the Thomas algorithm (unit spacing)
            let k = n - 2;
            let rhs: Vec<f32> = (1..n - 1)
                .map(|i| 6.0 * (y[i + 1] - 2.0 * y[i] + y[i - 1]))
                .collect();

            let mut c_prime = vec![0.0f32; k];
            let mut d_prime = vec![0.0f32; k];
            c_prime[0] = 0.25;
            d_prime[0] = rhs[0] * 0.25;
            for j in 1..k {
                let denom = 4.0 - c_prime[j - 1];
                c_prime[j] = 1.0 / denom;
                d_prime[j] = (rhs[j] - d_prime[j - 1]) / denom;
            }

            m[k] = d_prime[k - 1];
            for j in (0..k - 1).rev() {
                m[j + 1] = d_prime[j] - c_prime[j] * m[j + 2];
            }
        }

        Self { y: y.to_vec(), m }
    }

    /// Evaluate the spline at position `t` (in sample units).
    pub fn evaluate(&self, t: f32) -> f32 {
        let n = self.y.len();
        match n {
            0 => 0.0,
            1 => self.y[0],
            _ => {
                let j = (t.floor().max(0.0) as usize).min(n - 2);
                let dx = t - j as f32;
                let (y0, y1) = (self.y[j], self.y[j + 1]);
                let (m0, m1) = (self.m[j], self.m[j + 1]);
                let b = (y1 - y0) - (2.0 * m0 + m1) / 6.0;
                let c = m0 / 2.0;
                let d = (m1 - m0) / 6.0;
                y0 + b * dx + c * dx * dx + d * dx * dx * dx
            }
        }
    }
}
