// sentri-core/src/domain/stats.rs

//! Numeric kernels shared by the statistical, correlation, distribution and
//! drift checks. All functions are total: degenerate inputs yield `0.0` or `None`
//! instead of NaN.

// Statistical computation requires casts between counts and floats
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

use std::cmp::Ordering;

/// Population Stability Index below this value means no meaningful drift.
pub const PSI_NO_DRIFT: f64 = 0.1;
/// PSI at or above this value is a significant drift.
pub const PSI_MODERATE_DRIFT: f64 = 0.25;
/// Proportion substituted for empty bins before taking the log ratio.
pub const PSI_EMPTY_BIN: f64 = 0.0001;

pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut v = values.to_vec();
    v.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    v
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn median(values: &[f64]) -> f64 {
    let s = sorted(values);
    let n = s.len();
    match n {
        0 => 0.0,
        _ if n % 2 == 1 => s[n / 2],
        _ => (s[n / 2 - 1] + s[n / 2]) / 2.0,
    }
}

/// Sample standard deviation (ddof = 1). Fewer than two values yield 0.
pub fn std_dev(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|x| (x - m).powi(2)).sum();
    (ss / (n - 1) as f64).sqrt()
}

pub fn min(values: &[f64]) -> f64 {
    values.iter().copied().reduce(f64::min).unwrap_or(0.0)
}

pub fn max(values: &[f64]) -> f64 {
    values.iter().copied().reduce(f64::max).unwrap_or(0.0)
}

fn central_sums(values: &[f64]) -> (f64, f64, f64) {
    let m = mean(values);
    values.iter().fold((0.0, 0.0, 0.0), |(m2, m3, m4), x| {
        let d = x - m;
        let d2 = d * d;
        (m2 + d2, m3 + d2 * d, m4 + d2 * d2)
    })
}

/// Bias-corrected sample skewness (adjusted Fisher-Pearson). Needs more than two values.
pub fn skewness(values: &[f64]) -> f64 {
    let n = values.len();
    if n <= 2 {
        return 0.0;
    }
    let (m2, m3, _) = central_sums(values);
    if m2 <= f64::EPSILON {
        return 0.0;
    }
    let n = n as f64;
    n * (n - 1.0).sqrt() / (n - 2.0) * m3 / m2.powf(1.5)
}

/// Bias-corrected excess kurtosis. Needs more than three values.
pub fn kurtosis(values: &[f64]) -> f64 {
    let n = values.len();
    if n <= 3 {
        return 0.0;
    }
    let (m2, _, m4) = central_sums(values);
    if m2 <= f64::EPSILON {
        return 0.0;
    }
    let n = n as f64;
    let adj = 3.0 * (n - 1.0).powi(2) / ((n - 2.0) * (n - 3.0));
    let num = n * (n + 1.0) * (n - 1.0) * m4;
    let den = (n - 2.0) * (n - 3.0) * m2 * m2;
    num / den - adj
}

/// Pearson correlation of paired samples. `None` when undefined
/// (fewer than two pairs or a constant side).
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len().min(y.len());
    if n < 2 {
        return None;
    }
    let (x, y) = (&x[..n], &y[..n]);
    let (mx, my) = (mean(x), mean(y));
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (a, b) in x.iter().zip(y) {
        let (dx, dy) = (a - mx, b - my);
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx <= f64::EPSILON || syy <= f64::EPSILON {
        return None;
    }
    Some((sxy / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0))
}

/// Largest sample size for which the two-sample p-value is computed exactly.
pub const KS_EXACT_LIMIT: usize = 10_000;

/// Two-sample Kolmogorov-Smirnov test: `(statistic, p_value)`.
///
/// The p-value is exact (lattice paths) while both samples hold at most
/// [`KS_EXACT_LIMIT`] values, and comes from the asymptotic Kolmogorov
/// distribution at `sqrt(n1 * n2 / (n1 + n2)) * d` beyond that.
pub fn ks_two_sample(a: &[f64], b: &[f64]) -> (f64, f64) {
    let sa = sorted(a);
    let sb = sorted(b);
    if sa.is_empty() || sb.is_empty() {
        return (0.0, 1.0);
    }

    let d = ks_statistic(&sa, &sb);
    if sa.len().max(sb.len()) <= KS_EXACT_LIMIT {
        return (d, ks_exact_p_value(sa.len(), sb.len(), d));
    }
    let (n1, n2) = (sa.len() as f64, sb.len() as f64);
    let en = (n1 * n2 / (n1 + n2)).sqrt();
    (d, ks_p_value(en * d))
}

/// `P(D >= d)` under the null hypothesis for sample sizes `m` and `n`.
///
/// Walks the monotone lattice paths from `(0, 0)` to `(m, n)` that keep
/// `|i/m - j/n| < d`. Cells hold the probability of a uniformly drawn path
/// reaching them inside the band rather than a path count, so nothing
/// overflows for large samples.
fn ks_exact_p_value(m: usize, n: usize, d: f64) -> f64 {
    let (mi, ni) = (m as i64, n as i64);
    let h = (d * (m * n) as f64).round() as i64;
    if h <= 0 {
        return 1.0;
    }
    let inside = |i: usize, j: usize| (i as i64 * ni - j as i64 * mi).abs() < h;

    // Stepping from a cell with `r_i` and `r_j` steps left moves along i
    // with probability `r_i / (r_i + r_j)`.
    let mut row = vec![0.0_f64; n + 1];
    row[0] = 1.0;
    for j in 1..=n {
        row[j] = if inside(0, j) {
            row[j - 1] * (n - j + 1) as f64 / (m + n - j + 1) as f64
        } else {
            0.0
        };
    }
    for i in 1..=m {
        row[0] = if inside(i, 0) {
            row[0] * (m - i + 1) as f64 / (m + n - i + 1) as f64
        } else {
            0.0
        };
        for j in 1..=n {
            row[j] = if inside(i, j) {
                (row[j] * (m - i + 1) as f64 + row[j - 1] * (n - j + 1) as f64)
                    / (m + n - i - j + 1) as f64
            } else {
                0.0
            };
        }
    }

    (1.0 - row[n]).clamp(0.0, 1.0)
}

fn ks_statistic(a: &[f64], b: &[f64]) -> f64 {
    let (n1, n2) = (a.len() as f64, b.len() as f64);
    let (mut i, mut j) = (0usize, 0usize);
    let mut d: f64 = 0.0;

    while i < a.len() && j < b.len() {
        let x = a[i].min(b[j]);
        while i < a.len() && a[i] <= x {
            i += 1;
        }
        while j < b.len() && b[j] <= x {
            j += 1;
        }
        d = d.max((i as f64 / n1 - j as f64 / n2).abs());
    }
    d
}

/// Survival function of the Kolmogorov distribution.
fn ks_p_value(z: f64) -> f64 {
    if z <= 0.0 {
        return 1.0;
    }
    if z > 3.5 {
        return 0.0;
    }

    let z_sq = z * z;
    let mut p = 0.0;
    for k in 1..=100 {
        let k_f = f64::from(k);
        let term = (-1.0_f64).powi(k - 1) * (-2.0 * k_f * k_f * z_sq).exp();
        p += term;
        if term.abs() < 1e-12 {
            break;
        }
    }
    (2.0 * p).clamp(0.0, 1.0)
}

/// Percentile with linear interpolation between closest ranks. `sorted` must be ascending.
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let pos = (q / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Population Stability Index of `current` against `baseline`.
///
/// Bin edges are the `n_bins + 1` baseline percentiles with duplicates removed;
/// the last bin is closed on the right and values outside the edges are ignored.
/// When fewer than two distinct edges remain the index is 0.
pub fn psi(baseline: &[f64], current: &[f64], n_bins: usize) -> f64 {
    if baseline.is_empty() || current.is_empty() || n_bins == 0 {
        return 0.0;
    }
    let base_sorted = sorted(baseline);
    let mut edges: Vec<f64> = (0..=n_bins)
        .map(|i| percentile(&base_sorted, 100.0 * i as f64 / n_bins as f64))
        .collect();
    edges.dedup();
    if edges.len() < 2 {
        return 0.0;
    }

    let base_props = bin_proportions(baseline, &edges);
    let curr_props = bin_proportions(current, &edges);

    base_props
        .iter()
        .zip(&curr_props)
        .map(|(&b, &c)| {
            let b = if b == 0.0 { PSI_EMPTY_BIN } else { b };
            let c = if c == 0.0 { PSI_EMPTY_BIN } else { c };
            (c - b) * (c / b).ln()
        })
        .sum()
}

fn bin_proportions(values: &[f64], edges: &[f64]) -> Vec<f64> {
    let bins = edges.len() - 1;
    let mut counts = vec![0usize; bins];
    let (lo, hi) = (edges[0], edges[bins]);

    for &v in values {
        if v < lo || v > hi {
            continue;
        }
        // Index of the first edge strictly greater than v, minus one.
        let idx = edges.partition_point(|&e| e <= v).saturating_sub(1).min(bins - 1);
        counts[idx] += 1;
    }

    let total = values.len() as f64;
    counts.into_iter().map(|c| c as f64 / total).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn test_basic_moments() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert!(approx(mean(&v), 2.5, 1e-12));
        assert!(approx(median(&v), 2.5, 1e-12));
        assert!(approx(std_dev(&v), 1.290_994_448_7, 1e-9));
        assert_eq!(std_dev(&[5.0]), 0.0);
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
    }

    #[test]
    fn test_skew_and_kurtosis_guards() {
        assert_eq!(skewness(&[1.0, 2.0]), 0.0);
        assert_eq!(kurtosis(&[1.0, 2.0, 3.0]), 0.0);
        assert_eq!(skewness(&[4.0, 4.0, 4.0]), 0.0);
        // Symmetric sample has zero skew.
        assert!(approx(skewness(&[1.0, 2.0, 3.0, 4.0, 5.0]), 0.0, 1e-12));
        // Matches the bias-corrected estimator for a uniform 1..=5 sample.
        assert!(approx(kurtosis(&[1.0, 2.0, 3.0, 4.0, 5.0]), -1.2, 1e-9));
    }

    #[test]
    fn test_pearson() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [8.0, 6.0, 4.0, 2.0];
        assert!(approx(pearson(&x, &y).unwrap_or_default(), -1.0, 1e-12));
        assert_eq!(pearson(&x, &[1.0, 1.0, 1.0, 1.0]), None);
        assert_eq!(pearson(&[1.0], &[2.0]), None);
    }

    #[test]
    fn test_ks_identical_and_disjoint() {
        let a: Vec<f64> = (0..50).map(f64::from).collect();
        let (d, p) = ks_two_sample(&a, &a);
        assert_eq!(d, 0.0);
        assert!(approx(p, 1.0, 1e-9));

        let b: Vec<f64> = (100..150).map(f64::from).collect();
        let (d, p) = ks_two_sample(&a, &b);
        assert_eq!(d, 1.0);
        assert!(p < 0.001);
    }

    #[test]
    fn test_ks_exact_for_small_samples() {
        let a: Vec<f64> = (0..10).map(f64::from).collect();
        let b: Vec<f64> = (6..16).map(f64::from).collect();
        let (d, p) = ks_two_sample(&a, &b);
        assert!(approx(d, 0.6, 1e-12));
        assert!(approx(p, 0.052448, 1e-6), "p={p}");
    }

    #[test]
    fn test_ks_exact_past_a_hundred_values() {
        let a: Vec<f64> = (0..101).map(f64::from).collect();
        let b: Vec<f64> = (19..120).map(f64::from).collect();
        let (d, p) = ks_two_sample(&a, &b);
        assert!(approx(d, 19.0 / 101.0, 1e-12));
        // Above the default 0.05 cut-off.
        assert!(approx(p, 0.055879, 1e-6), "p={p}");

        let a: Vec<f64> = (0..300).map(f64::from).collect();
        let b: Vec<f64> = (33..333).map(f64::from).collect();
        assert!(approx(ks_two_sample(&a, &b).1, 0.052964, 1e-6));
    }

    #[test]
    fn test_ks_asymptotic_for_large_samples() {
        let a: Vec<f64> = (0..10_001).map(f64::from).collect();
        let b: Vec<f64> = (200..10_201).map(f64::from).collect();
        let (d, p) = ks_two_sample(&a, &b);
        assert!(approx(d, 200.0 / 10_001.0, 1e-12));
        assert!(approx(p, 0.036646, 1e-6), "p={p}");
    }

    #[test]
    fn test_ks_exact_unequal_sizes() {
        assert!(approx(ks_exact_p_value(5, 8, 0.5), 0.316239, 1e-6));
        assert_eq!(ks_exact_p_value(5, 8, 0.0), 1.0);
    }

    #[test]
    fn test_percentile_linear() {
        let s = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&s, 0.0), 1.0);
        assert_eq!(percentile(&s, 100.0), 4.0);
        assert!(approx(percentile(&s, 50.0), 2.5, 1e-12));
    }

    #[test]
    fn test_psi_constant_series_is_zero() {
        let flat = vec![7.0; 12];
        assert_eq!(psi(&flat, &flat, 10), 0.0);
    }

    #[test]
    fn test_psi_detects_shift() {
        let base: Vec<f64> = (0..100).map(f64::from).collect();
        let same = psi(&base, &base, 10);
        assert!(approx(same, 0.0, 1e-12));

        let shifted: Vec<f64> = (50..150).map(f64::from).collect();
        assert!(psi(&base, &shifted, 10) > PSI_MODERATE_DRIFT);
    }
}
