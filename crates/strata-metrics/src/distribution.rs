//! Inequality measures over ownership and activity distributions.
//!
//! Gini is derived from the discrete Lorenz curve so the value drawn on the
//! knowledge-diffusion chart and the value reported in tables are the same
//! number. Both measures are total: degenerate input yields `0.0`.

use serde::{Deserialize, Serialize};

/// Gini coefficient and HHI for one distribution.
///
/// # Examples
///
/// ```
/// use strata_metrics::distribution::concentration;
///
/// let c = concentration(&[100.0]);
/// assert_eq!(c.gini, 0.0);
/// assert_eq!(c.hhi, 1.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Concentration {
    /// Gini coefficient (0.0–1.0).
    pub gini: f64,
    /// Herfindahl-Hirschman Index (0.0–1.0).
    pub hhi: f64,
}

/// Compute both [`gini`] and [`hhi`] for `weights`.
pub fn concentration(weights: &[f64]) -> Concentration {
    Concentration {
        gini: gini(weights),
        hhi: hhi(weights),
    }
}

/// Gini coefficient of `weights`.
///
/// Computed as `1 - 2 * area` under the Lorenz curve (trapezoidal rule,
/// origin prepended). Returns `0.0` for empty input or zero total weight.
/// Negative and non-finite weights count as zero.
///
/// # Examples
///
/// ```
/// use strata_metrics::distribution::gini;
///
/// assert_eq!(gini(&[]), 0.0);
/// assert_eq!(gini(&[7.0, 7.0, 7.0]), 0.0);
/// assert!((gini(&[0.0, 0.0, 0.0, 12.0]) - 0.75).abs() < 1e-12);
/// ```
pub fn gini(weights: &[f64]) -> f64 {
    let curve = lorenz_curve(weights);
    if curve.len() < 2 {
        return 0.0;
    }

    let area: f64 = curve
        .windows(2)
        .map(|pair| {
            let (x0, y0) = pair[0];
            let (x1, y1) = pair[1];
            (x1 - x0) * (y0 + y1) / 2.0
        })
        .sum();

    (1.0 - 2.0 * area).clamp(0.0, 1.0)
}

/// Herfindahl-Hirschman Index: sum of squared shares.
///
/// Returns `0.0` for empty input or zero total weight and `1.0` for a single
/// owner.
///
/// # Examples
///
/// ```
/// use strata_metrics::distribution::hhi;
///
/// assert_eq!(hhi(&[42.0]), 1.0);
/// assert!((hhi(&[1.0, 1.0, 1.0, 1.0]) - 0.25).abs() < 1e-12);
/// assert_eq!(hhi(&[0.0, 0.0]), 0.0);
/// ```
pub fn hhi(weights: &[f64]) -> f64 {
    let total: f64 = weights.iter().copied().map(sanitize).sum();
    if total <= 0.0 {
        return 0.0;
    }

    weights
        .iter()
        .map(|w| {
            let share = sanitize(*w) / total;
            share * share
        })
        .sum::<f64>()
        .min(1.0)
}

/// Discrete Lorenz curve points for `weights`.
///
/// Weights are sorted ascending; point *i* is (fraction of entities,
/// fraction of total weight) after the *i* smallest. The origin is always
/// the first point and `(1.0, 1.0)` the last. Returns an empty vector for
/// degenerate input.
///
/// # Examples
///
/// ```
/// use strata_metrics::distribution::lorenz_curve;
///
/// let curve = lorenz_curve(&[3.0, 1.0]);
/// assert_eq!(curve, vec![(0.0, 0.0), (0.5, 0.25), (1.0, 1.0)]);
/// assert!(lorenz_curve(&[]).is_empty());
/// ```
pub fn lorenz_curve(weights: &[f64]) -> Vec<(f64, f64)> {
    let mut sorted: Vec<f64> = weights.iter().copied().map(sanitize).collect();
    let total: f64 = sorted.iter().sum();
    if sorted.is_empty() || total <= 0.0 {
        return Vec::new();
    }
    sorted.sort_by(f64::total_cmp);

    let n = sorted.len() as f64;
    let mut points = Vec::with_capacity(sorted.len() + 1);
    points.push((0.0, 0.0));

    let mut cumulative = 0.0;
    for (i, w) in sorted.iter().enumerate() {
        cumulative += w;
        points.push(((i + 1) as f64 / n, cumulative / total));
    }
    // Pin the endpoint against accumulated rounding.
    if let Some(last) = points.last_mut() {
        *last = (1.0, 1.0);
    }
    points
}

fn sanitize(w: f64) -> f64 {
    if w.is_finite() && w > 0.0 {
        w
    } else {
        0.0
    }
}
