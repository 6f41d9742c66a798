//! Bus factor: how many top owners it takes to cover a share of the code.
//!
//! A low bus factor means knowledge is concentrated in a few people. The
//! search is a greedy walk over owners sorted by weight, descending; ties
//! keep input order so identical input always yields identical owner lists.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use strata_core::OwnershipDistribution;

/// Smallest number of top owners whose combined weight exceeds
/// `threshold * total`.
///
/// A set covering exactly the threshold share does not count: 80 of 100
/// lines at `0.8` needs one more owner. The comparison carries a relative
/// tolerance of [`TOLERANCE`] so every threshold behaves the same however
/// its product with the total rounds.
///
/// Returns `0` when the total weight is zero, and the full input length when
/// `threshold >= 1.0` or the target is unreachable through rounding. Never
/// exceeds `weights.len()`.
///
/// # Examples
///
/// ```
/// use strata_metrics::bus_factor::bus_factor;
///
/// assert_eq!(bus_factor(&[50.0, 30.0, 10.0, 10.0], 0.8), 3);
/// assert_eq!(bus_factor(&[50.0, 30.0, 10.0, 10.0], 0.5), 2);
/// assert_eq!(bus_factor(&[50.0, 30.0, 10.0, 10.0], 0.4), 1);
/// assert_eq!(bus_factor(&[0.0, 0.0], 0.8), 0);
/// assert_eq!(bus_factor(&[5.0, 5.0, 0.0], 1.0), 3);
/// ```
pub fn bus_factor(weights: &[f64], threshold: f64) -> usize {
    core_owners(weights, threshold).len()
}

/// Share of the total by which the owner set must exceed the threshold.
pub const TOLERANCE: f64 = 1e-9;

/// Indices of the owners counted by [`bus_factor`], heaviest first.
///
/// Owners with equal weight appear in input order.
///
/// # Examples
///
/// ```
/// use strata_metrics::bus_factor::core_owners;
///
/// // Indices 1 and 2 tie; the earlier one is taken first.
/// assert_eq!(core_owners(&[10.0, 40.0, 40.0, 10.0], 0.5), vec![1, 2]);
/// assert_eq!(core_owners(&[10.0, 40.0, 40.0, 10.0], 0.3), vec![1]);
/// ```
pub fn core_owners(weights: &[f64], threshold: f64) -> Vec<usize> {
    let total: f64 = weights.iter().copied().map(sanitize).sum();
    if total <= 0.0 {
        return Vec::new();
    }

    let order = descending_order(weights);
    if threshold.is_nan() || threshold >= 1.0 {
        return order;
    }

    let target = threshold * total + TOLERANCE * total;
    let mut cumulative = 0.0;
    for (taken, &idx) in order.iter().enumerate() {
        cumulative += sanitize(weights[idx]);
        if cumulative > target {
            return order[..=taken].to_vec();
        }
    }
    order
}

/// Bus factor of an [`OwnershipDistribution`].
pub fn distribution_bus_factor(dist: &OwnershipDistribution, threshold: f64) -> usize {
    bus_factor(dist.as_slice(), threshold)
}

fn descending_order(weights: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..weights.len()).collect();
    // `sort_by` is stable, so equal weights keep their input order.
    order.sort_by(|&a, &b| {
        sanitize(weights[b])
            .partial_cmp(&sanitize(weights[a]))
            .unwrap_or(Ordering::Equal)
    });
    order
}

fn sanitize(w: f64) -> f64 {
    if w.is_finite() && w > 0.0 {
        w
    } else {
        0.0
    }
}

/// Qualitative reading of a bus factor value.
///
/// # Examples
///
/// ```
/// use strata_metrics::bus_factor::BusFactorHealth;
///
/// assert_eq!(BusFactorHealth::from_bus_factor(1), BusFactorHealth::Critical);
/// assert_eq!(BusFactorHealth::from_bus_factor(3), BusFactorHealth::Low);
/// assert_eq!(BusFactorHealth::from_bus_factor(5), BusFactorHealth::Moderate);
/// assert_eq!(BusFactorHealth::from_bus_factor(6), BusFactorHealth::Healthy);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BusFactorHealth {
    /// Bus factor of 0 or 1.
    Critical,
    /// Bus factor 2–3.
    Low,
    /// Bus factor 4–5.
    Moderate,
    /// Bus factor above 5.
    Healthy,
}

impl BusFactorHealth {
    /// Map a bus factor to its health band.
    pub fn from_bus_factor(value: usize) -> Self {
        match value {
            0 | 1 => BusFactorHealth::Critical,
            2 | 3 => BusFactorHealth::Low,
            4 | 5 => BusFactorHealth::Moderate,
            _ => BusFactorHealth::Healthy,
        }
    }
}

impl fmt::Display for BusFactorHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusFactorHealth::Critical => write!(f, "critical"),
            BusFactorHealth::Low => write!(f, "low"),
            BusFactorHealth::Moderate => write!(f, "moderate"),
            BusFactorHealth::Healthy => write!(f, "healthy"),
        }
    }
}

/// Bus factor of one directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubsystemBusFactor {
    /// Directory path, `"/"` for the repository root.
    pub subsystem: String,
    /// Bus factor at the configured threshold.
    pub bus_factor: usize,
    /// Health band for `bus_factor`.
    pub health: BusFactorHealth,
}

/// Per-subsystem bus factors, worst first.
///
/// Sorted by bus factor ascending, then by directory name.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use strata_core::OwnershipDistribution;
/// use strata_metrics::bus_factor::rank_subsystems;
///
/// let mut subsystems = BTreeMap::new();
/// subsystems.insert("src/net".to_string(), OwnershipDistribution::new(vec![90.0, 10.0]));
/// subsystems.insert("src/db".to_string(), OwnershipDistribution::new(vec![25.0, 25.0, 25.0, 25.0]));
///
/// let ranked = rank_subsystems(&subsystems, 0.8);
/// assert_eq!(ranked[0].subsystem, "src/net");
/// assert_eq!(ranked[0].bus_factor, 1);
/// assert_eq!(ranked[1].bus_factor, 4);
/// ```
pub fn rank_subsystems(
    subsystems: &BTreeMap<String, OwnershipDistribution>,
    threshold: f64,
) -> Vec<SubsystemBusFactor> {
    let mut ranked: Vec<SubsystemBusFactor> = subsystems
        .iter()
        .map(|(dir, dist)| {
            let value = distribution_bus_factor(dist, threshold);
            SubsystemBusFactor {
                subsystem: dir.clone(),
                bus_factor: value,
                health: BusFactorHealth::from_bus_factor(value),
            }
        })
        .collect();

    ranked.sort_by(|a, b| {
        a.bus_factor
            .cmp(&b.bus_factor)
            .then_with(|| a.subsystem.cmp(&b.subsystem))
    });
    ranked
}
