//! Composite hotspot risk.
//!
//! A file is hot only when it is large, frequently changed, tightly coupled
//! and owned by few people at the same time, so the score is the product of
//! the four normalized factors. Any zero factor zeroes the score.

use serde::{Deserialize, Serialize};
use strata_core::{RiskFactor, RiskWeights};

/// Normalization denominators for one analysis window.
///
/// # Examples
///
/// ```
/// use strata_core::RiskFactor;
/// use strata_metrics::risk::RiskMaxima;
///
/// let factors = vec![
///     RiskFactor { path: "a.rs".into(), size: 10, churn: 4, coupling_degree: 1, ownership_gini: 0.2 },
///     RiskFactor { path: "b.rs".into(), size: 99, churn: 2, coupling_degree: 7, ownership_gini: 0.9 },
/// ];
/// let maxima = RiskMaxima::from_factors(&factors);
/// assert_eq!((maxima.max_size, maxima.max_churn, maxima.max_coupling), (99, 4, 7));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskMaxima {
    /// Largest file size in lines.
    pub max_size: u64,
    /// Largest churn.
    pub max_churn: u64,
    /// Largest coupling degree.
    pub max_coupling: u64,
}

impl RiskMaxima {
    /// Column-wise maxima of `factors`; all zero for an empty slice.
    pub fn from_factors(factors: &[RiskFactor]) -> Self {
        factors.iter().fold(Self::default(), |acc, f| Self {
            max_size: acc.max_size.max(f.size),
            max_churn: acc.max_churn.max(f.churn),
            max_coupling: acc.max_coupling.max(f.coupling_degree),
        })
    }
}

/// The four normalized terms of a risk score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskComponents {
    /// `ln(size + 1) / ln(max_size + 1)`.
    pub size: f64,
    /// `churn / max_churn`.
    pub churn: f64,
    /// `coupling_degree / max_coupling`.
    pub coupling: f64,
    /// Ownership Gini, clamped to `[0, 1]`.
    pub ownership: f64,
}

impl RiskComponents {
    /// Normalize raw factor values against `maxima`.
    ///
    /// A zero denominator yields a zero term.
    pub fn normalize(
        size: u64,
        churn: u64,
        coupling_degree: u64,
        ownership_gini: f64,
        maxima: &RiskMaxima,
    ) -> Self {
        let size_denominator = (maxima.max_size as f64).ln_1p();
        Self {
            size: ratio((size as f64).ln_1p(), size_denominator),
            churn: ratio(churn as f64, maxima.max_churn as f64),
            coupling: ratio(coupling_degree as f64, maxima.max_coupling as f64),
            ownership: if ownership_gini.is_finite() {
                ownership_gini.clamp(0.0, 1.0)
            } else {
                0.0
            },
        }
    }

    /// Product of the terms, each raised to its weight.
    ///
    /// With the default weights this is the plain product.
    pub fn score(&self, weights: &RiskWeights) -> f64 {
        let score = self.size.powf(weights.size)
            * self.churn.powf(weights.churn)
            * self.coupling.powf(weights.coupling)
            * self.ownership.powf(weights.ownership);
        if score.is_finite() {
            score.max(0.0)
        } else {
            0.0
        }
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

/// Composite risk score of one file.
///
/// `size_norm * churn_norm * coupling_norm * ownership_gini`, with every zero
/// normalization denominator resolving to a zero term.
///
/// # Examples
///
/// ```
/// use strata_metrics::risk::{risk_score, RiskMaxima};
///
/// let maxima = RiskMaxima { max_size: 1000, max_churn: 20, max_coupling: 10 };
/// let hottest = risk_score(1000, 20, 10, 1.0, &maxima);
/// assert!((hottest - 1.0).abs() < 1e-12);
///
/// // Empty file: log(0 + 1) = 0.
/// assert_eq!(risk_score(0, 20, 10, 1.0, &maxima), 0.0);
///
/// // No churn anywhere in the window.
/// let quiet = RiskMaxima { max_churn: 0, ..maxima };
/// assert_eq!(risk_score(500, 0, 3, 0.7, &quiet), 0.0);
/// ```
pub fn risk_score(
    size: u64,
    churn: u64,
    coupling_degree: u64,
    ownership_gini: f64,
    maxima: &RiskMaxima,
) -> f64 {
    weighted_risk_score(
        size,
        churn,
        coupling_degree,
        ownership_gini,
        maxima,
        &RiskWeights::default(),
    )
}

/// [`risk_score`] with a per-factor exponent.
pub fn weighted_risk_score(
    size: u64,
    churn: u64,
    coupling_degree: u64,
    ownership_gini: f64,
    maxima: &RiskMaxima,
    weights: &RiskWeights,
) -> f64 {
    RiskComponents::normalize(size, churn, coupling_degree, ownership_gini, maxima).score(weights)
}

/// A file with its composite score and the terms behind it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedRisk {
    /// The raw inputs.
    pub factor: RiskFactor,
    /// Normalized terms, for the breakdown chart.
    pub components: RiskComponents,
    /// Composite score.
    pub score: f64,
}

/// Score every file against the window's maxima and order the result.
///
/// Highest score first; equal scores are ordered by path so the ranking is
/// a total order independent of input order.
///
/// # Examples
///
/// ```
/// use strata_core::{RiskFactor, RiskWeights};
/// use strata_metrics::risk::rank_risks;
///
/// let factors = vec![
///     RiskFactor { path: "src/empty.rs".into(), size: 0, churn: 50, coupling_degree: 9, ownership_gini: 1.0 },
///     RiskFactor { path: "src/core.rs".into(), size: 800, churn: 40, coupling_degree: 8, ownership_gini: 0.8 },
/// ];
/// let ranked = rank_risks(factors, &RiskWeights::default());
/// assert_eq!(ranked[0].factor.path, "src/core.rs");
/// assert_eq!(ranked[1].score, 0.0);
/// ```
pub fn rank_risks(factors: Vec<RiskFactor>, weights: &RiskWeights) -> Vec<RankedRisk> {
    let maxima = RiskMaxima::from_factors(&factors);

    let mut ranked: Vec<RankedRisk> = factors
        .into_iter()
        .map(|factor| {
            let components = RiskComponents::normalize(
                factor.size,
                factor.churn,
                factor.coupling_degree,
                factor.ownership_gini,
                &maxima,
            );
            RankedRisk {
                score: components.score(weights),
                components,
                factor,
            }
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.factor.path.cmp(&b.factor.path))
    });
    ranked
}

/// The first `k` entries of a ranking, or all of them if there are fewer.
pub fn top_k(ranked: &[RankedRisk], k: usize) -> &[RankedRisk] {
    &ranked[..k.min(ranked.len())]
}
