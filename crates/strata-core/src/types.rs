use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One entity's contribution at one tick, as produced upstream.
///
/// Records are immutable input; analyses only read them.
///
/// # Examples
///
/// ```
/// use strata_core::ContributionRecord;
///
/// let record = ContributionRecord::new(3, 1, 40, 15, 2)
///     .with_attribute("weekday", 2)
///     .with_attribute("hour", 14);
/// assert_eq!(record.net_delta(), 25);
/// assert_eq!(record.lines_touched(), 55);
/// assert_eq!(record.attribute("hour"), Some(14));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionRecord {
    /// Tick index since the repository start.
    pub tick: u32,
    /// Author, language or file identifier, depending on the producer.
    pub entity_id: u32,
    /// Lines added.
    #[serde(default)]
    pub delta_added: u64,
    /// Lines removed.
    #[serde(default)]
    pub delta_removed: u64,
    /// Lines changed in place.
    #[serde(default)]
    pub delta_changed: u64,
    /// Dimension name to bucket index (`weekday`, `hour`, `month`, `week`).
    #[serde(default)]
    pub attributes: BTreeMap<String, u32>,
}

impl ContributionRecord {
    /// Create a record with no attributes.
    pub fn new(tick: u32, entity_id: u32, added: u64, removed: u64, changed: u64) -> Self {
        Self {
            tick,
            entity_id,
            delta_added: added,
            delta_removed: removed,
            delta_changed: changed,
            attributes: BTreeMap::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attribute(mut self, dimension: &str, bucket: u32) -> Self {
        self.attributes.insert(dimension.to_string(), bucket);
        self
    }

    /// Bucket index for `dimension`, if the producer recorded one.
    pub fn attribute(&self, dimension: &str) -> Option<u32> {
        self.attributes.get(dimension).copied()
    }

    /// `added - removed`; negative for net deletions, saturating at the
    /// `i64` bounds.
    pub fn net_delta(&self) -> i64 {
        let delta = i128::from(self.delta_added) - i128::from(self.delta_removed);
        i64::try_from(delta).unwrap_or(if delta < 0 { i64::MIN } else { i64::MAX })
    }

    /// `added + removed`, the line count used for activity charts, saturating
    /// at `u64::MAX`.
    pub fn lines_touched(&self) -> u64 {
        self.delta_added.saturating_add(self.delta_removed)
    }
}

/// Non-negative weights, one per owning entity, for one scope at one point
/// in time.
///
/// The total may be zero; every metric treats that as a degenerate input.
///
/// # Examples
///
/// ```
/// use strata_core::OwnershipDistribution;
///
/// let dist: OwnershipDistribution = [50u64, 30, 10, 10].into_iter().collect();
/// assert_eq!(dist.total(), 100.0);
/// assert!(!dist.is_degenerate());
/// assert!(OwnershipDistribution::default().is_degenerate());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnershipDistribution {
    /// Weight per entity, in producer order.
    pub weights: Vec<f64>,
}

impl OwnershipDistribution {
    /// Wrap raw weights.
    pub fn new(weights: Vec<f64>) -> Self {
        Self { weights }
    }

    /// Sum of the positive, finite weights.
    pub fn total(&self) -> f64 {
        self.weights
            .iter()
            .filter(|w| w.is_finite() && **w > 0.0)
            .sum()
    }

    /// `true` when there are no entities or nothing is owned.
    pub fn is_degenerate(&self) -> bool {
        self.total() <= 0.0
    }

    /// Number of entities, including those with zero weight.
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// `true` when there are no entities at all.
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Borrow the weights.
    pub fn as_slice(&self) -> &[f64] {
        &self.weights
    }
}

impl FromIterator<u64> for OwnershipDistribution {
    fn from_iter<I: IntoIterator<Item = u64>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(|w| w as f64).collect())
    }
}

impl FromIterator<f64> for OwnershipDistribution {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Per-file hotspot inputs for one analysis window.
///
/// # Examples
///
/// ```
/// use strata_core::RiskFactor;
///
/// let factor = RiskFactor {
///     path: "src/engine.rs".into(),
///     size: 1200,
///     churn: 14,
///     coupling_degree: 9,
///     ownership_gini: 0.62,
/// };
/// assert!(factor.ownership_gini <= 1.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskFactor {
    /// File path relative to the repository root.
    pub path: String,
    /// Current size in lines.
    pub size: u64,
    /// Changes inside the analysis window.
    pub churn: u64,
    /// Number of distinct files changed together with this one.
    pub coupling_degree: u64,
    /// Gini coefficient of line ownership (0.0–1.0).
    pub ownership_gini: f64,
}

/// Reporting grid for time series.
///
/// `Raw` passes the daily matrix through untouched.
///
/// # Examples
///
/// ```
/// use strata_core::Granularity;
///
/// let g: Granularity = "month".parse().unwrap();
/// assert_eq!(g, Granularity::Month);
/// assert_eq!(g.finer(), Some(Granularity::Week));
/// assert_eq!(Granularity::Week.finer(), None);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// No resampling; one period per daily row.
    Raw,
    /// One boundary per calendar day.
    Day,
    /// Boundaries on Mondays.
    Week,
    /// Boundaries on the first of each month.
    #[default]
    Month,
    /// Boundaries on the first of January.
    Year,
}

impl Granularity {
    /// Next granularity in the fallback chain `year -> month -> week`.
    ///
    /// Week, day and raw have no fallback.
    pub fn finer(self) -> Option<Granularity> {
        match self {
            Granularity::Year => Some(Granularity::Month),
            Granularity::Month => Some(Granularity::Week),
            Granularity::Week | Granularity::Day | Granularity::Raw => None,
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Granularity::Raw => write!(f, "raw"),
            Granularity::Day => write!(f, "day"),
            Granularity::Week => write!(f, "week"),
            Granularity::Month => write!(f, "month"),
            Granularity::Year => write!(f, "year"),
        }
    }
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "raw" => Ok(Granularity::Raw),
            "day" | "daily" | "d" => Ok(Granularity::Day),
            "week" | "weekly" | "w" => Ok(Granularity::Week),
            "month" | "monthly" | "m" => Ok(Granularity::Month),
            "year" | "yearly" | "y" => Ok(Granularity::Year),
            other => Err(format!("unknown granularity: {other}")),
        }
    }
}

/// A calendar-aligned boundary produced by the resampler.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use strata_core::ResamplePeriod;
///
/// let period = ResamplePeriod {
///     boundary: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
///     slot: 31,
/// };
/// assert_eq!(period.slot, 31);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResamplePeriod {
    /// The boundary date.
    pub boundary: NaiveDate,
    /// Daily row index the value was sampled from.
    pub slot: usize,
}
