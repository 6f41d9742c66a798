//! Ownership over time and by directory.
//!
//! Turns per-tick ownership snapshots into bus factor and concentration
//! series, and line-level ownership into per-subsystem distributions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strata_core::OwnershipDistribution;

use crate::bus_factor::bus_factor;
use crate::distribution::{gini, hhi};

/// Bus factor at one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusFactorPoint {
    /// Tick index.
    pub tick: u32,
    /// Bus factor at the configured threshold.
    pub bus_factor: usize,
    /// Total owned lines at this tick.
    pub total: f64,
}

/// Gini and HHI at one tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConcentrationPoint {
    /// Tick index.
    pub tick: u32,
    /// Gini coefficient (0.0–1.0).
    pub gini: f64,
    /// Herfindahl-Hirschman Index (0.0–1.0).
    pub hhi: f64,
}

/// Bus factor of every snapshot, in tick order.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use strata_core::OwnershipDistribution;
/// use strata_metrics::ownership::bus_factor_timeline;
///
/// let mut snapshots = BTreeMap::new();
/// snapshots.insert(0, OwnershipDistribution::new(vec![100.0]));
/// snapshots.insert(5, OwnershipDistribution::new(vec![60.0, 60.0, 30.0]));
///
/// let series = bus_factor_timeline(&snapshots, 0.8);
/// assert_eq!(series.len(), 2);
/// assert_eq!(series[0].bus_factor, 1);
/// assert_eq!(series[1].bus_factor, 3);
/// assert_eq!(series[1].total, 150.0);
/// ```
pub fn bus_factor_timeline(
    snapshots: &BTreeMap<u32, OwnershipDistribution>,
    threshold: f64,
) -> Vec<BusFactorPoint> {
    snapshots
        .iter()
        .map(|(&tick, dist)| BusFactorPoint {
            tick,
            bus_factor: bus_factor(dist.as_slice(), threshold),
            total: dist.total(),
        })
        .collect()
}

/// Gini and HHI of every snapshot, in tick order.
pub fn concentration_timeline(
    snapshots: &BTreeMap<u32, OwnershipDistribution>,
) -> Vec<ConcentrationPoint> {
    snapshots
        .iter()
        .map(|(&tick, dist)| ConcentrationPoint {
            tick,
            gini: gini(dist.as_slice()),
            hhi: hhi(dist.as_slice()),
        })
        .collect()
}

/// Lines of one file attributed to one author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileOwnership {
    /// File path relative to the repository root.
    pub path: String,
    /// Owning author.
    pub author: u32,
    /// Lines currently attributed to `author`.
    pub lines: u64,
}

/// Directory a file belongs to.
///
/// The parent directory of `path`, or `"/"` for files at the repository root.
///
/// # Examples
///
/// ```
/// use strata_metrics::ownership::subsystem_of;
///
/// assert_eq!(subsystem_of("src/net/tcp.rs"), "src/net");
/// assert_eq!(subsystem_of("Cargo.toml"), "/");
/// assert_eq!(subsystem_of("./build.rs"), "/");
/// ```
pub fn subsystem_of(path: &str) -> &str {
    let path = path.strip_prefix("./").unwrap_or(path);
    match path.rsplit_once('/') {
        Some(("", _)) | None => "/",
        Some((dir, _)) => dir,
    }
}

/// Per-directory ownership distributions.
///
/// Lines are summed per author within each directory. Each distribution
/// lists authors in ascending id order; authors with no lines in a directory
/// are absent from it.
///
/// # Examples
///
/// ```
/// use strata_metrics::ownership::{group_by_subsystem, FileOwnership};
///
/// let lines = vec![
///     FileOwnership { path: "src/a.rs".into(), author: 2, lines: 30 },
///     FileOwnership { path: "src/b.rs".into(), author: 2, lines: 10 },
///     FileOwnership { path: "src/b.rs".into(), author: 1, lines: 60 },
///     FileOwnership { path: "README.md".into(), author: 1, lines: 5 },
/// ];
/// let grouped = group_by_subsystem(&lines);
/// assert_eq!(grouped["src"].weights, vec![60.0, 40.0]);
/// assert_eq!(grouped["/"].weights, vec![5.0]);
/// ```
pub fn group_by_subsystem(lines: &[FileOwnership]) -> BTreeMap<String, OwnershipDistribution> {
    let mut per_dir: BTreeMap<&str, BTreeMap<u32, u64>> = BTreeMap::new();
    for entry in lines {
        if entry.lines == 0 {
            continue;
        }
        *per_dir
            .entry(subsystem_of(&entry.path))
            .or_default()
            .entry(entry.author)
            .or_default() += entry.lines;
    }

    per_dir
        .into_iter()
        .map(|(dir, authors)| {
            let dist: OwnershipDistribution = authors.into_values().collect();
            (dir.to_string(), dist)
        })
        .collect()
}
