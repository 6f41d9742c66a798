//! Temporal activity: when developers commit.
//!
//! Records carry pre-computed calendar buckets in their attributes
//! (`weekday`, `hour`, `month`, `week`). This module only counts; it never
//! looks at timestamps.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use strata_core::ContributionRecord;
use tracing::debug;

/// A calendar dimension with a fixed number of buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    /// Day of week, Sunday = 0.
    Weekday,
    /// Hour of day, 0–23.
    Hour,
    /// Month, January = 0.
    Month,
    /// ISO week minus one, 0–52.
    Week,
}

impl Dimension {
    /// Every dimension, in report order.
    pub const ALL: [Dimension; 4] = [
        Dimension::Weekday,
        Dimension::Hour,
        Dimension::Month,
        Dimension::Week,
    ];

    /// Attribute key on [`ContributionRecord`].
    pub fn key(self) -> &'static str {
        match self {
            Dimension::Weekday => "weekday",
            Dimension::Hour => "hour",
            Dimension::Month => "month",
            Dimension::Week => "week",
        }
    }

    /// Number of buckets.
    pub fn buckets(self) -> usize {
        match self {
            Dimension::Weekday => 7,
            Dimension::Hour => 24,
            Dimension::Month => 12,
            Dimension::Week => 53,
        }
    }
}

/// Which count a chart shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityMetric {
    /// One per record.
    #[default]
    Commits,
    /// Lines added plus lines removed.
    Lines,
}

/// Commit and line counts per bucket of one dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionCounts {
    /// Records per bucket.
    pub commits: Vec<u64>,
    /// Lines touched per bucket.
    pub lines: Vec<u64>,
}

impl DimensionCounts {
    fn new(dimension: Dimension) -> Self {
        Self {
            commits: vec![0; dimension.buckets()],
            lines: vec![0; dimension.buckets()],
        }
    }

    /// Counts for `metric`.
    pub fn get(&self, metric: ActivityMetric) -> &[u64] {
        match metric {
            ActivityMetric::Commits => &self.commits,
            ActivityMetric::Lines => &self.lines,
        }
    }

    fn add(&mut self, bucket: usize, lines: u64) {
        self.commits[bucket] = self.commits[bucket].saturating_add(1);
        self.lines[bucket] = self.lines[bucket].saturating_add(lines);
    }
}

/// Activity of one developer, or of everyone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeveloperActivity {
    /// By day of week.
    pub weekdays: DimensionCounts,
    /// By hour of day.
    pub hours: DimensionCounts,
    /// By month.
    pub months: DimensionCounts,
    /// By ISO week.
    pub weeks: DimensionCounts,
}

impl Default for DeveloperActivity {
    fn default() -> Self {
        Self {
            weekdays: DimensionCounts::new(Dimension::Weekday),
            hours: DimensionCounts::new(Dimension::Hour),
            months: DimensionCounts::new(Dimension::Month),
            weeks: DimensionCounts::new(Dimension::Week),
        }
    }
}

impl DeveloperActivity {
    /// Counts for `dimension`.
    pub fn dimension(&self, dimension: Dimension) -> &DimensionCounts {
        match dimension {
            Dimension::Weekday => &self.weekdays,
            Dimension::Hour => &self.hours,
            Dimension::Month => &self.months,
            Dimension::Week => &self.weeks,
        }
    }

    fn dimension_mut(&mut self, dimension: Dimension) -> &mut DimensionCounts {
        match dimension {
            Dimension::Weekday => &mut self.weekdays,
            Dimension::Hour => &mut self.hours,
            Dimension::Month => &mut self.months,
            Dimension::Week => &mut self.weeks,
        }
    }
}

/// Per-developer and overall activity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemporalActivity {
    /// Activity keyed by developer id.
    pub developers: BTreeMap<u32, DeveloperActivity>,
    /// Sum over all developers.
    pub totals: DeveloperActivity,
}

/// Bucket `records` by their calendar attributes.
///
/// With a `window`, only records whose tick falls inside it are counted.
/// Bucket indices past the end of a dimension land in its last bucket; a
/// record without a given attribute is skipped for that dimension only.
///
/// # Examples
///
/// ```
/// use strata_core::ContributionRecord;
/// use strata_metrics::activity::temporal_activity;
///
/// let records = vec![
///     ContributionRecord::new(0, 7, 10, 2, 0).with_attribute("weekday", 1).with_attribute("hour", 9),
///     ContributionRecord::new(1, 7, 3, 0, 0).with_attribute("weekday", 1).with_attribute("hour", 23),
/// ];
/// let activity = temporal_activity(&records, None);
/// assert_eq!(activity.developers[&7].weekdays.commits[1], 2);
/// assert_eq!(activity.developers[&7].weekdays.lines[1], 15);
/// assert_eq!(activity.totals.hours.commits[23], 1);
/// ```
pub fn temporal_activity(
    records: &[ContributionRecord],
    window: Option<&RangeInclusive<u32>>,
) -> TemporalActivity {
    let mut activity = TemporalActivity::default();

    for record in records {
        if window.is_some_and(|w| !w.contains(&record.tick)) {
            continue;
        }
        let lines = record.lines_touched();
        let developer = activity.developers.entry(record.entity_id).or_default();

        for dimension in Dimension::ALL {
            let Some(raw) = record.attribute(dimension.key()) else {
                debug!(
                    entity = record.entity_id,
                    tick = record.tick,
                    dimension = dimension.key(),
                    "record has no bucket for dimension"
                );
                continue;
            };
            let bucket = (raw as usize).min(dimension.buckets() - 1);
            developer.dimension_mut(dimension).add(bucket, lines);
            activity.totals.dimension_mut(dimension).add(bucket, lines);
        }
    }

    activity
}

/// Weekday × hour matrix (7 rows, 24 columns) reconstructed from marginals.
///
/// Only the per-dimension totals are recorded, so each developer's joint
/// distribution is approximated as `weekday[d] * hour[h] / hour_total`,
/// i.e. the outer product of the two marginal distributions scaled by the
/// weekday total, truncated to an integer. This assumes weekday and hour
/// are independent. Developers are summed after truncation.
///
/// # Examples
///
/// ```
/// use strata_core::ContributionRecord;
/// use strata_metrics::activity::{temporal_activity, weekday_hour_heatmap, ActivityMetric};
///
/// let records = vec![
///     ContributionRecord::new(0, 1, 5, 0, 0).with_attribute("weekday", 3).with_attribute("hour", 14),
/// ];
/// let heatmap = weekday_hour_heatmap(&temporal_activity(&records, None), ActivityMetric::Commits);
/// assert_eq!(heatmap[3][14], 1);
/// assert_eq!(heatmap.iter().flatten().sum::<u64>(), 1);
/// ```
pub fn weekday_hour_heatmap(activity: &TemporalActivity, metric: ActivityMetric) -> Vec<Vec<u64>> {
    let mut heatmap = vec![vec![0u64; Dimension::Hour.buckets()]; Dimension::Weekday.buckets()];

    for developer in activity.developers.values() {
        let weekdays = developer.weekdays.get(metric);
        let hours = developer.hours.get(metric);
        let weekday_total = saturating_sum(weekdays);
        let hour_total = saturating_sum(hours);
        if weekday_total == 0 || hour_total == 0 {
            continue;
        }

        for (row, &w) in heatmap.iter_mut().zip(weekdays) {
            for (cell, &h) in row.iter_mut().zip(hours) {
                let joint = u128::from(w) * u128::from(h) / u128::from(hour_total);
                *cell = cell.saturating_add(u64::try_from(joint).unwrap_or(u64::MAX));
            }
        }
    }

    heatmap
}

fn saturating_sum(counts: &[u64]) -> u64 {
    counts.iter().fold(0, |acc, &c| acc.saturating_add(c))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(entity: u32, tick: u32, weekday: u32, hour: u32, lines: u64) -> ContributionRecord {
        ContributionRecord::new(tick, entity, lines, 0, 0)
            .with_attribute("weekday", weekday)
            .with_attribute("hour", hour)
            .with_attribute("month", 0)
            .with_attribute("week", 0)
    }

    #[test]
    fn counts_commits_and_lines() {
        let records = vec![record(1, 0, 2, 10, 30), record(1, 1, 2, 11, 5), record(2, 1, 6, 23, 1)];
        let activity = temporal_activity(&records, None);

        let dev = &activity.developers[&1];
        assert_eq!(dev.weekdays.commits[2], 2);
        assert_eq!(dev.weekdays.lines[2], 35);
        assert_eq!(dev.hours.commits[10], 1);
        assert_eq!(activity.totals.weekdays.commits.iter().sum::<u64>(), 3);
        assert_eq!(activity.totals.months.commits[0], 3);
    }

    #[test]
    fn lines_include_removals() {
        let r = ContributionRecord::new(0, 1, 4, 6, 100).with_attribute("weekday", 0);
        let activity = temporal_activity(&[r], None);
        assert_eq!(activity.totals.weekdays.lines[0], 10);
    }

    #[test]
    fn out_of_range_bucket_clamps_to_last() {
        let r = ContributionRecord::new(0, 1, 1, 0, 0)
            .with_attribute("hour", 99)
            .with_attribute("week", 53);
        let activity = temporal_activity(&[r], None);
        assert_eq!(activity.totals.hours.commits[23], 1);
        assert_eq!(activity.totals.weeks.commits[52], 1);
    }

    #[test]
    fn missing_attribute_skips_only_that_dimension() {
        let r = ContributionRecord::new(0, 1, 1, 0, 0).with_attribute("weekday", 4);
        let activity = temporal_activity(&[r], None);
        assert_eq!(activity.totals.weekdays.commits[4], 1);
        assert_eq!(activity.totals.hours.commits.iter().sum::<u64>(), 0);
        assert_eq!(activity.totals.months.commits.iter().sum::<u64>(), 0);
    }

    #[test]
    fn window_filters_by_tick() {
        let records = vec![record(1, 0, 0, 0, 1), record(1, 5, 0, 0, 1), record(1, 9, 0, 0, 1)];
        let activity = temporal_activity(&records, Some(&(4..=9)));
        assert_eq!(activity.totals.weekdays.commits[0], 2);
    }

    #[test]
    fn bucket_lengths() {
        let activity = temporal_activity(&[], None);
        for dimension in Dimension::ALL {
            let counts = activity.totals.dimension(dimension);
            assert_eq!(counts.commits.len(), dimension.buckets());
            assert_eq!(counts.lines.len(), dimension.buckets());
        }
        assert!(activity.developers.is_empty());
    }

    #[test]
    fn heatmap_single_commit() {
        let activity = temporal_activity(&[record(1, 0, 5, 8, 12)], None);
        let heatmap = weekday_hour_heatmap(&activity, ActivityMetric::Commits);
        assert_eq!(heatmap.len(), 7);
        assert!(heatmap.iter().all(|row| row.len() == 24));
        assert_eq!(heatmap[5][8], 1);

        let lines = weekday_hour_heatmap(&activity, ActivityMetric::Lines);
        assert_eq!(lines[5][8], 12);
    }

    #[test]
    fn heatmap_is_outer_product_of_marginals() {
        // Weekdays: 2 on Monday, 2 on Tuesday. Hours: 3 at 9, 1 at 17.
        let records = vec![
            record(1, 0, 1, 9, 1),
            record(1, 1, 1, 9, 1),
            record(1, 2, 2, 9, 1),
            record(1, 3, 2, 17, 1),
        ];
        let heatmap = weekday_hour_heatmap(&temporal_activity(&records, None), ActivityMetric::Commits);
        // 2 * 3 / 4 = 1.5 -> 1; 2 * 1 / 4 = 0.5 -> 0
        assert_eq!(heatmap[1][9], 1);
        assert_eq!(heatmap[2][9], 1);
        assert_eq!(heatmap[1][17], 0);
        assert_eq!(heatmap[2][17], 0);
    }

    #[test]
    fn heatmap_truncates_per_developer() {
        let records = vec![
            record(1, 0, 1, 9, 1),
            record(1, 1, 2, 10, 1),
            record(2, 0, 1, 9, 1),
            record(2, 1, 2, 10, 1),
        ];
        let heatmap = weekday_hour_heatmap(&temporal_activity(&records, None), ActivityMetric::Commits);
        // Each developer contributes 1 * 1 / 2 = 0 per cell.
        assert_eq!(heatmap.iter().flatten().sum::<u64>(), 0);
    }

    #[test]
    fn huge_line_counts_saturate() {
        let huge = ContributionRecord::new(0, 1, u64::MAX, 1, 0)
            .with_attribute("weekday", 2)
            .with_attribute("hour", 3);
        let activity = temporal_activity(&[huge.clone(), huge], None);
        assert_eq!(activity.totals.weekdays.commits[2], 2);
        assert_eq!(activity.totals.weekdays.lines[2], u64::MAX);

        let heatmap = weekday_hour_heatmap(&activity, ActivityMetric::Lines);
        assert_eq!(heatmap[2][3], u64::MAX);
    }

    #[test]
    fn heatmap_skips_developers_without_hours() {
        let r = ContributionRecord::new(0, 1, 1, 0, 0).with_attribute("weekday", 3);
        let heatmap = weekday_hour_heatmap(&temporal_activity(&[r], None), ActivityMetric::Commits);
        assert_eq!(heatmap.iter().flatten().sum::<u64>(), 0);
    }
}
