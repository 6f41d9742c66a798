//! Refactoring vs feature phase detection from rename rates.

use serde::{Deserialize, Serialize};

/// File change counts for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickChanges {
    /// Tick index.
    pub tick: u32,
    /// Additions, modifications, deletions and renames.
    pub total_changes: u64,
    /// Changes that moved a file to a new path.
    pub renames: u64,
}

impl TickChanges {
    /// `renames / total_changes`, capped at `1.0`; `0.0` for a tick with no
    /// changes.
    ///
    /// # Examples
    ///
    /// ```
    /// use strata_metrics::refactoring::TickChanges;
    ///
    /// let t = TickChanges { tick: 0, total_changes: 8, renames: 2 };
    /// assert_eq!(t.rename_rate(), 0.25);
    /// assert_eq!(TickChanges { tick: 1, total_changes: 0, renames: 0 }.rename_rate(), 0.0);
    /// ```
    pub fn rename_rate(&self) -> f64 {
        if self.total_changes == 0 {
            return 0.0;
        }
        (self.renames as f64 / self.total_changes as f64).min(1.0)
    }
}

/// Development phase of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Rename rate at or above the threshold.
    Refactoring,
    /// Everything else.
    Feature,
}

/// One classified tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickPhase {
    /// Tick index.
    pub tick: u32,
    /// Rename rate.
    pub rate: f64,
    /// Total changes, for context.
    pub total_changes: u64,
    /// Classification.
    pub phase: Phase,
}

/// An inclusive run of refactoring ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickSpan {
    /// First tick of the run.
    pub start: u32,
    /// Last tick of the run.
    pub end: u32,
}

/// Phase classification with summary statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefactoringSummary {
    /// Threshold used for classification.
    pub threshold: f64,
    /// Classified ticks, ascending.
    pub ticks: Vec<TickPhase>,
    /// Number of refactoring ticks.
    pub refactoring_ticks: usize,
    /// Number of feature ticks.
    pub feature_ticks: usize,
    /// Mean rename rate.
    pub mean_rate: f64,
    /// Highest rename rate.
    pub max_rate: f64,
    /// Longest run of consecutive refactoring ticks.
    pub longest_refactoring_streak: usize,
    /// Longest run of consecutive feature ticks.
    pub longest_feature_streak: usize,
    /// Refactoring runs.
    pub regions: Vec<TickSpan>,
}

/// Classify every tick and summarize the phases.
///
/// Ticks are processed in ascending order; streaks and regions run over
/// consecutive entries of the input, so ticks with no recorded changes do
/// not break a run.
///
/// # Examples
///
/// ```
/// use strata_metrics::refactoring::{classify_phases, TickChanges};
///
/// let changes = vec![
///     TickChanges { tick: 0, total_changes: 10, renames: 0 },
///     TickChanges { tick: 1, total_changes: 10, renames: 5 },
///     TickChanges { tick: 2, total_changes: 4, renames: 2 },
///     TickChanges { tick: 3, total_changes: 10, renames: 1 },
/// ];
/// let summary = classify_phases(&changes, 0.3);
/// assert_eq!(summary.refactoring_ticks, 2);
/// assert_eq!(summary.longest_refactoring_streak, 2);
/// assert_eq!(summary.regions.len(), 1);
/// assert_eq!((summary.regions[0].start, summary.regions[0].end), (1, 2));
/// ```
pub fn classify_phases(changes: &[TickChanges], threshold: f64) -> RefactoringSummary {
    let mut sorted = changes.to_vec();
    sorted.sort_by_key(|c| c.tick);

    let ticks: Vec<TickPhase> = sorted
        .iter()
        .map(|c| {
            let rate = c.rename_rate();
            TickPhase {
                tick: c.tick,
                rate,
                total_changes: c.total_changes,
                phase: if rate >= threshold {
                    Phase::Refactoring
                } else {
                    Phase::Feature
                },
            }
        })
        .collect();

    let mut summary = RefactoringSummary {
        threshold,
        ticks: Vec::new(),
        refactoring_ticks: 0,
        feature_ticks: 0,
        mean_rate: 0.0,
        max_rate: 0.0,
        longest_refactoring_streak: 0,
        longest_feature_streak: 0,
        regions: Vec::new(),
    };

    let mut refactoring_run = 0usize;
    let mut feature_run = 0usize;
    let mut open_region: Option<TickSpan> = None;

    for t in &ticks {
        summary.max_rate = summary.max_rate.max(t.rate);
        match t.phase {
            Phase::Refactoring => {
                summary.refactoring_ticks += 1;
                refactoring_run += 1;
                feature_run = 0;
                summary.longest_refactoring_streak =
                    summary.longest_refactoring_streak.max(refactoring_run);
                open_region = Some(match open_region {
                    Some(span) => TickSpan { end: t.tick, ..span },
                    None => TickSpan {
                        start: t.tick,
                        end: t.tick,
                    },
                });
            }
            Phase::Feature => {
                summary.feature_ticks += 1;
                feature_run += 1;
                refactoring_run = 0;
                summary.longest_feature_streak = summary.longest_feature_streak.max(feature_run);
                if let Some(span) = open_region.take() {
                    summary.regions.push(span);
                }
            }
        }
    }
    if let Some(span) = open_region {
        summary.regions.push(span);
    }

    if !ticks.is_empty() {
        summary.mean_rate = ticks.iter().map(|t| t.rate).sum::<f64>() / ticks.len() as f64;
    }
    summary.ticks = ticks;
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    fn changes(rates: &[(u64, u64)]) -> Vec<TickChanges> {
        rates
            .iter()
            .enumerate()
            .map(|(i, &(total, renames))| TickChanges {
                tick: i as u32,
                total_changes: total,
                renames,
            })
            .collect()
    }

    #[test]
    fn threshold_is_inclusive() {
        let summary = classify_phases(&changes(&[(10, 3), (10, 2)]), 0.3);
        assert_eq!(summary.ticks[0].phase, Phase::Refactoring);
        assert_eq!(summary.ticks[1].phase, Phase::Feature);
    }

    #[test]
    fn empty_ticks_are_feature() {
        let summary = classify_phases(&changes(&[(0, 0)]), 0.3);
        assert_eq!(summary.ticks[0].rate, 0.0);
        assert_eq!(summary.ticks[0].phase, Phase::Feature);
    }

    #[test]
    fn streaks_and_counts_agree() {
        // R R F F F R F R R R
        let input = changes(&[
            (10, 5),
            (10, 9),
            (10, 0),
            (10, 1),
            (10, 0),
            (2, 2),
            (10, 0),
            (4, 4),
            (4, 3),
            (4, 2),
        ]);
        let summary = classify_phases(&input, 0.3);

        assert_eq!(summary.refactoring_ticks, 6);
        assert_eq!(summary.feature_ticks, 4);
        assert_eq!(summary.refactoring_ticks + summary.feature_ticks, input.len());
        assert_eq!(summary.longest_refactoring_streak, 3);
        assert_eq!(summary.longest_feature_streak, 3);
        assert_eq!(
            summary.regions,
            vec![
                TickSpan { start: 0, end: 1 },
                TickSpan { start: 5, end: 5 },
                TickSpan { start: 7, end: 9 },
            ]
        );
        let region_ticks: u32 = summary.regions.iter().map(|r| r.end - r.start + 1).sum();
        assert_eq!(region_ticks as usize, summary.refactoring_ticks);
    }

    #[test]
    fn unsorted_input_is_ordered_by_tick() {
        let input = vec![
            TickChanges {
                tick: 9,
                total_changes: 1,
                renames: 1,
            },
            TickChanges {
                tick: 2,
                total_changes: 1,
                renames: 0,
            },
        ];
        let summary = classify_phases(&input, 0.3);
        let ticks: Vec<u32> = summary.ticks.iter().map(|t| t.tick).collect();
        assert_eq!(ticks, vec![2, 9]);
        assert_eq!(summary.regions, vec![TickSpan { start: 9, end: 9 }]);
    }

    #[test]
    fn rate_statistics() {
        let summary = classify_phases(&changes(&[(4, 1), (4, 3), (0, 0)]), 0.3);
        assert_eq!(summary.max_rate, 0.75);
        assert!((summary.mean_rate - (0.25 + 0.75) / 3.0).abs() < 1e-12);
    }

    #[test]
    fn renames_above_total_are_capped() {
        let t = TickChanges {
            tick: 0,
            total_changes: 2,
            renames: 5,
        };
        assert_eq!(t.rename_rate(), 1.0);
    }

    #[test]
    fn empty_input() {
        let summary = classify_phases(&[], 0.3);
        assert!(summary.ticks.is_empty());
        assert!(summary.regions.is_empty());
        assert_eq!(summary.mean_rate, 0.0);
        assert_eq!(summary.longest_feature_streak, 0);
    }
}
