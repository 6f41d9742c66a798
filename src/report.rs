//! One-shot analysis of an upstream snapshot.
//!
//! [`analyze`] runs every metric over an [`AnalysisInput`] and collects the
//! results into a [`Report`], the single value handed to the chart renderer.
//! The renderer must display these numbers as they are; nothing downstream
//! re-derives them.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use strata_core::{
    ContributionRecord, Granularity, OwnershipDistribution, ResamplePeriod, Result, RiskFactor,
    StrataConfig, StrataError,
};
use strata_metrics::activity::{temporal_activity, weekday_hour_heatmap, ActivityMetric, TemporalActivity};
use strata_metrics::bus_factor::{bus_factor, rank_subsystems, BusFactorHealth, SubsystemBusFactor};
use strata_metrics::distribution::{concentration, Concentration};
use strata_metrics::knowledge::{knowledge_diffusion, window_ticks, FileEdit, KnowledgeDiffusion};
use strata_metrics::ownership::{
    bus_factor_timeline, concentration_timeline, group_by_subsystem, BusFactorPoint,
    ConcentrationPoint, FileOwnership,
};
use strata_metrics::refactoring::{classify_phases, RefactoringSummary, TickChanges};
use strata_metrics::risk::{rank_risks, top_k, RankedRisk};
use strata_timeline::calendar::{TickCalendar, TimeAxis};
use strata_timeline::matrix::CumulativeMatrix;
use strata_timeline::resample::resample;
use tracing::{debug, info, warn};

/// Everything the upstream history analysis produces for one repository.
///
/// Every collection may be empty; the matching report section is then
/// empty or neutral rather than an error.
///
/// # Examples
///
/// ```
/// use strata::AnalysisInput;
///
/// let input = AnalysisInput::from_json(r#"{
///     "tickDurationNs": 86400000000000,
///     "repoStartEpochS": 1704067200,
///     "ownershipSnapshots": { "0": [10, 5], "7": [10, 20, 5] }
/// }"#).unwrap();
/// assert_eq!(input.ownership_snapshots.len(), 2);
/// assert!(input.calendar().is_some());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisInput {
    /// Per-tick contribution records.
    pub records: Vec<ContributionRecord>,
    /// Column names for the cumulative time series, indexed by entity id.
    pub categories: Vec<String>,
    /// Line ownership per author, keyed by tick.
    pub ownership_snapshots: BTreeMap<u32, OwnershipDistribution>,
    /// Current line ownership per file and author.
    pub file_ownership: Vec<FileOwnership>,
    /// Hotspot inputs per file.
    pub risk_factors: Vec<RiskFactor>,
    /// File edit events for knowledge diffusion.
    pub file_edits: Vec<FileEdit>,
    /// Change and rename counts per tick.
    pub tick_changes: Vec<TickChanges>,
    /// Tick length in nanoseconds; `0` when unknown.
    pub tick_duration_ns: i64,
    /// Repository start as Unix seconds; `0` when unknown.
    pub repo_start_epoch_s: i64,
    /// Repository end as Unix seconds; `0` when unknown.
    pub repo_end_epoch_s: i64,
}

impl AnalysisInput {
    /// Parse a JSON snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::Serialization`] on malformed JSON.
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Load a JSON snapshot from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::FileNotFound`] if `path` does not exist,
    /// [`StrataError::Io`] if it cannot be read and
    /// [`StrataError::Serialization`] on malformed JSON.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(StrataError::FileNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Tick-to-calendar mapping, if the snapshot carries one.
    pub fn calendar(&self) -> Option<TickCalendar> {
        TickCalendar::new(self.tick_duration_ns, self.repo_start_epoch_s)
    }
}

/// Bus factor results.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BusFactorSection {
    /// Ownership share used for every value below.
    pub threshold: f64,
    /// Bus factor of the latest snapshot.
    pub current: usize,
    /// Health band of `current`.
    pub health: BusFactorHealth,
    /// Bus factor per snapshot.
    pub timeline: Vec<BusFactorPoint>,
    /// Per-directory bus factors, worst first.
    pub subsystems: Vec<SubsystemBusFactor>,
}

/// Ownership concentration results.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnershipSection {
    /// Gini and HHI of the latest snapshot.
    pub current: Concentration,
    /// Gini and HHI per snapshot.
    pub timeline: Vec<ConcentrationPoint>,
    /// Gini and HHI per directory.
    pub subsystems: BTreeMap<String, Concentration>,
}

/// Hotspot ranking.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskSection {
    /// Churn window the factors were measured over.
    pub window_days: u32,
    /// Number of files scored.
    pub total_files: usize,
    /// Highest-risk files, at most `top_n`.
    pub ranked: Vec<RankedRisk>,
    /// Paths to annotate on the chart, at most `annotate_top`.
    pub annotated: Vec<String>,
}

/// Knowledge diffusion results.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeSection {
    /// Recent-editor window in months.
    pub window_months: u32,
    /// Per-file statistics, histogram, silos and Lorenz curve.
    #[serde(flatten)]
    pub diffusion: KnowledgeDiffusion,
}

/// Temporal activity results.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySection {
    /// Bucketed counts per developer and overall.
    #[serde(flatten)]
    pub activity: TemporalActivity,
    /// Weekday × hour commit heatmap.
    pub heatmap_commits: Vec<Vec<u64>>,
    /// Weekday × hour line heatmap.
    pub heatmap_lines: Vec<Vec<u64>>,
}

/// Regularized cumulative series.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineSection {
    /// Axis labels, one per matrix row.
    pub axis: TimeAxis,
    /// One row per period.
    pub matrix: CumulativeMatrix,
    /// Boundaries and sampled slots; empty on a tick axis.
    pub periods: Vec<ResamplePeriod>,
    /// Granularity that produced `matrix`.
    pub granularity: Granularity,
    /// Granularities tried, starting with the configured one.
    pub attempted: Vec<Granularity>,
}

/// Every metric for one repository, ready for rendering.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Bus factor.
    pub bus_factor: BusFactorSection,
    /// Ownership concentration.
    pub ownership: OwnershipSection,
    /// Hotspot risk.
    pub risk: RiskSection,
    /// Knowledge diffusion.
    pub knowledge: KnowledgeSection,
    /// Refactoring phases.
    pub refactoring: RefactoringSummary,
    /// Temporal activity.
    pub activity: ActivitySection,
    /// Cumulative series; absent without categories or records.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeline: Option<TimelineSection>,
}

impl Report {
    /// Serialize as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::Serialization`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Run every analysis over `input`.
///
/// # Errors
///
/// Returns [`StrataError::Config`] if `config` is invalid and
/// [`StrataError::InvalidInput`] if the timeline would need more than
/// [`MAX_TIMELINE_ROWS`] rows. A range too short
/// for the configured granularity is not an error here: the series is
/// resampled daily instead.
///
/// # Examples
///
/// ```
/// use strata::{analyze, AnalysisInput, StrataConfig};
///
/// let report = analyze(&AnalysisInput::default(), &StrataConfig::default()).unwrap();
/// assert_eq!(report.bus_factor.current, 0);
/// assert!(report.risk.ranked.is_empty());
/// assert!(report.timeline.is_none());
/// ```
pub fn analyze(input: &AnalysisInput, config: &StrataConfig) -> Result<Report> {
    config.validate()?;
    let calendar = input.calendar();
    if calendar.is_none() {
        debug!("no calendar mapping, time axes use tick indices");
    }

    let bus_factor = bus_factor_section(input, config);
    let ownership = ownership_section(input);
    let risk = risk_section(input, config);

    let window = window_ticks(config.knowledge.window_months, input.tick_duration_ns);
    let knowledge = KnowledgeSection {
        window_months: config.knowledge.window_months,
        diffusion: knowledge_diffusion(&input.file_edits, window, config.knowledge.max_silos),
    };
    debug!(
        files = knowledge.diffusion.files.len(),
        window_ticks = window,
        "knowledge diffusion"
    );

    let refactoring = classify_phases(&input.tick_changes, config.refactoring.threshold);
    debug!(
        ticks = refactoring.ticks.len(),
        regions = refactoring.regions.len(),
        "refactoring phases"
    );

    let activity = temporal_activity(&input.records, None);
    let activity = ActivitySection {
        heatmap_commits: weekday_hour_heatmap(&activity, ActivityMetric::Commits),
        heatmap_lines: weekday_hour_heatmap(&activity, ActivityMetric::Lines),
        activity,
    };

    let timeline = timeline_section(input, calendar.as_ref(), config.timeline.granularity)?;

    info!(
        snapshots = input.ownership_snapshots.len(),
        files = input.risk_factors.len(),
        records = input.records.len(),
        bus_factor = bus_factor.current,
        "assembled report"
    );

    Ok(Report {
        bus_factor,
        ownership,
        risk,
        knowledge,
        refactoring,
        activity,
        timeline,
    })
}

fn latest(input: &AnalysisInput) -> Option<&OwnershipDistribution> {
    input.ownership_snapshots.values().next_back()
}

fn bus_factor_section(input: &AnalysisInput, config: &StrataConfig) -> BusFactorSection {
    let threshold = config.bus_factor.threshold;
    let current = latest(input).map_or(0, |dist| bus_factor(dist.as_slice(), threshold));
    let subsystems = rank_subsystems(&group_by_subsystem(&input.file_ownership), threshold);
    debug!(
        snapshots = input.ownership_snapshots.len(),
        subsystems = subsystems.len(),
        "bus factor"
    );

    BusFactorSection {
        threshold,
        current,
        health: BusFactorHealth::from_bus_factor(current),
        timeline: bus_factor_timeline(&input.ownership_snapshots, threshold),
        subsystems,
    }
}

fn ownership_section(input: &AnalysisInput) -> OwnershipSection {
    let current = latest(input).map_or(
        Concentration {
            gini: 0.0,
            hhi: 0.0,
        },
        |dist| concentration(dist.as_slice()),
    );
    let subsystems = group_by_subsystem(&input.file_ownership)
        .into_iter()
        .map(|(dir, dist)| (dir, concentration(dist.as_slice())))
        .collect();

    OwnershipSection {
        current,
        timeline: concentration_timeline(&input.ownership_snapshots),
        subsystems,
    }
}

fn risk_section(input: &AnalysisInput, config: &StrataConfig) -> RiskSection {
    let ranked = rank_risks(input.risk_factors.clone(), &config.risk.weights);
    let annotated = top_k(&ranked, config.risk.annotate_top)
        .iter()
        .map(|r| r.factor.path.clone())
        .collect();
    debug!(files = ranked.len(), "risk ranking");

    RiskSection {
        window_days: config.risk.window_days,
        total_files: ranked.len(),
        ranked: top_k(&ranked, config.risk.top_n).to_vec(),
        annotated,
    }
}

/// Upper bound on rows in a report's cumulative series, about 2 870 years of
/// days.
pub const MAX_TIMELINE_ROWS: usize = 1 << 20;

fn check_rows(rows: usize, what: &str) -> Result<()> {
    if rows > MAX_TIMELINE_ROWS {
        return Err(StrataError::InvalidInput(format!(
            "{what} spans {rows} rows, more than the limit of {MAX_TIMELINE_ROWS}"
        )));
    }
    Ok(())
}

fn timeline_section(
    input: &AnalysisInput,
    calendar: Option<&TickCalendar>,
    granularity: Granularity,
) -> Result<Option<TimelineSection>> {
    if input.categories.is_empty() || input.records.is_empty() {
        return Ok(None);
    }
    let last_tick = input.records.iter().map(|r| r.tick).max().unwrap_or(0);

    let Some(cal) = calendar else {
        let days = (last_tick as usize).saturating_add(1);
        check_rows(days, &format!("tick axis up to tick {last_tick}"))?;
        let matrix = CumulativeMatrix::from_records(input.categories.clone(), &input.records, None, days);
        return Ok(Some(TimelineSection {
            axis: TimeAxis::Ticks((0..=last_tick).collect()),
            matrix,
            periods: Vec::new(),
            granularity: Granularity::Raw,
            attempted: Vec::new(),
        }));
    };

    let (Some(start), Some(last_record)) = (cal.start_date(), cal.tick_to_date(last_tick)) else {
        warn!(last_tick, "tick dates out of range, skipping timeline");
        return Ok(None);
    };
    let end = chrono::DateTime::from_timestamp(input.repo_end_epoch_s, 0)
        .filter(|_| input.repo_end_epoch_s > 0)
        .map(|dt| dt.date_naive())
        .map_or(last_record, |repo_end| repo_end.max(last_record));
    let days = usize::try_from((end - start).num_days()).unwrap_or(0).saturating_add(1);
    check_rows(days, &format!("timeline {start}..={end}"))?;

    let daily = CumulativeMatrix::from_records(input.categories.clone(), &input.records, Some(cal), days);
    let resampled = match resample(&daily, start, end, granularity) {
        Ok(resampled) => resampled,
        Err(StrataError::UnresamplableRange { attempted, .. }) => {
            warn!(
                %start,
                %end,
                tried = attempted.len(),
                "range too short for {granularity} granularity, resampling daily"
            );
            resample(&daily, start, end, Granularity::Day)?
        }
        Err(err) => return Err(err),
    };

    Ok(Some(TimelineSection {
        axis: TimeAxis::Dates(resampled.periods.iter().map(|p| p.boundary).collect()),
        matrix: resampled.matrix,
        periods: resampled.periods,
        granularity: resampled.granularity,
        attempted: resampled.attempted,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY_NS: i64 = 86_400_000_000_000;
    // 2024-01-01T00:00:00Z
    const START: i64 = 1_704_067_200;

    #[test]
    fn empty_input_gives_neutral_report() {
        let report = analyze(&AnalysisInput::default(), &StrataConfig::default()).unwrap();
        assert_eq!(report.bus_factor.health, BusFactorHealth::Critical);
        assert_eq!(report.ownership.current.gini, 0.0);
        assert!(report.knowledge.diffusion.files.is_empty());
        assert!(report.refactoring.ticks.is_empty());
        assert_eq!(report.activity.heatmap_commits.len(), 7);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = StrataConfig::default();
        config.bus_factor.threshold = 0.0;
        let err = analyze(&AnalysisInput::default(), &config).unwrap_err();
        assert!(matches!(err, StrataError::Config(_)));
    }

    #[test]
    fn latest_snapshot_drives_current_values() {
        let mut input = AnalysisInput::default();
        input
            .ownership_snapshots
            .insert(0, OwnershipDistribution::new(vec![100.0]));
        input
            .ownership_snapshots
            .insert(9, OwnershipDistribution::new(vec![50.0, 30.0, 10.0, 10.0]));

        let report = analyze(&input, &StrataConfig::default()).unwrap();
        assert_eq!(report.bus_factor.current, 3);
        assert_eq!(report.bus_factor.health, BusFactorHealth::Low);
        assert_eq!(report.bus_factor.timeline.len(), 2);
        assert!((report.ownership.current.hhi - 0.36).abs() < 1e-12);
    }

    #[test]
    fn risk_is_truncated_to_config() {
        let mut input = AnalysisInput::default();
        input.risk_factors = (1..=30)
            .map(|i| RiskFactor {
                path: format!("src/f{i:02}.rs"),
                size: i * 10,
                churn: i,
                coupling_degree: i,
                ownership_gini: 0.5,
            })
            .collect();

        let report = analyze(&input, &StrataConfig::default()).unwrap();
        assert_eq!(report.risk.total_files, 30);
        assert_eq!(report.risk.ranked.len(), 20);
        assert_eq!(report.risk.annotated.len(), 5);
        assert_eq!(report.risk.annotated[0], "src/f30.rs");
    }

    #[test]
    fn timeline_without_calendar_uses_ticks() {
        let mut input = AnalysisInput::default();
        input.categories = vec!["rust".into()];
        input.records = vec![
            ContributionRecord::new(0, 0, 10, 0, 0),
            ContributionRecord::new(3, 0, 5, 0, 0),
        ];

        let report = analyze(&input, &StrataConfig::default()).unwrap();
        let timeline = report.timeline.unwrap();
        assert_eq!(timeline.axis, TimeAxis::Ticks(vec![0, 1, 2, 3]));
        assert_eq!(timeline.granularity, Granularity::Raw);
        assert_eq!(timeline.matrix.column(0).collect::<Vec<_>>(), vec![10, 10, 10, 15]);
    }

    #[test]
    fn short_range_falls_back_to_daily() {
        let mut input = AnalysisInput {
            tick_duration_ns: DAY_NS,
            repo_start_epoch_s: START,
            categories: vec!["rust".into()],
            ..AnalysisInput::default()
        };
        input.records = vec![
            ContributionRecord::new(0, 0, 10, 0, 0),
            ContributionRecord::new(2, 0, 5, 0, 0),
        ];

        let report = analyze(&input, &StrataConfig::default()).unwrap();
        let timeline = report.timeline.unwrap();
        assert_eq!(timeline.granularity, Granularity::Day);
        assert_eq!(timeline.periods.len(), 3);
        assert_eq!(timeline.matrix.column(0).collect::<Vec<_>>(), vec![10, 10, 15]);
    }

    #[test]
    fn runaway_tick_is_rejected() {
        let input = AnalysisInput {
            categories: vec!["rust".into()],
            records: vec![
                ContributionRecord::new(0, 0, 10, 0, 0),
                ContributionRecord::new(4_000_000_000, 0, 1, 0, 0),
            ],
            ..AnalysisInput::default()
        };
        let err = analyze(&input, &StrataConfig::default()).unwrap_err();
        assert!(matches!(err, StrataError::InvalidInput(_)));
        assert!(err.to_string().contains("4000000000"));
    }

    #[test]
    fn far_future_repo_end_is_rejected() {
        let input = AnalysisInput {
            tick_duration_ns: DAY_NS,
            repo_start_epoch_s: START,
            // 9999-12-31
            repo_end_epoch_s: 253_402_214_400,
            categories: vec!["rust".into()],
            records: vec![ContributionRecord::new(0, 0, 10, 0, 0)],
            ..AnalysisInput::default()
        };
        let err = analyze(&input, &StrataConfig::default()).unwrap_err();
        assert!(matches!(err, StrataError::InvalidInput(_)));
    }

    #[test]
    fn repo_end_extends_the_range() {
        let input = AnalysisInput {
            tick_duration_ns: DAY_NS,
            repo_start_epoch_s: START,
            // 2024-03-15
            repo_end_epoch_s: START + 74 * 86_400,
            categories: vec!["rust".into()],
            records: vec![ContributionRecord::new(0, 0, 10, 0, 0)],
            ..AnalysisInput::default()
        };

        let report = analyze(&input, &StrataConfig::default()).unwrap();
        let timeline = report.timeline.unwrap();
        assert_eq!(timeline.granularity, Granularity::Month);
        assert_eq!(timeline.periods.len(), 3);
        assert_eq!(timeline.axis.len(), 3);
    }
}
