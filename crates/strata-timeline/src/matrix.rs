//! Dense daily cumulative matrices.
//!
//! Upstream data is sparse and may carry net deletions. Every constructor
//! here produces a dense matrix (one row per day, one column per category)
//! of non-negative totals: missing days inherit the previous day, and
//! negative totals are clamped to zero.

use std::collections::BTreeMap;

use serde::Serialize;
use strata_core::{ContributionRecord, Result, StrataError};
use tracing::warn;

use crate::calendar::TickCalendar;

/// Cumulative counts indexed `[day][category]`.
///
/// Row `i` is day `i` counted from the series start.
///
/// # Examples
///
/// ```
/// use strata_timeline::matrix::CumulativeMatrix;
///
/// let m = CumulativeMatrix::forward_fill(
///     vec!["rust".into(), "go".into()],
///     &[Some(vec![10, 0]), None, Some(vec![12, -3]), None],
/// )
/// .unwrap();
/// assert_eq!(m.rows(), &[vec![10, 0], vec![10, 0], vec![12, 0], vec![12, 0]]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CumulativeMatrix {
    categories: Vec<String>,
    rows: Vec<Vec<u64>>,
}

impl CumulativeMatrix {
    /// Wrap already-cumulative rows, rejecting rows whose width differs from
    /// the number of categories.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::InvalidInput`] on a ragged row.
    pub fn new(categories: Vec<String>, rows: Vec<Vec<u64>>) -> Result<Self> {
        if let Some((day, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != categories.len())
        {
            return Err(ragged(day, row.len(), categories.len()));
        }
        Ok(Self { categories, rows })
    }

    /// Densify sparse cumulative observations.
    ///
    /// `observations[i]` is the cumulative total on day `i`, or `None` when
    /// nothing was recorded that day. Missing days inherit the previous
    /// day's row; days before the first observation are zero. Negative
    /// totals are clamped to zero.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::InvalidInput`] if an observed row's width
    /// differs from the number of categories.
    pub fn forward_fill(categories: Vec<String>, observations: &[Option<Vec<i64>>]) -> Result<Self> {
        let width = categories.len();
        let mut rows = Vec::with_capacity(observations.len());
        let mut current = vec![0u64; width];

        for (day, observation) in observations.iter().enumerate() {
            if let Some(values) = observation {
                if values.len() != width {
                    return Err(ragged(day, values.len(), width));
                }
                current = values.iter().map(|&v| clamp(v)).collect();
            }
            rows.push(current.clone());
        }

        Ok(Self { categories, rows })
    }

    /// Accumulate per-day deltas into `days` rows of running totals.
    ///
    /// The running total of each category is clamped at zero after every
    /// day, so a net deletion can never drive it negative. Deltas keyed at
    /// or beyond `days` are dropped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::InvalidInput`] if a delta row's width differs
    /// from the number of categories.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::collections::BTreeMap;
    /// use strata_timeline::matrix::CumulativeMatrix;
    ///
    /// let mut deltas = BTreeMap::new();
    /// deltas.insert(0, vec![5]);
    /// deltas.insert(2, vec![-8]);
    /// deltas.insert(3, vec![4]);
    /// let m = CumulativeMatrix::from_daily_deltas(vec!["lines".into()], 5, &deltas).unwrap();
    /// let column: Vec<u64> = m.column(0).collect();
    /// assert_eq!(column, vec![5, 5, 0, 4, 4]);
    /// ```
    pub fn from_daily_deltas(
        categories: Vec<String>,
        days: usize,
        deltas: &BTreeMap<usize, Vec<i64>>,
    ) -> Result<Self> {
        let width = categories.len();
        for (&day, delta) in deltas {
            if delta.len() != width {
                return Err(ragged(day, delta.len(), width));
            }
        }

        if let Some((&day, _)) = deltas.range(days..).next() {
            warn!(
                first_dropped_day = day,
                days, "deltas past the end of the series are ignored"
            );
        }

        Ok(Self::accumulate(categories, days, deltas))
    }

    fn accumulate(categories: Vec<String>, days: usize, deltas: &BTreeMap<usize, Vec<i64>>) -> Self {
        let mut rows = Vec::with_capacity(days);
        let mut totals = vec![0i64; categories.len()];
        for day in 0..days {
            if let Some(delta) = deltas.get(&day) {
                for (total, d) in totals.iter_mut().zip(delta) {
                    *total = total.saturating_add(*d).max(0);
                }
            }
            rows.push(totals.iter().map(|&v| clamp(v)).collect());
        }
        Self { categories, rows }
    }

    /// Build a matrix from contribution records, one column per entity.
    ///
    /// `categories[entity_id]` names each column. A record contributes its
    /// net delta (`added - removed`) on the day its tick falls on: the
    /// calendar's day offset when a mapping exists, the tick index itself
    /// otherwise. Records for unknown entities, or whose tick has no calendar
    /// date, are skipped with a warning.
    ///
    /// # Examples
    ///
    /// ```
    /// use strata_core::ContributionRecord;
    /// use strata_timeline::matrix::CumulativeMatrix;
    ///
    /// let records = vec![
    ///     ContributionRecord::new(0, 0, 100, 0, 0),
    ///     ContributionRecord::new(2, 1, 30, 0, 0),
    ///     ContributionRecord::new(3, 0, 0, 40, 0),
    /// ];
    /// let m = CumulativeMatrix::from_records(vec!["rust".into(), "go".into()], &records, None, 4);
    /// assert_eq!(m.rows(), &[vec![100, 0], vec![100, 0], vec![100, 30], vec![60, 30]]);
    /// ```
    pub fn from_records(
        categories: Vec<String>,
        records: &[ContributionRecord],
        calendar: Option<&TickCalendar>,
        days: usize,
    ) -> Self {
        let width = categories.len();
        let mut deltas: BTreeMap<usize, Vec<i64>> = BTreeMap::new();
        let mut unknown = 0usize;
        let mut undated = 0usize;

        for record in records {
            let column = record.entity_id as usize;
            if column >= width {
                unknown += 1;
                continue;
            }
            let day = match calendar {
                Some(cal) => match cal.day_offset(record.tick) {
                    Some(day) => day,
                    None => {
                        undated += 1;
                        continue;
                    }
                },
                None => record.tick as usize,
            };
            let row = deltas.entry(day).or_insert_with(|| vec![0; width]);
            row[column] = row[column].saturating_add(record.net_delta());
        }

        if unknown > 0 {
            warn!(
                records = unknown,
                categories = width,
                "records reference entities without a category"
            );
        }

        if undated > 0 {
            warn!(
                records = undated,
                "records with ticks outside the calendar range are ignored"
            );
        }

        if let Some((&day, _)) = deltas.range(days..).next() {
            warn!(
                first_dropped_day = day,
                days, "records past the end of the series are ignored"
            );
        }
        Self::accumulate(categories, days, &deltas)
    }

    /// Column names.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// All rows, oldest first.
    pub fn rows(&self) -> &[Vec<u64>] {
        &self.rows
    }

    /// Row for `day`, if present.
    pub fn row(&self, day: usize) -> Option<&[u64]> {
        self.rows.get(day).map(Vec::as_slice)
    }

    /// Values of one category over time.
    pub fn column(&self, category: usize) -> impl Iterator<Item = u64> + '_ {
        self.rows
            .iter()
            .filter_map(move |row| row.get(category).copied())
    }

    /// Number of rows (days).
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// `true` when there are no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of categories.
    pub fn width(&self) -> usize {
        self.categories.len()
    }

    /// `true` when every category is non-decreasing over time.
    pub fn is_monotonic(&self) -> bool {
        self.rows
            .windows(2)
            .all(|pair| pair[0].iter().zip(&pair[1]).all(|(a, b)| a <= b))
    }

    /// Consume the matrix into its parts.
    pub fn into_parts(self) -> (Vec<String>, Vec<Vec<u64>>) {
        (self.categories, self.rows)
    }

    pub(crate) fn from_sampled(categories: Vec<String>, rows: Vec<Vec<u64>>) -> Self {
        Self { categories, rows }
    }
}

fn clamp(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

fn ragged(day: usize, got: usize, expected: usize) -> StrataError {
    StrataError::InvalidInput(format!(
        "row {day} has {got} values, expected {expected} (one per category)"
    ))
}
