//! Resampling daily cumulative matrices onto a calendar grid.
//!
//! Values are point-sampled: each boundary takes the cumulative row of the
//! last day on or before it. Averaging a running total over a bucket has no
//! meaning, so nothing here averages.
//!
//! A coarse granularity over a short range yields no boundaries at all. The
//! resampler then retries one step finer along `year -> month -> week` and
//! fails only once week is exhausted. Day never falls back.

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::Serialize;
use strata_core::{Granularity, ResamplePeriod, Result, StrataError};
use tracing::{debug, warn};

use crate::matrix::CumulativeMatrix;

/// A resampled matrix with its period boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resampled {
    /// One row per period.
    pub matrix: CumulativeMatrix,
    /// Boundary and sampled daily slot of every row.
    pub periods: Vec<ResamplePeriod>,
    /// Granularity that produced the result.
    pub granularity: Granularity,
    /// Every granularity tried, starting with the requested one.
    pub attempted: Vec<Granularity>,
}

impl Resampled {
    /// Granularity the caller asked for.
    pub fn requested(&self) -> Granularity {
        self.attempted.first().copied().unwrap_or(self.granularity)
    }

    /// `true` when the result came from a finer granularity than requested.
    pub fn fell_back(&self) -> bool {
        self.granularity != self.requested()
    }
}

/// Calendar-aligned boundaries inside `start..=end`.
///
/// Week boundaries are Mondays, month boundaries the 1st, year boundaries
/// 1 January; day yields every date. Week, month and year yield boundaries
/// only when the range covers at least one whole unit
/// (`end + 1 day >= start + 1 unit`), and then always at least one. `raw`
/// has no calendar grid and yields nothing.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use strata_core::Granularity;
/// use strata_timeline::resample::boundaries;
///
/// let d = |m, d| NaiveDate::from_ymd_opt(2024, m, d).unwrap();
///
/// // 2024-01-03 is a Wednesday.
/// assert_eq!(boundaries(d(1, 3), d(1, 20), Granularity::Week), vec![d(1, 8), d(1, 15)]);
/// assert_eq!(boundaries(d(1, 15), d(4, 2), Granularity::Month), vec![d(2, 1), d(3, 1), d(4, 1)]);
/// assert!(boundaries(d(1, 3), d(1, 20), Granularity::Month).is_empty());
/// ```
pub fn boundaries(start: NaiveDate, end: NaiveDate, granularity: Granularity) -> Vec<NaiveDate> {
    if end < start {
        return Vec::new();
    }

    let (first, step): (Option<NaiveDate>, fn(NaiveDate) -> Option<NaiveDate>) = match granularity {
        Granularity::Raw => return Vec::new(),
        Granularity::Day => (Some(start), next_day),
        Granularity::Week => (first_monday(start), next_week),
        Granularity::Month => (first_of_month(start), next_month),
        Granularity::Year => (first_of_year(start), next_year),
    };

    if granularity != Granularity::Day && !covers_one_unit(start, end, step) {
        return Vec::new();
    }

    let mut out = Vec::new();
    let mut cursor = first;
    while let Some(date) = cursor.filter(|d| *d <= end) {
        out.push(date);
        cursor = step(date);
    }
    out
}

fn covers_one_unit(start: NaiveDate, end: NaiveDate, step: fn(NaiveDate) -> Option<NaiveDate>) -> bool {
    match (next_day(end), step(start)) {
        (Some(after_end), Some(one_unit)) => after_end >= one_unit,
        // `end` is the last representable date.
        (None, _) => true,
        (Some(_), None) => false,
    }
}

fn next_day(date: NaiveDate) -> Option<NaiveDate> {
    date.checked_add_days(Days::new(1))
}

fn next_week(date: NaiveDate) -> Option<NaiveDate> {
    date.checked_add_days(Days::new(7))
}

fn next_month(date: NaiveDate) -> Option<NaiveDate> {
    date.checked_add_months(Months::new(1))
}

fn next_year(date: NaiveDate) -> Option<NaiveDate> {
    date.checked_add_months(Months::new(12))
}

fn first_monday(start: NaiveDate) -> Option<NaiveDate> {
    let ahead = (7 - start.weekday().num_days_from_monday()) % 7;
    start.checked_add_days(Days::new(u64::from(ahead)))
}

fn first_of_month(start: NaiveDate) -> Option<NaiveDate> {
    let this_month = start.with_day(1)?;
    if this_month == start {
        Some(start)
    } else {
        next_month(this_month)
    }
}

fn first_of_year(start: NaiveDate) -> Option<NaiveDate> {
    let this_year = NaiveDate::from_ymd_opt(start.year(), 1, 1)?;
    if this_year == start {
        Some(start)
    } else {
        next_year(this_year)
    }
}

/// Resample `daily` (row `i` = day `start + i`) at `granularity`.
///
/// `raw` returns the matrix unchanged with one period per row. Any other
/// granularity point-samples the row at `min(boundary - start, rows - 1)`.
/// When year or month yields no boundaries the next finer granularity is
/// tried, with a warning for each retry.
///
/// # Errors
///
/// Returns [`StrataError::UnresamplableRange`] when week yields no
/// boundaries (after fallback or when requested directly), or when day is
/// requested over an inverted range.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use strata_core::Granularity;
/// use strata_timeline::matrix::CumulativeMatrix;
/// use strata_timeline::resample::resample;
///
/// let rows: Vec<Vec<u64>> = (0..10).map(|i| vec![i * 10]).collect();
/// let daily = CumulativeMatrix::new(vec!["lines".into()], rows).unwrap();
/// // Wednesday 3 to Friday 12 January 2024.
/// let start = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
/// let end = NaiveDate::from_ymd_opt(2024, 1, 12).unwrap();
///
/// let out = resample(&daily, start, end, Granularity::Year).unwrap();
/// assert_eq!(out.granularity, Granularity::Week);
/// assert_eq!(out.attempted, vec![Granularity::Year, Granularity::Month, Granularity::Week]);
/// // Monday 8 January is day 5.
/// assert_eq!(out.periods[0].slot, 5);
/// assert_eq!(out.matrix.rows(), &[vec![50]]);
/// ```
pub fn resample(
    daily: &CumulativeMatrix,
    start: NaiveDate,
    end: NaiveDate,
    granularity: Granularity,
) -> Result<Resampled> {
    if granularity == Granularity::Raw {
        return Ok(passthrough(daily, start));
    }

    let mut attempted = Vec::new();
    let mut current = granularity;
    loop {
        attempted.push(current);
        let grid = boundaries(start, end, current);
        if !grid.is_empty() {
            debug!(
                granularity = %current,
                periods = grid.len(),
                days = daily.len(),
                "resampled daily matrix"
            );
            return Ok(sample(daily, start, &grid, current, attempted));
        }

        match current.finer() {
            Some(next) => {
                warn!(
                    %start,
                    %end,
                    "no {current} boundaries in range, retrying at {next} granularity"
                );
                current = next;
            }
            None => {
                return Err(StrataError::UnresamplableRange {
                    requested: granularity,
                    attempted,
                    start,
                    end,
                })
            }
        }
    }
}

fn passthrough(daily: &CumulativeMatrix, start: NaiveDate) -> Resampled {
    let periods = (0..daily.len())
        .map_while(|slot| {
            let boundary = start.checked_add_days(Days::new(slot as u64))?;
            Some(ResamplePeriod { boundary, slot })
        })
        .collect();
    Resampled {
        matrix: daily.clone(),
        periods,
        granularity: Granularity::Raw,
        attempted: vec![Granularity::Raw],
    }
}

fn sample(
    daily: &CumulativeMatrix,
    start: NaiveDate,
    grid: &[NaiveDate],
    granularity: Granularity,
    attempted: Vec<Granularity>,
) -> Resampled {
    let last_slot = daily.len().saturating_sub(1);
    let empty_row = vec![0; daily.width()];

    let mut periods = Vec::with_capacity(grid.len());
    let mut rows = Vec::with_capacity(grid.len());
    for &boundary in grid {
        let offset = (boundary - start).num_days();
        let slot = usize::try_from(offset).unwrap_or(0).min(last_slot);
        rows.push(daily.row(slot).map_or_else(|| empty_row.clone(), <[u64]>::to_vec));
        periods.push(ResamplePeriod { boundary, slot });
    }

    Resampled {
        matrix: CumulativeMatrix::from_sampled(daily.categories().to_vec(), rows),
        periods,
        granularity,
        attempted,
    }
}
