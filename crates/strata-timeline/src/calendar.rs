//! Tick-to-calendar mapping.
//!
//! Upstream analyses bucket commits into fixed-length ticks counted from the
//! repository start. Mapping a tick back to a date needs both the tick
//! duration and the start timestamp; when either is unknown the mapping is
//! unavailable and callers label axes with raw tick indices instead.
//!
//! All arithmetic is exact integer nanoseconds in UTC.

use std::ops::RangeInclusive;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

const NANOS_PER_SEC: i128 = 1_000_000_000;
const NANOS_PER_DAY: i128 = 86_400 * NANOS_PER_SEC;

/// Calendar date of `tick`.
///
/// Returns `None` when `tick_duration_ns <= 0` or `repo_start_epoch_s <= 0`
/// (no mapping available) or when the result is outside chrono's range.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use strata_timeline::calendar::tick_to_date;
///
/// const DAY_NS: i64 = 86_400_000_000_000;
/// // 2024-01-01T00:00:00Z
/// let start = 1_704_067_200;
/// assert_eq!(tick_to_date(0, DAY_NS, start), NaiveDate::from_ymd_opt(2024, 1, 1));
/// assert_eq!(tick_to_date(31, DAY_NS, start), NaiveDate::from_ymd_opt(2024, 2, 1));
/// assert_eq!(tick_to_date(5, 0, start), None);
/// assert_eq!(tick_to_date(5, DAY_NS, 0), None);
/// ```
pub fn tick_to_date(tick: u32, tick_duration_ns: i64, repo_start_epoch_s: i64) -> Option<NaiveDate> {
    TickCalendar::new(tick_duration_ns, repo_start_epoch_s)?.tick_to_date(tick)
}

/// A validated tick-to-calendar mapping.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use strata_timeline::calendar::TickCalendar;
///
/// const HOUR_NS: i64 = 3_600_000_000_000;
/// let calendar = TickCalendar::new(HOUR_NS * 12, 1_704_067_200).unwrap();
/// assert_eq!(calendar.day_offset(3), Some(1));
/// assert_eq!(calendar.tick_to_date(4), NaiveDate::from_ymd_opt(2024, 1, 3));
/// assert!(TickCalendar::new(-1, 1_704_067_200).is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickCalendar {
    tick_duration_ns: i64,
    repo_start_epoch_s: i64,
}

impl TickCalendar {
    /// Build a mapping, or `None` if either parameter is non-positive.
    pub fn new(tick_duration_ns: i64, repo_start_epoch_s: i64) -> Option<Self> {
        if tick_duration_ns <= 0 || repo_start_epoch_s <= 0 {
            return None;
        }
        Some(Self {
            tick_duration_ns,
            repo_start_epoch_s,
        })
    }

    /// Tick length in nanoseconds.
    pub fn tick_duration_ns(&self) -> i64 {
        self.tick_duration_ns
    }

    /// Repository start as Unix seconds.
    pub fn repo_start_epoch_s(&self) -> i64 {
        self.repo_start_epoch_s
    }

    fn start_ns(&self) -> i128 {
        i128::from(self.repo_start_epoch_s) * NANOS_PER_SEC
    }

    fn tick_ns(&self, tick: u32) -> i128 {
        self.start_ns() + i128::from(tick) * i128::from(self.tick_duration_ns)
    }

    /// Instant at which `tick` begins.
    pub fn tick_to_datetime(&self, tick: u32) -> Option<DateTime<Utc>> {
        from_nanos(self.tick_ns(tick))
    }

    /// UTC date on which `tick` begins.
    pub fn tick_to_date(&self, tick: u32) -> Option<NaiveDate> {
        self.tick_to_datetime(tick).map(|dt| dt.date_naive())
    }

    /// UTC date of the repository start.
    pub fn start_date(&self) -> Option<NaiveDate> {
        from_nanos(self.start_ns()).map(|dt| dt.date_naive())
    }

    /// Number of calendar days between the start date and the date of `tick`.
    ///
    /// This is the row index of `tick` in a daily matrix that begins on the
    /// start date.
    pub fn day_offset(&self, tick: u32) -> Option<usize> {
        let days = (self.tick_to_date(tick)? - self.start_date()?).num_days();
        usize::try_from(days).ok()
    }

    /// Ticks whose start falls on a date in `from..=to`.
    ///
    /// Returns `None` when no tick does (an empty or inverted window, or a
    /// window entirely before the repository start).
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use strata_timeline::calendar::TickCalendar;
    ///
    /// const DAY_NS: i64 = 86_400_000_000_000;
    /// let calendar = TickCalendar::new(DAY_NS, 1_704_067_200).unwrap();
    /// let from = NaiveDate::from_ymd_opt(2024, 1, 11).unwrap();
    /// let to = NaiveDate::from_ymd_opt(2024, 1, 20).unwrap();
    /// assert_eq!(calendar.tick_range(from, to), Some(10..=19));
    /// assert_eq!(calendar.tick_range(to, from), None);
    /// ```
    pub fn tick_range(&self, from: NaiveDate, to: NaiveDate) -> Option<RangeInclusive<u32>> {
        if to < from {
            return None;
        }
        let duration = i128::from(self.tick_duration_ns);
        let from_ns = midnight_nanos(from) - self.start_ns();
        let to_end_ns = midnight_nanos(to) + NANOS_PER_DAY - 1 - self.start_ns();
        if to_end_ns < 0 {
            return None;
        }

        // First tick starting at or after `from`, last one starting before
        // the end of `to`.
        let first = (-(-from_ns).div_euclid(duration)).max(0);
        let last = to_end_ns.div_euclid(duration);
        if first > last {
            return None;
        }
        let first = u32::try_from(first).ok()?;
        let last = u32::try_from(last).unwrap_or(u32::MAX);
        Some(first..=last)
    }
}

fn from_nanos(ns: i128) -> Option<DateTime<Utc>> {
    let secs = i64::try_from(ns.div_euclid(NANOS_PER_SEC)).ok()?;
    let nanos = u32::try_from(ns.rem_euclid(NANOS_PER_SEC)).ok()?;
    DateTime::from_timestamp(secs, nanos)
}

fn midnight_nanos(date: NaiveDate) -> i128 {
    i128::from(date.and_time(NaiveTime::MIN).and_utc().timestamp()) * NANOS_PER_SEC
}

/// How a chart labels its time axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "values")]
pub enum TimeAxis {
    /// Calendar dates, one per tick.
    Dates(Vec<NaiveDate>),
    /// Raw tick indices, when no calendar mapping is available.
    Ticks(Vec<u32>),
}

impl TimeAxis {
    /// Label `ticks` with dates when `calendar` is present and every tick
    /// maps, with raw indices otherwise.
    ///
    /// # Examples
    ///
    /// ```
    /// use strata_timeline::calendar::{TickCalendar, TimeAxis};
    ///
    /// assert_eq!(TimeAxis::for_ticks(&[0, 1], None), TimeAxis::Ticks(vec![0, 1]));
    ///
    /// let calendar = TickCalendar::new(86_400_000_000_000, 1_704_067_200);
    /// assert!(matches!(TimeAxis::for_ticks(&[0, 1], calendar.as_ref()), TimeAxis::Dates(_)));
    /// ```
    pub fn for_ticks(ticks: &[u32], calendar: Option<&TickCalendar>) -> Self {
        let dates = calendar.and_then(|cal| {
            ticks
                .iter()
                .map(|&t| cal.tick_to_date(t))
                .collect::<Option<Vec<_>>>()
        });
        match dates {
            Some(dates) => TimeAxis::Dates(dates),
            None => TimeAxis::Ticks(ticks.to_vec()),
        }
    }

    /// Number of labels.
    pub fn len(&self) -> usize {
        match self {
            TimeAxis::Dates(d) => d.len(),
            TimeAxis::Ticks(t) => t.len(),
        }
    }

    /// `true` when there are no labels.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY_NS: i64 = 86_400_000_000_000;
    const HOUR_NS: i64 = 3_600_000_000_000;
    // 2024-01-01T00:00:00Z
    const START: i64 = 1_704_067_200;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn daily_ticks_advance_one_day() {
        for tick in [0u32, 1, 59, 365, 3650] {
            let expected = date(2024, 1, 1) + chrono::Duration::days(i64::from(tick));
            assert_eq!(tick_to_date(tick, DAY_NS, START), Some(expected));
        }
    }

    #[test]
    fn sub_day_ticks_share_dates() {
        let cal = TickCalendar::new(HOUR_NS, START).unwrap();
        assert_eq!(cal.tick_to_date(23), Some(date(2024, 1, 1)));
        assert_eq!(cal.tick_to_date(24), Some(date(2024, 1, 2)));
        assert_eq!(cal.day_offset(47), Some(1));
        assert_eq!(cal.day_offset(48), Some(2));
    }

    #[test]
    fn start_mid_day_uses_utc_date() {
        // 2024-01-01T20:00:00Z, daily ticks: tick 0 on Jan 1, tick 1 on Jan 2.
        let cal = TickCalendar::new(DAY_NS, START + 20 * 3600).unwrap();
        assert_eq!(cal.start_date(), Some(date(2024, 1, 1)));
        assert_eq!(cal.tick_to_date(1), Some(date(2024, 1, 2)));
        let dt = cal.tick_to_datetime(1).unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-01-02T20:00:00+00:00");
    }

    #[test]
    fn degraded_mode() {
        assert!(TickCalendar::new(0, START).is_none());
        assert!(TickCalendar::new(DAY_NS, -1).is_none());
        assert_eq!(tick_to_date(0, -DAY_NS, START), None);
    }

    #[test]
    fn huge_tick_saturates_to_none_instead_of_panicking() {
        let cal = TickCalendar::new(i64::MAX, START).unwrap();
        assert_eq!(cal.tick_to_date(u32::MAX), None);
    }

    #[test]
    fn tick_range_with_sub_day_ticks() {
        let cal = TickCalendar::new(HOUR_NS * 6, START).unwrap();
        // Jan 2 holds ticks 4..=7.
        assert_eq!(cal.tick_range(date(2024, 1, 2), date(2024, 1, 2)), Some(4..=7));
    }

    #[test]
    fn tick_range_clamps_before_start() {
        let cal = TickCalendar::new(DAY_NS, START).unwrap();
        assert_eq!(cal.tick_range(date(2023, 12, 1), date(2024, 1, 3)), Some(0..=2));
        assert_eq!(cal.tick_range(date(2023, 1, 1), date(2023, 2, 1)), None);
    }

    #[test]
    fn tick_range_with_multi_day_ticks() {
        let cal = TickCalendar::new(DAY_NS * 7, START).unwrap();
        // Ticks start on Jan 1, 8, 15, ...; none starts on Jan 2..=Jan 7.
        assert_eq!(cal.tick_range(date(2024, 1, 2), date(2024, 1, 7)), None);
        assert_eq!(cal.tick_range(date(2024, 1, 2), date(2024, 1, 8)), Some(1..=1));
    }

    #[test]
    fn time_axis_falls_back_to_ticks() {
        let axis = TimeAxis::for_ticks(&[3, 4], None);
        assert_eq!(axis, TimeAxis::Ticks(vec![3, 4]));
        assert_eq!(axis.len(), 2);

        let cal = TickCalendar::new(DAY_NS, START).unwrap();
        let axis = TimeAxis::for_ticks(&[3, 4], Some(&cal));
        assert_eq!(axis, TimeAxis::Dates(vec![date(2024, 1, 4), date(2024, 1, 5)]));
    }

    #[test]
    fn time_axis_serializes_tagged() {
        let json = serde_json::to_string(&TimeAxis::Ticks(vec![1])).unwrap();
        assert_eq!(json, r#"{"kind":"ticks","values":[1]}"#);
    }
}
