//! Calendar month periods.
//!
//! Reports are always asked for a `(month, year)` pair. Timestamps are stored
//! in UTC, so turning a period into a query range needs the timezone the
//! user's calendar lives in.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::{EngineError, ResultEngine};

const MIN_YEAR: i32 = 1970;
/// The last month's upper bound must still format with a four digit year.
const MAX_YEAR: i32 = 9998;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> ResultEngine<Self> {
        if !(1..=12).contains(&month) {
            return Err(EngineError::InvalidPeriod(format!(
                "month must be between 1 and 12, got {month}"
            )));
        }
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(EngineError::InvalidPeriod(format!(
                "year must be between {MIN_YEAR} and {MAX_YEAR}, got {year}"
            )));
        }
        Ok(Self { year, month })
    }

    /// The period containing `instant` as seen from `tz`.
    pub fn containing(instant: DateTime<Utc>, tz: Tz) -> Self {
        let local = instant.with_timezone(&tz);
        Self {
            year: local.year(),
            month: local.month(),
        }
    }

    pub fn year(self) -> i32 {
        self.year
    }

    pub fn month(self) -> u32 {
        self.month
    }

    pub fn prev(self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    pub fn next(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// `len` consecutive periods ending at `self` (inclusive), oldest first.
    pub fn window(self, len: usize) -> Vec<Period> {
        let mut periods = Vec::with_capacity(len);
        let mut current = self;
        for _ in 0..len {
            periods.push(current);
            current = current.prev();
        }
        periods.reverse();
        periods
    }

    pub fn first_day(self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// UTC instant of local midnight on the first day of the period.
    pub fn start_utc(self, tz: Tz) -> DateTime<Utc> {
        let midnight = self.first_day().and_hms_opt(0, 0, 0).unwrap_or_default();
        // DST gaps at midnight exist in a few zones; the earliest valid
        // instant (or the naive time read as UTC) is the closest boundary.
        tz.from_local_datetime(&midnight)
            .earliest()
            .map(|local| local.with_timezone(&Utc))
            .unwrap_or_else(|| Utc.from_utc_datetime(&midnight))
    }

    /// Half-open `[start, end)` UTC range covering the period in `tz`.
    pub fn utc_bounds(self, tz: Tz) -> (DateTime<Utc>, DateTime<Utc>) {
        (self.start_utc(tz), self.next().start_utc(tz))
    }

    /// True if `instant`, read in `tz`, falls inside this period.
    pub fn contains(self, instant: DateTime<Utc>, tz: Tz) -> bool {
        Self::containing(instant, tz) == self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::format_timestamp;

    #[test]
    fn rejects_out_of_range_month() {
        assert!(Period::new(2024, 0).is_err());
        assert!(Period::new(2024, 13).is_err());
        assert!(Period::new(2024, 12).is_ok());
    }

    #[test]
    fn last_accepted_year_keeps_bounds_sortable() {
        assert!(Period::new(9999, 1).is_err());
        let last = Period::new(9998, 12).unwrap();
        let (start, end) = last.utc_bounds(chrono_tz::UTC);
        let (start, end) = (format_timestamp(start), format_timestamp(end));
        assert_eq!(end, "9999-01-01T00:00:00Z");
        assert!(start < end);
    }

    #[test]
    fn prev_and_next_wrap_year() {
        let jan = Period::new(2024, 1).unwrap();
        assert_eq!(jan.prev(), Period::new(2023, 12).unwrap());
        assert_eq!(jan.prev().next(), jan);
    }

    #[test]
    fn window_is_oldest_first_and_crosses_years() {
        let anchor = Period::new(2024, 2).unwrap();
        let window = anchor.window(4);
        let pairs: Vec<(i32, u32)> = window.iter().map(|p| (p.year(), p.month())).collect();
        assert_eq!(pairs, vec![(2023, 11), (2023, 12), (2024, 1), (2024, 2)]);
        assert!(anchor.window(0).is_empty());
    }

    #[test]
    fn bounds_follow_timezone() {
        let march = Period::new(2024, 3).unwrap();
        let (start, end) = march.utc_bounds(chrono_tz::Europe::Rome);
        assert_eq!(start.to_rfc3339(), "2024-02-29T23:00:00+00:00");
        // Rome switches to CEST on the last Sunday of March.
        assert_eq!(end.to_rfc3339(), "2024-03-31T22:00:00+00:00");

        let (start, _) = march.utc_bounds(chrono_tz::UTC);
        assert_eq!(start.to_rfc3339(), "2024-03-01T00:00:00+00:00");
    }

    #[test]
    fn month_boundary_depends_on_timezone() {
        let instant = Utc.with_ymd_and_hms(2024, 3, 31, 23, 30, 0).unwrap();
        assert_eq!(
            Period::containing(instant, chrono_tz::UTC),
            Period::new(2024, 3).unwrap()
        );
        assert_eq!(
            Period::containing(instant, chrono_tz::Europe::Rome),
            Period::new(2024, 4).unwrap()
        );
    }
}
