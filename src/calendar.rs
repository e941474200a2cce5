//! Timezone-aware month, period, and budget-window boundary resolution.
//!
//! Goals and limits are keyed by UTC month anchors regardless of the user's
//! timezone, while the budget engine slices days by the user's local
//! calendar. Both views are derived here so the rest of the crate never does
//! its own date arithmetic.

use serde::Deserialize;
use time::{Date, Duration, Month, OffsetDateTime, PrimitiveDateTime, Time, macros::time};
use time_tz::{Offset, TimeZone, Tz, timezones};

use crate::Error;

/// The last representable instant of a day.
pub const END_OF_DAY: Time = time!(23:59:59.999);

/// Look up a canonical IANA timezone by name, e.g. "America/Montevideo".
///
/// # Errors
/// Returns [Error::InvalidTimezone] if the name is not a known timezone.
pub fn resolve_timezone(name: &str) -> Result<&'static Tz, Error> {
    timezones::get_by_name(name).ok_or_else(|| Error::InvalidTimezone(name.to_owned()))
}

/// The calendar date of `instant` as seen from `timezone`.
pub fn local_date(instant: OffsetDateTime, timezone: &Tz) -> Date {
    let offset = timezone.get_offset_utc(&instant).to_utc();
    instant.to_offset(offset).date()
}

/// The UTC instant at which the wall clock in `timezone` shows `date` and
/// `time`.
///
/// The offset is resolved twice so a lookup that lands next to a DST
/// transition settles on the offset in effect at the returned instant.
pub fn local_to_utc(date: Date, time: Time, timezone: &Tz) -> OffsetDateTime {
    let naive = PrimitiveDateTime::new(date, time).assume_utc();
    let offset = timezone.get_offset_utc(&naive).to_utc();
    let candidate = naive.replace_offset(offset);
    let offset = timezone.get_offset_utc(&candidate).to_utc();

    candidate.replace_offset(offset)
}

/// A half-open-in-spirit, inclusive-in-representation range of UTC instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstantRange {
    /// The first instant of the range.
    pub start: OffsetDateTime,
    /// The last instant of the range (23:59:59.999 of the final day).
    pub end: OffsetDateTime,
}

/// The canonical UTC key for goals and limits: day 1 of `year`/`month`.
///
/// # Errors
/// Returns [Error::InvalidMonth] if `month` is outside 1 to 12.
pub fn month_anchor(year: i32, month: u8) -> Result<Date, Error> {
    let month = month_from_number(month)?;

    Ok(Date::from_calendar_date(year, month, 1).expect("day 1 is valid in every month"))
}

/// The UTC instant a month anchor stands for (midnight on day 1).
pub fn anchor_instant(anchor: Date) -> OffsetDateTime {
    PrimitiveDateTime::new(anchor, Time::MIDNIGHT).assume_utc()
}

/// Walk a month anchor backwards by `months` whole months.
pub fn months_before(anchor: Date, months: u8) -> Date {
    let mut year = anchor.year();
    let mut month = anchor.month();

    for _ in 0..months {
        (year, month) = match month {
            Month::January => (year - 1, Month::December),
            month => (year, month.previous()),
        };
    }

    Date::from_calendar_date(year, month, 1).expect("day 1 is valid in every month")
}

/// A multi-month reporting period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    /// A single calendar month.
    Month,
    /// Three months starting January, April, July, or October.
    Quarter,
    /// Six months starting January or July.
    Semester,
    /// Twelve months starting January.
    Year,
}

impl Period {
    fn span_months(self) -> u8 {
        match self {
            Self::Month => 1,
            Self::Quarter => 3,
            Self::Semester => 6,
            Self::Year => 12,
        }
    }

    fn start_month(self, month: u8) -> u8 {
        match self {
            Self::Month => month,
            Self::Quarter => ((month - 1) / 3) * 3 + 1,
            Self::Semester => {
                if month <= 6 {
                    1
                } else {
                    7
                }
            }
            Self::Year => 1,
        }
    }
}

/// The UTC instants spanned by the `period` containing `year`/`month`:
/// the month anchor of the period's first month through the last instant of
/// its final month.
///
/// # Errors
/// Returns [Error::InvalidMonth] if `month` is outside 1 to 12.
pub fn period_range(period: Period, year: i32, month: u8) -> Result<InstantRange, Error> {
    if !(1..=12).contains(&month) {
        return Err(Error::InvalidMonth(month));
    }

    let start_month = period.start_month(month);
    let end_month = start_month + period.span_months() - 1;

    let start = month_anchor(year, start_month)?;
    let end_anchor = month_anchor(year, end_month)?;
    let end = end_anchor
        .replace_day(days_in_month(year, end_anchor.month()))
        .unwrap();

    Ok(InstantRange {
        start: anchor_instant(start),
        end: PrimitiveDateTime::new(end, END_OF_DAY).assume_utc(),
    })
}

/// The window of local dates the budget engine spreads its envelope over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetWindow {
    /// The first day of the window.
    pub start: Date,
    /// The last day of the window.
    pub end: Date,
}

impl BudgetWindow {
    /// Days left in the window counting `today` itself.
    pub fn remaining_days_including(&self, today: Date) -> i64 {
        (self.end - today).whole_days() + 1
    }

    /// Days left in the window after `today`. Zero on the window's last day,
    /// which is a defined terminal state rather than an error.
    pub fn remaining_days_excluding(&self, today: Date) -> i64 {
        (self.end - today).whole_days()
    }

    /// Whether `date` falls inside the window.
    pub fn contains(&self, date: Date) -> bool {
        self.start <= date && date <= self.end
    }
}

/// The budget window containing `today`.
///
/// With no cycle day configured this is the local calendar month. A cycle day
/// `d` (1 to 28) starts each window on day `d` and ends it the day before the
/// next window starts, so pay-cycle users get their envelope reset on payday
/// instead of the 1st.
///
/// # Errors
/// Returns [Error::InvalidCycleDay] if `cycle_day` is outside 1 to 28.
pub fn budget_window(today: Date, cycle_day: Option<u8>) -> Result<BudgetWindow, Error> {
    let Some(day) = cycle_day else {
        return Ok(BudgetWindow {
            start: today.replace_day(1).unwrap(),
            end: today
                .replace_day(days_in_month(today.year(), today.month()))
                .unwrap(),
        });
    };

    if !(1..=28).contains(&day) {
        return Err(Error::InvalidCycleDay(day));
    }

    // Day 28 or lower exists in every month, so replace_day cannot fail on
    // either the current or the adjacent month.
    let start = if today.day() >= day {
        today.replace_day(day).unwrap()
    } else {
        months_before(today.replace_day(1).unwrap(), 1)
            .replace_day(day)
            .unwrap()
    };

    let next_start = next_month_anchor(start).replace_day(day).unwrap();

    Ok(BudgetWindow {
        start,
        end: next_start - Duration::days(1),
    })
}

fn next_month_anchor(date: Date) -> Date {
    let (year, month) = match date.month() {
        Month::December => (date.year() + 1, Month::January),
        month => (date.year(), month.next()),
    };

    Date::from_calendar_date(year, month, 1).expect("day 1 is valid in every month")
}

/// The number of days in `month` of `year`.
pub fn days_in_month(year: i32, month: Month) -> u8 {
    match month {
        Month::January
        | Month::March
        | Month::May
        | Month::July
        | Month::August
        | Month::October
        | Month::December => 31,
        Month::April | Month::June | Month::September | Month::November => 30,
        Month::February => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

fn month_from_number(month: u8) -> Result<Month, Error> {
    let month = match month {
        1 => Month::January,
        2 => Month::February,
        3 => Month::March,
        4 => Month::April,
        5 => Month::May,
        6 => Month::June,
        7 => Month::July,
        8 => Month::August,
        9 => Month::September,
        10 => Month::October,
        11 => Month::November,
        12 => Month::December,
        _ => return Err(Error::InvalidMonth(month)),
    };

    Ok(month)
}
