//! Broken-out calendar time exchanged with the host clock.
//!
//! Field conventions follow the C `struct tm`: month and weekday are
//! zero-based, year counts from 1900. Conversion to and from
//! seconds-since-epoch goes through `chrono`.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, Timelike};

/// Calendar year that `CalendarTime::year == 0` refers to.
pub const YEAR_BASE: i32 = 1900;

/// Sub-second fractions at or above this many nanoseconds round up.
pub const NANOS_ROUND_UP: u32 = 500_000_000;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalendarTime {
    pub second: u8,  // 0..=61
    pub minute: u8,  // 0..=59
    pub hour: u8,    // 0..=23, 24h only
    pub mday: u8,    // 1..=31
    pub month: u8,   // 0..=11
    pub year: i32,   // years since 1900
    /// 0..=6, Sunday = 0. Only carried when extended fields are enabled.
    pub weekday: Option<u8>,
    /// 0..=365. Only carried when extended fields are enabled.
    pub yday: Option<u16>,
}

impl CalendarTime {
    /// 00:00:00, Jan 1 1970. Handed out while no RTC data is available.
    pub const fn epoch(extended: bool) -> Self {
        Self {
            second: 0,
            minute: 0,
            hour: 0,
            mday: 1,
            month: 0,
            year: 70,
            // Jan 1, 1970 was a Thursday
            weekday: if extended { Some(4) } else { None },
            yday: if extended { Some(0) } else { None },
        }
    }

    /// Break out a chrono date/time.
    pub fn from_naive(dt: &NaiveDateTime, extended: bool) -> Self {
        Self {
            second: dt.second() as u8,
            minute: dt.minute() as u8,
            hour: dt.hour() as u8,
            mday: dt.day() as u8,
            month: dt.month0() as u8,
            year: dt.year() - YEAR_BASE,
            weekday: extended.then(|| dt.weekday().num_days_from_sunday() as u8),
            yday: extended.then(|| dt.ordinal0() as u16),
        }
    }

    /// `None` if the fields do not name a real date (e.g. Feb 30) or carry
    /// a leap second.
    pub fn to_naive(&self) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(
            self.full_year(),
            u32::from(self.month) + 1,
            u32::from(self.mday),
        )?
        .and_hms_opt(
            u32::from(self.hour),
            u32::from(self.minute),
            u32::from(self.second),
        )
    }

    /// Break out a Unix timestamp, rounding the sub-second part to the
    /// nearest second. `utc_offset_secs` selects local time; zero is UTC.
    pub fn from_timestamp(
        seconds: i64,
        nanos: u32,
        utc_offset_secs: i32,
        extended: bool,
    ) -> Option<Self> {
        let offset = FixedOffset::east_opt(utc_offset_secs)?;
        let utc = DateTime::from_timestamp(round_timestamp(seconds, nanos), 0)?;
        Some(Self::from_naive(&utc.with_timezone(&offset).naive_local(), extended))
    }

    /// Seconds since the Unix epoch for a time expressed at `utc_offset_secs`.
    pub fn to_timestamp(&self, utc_offset_secs: i32) -> Option<i64> {
        let local = self.to_naive()?.and_utc().timestamp();
        local.checked_sub(i64::from(utc_offset_secs))
    }

    pub fn full_year(&self) -> i32 {
        self.year + YEAR_BASE
    }
}

/// Whole seconds with the fraction rounded half-up.
pub fn round_timestamp(seconds: i64, nanos: u32) -> i64 {
    if nanos >= NANOS_ROUND_UP {
        seconds.saturating_add(1)
    } else {
        seconds
    }
}
