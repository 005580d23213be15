use std::fmt;

use chrono::{Datelike, Local, NaiveDate, Weekday};

use crate::duration::DurationTerm;

/// Days from 0001-01-01 (CE day 1) to the daisy epoch, 1917-01-01.
const DAISY_EPOCH_CE: i32 = 699_805;

/// Contiguous day number counted from 1917-01-01 (day 0).
/// Dates before the epoch have no daisy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Daisy(u32);

impl Daisy {
    pub fn epoch() -> NaiveDate {
        NaiveDate::from_num_days_from_ce_opt(DAISY_EPOCH_CE).unwrap_or(NaiveDate::MIN)
    }

    pub fn from_naive(date: NaiveDate) -> Option<Self> {
        let days = date.num_days_from_ce().checked_sub(DAISY_EPOCH_CE)?;
        u32::try_from(days).ok().map(Self)
    }

    pub fn day_number(self) -> u32 {
        self.0
    }

    pub fn to_naive(self) -> NaiveDate {
        // Daisies are only built from dates chrono can represent.
        self.checked_naive().unwrap_or(NaiveDate::MAX)
    }

    fn checked_naive(self) -> Option<NaiveDate> {
        let days = i32::try_from(self.0).ok()?.checked_add(DAISY_EPOCH_CE)?;
        NaiveDate::from_num_days_from_ce_opt(days)
    }

    fn add_days(self, days: i32) -> Option<Self> {
        let moved = Self(self.0.checked_add_signed(days)?);
        moved.checked_naive().map(|_| moved)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Calendar {
    Ymd,
    Daisy,
}

/// A date in one of the supported calendar representations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Date {
    Ymd(NaiveDate),
    Daisy(Daisy),
}

impl Date {
    /// Today's date on the local clock.
    pub fn today() -> Self {
        Self::Ymd(Local::now().date_naive())
    }

    pub fn calendar(&self) -> Calendar {
        match self {
            Self::Ymd(_) => Calendar::Ymd,
            Self::Daisy(_) => Calendar::Daisy,
        }
    }

    /// Monotone ordinal for comparing dates of the same calendar.
    pub fn ordinal(&self) -> i64 {
        match self {
            Self::Ymd(d) => {
                i64::from(d.year()) * 512 + i64::from(d.month()) * 32 + i64::from(d.day())
            }
            Self::Daisy(d) => i64::from(d.day_number()),
        }
    }

    pub fn naive(&self) -> NaiveDate {
        match self {
            Self::Ymd(d) => *d,
            Self::Daisy(d) => d.to_naive(),
        }
    }

    pub fn weekday(&self) -> Weekday {
        self.naive().weekday()
    }

    /// Convert to the contiguous day-number calendar.
    pub fn to_daisy(self) -> Option<Self> {
        match self {
            Self::Ymd(d) => Daisy::from_naive(d).map(Self::Daisy),
            Self::Daisy(_) => Some(self),
        }
    }

    /// Apply one duration term, keeping the calendar of `self`.
    pub fn add(self, term: DurationTerm) -> Option<Self> {
        match (self, term) {
            (Self::Daisy(d), DurationTerm::MonthDay { months: 0, days }) => {
                d.add_days(days).map(Self::Daisy)
            }
            (Self::Ymd(d), _) => term.apply_to(d).map(Self::Ymd),
            (Self::Daisy(d), _) => term
                .apply_to(d.to_naive())
                .and_then(Daisy::from_naive)
                .map(Self::Daisy),
        }
    }
}

impl From<NaiveDate> for Date {
    fn from(date: NaiveDate) -> Self {
        Self::Ymd(date)
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.naive().format("%Y-%m-%d"))
    }
}
