use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, Months, NaiveDate, Weekday};

use crate::date::Date;
use crate::error::DateSeqError;

/// A single step applied to a date.
///
/// The sign lives in the fields: a term moves a date backward when every
/// field is <= 0 and at least one is < 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DurationTerm {
    /// Calendar months, then calendar days.
    MonthDay { months: i32, days: i32 },
    /// Quarters and months, then business days (Monday-Friday).
    QuarterMonthBusiness {
        quarters: i32,
        months: i32,
        business_days: i32,
    },
}

impl DurationTerm {
    pub const fn days(days: i32) -> Self {
        Self::MonthDay { months: 0, days }
    }

    pub const fn months(months: i32) -> Self {
        Self::MonthDay { months, days: 0 }
    }

    pub const fn quarters(quarters: i32) -> Self {
        Self::QuarterMonthBusiness {
            quarters,
            months: 0,
            business_days: 0,
        }
    }

    pub const fn business_days(business_days: i32) -> Self {
        Self::QuarterMonthBusiness {
            quarters: 0,
            months: 0,
            business_days,
        }
    }

    fn fields(&self) -> [i32; 3] {
        match *self {
            Self::MonthDay { months, days } => [months, days, 0],
            Self::QuarterMonthBusiness {
                quarters,
                months,
                business_days,
            } => [quarters, months, business_days],
        }
    }

    pub fn is_zero(&self) -> bool {
        self.fields().iter().all(|&f| f == 0)
    }

    pub fn is_negative(&self) -> bool {
        let fields = self.fields();
        fields.iter().all(|&f| f <= 0) && fields.iter().any(|&f| f < 0)
    }

    /// True when the term moves whole days only, with no month component.
    pub fn is_day_only(&self) -> bool {
        match *self {
            Self::MonthDay { months, .. } => months == 0,
            Self::QuarterMonthBusiness {
                quarters, months, ..
            } => quarters == 0 && months == 0,
        }
    }

    pub fn negated(&self) -> Self {
        match *self {
            Self::MonthDay { months, days } => Self::MonthDay {
                months: months.saturating_neg(),
                days: days.saturating_neg(),
            },
            Self::QuarterMonthBusiness {
                quarters,
                months,
                business_days,
            } => Self::QuarterMonthBusiness {
                quarters: quarters.saturating_neg(),
                months: months.saturating_neg(),
                business_days: business_days.saturating_neg(),
            },
        }
    }

    /// Apply the term to a calendar date.
    /// Returns `None` when the result leaves chrono's representable range.
    pub fn apply_to(&self, date: NaiveDate) -> Option<NaiveDate> {
        match *self {
            Self::MonthDay { months, days } => {
                shift_days(shift_months(date, months)?, i64::from(days))
            }
            Self::QuarterMonthBusiness {
                quarters,
                months,
                business_days,
            } => {
                let months = quarters.checked_mul(3)?.checked_add(months)?;
                shift_business_days(shift_months(date, months)?, business_days)
            }
        }
    }
}

impl fmt::Display for DurationTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::MonthDay { months, days } => write!(f, "{months:+}m{days:+}d"),
            Self::QuarterMonthBusiness {
                quarters,
                months,
                business_days,
            } => write!(f, "{quarters:+}q{months:+}m{business_days:+}b"),
        }
    }
}

/// Month arithmetic clamps the day to the end of the target month.
fn shift_months(date: NaiveDate, months: i32) -> Option<NaiveDate> {
    let delta = Months::new(months.unsigned_abs());
    if months >= 0 {
        date.checked_add_months(delta)
    } else {
        date.checked_sub_months(delta)
    }
}

pub(crate) fn shift_days(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    let delta = Days::new(days.unsigned_abs());
    if days >= 0 {
        date.checked_add_days(delta)
    } else {
        date.checked_sub_days(delta)
    }
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

fn shift_business_days(date: NaiveDate, business_days: i32) -> Option<NaiveDate> {
    let step = i64::from(business_days.signum());
    let mut left = business_days.unsigned_abs();
    let mut current = date;

    // From a weekday, five business days are exactly one calendar week.
    if !is_weekend(current) {
        current = shift_days(current, step * 7 * i64::from(left / 5))?;
        left %= 5;
    }
    while left > 0 {
        current = shift_days(current, step)?;
        if !is_weekend(current) {
            left -= 1;
        }
    }
    Some(current)
}

/// An ordered list of duration terms, applied left to right.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DurationList {
    terms: Vec<DurationTerm>,
}

impl DurationList {
    pub fn new(terms: Vec<DurationTerm>) -> Self {
        Self { terms }
    }

    pub fn terms(&self) -> &[DurationTerm] {
        &self.terms
    }

    /// An empty list, or one whose terms are all zero, never moves a date.
    pub fn is_naught(&self) -> bool {
        self.terms.iter().all(DurationTerm::is_zero)
    }

    /// True iff every term is negative. Mixed lists are never negative.
    pub fn is_negative(&self) -> bool {
        !self.terms.is_empty() && self.terms.iter().all(DurationTerm::is_negative)
    }

    pub fn negated(&self) -> Self {
        Self {
            terms: self.terms.iter().map(DurationTerm::negated).collect(),
        }
    }

    /// A single day-only term can run on daisy dates.
    pub fn is_daisy_feasible(&self) -> bool {
        matches!(self.terms.as_slice(), [term] if term.is_day_only())
    }

    /// Fold every term onto `date` in list order.
    pub fn add_to(&self, date: Date) -> Option<Date> {
        self.terms
            .iter()
            .try_fold(date, |acc, term| acc.add(*term))
    }
}

impl Default for DurationList {
    fn default() -> Self {
        Self::new(vec![DurationTerm::days(1)])
    }
}

impl FromIterator<DurationTerm> for DurationList {
    fn from_iter<I: IntoIterator<Item = DurationTerm>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl fmt::Display for DurationList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, term) in self.terms.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{term}")?;
        }
        Ok(())
    }
}

impl FromStr for DurationList {
    type Err = DateSeqError;

    /// Parse chunks of `[+|-]N[unit]`, e.g. `-7`, `+1m`, `1y-2d`, `3bd`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || DateSeqError::ParseDuration(s.to_string());
        let mut rest = s.trim();
        if rest.is_empty() {
            return Err(err());
        }

        let mut terms = Vec::new();
        while !rest.is_empty() {
            let (negative, unsigned) = match rest.as_bytes()[0] {
                b'+' => (false, &rest[1..]),
                b'-' => (true, &rest[1..]),
                _ => (false, rest),
            };

            let digits = unsigned
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(unsigned.len());
            if digits == 0 {
                return Err(err());
            }
            let magnitude: i32 = unsigned[..digits].parse().map_err(|_| err())?;
            let value = if negative { -magnitude } else { magnitude };

            let after = &unsigned[digits..];
            let unit_len = after
                .find(|c: char| !c.is_ascii_alphabetic())
                .unwrap_or(after.len());
            let term = match after[..unit_len].to_ascii_lowercase().as_str() {
                "" | "d" => DurationTerm::days(value),
                "w" => DurationTerm::days(value.checked_mul(7).ok_or_else(err)?),
                "m" | "mo" => DurationTerm::months(value),
                "y" => DurationTerm::months(value.checked_mul(12).ok_or_else(err)?),
                "q" => DurationTerm::quarters(value),
                "b" | "bd" => DurationTerm::business_days(value),
                _ => return Err(err()),
            };
            terms.push(term);
            rest = &after[unit_len..];
        }

        Ok(Self::new(terms))
    }
}
