use std::fmt;
use std::ops::BitOr;

use chrono::Weekday;

use crate::date::Date;

const ALL_WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Parse a weekday abbreviation. Only the first two characters count and
/// case is ignored, so `Mo`, `m`, `MON` and `monday` all name Monday.
///
/// Single letters: M (Monday), W (Wednesday), F (Friday), A (Saturday),
/// S (Sunday). A lone `T` is ambiguous and yields `None`.
pub fn parse_weekday(token: &str) -> Option<Weekday> {
    let mut chars = token.trim().chars().map(|c| c.to_ascii_uppercase());
    match (chars.next(), chars.next()) {
        (Some('M'), Some('O') | None) => Some(Weekday::Mon),
        (Some('T'), Some('U')) => Some(Weekday::Tue),
        (Some('W'), Some('E') | None) => Some(Weekday::Wed),
        (Some('T'), Some('H')) => Some(Weekday::Thu),
        (Some('F'), Some('R') | None) => Some(Weekday::Fri),
        (Some('S'), Some('A')) | (Some('A'), None) => Some(Weekday::Sat),
        (Some('S'), Some('U') | None) => Some(Weekday::Sun),
        _ => None,
    }
}

/// Set of weekdays excluded from a date sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SkipSet(u8);

impl SkipSet {
    pub const EMPTY: Self = Self(0);

    pub fn weekend() -> Self {
        Self::EMPTY.with(Weekday::Sat).with(Weekday::Sun)
    }

    fn bit(day: Weekday) -> u8 {
        1 << day.num_days_from_monday()
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & Self::bit(day) != 0
    }

    #[must_use]
    pub fn with(self, day: Weekday) -> Self {
        Self(self.0 | Self::bit(day))
    }

    /// Member weekdays, Monday first.
    pub fn iter(&self) -> impl Iterator<Item = Weekday> + '_ {
        ALL_WEEKDAYS.into_iter().filter(|d| self.contains(*d))
    }

    /// Whether `date` falls on an excluded weekday.
    pub fn skips(&self, date: &Date) -> bool {
        // common case first
        !self.is_empty() && self.contains(date.weekday())
    }

    /// Add one token: a weekday, `SS` for the weekend, or a range `A-B`
    /// walking forward from A to B and wrapping past Sunday.
    ///
    /// Unrecognized tokens, and ranges with an unrecognized end, add nothing.
    #[must_use]
    pub fn with_token(self, token: &str) -> Self {
        if let Some((from, till)) = token.split_once('-') {
            return match (parse_weekday(from), parse_weekday(till)) {
                (Some(from), Some(till)) => {
                    let span = (till.num_days_from_monday() + 7 - from.num_days_from_monday()) % 7;
                    let mut ss = self;
                    let mut day = from;
                    for _ in 0..=span {
                        ss = ss.with(day);
                        day = day.succ();
                    }
                    ss
                }
                _ => self,
            };
        }

        if let Some(day) = parse_weekday(token) {
            return self.with(day);
        }
        let weekend = token
            .trim()
            .get(..2)
            .is_some_and(|head| head.eq_ignore_ascii_case("SS"));
        if weekend {
            return self | Self::weekend();
        }
        self
    }

    /// Add every token of a comma-separated spec such as `Sa,Su` or `Mo-We,F`.
    #[must_use]
    pub fn with_spec(self, spec: &str) -> Self {
        spec.split(',').fold(self, Self::with_token)
    }
}

impl BitOr for SkipSet {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl FromIterator<Weekday> for SkipSet {
    fn from_iter<I: IntoIterator<Item = Weekday>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, Self::with)
    }
}

impl fmt::Display for SkipSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, day) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{day}")?;
        }
        Ok(())
    }
}
