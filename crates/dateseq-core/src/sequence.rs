//! Date sequence generation.
//!
//! A [`DateSeq`] walks from a first date to a last date by a
//! [`DurationList`], leaving out dates on skipped weekdays. When the step's
//! sign disagrees with the endpoint order, the step is read as applying
//! backward from the last date: the true first date is recomputed by walking
//! from `last` toward `first`, and the step is negated so that the main loop
//! always runs in the endpoint direction.

use tracing::{debug, warn};

use crate::date::{Daisy, Date};
use crate::duration::{DurationList, DurationTerm};
use crate::error::DateSeqError;
use crate::skip::SkipSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    fn between(first: &Date, last: &Date) -> Self {
        if first.ordinal() <= last.ordinal() {
            Self::Ascending
        } else {
            Self::Descending
        }
    }

    fn reverse(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }

    /// One calendar day in this direction, used to step over skipped days.
    fn nudge(self) -> DurationTerm {
        match self {
            Self::Ascending => DurationTerm::days(1),
            Self::Descending => DurationTerm::days(-1),
        }
    }

    /// Whether `date` has not yet passed `bound`.
    fn within(self, date: &Date, bound: &Date) -> bool {
        match self {
            Self::Ascending => date.ordinal() <= bound.ordinal(),
            Self::Descending => date.ordinal() >= bound.ordinal(),
        }
    }

    /// Whether moving `from` to `to` is strict progress.
    fn advances(self, from: &Date, to: &Date) -> bool {
        match self {
            Self::Ascending => to.ordinal() > from.ordinal(),
            Self::Descending => to.ordinal() < from.ordinal(),
        }
    }

    /// Whether `step` already points this way.
    fn agrees_with(self, step: &DurationList) -> bool {
        match self {
            Self::Ascending => !step.is_negative(),
            Self::Descending => step.is_negative(),
        }
    }
}

/// Lazy iterator over the dates from `first` to `last`.
///
/// All fatal conditions are detected by [`DateSeq::new`]; iteration only
/// fails when a mixed-sign step stops making progress.
#[derive(Debug, Clone)]
pub struct DateSeq {
    cursor: Option<Date>,
    last: Date,
    step: DurationList,
    skip: SkipSet,
    direction: Direction,
    started: bool,
    pending: Option<DateSeqError>,
}

impl DateSeq {
    pub fn new(
        first: Date,
        last: Date,
        step: DurationList,
        skip: SkipSet,
    ) -> Result<Self, DateSeqError> {
        if step.is_naught() {
            return Err(DateSeqError::ZeroStep);
        }

        let (first, last) = if step.is_daisy_feasible() {
            debug!("single day-only step {step}, comparing daisies");
            (to_daisy(first)?, to_daisy(last)?)
        } else {
            (first, last)
        };

        let direction = Direction::between(&first, &last);
        let (first, step) = if direction.agrees_with(&step) {
            (first, step)
        } else {
            match corrected_start(&first, &last, &step, skip, direction) {
                Some((start, negated)) => {
                    debug!("step {step} runs against {direction:?}, starting at {start} by {negated}");
                    (start, negated)
                }
                None => {
                    debug!("step {step} does not move away from {last}, using it literally");
                    (first, step)
                }
            }
        };

        Ok(Self {
            cursor: Some(first),
            last,
            step,
            skip,
            direction,
            started: false,
            pending: None,
        })
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// The step the main loop runs with, after any sign correction.
    pub fn step(&self) -> &DurationList {
        &self.step
    }
}

fn to_daisy(date: Date) -> Result<Date, DateSeqError> {
    date.to_daisy().ok_or_else(|| DateSeqError::Conversion {
        date: date.naive(),
        epoch: Daisy::epoch(),
    })
}

/// Walk from `last` back toward `first` with the wrongly signed `step` and
/// return the recomputed first date together with the negated step.
///
/// Returns `None` when the step fails to move away from `last` in practice;
/// the caller then trusts the literal reading. Leaving the representable
/// range counts as passing `first`.
fn corrected_start(
    first: &Date,
    last: &Date,
    step: &DurationList,
    skip: SkipSet,
    direction: Direction,
) -> Option<(Date, DurationList)> {
    let walk = direction.reverse();
    let negated = step.negated();
    let mut tmp = *last;

    while walk.within(&tmp, first) {
        if skip.skips(&tmp) {
            match tmp.add(walk.nudge()) {
                Some(next) => tmp = next,
                None => {
                    // one day past `tmp`, then one step back
                    let start = negated
                        .add_to(tmp)
                        .and_then(|d| d.add(walk.nudge()))
                        .unwrap_or(*first);
                    return Some((start, negated));
                }
            }
        } else {
            match step.add_to(tmp) {
                Some(next) if walk.advances(&tmp, &next) => tmp = next,
                Some(_) => return None,
                None => {
                    debug!("stepping back from {tmp} leaves the calendar");
                    return Some((tmp, negated));
                }
            }
        }
    }

    let start = negated.add_to(tmp).unwrap_or(*first);
    Some((start, negated))
}

impl Iterator for DateSeq {
    type Item = Result<Date, DateSeqError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(err) = self.pending.take() {
            return Some(Err(err));
        }

        loop {
            let current = self.cursor?;
            // the first date is visited before the bound is checked
            if self.started && !self.direction.within(&current, &self.last) {
                self.cursor = None;
                return None;
            }
            self.started = true;

            if self.skip.skips(&current) {
                self.cursor = current.add(self.direction.nudge());
                continue;
            }

            self.cursor = match self.step.add_to(current) {
                Some(next) if self.direction.advances(&current, &next) => Some(next),
                Some(_) => {
                    warn!("step {} does not advance past {current}", self.step);
                    self.pending = Some(DateSeqError::StepDoesNotAdvance(current.naive()));
                    None
                }
                // beyond the calendar, hence beyond `last`
                None => None,
            };
            return Some(Ok(current));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date::Calendar;
    use chrono::{Datelike, NaiveDate, Weekday};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn step(s: &str) -> DurationList {
        s.parse().unwrap()
    }

    fn run(first: NaiveDate, last: NaiveDate, by: &str, skip: &str) -> Vec<NaiveDate> {
        DateSeq::new(
            first.into(),
            last.into(),
            step(by),
            SkipSet::EMPTY.with_spec(skip),
        )
        .unwrap()
        .map(|d| d.unwrap().naive())
        .collect()
    }

    #[test]
    fn ascending_unit_step() {
        assert_eq!(
            run(date(2011, 1, 1), date(2011, 1, 5), "1d", ""),
            vec![
                date(2011, 1, 1),
                date(2011, 1, 2),
                date(2011, 1, 3),
                date(2011, 1, 4),
                date(2011, 1, 5),
            ]
        );
    }

    #[test]
    fn default_step_is_one_day() {
        let seq = DateSeq::new(
            date(2011, 1, 1).into(),
            date(2011, 1, 3).into(),
            DurationList::default(),
            SkipSet::EMPTY,
        )
        .unwrap();
        assert_eq!(seq.count(), 3);
    }

    #[test]
    fn single_date_when_endpoints_match() {
        assert_eq!(
            run(date(2011, 1, 1), date(2011, 1, 1), "1d", ""),
            vec![date(2011, 1, 1)]
        );
        assert_eq!(
            run(date(2011, 1, 1), date(2011, 1, 1), "-1d", ""),
            vec![date(2011, 1, 1)]
        );
    }

    #[test]
    fn negative_step_ascending_is_corrected() {
        assert_eq!(
            run(date(2011, 1, 1), date(2011, 1, 8), "-7", ""),
            vec![date(2011, 1, 1), date(2011, 1, 8)]
        );
    }

    #[test]
    fn corrected_start_is_anchored_at_last() {
        // counting back from Mar 1 by 7 days lands on Jan 4 first
        let dates = run(date(2011, 1, 1), date(2011, 3, 1), "-7", "");
        assert_eq!(dates.first(), Some(&date(2011, 1, 4)));
        assert_eq!(dates.last(), Some(&date(2011, 3, 1)));
        assert_eq!(dates.len(), 9);
        assert!(dates.windows(2).all(|w| (w[1] - w[0]).num_days() == 7));
    }

    #[test]
    fn corrected_step_is_negated() {
        let seq = DateSeq::new(
            date(2011, 1, 1).into(),
            date(2011, 1, 8).into(),
            step("-7"),
            SkipSet::EMPTY,
        )
        .unwrap();
        assert_eq!(seq.direction(), Direction::Ascending);
        assert_eq!(seq.step(), &step("7"));
    }

    #[test]
    fn descending_with_negative_step() {
        assert_eq!(
            run(date(2011, 1, 5), date(2011, 1, 1), "-2d", ""),
            vec![date(2011, 1, 5), date(2011, 1, 3), date(2011, 1, 1)]
        );
    }

    #[test]
    fn descending_positive_step_is_corrected() {
        assert_eq!(
            run(date(2011, 1, 8), date(2011, 1, 1), "7", ""),
            vec![date(2011, 1, 8), date(2011, 1, 1)]
        );
        // anchored at the far end: Jan 1 + 3 + 3 = Jan 7, so start there
        assert_eq!(
            run(date(2011, 1, 8), date(2011, 1, 1), "3", ""),
            vec![date(2011, 1, 7), date(2011, 1, 4), date(2011, 1, 1)]
        );
    }

    #[test]
    fn skipped_weekdays_are_left_out() {
        let dates = run(date(2011, 1, 1), date(2011, 1, 10), "1d", "SS");
        assert_eq!(
            dates,
            vec![
                date(2011, 1, 3),
                date(2011, 1, 4),
                date(2011, 1, 5),
                date(2011, 1, 6),
                date(2011, 1, 7),
                date(2011, 1, 10),
            ]
        );
        assert!(
            dates
                .iter()
                .all(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        );
    }

    #[test]
    fn skip_nudges_without_consuming_step() {
        // Thu 2011-01-06 by 2 days: Sat is nudged to Sun, then Mon
        assert_eq!(
            run(date(2011, 1, 6), date(2011, 1, 14), "2", "Sa,Su"),
            vec![
                date(2011, 1, 6),
                date(2011, 1, 10),
                date(2011, 1, 12),
                date(2011, 1, 14),
            ]
        );
    }

    #[test]
    fn descending_skip_nudges_backward() {
        assert_eq!(
            run(date(2011, 1, 10), date(2011, 1, 6), "-1", "SS"),
            vec![date(2011, 1, 10), date(2011, 1, 7), date(2011, 1, 6)]
        );
    }

    #[test]
    fn correction_pass_honours_skips() {
        // back from Mon Jan 10 by 2: Sat 8 is nudged to Fri 7, then 5, 3, and
        // Sat 1 is nudged to Dec 31, so the forward run starts on Jan 2
        assert_eq!(
            run(date(2011, 1, 1), date(2011, 1, 10), "-2", "Sa"),
            vec![
                date(2011, 1, 2),
                date(2011, 1, 4),
                date(2011, 1, 6),
                date(2011, 1, 9),
            ]
        );
    }

    #[test]
    fn all_weekdays_skipped_emits_nothing() {
        assert!(run(date(2011, 1, 1), date(2011, 1, 31), "1d", "Mo-Su").is_empty());
    }

    #[test]
    fn day_only_step_runs_on_daisies() {
        let seq = DateSeq::new(
            date(2011, 1, 1).into(),
            date(2011, 1, 3).into(),
            step("1d"),
            SkipSet::EMPTY,
        )
        .unwrap();
        for d in seq {
            assert_eq!(d.unwrap().calendar(), Calendar::Daisy);
        }

        let seq = DateSeq::new(
            date(2011, 1, 1).into(),
            date(2011, 1, 3).into(),
            step("1b"),
            SkipSet::EMPTY,
        )
        .unwrap();
        assert!(seq.map(|d| d.unwrap()).all(|d| d.calendar() == Calendar::Daisy));
    }

    #[test]
    fn month_step_runs_on_native_dates() {
        let seq = DateSeq::new(
            date(2011, 1, 31).into(),
            date(2011, 5, 31).into(),
            step("1m"),
            SkipSet::EMPTY,
        )
        .unwrap();
        let dates: Vec<Date> = seq.map(|d| d.unwrap()).collect();
        assert!(dates.iter().all(|d| d.calendar() == Calendar::Ymd));
        assert_eq!(
            dates.iter().map(Date::naive).collect::<Vec<_>>(),
            vec![
                date(2011, 1, 31),
                date(2011, 2, 28),
                date(2011, 3, 28),
                date(2011, 4, 28),
                date(2011, 5, 28),
            ]
        );
    }

    #[test]
    fn quarter_step_is_native_even_before_daisy_epoch() {
        let dates = run(date(1900, 1, 1), date(1900, 12, 31), "1q", "");
        assert_eq!(dates.len(), 4);
    }

    #[test]
    fn day_step_before_daisy_epoch_is_rejected() {
        let err = DateSeq::new(
            date(1900, 1, 1).into(),
            date(1900, 1, 5).into(),
            step("1d"),
            SkipSet::EMPTY,
        )
        .unwrap_err();
        assert!(matches!(err, DateSeqError::Conversion { .. }));
    }

    #[test]
    fn zero_step_is_rejected_both_ways() {
        for (first, last) in [
            (date(2011, 1, 1), date(2011, 1, 5)),
            (date(2011, 1, 5), date(2011, 1, 1)),
        ] {
            for zero in ["0", "0m", "0d0m", "0q"] {
                let result = DateSeq::new(first.into(), last.into(), step(zero), SkipSet::EMPTY);
                assert_eq!(result.unwrap_err(), DateSeqError::ZeroStep, "{zero}");
            }
            let empty = DateSeq::new(
                first.into(),
                last.into(),
                DurationList::new(Vec::new()),
                SkipSet::EMPTY,
            );
            assert_eq!(empty.unwrap_err(), DateSeqError::ZeroStep);
        }
    }

    #[test]
    fn unreliable_sign_falls_back_to_literal_reading() {
        // "+1m -30d" is not negative, yet from Jan 31 it lands on Jan 29, so
        // the walk from `last` never moves toward `first`
        let seq = DateSeq::new(
            date(2011, 2, 10).into(),
            date(2011, 1, 31).into(),
            step("1m-30d"),
            SkipSet::EMPTY,
        )
        .unwrap();
        assert_eq!(seq.direction(), Direction::Descending);
        assert_eq!(seq.step(), &step("1m-30d"));

        // read literally, each step lands two days earlier until Jan 31
        let dates: Vec<_> = seq.map(|d| d.unwrap().naive()).collect();
        assert_eq!(
            dates,
            vec![
                date(2011, 2, 10),
                date(2011, 2, 8),
                date(2011, 2, 6),
                date(2011, 2, 4),
                date(2011, 2, 2),
                date(2011, 1, 31),
            ]
        );
    }

    #[test]
    fn ascending_negative_mixed_step_is_corrected() {
        // every all-negative list moves backward, so an ascending run always
        // gets its start recomputed: Mar 31 - 1m - 1d = Feb 27, then Jan 26,
        // and one step forward again is Feb 27
        let seq = DateSeq::new(
            date(2011, 1, 31).into(),
            date(2011, 3, 31).into(),
            step("-1m-1d"),
            SkipSet::EMPTY,
        )
        .unwrap();
        assert_eq!(seq.direction(), Direction::Ascending);
        assert_eq!(seq.step(), &step("1m1d"));
        assert_eq!(
            run(date(2011, 1, 31), date(2011, 3, 31), "-1m-1d", ""),
            vec![date(2011, 2, 27), date(2011, 3, 28)]
        );
    }

    #[test]
    fn correction_pass_stops_at_daisy_epoch() {
        // stepping back from Jan 6 would land in 1916, which has no daisy
        assert_eq!(
            run(date(1917, 1, 3), date(1917, 1, 20), "-7", ""),
            vec![date(1917, 1, 6), date(1917, 1, 13), date(1917, 1, 20)]
        );
        // Mon 1917-01-01 is skipped and cannot be nudged below the epoch
        assert_eq!(
            run(date(1917, 1, 1), date(1917, 1, 7), "-3", "Mo"),
            vec![date(1917, 1, 3), date(1917, 1, 6)]
        );
    }

    #[test]
    fn non_advancing_step_stops_with_error() {
        let mut seq = DateSeq::new(
            date(2011, 1, 31).into(),
            date(2011, 3, 31).into(),
            step("1m-30d"),
            SkipSet::EMPTY,
        )
        .unwrap();
        assert_eq!(seq.next(), Some(Ok(Date::from(date(2011, 1, 31)))));
        assert_eq!(
            seq.next(),
            Some(Err(DateSeqError::StepDoesNotAdvance(date(2011, 1, 31))))
        );
        assert_eq!(seq.next(), None);
    }

    #[test]
    fn ends_at_calendar_limit() {
        let dates: Vec<_> = DateSeq::new(
            (NaiveDate::MAX - chrono::Days::new(1)).into(),
            NaiveDate::MAX.into(),
            step("1m"),
            SkipSet::EMPTY,
        )
        .unwrap()
        .collect();
        assert_eq!(dates.len(), 1);
    }
}
