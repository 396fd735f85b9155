use jiff::{SignedDuration, Span, Zoned};

use crate::error::PeriodError;
use crate::period::Period;

/// Add the calendar part (years, months, days) using calendar arithmetic.
///
/// Day-of-month overflow is constrained by jiff: Jan 31 + 1 month is the last
/// day of February.
fn add_calendar(period: &Period, at: &Zoned) -> Result<Zoned, PeriodError> {
    if !period.has_calendar_part() {
        return Ok(at.clone());
    }
    let span = Span::new()
        .try_years(period.years())
        .and_then(|s| s.try_months(period.months()))
        .and_then(|s| s.try_days(period.days()))
        .map_err(|e| PeriodError::overflow(format!("calendar part of {period} out of range: {e}")))?;
    at.checked_add(span)
        .map_err(|e| PeriodError::overflow(format!("cannot add {period} to {at}: {e}")))
}

/// Add an exact elapsed duration.
fn add_clock(duration: SignedDuration, at: &Zoned) -> Result<Zoned, PeriodError> {
    at.checked_add(duration)
        .map_err(|e| PeriodError::overflow(format!("cannot add {duration:?} to {at}: {e}")))
}

/// One step of the period from `at`, ignoring the repetition budget.
fn advance(period: &Period, at: &Zoned) -> Result<Zoned, PeriodError> {
    let shifted = add_calendar(period, at)?;
    add_clock(period.clock_duration(), &shifted)
}

/// Compute when the period next elapses after `now`.
///
/// Returns `Ok(None)` when the period never elapses. The repetition budget is
/// not consumed; callers stepping through several occurrences track it
/// themselves (or use [`Occurrences`]).
pub fn next_from(period: &Period, now: &Zoned) -> Result<Option<Zoned>, PeriodError> {
    if period.repetitions().is_never() {
        return Ok(None);
    }
    advance(period, now).map(Some)
}

/// Compute up to `n` successive occurrences after `now`.
pub fn next_n_from(period: &Period, now: &Zoned, n: usize) -> Result<Vec<Zoned>, PeriodError> {
    Occurrences::new(period, now.clone()).take(n).collect()
}

/// Lazy iterator over successive occurrences, each computed from the previous one.
///
/// Holds its own copy of the repetition budget: yields nothing for a period
/// that never elapses, exactly `n` items for a bounded budget, and never ends
/// for an unbounded one.
pub struct Occurrences<'a> {
    period: &'a Period,
    current: Zoned,
    remaining: Option<u64>,
}

impl<'a> Occurrences<'a> {
    /// Create a new iterator starting after `from`.
    pub fn new(period: &'a Period, from: Zoned) -> Self {
        Self {
            period,
            current: from,
            remaining: period.repetitions().countdown(),
        }
    }

    /// Occurrences still to come, `None` meaning unbounded.
    pub fn remaining(&self) -> Option<u64> {
        self.remaining
    }
}

impl Iterator for Occurrences<'_> {
    type Item = Result<Zoned, PeriodError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(left) = self.remaining.as_mut() {
            if *left == 0 {
                return None;
            }
            *left -= 1;
        }
        match advance(self.period, &self.current) {
            Ok(dt) => {
                self.current = dt.clone();
                Some(Ok(dt))
            }
            Err(e) => {
                // Nothing after an overflow is representable either.
                self.remaining = Some(0);
                Some(Err(e))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.remaining {
            Some(n) => (0, usize::try_from(n).ok()),
            None => (0, None),
        }
    }
}
